use std::{fs, io, thread, time::Duration};

use badge_core::{
    apps::AppEntry,
    display::{Display, RefreshSpeed},
    error::AppError,
    framebuffer::FrameBuffer,
    input::{Button, Keypad},
    launcher::AppHost,
};
use embedded_graphics::{
    mono_font::{
        MonoTextStyle,
        ascii::{FONT_6X10, FONT_8X13_BOLD},
    },
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};

use crate::{display::MinifbBadge, storage::DirFs};

const POLL: Duration = Duration::from_millis(20);
const MAX_LINES: usize = 10;

/// Stand-in for running an app: shows its label and file contents until
/// A and C are held together.
pub struct DemoHost {
    storage: DirFs,
    extension: String,
}

impl DemoHost {
    pub fn new(storage: DirFs, extension: &str) -> Self {
        Self {
            storage,
            extension: extension.into(),
        }
    }

    fn draw(&self, app: &AppEntry, body: &str) -> FrameBuffer {
        let mut frame = FrameBuffer::new();
        let title = MonoTextStyle::new(&FONT_8X13_BOLD, BinaryColor::Off);
        let text = MonoTextStyle::new(&FONT_6X10, BinaryColor::Off);
        let _ = Text::with_baseline(&app.label, Point::new(4, 2), title, Baseline::Top).draw(&mut frame);
        for (i, line) in body.lines().take(MAX_LINES).enumerate() {
            let y = 20 + i as i32 * 10;
            let _ = Text::with_baseline(line, Point::new(4, y), text, Baseline::Top).draw(&mut frame);
        }
        let _ = Text::with_baseline("hold A+C to exit", Point::new(4, 118), text, Baseline::Top)
            .draw(&mut frame);
        frame
    }
}

impl AppHost<MinifbBadge> for DemoHost {
    fn run(&mut self, app: &AppEntry, badge: &mut MinifbBadge) -> Result<(), AppError> {
        let file = self
            .storage
            .resolve(&format!("{}.{}", app.path, self.extension));
        let data = fs::read(&file).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => AppError::NotFound(app.name.clone()),
            _ => AppError::Crashed(err.to_string()),
        })?;
        let body = String::from_utf8(data)
            .map_err(|_| AppError::Crashed(format!("{} is not a text app", app.name)))?;

        log::info!("Running {} from {}", app.name, file.display());
        badge.refresh(&self.draw(app, &body), RefreshSpeed::Normal);

        while badge.is_open() {
            let buttons = badge.poll();
            if buttons.is_down(Button::A) && buttons.is_down(Button::C) {
                log::info!("Exit gesture in {}", app.name);
                break;
            }
            thread::sleep(POLL);
        }
        Ok(())
    }
}
