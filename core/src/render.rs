extern crate alloc;

use alloc::{format, string::String};

use embedded_graphics::{
    Drawable,
    mono_font::{
        MonoFont, MonoTextStyle,
        ascii::{FONT_5X8, FONT_6X10, FONT_9X15},
    },
    pixelcolor::BinaryColor,
    prelude::{Point, Primitive, Size},
    primitives::{PrimitiveStyle, Rectangle},
    text::{Alignment, Baseline, Text, TextStyleBuilder},
};

use crate::{
    apps::{AppEntry, SLOTS_PER_PAGE},
    disk::DiskUsage,
    display::{Display, RefreshSpeed},
    framebuffer::{FrameBuffer, HEIGHT, WIDTH},
    icons::{ICON_SIZE, IconSource},
    power::{BatteryLevel, PowerReading},
};

const WHITE: BinaryColor = BinaryColor::On;
const BLACK: BinaryColor = BinaryColor::Off;

pub const STATUS_BAR_HEIGHT: i32 = 16;
const TITLE_X: i32 = 4;
const DISK_GAUGE_X: i32 = 50;
const BATTERY_GAUGE_X: i32 = 175;
const GAUGE_BAR_WIDTH: i32 = 76;

/// Approximate center lines of buttons A, B and C.
pub const SLOT_CENTERS: [i32; SLOTS_PER_PAGE] = [41, 147, 253];
/// Distance between slot centers; a label never gets wider than this.
const SLOT_PITCH: u32 = 106;
const ICON_TOP: i32 = 30;
const LABEL_TOP: i32 = STATUS_BAR_HEIGHT + 80;

const DOT_X: i32 = 286;
const DOT_SIZE: u32 = 8;
const DOT_SPACING: i32 = 10;

const DISK_GLYPH: [u8; 8] = [
    0b0000_0000,
    0b0011_1100,
    0b0011_1100,
    0b0011_1100,
    0b0011_1000,
    0b0000_0000,
    0b0000_0000,
    0b0000_0001,
];

const BATTERY_GLYPH: [u8; 9] = [
    0b1100_1100,
    0b0011_0000,
    0b0111_1000,
    0b0111_1000,
    0b0100_1000,
    0b0100_1000,
    0b0100_1000,
    0b0111_1000,
    0b0000_0100,
];

/// Everything one menu frame depends on.
pub struct PageView<'a> {
    pub title: &'a str,
    /// Apps on the current page, at most three.
    pub apps: &'a [AppEntry],
    pub page: usize,
    pub max_page: usize,
    pub power: PowerReading,
    /// `None` when the disk probe failed.
    pub disk: Option<DiskUsage>,
}

/// Draws the menu and refreshes the panel once.
pub fn render_page<D: Display, I: IconSource>(
    frame: &mut FrameBuffer,
    icons: &mut I,
    display: &mut D,
    view: &PageView<'_>,
    speed: RefreshSpeed,
) {
    draw_page(frame, icons, view);
    display.refresh(frame, speed);
}

pub fn draw_page<I: IconSource>(frame: &mut FrameBuffer, icons: &mut I, view: &PageView<'_>) {
    frame.fill(WHITE);

    for (app, &center) in view.apps.iter().zip(SLOT_CENTERS.iter()) {
        draw_slot(frame, icons, app, center);
    }
    draw_page_dots(frame, view.page, view.max_page);

    fill_rect(frame, 0, 0, WIDTH as u32, STATUS_BAR_HEIGHT as u32, BLACK);
    draw_disk_gauge(frame, DISK_GAUGE_X, view.disk);
    draw_battery_gauge(frame, BATTERY_GAUGE_X, &view.power);
    status_text(frame, view.title, TITLE_X);
}

fn draw_slot<I: IconSource>(frame: &mut FrameBuffer, icons: &mut I, app: &AppEntry, center: i32) {
    let icon_x = center - (ICON_SIZE as i32) / 2;
    match icons.load_icon(&app.icon_path) {
        Ok(image) => frame.blit_gray8(&image, icon_x, ICON_TOP),
        Err(err) => {
            log::warn!("Icon {} unavailable: {}", app.icon_path, err);
            Rectangle::new(Point::new(icon_x, ICON_TOP), Size::new(ICON_SIZE, ICON_SIZE))
                .into_styled(PrimitiveStyle::with_stroke(BLACK, 1))
                .draw(frame)
                .ok();
        }
    }

    let style = MonoTextStyle::new(&FONT_9X15, BLACK);
    let text_style = TextStyleBuilder::new()
        .alignment(Alignment::Center)
        .baseline(Baseline::Top)
        .build();
    let label = fit_text(&app.label, &FONT_9X15, SLOT_PITCH);
    Text::with_text_style(label, Point::new(center, LABEL_TOP), style, text_style)
        .draw(frame)
        .ok();
}

/// Longest prefix of `text` that fits in `max_width` pixels of `font`.
fn fit_text<'a>(text: &'a str, font: &MonoFont<'_>, max_width: u32) -> &'a str {
    let advance = font.character_size.width + font.character_spacing;
    let max_chars = (max_width / advance.max(1)) as usize;
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// One square per page down the right edge. The current page is solid;
/// the others get their interior filled back in with the background.
fn draw_page_dots(frame: &mut FrameBuffer, page: usize, max_page: usize) {
    let top = (HEIGHT as i32) / 2 - (max_page as i32 * DOT_SPACING) / 2;
    for i in 0..max_page {
        let y = top + i as i32 * DOT_SPACING;
        fill_rect(frame, DOT_X, y, DOT_SIZE, DOT_SIZE, BLACK);
        if i != page {
            fill_rect(frame, DOT_X + 1, y + 1, DOT_SIZE - 2, DOT_SIZE - 2, WHITE);
        }
    }
}

fn draw_disk_gauge(frame: &mut FrameBuffer, x: i32, disk: Option<DiskUsage>) {
    frame.blit_mask(&DISK_GLYPH, 8, 8, x, 4, WHITE);
    gauge_frame(frame, x + 10);
    match disk {
        Some(usage) => {
            gauge_bar(frame, x + 12, usage.used_percent);
            status_text(frame, &format!("{:.2}%", usage.used_percent), x + 91);
        }
        None => status_text(frame, "--", x + 91),
    }
}

fn draw_battery_gauge(frame: &mut FrameBuffer, x: i32, power: &PowerReading) {
    frame.blit_mask(&BATTERY_GLYPH, 8, 9, x, 3, WHITE);
    gauge_frame(frame, x + 8);
    let label: String = match power.level {
        BatteryLevel::Percent(percent) => {
            gauge_bar(frame, x + 10, percent);
            format!("{:.2}%", percent)
        }
        BatteryLevel::ExternalPower => {
            gauge_bar(frame, x + 10, 100.0);
            "USB".into()
        }
        BatteryLevel::Unknown => "--".into(),
    };
    status_text(frame, &label, x + 91);
}

/// White 80x10 outline with a black interior.
fn gauge_frame(frame: &mut FrameBuffer, x: i32) {
    fill_rect(frame, x, 3, 80, 10, WHITE);
    fill_rect(frame, x + 1, 4, 78, 8, BLACK);
}

fn gauge_bar(frame: &mut FrameBuffer, x: i32, percent: f32) {
    let width = (GAUGE_BAR_WIDTH as f32 / 100.0 * percent) as i32;
    let width = width.clamp(0, GAUGE_BAR_WIDTH);
    if width > 0 {
        fill_rect(frame, x, 5, width as u32, 6, WHITE);
    }
}

fn status_text(frame: &mut FrameBuffer, text: &str, x: i32) {
    let style = MonoTextStyle::new(&FONT_5X8, WHITE);
    Text::with_baseline(text, Point::new(x, 4), style, Baseline::Top)
        .draw(frame)
        .ok();
}

fn fill_rect(frame: &mut FrameBuffer, x: i32, y: i32, w: u32, h: u32, color: BinaryColor) {
    Rectangle::new(Point::new(x, y), Size::new(w, h))
        .into_styled(PrimitiveStyle::with_fill(color))
        .draw(frame)
        .ok();
}

/// Full-screen message shown when an app fails, before the menu returns.
pub fn render_warning<D: Display>(frame: &mut FrameBuffer, display: &mut D, title: &str, message: &str) {
    frame.fill(WHITE);
    fill_rect(frame, 0, 0, WIDTH as u32, STATUS_BAR_HEIGHT as u32, BLACK);
    status_text(frame, title, TITLE_X);

    let style = MonoTextStyle::new(&FONT_6X10, BLACK);
    let max_chars = (WIDTH as usize - 2 * TITLE_X as usize) / 6;
    let mut y = STATUS_BAR_HEIGHT + 8;
    let mut line = String::new();
    for word in message.split_whitespace() {
        if !line.is_empty() && line.len() + 1 + word.len() > max_chars {
            Text::with_baseline(&line, Point::new(TITLE_X, y), style, Baseline::Top)
                .draw(frame)
                .ok();
            y += 12;
            line.clear();
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        Text::with_baseline(&line, Point::new(TITLE_X, y), style, Baseline::Top)
            .draw(frame)
            .ok();
    }
    display.refresh(frame, RefreshSpeed::Medium);
}
