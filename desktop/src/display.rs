use std::{thread, time::Duration};

use badge_core::{
    display::{HEIGHT, PowerLatch, RefreshSpeed, WIDTH},
    framebuffer::FrameBuffer,
    input::{Button, ButtonState, Keypad},
};

const DISPLAY_BUFFER_SIZE: usize = WIDTH * HEIGHT;
const HALT_POLL: Duration = Duration::from_millis(10);

const WHITE: u32 = 0xFFFFFFFF;
const BLACK: u32 = 0xFF000000;

/// The badge in a window: panel, five keys and a power latch that parks
/// the loop until the next key press.
pub struct MinifbBadge {
    display_buffer: Vec<u32>,
    window: minifb::Window,
    buttons: ButtonState,
    held_at_boot: u8,
}

impl MinifbBadge {
    pub fn new(mut window: minifb::Window) -> Self {
        window.update();
        let mut badge = Self {
            display_buffer: vec![WHITE; DISPLAY_BUFFER_SIZE],
            window,
            buttons: ButtonState::new(),
            held_at_boot: 0,
        };
        badge.held_at_boot = badge.sample();
        if badge.held_at_boot != 0 {
            log::info!("Keys held at start: {:#07b}", badge.held_at_boot);
        }
        badge
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open() && !self.window.is_key_down(minifb::Key::Escape)
    }

    fn sample(&self) -> u8 {
        let keys = [
            (minifb::Key::A, Button::A),
            (minifb::Key::B, Button::B),
            (minifb::Key::C, Button::C),
            (minifb::Key::Up, Button::Up),
            (minifb::Key::Down, Button::Down),
        ];
        keys.iter()
            .filter(|(key, _)| self.window.is_key_down(*key))
            .fold(0, |mask, (_, button)| mask | button.mask())
    }

    fn update_display(&mut self) {
        if let Err(err) = self
            .window
            .update_with_buffer(&self.display_buffer, WIDTH, HEIGHT)
        {
            log::error!("Window update failed: {}", err);
        }
    }
}

impl badge_core::display::Display for MinifbBadge {
    fn refresh(&mut self, frame: &FrameBuffer, speed: RefreshSpeed) {
        for (i, byte) in frame.as_bytes().iter().enumerate() {
            for bit in 0..8 {
                let pixel_index = i * 8 + bit;
                self.display_buffer[pixel_index] = if (byte & (1 << (7 - bit))) != 0 {
                    WHITE
                } else {
                    BLACK
                };
            }
        }
        log::debug!("Panel refresh ({:?})", speed);
        self.update_display();
    }
}

impl PowerLatch for MinifbBadge {
    fn keepalive(&mut self) {
        log::trace!("Power latched");
    }

    /// Stands in for "on external power": blocks until a key goes down
    /// (after everything held at entry was let go) or the window closes.
    fn halt(&mut self) {
        log::debug!("Halted, waiting for a key");
        let mut idle = self.sample() == 0;
        while self.is_open() {
            self.window.update();
            let mask = self.sample();
            if mask == 0 {
                idle = true;
            } else if idle {
                break;
            }
            thread::sleep(HALT_POLL);
        }
        // The wake press is a fresh edge, as after a real power-up.
        self.buttons = ButtonState::new();
    }
}

impl Keypad for MinifbBadge {
    fn poll(&mut self) -> ButtonState {
        self.window.update();
        let current = self.sample();
        self.buttons.update(current);
        self.buttons
    }

    fn held_at_boot(&self, button: Button) -> bool {
        self.held_at_boot & button.mask() != 0
    }

    fn reset_held_at_boot(&mut self) {
        self.held_at_boot = 0;
    }

    fn woken_by_button(&self) -> bool {
        // A fresh simulator start is a cold boot.
        false
    }
}
