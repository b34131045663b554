use crate::framebuffer::FrameBuffer;

pub use crate::framebuffer::{HEIGHT, WIDTH};

/// Panel update speeds, slowest (cleanest) first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshSpeed {
    /// Full waveform, no ghosting
    Normal,
    /// Used for the first menu frame after boot
    Medium,
    /// Used for menu redraws while navigating
    Fast,
}

pub trait Display {
    /// Pushes the frame to the panel. Blocks until the panel has finished updating.
    fn refresh(&mut self, frame: &FrameBuffer, speed: RefreshSpeed);
}

/// Power latch of a battery badge: the board stays on only while the latch is held.
pub trait PowerLatch {
    /// Re-latch power. A button press or hold can keep the board powered
    /// through a halt, so this is called before any blocking work.
    fn keepalive(&mut self);

    /// Release the latch and sleep until the next button edge or timer wake.
    /// On battery this powers the board off and the next wake is a fresh boot;
    /// on external power it returns after the wake source fires.
    fn halt(&mut self);
}
