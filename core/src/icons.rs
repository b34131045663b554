extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;

/// Side length of a menu icon as drawn on the badge.
pub const ICON_SIZE: u32 = 52;

#[derive(Clone, Debug)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>, // 8-bit grayscale, row-major
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ImageError {
    #[error("icon not found")]
    NotFound,
    #[error("icon i/o error")]
    Io,
    #[error("icon could not be decoded")]
    Decode,
    #[error("{0}")]
    Message(String),
}

/// Decodes icon files for the menu. Decoding (JPEG on the badge) is the
/// platform's job; the launcher only blits the result.
pub trait IconSource {
    fn load_icon(&mut self, path: &str) -> Result<ImageData, ImageError>;
}
