use embedded_graphics::{
    Pixel,
    pixelcolor::BinaryColor,
    prelude::{DrawTarget, OriginDimensions, Size},
};

use crate::icons::ImageData;

/// Badge panel, landscape.
pub const WIDTH: usize = 296;
pub const HEIGHT: usize = 128;
pub const BUFFER_SIZE: usize = WIDTH * HEIGHT / 8;

/// 1-bit frame, row-major, MSB first. A set bit is white (`BinaryColor::On`).
pub struct FrameBuffer {
    buffer: [u8; BUFFER_SIZE],
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    pub fn new() -> Self {
        // Clear screen to white
        Self {
            buffer: [0xFF; BUFFER_SIZE],
        }
    }

    pub fn as_bytes(&self) -> &[u8; BUFFER_SIZE] {
        &self.buffer
    }

    pub fn fill(&mut self, color: BinaryColor) {
        self.buffer.fill(match color {
            BinaryColor::On => 0xFF,
            BinaryColor::Off => 0x00,
        });
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: BinaryColor) {
        if x < 0 || y < 0 || x as usize >= WIDTH || y as usize >= HEIGHT {
            return;
        }
        let index = y as usize * WIDTH + x as usize;
        let byte_index = index / 8;
        let bit_index = 7 - (index % 8);
        match color {
            BinaryColor::On => self.buffer[byte_index] |= 1 << bit_index,
            BinaryColor::Off => self.buffer[byte_index] &= !(1 << bit_index),
        }
    }

    /// Out-of-bounds coordinates read as white.
    pub fn pixel(&self, x: i32, y: i32) -> BinaryColor {
        if x < 0 || y < 0 || x as usize >= WIDTH || y as usize >= HEIGHT {
            return BinaryColor::On;
        }
        let index = y as usize * WIDTH + x as usize;
        if (self.buffer[index / 8] >> (7 - (index % 8))) & 0x01 == 1 {
            BinaryColor::On
        } else {
            BinaryColor::Off
        }
    }

    /// Draws an 8-bit grayscale image with its top-left corner at `(x, y)`,
    /// thresholding at mid-gray. Pixels outside the panel are clipped.
    pub fn blit_gray8(&mut self, image: &ImageData, x: i32, y: i32) {
        let width = image.width as usize;
        for (row, line) in image.pixels.chunks(width.max(1)).enumerate() {
            if row >= image.height as usize {
                break;
            }
            for (col, &lum) in line.iter().enumerate() {
                let color = if lum >= 128 {
                    BinaryColor::On
                } else {
                    BinaryColor::Off
                };
                self.set_pixel(x + col as i32, y + row as i32, color);
            }
        }
    }

    /// Draws a packed 1-bit mask; set bits take `color`, clear bits are left alone.
    pub fn blit_mask(&mut self, mask: &[u8], width: u32, height: u32, x: i32, y: i32, color: BinaryColor) {
        for row in 0..height {
            for col in 0..width {
                let idx = (row * width + col) as usize;
                let Some(byte) = mask.get(idx / 8) else {
                    return;
                };
                if (byte >> (7 - (idx % 8))) & 0x01 == 1 {
                    self.set_pixel(x + col as i32, y + row as i32, color);
                }
            }
        }
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(WIDTH as u32, HEIGHT as u32)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            self.set_pixel(coord.x, coord.y, color);
        }
        Ok(())
    }
}
