#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod apps;
pub mod config;
pub mod disk;
pub mod display;
pub mod error;
pub mod framebuffer;
pub mod icons;
pub mod input;
pub mod launcher;
pub mod fs;
pub mod power;
pub mod render;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;
