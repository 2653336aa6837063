//! A 1x1 raster-interrupt text scroller for the Commodore 64, written
//! against a small hardware trait, plus an emulated C64 to run it on.

pub mod c64;
pub mod config;
pub mod emulator;
pub mod hw;
pub mod scroller;
