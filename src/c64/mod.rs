//! An emulated Commodore 64, just big enough to run raster-interrupt
//! effects: NMOS 6510 core, VIC-II raster timing, two CIAs and a stub
//! KERNAL interrupt path.

pub mod cia;
pub mod machine;
pub mod memory;
pub mod vic;

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::hw::registers::{CSEL, XSCROLL_MASK};
use crate::hw::screen::{to_display_char, CELLS, COLUMNS, ROWS};

pub use machine::{Counters, Machine};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoStandard {
    #[default]
    Pal,
    Ntsc,
}

impl VideoStandard {
    pub const fn cycles_per_line(self) -> u32 {
        match self {
            VideoStandard::Pal => 63,
            VideoStandard::Ntsc => 65,
        }
    }

    pub const fn lines_per_frame(self) -> u16 {
        match self {
            VideoStandard::Pal => 312,
            VideoStandard::Ntsc => 263,
        }
    }

    pub const fn cycles_per_frame(self) -> u32 {
        self.cycles_per_line() * self.lines_per_frame() as u32
    }

    /// CPU clock in Hz.
    pub const fn clock_hz(self) -> u32 {
        match self {
            VideoStandard::Pal => 985_248,
            VideoStandard::Ntsc => 1_022_727,
        }
    }

    /// Real time one video frame takes on the machine.
    pub fn frame_duration(self) -> Duration {
        let us = self.cycles_per_frame() as u64 * 1_000_000 / self.clock_hz() as u64;
        Duration::from_micros(us)
    }
}

impl fmt::Display for VideoStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoStandard::Pal => write!(f, "PAL"),
            VideoStandard::Ntsc => write!(f, "NTSC"),
        }
    }
}

/// What the VIC would put on screen: the text matrix, its colours, and the
/// `$D016` value each row was fetched with.
#[derive(Debug, Clone)]
pub struct ScreenSnapshot {
    pub cells: [u8; CELLS as usize],
    pub colors: [u8; CELLS as usize],
    pub row_d016: [u8; ROWS as usize],
    pub border: u8,
    pub background: u8,
}

impl ScreenSnapshot {
    pub fn row(&self, row: u16) -> &[u8] {
        let start = (row * COLUMNS) as usize;
        &self.cells[start..start + COLUMNS as usize]
    }

    pub fn color(&self, row: u16, col: u16) -> u8 {
        self.colors[(row * COLUMNS + col) as usize] & 0x0F
    }

    pub fn xscroll(&self, row: u16) -> u8 {
        self.row_d016[row as usize] & XSCROLL_MASK
    }

    /// 40-column mode (CSEL set) for `row`.
    pub fn wide(&self, row: u16) -> bool {
        self.row_d016[row as usize] & CSEL != 0
    }

    pub fn row_text(&self, row: u16) -> String {
        self.row(row).iter().map(|&c| to_display_char(c)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_timing() {
        assert_eq!(VideoStandard::Pal.cycles_per_frame(), 19_656);
        assert_eq!(VideoStandard::Ntsc.cycles_per_frame(), 17_095);
        // ~50.12 Hz and ~59.83 Hz.
        assert_eq!(VideoStandard::Pal.frame_duration().as_micros(), 19_950);
        assert_eq!(VideoStandard::Ntsc.frame_duration().as_micros(), 16_715);
    }

    #[test]
    fn test_standard_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&VideoStandard::Ntsc).unwrap(), "\"ntsc\"");
        let pal: VideoStandard = serde_json::from_str("\"pal\"").unwrap();
        assert_eq!(pal, VideoStandard::Pal);
    }
}
