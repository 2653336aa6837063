//! MOS 6569/6567 VIC-II: raster timing, raster interrupt and the handful of
//! registers the text screen needs.
//!
//! Badlines: when DEN=1, raster in display area (0x30..0xF7), and
//! (raster & 7) == (YSCROLL & 7), VIC steals ~40 cycles from CPU.
//!
//! The character row fetch on each badline also latches `$D016` for that
//! row, which is how a mid-frame fine-scroll change shows up on screen.

use super::VideoStandard;
use crate::hw::screen::ROWS;

const FIRST_DMA_LINE: u16 = 0x30;
const LAST_DMA_LINE: u16 = 0xF7;
const BADLINE_STEAL_CYCLES: u32 = 40;

/// `$D019`/`$D01A` raster bit.
const IRQ_RASTER: u8 = 0x01;
/// `$D019` bit 7: any enabled source pending.
const IRQ_ANY: u8 = 0x80;

pub const DEFAULT_D016: u8 = 0xC8;
pub const DEFAULT_BORDER: u8 = 0x0E;
pub const DEFAULT_BACKGROUND: u8 = 0x06;

#[derive(Debug, Clone)]
pub struct Vic {
    pub raster_counter: u16,
    pub raster_compare: u16,
    pub raster_irq_enabled: bool,
    pub irq_status: u8,
    pub irq_line: bool,
    pub cycles_per_line: u32,
    pub lines_per_frame: u16,
    /// Cycles stolen by badlines during the last `tick`.
    pub stolen_cycles: u32,
    /// Set when the raster wraps to 0.  Cleared by the caller.
    pub new_frame: bool,
    /// `$D016` as seen by the beam at the start of each text row.
    pub row_d016: [u8; ROWS as usize],
    cycle_accum: u32,
    raster_triggered: bool,
    regs: [u8; 64],
}

impl Vic {
    pub fn new(standard: VideoStandard) -> Self {
        let mut regs = [0u8; 64];
        regs[0x11] = 0x1B; // DEN, 25 rows, YSCROLL 3
        regs[0x16] = DEFAULT_D016;
        regs[0x18] = 0x14; // screen $0400, charset $1000
        regs[0x20] = DEFAULT_BORDER;
        regs[0x21] = DEFAULT_BACKGROUND;
        Self {
            raster_counter: 0,
            raster_compare: 0,
            raster_irq_enabled: false,
            irq_status: 0,
            irq_line: false,
            cycles_per_line: standard.cycles_per_line(),
            lines_per_frame: standard.lines_per_frame(),
            stolen_cycles: 0,
            new_frame: false,
            row_d016: [DEFAULT_D016; ROWS as usize],
            cycle_accum: 0,
            raster_triggered: false,
            regs,
        }
    }

    fn d011(&self) -> u8 {
        self.regs[0x11]
    }

    fn is_badline(&self, line: u16) -> bool {
        let den = self.d011() & 0x10 != 0;
        let yscroll = (self.d011() & 0x07) as u16;
        den && (FIRST_DMA_LINE..=LAST_DMA_LINE).contains(&line) && (line & 7) == yscroll
    }

    /// Text row whose first pixel line is `line`, if any.
    fn row_starting_at(&self, line: u16) -> Option<usize> {
        let first = FIRST_DMA_LINE + (self.d011() & 0x07) as u16;
        if line < first || (line - first) % 8 != 0 {
            return None;
        }
        let row = ((line - first) / 8) as usize;
        (row < ROWS as usize).then_some(row)
    }

    /// Advance the beam by `cycles`.  Returns true if a raster IRQ was raised.
    pub fn tick(&mut self, cycles: u32) -> bool {
        self.cycle_accum += cycles;
        self.stolen_cycles = 0;
        let mut fired = false;

        while self.cycle_accum >= self.cycles_per_line {
            self.cycle_accum -= self.cycles_per_line;
            self.raster_counter += 1;

            if self.raster_counter >= self.lines_per_frame {
                self.raster_counter = 0;
                self.new_frame = true;
            }

            if self.is_badline(self.raster_counter) {
                self.stolen_cycles += BADLINE_STEAL_CYCLES;
            }
            if let Some(row) = self.row_starting_at(self.raster_counter) {
                self.row_d016[row] = self.regs[0x16];
            }

            if self.raster_counter != self.raster_compare {
                self.raster_triggered = false;
            } else if !self.raster_triggered {
                self.raster_triggered = true;
                self.irq_status |= IRQ_RASTER;

                if self.raster_irq_enabled {
                    self.irq_status |= IRQ_ANY;
                    self.irq_line = true;
                    fired = true;
                }
            }
        }
        fired
    }

    pub fn border(&self) -> u8 {
        self.regs[0x20] & 0x0F
    }

    pub fn background(&self) -> u8 {
        self.regs[0x21] & 0x0F
    }

    pub fn read(&self, offset: u16) -> u8 {
        let off = (offset & 0x3F) as usize;
        match off {
            0x11 => {
                let raster_hi = if self.raster_counter > 0xFF { 0x80 } else { 0x00 };
                (self.d011() & 0x7F) | raster_hi
            }
            0x12 => (self.raster_counter & 0xFF) as u8,
            0x16 => self.regs[off] | 0xC0,
            0x19 => self.irq_status | 0x70,
            0x1A => self.regs[off] | 0xF0,
            0x20..=0x2E => self.regs[off] | 0xF0,
            0x2F..=0x3F => 0xFF,
            _ => self.regs[off],
        }
    }

    pub fn write(&mut self, offset: u16, value: u8) {
        let off = (offset & 0x3F) as usize;
        match off {
            0x11 => {
                self.regs[off] = value;
                self.raster_compare =
                    (self.raster_compare & 0x00FF) | (((value as u16) & 0x80) << 1);
            }
            0x12 => {
                self.raster_compare = (self.raster_compare & 0x0100) | value as u16;
            }
            0x19 => {
                self.irq_status &= !(value & 0x0F);
                if self.irq_status & 0x0F == 0 {
                    self.irq_status &= !IRQ_ANY;
                    self.irq_line = false;
                }
            }
            0x1A => {
                self.regs[off] = value & 0x0F;
                self.raster_irq_enabled = value & IRQ_RASTER != 0;
                if self.raster_irq_enabled && self.irq_status & IRQ_RASTER != 0 {
                    self.irq_status |= IRQ_ANY;
                    self.irq_line = true;
                }
            }
            0x00..=0x2E => self.regs[off] = value,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_to_line(vic: &mut Vic, line: u16) {
        while vic.raster_counter != line {
            vic.tick(1);
        }
    }

    #[test]
    fn test_raster_irq_fires_once_per_frame_on_compare() {
        let mut vic = Vic::new(VideoStandard::Pal);
        vic.write(0x12, 100);
        vic.write(0x1A, 0x01);

        let mut fired = 0;
        for _ in 0..2 * 312 * 63 {
            if vic.tick(1) {
                fired += 1;
                assert_eq!(vic.raster_counter, 100);
                vic.write(0x19, 0x01);
            }
        }
        assert_eq!(fired, 2);
    }

    #[test]
    fn test_ack_drops_irq_line() {
        let mut vic = Vic::new(VideoStandard::Pal);
        vic.write(0x12, 5);
        vic.write(0x1A, 0x01);
        run_to_line(&mut vic, 5);
        assert!(vic.irq_line);
        assert_eq!(vic.read(0x19) & 0x81, 0x81);

        vic.write(0x19, 0x01);
        assert!(!vic.irq_line);
        assert_eq!(vic.read(0x19) & 0x8F, 0);
    }

    #[test]
    fn test_ninth_raster_bit() {
        let mut vic = Vic::new(VideoStandard::Pal);
        vic.write(0x11, 0x9B);
        vic.write(0x12, 0x10);
        assert_eq!(vic.raster_compare, 0x110);
        vic.write(0x11, 0x1B);
        assert_eq!(vic.raster_compare, 0x010);

        run_to_line(&mut vic, 0x105);
        assert_eq!(vic.read(0x11) & 0x80, 0x80);
        assert_eq!(vic.read(0x12), 0x05);
    }

    #[test]
    fn test_geometry() {
        let mut pal = Vic::new(VideoStandard::Pal);
        pal.tick(312 * 63);
        assert!(pal.new_frame);
        assert_eq!(pal.raster_counter, 0);

        let mut ntsc = Vic::new(VideoStandard::Ntsc);
        ntsc.tick(262 * 65);
        assert!(!ntsc.new_frame);
        ntsc.tick(65);
        assert!(ntsc.new_frame);
    }

    #[test]
    fn test_row_latches_d016_at_its_first_line() {
        let mut vic = Vic::new(VideoStandard::Pal);
        vic.write(0x16, 0xC0);
        run_to_line(&mut vic, 0xF2);
        vic.write(0x16, 0xC5);
        run_to_line(&mut vic, 0xF3);

        assert_eq!(vic.row_d016[23], 0xC0);
        assert_eq!(vic.row_d016[24], 0xC5);
    }

    #[test]
    fn test_badlines_steal_cycles() {
        let mut vic = Vic::new(VideoStandard::Pal);
        run_to_line(&mut vic, 0x32);
        vic.tick(63);
        assert_eq!(vic.raster_counter, 0x33);
        assert_eq!(vic.stolen_cycles, BADLINE_STEAL_CYCLES);
        vic.tick(63);
        assert_eq!(vic.stolen_cycles, 0);
    }
}
