//! MOS 6526 CIA: the two interval timers and the interrupt control register.
//!
//! CIA1 drives the CPU's IRQ line.  CIA2 is ticked but its NMI line is not
//! wired.  The KERNAL runs its 60 Hz housekeeping IRQ off CIA1 timer A; the
//! scroller switches every CIA source off so only the VIC raster IRQ is
//! left.  Ports, TOD and the serial register are not modelled: port reads
//! float high.

use super::VideoStandard;

// ── ICR bits ──────────────────────────────────────────────────

pub const ICR_TIMER_A: u8 = 0x01;
pub const ICR_TIMER_B: u8 = 0x02;
/// Write: set (1) or clear (0) the mask bits given.  Read: IRQ asserted.
pub const ICR_SET_CLEAR: u8 = 0x80;
const ICR_SOURCES: u8 = 0x1F;

#[derive(Debug, Clone)]
pub struct CiaTimer {
    pub counter: u16,
    pub latch: u16,
    pub running: bool,
    pub oneshot: bool,
}

impl CiaTimer {
    pub fn new() -> Self {
        Self {
            counter: 0xFFFF,
            latch: 0xFFFF,
            running: false,
            oneshot: false,
        }
    }

    /// Tick timer by `cycles` phi2 clocks.  Returns number of underflows.
    pub fn tick(&mut self, cycles: u32) -> u32 {
        let mut fires = 0u32;
        let mut remaining = cycles;

        while remaining > 0 && self.running {
            if remaining > self.counter as u32 {
                remaining -= self.counter as u32 + 1;
                fires += 1;
                self.counter = self.latch;
                if self.oneshot {
                    self.running = false;
                }
            } else {
                self.counter -= remaining as u16;
                remaining = 0;
            }
        }
        fires
    }

    pub fn write_lo(&mut self, value: u8) {
        self.latch = (self.latch & 0xFF00) | value as u16;
    }

    pub fn write_hi(&mut self, value: u8) {
        self.latch = (self.latch & 0x00FF) | ((value as u16) << 8);
        if !self.running {
            self.counter = self.latch;
        }
    }

    pub fn write_control(&mut self, value: u8) {
        let was_running = self.running;
        self.running = value & 0x01 != 0;
        self.oneshot = value & 0x08 != 0;
        // Bit 4: force load.
        if value & 0x10 != 0 || (!was_running && self.running) {
            self.counter = self.latch;
        }
    }
}

impl Default for CiaTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct Cia {
    pub timer_a: CiaTimer,
    pub timer_b: CiaTimer,
    /// Which sources may assert the interrupt line (bits 0-4).
    pub int_mask: u8,
    /// Which sources have fired since the last ICR read (bits 0-4).
    pub int_data: u8,
    cra: u8,
    crb: u8,
}

impl Cia {
    pub fn new() -> Self {
        Self {
            timer_a: CiaTimer::new(),
            timer_b: CiaTimer::new(),
            int_mask: 0,
            int_data: 0,
            cra: 0,
            crb: 0,
        }
    }

    /// State the KERNAL leaves CIA1 in after boot: timer A free-running at
    /// roughly 60 Hz with its interrupt enabled.
    pub fn kernal_defaults(&mut self, standard: VideoStandard) {
        let latch = match standard {
            VideoStandard::Pal => 0x4025,
            VideoStandard::Ntsc => 0x4295,
        };
        self.timer_a.latch = latch;
        self.timer_a.counter = latch;
        self.timer_a.running = true;
        self.timer_a.oneshot = false;
        self.cra = 0x01;
        self.int_mask = ICR_TIMER_A;
    }

    /// Tick both timers.  Returns true if an enabled source fired.
    pub fn tick(&mut self, cycles: u32) -> bool {
        if self.timer_a.tick(cycles) > 0 {
            self.int_data |= ICR_TIMER_A;
        }
        if self.timer_b.tick(cycles) > 0 {
            self.int_data |= ICR_TIMER_B;
        }
        self.int_pending()
    }

    pub fn int_pending(&self) -> bool {
        self.int_data & self.int_mask != 0
    }

    pub fn write(&mut self, offset: u8, value: u8) {
        match offset {
            0x04 => self.timer_a.write_lo(value),
            0x05 => self.timer_a.write_hi(value),
            0x06 => self.timer_b.write_lo(value),
            0x07 => self.timer_b.write_hi(value),
            0x0D => {
                if value & ICR_SET_CLEAR != 0 {
                    self.int_mask |= value & ICR_SOURCES;
                } else {
                    self.int_mask &= !(value & ICR_SOURCES);
                }
            }
            0x0E => {
                self.cra = value & 0xEF; // bit 4 is strobe
                self.timer_a.write_control(value);
            }
            0x0F => {
                self.crb = value & 0xEF;
                self.timer_b.write_control(value);
            }
            _ => {}
        }
    }

    pub fn read(&mut self, offset: u8) -> u8 {
        match offset {
            0x00..=0x03 => 0xFF,
            0x04 => (self.timer_a.counter & 0xFF) as u8,
            0x05 => (self.timer_a.counter >> 8) as u8,
            0x06 => (self.timer_b.counter & 0xFF) as u8,
            0x07 => (self.timer_b.counter >> 8) as u8,
            0x0D => {
                let mut val = self.int_data & ICR_SOURCES;
                if self.int_pending() {
                    val |= ICR_SET_CLEAR;
                }
                // Reading ICR clears all flags and deasserts the line.
                self.int_data = 0;
                val
            }
            0x0E => self.cra,
            0x0F => self.crb,
            _ => 0,
        }
    }
}

impl Default for Cia {
    fn default() -> Self {
        Self::new()
    }
}
