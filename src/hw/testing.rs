//! Mock register bank for handler unit tests.
//!
//! Plain 64 KiB of RAM with just enough register behaviour to observe the
//! scroller: `$D012` reads return whatever raster line the test sets, and
//! every write is logged together with the interrupt mask state at the time.

use mos6502::memory::Bus;

use super::registers::{RasterLine, Register, VicInterruptStatus};
use super::{Epilogue, Hardware, IrqHandler};

/// Address `entry_point` hands out for the registered handler.
pub const TRAP_ADDRESS: u16 = 0xCF00;

pub struct RegisterBank {
    pub ram: Box<[u8; 0x1_0000]>,
    /// Current beam position reported by `$D012`.
    pub raster: u8,
    /// Last value written to `$D012`.
    pub raster_compare: Option<u8>,
    /// Writes to `$D019`.
    pub acks: u32,
    pub interrupts_enabled: bool,
    /// Every bus write: (address, value, interrupts enabled at the time).
    pub writes: Vec<(u16, u8, bool)>,
    handler: Option<IrqHandler<RegisterBank>>,
}

impl RegisterBank {
    pub fn new() -> Self {
        let mut ram = Box::new([0u8; 0x1_0000]);
        ram[0xD016] = 0xC8;
        ram[0xD011] = 0x9B;
        Self {
            ram,
            raster: 0,
            raster_compare: None,
            acks: 0,
            interrupts_enabled: true,
            writes: Vec::new(),
            handler: None,
        }
    }

    /// Put the beam on `line` and invoke the installed handler.
    pub fn fire(&mut self, line: u8) -> Epilogue {
        let handler = self.handler.expect("no handler installed");
        self.raster = line;
        handler(self)
    }

    /// One frame: the top interrupt, then the bottom one.
    pub fn fire_frame(&mut self) {
        self.fire(0);
        self.fire(241);
    }

    pub fn writes_to(&self, address: u16) -> Vec<u8> {
        self.writes
            .iter()
            .filter(|(a, _, _)| *a == address)
            .map(|(_, v, _)| *v)
            .collect()
    }
}

impl Hardware for RegisterBank {
    fn disable_interrupts(&mut self) {
        self.interrupts_enabled = false;
    }

    fn enable_interrupts(&mut self) {
        self.interrupts_enabled = true;
    }

    fn entry_point(&mut self, handler: IrqHandler<Self>) -> u16 {
        self.handler = Some(handler);
        TRAP_ADDRESS
    }
}

impl Bus for RegisterBank {
    fn get_byte(&mut self, address: u16) -> u8 {
        if address == RasterLine::ADDRESS {
            self.raster
        } else {
            self.ram[address as usize]
        }
    }

    fn set_byte(&mut self, address: u16, value: u8) {
        self.writes.push((address, value, self.interrupts_enabled));
        if address == RasterLine::ADDRESS {
            self.raster_compare = Some(value);
        } else if address == VicInterruptStatus::ADDRESS {
            self.acks += 1;
        }
        self.ram[address as usize] = value;
    }
}
