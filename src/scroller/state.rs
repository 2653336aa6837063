//! The scroller's process-wide state record.
//!
//! The IRQ vector can only hold a bare address, so the handler cannot carry
//! a `self`.  Its state sits at a fixed address instead and is read and
//! written through the bus, exactly where a 6502 program keeps its statics.
//! The foreground writes it once before the handler is installed; after
//! that the handler is its only writer.

use mos6502::memory::Bus;

/// Base address of the record.
pub const STATE_BLOCK: u16 = 0xC000;

const OFFSET: u16 = STATE_BLOCK;
const NEXT_CHAR: u16 = STATE_BLOCK + 1;
const MESSAGE: u16 = STATE_BLOCK + 3;
const LEN: u16 = STATE_BLOCK + 5;

/// Where the scroll text lives and how much of it to cycle through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    pub address: u16,
    /// Buffer size including the trailing terminator.
    pub capacity: u16,
}

impl MessageRef {
    pub const fn new(address: u16, capacity: u16) -> Self {
        Self { address, capacity }
    }

    /// Number of characters the scroller cycles through.
    pub const fn cycle_len(&self) -> u16 {
        self.capacity.wrapping_sub(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollState {
    /// Pixel phase within the current character cell, 7 down to 0.
    pub offset: i8,
    /// Index of the next message character to enter the row.
    pub next_char: u16,
    pub message: u16,
    pub len: u16,
}

impl ScrollState {
    pub fn load<B: Bus>(bus: &mut B) -> Self {
        Self {
            offset: bus.get_byte(OFFSET) as i8,
            next_char: read_word(bus, NEXT_CHAR),
            message: read_word(bus, MESSAGE),
            len: read_word(bus, LEN),
        }
    }

    pub fn store<B: Bus>(&self, bus: &mut B) {
        bus.set_byte(OFFSET, self.offset as u8);
        write_word(bus, NEXT_CHAR, self.next_char);
        write_word(bus, MESSAGE, self.message);
        write_word(bus, LEN, self.len);
    }

    /// Screen code of the character `next_char` points at.
    pub fn next_code<B: Bus>(&self, bus: &mut B) -> u8 {
        bus.get_byte(self.message.wrapping_add(self.next_char))
    }
}

fn read_word<B: Bus>(bus: &mut B, addr: u16) -> u16 {
    bus.get_byte(addr) as u16 | ((bus.get_byte(addr + 1) as u16) << 8)
}

fn write_word<B: Bus>(bus: &mut B, addr: u16, value: u16) {
    bus.set_byte(addr, (value & 0xFF) as u8);
    bus.set_byte(addr + 1, (value >> 8) as u8);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hw::testing::RegisterBank;

    #[test]
    fn test_state_layout() {
        let mut bank = RegisterBank::new();
        let state = ScrollState {
            offset: -1,
            next_char: 0x0123,
            message: 0xC100,
            len: 300,
        };
        state.store(&mut bank);

        assert_eq!(bank.ram[0xC000], 0xFF);
        assert_eq!(&bank.ram[0xC001..0xC003], &[0x23, 0x01]);
        assert_eq!(&bank.ram[0xC003..0xC005], &[0x00, 0xC1]);
        assert_eq!(&bank.ram[0xC005..0xC007], &[0x2C, 0x01]);
        assert_eq!(ScrollState::load(&mut bank), state);
    }

    #[test]
    fn test_cycle_len_excludes_terminator() {
        assert_eq!(MessageRef::new(0xC100, 5).cycle_len(), 4);
    }
}
