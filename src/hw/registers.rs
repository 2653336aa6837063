//! Typed memory-mapped registers.
//!
//! One zero-sized type per register.  Every access goes through the bus:
//! nothing is cached, so a read always observes what the chip reports at
//! that moment (the raster line register changes under our feet).

use mos6502::memory::Bus;

pub trait Register {
    const ADDRESS: u16;

    fn read<B: Bus>(bus: &mut B) -> u8 {
        bus.get_byte(Self::ADDRESS)
    }

    fn write<B: Bus>(bus: &mut B, value: u8) {
        bus.set_byte(Self::ADDRESS, value);
    }

    /// Read-modify-write, as `LDA / AND / STA` would do it.
    fn modify<B: Bus>(bus: &mut B, f: impl FnOnce(u8) -> u8) {
        let value = Self::read(bus);
        Self::write(bus, f(value));
    }
}

macro_rules! register {
    ($(#[$doc:meta])* $name:ident = $addr:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name;

        impl Register for $name {
            const ADDRESS: u16 = $addr;
        }
    };
}

register!(
    /// CIA1 interrupt control and status ($DC0D).
    Cia1InterruptControl = 0xDC0D
);
register!(
    /// CIA2 interrupt control and status ($DD0D).
    Cia2InterruptControl = 0xDD0D
);
register!(
    /// VIC-II screen control #1 ($D011).  Bit 7 is bit 8 of the raster line.
    ScreenControl1 = 0xD011
);
register!(
    /// VIC-II raster line ($D012).  Read: current line.  Write: IRQ compare line.
    RasterLine = 0xD012
);
register!(
    /// VIC-II screen control #2 ($D016).  Bits 0-2 XSCROLL, bit 3 CSEL.
    ScreenControl2 = 0xD016
);
register!(
    /// VIC-II interrupt status ($D019).  Write 1 to a bit to acknowledge it.
    VicInterruptStatus = 0xD019
);
register!(
    /// VIC-II interrupt enable ($D01A).
    VicInterruptEnable = 0xD01A
);

// ── Bit fields ────────────────────────────────────────────────

/// `$DC0D` / `$DD0D`: bit 7 clear = clear the mask bits that are set.
pub const CIA_DISABLE_ALL: u8 = 0x7F;

/// `$D011` bit 7: raster compare bit 8.
pub const RASTER_BIT8: u8 = 0x80;

/// `$D016` bits 0-2: horizontal fine scroll.
pub const XSCROLL_MASK: u8 = 0x07;

/// `$D016` bit 3: 40 columns when set, 38 when clear.
pub const CSEL: u8 = 0x08;

/// `$D019` / `$D01A` bit 0: raster interrupt.
pub const RASTER_IRQ: u8 = 0x01;

// ── KERNAL IRQ vector ─────────────────────────────────────────

/// CINV ($0314/$0315): where the KERNAL IRQ entry at $FF48 jumps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrqVector;

impl IrqVector {
    pub const ADDRESS: u16 = 0x0314;

    pub fn read<B: Bus>(bus: &mut B) -> u16 {
        let lo = bus.get_byte(Self::ADDRESS) as u16;
        let hi = bus.get_byte(Self::ADDRESS + 1) as u16;
        (hi << 8) | lo
    }

    /// Low byte first, then high byte.
    pub fn write<B: Bus>(bus: &mut B, entry: u16) {
        bus.set_byte(Self::ADDRESS, (entry & 0xFF) as u8);
        bus.set_byte(Self::ADDRESS + 1, (entry >> 8) as u8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hw::testing::RegisterBank;

    #[test]
    fn test_modify_reads_through_bus() {
        let mut bank = RegisterBank::new();
        ScreenControl2::write(&mut bank, 0xC8);
        ScreenControl2::modify(&mut bank, |v| v | 0x03);
        assert_eq!(ScreenControl2::read(&mut bank), 0xCB);
    }

    #[test]
    fn test_raster_line_read_is_live() {
        let mut bank = RegisterBank::new();
        bank.raster = 17;
        assert_eq!(RasterLine::read(&mut bank), 17);
        bank.raster = 241;
        assert_eq!(RasterLine::read(&mut bank), 241);
    }

    #[test]
    fn test_irq_vector_byte_order() {
        let mut bank = RegisterBank::new();
        IrqVector::write(&mut bank, 0xCF00);
        assert_eq!(bank.ram[0x0314], 0x00);
        assert_eq!(bank.ram[0x0315], 0xCF);
        assert_eq!(IrqVector::read(&mut bank), 0xCF00);
    }
}
