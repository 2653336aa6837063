//! The hardware seam the scroller is written against.
//!
//! Everything the effect does is a byte read or write on the C64 address
//! bus, plus `SEI` / `CLI` around the interrupt setup.  The bus half is the
//! `mos6502` crate's [`Bus`] trait so the same code drives the emulated
//! machine in [`crate::c64`] and the mock register bank used in tests.

pub mod registers;
pub mod screen;

#[cfg(test)]
pub mod testing;

use mos6502::memory::Bus;

/// KERNAL default IRQ service: CIA ack, jiffy clock, then restore + RTI.
pub const KERNAL_IRQ: u16 = 0xEA31;
/// KERNAL IRQ exit: `PLA / TAY / PLA / TAX / PLA / RTI`.
pub const KERNAL_IRQ_EXIT: u16 = 0xEA81;

/// Where control goes when a native IRQ handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Epilogue {
    /// `JMP $EA31`: run the rest of the system's frame tick.
    Kernal,
    /// `JMP $EA81`: restore registers and return from the interrupt.
    Return,
}

impl Epilogue {
    pub const fn address(self) -> u16 {
        match self {
            Epilogue::Kernal => KERNAL_IRQ,
            Epilogue::Return => KERNAL_IRQ_EXIT,
        }
    }
}

/// A raster IRQ service routine.
///
/// The IRQ vector holds a bare address, so handlers are plain function
/// pointers with no captured context.  Any state they need lives at a
/// fixed address on the bus.
pub type IrqHandler<H> = fn(&mut H) -> Epilogue;

/// A C64-shaped machine: the address bus plus interrupt masking.
pub trait Hardware: Bus + Sized {
    /// `SEI`.
    fn disable_interrupts(&mut self);

    /// `CLI`.
    fn enable_interrupts(&mut self);

    /// The address the IRQ vector must hold for `handler` to run.
    fn entry_point(&mut self, handler: IrqHandler<Self>) -> u16;
}
