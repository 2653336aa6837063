//! 1x1 smooth text scroller on the bottom screen row.
//!
//! All of the work happens in a raster IRQ handler that fires twice a
//! frame.  At line 0 (beam off-screen) it clears the fine scroll and, once
//! every eight frames, moves the row one character left and feeds in the
//! next message character.  At line 241 (just above the last text row) it
//! sets the fine scroll, so only the bottom row is shifted and the change
//! never lands mid-row.

pub mod state;
pub mod text;

use crate::hw::registers::{
    Cia1InterruptControl, Cia2InterruptControl, IrqVector, RasterLine, Register, ScreenControl1,
    ScreenControl2, VicInterruptEnable, VicInterruptStatus, CIA_DISABLE_ALL, RASTER_BIT8,
    RASTER_IRQ,
};
use crate::hw::screen::{self, cell_address, COLUMNS, SPACE};
use crate::hw::{Epilogue, Hardware, IrqHandler};
use mos6502::memory::Bus;

pub use state::{MessageRef, ScrollState};

/// Raster line of the off-screen interrupt.
pub const TOP_LINE: u8 = 0;

/// Raster line of the interrupt just above the bottom text row.
pub const BOTTOM_LINE: u8 = 241;

/// Lines below this count as the top interrupt.  The handler runs a few
/// cycles after the compare fires, so the beam may already be past line 0.
pub const TOP_IRQ_THRESHOLD: u8 = 10;

/// The scrolled row.
pub const SCROLL_ROW: u16 = 24;

/// Fine scroll restarts here after each character shift.
pub const MAX_OFFSET: i8 = 7;

/// `$D016 &= $F0` at the top: XSCROLL to 0 and CSEL to 38 columns, so the
/// character entering on the right is hidden by the border.
const SCROLL_RESET_MASK: u8 = 0xF0;

#[derive(Debug, Clone, Copy)]
pub struct Scroller {
    message: MessageRef,
    entry: u16,
}

impl Scroller {
    /// Clear the screen and start scrolling `message` on the bottom row.
    ///
    /// `message.capacity` counts the trailing terminator; the scroller
    /// cycles through `capacity - 1` characters, which must be at least 1.
    pub fn new<H: Hardware>(hw: &mut H, message: MessageRef) -> Self {
        let len = message.cycle_len();
        debug_assert!(
            len >= 1 && len < u16::MAX,
            "scroll text must hold at least one character"
        );

        ScrollState {
            offset: 0,
            next_char: 0,
            message: message.address,
            len,
        }
        .store(hw);

        clear_screen(hw);
        let entry = install_raster_irq(hw, frame::<H>);

        log::info!(
            "[scroller] {} characters at ${:04X}, handler at ${:04X}",
            len,
            message.address,
            entry,
        );
        Self { message, entry }
    }

    pub fn cycle_len(&self) -> u16 {
        self.message.cycle_len()
    }

    /// Address written to the IRQ vector.
    pub fn entry_point(&self) -> u16 {
        self.entry
    }

    pub fn state<B: Bus>(&self, bus: &mut B) -> ScrollState {
        ScrollState::load(bus)
    }
}

/// Fill the whole screen with spaces.
pub fn clear_screen<B: Bus>(bus: &mut B) {
    screen::fill(bus, SPACE);
}

/// Point the KERNAL IRQ vector at `handler` and arm a raster IRQ on line 0.
///
/// Runs with interrupts masked; the CIA interrupt sources are switched off
/// so the raster IRQ is the only thing that can reach the handler.
pub fn install_raster_irq<H: Hardware>(hw: &mut H, handler: IrqHandler<H>) -> u16 {
    hw.disable_interrupts();

    Cia1InterruptControl::write(hw, CIA_DISABLE_ALL);
    Cia2InterruptControl::write(hw, CIA_DISABLE_ALL);
    ScreenControl1::modify(hw, |v| v & !RASTER_BIT8);
    RasterLine::write(hw, TOP_LINE);

    let entry = hw.entry_point(handler);
    IrqVector::write(hw, entry);

    VicInterruptEnable::write(hw, RASTER_IRQ);
    hw.enable_interrupts();
    entry
}

/// The raster IRQ handler.
pub fn frame<H: Hardware>(hw: &mut H) -> Epilogue {
    let line = RasterLine::read(hw);

    if line < TOP_IRQ_THRESHOLD {
        ScreenControl2::modify(hw, |v| v & SCROLL_RESET_MASK);
        RasterLine::write(hw, BOTTOM_LINE);

        let mut state = ScrollState::load(hw);
        state.offset -= 1;
        if state.offset < 0 {
            state.offset = MAX_OFFSET;
            shift_row_left(hw);

            let code = state.next_code(hw);
            hw.set_byte(cell_address(SCROLL_ROW, COLUMNS - 1), code);
            state.next_char += 1;
            if state.next_char >= state.len {
                state.next_char = 0;
            }
            log::trace!("[scroller] fed ${code:02X}, next {}", state.next_char);
        }
        state.store(hw);
    } else {
        let offset = ScrollState::load(hw).offset as u8;
        ScreenControl2::modify(hw, |v| v.wrapping_add(offset));
        RasterLine::write(hw, TOP_LINE);
    }

    VicInterruptStatus::write(hw, RASTER_IRQ);
    Epilogue::Kernal
}

/// Move cells 1..=39 of the scroll row to 0..=38.
fn shift_row_left<B: Bus>(bus: &mut B) {
    for col in 0..COLUMNS - 1 {
        let code = bus.get_byte(cell_address(SCROLL_ROW, col + 1));
        bus.set_byte(cell_address(SCROLL_ROW, col), code);
    }
}
