//! Character RAM layout and screen codes.
//!
//! The default screen lives at $0400: 25 rows of 40 bytes, one screen code
//! per cell.  Screen codes are not ASCII: `@`, `A`..`Z` are 0..26, the
//! punctuation and digits at $20-$3F match ASCII.

use mos6502::memory::Bus;

pub const SCREEN_RAM: u16 = 0x0400;
pub const COLUMNS: u16 = 40;
pub const ROWS: u16 = 25;
pub const CELLS: u16 = COLUMNS * ROWS;

/// Screen code for a blank cell.
pub const SPACE: u8 = 0x20;

pub const fn cell_address(row: u16, col: u16) -> u16 {
    SCREEN_RAM + row * COLUMNS + col
}

/// Write `code` to all 1000 cells.
pub fn fill<B: Bus>(bus: &mut B, code: u8) {
    for i in 0..CELLS {
        bus.set_byte(SCREEN_RAM + i, code);
    }
}

pub fn read_row<B: Bus>(bus: &mut B, row: u16) -> [u8; COLUMNS as usize] {
    let mut out = [0u8; COLUMNS as usize];
    for (col, cell) in out.iter_mut().enumerate() {
        *cell = bus.get_byte(cell_address(row, col as u16));
    }
    out
}

/// ASCII → screen code (uppercase / graphics set).
///
/// Lowercase letters fold to uppercase.  Anything without a glyph in the
/// uppercase set becomes a space.
pub const fn screen_code(ascii: u8) -> u8 {
    match ascii {
        b'a'..=b'z' => ascii - 0x60,
        0x40..=0x5F => ascii - 0x40,
        0x20..=0x3F => ascii,
        _ => SPACE,
    }
}

/// Screen code → the character a host renderer should draw for it.
///
/// Reverse-video codes ($80-$FF) draw as their normal glyph; the graphics
/// block ($40-$7F) has no text equivalent and draws as a shade.
pub fn to_display_char(code: u8) -> char {
    match code & 0x7F {
        c @ 0x00..=0x1F => (c + 0x40) as char,
        c @ 0x20..=0x3F => c as char,
        _ => '▒',
    }
}
