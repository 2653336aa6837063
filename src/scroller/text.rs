//! Compile-time scroll text.

use crate::hw::screen::screen_code;

/// Where the program image puts the scroll text.
pub const MESSAGE_ADDRESS: u16 = 0xC100;

const MESSAGE: &[u8] = b"1X1 RASTER SCROLLER ON AN EMULATED COMMODORE 64. \
TWO RASTER INTERRUPTS A FRAME: LINE 0 CLEARS THE FINE SCROLL, LINE 241 SETS IT \
FOR THE BOTTOM ROW. EIGHT FRAMES PER CHARACTER, ONE PIXEL PER FRAME.    ";

/// The built-in scroll text, already in screen codes.
pub static SCROLL_TEXT: ScrollText<{ MESSAGE.len() + 1 }> = ScrollText::new(MESSAGE);

/// A message buffer of `N` screen codes: the text plus a zero terminator.
#[derive(Debug, Clone, Copy)]
pub struct ScrollText<const N: usize> {
    codes: [u8; N],
}

impl<const N: usize> ScrollText<N> {
    /// Converts `text` to screen codes at compile time.
    ///
    /// Panics (at compile time when used in a `static`) unless
    /// `N == text.len() + 1`.
    pub const fn new(text: &[u8]) -> Self {
        assert!(text.len() + 1 == N, "buffer must hold the text plus a terminator");
        let mut codes = [0u8; N];
        let mut i = 0;
        while i < text.len() {
            codes[i] = screen_code(text[i]);
            i += 1;
        }
        Self { codes }
    }

    /// Buffer size, terminator included.
    pub const fn capacity(&self) -> u16 {
        N as u16
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.codes
    }
}
