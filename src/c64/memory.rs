// C64 address bus: 64 KiB RAM, processor-port banking, I/O chips and a
// stub KERNAL that covers the interrupt path and nothing else.

use mos6502::memory::Bus;

use super::cia::Cia;
use super::vic::Vic;
use super::VideoStandard;
use crate::hw::{KERNAL_IRQ, KERNAL_IRQ_EXIT};

/// Hardware IRQ entry: save A/X/Y, then `JMP ($0314)`.
pub const KERNAL_IRQ_ENTRY: u16 = 0xFF48;
/// Where the foreground sits once the machine has "booted".
pub const IDLE_LOOP: u16 = 0xE5CD;

pub const COLOR_RAM: u16 = 0xD800;
const LIGHT_BLUE: u8 = 0x0E;

const JIFFY_CLOCK: u16 = 0x00A0;

// ─────────────────────────────────────────────────────────────────────────────
//  Approximate 6502 cycle counts per opcode
// ─────────────────────────────────────────────────────────────────────────────

static OPCODE_CYCLES: [u8; 256] = [
    //0  1  2  3  4  5  6  7  8  9  A  B  C  D  E  F
    7, 6, 2, 8, 3, 3, 5, 5, 3, 2, 2, 2, 4, 4, 6, 6, // 0x
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // 1x
    6, 6, 2, 8, 3, 3, 5, 5, 4, 2, 2, 2, 4, 4, 6, 6, // 2x
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // 3x
    6, 6, 2, 8, 3, 3, 5, 5, 3, 2, 2, 2, 3, 4, 6, 6, // 4x
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // 5x
    6, 6, 2, 8, 3, 3, 5, 5, 4, 2, 2, 2, 5, 4, 6, 6, // 6x
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // 7x
    2, 6, 2, 6, 3, 3, 3, 3, 2, 2, 2, 2, 4, 4, 4, 4, // 8x
    2, 6, 2, 6, 4, 4, 4, 4, 2, 5, 2, 5, 5, 5, 5, 5, // 9x
    2, 6, 2, 6, 3, 3, 3, 3, 2, 2, 2, 2, 4, 4, 4, 4, // Ax
    2, 5, 2, 5, 4, 4, 4, 4, 2, 4, 2, 4, 4, 4, 4, 4, // Bx
    2, 6, 2, 8, 3, 3, 5, 5, 2, 2, 2, 2, 4, 4, 6, 6, // Cx
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // Dx
    2, 6, 2, 8, 3, 3, 5, 5, 2, 2, 2, 2, 4, 4, 6, 6, // Ex
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // Fx
];

pub struct C64Memory {
    pub ram: Box<[u8; 0x1_0000]>,
    /// KERNAL ROM overlay for $E000-$FFFF (8 KiB).
    kernal_rom: Box<[u8; 0x2000]>,
    pub cia1: Cia,
    pub cia2: Cia,
    pub vic: Vic,
}

/// Check if I/O is visible at $D000-$DFFF.
#[inline]
fn io_visible(port: u8) -> bool {
    let loram = port & 0x01 != 0;
    let hiram = port & 0x02 != 0;
    let charen = port & 0x04 != 0;
    (loram || hiram) && charen
}

/// Check if KERNAL ROM is visible at $E000-$FFFF.
#[inline]
fn kernal_visible(port: u8) -> bool {
    port & 0x02 != 0
}

impl C64Memory {
    pub fn new(standard: VideoStandard) -> Self {
        let mut ram = Box::new([0u8; 0x1_0000]);
        ram[0x0000] = 0x2F; // DDR: bits 0-2,5 output
        ram[0x0001] = 0x37; // BASIC+KERNAL+I/O visible
        ram[0x02A6] = u8::from(standard == VideoStandard::Pal);
        ram[0x0286] = LIGHT_BLUE; // cursor colour

        // Software vectors the KERNAL sets up at boot.
        set_word(&mut ram[..], 0x0314, KERNAL_IRQ);
        set_word(&mut ram[..], 0x0316, KERNAL_IRQ_EXIT);

        let color = COLOR_RAM as usize;
        ram[color..color + 0x400].fill(LIGHT_BLUE);

        let mut cia1 = Cia::new();
        cia1.kernal_defaults(standard);

        Self {
            ram,
            kernal_rom: kernal_stubs(),
            cia1,
            cia2: Cia::new(),
            vic: Vic::new(standard),
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let a = addr as usize;
        let end = (a + data.len()).min(0x1_0000);
        self.ram[a..end].copy_from_slice(&data[..end - a]);
    }

    /// Cycle cost of the instruction at `pc`, read through the same
    /// banking view the CPU fetches from.
    pub fn opcode_cycles(&self, pc: u16) -> u32 {
        let byte = if pc >= 0xE000 && kernal_visible(self.ram[0x0001]) {
            self.kernal_rom[(pc - 0xE000) as usize]
        } else {
            self.ram[pc as usize]
        };
        OPCODE_CYCLES[byte as usize] as u32
    }

    /// KERNAL jiffy clock at $00A0-$00A2 (big-endian, 1/60 s ticks).
    pub fn jiffy_clock(&self) -> u32 {
        let base = JIFFY_CLOCK as usize;
        u32::from_be_bytes([0, self.ram[base], self.ram[base + 1], self.ram[base + 2]])
    }

    pub fn irq_pending(&self) -> bool {
        self.cia1.int_pending() || self.vic.irq_line
    }

    /// Push onto the 6502 stack page.
    pub fn push(&mut self, sp: &mut u8, value: u8) {
        self.ram[0x0100 | *sp as usize] = value;
        *sp = sp.wrapping_sub(1);
    }
}

impl Bus for C64Memory {
    fn get_byte(&mut self, address: u16) -> u8 {
        let port = self.ram[0x0001];

        match address {
            0xD000..=0xDFFF if io_visible(port) => match address {
                0xD000..=0xD3FF => self.vic.read(address - 0xD000),
                // Colour RAM is a nybble wide; the top half floats.
                0xD800..=0xDBFF => self.ram[address as usize] | 0xF0,
                0xDC00..=0xDCFF => self.cia1.read(((address - 0xDC00) & 0x0F) as u8),
                0xDD00..=0xDDFF => self.cia2.read(((address - 0xDD00) & 0x0F) as u8),
                // SID and expansion I/O are not fitted.
                _ => 0,
            },

            0xE000..=0xFFFF if kernal_visible(port) => self.kernal_rom[(address - 0xE000) as usize],

            _ => self.ram[address as usize],
        }
    }

    fn set_byte(&mut self, address: u16, value: u8) {
        if (0xD000..=0xDFFF).contains(&address) && io_visible(self.ram[0x0001]) {
            match address {
                0xD000..=0xD3FF => self.vic.write(address - 0xD000, value),
                0xD800..=0xDBFF => self.ram[address as usize] = value & 0x0F,
                0xDC00..=0xDCFF => self.cia1.write(((address - 0xDC00) & 0x0F) as u8, value),
                0xDD00..=0xDDFF => self.cia2.write(((address - 0xDD00) & 0x0F) as u8, value),
                _ => {}
            }
            return;
        }
        // Everything else, ROM areas included, writes through to RAM.
        self.ram[address as usize] = value;
    }
}

fn set_word(mem: &mut [u8], addr: u16, value: u16) {
    let a = addr as usize;
    mem[a..a + 2].copy_from_slice(&value.to_le_bytes());
}

// ─────────────────────────────────────────────────────────────────────────────
//  KERNAL stubs
// ─────────────────────────────────────────────────────────────────────────────

/// Just enough KERNAL for interrupt-driven programs: the IRQ entry, the
/// default service routine with the jiffy clock, the shared exit and an
/// idle loop for the foreground to park in.
fn kernal_stubs() -> Box<[u8; 0x2000]> {
    let mut rom = Box::new([0xEAu8; 0x2000]); // NOP fill
    let mut put = |addr: u16, code: &[u8]| {
        let off = (addr - 0xE000) as usize;
        rom[off..off + code.len()].copy_from_slice(code);
    };

    // $FF48: PHA / TXA / PHA / TYA / PHA / TSX / LDA $0104,X / AND #$10
    //        BNE brk / JMP ($0314) / brk: JMP ($0316)
    put(
        KERNAL_IRQ_ENTRY,
        &[
            0x48, 0x8A, 0x48, 0x98, 0x48, 0xBA, 0xBD, 0x04, 0x01, 0x29, 0x10, 0xD0, 0x03, 0x6C,
            0x14, 0x03, 0x6C, 0x16, 0x03,
        ],
    );

    // $EA31: LDA $DC0D / INC $A2 / BNE done / INC $A1 / BNE done / INC $A0
    //        done: JMP $EA81
    put(
        KERNAL_IRQ,
        &[
            0xAD, 0x0D, 0xDC, 0xE6, 0xA2, 0xD0, 0x06, 0xE6, 0xA1, 0xD0, 0x02, 0xE6, 0xA0, 0x4C,
            0x81, 0xEA,
        ],
    );

    // $EA81: PLA / TAY / PLA / TAX / PLA / RTI
    put(KERNAL_IRQ_EXIT, &[0x68, 0xA8, 0x68, 0xAA, 0x68, 0x40]);

    // $E5CD: JMP $E5CD
    put(IDLE_LOOP, &[0x4C, 0xCD, 0xE5]);

    // NMI parks on the exit's RTI; nothing drives the NMI line.
    put(0xFFFA, &(KERNAL_IRQ_EXIT + 5).to_le_bytes());
    put(0xFFFC, &IDLE_LOOP.to_le_bytes());
    put(0xFFFE, &KERNAL_IRQ_ENTRY.to_le_bytes());

    rom
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(mem: &mut C64Memory, addr: u16) -> u16 {
        mem.get_byte(addr) as u16 | (mem.get_byte(addr + 1) as u16) << 8
    }

    #[test]
    fn test_power_on_vectors() {
        let mut mem = C64Memory::new(VideoStandard::Pal);
        assert_eq!(word(&mut mem, 0xFFFE), KERNAL_IRQ_ENTRY);
        assert_eq!(word(&mut mem, 0x0314), KERNAL_IRQ);
        assert_eq!(mem.get_byte(KERNAL_IRQ), 0xAD);
        assert_eq!(mem.get_byte(IDLE_LOOP), 0x4C);
    }

    #[test]
    fn test_kernal_banked_out_shows_ram() {
        let mut mem = C64Memory::new(VideoStandard::Pal);
        mem.set_byte(0xFFFE, 0x34);
        assert_eq!(mem.get_byte(0xFFFE), 0x48);
        mem.set_byte(0x0001, 0x35);
        assert_eq!(mem.get_byte(0xFFFE), 0x34);
    }

    #[test]
    fn test_io_routes_to_chips() {
        let mut mem = C64Memory::new(VideoStandard::Pal);
        mem.set_byte(0xD012, 241);
        assert_eq!(mem.vic.raster_compare, 241);
        mem.set_byte(0xDC0D, 0x7F);
        assert_eq!(mem.cia1.int_mask, 0);

        // Banked out: plain RAM.
        mem.set_byte(0x0001, 0x30);
        mem.set_byte(0xD012, 0x55);
        assert_eq!(mem.vic.raster_compare, 241);
        assert_eq!(mem.get_byte(0xD012), 0x55);
    }

    #[test]
    fn test_color_ram_is_light_blue_nybbles() {
        let mut mem = C64Memory::new(VideoStandard::Ntsc);
        assert_eq!(mem.get_byte(COLOR_RAM) & 0x0F, LIGHT_BLUE);
        mem.set_byte(COLOR_RAM + 5, 0x31);
        assert_eq!(mem.get_byte(COLOR_RAM + 5), 0xF1);
    }

    #[test]
    fn test_jiffy_clock_reads_big_endian() {
        let mut mem = C64Memory::new(VideoStandard::Pal);
        mem.load(JIFFY_CLOCK, &[0x01, 0x02, 0x03]);
        assert_eq!(mem.jiffy_clock(), 0x010203);
    }

    #[test]
    fn test_cycle_table_sees_kernal_overlay() {
        let mut mem = C64Memory::new(VideoStandard::Pal);
        // JMP abs under the ROM, NOP in the RAM beneath.
        mem.set_byte(IDLE_LOOP, 0xEA);
        assert_eq!(mem.opcode_cycles(IDLE_LOOP), 3);
        mem.set_byte(0x0001, 0x35);
        assert_eq!(mem.opcode_cycles(IDLE_LOOP), 2);
    }
}
