//! The whole machine: CPU, bus and chips, stepped one instruction at a time.
//!
//! The `mos6502` core has no interrupt input, so IRQs are delivered by hand
//! between instructions.  Native Rust IRQ handlers are reached through trap
//! addresses: when the program counter lands on one, the handler runs in
//! place of 6502 code and execution continues at its [`Epilogue`].

use mos6502::cpu::CPU;
use mos6502::instruction::Nmos6502;
use mos6502::memory::Bus;
use mos6502::registers::{StackPointer, Status};

use super::memory::{C64Memory, COLOR_RAM, IDLE_LOOP};
use super::{ScreenSnapshot, VideoStandard};
use crate::hw::screen::{CELLS, SCREEN_RAM};
use crate::hw::{Epilogue, Hardware, IrqHandler};

/// First native handler trap.  The page is reserved for traps.
pub const TRAP_BASE: u16 = 0xCF00;
const TRAP_STRIDE: u16 = 4;
const MAX_TRAPS: usize = 0x100 / TRAP_STRIDE as usize;

/// 6502 interrupt sequence length.
const IRQ_CYCLES: u32 = 7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    /// Completed video frames.
    pub frames: u64,
    /// CPU cycles, badline stalls included.
    pub cycles: u64,
    /// IRQs taken by the CPU.
    pub irqs: u64,
    /// Native handler invocations.
    pub handler_calls: u64,
}

pub struct Machine {
    cpu: CPU<C64Memory, Nmos6502>,
    standard: VideoStandard,
    traps: Vec<IrqHandler<Machine>>,
    counters: Counters,
}

impl Machine {
    /// A machine in the state the KERNAL leaves it after boot: interrupts
    /// on, CIA1 ticking the 60 Hz IRQ, foreground parked in an idle loop.
    pub fn new(standard: VideoStandard) -> Self {
        let mut cpu = CPU::new(C64Memory::new(standard), Nmos6502);
        cpu.registers.program_counter = IDLE_LOOP;
        cpu.registers.stack_pointer = StackPointer(0xFD);
        cpu.registers.status.remove(Status::PS_DISABLE_INTERRUPTS);

        log::debug!(
            "[c64] power on, {standard}, {} cycles/frame",
            standard.cycles_per_frame()
        );
        Self {
            cpu,
            standard,
            traps: Vec::new(),
            counters: Counters::default(),
        }
    }

    pub fn standard(&self) -> VideoStandard {
        self.standard
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn memory(&self) -> &C64Memory {
        &self.cpu.memory
    }

    pub fn jiffy_clock(&self) -> u32 {
        self.cpu.memory.jiffy_clock()
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        self.cpu.memory.load(addr, data);
    }

    /// Execute one instruction (or one native handler) and let the chips
    /// catch up.  Returns the cycles that elapsed.
    pub fn step(&mut self) -> u32 {
        let pc = self.cpu.registers.program_counter;
        if let Some(handler) = self.trap_at(pc) {
            self.counters.handler_calls += 1;
            let epilogue = handler(self);
            self.cpu.registers.program_counter = epilogue.address();
            return 0;
        }

        let inst_cycles = self.cpu.memory.opcode_cycles(pc);
        self.cpu.single_step();
        let mut elapsed = self.tick(inst_cycles);

        // IRQ (level-triggered)
        if self.cpu.memory.irq_pending() && self.deliver_irq() {
            elapsed += self.tick(IRQ_CYCLES);
        }
        elapsed
    }

    /// Run for at least `cycles` cycles.
    pub fn run_cycles(&mut self, cycles: u32) {
        let mut done: u32 = 0;
        while done < cycles {
            done += self.step();
        }
    }

    /// Run until the raster wraps back to line 0.
    pub fn run_frame(&mut self) {
        let target = self.counters.frames + 1;
        while self.counters.frames < target {
            self.step();
        }
    }

    pub fn run_frames(&mut self, frames: u32) {
        for _ in 0..frames {
            self.run_frame();
        }
    }

    pub fn snapshot(&self) -> ScreenSnapshot {
        let mem = &self.cpu.memory;
        let screen = SCREEN_RAM as usize;
        let color = COLOR_RAM as usize;
        let cells = CELLS as usize;

        let mut snap = ScreenSnapshot {
            cells: [0; CELLS as usize],
            colors: [0; CELLS as usize],
            row_d016: mem.vic.row_d016,
            border: mem.vic.border(),
            background: mem.vic.background(),
        };
        snap.cells.copy_from_slice(&mem.ram[screen..screen + cells]);
        snap.colors.copy_from_slice(&mem.ram[color..color + cells]);
        snap
    }

    /// Advance CIA1, CIA2 and the VIC by `cycles`, plus whatever the VIC
    /// steals for badlines along the way.
    fn tick(&mut self, cycles: u32) -> u32 {
        let mem = &mut self.cpu.memory;
        let mut total = 0;
        let mut pending = cycles;

        while pending > 0 {
            mem.cia1.tick(pending);
            mem.cia2.tick(pending);
            mem.vic.tick(pending);
            total += pending;

            if mem.vic.new_frame {
                mem.vic.new_frame = false;
                self.counters.frames += 1;
            }
            // Badline: CPU stalled while the chips keep running.
            pending = mem.vic.stolen_cycles;
        }
        self.counters.cycles += total as u64;
        total
    }

    /// Push PC and status, set I, load PC from `$FFFE`.  Returns false if
    /// the I flag masked the request.
    fn deliver_irq(&mut self) -> bool {
        if self.cpu.registers.status.contains(Status::PS_DISABLE_INTERRUPTS) {
            return false;
        }

        let pc = self.cpu.registers.program_counter;
        let mut sp = self.cpu.registers.stack_pointer.0;
        // B clear, unused bit set.
        let status = (self.cpu.registers.status.bits() | 0x20) & !0x10;

        let mem = &mut self.cpu.memory;
        mem.push(&mut sp, (pc >> 8) as u8);
        mem.push(&mut sp, (pc & 0xFF) as u8);
        mem.push(&mut sp, status);

        self.cpu.registers.stack_pointer = StackPointer(sp);
        self.cpu.registers.status.insert(Status::PS_DISABLE_INTERRUPTS);

        let lo = self.cpu.memory.get_byte(0xFFFE) as u16;
        let hi = self.cpu.memory.get_byte(0xFFFF) as u16;
        self.cpu.registers.program_counter = (hi << 8) | lo;

        self.counters.irqs += 1;
        true
    }

    fn trap_at(&self, pc: u16) -> Option<IrqHandler<Machine>> {
        let offset = pc.checked_sub(TRAP_BASE)?;
        if offset % TRAP_STRIDE != 0 {
            return None;
        }
        self.traps.get((offset / TRAP_STRIDE) as usize).copied()
    }
}

impl Bus for Machine {
    fn get_byte(&mut self, address: u16) -> u8 {
        self.cpu.memory.get_byte(address)
    }

    fn set_byte(&mut self, address: u16, value: u8) {
        self.cpu.memory.set_byte(address, value);
    }
}

impl Hardware for Machine {
    fn disable_interrupts(&mut self) {
        self.cpu.registers.status.insert(Status::PS_DISABLE_INTERRUPTS);
    }

    fn enable_interrupts(&mut self) {
        self.cpu.registers.status.remove(Status::PS_DISABLE_INTERRUPTS);
    }

    fn entry_point(&mut self, handler: IrqHandler<Self>) -> u16 {
        let slot = if self.traps.len() < MAX_TRAPS {
            self.traps.push(handler);
            self.traps.len() - 1
        } else {
            log::warn!("[c64] trap page full, replacing the last handler");
            let last = MAX_TRAPS - 1;
            self.traps[last] = handler;
            last
        };
        let address = TRAP_BASE + slot as u16 * TRAP_STRIDE;
        // Back the trap with JMP $EA31 so the vector target is real code.
        let [lo, hi] = Epilogue::Kernal.address().to_le_bytes();
        self.cpu.memory.load(address, &[0x4C, lo, hi]);
        address
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hw::registers::{IrqVector, Register, XSCROLL_MASK};
    use crate::hw::screen::{screen_code, SPACE};
    use crate::scroller::text::{MESSAGE_ADDRESS, SCROLL_TEXT};
    use crate::scroller::{MessageRef, Scroller, SCROLL_ROW};

    fn boot(standard: VideoStandard, text: &[u8]) -> (Machine, Scroller) {
        let mut machine = Machine::new(standard);
        let mut codes: Vec<u8> = text.iter().map(|&c| screen_code(c)).collect();
        codes.push(0);
        machine.load(MESSAGE_ADDRESS, &codes);
        let scroller = Scroller::new(
            &mut machine,
            MessageRef::new(MESSAGE_ADDRESS, codes.len() as u16),
        );
        (machine, scroller)
    }

    /// Frames from boot until the `shifts`-th character has entered.  The
    /// first frame only gets the beam back to line 0.
    fn frames_for_shifts(shifts: u32) -> u32 {
        8 * (shifts - 1) + 2
    }

    fn count_handler(m: &mut Machine) -> Epilogue {
        let n = m.get_byte(0x02);
        m.set_byte(0x02, n.wrapping_add(1));
        m.set_byte(0xD019, 0x01);
        Epilogue::Return
    }

    #[test]
    fn test_kernal_timer_ticks_jiffy_clock_before_install() {
        let mut m = Machine::new(VideoStandard::Pal);
        m.run_frames(50);
        // 60 Hz timer over ~1 s of PAL frames.
        let jiffies = m.jiffy_clock();
        assert!((58..=61).contains(&jiffies), "jiffies = {jiffies}");
        assert!(m.counters().irqs - jiffies as u64 <= 1);
    }

    #[test]
    fn test_run_cycles_tracks_the_beam() {
        let mut m = Machine::new(VideoStandard::Pal);
        m.run_cycles(VideoStandard::Pal.cycles_per_frame() * 3);
        assert_eq!(m.counters().frames, 3);
        assert!(m.counters().cycles >= 3 * 19_656);
    }

    #[test]
    fn test_trap_runs_native_handler() {
        let mut m = Machine::new(VideoStandard::Pal);
        m.disable_interrupts();
        let entry = m.entry_point(count_handler);
        assert_eq!(entry, TRAP_BASE);
        IrqVector::write(&mut m, entry);
        m.set_byte(0xDC0D, 0x7F);
        m.set_byte(0xD012, 100);
        m.set_byte(0xD01A, 0x01);
        m.enable_interrupts();

        m.run_frames(10);
        let calls = m.counters().handler_calls;
        assert!((9..=10).contains(&calls), "calls = {calls}");
        assert_eq!(m.get_byte(0x02) as u64, calls);
        // Return epilogue skips the KERNAL jiffy clock.
        assert_eq!(m.jiffy_clock(), 0);
    }

    #[test]
    fn test_traps_get_distinct_addresses() {
        let mut m = Machine::new(VideoStandard::Pal);
        let a = m.entry_point(count_handler);
        let b = m.entry_point(count_handler);
        assert_eq!(b, a + TRAP_STRIDE);
        assert!(m.trap_at(a + 1).is_none());
    }

    #[test]
    fn test_install_silences_cia_irqs() {
        let (mut m, scroller) = boot(VideoStandard::Pal, b"HELLO");
        assert_eq!(IrqVector::read(&mut m), scroller.entry_point());
        assert_eq!(m.memory().cia1.int_mask, 0);
        assert_eq!(m.memory().cia2.int_mask, 0);
        assert!(m.memory().vic.raster_irq_enabled);

        m.run_frames(20);
        let c = m.counters();
        // Two raster IRQs a frame and nothing else.  The top IRQ that ends
        // the last frame has been taken but not serviced yet.
        assert!((38..=40).contains(&c.irqs), "irqs = {}", c.irqs);
        assert!(c.irqs - c.handler_calls <= 1);
        // $EA31 runs after every handler call.
        assert_eq!(m.jiffy_clock() as u64, c.handler_calls);
    }

    #[test]
    fn test_bottom_row_scrolls_end_to_end() {
        let text = b"SCROLLING ON A REAL RASTER BEAM.";
        for standard in [VideoStandard::Pal, VideoStandard::Ntsc] {
            let (mut m, scroller) = boot(standard, text);
            let shifts = 45;
            m.run_frames(frames_for_shifts(shifts));

            let snap = m.snapshot();
            let row = snap.row(SCROLL_ROW);
            for (col, &cell) in row.iter().enumerate() {
                let k = shifts as isize - 40 + col as isize;
                let expected = if k < 0 {
                    SPACE
                } else {
                    screen_code(text[k as usize % text.len()])
                };
                assert_eq!(cell, expected, "{standard} col={col}");
            }
            assert_eq!(
                scroller.state(&mut m).next_char as usize,
                shifts as usize % text.len()
            );
            assert!(snap.row(0).iter().all(|&c| c == SPACE));
        }
    }

    #[test]
    fn test_only_bottom_row_sees_fine_scroll() {
        let (mut m, scroller) = boot(VideoStandard::Pal, b"ABCDEFGH");
        // Nothing has run before the first line-0 interrupt.
        m.run_frame();
        for _ in 0..16 {
            m.run_frame();
            let snap = m.snapshot();
            let offset = scroller.state(&mut m).offset as u8;
            for row in 0..SCROLL_ROW {
                assert_eq!(snap.xscroll(row), 0, "row {row}");
                assert!(!snap.wide(row));
            }
            assert_eq!(snap.xscroll(SCROLL_ROW), offset & XSCROLL_MASK);
        }
    }

    #[test]
    fn test_snapshot_colors() {
        let (m, _) = boot(VideoStandard::Pal, b"X");
        let snap = m.snapshot();
        assert_eq!(snap.color(0, 0), 0x0E);
        assert_eq!(snap.border, 0x0E);
        assert_eq!(snap.background, 0x06);
    }

    #[test]
    fn test_builtin_text_cycles_forever() {
        let mut m = Machine::new(VideoStandard::Pal);
        m.load(MESSAGE_ADDRESS, SCROLL_TEXT.as_bytes());
        let scroller = Scroller::new(
            &mut m,
            MessageRef::new(MESSAGE_ADDRESS, SCROLL_TEXT.capacity()),
        );
        let len = scroller.cycle_len() as u32;
        m.run_frames(frames_for_shifts(len + 1));
        assert_eq!(scroller.state(&mut m).next_char, 1);
    }
}
