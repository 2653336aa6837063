// Background emulator engine. Runs the C64 in its own thread, one video
// frame per frame period, and talks to the GUI via crossbeam channels.

use std::io::{self, Write};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, select, tick, Receiver, Sender, TryRecvError};

use crate::c64::{Counters, Machine, ScreenSnapshot, VideoStandard};
use crate::scroller::text::{MESSAGE_ADDRESS, SCROLL_TEXT};
use crate::scroller::{MessageRef, ScrollState, Scroller, SCROLL_ROW};

// ─────────────────────────────────────────────────────────────────────────────
//  Public message types
// ─────────────────────────────────────────────────────────────────────────────

/// Commands sent from GUI → emulator thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmulatorCmd {
    TogglePause,
    /// Run exactly one frame (pauses first if running).
    StepFrame,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Paused,
}

/// Status sent from emulator thread → GUI after every frame.
#[derive(Debug, Clone)]
pub struct EmulatorStatus {
    pub state: RunState,
    pub standard: VideoStandard,
    pub counters: Counters,
    pub scroll: ScrollState,
    pub jiffies: u32,
    pub screen: ScreenSnapshot,
}

// ─────────────────────────────────────────────────────────────────────────────
//  Boot
// ─────────────────────────────────────────────────────────────────────────────

/// Power on, load the scroll text and start the scroller.
pub fn boot(standard: VideoStandard) -> (Machine, Scroller) {
    let mut machine = Machine::new(standard);
    machine.load(MESSAGE_ADDRESS, SCROLL_TEXT.as_bytes());
    let scroller = Scroller::new(
        &mut machine,
        MessageRef::new(MESSAGE_ADDRESS, SCROLL_TEXT.capacity()),
    );
    (machine, scroller)
}

fn status_of(machine: &mut Machine, scroller: &Scroller, state: RunState) -> EmulatorStatus {
    EmulatorStatus {
        state,
        standard: machine.standard(),
        counters: machine.counters(),
        scroll: scroller.state(machine),
        jiffies: machine.jiffy_clock(),
        screen: machine.snapshot(),
    }
}

/// Wait until `deadline` using sleep for bulk + spin for precision.
fn wait_until(deadline: Instant) {
    let now = Instant::now();
    if now >= deadline {
        return;
    }
    let remaining = deadline - now;
    if remaining > Duration::from_micros(1500) {
        thread::sleep(remaining - Duration::from_micros(1000));
    }
    while Instant::now() < deadline {
        std::hint::spin_loop();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
//  Emulator thread
// ─────────────────────────────────────────────────────────────────────────────

pub fn spawn_emulator(standard: VideoStandard) -> (Sender<EmulatorCmd>, Receiver<EmulatorStatus>) {
    let (cmd_tx, cmd_rx) = bounded::<EmulatorCmd>(64);
    let (status_tx, status_rx) = bounded::<EmulatorStatus>(16);

    thread::Builder::new()
        .name("c64-emulator".into())
        .spawn(move || {
            emulator_loop(standard, cmd_rx, status_tx);
        })
        .expect("Failed to spawn emulator thread");

    (cmd_tx, status_rx)
}

fn emulator_loop(
    standard: VideoStandard,
    cmd_rx: Receiver<EmulatorCmd>,
    status_tx: Sender<EmulatorStatus>,
) {
    let (mut machine, scroller) = boot(standard);
    let frame_dur = standard.frame_duration();
    let idle_tick = tick(Duration::from_millis(100));
    let mut state = RunState::Running;
    let mut next_frame = Instant::now();

    log::info!(
        "[emulator] {standard} at {:.2} Hz",
        1.0 / frame_dur.as_secs_f64()
    );

    loop {
        match state {
            RunState::Paused => {
                select! {
                    recv(cmd_rx) -> msg => match msg {
                        Ok(EmulatorCmd::TogglePause) => {
                            state = RunState::Running;
                            next_frame = Instant::now();
                            log::debug!("[emulator] resumed");
                        }
                        Ok(EmulatorCmd::StepFrame) => {
                            machine.run_frame();
                            let _ = status_tx.try_send(status_of(&mut machine, &scroller, state));
                        }
                        Ok(EmulatorCmd::Quit) | Err(_) => break,
                    },
                    recv(idle_tick) -> _ => {
                        let _ = status_tx.try_send(status_of(&mut machine, &scroller, state));
                    }
                }
            }
            RunState::Running => {
                // Drain commands (also detect GUI shutdown)
                loop {
                    match cmd_rx.try_recv() {
                        Ok(EmulatorCmd::TogglePause) | Ok(EmulatorCmd::StepFrame) => {
                            state = RunState::Paused;
                            log::debug!("[emulator] paused at frame {}", machine.counters().frames);
                        }
                        Ok(EmulatorCmd::Quit) | Err(TryRecvError::Disconnected) => {
                            log::info!("[emulator] thread exiting");
                            return;
                        }
                        Err(TryRecvError::Empty) => break,
                    }
                }
                if state != RunState::Running {
                    continue;
                }

                machine.run_frame();
                let counters = machine.counters();
                if counters.frames % 500 == 0 {
                    log::debug!(
                        "[emulator] frame {}: {} IRQs, {} handler calls",
                        counters.frames,
                        counters.irqs,
                        counters.handler_calls,
                    );
                }

                // ── Absolute-timeline frame pacing ───────────────────────
                next_frame += frame_dur;
                let now = Instant::now();
                if next_frame < now {
                    next_frame = now;
                }
                wait_until(next_frame);

                let _ = status_tx.try_send(status_of(&mut machine, &scroller, state));
            }
        }
    }

    log::info!("[emulator] thread exiting");
}

// ─────────────────────────────────────────────────────────────────────────────
//  Headless run
// ─────────────────────────────────────────────────────────────────────────────

/// Run `frames` frames flat out and print the scroll row every time a new
/// character enters it.
pub fn run_headless<W: Write>(standard: VideoStandard, frames: u32, out: &mut W) -> io::Result<()> {
    let (mut machine, scroller) = boot(standard);
    let mut last = scroller.state(&mut machine).next_char;

    writeln!(out, "{standard}: {} characters, {frames} frames", scroller.cycle_len())?;
    for _ in 0..frames {
        machine.run_frame();
        let scroll = scroller.state(&mut machine);
        if scroll.next_char != last {
            last = scroll.next_char;
            let frame = machine.counters().frames;
            writeln!(out, "{frame:6} |{}|", machine.snapshot().row_text(SCROLL_ROW))?;
        }
    }

    let counters = machine.counters();
    writeln!(
        out,
        "{} frames, {} IRQs, {} handler calls, jiffy clock {}",
        counters.frames,
        counters.irqs,
        counters.handler_calls,
        machine.jiffy_clock(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_prints_one_line_per_character() {
        let mut out = Vec::new();
        // First frame reaches line 0, then 8 frames per character.
        run_headless(VideoStandard::Pal, 1 + 8 * 5, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let rows: Vec<&str> = text.lines().filter(|l| l.contains('|')).collect();
        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|r| r.chars().filter(|&c| c == '|').count() == 2));
        assert!(text.lines().last().unwrap().starts_with("41 frames"));
    }

    #[test]
    fn test_thread_steps_and_quits() {
        let (cmd_tx, status_rx) = spawn_emulator(VideoStandard::Ntsc);
        cmd_tx.send(EmulatorCmd::TogglePause).unwrap();

        // Wait for the pause to land.
        let paused = loop {
            let status = status_rx.recv_timeout(Duration::from_secs(5)).unwrap();
            if status.state == RunState::Paused {
                break status;
            }
        };
        while status_rx.try_recv().is_ok() {}

        cmd_tx.send(EmulatorCmd::StepFrame).unwrap();
        let stepped = loop {
            let status = status_rx.recv_timeout(Duration::from_secs(5)).unwrap();
            if status.counters.frames > paused.counters.frames {
                break status;
            }
        };
        assert_eq!(stepped.counters.frames, paused.counters.frames + 1);
        assert_eq!(stepped.state, RunState::Paused);

        cmd_tx.send(EmulatorCmd::Quit).unwrap();
    }

    #[test]
    fn test_boot_loads_message() {
        let (mut machine, scroller) = boot(VideoStandard::Pal);
        assert_eq!(scroller.cycle_len() as usize, SCROLL_TEXT.as_bytes().len() - 1);
        let state = scroller.state(&mut machine);
        assert_eq!(state.message, MESSAGE_ADDRESS);
        assert_eq!(state.next_char, 0);
    }
}
