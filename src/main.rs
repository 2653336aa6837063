#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod ui;

use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use iced::widget::{column, container, rule};
use iced::{time, Color, Element, Length, Subscription, Task, Theme};

use rasterscroll::config::Config;
use rasterscroll::emulator::{self, EmulatorCmd, EmulatorStatus};
use ui::screen::{picture_size, ScreenView};
use ui::Message;

const USAGE: &str = "\
usage: rasterscroll [--pal | --ntsc] [--scale N] [--headless [--frames N]] [--save-config]

  --pal, --ntsc   video standard to emulate
  --scale N       window pixels per C64 pixel (1-6)
  --headless      run without a window and print the scroll row
  --frames N      frames to run with --headless
  --save-config   store the effective settings as the new defaults";

const KNOWN_FLAGS: &[&str] = &["--pal", "--ntsc", "--headless", "--save-config", "--help", "-h"];
const VALUE_FLAGS: &[&str] = &["--scale", "--frames"];

// ─────────────────────────────────────────────────────────────────────────────
//  Application state
// ─────────────────────────────────────────────────────────────────────────────

struct App {
    /// Channel to send commands to the emulator thread.
    cmd_tx: Sender<EmulatorCmd>,
    /// Channel to receive status from the emulator thread.
    status_rx: Receiver<EmulatorStatus>,
    /// Last known emulator status.
    status: Option<EmulatorStatus>,
    screen: ScreenView,
}

impl App {
    fn boot(config: Config) -> (Self, Task<Message>) {
        log::info!(
            "[rasterscroll] Config: standard={}, scale={}",
            config.video_standard,
            config.scale,
        );
        let (cmd_tx, status_rx) = emulator::spawn_emulator(config.video_standard);

        let app = Self {
            cmd_tx,
            status_rx,
            status: None,
            screen: ScreenView::new(config.scale),
        };
        (app, Task::none())
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::TogglePause => {
                let _ = self.cmd_tx.send(EmulatorCmd::TogglePause);
            }
            Message::StepFrame => {
                let _ = self.cmd_tx.send(EmulatorCmd::StepFrame);
            }
            Message::Tick => self.poll_status(),
        }
        Task::none()
    }

    fn view(&self) -> Element<'_, Message> {
        let content = column![
            ui::status_bar(self.status.as_ref()),
            rule::horizontal(1),
            ui::controls_bar(self.status.as_ref()),
            rule::horizontal(1),
            ui::screen_panel(&self.screen),
        ];

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .style(|_theme: &Theme| container::Style {
                background: Some(iced::Background::Color(Color::from_rgb(0.09, 0.10, 0.12))),
                ..Default::default()
            })
            .into()
    }

    fn subscription(&self) -> Subscription<Message> {
        // Redraw at ~50 Hz; the emulator runs at its own pace.
        time::every(Duration::from_millis(20)).map(|_| Message::Tick)
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }

    fn poll_status(&mut self) {
        // Drain all pending status messages, keep latest
        let mut latest = None;
        while let Ok(status) = self.status_rx.try_recv() {
            latest = Some(status);
        }
        if let Some(status) = latest {
            self.screen.update(&status.screen);
            self.status = Some(status);
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        log::info!("[rasterscroll] App closing, stopping emulator...");
        let _ = self.cmd_tx.send(EmulatorCmd::Quit);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
//  CLI argument helpers
// ─────────────────────────────────────────────────────────────────────────────

fn check_args(args: &[String]) -> Result<(), String> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if VALUE_FLAGS.contains(&arg.as_str()) {
            iter.next();
        } else if !KNOWN_FLAGS.contains(&arg.as_str()) {
            return Err(format!("Unknown argument: {arg}"));
        }
    }
    Ok(())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

// ─────────────────────────────────────────────────────────────────────────────
//  Entry point
// ─────────────────────────────────────────────────────────────────────────────

fn main() -> iced::Result {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("{USAGE}");
        return Ok(());
    }

    let mut config = Config::load();
    if let Err(e) = check_args(&args).and_then(|()| config.apply_args(&args)) {
        eprintln!("rasterscroll: {e}\n\n{USAGE}");
        std::process::exit(2);
    }
    if has_flag(&args, "--save-config") {
        config.save();
    }

    if has_flag(&args, "--headless") {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        if let Err(e) =
            emulator::run_headless(config.video_standard, config.headless_frames, &mut out)
        {
            log::error!("[rasterscroll] Headless run failed: {e}");
            std::process::exit(1);
        }
        return Ok(());
    }

    let picture = picture_size(config.scale);
    let window = (picture.width + 40.0, picture.height + 130.0);

    iced::application(move || App::boot(config.clone()), App::update, App::view)
        .title(|_: &App| format!("rasterscroll v{}", env!("CARGO_PKG_VERSION")))
        .subscription(App::subscription)
        .theme(App::theme)
        .window_size(window)
        .run()
}
