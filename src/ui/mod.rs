pub mod screen;

use std::time::Duration;

use iced::widget::{button, column, container, row, text, Space};
use iced::{Alignment, Color, Element, Length, Padding, Theme};

use rasterscroll::emulator::{EmulatorStatus, RunState};
use screen::ScreenView;

// ─────────────────────────────────────────────────────────────────────────────
//  Messages
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Message {
    TogglePause,
    StepFrame,
    /// Emulator status tick
    Tick,
}

// ─────────────────────────────────────────────────────────────────────────────
//  View builders
// ─────────────────────────────────────────────────────────────────────────────

/// Status line: frame, machine, scroller position and interrupt counters.
pub fn status_bar<'a>(status: Option<&EmulatorStatus>) -> Element<'a, Message> {
    let (headline, detail) = match status {
        Some(s) => {
            let elapsed = s.standard.frame_duration() * s.counters.frames as u32;
            (
                format!(
                    "{}  Frame {}  •  {}  •  {}",
                    state_icon(s.state),
                    s.counters.frames,
                    s.standard,
                    format_duration(elapsed),
                ),
                format!(
                    "nextchar {}/{}  •  offset {}  •  {} IRQs  •  {} handler calls  •  jiffy {}",
                    s.scroll.next_char,
                    s.scroll.len,
                    s.scroll.offset,
                    s.counters.irqs,
                    s.counters.handler_calls,
                    s.jiffies,
                ),
            )
        }
        None => ("Starting…".to_string(), String::new()),
    };

    let info = column![
        text(headline).size(16),
        text(detail).size(12).color(Color::from_rgb(0.5, 0.5, 0.6)),
    ]
    .spacing(2)
    .width(Length::Fill);

    container(info)
        .padding(Padding::from([10, 16]))
        .width(Length::Fill)
        .style(|_theme: &Theme| container::Style {
            background: Some(iced::Background::Color(Color::from_rgb(0.10, 0.11, 0.14))),
            ..Default::default()
        })
        .into()
}

/// Pause / step controls.
pub fn controls_bar<'a>(status: Option<&EmulatorStatus>) -> Element<'a, Message> {
    let paused = status.is_some_and(|s| s.state == RunState::Paused);
    let pause_label = if paused { "▶ Run" } else { "❚❚ Pause" };

    let bar = row![
        tool_button(pause_label, Message::TogglePause),
        tool_button("Step frame", Message::StepFrame),
        Space::new().width(Length::Fill),
    ]
    .spacing(8)
    .align_y(Alignment::Center)
    .padding(Padding::from([6, 16]));

    container(bar)
        .width(Length::Fill)
        .style(|_theme: &Theme| container::Style {
            background: Some(iced::Background::Color(Color::from_rgb(0.12, 0.13, 0.16))),
            ..Default::default()
        })
        .into()
}

pub fn screen_panel(view: &ScreenView) -> Element<'_, Message> {
    container(view.view())
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
}

fn state_icon(state: RunState) -> &'static str {
    match state {
        RunState::Running => "▶",
        RunState::Paused => "❚❚",
    }
}

fn tool_button<'a>(label: &'a str, msg: Message) -> Element<'a, Message> {
    button(text(label).size(12))
        .on_press(msg)
        .padding(Padding::from([4, 10]))
        .style(|_theme: &Theme, status| {
            let bg = match status {
                button::Status::Hovered => Color::from_rgb(0.25, 0.27, 0.32),
                button::Status::Pressed => Color::from_rgb(0.18, 0.20, 0.24),
                _ => Color::from_rgb(0.18, 0.19, 0.22),
            };
            button::Style {
                background: Some(iced::Background::Color(bg)),
                text_color: Color::from_rgb(0.8, 0.82, 0.88),
                border: iced::Border {
                    radius: 3.0.into(),
                    width: 1.0,
                    color: Color::from_rgb(0.25, 0.27, 0.30),
                },
                ..Default::default()
            }
        })
        .into()
}

pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(0)), "0:00");
        assert_eq!(format_duration(Duration::from_secs(75)), "1:15");
    }
}
