use iced::widget::canvas::{self, Cache, Canvas, Frame, Geometry};
use iced::{mouse, Color, Element, Font, Length, Pixels, Point, Rectangle, Size, Theme};

use rasterscroll::c64::ScreenSnapshot;
use rasterscroll::hw::screen::{to_display_char, COLUMNS, ROWS};

/// Border around the 320×200 text area, in C64 pixels.
const BORDER: f32 = 32.0;
const CELL: f32 = 8.0;
const TEXT_W: f32 = COLUMNS as f32 * CELL;
const TEXT_H: f32 = ROWS as f32 * CELL;

/// Size of the whole picture, border included, at `scale`.
pub fn picture_size(scale: f32) -> Size {
    Size::new((TEXT_W + 2.0 * BORDER) * scale, (TEXT_H + 2.0 * BORDER) * scale)
}

/// VIC-II colours (Pepto).
const PALETTE: [(u8, u8, u8); 16] = [
    (0x00, 0x00, 0x00),
    (0xFF, 0xFF, 0xFF),
    (0x68, 0x37, 0x2B),
    (0x70, 0xA4, 0xB2),
    (0x6F, 0x3D, 0x86),
    (0x58, 0x8D, 0x43),
    (0x35, 0x28, 0x79),
    (0xB8, 0xC7, 0x6F),
    (0x6F, 0x4F, 0x25),
    (0x43, 0x39, 0x00),
    (0x9A, 0x67, 0x59),
    (0x44, 0x44, 0x44),
    (0x6C, 0x6C, 0x6C),
    (0x9A, 0xD2, 0x84),
    (0x6C, 0x5E, 0xB5),
    (0x95, 0x95, 0x95),
];

fn vic_color(index: u8) -> Color {
    let (r, g, b) = PALETTE[(index & 0x0F) as usize];
    Color::from_rgb8(r, g, b)
}

/// The emulated screen, drawn the way the beam sees it: each text row
/// shifted right by the XSCROLL it was fetched with.
#[derive(Debug)]
pub struct ScreenView {
    snapshot: Option<ScreenSnapshot>,
    scale: f32,
    cache: Cache,
}

impl ScreenView {
    pub fn new(scale: f32) -> Self {
        Self {
            snapshot: None,
            scale,
            cache: Cache::new(),
        }
    }

    /// Update with a new frame from the emulator.
    pub fn update(&mut self, snapshot: &ScreenSnapshot) {
        self.snapshot = Some(snapshot.clone());
        self.cache.clear();
    }

    pub fn view(&self) -> Element<'_, super::Message> {
        let size = picture_size(self.scale);
        Canvas::new(self)
            .width(Length::Fixed(size.width))
            .height(Length::Fixed(size.height))
            .into()
    }
}

impl canvas::Program<super::Message> for &ScreenView {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &iced::Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let geom = self
            .cache
            .draw(renderer, bounds.size(), |frame: &mut Frame| {
                let Some(snap) = &self.snapshot else {
                    frame.fill_rectangle(Point::ORIGIN, bounds.size(), Color::BLACK);
                    return;
                };
                let s = self.scale;
                let border = vic_color(snap.border);
                let left = BORDER * s;
                let top = BORDER * s;

                frame.fill_rectangle(
                    Point::new(left, top),
                    Size::new(TEXT_W * s, TEXT_H * s),
                    vic_color(snap.background),
                );

                for row in 0..ROWS {
                    let y = top + row as f32 * CELL * s;
                    let x0 = left + snap.xscroll(row) as f32 * s;

                    for (col, &code) in snap.row(row).iter().enumerate() {
                        let glyph = to_display_char(code);
                        if glyph == ' ' {
                            continue;
                        }
                        frame.fill_text(canvas::Text {
                            content: glyph.to_string(),
                            position: Point::new(x0 + col as f32 * CELL * s, y),
                            color: vic_color(snap.color(row, col as u16)),
                            size: Pixels(CELL * s),
                            font: Font::MONOSPACE,
                            ..canvas::Text::default()
                        });
                    }

                    // 38-column mode: the border covers the outer columns.
                    if !snap.wide(row) {
                        let band = Size::new(CELL * s, CELL * s);
                        frame.fill_rectangle(Point::new(left, y), band, border);
                        frame.fill_rectangle(Point::new(left + (TEXT_W - CELL) * s, y), band, border);
                    }
                }

                // Border last, so anything scrolled past the edge is clipped.
                let full = picture_size(s);
                frame.fill_rectangle(Point::ORIGIN, Size::new(full.width, top), border);
                frame.fill_rectangle(
                    Point::new(0.0, top + TEXT_H * s),
                    Size::new(full.width, full.height - top - TEXT_H * s),
                    border,
                );
                frame.fill_rectangle(Point::new(0.0, top), Size::new(left, TEXT_H * s), border);
                frame.fill_rectangle(
                    Point::new(left + TEXT_W * s, top),
                    Size::new(full.width - left - TEXT_W * s, TEXT_H * s),
                    border,
                );
            });

        vec![geom]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picture_size() {
        let size = picture_size(2.0);
        assert_eq!(size.width, 768.0);
        assert_eq!(size.height, 528.0);
    }

    #[test]
    fn test_palette_wraps_to_low_nybble() {
        assert_eq!(vic_color(0x1E), vic_color(0x0E));
        assert_eq!(vic_color(1), Color::from_rgb8(0xFF, 0xFF, 0xFF));
    }
}
