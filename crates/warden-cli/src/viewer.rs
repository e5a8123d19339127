//! Full-screen terminal viewer for the recognition loop.
//!
//! The annotated frame is drawn with upper-half-block cells (two image rows
//! per terminal row), next to a sidebar listing the faces in the frame.

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use ratatui::backend::CrosstermBackend;
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Widget};
use ratatui::{Frame, Terminal};
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use warden_core::{FaceReport, FrameSink};

const SIDEBAR_WIDTH: u16 = 34;
const UPPER_HALF_BLOCK: &str = "▀";

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("failed to write snapshot: {0}")]
    Snapshot(#[from] image::ImageError),
}

/// Raw mode plus alternate screen, undone on drop.
struct ScreenGuard;

impl ScreenGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let guard = ScreenGuard;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(guard)
    }
}

impl Drop for ScreenGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        let _ = disable_raw_mode();
        tracing::debug!("terminal restored");
    }
}

pub struct TerminalViewer {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    snapshot: Option<PathBuf>,
    known: usize,
    frames: u64,
    _screen: ScreenGuard,
}

impl TerminalViewer {
    /// Take over the terminal. `snapshot`, if set, receives a copy of every
    /// annotated frame.
    pub fn open(known: usize, snapshot: Option<PathBuf>) -> Result<Self, ViewerError> {
        let screen = ScreenGuard::enter()?;
        let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
        terminal.clear()?;
        terminal.hide_cursor()?;
        Ok(Self {
            terminal,
            snapshot,
            known,
            frames: 0,
            _screen: screen,
        })
    }
}

impl FrameSink for TerminalViewer {
    type Error = ViewerError;

    fn show(&mut self, frame: &RgbImage, faces: &[FaceReport]) -> Result<(), ViewerError> {
        self.frames += 1;
        let status = Status {
            known: self.known,
            frames: self.frames,
        };
        self.terminal.draw(|f| render(f, frame, faces, status))?;

        if let Some(path) = &self.snapshot {
            frame.save(path)?;
        }
        Ok(())
    }

    fn exit_requested(&mut self) -> Result<bool, ViewerError> {
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && is_exit_key(key.code, key.modifiers) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

impl Drop for TerminalViewer {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
    }
}

/// `q`, `Esc`, or `Ctrl-C` (raw mode swallows SIGINT).
fn is_exit_key(code: KeyCode, modifiers: KeyModifiers) -> bool {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

#[derive(Debug, Clone, Copy)]
struct Status {
    known: usize,
    frames: u64,
}

fn render(f: &mut Frame, image: &RgbImage, faces: &[FaceReport], status: Status) {
    let [banner, body] =
        Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(f.area());
    let [view, sidebar] =
        Layout::horizontal([Constraint::Min(0), Constraint::Length(SIDEBAR_WIDTH)]).areas(body);

    f.render_widget(banner_line(faces, status), banner);
    f.render_widget(FrameView { image }, view);
    f.render_widget(
        List::new(face_items(faces)).block(Block::default().borders(Borders::ALL).title(" Faces ")),
        sidebar,
    );
}

fn banner_line(faces: &[FaceReport], status: Status) -> Paragraph<'static> {
    let threats: Vec<&str> = faces
        .iter()
        .filter(|r| r.treatment.alarm)
        .map(|r| r.identity.name.as_str())
        .collect();

    if threats.is_empty() {
        let text = format!(
            " warden | {} known | frame {} | q to quit ",
            status.known, status.frames
        );
        return Paragraph::new(Line::from(Span::styled(
            text,
            Style::default().fg(Color::White).bg(Color::DarkGray),
        )));
    }

    Paragraph::new(Line::from(Span::styled(
        format!(" THREAT DETECTED: {} ", threats.join(", ")),
        Style::default()
            .fg(Color::White)
            .bg(Color::Red)
            .add_modifier(Modifier::BOLD),
    )))
}

fn face_items(faces: &[FaceReport]) -> Vec<ListItem<'static>> {
    faces
        .iter()
        .map(|r| {
            let distance = r
                .identity
                .distance
                .map(|d| format!(" {d:.3}"))
                .unwrap_or_default();
            ListItem::new(Line::from(vec![
                Span::styled("■ ", Style::default().fg(color(r.treatment.color))),
                Span::raw(r.identity.caption()),
                Span::styled(distance, Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect()
}

fn color(rgb: Rgb<u8>) -> Color {
    let [r, g, b] = rgb.0;
    Color::Rgb(r, g, b)
}

/// An RGB image scaled to fit, aspect preserved, centered.
struct FrameView<'a> {
    image: &'a RgbImage,
}

impl Widget for FrameView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (fw, fh) = self.image.dimensions();
        if area.is_empty() || fw == 0 || fh == 0 {
            return;
        }

        let cols = area.width as u32;
        let rows = area.height as u32 * 2;
        let scale = (cols as f32 / fw as f32).min(rows as f32 / fh as f32);
        let w = ((fw as f32 * scale) as u32).clamp(1, cols);
        let h = ((fh as f32 * scale) as u32).clamp(1, rows);
        let scaled = imageops::resize(self.image, w, h, FilterType::Triangle);

        let x0 = area.x + ((cols - w) / 2) as u16;
        let y0 = area.y + ((rows - h) / 4) as u16;

        for cy in 0..h.div_ceil(2) {
            for cx in 0..w {
                let top = *scaled.get_pixel(cx, cy * 2);
                let bottom = (cy * 2 + 1 < h).then(|| *scaled.get_pixel(cx, cy * 2 + 1));
                if let Some(cell) = buf.cell_mut((x0 + cx as u16, y0 + cy as u16)) {
                    cell.set_symbol(UPPER_HALF_BLOCK)
                        .set_fg(color(top))
                        .set_bg(bottom.map(color).unwrap_or(Color::Reset));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::{BoundingBox, Category, Identification};

    fn report(name: &str, tag: &str) -> FaceReport {
        let identity = Identification {
            name: name.into(),
            tag: tag.into(),
            distance: Some(0.25),
        };
        FaceReport {
            face: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            treatment: Category::from_tag(tag).treatment(),
            identity,
        }
    }

    fn line_text(p: Paragraph<'_>, width: u16) -> String {
        let area = Rect::new(0, 0, width, 1);
        let mut buf = Buffer::empty(area);
        p.render(area, &mut buf);
        (0..width).map(|x| buf[(x, 0)].symbol().to_string()).collect()
    }

    #[test]
    fn test_frame_view_two_rows_per_cell() {
        let mut img = RgbImage::new(2, 4);
        for x in 0..2 {
            img.put_pixel(x, 0, Rgb([255, 0, 0]));
            img.put_pixel(x, 1, Rgb([0, 0, 255]));
        }
        let area = Rect::new(0, 0, 2, 2);
        let mut buf = Buffer::empty(area);
        FrameView { image: &img }.render(area, &mut buf);

        let cell = &buf[(0, 0)];
        assert_eq!(cell.symbol(), UPPER_HALF_BLOCK);
        assert_eq!(cell.fg, Color::Rgb(255, 0, 0));
        assert_eq!(cell.bg, Color::Rgb(0, 0, 255));
        assert_eq!(buf[(1, 1)].fg, Color::Rgb(0, 0, 0));
    }

    #[test]
    fn test_frame_view_centers_wide_image() {
        let img = RgbImage::from_pixel(4, 2, Rgb([9, 9, 9]));
        let area = Rect::new(0, 0, 8, 4);
        let mut buf = Buffer::empty(area);
        FrameView { image: &img }.render(area, &mut buf);

        // 4x2 scales to 8x4 pixels = 8x2 cells, centered vertically in 4 rows.
        assert_eq!(buf[(0, 0)].symbol(), " ");
        assert_eq!(buf[(0, 1)].symbol(), UPPER_HALF_BLOCK);
        assert_eq!(buf[(7, 2)].symbol(), UPPER_HALF_BLOCK);
        assert_eq!(buf[(0, 3)].symbol(), " ");
    }

    #[test]
    fn test_frame_view_empty_area() {
        let img = RgbImage::new(4, 4);
        let mut buf = Buffer::empty(Rect::new(0, 0, 0, 0));
        FrameView { image: &img }.render(Rect::new(0, 0, 0, 0), &mut buf);
    }

    #[test]
    fn test_banner_names_threats() {
        let status = Status { known: 3, frames: 7 };
        let faces = [report("bob", "threat"), report("alice", "non-threat")];
        let text = line_text(banner_line(&faces, status), 40);
        assert!(text.starts_with(" THREAT DETECTED: bob "), "{text}");

        let calm = line_text(banner_line(&faces[1..], status), 40);
        assert!(calm.starts_with(" warden | 3 known | frame 7"), "{calm}");
    }

    #[test]
    fn test_face_items_one_per_face() {
        let faces = [report("bob", "threat"), report("Unknown", "unknown")];
        assert_eq!(face_items(&faces).len(), 2);
    }

    #[test]
    fn test_exit_keys() {
        assert!(is_exit_key(KeyCode::Char('q'), KeyModifiers::NONE));
        assert!(is_exit_key(KeyCode::Esc, KeyModifiers::NONE));
        assert!(is_exit_key(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(!is_exit_key(KeyCode::Char('c'), KeyModifiers::NONE));
        assert!(!is_exit_key(KeyCode::Enter, KeyModifiers::NONE));
    }
}
