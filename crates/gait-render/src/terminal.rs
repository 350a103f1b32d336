//! ---
//! gait_section: "06-render"
//! gait_subsection: "module"
//! gait_type: "source"
//! gait_scope: "code"
//! gait_description: "Terminal canvas surface built on ratatui and crossterm."
//! gait_version: "v0.1.0"
//! gait_owner: "tbd"
//! ---
use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use gait_common::CanvasConfig;
use gait_kinematics::Point2D;
use ratatui::backend::CrosstermBackend;
use ratatui::style::{Color, Style};
use ratatui::symbols::Marker;
use ratatui::text::Span;
use ratatui::widgets::canvas::{Canvas, Line as CanvasLine};
use ratatui::widgets::{Block, Borders};
use ratatui::Terminal;

use crate::headless::Segment2D;
use crate::surface::RenderSurface;

/// Screen space (y down) to canvas space (y up).
pub fn to_canvas(point: Point2D, canvas_height: f64) -> (f64, f64) {
    (point.x, canvas_height - point.y)
}

/// `q`, `Esc` and `Ctrl+C` close the viewer.
pub fn is_quit_key(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Full-screen braille canvas sized to the configured logical canvas.
pub struct TerminalSurface {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    width: f64,
    height: f64,
    title: String,
    segments: Vec<Segment2D>,
    quit: bool,
    restored: bool,
}

impl TerminalSurface {
    /// Switch the terminal to raw mode on the alternate screen.
    pub fn enter(canvas: &CanvasConfig, title: impl Into<String>) -> Result<Self> {
        enable_raw_mode().context("failed to enable raw mode")?;
        let mut stdout = io::stdout();
        crossterm::execute!(stdout, EnterAlternateScreen, Hide)
            .context("failed to enter alternate screen")?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self {
            terminal,
            width: f64::from(canvas.width),
            height: f64::from(canvas.height),
            title: title.into(),
            segments: Vec::new(),
            quit: false,
            restored: false,
        })
    }

    /// Give the terminal back. Also runs on drop.
    pub fn restore(&mut self) -> Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        disable_raw_mode()?;
        crossterm::execute!(self.terminal.backend_mut(), LeaveAlternateScreen, Show)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl RenderSurface for TerminalSurface {
    fn clear(&mut self) -> Result<()> {
        self.segments.clear();
        Ok(())
    }

    fn draw_segment(&mut self, from: Point2D, to: Point2D) -> Result<()> {
        self.segments.push((from, to));
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        let (width, height) = (self.width, self.height);
        let segments = &self.segments;
        let title = Span::styled(self.title.as_str(), Style::default().fg(Color::Cyan));
        self.terminal
            .draw(|frame| {
                let canvas = Canvas::default()
                    .block(Block::default().borders(Borders::ALL).title(title))
                    .marker(Marker::Braille)
                    .x_bounds([0.0, width])
                    .y_bounds([0.0, height])
                    .paint(|ctx| {
                        for (from, to) in segments {
                            let (x1, y1) = to_canvas(*from, height);
                            let (x2, y2) = to_canvas(*to, height);
                            ctx.draw(&CanvasLine {
                                x1,
                                y1,
                                x2,
                                y2,
                                color: Color::White,
                            });
                        }
                    });
                frame.render_widget(canvas, frame.size());
            })
            .context("failed to draw frame")?;
        Ok(())
    }

    fn quit_requested(&mut self) -> Result<bool> {
        while !self.quit && event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                self.quit = is_quit_key(&key);
            }
        }
        Ok(self.quit)
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_flips_vertical_axis() {
        assert_eq!(to_canvas(Point2D::new(10.0, 0.0), 480.0), (10.0, 480.0));
        assert_eq!(to_canvas(Point2D::new(10.0, 480.0), 480.0), (10.0, 0.0));
    }

    #[test]
    fn quit_keys() {
        let press = |code, modifiers| KeyEvent::new(code, modifiers);
        assert!(is_quit_key(&press(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(is_quit_key(&press(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(is_quit_key(&press(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!is_quit_key(&press(KeyCode::Char('c'), KeyModifiers::NONE)));
        assert!(!is_quit_key(&press(KeyCode::Char('x'), KeyModifiers::NONE)));
    }
}
