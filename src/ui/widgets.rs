// Progress bar with distinct visual states

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressState {
    Idle,
    Running,
    /// Total frames unknown; the bar pulses instead of filling.
    Indeterminate,
    Done,
}

pub struct ProgressBar {
    percent: u16,
    state: ProgressState,
    /// Animation step for the indeterminate sweep.
    tick: usize,
}

impl ProgressBar {
    pub fn new(percent: u16, state: ProgressState) -> Self {
        Self {
            percent: percent.min(100),
            state,
            tick: 0,
        }
    }

    pub fn with_tick(mut self, tick: usize) -> Self {
        self.tick = tick;
        self
    }
}

impl Widget for ProgressBar {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 {
            return;
        }

        let (filled_symbol, unfilled_symbol, filled_fg, unfilled_fg) = match self.state {
            ProgressState::Running => ("█", "░", Color::White, Color::DarkGray),
            ProgressState::Done => ("█", " ", Color::Green, Color::Black),
            ProgressState::Indeterminate => ("▓", "░", Color::Gray, Color::DarkGray),
            ProgressState::Idle => ("░", "░", Color::DarkGray, Color::Black),
        };

        let filled_width = match self.state {
            ProgressState::Indeterminate => 0,
            _ => (area.width as f64 * self.percent as f64 / 100.0).round() as u16,
        };

        for x in 0..area.width {
            let symbol = if x < filled_width {
                filled_symbol
            } else {
                unfilled_symbol
            };
            let fg = if x < filled_width {
                filled_fg
            } else {
                unfilled_fg
            };
            buf.set_string(area.x + x, area.y, symbol, Style::default().fg(fg));
        }

        // Sweep a short highlight across the bar when the total is unknown.
        if self.state == ProgressState::Indeterminate {
            let sweep_width = (area.width / 6).max(1);
            let start = (self.tick as u16 * 2) % area.width;
            for i in 0..sweep_width {
                let x = (start + i) % area.width;
                buf.set_string(
                    area.x + x,
                    area.y,
                    filled_symbol,
                    Style::default().fg(Color::White),
                );
            }
        }
    }
}
