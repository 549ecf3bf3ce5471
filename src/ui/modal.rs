// Confirmation modals

use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::ui::state::Modal;

pub struct ConfirmModal;

impl ConfirmModal {
    pub fn render(frame: &mut Frame, modal: Modal) {
        let (title, question, yes, no) = match modal {
            Modal::None => return,
            Modal::ConfirmOverwrite => (
                " Output Exists ",
                "The output path already exists.",
                " Overwrite   ",
                " Cancel",
            ),
            Modal::ConfirmDeletePartial => (
                " Conversion Stopped ",
                "Delete the unfinished output?",
                " Delete   ",
                " Keep",
            ),
            Modal::ConfirmQuit => (
                " Quit Confirmation ",
                "A conversion is running. Quitting will cancel it.",
                " Quit   ",
                " Stay",
            ),
        };

        let area = frame.area();
        let modal_width = 56.min(area.width.saturating_sub(4));
        let modal_height = 7.min(area.height.saturating_sub(2));

        let modal_area = Rect {
            x: (area.width.saturating_sub(modal_width)) / 2,
            y: (area.height.saturating_sub(modal_height)) / 2,
            width: modal_width,
            height: modal_height,
        };

        frame.render_widget(Clear, modal_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(title)
            .title_alignment(Alignment::Center)
            .style(Style::default().bg(Color::Black));

        let inner = block.inner(modal_area);
        frame.render_widget(block, modal_area);

        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(question, Style::default().fg(Color::White))),
            Line::from(""),
            Line::from(vec![
                Span::styled(
                    "[Y]",
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(yes),
                Span::styled(
                    "[N]",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ),
                Span::raw(no),
            ]),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::White));

        frame.render_widget(paragraph, inner);
    }
}
