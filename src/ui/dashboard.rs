// Dashboard rendering: the static form builder plus progress and status

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};

use crate::engine::JobState;
use crate::format;
use crate::ui::form::{FieldId, FieldKind, FieldSpec};
use crate::ui::modal::ConfirmModal;
use crate::ui::state::{AppState, Modal};
use crate::ui::widgets::{ProgressBar, ProgressState};

pub fn render(frame: &mut Frame, app: &AppState, tick: usize) {
    let fields = app.form.visible_fields();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(fields.len() as u16 + 2),
            Constraint::Length(4),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_form(frame, app, &fields, chunks[0]);
    render_progress(frame, app, tick, chunks[1]);
    render_status(frame, app, chunks[2]);
    render_hints(frame, chunks[3]);

    if let Some(browser) = &app.browser {
        render_browser(frame, browser);
    } else if app.modal != Modal::None {
        ConfirmModal::render(frame, app.modal);
    }
}

/// One row per visible descriptor-table entry. This is the whole widget
/// builder: label column, value column, focus marker.
fn render_form(frame: &mut Frame, app: &AppState, fields: &[&'static FieldSpec], area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" ffturn ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let editing_locked = app.is_running();
    let mut lines = Vec::with_capacity(fields.len());

    for (row, spec) in fields.iter().enumerate() {
        let focused = row == app.form.focus && !editing_locked;
        let marker = if focused { "▸ " } else { "  " };

        let label_style = if focused {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else if editing_locked {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::Gray)
        };

        let value = field_value(app, spec);
        let value_style = if editing_locked {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::White)
        };

        lines.push(Line::from(vec![
            Span::raw(marker),
            Span::styled(format!("{:<16}", spec.label), label_style),
            Span::styled(value, value_style),
        ]));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn field_value(app: &AppState, spec: &FieldSpec) -> String {
    let form = &app.form;
    match spec.kind {
        FieldKind::Text => {
            let text = match spec.id {
                FieldId::Input => &form.input,
                FieldId::Output => &form.output,
                FieldId::RateValue => &form.rate_value,
                FieldId::AudioValue => &form.audio_value,
                FieldId::Fps => &form.fps,
                FieldId::ResTarget => &form.res_target,
                FieldId::ExtraArgs => &form.extra_args,
                _ => return String::new(),
            };
            if text.is_empty() {
                placeholder(spec.id).to_string()
            } else {
                text.clone()
            }
        }
        FieldKind::Select(options) => {
            let idx = match spec.id {
                FieldId::Container => form.container_idx,
                FieldId::RateMode => form.rate_mode_idx,
                FieldId::AudioMode => form.audio_idx,
                FieldId::Preset => form.preset_idx,
                FieldId::ResPolicy => form.res_idx,
                _ => 0,
            };
            format!("< {} >", options.get(idx).copied().unwrap_or("?"))
        }
        FieldKind::Slider { .. } => match spec.id {
            FieldId::Threads => format!("{} / {}", form.threads, app.cpus),
            FieldId::AudioSlider => format!(
                "{} ({} kbps)",
                form.audio_slider,
                form.audio_slider * crate::engine::AUDIO_SLIDER_STEP_KBPS
            ),
            _ => String::new(),
        },
    }
}

fn placeholder(id: FieldId) -> &'static str {
    match id {
        FieldId::Input => "(path to a video file, Ctrl+O to browse)",
        FieldId::RateValue => "(empty = default quality)",
        FieldId::Fps => "(empty = source rate)",
        FieldId::ResTarget => "(target pixels)",
        _ => "",
    }
}

fn render_progress(frame: &mut Frame, app: &AppState, tick: usize, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Progress ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(inner);

    match app.controller.state() {
        JobState::Running { latest, meta, .. } => {
            let total = meta.estimated_total_frames;
            match latest {
                Some(snapshot) => {
                    let mut parts = Vec::new();
                    match snapshot.percent(total) {
                        Some(pct) => {
                            frame.render_widget(
                                ProgressBar::new(pct.round() as u16, ProgressState::Running),
                                rows[0],
                            );
                            parts.push(format!(
                                "frame {} / {} ({:.1}%)",
                                snapshot.frame,
                                total.unwrap_or(0),
                                pct
                            ));
                        }
                        None => {
                            frame.render_widget(
                                ProgressBar::new(0, ProgressState::Indeterminate).with_tick(tick),
                                rows[0],
                            );
                            parts.push(format!("frame {}", snapshot.frame));
                        }
                    }

                    parts.push(format!("{:.1} fps", snapshot.fps));
                    parts.push(format!("{:.2}x", snapshot.speed));
                    parts.push(format!("bitrate {}", snapshot.bitrate));
                    let size = snapshot
                        .total_size
                        .map(format::format_bytes)
                        .unwrap_or_else(|| "N/A B".to_string());
                    parts.push(format!("size {}", size));

                    if snapshot.drop_frames > 0 || snapshot.dup_frames > 0 {
                        parts.push(format!(
                            "drop {} dup {}",
                            snapshot.drop_frames, snapshot.dup_frames
                        ));
                    }

                    if let Some(total) = total {
                        if snapshot.fps > 0.0 && total > snapshot.frame {
                            let eta = (total - snapshot.frame) as f64 / snapshot.fps;
                            parts.push(format!("ETA {}", format::format_duration(eta)));
                        }
                    }

                    frame.render_widget(Paragraph::new(parts.join(" | ")), rows[1]);
                }
                None => {
                    frame.render_widget(
                        ProgressBar::new(0, ProgressState::Indeterminate).with_tick(tick),
                        rows[0],
                    );
                    frame.render_widget(Paragraph::new("waiting for the first report..."), rows[1]);
                }
            }
        }
        JobState::Completed => {
            frame.render_widget(ProgressBar::new(100, ProgressState::Done), rows[0]);
        }
        _ => {
            frame.render_widget(ProgressBar::new(0, ProgressState::Idle), rows[0]);
        }
    }
}

fn render_status(frame: &mut Frame, app: &AppState, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Status ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![Line::from(Span::styled(
        app.status.clone(),
        Style::default().fg(Color::White),
    ))];
    for detail in &app.detail {
        lines.push(Line::from(Span::styled(
            detail.clone(),
            Style::default().fg(Color::DarkGray),
        )));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_hints(frame: &mut Frame, area: Rect) {
    let hints = "Enter start/stop · Tab/↓↑ move · ←/→ adjust · Ctrl+O browse · Esc quit";
    frame.render_widget(
        Paragraph::new(Span::styled(hints, Style::default().fg(Color::DarkGray))),
        area,
    );
}

fn render_browser(frame: &mut Frame, browser: &crate::ui::state::BrowserState) {
    let area = frame.area();
    let width = (area.width * 4 / 5).max(20);
    let height = (area.height * 3 / 4).max(8);
    let overlay = Rect {
        x: (area.width.saturating_sub(width)) / 2,
        y: (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };

    frame.render_widget(Clear, overlay);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", browser.dir.display()))
        .style(Style::default().bg(Color::Black));

    let items: Vec<ListItem> = browser
        .entries
        .iter()
        .map(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            if path.is_dir() {
                ListItem::new(format!("{name}/")).style(Style::default().fg(Color::Cyan))
            } else {
                ListItem::new(name)
            }
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");

    let mut list_state = ListState::default();
    list_state.select(Some(browser.selected));
    frame.render_stateful_widget(list, overlay, &mut list_state);
}
