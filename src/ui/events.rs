// Event loop and key handling

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::config::Config;
use crate::ui::dashboard;
use crate::ui::form::{FieldId, FieldKind, FormState};
use crate::ui::state::{AppState, Modal};

pub fn run_ui(input: Option<PathBuf>, config: &Config) -> Result<()> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let mut app = AppState::new(input, config);
    let result = run_loop(&mut terminal, &mut app);

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
) -> Result<()> {
    let mut tick: usize = 0;

    loop {
        app.tick();
        tick = tick.wrapping_add(1);

        terminal.draw(|frame| dashboard::render(frame, app, tick))?;

        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(app, key);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    if app.browser.is_some() {
        handle_browser_key(app, key);
        return;
    }

    if app.modal != Modal::None {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => app.modal_confirm(),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.modal_decline(),
            _ => {}
        }
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('o') => {
                if !app.is_running() {
                    app.open_browser();
                }
            }
            KeyCode::Char('c') => app.request_quit(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Esc => app.request_quit(),
        KeyCode::Enter => app.start_or_stop(),
        _ if app.is_running() => {
            // Settings are frozen while a job runs; only stop/quit act.
        }
        KeyCode::Tab | KeyCode::Down => app.form.focus_next(),
        KeyCode::BackTab | KeyCode::Up => app.form.focus_prev(),
        KeyCode::Left => adjust_focused(app, -1),
        KeyCode::Right => adjust_focused(app, 1),
        KeyCode::Char(c) => edit_focused(app, Some(c)),
        KeyCode::Backspace => edit_focused(app, None),
        _ => {}
    }
}

fn handle_browser_key(app: &mut AppState, key: KeyEvent) {
    let Some(browser) = &mut app.browser else {
        return;
    };

    match key.code {
        KeyCode::Esc => app.browser = None,
        KeyCode::Up => {
            browser.selected = browser.selected.saturating_sub(1);
        }
        KeyCode::Down => {
            if browser.selected + 1 < browser.entries.len() {
                browser.selected += 1;
            }
        }
        KeyCode::Backspace | KeyCode::Left => browser.ascend(),
        KeyCode::Enter => {
            if let Some(picked) = browser.enter() {
                app.browser_pick(picked);
            }
        }
        _ => {}
    }
}

/// Left/right on a select or slider field.
fn adjust_focused(app: &mut AppState, delta: i64) {
    let spec = app.form.focused_field();

    match spec.kind {
        FieldKind::Select(options) => {
            let len = options.len() as i64;
            let idx = select_idx(&app.form, spec.id) as i64;
            let next = (idx + delta).rem_euclid(len) as usize;
            set_select_idx(&mut app.form, spec.id, next);

            match spec.id {
                // The derived output tracks the chosen container.
                FieldId::Container => app.form.refresh_output_template(),
                // Mode switches can hide the focused row.
                FieldId::AudioMode | FieldId::ResPolicy => app.form.clamp_focus(),
                _ => {}
            }
        }
        FieldKind::Slider { min, max } => {
            let max = if max == 0 { app.cpus } else { max };
            let value = match spec.id {
                FieldId::Threads => &mut app.form.threads,
                FieldId::AudioSlider => &mut app.form.audio_slider,
                _ => return,
            };
            let next = (*value as i64 + delta).clamp(min as i64, max as i64);
            *value = next as u32;
        }
        FieldKind::Text => {}
    }
}

/// Character entry (Some) or backspace (None) on a text field.
fn edit_focused(app: &mut AppState, input: Option<char>) {
    let spec = app.form.focused_field();

    let Some(text) = text_field_mut(&mut app.form, spec.id) else {
        return;
    };

    match input {
        Some(c) => text.push(c),
        None => {
            text.pop();
        }
    }

    match spec.id {
        // Quotes from drag-and-drop paths are stripped as they arrive.
        FieldId::Input => {
            app.form.input = app.form.input.replace('"', "");
            app.form.refresh_output_template();
        }
        FieldId::Fps => app.form.refresh_output_template(),
        FieldId::Output => app.form.output_edited = true,
        _ => {}
    }
}

fn select_idx(form: &FormState, id: FieldId) -> usize {
    match id {
        FieldId::Container => form.container_idx,
        FieldId::RateMode => form.rate_mode_idx,
        FieldId::AudioMode => form.audio_idx,
        FieldId::Preset => form.preset_idx,
        FieldId::ResPolicy => form.res_idx,
        _ => 0,
    }
}

fn set_select_idx(form: &mut FormState, id: FieldId, idx: usize) {
    match id {
        FieldId::Container => form.container_idx = idx,
        FieldId::RateMode => form.rate_mode_idx = idx,
        FieldId::AudioMode => form.audio_idx = idx,
        FieldId::Preset => form.preset_idx = idx,
        FieldId::ResPolicy => form.res_idx = idx,
        _ => {}
    }
}

fn text_field_mut(form: &mut FormState, id: FieldId) -> Option<&mut String> {
    match id {
        FieldId::Input => Some(&mut form.input),
        FieldId::Output => Some(&mut form.output),
        FieldId::RateValue => Some(&mut form.rate_value),
        FieldId::AudioValue => Some(&mut form.audio_value),
        FieldId::Fps => Some(&mut form.fps),
        FieldId::ResTarget => Some(&mut form.res_target),
        FieldId::ExtraArgs => Some(&mut form.extra_args),
        _ => None,
    }
}
