// Application state management

use std::path::{Path, PathBuf};

use sysinfo::System;

use crate::config::Config;
use crate::engine::{
    self, CleanupDecision, JobController, JobState, Settings, StageTimer,
};
use crate::ui::form::FormState;

pub fn logical_cpus() -> u32 {
    let mut sys = System::new();
    sys.refresh_cpu();
    (sys.cpus().len() as u32).max(1)
}

/// Modal confirmation currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modal {
    None,
    /// Derived output already exists: continue (and overwrite) or back out.
    ConfirmOverwrite,
    /// Job was cancelled: delete the unfinished output or keep it.
    ConfirmDeletePartial,
    /// Quit requested while a job is running.
    ConfirmQuit,
}

/// Input file browser overlay.
#[derive(Debug)]
pub struct BrowserState {
    pub dir: PathBuf,
    pub entries: Vec<PathBuf>,
    pub selected: usize,
}

impl BrowserState {
    pub fn open(dir: PathBuf) -> Self {
        let entries = engine::list_dir(&dir);
        Self {
            dir,
            entries,
            selected: 0,
        }
    }

    pub fn enter(&mut self) -> Option<PathBuf> {
        let path = self.entries.get(self.selected)?.clone();
        if path.is_dir() {
            *self = Self::open(path);
            None
        } else {
            Some(path)
        }
    }

    pub fn ascend(&mut self) {
        if let Some(parent) = self.dir.parent() {
            *self = Self::open(parent.to_path_buf());
        }
    }
}

pub struct AppState {
    pub form: FormState,
    pub controller: JobController,
    pub config: Config,
    pub cpus: u32,
    pub modal: Modal,
    pub status: String,
    /// Extra status detail, e.g. the diagnostic tail after a failure.
    pub detail: Vec<String>,
    pub browser: Option<BrowserState>,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(input: Option<PathBuf>, config: &Config) -> Self {
        let cpus = logical_cpus();
        let mut form = FormState::new(cpus, config);
        if let Some(input) = input {
            form.input = input.to_string_lossy().into_owned();
            form.refresh_output_template();
        }

        Self {
            form,
            controller: JobController::new(),
            config: config.clone(),
            cpus,
            modal: Modal::None,
            status: "Awaiting input".to_string(),
            detail: Vec::new(),
            browser: None,
            should_quit: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.controller.is_running()
    }

    /// Per-frame state pump: drain supervisor events and follow terminal
    /// transitions.
    pub fn tick(&mut self) {
        self.controller.pump_events();

        enum Action {
            None,
            Complete,
            Fail(Option<i32>, Vec<String>),
            AwaitCleanupDecision,
        }

        let action = match self.controller.state() {
            JobState::Completed => Action::Complete,
            JobState::Failed { code, tail } => Action::Fail(*code, tail.clone()),
            JobState::CancelledPendingCleanup { .. } if self.modal == Modal::None => {
                Action::AwaitCleanupDecision
            }
            _ => Action::None,
        };

        match action {
            Action::None => {}
            Action::Complete => {
                self.status = "Conversion complete!".to_string();
                self.detail.clear();
                self.controller.acknowledge();
            }
            Action::Fail(code, tail) => {
                self.status = match code {
                    Some(code) => format!("ffmpeg failed (exit code {code})"),
                    None => "ffmpeg failed".to_string(),
                };
                self.detail = tail;
                self.controller.acknowledge();
            }
            Action::AwaitCleanupDecision => {
                self.status = "Conversion stopped. Delete unfinished output?".to_string();
                self.modal = Modal::ConfirmDeletePartial;
            }
        }
    }

    /// The Start/Stop action: launch when idle, begin cancellation when
    /// running.
    pub fn start_or_stop(&mut self) {
        if self.is_running() {
            self.status = "Stopping (waiting for the encoder)...".to_string();
            self.controller.request_cancel();
            return;
        }

        let input = self.form.input.trim().to_string();
        if input.is_empty() || !Path::new(&input).exists() {
            self.status = "Input file does not exist.".to_string();
            return;
        }

        let settings = self.form.to_settings(self.cpus);
        if settings.output_cleanup_path().exists() && !self.config.defaults.overwrite {
            self.status = "Output already exists, overwrite?".to_string();
            self.modal = Modal::ConfirmOverwrite;
            return;
        }

        self.launch(settings);
    }

    pub fn launch(&mut self, settings: Settings) {
        let mut timer = StageTimer::start();
        match self.controller.launch(&settings, &mut timer) {
            Ok(()) => {
                self.status = "Converting...".to_string();
                self.detail.clear();
            }
            Err(e) => {
                self.status = format!("Error: {e}");
            }
        }
    }

    /// Confirmation modal answered with yes.
    pub fn modal_confirm(&mut self) {
        match self.modal {
            Modal::None => {}
            Modal::ConfirmOverwrite => {
                self.modal = Modal::None;
                let settings = self.form.to_settings(self.cpus);
                self.launch(settings);
            }
            Modal::ConfirmDeletePartial => {
                self.modal = Modal::None;
                match self.controller.resolve_cleanup(CleanupDecision::Delete) {
                    Ok(()) => self.status = "Unfinished output deleted.".to_string(),
                    Err(e) => self.status = format!("Could not delete output: {e}"),
                }
            }
            Modal::ConfirmQuit => {
                // Interrupt-and-wait, keep whatever was written, then close.
                self.modal = Modal::None;
                self.controller.cancel_and_wait();
                let _ = self.controller.resolve_cleanup(CleanupDecision::Keep);
                self.should_quit = true;
            }
        }
    }

    /// Confirmation modal answered with no.
    pub fn modal_decline(&mut self) {
        match self.modal {
            Modal::ConfirmDeletePartial => {
                let _ = self.controller.resolve_cleanup(CleanupDecision::Keep);
                self.status = "Awaiting input".to_string();
            }
            Modal::ConfirmOverwrite => {
                self.status = "Awaiting input".to_string();
            }
            Modal::ConfirmQuit | Modal::None => {}
        }
        self.modal = Modal::None;
    }

    /// Quit request; intercepted while a job is running.
    pub fn request_quit(&mut self) {
        if self.is_running() {
            self.modal = Modal::ConfirmQuit;
        } else {
            self.should_quit = true;
        }
    }

    pub fn open_browser(&mut self) {
        let start = Path::new(self.form.input.trim())
            .parent()
            .filter(|p| p.is_dir())
            .map(|p| p.to_path_buf())
            .or_else(|| self.config.startup.last_input_dir.clone())
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        self.browser = Some(BrowserState::open(start));
    }

    /// Browser picked a file: set the input and remember its directory.
    pub fn browser_pick(&mut self, path: PathBuf) {
        if let Some(dir) = path.parent() {
            self.config.startup.last_input_dir = Some(dir.to_path_buf());
            let _ = self.config.save();
        }
        self.form.input = path.to_string_lossy().into_owned();
        self.form.refresh_output_template();
        self.browser = None;
    }
}
