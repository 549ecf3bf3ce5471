// Job lifecycle state machine and the launch pipeline around it

use std::fs;
use std::io;
use std::path::PathBuf;
use std::thread;

use tracing::{debug, info};

use super::command::{self, JobCommand};
use super::error::{JobError, StartError};
use super::probe::{self, SourceMetadata};
use super::progress::ProgressSnapshot;
use super::settings::Settings;
use super::supervisor::{ExitOutcome, JobEvent, JobHandle, Supervisor};
use super::timing::StageTimer;

/// What to do with the partial output after a cancelled job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupDecision {
    Keep,
    Delete,
}

/// Lifecycle of the single job slot.
///
/// `Idle → Running → {Completed | Failed | CancelledPendingCleanup → Idle}`.
/// Only the cancellation path goes through `CancelledPendingCleanup`; the
/// delete-or-keep decision resolves it back to `Idle`.
#[derive(Debug)]
pub enum JobState {
    Idle,
    Running {
        handle: JobHandle,
        meta: SourceMetadata,
        latest: Option<ProgressSnapshot>,
        /// Cancel requested, interrupts in flight.
        interrupting: bool,
    },
    Completed,
    Failed {
        code: Option<i32>,
        tail: Vec<String>,
    },
    CancelledPendingCleanup {
        output: PathBuf,
        is_image_sequence: bool,
    },
}

impl JobState {
    pub fn is_running(&self) -> bool {
        matches!(self, JobState::Running { .. })
    }
}

/// Drives one job at a time: probe → build → spawn, then event pumping,
/// cancellation, and cleanup resolution.
pub struct JobController {
    supervisor: Supervisor,
    state: JobState,
    /// Remembered for the pending-cleanup transition; the handle itself does
    /// not know about output paths.
    cleanup_path: PathBuf,
    is_image_sequence: bool,
    /// Command of the most recent launch, kept verbatim for diagnostics.
    last_command: Option<JobCommand>,
}

impl JobController {
    pub fn new() -> Self {
        Self {
            supervisor: Supervisor::new(),
            state: JobState::Idle,
            cleanup_path: PathBuf::new(),
            is_image_sequence: false,
            last_command: None,
        }
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn last_command(&self) -> Option<&JobCommand> {
        self.last_command.as_ref()
    }

    /// Probe, build and spawn. Every fatal error here is reported before any
    /// process or scratch resource exists.
    pub fn launch(&mut self, settings: &Settings, timer: &mut StageTimer) -> Result<(), StartError> {
        if self.is_running() {
            return Err(StartError::Job(JobError::AlreadyRunning));
        }

        settings.validate().map_err(StartError::Build)?;

        let meta = probe::probe(&settings.input_path)?.with_forced_fps(settings.target_fps);
        timer.lap("probed input");

        let command = command::build(settings, &meta)?;
        timer.lap("built command");
        info!(%command, "job command");

        // Image sequences dump frames into a directory that must exist
        // before ffmpeg opens the output pattern.
        let output = settings.output_path();
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| {
                    StartError::Job(JobError::OutputDir {
                        path: parent.to_path_buf(),
                        source,
                    })
                })?;
            }
        }

        let handle = self.supervisor.start(&command)?;
        timer.lap("spawned ffmpeg");

        self.cleanup_path = settings.output_cleanup_path();
        self.is_image_sequence = settings.target.is_image_sequence();
        self.last_command = Some(command);
        self.state = JobState::Running {
            handle,
            meta,
            latest: None,
            interrupting: false,
        };
        Ok(())
    }

    /// Drain pending supervisor events into the state machine. Call from the
    /// interactive loop; never blocks.
    pub fn pump_events(&mut self) {
        let JobState::Running { handle, latest, .. } = &mut self.state else {
            return;
        };

        let mut finished: Option<ExitOutcome> = None;
        while let Ok(event) = handle.events().try_recv() {
            match event {
                JobEvent::Started { pid } => debug!(pid, "job running"),
                JobEvent::Progress(snapshot) => *latest = Some(snapshot),
                JobEvent::Finished(outcome) => finished = Some(outcome),
            }
        }

        if let Some(outcome) = finished {
            self.state = match outcome {
                ExitOutcome::Completed => JobState::Completed,
                ExitOutcome::Failed { code, tail } => JobState::Failed { code, tail },
                ExitOutcome::Cancelled => JobState::CancelledPendingCleanup {
                    output: self.cleanup_path.clone(),
                    is_image_sequence: self.is_image_sequence,
                },
            };
        }
    }

    /// Begin the interrupt-until-dead sequence on a background thread. The
    /// state flips to `CancelledPendingCleanup` once the supervisor reports
    /// the process gone (observed via `pump_events`).
    pub fn request_cancel(&mut self) {
        if let JobState::Running {
            handle,
            interrupting,
            ..
        } = &mut self.state
        {
            if !*interrupting {
                *interrupting = true;
                let canceller = handle.cancel_handle();
                thread::spawn(move || canceller.cancel());
            }
        }
    }

    /// Blocking cancel for non-interactive callers: interrupt, wait for the
    /// exit, and transition in one call.
    pub fn cancel_and_wait(&mut self) {
        if let JobState::Running { handle, .. } = &self.state {
            handle.cancel();
        }
        // The Finished event is queued once the wait thread classifies the
        // exit; a short pump loop picks it up.
        while self.is_running() {
            self.pump_events();
            if self.is_running() {
                thread::sleep(std::time::Duration::from_millis(50));
            }
        }
    }

    /// Resolve the pending delete-or-keep decision and return to `Idle`.
    pub fn resolve_cleanup(&mut self, decision: CleanupDecision) -> io::Result<()> {
        let JobState::CancelledPendingCleanup {
            output,
            is_image_sequence,
        } = &self.state
        else {
            return Ok(());
        };

        if decision == CleanupDecision::Delete && output.exists() {
            if *is_image_sequence {
                fs::remove_dir_all(output)?;
            } else {
                fs::remove_file(output)?;
            }
            info!(path = %output.display(), "removed partial output");
        }

        self.state = JobState::Idle;
        Ok(())
    }

    /// Acknowledge a terminal state (completed/failed) and return to `Idle`.
    pub fn acknowledge(&mut self) {
        if matches!(self.state, JobState::Completed | JobState::Failed { .. }) {
            self.state = JobState::Idle;
        }
    }
}

impl Default for JobController {
    fn default() -> Self {
        Self::new()
    }
}
