// Child-process lifecycle: spawn, tail, classify, clean up

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::command::JobCommand;
use super::error::JobError;
use super::progress::{ProgressParser, ProgressSnapshot};

/// Interval between graceful-interrupt retries during cancellation.
/// Windows lacks direct interrupt delivery to console children, so the
/// retry cadence differs there.
#[cfg(unix)]
pub const CANCEL_RETRY_INTERVAL: Duration = Duration::from_millis(2800);
#[cfg(not(unix))]
pub const CANCEL_RETRY_INTERVAL: Duration = Duration::from_millis(3000);

/// Poll interval for tailing the progress scratch file.
pub const WATCH_INTERVAL: Duration = Duration::from_millis(500);

/// Lines of child output kept for failure diagnostics.
const DIAGNOSTIC_TAIL_LINES: usize = 12;

/// Transient file capturing the child's stdout/stderr for tailing. Owned
/// exclusively by the supervisor for the job's lifetime; removing it on every
/// exit path is the one cleanup invariant that must hold.
#[derive(Debug)]
struct ScratchSink {
    path: PathBuf,
}

impl ScratchSink {
    fn create(job_id: Uuid) -> Result<(Self, File), JobError> {
        let path = std::env::temp_dir().join(format!("ffturn-{job_id}.progress"));
        let file = File::create(&path).map_err(|source| JobError::Scratch {
            path: path.clone(),
            source,
        })?;
        Ok((Self { path }, file))
    }
}

impl Drop for ScratchSink {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// How a job ended. Cancellation is a deliberate transition, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitOutcome {
    Completed,
    Cancelled,
    Failed {
        code: Option<i32>,
        /// Last lines of captured child output.
        tail: Vec<String>,
    },
}

/// Message from the supervisor's background threads to the caller.
#[derive(Debug, Clone)]
pub enum JobEvent {
    Started { pid: u32 },
    Progress(ProgressSnapshot),
    Finished(ExitOutcome),
}

/// Cloneable, thread-safe cancel side of a running job.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    pid: u32,
    cancel_requested: Arc<AtomicBool>,
    exited: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Blocking: resend the graceful interrupt until the child is observed
    /// dead. One delivery is not enough; a child still wiring up its signal
    /// handlers can miss it. Callers should expect this to take seconds.
    pub fn cancel(&self) {
        self.cancel_requested.store(true, Ordering::SeqCst);
        info!(pid = self.pid, "cancelling transcode");

        while !self.exited.load(Ordering::SeqCst) {
            send_interrupt(self.pid);

            // Sleep in short slices so process death is noticed promptly.
            let mut waited = Duration::ZERO;
            while waited < CANCEL_RETRY_INTERVAL && !self.exited.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(100));
                waited += Duration::from_millis(100);
            }
        }

        info!(pid = self.pid, "transcode stopped");
    }
}

#[cfg(unix)]
fn send_interrupt(pid: u32) {
    unsafe {
        libc::kill(pid as libc::pid_t, libc::SIGINT);
    }
}

#[cfg(not(unix))]
fn send_interrupt(pid: u32) {
    // No SIGINT for console children here; ask taskkill to close it.
    let _ = std::process::Command::new("taskkill")
        .args(["/PID", &pid.to_string()])
        .output();
}

/// Live handle to a spawned job. Owns the event receiver; the process handle
/// itself lives on the wait thread.
#[derive(Debug)]
pub struct JobHandle {
    pid: u32,
    scratch_path: PathBuf,
    cancel: CancelHandle,
    outcome: Arc<Mutex<Option<ExitOutcome>>>,
    events: Receiver<JobEvent>,
    wait_thread: Option<JoinHandle<()>>,
}

impl JobHandle {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Location of the progress scratch file while the job runs.
    pub fn scratch_path(&self) -> &Path {
        &self.scratch_path
    }

    pub fn events(&self) -> &Receiver<JobEvent> {
        &self.events
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Blocking cancel; see [`CancelHandle::cancel`].
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.cancel.exited.load(Ordering::SeqCst)
    }

    pub fn outcome(&self) -> Option<ExitOutcome> {
        self.outcome.lock().unwrap().clone()
    }

    /// Block until the job ends and return its classified outcome. Runs on
    /// the caller's thread; the interactive front-end polls events instead.
    pub fn wait(mut self) -> ExitOutcome {
        if let Some(thread) = self.wait_thread.take() {
            let _ = thread.join();
        }
        self.outcome
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(ExitOutcome::Failed {
                code: None,
                tail: vec!["wait thread lost".to_string()],
            })
    }
}

/// Launches and supervises at most one transcode at a time.
#[derive(Debug, Default)]
pub struct Supervisor {
    active: Arc<AtomicBool>,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Spawn `command` with stdout/stderr redirected into a scratch file,
    /// then start the wait and watch threads.
    ///
    /// Starting while a job is running fails with `AlreadyRunning` and does
    /// not touch the running job's resources.
    pub fn start(&self, command: &JobCommand) -> Result<JobHandle, JobError> {
        if self.active.swap(true, Ordering::SeqCst) {
            return Err(JobError::AlreadyRunning);
        }

        match self.spawn_supervised(command) {
            Ok(handle) => Ok(handle),
            Err(e) => {
                // Failed launches leave no process and no scratch file.
                self.active.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    fn spawn_supervised(&self, command: &JobCommand) -> Result<JobHandle, JobError> {
        let job_id = Uuid::new_v4();
        let (scratch, stdout_file) = ScratchSink::create(job_id)?;
        let stderr_file = stdout_file.try_clone().map_err(|source| JobError::Scratch {
            path: scratch.path.clone(),
            source,
        })?;

        let mut cmd = command.to_process_command();
        cmd.stdin(Stdio::null())
            .stdout(Stdio::from(stdout_file))
            .stderr(Stdio::from(stderr_file));

        let mut child = cmd.spawn().map_err(JobError::Launch)?;
        let pid = child.id();
        info!(pid, %command, "launched transcode");

        let (tx, rx) = mpsc::channel();
        let _ = tx.send(JobEvent::Started { pid });

        let cancel_requested = Arc::new(AtomicBool::new(false));
        let exited = Arc::new(AtomicBool::new(false));
        let outcome: Arc<Mutex<Option<ExitOutcome>>> = Arc::new(Mutex::new(None));
        let scratch_path = scratch.path.clone();

        let watch_thread = {
            let path = scratch.path.clone();
            let exited = exited.clone();
            let tx = tx.clone();
            thread::spawn(move || watch_progress(&path, &exited, &tx))
        };

        let wait_thread = {
            let exited = exited.clone();
            let cancel_requested = cancel_requested.clone();
            let outcome = outcome.clone();
            let active = self.active.clone();
            thread::spawn(move || {
                let status = child.wait();
                exited.store(true, Ordering::SeqCst);

                // Drain the last progress records before the scratch goes away.
                let _ = watch_thread.join();

                let tail = read_tail(&scratch.path);
                let result = match status {
                    Ok(status) => {
                        classify_exit(&status, cancel_requested.load(Ordering::SeqCst), tail)
                    }
                    Err(e) => ExitOutcome::Failed {
                        code: None,
                        tail: vec![format!("wait failed: {e}")],
                    },
                };

                debug!(pid, outcome = ?result, "transcode exited");
                *outcome.lock().unwrap() = Some(result.clone());
                let _ = tx.send(JobEvent::Finished(result));

                // Scratch removal happens here on every path, then the slot
                // frees up for the next job.
                drop(scratch);
                active.store(false, Ordering::SeqCst);
            })
        };

        Ok(JobHandle {
            pid,
            scratch_path,
            cancel: CancelHandle {
                pid,
                cancel_requested,
                exited,
            },
            outcome,
            events: rx,
            wait_thread: Some(wait_thread),
        })
    }
}

/// Exit classification: 0 is success; any exit after a cancel request is the
/// cancellation completing (the interrupt is ours, not a fault); everything
/// else is a failure carrying the diagnostic tail.
fn classify_exit(status: &ExitStatus, cancel_requested: bool, tail: Vec<String>) -> ExitOutcome {
    if cancel_requested {
        return ExitOutcome::Cancelled;
    }

    if status.success() {
        return ExitOutcome::Completed;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            warn!(signal, "transcode terminated by signal without a cancel");
        }
    }

    ExitOutcome::Failed {
        code: status.code(),
        tail,
    }
}

/// Tail the scratch file at a fixed interval, feeding complete lines to the
/// record parser. The file is written only by the child; this side is
/// strictly read-only.
fn watch_progress(path: &Path, exited: &AtomicBool, tx: &Sender<JobEvent>) {
    let mut parser = ProgressParser::new();
    let mut offset: u64 = 0;

    loop {
        // Check before reading so the final records written right before
        // exit still get drained on the last pass.
        let done = exited.load(Ordering::SeqCst);

        if let Ok(mut file) = File::open(path) {
            if file.seek(SeekFrom::Start(offset)).is_ok() {
                let mut reader = BufReader::new(file);
                let mut line = String::new();
                loop {
                    line.clear();
                    match reader.read_line(&mut line) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            if !line.ends_with('\n') {
                                // Torn tail line; leave it for the next poll.
                                break;
                            }
                            offset += n as u64;
                            if let Some(snapshot) = parser.push_line(line.trim_end()) {
                                if tx.send(JobEvent::Progress(snapshot)).is_err() {
                                    return;
                                }
                            }
                        }
                    }
                }
            }
        }

        if done {
            break;
        }
        thread::sleep(WATCH_INTERVAL);
    }
}

/// Last lines of the captured child output, for failure reports.
fn read_tail(path: &Path) -> Vec<String> {
    let Ok(contents) = fs::read_to_string(path) else {
        return Vec::new();
    };

    let lines: Vec<&str> = contents.lines().collect();
    let start = lines.len().saturating_sub(DIAGNOSTIC_TAIL_LINES);
    lines[start..].iter().map(|s| s.to_string()).collect()
}
