// Typed errors for the transcode engine

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning settings into a command line.
/// All of these are fatal before anything is spawned.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BuildError {
    #[error("computed output resolution {width}x{height} is not encodable")]
    InvalidResolution { width: i64, height: i64 },

    #[error("input path is empty")]
    MissingInput,
}

/// Errors from the one-shot ffprobe run. Fatal before launch.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to run ffprobe: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("ffprobe exited with an error: {0}")]
    Tool(String),

    #[error("could not parse ffprobe output: {0}")]
    Parse(String),

    #[error("{path} has no video stream")]
    NoVideoStream { path: PathBuf },
}

/// Errors from the job supervisor.
#[derive(Debug, Error)]
pub enum JobError {
    /// A second start while a job is running is a caller error, never a queue.
    #[error("a transcode is already running")]
    AlreadyRunning,

    #[error("failed to create progress scratch file at {path}: {source}")]
    Scratch {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to launch ffmpeg: {0}")]
    Launch(std::io::Error),
}

/// Everything that can stop a job before or at launch. Wraps the taxonomy so
/// the front-end reports one fatal error type.
#[derive(Debug, Error)]
pub enum StartError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    Job(#[from] JobError),
}
