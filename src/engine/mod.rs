// Core transcode engine - independent of UI

pub mod command;
pub mod error;
pub mod job;
pub mod probe;
pub mod progress;
pub mod scan;
pub mod settings;
pub mod supervisor;
pub mod timing;

pub use command::{JobCommand, ScaledResolution, build, scaled_resolution};
pub use error::{BuildError, JobError, ProbeError, StartError};
pub use job::{CleanupDecision, JobController, JobState};
pub use probe::{SourceMetadata, ffmpeg_version, ffprobe_version, probe};
pub use progress::{ProgressPhase, ProgressSnapshot, SnapshotStream};
pub use scan::{is_video_file, list_dir};
pub use settings::{
    AUDIO_SLIDER_MAX, AUDIO_SLIDER_STEP_KBPS, AudioMode, OutputTarget, RateMode, ResolutionPolicy,
    Settings, SpeedPreset,
};
pub use supervisor::{CancelHandle, ExitOutcome, JobEvent, JobHandle, Supervisor};
pub use timing::StageTimer;
