// Pure mapping from settings + probed metadata to an ffmpeg argument vector

use std::fmt;
use std::process::Command;

use super::error::BuildError;
use super::probe::SourceMetadata;
use super::settings::{AudioMode, RateMode, ResolutionPolicy, Settings};

/// Output dimensions after applying the resolution policy. Each dimension is
/// floored to the nearest even integer; encoders reject odd sizes for 4:2:0
/// chroma subsampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaledResolution {
    pub width: u32,
    pub height: u32,
    /// The ideal scaled size was non-integral before flooring. A warning
    /// condition, not an error.
    pub imprecise: bool,
}

impl ScaledResolution {
    pub fn matches_source(&self, meta: &SourceMetadata) -> bool {
        self.width == meta.width && self.height == meta.height
    }
}

/// Apply `policy`/`target_px` to the probed dimensions.
pub fn scaled_resolution(
    meta: &SourceMetadata,
    policy: ResolutionPolicy,
    target_px: u32,
) -> Result<ScaledResolution, BuildError> {
    if policy == ResolutionPolicy::Copy {
        return Ok(ScaledResolution {
            width: meta.width,
            height: meta.height,
            imprecise: false,
        });
    }

    let anchor = match policy {
        ResolutionPolicy::FitMax => meta.width.max(meta.height),
        ResolutionPolicy::FitMin => meta.width.min(meta.height),
        ResolutionPolicy::Copy => unreachable!(),
    };

    let mut imprecise = false;
    let mut scale_dim = |dim: u32| -> i64 {
        // Multiply before dividing so exact ratios stay exact in f64.
        let ideal = f64::from(dim) * f64::from(target_px) / f64::from(anchor.max(1));
        if (ideal - ideal.round()).abs() > 1e-6 {
            imprecise = true;
        }
        let floored = (ideal + 1e-6).floor() as i64;
        floored - floored.rem_euclid(2)
    };

    let width = scale_dim(meta.width);
    let height = scale_dim(meta.height);

    if width < 2 || height < 2 {
        return Err(BuildError::InvalidResolution { width, height });
    }

    Ok(ScaledResolution {
        width: width as u32,
        height: height as u32,
        imprecise,
    })
}

/// The argument vector handed to ffmpeg. Produced once per job, immutable,
/// logged verbatim for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCommand {
    program: String,
    args: Vec<String>,
}

impl JobCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn to_process_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for JobCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Build the complete ffmpeg invocation for one job.
///
/// Pure and deterministic: no filesystem access, no process probing. The
/// caller probes first and reports `BuildError` before anything is spawned.
pub fn build(settings: &Settings, meta: &SourceMetadata) -> Result<JobCommand, BuildError> {
    settings.validate()?;

    let scaled = scaled_resolution(meta, settings.resolution_policy, settings.resolution_target)?;

    let mut args: Vec<String> = Vec::new();
    let mut push = |a: &str| args.push(a.to_string());

    // Overwrite without prompting; the caller owns the overwrite decision.
    push("-y");
    push("-i");
    push(&settings.input_path.to_string_lossy());

    push("-threads");
    push(&settings.threads.to_string());
    push("-preset");
    push(settings.preset.as_arg());

    // Machine-readable progress on stdout, human banner suppressed, so the
    // stream parser always has a stable format to read.
    push("-progress");
    push("-");
    push("-nostats");

    if settings.target_fps != 0 {
        push("-r");
        push(&settings.target_fps.to_string());
    }

    if !settings.target.is_image_sequence() {
        push("-c:v");
        push("libx264");

        // Map every video/audio stream and keep container metadata so
        // multi-stream sources are not silently truncated.
        push("-map");
        push("0:v:?");
        push("-map");
        push("0:a:?");
        push("-map_metadata");
        push("0");

        // Exactly one rate-control branch; an empty or non-numeric entry
        // falls back to default quality, never to a zero bitrate.
        match (settings.rate_mode, settings.rate_value_entered()) {
            (RateMode::Bitrate, Some(kbps)) => {
                push("-b:v");
                push(&format!("{kbps}k"));
            }
            (RateMode::Crf, Some(crf)) => {
                push("-crf");
                push(&crf.to_string());
            }
            _ => {
                push("-q:v");
                push("0");
            }
        }

        // Exactly one audio branch.
        match settings.audio_mode {
            AudioMode::Copy => {
                push("-c:a");
                push("copy");
            }
            AudioMode::Slider => {
                push("-b:a");
                push(&format!("{}k", settings.audio_slider_kbps()));
            }
            AudioMode::Manual => {
                push("-b:a");
                push(&format!(
                    "{}k",
                    settings.audio_bitrate_entered().unwrap_or(0)
                ));
            }
            AudioMode::Off => {
                push("-an");
            }
        }
    }

    // Skip the scale filter when the computed size equals the source;
    // a no-op scale still forces a full re-encode pass through the filter.
    if settings.resolution_policy != ResolutionPolicy::Copy && !scaled.matches_source(meta) {
        push("-vf");
        push(&format!("scale={}:{}", scaled.width, scaled.height));
    }

    if !settings.extra_args.is_empty() {
        // Shell-style parsing so quoted strings with spaces survive.
        if let Some(extra) = shlex::split(&settings.extra_args) {
            args.extend(extra);
        } else {
            args.extend(settings.extra_args.split_whitespace().map(String::from));
        }
    }

    args.push(settings.output_path().to_string_lossy().into_owned());

    Ok(JobCommand {
        program: "ffmpeg".to_string(),
        args,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::settings::OutputTarget;

    fn meta_1080p() -> SourceMetadata {
        SourceMetadata {
            width: 1920,
            height: 1080,
            duration_s: Some(10.0),
            frame_rate: Some(30.0),
            estimated_total_frames: Some(300),
        }
    }

    fn base_settings() -> Settings {
        Settings::for_input("/videos/in.mp4", 8)
    }

    fn joined(cmd: &JobCommand) -> String {
        cmd.args().join(" ")
    }

    #[test]
    fn test_bitrate_mode_excludes_crf() {
        let mut settings = base_settings();
        settings.rate_mode = RateMode::Bitrate;
        settings.rate_value = "2500".to_string();

        let cmd = build(&settings, &meta_1080p()).unwrap();
        let line = joined(&cmd);
        assert!(line.contains("-b:v 2500k"));
        assert!(!line.contains("-crf"));
        assert!(!line.contains("-q:v"));
    }

    #[test]
    fn test_crf_mode_excludes_bitrate() {
        let mut settings = base_settings();
        settings.rate_mode = RateMode::Crf;
        settings.rate_value = "23".to_string();

        let cmd = build(&settings, &meta_1080p()).unwrap();
        let line = joined(&cmd);
        assert!(line.contains("-crf 23"));
        assert!(!line.contains("-b:v"));
    }

    #[test]
    fn test_empty_rate_value_falls_back_to_default_quality() {
        let mut settings = base_settings();
        settings.rate_value = "not a number".to_string();

        let cmd = build(&settings, &meta_1080p()).unwrap();
        let line = joined(&cmd);
        assert!(line.contains("-q:v 0"));
        assert!(!line.contains("-b:v"));
        assert!(!line.contains("-crf"));
    }

    #[test]
    fn test_audio_branches_exclusive() {
        let mut settings = base_settings();

        settings.audio_mode = AudioMode::Copy;
        let line = joined(&build(&settings, &meta_1080p()).unwrap());
        assert!(line.contains("-c:a copy"));
        assert!(!line.contains("-b:a"));
        assert!(!line.contains("-an"));

        settings.audio_mode = AudioMode::Slider;
        settings.audio_slider = 4;
        let line = joined(&build(&settings, &meta_1080p()).unwrap());
        assert!(line.contains("-b:a 128k"));
        assert!(!line.contains("-c:a copy"));

        settings.audio_mode = AudioMode::Manual;
        settings.audio_bitrate = "192".to_string();
        let line = joined(&build(&settings, &meta_1080p()).unwrap());
        assert!(line.contains("-b:a 192k"));

        settings.audio_mode = AudioMode::Off;
        let line = joined(&build(&settings, &meta_1080p()).unwrap());
        assert!(line.contains("-an"));
        assert!(!line.contains("-b:a"));
        assert!(!line.contains("-c:a"));
    }

    #[test]
    fn test_image_sequence_omits_video_args() {
        let mut settings = base_settings();
        settings.target = OutputTarget::Png;

        let cmd = build(&settings, &meta_1080p()).unwrap();
        let line = joined(&cmd);
        assert!(!line.contains("-c:v"));
        assert!(!line.contains("-map"));
        assert!(!line.contains("-c:a"));
        assert!(line.ends_with("%06d.png"));
    }

    #[test]
    fn test_fps_flag_only_when_set() {
        let mut settings = base_settings();
        let line = joined(&build(&settings, &meta_1080p()).unwrap());
        assert!(!line.contains("-r "));

        settings.target_fps = 24;
        let line = joined(&build(&settings, &meta_1080p()).unwrap());
        assert!(line.contains("-r 24"));
    }

    #[test]
    fn test_progress_flags_always_present() {
        let settings = base_settings();
        let cmd = build(&settings, &meta_1080p()).unwrap();
        let line = joined(&cmd);
        assert!(line.starts_with("-y -i"));
        assert!(line.contains("-progress - -nostats"));
    }

    #[test]
    fn test_scale_fit_min_1080_to_720() {
        let meta = meta_1080p();
        let scaled = scaled_resolution(&meta, ResolutionPolicy::FitMin, 720).unwrap();
        assert_eq!((scaled.width, scaled.height), (1280, 720));
        assert!(!scaled.imprecise);

        let mut settings = base_settings();
        settings.resolution_policy = ResolutionPolicy::FitMin;
        settings.resolution_target = 720;
        let line = joined(&build(&settings, &meta).unwrap());
        assert!(line.contains("-vf scale=1280:720"));
    }

    #[test]
    fn test_scale_fit_max() {
        let meta = meta_1080p();
        let scaled = scaled_resolution(&meta, ResolutionPolicy::FitMax, 1280).unwrap();
        assert_eq!((scaled.width, scaled.height), (1280, 720));
    }

    #[test]
    fn test_scale_imprecise_floors_to_even() {
        let meta = SourceMetadata {
            width: 1919,
            height: 1079,
            duration_s: None,
            frame_rate: None,
            estimated_total_frames: None,
        };
        let scaled = scaled_resolution(&meta, ResolutionPolicy::FitMax, 1280).unwrap();
        assert!(scaled.imprecise);
        assert_eq!(scaled.width % 2, 0);
        assert_eq!(scaled.height % 2, 0);
        assert!(scaled.width <= 1280);
    }

    #[test]
    fn test_scale_omitted_when_matching_source() {
        let meta = meta_1080p();
        let mut settings = base_settings();
        settings.resolution_policy = ResolutionPolicy::FitMax;
        settings.resolution_target = 1920;

        let line = joined(&build(&settings, &meta).unwrap());
        assert!(!line.contains("-vf"), "no-op scale must be omitted: {line}");
    }

    #[test]
    fn test_zero_target_is_invalid_resolution() {
        let meta = meta_1080p();
        let mut settings = base_settings();
        settings.resolution_policy = ResolutionPolicy::FitMax;
        settings.resolution_target = 0;

        match build(&settings, &meta) {
            Err(BuildError::InvalidResolution { .. }) => {}
            other => panic!("expected InvalidResolution, got {other:?}"),
        }
    }

    #[test]
    fn test_extra_args_shell_split() {
        let mut settings = base_settings();
        settings.extra_args = "-metadata title=\"two words\"".to_string();

        let cmd = build(&settings, &meta_1080p()).unwrap();
        let args = cmd.args();
        assert!(args.contains(&"-metadata".to_string()));
        assert!(args.contains(&"title=two words".to_string()));
    }

    #[test]
    fn test_threads_and_preset_passed_through() {
        let mut settings = base_settings();
        settings.threads = 3;
        settings.preset = crate::engine::settings::SpeedPreset::Slower;

        let line = joined(&build(&settings, &meta_1080p()).unwrap());
        assert!(line.contains("-threads 3"));
        assert!(line.contains("-preset slower"));
    }
}
