// Declarative settings model for a single transcode job

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::error::BuildError;

/// Bitrate granted per audio slider step.
pub const AUDIO_SLIDER_STEP_KBPS: u32 = 32;

/// Audio slider range (1..=8, so 32k..=256k).
pub const AUDIO_SLIDER_MAX: u32 = 8;

/// Placeholder in the output template resolved to the input's parent directory.
pub const INPUT_DIR_PLACEHOLDER: &str = "%Input_Path%";

/// x264 speed/efficiency presets, slowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedPreset {
    VerySlow,
    Slower,
    Slow,
    #[default]
    Medium,
    Fast,
    Faster,
    VeryFast,
    UltraFast,
}

impl SpeedPreset {
    pub const ALL: [SpeedPreset; 8] = [
        SpeedPreset::VerySlow,
        SpeedPreset::Slower,
        SpeedPreset::Slow,
        SpeedPreset::Medium,
        SpeedPreset::Fast,
        SpeedPreset::Faster,
        SpeedPreset::VeryFast,
        SpeedPreset::UltraFast,
    ];

    /// Exact string ffmpeg expects for `-preset`.
    pub fn as_arg(&self) -> &'static str {
        match self {
            SpeedPreset::VerySlow => "veryslow",
            SpeedPreset::Slower => "slower",
            SpeedPreset::Slow => "slow",
            SpeedPreset::Medium => "medium",
            SpeedPreset::Fast => "fast",
            SpeedPreset::Faster => "faster",
            SpeedPreset::VeryFast => "veryfast",
            SpeedPreset::UltraFast => "ultrafast",
        }
    }

    pub fn from_index(idx: usize) -> Self {
        Self::ALL.get(idx).copied().unwrap_or_default()
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|p| p == self).unwrap_or(3)
    }
}

/// Muxed container formats; `Png` is the image-sequence target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputTarget {
    #[default]
    Mp4,
    Mkv,
    Avi,
    Ts,
    /// One still per frame instead of a muxed container.
    Png,
}

impl OutputTarget {
    pub const ALL: [OutputTarget; 5] = [
        OutputTarget::Mp4,
        OutputTarget::Mkv,
        OutputTarget::Avi,
        OutputTarget::Ts,
        OutputTarget::Png,
    ];

    pub fn extension(&self) -> &'static str {
        match self {
            OutputTarget::Mp4 => "mp4",
            OutputTarget::Mkv => "mkv",
            OutputTarget::Avi => "avi",
            OutputTarget::Ts => "ts",
            OutputTarget::Png => "png",
        }
    }

    pub fn is_image_sequence(&self) -> bool {
        matches!(self, OutputTarget::Png)
    }

    pub fn from_index(idx: usize) -> Self {
        Self::ALL.get(idx).copied().unwrap_or_default()
    }
}

/// Video rate control: explicit bitrate or constant rate factor.
/// Which one applies also depends on whether the user actually typed a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateMode {
    #[default]
    Bitrate,
    Crf,
}

/// How the audio stream is handled. Exactly one branch is ever active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioMode {
    /// Pass the source stream through unmodified.
    #[default]
    Copy,
    /// Bitrate from the discrete slider, `position * 32` kbps.
    Slider,
    /// User-entered bitrate, taken verbatim.
    Manual,
    /// Strip audio entirely.
    Off,
}

impl AudioMode {
    pub const ALL: [AudioMode; 4] = [
        AudioMode::Copy,
        AudioMode::Slider,
        AudioMode::Manual,
        AudioMode::Off,
    ];

    pub fn from_index(idx: usize) -> Self {
        Self::ALL.get(idx).copied().unwrap_or_default()
    }
}

/// Output resolution policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionPolicy {
    /// Keep the source resolution.
    #[default]
    Copy,
    /// Scale so the larger dimension hits the target.
    FitMax,
    /// Scale so the smaller dimension hits the target.
    FitMin,
}

impl ResolutionPolicy {
    pub const ALL: [ResolutionPolicy; 3] = [
        ResolutionPolicy::Copy,
        ResolutionPolicy::FitMax,
        ResolutionPolicy::FitMin,
    ];

    pub fn from_index(idx: usize) -> Self {
        Self::ALL.get(idx).copied().unwrap_or_default()
    }
}

/// Immutable snapshot of everything the user chose for one job.
///
/// Free-text numeric fields keep the raw string so the builder can tell
/// "nothing entered" apart from an entered zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub input_path: PathBuf,
    /// User-edited output template; `None` means "derive from the input".
    /// May contain [`INPUT_DIR_PLACEHOLDER`].
    pub output_override: Option<String>,
    pub target: OutputTarget,
    pub rate_mode: RateMode,
    /// Raw rate value text (kbps or CRF depending on `rate_mode`).
    pub rate_value: String,
    pub audio_mode: AudioMode,
    /// Slider position, `1..=AUDIO_SLIDER_MAX`.
    pub audio_slider: u32,
    /// Raw audio bitrate text for `AudioMode::Manual`.
    pub audio_bitrate: String,
    /// Worker threads handed to the encoder, clamped to `1..=cpu_count`.
    pub threads: u32,
    pub preset: SpeedPreset,
    /// Forced output frame rate; 0 keeps the source rate.
    pub target_fps: u32,
    pub resolution_policy: ResolutionPolicy,
    /// Target pixel size; only meaningful when the policy is not `Copy`.
    pub resolution_target: u32,
    pub overwrite: bool,
    /// Extra ffmpeg arguments appended verbatim (shell-style quoting).
    pub extra_args: String,
}

impl Settings {
    /// Defaults for a fresh job on `input`, sized against `cpu_count`
    /// logical cores (threads and the audio slider start at 3/4 of max).
    pub fn for_input(input: impl Into<PathBuf>, cpu_count: u32) -> Self {
        let cpu_count = cpu_count.max(1);
        Self {
            input_path: input.into(),
            output_override: None,
            target: OutputTarget::default(),
            rate_mode: RateMode::default(),
            rate_value: String::new(),
            audio_mode: AudioMode::default(),
            audio_slider: (AUDIO_SLIDER_MAX * 3 / 4).max(1),
            audio_bitrate: String::new(),
            threads: (cpu_count * 3 / 4).max(1),
            preset: SpeedPreset::default(),
            target_fps: 0,
            resolution_policy: ResolutionPolicy::default(),
            resolution_target: 0,
            overwrite: true,
            extra_args: String::new(),
        }
    }

    /// Clamp the thread count into `[1, cpu_count]`.
    pub fn clamp_threads(&mut self, cpu_count: u32) {
        self.threads = self.threads.clamp(1, cpu_count.max(1));
    }

    pub fn validate(&self) -> Result<(), BuildError> {
        if self.input_path.as_os_str().is_empty() {
            return Err(BuildError::MissingInput);
        }
        Ok(())
    }

    /// Entered rate value, if the user actually typed digits.
    pub fn rate_value_entered(&self) -> Option<u64> {
        parse_digits(&self.rate_value)
    }

    /// Entered manual audio bitrate, if any.
    pub fn audio_bitrate_entered(&self) -> Option<u64> {
        parse_digits(&self.audio_bitrate)
    }

    /// Slider-derived audio bitrate in kbps.
    pub fn audio_slider_kbps(&self) -> u32 {
        self.audio_slider.clamp(1, AUDIO_SLIDER_MAX) * AUDIO_SLIDER_STEP_KBPS
    }

    /// Output template shown to (and editable by) the user. Deterministic in
    /// the input path, target and fps:
    /// `%Input_Path%/<stem>-converted[-<n>fps].<ext>`, or
    /// `%Input_Path%/<stem>-converted[-<n>fps]/%06d.png` for image sequences.
    pub fn output_template(&self) -> String {
        let stem = self
            .input_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let fps_tag = if self.target_fps != 0 {
            format!("-{}fps", self.target_fps)
        } else {
            String::new()
        };

        let base = format!("{INPUT_DIR_PLACEHOLDER}/{stem}-converted{fps_tag}");
        if self.target.is_image_sequence() {
            format!("{base}/%06d.png")
        } else {
            format!("{base}.{}", self.target.extension())
        }
    }

    /// Concrete output path: the override if the user edited one, otherwise
    /// the derived template, with the input-directory placeholder resolved.
    pub fn output_path(&self) -> PathBuf {
        let template = self
            .output_override
            .clone()
            .unwrap_or_else(|| self.output_template());

        let input_dir = self
            .input_path
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();

        PathBuf::from(template.replace(INPUT_DIR_PLACEHOLDER, &input_dir))
    }

    /// For image sequences the frames land in a directory; cleanup and
    /// overwrite checks operate on it rather than on the `%06d` pattern.
    pub fn output_cleanup_path(&self) -> PathBuf {
        let output = self.output_path();
        if self.target.is_image_sequence() {
            output.parent().map(|p| p.to_path_buf()).unwrap_or(output)
        } else {
            output
        }
    }
}

/// Digits-only parse of a free-text field. `None` when nothing numeric was
/// entered, so callers can fall back rather than encode at 0.
pub fn parse_digits(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}
