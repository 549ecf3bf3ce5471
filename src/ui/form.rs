// Declarative form: a field-descriptor table consumed by a static builder.
// Widgets are data here; nothing constructs UI objects by name.

use std::path::PathBuf;

use crate::config::Config;
use crate::engine::settings::{
    AUDIO_SLIDER_MAX, AudioMode, OutputTarget, RateMode, ResolutionPolicy, Settings, SpeedPreset,
    parse_digits,
};

/// Stable identity of each form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldId {
    Input,
    Output,
    Container,
    RateMode,
    RateValue,
    AudioMode,
    AudioSlider,
    AudioValue,
    Threads,
    Preset,
    Fps,
    ResPolicy,
    ResTarget,
    ExtraArgs,
}

/// What kind of widget a field renders as and how it reacts to keys.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Text,
    Select(&'static [&'static str]),
    /// `max == 0` resolves to the logical core count at runtime.
    Slider { min: u32, max: u32 },
}

pub struct FieldSpec {
    pub id: FieldId,
    pub label: &'static str,
    pub kind: FieldKind,
}

pub const RATE_MODES: &[&str] = &["kb/s", "crf"];
pub const AUDIO_MODES: &[&str] = &["copy", "slider", "input", "none"];
pub const CONTAINERS: &[&str] = &["mp4", "mkv", "avi", "ts", "png"];
pub const RES_POLICIES: &[&str] = &["copy", "max", "min"];
pub const PRESETS: &[&str] = &[
    "veryslow",
    "slower",
    "slow",
    "medium",
    "fast",
    "faster",
    "veryfast",
    "ultrafast",
];

/// The whole form, in display order. The renderer and the event handler both
/// walk this table; adding a field means adding a row here plus its state
/// accessor, nothing else.
pub const FORM: &[FieldSpec] = &[
    FieldSpec {
        id: FieldId::Input,
        label: "Input video",
        kind: FieldKind::Text,
    },
    FieldSpec {
        id: FieldId::Output,
        label: "Output",
        kind: FieldKind::Text,
    },
    FieldSpec {
        id: FieldId::Container,
        label: "Format",
        kind: FieldKind::Select(CONTAINERS),
    },
    FieldSpec {
        id: FieldId::RateMode,
        label: "Video rate mode",
        kind: FieldKind::Select(RATE_MODES),
    },
    FieldSpec {
        id: FieldId::RateValue,
        label: "Video rate value",
        kind: FieldKind::Text,
    },
    FieldSpec {
        id: FieldId::AudioMode,
        label: "Audio",
        kind: FieldKind::Select(AUDIO_MODES),
    },
    FieldSpec {
        id: FieldId::AudioSlider,
        label: "Audio bitrate",
        kind: FieldKind::Slider {
            min: 1,
            max: AUDIO_SLIDER_MAX,
        },
    },
    FieldSpec {
        id: FieldId::AudioValue,
        label: "Audio bitrate",
        kind: FieldKind::Text,
    },
    FieldSpec {
        id: FieldId::Threads,
        label: "Threads",
        kind: FieldKind::Slider { min: 1, max: 0 },
    },
    FieldSpec {
        id: FieldId::Preset,
        label: "Speed",
        kind: FieldKind::Select(PRESETS),
    },
    FieldSpec {
        id: FieldId::Fps,
        label: "fps",
        kind: FieldKind::Text,
    },
    FieldSpec {
        id: FieldId::ResPolicy,
        label: "Resolution",
        kind: FieldKind::Select(RES_POLICIES),
    },
    FieldSpec {
        id: FieldId::ResTarget,
        label: "Resolution px",
        kind: FieldKind::Text,
    },
    FieldSpec {
        id: FieldId::ExtraArgs,
        label: "Extra args",
        kind: FieldKind::Text,
    },
];

/// Editable mirror of [`Settings`], one value per form row.
#[derive(Debug, Clone)]
pub struct FormState {
    pub input: String,
    pub output: String,
    /// Once the user edits the output by hand it stops tracking the input.
    pub output_edited: bool,
    pub container_idx: usize,
    pub rate_mode_idx: usize,
    pub rate_value: String,
    pub audio_idx: usize,
    pub audio_slider: u32,
    pub audio_value: String,
    pub threads: u32,
    pub preset_idx: usize,
    pub fps: String,
    pub res_idx: usize,
    pub res_target: String,
    pub extra_args: String,
    /// Index into the currently visible rows.
    pub focus: usize,
}

impl FormState {
    pub fn new(cpus: u32, config: &Config) -> Self {
        let defaults = Settings::for_input("", cpus);
        let threads = if config.defaults.threads != 0 {
            config.defaults.threads.clamp(1, cpus)
        } else {
            defaults.threads
        };

        Self {
            input: String::new(),
            output: String::new(),
            output_edited: false,
            container_idx: OutputTarget::ALL
                .iter()
                .position(|t| *t == config.defaults.target)
                .unwrap_or(0),
            rate_mode_idx: 0,
            rate_value: String::new(),
            audio_idx: AudioMode::ALL
                .iter()
                .position(|m| *m == config.defaults.audio_mode)
                .unwrap_or(0),
            audio_slider: defaults.audio_slider,
            audio_value: String::new(),
            threads,
            preset_idx: config.defaults.preset.index(),
            fps: String::new(),
            res_idx: 0,
            res_target: String::new(),
            extra_args: String::new(),
            focus: 0,
        }
    }

    /// A field is shown only when the current mode makes it meaningful.
    pub fn is_visible(&self, id: FieldId) -> bool {
        match id {
            FieldId::AudioSlider => AudioMode::from_index(self.audio_idx) == AudioMode::Slider,
            FieldId::AudioValue => AudioMode::from_index(self.audio_idx) == AudioMode::Manual,
            FieldId::ResTarget => {
                ResolutionPolicy::from_index(self.res_idx) != ResolutionPolicy::Copy
            }
            _ => true,
        }
    }

    /// The static builder input: table rows filtered by visibility.
    pub fn visible_fields(&self) -> Vec<&'static FieldSpec> {
        FORM.iter().filter(|f| self.is_visible(f.id)).collect()
    }

    pub fn focused_field(&self) -> &'static FieldSpec {
        let fields = self.visible_fields();
        fields[self.focus.min(fields.len() - 1)]
    }

    pub fn focus_next(&mut self) {
        let count = self.visible_fields().len();
        self.focus = (self.focus + 1) % count;
    }

    pub fn focus_prev(&mut self) {
        let count = self.visible_fields().len();
        self.focus = (self.focus + count - 1) % count;
    }

    /// Clamp focus after a visibility change removed rows.
    pub fn clamp_focus(&mut self) {
        let count = self.visible_fields().len();
        if self.focus >= count {
            self.focus = count - 1;
        }
    }

    /// Re-derive the displayed output template from the input and current
    /// modes, unless the user has taken it over.
    pub fn refresh_output_template(&mut self) {
        if self.output_edited {
            return;
        }
        if self.input.trim().is_empty() {
            self.output.clear();
            return;
        }
        let settings = self.to_settings(1);
        self.output = settings.output_template();
    }

    /// Freeze the form into the immutable settings snapshot.
    pub fn to_settings(&self, cpus: u32) -> Settings {
        let mut settings = Settings::for_input(PathBuf::from(self.input.trim()), cpus);
        settings.target = OutputTarget::from_index(self.container_idx);
        settings.rate_mode = if self.rate_mode_idx == 0 {
            RateMode::Bitrate
        } else {
            RateMode::Crf
        };
        settings.rate_value = self.rate_value.clone();
        settings.audio_mode = AudioMode::from_index(self.audio_idx);
        settings.audio_slider = self.audio_slider;
        settings.audio_bitrate = self.audio_value.clone();
        settings.threads = self.threads;
        settings.preset = SpeedPreset::from_index(self.preset_idx);
        settings.target_fps = parse_digits(&self.fps).unwrap_or(0) as u32;
        settings.resolution_policy = ResolutionPolicy::from_index(self.res_idx);
        settings.resolution_target = parse_digits(&self.res_target).unwrap_or(0) as u32;
        settings.extra_args = self.extra_args.clone();
        if self.output_edited && !self.output.trim().is_empty() {
            settings.output_override = Some(self.output.trim().to_string());
        }
        settings.clamp_threads(cpus);
        settings
    }
}
