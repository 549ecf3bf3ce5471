// Snapshot the exact argument vectors handed to ffmpeg

use ffturn::engine::{
    AudioMode, OutputTarget, RateMode, ResolutionPolicy, Settings, SourceMetadata, build,
};
use insta::assert_snapshot;

fn meta_1080p30() -> SourceMetadata {
    SourceMetadata {
        width: 1920,
        height: 1080,
        duration_s: Some(60.0),
        frame_rate: Some(30.0),
        estimated_total_frames: Some(1800),
    }
}

fn base_settings() -> Settings {
    Settings::for_input("/tmp/input.mp4", 8)
}

#[test]
fn snapshot_default_command() {
    let settings = base_settings();
    let cmd = build(&settings, &meta_1080p30()).unwrap();
    assert_snapshot!(
        cmd.to_string(),
        @"ffmpeg -y -i /tmp/input.mp4 -threads 6 -preset medium -progress - -nostats -c:v libx264 -map 0:v:? -map 0:a:? -map_metadata 0 -q:v 0 -c:a copy /tmp/input-converted.mp4"
    );
}

#[test]
fn snapshot_crf_scaled_forced_fps() {
    let mut settings = base_settings();
    settings.rate_mode = RateMode::Crf;
    settings.rate_value = "23".to_string();
    settings.target_fps = 30;
    settings.resolution_policy = ResolutionPolicy::FitMin;
    settings.resolution_target = 720;
    settings.audio_mode = AudioMode::Slider;
    settings.audio_slider = 4;

    let cmd = build(&settings, &meta_1080p30()).unwrap();
    assert_snapshot!(
        cmd.to_string(),
        @"ffmpeg -y -i /tmp/input.mp4 -threads 6 -preset medium -progress - -nostats -r 30 -c:v libx264 -map 0:v:? -map 0:a:? -map_metadata 0 -crf 23 -b:a 128k -vf scale=1280:720 /tmp/input-converted-30fps.mp4"
    );
}

#[test]
fn snapshot_image_sequence_command() {
    let mut settings = base_settings();
    settings.target = OutputTarget::Png;

    let cmd = build(&settings, &meta_1080p30()).unwrap();
    assert_snapshot!(
        cmd.to_string(),
        @"ffmpeg -y -i /tmp/input.mp4 -threads 6 -preset medium -progress - -nostats /tmp/input-converted/%06d.png"
    );
}

#[test]
fn snapshot_explicit_bitrate_no_audio() {
    let mut settings = base_settings();
    settings.rate_mode = RateMode::Bitrate;
    settings.rate_value = "2500".to_string();
    settings.audio_mode = AudioMode::Off;
    settings.target = OutputTarget::Mkv;

    let cmd = build(&settings, &meta_1080p30()).unwrap();
    assert_snapshot!(
        cmd.to_string(),
        @"ffmpeg -y -i /tmp/input.mp4 -threads 6 -preset medium -progress - -nostats -c:v libx264 -map 0:v:? -map 0:a:? -map_metadata 0 -b:v 2500k -an /tmp/input-converted.mkv"
    );
}
