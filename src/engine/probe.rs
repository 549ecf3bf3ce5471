// Input probing using ffprobe

use std::path::Path;
use std::process::Command;

use super::error::ProbeError;

/// Source facts a job needs before the command can be built: resolution for
/// the scaling math, duration/rate for the total-frame estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceMetadata {
    pub width: u32,
    pub height: u32,
    pub duration_s: Option<f64>,
    pub frame_rate: Option<f64>,
    /// `floor(duration * rate)`; absent when the container has no duration.
    pub estimated_total_frames: Option<u64>,
}

impl SourceMetadata {
    /// Recompute the frame estimate for a forced output rate. With fps
    /// overridden the source rate no longer predicts the output frame count.
    pub fn with_forced_fps(mut self, target_fps: u32) -> Self {
        if target_fps != 0 {
            self.estimated_total_frames = self
                .duration_s
                .map(|dur| (dur * f64::from(target_fps)).floor() as u64);
        }
        self
    }
}

/// Probe `input_path` once, synchronously, before building the command.
///
/// Any failure here (missing binary, unreadable stream info, no video
/// stream) aborts the job before anything is launched.
pub fn probe(input_path: &Path) -> Result<SourceMetadata, ProbeError> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
            "-select_streams",
            "v:0",
        ])
        .arg(input_path)
        .output()?;

    if !output.status.success() {
        return Err(ProbeError::Tool(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    parse_probe_output(&String::from_utf8_lossy(&output.stdout), input_path)
}

/// Parse the JSON document ffprobe prints for `-show_format -show_streams`.
pub fn parse_probe_output(json_str: &str, input_path: &Path) -> Result<SourceMetadata, ProbeError> {
    let json: serde_json::Value =
        serde_json::from_str(json_str).map_err(|e| ProbeError::Parse(e.to_string()))?;

    let streams = json["streams"]
        .as_array()
        .ok_or_else(|| ProbeError::Parse("no streams array".to_string()))?;

    let video_stream = streams.first().ok_or_else(|| ProbeError::NoVideoStream {
        path: input_path.to_path_buf(),
    })?;

    let width = video_stream["width"]
        .as_u64()
        .ok_or_else(|| ProbeError::Parse("missing video width".to_string()))? as u32;
    let height = video_stream["height"]
        .as_u64()
        .ok_or_else(|| ProbeError::Parse("missing video height".to_string()))?
        as u32;

    // r_frame_rate is the container's nominal rate; avg_frame_rate is the
    // fallback for variable-rate streams.
    let frame_rate = video_stream["r_frame_rate"]
        .as_str()
        .and_then(parse_fraction)
        .or_else(|| {
            video_stream["avg_frame_rate"]
                .as_str()
                .and_then(parse_fraction)
        });

    let duration_s = json["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .or_else(|| {
            video_stream["duration"]
                .as_str()
                .and_then(|s| s.parse::<f64>().ok())
        });

    let estimated_total_frames = match (duration_s, frame_rate) {
        (Some(dur), Some(rate)) if dur > 0.0 && rate > 0.0 => Some((dur * rate).floor() as u64),
        _ => None,
    };

    Ok(SourceMetadata {
        width,
        height,
        duration_s,
        frame_rate,
        estimated_total_frames,
    })
}

/// Parse a fraction string like "30000/1001" to f64
fn parse_fraction(s: &str) -> Option<f64> {
    let parts: Vec<&str> = s.split('/').collect();
    if parts.len() != 2 {
        return None;
    }

    let numerator: f64 = parts[0].parse().ok()?;
    let denominator: f64 = parts[1].parse().ok()?;

    if denominator == 0.0 {
        return None;
    }

    Some(numerator / denominator)
}

/// Check that ffmpeg runs and report its version line.
pub fn ffmpeg_version() -> Result<String, ProbeError> {
    tool_version("ffmpeg")
}

/// Check that ffprobe runs and report its version line.
pub fn ffprobe_version() -> Result<String, ProbeError> {
    tool_version("ffprobe")
}

fn tool_version(tool: &str) -> Result<String, ProbeError> {
    let output = Command::new(tool).arg("-version").output()?;
    if !output.status.success() {
        return Err(ProbeError::Tool(format!("{tool} -version failed")));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.lines().next().unwrap_or_default().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_fraction() {
        assert_eq!(parse_fraction("30/1"), Some(30.0));

        let ntsc = parse_fraction("30000/1001").unwrap();
        assert!((ntsc - 29.97).abs() < 0.01, "Expected ~29.97, got {}", ntsc);

        assert_eq!(parse_fraction("60/1"), Some(60.0));
        assert_eq!(parse_fraction("invalid"), None);
        assert_eq!(parse_fraction("30/0"), None);
    }

    #[test]
    fn test_parse_probe_output() {
        let json = r#"{
            "streams": [
                {"width": 1920, "height": 1080, "r_frame_rate": "30/1"}
            ],
            "format": {"duration": "10.5"}
        }"#;

        let meta = parse_probe_output(json, &PathBuf::from("in.mp4")).unwrap();
        assert_eq!(meta.width, 1920);
        assert_eq!(meta.height, 1080);
        assert_eq!(meta.duration_s, Some(10.5));
        assert_eq!(meta.frame_rate, Some(30.0));
        assert_eq!(meta.estimated_total_frames, Some(315));
    }

    #[test]
    fn test_parse_probe_output_no_duration() {
        let json = r#"{
            "streams": [
                {"width": 1280, "height": 720, "r_frame_rate": "25/1"}
            ],
            "format": {}
        }"#;

        let meta = parse_probe_output(json, &PathBuf::from("in.ts")).unwrap();
        assert_eq!(meta.duration_s, None);
        assert_eq!(meta.frame_rate, Some(25.0));
        assert_eq!(meta.estimated_total_frames, None);
    }

    #[test]
    fn test_parse_probe_output_no_video_stream() {
        let json = r#"{"streams": [], "format": {"duration": "3.0"}}"#;
        let err = parse_probe_output(json, &PathBuf::from("audio.flac")).unwrap_err();
        assert!(matches!(err, ProbeError::NoVideoStream { .. }));
    }

    #[test]
    fn test_forced_fps_overrides_estimate() {
        let meta = SourceMetadata {
            width: 1920,
            height: 1080,
            duration_s: Some(10.0),
            frame_rate: Some(30.0),
            estimated_total_frames: Some(300),
        };

        assert_eq!(meta.with_forced_fps(60).estimated_total_frames, Some(600));
        assert_eq!(meta.with_forced_fps(0).estimated_total_frames, Some(300));
    }

    #[test]
    fn test_forced_fps_without_duration() {
        let meta = SourceMetadata {
            width: 1920,
            height: 1080,
            duration_s: None,
            frame_rate: Some(30.0),
            estimated_total_frames: None,
        };

        assert_eq!(meta.with_forced_fps(60).estimated_total_frames, None);
    }
}
