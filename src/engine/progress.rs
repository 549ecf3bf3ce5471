// Incremental parser for the ffmpeg -progress key=value stream

use std::collections::HashMap;
use std::io::BufRead;

/// Marker closing each progress record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    Continue,
    /// Terminal record; the stream ends after this one.
    End,
}

/// One complete progress record. Supersedes the previous snapshot; never
/// partially applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub frame: u64,
    pub fps: f64,
    /// Raw bitrate text as emitted (e.g. "612.3kbits/s"), "N/A" when absent.
    pub bitrate: String,
    pub total_size: Option<u64>,
    /// Encode speed relative to realtime (the "1.23x" field, x stripped).
    pub speed: f64,
    pub drop_frames: u64,
    pub dup_frames: u64,
    pub phase: ProgressPhase,
}

impl ProgressSnapshot {
    /// Completion percentage against the probed frame estimate, clamped to
    /// `[0, 100]`. `None` when no estimate exists; callers then report the
    /// bare frame count instead of guessing.
    pub fn percent(&self, total_frames: Option<u64>) -> Option<f64> {
        match total_frames {
            Some(total) if total > 0 => {
                Some((self.frame as f64 / total as f64 * 100.0).clamp(0.0, 100.0))
            }
            _ => None,
        }
    }
}

/// Accumulates key=value lines until a `progress=` marker closes the record,
/// then emits one snapshot atomically.
///
/// Malformed lines and unknown keys are skipped, not fatal; field names have
/// drifted between encoder versions and a parser that aborts on the first
/// unrecognized line would take the whole job down with it.
#[derive(Debug, Default)]
pub struct ProgressParser {
    pending: HashMap<String, String>,
}

impl ProgressParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line. Returns a snapshot only when `line` closes a record
    /// that carries the required fields; an incomplete record is discarded.
    pub fn push_line(&mut self, line: &str) -> Option<ProgressSnapshot> {
        let (key, value) = line.split_once('=')?;
        let key = key.trim();
        let value = value.trim();

        if key == "progress" {
            let phase = if value == "end" {
                ProgressPhase::End
            } else {
                ProgressPhase::Continue
            };
            let snapshot = self.complete_record(phase);
            self.pending.clear();
            return snapshot;
        }

        self.pending.insert(key.to_string(), value.to_string());
        None
    }

    /// A record without a parseable `frame` is dropped whole rather than
    /// merged into the previous snapshot.
    fn complete_record(&self, phase: ProgressPhase) -> Option<ProgressSnapshot> {
        let frame = self.pending.get("frame")?.parse().ok()?;

        let fps = self
            .pending
            .get("fps")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.0);

        let speed = self
            .pending
            .get("speed")
            .and_then(|v| v.trim_end_matches('x').parse().ok())
            .unwrap_or(0.0);

        let bitrate = self
            .pending
            .get("bitrate")
            .cloned()
            .unwrap_or_else(|| "N/A".to_string());

        let total_size = self.pending.get("total_size").and_then(|v| v.parse().ok());

        let drop_frames = self
            .pending
            .get("drop_frames")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        let dup_frames = self
            .pending
            .get("dup_frames")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        Some(ProgressSnapshot {
            frame,
            fps,
            bitrate,
            total_size,
            speed,
            drop_frames,
            dup_frames,
            phase,
        })
    }
}

/// Lazy, finite stream of snapshots over a progress source. Ends at EOF or
/// after the terminal `progress=end` record, whichever comes first; a partial
/// trailing record is never emitted.
#[derive(Debug)]
pub struct SnapshotStream<R: BufRead> {
    reader: R,
    parser: ProgressParser,
    finished: bool,
}

impl<R: BufRead> SnapshotStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            parser: ProgressParser::new(),
            finished: false,
        }
    }
}

impl<R: BufRead> Iterator for SnapshotStream<R> {
    type Item = ProgressSnapshot;

    fn next(&mut self) -> Option<ProgressSnapshot> {
        if self.finished {
            return None;
        }

        let mut line = String::new();
        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) | Err(_) => {
                    self.finished = true;
                    return None;
                }
                Ok(_) => {
                    if let Some(snapshot) = self.parser.push_line(line.trim_end()) {
                        if snapshot.phase == ProgressPhase::End {
                            self.finished = true;
                        }
                        return Some(snapshot);
                    }
                }
            }
        }
    }
}
