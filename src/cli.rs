use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ffturn")]
#[command(about = "Single-file FFMPEG transcoder with live dashboard", long_about = None)]
pub struct Cli {
    /// Input video to preload into the dashboard
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that ffmpeg and ffprobe are installed
    CheckFfmpeg,

    /// Probe a video file and print its stream metadata
    Probe {
        /// Path to the video file
        file: PathBuf,
    },

    /// Print the ffmpeg command that would run, without executing it
    DryRun {
        /// Path to the video file
        file: PathBuf,

        #[command(flatten)]
        encode: EncodeArgs,
    },

    /// Transcode a file headlessly with progress on stdout
    Encode {
        /// Path to the video file
        file: PathBuf,

        #[command(flatten)]
        encode: EncodeArgs,
    },

    /// Show config status and location, or create a default config
    InitConfig,
}

/// Encode parameters shared by `encode` and `dry-run`.
#[derive(Debug, clap::Args)]
pub struct EncodeArgs {
    /// Video bitrate in kbps
    #[arg(long, conflicts_with = "crf")]
    pub bitrate: Option<u32>,

    /// Constant rate factor (0-51)
    #[arg(long, conflicts_with = "bitrate")]
    pub crf: Option<u32>,

    /// x264 speed preset (veryslow..ultrafast)
    #[arg(long)]
    pub preset: Option<String>,

    /// Encoder threads (clamped to the core count)
    #[arg(long)]
    pub threads: Option<u32>,

    /// Force the output frame rate
    #[arg(long)]
    pub fps: Option<u32>,

    /// Output container: mp4, mkv, avi, ts, or png for an image sequence
    #[arg(long)]
    pub container: Option<String>,

    /// Drop the audio stream
    #[arg(long)]
    pub no_audio: bool,

    /// Audio bitrate in kbps (default: copy the source stream)
    #[arg(long, conflicts_with = "no_audio")]
    pub audio_bitrate: Option<u32>,

    /// Scale so the larger dimension is at most this many pixels
    #[arg(long, conflicts_with = "fit_min")]
    pub fit_max: Option<u32>,

    /// Scale so the smaller dimension is at most this many pixels
    #[arg(long, conflicts_with = "fit_max")]
    pub fit_min: Option<u32>,

    /// Output path (defaults to <input dir>/<stem>-converted.<ext>)
    #[arg(long, short)]
    pub output: Option<String>,

    /// Extra arguments appended to the ffmpeg command
    #[arg(long)]
    pub extra_args: Option<String>,
}

pub fn parse() -> Cli {
    Cli::parse()
}
