use crate::cli::{Cli, Commands, EncodeArgs};
use ffturn::engine::{
    AudioMode, CleanupDecision, JobController, JobState, OutputTarget, RateMode, ResolutionPolicy,
    Settings, SpeedPreset, StageTimer, probe,
};
use ffturn::{config, format, ui};
use std::io::Write;
use std::path::PathBuf;
use std::process;

pub fn run(cli: Cli) {
    if let Some(command) = cli.command {
        match command {
            Commands::CheckFfmpeg => handle_check_ffmpeg(),
            Commands::Probe { file } => handle_probe(file),
            Commands::DryRun { file, encode } => handle_dry_run(file, encode),
            Commands::Encode { file, encode } => handle_encode(file, encode),
            Commands::InitConfig => handle_init_config(),
        }
        return;
    }

    let config = config::Config::load().unwrap_or_default();
    if let Err(e) = ui::run_ui(cli.input, &config) {
        eprintln!("Error running UI: {:#}", e);
        process::exit(1);
    }
}

fn handle_check_ffmpeg() {
    match probe::ffmpeg_version() {
        Ok(version) => {
            println!("ffmpeg found: {}", version);
            match probe::ffprobe_version() {
                Ok(probe_version) => {
                    println!("ffprobe found: {}", probe_version);
                }
                Err(e) => {
                    eprintln!("Error: {:#}", e);
                    process::exit(1);
                }
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn handle_probe(file: PathBuf) {
    match probe::probe(&file) {
        Ok(meta) => {
            println!("Resolution: {}x{}", meta.width, meta.height);
            match meta.duration_s {
                Some(dur) => println!("Duration: {:.2} seconds", dur),
                None => println!("Duration: unknown"),
            }
            match meta.frame_rate {
                Some(rate) => println!("Frame rate: {:.3} fps", rate),
                None => println!("Frame rate: unknown"),
            }
            match meta.estimated_total_frames {
                Some(frames) => println!("Estimated frames: {}", frames),
                None => println!("Estimated frames: unknown (no container duration)"),
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn handle_dry_run(file: PathBuf, args: EncodeArgs) {
    let settings = settings_from_args(file, args);

    match probe::probe(&settings.input_path) {
        Ok(meta) => {
            let meta = meta.with_forced_fps(settings.target_fps);
            match ffturn::engine::build(&settings, &meta) {
                Ok(cmd) => println!("{}", cmd),
                Err(e) => {
                    eprintln!("Error: {:#}", e);
                    process::exit(1);
                }
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn handle_encode(file: PathBuf, args: EncodeArgs) {
    let settings = settings_from_args(file, args);
    let mut controller = JobController::new();
    let mut timer = StageTimer::start();

    if let Err(e) = controller.launch(&settings, &mut timer) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }

    println!(
        "Encoding: {} -> {}",
        settings.input_path.display(),
        settings.output_path().display()
    );

    enum Step {
        Sleep,
        Complete,
        Fail,
        KeepPartial,
        Stop,
    }

    loop {
        controller.pump_events();

        let step = match controller.state() {
            JobState::Running { latest, meta, .. } => {
                if let Some(snapshot) = latest {
                    let progress = match snapshot.percent(meta.estimated_total_frames) {
                        Some(pct) => format!(
                            "{:.1}% (frame {}/{})",
                            pct,
                            snapshot.frame,
                            meta.estimated_total_frames.unwrap_or(0)
                        ),
                        None => format!("frame {}", snapshot.frame),
                    };
                    let size = snapshot
                        .total_size
                        .map(format::format_bytes)
                        .unwrap_or_else(|| "N/A B".to_string());
                    print!(
                        "\rProgress: {} | {:.1} fps | {:.2}x | {}   ",
                        progress, snapshot.fps, snapshot.speed, size
                    );
                    let _ = std::io::stdout().flush();
                }
                Step::Sleep
            }
            JobState::Completed => Step::Complete,
            JobState::Failed { code, tail } => {
                eprintln!("\nffmpeg failed (exit code {:?}):", code);
                for line in tail {
                    eprintln!("  {}", line);
                }
                Step::Fail
            }
            // Headless runs never request cancellation themselves; if the
            // terminal interrupted us the partial output stays put.
            JobState::CancelledPendingCleanup { .. } => Step::KeepPartial,
            JobState::Idle => Step::Stop,
        };

        match step {
            Step::Sleep => std::thread::sleep(std::time::Duration::from_millis(200)),
            Step::Complete => {
                println!("\nConversion complete: {}", settings.output_path().display());
                return;
            }
            Step::Fail => process::exit(1),
            Step::KeepPartial => {
                let _ = controller.resolve_cleanup(CleanupDecision::Keep);
                return;
            }
            Step::Stop => return,
        }
    }
}

fn handle_init_config() {
    match config::Config::load() {
        Ok(cfg) => {
            if config::Config::exists() {
                match config::Config::config_path() {
                    Ok(path) => println!("Config loaded from {}", path.display()),
                    Err(e) => println!("Config loaded, but path unknown: {:#}", e),
                }
                println!("{:#?}", cfg);
            } else {
                println!("No config file yet, creating defaults...");
                if let Err(err) = cfg.save() {
                    eprintln!("Failed to save default config: {:#}", err);
                    process::exit(1);
                }
                match config::Config::config_path() {
                    Ok(path) => println!("Default config saved to {}", path.display()),
                    Err(e) => println!("Default config saved (path unknown): {:#}", e),
                }
            }
        }
        Err(e) => {
            eprintln!("Config invalid: {:#}", e);
            process::exit(1);
        }
    }
}

/// Map CLI flags onto a settings snapshot, starting from config defaults.
fn settings_from_args(file: PathBuf, args: EncodeArgs) -> Settings {
    let config = config::Config::load().unwrap_or_default();
    let cpus = ui::logical_cpus();
    let mut settings = Settings::for_input(file, cpus);

    settings.preset = config.defaults.preset;
    settings.target = config.defaults.target;
    settings.audio_mode = config.defaults.audio_mode;
    if config.defaults.threads != 0 {
        settings.threads = config.defaults.threads;
    }

    if let Some(kbps) = args.bitrate {
        settings.rate_mode = RateMode::Bitrate;
        settings.rate_value = kbps.to_string();
    }
    if let Some(crf) = args.crf {
        settings.rate_mode = RateMode::Crf;
        settings.rate_value = crf.to_string();
    }
    if let Some(preset) = args.preset {
        if let Some(found) = SpeedPreset::ALL
            .iter()
            .find(|p| p.as_arg() == preset.to_ascii_lowercase())
        {
            settings.preset = *found;
        }
    }
    if let Some(threads) = args.threads {
        settings.threads = threads;
    }
    if let Some(fps) = args.fps {
        settings.target_fps = fps;
    }
    if let Some(container) = args.container {
        if let Some(found) = OutputTarget::ALL
            .iter()
            .find(|t| t.extension() == container.to_ascii_lowercase())
        {
            settings.target = *found;
        }
    }
    if args.no_audio {
        settings.audio_mode = AudioMode::Off;
    }
    if let Some(kbps) = args.audio_bitrate {
        settings.audio_mode = AudioMode::Manual;
        settings.audio_bitrate = kbps.to_string();
    }
    if let Some(px) = args.fit_max {
        settings.resolution_policy = ResolutionPolicy::FitMax;
        settings.resolution_target = px;
    }
    if let Some(px) = args.fit_min {
        settings.resolution_policy = ResolutionPolicy::FitMin;
        settings.resolution_target = px;
    }
    if let Some(output) = args.output {
        settings.output_override = Some(output);
    }
    if let Some(extra) = args.extra_args {
        settings.extra_args = extra;
    }

    settings.clamp_threads(cpus);
    settings
}
