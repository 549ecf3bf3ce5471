// Property-based checks on the command builder

use ffturn::engine::{
    RateMode, ResolutionPolicy, Settings, SourceMetadata, build, scaled_resolution,
};
use proptest::prelude::*;

fn meta(width: u32, height: u32) -> SourceMetadata {
    SourceMetadata {
        width,
        height,
        duration_s: Some(10.0),
        frame_rate: Some(30.0),
        estimated_total_frames: Some(300),
    }
}

proptest! {
    /// Bitrate mode with a numeric value always yields -b:v and never -crf.
    #[test]
    fn bitrate_mode_never_emits_crf(kbps in 1u32..100_000) {
        let mut settings = Settings::for_input("/tmp/in.mp4", 8);
        settings.rate_mode = RateMode::Bitrate;
        settings.rate_value = kbps.to_string();

        let cmd = build(&settings, &meta(1920, 1080)).unwrap();
        let args = cmd.args();

        let bitrate_pos = args.iter().position(|a| a == "-b:v").expect("-b:v present");
        prop_assert_eq!(&args[bitrate_pos + 1], &format!("{}k", kbps));
        prop_assert!(!args.iter().any(|a| a == "-crf"));
        prop_assert!(!args.iter().any(|a| a == "-q:v"));
    }

    /// CRF mode with a numeric value always yields -crf and never -b:v.
    #[test]
    fn crf_mode_never_emits_bitrate(crf in 0u32..=51) {
        let mut settings = Settings::for_input("/tmp/in.mp4", 8);
        settings.rate_mode = RateMode::Crf;
        settings.rate_value = crf.to_string();

        let cmd = build(&settings, &meta(1920, 1080)).unwrap();
        let args = cmd.args();

        let crf_pos = args.iter().position(|a| a == "-crf").expect("-crf present");
        prop_assert_eq!(&args[crf_pos + 1], &crf.to_string());
        prop_assert!(!args.iter().any(|a| a == "-b:v"));
    }

    /// Fit-max scaling produces even dimensions bounded by the target.
    #[test]
    fn fit_max_bounds_and_evenness(
        width in 100u32..4096,
        height in 100u32..4096,
        target in 100u32..2048,
    ) {
        let scaled = scaled_resolution(&meta(width, height), ResolutionPolicy::FitMax, target)
            .expect("dimensions in this range always scale");

        prop_assert_eq!(scaled.width % 2, 0);
        prop_assert_eq!(scaled.height % 2, 0);
        prop_assert!(scaled.width.max(scaled.height) <= target);

        // The anchor dimension scales to exactly the target, minus the
        // even-floor adjustment.
        prop_assert_eq!(scaled.width.max(scaled.height), target - target % 2);
    }

    /// Copy policy never produces a scale filter, whatever the target says.
    #[test]
    fn copy_policy_never_scales(target in 0u32..8192) {
        let mut settings = Settings::for_input("/tmp/in.mp4", 8);
        settings.resolution_policy = ResolutionPolicy::Copy;
        settings.resolution_target = target;

        let cmd = build(&settings, &meta(1920, 1080)).unwrap();
        prop_assert!(!cmd.args().iter().any(|a| a == "-vf"));
    }

    /// Thread counts survive into the command, clamped to the core count.
    #[test]
    fn threads_clamped_into_command(threads in 0u32..256, cpus in 1u32..64) {
        let mut settings = Settings::for_input("/tmp/in.mp4", cpus);
        settings.threads = threads;
        settings.clamp_threads(cpus);

        let cmd = build(&settings, &meta(1920, 1080)).unwrap();
        let args = cmd.args();
        let pos = args.iter().position(|a| a == "-threads").unwrap();
        let value: u32 = args[pos + 1].parse().unwrap();

        prop_assert!(value >= 1);
        prop_assert!(value <= cpus);
    }
}
