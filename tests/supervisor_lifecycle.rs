// Supervisor lifecycle against stub child processes.
// Unix-only: the stubs are small `sh` scripts.
#![cfg(unix)]

use ffturn::engine::{ExitOutcome, JobCommand, JobError, JobEvent, Supervisor};
use std::path::PathBuf;
use std::time::{Duration, Instant};

fn stub(script: &str) -> JobCommand {
    JobCommand::new("sh", vec!["-c".to_string(), script.to_string()])
}

fn wait_until_finished(handle: &ffturn::engine::JobHandle) {
    let deadline = Instant::now() + Duration::from_secs(20);
    while !handle.is_finished() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(50));
    }
}

#[test]
fn successful_run_cleans_scratch_and_reports_completed() {
    let supervisor = Supervisor::new();
    let handle = supervisor
        .start(&stub(
            "printf 'frame=1\\nprogress=continue\\nframe=2\\nprogress=end\\n'; sleep 1",
        ))
        .unwrap();

    let scratch: PathBuf = handle.scratch_path().to_path_buf();
    assert!(scratch.exists(), "scratch must exist while the job runs");

    let outcome = handle.wait();
    assert_eq!(outcome, ExitOutcome::Completed);
    assert!(!scratch.exists(), "scratch must be removed after success");
    assert!(!supervisor.is_busy());
}

#[test]
fn progress_records_flow_through_events() {
    let supervisor = Supervisor::new();
    let handle = supervisor
        .start(&stub(
            "printf 'frame=10\\nfps=25.0\\nspeed=1.1x\\nprogress=continue\\n'; \
             sleep 1; \
             printf 'frame=20\\nfps=25.0\\nspeed=1.2x\\nprogress=end\\n'",
        ))
        .unwrap();

    let mut frames = Vec::new();
    let deadline = Instant::now() + Duration::from_secs(20);
    loop {
        match handle.events().recv_timeout(Duration::from_secs(5)) {
            Ok(JobEvent::Progress(snapshot)) => frames.push(snapshot.frame),
            Ok(JobEvent::Finished(outcome)) => {
                assert_eq!(outcome, ExitOutcome::Completed);
                break;
            }
            Ok(JobEvent::Started { .. }) => {}
            Err(_) => panic!("no terminal event before timeout"),
        }
        assert!(Instant::now() < deadline, "stub job hung");
    }

    assert_eq!(frames, vec![10, 20]);
    let _ = handle.wait();
}

#[test]
fn failing_run_reports_code_and_diagnostic_tail() {
    let supervisor = Supervisor::new();
    let handle = supervisor
        .start(&stub("echo 'boom: no such codec' >&2; exit 3"))
        .unwrap();

    let scratch = handle.scratch_path().to_path_buf();
    let outcome = handle.wait();

    match outcome {
        ExitOutcome::Failed { code, tail } => {
            assert_eq!(code, Some(3));
            assert!(
                tail.iter().any(|l| l.contains("boom: no such codec")),
                "tail should carry the captured stderr: {tail:?}"
            );
        }
        other => panic!("expected Failed, got {other:?}"),
    }

    assert!(!scratch.exists(), "scratch must be removed after failure");
    assert!(!supervisor.is_busy());
}

#[test]
fn cancel_interrupts_until_dead_and_cleans_up() {
    let supervisor = Supervisor::new();
    let handle = supervisor.start(&stub("sleep 30")).unwrap();
    let scratch = handle.scratch_path().to_path_buf();

    // Give the child a moment to exist before interrupting it.
    std::thread::sleep(Duration::from_millis(200));

    let started = Instant::now();
    handle.cancel();
    assert!(
        started.elapsed() < Duration::from_secs(15),
        "cancel should finish well before the stub's natural exit"
    );

    wait_until_finished(&handle);
    let outcome = handle.wait();
    assert_eq!(outcome, ExitOutcome::Cancelled);
    assert!(!scratch.exists(), "scratch must be removed after cancel");
    assert!(!supervisor.is_busy());
}

#[test]
fn second_start_is_rejected_without_touching_the_first() {
    let supervisor = Supervisor::new();
    let handle = supervisor.start(&stub("sleep 10")).unwrap();
    let scratch = handle.scratch_path().to_path_buf();

    match supervisor.start(&stub("true")) {
        Err(JobError::AlreadyRunning) => {}
        other => panic!("expected AlreadyRunning, got {other:?}"),
    }

    assert!(
        scratch.exists(),
        "rejected start must not disturb the running job's scratch"
    );

    handle.cancel();
    let _ = handle.wait();
    assert!(!supervisor.is_busy());
}

#[test]
fn supervisor_accepts_a_new_job_after_the_previous_finishes() {
    let supervisor = Supervisor::new();
    let first = supervisor.start(&stub("true")).unwrap();
    assert_eq!(first.wait(), ExitOutcome::Completed);

    let second = supervisor.start(&stub("true")).unwrap();
    assert_eq!(second.wait(), ExitOutcome::Completed);
}

#[test]
fn unspawnable_command_fails_fast_and_leaves_no_scratch() {
    let supervisor = Supervisor::new();
    let result = supervisor.start(&JobCommand::new(
        "/nonexistent/ffturn-no-such-binary",
        vec![],
    ));

    match result {
        Err(JobError::Launch(_)) => {}
        other => panic!("expected Launch error, got {other:?}"),
    }

    // The slot must be free again immediately.
    assert!(!supervisor.is_busy());
    let retry = supervisor.start(&stub("true")).unwrap();
    assert_eq!(retry.wait(), ExitOutcome::Completed);
}
