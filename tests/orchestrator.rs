//! Behaviour of the measurement orchestrator against a scripted provider.

mod common;

use common::{Script, ScriptedProvider, Step};
use speedtest_service::errors::ErrorKind;
use speedtest_service::measurement::{
    MeasurementOrchestrator, OrchestratorConfig, TestPhase, TestStatus,
    HISTORY_CAPACITY,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Barrier, Notify};

fn orchestrator(
    provider: Arc<ScriptedProvider>,
    config: OrchestratorConfig,
) -> Arc<MeasurementOrchestrator> {
    Arc::new(MeasurementOrchestrator::new(provider, config))
}

async fn run_once(orchestrator: &Arc<MeasurementOrchestrator>) {
    assert!(orchestrator.start_measurement().started);
    orchestrator.wait_until_idle().await;
}

#[tokio::test]
async fn initial_state_is_ready_and_empty() {
    let orchestrator =
        orchestrator(ScriptedProvider::new(Script::default()), OrchestratorConfig::default());

    let snapshot = orchestrator.snapshot();
    assert_eq!(snapshot.status, TestStatus::Ready);
    assert_eq!(snapshot.progress, 0);
    assert!(orchestrator.latest_result().is_none());
    assert!(orchestrator.history().is_empty());
    assert!(!orchestrator.is_testing());
}

#[tokio::test]
async fn successful_run_publishes_result() {
    let provider = ScriptedProvider::new(Script::default());
    let orchestrator = orchestrator(provider.clone(), OrchestratorConfig::default());

    run_once(&orchestrator).await;

    let result = orchestrator.latest_result().expect("result after success");
    assert_eq!(result.download_mbps, 93.42);
    assert_eq!(result.upload_mbps, 11.07);
    assert_eq!(result.ping_ms, 14.3);
    assert_eq!(result.jitter_ms, 14.3);
    assert_eq!(result.packet_loss_pct, 0.0);
    assert_eq!(result.server.city, "NYC");
    assert_eq!(result.server.sponsor, "ACME");
    assert_eq!(result.bytes_received, 1_000_000);
    assert_eq!(result.bytes_sent, 500_000);

    let history = orchestrator.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history.last(), Some(&result));

    let snapshot = orchestrator.snapshot();
    assert_eq!(snapshot.status, TestStatus::Completed);
    assert_eq!(snapshot.progress, 100);
    assert_eq!(snapshot.phase, TestPhase::Completed);
    assert!(!orchestrator.is_testing());
    assert_eq!(provider.sessions(), 1);
}

#[tokio::test]
async fn history_keeps_the_latest_ten_runs() {
    let provider = ScriptedProvider::new(Script::default());
    let orchestrator = orchestrator(provider.clone(), OrchestratorConfig::default());

    run_once(&orchestrator).await;
    let first = orchestrator.latest_result().unwrap();

    for _ in 0..HISTORY_CAPACITY {
        tokio::time::sleep(Duration::from_millis(2)).await;
        run_once(&orchestrator).await;
    }

    let history = orchestrator.history();
    assert_eq!(provider.sessions(), HISTORY_CAPACITY + 1);
    assert_eq!(history.len(), HISTORY_CAPACITY);
    assert!(history.iter().all(|r| r.timestamp != first.timestamp));
    assert_eq!(history.last(), orchestrator.latest_result().as_ref());
}

#[tokio::test]
async fn discovery_failure_is_sticky_and_keeps_history() {
    let orchestrator = orchestrator(
        ScriptedProvider::new(Script { discover: Step::Fail, ..Script::default() }),
        OrchestratorConfig::default(),
    );

    run_once(&orchestrator).await;

    let snapshot = orchestrator.snapshot();
    assert_eq!(snapshot.status, TestStatus::Error);
    assert_eq!(snapshot.progress, 0);
    assert_eq!(snapshot.error_kind, Some(ErrorKind::NoServerFound));
    assert!(snapshot.message.starts_with("Speed test failed: "));
    assert!(orchestrator.history().is_empty());
    assert!(orchestrator.latest_result().is_none());
    assert!(!orchestrator.is_testing());

    tokio::task::yield_now().await;
    assert_eq!(orchestrator.snapshot(), snapshot);
}

#[tokio::test]
async fn failure_after_success_leaves_previous_result() {
    let provider = ScriptedProvider::sequence(vec![
        Script::default(),
        Script { upload: Step::Fail, ..Script::default() },
    ]);
    let orchestrator = orchestrator(provider, OrchestratorConfig::default());

    run_once(&orchestrator).await;
    let previous = orchestrator.latest_result().unwrap();

    run_once(&orchestrator).await;
    let snapshot = orchestrator.snapshot();
    assert_eq!(snapshot.status, TestStatus::Error);
    assert_eq!(snapshot.error_kind, Some(ErrorKind::ProbeFailure));
    assert_eq!(orchestrator.latest_result(), Some(previous));
    assert_eq!(orchestrator.history().len(), 1);
}

#[tokio::test]
async fn new_start_clears_sticky_error() {
    let gate = Arc::new(Notify::new());
    let provider = ScriptedProvider::sequence(vec![
        Script { discover: Step::Fail, ..Script::default() },
        Script { discover: Step::Gate(gate.clone()), ..Script::default() },
    ]);
    let orchestrator = orchestrator(provider, OrchestratorConfig::default());

    run_once(&orchestrator).await;
    assert_eq!(orchestrator.snapshot().status, TestStatus::Error);

    assert!(orchestrator.start_measurement().started);
    let snapshot = orchestrator.snapshot();
    assert_eq!(snapshot.status, TestStatus::Testing);
    assert_eq!(snapshot.phase, TestPhase::Initializing);
    assert_eq!(snapshot.progress, 10);
    assert!(snapshot.error_kind.is_none());

    gate.notify_one();
    orchestrator.wait_until_idle().await;
    assert_eq!(orchestrator.snapshot().status, TestStatus::Completed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_starts_run_exactly_once() {
    let gate = Arc::new(Notify::new());
    let provider = ScriptedProvider::new(Script {
        download: Step::Gate(gate.clone()),
        ..Script::default()
    });
    let orchestrator = orchestrator(provider.clone(), OrchestratorConfig::default());

    let callers = 16;
    let barrier = Arc::new(Barrier::new(callers));
    let handles: Vec<_> = (0..callers)
        .map(|_| {
            let orchestrator = Arc::clone(&orchestrator);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                orchestrator.start_measurement()
            })
        })
        .collect();

    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.unwrap());
    }

    let started = outcomes.iter().filter(|o| o.started).count();
    assert_eq!(started, 1);
    for rejected in outcomes.iter().filter(|o| !o.started) {
        assert_eq!(
            rejected.message,
            "Test already in progress. Please wait for the current test to complete."
        );
    }
    assert!(orchestrator.is_testing());
    assert_eq!(orchestrator.snapshot().status, TestStatus::Testing);

    gate.notify_one();
    orchestrator.wait_until_idle().await;

    assert_eq!(provider.sessions(), 1);
    assert_eq!(orchestrator.history().len(), 1);
    assert!(!orchestrator.is_testing());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn completed_is_never_seen_before_its_result() {
    let gate = Arc::new(Notify::new());
    let orchestrator = orchestrator(
        ScriptedProvider::new(Script {
            upload: Step::Gate(gate.clone()),
            ..Script::default()
        }),
        OrchestratorConfig::default(),
    );

    assert!(orchestrator.start_measurement().started);

    let poller = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move {
            let mut polls = 0usize;
            loop {
                polls += 1;
                let snapshot = orchestrator.snapshot();
                if snapshot.status == TestStatus::Completed {
                    let latest = orchestrator.latest_result();
                    assert!(latest.is_some(), "completed without a result");
                    assert_eq!(orchestrator.history().last(), latest.as_ref());
                    return polls;
                }
                assert_ne!(snapshot.status, TestStatus::Error);
                tokio::task::yield_now().await;
            }
        })
    };

    tokio::task::yield_now().await;
    gate.notify_one();

    let polls = poller.await.unwrap();
    assert!(polls >= 1);
    orchestrator.wait_until_idle().await;
    assert_eq!(orchestrator.history().len(), 1);
}

#[tokio::test]
async fn rejected_start_does_not_touch_progress() {
    let gate = Arc::new(Notify::new());
    let orchestrator = orchestrator(
        ScriptedProvider::new(Script {
            discover: Step::Gate(gate.clone()),
            ..Script::default()
        }),
        OrchestratorConfig::default(),
    );

    assert!(orchestrator.start_measurement().started);
    tokio::task::yield_now().await;
    let before = orchestrator.snapshot();

    let outcome = orchestrator.start_measurement();
    assert!(!outcome.started);
    assert_eq!(orchestrator.snapshot(), before);

    gate.notify_one();
    orchestrator.wait_until_idle().await;
    assert_eq!(orchestrator.snapshot().status, TestStatus::Completed);
}

#[tokio::test(start_paused = true)]
async fn progress_never_decreases_within_a_run() {
    let step = Step::Delay(Duration::from_secs(1));
    let orchestrator = orchestrator(
        ScriptedProvider::new(Script {
            discover: step.clone(),
            download: step.clone(),
            upload: step,
            ..Script::default()
        }),
        OrchestratorConfig::default(),
    );

    let mut receiver = orchestrator.subscribe();
    let collector = tokio::spawn(async move {
        let mut seen = Vec::new();
        while receiver.changed().await.is_ok() {
            let state = receiver.borrow_and_update().clone();
            let terminal = state.is_terminal();
            seen.push(state);
            if terminal {
                break;
            }
        }
        seen
    });

    run_once(&orchestrator).await;
    let seen = collector.await.unwrap();

    let progress: Vec<u8> = seen.iter().map(|s| s.progress).collect();
    assert!(progress.windows(2).all(|w| w[0] <= w[1]), "{:?}", progress);
    assert!(matches!(progress.first(), Some(10) | Some(20)), "{:?}", progress);
    assert_eq!(progress.last(), Some(&100));
    assert!(seen.iter().any(|s| s.phase == TestPhase::TestingUpload));
}

#[tokio::test(start_paused = true)]
async fn hung_provider_call_times_out() {
    let orchestrator = orchestrator(
        ScriptedProvider::new(Script { download: Step::Hang, ..Script::default() }),
        OrchestratorConfig::default(),
    );

    run_once(&orchestrator).await;

    let snapshot = orchestrator.snapshot();
    assert_eq!(snapshot.status, TestStatus::Error);
    assert_eq!(snapshot.error_kind, Some(ErrorKind::Timeout));
    assert_eq!(snapshot.message, "Speed test failed: Test timeout during download");
    assert!(orchestrator.history().is_empty());
    assert!(!orchestrator.is_testing());
}

#[tokio::test(start_paused = true)]
async fn budget_is_shared_across_phases() {
    let orchestrator = orchestrator(
        ScriptedProvider::new(Script {
            discover: Step::Delay(Duration::from_secs(70)),
            download: Step::Delay(Duration::from_secs(40)),
            upload: Step::Delay(Duration::from_secs(40)),
            ..Script::default()
        }),
        OrchestratorConfig::default(),
    );

    let started = tokio::time::Instant::now();
    run_once(&orchestrator).await;

    let snapshot = orchestrator.snapshot();
    assert_eq!(snapshot.error_kind, Some(ErrorKind::Timeout));
    assert_eq!(snapshot.message, "Speed test failed: Test timeout during upload");
    assert!(started.elapsed() <= Duration::from_secs(121));
}

#[tokio::test(start_paused = true)]
async fn coarse_mode_fails_after_a_slow_call_returns() {
    let orchestrator = orchestrator(
        ScriptedProvider::new(Script {
            download: Step::Delay(Duration::from_secs(130)),
            ..Script::default()
        }),
        OrchestratorConfig { cancel_in_flight: false, ..OrchestratorConfig::default() },
    );

    let started = tokio::time::Instant::now();
    run_once(&orchestrator).await;

    let snapshot = orchestrator.snapshot();
    assert_eq!(snapshot.error_kind, Some(ErrorKind::Timeout));
    assert_eq!(snapshot.message, "Speed test failed: Test timeout during download");
    assert!(started.elapsed() >= Duration::from_secs(130));
    assert!(orchestrator.history().is_empty());
}

#[tokio::test]
async fn provider_panic_becomes_error_state() {
    let orchestrator = orchestrator(
        ScriptedProvider::new(Script { upload: Step::Panic, ..Script::default() }),
        OrchestratorConfig::default(),
    );

    run_once(&orchestrator).await;

    let snapshot = orchestrator.snapshot();
    assert_eq!(snapshot.status, TestStatus::Error);
    assert_eq!(snapshot.error_kind, Some(ErrorKind::ProbeFailure));
    assert!(!orchestrator.is_testing());

    // The orchestrator stays usable.
    assert!(orchestrator.start_measurement().started);
    orchestrator.wait_until_idle().await;
}
