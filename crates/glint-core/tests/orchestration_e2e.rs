//! End-to-end orchestration tests: a full run across several suites with
//! hooks, retries, artifact capture, and report generation.

use async_trait::async_trait;
use glint_core::{
    Context, Orchestrator, ReportFormat, Reporter, RunOptions, RunnerConfig, RunnerEvent, Suite,
    TestCase, TestStatus,
};
use glint_proto::{Driver, ImageBuffer};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("glint_core=debug")
        .with_test_writer()
        .try_init();
}

/// Driver stub that returns a fixed capture.
struct StubDriver {
    captures: AtomicU32,
}

#[async_trait]
impl Driver for StubDriver {
    async fn perform(&self, action: &str, _payload: Value) -> anyhow::Result<Value> {
        Ok(json!({ "action": action }))
    }

    async fn capture(&self) -> anyhow::Result<ImageBuffer> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        Ok(ImageBuffer::solid(2, 2, [1, 2, 3, 255]))
    }
}

fn passing(name: &str) -> TestCase {
    TestCase::new(name, |_ctx, _config| async { Ok(()) })
}

#[tokio::test]
async fn full_run_produces_reports_in_all_formats() {
    init_tracing();

    let mut orchestrator = Orchestrator::new(RunnerConfig::default());
    orchestrator
        .register_suite(
            Suite::new("menu")
                .with_priority(2)
                .with_tag("smoke")
                .with_test(passing("lists items"))
                .with_test(TestCase::new("renders badge", |_ctx, _config| async {
                    Err(anyhow::anyhow!("badge missing"))
                }))
                .with_test(passing("filters by category").skipped()),
        )
        .unwrap()
        .register_suite(
            Suite::new("login")
                .with_priority(1)
                .with_tag("smoke")
                .with_test(passing("accepts valid credentials")),
        )
        .unwrap();

    let run = orchestrator.run_all(&RunOptions::default()).await;

    // Priority order: login (1) before menu (2).
    assert_eq!(run.suites[0].name, "login");
    assert_eq!(run.suites[1].name, "menu");

    let stats = run.stats();
    assert_eq!(stats.tests_total, 4);
    assert_eq!(stats.tests_passed, 2);
    assert_eq!(stats.tests_failed, 1);
    assert_eq!(stats.tests_skipped, 1);

    let reporter = Reporter::new();
    let json_report = reporter.generate(&run, ReportFormat::Json).unwrap();
    assert!(json_report.contains("\"tests_failed\": 1"));

    let junit = reporter.generate(&run, ReportFormat::Junit).unwrap();
    assert!(junit.contains("<failure message=\"badge missing\"/>"));

    let summary = reporter.generate(&run, ReportFormat::Summary).unwrap();
    assert!(summary.contains("FAILED"));

    assert!(reporter.generate_named(&run, "html").is_err());
}

#[tokio::test]
async fn failed_attempts_capture_driver_artifacts() {
    init_tracing();

    let driver = Arc::new(StubDriver {
        captures: AtomicU32::new(0),
    });
    let driver_for_setup = driver.clone();

    let config = RunnerConfig::new().capture_on_failure(true);
    let mut orchestrator = Orchestrator::new(config);
    orchestrator
        .register_suite(
            Suite::new("visual")
                .with_before_all(move |_config| {
                    let driver = driver_for_setup.clone();
                    async move { Ok(Some(Context::with_driver(driver))) }
                })
                .with_test(
                    TestCase::new("compare dashboard", |_ctx, _config| async {
                        Err(anyhow::anyhow!("diff over threshold"))
                    })
                    .with_retries(1),
                ),
        )
        .unwrap();

    let run = orchestrator.run_all(&RunOptions::default()).await;
    let test = &run.suites[0].tests[0];
    assert_eq!(test.status, TestStatus::Failed);
    assert_eq!(test.attempts.len(), 2);

    // One capture per failed attempt, each stored under its own reference.
    assert_eq!(driver.captures.load(Ordering::SeqCst), 2);
    for attempt in &test.attempts {
        let reference = attempt.artifact.as_deref().unwrap();
        let image = orchestrator.artifact(reference).unwrap();
        assert_eq!((image.width, image.height), (2, 2));
    }
    assert_eq!(
        test.attempts[0].artifact.as_deref(),
        Some("visual/compare dashboard/attempt-1")
    );
}

#[tokio::test]
async fn events_trace_the_whole_lifecycle() {
    init_tracing();

    let events: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();

    let mut orchestrator = Orchestrator::new(RunnerConfig::default());
    orchestrator.on_event(Box::new(move |event| {
        let label = match event {
            RunnerEvent::RunStarted { .. } => "run_started".to_string(),
            RunnerEvent::RunCompleted { .. } => "run_completed".to_string(),
            RunnerEvent::SuiteStarted { suite } => format!("suite_started:{suite}"),
            RunnerEvent::SuiteSetupError { suite, .. } => format!("setup_error:{suite}"),
            RunnerEvent::SuiteCompleted { suite, .. } => format!("suite_completed:{suite}"),
            RunnerEvent::SuiteTeardownError { suite, .. } => format!("teardown_error:{suite}"),
            RunnerEvent::TestPassed { test, .. } => format!("passed:{test}"),
            RunnerEvent::TestFailed {
                test, will_retry, ..
            } => format!("failed:{test}:retry={will_retry}"),
            RunnerEvent::HookError { test, .. } => format!("hook_error:{test}"),
        };
        sink.lock().unwrap().push(label);
    }));

    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    orchestrator
        .register_suite(
            Suite::new("flaky").with_test(
                TestCase::new("eventually passes", move |_ctx, _config| {
                    let counter = counter.clone();
                    async move {
                        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                            Err(anyhow::anyhow!("first try"))
                        } else {
                            Ok(())
                        }
                    }
                })
                .with_retries(1),
            ),
        )
        .unwrap();
    orchestrator
        .register_suite(
            Suite::new("broken").with_before_all(|_config| async {
                Err(anyhow::anyhow!("no session"))
            })
            .with_test(passing("unreachable")),
        )
        .unwrap();

    orchestrator.run_all(&RunOptions::default()).await;

    let events = events.lock().unwrap();
    assert_eq!(
        events.as_slice(),
        &[
            "run_started",
            "suite_started:flaky",
            "failed:eventually passes:retry=true",
            "passed:eventually passes",
            "suite_completed:flaky",
            "suite_started:broken",
            "setup_error:broken",
            "suite_completed:broken",
            "run_completed",
        ]
    );
}

#[tokio::test]
async fn context_flows_through_hook_chain() {
    init_tracing();

    let trail: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    let for_before_each = trail.clone();
    let for_test = trail.clone();
    let for_after_each = trail.clone();
    let for_after_all = trail.clone();

    let mut orchestrator = Orchestrator::new(RunnerConfig::default());
    orchestrator
        .register_suite(
            Suite::new("chain")
                .with_before_all(|_config| async {
                    let mut ctx = Context::new();
                    ctx.set("step", json!(0));
                    Ok(Some(ctx))
                })
                .with_before_each(move |ctx| {
                    let trail = for_before_each.clone();
                    async move {
                        ctx.lock().await.set("step", json!(1));
                        trail.lock().unwrap().push("before_each".to_string());
                        Ok(())
                    }
                })
                .with_after_each(move |_ctx| {
                    let trail = for_after_each.clone();
                    async move {
                        trail.lock().unwrap().push("after_each".to_string());
                        Ok(())
                    }
                })
                .with_after_all(move |ctx| {
                    let trail = for_after_all.clone();
                    async move {
                        let step = ctx.lock().await.get("step").cloned();
                        trail
                            .lock()
                            .unwrap()
                            .push(format!("after_all:step={}", step.unwrap()));
                        Ok(())
                    }
                })
                .with_test(TestCase::new("records step", move |ctx, _config| {
                    let trail = for_test.clone();
                    async move {
                        let step = ctx.lock().await.get("step").cloned();
                        trail.lock().unwrap().push(format!("test:step={}", step.unwrap()));
                        Ok(())
                    }
                })),
        )
        .unwrap();

    orchestrator.run_all(&RunOptions::default()).await;

    let trail = trail.lock().unwrap();
    assert_eq!(
        trail.as_slice(),
        &["before_each", "test:step=1", "after_each", "after_all:step=1"]
    );
}

#[tokio::test]
async fn timeout_drops_the_in_flight_body() {
    init_tracing();

    let finished = Arc::new(AtomicU32::new(0));
    let counter = finished.clone();
    let hang = TestCase::new("hangs", move |_ctx, _config| {
        let counter = counter.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    })
    .with_timeout(Duration::from_millis(20));

    let mut orchestrator = Orchestrator::new(RunnerConfig::default());
    orchestrator
        .register_suite(Suite::new("cancellation").with_test(hang))
        .unwrap();

    let run = orchestrator.run_all(&RunOptions::default()).await;
    assert_eq!(run.suites[0].tests[0].status, TestStatus::Failed);

    // The body future was dropped at the deadline, so the tail never runs.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(finished.load(Ordering::SeqCst), 0);
}
