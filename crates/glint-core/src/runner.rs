//! Suite orchestration.
//!
//! The [`Orchestrator`] owns the suite registry, applies retry and timeout
//! policy per test, and aggregates results into a [`Run`]. Suites execute
//! sequentially in ascending priority order (or shuffled order when
//! requested); the `parallelism` knob in [`RunnerConfig`] is reserved.

use chrono::Utc;
use glint_proto::ImageBuffer;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{RunOptions, RunnerConfig};
use crate::context::{Context, SharedContext};
use crate::events::{EventListener, RunnerEvent};
use crate::results::{
    Attempt, AttemptStatus, Run, RunStatus, SuiteResult, SuiteStatus, TestResult, TestStatus,
};
use crate::suite::{RegistrationError, Suite, TestCase};

/// Orchestrates suite registration and execution.
///
/// All state is instance-owned: two orchestrators never share a registry,
/// listeners, or captured artifacts.
pub struct Orchestrator {
    config: RunnerConfig,
    /// Registration order is preserved; re-registration replaces in place.
    suites: Vec<Suite>,
    listeners: Vec<EventListener>,
    /// Artifacts captured on failed attempts, keyed by the reference
    /// recorded on the attempt.
    artifacts: HashMap<String, ImageBuffer>,
    run_seq: u64,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("suite_count", &self.suites.len())
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Creates an orchestrator with the given run-level defaults.
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            config,
            suites: Vec::new(),
            listeners: Vec::new(),
            artifacts: HashMap::new(),
            run_seq: 0,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Returns the number of registered suites.
    pub fn suite_count(&self) -> usize {
        self.suites.len()
    }

    /// Registers a listener for lifecycle events. Listeners are invoked
    /// synchronously in registration order.
    pub fn on_event(&mut self, listener: EventListener) -> &mut Self {
        self.listeners.push(listener);
        self
    }

    /// Registers a suite, validating it and replacing any prior suite of
    /// the same name (last registration wins).
    pub fn register_suite(&mut self, suite: Suite) -> Result<&mut Self, RegistrationError> {
        suite.validate()?;
        debug!(suite = %suite.name, tests = suite.tests.len(), "Registering suite");
        match self.suites.iter_mut().find(|s| s.name == suite.name) {
            Some(existing) => *existing = suite,
            None => self.suites.push(suite),
        }
        Ok(self)
    }

    /// Returns the artifact captured under `reference`, if any.
    pub fn artifact(&self, reference: &str) -> Option<&ImageBuffer> {
        self.artifacts.get(reference)
    }

    /// Drops all captured artifacts.
    pub fn clear_artifacts(&mut self) {
        self.artifacts.clear();
    }

    /// Executes all selected suites sequentially and returns the run record.
    pub async fn run_all(&mut self, options: &RunOptions) -> Run {
        let ordered = self.select_suites(options);
        self.run_seq += 1;
        let id = format!("run-{}-{}", Utc::now().timestamp_millis(), self.run_seq);

        info!(
            run_id = %id,
            suites = ordered.len(),
            shuffle = options.shuffle,
            "Starting run"
        );
        self.emit(&RunnerEvent::RunStarted {
            run_id: id.clone(),
            total_suites: ordered.len(),
        });

        let mut run = Run {
            id: id.clone(),
            started_at: Utc::now(),
            ended_at: None,
            status: RunStatus::Running,
            options: options.clone(),
            suites: Vec::new(),
        };

        for suite in &ordered {
            let result = self.execute_suite(suite, options).await;
            run.suites.push(result);
        }

        let failed = run
            .suites
            .iter()
            .any(|s| matches!(s.status, SuiteStatus::Failed | SuiteStatus::Error));
        run.status = if failed {
            RunStatus::Failed
        } else {
            RunStatus::Passed
        };
        run.ended_at = Some(Utc::now());

        info!(run_id = %id, status = ?run.status, "Run completed");
        self.emit(&RunnerEvent::RunCompleted {
            run_id: id,
            status: run.status,
        });

        run
    }

    /// Filters enabled suites by tags/names, sorts by ascending priority
    /// (stable, ties keep filter order), then replaces the order with a
    /// uniform shuffle when requested.
    fn select_suites(&self, options: &RunOptions) -> Vec<Suite> {
        let mut selected: Vec<Suite> = self
            .suites
            .iter()
            .filter(|s| s.enabled)
            .filter(|s| {
                options.tags.is_empty() || options.tags.iter().any(|t| s.tags.contains(t))
            })
            .filter(|s| options.suites.is_empty() || options.suites.contains(&s.name))
            .cloned()
            .collect();

        selected.sort_by_key(|s| s.priority);
        if options.shuffle {
            selected.shuffle(&mut rand::thread_rng());
        }
        selected
    }

    async fn execute_suite(&mut self, suite: &Suite, options: &RunOptions) -> SuiteResult {
        debug!(suite = %suite.name, "Suite started");
        self.emit(&RunnerEvent::SuiteStarted {
            suite: suite.name.clone(),
        });

        let mut result = SuiteResult {
            name: suite.name.clone(),
            started_at: Utc::now(),
            ended_at: Utc::now(),
            status: SuiteStatus::Passed,
            passed: 0,
            failed: 0,
            skipped: 0,
            error: None,
            tests: Vec::new(),
        };

        // Suite setup. A failure here is a hard short-circuit: no tests run.
        let mut context: SharedContext = Context::new().into_shared();
        if let Some(before_all) = &suite.before_all {
            match before_all(self.config.clone()).await {
                Ok(Some(replacement)) => context = replacement.into_shared(),
                Ok(None) => {}
                Err(e) => {
                    let message = e.to_string();
                    warn!(suite = %suite.name, error = %message, "Suite setup failed");
                    result.status = SuiteStatus::Error;
                    result.error = Some(message.clone());
                    result.ended_at = Utc::now();
                    self.emit(&RunnerEvent::SuiteSetupError {
                        suite: suite.name.clone(),
                        message,
                    });
                    self.emit(&RunnerEvent::SuiteCompleted {
                        suite: suite.name.clone(),
                        status: result.status,
                    });
                    return result;
                }
            }
        }

        for test in &suite.tests {
            let test_result = self.execute_test(suite, test, &context).await;
            match test_result.status {
                TestStatus::Passed => result.passed += 1,
                TestStatus::Failed => result.failed += 1,
                TestStatus::Skipped => result.skipped += 1,
            }
            let failed_now = test_result.status == TestStatus::Failed;
            result.tests.push(test_result);

            // Remaining tests are never attempted and do not appear as
            // skipped.
            if failed_now && options.fail_fast {
                debug!(suite = %suite.name, "Fail-fast: aborting remaining tests");
                break;
            }
        }

        if let Some(after_all) = &suite.after_all {
            if let Err(e) = after_all(context.clone()).await {
                let message = e.to_string();
                warn!(suite = %suite.name, error = %message, "Suite teardown failed");
                self.emit(&RunnerEvent::SuiteTeardownError {
                    suite: suite.name.clone(),
                    message,
                });
            }
        }

        result.status = if result.failed > 0 {
            SuiteStatus::Failed
        } else {
            SuiteStatus::Passed
        };
        result.ended_at = Utc::now();
        self.emit(&RunnerEvent::SuiteCompleted {
            suite: suite.name.clone(),
            status: result.status,
        });
        result
    }

    async fn execute_test(
        &mut self,
        suite: &Suite,
        test: &TestCase,
        context: &SharedContext,
    ) -> TestResult {
        if test.skip {
            debug!(suite = %suite.name, test = %test.name, "Test skipped");
            return TestResult {
                name: test.name.clone(),
                status: TestStatus::Skipped,
                duration: std::time::Duration::ZERO,
                error: None,
                attempts: Vec::new(),
            };
        }

        let max_attempts = test.retries.unwrap_or(self.config.default_retries) + 1;
        let timeout = test.timeout.unwrap_or(self.config.default_timeout);
        let started = Instant::now();
        let mut attempts: Vec<Attempt> = Vec::new();

        for number in 1..=max_attempts {
            let attempt_started = Utc::now();
            let outcome = self.run_attempt(suite, test, context, timeout).await;
            let attempt_ended = Utc::now();

            match outcome {
                Ok(()) => {
                    attempts.push(Attempt {
                        number,
                        started_at: attempt_started,
                        ended_at: attempt_ended,
                        status: AttemptStatus::Passed,
                        error: None,
                        artifact: None,
                    });
                    self.emit(&RunnerEvent::TestPassed {
                        suite: suite.name.clone(),
                        test: test.name.clone(),
                        attempt: number,
                    });
                    self.run_after_each(suite, test, context).await;
                    return TestResult {
                        name: test.name.clone(),
                        status: TestStatus::Passed,
                        duration: started.elapsed(),
                        error: None,
                        attempts,
                    };
                }
                Err(e) => {
                    let message = e.to_string();
                    let will_retry = number < max_attempts;
                    debug!(
                        suite = %suite.name,
                        test = %test.name,
                        attempt = number,
                        will_retry,
                        error = %message,
                        "Attempt failed"
                    );

                    let mut attempt = Attempt {
                        number,
                        started_at: attempt_started,
                        ended_at: attempt_ended,
                        status: AttemptStatus::Failed,
                        error: Some(message.clone()),
                        artifact: None,
                    };
                    if self.config.capture_on_failure {
                        attempt.artifact = self.capture_artifact(suite, test, number, context).await;
                    }
                    attempts.push(attempt);

                    self.emit(&RunnerEvent::TestFailed {
                        suite: suite.name.clone(),
                        test: test.name.clone(),
                        attempt: number,
                        will_retry,
                        message,
                    });
                    self.run_after_each(suite, test, context).await;
                }
            }
        }

        // All attempts exhausted: the last attempt's error is the
        // test-level error.
        let error = attempts.last().and_then(|a| a.error.clone());
        TestResult {
            name: test.name.clone(),
            status: TestStatus::Failed,
            duration: started.elapsed(),
            error,
            attempts,
        }
    }

    /// One attempt: `before_each`, then the body raced against the timeout.
    /// When the timer fires first the body future is dropped, so in-flight
    /// work is actually abandoned.
    async fn run_attempt(
        &self,
        suite: &Suite,
        test: &TestCase,
        context: &SharedContext,
        timeout: std::time::Duration,
    ) -> anyhow::Result<()> {
        if let Some(before_each) = &suite.before_each {
            before_each(context.clone()).await?;
        }

        match tokio::time::timeout(timeout, (test.body)(context.clone(), self.config.clone()))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(anyhow::anyhow!(
                "test timed out after {}ms",
                timeout.as_millis()
            )),
        }
    }

    /// Runs `after_each`, swallowing errors; failures only surface as events.
    async fn run_after_each(&self, suite: &Suite, test: &TestCase, context: &SharedContext) {
        if let Some(after_each) = &suite.after_each {
            if let Err(e) = after_each(context.clone()).await {
                self.emit(&RunnerEvent::HookError {
                    suite: suite.name.clone(),
                    test: test.name.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    /// Captures a driver artifact for a failed attempt. Capture errors are
    /// ignored apart from a hook-error event.
    async fn capture_artifact(
        &mut self,
        suite: &Suite,
        test: &TestCase,
        attempt: u32,
        context: &SharedContext,
    ) -> Option<String> {
        let driver = context.lock().await.driver()?;
        match driver.capture().await {
            Ok(image) => {
                let reference = format!("{}/{}/attempt-{}", suite.name, test.name, attempt);
                self.artifacts.insert(reference.clone(), image);
                Some(reference)
            }
            Err(e) => {
                self.emit(&RunnerEvent::HookError {
                    suite: suite.name.clone(),
                    test: test.name.clone(),
                    message: format!("artifact capture failed: {e}"),
                });
                None
            }
        }
    }

    fn emit(&self, event: &RunnerEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }
}
