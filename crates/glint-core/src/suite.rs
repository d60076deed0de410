//! Suite and test descriptors.
//!
//! A [`Suite`] is a named, ordered collection of [`TestCase`]s plus
//! optional lifecycle hooks. Descriptors are plain data with boxed async
//! closures for the executable parts; the runner owns all policy.

use futures::future::BoxFuture;
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{RunnerConfig, DEFAULT_PRIORITY};
use crate::context::{Context, SharedContext};

/// Errors from suite registration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    /// The suite has no name.
    #[error("invalid suite: name must not be empty")]
    EmptyName,

    /// The suite has no tests.
    #[error("invalid suite '{0}': tests must not be empty")]
    NoTests(String),
}

/// Async body of a test case.
pub type TestBody =
    Arc<dyn Fn(SharedContext, RunnerConfig) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Per-test lifecycle hook (`before_each` / `after_each` / `after_all`).
pub type HookFn =
    Arc<dyn Fn(SharedContext) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Suite setup hook. May return a replacement [`Context`] that is then
/// shared by reference across the whole suite.
pub type SetupFn =
    Arc<dyn Fn(RunnerConfig) -> BoxFuture<'static, anyhow::Result<Option<Context>>> + Send + Sync>;

/// A single test descriptor.
#[derive(Clone)]
pub struct TestCase {
    /// Test name, unique within its suite by convention.
    pub name: String,
    /// Async body invoked with the shared context and run configuration.
    pub body: TestBody,
    /// Overrides the run-level default timeout.
    pub timeout: Option<Duration>,
    /// Overrides the run-level default retry budget.
    pub retries: Option<u32>,
    /// Skip this test without attempting it.
    pub skip: bool,
}

impl TestCase {
    /// Creates a test from an async closure.
    pub fn new<F, Fut>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(SharedContext, RunnerConfig) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            body: Arc::new(move |ctx, config| Box::pin(body(ctx, config))),
            timeout: None,
            retries: None,
            skip: false,
        }
    }

    /// Sets a per-test timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets a per-test retry budget.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    /// Marks the test skipped.
    pub fn skipped(mut self) -> Self {
        self.skip = true;
        self
    }
}

impl std::fmt::Debug for TestCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .field("retries", &self.retries)
            .field("skip", &self.skip)
            .finish()
    }
}

/// A registered suite descriptor.
#[derive(Clone)]
pub struct Suite {
    /// Unique registry key. Re-registering under the same name replaces
    /// the prior suite.
    pub name: String,
    /// Ordered tests; execution follows this order.
    pub tests: Vec<TestCase>,
    /// Runs once before any test. A failure here aborts the whole suite.
    pub before_all: Option<SetupFn>,
    /// Runs once after all tests; errors are reported but never fail the suite.
    pub after_all: Option<HookFn>,
    /// Runs before every attempt.
    pub before_each: Option<HookFn>,
    /// Runs after every attempt; errors are reported but never fail the test.
    pub after_each: Option<HookFn>,
    /// Disabled suites are never selected.
    pub enabled: bool,
    /// Ordering key, lower runs first.
    pub priority: i32,
    /// Selection tags.
    pub tags: BTreeSet<String>,
}

impl Suite {
    /// Creates a suite with defaults (`enabled`, priority 5, no tags).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tests: Vec::new(),
            before_all: None,
            after_all: None,
            before_each: None,
            after_each: None,
            enabled: true,
            priority: DEFAULT_PRIORITY,
            tags: BTreeSet::new(),
        }
    }

    /// Appends a test.
    pub fn with_test(mut self, test: TestCase) -> Self {
        self.tests.push(test);
        self
    }

    /// Sets the suite setup hook.
    pub fn with_before_all<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(RunnerConfig) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Option<Context>>> + Send + 'static,
    {
        self.before_all = Some(Arc::new(move |config| Box::pin(hook(config))));
        self
    }

    /// Sets the suite teardown hook.
    pub fn with_after_all<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(SharedContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.after_all = Some(Arc::new(move |ctx| Box::pin(hook(ctx))));
        self
    }

    /// Sets the per-attempt setup hook.
    pub fn with_before_each<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(SharedContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.before_each = Some(Arc::new(move |ctx| Box::pin(hook(ctx))));
        self
    }

    /// Sets the per-attempt teardown hook.
    pub fn with_after_each<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(SharedContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.after_each = Some(Arc::new(move |ctx| Box::pin(hook(ctx))));
        self
    }

    /// Enables or disables the suite.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the ordering priority (lower runs first).
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Adds a selection tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Validates the descriptor for registration.
    pub fn validate(&self) -> Result<(), RegistrationError> {
        if self.name.trim().is_empty() {
            return Err(RegistrationError::EmptyName);
        }
        if self.tests.is_empty() {
            return Err(RegistrationError::NoTests(self.name.clone()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Suite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Suite")
            .field("name", &self.name)
            .field("tests", &self.tests.len())
            .field("enabled", &self.enabled)
            .field("priority", &self.priority)
            .field("tags", &self.tags)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_test(name: &str) -> TestCase {
        TestCase::new(name, |_ctx, _config| async { Ok(()) })
    }

    #[test]
    fn test_suite_defaults() {
        let suite = Suite::new("login").with_test(noop_test("loads"));
        assert!(suite.enabled);
        assert_eq!(suite.priority, DEFAULT_PRIORITY);
        assert!(suite.tags.is_empty());
        assert!(suite.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_name() {
        let suite = Suite::new("  ").with_test(noop_test("t"));
        assert_eq!(suite.validate(), Err(RegistrationError::EmptyName));
    }

    #[test]
    fn test_validate_no_tests() {
        let suite = Suite::new("empty");
        assert_eq!(
            suite.validate(),
            Err(RegistrationError::NoTests("empty".to_string()))
        );
    }

    #[test]
    fn test_case_overrides() {
        let test = noop_test("slow")
            .with_timeout(Duration::from_secs(5))
            .with_retries(2)
            .skipped();
        assert_eq!(test.timeout, Some(Duration::from_secs(5)));
        assert_eq!(test.retries, Some(2));
        assert!(test.skip);
    }
}
