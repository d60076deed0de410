//! Runner configuration.
//!
//! Every recognized option is enumerated here with an explicit default;
//! there is no dynamic option merging. `parallelism` is accepted for
//! forward compatibility but execution is sequential (see `Orchestrator`).

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default per-test timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default suite priority (lower runs first).
pub const DEFAULT_PRIORITY: i32 = 5;

/// Run-level defaults applied to every test unless overridden per test.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Timeout applied to a test body unless the test overrides it.
    pub default_timeout: Duration,

    /// Retry budget applied unless the test overrides it. A test makes
    /// `retries + 1` attempts.
    pub default_retries: u32,

    /// Capture a driver artifact when an attempt fails and the suite
    /// context carries a driver.
    pub capture_on_failure: bool,

    /// Reserved. Accepted for configuration compatibility; suites always
    /// execute sequentially.
    pub parallelism: u32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_TIMEOUT,
            default_retries: 0,
            capture_on_failure: false,
            parallelism: 1,
        }
    }
}

impl RunnerConfig {
    /// Creates a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default test timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Sets the default retry budget.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.default_retries = retries;
        self
    }

    /// Enables artifact capture on failed attempts.
    pub fn capture_on_failure(mut self, capture: bool) -> Self {
        self.capture_on_failure = capture;
        self
    }
}

/// Options for a single `run_all` invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunOptions {
    /// Run only suites whose tag set intersects this list (empty = all).
    pub tags: Vec<String>,

    /// Run only suites named in this list (empty = all).
    pub suites: Vec<String>,

    /// Shuffle the selected suites uniformly instead of ordering them by
    /// priority. Mutually exclusive with deterministic priority order.
    pub shuffle: bool,

    /// Stop executing further tests in a suite after the first failure.
    pub fail_fast: bool,
}

impl RunOptions {
    /// Creates run options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the run to suites carrying any of the given tags.
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Restricts the run to the named suites.
    pub fn with_suites(mut self, suites: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.suites = suites.into_iter().map(Into::into).collect();
        self
    }

    /// Enables uniform shuffle ordering.
    pub fn shuffled(mut self) -> Self {
        self.shuffle = true;
        self
    }

    /// Enables fail-fast within each suite.
    pub fn fail_fast(mut self) -> Self {
        self.fail_fast = true;
        self
    }
}
