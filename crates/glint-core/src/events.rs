//! Run lifecycle events.
//!
//! The orchestrator fans discrete lifecycle events out to registered
//! listeners. Listeners are plain closures invoked synchronously in
//! registration order; the runner never waits on them beyond the call
//! itself, and a listener cannot fail a run.

use crate::results::{RunStatus, SuiteStatus};

/// Discrete lifecycle notifications emitted during a run.
#[derive(Debug, Clone)]
pub enum RunnerEvent {
    /// A run has started.
    RunStarted {
        run_id: String,
        total_suites: usize,
    },

    /// A run has finished, pass or fail.
    RunCompleted { run_id: String, status: RunStatus },

    /// A suite is about to execute.
    SuiteStarted { suite: String },

    /// The suite's `before_all` hook failed; none of its tests ran.
    SuiteSetupError { suite: String, message: String },

    /// A suite has finished.
    SuiteCompleted {
        suite: String,
        status: SuiteStatus,
    },

    /// The suite's `after_all` hook failed; the suite result is unchanged.
    SuiteTeardownError { suite: String, message: String },

    /// A test attempt passed.
    TestPassed {
        suite: String,
        test: String,
        attempt: u32,
    },

    /// A test attempt failed. `will_retry` tells whether another attempt
    /// follows.
    TestFailed {
        suite: String,
        test: String,
        attempt: u32,
        will_retry: bool,
        message: String,
    },

    /// An `after_each` hook or artifact capture failed; swallowed.
    HookError {
        suite: String,
        test: String,
        message: String,
    },
}

/// Listener closure invoked for every [`RunnerEvent`].
pub type EventListener = Box<dyn Fn(&RunnerEvent) + Send + Sync>;
