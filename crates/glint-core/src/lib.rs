//! # glint-core
//!
//! Test orchestration for the Glint QA engine.
//!
//! This crate provides:
//! - Suite and test descriptors with lifecycle hooks
//! - The orchestrator: selection, priority ordering, retries, timeouts
//! - Lifecycle event fan-out to registered listeners
//! - Run records with on-demand statistics and report generation
//!
//! Concrete suites live outside this crate; they register descriptors and
//! async test bodies, and may call into `glint-visual` from a test body as
//! ordinary test logic.

mod config;
mod console;
mod context;
mod events;
mod report;
mod results;
mod runner;
mod suite;

pub use config::{RunOptions, RunnerConfig, DEFAULT_PRIORITY, DEFAULT_TIMEOUT};
pub use console::{create_console_listener, TerminalListener, Verbosity};
pub use context::{Context, SharedContext};
pub use events::{EventListener, RunnerEvent};
pub use report::{ReportError, ReportFormat, ReportWriter, Reporter};
pub use results::{
    Attempt, AttemptStatus, Run, RunStats, RunStatus, SuiteResult, SuiteStatus, TestResult,
    TestStatus,
};
pub use runner::Orchestrator;
pub use suite::{HookFn, RegistrationError, SetupFn, Suite, TestBody, TestCase};
