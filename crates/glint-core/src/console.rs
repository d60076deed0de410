//! Terminal progress output.
//!
//! An ordinary event listener that prints colored progress as a run
//! executes. Purely a consumer of [`RunnerEvent`]; the runner has no
//! knowledge of it.

use colored::Colorize;

use crate::events::{EventListener, RunnerEvent};
use crate::results::{RunStatus, SuiteStatus};

/// Verbosity level for terminal output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Only the final verdict line.
    Quiet,
    /// Suite and test progress.
    #[default]
    Normal,
    /// Progress plus retry and hook noise.
    Verbose,
}

/// Prints run progress to the terminal.
#[derive(Debug, Default)]
pub struct TerminalListener {
    verbosity: Verbosity,
}

impl TerminalListener {
    /// Creates a listener with normal verbosity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a listener with the given verbosity.
    pub fn with_verbosity(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    /// Handles one lifecycle event.
    pub fn handle(&self, event: &RunnerEvent) {
        match event {
            RunnerEvent::RunStarted { total_suites, .. } => {
                if self.verbosity != Verbosity::Quiet {
                    println!(
                        "\n{}",
                        format!(
                            "Running {} suite{}...",
                            total_suites,
                            if *total_suites == 1 { "" } else { "s" }
                        )
                        .bold()
                    );
                }
            }
            RunnerEvent::RunCompleted { status, .. } => {
                let verdict = match status {
                    RunStatus::Passed => "PASSED".green().bold(),
                    RunStatus::Failed => "FAILED".red().bold(),
                    RunStatus::Running => "RUNNING".yellow().bold(),
                };
                println!("\n{verdict}");
            }
            RunnerEvent::SuiteStarted { suite } => {
                if self.verbosity != Verbosity::Quiet {
                    println!("{}", suite.bold().underline());
                }
            }
            RunnerEvent::SuiteSetupError { suite, message } => {
                if self.verbosity != Verbosity::Quiet {
                    println!("  {} {} {}", "!".red(), suite.red(), message.dimmed());
                }
            }
            RunnerEvent::SuiteCompleted { suite, status } => {
                if self.verbosity == Verbosity::Verbose {
                    let marker = match status {
                        SuiteStatus::Passed => "ok".green(),
                        SuiteStatus::Failed => "failed".red(),
                        SuiteStatus::Error => "error".red(),
                    };
                    println!("  {} {}", suite.dimmed(), marker);
                }
            }
            RunnerEvent::SuiteTeardownError { suite, message } => {
                if self.verbosity == Verbosity::Verbose {
                    println!(
                        "  {} teardown: {}",
                        suite.dimmed(),
                        message.yellow()
                    );
                }
            }
            RunnerEvent::TestPassed { test, attempt, .. } => {
                if self.verbosity != Verbosity::Quiet {
                    let retry_note = if *attempt > 1 {
                        format!(" (attempt {attempt})").dimmed().to_string()
                    } else {
                        String::new()
                    };
                    println!("  {} {}{}", "+".green(), test, retry_note);
                }
            }
            RunnerEvent::TestFailed {
                test,
                attempt,
                will_retry,
                message,
                ..
            } => {
                if *will_retry && self.verbosity != Verbosity::Verbose {
                    return;
                }
                if self.verbosity != Verbosity::Quiet {
                    let note = if *will_retry {
                        format!("attempt {attempt}, retrying").yellow()
                    } else {
                        message.clone().red()
                    };
                    println!("  {} {} {}", "x".red(), test, note.dimmed());
                }
            }
            RunnerEvent::HookError { test, message, .. } => {
                if self.verbosity == Verbosity::Verbose {
                    println!("  {} hook: {}", test.dimmed(), message.yellow());
                }
            }
        }
    }
}

/// Creates a console listener for use with `Orchestrator::on_event`.
pub fn create_console_listener(verbosity: Verbosity) -> EventListener {
    let listener = TerminalListener::with_verbosity(verbosity);
    Box::new(move |event| listener.handle(event))
}
