//! Run, suite, test, and attempt records.
//!
//! These are the data structures a run produces. Aggregate statistics are
//! computed on demand from the record tree rather than stored continuously.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::RunOptions;

/// Overall status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Passed,
    Failed,
}

/// Status of a suite's execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuiteStatus {
    Passed,
    Failed,
    /// The setup hook failed; no tests executed.
    Error,
}

/// Status of a single test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
}

/// Status of one attempt within a test's retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptStatus {
    Passed,
    Failed,
}

/// One try of a test body within its retry budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    /// 1-based attempt number.
    pub number: u32,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub status: AttemptStatus,
    /// Error message for failed attempts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Reference to a captured diagnostic artifact, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
}

/// Result of a single test, with the full attempt history attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub status: TestStatus,
    /// Total duration across all attempts.
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Error from the last attempt when all attempts were exhausted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub attempts: Vec<Attempt>,
}

/// Result of one suite's execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub status: SuiteStatus,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Setup error message when `status` is `Error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub tests: Vec<TestResult>,
}

/// One execution of `run_all`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    /// Time-derived id, unique per orchestrator instance.
    pub id: String,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    pub status: RunStatus,
    /// Options the run was launched with.
    pub options: RunOptions,
    pub suites: Vec<SuiteResult>,
}

impl Run {
    /// Computes aggregate statistics by walking the record tree.
    pub fn stats(&self) -> RunStats {
        let mut stats = RunStats {
            suites_total: self.suites.len(),
            ..RunStats::default()
        };

        for suite in &self.suites {
            match suite.status {
                SuiteStatus::Passed => stats.suites_passed += 1,
                SuiteStatus::Failed | SuiteStatus::Error => stats.suites_failed += 1,
            }
            for test in &suite.tests {
                stats.tests_total += 1;
                match test.status {
                    TestStatus::Passed => stats.tests_passed += 1,
                    TestStatus::Failed => stats.tests_failed += 1,
                    TestStatus::Skipped => stats.tests_skipped += 1,
                }
            }
        }

        stats.duration = match self.ended_at {
            Some(ended) => (ended - self.started_at)
                .to_std()
                .unwrap_or(Duration::ZERO),
            None => Duration::ZERO,
        };
        stats
    }
}

/// Aggregate statistics derived from a [`Run`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    pub suites_total: usize,
    pub suites_passed: usize,
    pub suites_failed: usize,
    pub tests_total: usize,
    pub tests_passed: usize,
    pub tests_failed: usize,
    pub tests_skipped: usize,
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

/// Serde helper for Duration serialization as fractional seconds.
pub(crate) mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(secs))
    }
}
