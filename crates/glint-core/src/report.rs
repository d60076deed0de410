//! Run report generation.
//!
//! Three structural representations are supported: a machine-readable JSON
//! record (the run plus computed stats), a JUnit-style XML document
//! (suite/test hierarchy with failure/skip markers and escaped text), and a
//! human-readable plain-text summary. Requesting any other format name is
//! an error.

use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::results::{Run, RunStats, RunStatus, SuiteStatus, TestStatus};

/// Errors from report generation and persistence.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The requested format name is not supported.
    #[error("unknown report format '{0}' (expected json, junit, or summary)")]
    UnknownFormat(String),

    /// Failed to serialize the JSON report.
    #[error("failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failed to write a report file.
    #[error("failed to write report: {0}")]
    Write(#[from] std::io::Error),
}

/// Supported report formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// Machine-readable JSON record.
    #[default]
    Json,
    /// JUnit-style XML test report.
    Junit,
    /// Human-readable plain-text summary.
    Summary,
}

impl ReportFormat {
    /// Parses a format name, case-insensitively.
    pub fn parse(name: &str) -> Result<Self, ReportError> {
        match name.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "junit" | "xml" => Ok(Self::Junit),
            "summary" | "text" => Ok(Self::Summary),
            other => Err(ReportError::UnknownFormat(other.to_string())),
        }
    }

    /// File extension used by [`ReportWriter`].
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Junit => "xml",
            Self::Summary => "txt",
        }
    }
}

/// Machine-readable report payload.
#[derive(Debug, Clone, Serialize)]
struct MachineReport<'a> {
    run: &'a Run,
    stats: RunStats,
}

/// Generates report documents from a [`Run`].
#[derive(Debug, Default)]
pub struct Reporter;

impl Reporter {
    /// Creates a reporter.
    pub fn new() -> Self {
        Self
    }

    /// Generates the report in the given format.
    pub fn generate(&self, run: &Run, format: ReportFormat) -> Result<String, ReportError> {
        match format {
            ReportFormat::Json => self.generate_json(run),
            ReportFormat::Junit => Ok(self.generate_junit(run)),
            ReportFormat::Summary => Ok(self.generate_summary(run)),
        }
    }

    /// Generates the report for a format requested by name.
    pub fn generate_named(&self, run: &Run, format: &str) -> Result<String, ReportError> {
        self.generate(run, ReportFormat::parse(format)?)
    }

    fn generate_json(&self, run: &Run) -> Result<String, ReportError> {
        let report = MachineReport {
            run,
            stats: run.stats(),
        };
        Ok(serde_json::to_string_pretty(&report)?)
    }

    fn generate_junit(&self, run: &Run) -> String {
        let stats = run.stats();
        let mut doc = String::new();
        doc.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        doc.push_str(&format!(
            "<testsuites name=\"{}\" tests=\"{}\" failures=\"{}\" skipped=\"{}\" time=\"{:.3}\">\n",
            escape_xml(&run.id),
            stats.tests_total,
            stats.tests_failed,
            stats.tests_skipped,
            stats.duration.as_secs_f64()
        ));

        for suite in &run.suites {
            let errors = usize::from(suite.status == SuiteStatus::Error);
            doc.push_str(&format!(
                "  <testsuite name=\"{}\" tests=\"{}\" failures=\"{}\" skipped=\"{}\" errors=\"{}\">\n",
                escape_xml(&suite.name),
                suite.tests.len(),
                suite.failed,
                suite.skipped,
                errors
            ));

            if let Some(error) = &suite.error {
                doc.push_str(&format!(
                    "    <error message=\"{}\"/>\n",
                    escape_xml(error)
                ));
            }

            for test in &suite.tests {
                doc.push_str(&format!(
                    "    <testcase name=\"{}\" time=\"{:.3}\"",
                    escape_xml(&test.name),
                    test.duration.as_secs_f64()
                ));
                match test.status {
                    TestStatus::Passed => doc.push_str("/>\n"),
                    TestStatus::Skipped => doc.push_str(">\n      <skipped/>\n    </testcase>\n"),
                    TestStatus::Failed => {
                        let message = test.error.as_deref().unwrap_or("test failed");
                        doc.push_str(&format!(
                            ">\n      <failure message=\"{}\"/>\n    </testcase>\n",
                            escape_xml(message)
                        ));
                    }
                }
            }
            doc.push_str("  </testsuite>\n");
        }
        doc.push_str("</testsuites>\n");
        doc
    }

    fn generate_summary(&self, run: &Run) -> String {
        let stats = run.stats();
        let verdict = match run.status {
            RunStatus::Passed => "PASSED",
            RunStatus::Failed => "FAILED",
            RunStatus::Running => "RUNNING",
        };

        let mut out = String::new();
        out.push_str(&format!("Run {} - {}\n", run.id, verdict));
        out.push_str(&format!(
            "Suites: {} passed, {} failed ({} total)\n",
            stats.suites_passed, stats.suites_failed, stats.suites_total
        ));
        out.push_str(&format!(
            "Tests:  {} passed, {} failed, {} skipped ({} total)\n",
            stats.tests_passed, stats.tests_failed, stats.tests_skipped, stats.tests_total
        ));
        out.push_str(&format!(
            "Duration: {:.1}s\n",
            stats.duration.as_secs_f64()
        ));

        let mut failures = Vec::new();
        for suite in &run.suites {
            if let Some(error) = &suite.error {
                failures.push(format!("  {} - setup error: {}", suite.name, error));
            }
            for test in &suite.tests {
                if test.status == TestStatus::Failed {
                    let message = test.error.as_deref().unwrap_or("test failed");
                    failures.push(format!(
                        "  {} / {} ({} attempts): {}",
                        suite.name,
                        test.name,
                        test.attempts.len(),
                        message
                    ));
                }
            }
        }
        if !failures.is_empty() {
            out.push_str("\nFailures:\n");
            for line in failures {
                out.push_str(&line);
                out.push('\n');
            }
        }
        out
    }
}

/// Persists generated reports to a directory.
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    /// Creates a writer targeting `output_dir`.
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    /// Returns the output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Writes the report in the given format, returning the file path.
    pub fn write(&self, run: &Run, format: ReportFormat) -> Result<PathBuf, ReportError> {
        std::fs::create_dir_all(&self.output_dir)?;
        let content = Reporter::new().generate(run, format)?;
        let path = self
            .output_dir
            .join(format!("report.{}", format.extension()));
        std::fs::write(&path, content)?;
        Ok(path)
    }
}

/// Escapes characters that would break XML attribute or text content.
fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunOptions;
    use crate::results::{SuiteResult, TestResult};
    use chrono::Utc;
    use std::time::Duration;

    fn sample_run() -> Run {
        let now = Utc::now();
        Run {
            id: "run-100-1".to_string(),
            started_at: now,
            ended_at: Some(now + chrono::Duration::seconds(2)),
            status: RunStatus::Failed,
            options: RunOptions::default(),
            suites: vec![SuiteResult {
                name: "login".to_string(),
                started_at: now,
                ended_at: now,
                status: SuiteStatus::Failed,
                passed: 1,
                failed: 1,
                skipped: 1,
                error: None,
                tests: vec![
                    TestResult {
                        name: "loads".to_string(),
                        status: TestStatus::Passed,
                        duration: Duration::from_millis(120),
                        error: None,
                        attempts: vec![],
                    },
                    TestResult {
                        name: "rejects <bad> creds".to_string(),
                        status: TestStatus::Failed,
                        duration: Duration::from_millis(300),
                        error: Some("expected \"error\" & got <none>".to_string()),
                        attempts: vec![],
                    },
                    TestResult {
                        name: "mfa".to_string(),
                        status: TestStatus::Skipped,
                        duration: Duration::ZERO,
                        error: None,
                        attempts: vec![],
                    },
                ],
            }],
        }
    }

    #[test]
    fn test_parse_formats() {
        assert_eq!(ReportFormat::parse("json").unwrap(), ReportFormat::Json);
        assert_eq!(ReportFormat::parse("JUnit").unwrap(), ReportFormat::Junit);
        assert_eq!(ReportFormat::parse("xml").unwrap(), ReportFormat::Junit);
        assert_eq!(
            ReportFormat::parse("summary").unwrap(),
            ReportFormat::Summary
        );
    }

    #[test]
    fn test_parse_unknown_format_fails() {
        let err = ReportFormat::parse("pdf").unwrap_err();
        assert!(matches!(err, ReportError::UnknownFormat(name) if name == "pdf"));
    }

    #[test]
    fn test_json_report_includes_stats() {
        let report = Reporter::new()
            .generate(&sample_run(), ReportFormat::Json)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&report).unwrap();
        assert_eq!(value["stats"]["tests_total"], 3);
        assert_eq!(value["stats"]["tests_failed"], 1);
        assert_eq!(value["run"]["id"], "run-100-1");
    }

    #[test]
    fn test_junit_escapes_reserved_characters() {
        let report = Reporter::new()
            .generate(&sample_run(), ReportFormat::Junit)
            .unwrap();
        assert!(report.contains("rejects &lt;bad&gt; creds"));
        assert!(report.contains("expected &quot;error&quot; &amp; got &lt;none&gt;"));
        assert!(report.contains("<skipped/>"));
        assert!(!report.contains("<bad>"));
    }

    #[test]
    fn test_junit_counts() {
        let report = Reporter::new()
            .generate(&sample_run(), ReportFormat::Junit)
            .unwrap();
        assert!(report.contains("tests=\"3\" failures=\"1\" skipped=\"1\""));
    }

    #[test]
    fn test_summary_lists_failures() {
        let report = Reporter::new()
            .generate(&sample_run(), ReportFormat::Summary)
            .unwrap();
        assert!(report.contains("Run run-100-1 - FAILED"));
        assert!(report.contains("1 passed, 1 failed, 1 skipped (3 total)"));
        assert!(report.contains("login / rejects <bad> creds"));
    }

    #[test]
    fn test_writer_persists_reports() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path().to_path_buf());

        let path = writer.write(&sample_run(), ReportFormat::Junit).unwrap();
        assert_eq!(path.file_name().unwrap(), "report.xml");
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.starts_with("<?xml"));
    }
}
