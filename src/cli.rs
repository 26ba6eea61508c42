//! Command handler for the covgate CLI.
//!
//! `cmd_check` takes its collaborators as arguments so it can be driven by
//! fakes in tests; `main` wires up the real process runner and GitHub client.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::check::{self, Thresholds};
use crate::command::CommandRunner;
use crate::github::{self, CommentStore};
use crate::model::CheckResult;
use crate::report::{self, ReportFormatter, TextFormatter};

/// Inputs for a single check run.
#[derive(Debug, Clone)]
pub struct CheckOptions {
    pub coverage_file: PathBuf,
    pub base_branch: String,
    pub thresholds: Thresholds,
    /// Also write the rendered markdown here.
    pub markdown_output: Option<PathBuf>,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// No threshold configured; nothing was checked.
    Skipped,
    Passed(Vec<CheckResult>),
    /// At least one check failed; carries the failure summary.
    Failed(Vec<CheckResult>, String),
}

impl Outcome {
    pub fn results(&self) -> &[CheckResult] {
        match self {
            Outcome::Skipped => &[],
            Outcome::Passed(results) | Outcome::Failed(results, _) => results,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed(..))
    }
}

/// Run the configured checks, publish the report if `publisher` is given, and
/// decide the outcome.
pub fn cmd_check(
    runner: &dyn CommandRunner,
    publisher: Option<&dyn CommentStore>,
    options: &CheckOptions,
) -> Result<Outcome> {
    let thresholds = &options.thresholds;
    log::debug!(
        "Thresholds: overall={:?} new-code={:?}",
        thresholds.overall,
        thresholds.new_code
    );

    if thresholds.is_empty() {
        log::warn!(
            "No coverage checks enabled. Set --min-coverage or --min-coverage-new-code to enable checks."
        );
        return Ok(Outcome::Skipped);
    }

    let results = check::run_checks(
        runner,
        &options.coverage_file,
        &options.base_branch,
        thresholds,
    )?;

    for line in TextFormatter.format(&results).lines() {
        log::info!("{line}");
    }

    match publisher {
        Some(store) => {
            log::info!("Posting coverage report as PR comment");
            github::publish(store, &results)?;
        }
        None => log::info!("Not a pull request - skipping comment"),
    }

    if let Some(path) = &options.markdown_output {
        write_markdown(path, &results)?;
    }

    Ok(match report::failure_summary(&results) {
        Some(summary) => Outcome::Failed(results, summary),
        None => {
            log::info!("All coverage checks passed");
            Outcome::Passed(results)
        }
    })
}

fn write_markdown(path: &Path, results: &[CheckResult]) -> Result<()> {
    std::fs::write(path, report::render(results))
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    log::info!("Wrote coverage report to {}", path.display());
    Ok(())
}
