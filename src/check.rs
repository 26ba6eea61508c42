//! Runs the configured coverage checks in order: new-code first, then overall.

use std::path::Path;

use crate::command::CommandRunner;
use crate::diff;
use crate::error::Result;
use crate::extract;
use crate::model::{self, CheckResult};

/// Minimum coverage percentages. `None` disables that check.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Thresholds {
    pub overall: Option<f64>,
    pub new_code: Option<f64>,
}

impl Thresholds {
    /// Build thresholds from raw inputs. A missing, empty or blank input
    /// disables that check; anything else must be a valid percentage.
    pub fn from_inputs(overall: Option<&str>, new_code: Option<&str>) -> Result<Self> {
        let parse = |input: Option<&str>| match input {
            Some(value) => model::parse_optional_threshold(value),
            None => Ok(None),
        };
        Ok(Self {
            overall: parse(overall)?,
            new_code: parse(new_code)?,
        })
    }

    /// `true` when no check is enabled.
    pub fn is_empty(&self) -> bool {
        self.overall.is_none() && self.new_code.is_none()
    }
}

/// Check total coverage of `coverage_file` against `min_required`.
pub fn check_overall_coverage(
    runner: &dyn CommandRunner,
    coverage_file: &Path,
    min_required: f64,
) -> CheckResult {
    log::info!("Checking overall coverage from {}", coverage_file.display());
    let coverage = extract::extract_total_coverage(runner, coverage_file);
    CheckResult::overall(coverage, min_required)
}

/// Run every enabled check and collect the results.
///
/// Returns an empty list when no threshold is set. A failed base-branch fetch
/// aborts before the overall check runs.
pub fn run_checks(
    runner: &dyn CommandRunner,
    coverage_file: &Path,
    base_branch: &str,
    thresholds: &Thresholds,
) -> Result<Vec<CheckResult>> {
    let mut results = Vec::new();

    if let Some(min) = thresholds.new_code {
        results.push(diff::check_diff_coverage(
            runner,
            coverage_file,
            base_branch,
            min,
        )?);
    }

    if let Some(min) = thresholds.overall {
        results.push(check_overall_coverage(runner, coverage_file, min));
    }

    Ok(results)
}
