/// New-code coverage via `diff-cover`.
///
/// The base branch is shallow-fetched into its remote-tracking ref, then
/// `diff-cover` compares the coverage file against it. Only the fetch can fail
/// the run; anything `diff-cover` does is folded into the [`CheckResult`].
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::command::CommandRunner;
use crate::error::{CovgateError, Result};
use crate::extract::first_percentage;
use crate::model::CheckResult;

const REMOTE: &str = "origin";

/// Printed by `diff-cover` when none of the changed lines are instrumentable.
pub const NO_DIFF_LINES: &str = "No lines with coverage information in this diff";

/// `Diff Coverage: 92.5%`
static DIFF_COVERAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Diff Coverage:\s+([0-9.]+)%").unwrap());

/// A base branch as given by the user, resolved into the two forms needed:
/// the bare name to fetch and the remote-tracking ref to compare against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseBranch {
    name: String,
    compare_ref: String,
}

impl BaseBranch {
    /// Accepts either `main` or `origin/main`.
    pub fn parse(branch: &str) -> Self {
        let prefix = format!("{REMOTE}/");
        let name = branch.strip_prefix(&prefix).unwrap_or(branch).to_string();
        let compare_ref = format!("{prefix}{name}");
        Self { name, compare_ref }
    }

    /// Branch name without the remote, e.g. `main`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Remote-tracking ref passed to `diff-cover`, e.g. `origin/main`.
    pub fn compare_ref(&self) -> &str {
        &self.compare_ref
    }

    /// Refspec that updates the remote-tracking ref, e.g.
    /// `main:refs/remotes/origin/main`.
    fn refspec(&self) -> String {
        format!("{}:refs/remotes/{REMOTE}/{}", self.name, self.name)
    }
}

/// Shallow-fetch the base branch. Any failure is fatal.
pub fn fetch_base_branch(runner: &dyn CommandRunner, branch: &BaseBranch) -> Result<()> {
    let refspec = branch.refspec();
    log::info!("Fetching {REMOTE}/{}", branch.name());

    let fetch_error = |reason: String| CovgateError::BranchFetch {
        branch: branch.name().to_string(),
        reason,
    };

    let output = runner
        .run("git", &["fetch", REMOTE, &refspec, "--depth=1"])
        .map_err(|e| fetch_error(format!("failed to run git: {e}")))?;

    for line in output.combined().lines().filter(|l| !l.trim().is_empty()) {
        log::debug!("git: {line}");
    }

    if !output.succeeded() {
        return Err(fetch_error(output.failure_reason()));
    }
    Ok(())
}

/// Parse the percentage from `diff-cover` output.
pub fn parse_diff_coverage(output: &str) -> Option<f64> {
    first_percentage(&DIFF_COVERAGE_RE, output)
}

/// Run `diff-cover` and return its report text.
///
/// `diff-cover` exits non-zero when coverage is below its own threshold, which
/// still produces a usable report, so the exit status is ignored. If stdout is
/// empty the failure reason stands in for it.
fn run_diff_cover(runner: &dyn CommandRunner, coverage_file: &str, branch: &BaseBranch) -> String {
    let compare = format!("--compare-branch={}", branch.compare_ref());
    match runner.run("diff-cover", &[coverage_file, &compare]) {
        Ok(output) if output.succeeded() || !output.stdout.trim().is_empty() => output.stdout,
        Ok(output) => format!("diff-cover failed: {}", output.failure_reason()),
        Err(e) => format!("failed to run diff-cover: {e}"),
    }
}

/// Evaluate new-code coverage of `coverage_file` against `base_branch`.
pub fn check_diff_coverage(
    runner: &dyn CommandRunner,
    coverage_file: &Path,
    base_branch: &str,
    min_required: f64,
) -> Result<CheckResult> {
    let branch = BaseBranch::parse(base_branch);
    let file = coverage_file.to_string_lossy();
    log::info!(
        "Running diff-cover on {file} vs {}",
        branch.compare_ref()
    );

    fetch_base_branch(runner, &branch)?;

    let output = run_diff_cover(runner, &file, &branch);
    log::info!("diff-cover output:\n{output}");

    if output.contains(NO_DIFF_LINES) {
        log::info!(
            "No lines with coverage information found in the diff - considering this as passing"
        );
        return Ok(CheckResult::empty_diff(min_required, output));
    }

    let coverage = parse_diff_coverage(&output);
    if coverage.is_none() {
        log::warn!("Could not find a diff coverage percentage in diff-cover output");
    }
    Ok(CheckResult::new_code(coverage, min_required, output))
}
