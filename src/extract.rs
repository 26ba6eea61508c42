/// Total-coverage extraction via external summarizer tools.
///
/// covgate never reads coverage files itself. LCOV tracefiles (`*.info`) are
/// summarized with `lcov --summary`; anything else (Cobertura, JaCoCo XML) goes
/// through `coverage-report` from the diff-cover package. The aggregate
/// percentage is scraped from the tool's text output.
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::command::CommandRunner;

/// `lines......: 85.5% (171 of 200 lines)`
static LCOV_LINES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"lines[.\s]+:\s+([0-9.]+)%").unwrap());

/// `Total: 87.50%`
static TOTAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Total[:\s]+([0-9.]+)%").unwrap());

/// Suffix of files handled by `lcov --summary`.
const LCOV_SUFFIX: &str = ".info";

/// The external tool used to summarize a coverage file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Summarizer {
    Lcov,
    CoverageReport,
}

impl Summarizer {
    /// Pick a summarizer from the coverage file's name.
    pub fn for_path(path: &Path) -> Self {
        if path.to_string_lossy().ends_with(LCOV_SUFFIX) {
            Summarizer::Lcov
        } else {
            Summarizer::CoverageReport
        }
    }

    pub fn program(&self) -> &'static str {
        match self {
            Summarizer::Lcov => "lcov",
            Summarizer::CoverageReport => "coverage-report",
        }
    }

    fn args<'a>(&self, file: &'a str) -> Vec<&'a str> {
        match self {
            Summarizer::Lcov => vec!["--summary", file],
            Summarizer::CoverageReport => vec![file],
        }
    }

    /// Scrape the total percentage from this tool's output.
    pub fn parse(&self, output: &str) -> Option<f64> {
        match self {
            Summarizer::Lcov => parse_lcov_summary(output),
            Summarizer::CoverageReport => parse_total_summary(output),
        }
    }
}

/// Parse the line-coverage percentage from `lcov --summary` output.
pub fn parse_lcov_summary(output: &str) -> Option<f64> {
    first_percentage(&LCOV_LINES_RE, output)
}

/// Parse the total percentage from `coverage-report` output.
pub fn parse_total_summary(output: &str) -> Option<f64> {
    first_percentage(&TOTAL_RE, output)
}

pub(crate) fn first_percentage(re: &Regex, output: &str) -> Option<f64> {
    re.captures(output)?.get(1)?.as_str().parse().ok()
}

/// Extract the total coverage percentage of `coverage_file`.
///
/// Returns `None` when the tool cannot be launched, exits non-zero, or prints
/// nothing recognizable. None of these are fatal.
pub fn extract_total_coverage(runner: &dyn CommandRunner, coverage_file: &Path) -> Option<f64> {
    let summarizer = Summarizer::for_path(coverage_file);
    let program = summarizer.program();
    let file = coverage_file.to_string_lossy();
    log::info!("Extracting total coverage from {file} with {program}");

    let output = match runner.run(program, &summarizer.args(&file)) {
        Ok(output) => output,
        Err(e) => {
            log::error!("Error extracting total coverage: failed to run {program}: {e}");
            return None;
        }
    };

    let text = output.combined();
    log_tool_output(program, &text);

    if !output.succeeded() {
        log::error!(
            "Error extracting total coverage: {program} failed: {}",
            output.failure_reason()
        );
        return None;
    }

    let coverage = summarizer.parse(&text);
    if coverage.is_none() {
        log::warn!("Could not find a total coverage percentage in {program} output");
    }
    coverage
}

fn log_tool_output(program: &str, text: &str) {
    log::info!("=== {program} output ===");
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        log::info!("{line}");
    }
    log::info!("=== end {program} output ===");
}
