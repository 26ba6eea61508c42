//! Check results produced by a single covgate run. Evaluators build a
//! `CheckResult` per configured threshold; renderers and the publisher only
//! read them.

use serde::Serialize;

use crate::error::{CovgateError, Result};

/// Which threshold a result evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckKind {
    Overall,
    NewCode,
}

impl CheckKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::Overall => "overall",
            CheckKind::NewCode => "new-code",
        }
    }
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating one coverage threshold.
///
/// `passed` is derived from `coverage` and `min_required` at construction and
/// cannot be set directly. The only way to get a pass that ignores the
/// threshold is [`CheckResult::empty_diff`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    #[serde(rename = "type")]
    kind: CheckKind,
    coverage: Option<f64>,
    min_required: f64,
    passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
}

impl CheckResult {
    /// Result for the whole-project threshold.
    #[must_use]
    pub fn overall(coverage: Option<f64>, min_required: f64) -> Self {
        Self {
            kind: CheckKind::Overall,
            coverage,
            min_required,
            passed: meets_threshold(coverage, min_required),
            output: None,
        }
    }

    /// Result for the new-code threshold, carrying the diff tool's report.
    #[must_use]
    pub fn new_code(coverage: Option<f64>, min_required: f64, output: String) -> Self {
        Self {
            kind: CheckKind::NewCode,
            coverage,
            min_required,
            passed: meets_threshold(coverage, min_required),
            output: Some(output),
        }
    }

    /// A diff with no instrumentable lines counts as fully covered, whatever
    /// the threshold.
    #[must_use]
    pub fn empty_diff(min_required: f64, output: String) -> Self {
        Self {
            kind: CheckKind::NewCode,
            coverage: Some(100.0),
            min_required,
            passed: true,
            output: Some(output),
        }
    }

    pub fn kind(&self) -> CheckKind {
        self.kind
    }

    pub fn coverage(&self) -> Option<f64> {
        self.coverage
    }

    pub fn min_required(&self) -> f64 {
        self.min_required
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    /// `coverage - min_required`, or `None` when coverage is unknown.
    #[must_use]
    pub fn margin(&self) -> Option<f64> {
        self.coverage.map(|c| c - self.min_required)
    }
}

/// `true` iff coverage is known and at least `min_required`.
#[must_use]
pub fn meets_threshold(coverage: Option<f64>, min_required: f64) -> bool {
    coverage.is_some_and(|c| c >= min_required)
}

/// Two-decimal percentage, or `"?"` when unknown.
#[must_use]
pub fn format_coverage(coverage: Option<f64>) -> String {
    match coverage {
        Some(c) => format_fixed2(c),
        None => "?".to_string(),
    }
}

/// Two decimal places, rounding exact halves away from zero (`85.125` gives
/// `85.13`). Plain `{:.2}` would round such ties to even.
#[must_use]
pub fn format_fixed2(value: f64) -> String {
    // Only multiples of 1/8 that are not multiples of 1/4 sit exactly on a
    // hundredths tie; bump those one ulp away from zero.
    let on_tie = (value * 8.0).fract() == 0.0 && (value * 4.0).fract() != 0.0;
    let value = if on_tie {
        f64::from_bits(value.to_bits() + 1)
    } else {
        value
    };
    format!("{value:.2}")
}

/// Parse a threshold percentage. Must be a finite number in `0..=100`.
pub fn parse_threshold(value: &str) -> Result<f64> {
    let invalid = |reason: &str| CovgateError::InvalidThreshold {
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let parsed: f64 = value
        .trim()
        .parse()
        .map_err(|_| invalid("not a number"))?;
    if !parsed.is_finite() {
        return Err(invalid("must be finite"));
    }
    if !(0.0..=100.0).contains(&parsed) {
        return Err(invalid("must be between 0 and 100"));
    }
    Ok(parsed)
}

/// Parse an optional threshold input. Empty or blank input disables the check.
pub fn parse_optional_threshold(value: &str) -> Result<Option<f64>> {
    if value.trim().is_empty() {
        Ok(None)
    } else {
        parse_threshold(value).map(Some)
    }
}
