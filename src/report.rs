//! Output formatting for check results.

use std::fmt::Write;

use crate::model::{format_coverage, format_fixed2, CheckKind, CheckResult};

/// Hidden marker identifying covgate's pull request comment.
pub const COMMENT_MARKER: &str = "<!-- covgate-comment -->";

const BADGE_BASE_URL: &str = "https://img.shields.io/badge";

/// Trait for formatting a set of check results.
pub trait ReportFormatter {
    /// Format the results to a string.
    fn format(&self, results: &[CheckResult]) -> String;
}

/// Markdown formatter producing the pull request comment body.
pub struct MarkdownFormatter;

impl ReportFormatter for MarkdownFormatter {
    fn format(&self, results: &[CheckResult]) -> String {
        let overall = find(results, CheckKind::Overall);
        let new_code = find(results, CheckKind::NewCode);

        let mut md = String::new();
        writeln!(md, "{COMMENT_MARKER}").unwrap();
        md.push_str("## 📊 Coverage Report\n\n");
        md.push_str("| Type | Coverage | Required | Status |\n");
        md.push_str("|------|----------|----------|--------|\n");

        if let Some(result) = overall {
            md.push_str(&table_row("📦", "Overall Project", result));
        }
        if let Some(result) = new_code {
            md.push_str(&table_row("🆕", "New Code (Diff)", result));
        }
        md.push('\n');

        if let Some(output) = new_code.and_then(CheckResult::output) {
            if !output.is_empty() {
                md.push_str("<details>\n<summary>📋 View detailed diff-cover report</summary>\n\n");
                writeln!(md, "```\n{}\n```\n</details>\n", output.trim()).unwrap();
            }
        }

        let (status, color) = if all_passed(results) {
            ("Passing", "brightgreen")
        } else {
            ("Failing", "red")
        };
        write!(
            md,
            "---\n![Overall: {status}]({BADGE_BASE_URL}/Overall-{status}-{color}?style=for-the-badge)"
        )
        .unwrap();

        md
    }
}

/// Plain text formatter, one line per result.
pub struct TextFormatter;

impl ReportFormatter for TextFormatter {
    fn format(&self, results: &[CheckResult]) -> String {
        let mut out = String::new();
        for r in results {
            let coverage = match r.coverage() {
                Some(_) => format!("{}%", format_coverage(r.coverage())),
                None => format_coverage(None),
            };
            let status = if r.passed() { "passing" } else { "failing" };
            writeln!(
                out,
                "{}: {coverage} (required {}%) {status}",
                r.kind(),
                r.min_required()
            )
            .unwrap();
        }
        out
    }
}

/// Render the pull request comment body for `results`.
#[must_use]
pub fn render(results: &[CheckResult]) -> String {
    MarkdownFormatter.format(results)
}

/// `true` when every result passed (vacuously true for no results).
#[must_use]
pub fn all_passed(results: &[CheckResult]) -> bool {
    results.iter().all(CheckResult::passed)
}

/// One-line description of every failing check, or `None` if all passed.
///
/// e.g. `Coverage check(s) failed: overall (current: 75.00%, expected: 80%)`
#[must_use]
pub fn failure_summary(results: &[CheckResult]) -> Option<String> {
    let failed: Vec<String> = results
        .iter()
        .filter(|r| !r.passed())
        .map(|r| {
            let current = match r.coverage() {
                Some(_) => format!("{}%", format_coverage(r.coverage())),
                None => "unknown".to_string(),
            };
            format!(
                "{} (current: {current}, expected: {}%)",
                r.kind(),
                r.min_required()
            )
        })
        .collect();

    if failed.is_empty() {
        None
    } else {
        Some(format!("Coverage check(s) failed: {}", failed.join(", ")))
    }
}

fn find(results: &[CheckResult], kind: CheckKind) -> Option<&CheckResult> {
    results.iter().find(|r| r.kind() == kind)
}

fn table_row(icon: &str, label: &str, result: &CheckResult) -> String {
    let coverage_badge = match result.coverage() {
        Some(c) => badge(
            "coverage",
            &format!("{}%", format_coverage(Some(c))),
            coverage_color(c, result.min_required()),
        ),
        None => badge("coverage", "unknown", "lightgrey"),
    };

    let diff_badge = match result.margin() {
        Some(diff) => badge(
            "diff",
            &format!("{}%", format_margin(diff)),
            if diff >= 0.0 { "brightgreen" } else { "red" },
        ),
        None => String::new(),
    };

    let status_badge = if result.passed() {
        badge("status", "passing", "brightgreen")
    } else {
        badge("status", "failing", "red")
    };

    format!(
        "| **{icon} {label}** | {coverage_badge} {diff_badge} | {}% | {status_badge} |\n",
        result.min_required()
    )
}

/// Signed two-decimal difference, `+` for non-negative values.
#[must_use]
pub fn format_margin(diff: f64) -> String {
    if diff >= 0.0 {
        format!("+{}", format_fixed2(diff))
    } else {
        format_fixed2(diff)
    }
}

/// shields.io color for a coverage value relative to its threshold.
#[must_use]
pub fn coverage_color(coverage: f64, min_required: f64) -> &'static str {
    if coverage >= min_required {
        if coverage >= 90.0 {
            "brightgreen"
        } else if coverage >= 80.0 {
            "green"
        } else if coverage >= 70.0 {
            "yellowgreen"
        } else {
            "yellow"
        }
    } else if coverage >= 50.0 {
        "orange"
    } else {
        "red"
    }
}

/// Markdown image pointing at a shields.io static badge.
///
/// Only `%` in the message is escaped; everything else is inserted as is.
#[must_use]
pub fn badge(label: &str, message: &str, color: &str) -> String {
    let encoded = message.replace('%', "%25");
    format!("![{label}: {message}]({BADGE_BASE_URL}/{label}-{encoded}-{color})")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diff_output() -> String {
        "Diff Coverage: 92.5%\nsrc/utils/parser.js (95.0%)\nsrc/components/Header.tsx (90.0%)\nTotal: 42 lines added, 39 covered".to_string()
    }

    // -- badge / color tests ------------------------------------------------

    #[test]
    fn test_badge_escapes_percent() {
        assert_eq!(
            badge("coverage", "85.50%", "green"),
            "![coverage: 85.50%](https://img.shields.io/badge/coverage-85.50%25-green)"
        );
    }

    #[test]
    fn test_badge_verbatim_label_and_message() {
        assert_eq!(
            badge("status", "passing", "brightgreen"),
            "![status: passing](https://img.shields.io/badge/status-passing-brightgreen)"
        );
    }

    #[test]
    fn test_coverage_color_above_threshold() {
        assert_eq!(coverage_color(95.0, 80.0), "brightgreen");
        assert_eq!(coverage_color(90.0, 80.0), "brightgreen");
        assert_eq!(coverage_color(85.0, 80.0), "green");
        assert_eq!(coverage_color(75.0, 70.0), "yellowgreen");
        assert_eq!(coverage_color(60.0, 50.0), "yellow");
    }

    #[test]
    fn test_coverage_color_below_threshold() {
        assert_eq!(coverage_color(75.0, 80.0), "orange");
        assert_eq!(coverage_color(50.0, 80.0), "orange");
        assert_eq!(coverage_color(49.9, 80.0), "red");
        // Below threshold wins over the high bands.
        assert_eq!(coverage_color(95.0, 99.0), "orange");
    }

    #[test]
    fn test_format_margin_sign() {
        assert_eq!(format_margin(10.0), "+10.00");
        assert_eq!(format_margin(0.0), "+0.00");
        assert_eq!(format_margin(-5.0), "-5.00");
        assert_eq!(format_margin(85.567 - 80.0), "+5.57");
        assert_eq!(format_margin(0.125), "+0.13");
        assert_eq!(format_margin(-0.125), "-0.13");
    }

    #[test]
    fn test_render_rounds_half_up() {
        let body = render(&[CheckResult::overall(Some(85.125), 85.0)]);
        assert!(body.contains("coverage-85.13%25"));
        assert!(body.contains("diff-+0.13%25"));
    }

    // -- markdown tests -----------------------------------------------------

    #[test]
    fn test_render_overall_passing() {
        let body = render(&[CheckResult::overall(Some(85.5), 80.0)]);
        assert!(body.starts_with(COMMENT_MARKER));
        assert!(body.contains("## 📊 Coverage Report"));
        assert!(body.contains("Overall Project"));
        assert!(body.contains("85.50"));
        assert!(body.contains("80%"));
        assert!(body.contains("passing"));
        assert!(body.contains("+5.50"));
        assert!(body.contains("Overall-Passing-brightgreen"));
        assert!(!body.contains("<details>"));
    }

    #[test]
    fn test_render_mixed_results_failing() {
        let results = [
            CheckResult::overall(Some(75.0), 80.0),
            CheckResult::new_code(Some(95.0), 90.0, "Diff Coverage: 95.0%".to_string()),
        ];
        let body = render(&results);

        let overall_row = body
            .lines()
            .find(|l| l.contains("Overall Project"))
            .unwrap();
        assert!(overall_row.contains("-5.00"));
        assert!(overall_row.contains("failing"));
        assert!(overall_row.contains("orange"));
        assert!(body.contains("95.00"));
        assert!(body.contains("Overall-Failing-red"));
    }

    #[test]
    fn test_render_row_order_is_fixed() {
        let results = [
            CheckResult::new_code(Some(95.0), 90.0, String::new()),
            CheckResult::overall(Some(85.0), 80.0),
        ];
        let body = render(&results);
        let overall = body.find("Overall Project").unwrap();
        let new_code = body.find("New Code (Diff)").unwrap();
        assert!(overall < new_code);
    }

    #[test]
    fn test_render_unknown_coverage() {
        let body = render(&[CheckResult::overall(None, 80.0)]);
        assert!(body.contains("coverage-unknown-lightgrey"));
        assert!(body.contains("failing"));
        assert!(!body.contains("![diff"));
        assert!(body.contains("Overall-Failing-red"));
    }

    #[test]
    fn test_render_details_section() {
        let results = [CheckResult::new_code(Some(92.5), 90.0, format!("\n\n{}\n  ", diff_output()))];
        let body = render(&results);
        assert!(body.contains("View detailed diff-cover report"));
        assert!(body.contains("```\nDiff Coverage: 92.5%\n"));
        assert!(body.contains("42 lines added, 39 covered\n```\n</details>"));
        assert!(body.contains("parser.js"));
        assert!(body.contains("Header.tsx"));
    }

    #[test]
    fn test_render_empty_output_has_no_details() {
        let body = render(&[CheckResult::new_code(None, 90.0, String::new())]);
        assert!(!body.contains("<details>"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let results = [
            CheckResult::overall(Some(85.567), 80.0),
            CheckResult::new_code(Some(92.5), 90.0, diff_output()),
        ];
        assert_eq!(render(&results), render(&results));
    }

    #[test]
    fn test_render_exact_row() {
        let body = render(&[CheckResult::overall(Some(90.0), 80.0)]);
        let expected = "| **📦 Overall Project** | \
![coverage: 90.00%](https://img.shields.io/badge/coverage-90.00%25-brightgreen) \
![diff: +10.00%](https://img.shields.io/badge/diff-+10.00%25-brightgreen) | 80% | \
![status: passing](https://img.shields.io/badge/status-passing-brightgreen) |";
        assert!(body.contains(expected), "{body}");
    }

    #[test]
    fn test_render_no_results() {
        let body = render(&[]);
        assert!(body.contains("| Type | Coverage | Required | Status |"));
        assert!(body.ends_with("Overall-Passing-brightgreen?style=for-the-badge)"));
    }

    // -- text / summary tests -----------------------------------------------

    #[test]
    fn test_text_formatter() {
        let results = [
            CheckResult::new_code(None, 90.0, String::new()),
            CheckResult::overall(Some(85.5), 80.0),
        ];
        let text = TextFormatter.format(&results);
        assert_eq!(
            text,
            "new-code: ? (required 90%) failing\noverall: 85.50% (required 80%) passing\n"
        );
    }

    #[test]
    fn test_failure_summary() {
        let results = [
            CheckResult::new_code(None, 90.0, String::new()),
            CheckResult::overall(Some(75.0), 80.5),
        ];
        assert_eq!(
            failure_summary(&results).unwrap(),
            "Coverage check(s) failed: new-code (current: unknown, expected: 90%), overall (current: 75.00%, expected: 80.5%)"
        );
    }

    #[test]
    fn test_failure_summary_all_passed() {
        assert_eq!(failure_summary(&[CheckResult::overall(Some(90.0), 80.0)]), None);
    }
}
