use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use covgate::check::Thresholds;
use covgate::cli::{self, CheckOptions, Outcome};
use covgate::command::SystemRunner;
use covgate::github::{self, CommentStore, GitHubClient, RepositoryContext};

/// covgate: enforce coverage thresholds in CI and report them on the pull request.
///
/// Every option can also be set through the environment, so the binary runs
/// unchanged as a GitHub Actions step.
#[derive(Parser)]
#[command(name = "covgate", version, about)]
struct Cli {
    /// Coverage file (LCOV `.info`, or Cobertura/JaCoCo XML).
    #[arg(long, env = "INPUT_COVERAGE_FILE")]
    coverage_file: PathBuf,

    /// Branch to compare against for new-code coverage (`main` or `origin/main`).
    #[arg(long, env = "INPUT_BASE_BRANCH", default_value = "main")]
    base_branch: String,

    /// Token used to post the pull request comment.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Minimum overall coverage percentage. Empty disables the check.
    #[arg(long, env = "INPUT_MIN_COVERAGE")]
    min_coverage: Option<String>,

    /// Minimum coverage percentage for new/changed lines. Empty disables the check.
    #[arg(long, env = "INPUT_MIN_COVERAGE_NEW_CODE")]
    min_coverage_new_code: Option<String>,

    /// Repository as `owner/name`.
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repository: Option<String>,

    /// Pull request number. Detected from the Actions event when omitted.
    #[arg(long)]
    pr_number: Option<u64>,

    /// Also write the rendered markdown report to this file.
    #[arg(long)]
    markdown_output: Option<PathBuf>,

    /// Print the check results as JSON on stdout.
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Cli::parse();
    match run(args) {
        Ok(Outcome::Failed(_, summary)) => {
            log::error!("{summary}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Cli) -> Result<Outcome> {
    let options = CheckOptions {
        coverage_file: args.coverage_file,
        base_branch: args.base_branch,
        thresholds: Thresholds::from_inputs(
            args.min_coverage.as_deref(),
            args.min_coverage_new_code.as_deref(),
        )?,
        markdown_output: args.markdown_output,
    };

    let client = match detect_pull_request(args.pr_number)? {
        Some(pr) => {
            let repository = args
                .repository
                .context("--repository (or GITHUB_REPOSITORY) is required to comment on a pull request")?;
            let token = args
                .github_token
                .context("--github-token (or GITHUB_TOKEN) is required to comment on a pull request")?;
            Some(GitHubClient::new(token, RepositoryContext::new(&repository, pr)?))
        }
        None => None,
    };

    if let Some(client) = &client {
        log::info!("Reporting to {}", client.context());
    }

    let publisher = client.as_ref().map(|c| c as &dyn CommentStore);
    let outcome = cli::cmd_check(&SystemRunner, publisher, &options)?;

    if args.json {
        let json = serde_json::to_string_pretty(outcome.results())
            .context("Failed to serialize results")?;
        println!("{json}");
    }

    Ok(outcome)
}

/// Explicit `--pr-number`, else the Actions event payload, else `GITHUB_REF`.
fn detect_pull_request(explicit: Option<u64>) -> Result<Option<u64>> {
    if explicit.is_some() {
        return Ok(explicit);
    }
    if let Ok(path) = std::env::var("GITHUB_EVENT_PATH") {
        if let Some(pr) = github::pull_request_from_event(Path::new(&path))? {
            return Ok(Some(pr));
        }
    }
    Ok(std::env::var("GITHUB_REF")
        .ok()
        .and_then(|r| github::pull_request_from_ref(&r)))
}
