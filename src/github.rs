//! GitHub API helpers for posting the coverage report comment on pull requests.

use std::path::Path;

use anyhow::{bail, Context as _, Result};
use serde::Deserialize;

use crate::model::CheckResult;
use crate::report::{self, COMMENT_MARKER};

const API_BASE_URL: &str = "https://api.github.com";

/// Repository and pull request the report is posted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryContext {
    pub owner: String,
    pub name: String,
    pub pull_request: u64,
}

impl RepositoryContext {
    /// Build from an `owner/name` slug, as found in `GITHUB_REPOSITORY`.
    pub fn new(repository: &str, pull_request: u64) -> Result<Self> {
        let Some((owner, name)) = repository.split_once('/') else {
            bail!("invalid repository '{repository}': expected 'owner/name'");
        };
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            bail!("invalid repository '{repository}': expected 'owner/name'");
        }
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
            pull_request,
        })
    }

    fn issue_comments_url(&self) -> String {
        format!(
            "{API_BASE_URL}/repos/{}/{}/issues/{}/comments",
            self.owner, self.name, self.pull_request
        )
    }

    fn comment_url(&self, comment_id: u64) -> String {
        format!(
            "{API_BASE_URL}/repos/{}/{}/issues/comments/{comment_id}",
            self.owner, self.name
        )
    }
}

impl std::fmt::Display for RepositoryContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/pull/{}", self.owner, self.name, self.pull_request)
    }
}

#[derive(Deserialize)]
struct EventPayload {
    pull_request: Option<EventPullRequest>,
}

#[derive(Deserialize)]
struct EventPullRequest {
    number: u64,
}

/// Pull request number from a GitHub Actions event payload file
/// (`GITHUB_EVENT_PATH`). `Ok(None)` for events that are not pull requests.
pub fn pull_request_from_event(path: &Path) -> Result<Option<u64>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read event payload {}", path.display()))?;
    let payload: EventPayload =
        serde_json::from_str(&content).context("Failed to parse event payload JSON")?;
    Ok(payload.pull_request.map(|pr| pr.number))
}

/// Extract PR number from a ref like `refs/pull/42/merge`.
pub fn pull_request_from_ref(github_ref: &str) -> Option<u64> {
    let parts: Vec<&str> = github_ref.split('/').collect();
    if parts.len() >= 3 && parts[0] == "refs" && parts[1] == "pull" {
        parts[2].parse().ok()
    } else {
        None
    }
}

/// An existing issue comment.
#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub body: Option<String>,
}

/// The comment operations the publisher needs from the platform.
pub trait CommentStore {
    /// All comments on the pull request, oldest first.
    fn list_comments(&self) -> Result<Vec<Comment>>;
    /// Create a comment and return its id.
    fn create_comment(&self, body: &str) -> Result<u64>;
    /// Replace the body of an existing comment.
    fn update_comment(&self, comment_id: u64, body: &str) -> Result<()>;
}

/// What [`publish`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Published {
    Created(u64),
    Updated(u64),
}

/// Find the first comment carrying our hidden marker.
pub fn find_report_comment(comments: &[Comment]) -> Option<u64> {
    comments
        .iter()
        .find(|c| c.body.as_deref().is_some_and(|b| b.contains(COMMENT_MARKER)))
        .map(|c| c.id)
}

/// Create or update the coverage report comment.
///
/// Not atomic: two concurrent runs on the same pull request can both miss the
/// marker and each create a comment.
pub fn publish(store: &dyn CommentStore, results: &[CheckResult]) -> Result<Published> {
    let body = report::render(results);

    match find_report_comment(&store.list_comments()?) {
        Some(comment_id) => {
            store.update_comment(comment_id, &body)?;
            log::info!("Updated coverage comment {comment_id}");
            Ok(Published::Updated(comment_id))
        }
        None => {
            let comment_id = store.create_comment(&body)?;
            log::info!("Created coverage comment {comment_id}");
            Ok(Published::Created(comment_id))
        }
    }
}

/// [`CommentStore`] backed by the GitHub REST API.
pub struct GitHubClient {
    token: String,
    context: RepositoryContext,
}

impl GitHubClient {
    pub fn new(token: impl Into<String>, context: RepositoryContext) -> Self {
        Self {
            token: token.into(),
            context,
        }
    }

    pub fn context(&self) -> &RepositoryContext {
        &self.context
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        ureq::request(method, url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Accept", "application/vnd.github+json")
            .set("User-Agent", "covgate")
            .set("X-GitHub-Api-Version", "2022-11-28")
    }
}

/// Turn a ureq failure into an error carrying the API's response body.
fn api_error(action: &str, err: ureq::Error) -> anyhow::Error {
    match err {
        ureq::Error::Status(code, resp) => {
            let body = resp.into_string().unwrap_or_default();
            anyhow::anyhow!("GitHub API error {action} (HTTP {code}): {body}")
        }
        e => anyhow::anyhow!("Failed {action}: {e}"),
    }
}

#[derive(Deserialize)]
struct CreatedComment {
    id: u64,
}

impl CommentStore for GitHubClient {
    fn list_comments(&self) -> Result<Vec<Comment>> {
        let base = self.context.issue_comments_url();
        let mut all = Vec::new();
        let mut page = 1u32;
        loop {
            let url = format!("{base}?per_page=100&page={page}");
            let resp = self
                .request("GET", &url)
                .call()
                .map_err(|e| api_error("listing PR comments", e))?;
            let comments: Vec<Comment> =
                resp.into_json().context("Failed to parse comments JSON")?;
            if comments.is_empty() {
                break;
            }
            all.extend(comments);
            page += 1;
        }
        Ok(all)
    }

    fn create_comment(&self, body: &str) -> Result<u64> {
        let resp = self
            .request("POST", &self.context.issue_comments_url())
            .send_json(serde_json::json!({ "body": body }))
            .map_err(|e| api_error("creating comment", e))?;
        let created: CreatedComment = resp
            .into_json()
            .context("Failed to parse created comment JSON")?;
        Ok(created.id)
    }

    fn update_comment(&self, comment_id: u64, body: &str) -> Result<()> {
        self.request("PATCH", &self.context.comment_url(comment_id))
            .send_json(serde_json::json!({ "body": body }))
            .map_err(|e| api_error("updating comment", e))?;
        Ok(())
    }
}
