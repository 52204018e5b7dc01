//! GitHub tracking issues for grouped CTD errors.

use crate::CliResult;
use clap::Args;
use ctd_issues_core::IssueSummary;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

/// Default GitHub REST API root.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
const PAGE_SIZE: usize = 100;

/// CLI arguments for the GitHub issue tracker.
#[derive(Args, Clone, Debug)]
pub struct GitHubArgs {
    /// Repository receiving tracking issues (owner/name or GitHub URL).
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repo: String,
    /// GitHub API base URL.
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_GITHUB_API_URL)]
    pub github_api_url: String,
    /// Token used to list and create issues.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,
}

/// Owner and name of a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub name: String,
}

impl RepoRef {
    /// Parse `owner/name` or a GitHub URL.
    pub fn parse(value: &str) -> CliResult<Self> {
        let trimmed = value.trim().trim_end_matches('/').trim_end_matches(".git");
        let path = trimmed
            .strip_prefix("https://github.com/")
            .or_else(|| trimmed.strip_prefix("http://github.com/"))
            .or_else(|| trimmed.strip_prefix("git@github.com:"))
            .unwrap_or(trimmed);
        let mut parts = path.split('/');
        let owner = parts.next().unwrap_or_default().trim();
        let name = parts.next().unwrap_or_default().trim();
        if owner.is_empty() || name.is_empty() || parts.next().is_some() {
            return Err(format!("expected owner/name repository, got '{value}'").into());
        }
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

/// Payload for a new GitHub issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewIssue {
    /// Issue title.
    pub title: String,
    /// Markdown body without front matter.
    pub body: String,
    /// Labels to apply.
    pub labels: Vec<String>,
}

/// Title and label names of an open tracking issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenIssue {
    /// Issue title.
    pub title: String,
    /// Label names attached to the issue.
    pub labels: Vec<String>,
}

impl OpenIssue {
    /// Whether this issue already tracks `summary`.
    ///
    /// Titles only name the message, so the organization and work area
    /// labels must be present too.
    pub fn tracks(&self, summary: &IssueSummary) -> bool {
        self.title.trim() == summary.title().trim()
            && summary
                .labels()
                .iter()
                .all(|label| self.labels.iter().any(|name| name == label))
    }
}

#[derive(Debug, Deserialize)]
struct GitHubIssue {
    title: String,
    #[serde(default)]
    labels: Vec<GitHubLabel>,
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GitHubLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CreatedIssue {
    html_url: String,
}

/// Issue tracker able to list and open tracking issues.
pub trait IssueTracker {
    /// Every open issue in `repo`.
    fn list_open_issues<'a>(
        &'a self,
        repo: &'a RepoRef,
    ) -> Pin<Box<dyn Future<Output = CliResult<Vec<OpenIssue>>> + Send + 'a>>;

    /// Open `issue` in `repo`, returning its URL.
    fn create_issue<'a>(
        &'a self,
        repo: &'a RepoRef,
        issue: &'a NewIssue,
    ) -> Pin<Box<dyn Future<Output = CliResult<String>> + Send + 'a>>;
}

/// Reqwest-backed GitHub issue client.
pub struct GitHubIssueClient {
    client: Client,
    base_url: String,
    token: String,
}

impl GitHubIssueClient {
    /// Build a client for `base_url` authenticated with `token`.
    pub fn new(base_url: &str, token: &str) -> CliResult<Self> {
        let client = Client::builder().user_agent("ctd-issues-cli").build()?;
        Ok(Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Build a client from CLI arguments, requiring a token.
    pub fn from_args(args: &GitHubArgs) -> CliResult<Self> {
        let token = args
            .github_token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
            .ok_or("GITHUB_TOKEN is required to publish issues")?;
        Self::new(&args.github_api_url, token)
    }
}

impl IssueTracker for GitHubIssueClient {
    fn list_open_issues<'a>(
        &'a self,
        repo: &'a RepoRef,
    ) -> Pin<Box<dyn Future<Output = CliResult<Vec<OpenIssue>>> + Send + 'a>> {
        Box::pin(list_open_issues(
            &self.client,
            &self.base_url,
            &self.token,
            repo,
        ))
    }

    fn create_issue<'a>(
        &'a self,
        repo: &'a RepoRef,
        issue: &'a NewIssue,
    ) -> Pin<Box<dyn Future<Output = CliResult<String>> + Send + 'a>> {
        Box::pin(create_issue(
            &self.client,
            &self.base_url,
            &self.token,
            repo,
            issue,
        ))
    }
}

async fn list_open_issues(
    client: &Client,
    base_url: &str,
    token: &str,
    repo: &RepoRef,
) -> CliResult<Vec<OpenIssue>> {
    let url = format!("{base_url}/repos/{}/{}/issues", repo.owner, repo.name);
    let mut open = Vec::new();
    let mut page = 1usize;
    loop {
        let response = client
            .get(&url)
            .bearer_auth(token)
            .header("Accept", "application/vnd.github+json")
            .query(&[
                ("state", "open".to_string()),
                ("per_page", PAGE_SIZE.to_string()),
                ("page", page.to_string()),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("github api error ({status}): {body}").into());
        }
        let issues = response.json::<Vec<GitHubIssue>>().await?;
        let received = issues.len();
        open.extend(
            issues
                .into_iter()
                .filter(|issue| issue.pull_request.is_none())
                .map(|issue| OpenIssue {
                    title: issue.title,
                    labels: issue.labels.into_iter().map(|label| label.name).collect(),
                }),
        );
        if received < PAGE_SIZE {
            break;
        }
        page += 1;
    }
    log::debug!(
        "Found {} open issues in {}/{}",
        open.len(),
        repo.owner,
        repo.name
    );
    Ok(open)
}

async fn create_issue(
    client: &Client,
    base_url: &str,
    token: &str,
    repo: &RepoRef,
    issue: &NewIssue,
) -> CliResult<String> {
    let url = format!("{base_url}/repos/{}/{}/issues", repo.owner, repo.name);
    let response = client
        .post(url)
        .bearer_auth(token)
        .header("Accept", "application/vnd.github+json")
        .json(issue)
        .send()
        .await?;
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(format!("github api error ({status}): {body}").into());
    }
    let created = response.json::<CreatedIssue>().await?;
    Ok(created.html_url)
}

/// Issues that no open tracking issue covers yet.
pub fn plan_publication<'a>(
    issues: &'a [IssueSummary],
    existing: &[OpenIssue],
) -> Vec<&'a IssueSummary> {
    issues
        .iter()
        .filter(|issue| !existing.iter().any(|open| open.tracks(issue)))
        .collect()
}
