#![deny(missing_docs)]
//! CTD issues command-line interface.
//!
//! Fetches failed Hakai CTD casts, groups them into tracking issues and
//! renders them as a static documentation site.

mod github;
mod hakai;

use clap::{Args, Parser, Subcommand, ValueEnum};
use ctd_issues_core::{
    CastRecord, IssueSummary, SiteBuilder, SiteManifest, StdFileSystem, load_issue_template,
    render_json, render_summary_markdown, render_summary_text, split_front_matter, summarize,
};
use github::{GitHubArgs, GitHubIssueClient, IssueTracker, NewIssue, RepoRef, plan_publication};
use hakai::{HakaiArgs, HakaiClient, ReqwestHakaiClient};
use std::path::{Path, PathBuf};

pub(crate) type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Parser)]
#[command(name = "ctd-issues", version, about = "Hakai CTD processing issues")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Debug)]
struct SourceArgs {
    /// Cast snapshot written by `fetch`, used instead of the live API.
    #[arg(short, long)]
    input: Option<PathBuf>,
    #[command(flatten)]
    hakai: HakaiArgs,
}

#[derive(Args, Clone, Debug)]
struct TemplateArgs {
    /// Directory searched for a custom `ctd-issue.md` template.
    #[arg(long)]
    template_root: Option<PathBuf>,
}

#[derive(Args, Clone, Debug)]
struct OutputArgs {
    /// Output format for report data.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Write the report to a file instead of stdout.
    #[arg(long = "report-output")]
    report_output: Option<PathBuf>,
}

#[derive(ValueEnum, Copy, Clone, Debug, Eq, PartialEq)]
enum OutputFormat {
    Text,
    Json,
    Markdown,
}

#[derive(Subcommand)]
enum Commands {
    /// Download failed casts from the Hakai API into a snapshot file.
    Fetch {
        #[command(flatten)]
        hakai: HakaiArgs,
        /// Snapshot file to write.
        #[arg(short, long, default_value = "ctd-casts.json")]
        output: PathBuf,
    },
    /// Print failed casts grouped into issues.
    Summarize {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        report: OutputArgs,
    },
    /// Build the static documentation site.
    Build {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        template: TemplateArgs,
        /// Output directory of the site.
        #[arg(short, long, default_value = "site")]
        output: PathBuf,
    },
    /// Open GitHub tracking issues for groups without an open issue.
    Publish {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        template: TemplateArgs,
        #[command(flatten)]
        github: GitHubArgs,
        /// Create the issues instead of listing them.
        #[arg(long)]
        apply: bool,
    },
}

#[cfg(not(test))]
#[tokio::main]
async fn main() -> CliResult<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch { hakai, output } => {
            let client = ReqwestHakaiClient::from_args(&hakai)?;
            run_fetch(&client, &output).await?
        }
        Commands::Summarize { source, report } => {
            let casts = load_casts(&source).await?;
            run_summarize(&casts, &report).await?
        }
        Commands::Build {
            source,
            template,
            output,
        } => {
            let casts = load_casts(&source).await?;
            run_build(&casts, template.template_root.as_deref(), &output)?;
        }
        Commands::Publish {
            source,
            template,
            github,
            apply,
        } => {
            let casts = load_casts(&source).await?;
            let repo = RepoRef::parse(&github.repo)?;
            let tracker = GitHubIssueClient::from_args(&github)?;
            run_publish(
                &casts,
                template.template_root.as_deref(),
                &tracker,
                &repo,
                apply,
            )
            .await?;
        }
    }

    Ok(())
}

#[cfg(test)]
fn main() {}

/// Load casts from a snapshot when given, otherwise from the Hakai API.
#[cfg_attr(test, allow(dead_code))]
async fn load_casts(source: &SourceArgs) -> CliResult<Vec<CastRecord>> {
    if let Some(path) = &source.input {
        return load_snapshot(path).await;
    }
    let client = ReqwestHakaiClient::from_args(&source.hakai)?;
    client.fetch_failed_casts().await
}

async fn load_snapshot(path: &Path) -> CliResult<Vec<CastRecord>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| format!("failed to read snapshot {}: {err}", path.display()))?;
    let casts: Vec<CastRecord> = serde_json::from_str(&contents)
        .map_err(|err| format!("invalid snapshot {}: {err}", path.display()))?;
    log::info!("Loaded {} casts from {}", casts.len(), path.display());
    Ok(casts)
}

async fn run_fetch<C: HakaiClient>(client: &C, output: &Path) -> CliResult<()> {
    let casts = client.fetch_failed_casts().await?;
    write_file(output, render_json(&casts)?).await?;
    log::info!("Wrote {} casts to {}", casts.len(), output.display());
    Ok(())
}

fn group_casts(casts: &[CastRecord]) -> Vec<IssueSummary> {
    let outcome = summarize(casts);
    if outcome.skipped > 0 {
        log::warn!(
            "Skipped {} failed casts without an organization or work area",
            outcome.skipped
        );
    }
    outcome.issues
}

async fn run_summarize(casts: &[CastRecord], output: &OutputArgs) -> CliResult<()> {
    let issues = group_casts(casts);
    let contents = match output.format {
        OutputFormat::Text => render_summary_text(&issues),
        OutputFormat::Markdown => render_summary_markdown(&issues),
        OutputFormat::Json => render_json(&issues)?,
    };
    emit_output(output, contents).await
}

fn run_build(
    casts: &[CastRecord],
    template_root: Option<&Path>,
    output: &Path,
) -> CliResult<SiteManifest> {
    let issues = group_casts(casts);
    let fs = StdFileSystem::new();
    let template = load_issue_template(&fs, template_root)?;
    let manifest =
        SiteBuilder::new(&fs, template).build(output, &issues, chrono::Utc::now())?;
    for file in &manifest.files {
        log::debug!("Wrote {}", file.display());
    }
    log::info!(
        "Built site with {} issues ({} files) in {}",
        manifest.issue_count,
        manifest.files.len(),
        output.display()
    );
    Ok(manifest)
}

async fn run_publish<T: IssueTracker>(
    casts: &[CastRecord],
    template_root: Option<&Path>,
    tracker: &T,
    repo: &RepoRef,
    apply: bool,
) -> CliResult<Vec<NewIssue>> {
    let issues = group_casts(casts);
    let fs = StdFileSystem::new();
    let template = load_issue_template(&fs, template_root)?;
    let builder = SiteBuilder::new(&fs, template);

    let existing = tracker.list_open_issues(repo).await?;
    let planned: Vec<NewIssue> = plan_publication(&issues, &existing)
        .into_iter()
        .map(|issue| {
            let markdown = builder.render_markdown(issue);
            let (_, body) = split_front_matter(&markdown);
            NewIssue {
                title: issue.title().to_string(),
                body: body.to_string(),
                labels: issue.labels(),
            }
        })
        .collect();

    if planned.is_empty() {
        println!("All {} issues are already tracked.", issues.len());
        return Ok(planned);
    }
    for issue in &planned {
        if apply {
            let url = tracker.create_issue(repo, issue).await?;
            println!("Created {url}: {}", issue.title);
        } else {
            println!("Would create: {}", issue.title);
        }
    }
    if !apply {
        println!(
            "{} new issues planned for {}/{}; rerun with --apply to create them.",
            planned.len(),
            repo.owner,
            repo.name
        );
    }
    Ok(planned)
}

async fn emit_output(output: &OutputArgs, contents: String) -> CliResult<()> {
    if let Some(path) = &output.report_output {
        write_file(path, contents).await?;
    } else {
        print!("{contents}");
    }
    Ok(())
}

async fn write_file(path: &Path, contents: String) -> CliResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(path, contents).await?;
    Ok(())
}
