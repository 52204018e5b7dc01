//! Static documentation site generation.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::IssueSummary;
use crate::error::Result;
use crate::fs::FileSystem;
use crate::issue_template::{IssueTemplateContext, render_issue};
use crate::report::{
    issue_markdown_name, issue_page_name, render_index_html, render_issue_html, render_json,
    render_summary_html,
};
use crate::sunburst::{build_sunburst, render_sunburst_html};

/// Landing page file name.
pub const INDEX_PAGE: &str = "index.html";
/// Issue table file name.
pub const SUMMARY_PAGE: &str = "ctd-issues.html";
/// Sunburst chart file name.
pub const SUNBURST_PAGE: &str = "sunburst.html";
/// Machine-readable issue list file name.
pub const SUMMARY_JSON: &str = "summary.json";
/// Directory holding per-issue pages.
pub const ISSUES_DIR: &str = "issues";

/// Files written by a site build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteManifest {
    /// Output root of the site.
    pub root: PathBuf,
    /// Every written file, in write order.
    pub files: Vec<PathBuf>,
    /// Number of issues rendered.
    pub issue_count: usize,
}

/// Writes the documentation site for a set of issues.
pub struct SiteBuilder<'a, F: FileSystem> {
    fs: &'a F,
    template: String,
}

impl<'a, F: FileSystem> SiteBuilder<'a, F> {
    /// Create a builder that renders issues with `template`.
    pub fn new(fs: &'a F, template: impl Into<String>) -> Self {
        Self {
            fs,
            template: template.into(),
        }
    }

    /// Render the Markdown tracking issue for `issue`.
    pub fn render_markdown(&self, issue: &IssueSummary) -> String {
        render_issue(&self.template, &IssueTemplateContext::from_summary(issue))
    }

    /// Write the full site under `out_dir`.
    ///
    /// The issues directory is recreated so pages from a larger previous build
    /// do not linger.
    pub fn build(
        &self,
        out_dir: &Path,
        issues: &[IssueSummary],
        generated_at: DateTime<Utc>,
    ) -> Result<SiteManifest> {
        let issues_dir = out_dir.join(ISSUES_DIR);
        self.fs.remove_dir_all(&issues_dir)?;
        self.fs.create_dir_all(&issues_dir)?;

        let mut manifest = SiteManifest {
            root: out_dir.to_path_buf(),
            files: Vec::new(),
            issue_count: issues.len(),
        };

        self.write(
            &mut manifest,
            out_dir.join(INDEX_PAGE),
            &render_index_html(issues, generated_at),
        )?;
        self.write(
            &mut manifest,
            out_dir.join(SUMMARY_PAGE),
            &render_summary_html(issues),
        )?;
        let sunburst = render_sunburst_html(&build_sunburst(issues))?;
        self.write(&mut manifest, out_dir.join(SUNBURST_PAGE), &sunburst)?;
        self.write(
            &mut manifest,
            out_dir.join(SUMMARY_JSON),
            &render_json(issues)?,
        )?;

        for (index, issue) in issues.iter().enumerate() {
            let markdown = self.render_markdown(issue);
            self.write(
                &mut manifest,
                issues_dir.join(issue_markdown_name(index)),
                &markdown,
            )?;
            self.write(
                &mut manifest,
                issues_dir.join(issue_page_name(index)),
                &render_issue_html(index, issue, &markdown),
            )?;
        }

        Ok(manifest)
    }

    fn write(&self, manifest: &mut SiteManifest, path: PathBuf, contents: &str) -> Result<()> {
        self.fs.write_string(&path, contents)?;
        manifest.files.push(path);
        Ok(())
    }
}

/// Read the issue list written by a previous site build.
pub fn read_summary<F: FileSystem>(fs: &F, site_dir: &Path) -> Result<Vec<IssueSummary>> {
    let contents = fs.read_to_string(&site_dir.join(SUMMARY_JSON))?;
    Ok(serde_json::from_str(&contents)?)
}
