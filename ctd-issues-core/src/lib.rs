#![deny(missing_docs)]
//! CTD issues core library.
//!
//! This crate groups failed Hakai CTD casts into tracking issues and renders
//! them as Markdown issues and a static documentation site.

pub mod credentials;
pub mod domain;
pub mod error;
pub mod fs;
pub mod issue_template;
pub mod message;
pub mod report;
pub mod site;
pub mod summary;
pub mod sunburst;

pub use credentials::HakaiCredentials;
pub use domain::{CAST_FIELDS, CastRecord, IssueSummary};
pub use error::{CtdIssuesError, Result};
pub use fs::{FileSystem, StdFileSystem};
pub use issue_template::{
    DEFAULT_ISSUE_TEMPLATE, IssueTemplateContext, ensure_placeholders, find_issue_template,
    load_issue_template, render_issue, split_front_matter,
};
pub use message::{UNKNOWN_STATION_POSITION, process_error_message};
pub use report::{
    escape_html, render_index_html, render_issue_html, render_json, render_summary_html,
    render_summary_markdown, render_summary_text,
};
pub use site::{SiteBuilder, SiteManifest, read_summary};
pub use summary::{PREVIEW_LIMIT, SummaryOutcome, preview_ids, summarize};
pub use sunburst::{SunburstData, build_sunburst, render_sunburst_html};
