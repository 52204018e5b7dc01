//! Report formatting utilities for CTD issue outputs.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::IssueSummary;

const STYLE: &str = "body{font-family:sans-serif;margin:2rem;}\
table{border-collapse:collapse;}\
th,td{border:1px solid #ccc;padding:4px 8px;vertical-align:top;text-align:left;}\
pre{background:#f6f8fa;padding:1rem;white-space:pre-wrap;}";

/// File name of the HTML page for the issue at `index`.
pub fn issue_page_name(index: usize) -> String {
    format!("issue-{index}.html")
}

/// File name of the Markdown issue at `index`.
pub fn issue_markdown_name(index: usize) -> String {
    format!("issue-{index}.md")
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Render the issue table as a standalone HTML page.
pub fn render_summary_html(issues: &[IssueSummary]) -> String {
    let mut output = String::new();
    open_page(&mut output, "CTD processing issues");
    let _ = writeln!(output, "<h1>CTD processing issues</h1>");
    if issues.is_empty() {
        let _ = writeln!(output, "<p>No processing issues found.</p>");
        close_page(&mut output);
        return output;
    }
    let _ = writeln!(output, "<table class=\"dataframe\">");
    let _ = writeln!(
        output,
        "<thead><tr><th></th><th>organization</th><th>work_area</th>\
<th>process_error_message</th><th>hakai_ids</th><th>N_hakai_id</th>\
<th>process_error</th><th>stations</th></tr></thead>"
    );
    let _ = writeln!(output, "<tbody>");
    for (index, issue) in issues.iter().enumerate() {
        let _ = writeln!(
            output,
            "<tr><th><a href=\"issues/{}\">{index}</a></th><td>{}</td><td>{}</td><td>{}</td>\
<td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            issue_page_name(index),
            escape_html(&issue.organization),
            escape_html(&issue.work_area),
            escape_html(&issue.process_error_message),
            escape_html(&issue.hakai_ids.join(", ")),
            issue.hakai_id_count,
            escape_html(&issue.process_error),
            escape_html(&issue.stations.join(", ")),
        );
    }
    let _ = writeln!(output, "</tbody>");
    let _ = writeln!(output, "</table>");
    close_page(&mut output);
    output
}

/// Render the landing page of the documentation site.
pub fn render_index_html(issues: &[IssueSummary], generated_at: DateTime<Utc>) -> String {
    let total_casts: usize = issues.iter().map(|issue| issue.hakai_id_count).sum();
    let mut output = String::new();
    open_page(&mut output, "Hakai CTD processing issues");
    let _ = writeln!(output, "<h1>Hakai CTD processing issues</h1>");
    let _ = writeln!(
        output,
        "<p>{} issues affecting {total_casts} casts. Generated {}.</p>",
        issues.len(),
        generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(
        output,
        "<p><a href=\"ctd-issues.html\">Issue table</a> | \
<a href=\"sunburst.html\">Issues by organization</a> | \
<a href=\"summary.json\">JSON</a></p>"
    );
    if issues.is_empty() {
        let _ = writeln!(output, "<p>No processing issues found.</p>");
    } else {
        let _ = writeln!(output, "<ul>");
        for (index, issue) in issues.iter().enumerate() {
            let _ = writeln!(
                output,
                "<li><a href=\"issues/{}\">{}</a> ({} / {}, {} casts)</li>",
                issue_page_name(index),
                escape_html(&issue.process_error_message),
                escape_html(&issue.organization),
                escape_html(&issue.work_area),
                issue.hakai_id_count
            );
        }
        let _ = writeln!(output, "</ul>");
    }
    close_page(&mut output);
    output
}

/// Render the page of a single issue around its Markdown rendering.
pub fn render_issue_html(index: usize, issue: &IssueSummary, markdown: &str) -> String {
    let mut output = String::new();
    open_page(&mut output, &issue.process_error_message);
    let _ = writeln!(output, "<p><a href=\"../index.html\">All issues</a></p>");
    let _ = writeln!(output, "<h1>{}</h1>", escape_html(&issue.process_error_message));
    let _ = writeln!(output, "<ul>");
    let _ = writeln!(
        output,
        "<li>Organization: {}</li>",
        escape_html(&issue.organization)
    );
    let _ = writeln!(output, "<li>Work area: {}</li>", escape_html(&issue.work_area));
    let _ = writeln!(output, "<li>Affected casts: {}</li>", issue.hakai_id_count);
    if !issue.stations.is_empty() {
        let _ = writeln!(
            output,
            "<li>Stations: {}</li>",
            escape_html(&issue.stations.join(", "))
        );
    }
    let _ = writeln!(output, "</ul>");
    let _ = writeln!(
        output,
        "<p><a href=\"{}\">Markdown source</a></p>",
        issue_markdown_name(index)
    );
    let _ = writeln!(output, "<pre>{}</pre>", escape_html(markdown));
    close_page(&mut output);
    output
}

/// Render issues as plain text for terminal output.
pub fn render_summary_text(issues: &[IssueSummary]) -> String {
    let mut output = String::new();
    if issues.is_empty() {
        let _ = writeln!(output, "No processing issues found.");
        return output;
    }
    for (index, issue) in issues.iter().enumerate() {
        let _ = writeln!(output, "[{index}] {}", issue.process_error_message);
        let _ = writeln!(output, "Organization: {}", issue.organization);
        let _ = writeln!(output, "Work area: {}", issue.work_area);
        let _ = writeln!(output, "Casts: {}", issue.hakai_id_count);
        let _ = writeln!(output, "Hakai ids: {}", issue.hakai_ids.join(", "));
        let _ = writeln!(output);
    }
    output
}

/// Render issues as a Markdown report.
pub fn render_summary_markdown(issues: &[IssueSummary]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# CTD Processing Issues\n");
    if issues.is_empty() {
        let _ = writeln!(output, "No processing issues found.");
        return output;
    }
    let _ = writeln!(
        output,
        "| # | organization | work_area | process_error_message | N_hakai_id |"
    );
    let _ = writeln!(output, "|---|---|---|---|---|");
    for (index, issue) in issues.iter().enumerate() {
        let _ = writeln!(
            output,
            "| {index} | {} | {} | {} | {} |",
            escape_table_cell(&issue.organization),
            escape_table_cell(&issue.work_area),
            escape_table_cell(&issue.process_error_message),
            issue.hakai_id_count
        );
    }
    output
}

/// Render any serializable report payload as JSON.
pub fn render_json<T: Serialize + ?Sized>(payload: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(payload)
}

fn escape_table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn open_page(output: &mut String, title: &str) {
    let _ = writeln!(output, "<!DOCTYPE html>");
    let _ = writeln!(output, "<html lang=\"en\">");
    let _ = writeln!(output, "<head>");
    let _ = writeln!(output, "<meta charset=\"utf-8\">");
    let _ = writeln!(output, "<title>{}</title>", escape_html(title));
    let _ = writeln!(output, "<style>{STYLE}</style>");
    let _ = writeln!(output, "</head>");
    let _ = writeln!(output, "<body>");
}

fn close_page(output: &mut String) {
    let _ = writeln!(output, "</body>");
    let _ = writeln!(output, "</html>");
}
