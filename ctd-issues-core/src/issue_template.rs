//! Markdown tracking-issue templates for grouped CTD errors.

use std::path::{Path, PathBuf};

use crate::CtdIssuesError;
use crate::domain::IssueSummary;
use crate::error::Result;
use crate::fs::FileSystem;

/// Placeholder token for the normalised error message.
pub const PROCESS_ERROR_MESSAGE: &str = "{{PROCESS_ERROR_MESSAGE}}";
/// Placeholder token for the organization.
pub const ORGANIZATION: &str = "{{ORGANIZATION}}";
/// Placeholder token for the work area.
pub const WORK_AREA: &str = "{{WORK_AREA}}";
/// Placeholder token for the number of affected casts.
pub const HAKAI_ID_COUNT: &str = "{{HAKAI_ID_COUNT}}";
/// Placeholder token for the raw process error.
pub const PROCESS_ERROR: &str = "{{PROCESS_ERROR}}";
/// Placeholder token for the cast id preview.
pub const HAKAI_IDS: &str = "{{HAKAI_IDS}}";
/// Placeholder token for the affected stations.
pub const STATIONS: &str = "{{STATIONS}}";

const REQUIRED_PLACEHOLDERS: [&str; 3] = [PROCESS_ERROR_MESSAGE, HAKAI_ID_COUNT, HAKAI_IDS];
const ADMONITION_INDENT: &str = "    ";

/// Built-in tracking issue template.
pub const DEFAULT_ISSUE_TEMPLATE: &str = "---
name: Tracking issue
about: Use this template for tracking new features.
title: {{PROCESS_ERROR_MESSAGE}}
labels: {{ORGANIZATION}},{{WORK_AREA}}
assignees:
---

## issue
The Hakai CTD Processing tool encountered the following problem which is affecting {{HAKAI_ID_COUNT}} hakai_ids:
{{PROCESS_ERROR_MESSAGE}}

!!! notes
    {{PROCESS_ERROR}}


!!! hakai_ids
    {{HAKAI_IDS}}
";

/// Interpolated issue template values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueTemplateContext {
    /// Text replacement for the message placeholder.
    pub process_error_message: String,
    /// Text replacement for the organization placeholder.
    pub organization: String,
    /// Text replacement for the work area placeholder.
    pub work_area: String,
    /// Text replacement for the count placeholder.
    pub hakai_id_count: String,
    /// Raw error, indented to stay inside its admonition.
    pub process_error: String,
    /// Comma-joined id preview.
    pub hakai_ids: String,
    /// Comma-joined stations.
    pub stations: String,
}

impl IssueTemplateContext {
    /// Build a template context from a grouped issue.
    pub fn from_summary(issue: &IssueSummary) -> Self {
        Self {
            process_error_message: issue.process_error_message.clone(),
            organization: issue.organization.clone(),
            work_area: issue.work_area.clone(),
            hakai_id_count: issue.hakai_id_count.to_string(),
            process_error: indent_continuation(&issue.process_error),
            hakai_ids: issue.hakai_ids.join(", "),
            stations: issue.stations.join(", "),
        }
    }
}

/// Replace every placeholder in `template` with values from `context`.
pub fn render_issue(template: &str, context: &IssueTemplateContext) -> String {
    [
        (PROCESS_ERROR_MESSAGE, &context.process_error_message),
        (ORGANIZATION, &context.organization),
        (WORK_AREA, &context.work_area),
        (HAKAI_ID_COUNT, &context.hakai_id_count),
        (PROCESS_ERROR, &context.process_error),
        (HAKAI_IDS, &context.hakai_ids),
        (STATIONS, &context.stations),
    ]
    .into_iter()
    .fold(template.to_string(), |rendered, (token, value)| {
        if rendered.contains(token) {
            rendered.replace(token, value)
        } else {
            rendered
        }
    })
}

/// Locate a custom issue template under `root`, if one exists.
pub fn find_issue_template(root: &Path) -> Option<PathBuf> {
    let candidates = [
        root.join(".github")
            .join("ISSUE_TEMPLATE")
            .join("ctd-issue.md"),
        root.join("ctd-issue.md"),
    ];
    candidates.into_iter().find(|path| path.is_file())
}

/// Load the custom template under `root`, falling back to the built-in one.
pub fn load_issue_template<F: FileSystem>(fs: &F, root: Option<&Path>) -> Result<String> {
    let Some(path) = root.and_then(find_issue_template) else {
        return Ok(DEFAULT_ISSUE_TEMPLATE.to_string());
    };
    let template = fs.read_to_string(&path)?;
    ensure_placeholders(&template)?;
    Ok(template)
}

/// Helper to ensure required placeholders are present in a template.
pub fn ensure_placeholders(template: &str) -> Result<()> {
    let missing: Vec<&str> = REQUIRED_PLACEHOLDERS
        .into_iter()
        .filter(|token| !template.contains(*token))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(CtdIssuesError::Template(format!(
            "missing placeholders: {}",
            missing.join(", ")
        )))
    }
}

/// Split YAML front matter from a rendered issue.
///
/// Returns the front matter without its `---` fences, and the remaining body.
pub fn split_front_matter(markdown: &str) -> (Option<&str>, &str) {
    let Some(rest) = markdown.strip_prefix("---\n") else {
        return (None, markdown);
    };
    match rest.find("\n---") {
        Some(end) => {
            let front = &rest[..end];
            let after = &rest[end + "\n---".len()..];
            let body = after.strip_prefix('\n').unwrap_or(after);
            (Some(front), body.trim_start_matches('\n'))
        }
        None => (None, markdown),
    }
}

fn indent_continuation(text: &str) -> String {
    text.lines()
        .collect::<Vec<&str>>()
        .join(&format!("\n{ADMONITION_INDENT}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;

    fn sample_issue() -> IssueSummary {
        IssueSummary {
            organization: "HAKAI".to_string(),
            work_area: "QUADRA".to_string(),
            process_error_message: "\"Conductivity cell clogged\"".to_string(),
            hakai_ids: vec!["a".to_string(), "b".to_string(), "...".to_string()],
            hakai_id_count: 12,
            process_error: "{\"message\": \"Conductivity cell clogged\"}".to_string(),
            stations: vec!["QU39".to_string(), "QU24".to_string()],
        }
    }

    #[test]
    fn default_template_renders_issue() {
        let context = IssueTemplateContext::from_summary(&sample_issue());
        let rendered = render_issue(DEFAULT_ISSUE_TEMPLATE, &context);

        assert!(rendered.starts_with("---\nname: Tracking issue\n"));
        assert!(rendered.contains("title: \"Conductivity cell clogged\"\n"));
        assert!(rendered.contains("labels: HAKAI,QUADRA\n"));
        assert!(rendered.contains("which is affecting 12 hakai_ids:"));
        assert!(rendered.contains("!!! notes\n    {\"message\": \"Conductivity cell clogged\"}"));
        assert!(rendered.contains("!!! hakai_ids\n    a, b, ..."));
        assert!(!rendered.contains("{{"));
    }

    #[test]
    fn multiline_errors_stay_inside_admonition() {
        let mut issue = sample_issue();
        issue.process_error = "Traceback:\n  File x\nValueError".to_string();
        let context = IssueTemplateContext::from_summary(&issue);
        assert_eq!(
            context.process_error,
            "Traceback:\n      File x\n    ValueError"
        );
    }

    #[test]
    fn custom_templates_may_use_stations() {
        let context = IssueTemplateContext::from_summary(&sample_issue());
        let rendered = render_issue("{{PROCESS_ERROR_MESSAGE}} at {{STATIONS}}", &context);
        assert_eq!(rendered, "\"Conductivity cell clogged\" at QU39, QU24");
    }

    #[test]
    fn ensure_placeholders_reports_missing() {
        let err = ensure_placeholders("{{PROCESS_ERROR_MESSAGE}}").unwrap_err();
        let message = err.to_string();
        assert!(message.contains(HAKAI_ID_COUNT));
        assert!(message.contains(HAKAI_IDS));
        assert!(ensure_placeholders(DEFAULT_ISSUE_TEMPLATE).is_ok());
    }

    #[test]
    fn split_front_matter_separates_body() {
        let context = IssueTemplateContext::from_summary(&sample_issue());
        let rendered = render_issue(DEFAULT_ISSUE_TEMPLATE, &context);
        let (front, body) = split_front_matter(&rendered);
        let front = front.expect("front matter");
        assert!(front.starts_with("name: Tracking issue"));
        assert!(front.ends_with("assignees:"));
        assert!(body.starts_with("## issue\n"));
    }

    #[test]
    fn split_front_matter_passes_plain_markdown_through() {
        assert_eq!(split_front_matter("## issue"), (None, "## issue"));
        assert_eq!(split_front_matter("---\nunterminated"), (None, "---\nunterminated"));
    }

    #[test]
    fn load_issue_template_defaults_without_root() {
        let fs = MockFileSystem::new();
        let template = load_issue_template(&fs, None).expect("template");
        assert_eq!(template, DEFAULT_ISSUE_TEMPLATE);
    }

    #[test]
    fn load_issue_template_reads_custom_template() {
        let root = temp_dir_with_template(".github/ISSUE_TEMPLATE/ctd-issue.md");
        let template_path = root
            .join(".github")
            .join("ISSUE_TEMPLATE")
            .join("ctd-issue.md");

        let mut fs = MockFileSystem::new();
        fs.expect_read_to_string()
            .withf(move |path| path == template_path)
            .returning(|_| {
                Ok("{{PROCESS_ERROR_MESSAGE}} {{HAKAI_ID_COUNT}} {{HAKAI_IDS}}".to_string())
            });

        let template = load_issue_template(&fs, Some(&root)).expect("template");
        assert!(template.contains("{{HAKAI_IDS}}"));

        cleanup_dir(&root);
    }

    #[test]
    fn load_issue_template_rejects_incomplete_template() {
        let root = temp_dir_with_template("ctd-issue.md");
        let mut fs = MockFileSystem::new();
        fs.expect_read_to_string()
            .returning(|_| Ok("{{PROCESS_ERROR_MESSAGE}}".to_string()));

        let err = load_issue_template(&fs, Some(&root)).unwrap_err();
        assert!(matches!(err, CtdIssuesError::Template(_)));

        cleanup_dir(&root);
    }

    #[test]
    fn find_issue_template_prefers_github_directory() {
        let root = temp_dir_with_template("ctd-issue.md");
        let nested = root.join(".github").join("ISSUE_TEMPLATE");
        std::fs::create_dir_all(&nested).expect("create template dir");
        std::fs::write(nested.join("ctd-issue.md"), "placeholder").expect("write template");

        let found = find_issue_template(&root).expect("template found");
        assert_eq!(found, nested.join("ctd-issue.md"));
        cleanup_dir(&root);
    }

    fn temp_dir_with_template(rel_path: &str) -> PathBuf {
        let root = std::env::temp_dir().join(unique_dir_name());
        let template_path = root.join(rel_path);
        if let Some(parent) = template_path.parent() {
            std::fs::create_dir_all(parent).expect("create template dir");
        }
        std::fs::write(&template_path, "placeholder").expect("write template");
        root
    }

    fn unique_dir_name() -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system time")
            .as_nanos();
        PathBuf::from(format!("ctd_issue_template_test_{nanos}"))
    }

    fn cleanup_dir(root: &PathBuf) {
        std::fs::remove_dir_all(root).expect("cleanup temp dir");
    }
}
