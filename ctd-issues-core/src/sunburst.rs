//! Sunburst chart of issues by organization, work area and message.

use std::collections::BTreeMap;
use std::fmt::Write;

use serde::Serialize;

use crate::domain::IssueSummary;
use crate::report::escape_html;

/// plotly.js bundle loaded by the chart page.
pub const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Flattened sunburst hierarchy in plotly's parallel-array layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SunburstData {
    /// Unique path of every sector, its percent-encoded components joined by `/`.
    pub ids: Vec<String>,
    /// Display label of every sector.
    pub labels: Vec<String>,
    /// Parent id of every sector, empty for the roots.
    pub parents: Vec<String>,
    /// Affected cast count of every sector.
    pub values: Vec<usize>,
}

impl SunburstData {
    fn push(&mut self, id: String, label: &str, parent: String, value: usize) {
        self.ids.push(id);
        self.labels.push(label.to_string());
        self.parents.push(parent);
        self.values.push(value);
    }
}

/// Build the organization → work area → message hierarchy.
///
/// Parents carry the sum of their children so the chart can use
/// `branchvalues: "total"`.
pub fn build_sunburst(issues: &[IssueSummary]) -> SunburstData {
    let mut tree: BTreeMap<&str, BTreeMap<&str, Vec<&IssueSummary>>> = BTreeMap::new();
    for issue in issues {
        tree.entry(issue.organization.as_str())
            .or_default()
            .entry(issue.work_area.as_str())
            .or_default()
            .push(issue);
    }

    let mut data = SunburstData::default();
    for (organization, areas) in tree {
        let org_total: usize = areas
            .values()
            .flatten()
            .map(|issue| issue.hakai_id_count)
            .sum();
        let org_id = sector_id(&[organization]);
        data.push(org_id.clone(), organization, String::new(), org_total);

        for (work_area, area_issues) in areas {
            let area_id = sector_id(&[organization, work_area]);
            let area_total: usize = area_issues.iter().map(|issue| issue.hakai_id_count).sum();
            data.push(area_id.clone(), work_area, org_id.clone(), area_total);

            for issue in area_issues {
                data.push(
                    sector_id(&[organization, work_area, &issue.process_error_message]),
                    &issue.process_error_message,
                    area_id.clone(),
                    issue.hakai_id_count,
                );
            }
        }
    }
    data
}

/// Components are encoded so a `/` inside a name cannot alias another sector.
fn sector_id(components: &[&str]) -> String {
    components
        .iter()
        .map(|component| urlencoding::encode(component))
        .collect::<Vec<_>>()
        .join("/")
}

/// Render a standalone HTML page with a plotly sunburst chart.
pub fn render_sunburst_html(data: &SunburstData) -> Result<String, serde_json::Error> {
    let trace = serde_json::json!([{
        "type": "sunburst",
        "ids": data.ids,
        "labels": data.labels,
        "parents": data.parents,
        "values": data.values,
        "branchvalues": "total",
        "marker": { "colors": data.values, "colorscale": "Viridis", "showscale": true },
        "hovertemplate": "%{label}<br>casts: %{value}<extra></extra>",
    }]);
    // `</` must not appear verbatim inside a script block.
    let payload = serde_json::to_string(&trace)?.replace("</", "<\\/");

    let mut output = String::new();
    let _ = writeln!(output, "<!DOCTYPE html>");
    let _ = writeln!(output, "<html lang=\"en\">");
    let _ = writeln!(output, "<head>");
    let _ = writeln!(output, "<meta charset=\"utf-8\">");
    let _ = writeln!(output, "<title>{}</title>", escape_html("CTD processing issues"));
    let _ = writeln!(output, "<script src=\"{PLOTLY_CDN}\"></script>");
    let _ = writeln!(output, "</head>");
    let _ = writeln!(output, "<body>");
    let _ = writeln!(output, "<div id=\"sunburst\" style=\"width:100%;height:90vh;\"></div>");
    let _ = writeln!(output, "<script>");
    let _ = writeln!(
        output,
        "Plotly.newPlot(\"sunburst\", {payload}, {{margin: {{t: 10, l: 0, r: 0, b: 0}}}});"
    );
    let _ = writeln!(output, "</script>");
    let _ = writeln!(output, "</body>");
    let _ = writeln!(output, "</html>");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(org: &str, area: &str, message: &str, count: usize) -> IssueSummary {
        IssueSummary {
            organization: org.to_string(),
            work_area: area.to_string(),
            process_error_message: message.to_string(),
            hakai_ids: Vec::new(),
            hakai_id_count: count,
            process_error: String::new(),
            stations: Vec::new(),
        }
    }

    #[test]
    fn builds_hierarchy_with_totals() {
        let issues = vec![
            issue("HAKAI", "QUADRA", "\"a\"", 3),
            issue("HAKAI", "QUADRA", "\"b\"", 2),
            issue("HAKAI", "CALVERT", "\"a\"", 1),
            issue("DFO", "NORTH", "\"c\"", 4),
        ];

        let data = build_sunburst(&issues);

        assert_eq!(data.ids.len(), 9);
        assert_eq!(data.ids[0], "DFO");
        assert_eq!(data.values[0], 4);
        let hakai = data.ids.iter().position(|id| id == "HAKAI").expect("hakai");
        assert_eq!(data.values[hakai], 6);
        assert_eq!(data.parents[hakai], "");
        let quadra = data
            .ids
            .iter()
            .position(|id| id == "HAKAI/QUADRA")
            .expect("quadra");
        assert_eq!(data.values[quadra], 5);
        assert_eq!(data.parents[quadra], "HAKAI");
        let leaf = data
            .ids
            .iter()
            .position(|id| id == "HAKAI/QUADRA/%22b%22")
            .expect("leaf");
        assert_eq!(data.labels[leaf], "\"b\"");
        assert_eq!(data.parents[leaf], "HAKAI/QUADRA");
        assert_eq!(data.values[leaf], 2);
    }

    #[test]
    fn slashes_in_names_do_not_merge_sectors() {
        let issues = vec![
            issue("A/B", "C", "\"x\"", 1),
            issue("A", "B/C", "\"x\"", 2),
        ];

        let data = build_sunburst(&issues);

        assert_eq!(data.ids.len(), 6);
        let mut unique = data.ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), data.ids.len());
        let nested = data
            .ids
            .iter()
            .position(|id| id == "A/B%2FC")
            .expect("nested area");
        assert_eq!(data.labels[nested], "B/C");
        assert_eq!(data.parents[nested], "A");
    }

    #[test]
    fn empty_issues_produce_empty_chart() {
        assert_eq!(build_sunburst(&[]), SunburstData::default());
    }

    #[test]
    fn renders_plotly_page() {
        let data = build_sunburst(&[issue("HAKAI", "QUADRA", "\"</script>\"", 1)]);
        let html = render_sunburst_html(&data).expect("html");
        assert!(html.contains(PLOTLY_CDN));
        assert!(html.contains("\"branchvalues\":\"total\""));
        assert!(html.contains("Plotly.newPlot(\"sunburst\""));
        assert_eq!(html.matches("</script>").count(), 2);
    }
}
