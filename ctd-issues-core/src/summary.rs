//! Grouping of failed casts into issue summaries.

use std::collections::BTreeMap;

use crate::domain::{CastRecord, IssueSummary};
use crate::message::process_error_message;

/// Maximum number of cast ids previewed per issue.
pub const PREVIEW_LIMIT: usize = 4;

/// Marker appended to truncated id previews.
pub const TRUNCATION_MARKER: &str = "...";

/// Result of grouping cast records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryOutcome {
    /// Issues ordered by organization then affected cast count, both descending.
    pub issues: Vec<IssueSummary>,
    /// Failed casts dropped because they lack an organization or work area.
    pub skipped: usize,
}

#[derive(Default)]
struct Group {
    hakai_ids: Vec<String>,
    count: usize,
    first_error: Option<String>,
    stations: Vec<String>,
}

/// Group failed casts by organization, work area and normalised message.
pub fn summarize(records: &[CastRecord]) -> SummaryOutcome {
    let mut groups: BTreeMap<(String, String, String), Group> = BTreeMap::new();
    let mut skipped = 0;

    for record in records {
        let Some(error) = record.failure() else {
            continue;
        };
        let (Some(organization), Some(work_area)) =
            (record.organization.as_ref(), record.work_area.as_ref())
        else {
            skipped += 1;
            continue;
        };

        let key = (
            organization.clone(),
            work_area.clone(),
            process_error_message(error),
        );
        let group = groups.entry(key).or_default();
        if let Some(id) = &record.hakai_id {
            group.hakai_ids.push(id.clone());
            group.count += 1;
        }
        if group.first_error.is_none() {
            group.first_error = Some(error.to_string());
        }
        if let Some(station) = &record.station {
            group.stations.push(station.clone());
        }
    }

    let mut issues: Vec<IssueSummary> = groups
        .into_iter()
        .map(
            |((organization, work_area, process_error_message), group)| IssueSummary {
                organization,
                work_area,
                process_error_message,
                hakai_ids: preview_ids(&group.hakai_ids, PREVIEW_LIMIT),
                hakai_id_count: group.count,
                process_error: group.first_error.unwrap_or_default(),
                stations: group.stations,
            },
        )
        .collect();

    // Stable, so ties keep ascending key order.
    issues.sort_by(|a, b| {
        b.organization
            .cmp(&a.organization)
            .then(b.hakai_id_count.cmp(&a.hakai_id_count))
    });

    SummaryOutcome { issues, skipped }
}

/// Return at most `max` ids, followed by a truncation marker when more exist.
pub fn preview_ids(ids: &[String], max: usize) -> Vec<String> {
    if ids.len() <= max {
        return ids.to_vec();
    }
    let mut preview = ids[..max].to_vec();
    preview.push(TRUNCATION_MARKER.to_string());
    preview
}
