use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::schema::{Report, ReportPriority, ReportStatus};

pub const UNKNOWN_LOCATION: &str = "Unknown location";

/// A stored value outside the known set. Unknown statuses are shown as
/// "Unknown"; unknown priorities are shown as the default priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "raw", rename_all = "snake_case")]
pub enum Anomaly {
    UnknownStatus(String),
    UnknownPriority(String),
}

/// Display-safe projection of a [`Report`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DisplayReport {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub coordinates: Option<(f64, f64)>,
    pub status: ReportStatus,
    pub status_label: String,
    pub priority: ReportPriority,
    pub priority_label: String,
    pub created_at: String,
    pub resolved_at: Option<String>,
    pub has_image: bool,
    pub has_audio: bool,
    /// Unrecognized values found on the report.
    pub anomalies: Vec<Anomaly>,
}

pub fn to_display(report: &Report) -> DisplayReport {
    let mut anomalies = Vec::new();

    // Unknown statuses stay unknown so the row lands in the same bucket
    // `stats::aggregate` puts it in.
    if let ReportStatus::Unknown(raw) = &report.status {
        anomalies.push(Anomaly::UnknownStatus(raw.clone()));
    }
    let status = report.status.clone();

    let priority = match &report.priority {
        None => ReportPriority::Medium,
        Some(ReportPriority::Unknown(raw)) => {
            anomalies.push(Anomaly::UnknownPriority(raw.clone()));
            ReportPriority::Medium
        }
        Some(known) => known.clone(),
    };

    if !anomalies.is_empty() {
        tracing::warn!(report_id = %report.id, ?anomalies, "report carries unrecognized values");
    }

    let location = match report.address.as_deref().map(str::trim) {
        Some(address) if !address.is_empty() => address.to_string(),
        _ => UNKNOWN_LOCATION.to_string(),
    };

    let coordinates = match (report.location_lat, report.location_lng) {
        (Some(lat), Some(lng)) => Some((lat, lng)),
        _ => None,
    };

    DisplayReport {
        id: report.id.clone(),
        title: report.title.clone(),
        description: report.description.clone(),
        category: report.category.clone(),
        location,
        coordinates,
        status_label: status.label().to_string(),
        status,
        priority_label: priority.label().to_string(),
        priority,
        created_at: report.created_at.clone(),
        resolved_at: report.resolved_at.clone(),
        has_image: has_media(report.image_url.as_deref()),
        has_audio: has_media(report.audio_url.as_deref()),
        anomalies,
    }
}

/// Projects every report and returns how many anomalies were found.
pub fn to_display_all(reports: &[Report]) -> (Vec<DisplayReport>, usize) {
    let displayed: Vec<DisplayReport> = reports.iter().map(to_display).collect();
    let anomalies = displayed.iter().map(|r| r.anomalies.len()).sum();
    (displayed, anomalies)
}

fn has_media(url: Option<&str>) -> bool {
    url.is_some_and(|url| !url.trim().is_empty())
}
