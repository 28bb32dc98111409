use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use time::OffsetDateTime;

use crate::display::{to_display, DisplayReport};
use crate::schema::{parse_timestamp, Report, ReportPriority, ReportStatus};

/// Status counts for one snapshot of reports.
///
/// `pending + in_progress + resolved + other == total` always holds; `other`
/// collects statuses outside the known lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReportStats {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub resolved: usize,
    pub other: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// Everything the dashboard landing view derives from one report snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DashboardSummary {
    pub stats: ReportStats,
    /// Percentage of reports resolved, one decimal.
    pub resolution_rate: f64,
    pub average_resolution_hours: Option<f64>,
    pub by_category: Vec<CategoryCount>,
    pub high_priority_pending: usize,
    pub recent: Vec<DisplayReport>,
}

pub fn aggregate(reports: &[Report]) -> ReportStats {
    let mut stats = ReportStats::default();
    for report in reports {
        stats.total += 1;
        match &report.status {
            ReportStatus::Pending => stats.pending += 1,
            ReportStatus::InProgress => stats.in_progress += 1,
            ReportStatus::Resolved => stats.resolved += 1,
            ReportStatus::Unknown(raw) => {
                tracing::warn!(report_id = %report.id, status = %raw, "unrecognized report status");
                stats.other += 1;
            }
        }
    }
    stats
}

pub fn resolution_rate(stats: &ReportStats) -> f64 {
    if stats.total == 0 {
        return 0.0;
    }
    round_to(stats.resolved as f64 / stats.total as f64 * 100.0, 1)
}

/// Mean hours from creation to resolution over resolved reports with
/// parseable timestamps. `None` when no report qualifies.
pub fn average_resolution_hours(reports: &[Report]) -> Option<f64> {
    let durations: Vec<f64> = reports
        .iter()
        .filter(|report| report.status == ReportStatus::Resolved)
        .filter_map(resolution_hours)
        .collect();
    if durations.is_empty() {
        return None;
    }
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;
    Some(round_to(mean, 1))
}

fn resolution_hours(report: &Report) -> Option<f64> {
    let resolved_at = report.resolved_at.as_deref()?;
    let created = usable_timestamp(&report.id, "created_at", &report.created_at)?;
    let resolved = usable_timestamp(&report.id, "resolved_at", resolved_at)?;
    let seconds = (resolved - created).whole_seconds();
    if seconds < 0 {
        tracing::warn!(report_id = %report.id, "resolved_at precedes created_at");
        return None;
    }
    Some(seconds as f64 / 3600.0)
}

fn usable_timestamp(report_id: &str, field: &'static str, value: &str) -> Option<OffsetDateTime> {
    match parse_timestamp(field, value) {
        Ok(ts) => Some(ts),
        Err(err) => {
            tracing::warn!(report_id, error = %err, "skipping report in resolution average");
            None
        }
    }
}

/// Report counts per category, largest first, ties by name.
pub fn category_breakdown(reports: &[Report]) -> Vec<CategoryCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for report in reports {
        *counts.entry(report.category.as_str()).or_insert(0) += 1;
    }
    let mut breakdown: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category: category.to_string(),
            count,
        })
        .collect();
    breakdown.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
    breakdown
}

pub fn high_priority_pending(reports: &[Report]) -> usize {
    reports
        .iter()
        .filter(|report| {
            report.status == ReportStatus::Pending
                && report.priority == Some(ReportPriority::High)
        })
        .count()
}

pub fn summarize(reports: &[Report], recent_limit: usize) -> DashboardSummary {
    let stats = aggregate(reports);
    DashboardSummary {
        resolution_rate: resolution_rate(&stats),
        stats,
        average_resolution_hours: average_resolution_hours(reports),
        by_category: category_breakdown(reports),
        high_priority_pending: high_priority_pending(reports),
        recent: reports.iter().take(recent_limit).map(to_display).collect(),
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
