use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::schema::{Citizen, Officer, Report, ReportPriority, ReportStatus};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum StatusFilter {
    #[default]
    All,
    Only(ReportStatus),
}

impl StatusFilter {
    /// `"all"` disables the predicate; anything else must be a known status.
    pub fn parse(value: &str) -> Result<Self> {
        if value == "all" {
            return Ok(StatusFilter::All);
        }
        ReportStatus::parse_strict(value).map(StatusFilter::Only)
    }

    fn matches(&self, status: &ReportStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => wanted == status,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum PriorityFilter {
    #[default]
    All,
    Only(ReportPriority),
}

impl PriorityFilter {
    pub fn parse(value: &str) -> Result<Self> {
        if value == "all" {
            return Ok(PriorityFilter::All);
        }
        ReportPriority::parse_strict(value).map(PriorityFilter::Only)
    }

    fn matches(&self, priority: Option<&ReportPriority>) -> bool {
        match self {
            PriorityFilter::All => true,
            PriorityFilter::Only(wanted) => priority == Some(wanted),
        }
    }
}

/// Combined report query. Active predicates are AND-ed together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReportQuery {
    pub text: Option<String>,
    pub status: StatusFilter,
    pub priority: PriorityFilter,
}

impl ReportQuery {
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn status(mut self, status: ReportStatus) -> Self {
        self.status = StatusFilter::Only(status);
        self
    }

    pub fn priority(mut self, priority: ReportPriority) -> Self {
        self.priority = PriorityFilter::Only(priority);
        self
    }

    pub fn matches(&self, report: &Report) -> bool {
        self.status.matches(&report.status)
            && self.priority.matches(report.priority.as_ref())
            && self.matches_text(report)
    }

    fn matches_text(&self, report: &Report) -> bool {
        let Some(needle) = self.needle() else {
            return true;
        };
        contains_ci(&report.title, &needle)
            || report
                .address
                .as_deref()
                .is_some_and(|address| contains_ci(address, &needle))
            || contains_ci(&report.user_id, &needle)
    }

    fn needle(&self) -> Option<String> {
        self.text
            .as_deref()
            .filter(|text| !text.is_empty())
            .map(str::to_lowercase)
    }
}

/// Stable filter: matching reports keep their relative input order.
pub fn filter_reports(reports: &[Report], query: &ReportQuery) -> Vec<Report> {
    reports
        .iter()
        .filter(|report| query.matches(report))
        .cloned()
        .collect()
}

/// Citizens whose name, email or address contains `text`, case-insensitively.
pub fn filter_citizens(citizens: &[Citizen], text: &str) -> Vec<Citizen> {
    let needle = text.to_lowercase();
    citizens
        .iter()
        .filter(|citizen| {
            needle.is_empty()
                || contains_ci(&citizen.full_name, &needle)
                || contains_ci(&citizen.email, &needle)
                || citizen
                    .address
                    .as_deref()
                    .is_some_and(|address| contains_ci(address, &needle))
        })
        .cloned()
        .collect()
}

pub fn filter_officers(officers: &[Officer], text: &str) -> Vec<Officer> {
    let needle = text.to_lowercase();
    officers
        .iter()
        .filter(|officer| {
            needle.is_empty()
                || contains_ci(&officer.name, &needle)
                || contains_ci(&officer.department, &needle)
                || contains_ci(&officer.specialization, &needle)
        })
        .cloned()
        .collect()
}

// `needle` must already be lowercased.
fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}
