use anyhow::{Context, Result as AnyResult};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{CivicError, Result};
use crate::schema::{Assignment, NewAssignment, Officer, ReportStatus};
use crate::store::ReportStore;

#[derive(Debug, Clone, Deserialize)]
struct RosterFile {
    officers: Vec<Officer>,
}

/// Reads an officer roster (`officers:` list) from YAML.
pub fn load_roster(path: &Path) -> AnyResult<Vec<Officer>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading officer roster {}", path.display()))?;
    parse_roster(&raw).with_context(|| format!("parsing officer roster {}", path.display()))
}

pub fn parse_roster(raw: &str) -> AnyResult<Vec<Officer>> {
    let roster: RosterFile = serde_yaml::from_str(raw)?;
    Ok(roster.officers)
}

/// Records that `officer_id` now handles `report_id`.
///
/// Only open reports accept assignments.
pub fn assign_officer<S: ReportStore + ?Sized>(
    store: &S,
    report_id: &str,
    officer_id: &str,
    notes: &str,
) -> Result<Assignment> {
    let report = store
        .find_report(report_id)?
        .ok_or_else(|| CivicError::NotFound {
            entity: "report",
            id: report_id.to_string(),
        })?;
    if report.status == ReportStatus::Resolved {
        return Err(CivicError::ReportClosed(report_id.to_string()));
    }

    let officers = store.select_officers()?;
    if !officers.iter().any(|officer| officer.id == officer_id) {
        return Err(CivicError::NotFound {
            entity: "officer",
            id: officer_id.to_string(),
        });
    }

    let assignment = store.insert_assignment(&NewAssignment {
        report_id: report_id.to_string(),
        officer_id: officer_id.to_string(),
        notes: notes.to_string(),
    })?;
    tracing::info!(report_id, officer_id, "officer assigned");
    Ok(assignment)
}
