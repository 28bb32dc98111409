use schemars::JsonSchema;
use schemars::r#gen::SchemaGenerator;
use schemars::schema::Schema;
use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::error::{CivicError, Result};

/// Lifecycle stage of a report as stored. Values outside the known set are
/// kept verbatim in `Unknown` so callers can surface them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReportStatus {
    Pending,
    InProgress,
    Resolved,
    Unknown(String),
}

impl ReportStatus {
    pub fn parse(value: &str) -> Self {
        match value {
            "pending" => ReportStatus::Pending,
            "in_progress" => ReportStatus::InProgress,
            "resolved" => ReportStatus::Resolved,
            other => ReportStatus::Unknown(other.to_string()),
        }
    }

    /// Like [`ReportStatus::parse`] but rejects values outside the known set.
    pub fn parse_strict(value: &str) -> Result<Self> {
        match Self::parse(value) {
            ReportStatus::Unknown(raw) => Err(CivicError::UnknownStatus(raw)),
            status => Ok(status),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::InProgress => "in_progress",
            ReportStatus::Resolved => "resolved",
            ReportStatus::Unknown(raw) => raw,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "Pending",
            ReportStatus::InProgress => "In Progress",
            ReportStatus::Resolved => "Resolved",
            ReportStatus::Unknown(_) => "Unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ReportStatus::Unknown(_))
    }
}

impl From<String> for ReportStatus {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<ReportStatus> for String {
    fn from(value: ReportStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl JsonSchema for ReportStatus {
    fn schema_name() -> String {
        "ReportStatus".to_string()
    }

    fn json_schema(generator: &mut SchemaGenerator) -> Schema {
        String::json_schema(generator)
    }
}

/// Urgency classification. Same parsing policy as [`ReportStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReportPriority {
    Low,
    Medium,
    High,
    Unknown(String),
}

impl ReportPriority {
    pub fn parse(value: &str) -> Self {
        match value {
            "low" => ReportPriority::Low,
            "medium" => ReportPriority::Medium,
            "high" => ReportPriority::High,
            other => ReportPriority::Unknown(other.to_string()),
        }
    }

    pub fn parse_strict(value: &str) -> Result<Self> {
        match Self::parse(value) {
            ReportPriority::Unknown(raw) => Err(CivicError::UnknownPriority(raw)),
            priority => Ok(priority),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ReportPriority::Low => "low",
            ReportPriority::Medium => "medium",
            ReportPriority::High => "high",
            ReportPriority::Unknown(raw) => raw,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReportPriority::Low => "Low",
            ReportPriority::Medium => "Medium",
            ReportPriority::High => "High",
            ReportPriority::Unknown(_) => "Unknown",
        }
    }
}

impl From<String> for ReportPriority {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<ReportPriority> for String {
    fn from(value: ReportPriority) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ReportPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl JsonSchema for ReportPriority {
    fn schema_name() -> String {
        "ReportPriority".to_string()
    }

    fn json_schema(generator: &mut SchemaGenerator) -> Schema {
        String::json_schema(generator)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Report {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub category: String, // open set, e.g. "Road Infrastructure", "Water Supply"
    pub status: ReportStatus,
    #[serde(default)]
    pub priority: Option<ReportPriority>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub location_lat: Option<f64>,
    #[serde(default)]
    pub location_lng: Option<f64>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
    pub created_at: String, // RFC 3339, set by the store
    pub updated_at: String,
    #[serde(default)]
    pub resolved_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Citizen {
    pub id: String,
    pub user_id: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Citizen row as submitted for insertion; the store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NewCitizen {
    pub user_id: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Officer {
    pub id: String,
    pub name: String,
    pub department: String,
    pub specialization: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NewAssignment {
    pub report_id: String,
    pub officer_id: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Assignment {
    pub id: i64,
    pub report_id: String,
    pub officer_id: String,
    pub notes: String,
    pub assigned_at: String,
}

/// Parses an RFC 3339 timestamp column; `field` names it in the error.
pub fn parse_timestamp(field: &'static str, value: &str) -> Result<OffsetDateTime> {
    OffsetDateTime::parse(value, &Rfc3339).map_err(|_| CivicError::InvalidTimestamp {
        field,
        value: value.to_string(),
    })
}
