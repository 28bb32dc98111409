/// Errors raised by the civic core.
///
/// Store failures are wrapped once at the store boundary and propagate to the
/// caller unchanged; nothing in this crate retries them.
///
/// ```rust
/// use civic_core::error::CivicError;
///
/// let err = CivicError::NotFound {
///     entity: "report",
///     id: "RPT001".to_string(),
/// };
/// assert!(err.to_string().contains("RPT001"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum CivicError {
    /// Transport or query failure reported by the backing store.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("unknown report status: {0:?}")]
    UnknownStatus(String),

    #[error("unknown report priority: {0:?}")]
    UnknownPriority(String),

    /// A timestamp column that is not RFC 3339.
    #[error("invalid {field} timestamp: {value:?}")]
    InvalidTimestamp { field: &'static str, value: String },

    /// The caller cancelled the request before results were delivered.
    #[error("request cancelled")]
    Cancelled,

    #[error("{entity} not found (id={id})")]
    NotFound { entity: &'static str, id: String },

    /// Officers can only be assigned to open reports.
    #[error("report {0} is already resolved")]
    ReportClosed(String),
}

impl From<rusqlite::Error> for CivicError {
    fn from(err: rusqlite::Error) -> Self {
        CivicError::StoreUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for CivicError {
    fn from(err: serde_json::Error) -> Self {
        CivicError::StoreUnavailable(format!("malformed row: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, CivicError>;
