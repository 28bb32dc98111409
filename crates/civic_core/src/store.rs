use crate::cancel::CancelFlag;
use crate::error::{CivicError, Result};
use crate::schema::{Assignment, Citizen, NewAssignment, NewCitizen, Officer, Report, ReportStatus};

/// Typed query interface over the backing data store.
///
/// Implementations must return whole result sets or an error, never a
/// partially read one.
pub trait ReportStore {
    /// Reports ordered newest `created_at` first, optionally narrowed to one status.
    fn select_reports(&self, status: Option<&ReportStatus>) -> Result<Vec<Report>>;

    fn find_report(&self, id: &str) -> Result<Option<Report>>;

    /// Citizens ordered newest `created_at` first.
    fn select_citizens(&self) -> Result<Vec<Citizen>>;

    fn find_citizen(&self, user_id: &str) -> Result<Option<Citizen>>;

    /// Inserts the citizen unless one with the same `user_id` exists.
    /// Returns `true` when a row was written. Must be atomic on `user_id`.
    fn insert_citizen_if_absent(&self, citizen: &NewCitizen) -> Result<bool>;

    fn select_officers(&self) -> Result<Vec<Officer>>;

    fn insert_assignment(&self, assignment: &NewAssignment) -> Result<Assignment>;
}

/// Read access to reports through an injected store.
pub struct ReportAccessor<S> {
    store: S,
}

impl<S: ReportStore> ReportAccessor<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Lists reports newest first. `status` narrows to one lifecycle stage.
    ///
    /// The cancel flag is checked before the store call and again before the
    /// rows are handed back, so a cancelled call yields no data.
    pub fn list_reports(
        &self,
        status: Option<&ReportStatus>,
        cancel: Option<&CancelFlag>,
    ) -> Result<Vec<Report>> {
        check_cancel(cancel)?;
        tracing::debug!(status = status.map(|s| s.as_str()), "listing reports");

        let reports = self.store.select_reports(status).map_err(|err| {
            tracing::error!(error = %err, "report query failed");
            match err {
                CivicError::StoreUnavailable(_) => err,
                other => CivicError::StoreUnavailable(other.to_string()),
            }
        })?;

        check_cancel(cancel)?;
        tracing::debug!(count = reports.len(), "reports loaded");
        Ok(reports)
    }

    pub fn list_all(&self, cancel: Option<&CancelFlag>) -> Result<Vec<Report>> {
        self.list_reports(None, cancel)
    }

    pub fn list_by_status(
        &self,
        status: &ReportStatus,
        cancel: Option<&CancelFlag>,
    ) -> Result<Vec<Report>> {
        self.list_reports(Some(status), cancel)
    }
}

fn check_cancel(cancel: Option<&CancelFlag>) -> Result<()> {
    match cancel {
        Some(flag) if flag.is_cancelled() => Err(CivicError::Cancelled),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Store double that fails every call, or cancels the caller mid-query.
    struct StubStore {
        fail: bool,
        cancel_during_query: Option<CancelFlag>,
        calls: Cell<usize>,
    }

    impl StubStore {
        fn new() -> Self {
            Self {
                fail: false,
                cancel_during_query: None,
                calls: Cell::new(0),
            }
        }
    }

    fn report(id: &str, status: &str) -> Report {
        Report {
            id: id.to_string(),
            user_id: "u1".to_string(),
            title: format!("Report {id}"),
            description: String::new(),
            category: "Road Infrastructure".to_string(),
            status: ReportStatus::parse(status),
            priority: None,
            address: None,
            location_lat: None,
            location_lng: None,
            image_url: None,
            audio_url: None,
            created_at: "2024-01-15T10:00:00Z".to_string(),
            updated_at: "2024-01-15T10:00:00Z".to_string(),
            resolved_at: None,
        }
    }

    impl ReportStore for StubStore {
        fn select_reports(&self, status: Option<&ReportStatus>) -> Result<Vec<Report>> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(CivicError::StoreUnavailable("connection refused".to_string()));
            }
            if let Some(flag) = &self.cancel_during_query {
                flag.cancel();
            }
            let rows = vec![report("a", "pending"), report("b", "resolved")];
            Ok(rows
                .into_iter()
                .filter(|r| status.is_none_or(|s| &r.status == s))
                .collect())
        }

        fn find_report(&self, _id: &str) -> Result<Option<Report>> {
            Ok(None)
        }

        fn select_citizens(&self) -> Result<Vec<Citizen>> {
            Ok(Vec::new())
        }

        fn find_citizen(&self, _user_id: &str) -> Result<Option<Citizen>> {
            Ok(None)
        }

        fn insert_citizen_if_absent(&self, _citizen: &NewCitizen) -> Result<bool> {
            Ok(false)
        }

        fn select_officers(&self) -> Result<Vec<Officer>> {
            Ok(Vec::new())
        }

        fn insert_assignment(&self, _assignment: &NewAssignment) -> Result<Assignment> {
            Err(CivicError::StoreUnavailable("read-only".to_string()))
        }
    }

    #[test]
    fn store_failure_surfaces_as_store_unavailable() {
        let accessor = ReportAccessor::new(StubStore {
            fail: true,
            ..StubStore::new()
        });
        let err = accessor.list_all(None).unwrap_err();
        assert!(matches!(err, CivicError::StoreUnavailable(msg) if msg.contains("refused")));
    }

    #[test]
    fn status_filter_is_forwarded() {
        let accessor = ReportAccessor::new(StubStore::new());
        let resolved = accessor
            .list_by_status(&ReportStatus::Resolved, None)
            .unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].id, "b");
    }

    #[test]
    fn cancelled_before_call_skips_the_store() {
        let accessor = ReportAccessor::new(StubStore::new());
        let flag = CancelFlag::new();
        flag.cancel();
        assert!(matches!(
            accessor.list_all(Some(&flag)),
            Err(CivicError::Cancelled)
        ));
        assert_eq!(accessor.store().calls.get(), 0);
    }

    #[test]
    fn cancelled_during_call_discards_rows() {
        let flag = CancelFlag::new();
        let accessor = ReportAccessor::new(StubStore {
            cancel_during_query: Some(flag.clone()),
            ..StubStore::new()
        });
        assert!(matches!(
            accessor.list_all(Some(&flag)),
            Err(CivicError::Cancelled)
        ));
        assert_eq!(accessor.store().calls.get(), 1);
    }
}
