use crate::citizens::{ensure_citizen, CitizenSync, Identity};
use crate::db::{self, SqliteStore};
use crate::display::to_display;
use crate::error::CivicError;
use crate::filter::{filter_reports, ReportQuery};
use crate::officers::assign_officer;
use crate::schema::{Officer, Report, ReportPriority, ReportStatus};
use crate::stats::{aggregate, summarize};
use crate::store::{ReportAccessor, ReportStore};
use tempfile::TempDir;

fn setup() -> (TempDir, SqliteStore) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("civic.db");
    let store = db::open(path.to_str().unwrap()).unwrap();
    (dir, store)
}

fn make_report(id: &str, status: &str, created_at: &str) -> Report {
    Report {
        id: id.to_string(),
        user_id: "user_rajesh".to_string(),
        title: format!("Report {id}"),
        description: "Reported from the field".to_string(),
        category: "Road Infrastructure".to_string(),
        status: ReportStatus::parse(status),
        priority: Some(ReportPriority::High),
        address: None,
        location_lat: None,
        location_lng: None,
        image_url: None,
        audio_url: None,
        created_at: created_at.to_string(),
        updated_at: created_at.to_string(),
        resolved_at: None,
    }
}

fn officer(id: &str, name: &str) -> Officer {
    Officer {
        id: id.to_string(),
        name: name.to_string(),
        department: "PWD Team A".to_string(),
        specialization: "Road Infrastructure".to_string(),
        phone: None,
        email: None,
        zone: Some("Ranchi Zone".to_string()),
        available: true,
    }
}

fn seeded() -> (TempDir, SqliteStore) {
    let (dir, mut store) = setup();
    store
        .import_reports(&[
            make_report("RPT001", "in_progress", "2024-01-15T10:00:00Z"),
            make_report("RPT002", "pending", "2024-01-14T10:00:00Z"),
            make_report("RPT003", "resolved", "2024-01-12T10:00:00Z"),
            make_report("RPT004", "pending", "2024-01-13T10:00:00Z"),
        ])
        .unwrap();
    (dir, store)
}

#[test]
fn list_reports_newest_first() {
    let (_dir, store) = seeded();
    let accessor = ReportAccessor::new(store);

    let all = accessor.list_all(None).unwrap();
    let ids: Vec<&str> = all.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["RPT001", "RPT002", "RPT004", "RPT003"]);
}

#[test]
fn newest_first_across_offsets_and_precision() {
    let (_dir, mut store) = setup();
    store
        .import_reports(&[
            make_report("IST", "pending", "2024-01-15T12:00:00+05:30"),
            make_report("Z", "pending", "2024-01-15T10:00:00Z"),
            make_report("FRAC", "pending", "2024-01-15T10:00:00.500Z"),
            make_report("WEST", "pending", "2024-01-15T09:59:59.999-00:30"),
        ])
        .unwrap();
    let accessor = ReportAccessor::new(store);

    let all = accessor.list_all(None).unwrap();
    let ids: Vec<&str> = all.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["WEST", "FRAC", "Z", "IST"]);
    assert_eq!(all[3].created_at, "2024-01-15T12:00:00+05:30");

    let pending = accessor
        .list_by_status(&ReportStatus::Pending, None)
        .unwrap();
    let ids: Vec<&str> = pending.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["WEST", "FRAC", "Z", "IST"]);
}

#[test]
fn import_rejects_unparseable_created_at() {
    let (_dir, mut store) = setup();
    let result = store.import_reports(&[
        make_report("RPT001", "pending", "2024-01-15T10:00:00Z"),
        make_report("RPT002", "pending", "15 Jan 2024"),
    ]);
    assert!(matches!(
        result,
        Err(CivicError::InvalidTimestamp { field: "created_at", value }) if value == "15 Jan 2024"
    ));
    assert!(store.select_reports(None).unwrap().is_empty());
}

#[test]
fn citizens_newest_first() {
    let (_dir, store) = setup();
    for user_id in ["user_first", "user_second", "user_third"] {
        let identity = Identity {
            user_id: user_id.to_string(),
            full_name: Some(user_id.to_string()),
            ..Identity::default()
        };
        ensure_citizen(&store, Some(&identity)).unwrap();
    }
    let order: Vec<String> = store
        .select_citizens()
        .unwrap()
        .into_iter()
        .map(|c| c.user_id)
        .collect();
    assert_eq!(order, vec!["user_third", "user_second", "user_first"]);
}

#[test]
fn list_reports_by_status() {
    let (_dir, store) = seeded();
    let accessor = ReportAccessor::new(store);

    let pending = accessor
        .list_by_status(&ReportStatus::Pending, None)
        .unwrap();
    let ids: Vec<&str> = pending.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["RPT002", "RPT004"]);

    let none = accessor
        .list_by_status(&ReportStatus::Unknown("archived".to_string()), None)
        .unwrap();
    assert!(none.is_empty());
}

#[test]
fn unknown_rows_round_trip_through_the_store() {
    let (_dir, store) = setup();
    let mut odd = make_report("RPT009", "submitted", "2024-01-16T10:00:00Z");
    odd.priority = Some(ReportPriority::parse("urgent"));
    store.upsert_report(&odd).unwrap();

    let loaded = store.find_report("RPT009").unwrap().unwrap();
    assert_eq!(loaded.status, ReportStatus::Unknown("submitted".to_string()));
    assert_eq!(loaded.priority, Some(ReportPriority::Unknown("urgent".to_string())));

    let stats = aggregate(&[loaded.clone()]);
    assert_eq!((stats.total, stats.other), (1, 1));
    assert_eq!(to_display(&loaded).anomalies.len(), 2);
}

#[test]
fn fetch_then_derive() {
    let (_dir, store) = seeded();
    let accessor = ReportAccessor::new(store);
    let reports = accessor.list_all(None).unwrap();

    let summary = summarize(&reports, 3);
    assert_eq!(summary.stats.total, 4);
    assert_eq!(summary.stats.pending, 2);
    assert_eq!(summary.stats.in_progress, 1);
    assert_eq!(summary.stats.resolved, 1);
    assert_eq!(summary.resolution_rate, 25.0);
    assert_eq!(summary.high_priority_pending, 2);
    assert_eq!(summary.recent.len(), 3);
    assert_eq!(summary.recent[0].location, "Unknown location");

    let query = ReportQuery::default().status(ReportStatus::Pending);
    assert_eq!(filter_reports(&reports, &query).len(), 2);
}

#[test]
fn ensure_citizen_is_idempotent() {
    let (_dir, store) = setup();
    let identity = Identity {
        user_id: "user_priya".to_string(),
        first_name: Some("Priya".to_string()),
        last_name: Some("Sharma".to_string()),
        emails: vec!["priya@example.in".to_string()],
        phones: vec!["+91 9876543211".to_string()],
        ..Identity::default()
    };

    assert_eq!(
        ensure_citizen(&store, Some(&identity)).unwrap(),
        CitizenSync::Created
    );
    assert_eq!(
        ensure_citizen(&store, Some(&identity)).unwrap(),
        CitizenSync::AlreadyPresent
    );

    let citizens = store.select_citizens().unwrap();
    assert_eq!(citizens.len(), 1);
    assert_eq!(citizens[0].full_name, "Priya Sharma");
    assert_eq!(citizens[0].phone.as_deref(), Some("+91 9876543211"));
    assert!(!citizens[0].id.is_empty());
}

#[test]
fn ensure_citizen_without_identity_writes_nothing() {
    let (_dir, store) = setup();
    assert_eq!(
        ensure_citizen(&store, None).unwrap(),
        CitizenSync::NoIdentity
    );
    assert!(store.select_citizens().unwrap().is_empty());
}

#[test]
fn existing_citizen_is_not_overwritten() {
    let (_dir, store) = setup();
    let first = Identity {
        user_id: "user_amit".to_string(),
        full_name: Some("Amit Singh".to_string()),
        ..Identity::default()
    };
    let renamed = Identity {
        full_name: Some("A. Singh".to_string()),
        ..first.clone()
    };
    ensure_citizen(&store, Some(&first)).unwrap();
    ensure_citizen(&store, Some(&renamed)).unwrap();

    let citizen = store.find_citizen("user_amit").unwrap().unwrap();
    assert_eq!(citizen.full_name, "Amit Singh");
}

#[test]
fn assign_officer_to_open_report() {
    let (_dir, store) = seeded();
    store.upsert_officer(&officer("OFF001", "Rajesh Kumar Singh")).unwrap();

    let assignment = assign_officer(&store, "RPT002", "OFF001", "Inspect today").unwrap();
    assert_eq!(assignment.report_id, "RPT002");
    assert_eq!(assignment.officer_id, "OFF001");
    assert!(!assignment.assigned_at.is_empty());

    let history = store.assignments_for("RPT002").unwrap();
    assert_eq!(history, vec![assignment]);
}

#[test]
fn assign_officer_rejects_resolved_and_missing() {
    let (_dir, store) = seeded();
    store.upsert_officer(&officer("OFF001", "Rajesh Kumar Singh")).unwrap();

    assert!(matches!(
        assign_officer(&store, "RPT003", "OFF001", ""),
        Err(CivicError::ReportClosed(id)) if id == "RPT003"
    ));
    assert!(matches!(
        assign_officer(&store, "RPT404", "OFF001", ""),
        Err(CivicError::NotFound { entity: "report", .. })
    ));
    assert!(matches!(
        assign_officer(&store, "RPT002", "OFF999", ""),
        Err(CivicError::NotFound { entity: "officer", .. })
    ));
    assert!(store.assignments_for("RPT002").unwrap().is_empty());
}

#[test]
fn officers_sorted_by_name() {
    let (_dir, store) = setup();
    store.upsert_officer(&officer("OFF002", "Priya Sharma")).unwrap();
    store.upsert_officer(&officer("OFF003", "Amit Verma")).unwrap();

    let names: Vec<String> = store
        .select_officers()
        .unwrap()
        .into_iter()
        .map(|o| o.name)
        .collect();
    assert_eq!(names, vec!["Amit Verma", "Priya Sharma"]);
}

#[test]
fn in_memory_store_has_schema() {
    let store = db::open_in_memory().unwrap();
    assert!(store.select_reports(None).unwrap().is_empty());
}
