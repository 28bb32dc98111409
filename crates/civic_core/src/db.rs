use crate::error::{CivicError, Result};
use crate::schema::{
    parse_timestamp, Assignment, Citizen, NewAssignment, NewCitizen, Officer, Report,
    ReportPriority, ReportStatus,
};
use crate::store::ReportStore;
use rusqlite::{params, Connection, OptionalExtension, Row};

const REPORT_COLUMNS: &str = "id, user_id, title, description, category, status, priority, \
     address, location_lat, location_lng, image_url, audio_url, created_at, updated_at, resolved_at";

const CITIZEN_COLUMNS: &str =
    "id, user_id, full_name, email, phone, address, created_at, updated_at";

/// SQLite-backed implementation of [`ReportStore`].
pub struct SqliteStore {
    conn: Connection,
}

pub fn open(db_path: &str) -> Result<SqliteStore> {
    let conn = Connection::open(db_path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    init(&conn)?;
    Ok(SqliteStore { conn })
}

pub fn open_in_memory() -> Result<SqliteStore> {
    let conn = Connection::open_in_memory()?;
    init(&conn)?;
    Ok(SqliteStore { conn })
}

fn init(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS civic_reports (
          id TEXT PRIMARY KEY,
          user_id TEXT NOT NULL,
          title TEXT NOT NULL,
          description TEXT NOT NULL,
          category TEXT NOT NULL,
          status TEXT NOT NULL DEFAULT 'pending',
          priority TEXT,
          address TEXT,
          location_lat REAL,
          location_lng REAL,
          image_url TEXT,
          audio_url TEXT,
          created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
          updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
          resolved_at TEXT,
          created_at_ns INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_civic_reports_created_at_ns ON civic_reports(created_at_ns);
        CREATE INDEX IF NOT EXISTS idx_civic_reports_status ON civic_reports(status);

        CREATE TABLE IF NOT EXISTS citizens (
          id TEXT PRIMARY KEY DEFAULT (lower(hex(randomblob(16)))),
          user_id TEXT NOT NULL UNIQUE,
          full_name TEXT NOT NULL,
          email TEXT NOT NULL,
          phone TEXT,
          address TEXT,
          created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
          updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now'))
        );

        CREATE TABLE IF NOT EXISTS officers (
          id TEXT PRIMARY KEY,
          name TEXT NOT NULL,
          department TEXT NOT NULL,
          specialization TEXT NOT NULL,
          phone TEXT,
          email TEXT,
          zone TEXT,
          available INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS assignments (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          report_id TEXT NOT NULL REFERENCES civic_reports(id),
          officer_id TEXT NOT NULL REFERENCES officers(id),
          notes TEXT NOT NULL,
          assigned_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now'))
        );

        CREATE INDEX IF NOT EXISTS idx_assignments_report_id ON assignments(report_id);
        "#,
    )?;
    Ok(())
}

impl SqliteStore {
    /// Writes a report row as-is, replacing any existing row with the same id.
    pub fn upsert_report(&self, report: &Report) -> Result<()> {
        write_report(&self.conn, report)
    }

    /// Imports reports in one transaction; either all rows land or none do.
    pub fn import_reports(&mut self, reports: &[Report]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        for report in reports {
            write_report(&tx, report)?;
        }
        tx.commit()?;
        Ok(reports.len())
    }

    pub fn upsert_officer(&self, officer: &Officer) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO officers (id, name, department, specialization, phone, email, zone, available)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
              name=excluded.name,
              department=excluded.department,
              specialization=excluded.specialization,
              phone=excluded.phone,
              email=excluded.email,
              zone=excluded.zone,
              available=excluded.available
            "#,
            params![
                officer.id,
                officer.name,
                officer.department,
                officer.specialization,
                officer.phone,
                officer.email,
                officer.zone,
                officer.available
            ],
        )?;
        Ok(())
    }

    pub fn assignments_for(&self, report_id: &str) -> Result<Vec<Assignment>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, report_id, officer_id, notes, assigned_at
            FROM assignments
            WHERE report_id = ?1
            ORDER BY id ASC
            "#,
        )?;
        let rows = stmt.query_map(params![report_id], assignment_from_row)?;
        collect_rows(rows)
    }
}

/// `created_at` as UTC nanoseconds; RFC 3339 text does not sort
/// chronologically across offsets or fractional precisions.
fn created_at_ns(report: &Report) -> Result<i64> {
    let created = parse_timestamp("created_at", &report.created_at)?;
    i64::try_from(created.unix_timestamp_nanos()).map_err(|_| CivicError::InvalidTimestamp {
        field: "created_at",
        value: report.created_at.clone(),
    })
}

fn write_report(conn: &Connection, report: &Report) -> Result<()> {
    let created_ns = created_at_ns(report)?;
    conn.execute(
        r#"
        INSERT INTO civic_reports (
          id, user_id, title, description, category, status, priority,
          address, location_lat, location_lng, image_url, audio_url,
          created_at, updated_at, resolved_at, created_at_ns
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
        ON CONFLICT(id) DO UPDATE SET
          user_id=excluded.user_id,
          title=excluded.title,
          description=excluded.description,
          category=excluded.category,
          status=excluded.status,
          priority=excluded.priority,
          address=excluded.address,
          location_lat=excluded.location_lat,
          location_lng=excluded.location_lng,
          image_url=excluded.image_url,
          audio_url=excluded.audio_url,
          created_at=excluded.created_at,
          updated_at=excluded.updated_at,
          resolved_at=excluded.resolved_at,
          created_at_ns=excluded.created_at_ns
        "#,
        params![
            report.id,
            report.user_id,
            report.title,
            report.description,
            report.category,
            report.status.as_str(),
            report.priority.as_ref().map(|p| p.as_str()),
            report.address,
            report.location_lat,
            report.location_lng,
            report.image_url,
            report.audio_url,
            report.created_at,
            report.updated_at,
            report.resolved_at,
            created_ns
        ],
    )?;
    Ok(())
}

impl ReportStore for SqliteStore {
    fn select_reports(&self, status: Option<&ReportStatus>) -> Result<Vec<Report>> {
        let reports = match status {
            Some(status) => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {REPORT_COLUMNS} FROM civic_reports WHERE status = ?1 \
                     ORDER BY created_at_ns DESC, id ASC"
                ))?;
                let rows = stmt.query_map(params![status.as_str()], report_from_row)?;
                collect_rows(rows)?
            }
            None => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {REPORT_COLUMNS} FROM civic_reports ORDER BY created_at_ns DESC, id ASC"
                ))?;
                let rows = stmt.query_map([], report_from_row)?;
                collect_rows(rows)?
            }
        };
        Ok(reports)
    }

    fn find_report(&self, id: &str) -> Result<Option<Report>> {
        let report = self
            .conn
            .query_row(
                &format!("SELECT {REPORT_COLUMNS} FROM civic_reports WHERE id = ?1"),
                params![id],
                report_from_row,
            )
            .optional()?;
        Ok(report)
    }

    fn select_citizens(&self) -> Result<Vec<Citizen>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CITIZEN_COLUMNS} FROM citizens \
             ORDER BY julianday(created_at) DESC, rowid DESC"
        ))?;
        let rows = stmt.query_map([], citizen_from_row)?;
        collect_rows(rows)
    }

    fn find_citizen(&self, user_id: &str) -> Result<Option<Citizen>> {
        let citizen = self
            .conn
            .query_row(
                &format!("SELECT {CITIZEN_COLUMNS} FROM citizens WHERE user_id = ?1"),
                params![user_id],
                citizen_from_row,
            )
            .optional()?;
        Ok(citizen)
    }

    fn insert_citizen_if_absent(&self, citizen: &NewCitizen) -> Result<bool> {
        let inserted = self.conn.execute(
            r#"
            INSERT INTO citizens (user_id, full_name, email, phone)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(user_id) DO NOTHING
            "#,
            params![
                citizen.user_id,
                citizen.full_name,
                citizen.email,
                citizen.phone
            ],
        )?;
        Ok(inserted == 1)
    }

    fn select_officers(&self) -> Result<Vec<Officer>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, name, department, specialization, phone, email, zone, available
            FROM officers
            ORDER BY name ASC
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Officer {
                id: row.get(0)?,
                name: row.get(1)?,
                department: row.get(2)?,
                specialization: row.get(3)?,
                phone: row.get(4)?,
                email: row.get(5)?,
                zone: row.get(6)?,
                available: row.get(7)?,
            })
        })?;
        collect_rows(rows)
    }

    fn insert_assignment(&self, assignment: &NewAssignment) -> Result<Assignment> {
        let stored = self.conn.query_row(
            r#"
            INSERT INTO assignments (report_id, officer_id, notes)
            VALUES (?1, ?2, ?3)
            RETURNING id, report_id, officer_id, notes, assigned_at
            "#,
            params![
                assignment.report_id,
                assignment.officer_id,
                assignment.notes
            ],
            assignment_from_row,
        )?;
        Ok(stored)
    }
}

fn report_from_row(row: &Row<'_>) -> rusqlite::Result<Report> {
    let status: String = row.get(5)?;
    let priority: Option<String> = row.get(6)?;
    Ok(Report {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        category: row.get(4)?,
        status: ReportStatus::parse(&status),
        priority: priority.as_deref().map(ReportPriority::parse),
        address: row.get(7)?,
        location_lat: row.get(8)?,
        location_lng: row.get(9)?,
        image_url: row.get(10)?,
        audio_url: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
        resolved_at: row.get(14)?,
    })
}

fn citizen_from_row(row: &Row<'_>) -> rusqlite::Result<Citizen> {
    Ok(Citizen {
        id: row.get(0)?,
        user_id: row.get(1)?,
        full_name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        address: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn assignment_from_row(row: &Row<'_>) -> rusqlite::Result<Assignment> {
    Ok(Assignment {
        id: row.get(0)?,
        report_id: row.get(1)?,
        officer_id: row.get(2)?,
        notes: row.get(3)?,
        assigned_at: row.get(4)?,
    })
}

/// Materializes every row or fails as a whole.
fn collect_rows<T>(rows: impl Iterator<Item = rusqlite::Result<T>>) -> Result<Vec<T>> {
    rows.collect::<rusqlite::Result<Vec<T>>>()
        .map_err(CivicError::from)
}
