// 💾 Storage Adapter - SQLite tables and CSV import for the rental dataset
//
// The reporting core never touches SQLite. This module only moves data
// between CSV files, the database, and an in-memory Snapshot:
//
//   CSV dir ──load_csv_dir──▶ Snapshot ──insert_snapshot──▶ SQLite
//   SQLite  ──load_snapshot──▶ Snapshot ──▶ ReportCatalog
//
// Foreign keys are declared but not enforced (PRAGMA foreign_keys is
// switched off), so rows with referential gaps still import and show up as NULLs
// in left-outer joins.

use crate::entities::{Bike, BikeStatus, Customer, Entity, Membership, MembershipType, Rental};
use crate::store::Snapshot;
use crate::value::{DATE_FORMAT, TIMESTAMP_FORMAT};
use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

/// Outcome of writing a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    pub inserted: usize,
    /// Rows rejected by a PRIMARY KEY or CHECK constraint, never by a
    /// dangling reference
    pub skipped: usize,
}

impl ImportStats {
    fn record(&mut self, result: rusqlite::Result<usize>) -> Result<()> {
        match result {
            Ok(_) => self.inserted += 1,
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                self.skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }
}

/// Open (or create) a database file with the schema in place.
pub fn open_database<P: AsRef<Path>>(path: P) -> Result<Connection> {
    let conn = Connection::open(path.as_ref())
        .with_context(|| format!("Failed to open database: {:?}", path.as_ref()))?;
    setup_database(&conn)?;
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;
    // Bundled SQLite enforces REFERENCES; gaps must still import
    conn.pragma_update(None, "foreign_keys", "OFF")?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS customer (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS bike (
            id INTEGER PRIMARY KEY,
            model TEXT NOT NULL,
            category TEXT NOT NULL,
            price_per_hour REAL NOT NULL CHECK (price_per_hour >= 0),
            price_per_day REAL NOT NULL CHECK (price_per_day >= 0),
            status TEXT NOT NULL CHECK (status IN ('available', 'rented', 'out of service'))
        );

        CREATE TABLE IF NOT EXISTS rental (
            id INTEGER PRIMARY KEY,
            customer_id INTEGER NOT NULL REFERENCES customer(id),
            bike_id INTEGER NOT NULL REFERENCES bike(id),
            start_timestamp TEXT NOT NULL,
            duration INTEGER NOT NULL CHECK (duration > 0),
            total_paid REAL NOT NULL CHECK (total_paid >= 0)
        );

        CREATE TABLE IF NOT EXISTS membership_type (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            price REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS membership (
            id INTEGER PRIMARY KEY,
            membership_type_id INTEGER NOT NULL REFERENCES membership_type(id),
            customer_id INTEGER NOT NULL REFERENCES customer(id),
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL CHECK (end_date >= start_date),
            total_paid REAL NOT NULL CHECK (total_paid >= 0)
        );

        CREATE INDEX IF NOT EXISTS idx_rental_customer ON rental(customer_id);
        CREATE INDEX IF NOT EXISTS idx_membership_customer ON membership(customer_id);",
    )
    .context("Failed to create rental schema")?;

    Ok(())
}

// ============================================================================
// WRITE
// ============================================================================

/// Write every row of `snapshot` in one transaction. Re-importing the
/// same data is a no-op: existing ids are skipped.
pub fn insert_snapshot(conn: &Connection, snapshot: &Snapshot) -> Result<ImportStats> {
    let tx = conn.unchecked_transaction()?;
    let mut stats = ImportStats::default();

    for c in &snapshot.customers {
        stats.record(tx.execute(
            "INSERT INTO customer (id, name, email) VALUES (?1, ?2, ?3)",
            params![c.id, c.name, c.email],
        ))?;
    }

    for b in &snapshot.bikes {
        stats.record(tx.execute(
            "INSERT INTO bike (id, model, category, price_per_hour, price_per_day, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![b.id, b.model, b.category, b.price_per_hour, b.price_per_day, b.status.as_str()],
        ))?;
    }

    for r in &snapshot.rentals {
        stats.record(tx.execute(
            "INSERT INTO rental (id, customer_id, bike_id, start_timestamp, duration, total_paid)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                r.id,
                r.customer_id,
                r.bike_id,
                r.start_timestamp.format(TIMESTAMP_FORMAT).to_string(),
                r.duration,
                r.total_paid,
            ],
        ))?;
    }

    for t in &snapshot.membership_types {
        stats.record(tx.execute(
            "INSERT INTO membership_type (id, name, description, price) VALUES (?1, ?2, ?3, ?4)",
            params![t.id, t.name, t.description, t.price],
        ))?;
    }

    for m in &snapshot.memberships {
        stats.record(tx.execute(
            "INSERT INTO membership (id, membership_type_id, customer_id, start_date, end_date, total_paid)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                m.id,
                m.membership_type_id,
                m.customer_id,
                m.start_date.format(DATE_FORMAT).to_string(),
                m.end_date.format(DATE_FORMAT).to_string(),
                m.total_paid,
            ],
        ))?;
    }

    tx.commit().context("Failed to commit snapshot import")?;

    info!(inserted = stats.inserted, skipped = stats.skipped, "snapshot written");
    Ok(stats)
}

// ============================================================================
// READ
// ============================================================================

/// Read the five tables into an in-memory snapshot, ordered by id.
pub fn load_snapshot(conn: &Connection) -> Result<Snapshot> {
    let customers = conn
        .prepare("SELECT id, name, email FROM customer ORDER BY id")?
        .query_map([], |row| Ok(Customer { id: row.get(0)?, name: row.get(1)?, email: row.get(2)? }))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to read customers")?;

    let bikes = conn
        .prepare("SELECT id, model, category, price_per_hour, price_per_day, status FROM bike ORDER BY id")?
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to read bikes")?
        .into_iter()
        .map(|(id, model, category, price_per_hour, price_per_day, status)| -> Result<Bike> {
            let status = BikeStatus::parse(&status)
                .ok_or_else(|| anyhow!("bike {}: unknown status '{}'", id, status))?;
            Ok(Bike { id, model, category, price_per_hour, price_per_day, status })
        })
        .collect::<Result<Vec<_>>>()?;

    let rentals = conn
        .prepare("SELECT id, customer_id, bike_id, start_timestamp, duration, total_paid FROM rental ORDER BY id")?
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, f64>(5)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to read rentals")?
        .into_iter()
        .map(|(id, customer_id, bike_id, start, duration, total_paid)| -> Result<Rental> {
            let start_timestamp = NaiveDateTime::parse_from_str(&start, TIMESTAMP_FORMAT)
                .with_context(|| format!("rental {}: bad start_timestamp '{}'", id, start))?;
            Ok(Rental { id, customer_id, bike_id, start_timestamp, duration, total_paid })
        })
        .collect::<Result<Vec<_>>>()?;

    let membership_types = conn
        .prepare("SELECT id, name, description, price FROM membership_type ORDER BY id")?
        .query_map([], |row| {
            Ok(MembershipType {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                price: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to read membership types")?;

    let memberships = conn
        .prepare(
            "SELECT id, membership_type_id, customer_id, start_date, end_date, total_paid
             FROM membership ORDER BY id",
        )?
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, f64>(5)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to read memberships")?
        .into_iter()
        .map(|(id, membership_type_id, customer_id, start, end, total_paid)| -> Result<Membership> {
            let parse = |raw: &str| {
                NaiveDate::parse_from_str(raw, DATE_FORMAT)
                    .with_context(|| format!("membership {}: bad date '{}'", id, raw))
            };
            Ok(Membership {
                id,
                membership_type_id,
                customer_id,
                start_date: parse(&start)?,
                end_date: parse(&end)?,
                total_paid,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let snapshot = Snapshot { customers, bikes, rentals, membership_types, memberships };
    log_findings(&snapshot);
    Ok(snapshot)
}

/// Surface data-quality findings without failing the load.
pub fn log_findings(snapshot: &Snapshot) {
    let issues = snapshot.validate();
    let gaps = snapshot.referential_gaps();
    if !issues.is_empty() || !gaps.is_empty() {
        warn!(
            issues = issues.len(),
            referential_gaps = gaps.len(),
            "snapshot has data-quality findings (run `bike-reports check` for details)"
        );
    }
}

pub fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    if !Snapshot::RELATIONS.contains(&table) {
        return Err(anyhow!("unknown table: {}", table));
    }
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
    Ok(count)
}

// ============================================================================
// CSV
// ============================================================================

fn read_csv<E: Entity + DeserializeOwned>(dir: &Path) -> Result<Vec<E>> {
    let path = dir.join(format!("{}.csv", E::RELATION));
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(&path)
        .with_context(|| format!("Failed to open CSV file: {:?}", path))?;

    let mut rows = Vec::new();
    for (line, result) in rdr.deserialize().enumerate() {
        // header is line 1
        let row: E = result.with_context(|| format!("Failed to parse {:?} line {}", path, line + 2))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Read `customer.csv`, `bike.csv`, `rental.csv`, `membership_type.csv`
/// and `membership.csv` from `dir`. Headers are the column names.
pub fn load_csv_dir<P: AsRef<Path>>(dir: P) -> Result<Snapshot> {
    let dir = dir.as_ref();
    Ok(Snapshot {
        customers: read_csv(dir)?,
        bikes: read_csv(dir)?,
        rentals: read_csv(dir)?,
        membership_types: read_csv(dir)?,
        memberships: read_csv(dir)?,
    })
}
