use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;

use crate::catalog::StoreType;
use crate::pipeline::PipelineOutput;

const DB_PATH: &str = "data/halal.sqlite";

pub fn connect() -> Result<Connection> {
    let conn = Connection::open(DB_PATH)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS stores (
            source_id       TEXT PRIMARY KEY,
            source_type     TEXT NOT NULL,
            name            TEXT NOT NULL,
            store_type      TEXT NOT NULL CHECK(store_type IN
                ('butcher','restaurant','wholesaler','abattoir','supermarket','other')),
            address         TEXT,
            city            TEXT NOT NULL,
            postal_code     TEXT,
            country         TEXT NOT NULL,
            latitude        REAL NOT NULL,
            longitude       REAL NOT NULL,
            phone           TEXT,
            email           TEXT,
            website         TEXT,
            logo_url        TEXT,
            halal_certified BOOLEAN NOT NULL DEFAULT 1,
            certifier_code  TEXT NOT NULL,
            certifier_name  TEXT NOT NULL,
            description     TEXT,
            raw             TEXT,
            active          BOOLEAN NOT NULL DEFAULT 1,
            updated_at      TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_stores_type ON stores(store_type);
        CREATE INDEX IF NOT EXISTS idx_stores_city ON stores(city);
        CREATE INDEX IF NOT EXISTS idx_stores_active ON stores(active);

        CREATE TABLE IF NOT EXISTS opening_hours (
            id          INTEGER PRIMARY KEY,
            source_id   TEXT NOT NULL REFERENCES stores(source_id),
            day_of_week INTEGER NOT NULL CHECK(day_of_week BETWEEN 0 AND 6),
            open_time   TEXT,
            close_time  TEXT,
            is_closed   BOOLEAN NOT NULL DEFAULT 0,
            UNIQUE(source_id, day_of_week)
        );
        CREATE INDEX IF NOT EXISTS idx_hours_source ON opening_hours(source_id);

        CREATE TABLE IF NOT EXISTS ingest_runs (
            id      INTEGER PRIMARY KEY,
            ran_at  TEXT NOT NULL,
            stores  INTEGER NOT NULL,
            hours   INTEGER NOT NULL,
            dropped INTEGER NOT NULL,
            stats   TEXT NOT NULL
        );
        ",
    )?;
    Ok(())
}

/// Upsert the catalog: stores keyed by `source_id`, each store's hours
/// replaced wholesale so rows the pipeline no longer emits disappear.
pub fn save_catalog(conn: &Connection, output: &PipelineOutput) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    let tx = conn.unchecked_transaction()?;
    {
        let mut store_stmt = tx.prepare(
            "INSERT OR REPLACE INTO stores
             (source_id, source_type, name, store_type, address, city, postal_code,
              country, latitude, longitude, phone, email, website, logo_url,
              halal_certified, certifier_code, certifier_name, description, raw,
              active, updated_at)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19,?20,?21)",
        )?;
        let mut clear_stmt = tx.prepare("DELETE FROM opening_hours WHERE source_id = ?1")?;
        let mut hour_stmt = tx.prepare(
            "INSERT INTO opening_hours (source_id, day_of_week, open_time, close_time, is_closed)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;

        for store in &output.stores {
            // Hours go first: replacing a store row deletes it under the
            // hood, which the foreign key forbids while hours still point
            // at it.
            clear_stmt.execute(rusqlite::params![store.source_id])?;
            store_stmt.execute(rusqlite::params![
                store.source_id,
                store.source_type,
                store.name,
                store.store_type.as_str(),
                store.address,
                store.city,
                store.postal_code,
                store.country,
                store.latitude,
                store.longitude,
                store.phone,
                store.email,
                store.website,
                store.logo_url,
                store.halal_certified,
                store.certifier_code,
                store.certifier_name,
                store.description,
                serde_json::to_string(&store.raw)?,
                store.active,
                now,
            ])?;
        }
        for hour in &output.hours {
            hour_stmt.execute(rusqlite::params![
                hour.source_id,
                hour.day_of_week,
                hour.open_time,
                hour.close_time,
                hour.is_closed,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// Flag stale stores instead of deleting them, so consumers can tell "gone
/// upstream" from "never existed". Returns how many rows were retired.
pub fn retire_dropped(conn: &Connection, source_ids: &[String]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare("UPDATE stores SET active = 0 WHERE source_id = ?1")?;
        for id in source_ids {
            count += stmt.execute(rusqlite::params![id])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

pub fn record_run(conn: &Connection, output: &PipelineOutput) -> Result<()> {
    conn.execute(
        "INSERT INTO ingest_runs (ran_at, stores, hours, dropped, stats)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            Utc::now().to_rfc3339(),
            output.stores.len(),
            output.hours.len(),
            output.dropped_source_ids.len(),
            serde_json::to_string(&output.stats)?,
        ],
    )?;
    Ok(())
}

// ── Overview ──

pub struct OverviewRow {
    pub name: String,
    pub store_type: String,
    pub city: String,
    pub postal_code: String,
    pub certifier_code: String,
    pub phone: String,
    pub hour_count: i64,
    pub active: bool,
}

pub fn fetch_overview(
    conn: &Connection,
    store_type: Option<StoreType>,
    city: Option<&str>,
    limit: usize,
) -> Result<Vec<OverviewRow>> {
    let mut conditions = Vec::new();
    let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(t) = store_type {
        conditions.push(format!("s.store_type = ?{}", params.len() + 1));
        params.push(Box::new(t.as_str().to_string()));
    }
    if let Some(c) = city {
        conditions.push(format!("s.city = ?{} COLLATE NOCASE", params.len() + 1));
        params.push(Box::new(c.to_string()));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let sql = format!(
        "SELECT s.name, s.store_type, s.city, COALESCE(s.postal_code,''),
                s.certifier_code, COALESCE(s.phone,''),
                (SELECT COUNT(*) FROM opening_hours h WHERE h.source_id = s.source_id),
                s.active
         FROM stores s{}
         ORDER BY s.city, s.name
         LIMIT {}",
        where_clause, limit
    );

    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let rows = stmt
        .query_map(param_refs.as_slice(), |row| {
            Ok(OverviewRow {
                name: row.get(0)?,
                store_type: row.get(1)?,
                city: row.get(2)?,
                postal_code: row.get(3)?,
                certifier_code: row.get(4)?,
                phone: row.get(5)?,
                hour_count: row.get(6)?,
                active: row.get(7)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct DbStats {
    pub stores: usize,
    pub active: usize,
    pub avs: usize,
    pub achahada: usize,
    pub hours: usize,
    pub last_run: Option<String>,
}

pub fn get_stats(conn: &Connection) -> Result<DbStats> {
    let stores: usize = conn.query_row("SELECT COUNT(*) FROM stores", [], |r| r.get(0))?;
    let active: usize =
        conn.query_row("SELECT COUNT(*) FROM stores WHERE active = 1", [], |r| r.get(0))?;
    let avs: usize = conn.query_row(
        "SELECT COUNT(*) FROM stores WHERE certifier_code = 'avs'",
        [],
        |r| r.get(0),
    )?;
    let achahada: usize = conn.query_row(
        "SELECT COUNT(*) FROM stores WHERE certifier_code = 'achahada'",
        [],
        |r| r.get(0),
    )?;
    let hours: usize = conn.query_row("SELECT COUNT(*) FROM opening_hours", [], |r| r.get(0))?;
    let last_run: Option<String> = conn
        .query_row(
            "SELECT ran_at FROM ingest_runs ORDER BY id DESC LIMIT 1",
            [],
            |r| r.get(0),
        )
        .ok();
    Ok(DbStats {
        stores,
        active,
        avs,
        achahada,
        hours,
        last_run,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::Path;

    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::feeds::{load_feeds, DirectoryBundle, FeedSet};
    use crate::pipeline;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn save_is_idempotent_per_source_id() {
        let conn = memory_db();
        let feeds = load_feeds(Path::new("tests/fixtures")).unwrap();
        let output = pipeline::run(&feeds);

        save_catalog(&conn, &output).unwrap();
        save_catalog(&conn, &output).unwrap();

        let stats = get_stats(&conn).unwrap();
        assert_eq!(stats.stores, output.stores.len());
        assert_eq!(stats.hours, output.hours.len());
    }

    #[test]
    fn retire_flags_without_deleting() {
        let conn = memory_db();
        let feeds = load_feeds(Path::new("tests/fixtures")).unwrap();
        let output = pipeline::run(&feeds);
        save_catalog(&conn, &output).unwrap();

        let id = output.stores[0].source_id.clone();
        let retired = retire_dropped(&conn, &[id]).unwrap();
        assert_eq!(retired, 1);

        let stats = get_stats(&conn).unwrap();
        assert_eq!(stats.stores, output.stores.len());
        assert_eq!(stats.active, output.stores.len() - 1);
    }

    #[test]
    fn overview_filters_by_type() {
        let conn = memory_db();
        let feeds = load_feeds(Path::new("tests/fixtures")).unwrap();
        let output = pipeline::run(&feeds);
        save_catalog(&conn, &output).unwrap();

        let rows = fetch_overview(&conn, Some(StoreType::Abattoir), None, 50).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].store_type, "abattoir");
    }

    #[test]
    fn repeated_day_in_feed_still_saves() {
        // An upstream hours table repeating a weekday must not trip the
        // one-row-per-day uniqueness constraint.
        let entry = serde_json::from_value(json!({
            "id": "501",
            "name": "Boucherie du Canal",
            "latitude": "48.88",
            "longitude": "2.37",
            "hoursHtml": "<tr><td>Monday</td><td>9:00 AM - 1:00 PM</td></tr>\
                          <tr><td>Monday</td><td>3:00 PM - 7:00 PM</td></tr>",
        }))
        .unwrap();
        let feeds = FeedSet {
            butchers: vec![],
            restaurants: vec![],
            wholesalers: vec![],
            abattoirs: vec![],
            directory: DirectoryBundle {
                entries: vec![entry],
                categories: HashMap::new(),
                fetched_at: Utc::now(),
            },
            logos: HashMap::new(),
        };
        let output = pipeline::run(&feeds);
        assert_eq!(output.hours.len(), 1);

        let conn = memory_db();
        save_catalog(&conn, &output).unwrap();
        let stats = get_stats(&conn).unwrap();
        assert_eq!(stats.hours, 1);
    }

    #[test]
    fn run_log_records_stats() {
        let conn = memory_db();
        let feeds = load_feeds(Path::new("tests/fixtures")).unwrap();
        let output = pipeline::run(&feeds);
        record_run(&conn, &output).unwrap();

        let stats = get_stats(&conn).unwrap();
        assert!(stats.last_run.is_some());
    }
}
