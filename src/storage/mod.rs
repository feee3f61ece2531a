//! SQLite storage layer -- schema, queries, source implementations.

pub mod schema;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use r2d2::Pool as R2D2Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

use crate::metrics::{MetricRecord, MetricSource, ProblemRecord, ProblemSource, CORRECTED_STATUSES};

/// Connection Pool type
pub type Pool = R2D2Pool<SqliteConnectionManager>;

/// Open (or create) the SQLite database and return a connection pool.
pub fn open_pool(path: &str) -> Result<Pool> {
    let manager = SqliteConnectionManager::file(path).with_init(|c| {
        c.execute_batch(
            "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA temp_store = MEMORY;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
        )
    });

    let pool = R2D2Pool::new(manager)?;

    // Run migrations on a single connection
    let conn = pool.get()?;
    schema::migrate(&conn)?;

    Ok(pool)
}

/// Save one supplier-day of metrics.
pub fn save_metric_record(pool: &Pool, record: &MetricRecord) -> Result<()> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO metric_records
            (supplier, record_date, login_count, learn_count, cheat_count,
             face_success_count, face_fail_count)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            record.supplier,
            record.date.to_string(),
            record.login_count as i64,
            record.learn_count as i64,
            record.cheat_count as i64,
            record.face_success_count as i64,
            record.face_fail_count as i64,
        ],
    )?;
    Ok(())
}

/// Track a new remediation problem. Returns the assigned id.
pub fn save_problem(
    pool: &Pool,
    title: &str,
    responsible: &str,
    status: &str,
    discovered_at: NaiveDate,
    deadline: NaiveDate,
) -> Result<i64> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO problems (title, responsible, status, discovered_at, deadline)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            title,
            responsible,
            status,
            discovered_at.to_string(),
            deadline.to_string(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .with_context(|| format!("malformed date '{}' in database", text))
}

/// SQLite-backed implementation of both detection sources.
#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool,
}

impl SqliteStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl MetricSource for SqliteStore {
    async fn metrics_in_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<MetricRecord>> {
        let pool = self.pool.clone();

        // Blocking query off the async runtime
        let rows = tokio::task::spawn_blocking(move || -> Result<Vec<(String, String, i64, i64, i64, i64, i64)>> {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(
                "SELECT supplier, record_date, login_count, learn_count, cheat_count,
                        face_success_count, face_fail_count
                 FROM metric_records
                 WHERE record_date >= ?1 AND record_date <= ?2
                 ORDER BY record_date ASC, supplier ASC",
            )?;

            let rows = stmt.query_map(params![start.to_string(), end.to_string()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, i64>(6)?,
                ))
            })?;

            let mut out = Vec::new();
            for r in rows {
                out.push(r?);
            }
            Ok(out)
        })
        .await??;

        let mut records = Vec::with_capacity(rows.len());
        for (supplier, date, login, learn, cheat, face_ok, face_fail) in rows {
            records.push(MetricRecord {
                supplier,
                date: parse_date(&date)?,
                login_count: login as u64,
                learn_count: learn as u64,
                cheat_count: cheat as u64,
                face_success_count: face_ok as u64,
                face_fail_count: face_fail as u64,
            });
        }
        Ok(records)
    }
}

#[async_trait::async_trait]
impl ProblemSource for SqliteStore {
    async fn overdue_problems(&self, today: NaiveDate) -> Result<Vec<ProblemRecord>> {
        let pool = self.pool.clone();

        let rows = tokio::task::spawn_blocking(move || -> Result<Vec<(i64, String, String, String, String, String)>> {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(
                "SELECT id, title, responsible, status, discovered_at, deadline
                 FROM problems
                 WHERE status NOT IN (?1, ?2) AND deadline < ?3
                 ORDER BY deadline ASC",
            )?;

            let rows = stmt.query_map(
                params![CORRECTED_STATUSES[0], CORRECTED_STATUSES[1], today.to_string()],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )?;

            let mut out = Vec::new();
            for r in rows {
                out.push(r?);
            }
            Ok(out)
        })
        .await??;

        let mut problems = Vec::with_capacity(rows.len());
        for (id, title, responsible, status, discovered_at, deadline) in rows {
            problems.push(ProblemRecord {
                id,
                title,
                responsible,
                status,
                discovered_at: parse_date(&discovered_at)?,
                deadline: parse_date(&deadline)?,
            });
        }
        Ok(problems)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_pool() -> (tempfile::TempDir, Pool) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let pool = open_pool(path.to_str().unwrap()).unwrap();
        (dir, pool)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn metrics_round_trip_within_range() {
        let (_dir, pool) = scratch_pool();
        let record = MetricRecord {
            supplier: "华信培训".to_string(),
            date: date(2026, 7, 10),
            login_count: 120,
            learn_count: 80,
            cheat_count: 2,
            face_success_count: 75,
            face_fail_count: 5,
        };
        save_metric_record(&pool, &record).unwrap();

        let store = SqliteStore::new(pool);
        let fetched = store
            .metrics_in_range(date(2026, 7, 1), date(2026, 7, 31))
            .await
            .unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].supplier, "华信培训");
        assert_eq!(fetched[0].learn_count, 80);

        // Range is inclusive on both ends
        let edge = store
            .metrics_in_range(date(2026, 7, 10), date(2026, 7, 10))
            .await
            .unwrap();
        assert_eq!(edge.len(), 1);

        let outside = store
            .metrics_in_range(date(2026, 8, 1), date(2026, 8, 31))
            .await
            .unwrap();
        assert!(outside.is_empty());
    }

    #[tokio::test]
    async fn overdue_query_skips_corrected_and_future_deadlines() {
        let (_dir, pool) = scratch_pool();
        let today = date(2026, 7, 15);

        save_problem(&pool, "台账不全", "赵主任", "待整改", date(2026, 6, 1), date(2026, 7, 5)).unwrap();
        save_problem(&pool, "已处理问题", "李科长", "已整改", date(2026, 6, 1), date(2026, 7, 5)).unwrap();
        save_problem(&pool, "未到期问题", "王主管", "待整改", date(2026, 7, 1), date(2026, 7, 20)).unwrap();

        let store = SqliteStore::new(pool);
        let overdue = store.overdue_problems(today).await.unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].title, "台账不全");
        assert_eq!(overdue[0].remaining_days(today), -10);
    }
}
