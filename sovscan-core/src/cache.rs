//! SQLite-backed result cache
//!
//! Keyed by normalized target URL with a freshness window: `get` returns only
//! entries newer than `now − max_age_hours`, preferring the newest. Writes are
//! transactional, so a stored entry is either fully visible or absent.
//!
//! Cache failures are never allowed to fail an assessment: the `lookup`/`store`
//! wrappers warn on stderr and proceed without the cache, while the underlying
//! `get`/`put` stay fallible for callers that care.

use crate::scoring::ScoreResult;
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS assessments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    target TEXT NOT NULL,
    normalized_target TEXT NOT NULL,
    score INTEGER NOT NULL,
    risk_level TEXT NOT NULL,
    success INTEGER NOT NULL DEFAULT 1,
    created_at INTEGER NOT NULL,
    result_json TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_assessments_normalized_target
    ON assessments(normalized_target);
CREATE INDEX IF NOT EXISTS idx_assessments_created_at
    ON assessments(created_at DESC);
";

/// Normalize a raw target so equivalent spellings share one cache key.
///
/// `http://` is upgraded to `https://`; scheme-relative (`//host`) and bare
/// domain/host inputs get an `https://` prefix. Text that does not look like
/// a host at all is returned unchanged.
pub fn normalize_target(target: &str) -> String {
    let t = target.trim();
    if t.starts_with("https://") {
        return t.to_string();
    }
    if let Some(rest) = t.strip_prefix("http://") {
        return format!("https://{rest}");
    }
    if t.starts_with("//") {
        return format!("https:{t}");
    }
    // Bare-domain heuristic: a dot, a localhost prefix, or an all-digit
    // host:port spelling.
    let stripped: String = t
        .chars()
        .filter(|c| !matches!(c, '.' | ':' | '/'))
        .collect();
    if t.contains('.')
        || t.starts_with("localhost")
        || (!stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_digit()))
    {
        return format!("https://{t}");
    }
    t.to_string()
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Aggregate cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub assessments: u64,
    pub min_score: Option<i32>,
    pub max_score: Option<i32>,
}

/// Handle to the assessment cache database.
pub struct CacheGateway {
    conn: Connection,
}

impl CacheGateway {
    /// Open (creating if needed) the cache database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create directory: {}", parent.display()))?;
            }
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open cache database: {}", path.display()))?;
        conn.execute_batch(SCHEMA_SQL)
            .context("failed to initialize cache schema")?;
        Ok(CacheGateway { conn })
    }

    /// In-memory cache, used by tests and `--no-cache`-adjacent tooling.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory cache")?;
        conn.execute_batch(SCHEMA_SQL)
            .context("failed to initialize cache schema")?;
        Ok(CacheGateway { conn })
    }

    /// Fetch the newest successful entry for `target` created within the last
    /// `max_age_hours`. A zero-hour window treats every entry as stale.
    pub fn get(&self, target: &str, max_age_hours: u64) -> Result<Option<ScoreResult>> {
        let normalized = normalize_target(target);
        let cutoff = now_unix() - (max_age_hours as i64) * 3600;
        let row: Option<String> = self
            .conn
            .query_row(
                "SELECT result_json FROM assessments
                 WHERE normalized_target = ?1
                   AND success = 1
                   AND created_at > ?2
                 ORDER BY created_at DESC, id DESC
                 LIMIT 1",
                params![normalized, cutoff],
                |row| row.get(0),
            )
            .optional()
            .context("cache lookup query failed")?;
        match row {
            Some(json) => Ok(Some(ScoreResult::from_json(&json)?)),
            None => Ok(None),
        }
    }

    /// Store a result for `target`. Returns the new entry's rowid.
    pub fn put(&mut self, target: &str, result: &ScoreResult) -> Result<i64> {
        let normalized = normalize_target(target);
        let json = result.to_json()?;
        let tx = self
            .conn
            .transaction()
            .context("failed to begin cache transaction")?;
        tx.execute(
            "INSERT INTO assessments
             (target, normalized_target, score, risk_level, success, created_at, result_json)
             VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6)",
            params![
                target,
                normalized,
                result.score,
                result.risk_level.as_str(),
                now_unix(),
                json
            ],
        )
        .context("failed to insert cache entry")?;
        let id = tx.last_insert_rowid();
        tx.commit().context("failed to commit cache entry")?;
        Ok(id)
    }

    /// Non-fatal lookup: warns on stderr and reports a miss on any error.
    pub fn lookup(&self, target: &str, max_age_hours: u64) -> Option<ScoreResult> {
        match self.get(target, max_age_hours) {
            Ok(hit) => hit,
            Err(e) => {
                eprintln!("warning: cache lookup failed (proceeding without cache): {e}");
                None
            }
        }
    }

    /// Non-fatal store: warns on stderr and drops the entry on any error.
    pub fn store(&mut self, target: &str, result: &ScoreResult) {
        if let Err(e) = self.put(target, result) {
            eprintln!("warning: failed to store result in cache (non-fatal): {e}");
        }
    }

    /// Count and score range across all stored assessments.
    pub fn stats(&self) -> Result<CacheStats> {
        self.conn
            .query_row(
                "SELECT COUNT(*), MIN(score), MAX(score) FROM assessments",
                [],
                |row| {
                    Ok(CacheStats {
                        assessments: row.get::<_, i64>(0)? as u64,
                        min_score: row.get(1)?,
                        max_score: row.get(2)?,
                    })
                },
            )
            .context("cache stats query failed")
    }
}
