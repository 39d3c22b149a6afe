//! SQLite persistence for profiles and quiz results

use crate::error::Result;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// A named user record selectable from the app's home screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub icon: String,
    pub created_at: String,
}

/// One recorded quiz answer, ready for insertion.
#[derive(Debug, Clone)]
pub struct NewResult {
    pub user_id: i64,
    pub factor_a: i64,
    pub factor_b: i64,
    pub user_answer: i64,
    pub correct_answer: i64,
    pub is_correct: bool,
    pub time_taken_ms: i64,
}

/// Per-(factor_a, factor_b) aggregate for the stats view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatRow {
    pub factor_a: i64,
    pub factor_b: i64,
    pub attempts: i64,
    pub correct_count: i64,
    pub avg_time: f64,
}

/// Database wrapper shared across request handlers
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;

        // Enable WAL mode for better concurrency
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.init_schema()?;

        info!("Opened database at {:?}", path.as_ref());
        Ok(db)
    }

    /// Open in-memory database (for testing)
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                icon TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                factor_a INTEGER NOT NULL,
                factor_b INTEGER NOT NULL,
                user_answer INTEGER NOT NULL,
                correct_answer INTEGER NOT NULL,
                is_correct BOOLEAN NOT NULL,
                time_taken_ms INTEGER NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY(user_id) REFERENCES users(id)
            );

            CREATE TABLE IF NOT EXISTS disabled_factors (
                user_id INTEGER NOT NULL,
                factor INTEGER NOT NULL,
                PRIMARY KEY (user_id, factor),
                FOREIGN KEY(user_id) REFERENCES users(id)
            );
            "#,
        )?;

        Ok(())
    }

    /// List all user profiles
    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT id, name, icon, created_at FROM users")?;

        let users = stmt
            .query_map([], |row| {
                Ok(User {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    icon: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(users)
    }

    /// Create a profile. Fails on a duplicate name (UNIQUE constraint).
    pub fn create_user(&self, name: &str, icon: &str) -> Result<i64> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO users (name, icon) VALUES (?1, ?2)",
            params![name, icon],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Record one answered question
    pub fn insert_result(&self, result: &NewResult) -> Result<i64> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO results (user_id, factor_a, factor_b, user_answer, correct_answer, is_correct, time_taken_ms)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                result.user_id,
                result.factor_a,
                result.factor_b,
                result.user_answer,
                result.correct_answer,
                result.is_correct,
                result.time_taken_ms,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Aggregate results per factor pair for one user
    pub fn stats_for_user(&self, user_id: i64) -> Result<Vec<StatRow>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT factor_a, factor_b, COUNT(*) as attempts, SUM(is_correct) as correct_count, AVG(time_taken_ms) as avg_time
             FROM results
             WHERE user_id = ?1
             GROUP BY factor_a, factor_b",
        )?;

        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok(StatRow {
                    factor_a: row.get(0)?,
                    factor_b: row.get(1)?,
                    attempts: row.get(2)?,
                    correct_count: row.get(3)?,
                    avg_time: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}
