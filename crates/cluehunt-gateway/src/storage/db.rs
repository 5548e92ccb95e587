//! SQLite database for the Cluehunt gateway.

use std::path::Path;

use sqlx::{Pool, Sqlite};
use tracing::info;

use cluehunt_core::db::{DatabaseError, open_pool, open_pool_in_memory};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS teams (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        created_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS chat_messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        team_id TEXT NOT NULL REFERENCES teams(id),
        room TEXT NOT NULL,
        content TEXT NOT NULL,
        created_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS hunt_info (
        team_id TEXT PRIMARY KEY REFERENCES teams(id),
        level INTEGER NOT NULL DEFAULT 1,
        hints_shown INTEGER NOT NULL DEFAULT 0,
        hint_requested INTEGER NOT NULL DEFAULT 0,
        next_hint_release INTEGER
    )",
    "CREATE TABLE IF NOT EXISTS hunt_events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        time INTEGER NOT NULL,
        team_id TEXT NOT NULL REFERENCES teams(id),
        event_type TEXT NOT NULL,
        level INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_chat_messages_room ON chat_messages(room, created_at)",
    "CREATE INDEX IF NOT EXISTS idx_hunt_events_team ON hunt_events(team_id, time)",
];

/// Handle to the gateway's SQLite database.
#[derive(Clone)]
pub struct HuntDatabase {
    pool: Pool<Sqlite>,
}

impl HuntDatabase {
    /// Open or create a database at the given path.
    pub async fn open(path: &Path) -> Result<Self, DatabaseError> {
        let pool = open_pool(path).await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub async fn open_in_memory() -> Result<Self, DatabaseError> {
        let pool = open_pool_in_memory().await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| DatabaseError::Migration(e.to_string()))?;
        }

        info!("Gateway database schema ready");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}
