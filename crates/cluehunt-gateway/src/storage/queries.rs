//! Team and chat message queries for the Cluehunt gateway.

use cluehunt_core::db::{DatabaseError, unix_timestamp};

use super::db::HuntDatabase;
use super::models::{ChatMessage, Team};

impl HuntDatabase {
    // =========================================================================
    // Team queries
    // =========================================================================

    /// Create a new team and provision its hunt progress row.
    pub async fn create_team(&self, id: &str, name: &str) -> Result<Team, DatabaseError> {
        let now = unix_timestamp();

        let mut tx = self.pool().begin().await?;
        sqlx::query("INSERT INTO teams (id, name, created_at) VALUES (?, ?, ?)")
            .bind(id)
            .bind(name)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO hunt_info (team_id) VALUES (?)")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        self.get_team(id).await
    }

    /// Get a team by ID.
    pub async fn get_team(&self, id: &str) -> Result<Team, DatabaseError> {
        sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Team {id}")))
    }

    /// Get a team by name.
    pub async fn get_team_by_name(&self, name: &str) -> Result<Team, DatabaseError> {
        sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE name = ?")
            .bind(name)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Team with name {name}")))
    }

    // =========================================================================
    // Chat message queries
    // =========================================================================

    /// Record a chat message.
    pub async fn create_chat_message(
        &self,
        name: &str,
        team_id: &str,
        room: &str,
        content: &str,
    ) -> Result<ChatMessage, DatabaseError> {
        let now = unix_timestamp();

        let result = sqlx::query(
            "INSERT INTO chat_messages (name, team_id, room, content, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(name)
        .bind(team_id)
        .bind(room)
        .bind(content)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_chat_message(result.last_insert_rowid()).await
    }

    /// Get a chat message by ID.
    pub async fn get_chat_message(&self, id: i64) -> Result<ChatMessage, DatabaseError> {
        sqlx::query_as::<_, ChatMessage>("SELECT * FROM chat_messages WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Chat message {id}")))
    }

    /// List a room's messages, oldest first.
    pub async fn list_room_messages(
        &self,
        room: &str,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, DatabaseError> {
        let messages = sqlx::query_as::<_, ChatMessage>(
            "SELECT * FROM chat_messages WHERE room = ? ORDER BY created_at ASC, id ASC LIMIT ?",
        )
        .bind(room)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        Ok(messages)
    }

    /// Count messages recorded for a room.
    pub async fn count_room_messages(&self, room: &str) -> Result<i64, DatabaseError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chat_messages WHERE room = ?")
            .bind(room)
            .fetch_one(self.pool())
            .await?;

        Ok(row.0)
    }
}
