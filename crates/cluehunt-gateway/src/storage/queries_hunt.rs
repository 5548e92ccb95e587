//! Hunt progress and audit event queries for the Cluehunt gateway.

use cluehunt_core::db::{DatabaseError, unix_timestamp};

use super::db::HuntDatabase;
use super::models::{HuntEvent, HuntEventType, HuntInfo};

impl HuntDatabase {
    // =========================================================================
    // Hunt progress queries
    // =========================================================================

    /// Get a team's hunt progress record.
    pub async fn get_hunt_info(&self, team_id: &str) -> Result<HuntInfo, DatabaseError> {
        sqlx::query_as::<_, HuntInfo>("SELECT * FROM hunt_info WHERE team_id = ?")
            .bind(team_id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Hunt info for team {team_id}")))
    }

    /// Arm a team's hint timer and log the request.
    pub async fn request_hint(
        &self,
        team_id: &str,
        release_at: i64,
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool().begin().await?;

        let armed = sqlx::query(
            "UPDATE hunt_info SET hint_requested = 1, next_hint_release = ? WHERE team_id = ?",
        )
        .bind(release_at)
        .bind(team_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if armed == 0 {
            return Err(DatabaseError::NotFound(format!(
                "Hunt info for team {team_id}"
            )));
        }

        let (level,): (i64,) = sqlx::query_as("SELECT level FROM hunt_info WHERE team_id = ?")
            .bind(team_id)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO hunt_events (time, team_id, event_type, level) VALUES (?, ?, ?, ?)")
            .bind(unix_timestamp())
            .bind(team_id)
            .bind(HuntEventType::HintRequested.as_str())
            .bind(level)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Release a team's hint if its timer is armed and due at `now`.
    ///
    /// The update claims the armed state conditionally, so two concurrent
    /// callers release at most once. The audit event is written in the same
    /// transaction, timestamped `now`. Returns whether a release happened.
    pub async fn release_due_hint(
        &self,
        team_id: &str,
        now: i64,
    ) -> Result<bool, DatabaseError> {
        let mut tx = self.pool().begin().await?;

        let claimed = sqlx::query(
            "UPDATE hunt_info \
             SET hints_shown = hints_shown + 1, hint_requested = 0, next_hint_release = NULL \
             WHERE team_id = ? AND hint_requested = 1 \
               AND next_hint_release IS NOT NULL AND next_hint_release < ?",
        )
        .bind(team_id)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if claimed == 0 {
            return Ok(false);
        }

        let (level,): (i64,) = sqlx::query_as("SELECT level FROM hunt_info WHERE team_id = ?")
            .bind(team_id)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO hunt_events (time, team_id, event_type, level) VALUES (?, ?, ?, ?)")
            .bind(now)
            .bind(team_id)
            .bind(HuntEventType::HintReleased.as_str())
            .bind(level)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// List teams whose armed hint timer is due at `now`.
    pub async fn list_due_teams(&self, now: i64) -> Result<Vec<String>, DatabaseError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT team_id FROM hunt_info \
             WHERE hint_requested = 1 AND next_hint_release IS NOT NULL AND next_hint_release < ?",
        )
        .bind(now)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    // =========================================================================
    // Audit event queries
    // =========================================================================

    /// List a team's audit events, oldest first.
    pub async fn list_team_events(&self, team_id: &str) -> Result<Vec<HuntEvent>, DatabaseError> {
        let events = sqlx::query_as::<_, HuntEvent>(
            "SELECT * FROM hunt_events WHERE team_id = ? ORDER BY time ASC, id ASC",
        )
        .bind(team_id)
        .fetch_all(self.pool())
        .await?;

        Ok(events)
    }
}
