//! Hint release scheduler.
//!
//! A team that asks for a hint gets it only after a delay; the armed timer
//! lives in the team's hunt progress row. Evaluation releases the hint once
//! the deadline has passed, bumps the hint counter, and appends an audit
//! event. One injected clock supplies both the due comparison and the event
//! timestamp.

use std::sync::Arc;

use tracing::{info, warn};

use cluehunt_core::db::unix_timestamp;

use crate::storage::HuntDatabase;

/// Time source for hint evaluation.
pub trait Clock: Send + Sync {
    /// Current time as a unix timestamp.
    fn now(&self) -> i64;
}

/// Wall-clock [`Clock`] used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        unix_timestamp()
    }
}

/// Evaluates armed hint timers and releases due hints.
#[derive(Clone)]
pub struct HintScheduler {
    db: HuntDatabase,
    clock: Arc<dyn Clock>,
}

impl HintScheduler {
    pub fn new(db: HuntDatabase, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Release the team's hint if its timer is armed and the deadline has
    /// passed. Returns whether a release happened.
    ///
    /// Safe to call repeatedly: releasing clears the armed state, so only
    /// the first evaluation after the deadline has any effect, and
    /// concurrent evaluations release at most once.
    pub async fn evaluate(&self, team_id: &str) -> Result<bool, HintError> {
        let released = self
            .db
            .release_due_hint(team_id, self.clock.now())
            .await
            .map_err(|e| HintError::Storage(e.to_string()))?;

        if released {
            info!(team_id = %team_id, "Hint released");
        }

        Ok(released)
    }

    /// Evaluate every team whose armed timer is due. Returns the number of
    /// hints released.
    ///
    /// Driven by the gateway's periodic sweep task; also callable directly
    /// by the platform alongside per-team [`Self::evaluate`] triggers.
    pub async fn sweep(&self) -> Result<u64, HintError> {
        let now = self.clock.now();
        let due = self
            .db
            .list_due_teams(now)
            .await
            .map_err(|e| HintError::Storage(e.to_string()))?;

        let mut released = 0u64;
        for team_id in due {
            match self.evaluate(&team_id).await {
                Ok(true) => released += 1,
                // Another evaluation got there first; nothing to do.
                Ok(false) => {}
                Err(e) => {
                    warn!(team_id = %team_id, error = %e, "Hint evaluation failed during sweep");
                }
            }
        }

        Ok(released)
    }
}

/// Hint scheduling errors.
#[derive(Debug, thiserror::Error)]
pub enum HintError {
    #[error("Storage error: {0}")]
    Storage(String),
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicI64, Ordering};

    use super::*;
    use crate::storage::HuntEventType;

    /// Test clock that only moves when told to.
    struct ManualClock(AtomicI64);

    impl ManualClock {
        fn at(t: i64) -> Arc<Self> {
            Arc::new(Self(AtomicI64::new(t)))
        }

        fn set(&self, t: i64) {
            self.0.store(t, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    async fn armed_team(release_at: i64) -> HuntDatabase {
        let db = HuntDatabase::open_in_memory().await.unwrap();
        db.create_team("t1", "teamA").await.unwrap();
        db.request_hint("t1", release_at).await.unwrap();
        db
    }

    #[tokio::test]
    async fn not_due_timer_does_nothing() {
        let db = armed_team(1_000).await;
        let clock = ManualClock::at(999);
        let scheduler = HintScheduler::new(db.clone(), clock);

        assert!(!scheduler.evaluate("t1").await.unwrap());

        let info = db.get_hunt_info("t1").await.unwrap();
        assert!(info.is_armed());
        assert_eq!(info.hints_shown, 0);
    }

    #[tokio::test]
    async fn due_timer_releases_exactly_once() {
        let db = armed_team(1_000).await;
        let clock = ManualClock::at(1_500);
        let scheduler = HintScheduler::new(db.clone(), clock.clone());

        assert!(scheduler.evaluate("t1").await.unwrap());

        let info = db.get_hunt_info("t1").await.unwrap();
        assert_eq!(info.hints_shown, 1);
        assert!(!info.is_armed());
        assert!(info.next_hint_release.is_none());

        // Further evaluations are no-ops.
        clock.set(2_000);
        assert!(!scheduler.evaluate("t1").await.unwrap());
        assert_eq!(db.get_hunt_info("t1").await.unwrap().hints_shown, 1);
    }

    #[tokio::test]
    async fn release_event_uses_evaluation_clock() {
        let db = armed_team(1_000).await;
        let scheduler = HintScheduler::new(db.clone(), ManualClock::at(1_234));

        scheduler.evaluate("t1").await.unwrap();

        let events = db.list_team_events("t1").await.unwrap();
        let release = events
            .iter()
            .find(|e| e.event_type == HuntEventType::HintReleased.as_str())
            .unwrap();
        assert_eq!(release.time, 1_234);
        assert_eq!(release.level, 1);
    }

    #[tokio::test]
    async fn concurrent_evaluations_release_once() {
        let db = armed_team(1_000).await;
        let scheduler = HintScheduler::new(db.clone(), ManualClock::at(2_000));

        let (a, b) = tokio::join!(scheduler.evaluate("t1"), scheduler.evaluate("t1"));
        let releases = usize::from(a.unwrap()) + usize::from(b.unwrap());
        assert_eq!(releases, 1);

        assert_eq!(db.get_hunt_info("t1").await.unwrap().hints_shown, 1);
        let events = db.list_team_events("t1").await.unwrap();
        let count = events
            .iter()
            .filter(|e| e.event_type == HuntEventType::HintReleased.as_str())
            .count();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn sweep_releases_all_due_teams() {
        let db = HuntDatabase::open_in_memory().await.unwrap();
        db.create_team("t1", "teamA").await.unwrap();
        db.create_team("t2", "teamB").await.unwrap();
        db.create_team("t3", "teamC").await.unwrap();
        db.request_hint("t1", 1_000).await.unwrap();
        db.request_hint("t2", 1_000).await.unwrap();
        db.request_hint("t3", 9_000).await.unwrap();

        let scheduler = HintScheduler::new(db.clone(), ManualClock::at(2_000));
        assert_eq!(scheduler.sweep().await.unwrap(), 2);

        assert_eq!(db.get_hunt_info("t1").await.unwrap().hints_shown, 1);
        assert_eq!(db.get_hunt_info("t2").await.unwrap().hints_shown, 1);
        assert_eq!(db.get_hunt_info("t3").await.unwrap().hints_shown, 0);

        // A second sweep finds nothing due.
        assert_eq!(scheduler.sweep().await.unwrap(), 0);
    }
}
