//! Write-behind queue for chat message persistence.
//!
//! Broadcast must never wait on the database, so accepted frames are handed
//! to a bounded queue consumed by a single worker task. A failed or skipped
//! write is logged and forgotten; it is never surfaced to the sender.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use cluehunt_core::db::DatabaseError;

use crate::storage::HuntDatabase;

/// One chat message awaiting persistence.
#[derive(Debug, Clone)]
pub struct WriteRequest {
    /// Display name as supplied in the frame.
    pub username: String,
    /// Team name to resolve; unknown teams skip the write.
    pub team: String,
    /// Room name as supplied in the frame (not the connection's bound room).
    pub room: String,
    /// Message body.
    pub content: String,
}

/// Queue handle for recording chat messages off the broadcast path.
#[derive(Clone)]
pub struct MessageWriter {
    tx: mpsc::Sender<WriteRequest>,
}

impl MessageWriter {
    /// Spawn the worker task and return the queue handle.
    pub fn spawn(db: HuntDatabase, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel(capacity.max(1));

        tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                persist_one(&db, &request).await;
            }
        });

        Self { tx }
    }

    /// Hand a message to the persistence queue.
    ///
    /// Never blocks: if the queue is full the write is dropped with a
    /// warning. The broadcast path calls this and moves on.
    pub fn enqueue(&self, request: WriteRequest) {
        if let Err(e) = self.tx.try_send(request) {
            warn!(error = %e, "Persistence queue rejected chat message");
        }
    }
}

/// Resolve the claimed team and record the message.
///
/// An unknown team means we cannot attribute the message, so it is not
/// recorded. Storage failures are logged and swallowed; the connection
/// handling loop must never see them.
pub(crate) async fn persist_one(db: &HuntDatabase, request: &WriteRequest) {
    match db.get_team_by_name(&request.team).await {
        Ok(team) => {
            if let Err(e) = db
                .create_chat_message(&request.username, &team.id, &request.room, &request.content)
                .await
            {
                warn!(room = %request.room, error = %e, "Failed to record chat message");
            }
        }
        Err(DatabaseError::NotFound(_)) => {
            debug!(team = %request.team, "Unknown team, chat message not recorded");
        }
        Err(e) => {
            warn!(team = %request.team, error = %e, "Team lookup failed, chat message not recorded");
        }
    }
}
