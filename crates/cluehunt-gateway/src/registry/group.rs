//! In-memory group registry for room broadcast membership.
//!
//! A group is the set of live connections subscribed to one room. Each
//! member owns a bounded queue; fan-out uses `try_send` so a stalled
//! member can never block delivery to the rest of the group. A member
//! whose queue is full or whose receiver is gone is evicted, which ends
//! its socket task.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use tracing::{debug, warn};
use uuid::Uuid;

type Members = HashMap<Uuid, mpsc::Sender<String>>;

/// Thread-safe mapping from group name to current member senders.
#[derive(Clone)]
pub struct GroupRegistry {
    groups: Arc<RwLock<HashMap<String, Members>>>,
    queue_capacity: usize,
}

impl GroupRegistry {
    /// Create a registry whose members get queues of `queue_capacity` frames.
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            groups: Arc::new(RwLock::new(HashMap::new())),
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Add a member to a group and return the receiving end of its queue.
    ///
    /// Joining again under the same member id replaces the previous queue,
    /// so membership is idempotent per connection.
    pub async fn join(&self, group: &str, member_id: Uuid) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        self.groups
            .write()
            .await
            .entry(group.to_string())
            .or_default()
            .insert(member_id, tx);
        debug!(group = %group, member_id = %member_id, "Member joined group");
        rx
    }

    /// Remove a member from a group.
    ///
    /// Best-effort: removing a member that is not present is not an error.
    /// Empty groups are pruned.
    pub async fn leave(&self, group: &str, member_id: Uuid) {
        let mut groups = self.groups.write().await;
        if let Some(members) = groups.get_mut(group) {
            members.remove(&member_id);
            if members.is_empty() {
                groups.remove(group);
            }
            debug!(group = %group, member_id = %member_id, "Member left group");
        }
    }

    /// Send a frame to every current member of a group.
    ///
    /// Members that cannot accept the frame (queue full or receiver gone)
    /// are evicted; delivery to the remaining members is unaffected.
    /// Returns the number of members the frame was handed to.
    pub async fn broadcast(&self, group: &str, frame: &str) -> usize {
        let mut groups = self.groups.write().await;
        let Some(members) = groups.get_mut(group) else {
            return 0;
        };

        let mut evicted: Vec<Uuid> = Vec::new();
        let mut delivered = 0;
        for (member_id, tx) in members.iter() {
            match tx.try_send(frame.to_string()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(group = %group, member_id = %member_id, "Member queue full, evicting");
                    evicted.push(*member_id);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    evicted.push(*member_id);
                }
            }
        }

        for member_id in evicted {
            members.remove(&member_id);
        }
        if members.is_empty() {
            groups.remove(group);
        }

        delivered
    }

    /// Number of members currently in a group.
    pub async fn member_count(&self, group: &str) -> usize {
        self.groups
            .read()
            .await
            .get(group)
            .map_or(0, HashMap::len)
    }

    /// Number of groups with at least one member.
    pub async fn group_count(&self) -> usize {
        self.groups.read().await.len()
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn join_and_broadcast() {
        let registry = GroupRegistry::new(16);
        let id = Uuid::new_v4();

        let mut rx = registry.join("chat_alice_puzzle1", id).await;
        let delivered = registry.broadcast("chat_alice_puzzle1", "hello").await;

        assert_eq!(delivered, 1);
        assert_eq!(rx.recv().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn fanout_reaches_every_member() {
        let registry = GroupRegistry::new(16);
        let mut receivers = Vec::new();
        for _ in 0..5 {
            receivers.push(registry.join("chat_g", Uuid::new_v4()).await);
        }

        let delivered = registry.broadcast("chat_g", "frame").await;
        assert_eq!(delivered, 5);

        for rx in &mut receivers {
            assert_eq!(rx.recv().await.unwrap(), "frame");
        }
    }

    #[tokio::test]
    async fn frames_arrive_in_broadcast_order() {
        let registry = GroupRegistry::new(16);
        let mut rx = registry.join("chat_g", Uuid::new_v4()).await;

        registry.broadcast("chat_g", "first").await;
        registry.broadcast("chat_g", "second").await;
        registry.broadcast("chat_g", "third").await;

        assert_eq!(rx.recv().await.unwrap(), "first");
        assert_eq!(rx.recv().await.unwrap(), "second");
        assert_eq!(rx.recv().await.unwrap(), "third");
    }

    #[tokio::test]
    async fn leave_stops_delivery() {
        let registry = GroupRegistry::new(16);
        let id = Uuid::new_v4();

        let mut rx = registry.join("chat_g", id).await;
        registry.leave("chat_g", id).await;

        let delivered = registry.broadcast("chat_g", "frame").await;
        assert_eq!(delivered, 0);
        // Sender side is gone, so the queue ends instead of delivering.
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn leave_unknown_member_is_noop() {
        let registry = GroupRegistry::new(16);
        registry.leave("chat_g", Uuid::new_v4()).await;
        assert_eq!(registry.group_count().await, 0);
    }

    #[tokio::test]
    async fn rejoin_replaces_previous_queue() {
        let registry = GroupRegistry::new(16);
        let id = Uuid::new_v4();

        let mut old_rx = registry.join("chat_g", id).await;
        let mut new_rx = registry.join("chat_g", id).await;

        assert_eq!(registry.member_count("chat_g").await, 1);
        registry.broadcast("chat_g", "frame").await;

        assert_eq!(new_rx.recv().await.unwrap(), "frame");
        assert!(old_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn full_queue_evicts_member_without_blocking_others() {
        let registry = GroupRegistry::new(1);
        let stalled = Uuid::new_v4();
        let healthy = Uuid::new_v4();

        // The stalled member never drains its queue.
        let _stalled_rx = registry.join("chat_g", stalled).await;
        let mut healthy_rx = registry.join("chat_g", healthy).await;

        // First frame fills the stalled member's queue of one.
        assert_eq!(registry.broadcast("chat_g", "one").await, 2);
        assert_eq!(healthy_rx.recv().await.unwrap(), "one");

        // Second frame overflows it; the member is evicted, the healthy
        // member still gets the frame.
        assert_eq!(registry.broadcast("chat_g", "two").await, 1);
        assert_eq!(healthy_rx.recv().await.unwrap(), "two");
        assert_eq!(registry.member_count("chat_g").await, 1);
    }

    #[tokio::test]
    async fn empty_groups_are_pruned() {
        let registry = GroupRegistry::new(16);
        let id = Uuid::new_v4();

        registry.join("chat_g", id).await;
        assert_eq!(registry.group_count().await, 1);

        registry.leave("chat_g", id).await;
        assert_eq!(registry.group_count().await, 0);
    }

    #[tokio::test]
    async fn groups_are_isolated() {
        let registry = GroupRegistry::new(16);
        let mut rx_a = registry.join("chat_a_room", Uuid::new_v4()).await;
        let mut rx_b = registry.join("chat_b_room", Uuid::new_v4()).await;

        registry.broadcast("chat_a_room", "for-a").await;

        assert_eq!(rx_a.recv().await.unwrap(), "for-a");
        // Nothing was queued for the other group.
        assert!(rx_b.try_recv().is_err());
    }
}
