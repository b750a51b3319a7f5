use std::collections::{HashMap, VecDeque};

use tokio::sync::RwLock;

use crate::types::{MessageId, UserId};

// ============================================================================
// Relay Map
// ============================================================================
//
// The routing core's memory: which forwarded copy belongs to which sender.
// A link is written the moment a user's message lands in the operator's
// chat, and read when the operator replies to that copy.
//
// The map is capacity-bounded. At capacity the oldest link is evicted, and
// a reply to an evicted forward degrades to the normal "user not found"
// outcome.
//
// ============================================================================

#[derive(Debug)]
pub struct RelayMap {
    inner: RwLock<RelayMapInner>,
    capacity: usize,
}

#[derive(Debug, Default)]
struct RelayMapInner {
    links: HashMap<MessageId, UserId>,
    // Insertion order of live keys, front = oldest.
    order: VecDeque<MessageId>,
}

impl RelayMap {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "relay map capacity must be positive");
        Self {
            inner: RwLock::new(RelayMapInner::default()),
            capacity,
        }
    }

    /// Record a link from a forwarded-copy id back to its origin.
    ///
    /// The transport guarantees forwarded ids are unique, so a key that is
    /// already mapped to a different user is an internal consistency error:
    /// it is logged and overwritten, never a panic.
    pub async fn record(&self, forwarded: MessageId, origin: UserId) {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.links.get(&forwarded).copied() {
            if existing != origin {
                tracing::warn!(
                    forwarded_id = %forwarded,
                    "relay link already recorded for a different user, overwriting"
                );
            }
            inner.links.insert(forwarded, origin);
            return;
        }

        inner.links.insert(forwarded, origin);
        inner.order.push_back(forwarded);

        while inner.links.len() > self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.links.remove(&oldest);
                    tracing::debug!(forwarded_id = %oldest, "evicted oldest relay link");
                }
                None => break,
            }
        }
    }

    /// Look up the origin of a forwarded copy. `None` is a normal outcome:
    /// the operator replied to an unrelated message, or to one forwarded by
    /// a previous process instance.
    pub async fn resolve(&self, forwarded: MessageId) -> Option<UserId> {
        self.inner.read().await.links.get(&forwarded).copied()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.links.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.links.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_record_resolve_round_trip() {
        let relay = RelayMap::new(16);
        relay.record(MessageId(900), UserId(111)).await;
        assert_eq!(relay.resolve(MessageId(900)).await, Some(UserId(111)));
    }

    #[tokio::test]
    async fn test_resolve_unknown_id_is_none() {
        let relay = RelayMap::new(16);
        assert_eq!(relay.resolve(MessageId(12345)).await, None);
    }

    #[tokio::test]
    async fn test_many_links_per_user() {
        let relay = RelayMap::new(16);
        relay.record(MessageId(900), UserId(111)).await;
        relay.record(MessageId(901), UserId(111)).await;
        assert_eq!(relay.resolve(MessageId(900)).await, Some(UserId(111)));
        assert_eq!(relay.resolve(MessageId(901)).await, Some(UserId(111)));
        assert_eq!(relay.len().await, 2);
    }

    #[tokio::test]
    async fn test_conflicting_record_overwrites() {
        let relay = RelayMap::new(16);
        relay.record(MessageId(900), UserId(111)).await;
        relay.record(MessageId(900), UserId(222)).await;
        assert_eq!(relay.resolve(MessageId(900)).await, Some(UserId(222)));
        assert_eq!(relay.len().await, 1);
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest_first() {
        let relay = RelayMap::new(3);
        for n in 0..4 {
            relay.record(MessageId(n), UserId(100 + n)).await;
        }
        assert_eq!(relay.len().await, 3);
        assert_eq!(relay.resolve(MessageId(0)).await, None);
        assert_eq!(relay.resolve(MessageId(1)).await, Some(UserId(101)));
        assert_eq!(relay.resolve(MessageId(3)).await, Some(UserId(103)));
    }

    #[tokio::test]
    async fn test_re_record_same_link_does_not_evict() {
        let relay = RelayMap::new(2);
        relay.record(MessageId(1), UserId(111)).await;
        relay.record(MessageId(1), UserId(111)).await;
        relay.record(MessageId(2), UserId(222)).await;
        assert_eq!(relay.len().await, 2);
        assert_eq!(relay.resolve(MessageId(1)).await, Some(UserId(111)));
        assert_eq!(relay.resolve(MessageId(2)).await, Some(UserId(222)));
    }
}
