use std::collections::HashSet;

use tokio::sync::RwLock;

use crate::types::UserId;

/// Set of user ids the operator has blocked.
///
/// Membership only; both directions are idempotent.
#[derive(Debug, Default)]
pub struct BlockList {
    inner: RwLock<HashSet<UserId>>,
}

impl BlockList {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn block(&self, id: UserId) {
        self.inner.write().await.insert(id);
    }

    pub async fn unblock(&self, id: UserId) {
        self.inner.write().await.remove(&id);
    }

    pub async fn is_blocked(&self, id: UserId) -> bool {
        self.inner.read().await.contains(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_block_and_unblock() {
        let blocklist = BlockList::new();
        assert!(!blocklist.is_blocked(UserId(111)).await);

        blocklist.block(UserId(111)).await;
        assert!(blocklist.is_blocked(UserId(111)).await);
        assert!(!blocklist.is_blocked(UserId(222)).await);

        blocklist.unblock(UserId(111)).await;
        assert!(!blocklist.is_blocked(UserId(111)).await);
    }

    #[tokio::test]
    async fn test_block_is_idempotent() {
        let blocklist = BlockList::new();
        blocklist.block(UserId(111)).await;
        blocklist.block(UserId(111)).await;
        assert!(blocklist.is_blocked(UserId(111)).await);

        blocklist.unblock(UserId(111)).await;
        assert!(!blocklist.is_blocked(UserId(111)).await);
    }

    #[tokio::test]
    async fn test_unblock_non_member_is_noop() {
        let blocklist = BlockList::new();
        blocklist.unblock(UserId(999)).await;
        assert!(!blocklist.is_blocked(UserId(999)).await);
    }
}
