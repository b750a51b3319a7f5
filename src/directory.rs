use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::types::UserId;

/// One known user, as last seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub display_name: String,
    /// `None` when the user has no public handle.
    pub handle: Option<String>,
}

/// Insertion-ordered store of every user that has ever written in.
///
/// Upserts overwrite display metadata in place (last write wins) without
/// disturbing the first-seen order that `/users` lists. Records are never
/// deleted.
#[derive(Debug, Default)]
pub struct Directory {
    inner: RwLock<DirectoryInner>,
}

#[derive(Debug, Default)]
struct DirectoryInner {
    index: HashMap<UserId, usize>,
    records: Vec<UserRecord>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the record for `id`. Idempotent.
    pub async fn upsert(&self, id: UserId, display_name: String, handle: Option<String>) {
        let mut inner = self.inner.write().await;
        match inner.index.get(&id).copied() {
            Some(pos) => {
                let record = &mut inner.records[pos];
                record.display_name = display_name;
                record.handle = handle;
            }
            None => {
                let pos = inner.records.len();
                inner.records.push(UserRecord {
                    id,
                    display_name,
                    handle,
                });
                inner.index.insert(id, pos);
            }
        }
    }

    /// All known users in first-seen order.
    pub async fn list(&self) -> Vec<UserRecord> {
        self.inner.read().await.records.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upsert_then_list() {
        let directory = Directory::new();
        directory
            .upsert(UserId(111), "Alice".to_string(), Some("alice1".to_string()))
            .await;

        let users = directory.list().await;
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, UserId(111));
        assert_eq!(users[0].display_name, "Alice");
        assert_eq!(users[0].handle.as_deref(), Some("alice1"));
    }

    #[tokio::test]
    async fn test_upsert_overwrites_in_place() {
        let directory = Directory::new();
        directory
            .upsert(UserId(111), "Alice".to_string(), Some("alice1".to_string()))
            .await;
        directory.upsert(UserId(222), "Bob".to_string(), None).await;
        // Alice renames herself and drops her handle; her slot must not move.
        directory
            .upsert(UserId(111), "Alicia".to_string(), None)
            .await;

        let users = directory.list().await;
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].id, UserId(111));
        assert_eq!(users[0].display_name, "Alicia");
        assert_eq!(users[0].handle, None);
        assert_eq!(users[1].id, UserId(222));
    }

    #[tokio::test]
    async fn test_list_preserves_first_seen_order() {
        let directory = Directory::new();
        for id in [5, 3, 9, 1] {
            directory.upsert(UserId(id), format!("user-{}", id), None).await;
        }
        let ids: Vec<i64> = directory.list().await.iter().map(|u| u.id.0).collect();
        assert_eq!(ids, vec![5, 3, 9, 1]);
    }

    #[tokio::test]
    async fn test_empty_directory() {
        let directory = Directory::new();
        assert!(directory.is_empty().await);
        assert_eq!(directory.len().await, 0);
        assert!(directory.list().await.is_empty());
    }
}
