use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use workdesk_auth::{RefreshTokenStore, StoreError};
use workdesk_core::UserId;

use crate::error::poisoned;

/// In-memory refresh token store, one slot per user.
///
/// Every operation takes the write or read lock for its whole duration, so
/// `replace_if_current` is a true compare-and-swap.
#[derive(Debug, Default)]
pub struct InMemoryRefreshTokenStore {
    tokens: RwLock<HashMap<UserId, String>>,
}

impl InMemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn put(&self, user_id: UserId, token: String) -> Result<(), StoreError> {
        self.tokens.write().map_err(|_| poisoned())?.insert(user_id, token);
        Ok(())
    }

    async fn get(&self, user_id: UserId) -> Result<Option<String>, StoreError> {
        Ok(self.tokens.read().map_err(|_| poisoned())?.get(&user_id).cloned())
    }

    async fn remove(&self, user_id: UserId) -> Result<(), StoreError> {
        self.tokens.write().map_err(|_| poisoned())?.remove(&user_id);
        Ok(())
    }

    async fn replace_if_current(
        &self,
        user_id: UserId,
        expected: &str,
        next: String,
    ) -> Result<bool, StoreError> {
        let mut tokens = self.tokens.write().map_err(|_| poisoned())?;
        match tokens.get_mut(&user_id) {
            Some(current) if current == expected => {
                *current = next;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn put_overwrites_and_remove_is_idempotent() {
        let store = InMemoryRefreshTokenStore::new();
        let user = UserId::new();

        store.put(user, "a".into()).await.unwrap();
        store.put(user, "b".into()).await.unwrap();
        assert_eq!(store.get(user).await.unwrap().as_deref(), Some("b"));

        store.remove(user).await.unwrap();
        store.remove(user).await.unwrap();
        assert_eq!(store.get(user).await.unwrap(), None);
    }

    #[tokio::test]
    async fn replace_requires_the_current_value() {
        let store = InMemoryRefreshTokenStore::new();
        let user = UserId::new();

        assert!(!store.replace_if_current(user, "a", "b".into()).await.unwrap());
        store.put(user, "a".into()).await.unwrap();
        assert!(store.replace_if_current(user, "a", "b".into()).await.unwrap());
        assert!(!store.replace_if_current(user, "a", "c".into()).await.unwrap());
        assert_eq!(store.get(user).await.unwrap().as_deref(), Some("b"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_replacements_have_one_winner() {
        let store = Arc::new(InMemoryRefreshTokenStore::new());
        let user = UserId::new();
        store.put(user, "r1".into()).await.unwrap();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store.replace_if_current(user, "r1", format!("r2-{i}")).await.unwrap()
                })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn users_do_not_share_slots() {
        let store = InMemoryRefreshTokenStore::new();
        let (a, b) = (UserId::new(), UserId::new());
        store.put(a, "a".into()).await.unwrap();
        store.put(b, "b".into()).await.unwrap();
        store.remove(a).await.unwrap();
        assert_eq!(store.get(b).await.unwrap().as_deref(), Some("b"));
    }
}
