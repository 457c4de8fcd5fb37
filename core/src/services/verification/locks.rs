//! Per-credential async locks serializing requests within one process

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::value_objects::CredentialKey;

/// Lock table keyed by credential; entries vanish once no guard holds them
#[derive(Default)]
pub(crate) struct KeyedLocks {
    locks: Mutex<HashMap<CredentialKey, Weak<Mutex<()>>>>,
}

impl KeyedLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`
    pub(crate) async fn lock(&self, key: &CredentialKey) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut locks = self.locks.lock().await;
            match locks.get(key).and_then(Weak::upgrade) {
                Some(mutex) => mutex,
                None => {
                    locks.retain(|_, weak| weak.strong_count() > 0);
                    let mutex = Arc::new(Mutex::new(()));
                    locks.insert(key.clone(), Arc::downgrade(&mutex));
                    mutex
                }
            }
        };
        mutex.lock_owned().await
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::UserId;
    use std::time::Duration;

    fn key(value: &str) -> CredentialKey {
        CredentialKey::new(UserId::new("usr1").unwrap(), "tel", value)
    }

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = KeyedLocks::new();
        let guard = locks.lock(&key("a")).await;

        let second = tokio::time::timeout(Duration::from_millis(50), locks.lock(&key("a"))).await;
        assert!(second.is_err());

        drop(guard);
        let third = tokio::time::timeout(Duration::from_millis(50), locks.lock(&key("a"))).await;
        assert!(third.is_ok());
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let _a = locks.lock(&key("a")).await;
        let b = tokio::time::timeout(Duration::from_millis(50), locks.lock(&key("b"))).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_released_entries_are_pruned() {
        let locks = KeyedLocks::new();
        drop(locks.lock(&key("a")).await);
        drop(locks.lock(&key("b")).await);
        assert_eq!(locks.len().await, 1);
    }
}
