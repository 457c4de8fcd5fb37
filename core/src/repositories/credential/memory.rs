//! In-memory credential store for development and tests

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::entities::{CredentialRecord, CredentialState};
use crate::domain::value_objects::{CredentialKey, UserId};

use super::r#trait::{CredentialStore, StoreError, WriteGuard};

/// Credential store backed by a process-local map
#[derive(Clone)]
pub struct InMemoryCredentialStore {
    records: Arc<RwLock<HashMap<CredentialKey, CredentialRecord>>>,
}

impl InMemoryCredentialStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether another user holds `record`'s value as Verified
fn claimed_elsewhere(
    records: &HashMap<CredentialKey, CredentialRecord>,
    record: &CredentialRecord,
) -> bool {
    record.exclusive
        && record.state == CredentialState::Verified
        && records.values().any(|r| {
            r.method == record.method
                && r.value == record.value
                && r.user != record.user
                && r.state == CredentialState::Verified
        })
}

fn guard_holds(current: Option<&CredentialRecord>, guard: WriteGuard) -> bool {
    match (guard, current) {
        (WriteGuard::Any, _) => true,
        (WriteGuard::Absent, None) => true,
        (WriteGuard::Absent, Some(_)) => false,
        (WriteGuard::Revision(expected), Some(record)) => record.revision == expected,
        (WriteGuard::Revision(_), None) => false,
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find(&self, key: &CredentialKey) -> Result<Option<CredentialRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records.get(key).cloned())
    }

    async fn find_by_user(
        &self,
        user: &UserId,
        method: &str,
    ) -> Result<Vec<CredentialRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| &r.user == user && r.method == method)
            .cloned()
            .collect())
    }

    async fn find_verified_by_value(
        &self,
        method: &str,
        value: &str,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .find(|r| r.method == method && r.value == value && r.state == CredentialState::Verified)
            .cloned())
    }

    async fn upsert(
        &self,
        record: &CredentialRecord,
        guard: WriteGuard,
    ) -> Result<u64, StoreError> {
        let key = record.key();
        let mut records = self.records.write().await;
        let current = records.get(&key);

        if !guard_holds(current, guard) {
            return Err(StoreError::Conflict);
        }
        if claimed_elsewhere(&records, record) {
            return Err(StoreError::Claimed);
        }

        let revision = current.map(|r| r.revision).unwrap_or(0) + 1;
        let mut stored = record.clone();
        stored.revision = revision;
        stored.updated_at = Utc::now();
        records.insert(key, stored);
        Ok(revision)
    }

    async fn delete(&self, key: &CredentialKey, guard: WriteGuard) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        let current = records.get(key);

        if current.is_none() {
            return match guard {
                WriteGuard::Revision(_) => Err(StoreError::Conflict),
                _ => Ok(false),
            };
        }
        if !guard_holds(current, guard) {
            return Err(StoreError::Conflict);
        }

        Ok(records.remove(key).is_some())
    }

    async fn delete_by_user(&self, user: &UserId, method: &str) -> Result<usize, StoreError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|key, _| !(&key.user == user && key.method == method));
        Ok(before - records.len())
    }
}
