//! MySQL implementation of the CredentialStore trait.
//!
//! Writes run in a short transaction that locks the row (`SELECT ... FOR
//! UPDATE`), checks the write guard against the stored revision and then
//! inserts or updates with the revision bumped. Two inserts racing for the
//! same key collide on the primary key and the loser sees `Conflict`.
//! Exclusive Verified rows also fill the generated `claimed_value` column,
//! whose unique index turns a second user's Verified write into `Claimed`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use cv_core::{
    CredentialKey, CredentialRecord, CredentialState, CredentialStore, StoreError, UserId,
    WriteGuard,
};

/// Unique index over (method, claimed_value)
const CLAIM_INDEX: &str = "uq_credentials_claimed_value";

const SELECT_COLUMNS: &str = "SELECT user_id, method, value, state, exclusive, secret_hash, token_id, \
     temp_token, retry_count, requested_at, expires_at, delivered_at, message_id, verified_at, \
     created_at, updated_at, revision FROM credentials";

/// MySQL implementation of CredentialStore
pub struct MySqlCredentialStore {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlCredentialStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Convert database row to CredentialRecord entity
    fn row_to_record(row: &MySqlRow) -> Result<CredentialRecord, StoreError> {
        let user: String = row.try_get("user_id").map_err(unavailable)?;
        let state: String = row.try_get("state").map_err(unavailable)?;
        let token_id: Option<String> = row.try_get("token_id").map_err(unavailable)?;

        Ok(CredentialRecord {
            user: UserId::new(user).map_err(corrupt)?,
            method: row.try_get("method").map_err(unavailable)?,
            value: row.try_get("value").map_err(unavailable)?,
            state: state.parse::<CredentialState>().map_err(corrupt)?,
            exclusive: row.try_get("exclusive").map_err(unavailable)?,
            secret_hash: row.try_get("secret_hash").map_err(unavailable)?,
            token_id: token_id
                .map(|id| Uuid::parse_str(&id))
                .transpose()
                .map_err(corrupt)?,
            temp_token: row.try_get("temp_token").map_err(unavailable)?,
            retry_count: row.try_get("retry_count").map_err(unavailable)?,
            requested_at: row.try_get("requested_at").map_err(unavailable)?,
            expires_at: row.try_get("expires_at").map_err(unavailable)?,
            delivered_at: row.try_get("delivered_at").map_err(unavailable)?,
            message_id: row.try_get("message_id").map_err(unavailable)?,
            verified_at: row.try_get("verified_at").map_err(unavailable)?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(unavailable)?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at").map_err(unavailable)?,
            revision: row.try_get("revision").map_err(unavailable)?,
        })
    }
}

fn unavailable(e: sqlx::Error) -> StoreError {
    StoreError::Unavailable {
        message: e.to_string(),
    }
}

fn corrupt(e: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable {
        message: format!("Corrupt credential row: {}", e),
    }
}

/// A duplicate on the claim index means another user verified the value;
/// any other duplicate key means another writer inserted first
fn write_error(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            unique_violation(db.constraint(), db.message())
        }
        _ => unavailable(e),
    }
}

// MySQL reports the key name only inside the message text
fn unique_violation(constraint: Option<&str>, message: &str) -> StoreError {
    if constraint == Some(CLAIM_INDEX) || message.contains(CLAIM_INDEX) {
        StoreError::Claimed
    } else {
        StoreError::Conflict
    }
}

/// Whether `guard` accepts a row whose stored revision is `current`
pub(crate) fn guard_holds(current: Option<u64>, guard: WriteGuard) -> bool {
    match guard {
        WriteGuard::Any => true,
        WriteGuard::Absent => current.is_none(),
        WriteGuard::Revision(expected) => current == Some(expected),
    }
}

#[async_trait]
impl CredentialStore for MySqlCredentialStore {
    async fn find(&self, key: &CredentialKey) -> Result<Option<CredentialRecord>, StoreError> {
        let query = format!(
            "{} WHERE user_id = ? AND method = ? AND value = ? LIMIT 1",
            SELECT_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(key.user.as_str())
            .bind(&key.method)
            .bind(&key.value)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn find_by_user(
        &self,
        user: &UserId,
        method: &str,
    ) -> Result<Vec<CredentialRecord>, StoreError> {
        let query = format!("{} WHERE user_id = ? AND method = ?", SELECT_COLUMNS);

        let rows = sqlx::query(&query)
            .bind(user.as_str())
            .bind(method)
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)?;

        rows.iter().map(Self::row_to_record).collect()
    }

    async fn find_verified_by_value(
        &self,
        method: &str,
        value: &str,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        let query = format!(
            "{} WHERE method = ? AND value = ? AND state = ? LIMIT 1",
            SELECT_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(method)
            .bind(value)
            .bind(CredentialState::Verified.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn upsert(
        &self,
        record: &CredentialRecord,
        guard: WriteGuard,
    ) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await.map_err(unavailable)?;

        let current: Option<u64> = sqlx::query_scalar(
            "SELECT revision FROM credentials WHERE user_id = ? AND method = ? AND value = ? FOR UPDATE",
        )
        .bind(record.user.as_str())
        .bind(&record.method)
        .bind(&record.value)
        .fetch_optional(&mut *tx)
        .await
        .map_err(unavailable)?;

        if !guard_holds(current, guard) {
            return Err(StoreError::Conflict);
        }

        let revision = current.unwrap_or(0) + 1;
        let now = Utc::now();
        let token_id = record.token_id.map(|id| id.to_string());

        let statement = if current.is_some() {
            r#"
            UPDATE credentials
            SET state = ?, exclusive = ?, secret_hash = ?, token_id = ?, temp_token = ?,
                retry_count = ?,
                requested_at = ?, expires_at = ?, delivered_at = ?, message_id = ?,
                verified_at = ?, created_at = ?, updated_at = ?, revision = ?
            WHERE user_id = ? AND method = ? AND value = ?
            "#
        } else {
            r#"
            INSERT INTO credentials (
                state, exclusive, secret_hash, token_id, temp_token, retry_count,
                requested_at, expires_at, delivered_at, message_id,
                verified_at, created_at, updated_at, revision,
                user_id, method, value
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        };

        sqlx::query(statement)
            .bind(record.state.as_str())
            .bind(record.exclusive)
            .bind(record.secret_hash.as_deref())
            .bind(token_id)
            .bind(record.temp_token.as_deref())
            .bind(record.retry_count)
            .bind(record.requested_at)
            .bind(record.expires_at)
            .bind(record.delivered_at)
            .bind(record.message_id.as_deref())
            .bind(record.verified_at)
            .bind(record.created_at)
            .bind(now)
            .bind(revision)
            .bind(record.user.as_str())
            .bind(&record.method)
            .bind(&record.value)
            .execute(&mut *tx)
            .await
            .map_err(write_error)?;

        tx.commit().await.map_err(unavailable)?;
        Ok(revision)
    }

    async fn delete(&self, key: &CredentialKey, guard: WriteGuard) -> Result<bool, StoreError> {
        match guard {
            WriteGuard::Any => {
                let result = sqlx::query(
                    "DELETE FROM credentials WHERE user_id = ? AND method = ? AND value = ?",
                )
                .bind(key.user.as_str())
                .bind(&key.method)
                .bind(&key.value)
                .execute(&self.pool)
                .await
                .map_err(unavailable)?;
                Ok(result.rows_affected() > 0)
            }
            WriteGuard::Absent => {
                // Deleting "only if absent" removes nothing; it fails if a row exists
                match self.find(key).await? {
                    Some(_) => Err(StoreError::Conflict),
                    None => Ok(false),
                }
            }
            WriteGuard::Revision(expected) => {
                let result = sqlx::query(
                    "DELETE FROM credentials WHERE user_id = ? AND method = ? AND value = ? AND revision = ?",
                )
                .bind(key.user.as_str())
                .bind(&key.method)
                .bind(&key.value)
                .bind(expected)
                .execute(&self.pool)
                .await
                .map_err(unavailable)?;

                if result.rows_affected() == 0 {
                    return Err(StoreError::Conflict);
                }
                Ok(true)
            }
        }
    }

    async fn delete_by_user(&self, user: &UserId, method: &str) -> Result<usize, StoreError> {
        let result = sqlx::query("DELETE FROM credentials WHERE user_id = ? AND method = ?")
            .bind(user.as_str())
            .bind(method)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        Ok(result.rows_affected() as usize)
    }
}
