//! Database module - MySQL implementations using SQLx
//!
//! - Connection pool management and embedded migrations
//! - The credential table behind the `CredentialStore` trait

pub mod connection;
pub mod credential_store;

// Re-export commonly used types
pub use connection::DatabasePool;
pub use credential_store::MySqlCredentialStore;
