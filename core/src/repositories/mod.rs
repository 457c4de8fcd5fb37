pub mod credential;

pub use credential::{CredentialStore, InMemoryCredentialStore, StoreError, WriteGuard};
