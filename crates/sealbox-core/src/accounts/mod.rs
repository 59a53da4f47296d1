//! Read-only view of the web application's user accounts.
//!
//! Sealbox owns no user storage. It consults an external credential store
//! to pick a default administrator and to check an admin password before
//! that password is used as a sealing passphrase.

pub mod hashers;
mod memory;
mod sqlite;

pub use memory::MemoryCredentialStore;
pub use sqlite::SqliteCredentialStore;

use crate::error::Result;

/// A user account as seen by the credential store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub is_superuser: bool,
    pub is_staff: bool,
    pub is_active: bool,
}

impl Account {
    /// Convenience constructor for an active account.
    pub fn new(id: i64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            is_superuser: false,
            is_staff: false,
            is_active: true,
        }
    }

    pub fn staff(mut self) -> Self {
        self.is_staff = true;
        self
    }

    pub fn superuser(mut self) -> Self {
        self.is_superuser = true;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// Source of account records and password checks.
pub trait CredentialStore {
    /// All accounts, ordered by id ascending (creation order).
    fn accounts(&self) -> Result<Vec<Account>>;

    /// Check `password` for `username`.
    ///
    /// Returns `Ok(None)` for unknown users, wrong passwords and inactive
    /// accounts; errors are reserved for store failures.
    fn authenticate(&self, username: &str, password: &str) -> Result<Option<Account>>;
}
