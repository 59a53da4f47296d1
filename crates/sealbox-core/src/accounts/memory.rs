//! In-memory credential store for tests and embedders.

use super::hashers::verify_password;
use super::{Account, CredentialStore};
use crate::error::Result;

/// Accounts paired with encoded password hashes.
#[derive(Debug, Default, Clone)]
pub struct MemoryCredentialStore {
    entries: Vec<(Account, String)>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with_account(mut self, account: Account, encoded_hash: impl Into<String>) -> Self {
        self.add_account(account, encoded_hash);
        self
    }

    pub fn add_account(&mut self, account: Account, encoded_hash: impl Into<String>) {
        self.entries.retain(|(existing, _)| existing.username != account.username);
        self.entries.push((account, encoded_hash.into()));
        self.entries.sort_by_key(|(account, _)| account.id);
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn accounts(&self) -> Result<Vec<Account>> {
        Ok(self.entries.iter().map(|(a, _)| a.clone()).collect())
    }

    fn authenticate(&self, username: &str, password: &str) -> Result<Option<Account>> {
        Ok(self
            .entries
            .iter()
            .find(|(account, _)| account.username == username)
            .filter(|(account, encoded)| account.is_active && verify_password(password, encoded))
            .map(|(account, _)| account.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::hashers::make_pbkdf2_sha256;

    #[test]
    fn test_accounts_sorted_regardless_of_insert_order() {
        let store = MemoryCredentialStore::new()
            .with_account(Account::new(9, "late"), "!")
            .with_account(Account::new(2, "early"), "!");
        let ids: Vec<i64> = store.accounts().unwrap().iter().map(|a| a.id).collect();
        assert_eq!(ids, [2, 9]);
    }

    #[test]
    fn test_authenticate_checks_hash_and_activity() {
        let hash = make_pbkdf2_sha256("pw", "salt", 10).unwrap();
        let store = MemoryCredentialStore::new()
            .with_account(Account::new(1, "active").staff(), hash.clone())
            .with_account(Account::new(2, "gone").staff().inactive(), hash);

        assert!(store.authenticate("active", "pw").unwrap().is_some());
        assert!(store.authenticate("active", "nope").unwrap().is_none());
        assert!(store.authenticate("gone", "pw").unwrap().is_none());
    }
}
