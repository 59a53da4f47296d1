//! Credential store backed by the web application's SQLite database.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags, OptionalExtension, Row};
use tracing::debug;

use super::hashers::verify_password;
use super::{Account, CredentialStore};
use crate::error::{Result, SealError};

/// Reads the `auth_user` table of an existing database, read-only.
pub struct SqliteCredentialStore {
    path: PathBuf,
    conn: Connection,
}

impl SqliteCredentialStore {
    /// Open the database at `path` without creating it.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SealError::CredentialStore(format!(
                "Credential database not found: {}",
                path.display()
            )));
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            SealError::CredentialStore(format!("Failed to open {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "opened credential store");
        Ok(Self {
            path: path.to_path_buf(),
            conn,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
        Ok(Account {
            id: row.get(0)?,
            username: row.get(1)?,
            is_superuser: row.get(2)?,
            is_staff: row.get(3)?,
            is_active: row.get(4)?,
        })
    }
}

impl CredentialStore for SqliteCredentialStore {
    fn accounts(&self) -> Result<Vec<Account>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, username, is_superuser, is_staff, is_active
             FROM auth_user ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], Self::account_from_row)?;
        let accounts = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(accounts)
    }

    fn authenticate(&self, username: &str, password: &str) -> Result<Option<Account>> {
        let found = self
            .conn
            .query_row(
                "SELECT id, username, is_superuser, is_staff, is_active, password
                 FROM auth_user WHERE username = ?1",
                [username],
                |row| Ok((Self::account_from_row(row)?, row.get::<_, String>(5)?)),
            )
            .optional()?;

        let Some((account, encoded)) = found else {
            return Ok(None);
        };
        if !account.is_active || !verify_password(password, &encoded) {
            return Ok(None);
        }
        Ok(Some(account))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::hashers::make_pbkdf2_sha256;
    use tempfile::tempdir;

    fn seed(path: &Path) {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(
            "CREATE TABLE auth_user (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                password VARCHAR(128) NOT NULL,
                last_login DATETIME NULL,
                is_superuser BOOL NOT NULL,
                username VARCHAR(150) NOT NULL UNIQUE,
                first_name VARCHAR(150) NOT NULL DEFAULT '',
                last_name VARCHAR(150) NOT NULL DEFAULT '',
                email VARCHAR(254) NOT NULL DEFAULT '',
                is_staff BOOL NOT NULL,
                is_active BOOL NOT NULL,
                date_joined DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            );",
        )
        .unwrap();
        let hash = make_pbkdf2_sha256("CorrectAdminPw!", "seed", 1_000).unwrap();
        for (username, superuser, staff, active) in [
            ("instructor", false, false, true),
            ("secretary", false, true, true),
            ("director", true, true, true),
            ("former", false, true, false),
        ] {
            conn.execute(
                "INSERT INTO auth_user (password, is_superuser, username, is_staff, is_active)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![hash, superuser, username, staff, active],
            )
            .unwrap();
        }
    }

    #[test]
    fn test_accounts_ordered_by_id() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.sqlite3");
        seed(&path);

        let store = SqliteCredentialStore::open(&path).unwrap();
        let accounts = store.accounts().unwrap();
        let names: Vec<&str> = accounts.iter().map(|a| a.username.as_str()).collect();
        assert_eq!(names, ["instructor", "secretary", "director", "former"]);
        assert!(accounts[2].is_superuser);
        assert!(!accounts[3].is_active);
    }

    #[test]
    fn test_authenticate() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.sqlite3");
        seed(&path);
        let store = SqliteCredentialStore::open(&path).unwrap();

        let account = store
            .authenticate("director", "CorrectAdminPw!")
            .unwrap()
            .expect("director should authenticate");
        assert_eq!(account.id, 3);

        assert!(store.authenticate("director", "WrongPw").unwrap().is_none());
        assert!(store.authenticate("nobody", "CorrectAdminPw!").unwrap().is_none());
        assert!(store.authenticate("former", "CorrectAdminPw!").unwrap().is_none());
    }

    #[test]
    fn test_missing_database() {
        let dir = tempdir().unwrap();
        let result = SqliteCredentialStore::open(&dir.path().join("absent.sqlite3"));
        assert!(matches!(result, Err(SealError::CredentialStore(_))));
    }

    #[test]
    fn test_missing_table_is_store_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.sqlite3");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE other (id INTEGER);")
            .unwrap();
        let store = SqliteCredentialStore::open(&path).unwrap();
        assert!(matches!(
            store.accounts(),
            Err(SealError::CredentialStore(_))
        ));
    }
}
