//! The user entity and its persistent store.
//!
//! Records live in a single JSON file. Every operation reads the file fresh
//! and mutations write it back whole, with one async mutex serializing the
//! read-modify-write cycles.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("record is invalid")]
    InvalidRecord,
    #[error("user not found")]
    NotFound,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// A user in the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
}

impl User {
    fn validate(&self) -> Result<(), UserError> {
        if self.name.is_empty() {
            return Err(UserError::InvalidRecord);
        }
        Ok(())
    }
}

/// JSON-file-backed user store.
pub struct UserDb {
    path: PathBuf,
    lock: Mutex<()>,
}

impl UserDb {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<Uuid, User>, UserError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn persist(&self, records: &BTreeMap<Uuid, User>) -> Result<(), UserError> {
        let bytes = serde_json::to_vec_pretty(records)?;
        fs::write(&self.path, bytes).await?;
        Ok(())
    }

    /// All users, ordered by id.
    pub async fn all(&self) -> Result<Vec<User>, UserError> {
        let _guard = self.lock.lock().await;
        let records = self.load().await?;
        Ok(records.into_values().collect())
    }

    /// A single user record.
    pub async fn one(&self, id: Uuid) -> Result<User, UserError> {
        let _guard = self.lock.lock().await;
        let records = self.load().await?;
        records.get(&id).cloned().ok_or(UserError::NotFound)
    }

    /// Create or replace a user after validating it.
    pub async fn save(&self, user: &User) -> Result<(), UserError> {
        user.validate()?;

        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        records.insert(user.id, user.clone());
        self.persist(&records).await?;

        debug!(
            target: "restux::user",
            id = %user.id,
            "Saved user record"
        );
        Ok(())
    }

    /// Remove a user record.
    pub async fn delete(&self, id: Uuid) -> Result<(), UserError> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        if records.remove(&id).is_none() {
            return Err(UserError::NotFound);
        }
        self.persist(&records).await?;

        debug!(
            target: "restux::user",
            id = %id,
            "Deleted user record"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{User, UserDb, UserError};
    use uuid::Uuid;

    fn scratch_db(dir: &tempfile::TempDir) -> UserDb {
        UserDb::new(dir.path().join("users.json"))
    }

    fn user(name: &str, role: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: name.into(),
            role: role.into(),
        }
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let db = scratch_db(&dir);

        assert!(db.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let db = scratch_db(&dir);

        let u = user("John", "admin");
        db.save(&u).await.unwrap();

        assert_eq!(db.one(u.id).await.unwrap(), u);
        assert_eq!(db.all().await.unwrap(), vec![u]);
    }

    #[tokio::test]
    async fn save_replaces_an_existing_record() {
        let dir = tempfile::tempdir().unwrap();
        let db = scratch_db(&dir);

        let mut u = user("John", "admin");
        db.save(&u).await.unwrap();

        u.role = "viewer".into();
        db.save(&u).await.unwrap();

        assert_eq!(db.one(u.id).await.unwrap().role, "viewer");
        assert_eq!(db.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let db = scratch_db(&dir);

        let err = db.save(&user("", "admin")).await.unwrap_err();
        assert!(matches!(err, UserError::InvalidRecord));
        assert!(db.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_ids_report_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let db = scratch_db(&dir);

        assert!(matches!(
            db.one(Uuid::new_v4()).await.unwrap_err(),
            UserError::NotFound
        ));
        assert!(matches!(
            db.delete(Uuid::new_v4()).await.unwrap_err(),
            UserError::NotFound
        ));
    }

    #[tokio::test]
    async fn delete_removes_the_record() {
        let dir = tempfile::tempdir().unwrap();
        let db = scratch_db(&dir);

        let u = user("John", "admin");
        db.save(&u).await.unwrap();
        db.delete(u.id).await.unwrap();

        assert!(matches!(
            db.one(u.id).await.unwrap_err(),
            UserError::NotFound
        ));
    }
}
