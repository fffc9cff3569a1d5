//! JSON-file store: one document per writer under a data directory.
//!
//! Layout:
//!
//! ```text
//! <root>/profiles/<uid>.json
//! <root>/bios/<uid>.json
//! ```
//!
//! Writes go to a sibling `.tmp` file and are renamed into place. A process-wide
//! mutex serializes read-modify-write cycles, so `commit_usage` is atomic for
//! every caller sharing this store.

use std::path::{Path, PathBuf};

use postcraft_core::{UsageCounters, WriterProfile};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{BioDocument, ProfileStore, StoreError, UsageKind, apply_usage};

pub struct JsonFileStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open a store rooted at `root`, creating the directory layout if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        tokio::fs::create_dir_all(root.join("profiles")).await?;
        tokio::fs::create_dir_all(root.join("bios")).await?;
        info!(root = %root.display(), "opened json store");
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn profile_path(&self, uid: &str) -> Result<PathBuf, StoreError> {
        Ok(self.root.join("profiles").join(document_name(uid)?))
    }

    fn bio_path(&self, uid: &str) -> Result<PathBuf, StoreError> {
        Ok(self.root.join("bios").join(document_name(uid)?))
    }

    /// Write a profile document, replacing any existing one.
    pub async fn save_profile(&self, uid: &str, profile: &WriterProfile) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        write_json(&self.profile_path(uid)?, profile).await
    }

    /// Write a bio document, replacing any existing one.
    pub async fn save_bio(&self, uid: &str, bio: &BioDocument) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        write_json(&self.bio_path(uid)?, bio).await
    }
}

/// File name for a user id. Ids that could escape the data directory are rejected.
fn document_name(uid: &str) -> Result<String, StoreError> {
    let valid = !uid.is_empty()
        && uid
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(format!("{uid}.json"))
    } else {
        Err(StoreError::Other(format!("invalid user id: {uid:?}")))
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait::async_trait]
impl ProfileStore for JsonFileStore {
    async fn load_profile(&self, uid: &str) -> Result<WriterProfile, StoreError> {
        read_json(&self.profile_path(uid)?)
            .await?
            .ok_or_else(|| StoreError::NotFound(uid.to_string()))
    }

    async fn load_bio(&self, uid: &str) -> Result<Option<BioDocument>, StoreError> {
        read_json(&self.bio_path(uid)?).await
    }

    async fn commit_usage(
        &self,
        uid: &str,
        kind: UsageKind,
        day_key: &str,
    ) -> Result<UsageCounters, StoreError> {
        let _guard = self.write_lock.lock().await;
        let path = self.profile_path(uid)?;
        let mut profile: WriterProfile = read_json(&path)
            .await?
            .ok_or_else(|| StoreError::NotFound(uid.to_string()))?;
        let usage = apply_usage(&mut profile, kind, day_key)?;
        write_json(&path, &profile).await?;
        debug!(uid, ?kind, posts = usage.posts_generated, "usage committed");
        Ok(usage)
    }

    async fn bump_bio_usage(&self, uid: &str, used_at: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let path = self.bio_path(uid)?;
        let Some(mut bio) = read_json::<BioDocument>(&path).await? else {
            return Ok(());
        };
        bio.usage.generated_posts_count += 1;
        bio.usage.last_used_at = Some(used_at.to_string());
        write_json(&path, &bio).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn profile_round_trips_through_disk() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::open(tmp.path()).await.unwrap();
        let profile = WriterProfile {
            name: "홍길동".into(),
            region_local: "남양주시".into(),
            ..WriterProfile::default()
        };
        store.save_profile("u1", &profile).await.unwrap();

        let reopened = JsonFileStore::open(tmp.path()).await.unwrap();
        assert_eq!(reopened.load_profile("u1").await.unwrap(), profile);
    }

    #[tokio::test]
    async fn commit_usage_persists() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::open(tmp.path()).await.unwrap();
        store
            .save_profile("u1", &WriterProfile::fallback())
            .await
            .unwrap();

        store
            .commit_usage("u1", UsageKind::Standard, "2026-10-16")
            .await
            .unwrap();
        let profile = store.load_profile("u1").await.unwrap();
        assert_eq!(profile.usage.posts_generated, 1);
        assert_eq!(profile.generated_on("2026-10-16"), 1);
    }

    #[tokio::test]
    async fn missing_documents() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::open(tmp.path()).await.unwrap();
        assert!(matches!(
            store.load_profile("ghost").await,
            Err(StoreError::NotFound(_))
        ));
        assert!(store.load_bio("ghost").await.unwrap().is_none());
        store.bump_bio_usage("ghost", "2026-10-16T00:00:00Z").await.unwrap();
    }

    #[tokio::test]
    async fn rejects_path_like_ids() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::open(tmp.path()).await.unwrap();
        assert!(matches!(
            store.load_profile("../etc/passwd").await,
            Err(StoreError::Other(_))
        ));
    }
}
