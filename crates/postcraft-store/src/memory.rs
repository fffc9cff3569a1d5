//! In-process store, used by tests and single-shot CLI runs.

use std::collections::HashMap;

use postcraft_core::{UsageCounters, WriterProfile};
use tokio::sync::RwLock;
use tracing::debug;

use crate::{BioDocument, ProfileStore, StoreError, UsageKind, apply_usage};

#[derive(Debug, Default)]
pub struct InMemoryStore {
    profiles: RwLock<HashMap<String, WriterProfile>>,
    bios: RwLock<HashMap<String, BioDocument>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, uid: impl Into<String>, profile: WriterProfile) -> Self {
        self.profiles.get_mut().insert(uid.into(), profile);
        self
    }

    pub fn with_bio(mut self, uid: impl Into<String>, bio: BioDocument) -> Self {
        self.bios.get_mut().insert(uid.into(), bio);
        self
    }

    pub async fn insert_profile(&self, uid: impl Into<String>, profile: WriterProfile) {
        self.profiles.write().await.insert(uid.into(), profile);
    }

    pub async fn insert_bio(&self, uid: impl Into<String>, bio: BioDocument) {
        self.bios.write().await.insert(uid.into(), bio);
    }
}

#[async_trait::async_trait]
impl ProfileStore for InMemoryStore {
    async fn load_profile(&self, uid: &str) -> Result<WriterProfile, StoreError> {
        self.profiles
            .read()
            .await
            .get(uid)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(uid.to_string()))
    }

    async fn load_bio(&self, uid: &str) -> Result<Option<BioDocument>, StoreError> {
        Ok(self.bios.read().await.get(uid).cloned())
    }

    async fn commit_usage(
        &self,
        uid: &str,
        kind: UsageKind,
        day_key: &str,
    ) -> Result<UsageCounters, StoreError> {
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .get_mut(uid)
            .ok_or_else(|| StoreError::NotFound(uid.to_string()))?;
        let usage = apply_usage(profile, kind, day_key)?;
        debug!(
            uid,
            ?kind,
            posts = usage.posts_generated,
            bonus_used = usage.bonus_used,
            "usage committed"
        );
        Ok(usage)
    }

    async fn bump_bio_usage(&self, uid: &str, used_at: &str) -> Result<(), StoreError> {
        let mut bios = self.bios.write().await;
        if let Some(bio) = bios.get_mut(uid) {
            bio.usage.generated_posts_count += 1;
            bio.usage.last_used_at = Some(used_at.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn writer(limit: u32) -> WriterProfile {
        WriterProfile {
            name: "홍길동".into(),
            usage: UsageCounters {
                monthly_limit: limit,
                ..UsageCounters::default()
            },
            ..WriterProfile::default()
        }
    }

    #[tokio::test]
    async fn missing_profile_is_not_found() {
        let store = InMemoryStore::new();
        assert!(matches!(
            store.load_profile("nobody").await,
            Err(StoreError::NotFound(_))
        ));
        assert!(store.load_bio("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn concurrent_commits_never_exceed_limit() {
        let store = Arc::new(InMemoryStore::new().with_profile("u1", writer(5)));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.commit_usage("u1", UsageKind::Standard, "2026-10-16").await
            }));
        }
        let mut ok = 0;
        for h in handles {
            if h.await.unwrap().is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 5);
        let profile = store.load_profile("u1").await.unwrap();
        assert_eq!(profile.usage.posts_generated, 5);
        assert_eq!(profile.generated_on("2026-10-16"), 5);
    }

    #[tokio::test]
    async fn bio_usage_is_bumped() {
        let store = InMemoryStore::new().with_bio("u1", BioDocument::default());
        store.bump_bio_usage("u1", "2026-10-16T00:00:00Z").await.unwrap();
        let bio = store.load_bio("u1").await.unwrap().unwrap();
        assert_eq!(bio.usage.generated_posts_count, 1);
        assert_eq!(bio.usage.last_used_at.as_deref(), Some("2026-10-16T00:00:00Z"));
    }
}
