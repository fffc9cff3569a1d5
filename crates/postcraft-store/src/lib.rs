//! Storage collaborators: writer profiles, usage counters, and bio documents.
//!
//! [`ProfileStore::commit_usage`] is the only place quota is enforced. Callers
//! may pre-check counters on a loaded profile to fail fast, but only the
//! atomic check-and-increment decides.

mod bio;
mod error;
mod file;
mod memory;

pub use bio::{
    BioDocument, BioMetadata, BioUsage, CommunicationStyle, GenerationProfile, LocalConnection,
    PoliticalStance, PolicyWeight, WritingPreferences,
};
pub use error::StoreError;
pub use file::JsonFileStore;
pub use memory::InMemoryStore;

use postcraft_core::{UsageCounters, WriterProfile};

/// Which quota pool a draft draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageKind {
    /// Monthly generation quota.
    Standard,
    /// Bonus credits, consumed instead of the monthly quota.
    Bonus,
}

#[async_trait::async_trait]
pub trait ProfileStore: Send + Sync {
    /// Load a writer's profile with its usage counters.
    async fn load_profile(&self, uid: &str) -> Result<WriterProfile, StoreError>;

    /// Load a writer's bio document, if one exists.
    async fn load_bio(&self, uid: &str) -> Result<Option<BioDocument>, StoreError>;

    /// Atomically check the quota pool and record one generated draft.
    ///
    /// Standard usage fails with [`StoreError::QuotaExceeded`] once the monthly
    /// limit is reached (admins are exempt and not counted). Bonus usage fails
    /// with [`StoreError::NoBonus`] when no credit is left. Returns the counters
    /// after the increment.
    async fn commit_usage(
        &self,
        uid: &str,
        kind: UsageKind,
        day_key: &str,
    ) -> Result<UsageCounters, StoreError>;

    /// Record that the bio was used for a draft.
    async fn bump_bio_usage(&self, uid: &str, used_at: &str) -> Result<(), StoreError>;
}

/// Apply one usage commit to a profile in place.
///
/// Shared by every store so the quota rules live in one place.
pub(crate) fn apply_usage(
    profile: &mut WriterProfile,
    kind: UsageKind,
    day_key: &str,
) -> Result<UsageCounters, StoreError> {
    match kind {
        UsageKind::Bonus => {
            if profile.usage.available_bonus() == 0 {
                return Err(StoreError::NoBonus);
            }
            profile.usage.bonus_used += 1;
            if !profile.is_admin {
                *profile.daily_usage.entry(day_key.to_string()).or_insert(0) += 1;
            }
        }
        UsageKind::Standard if profile.is_admin => {}
        UsageKind::Standard => {
            if profile.usage.monthly_exhausted() {
                return Err(StoreError::QuotaExceeded {
                    used: profile.usage.posts_generated,
                    limit: profile.usage.monthly_limit,
                });
            }
            profile.usage.posts_generated += 1;
            *profile.daily_usage.entry(day_key.to_string()).or_insert(0) += 1;
        }
    }
    Ok(profile.usage.clone())
}
