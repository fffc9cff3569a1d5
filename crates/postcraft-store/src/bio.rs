//! Bio documents: personalization metadata extracted from a writer's self-introduction.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PoliticalStance {
    pub progressive: f32,
    pub conservative: f32,
    pub moderate: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommunicationStyle {
    /// `warm` or `formal`.
    pub tone: Option<String>,
    /// `inclusive` or `collaborative`.
    pub approach: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyWeight {
    pub weight: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocalConnection {
    pub strength: f32,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WritingPreferences {
    pub include_personal_experience: f32,
    pub use_statistics: f32,
    pub focus_on_future: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationProfile {
    pub likely_preferences: WritingPreferences,
}

/// Metadata extracted from a writer's bio, used to bias tone and focus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BioMetadata {
    pub political_stance: PoliticalStance,
    pub communication_style: CommunicationStyle,
    /// Policy area (`economy`, `education`, ...) → weight.
    pub policy_focus: BTreeMap<String, PolicyWeight>,
    pub local_connection: LocalConnection,
    pub generation_profile: GenerationProfile,
}

impl BioMetadata {
    /// Policy area with the highest weight, if any.
    pub fn top_policy(&self) -> Option<(&str, f32)> {
        self.policy_focus
            .iter()
            .map(|(k, v)| (k.as_str(), v.weight))
            .fold(None, |best, cur| match best {
                Some((_, w)) if w >= cur.1 => best,
                _ => Some(cur),
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BioUsage {
    pub generated_posts_count: u32,
    /// RFC 3339 timestamp of the last draft that used this bio.
    pub last_used_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BioDocument {
    pub extracted_metadata: Option<BioMetadata>,
    pub usage: BioUsage,
}
