//! Writer identity and account state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default monthly generation quota for non-admin writers.
pub const DEFAULT_MONTHLY_LIMIT: u32 = 50;

/// Writer's political status. Drives title wording and role-phrase suppression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WriterStatus {
    /// Sitting office holder (현역).
    #[default]
    #[serde(rename = "현역", alias = "active")]
    Active,
    /// Registered candidate (후보).
    #[serde(rename = "후보", alias = "candidate")]
    Candidate,
    /// Preliminary candidate (예비). No official-role phrasing is allowed.
    #[serde(rename = "예비", alias = "preliminary")]
    Preliminary,
}

impl WriterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "현역",
            Self::Candidate => "후보",
            Self::Preliminary => "예비",
        }
    }

    /// Whether official-role language must be suppressed.
    pub fn suppresses_titles(&self) -> bool {
        matches!(self, Self::Preliminary)
    }
}

impl std::fmt::Display for WriterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generation counters stored on the writer's account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UsageCounters {
    pub posts_generated: u32,
    pub monthly_limit: u32,
    pub bonus_generated: u32,
    pub bonus_used: u32,
}

impl Default for UsageCounters {
    fn default() -> Self {
        Self {
            posts_generated: 0,
            monthly_limit: DEFAULT_MONTHLY_LIMIT,
            bonus_generated: 0,
            bonus_used: 0,
        }
    }
}

impl UsageCounters {
    pub fn available_bonus(&self) -> u32 {
        self.bonus_generated.saturating_sub(self.bonus_used)
    }

    pub fn monthly_exhausted(&self) -> bool {
        self.posts_generated >= self.monthly_limit
    }
}

/// The fixed identity a draft is written under, plus persona attributes used
/// for personalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WriterProfile {
    pub name: String,
    /// Office or position, e.g. `국회의원`, `시의원`.
    pub position: String,
    pub region_metro: String,
    pub region_local: String,
    pub electoral_district: String,
    pub status: WriterStatus,

    pub age_decade: Option<String>,
    pub age_detail: Option<String>,
    pub family_status: Option<String>,
    pub background_career: Option<String>,
    pub political_experience: Option<String>,
    pub committees: Vec<String>,
    pub local_connection: Option<String>,

    pub is_admin: bool,
    pub usage: UsageCounters,
    /// `YYYY-MM-DD` → drafts generated that day.
    pub daily_usage: BTreeMap<String, u32>,
}

/// Location suffixes that take `민` directly to form a resident address.
const LOCATION_SUFFIXES: &[char] = &['시', '군', '구', '도'];

impl WriterProfile {
    /// Profile used when the store has nothing for a writer.
    pub fn fallback() -> Self {
        Self {
            name: "사용자".to_string(),
            ..Self::default()
        }
    }

    /// Title used in output, conditioned on status.
    ///
    /// Preliminary writers get no title at all.
    pub fn effective_title(&self) -> String {
        let position = self.position.trim();
        match self.status {
            WriterStatus::Active if position.is_empty() => "의원".to_string(),
            WriterStatus::Active => position.to_string(),
            WriterStatus::Candidate if position.is_empty() => "후보".to_string(),
            WriterStatus::Candidate => format!("{position} 후보"),
            WriterStatus::Preliminary => String::new(),
        }
    }

    /// Local region if set, else metro region. Empty when neither is configured.
    pub fn primary_region(&self) -> &str {
        let local = self.region_local.trim();
        if local.is_empty() {
            self.region_metro.trim()
        } else {
            local
        }
    }

    pub fn has_region(&self) -> bool {
        !self.primary_region().is_empty()
    }

    /// Resident address form of the primary region.
    ///
    /// `남양주시` → `남양주시민`, `해운대구` → `해운대구민`, `세종` → `세종 주민`.
    pub fn region_address(&self) -> String {
        let region = self.primary_region();
        if region.is_empty() {
            return String::new();
        }
        if region.ends_with(LOCATION_SUFFIXES) {
            format!("{region}민")
        } else {
            format!("{region} 주민")
        }
    }

    /// Region name with its location suffix removed, if what remains is still
    /// a usable token (two or more characters).
    ///
    /// `남양주시` → `남양주`, `중구` → `None`.
    pub fn region_base(&self) -> Option<&str> {
        let region = self.primary_region();
        let base = region.strip_suffix(LOCATION_SUFFIXES)?;
        (base.chars().count() >= 2).then_some(base)
    }

    /// Drafts generated on the given day key.
    pub fn generated_on(&self, day_key: &str) -> u32 {
        self.daily_usage.get(day_key).copied().unwrap_or(0)
    }
}
