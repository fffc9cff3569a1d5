//! Checklist keyword extraction from background facts.
//!
//! Salient tokens are pulled from free text with seven pattern families and
//! handed to the prompt as explicit per-item obligations.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::request::Background;

/// Pattern family a checklist keyword was matched by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeywordFamily {
    /// `300여명`, `2회`, `500원`
    NumberUnit,
    /// `홍길동 의원`, `김철수 위원장`
    PersonTitle,
    /// `경기도당`, `교육위원회`
    Organization,
    /// `체육대회`, `간담회`
    Event,
    /// `서울특별시`, `수원시`
    Place,
    /// `2024년`
    Year,
    /// `주차장법`, `청년정책`
    Policy,
}

impl KeywordFamily {
    /// All families in scan order.
    pub const ALL: [KeywordFamily; 7] = [
        Self::NumberUnit,
        Self::PersonTitle,
        Self::Organization,
        Self::Event,
        Self::Place,
        Self::Year,
        Self::Policy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NumberUnit => "number-unit",
            Self::PersonTitle => "person-title",
            Self::Organization => "organization",
            Self::Event => "event",
            Self::Place => "place",
            Self::Year => "year",
            Self::Policy => "policy",
        }
    }

    fn pattern(&self) -> &'static str {
        match self {
            Self::NumberUnit => r"[0-9]+여?[명개회건차월일년원]",
            Self::PersonTitle => {
                r"[가-힣]{2,4}\s+(?:경기도당위원장|국회의원|위원장|의원|시장|도지사|장관|총리|대통령)"
            }
            Self::Organization => r"[가-힣]{2,}(?:도당|시당|구당|위원회|재단|협회|연합)",
            Self::Event => {
                r"[가-힣]{2,}(?:대회|행사|토론회|간담회|설명회|세미나|워크숍|회의|집회|축제)"
            }
            Self::Place => r"[가-힣]{2,}(?:특별시|광역시|도|시|군|구|읍|면|동)",
            Self::Year => r"20[0-9]{2}년",
            Self::Policy => r"[가-힣]{2,}(?:법|조례|정책|사업|계획|방안)",
        }
    }

    fn index(&self) -> usize {
        match self {
            Self::NumberUnit => 0,
            Self::PersonTitle => 1,
            Self::Organization => 2,
            Self::Event => 3,
            Self::Place => 4,
            Self::Year => 5,
            Self::Policy => 6,
        }
    }

    /// Whether `text` matches this family in full.
    pub fn full_match(&self, text: &str) -> bool {
        ANCHORED[self.index()].is_match(text)
    }
}

impl std::fmt::Display for KeywordFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

static SCANNERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    KeywordFamily::ALL
        .iter()
        .map(|f| Regex::new(f.pattern()).expect("keyword pattern must compile"))
        .collect()
});

static ANCHORED: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    KeywordFamily::ALL
        .iter()
        .map(|f| Regex::new(&format!("^(?:{})$", f.pattern())).expect("keyword pattern must compile"))
        .collect()
});

/// A salient token lifted from background text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistKeyword {
    pub text: String,
    pub family: KeywordFamily,
}

/// Extract checklist keywords from background facts.
///
/// Families are scanned in [`KeywordFamily::ALL`] order and the result keeps
/// first-seen order. A string matched by more than one family is kept once,
/// under the first family that produced it, except that four-digit years are
/// always labelled [`KeywordFamily::Year`] even though the number-unit scan
/// reaches them first.
pub fn extract(background: &Background) -> Vec<ChecklistKeyword> {
    let Some(text) = background.joined() else {
        return Vec::new();
    };

    let mut out: Vec<ChecklistKeyword> = Vec::new();
    for (family, scanner) in KeywordFamily::ALL.iter().zip(SCANNERS.iter()) {
        for m in scanner.find_iter(&text) {
            let token = m.as_str();
            if out.iter().any(|k| k.text == token) {
                continue;
            }
            let family = if *family == KeywordFamily::NumberUnit
                && KeywordFamily::Year.full_match(token)
            {
                KeywordFamily::Year
            } else {
                *family
            };
            out.push(ChecklistKeyword {
                text: token.to_string(),
                family,
            });
        }
    }

    tracing::debug!(count = out.len(), "extracted checklist keywords");
    out
}
