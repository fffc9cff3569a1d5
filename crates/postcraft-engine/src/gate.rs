//! Acceptance checks for a generated draft.

use postcraft_core::WriterProfile;
use postcraft_core::text::{minimum_length, strip_tags, stripped_char_count};

/// Role phrases a preliminary writer's draft must not contain.
pub const FORBIDDEN_ROLE_PHRASES: &[&str] = &["예비후보", "후보", "의원", "의정활동", "현역"];

/// One gate check, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Name,
    Region,
    ForbiddenPhrase,
    Length,
}

impl Check {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name-missing",
            Self::Region => "region-missing",
            Self::ForbiddenPhrase => "forbidden-phrase",
            Self::Length => "length-insufficient",
        }
    }
}

impl std::fmt::Display for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub name_present: bool,
    pub region_present: bool,
    pub forbidden_phrase_present: bool,
    pub length_sufficient: bool,
    /// Stripped character count of the content.
    pub measured_length: usize,
    /// floor(0.9 × target).
    pub required_length: usize,
}

impl ValidationResult {
    /// Checks that did not pass, in gate order.
    pub fn failures(&self) -> Vec<Check> {
        let mut out = Vec::new();
        if !self.name_present {
            out.push(Check::Name);
        }
        if !self.region_present {
            out.push(Check::Region);
        }
        if self.forbidden_phrase_present {
            out.push(Check::ForbiddenPhrase);
        }
        if !self.length_sufficient {
            out.push(Check::Length);
        }
        out
    }

    pub fn first_failure(&self) -> Option<Check> {
        self.failures().into_iter().next()
    }

    pub fn accepted(&self) -> bool {
        self.name_present
            && self.region_present
            && !self.forbidden_phrase_present
            && self.length_sufficient
    }
}

/// Run every check against `content`.
pub fn validate(content: &str, profile: &WriterProfile, target: u32) -> ValidationResult {
    let text = strip_tags(content);
    let region = profile.primary_region();
    let measured_length = stripped_char_count(content);
    let required_length = minimum_length(target);

    ValidationResult {
        name_present: text.contains(profile.name.trim()),
        region_present: region.is_empty() || text.contains(region),
        forbidden_phrase_present: profile.status.suppresses_titles()
            && FORBIDDEN_ROLE_PHRASES.iter().any(|p| text.contains(p)),
        length_sufficient: measured_length >= required_length,
        measured_length,
        required_length,
    }
}
