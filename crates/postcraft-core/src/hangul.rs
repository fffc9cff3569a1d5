//! Hangul particle selection.
//!
//! Korean case particles change form depending on whether the preceding
//! syllable ends in a final consonant (batchim):
//!
//! | with batchim | without |
//! |---|---|
//! | 을 | 를 |
//! | 이 | 가 |
//! | 은 | 는 |
//! | 과 | 와 |
//! | 으로 | 로 (also after ㄹ) |

const SYLLABLE_FIRST: u32 = 0xAC00;
const SYLLABLE_LAST: u32 = 0xD7A3;
const JONGSEONG_COUNT: u32 = 28;
/// Final-consonant index of ㄹ.
const JONGSEONG_RIEUL: u32 = 8;

fn jongseong(c: char) -> Option<u32> {
    let code = c as u32;
    if (SYLLABLE_FIRST..=SYLLABLE_LAST).contains(&code) {
        Some((code - SYLLABLE_FIRST) % JONGSEONG_COUNT)
    } else {
        None
    }
}

/// Whether the last character of `word` is a Hangul syllable with a final consonant.
///
/// Non-Hangul endings are treated as vowel endings.
pub fn has_batchim(word: &str) -> bool {
    word.chars()
        .last()
        .and_then(jongseong)
        .is_some_and(|j| j != 0)
}

/// A particle pair that alternates on batchim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Particle {
    /// 을/를
    Object,
    /// 이/가
    Subject,
    /// 은/는
    Topic,
    /// 과/와
    And,
    /// 으로/로
    Instrumental,
    /// 으로서/로서
    Capacity,
}

impl Particle {
    /// Classify a particle string in either form.
    pub fn from_form(form: &str) -> Option<Self> {
        match form {
            "을" | "를" => Some(Self::Object),
            "이" | "가" => Some(Self::Subject),
            "은" | "는" => Some(Self::Topic),
            "과" | "와" => Some(Self::And),
            "으로" | "로" => Some(Self::Instrumental),
            "으로서" | "로서" => Some(Self::Capacity),
            _ => None,
        }
    }

    /// The form of this particle that belongs after `word`.
    pub fn after(self, word: &str) -> &'static str {
        let batchim = has_batchim(word);
        let rieul = word.chars().last().and_then(jongseong) == Some(JONGSEONG_RIEUL);
        match self {
            Self::Object => if batchim { "을" } else { "를" },
            Self::Subject => if batchim { "이" } else { "가" },
            Self::Topic => if batchim { "은" } else { "는" },
            Self::And => if batchim { "과" } else { "와" },
            Self::Instrumental => if batchim && !rieul { "으로" } else { "로" },
            Self::Capacity => if batchim && !rieul { "으로서" } else { "로서" },
        }
    }
}

/// Attach the correct form of `particle` to `word`.
pub fn attach(word: &str, particle: Particle) -> String {
    format!("{word}{}", particle.after(word))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batchim_detection() {
        assert!(has_batchim("의원"));
        assert!(has_batchim("구청장"));
        assert!(!has_batchim("남양주시"));
        assert!(!has_batchim("후보"));
        assert!(!has_batchim("abc"));
        assert!(!has_batchim(""));
    }

    #[test]
    fn particle_forms() {
        assert_eq!(attach("남양주시", Particle::Object), "남양주시를");
        assert_eq!(attach("남양주시민", Particle::Object), "남양주시민을");
        assert_eq!(attach("강남구", Particle::Subject), "강남구가");
        assert_eq!(attach("의원", Particle::Capacity), "의원으로서");
        assert_eq!(attach("후보", Particle::Capacity), "후보로서");
        assert_eq!(attach("서울", Particle::Instrumental), "서울로");
        assert_eq!(attach("부산", Particle::And), "부산과");
    }

    #[test]
    fn classify_either_form() {
        assert_eq!(Particle::from_form("를"), Some(Particle::Object));
        assert_eq!(Particle::from_form("로서"), Some(Particle::Capacity));
        assert_eq!(Particle::from_form("에서"), None);
    }
}
