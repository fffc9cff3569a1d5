//! Personalization hints from the writer's bio analysis and persona.

use postcraft_core::WriterProfile;
use postcraft_store::BioMetadata;

/// Broad category families that decide which persona attributes matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CategoryKind {
    DailyCommunication,
    ActivityReport,
    PolicyProposal,
    LocalIssues,
    CurrentAffairs,
}

fn category_kind(category: &str) -> Option<CategoryKind> {
    let c = category.trim();
    let kind = match c {
        "daily-communication" | "일상소통" | "일상 소통" => CategoryKind::DailyCommunication,
        "activity-report" | "의정활동" | "활동보고" => CategoryKind::ActivityReport,
        "policy-proposal" | "정책제안" | "정책/비전" => CategoryKind::PolicyProposal,
        "local-issues" | "지역현안" | "지역활동" => CategoryKind::LocalIssues,
        "current-affairs" | "시사비평" => CategoryKind::CurrentAffairs,
        _ => return None,
    };
    Some(kind)
}

fn policy_label(key: &str) -> Option<&'static str> {
    Some(match key {
        "economy" => "경제정책",
        "education" => "교육정책",
        "welfare" => "복지정책",
        "environment" => "환경정책",
        "security" => "안보정책",
        "culture" => "문화정책",
        _ => return None,
    })
}

/// Hints derived from a bio analysis, strongest signals only.
pub fn bio_hints(meta: &BioMetadata) -> Vec<String> {
    let mut hints = Vec::new();

    let stance = &meta.political_stance;
    if stance.progressive > 0.7 {
        hints.push("변화와 개혁을 강조하는 진보적 관점".to_string());
    } else if stance.conservative > 0.7 {
        hints.push("안정과 전통 가치를 중시하는 보수적 관점".to_string());
    } else if stance.moderate > 0.8 {
        hints.push("균형 잡힌 중도적 관점".to_string());
    }

    match meta.communication_style.tone.as_deref() {
        Some("warm") => hints.push("따뜻하고 친근한 어조".to_string()),
        Some("formal") => hints.push("격식 있고 신중한 어조".to_string()),
        _ => {}
    }
    match meta.communication_style.approach.as_deref() {
        Some("inclusive") => hints.push("모든 계층을 아우르는 포용적 표현".to_string()),
        Some("collaborative") => hints.push("협력과 소통을 강조".to_string()),
        _ => {}
    }

    if let Some((key, weight)) = meta.top_policy()
        && weight > 0.6
    {
        match policy_label(key) {
            Some(label) => hints.push(format!("{label} 관점에서 접근")),
            None => hints.push(format!("{key} 분야 관점에서 접근")),
        }
    }

    let local = &meta.local_connection;
    if local.strength > 0.8 {
        hints.push("지역 현안과 주민 생활에 밀착한 내용".to_string());
        let keywords: Vec<&str> = local.keywords.iter().take(3).map(String::as_str).collect();
        if !keywords.is_empty() {
            hints.push(format!("지역 키워드: {}", keywords.join(", ")));
        }
    }

    let prefs = &meta.generation_profile.likely_preferences;
    if prefs.include_personal_experience > 0.8 {
        hints.push("개인 경험과 사례를 풍부하게 포함".to_string());
    }
    if prefs.use_statistics > 0.7 {
        hints.push("구체적인 수치와 통계 활용".to_string());
    }
    if prefs.focus_on_future > 0.7 {
        hints.push("미래 비전과 발전 방향 제시".to_string());
    }

    hints
}

const FAMILY_TOPICS: &[&str] = &["가족", "육아", "청년", "아이", "자녀", "출산"];
const CARE_TOPICS: &[&str] = &["교육", "육아", "보육", "복지", "아이", "자녀", "학교"];

/// Career fields and the topic words they are relevant to.
const CAREER_RELEVANCE: &[(&str, &[&str])] = &[
    ("교육", &["교육", "학교", "학생", "교사"]),
    ("의료", &["의료", "보건", "병원", "건강"]),
    ("법", &["법", "사법", "제도", "인권"]),
    ("경제", &["경제", "일자리", "기업", "산업", "창업"]),
    ("기업", &["경제", "일자리", "기업", "산업", "창업"]),
    ("복지", &["복지", "돌봄", "노인", "장애"]),
    ("환경", &["환경", "기후", "에너지", "탄소"]),
];

/// Committees and the topic words they are relevant to.
const COMMITTEE_RELEVANCE: &[(&str, &[&str])] = &[
    ("교육위원회", &["교육", "학교", "학생"]),
    ("보건복지위원회", &["복지", "의료", "보건", "돌봄"]),
    ("국토교통위원회", &["교통", "주거", "부동산", "도로", "철도"]),
    ("환경노동위원회", &["환경", "노동", "일자리", "기후"]),
    ("여성가족위원회", &["여성", "가족", "청소년", "아동"]),
];

fn mentions_any(topic: &str, words: &[&str]) -> bool {
    words.iter().any(|w| topic.contains(w))
}

fn family_perspective(status: &str) -> String {
    match status {
        "기혼(자녀있음)" => "자녀를 키우는 부모의 관점".to_string(),
        "기혼(자녀없음)" => "가정을 꾸린 생활인의 관점".to_string(),
        "미혼" => "1인 가구의 관점".to_string(),
        "한부모" => "한부모 가정의 관점".to_string(),
        other => format!("{other}의 관점"),
    }
}

fn experience_perspective(experience: &str) -> Option<&'static str> {
    Some(match experience {
        "초선" => "첫 임기의 새로운 시각",
        "재선" => "재선의 경험에서 나오는 안정감",
        "3선 이상" => "다선의 경륜",
        "정치 신인" => "정치 신인의 새로운 관점",
        _ => return None,
    })
}

/// Persona attributes relevant to this category and topic, as one bracketed
/// perspective line. `None` when nothing applies.
pub fn persona_hints(profile: &WriterProfile, category: &str, topic: &str) -> Option<String> {
    let kind = category_kind(category);
    let mut parts: Vec<String> = Vec::new();

    if let Some(age) = profile.age_decade.as_deref().filter(|a| !a.trim().is_empty())
        && (kind == Some(CategoryKind::DailyCommunication) || mentions_any(topic, FAMILY_TOPICS))
    {
        match profile.age_detail.as_deref().filter(|d| !d.trim().is_empty()) {
            Some(detail) => parts.push(format!("{age} {detail} 세대의 시각")),
            None => parts.push(format!("{age} 세대의 시각")),
        }
    }

    if let Some(family) = profile.family_status.as_deref().filter(|f| !f.trim().is_empty())
        && mentions_any(topic, CARE_TOPICS)
    {
        parts.push(family_perspective(family.trim()));
    }

    if let Some(career) = profile.background_career.as_deref().filter(|c| !c.trim().is_empty()) {
        let relevant = CAREER_RELEVANCE
            .iter()
            .any(|(field, words)| career.contains(field) && mentions_any(topic, words));
        if relevant {
            parts.push(format!("{} 경력에서 얻은 전문성", career.trim()));
        }
    }

    if matches!(
        kind,
        Some(CategoryKind::ActivityReport) | Some(CategoryKind::PolicyProposal)
    ) && let Some(label) = profile
        .political_experience
        .as_deref()
        .and_then(|e| experience_perspective(e.trim()))
    {
        parts.push(label.to_string());
    }

    // Committee work is official-role material.
    if !profile.status.suppresses_titles() {
        for committee in &profile.committees {
            let relevant = COMMITTEE_RELEVANCE
                .iter()
                .any(|(name, words)| committee.contains(name) && mentions_any(topic, words));
            if relevant {
                parts.push(format!("{committee} 활동 경험"));
            }
        }
    }

    if kind == Some(CategoryKind::LocalIssues)
        && let Some(local) = profile.local_connection.as_deref().filter(|l| !l.trim().is_empty())
    {
        parts.push(format!("지역 연고: {}", local.trim()));
    }

    (!parts.is_empty()).then(|| format!("[작성 관점: {}]", parts.join(", ")))
}

/// Combined "Additional Context" line: persona perspective first, then bio
/// hints, joined by ` | `.
pub fn additional_context(
    bio: Option<&BioMetadata>,
    profile: &WriterProfile,
    category: &str,
    topic: &str,
) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    if let Some(persona) = persona_hints(profile, category, topic) {
        parts.push(persona);
    }
    if let Some(meta) = bio {
        parts.extend(bio_hints(meta));
    }
    (!parts.is_empty()).then(|| parts.join(" | "))
}
