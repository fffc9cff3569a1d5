//! Builds the instruction document sent to the model.
//!
//! Sections are priority-ordered so the model resolves conflicts the same way
//! the validation gate does. Output is a pure function of its inputs.

use postcraft_core::hangul::Particle;
use postcraft_core::text::minimum_length;
use postcraft_core::{ChecklistKeyword, GenerationRequest, WriterProfile, WriterStatus};

use crate::gate::{Check, ValidationResult};

// ── Static sections ──

const SYSTEM_RULES: &str = "\
[PRIORITY 0: SYSTEM RULES]
You are a political content writer. Output ONLY valid JSON. Never hallucinate facts.";

const CONTENT_REQUIREMENTS: &str = "\
Content Requirements:
- Base article on background information facts
- Include specific names, numbers, dates from background
- Use concrete examples rather than abstract statements
- Connect to local community concerns

Format:
- HTML format with <p> tags for paragraphs
- <strong> tags for emphasis (sparingly)
- 4-5 paragraphs total
- Each paragraph must end with complete sentence (다/습니다/니다)";

fn status_guideline(status: WriterStatus) -> &'static str {
    match status {
        WriterStatus::Active => {
            "현역으로서의 경험과 성과를 바탕으로 내용을 작성하세요. 실제 의정활동 경험을 언급할 수 있습니다."
        }
        WriterStatus::Candidate => {
            "후보로서 정책과 공약을 중심으로 내용을 작성하세요. 미래 비전과 구체적인 계획을 제시하세요."
        }
        WriterStatus::Preliminary => {
            "어떤 직함도 사용하지 말고 개인 이름으로만 지칭하세요. 현상 진단과 개인적인 의견만 표현하세요. \
             \"예비후보\", \"후보\", \"의원\", \"현역 의원으로서\", \"의정활동\", \"성과\", \"실적\", \"추진\", \"기여\" \
             같은 표현은 절대 사용하지 마세요."
        }
    }
}

// ── Inputs ──

/// Everything the composer reads for one request.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    pub request: &'a GenerationRequest,
    pub profile: &'a WriterProfile,
    pub checklist: &'a [ChecklistKeyword],
    /// Pre-formatted recent-news section.
    pub news: Option<&'a str>,
    /// Personalization hints, rendered as "Additional Context".
    pub hints: Option<&'a str>,
}

/// Correction appended after a rejected attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Length { actual: usize, target: u32 },
    MissingName,
    MissingRegion,
    ForbiddenPhrase,
}

impl Feedback {
    /// Feedback for a rejected attempt. Insufficient length is reported ahead
    /// of every other failure; otherwise the first failing check is used.
    pub fn for_rejection(result: &ValidationResult, target: u32) -> Option<Self> {
        if result.accepted() {
            return None;
        }
        if !result.length_sufficient {
            return Some(Self::Length {
                actual: result.measured_length,
                target,
            });
        }
        result.first_failure().map(|check| match check {
            Check::Name => Self::MissingName,
            Check::Region => Self::MissingRegion,
            Check::ForbiddenPhrase => Self::ForbiddenPhrase,
            Check::Length => Self::Length {
                actual: result.measured_length,
                target,
            },
        })
    }

    pub fn render(&self, profile: &WriterProfile) -> String {
        let name = profile.name.trim();
        let region = profile.primary_region();
        match self {
            Self::Length { actual, target } => format!(
                "**중요: 이전 시도에서 분량이 {actual}자로 부족했습니다. 반드시 {target}자 이상으로 작성하세요. \
                 문단을 더 상세하게 확장하고, 구체적인 사례나 설명을 추가하세요.**"
            ),
            Self::MissingName => format!(
                "**중요: 이전 시도에서 작성자 이름 \"{name}\"이(가) 본문에 없었습니다. \
                 첫 문단에 반드시 \"{name}입니다\"를 포함하세요.**"
            ),
            Self::MissingRegion => format!(
                "**중요: 이전 시도에서 지역명 \"{region}\"이(가) 빠졌습니다. 본문에 \"{region}\"{} 정확히 포함하세요.**",
                Particle::Object.after(region)
            ),
            Self::ForbiddenPhrase => "**중요: 이전 시도에서 사용할 수 없는 직함 표현이 포함되었습니다. \
                 \"예비후보\", \"후보\", \"의원\", \"의정활동\", \"현역\" 같은 표현을 쓰지 말고 이름으로만 지칭하세요.**"
                .to_string(),
        }
    }
}

// ── Sections ──

fn what_to_create(request: &GenerationRequest) -> String {
    let mut out = format!(
        "[PRIORITY 1: WHAT TO CREATE]\n\
         Format: Political blog post\n\
         Word Count: {} characters (excluding spaces, ±50 acceptable)\n\
         Category: {}\n",
        request.target_word_count, request.category
    );
    if !request.sub_category_str().is_empty() {
        out.push_str(&format!("Sub-category: {}\n", request.sub_category_str()));
    }
    if !request.keywords_str().trim().is_empty() {
        out.push_str(&format!("Keywords: {}\n", request.keywords_str().trim()));
    }
    out.push_str("Output Format: JSON with {title, content, wordCount}");
    out
}

fn source_material(ctx: &PromptContext<'_>) -> String {
    let mut out = String::from(
        "[PRIORITY 2: SOURCE MATERIAL - MANDATORY USE]\n\
         You MUST use ALL items below. Before writing, verify you understand each item.\n\n",
    );

    let items = ctx.request.background.items();
    if items.is_empty() {
        out.push_str("No background information provided.");
    } else {
        out.push_str("Background Information:\n");
        out.push_str(&items.join("\n"));
        out.push_str("\n\nCHECKLIST (Every item below MUST appear in your article):\n");
        if ctx.checklist.is_empty() {
            out.push_str("No specific keywords extracted");
        } else {
            let lines: Vec<String> = ctx
                .checklist
                .iter()
                .enumerate()
                .map(|(i, kw)| format!("☐ {}. \"{}\" must be included", i + 1, kw.text))
                .collect();
            out.push_str(&lines.join("\n"));
        }
    }

    let profile = ctx.profile;
    let title = profile.effective_title();
    let title = if title.is_empty() {
        "(none - do not use any title)".to_string()
    } else {
        title
    };
    out.push_str(&format!(
        "\n\nWriter Identity (use EXACTLY as specified):\n\
         - Name: {}\n\
         - Title: {title}\n\
         - Region: {}\n\
         - Status: {}",
        profile.name.trim(),
        profile.primary_region(),
        profile.status
    ));

    if let Some(news) = ctx.news.filter(|n| !n.trim().is_empty()) {
        out.push_str("\n\n");
        out.push_str(news.trim());
    }
    if let Some(hints) = ctx.hints.filter(|h| !h.trim().is_empty()) {
        out.push_str(&format!("\n\nAdditional Context: {}", hints.trim()));
    }
    out
}

/// The canonical first sentence for this writer.
pub fn opening_line(profile: &WriterProfile) -> String {
    let name = profile.name.trim();
    let address = profile.region_address();
    if address.is_empty() {
        format!("안녕하십니까, {name}입니다")
    } else {
        format!("존경하는 {address} 여러분, {name}입니다")
    }
}

fn how_to_write(profile: &WriterProfile) -> String {
    format!(
        "[PRIORITY 3: HOW TO WRITE]\n\
         Structure:\n\
         1. Opening: \"{opening}\"\n\
         2. Body: 2-3 paragraphs focused on background information\n\
         3. Closing: Natural thanks{closing}\n\n\
         Style Guidelines:\n\
         - Formal political tone appropriate for {status}\n\
         - Minimize first-person after opening (use \"저는\" sparingly)\n\
         - Focus on facts from background information\n\
         - {guideline}\n\n\
         {CONTENT_REQUIREMENTS}",
        opening = opening_line(profile),
        closing = if profile.status.suppresses_titles() {
            " (no signature line)"
        } else {
            " and signature"
        },
        status = profile.status,
        guideline = status_guideline(profile.status),
    )
}

fn prohibitions(profile: &WriterProfile, minimum: usize) -> String {
    let mut out = format!(
        "[PRIORITY 4: PROHIBITIONS]\n\
         DO NOT:\n\
         - Use generic placeholders (\"의원\", \"지역구\") - use actual names\n\
         - Write abstract content without specific facts\n\
         - Add information not in source material\n\
         - Use incomplete sentences\n\
         - Write less than {minimum} characters"
    );
    if profile.status.suppresses_titles() {
        out.push_str("\n- Use official titles or campaign language (예비후보, 후보, 의원으로서, etc.)");
    }
    out
}

fn self_verification(ctx: &PromptContext<'_>, minimum: usize) -> String {
    let profile = ctx.profile;
    let mut checks = vec![
        "All CHECKLIST items appear in content".to_string(),
        format!("Character count ≥ {minimum}"),
        format!("Writer name \"{}\" appears correctly", profile.name.trim()),
    ];
    if profile.has_region() {
        checks.push(format!("Region \"{}\" appears in content", profile.primary_region()));
    }
    if profile.status.suppresses_titles() {
        checks.push("No official titles or role phrases anywhere".to_string());
    }
    checks.push("No placeholder text remains".to_string());

    let lines: Vec<String> = checks
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. ✓ {c}", i + 1))
        .collect();
    format!(
        "[SELF-VERIFICATION BEFORE OUTPUT]\n\
         Before generating JSON, verify:\n\
         {}\n\n\
         If ANY verification fails, revise content before output.",
        lines.join("\n")
    )
}

fn output_format(request: &GenerationRequest) -> String {
    format!(
        "[OUTPUT FORMAT]\n\
         {{\n  \
           \"title\": \"Specific, concrete title based on background (20-30 chars)\",\n  \
           \"content\": \"<p>Opening greeting</p><p>Body paragraph 1</p><p>Body paragraph 2</p><p>Body paragraph 3</p><p>Closing</p>\",\n  \
           \"wordCount\": {}\n\
         }}\n\n\
         Topic: {}",
        request.target_word_count, request.topic
    )
}

/// Compose the full prompt, with one feedback clause per rejected attempt
/// appended at the end.
pub fn compose(ctx: &PromptContext<'_>, feedback: &[Feedback]) -> String {
    let minimum = minimum_length(ctx.request.target_word_count);
    let sections = [
        SYSTEM_RULES.to_string(),
        what_to_create(ctx.request),
        source_material(ctx),
        how_to_write(ctx.profile),
        prohibitions(ctx.profile, minimum),
        self_verification(ctx, minimum),
        output_format(ctx.request),
    ];
    let mut prompt = sections.join("\n\n");
    for f in feedback {
        prompt.push_str("\n\n");
        prompt.push_str(&f.render(ctx.profile));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use postcraft_core::keywords;
    use postcraft_core::request::Background;

    use super::*;

    fn profile(status: WriterStatus) -> WriterProfile {
        WriterProfile {
            name: "홍길동".into(),
            position: "국회의원".into(),
            region_metro: "경기도".into(),
            region_local: "남양주시".into(),
            status,
            ..WriterProfile::default()
        }
    }

    fn request(background: Background) -> GenerationRequest {
        GenerationRequest {
            background,
            ..GenerationRequest::new("청년 일자리 정책", "정책/비전")
        }
    }

    fn render(req: &GenerationRequest, profile: &WriterProfile, feedback: &[Feedback]) -> String {
        let checklist = keywords::extract(&req.background);
        let ctx = PromptContext {
            request: req,
            profile,
            checklist: &checklist,
            news: None,
            hints: None,
        };
        compose(&ctx, feedback)
    }

    #[test]
    fn sections_are_priority_ordered() {
        let out = render(&request(Background::default()), &profile(WriterStatus::Active), &[]);
        let order = [
            "[PRIORITY 0: SYSTEM RULES]",
            "[PRIORITY 1: WHAT TO CREATE]",
            "[PRIORITY 2: SOURCE MATERIAL - MANDATORY USE]",
            "[PRIORITY 3: HOW TO WRITE]",
            "[PRIORITY 4: PROHIBITIONS]",
            "[SELF-VERIFICATION BEFORE OUTPUT]",
            "[OUTPUT FORMAT]",
        ];
        let positions: Vec<usize> = order.iter().map(|s| out.find(s).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(out.ends_with("Topic: 청년 일자리 정책"));
    }

    #[test]
    fn empty_background_is_stated() {
        let out = render(
            &request(Background::Text("없음".into())),
            &profile(WriterStatus::Active),
            &[],
        );
        assert!(out.contains("No background information provided."));
        assert!(!out.contains("CHECKLIST"));
    }

    #[test]
    fn checklist_items_become_obligations() {
        let req = request(Background::Text("2024년 청년정책 간담회에 300명이 참석".into()));
        let out = render(&req, &profile(WriterStatus::Active), &[]);
        assert!(out.contains("☐ 1. \"2024년\" must be included\n☐ 2. \"300명\" must be included"));
        assert!(out.contains("Background Information:\n2024년 청년정책 간담회에 300명이 참석"));
    }

    #[test]
    fn identity_block_follows_status() {
        let out = render(&request(Background::default()), &profile(WriterStatus::Active), &[]);
        assert!(out.contains("- Name: 홍길동\n- Title: 국회의원\n- Region: 남양주시\n- Status: 현역"));
        assert!(out.contains("1. Opening: \"존경하는 남양주시민 여러분, 홍길동입니다\""));
        assert!(!out.contains("campaign language"));

        let out = render(&request(Background::default()), &profile(WriterStatus::Preliminary), &[]);
        assert!(out.contains("- Title: (none - do not use any title)"));
        assert!(out.contains("- Use official titles or campaign language"));
        assert!(out.contains("No official titles or role phrases anywhere"));
    }

    #[test]
    fn deterministic_and_feedback_is_terminal() {
        let req = request(Background::default());
        let p = profile(WriterStatus::Active);
        assert_eq!(render(&req, &p, &[]), render(&req, &p, &[]));

        let feedback = [
            Feedback::Length { actual: 1200, target: 1700 },
            Feedback::MissingRegion,
        ];
        let out = render(&req, &p, &feedback);
        assert!(out.starts_with(&render(&req, &p, &[])));
        let length_at = out.find("분량이 1200자로 부족했습니다").unwrap();
        let region_at = out.find("지역명 \"남양주시\"").unwrap();
        assert!(length_at < region_at);
        assert!(out.ends_with("정확히 포함하세요.**"));
    }

    #[test]
    fn length_feedback_takes_precedence() {
        let result = ValidationResult {
            name_present: false,
            region_present: true,
            forbidden_phrase_present: false,
            length_sufficient: false,
            measured_length: 900,
            required_length: 1530,
        };
        assert_eq!(
            Feedback::for_rejection(&result, 1700),
            Some(Feedback::Length { actual: 900, target: 1700 })
        );
        let result = ValidationResult {
            length_sufficient: true,
            ..result
        };
        assert_eq!(Feedback::for_rejection(&result, 1700), Some(Feedback::MissingName));
        let result = ValidationResult {
            name_present: true,
            ..result
        };
        assert_eq!(Feedback::for_rejection(&result, 1700), None);
    }

    #[test]
    fn opening_without_region() {
        let p = WriterProfile {
            name: "김철수".into(),
            ..WriterProfile::default()
        };
        assert_eq!(opening_line(&p), "안녕하십니까, 김철수입니다");
    }
}
