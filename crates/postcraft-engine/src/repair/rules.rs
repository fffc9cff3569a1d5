//! The individual repair rules, in pass order.

use std::sync::LazyLock;

use postcraft_core::hangul::Particle;
use postcraft_core::text::strip_tags;
use regex::{Captures, NoExpand, Regex, Replacer};
use tracing::warn;

use super::{RepairContext, RepairRule};

// ── Shared helpers ──

static P_WITH_ATTRS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<p\s[^>]*>").expect("p-attr regex must compile"));
static BETWEEN_PARAGRAPHS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</p>\s+<p>").expect("between-p regex must compile"));
static EMPTY_PARAGRAPH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<p>(?:\s|&nbsp;|<br\s*/?>)*</p>").expect("empty-p regex must compile")
});
static MULTI_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]{2,}").expect("space regex must compile"));
static SPACE_AFTER_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<p>[ \t]+").expect("open-space regex must compile"));
static SPACE_BEFORE_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+</p>").expect("close-space regex must compile"));
static SPACE_BEFORE_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+([,.!?])").expect("punct-space regex must compile"));

/// Particle forms recognised directly after a word, longest first.
const PARTICLE_FORMS: &[&str] = &[
    "으로서", "로서", "으로", "로", "을", "를", "이", "가", "은", "는", "과", "와",
];

/// Words that read as an official role or campaign title.
const ROLE_WORDS: &[&str] = &[
    "예비후보", "국회의원", "광역의원", "기초의원", "시의원", "도의원", "구의원", "군의원", "의원",
    "후보", "현역",
];

/// Nouns that an address form (`남양주시민`) is wrongly used to modify.
const ATTRIBUTIVE_NOUNS: &str = "경제|관광|발전|미래|정책|현안|교통|복지|일자리|교육|환경|문화";

fn is_syllable(c: char) -> bool {
    ('가'..='힣').contains(&c)
}

/// Apply a runtime-built pattern. Patterns are built from escaped profile
/// values, so a compile failure is logged and the text left alone.
fn replace_all<R: Replacer>(text: &str, pattern: &str, rep: R) -> String {
    match Regex::new(pattern) {
        Ok(re) => re.replace_all(text, rep).into_owned(),
        Err(e) => {
            warn!(pattern, error = %e, "skipping repair pattern");
            text.to_string()
        }
    }
}

/// What follows a word occurrence, when the occurrence is standalone.
///
/// `Some(None)`: no syllable follows. `Some(Some(..))`: a case particle
/// follows and no syllable follows the particle. `None`: the word runs on
/// into a longer word.
fn standalone_particle(after: &str) -> Option<Option<(Particle, usize)>> {
    if !after.chars().next().is_some_and(is_syllable) {
        return Some(None);
    }
    for form in PARTICLE_FORMS {
        if let Some(rest) = after.strip_prefix(form)
            && !rest.chars().next().is_some_and(is_syllable)
        {
            return Particle::from_form(form).map(|p| Some((p, form.len())));
        }
    }
    None
}

/// Rewrite standalone occurrences of `word` (optionally carrying a case
/// particle). With `bounded_start`, an occurrence preceded by a syllable is
/// left alone. `with` gets the particle and returns the whole replacement.
pub(crate) fn rewrite_word(
    text: &str,
    word: &str,
    bounded_start: bool,
    mut with: impl FnMut(Option<Particle>) -> String,
) -> String {
    if word.is_empty() {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(word) {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + word.len()..];
        let start_ok = !bounded_start || !out.chars().last().is_some_and(is_syllable);
        match standalone_particle(after).filter(|_| start_ok) {
            Some(particle) => {
                out.push_str(&with(particle.map(|(p, _)| p)));
                rest = &after[particle.map_or(0, |(_, len)| len)..];
            }
            None => {
                out.push_str(word);
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn has_standalone(text: &str, word: &str) -> bool {
    rewrite_word(text, word, true, |_| String::from("\u{0}")).contains('\u{0}')
}

/// Role words plus the writer's own position, longest first, as a regex
/// alternation.
fn role_alternation(ctx: &RepairContext) -> String {
    let mut words: Vec<&str> = ROLE_WORDS.to_vec();
    let position = ctx.position.trim();
    if !position.is_empty() && !words.contains(&position) {
        words.push(position);
    }
    words.sort_by_key(|w| std::cmp::Reverse(w.chars().count()));
    let escaped: Vec<String> = words.iter().map(|w| regex::escape(w)).collect();
    format!("(?:{})", escaped.join("|"))
}

/// Remove every signature line: whole signature paragraphs, signatures
/// trailing a paragraph, and signatures left after the last paragraph.
fn strip_signatures(text: &str, ctx: &RepairContext) -> String {
    let roles = role_alternation(ctx);
    let signer = if ctx.name.is_empty() {
        roles
    } else {
        format!("(?:{}|{roles})", regex::escape(&ctx.name))
    };
    let sign = r"(?:드림|올림)\.?";

    let out = replace_all(text, &format!(r"<p>\s*(?:{signer}\s*)*{sign}\s*</p>"), "");
    let out = replace_all(&out, &format!(r"\s*(?:{signer}\s*)+{sign}\s*</p>"), "</p>");
    replace_all(&out, &format!(r"(</p>)\s*(?:{signer}\s*)*{sign}\s*$"), "$1")
}

/// First-person pronoun carrying the role of `particle`.
fn first_person(particle: &str) -> &'static str {
    match particle {
        "은" | "는" => "저는",
        "이" | "가" => "제가",
        "을" | "를" => "저를",
        _ => "저의",
    }
}

/// Swap a noun for another, re-selecting any attached particle.
fn swap_noun(text: &str, from: &str, to: &str) -> String {
    let pattern = format!("{}(을|를|이|가|은|는|과|와)?", regex::escape(from));
    replace_all(text, &pattern, |caps: &Captures| {
        let particle = caps
            .get(1)
            .and_then(|m| Particle::from_form(m.as_str()))
            .map_or("", |p| p.after(to));
        format!("{to}{particle}")
    })
}

// ── Rule 0 ──

/// Wrap plain text in `<p>` paragraphs and normalize paragraph tags.
pub struct ParagraphStructure;

impl RepairRule for ParagraphStructure {
    fn name(&self) -> &'static str {
        "paragraph-structure"
    }

    fn apply(&self, text: &str, _ctx: &RepairContext) -> String {
        let text = P_WITH_ATTRS.replace_all(text.trim(), "<p>");
        if text.contains("<p>") {
            return BETWEEN_PARAGRAPHS.replace_all(&text, "</p><p>").into_owned();
        }
        text.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|l| format!("<p>{l}</p>"))
            .collect()
    }
}

// ── Rule 1 ──

/// Official-activity phrases and their neutral replacements.
const ACTIVITY_PHRASES: &[(&str, &str)] = &[
    ("의정활동을 통해", "주민 여러분과의 소통을 통해"),
    ("추진해왔습니다", "생각합니다"),
    ("기여해왔습니다", "관심을 가지고 있습니다"),
];

/// Activity nouns swapped with particle re-selection.
const ACTIVITY_NOUNS: &[(&str, &str)] = &[("의정활동", "지역 활동"), ("성과", "경험"), ("실적", "활동")];

/// Preliminary writers only: strip every role title and campaign-style
/// self-reference.
pub struct PreliminaryStrip;

impl RepairRule for PreliminaryStrip {
    fn name(&self) -> &'static str {
        "preliminary-strip"
    }

    fn apply(&self, text: &str, ctx: &RepairContext) -> String {
        if !ctx.status.suppresses_titles() {
            return text.to_string();
        }
        let roles = role_alternation(ctx);
        let name = regex::escape(&ctx.name);

        // "(홍길동) 예비후보로서" → "저는"
        let capacity = if ctx.name.is_empty() {
            format!(r"(?:{roles}\s*)+(?:으로서|로서)")
        } else {
            format!(r"(?:{name}\s*)?(?:{roles}\s*)+(?:으로서|로서)")
        };
        let mut out = replace_all(text, &capacity, "저는");

        if !ctx.name.is_empty() {
            let own = ctx.name.clone();
            out = replace_all(
                &out,
                &format!(r"{name}(?:\s*{roles})+(을|를|이|가|은|는|과|와)?"),
                |caps: &Captures| {
                    let particle = caps
                        .get(1)
                        .and_then(|m| Particle::from_form(m.as_str()))
                        .map_or("", |p| p.after(&own));
                    format!("{own}{particle}")
                },
            );
            out = replace_all(&out, &format!(r"(?:{roles}\s*)+{name}"), NoExpand(&ctx.name));
        }

        out = replace_all(
            &out,
            &format!(r"(?:{roles}\s*)+(은|는|이|가|을|를)([^가-힣]|$)"),
            |caps: &Captures| format!("{}{}", first_person(&caps[1]), &caps[2]),
        );

        for (from, to) in ACTIVITY_PHRASES {
            out = out.replace(from, to);
        }
        for (from, to) in ACTIVITY_NOUNS {
            out = swap_noun(&out, from, to);
        }

        if !ctx.name.is_empty() {
            let third_person = format!(r"{name}(은|는|이|가|을|를|의)([^가-힣]|$)");
            let paragraphs: Vec<String> = out
                .split("</p>")
                .enumerate()
                .map(|(i, segment)| {
                    if i == 0 {
                        segment.to_string()
                    } else {
                        replace_all(segment, &third_person, |caps: &Captures| {
                            format!("{}{}", first_person(&caps[1]), &caps[2])
                        })
                    }
                })
                .collect();
            out = paragraphs.join("</p>");
        }

        out = strip_signatures(&out, ctx);

        // Matches inside compounds too: `의원회관` becomes `회관`.
        out = replace_all(&out, &roles, "");
        out = MULTI_SPACE.replace_all(&out, " ").into_owned();
        out = SPACE_AFTER_OPEN.replace_all(&out, "<p>").into_owned();
        out = SPACE_BEFORE_CLOSE.replace_all(&out, "</p>").into_owned();
        SPACE_BEFORE_PUNCT.replace_all(&out, "$1").into_owned()
    }
}

// ── Rule 2 ──

/// Shorthand role phrases replaced by the canonical title.
const SHORTHAND_ROLES: &[&str] = &["지역 의원", "우리 의원", "국회 의원"];

/// Replace shorthand or generic role wording with the effective title.
pub struct CanonicalTitle;

impl RepairRule for CanonicalTitle {
    fn name(&self) -> &'static str {
        "canonical-title"
    }

    fn apply(&self, text: &str, ctx: &RepairContext) -> String {
        if ctx.status.suppresses_titles() || ctx.title.is_empty() {
            return text.to_string();
        }
        let mut out = text.to_string();
        if !ctx.name.is_empty() {
            out = rewrite_word(&out, "의원입니다", true, |p| {
                format!("{}입니다{}", ctx.name, p.map_or("", |p| p.after("입니다")))
            });
        }

        // A title that itself contains a standalone 의원 would be rewritten
        // again on every pass.
        if ctx.title != "의원" && has_standalone(&ctx.title, "의원") {
            return out;
        }
        let titled = |p: Option<Particle>| {
            format!("{}{}", ctx.title, p.map_or("", |p| p.after(&ctx.title)))
        };
        for phrase in SHORTHAND_ROLES {
            out = rewrite_word(&out, phrase, true, titled);
        }
        rewrite_word(&out, "의원", true, titled)
    }
}

// ── Rule 3 ──

/// Ensure the first paragraph is the writer's self-introduction.
pub struct OpeningIntro;

impl RepairRule for OpeningIntro {
    fn name(&self) -> &'static str {
        "opening-intro"
    }

    fn apply(&self, text: &str, ctx: &RepairContext) -> String {
        if ctx.name.is_empty() {
            return text.to_string();
        }
        let opening = ctx.opening_paragraph();

        let Some(start) = text.find("<p>") else {
            return format!("{opening}{text}");
        };
        let Some(close) = text[start..].find("</p>") else {
            return format!("{opening}{text}");
        };
        let end = start + close + "</p>".len();
        if ctx.introduces(&text[start..end]) {
            return text.to_string();
        }
        format!("{}{opening}{}", &text[..start], &text[end..])
    }
}

// ── Rule 4 ──

/// Fix particles on region names and misuse of the address form.
pub struct RegionGrammar;

impl RepairRule for RegionGrammar {
    fn name(&self) -> &'static str {
        "region-grammar"
    }

    fn apply(&self, text: &str, ctx: &RepairContext) -> String {
        if ctx.region.is_empty() {
            return text.to_string();
        }
        let mut out = replace_all(
            text,
            &format!(r"{}\s+({ATTRIBUTIVE_NOUNS})", regex::escape(&ctx.address)),
            |caps: &Captures| format!("{} {}", ctx.region, &caps[1]),
        );

        let mut tokens: Vec<&str> = vec![ctx.address.as_str(), ctx.region.as_str()];
        if let Some(base) = ctx.region_base.as_deref() {
            tokens.push(base);
        }
        for token in tokens {
            out = rewrite_word(&out, token, false, |p| {
                format!("{token}{}", p.map_or("", |p| p.after(token)))
            });
        }
        out
    }
}

// ── Rule 5 ──

/// Remove every signature and malformed fragment, then append exactly one
/// canonical signature for writers who sign.
pub struct ClosingSignature;

impl RepairRule for ClosingSignature {
    fn name(&self) -> &'static str {
        "closing-signature"
    }

    fn apply(&self, text: &str, ctx: &RepairContext) -> String {
        let mut out = strip_signatures(text, ctx);
        if let Some(signature) = ctx.signature_paragraph() {
            out.push_str(&signature);
        }
        out
    }
}

// ── Rule 6 ──

/// Endings that may close a name without making it part of a longer word.
const NAME_ENDINGS: &str = "입니다|이었습니다|이며|이고|께서|에게|은|는|이|가|을|를|의|과|와|도";

/// Collapse runs of the repeated name to the last occurrence.
pub struct DuplicateName;

impl RepairRule for DuplicateName {
    fn name(&self) -> &'static str {
        "duplicate-name"
    }

    fn apply(&self, text: &str, ctx: &RepairContext) -> String {
        if ctx.name.is_empty() {
            return text.to_string();
        }
        let name = regex::escape(&ctx.name);
        let own = ctx.name.clone();
        // The last name must end the word: `홍길동 홍길동재단` is left alone.
        replace_all(
            text,
            &format!(
                r"(?:{name}(?:은|는|이|가|을|를|의)?[\s,]+)+{name}((?:{NAME_ENDINGS})?)([^가-힣]|$)"
            ),
            |caps: &Captures| format!("{own}{}{}", &caps[1], &caps[2]),
        )
    }
}

// ── Rule 7 ──

/// Closing quotes and brackets that may follow a sentence terminator.
const CLOSERS: &[char] = &['"', '\'', '”', '’', '」', '』', ')'];
const TERMINATORS: &[char] = &['.', '!', '?', '。'];
const FINAL_SYLLABLES: &[char] = &['다', '요', '까', '죠'];

fn ends_sentence(plain: &str) -> bool {
    let trimmed = plain.trim_end().trim_end_matches(CLOSERS);
    trimmed
        .chars()
        .last()
        .is_some_and(|c| TERMINATORS.contains(&c) || FINAL_SYLLABLES.contains(&c))
}

/// Byte offset just past the last sentence terminator outside markup.
fn last_sentence_end(inner: &str) -> Option<usize> {
    let mut in_tag = false;
    let mut best = None;
    let mut chars = inner.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag && TERMINATORS.contains(&c) => {
                let next = chars.peek().map(|(_, n)| *n);
                if next.is_some_and(|n| n.is_ascii_digit()) {
                    continue;
                }
                let mut end = i + c.len_utf8();
                while let Some(&(j, n)) = chars.peek() {
                    if !CLOSERS.contains(&n) {
                        break;
                    }
                    end = j + n.len_utf8();
                    chars.next();
                }
                best = Some(end);
            }
            _ => {}
        }
    }
    best
}

/// Close inline tags left open by a truncation.
fn balance_inline(fragment: &str) -> String {
    let mut out = fragment.to_string();
    for tag in ["strong", "em", "b"] {
        let opens = fragment.matches(&format!("<{tag}>")).count();
        let closes = fragment.matches(&format!("</{tag}>")).count();
        for _ in closes..opens {
            out.push_str(&format!("</{tag}>"));
        }
    }
    out
}

/// Drop empty paragraphs and cut the last content paragraph back to a
/// complete sentence. The first paragraph is always kept.
pub struct Cleanup;

impl RepairRule for Cleanup {
    fn name(&self) -> &'static str {
        "cleanup"
    }

    fn apply(&self, text: &str, ctx: &RepairContext) -> String {
        let mut out = EMPTY_PARAGRAPH.replace_all(text, "").into_owned();
        let signature = ctx.signature_paragraph();

        loop {
            let split = match signature.as_deref() {
                Some(sig) if out.ends_with(sig) => out.len() - sig.len(),
                _ => out.len(),
            };
            let (body, tail) = out.split_at(split);
            let Some(start) = body.rfind("<p>") else {
                break;
            };
            let Some(inner) = body[start + "<p>".len()..].strip_suffix("</p>") else {
                break;
            };
            if ends_sentence(&strip_tags(inner)) {
                break;
            }
            let cut = last_sentence_end(inner);
            let replacement = if body.find("<p>") == Some(start) {
                // Never dropped. Cut back only if the introduction survives.
                match cut.filter(|&c| !ctx.introduces(inner) || ctx.introduces(&inner[..c])) {
                    Some(cut) => format!("<p>{}</p>", balance_inline(&inner[..cut])),
                    None => format!("<p>{}.</p>", inner.trim_end().trim_end_matches([',', ';', ':'])),
                }
            } else {
                match cut {
                    Some(cut) => format!("<p>{}</p>", balance_inline(&inner[..cut])),
                    None => String::new(),
                }
            };
            out = format!("{}{replacement}{tail}", &body[..start]);
        }
        out
    }
}
