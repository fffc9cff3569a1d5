//! Deterministic post-processing of accepted or degraded drafts.
//!
//! Rules run in a fixed order and each one is idempotent, so running the
//! whole pass twice yields the same text as running it once.

mod rules;

use postcraft_core::text::strip_tags;
use postcraft_core::{WriterProfile, WriterStatus};
use tracing::debug;

use crate::composer::opening_line;

pub use rules::{
    CanonicalTitle, Cleanup, ClosingSignature, DuplicateName, OpeningIntro, ParagraphStructure,
    PreliminaryStrip, RegionGrammar,
};

/// Writer facts the rules rewrite against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairContext {
    pub name: String,
    /// Effective title; empty for preliminary writers.
    pub title: String,
    pub position: String,
    pub status: WriterStatus,
    /// Primary region, empty when none is configured.
    pub region: String,
    pub address: String,
    pub region_base: Option<String>,
    opening: String,
}

impl RepairContext {
    pub fn new(profile: &WriterProfile) -> Self {
        Self {
            name: profile.name.trim().to_string(),
            title: profile.effective_title(),
            position: profile.position.trim().to_string(),
            status: profile.status,
            region: profile.primary_region().to_string(),
            address: profile.region_address(),
            region_base: profile.region_base().map(str::to_string),
            opening: opening_line(profile),
        }
    }

    /// Canonical first paragraph.
    pub fn opening_paragraph(&self) -> String {
        format!("<p>{}.</p>", self.opening)
    }

    /// Whether `paragraph` carries the writer's `{name}입니다` introduction.
    pub fn introduces(&self, paragraph: &str) -> bool {
        !self.name.is_empty() && strip_tags(paragraph).contains(&format!("{}입니다", self.name))
    }

    /// Canonical closing paragraph. Preliminary writers do not sign.
    pub fn signature_paragraph(&self) -> Option<String> {
        (!self.status.suppresses_titles() && !self.name.is_empty())
            .then(|| format!("<p>{} 드림</p>", self.name))
    }
}

/// One rewrite over the draft body.
pub trait RepairRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// Rewrite `text`. Applying a rule to its own output changes nothing.
    fn apply(&self, text: &str, ctx: &RepairContext) -> String;
}

/// An ordered list of repair rules.
pub struct RepairPass {
    rules: Vec<Box<dyn RepairRule>>,
}

impl RepairPass {
    pub fn new(rules: Vec<Box<dyn RepairRule>>) -> Self {
        Self { rules }
    }

    /// The production rule order.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(ParagraphStructure),
            Box::new(PreliminaryStrip),
            Box::new(CanonicalTitle),
            Box::new(OpeningIntro),
            Box::new(RegionGrammar),
            Box::new(ClosingSignature),
            Box::new(DuplicateName),
            Box::new(Cleanup),
        ])
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn run(&self, text: &str, ctx: &RepairContext) -> String {
        self.rules.iter().fold(text.to_string(), |acc, rule| {
            let next = rule.apply(&acc, ctx);
            if next != acc {
                debug!(rule = rule.name(), "repair rule rewrote draft");
            }
            next
        })
    }
}

impl Default for RepairPass {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::FORBIDDEN_ROLE_PHRASES;

    fn ctx(status: WriterStatus) -> RepairContext {
        RepairContext::new(&WriterProfile {
            name: "홍길동".into(),
            position: "국회의원".into(),
            region_metro: "경기도".into(),
            region_local: "남양주시".into(),
            status,
            ..WriterProfile::default()
        })
    }

    fn assert_stable(text: &str, ctx: &RepairContext) -> String {
        let pass = RepairPass::standard();
        let once = pass.run(text, ctx);
        let twice = pass.run(&once, ctx);
        assert_eq!(once, twice, "repair pass is not idempotent for {text:?}");
        once
    }

    #[test]
    fn rule_order() {
        assert_eq!(
            RepairPass::standard().rule_names(),
            vec![
                "paragraph-structure",
                "preliminary-strip",
                "canonical-title",
                "opening-intro",
                "region-grammar",
                "closing-signature",
                "duplicate-name",
                "cleanup",
            ]
        );
    }

    #[test]
    fn missing_intro_and_malformed_signature() {
        let out = assert_stable(
            "<p>안녕하세요 여러분.</p><p>의원으로서 남양주시을 위해 일하겠습니다.</p><p>국회의원 홍길동 올림</p>",
            &ctx(WriterStatus::Active),
        );
        assert_eq!(
            out,
            "<p>존경하는 남양주시민 여러분, 홍길동입니다.</p>\
             <p>국회의원으로서 남양주시를 위해 일하겠습니다.</p>\
             <p>홍길동 드림</p>"
        );
    }

    #[test]
    fn duplicate_name_in_opening() {
        let out = assert_stable(
            "<p>존경하는 남양주시민 여러분, 홍길동 홍길동입니다.</p><p>본문입니다.</p>",
            &ctx(WriterStatus::Active),
        );
        assert_eq!(
            out,
            "<p>존경하는 남양주시민 여러분, 홍길동입니다.</p><p>본문입니다.</p><p>홍길동 드림</p>"
        );
    }

    #[test]
    fn preliminary_phrasing_is_neutralised() {
        let c = ctx(WriterStatus::Preliminary);
        let out = assert_stable(
            "<p>안녕하세요, 예비후보 홍길동입니다.</p>\
             <p>국회의원으로서 최선을 다하겠습니다. 의정활동을 통해 많은 실적을 쌓았습니다.</p>\
             <p>홍길동은 현역 의원과 다릅니다.</p>\
             <p>홍길동 예비후보 드림</p>",
            &c,
        );
        for phrase in FORBIDDEN_ROLE_PHRASES {
            assert!(!out.contains(phrase), "{phrase} survived in {out}");
        }
        assert!(out.starts_with("<p>안녕하세요, 홍길동입니다.</p>"));
        assert!(out.contains("주민 여러분과의 소통을 통해"));
        assert!(!out.contains("드림"));
    }

    #[test]
    fn plain_text_and_truncated_tail() {
        let out = assert_stable(
            "존경하는 남양주시민 여러분, 홍길동입니다.\n\n남양주시 교통 문제를 해결하겠습니다.\n그리고 앞으로",
            &ctx(WriterStatus::Candidate),
        );
        assert_eq!(
            out,
            "<p>존경하는 남양주시민 여러분, 홍길동입니다.</p>\
             <p>남양주시 교통 문제를 해결하겠습니다.</p>\
             <p>홍길동 드림</p>"
        );
    }

    #[test]
    fn unterminated_opening_is_closed_not_dropped() {
        let out = assert_stable(
            "<p>여러분 반갑습니다 홍길동입니다, 그리고</p>",
            &ctx(WriterStatus::Active),
        );
        assert_eq!(out, "<p>여러분 반갑습니다 홍길동입니다, 그리고.</p><p>홍길동 드림</p>");
    }

    #[test]
    fn clean_input_is_untouched_apart_from_signature() {
        let text = "<p>존경하는 남양주시민 여러분, 홍길동입니다.</p><p>남양주시의 미래를 이야기하겠습니다.</p>";
        let out = assert_stable(text, &ctx(WriterStatus::Active));
        assert_eq!(out, format!("{text}<p>홍길동 드림</p>"));
    }

    #[test]
    fn empty_profile_only_structures() {
        let c = RepairContext::new(&WriterProfile::default());
        let out = assert_stable("첫 문장입니다.\n둘째 문장입니다.", &c);
        assert_eq!(out, "<p>첫 문장입니다.</p><p>둘째 문장입니다.</p>");
    }
}
