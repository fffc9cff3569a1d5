//! Vertical card display for responses, gate results, and checklists.

use postcraft_core::ChecklistKeyword;
use postcraft_core::text::strip_tags;
use postcraft_engine::ValidationResult;
use serde_json::Value;

// ── Card sections ──

const DRAFT: &[&str] = &[
    "id",
    "category",
    "subCategory",
    "keywords",
    "wordCount",
    "generatedAt",
];

const GENERATION: &[&str] = &[
    "modelUsed",
    "attemptCount",
    "usedBonus",
    "degraded",
    "degradedReason",
    "dailyLimitWarning",
];

// ── Public API ──

/// Print a response document as a card: header, metadata sections, then the
/// body one paragraph at a time.
pub fn print_response(response: &Value) {
    if response["success"].as_bool() != Some(true) {
        println!("=== 생성 실패 ===");
        print_section("Error", &response["error"], &["code", "message"]);
        return;
    }

    let draft = &response["draft"];
    println!("=== {} ===", render(&draft["title"]));
    println!();
    print_section("Draft", draft, DRAFT);
    print_section("Generation", &response["metadata"], GENERATION);

    println!("Content");
    for paragraph in paragraphs(draft["content"].as_str().unwrap_or_default()) {
        println!("  {paragraph}");
    }
    println!();
}

pub fn print_validation(result: &ValidationResult) {
    let verdict = if result.accepted() { "accepted" } else { "rejected" };
    println!("=== {verdict} ===");
    println!("  {:<26} {}", "name_present", yes_no(result.name_present));
    println!("  {:<26} {}", "region_present", yes_no(result.region_present));
    println!(
        "  {:<26} {}",
        "forbidden_phrase_present",
        yes_no(result.forbidden_phrase_present)
    );
    println!(
        "  {:<26} {} ({} / {})",
        "length_sufficient",
        yes_no(result.length_sufficient),
        result.measured_length,
        result.required_length
    );
    let failures = result.failures();
    if !failures.is_empty() {
        let names: Vec<&str> = failures.iter().map(|c| c.as_str()).collect();
        println!("  {:<26} {}", "failures", names.join(", "));
    }
}

pub fn print_checklist(items: &[ChecklistKeyword]) {
    if items.is_empty() {
        println!("(no checklist keywords)");
        return;
    }
    for (i, item) in items.iter().enumerate() {
        println!("  {:>2}. {:<24} {}", i + 1, item.text, item.family);
    }
}

// ── Helpers ──

fn print_section(header: &str, obj: &Value, keys: &[&str]) {
    let rows: Vec<(&str, String)> = keys
        .iter()
        .filter_map(|&key| match obj.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(v) => Some((key, render(v))),
        })
        .collect();
    if rows.is_empty() {
        return;
    }

    println!("{header}");
    for (key, value) in rows {
        println!("  {key:<26} {value}");
    }
    println!();
}

fn render(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Bool(b) => yes_no(*b).to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn yes_no(b: bool) -> &'static str {
    if b { "yes" } else { "no" }
}

/// Plain text of each paragraph in an HTML body, blanks dropped.
pub fn paragraphs(content: &str) -> Vec<String> {
    content
        .split("</p>")
        .map(|p| strip_tags(p).trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}
