//! Tests for response extraction in both stages

use super::common::*;
use earnings_analyst::analysis::phase1_plan::{extract_plan, PLAN_DISCRIMINATOR};
use earnings_analyst::analysis::phase2_analyze::{extract_analysis, ANALYSIS_DISCRIMINATOR};
use earnings_analyst::analysis::ResearchPlanRecord;
use earnings_analyst::workflow_utils::ExtractionTier;
use serde_json::{json, Value};

fn hostile_inputs() -> Vec<String> {
    vec![
        String::new(),
        "   \n\t ".to_string(),
        "The call covered margins and credit but I will not format it.".to_string(),
        "```json\n{ not json at all }\n```".to_string(),
        "{\"research_plan\": ".to_string(),
        "{\"a\": {\"b\": {\"c\": [".repeat(500),
        "}}}}{{{{".to_string(),
        "[1, 2, 3]".to_string(),
        "\"just a string\"".to_string(),
        "null".to_string(),
    ]
}

#[test]
fn test_well_formed_plan_round_trips() {
    let raw = plan_response("credit", "Credit Quality", &["NCO guidance", "reserve build"]);
    let section = section("credit", "Credit Quality");

    let (record, tier) = extract_plan(&raw, &section);
    assert_eq!(tier, ExtractionTier::Direct);

    let expected: ResearchPlanRecord = serde_json::from_str(&raw).unwrap();
    assert_eq!(record, expected);
    assert_eq!(
        serde_json::to_value(&record).unwrap(),
        serde_json::from_str::<Value>(&raw).unwrap()
    );
}

#[test]
fn test_plan_without_description_round_trips() {
    let mut value: Value =
        serde_json::from_str(&plan_response("capital", "Capital", &["CET1"])).unwrap();
    value["research_plan"]["description"] = Value::Null;
    let raw = value.to_string();

    let (record, tier) = extract_plan(&raw, &section("capital", "Capital"));
    assert_eq!(tier, ExtractionTier::Direct);
    assert!(record.research_plan.description.is_none());
    assert_eq!(serde_json::to_value(&record).unwrap(), value);
}

#[test]
fn test_extraction_is_total_for_plans() {
    let section = section("credit", "Credit Quality");
    for raw in hostile_inputs() {
        let (record, tier) = extract_plan(&raw, &section);
        let value = serde_json::to_value(&record).unwrap();

        assert!(value.get(PLAN_DISCRIMINATOR).is_some(), "input: {:?}", raw);
        assert_eq!(tier, ExtractionTier::Fallback, "input: {:?}", raw);
        assert_eq!(record.section_id, "credit");
    }
}

#[test]
fn test_extraction_is_total_for_analyses() {
    let section = section("capital", "Capital");
    for raw in hostile_inputs() {
        let (record, tier) = extract_analysis(&raw, &section);
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value[ANALYSIS_DISCRIMINATOR], "Capital", "input: {:?}", raw);
        assert_eq!(tier, ExtractionTier::Fallback, "input: {:?}", raw);
    }
}

#[test]
fn test_direct_decode_takes_precedence_over_fenced_decoy() {
    let raw = json!({
        "section_name": "Capital",
        "section_title": "Capital Position",
        "section_statement": "See example: ```json\n{\"section_name\": \"Decoy\"}\n```",
        "content": []
    })
    .to_string();

    let (record, tier) = extract_analysis(&raw, &section("capital", "Capital"));
    assert_eq!(tier, ExtractionTier::Direct);
    assert_eq!(record.section_title, "Capital Position");
}

#[test]
fn test_prose_wrapped_fenced_json() {
    let raw = format!(
        "Here is the research plan you asked for.\n\n```json\n{}\n```\n\nLet me know if you need changes.",
        plan_response("liquidity", "Liquidity", &["LCR"])
    );

    let (record, tier) = extract_plan(&raw, &section("liquidity", "Liquidity"));
    assert_eq!(tier, ExtractionTier::FencedBlock);
    assert_eq!(record.research_plan.content_availability.high_priority, vec!["LCR"]);
    assert!(!record.is_fallback());
}

#[test]
fn test_typed_fence_wins_over_earlier_generic_fence() {
    let raw = format!(
        "```\n{}\n```\n```json\n{}\n```",
        analysis_response("Generic", "from generic fence"),
        analysis_response("Typed", "from typed fence")
    );

    let (record, tier) = extract_analysis(&raw, &section("x", "X"));
    assert_eq!(tier, ExtractionTier::FencedBlock);
    assert_eq!(record.section_name, "Typed");
}

#[test]
fn test_brace_scan_finds_record_in_prose() {
    let raw = format!(
        "Notes {{\"draft\": true}} and the answer: {} -- end",
        analysis_response("Outlook", "Guidance unchanged.")
    );

    let (record, tier) = extract_analysis(&raw, &section("outlook", "Outlook"));
    assert_eq!(tier, ExtractionTier::BraceScan);
    assert_eq!(record.section_statement, "Guidance unchanged.");
}

#[test]
fn test_object_without_discriminator_is_rejected() {
    let raw = json!({"section_title": "No name key", "content": []}).to_string();
    let (record, tier) = extract_analysis(&raw, &section("misc", "Misc"));

    assert_eq!(tier, ExtractionTier::Fallback);
    assert_eq!(record.section_name, "Misc");
}
