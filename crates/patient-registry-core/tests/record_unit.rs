// crates/patient-registry-core/tests/record_unit.rs
// ============================================================================
// Module: Record Model Unit Tests
// Description: Serde wire-format stability checks for the record model.
// Purpose: Keep the serialized shapes hosts persist and exchange stable.
// ============================================================================

//! ## Overview
//! Wire-format tests for the record model:
//! - Gender uses snake_case tags distinct from its display labels
//! - Timestamps serialize transparently as unix milliseconds
//! - Sort specifications and full records round trip without loss

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use patient_registry_core::Gender;
use patient_registry_core::PatientId;
use patient_registry_core::PatientRecord;
use patient_registry_core::SortDirection;
use patient_registry_core::SortKey;
use patient_registry_core::SortSpec;
use patient_registry_core::Timestamp;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn gender_serializes_as_snake_case_tags() {
    let json = serde_json::to_value(Gender::PreferNotToSay).expect("serialize gender");
    assert_eq!(json, serde_json::json!("prefer_not_to_say"));
    let parsed: Gender = serde_json::from_value(json).expect("deserialize gender");
    assert_eq!(parsed, Gender::PreferNotToSay);
}

#[test]
fn gender_tags_are_distinct_from_display_labels() {
    let json = serde_json::to_value(Gender::PreferNotToSay).expect("serialize gender");
    assert_ne!(json, serde_json::json!(Gender::PreferNotToSay.label()));
}

#[test]
fn timestamp_serializes_transparently_as_millis() {
    let json = serde_json::to_value(Timestamp::from_unix_millis(1_234)).expect("serialize");
    assert_eq!(json, serde_json::json!(1_234));
    let parsed: Timestamp = serde_json::from_value(json).expect("deserialize");
    assert_eq!(parsed.as_unix_millis(), 1_234);
}

#[test]
fn sort_spec_round_trips() {
    let spec = SortSpec {
        key: SortKey::DateOfBirth,
        direction: SortDirection::Descending,
    };
    let json = serde_json::to_string(&spec).expect("serialize sort spec");
    assert!(json.contains("date_of_birth"));
    let parsed: SortSpec = serde_json::from_str(&json).expect("deserialize sort spec");
    assert_eq!(parsed, spec);
}

#[test]
fn patient_record_round_trips_without_loss() {
    let record = PatientRecord {
        id: PatientId::from_raw(7).expect("nonzero id"),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        date_of_birth: "1990-12-10".to_string(),
        gender: Gender::Female,
        contact_number: Some("+34-600-111-222".to_string()),
        email: None,
        address: Some("1 Analytical Way".to_string()),
        medical_history: None,
        created_at: Timestamp::from_unix_millis(100),
        updated_at: Timestamp::from_unix_millis(200),
    };
    let json = serde_json::to_string(&record).expect("serialize record");
    let parsed: PatientRecord = serde_json::from_str(&json).expect("deserialize record");
    assert_eq!(parsed, record);
}
