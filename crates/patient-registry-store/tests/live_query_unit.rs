// crates/patient-registry-store/tests/live_query_unit.rs
// ============================================================================
// Module: Live Query Unit Tests
// Description: Tests for store-driven live query subscriptions.
// Purpose: Validate initial pushes, refresh on mutation, subscription
//          teardown, and pruning of broken queries.
// ============================================================================

//! ## Overview
//! Unit-level tests for live query invariants:
//! - Subscribing pushes the current result set immediately
//! - Every committed mutation pushes a fresh result set
//! - Reads never trigger pushes
//! - Dropping a subscription unregisters it
//! - Queries that stop compiling are pruned instead of wedging the store

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

use std::time::Duration;

use patient_registry_core::PatientDraft;
use patient_registry_core::SortSpec;
use patient_registry_core::Timestamp;
use patient_registry_store::JournalMode;
use patient_registry_store::ParamValue;
use patient_registry_store::PatientStore;
use patient_registry_store::SqlValue;
use patient_registry_store::StoreConfig;
use patient_registry_store::SyncMode;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn open_store(dir: &TempDir) -> PatientStore {
    let config = StoreConfig {
        path: dir.path().join("registry.db"),
        busy_timeout_ms: 5_000,
        journal_mode: JournalMode::Wal,
        sync_mode: SyncMode::Full,
        enforce_unique: true,
        lease_ttl_ms: 30_000,
    };
    PatientStore::open(config, Timestamp::from_unix_millis(0)).expect("open store")
}

fn sample_draft(first: &str, last: &str) -> PatientDraft {
    PatientDraft {
        first_name: first.to_string(),
        last_name: last.to_string(),
        date_of_birth: "1990-01-01".to_string(),
        gender: "Female".to_string(),
        ..PatientDraft::default()
    }
}

fn now(millis: i64) -> Timestamp {
    Timestamp::from_unix_millis(millis)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn subscribing_pushes_current_result_set() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    store.insert_patient(&sample_draft("Ann", "Lee"), now(1)).expect("insert");
    let subscription = store
        .live_query("SELECT first_name FROM patients ORDER BY id", &[])
        .expect("subscribe");
    let outcome = subscription.try_next().expect("initial push");
    assert_eq!(outcome.rows.len(), 1);
    assert_eq!(outcome.rows[0][0], SqlValue::Text("Ann".to_string()));
}

#[test]
fn mutation_pushes_fresh_result_set() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let subscription =
        store.live_query("SELECT COUNT(*) FROM patients", &[]).expect("subscribe");
    let initial = subscription.try_next().expect("initial push");
    assert_eq!(initial.rows[0][0], SqlValue::Integer(0));
    store.insert_patient(&sample_draft("Ann", "Lee"), now(1)).expect("insert");
    let refreshed = subscription.next_timeout(Duration::from_secs(1)).expect("refresh push");
    assert_eq!(refreshed.rows[0][0], SqlValue::Integer(1));
}

#[test]
fn delete_and_update_both_refresh_subscribers() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let id = store.insert_patient(&sample_draft("Ann", "Lee"), now(1)).expect("insert");
    let subscription = store
        .live_query("SELECT last_name FROM patients ORDER BY id", &[])
        .expect("subscribe");
    let _initial = subscription.try_next().expect("initial push");

    let draft = sample_draft("Ann", "Moss");
    store.update_patient(id, &draft, now(2)).expect("update");
    let after_update = subscription.next_timeout(Duration::from_secs(1)).expect("update push");
    assert_eq!(after_update.rows[0][0], SqlValue::Text("Moss".to_string()));

    store.delete_patient(id).expect("delete");
    let after_delete = subscription.next_timeout(Duration::from_secs(1)).expect("delete push");
    assert!(after_delete.rows.is_empty());
}

#[test]
fn parameterized_live_query_keeps_its_bindings() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    store.insert_patient(&sample_draft("Ann", "Lee"), now(1)).expect("insert");
    let subscription = store
        .live_query("SELECT first_name FROM patients WHERE last_name = $1", &[ParamValue::Text(
            "Orr".to_string(),
        )])
        .expect("subscribe");
    let initial = subscription.try_next().expect("initial push");
    assert!(initial.rows.is_empty());
    store.insert_patient(&sample_draft("Bea", "Orr"), now(2)).expect("insert");
    let refreshed = subscription.next_timeout(Duration::from_secs(1)).expect("refresh push");
    assert_eq!(refreshed.rows.len(), 1);
    assert_eq!(refreshed.rows[0][0], SqlValue::Text("Bea".to_string()));
}

#[test]
fn reads_do_not_push() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let subscription =
        store.live_query("SELECT COUNT(*) FROM patients", &[]).expect("subscribe");
    let _initial = subscription.try_next().expect("initial push");
    let _records = store.list_patients(SortSpec::default()).expect("list");
    let _outcome = store.execute("SELECT COUNT(*) FROM patients", &[]).expect("projection");
    assert!(subscription.try_next().is_none());
}

#[test]
fn latest_drains_to_most_recent_result() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let subscription =
        store.live_query("SELECT COUNT(*) FROM patients", &[]).expect("subscribe");
    store.insert_patient(&sample_draft("Ann", "Lee"), now(1)).expect("insert");
    store.insert_patient(&sample_draft("Bea", "Orr"), now(2)).expect("insert");
    let latest = subscription.latest().expect("latest push");
    assert_eq!(latest.rows[0][0], SqlValue::Integer(2));
    assert!(subscription.try_next().is_none());
}

#[test]
fn dropping_subscription_unregisters_it() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let subscription =
        store.live_query("SELECT COUNT(*) FROM patients", &[]).expect("subscribe");
    assert_eq!(store.live_subscription_count(), 1);
    drop(subscription);
    assert_eq!(store.live_subscription_count(), 0);
    store.insert_patient(&sample_draft("Ann", "Lee"), now(1)).expect("insert");
}

#[test]
fn console_mutations_refresh_subscribers() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let subscription =
        store.live_query("SELECT COUNT(*) FROM patients", &[]).expect("subscribe");
    let _initial = subscription.try_next().expect("initial push");
    store
        .execute(
            "INSERT INTO patients (first_name, last_name, date_of_birth, gender, created_at, \
             updated_at) VALUES ($1, $2, $3, $4, $5, $6)",
            &[
                ParamValue::Text("Ann".to_string()),
                ParamValue::Text("Lee".to_string()),
                ParamValue::Text("1990-01-01".to_string()),
                ParamValue::Text("Female".to_string()),
                ParamValue::Integer(1),
                ParamValue::Integer(1),
            ],
        )
        .expect("console insert");
    let refreshed = subscription.next_timeout(Duration::from_secs(1)).expect("refresh push");
    assert_eq!(refreshed.rows[0][0], SqlValue::Integer(1));
}

#[test]
fn broken_query_is_pruned_on_next_mutation() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    store
        .execute("CREATE TABLE scratch (id INTEGER PRIMARY KEY)", &[])
        .expect("create scratch");
    let subscription =
        store.live_query("SELECT COUNT(*) FROM scratch", &[]).expect("subscribe");
    let _initial = subscription.try_next().expect("initial push");
    store.execute("DROP TABLE scratch", &[]).expect("drop scratch");
    assert_eq!(store.live_subscription_count(), 0);
    assert!(subscription.next_timeout(Duration::from_millis(50)).is_none());
}

#[test]
fn live_query_setup_failure_registers_nothing() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let result = store.live_query("SELECT nope FROM missing_table", &[]);
    assert!(result.is_err());
    assert_eq!(store.live_subscription_count(), 0);
}
