// crates/patient-registry-store/tests/store_unit.rs
// ============================================================================
// Module: Patient Store Unit Tests
// Description: Targeted tests for the SQLite patient store.
// Purpose: Validate schema bootstrap, CRUD semantics, uniqueness rewriting,
//          sorting, ad-hoc execution, and the leader lease.
// ============================================================================

//! ## Overview
//! Unit-level tests for patient store invariants:
//! - Idempotent schema bootstrap and config limit validation
//! - Insert/update/delete round trips with caller-supplied timestamps
//! - Field-specific duplicate errors when uniqueness is enforced
//! - Duplicate acceptance when the uniqueness toggle is off
//! - Sort order including the identifier tiebreak
//! - Ad-hoc statement shaping (`$n` placeholders, projections, mutations)
//! - Single-row leader lease claim, renewal, and takeover

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

use std::path::Path;

use patient_registry_core::PatientDraft;
use patient_registry_core::PatientId;
use patient_registry_core::SortDirection;
use patient_registry_core::SortKey;
use patient_registry_core::SortSpec;
use patient_registry_core::Timestamp;
use patient_registry_store::JournalMode;
use patient_registry_store::ParamValue;
use patient_registry_store::PatientStore;
use patient_registry_store::SqlValue;
use patient_registry_store::StoreConfig;
use patient_registry_store::StoreError;
use patient_registry_store::SyncMode;
use proptest::prelude::ProptestConfig;
use proptest::prelude::proptest;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn store_config(path: &Path) -> StoreConfig {
    StoreConfig {
        path: path.to_path_buf(),
        busy_timeout_ms: 5_000,
        journal_mode: JournalMode::Wal,
        sync_mode: SyncMode::Full,
        enforce_unique: true,
        lease_ttl_ms: 30_000,
    }
}

fn open_store(dir: &TempDir) -> PatientStore {
    let config = store_config(&dir.path().join("registry.db"));
    PatientStore::open(config, Timestamp::from_unix_millis(1_000)).expect("open store")
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
// SECTION: Config and Bootstrap
// ============================================================================

#[test]
fn open_rejects_zero_busy_timeout() {
    let dir = TempDir::new().expect("tempdir");
    let mut config = store_config(&dir.path().join("registry.db"));
    config.busy_timeout_ms = 0;
    let result = PatientStore::open(config, now(0));
    assert!(matches!(result, Err(StoreError::Invalid(_))));
}

#[test]
fn open_rejects_zero_lease_ttl() {
    let dir = TempDir::new().expect("tempdir");
    let mut config = store_config(&dir.path().join("registry.db"));
    config.lease_ttl_ms = 0;
    let result = PatientStore::open(config, now(0));
    assert!(matches!(result, Err(StoreError::Invalid(_))));
}

#[test]
fn open_rejects_directory_path() {
    let dir = TempDir::new().expect("tempdir");
    let config = store_config(dir.path());
    let result = PatientStore::open(config, now(0));
    assert!(matches!(result, Err(StoreError::Invalid(_))));
}

#[test]
fn reopen_existing_database_is_idempotent() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("registry.db");
    let id = {
        let store = PatientStore::open(store_config(&path), now(0)).expect("first open");
        store.insert_patient(&sample_draft("Ann", "Lee"), now(10)).expect("insert")
    };
    let store = PatientStore::open(store_config(&path), now(20)).expect("second open");
    let record = store.get_patient(id).expect("get").expect("present");
    assert_eq!(record.first_name, "Ann");
    assert_eq!(record.created_at, now(10));
}

// ============================================================================
// SECTION: CRUD
// ============================================================================

#[test]
fn insert_then_get_round_trips_all_fields() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let mut draft = sample_draft("Ann", "Lee");
    draft.email = "ann@example.com".to_string();
    draft.contact_number = "+1 555 0100".to_string();
    draft.address = "12 Elm St".to_string();
    draft.medical_history = "None noted".to_string();
    let id = store.insert_patient(&draft, now(42)).expect("insert");
    let record = store.get_patient(id).expect("get").expect("present");
    assert_eq!(record.id, id);
    assert_eq!(record.last_name, "Lee");
    assert_eq!(record.date_of_birth, "1990-01-01");
    assert_eq!(record.email.as_deref(), Some("ann@example.com"));
    assert_eq!(record.contact_number.as_deref(), Some("+1 555 0100"));
    assert_eq!(record.address.as_deref(), Some("12 Elm St"));
    assert_eq!(record.medical_history.as_deref(), Some("None noted"));
    assert_eq!(record.created_at, now(42));
    assert_eq!(record.updated_at, now(42));
}

#[test]
fn insert_stores_blank_optionals_as_null() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let mut draft = sample_draft("Ann", "Lee");
    draft.email = "   ".to_string();
    let id = store.insert_patient(&draft, now(1)).expect("insert");
    let record = store.get_patient(id).expect("get").expect("present");
    assert_eq!(record.email, None);
    assert_eq!(record.contact_number, None);
}

#[test]
fn insert_rejects_unknown_gender_label() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let mut draft = sample_draft("Ann", "Lee");
    draft.gender = "Unlisted".to_string();
    let result = store.insert_patient(&draft, now(1));
    assert!(matches!(result, Err(StoreError::Invalid(_))));
}

#[test]
fn update_preserves_created_at_and_bumps_updated_at() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let id = store.insert_patient(&sample_draft("Ann", "Lee"), now(100)).expect("insert");
    let mut draft = store.get_patient(id).expect("get").expect("present").to_draft();
    draft.first_name = "Anna".to_string();
    store.update_patient(id, &draft, now(500)).expect("update");
    let record = store.get_patient(id).expect("get").expect("present");
    assert_eq!(record.first_name, "Anna");
    assert_eq!(record.created_at, now(100));
    assert_eq!(record.updated_at, now(500));
}

#[test]
fn update_missing_patient_reports_not_found() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let id = PatientId::from_raw(99).expect("nonzero id");
    let result = store.update_patient(id, &sample_draft("Ann", "Lee"), now(1));
    assert!(matches!(result, Err(StoreError::NotFound(99))));
}

#[test]
fn delete_removes_row_and_second_delete_reports_not_found() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let id = store.insert_patient(&sample_draft("Ann", "Lee"), now(1)).expect("insert");
    store.delete_patient(id).expect("delete");
    assert!(store.get_patient(id).expect("get").is_none());
    let result = store.delete_patient(id);
    assert!(matches!(result, Err(StoreError::NotFound(_))));
}

// ============================================================================
// SECTION: Uniqueness
// ============================================================================

#[test]
fn duplicate_email_reports_field_specific_message() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let mut first = sample_draft("Ann", "Lee");
    first.email = "ann@example.com".to_string();
    store.insert_patient(&first, now(1)).expect("first insert");
    let mut second = sample_draft("Bea", "Orr");
    second.email = "ann@example.com".to_string();
    let result = store.insert_patient(&second, now(2));
    match result {
        Err(StoreError::Duplicate { field, message }) => {
            assert_eq!(field, patient_registry_core::Field::Email);
            assert_eq!(message, "A patient with this email already exists");
        }
        other => panic!("expected duplicate email error, got {other:?}"),
    }
}

#[test]
fn duplicate_contact_number_reports_field_specific_message() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let mut first = sample_draft("Ann", "Lee");
    first.contact_number = "555-0100".to_string();
    store.insert_patient(&first, now(1)).expect("first insert");
    let mut second = sample_draft("Bea", "Orr");
    second.contact_number = "555-0100".to_string();
    let result = store.insert_patient(&second, now(2));
    match result {
        Err(StoreError::Duplicate { field, message }) => {
            assert_eq!(field, patient_registry_core::Field::ContactNumber);
            assert_eq!(message, "A patient with this contact number already exists");
        }
        other => panic!("expected duplicate contact error, got {other:?}"),
    }
}

#[test]
fn null_optionals_never_collide() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    store.insert_patient(&sample_draft("Ann", "Lee"), now(1)).expect("first insert");
    store.insert_patient(&sample_draft("Bea", "Orr"), now(2)).expect("second insert");
    assert_eq!(store.list_patients(SortSpec::default()).expect("list").len(), 2);
}

#[test]
fn update_into_duplicate_email_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let mut first = sample_draft("Ann", "Lee");
    first.email = "ann@example.com".to_string();
    store.insert_patient(&first, now(1)).expect("first insert");
    let mut second = sample_draft("Bea", "Orr");
    second.email = "bea@example.com".to_string();
    let second_id = store.insert_patient(&second, now(2)).expect("second insert");
    second.email = "ann@example.com".to_string();
    let result = store.update_patient(second_id, &second, now(3));
    assert!(matches!(result, Err(StoreError::Duplicate { .. })));
    let untouched = store.get_patient(second_id).expect("get").expect("present");
    assert_eq!(untouched.email.as_deref(), Some("bea@example.com"));
}

#[test]
fn disabled_uniqueness_allows_duplicates() {
    let dir = TempDir::new().expect("tempdir");
    let mut config = store_config(&dir.path().join("registry.db"));
    config.enforce_unique = false;
    let store = PatientStore::open(config, now(0)).expect("open store");
    let mut draft = sample_draft("Ann", "Lee");
    draft.email = "ann@example.com".to_string();
    store.insert_patient(&draft, now(1)).expect("first insert");
    store.insert_patient(&draft, now(2)).expect("duplicate insert");
    assert_eq!(store.list_patients(SortSpec::default()).expect("list").len(), 2);
}

#[test]
fn existence_checks_report_presence_and_ignore_blank_input() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let mut draft = sample_draft("Ann", "Lee");
    draft.email = "ann@example.com".to_string();
    draft.contact_number = "555-0100".to_string();
    store.insert_patient(&draft, now(1)).expect("insert");
    assert!(store.email_exists("ann@example.com").expect("email check"));
    assert!(!store.email_exists("bea@example.com").expect("email check"));
    assert!(store.contact_exists("555-0100").expect("contact check"));
    assert!(!store.email_exists("   ").expect("blank email check"));
    assert!(!store.contact_exists("").expect("blank contact check"));
}

// ============================================================================
// SECTION: Listing and Stats
// ============================================================================

#[test]
fn default_sort_is_newest_first() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    store.insert_patient(&sample_draft("Old", "One"), now(100)).expect("insert");
    store.insert_patient(&sample_draft("New", "Two"), now(200)).expect("insert");
    let records = store.list_patients(SortSpec::default()).expect("list");
    assert_eq!(records[0].first_name, "New");
    assert_eq!(records[1].first_name, "Old");
}

#[test]
fn last_name_sort_ascending_orders_alphabetically() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    store.insert_patient(&sample_draft("Ann", "Young"), now(1)).expect("insert");
    store.insert_patient(&sample_draft("Bea", "Adams"), now(2)).expect("insert");
    let sort = SortSpec {
        key: SortKey::LastName,
        direction: SortDirection::Ascending,
    };
    let records = store.list_patients(sort).expect("list");
    assert_eq!(records[0].last_name, "Adams");
    assert_eq!(records[1].last_name, "Young");
}

#[test]
fn equal_sort_keys_break_ties_by_identifier() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let first = store.insert_patient(&sample_draft("Ann", "Lee"), now(50)).expect("insert");
    let second = store.insert_patient(&sample_draft("Bea", "Lee"), now(50)).expect("insert");
    let records = store.list_patients(SortSpec::default()).expect("list");
    assert_eq!(records[0].id, second);
    assert_eq!(records[1].id, first);
}

#[test]
fn dashboard_stats_bucket_gender_counts() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let mut male = sample_draft("Al", "One");
    male.gender = "Male".to_string();
    store.insert_patient(&male, now(1)).expect("insert");
    store.insert_patient(&sample_draft("Ann", "Two"), now(2)).expect("insert");
    let mut other = sample_draft("Kit", "Three");
    other.gender = "Prefer not to say".to_string();
    store.insert_patient(&other, now(3)).expect("insert");
    let stats = store.dashboard_stats().expect("stats");
    assert_eq!(stats.total, 3);
    assert_eq!(stats.male, 1);
    assert_eq!(stats.female, 1);
    assert_eq!(stats.other, 1);
}

// ============================================================================
// SECTION: Ad-hoc Execution
// ============================================================================

#[test]
fn execute_projection_returns_columns_and_rows() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    store.insert_patient(&sample_draft("Ann", "Lee"), now(1)).expect("insert");
    let outcome = store
        .execute("SELECT first_name, last_name FROM patients WHERE last_name = $1", &[
            ParamValue::Text("Lee".to_string()),
        ])
        .expect("execute");
    assert!(outcome.is_projection());
    assert_eq!(outcome.columns, vec!["first_name".to_string(), "last_name".to_string()]);
    assert_eq!(outcome.rows.len(), 1);
    assert_eq!(outcome.rows[0][0], SqlValue::Text("Ann".to_string()));
}

#[test]
fn execute_mutation_reports_rows_affected() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    store.insert_patient(&sample_draft("Ann", "Lee"), now(1)).expect("insert");
    store.insert_patient(&sample_draft("Bea", "Lee"), now(2)).expect("insert");
    let outcome = store
        .execute("UPDATE patients SET address = $1 WHERE last_name = $2", &[
            ParamValue::Text("Ward 3".to_string()),
            ParamValue::Text("Lee".to_string()),
        ])
        .expect("execute");
    assert!(!outcome.is_projection());
    assert_eq!(outcome.rows_affected, 2);
}

#[test]
fn execute_leaves_dollar_signs_inside_literals_alone() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let outcome = store.execute("SELECT '$1' AS literal", &[]).expect("execute");
    assert_eq!(outcome.rows[0][0], SqlValue::Text("$1".to_string()));
}

#[test]
fn execute_count_matches_inserted_rows() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    for index in 0..5 {
        store
            .insert_patient(&sample_draft("Ann", &format!("Lee{index}")), now(index))
            .expect("insert");
    }
    let outcome = store.execute("SELECT COUNT(*) FROM patients", &[]).expect("execute");
    assert_eq!(outcome.rows[0][0], SqlValue::Integer(5));
}

#[test]
fn execute_surfaces_duplicate_errors_like_crud_paths() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let mut draft = sample_draft("Ann", "Lee");
    draft.email = "ann@example.com".to_string();
    store.insert_patient(&draft, now(1)).expect("insert");
    let result = store.execute(
        "INSERT INTO patients (first_name, last_name, date_of_birth, gender, email, created_at, \
         updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        &[
            ParamValue::Text("Bea".to_string()),
            ParamValue::Text("Orr".to_string()),
            ParamValue::Text("1991-02-02".to_string()),
            ParamValue::Text("Female".to_string()),
            ParamValue::Text("ann@example.com".to_string()),
            ParamValue::Integer(2),
            ParamValue::Integer(2),
        ],
    );
    assert!(matches!(result, Err(StoreError::Duplicate { .. })));
}

#[test]
fn op_counts_track_reads_writes_and_adhoc() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    let id = store.insert_patient(&sample_draft("Ann", "Lee"), now(1)).expect("insert");
    let _record = store.get_patient(id).expect("get");
    let _outcome = store.execute("SELECT 1", &[]).expect("execute");
    let counts = store.op_counts_snapshot();
    assert_eq!(counts.writes, 1);
    assert_eq!(counts.reads, 1);
    assert_eq!(counts.adhoc, 1);
}

// ============================================================================
// SECTION: Leader Lease
// ============================================================================

#[test]
fn opening_store_claims_leadership() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    assert!(store.leader_status(now(1_001)).expect("leader status"));
}

#[test]
fn second_store_stays_follower_while_lease_is_fresh() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("registry.db");
    let leader = PatientStore::open(store_config(&path), now(0)).expect("open leader");
    let follower = PatientStore::open(store_config(&path), now(1)).expect("open follower");
    assert!(leader.leader_status(now(2)).expect("leader status"));
    assert!(!follower.leader_status(now(2)).expect("follower status"));
}

#[test]
fn follower_takes_over_after_lease_expiry() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("registry.db");
    let leader = PatientStore::open(store_config(&path), now(0)).expect("open leader");
    let follower = PatientStore::open(store_config(&path), now(1)).expect("open follower");
    let after_expiry = now(60_000);
    assert!(follower.refresh_lease(after_expiry).expect("takeover"));
    assert!(!leader.leader_status(after_expiry).expect("old leader status"));
}

#[test]
fn refresh_extends_the_current_lease() {
    let dir = TempDir::new().expect("tempdir");
    let store = open_store(&dir);
    assert!(store.refresh_lease(now(25_000)).expect("renew"));
    assert!(store.leader_status(now(50_000)).expect("leader status"));
}

// ============================================================================
// SECTION: Ad-hoc Execution Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn adhoc_text_params_round_trip_while_quoted_dollars_stay_literal(
        value in "[A-Za-z0-9 ]{0,16}",
    ) {
        let dir = TempDir::new().expect("tempdir");
        let store = open_store(&dir);
        let outcome = store
            .execute("SELECT $1 AS echo, '$2' AS literal", &[ParamValue::Text(value.clone())])
            .expect("echo query");
        proptest::prop_assert_eq!(outcome.rows.len(), 1);
        proptest::prop_assert_eq!(&outcome.rows[0][0], &SqlValue::Text(value));
        proptest::prop_assert_eq!(&outcome.rows[0][1], &SqlValue::Text("$2".to_string()));
    }
}
