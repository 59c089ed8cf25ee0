// crates/patient-registry-store/src/store.rs
// ============================================================================
// Module: SQLite Patient Store
// Description: Durable patient store backed by SQLite.
// Purpose: Own the database handle; expose CRUD, ad-hoc SQL, and leader state.
// Dependencies: patient-registry-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! [`PatientStore`] is the single data-access context for the registry. It
//! bootstraps the schema idempotently (including the optional partial unique
//! indexes over non-null email and contact number), executes parameterized
//! statements with `$n`/`?n` placeholders, rewrites recognizable uniqueness
//! violations into field-specific errors, holds a single-row leader lease,
//! and notifies live subscribers after every committed mutation. The store
//! never reads wall-clock time; hosts supply timestamps explicitly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use patient_registry_core::Field;
use patient_registry_core::Gender;
use patient_registry_core::PatientDraft;
use patient_registry_core::PatientId;
use patient_registry_core::PatientRecord;
use patient_registry_core::SortSpec;
use patient_registry_core::Timestamp;
use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OptionalExtension;
use rusqlite::params;
use rusqlite::params_from_iter;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::live::LiveRegistry;
use crate::live::LiveSubscription;
use crate::value::ParamValue;
use crate::value::QueryOutcome;
use crate::value::SqlValue;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Default leader lease time to live (ms).
const DEFAULT_LEASE_TTL_MS: u64 = 30_000;
/// Projection shared by every patient read path, in canonical column order.
const PATIENT_PROJECTION: &str = "SELECT id, first_name, last_name, date_of_birth, gender, \
                                  contact_number, email, address, medical_history, created_at, \
                                  updated_at FROM patients";
/// Process-wide counter used to derive unique store instance tokens.
static INSTANCE_COUNTER: AtomicU64 = AtomicU64::new(0);

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JournalMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl JournalMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the patient store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` and `lease_ttl_ms` are interpreted as milliseconds and
///   must be greater than zero.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: JournalMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SyncMode,
    /// Whether the partial unique indexes over email/contact number exist.
    #[serde(default = "default_enforce_unique")]
    pub enforce_unique: bool,
    /// Leader lease time to live in milliseconds.
    #[serde(default = "default_lease_ttl_ms")]
    pub lease_ttl_ms: u64,
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Returns the default uniqueness-enforcement toggle (on).
const fn default_enforce_unique() -> bool {
    true
}

/// Returns the default leader lease time to live.
const fn default_lease_ttl_ms() -> u64 {
    DEFAULT_LEASE_TTL_MS
}

/// Validates runtime limits in the store configuration.
fn validate_limits(config: &StoreConfig) -> Result<(), StoreError> {
    if config.busy_timeout_ms == 0 {
        return Err(StoreError::Invalid(
            "busy_timeout_ms must be greater than zero".to_string(),
        ));
    }
    if config.lease_ttl_ms == 0 {
        return Err(StoreError::Invalid("lease_ttl_ms must be greater than zero".to_string()));
    }
    if config.path.is_dir() {
        return Err(StoreError::Invalid(format!(
            "store path is a directory: {}",
            config.path.display()
        )));
    }
    Ok(())
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Patient store errors.
///
/// # Invariants
/// - Uniqueness violations with a recognizable index are reported as
///   [`StoreError::Duplicate`] with the offending field; anything else is
///   surfaced verbatim as [`StoreError::Db`].
#[derive(Debug, Error, Clone)]
pub enum StoreError {
    /// Store I/O error.
    #[error("store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("store db error: {0}")]
    Db(String),
    /// Invalid store data or configuration.
    #[error("invalid store data: {0}")]
    Invalid(String),
    /// The handle is not initialized yet.
    #[error("Database not initialized")]
    NotInitialized,
    /// No patient with the requested identifier.
    #[error("patient {0} not found")]
    NotFound(i64),
    /// Uniqueness violation attributed to a specific field.
    #[error("{message}")]
    Duplicate {
        /// Field whose unique index was violated.
        field: Field,
        /// Field-specific message for inline display.
        message: String,
    },
}

impl StoreError {
    /// Classifies a rusqlite error, rewriting recognizable uniqueness violations.
    fn from_sqlite(error: &rusqlite::Error) -> Self {
        let text = error.to_string();
        if error.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) {
            if text.contains("idx_patients_email") || text.contains("patients.email") {
                return Self::Duplicate {
                    field: Field::Email,
                    message: "A patient with this email already exists".to_string(),
                };
            }
            if text.contains("idx_patients_contact_number")
                || text.contains("patients.contact_number")
            {
                return Self::Duplicate {
                    field: Field::ContactNumber,
                    message: "A patient with this contact number already exists".to_string(),
                };
            }
        }
        Self::Db(text)
    }
}

// ============================================================================
// SECTION: Snapshots
// ============================================================================

/// Lightweight operation counters for local diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOpCounts {
    /// Read operations (get/list/exists/stats).
    pub reads: u64,
    /// Write operations (insert/update/delete).
    pub writes: u64,
    /// Ad-hoc console statements.
    pub adhoc: u64,
    /// Result sets pushed to live subscribers.
    pub live_pushes: u64,
}

/// Dashboard aggregate over the patient table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    /// Total patient count.
    pub total: i64,
    /// Patients with gender `Male`.
    pub male: i64,
    /// Patients with gender `Female`.
    pub female: i64,
    /// Patients with any other gender label.
    pub other: i64,
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Shared state behind a cloneable store handle.
#[derive(Debug)]
struct StoreInner {
    /// Store configuration.
    config: StoreConfig,
    /// Connection guarded by a mutex (`SQLite` serializes writers anyway).
    connection: Mutex<Connection>,
    /// Live query registry.
    live: Arc<LiveRegistry>,
    /// Operation counters.
    counters: Mutex<StoreOpCounts>,
    /// Token identifying this store instance for the leader lease.
    lease_token: String,
}

/// `SQLite`-backed patient store.
///
/// # Invariants
/// - Schema bootstrap is idempotent; opening an existing database is safe.
/// - Every committed mutation triggers one live notification pass.
#[derive(Debug, Clone)]
pub struct PatientStore {
    /// Shared store state.
    inner: Arc<StoreInner>,
}

impl PatientStore {
    /// Opens (or creates) the store and claims the leader lease.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the configuration is invalid, the database
    /// cannot be opened, or schema bootstrap fails.
    pub fn open(config: StoreConfig, now: Timestamp) -> Result<Self, StoreError> {
        validate_limits(&config)?;
        let connection =
            Connection::open(&config.path).map_err(|err| StoreError::Io(err.to_string()))?;
        connection
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .map_err(|err| StoreError::Db(err.to_string()))?;
        connection
            .pragma_update(None, "journal_mode", config.journal_mode.pragma_value())
            .map_err(|err| StoreError::Db(err.to_string()))?;
        connection
            .pragma_update(None, "synchronous", config.sync_mode.pragma_value())
            .map_err(|err| StoreError::Db(err.to_string()))?;

        let mut connection = connection;
        initialize_schema(&mut connection, config.enforce_unique)?;

        let sequence = INSTANCE_COUNTER.fetch_add(1, Ordering::Relaxed);
        let lease_token = format!("{}-{}", std::process::id(), sequence);
        let store = Self {
            inner: Arc::new(StoreInner {
                config,
                connection: Mutex::new(connection),
                live: Arc::new(LiveRegistry::default()),
                counters: Mutex::new(StoreOpCounts::default()),
                lease_token,
            }),
        };
        let _leader = store.refresh_lease(now)?;
        Ok(store)
    }

    /// Returns the token identifying this store instance.
    #[must_use]
    pub fn instance_token(&self) -> &str {
        &self.inner.lease_token
    }

    /// Returns a snapshot of the operation counters.
    #[must_use]
    pub fn op_counts_snapshot(&self) -> StoreOpCounts {
        self.inner.counters.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Returns the number of active live subscriptions.
    #[must_use]
    pub fn live_subscription_count(&self) -> usize {
        self.inner.live.len()
    }

    /// Acquires the connection guard.
    fn connection(&self) -> MutexGuard<'_, Connection> {
        self.inner.connection.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Bumps one counter field.
    fn count(&self, apply: impl FnOnce(&mut StoreOpCounts)) {
        let mut counters = self.inner.counters.lock().unwrap_or_else(PoisonError::into_inner);
        apply(&mut counters);
    }

    // ------------------------------------------------------------------
    // Existence checks
    // ------------------------------------------------------------------

    /// Returns `true` when a patient with this email exists (`false` for blank input).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] when the count query fails.
    pub fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        self.value_exists("email", email)
    }

    /// Returns `true` when a patient with this contact number exists (`false` for blank input).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] when the count query fails.
    pub fn contact_exists(&self, contact_number: &str) -> Result<bool, StoreError> {
        self.value_exists("contact_number", contact_number)
    }

    /// Counts rows matching a column value; blank input short-circuits to `false`.
    fn value_exists(&self, column: &'static str, value: &str) -> Result<bool, StoreError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(false);
        }
        self.count(|counters| counters.reads = counters.reads.saturating_add(1));
        let connection = self.connection();
        let sql = format!("SELECT COUNT(*) FROM patients WHERE {column} = ?1");
        let count: i64 = connection
            .query_row(&sql, params![trimmed], |row| row.get(0))
            .map_err(|err| StoreError::from_sqlite(&err))?;
        Ok(count > 0)
    }

    // ------------------------------------------------------------------
    // CRUD
    // ------------------------------------------------------------------

    /// Inserts a validated draft and returns the assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] on a recognizable uniqueness
    /// violation, [`StoreError::Invalid`] when the gender label does not
    /// parse, or [`StoreError::Db`] for other engine failures.
    pub fn insert_patient(
        &self,
        draft: &PatientDraft,
        now: Timestamp,
    ) -> Result<PatientId, StoreError> {
        let gender = parse_gender(&draft.gender)?;
        let id = {
            let connection = self.connection();
            connection
                .execute(
                    "INSERT INTO patients (first_name, last_name, date_of_birth, gender, \
                     contact_number, email, address, medical_history, created_at, updated_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    params![
                        draft.first_name.trim(),
                        draft.last_name.trim(),
                        draft.date_of_birth.trim(),
                        gender.label(),
                        draft.optional(Field::ContactNumber),
                        draft.optional(Field::Email),
                        draft.optional(Field::Address),
                        draft.optional(Field::MedicalHistory),
                        now.as_unix_millis(),
                        now.as_unix_millis(),
                    ],
                )
                .map_err(|err| StoreError::from_sqlite(&err))?;
            connection.last_insert_rowid()
        };
        self.count(|counters| counters.writes = counters.writes.saturating_add(1));
        self.notify_live();
        PatientId::from_raw(id)
            .ok_or_else(|| StoreError::Db(format!("engine returned non-positive rowid {id}")))
    }

    /// Overwrites the editable fields of an existing patient.
    ///
    /// `created_at` is never touched; `updated_at` is set to `now`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no row matches,
    /// [`StoreError::Duplicate`] on a recognizable uniqueness violation, or
    /// [`StoreError::Db`] for other engine failures.
    pub fn update_patient(
        &self,
        id: PatientId,
        draft: &PatientDraft,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        let gender = parse_gender(&draft.gender)?;
        let changed = {
            let connection = self.connection();
            connection
                .execute(
                    "UPDATE patients SET first_name = ?1, last_name = ?2, date_of_birth = ?3, \
                     gender = ?4, contact_number = ?5, email = ?6, address = ?7, \
                     medical_history = ?8, updated_at = ?9 WHERE id = ?10",
                    params![
                        draft.first_name.trim(),
                        draft.last_name.trim(),
                        draft.date_of_birth.trim(),
                        gender.label(),
                        draft.optional(Field::ContactNumber),
                        draft.optional(Field::Email),
                        draft.optional(Field::Address),
                        draft.optional(Field::MedicalHistory),
                        now.as_unix_millis(),
                        id.get(),
                    ],
                )
                .map_err(|err| StoreError::from_sqlite(&err))?
        };
        if changed == 0 {
            return Err(StoreError::NotFound(id.get()));
        }
        self.count(|counters| counters.writes = counters.writes.saturating_add(1));
        self.notify_live();
        Ok(())
    }

    /// Deletes a patient by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no row matches, or
    /// [`StoreError::Db`] for engine failures.
    pub fn delete_patient(&self, id: PatientId) -> Result<(), StoreError> {
        let changed = {
            let connection = self.connection();
            connection
                .execute("DELETE FROM patients WHERE id = ?1", params![id.get()])
                .map_err(|err| StoreError::from_sqlite(&err))?
        };
        if changed == 0 {
            return Err(StoreError::NotFound(id.get()));
        }
        self.count(|counters| counters.writes = counters.writes.saturating_add(1));
        self.notify_live();
        Ok(())
    }

    /// Loads a patient by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] when the query fails or a stored row does
    /// not decode into a record.
    pub fn get_patient(&self, id: PatientId) -> Result<Option<PatientRecord>, StoreError> {
        self.count(|counters| counters.reads = counters.reads.saturating_add(1));
        let connection = self.connection();
        let sql = format!("{PATIENT_PROJECTION} WHERE id = ?1");
        connection
            .query_row(&sql, params![id.get()], record_from_row)
            .optional()
            .map_err(|err| StoreError::from_sqlite(&err))
    }

    /// Lists all patients under the given sort order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] when the query fails or a stored row does
    /// not decode into a record.
    pub fn list_patients(&self, sort: SortSpec) -> Result<Vec<PatientRecord>, StoreError> {
        self.count(|counters| counters.reads = counters.reads.saturating_add(1));
        let connection = self.connection();
        let sql = patient_list_sql(sort);
        let mut statement =
            connection.prepare(&sql).map_err(|err| StoreError::from_sqlite(&err))?;
        let rows = statement
            .query_map(params![], record_from_row)
            .map_err(|err| StoreError::from_sqlite(&err))?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(|err| StoreError::from_sqlite(&err))?);
        }
        Ok(records)
    }

    /// Computes the dashboard aggregate over the patient table.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] when the aggregate query fails.
    pub fn dashboard_stats(&self) -> Result<DashboardStats, StoreError> {
        self.count(|counters| counters.reads = counters.reads.saturating_add(1));
        let connection = self.connection();
        connection
            .query_row(
                "SELECT COUNT(*) AS total_patients, \
                 COUNT(CASE WHEN gender = 'Male' THEN 1 END) AS male_patients, \
                 COUNT(CASE WHEN gender = 'Female' THEN 1 END) AS female_patients, \
                 COUNT(CASE WHEN gender NOT IN ('Male', 'Female') THEN 1 END) AS other_patients \
                 FROM patients",
                params![],
                |row| {
                    Ok(DashboardStats {
                        total: row.get(0)?,
                        male: row.get(1)?,
                        female: row.get(2)?,
                        other: row.get(3)?,
                    })
                },
            )
            .map_err(|err| StoreError::from_sqlite(&err))
    }

    // ------------------------------------------------------------------
    // Ad-hoc execution
    // ------------------------------------------------------------------

    /// Executes one parameterized statement (`$n` or `?n` placeholders).
    ///
    /// Projection statements return columns and rows; anything else returns
    /// the affected row count and triggers a live notification pass.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] on a recognizable uniqueness
    /// violation, otherwise the engine failure verbatim.
    pub fn execute(&self, sql: &str, params: &[ParamValue]) -> Result<QueryOutcome, StoreError> {
        self.count(|counters| counters.adhoc = counters.adhoc.saturating_add(1));
        let rewritten = rewrite_placeholders(sql);
        let outcome = {
            let connection = self.connection();
            run_statement(&connection, &rewritten, params)?
        };
        if !outcome.is_projection() {
            self.notify_live();
        }
        Ok(outcome)
    }

    // ------------------------------------------------------------------
    // Live queries
    // ------------------------------------------------------------------

    /// Subscribes to a query; the current result set is pushed immediately.
    ///
    /// # Errors
    ///
    /// Returns the engine failure when the initial run of the query fails;
    /// no subscription is registered in that case.
    pub fn live_query(
        &self,
        sql: &str,
        params: &[ParamValue],
    ) -> Result<LiveSubscription, StoreError> {
        let rewritten = rewrite_placeholders(sql);
        let initial = {
            let connection = self.connection();
            run_statement(&connection, &rewritten, params)?
        };
        let (id, receiver) = self.inner.live.register(rewritten, params.to_vec());
        if self.inner.live.push(id, initial) {
            self.count(|counters| counters.live_pushes = counters.live_pushes.saturating_add(1));
        }
        Ok(LiveSubscription::new(id, receiver, Arc::downgrade(&self.inner.live)))
    }

    /// Re-runs every live query and pushes fresh result sets.
    fn notify_live(&self) {
        let snapshot = self.inner.live.snapshot();
        if snapshot.is_empty() {
            return;
        }
        let mut dead = Vec::new();
        for (id, sql, params) in snapshot {
            let outcome = {
                let connection = self.connection();
                run_statement(&connection, &sql, &params)
            };
            match outcome {
                Ok(outcome) => {
                    if self.inner.live.push(id, outcome) {
                        self.count(|counters| {
                            counters.live_pushes = counters.live_pushes.saturating_add(1);
                        });
                    } else {
                        dead.push(id);
                    }
                }
                // A query that stopped compiling (e.g. its table was dropped
                // through the console) cannot receive further pushes.
                Err(_) => dead.push(id),
            }
        }
        self.inner.live.prune(&dead);
    }

    // ------------------------------------------------------------------
    // Leader lease
    // ------------------------------------------------------------------

    /// Claims or renews the leader lease; returns the resulting leader flag.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] when the lease upsert or read fails.
    pub fn refresh_lease(&self, now: Timestamp) -> Result<bool, StoreError> {
        let ttl = i64::try_from(self.inner.config.lease_ttl_ms).unwrap_or(i64::MAX);
        let expires_at = now.as_unix_millis().saturating_add(ttl);
        {
            let connection = self.connection();
            connection
                .execute(
                    "INSERT INTO store_lease (slot, holder, expires_at) VALUES (1, ?1, ?2) \
                     ON CONFLICT(slot) DO UPDATE SET holder = excluded.holder, \
                     expires_at = excluded.expires_at \
                     WHERE store_lease.holder = excluded.holder OR store_lease.expires_at < ?3",
                    params![self.inner.lease_token, expires_at, now.as_unix_millis()],
                )
                .map_err(|err| StoreError::from_sqlite(&err))?;
        }
        self.leader_status(now)
    }

    /// Returns `true` while this instance holds a non-expired leader lease.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] when the lease read fails.
    pub fn leader_status(&self, now: Timestamp) -> Result<bool, StoreError> {
        let connection = self.connection();
        let row: Option<(String, i64)> = connection
            .query_row(
                "SELECT holder, expires_at FROM store_lease WHERE slot = 1",
                params![],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|err| StoreError::from_sqlite(&err))?;
        Ok(row.is_some_and(|(holder, expires_at)| {
            holder == self.inner.lease_token && expires_at >= now.as_unix_millis()
        }))
    }
}

// ============================================================================
// SECTION: Schema
// ============================================================================

/// Creates the schema when absent; safe to run on every open.
fn initialize_schema(connection: &mut Connection, enforce_unique: bool) -> Result<(), StoreError> {
    let tx = connection.transaction().map_err(|err| StoreError::Db(err.to_string()))?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS patients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            date_of_birth TEXT NOT NULL,
            gender TEXT NOT NULL,
            contact_number TEXT,
            email TEXT,
            address TEXT,
            medical_history TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS store_lease (
            slot INTEGER PRIMARY KEY CHECK (slot = 1),
            holder TEXT NOT NULL,
            expires_at INTEGER NOT NULL
        );",
    )
    .map_err(|err| StoreError::Db(err.to_string()))?;
    if enforce_unique {
        tx.execute_batch(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_patients_email
                 ON patients (email) WHERE email IS NOT NULL;
             CREATE UNIQUE INDEX IF NOT EXISTS idx_patients_contact_number
                 ON patients (contact_number) WHERE contact_number IS NOT NULL;",
        )
        .map_err(|err| StoreError::Db(err.to_string()))?;
    }
    tx.commit().map_err(|err| StoreError::Db(err.to_string()))
}

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// Decodes one patient row in canonical projection order.
fn record_from_row(row: &rusqlite::Row<'_>) -> Result<PatientRecord, rusqlite::Error> {
    let raw_id: i64 = row.get(0)?;
    let id = PatientId::from_raw(raw_id).ok_or_else(|| {
        rusqlite::Error::IntegralValueOutOfRange(0, raw_id)
    })?;
    let gender_label: String = row.get(4)?;
    let gender = Gender::parse(&gender_label).ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(4, "gender".to_string(), rusqlite::types::Type::Text)
    })?;
    Ok(PatientRecord {
        id,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        date_of_birth: row.get(3)?,
        gender,
        contact_number: row.get(5)?,
        email: row.get(6)?,
        address: row.get(7)?,
        medical_history: row.get(8)?,
        created_at: Timestamp::from_unix_millis(row.get(9)?),
        updated_at: Timestamp::from_unix_millis(row.get(10)?),
    })
}

/// Builds the sorted list query; sort columns come from a closed enum.
fn patient_list_sql(sort: SortSpec) -> String {
    format!(
        "{PATIENT_PROJECTION} ORDER BY {} {}, id {}",
        sort.key.column(),
        sort.direction.sql(),
        sort.direction.sql()
    )
}

/// Parses a gender label, failing closed on anything outside the enumeration.
fn parse_gender(label: &str) -> Result<Gender, StoreError> {
    Gender::parse(label.trim())
        .ok_or_else(|| StoreError::Invalid(format!("unsupported gender label: {label}")))
}

// ============================================================================
// SECTION: Statement Execution
// ============================================================================

/// Runs one prepared statement and shapes the result.
fn run_statement(
    connection: &Connection,
    sql: &str,
    params: &[ParamValue],
) -> Result<QueryOutcome, StoreError> {
    let mut statement = connection.prepare(sql).map_err(|err| StoreError::from_sqlite(&err))?;
    let column_count = statement.column_count();
    if column_count == 0 {
        let rows_affected = statement
            .execute(params_from_iter(params.iter()))
            .map_err(|err| StoreError::from_sqlite(&err))?;
        return Ok(QueryOutcome {
            columns: Vec::new(),
            rows: Vec::new(),
            rows_affected,
        });
    }
    let columns: Vec<String> =
        statement.column_names().iter().map(|name| (*name).to_string()).collect();
    let mut rows = statement
        .query(params_from_iter(params.iter()))
        .map_err(|err| StoreError::from_sqlite(&err))?;
    let mut collected = Vec::new();
    while let Some(row) = rows.next().map_err(|err| StoreError::from_sqlite(&err))? {
        let mut cells = Vec::with_capacity(column_count);
        for index in 0..column_count {
            let cell = row.get_ref(index).map_err(|err| StoreError::from_sqlite(&err))?;
            cells.push(SqlValue::from_value_ref(cell));
        }
        collected.push(cells);
    }
    Ok(QueryOutcome {
        columns,
        rows: collected,
        rows_affected: 0,
    })
}

/// Rewrites `$n` placeholders to `?n`, skipping quoted regions.
fn rewrite_placeholders(sql: &str) -> String {
    let mut output = String::with_capacity(sql.len());
    let mut in_single = false;
    let mut in_double = false;
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' if !in_double => {
                in_single = !in_single;
                output.push(c);
            }
            '"' if !in_single => {
                in_double = !in_double;
                output.push(c);
            }
            '$' if !in_single && !in_double => {
                if chars.peek().is_some_and(char::is_ascii_digit) {
                    output.push('?');
                } else {
                    output.push(c);
                }
            }
            _ => output.push(c),
        }
    }
    output
}
