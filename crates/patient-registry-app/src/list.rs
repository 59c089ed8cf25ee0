// crates/patient-registry-app/src/list.rs
// ============================================================================
// Module: Patient List
// Description: Sortable, filterable patient list over a live binding.
// Purpose: Keep the browse screen current with sort toggling, client-side
//          substring filtering, and a table/card view flag.
// Dependencies: patient-registry-core, patient-registry-store
// ============================================================================

//! ## Overview
//! [`PatientList`] binds a sorted projection of the whole patient table and
//! decodes pushed rows into records. Sorting happens in SQL and rebinds the
//! query; the text filter and the table/card choice are purely client-side
//! and survive data refreshes. Clicking the active sort key flips its
//! direction; clicking a new key starts ascending.

// ============================================================================
// SECTION: Imports
// ============================================================================

use patient_registry_core::Gender;
use patient_registry_core::PatientId;
use patient_registry_core::PatientRecord;
use patient_registry_core::SortKey;
use patient_registry_core::SortSpec;
use patient_registry_core::Timestamp;
use patient_registry_store::PatientStore;
use patient_registry_store::SqlValue;

use crate::binding::LiveBinding;

// ============================================================================
// SECTION: View Mode
// ============================================================================

/// How the host renders the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// One row per patient.
    #[default]
    Table,
    /// One card per patient.
    Card,
}

impl ViewMode {
    /// Returns the other view mode.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Table => Self::Card,
            Self::Card => Self::Table,
        }
    }
}

// ============================================================================
// SECTION: List Controller
// ============================================================================

/// Projection the list binds; column order matches [`decode_record`].
const LIST_COLUMNS: &str = "SELECT id, first_name, last_name, date_of_birth, gender, \
                            contact_number, email, address, medical_history, created_at, \
                            updated_at FROM patients";

/// Sortable, filterable patient list.
///
/// # Invariants
/// - `records` always reflects the latest pushed result set under the
///   current sort.
/// - Filtering never touches the store; it narrows the decoded records.
#[derive(Debug)]
pub struct PatientList {
    /// Current sort specification.
    sort: SortSpec,
    /// Case-insensitive substring filter.
    filter: String,
    /// Table or card rendering.
    view: ViewMode,
    /// Live binding over the sorted projection.
    binding: LiveBinding,
    /// Latest decoded records.
    records: Vec<PatientRecord>,
    /// Rows from the last push that did not decode.
    decode_failures: usize,
}

impl PatientList {
    /// Binds the list under the default sort (newest first).
    #[must_use]
    pub fn bind(store: &PatientStore) -> Self {
        let sort = SortSpec::default();
        Self {
            sort,
            filter: String::new(),
            view: ViewMode::default(),
            binding: LiveBinding::bind(store, &list_sql(sort), &[]),
            records: Vec::new(),
            decode_failures: 0,
        }
    }

    /// Applies a header click: same key flips direction, new key sorts
    /// ascending. Rebinds the query under the new sort.
    pub fn clicked(&mut self, store: &PatientStore, key: SortKey) {
        self.sort = self.sort.clicked(key);
        self.binding.rebind(store, &list_sql(self.sort), &[]);
    }

    /// Replaces the client-side filter text.
    pub fn set_filter(&mut self, filter: &str) {
        self.filter = filter.trim().to_lowercase();
    }

    /// Toggles between table and card rendering.
    pub fn toggle_view(&mut self) {
        self.view = self.view.toggled();
    }

    /// Folds in pushed updates and re-decodes the rows.
    pub fn poll(&mut self) {
        self.binding.poll();
        self.records.clear();
        self.decode_failures = 0;
        for row in self.binding.rows() {
            match decode_record(row) {
                Some(record) => self.records.push(record),
                None => self.decode_failures = self.decode_failures.saturating_add(1),
            }
        }
    }

    /// Returns the records passing the current filter, in sort order.
    #[must_use]
    pub fn visible(&self) -> Vec<&PatientRecord> {
        if self.filter.is_empty() {
            return self.records.iter().collect();
        }
        self.records.iter().filter(|record| self.matches_filter(record)).collect()
    }

    /// Matches the filter against name, email, and contact number.
    fn matches_filter(&self, record: &PatientRecord) -> bool {
        let needle = &self.filter;
        record.first_name.to_lowercase().contains(needle)
            || record.last_name.to_lowercase().contains(needle)
            || record.email.as_deref().is_some_and(|email| email.to_lowercase().contains(needle))
            || record
                .contact_number
                .as_deref()
                .is_some_and(|contact| contact.to_lowercase().contains(needle))
    }

    /// Returns the current sort specification.
    #[must_use]
    pub const fn sort(&self) -> SortSpec {
        self.sort
    }

    /// Returns the current view mode.
    #[must_use]
    pub const fn view(&self) -> ViewMode {
        self.view
    }

    /// Returns `true` while the first result set is outstanding.
    #[must_use]
    pub const fn loading(&self) -> bool {
        self.binding.loading()
    }

    /// Returns the binding error, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.binding.error()
    }

    /// Returns the number of rows dropped by the last decode pass.
    #[must_use]
    pub const fn decode_failures(&self) -> usize {
        self.decode_failures
    }
}

// ============================================================================
// SECTION: Row Decoding
// ============================================================================

/// Builds the sorted projection, with the identifier as tiebreak.
fn list_sql(sort: SortSpec) -> String {
    format!(
        "{LIST_COLUMNS} ORDER BY {} {}, id {}",
        sort.key.column(),
        sort.direction.sql(),
        sort.direction.sql()
    )
}

/// Decodes one pushed row in [`LIST_COLUMNS`] order.
fn decode_record(row: &[SqlValue]) -> Option<PatientRecord> {
    if row.len() != 11 {
        return None;
    }
    Some(PatientRecord {
        id: PatientId::from_raw(row[0].as_integer()?)?,
        first_name: row[1].as_text()?.to_string(),
        last_name: row[2].as_text()?.to_string(),
        date_of_birth: row[3].as_text()?.to_string(),
        gender: Gender::parse(row[4].as_text()?)?,
        contact_number: row[5].as_text().map(ToString::to_string),
        email: row[6].as_text().map(ToString::to_string),
        address: row[7].as_text().map(ToString::to_string),
        medical_history: row[8].as_text().map(ToString::to_string),
        created_at: Timestamp::from_unix_millis(row[9].as_integer()?),
        updated_at: Timestamp::from_unix_millis(row[10].as_integer()?),
    })
}
