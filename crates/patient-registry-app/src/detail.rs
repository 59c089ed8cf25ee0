// crates/patient-registry-app/src/detail.rs
// ============================================================================
// Module: Patient Detail
// Description: Detail screen state machine (view, edit, two-step delete).
// Purpose: Drive the edit and delete flows for one patient without ever
//          mutating the stored record until the host commits.
// Dependencies: patient-registry-core, patient-registry-store
// ============================================================================

//! ## Overview
//! [`PatientDetail`] loads one record and moves between three states:
//! viewing, editing (a draft copied from the record; cancel discards it), and
//! confirming a delete. Deletion always takes two explicit calls: first
//! [`PatientDetail::request_delete`], then [`PatientDetail::confirm_delete`].
//! A failed save keeps the screen in editing with the per-field messages
//! inline; the stored record is only refreshed after the update commits.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use patient_registry_core::Field;
use patient_registry_core::PatientDraft;
use patient_registry_core::PatientId;
use patient_registry_core::PatientRecord;
use patient_registry_core::Timestamp;
use patient_registry_core::ValidationReport;
use patient_registry_core::validate_patient;
use patient_registry_store::PatientStore;
use patient_registry_store::StoreError;
use time::Date;

// ============================================================================
// SECTION: State
// ============================================================================

/// Detail screen state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailState {
    /// Read-only display of the record.
    #[default]
    Viewing,
    /// A draft is under edit; the record is untouched.
    Editing,
    /// A delete was requested and awaits confirmation.
    ConfirmingDelete,
}

/// Detail screen controller for one patient.
///
/// # Invariants
/// - The stored record only changes through a committed save.
/// - `closed` flips exactly once, after a confirmed delete.
#[derive(Debug)]
pub struct PatientDetail {
    /// Identifier of the patient on screen.
    id: PatientId,
    /// Last record read back from the store.
    record: PatientRecord,
    /// Draft under edit; meaningful only in [`DetailState::Editing`].
    draft: PatientDraft,
    /// Latest validation report for the draft.
    report: ValidationReport,
    /// Unresolved uniqueness conflicts from a failed save.
    conflicts: BTreeMap<Field, String>,
    /// Current screen state.
    state: DetailState,
    /// Set after a confirmed delete; the screen should be dismissed.
    closed: bool,
}

impl PatientDetail {
    /// Loads the patient and opens the screen in the viewing state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the patient does not exist, or
    /// [`StoreError::Db`] when the read fails.
    pub fn load(store: &PatientStore, id: PatientId) -> Result<Self, StoreError> {
        let record = store.get_patient(id)?.ok_or(StoreError::NotFound(id.get()))?;
        Ok(Self {
            id,
            record,
            draft: PatientDraft::default(),
            report: ValidationReport::default(),
            conflicts: BTreeMap::new(),
            state: DetailState::Viewing,
            closed: false,
        })
    }

    /// Enters editing with a draft copied from the record.
    pub fn begin_edit(&mut self) {
        if self.state != DetailState::Viewing {
            return;
        }
        self.draft = self.record.to_draft();
        self.report = ValidationReport::default();
        self.conflicts.clear();
        self.state = DetailState::Editing;
    }

    /// Applies new text to a draft field while editing.
    pub fn set_field(&mut self, field: Field, value: &str) {
        if self.state != DetailState::Editing {
            return;
        }
        self.draft.set(field, value);
        self.conflicts.remove(&field);
    }

    /// Discards the draft and returns to viewing; the record is untouched.
    pub fn cancel_edit(&mut self) {
        if self.state != DetailState::Editing {
            return;
        }
        self.draft = PatientDraft::default();
        self.report = ValidationReport::default();
        self.conflicts.clear();
        self.state = DetailState::Viewing;
    }

    /// Commits the draft; returns `Ok(true)` when the record was updated.
    ///
    /// A validation failure or a uniqueness violation keeps the screen in
    /// editing with the messages inline and returns `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] for failures other than a uniqueness violation.
    pub fn save(
        &mut self,
        store: &PatientStore,
        today: Date,
        now: Timestamp,
    ) -> Result<bool, StoreError> {
        if self.state != DetailState::Editing {
            return Ok(false);
        }
        self.report = validate_patient(&self.draft, today);
        if !self.report.is_valid() || !self.conflicts.is_empty() {
            return Ok(false);
        }
        match store.update_patient(self.id, &self.draft, now) {
            Ok(()) => {
                self.record =
                    store.get_patient(self.id)?.ok_or(StoreError::NotFound(self.id.get()))?;
                self.draft = PatientDraft::default();
                self.state = DetailState::Viewing;
                Ok(true)
            }
            Err(StoreError::Duplicate { field, message }) => {
                self.conflicts.insert(field, message);
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// First delete step: asks for confirmation.
    pub fn request_delete(&mut self) {
        if self.state == DetailState::Viewing {
            self.state = DetailState::ConfirmingDelete;
        }
    }

    /// Backs out of a pending delete.
    pub fn cancel_delete(&mut self) {
        if self.state == DetailState::ConfirmingDelete {
            self.state = DetailState::Viewing;
        }
    }

    /// Second delete step: removes the record and closes the screen.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the record is already gone, or
    /// [`StoreError::Db`] when the delete fails; the screen stays open.
    pub fn confirm_delete(&mut self, store: &PatientStore) -> Result<(), StoreError> {
        if self.state != DetailState::ConfirmingDelete {
            return Ok(());
        }
        store.delete_patient(self.id)?;
        self.closed = true;
        Ok(())
    }

    /// Returns the patient identifier.
    #[must_use]
    pub const fn id(&self) -> PatientId {
        self.id
    }

    /// Returns the last record read back from the store.
    #[must_use]
    pub const fn record(&self) -> &PatientRecord {
        &self.record
    }

    /// Returns the draft under edit.
    #[must_use]
    pub const fn draft(&self) -> &PatientDraft {
        &self.draft
    }

    /// Returns the latest validation report.
    #[must_use]
    pub const fn report(&self) -> &ValidationReport {
        &self.report
    }

    /// Returns the unresolved uniqueness conflicts.
    #[must_use]
    pub const fn conflicts(&self) -> &BTreeMap<Field, String> {
        &self.conflicts
    }

    /// Returns the current screen state.
    #[must_use]
    pub const fn state(&self) -> DetailState {
        self.state
    }

    /// Returns `true` after a confirmed delete.
    #[must_use]
    pub const fn closed(&self) -> bool {
        self.closed
    }
}
