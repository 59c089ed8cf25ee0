// crates/patient-registry-app/src/form.rs
// ============================================================================
// Module: Registration Form
// Description: Registration form state with debounced uniqueness pre-checks.
// Purpose: Validate drafts, probe email/contact uniqueness off-thread, and
//          gate submission on clean state.
// Dependencies: patient-registry-config, patient-registry-core,
//               patient-registry-store
// ============================================================================

//! ## Overview
//! [`RegistrationForm`] owns the draft being typed, the latest validation
//! report, and the uniqueness pre-check state. Pre-checks run on a dedicated
//! worker thread: each email/contact edit restarts a quiet period, and only
//! after it elapses does the worker query the store. Results are matched
//! against the field's current text before they apply, so stale probes from
//! superseded input never mark a conflict. Pre-checks are advisory; the
//! unique indexes remain the authority, and a duplicate raced past the probe
//! is still caught at insert and folded back into the same conflict slot.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::mpsc;
use std::sync::mpsc::Receiver;
use std::sync::mpsc::RecvTimeoutError;
use std::sync::mpsc::Sender;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use patient_registry_config::FormSettings;
use patient_registry_core::Field;
use patient_registry_core::PatientDraft;
use patient_registry_core::PatientId;
use patient_registry_core::Timestamp;
use patient_registry_core::ValidationReport;
use patient_registry_core::validate_patient;
use patient_registry_store::PatientStore;
use patient_registry_store::StoreError;
use time::Date;

// ============================================================================
// SECTION: Probe Worker
// ============================================================================

/// Command sent to the probe worker.
enum ProbeCommand {
    /// New text for a uniqueness-checked field; restarts the quiet period.
    Input {
        /// Field the text belongs to.
        field: Field,
        /// Trimmed field text.
        value: String,
    },
    /// Stop the worker.
    Shutdown,
}

/// Result of one completed uniqueness probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Field that was probed.
    pub field: Field,
    /// Text the probe ran against.
    pub value: String,
    /// Whether another patient already holds this value.
    pub taken: bool,
}

/// Worker handle: commands in, debounced probe results out.
#[derive(Debug)]
struct DebouncedProbe {
    /// Command channel into the worker.
    commands: Sender<ProbeCommand>,
    /// Completed probe results.
    results: Receiver<ProbeOutcome>,
    /// Worker join handle, taken on drop.
    worker: Option<JoinHandle<()>>,
}

impl DebouncedProbe {
    /// Spawns the worker against a store clone.
    fn spawn(store: PatientStore, debounce: Duration) -> Self {
        let (commands, command_rx) = mpsc::channel();
        let (result_tx, results) = mpsc::channel();
        let worker = thread::spawn(move || probe_worker(&store, debounce, &command_rx, &result_tx));
        Self {
            commands,
            results,
            worker: Some(worker),
        }
    }

    /// Queues new field text; the quiet period restarts.
    fn submit(&self, field: Field, value: String) {
        // A send failure means the worker is gone; probes degrade to
        // insert-time enforcement.
        let _ = self.commands.send(ProbeCommand::Input { field, value });
    }

    /// Drains all completed probe results.
    fn drain(&self) -> Vec<ProbeOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(outcome) = self.results.try_recv() {
            outcomes.push(outcome);
        }
        outcomes
    }
}

impl Drop for DebouncedProbe {
    fn drop(&mut self) {
        let _ = self.commands.send(ProbeCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Worker loop: collect inputs until the quiet period elapses, then probe.
fn probe_worker(
    store: &PatientStore,
    debounce: Duration,
    commands: &Receiver<ProbeCommand>,
    results: &Sender<ProbeOutcome>,
) {
    let mut pending: BTreeMap<Field, String> = BTreeMap::new();
    loop {
        let command = if pending.is_empty() {
            match commands.recv() {
                Ok(command) => Some(command),
                Err(_) => return,
            }
        } else {
            match commands.recv_timeout(debounce) {
                Ok(command) => Some(command),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => return,
            }
        };
        match command {
            Some(ProbeCommand::Shutdown) => return,
            Some(ProbeCommand::Input { field, value }) => {
                pending.insert(field, value);
            }
            None => {
                for (field, value) in std::mem::take(&mut pending) {
                    let taken = match field {
                        Field::Email => store.email_exists(&value),
                        Field::ContactNumber => store.contact_exists(&value),
                        _ => Ok(false),
                    };
                    // Probe failures are dropped; the indexes still enforce.
                    if let Ok(taken) = taken
                        && results.send(ProbeOutcome { field, value, taken }).is_err()
                    {
                        return;
                    }
                }
            }
        }
    }
}

// ============================================================================
// SECTION: Form
// ============================================================================

/// Message shown when a probed email is already registered.
const EMAIL_TAKEN: &str = "A patient with this email already exists";
/// Message shown when a probed contact number is already registered.
const CONTACT_TAKEN: &str = "A patient with this contact number already exists";

/// Registration form state machine.
///
/// # Invariants
/// - Submission is blocked while any pre-check is in flight or any conflict
///   is unresolved.
/// - A successful submit resets the draft to empty.
#[derive(Debug)]
pub struct RegistrationForm {
    /// Draft under edit.
    draft: PatientDraft,
    /// Latest validation report.
    report: ValidationReport,
    /// Unresolved uniqueness conflicts keyed by field.
    conflicts: BTreeMap<Field, String>,
    /// Fields with a pre-check in flight.
    pending: BTreeSet<Field>,
    /// Probe worker, absent when pre-checks are disabled.
    probe: Option<DebouncedProbe>,
    /// Identifier assigned by the most recent successful submit.
    last_submitted: Option<PatientId>,
}

impl RegistrationForm {
    /// Creates an empty form; spawns the probe worker when pre-checks are on.
    #[must_use]
    pub fn new(store: &PatientStore, settings: &FormSettings) -> Self {
        let probe = settings.precheck_enabled.then(|| {
            DebouncedProbe::spawn(
                store.clone(),
                Duration::from_millis(settings.precheck_debounce_ms),
            )
        });
        Self {
            draft: PatientDraft::default(),
            report: ValidationReport::default(),
            conflicts: BTreeMap::new(),
            pending: BTreeSet::new(),
            probe,
            last_submitted: None,
        }
    }

    /// Applies new text to a field, queueing a pre-check where applicable.
    pub fn set_field(&mut self, field: Field, value: &str) {
        self.draft.set(field, value);
        self.conflicts.remove(&field);
        if !matches!(field, Field::Email | Field::ContactNumber) {
            return;
        }
        let Some(probe) = self.probe.as_ref() else {
            return;
        };
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.pending.remove(&field);
        } else {
            self.pending.insert(field);
            probe.submit(field, trimmed.to_string());
        }
    }

    /// Folds completed probe results into the conflict state.
    ///
    /// Results for text that has since changed are discarded; the probe for
    /// the newer text is still pending.
    pub fn poll_prechecks(&mut self) {
        let Some(probe) = self.probe.as_ref() else {
            return;
        };
        for outcome in probe.drain() {
            if outcome.value != self.draft.get(outcome.field).trim() {
                continue;
            }
            self.pending.remove(&outcome.field);
            if outcome.taken {
                self.conflicts.insert(outcome.field, conflict_message(outcome.field).to_string());
            }
        }
    }

    /// Runs both uniqueness checks synchronously, bypassing the debounce.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when either existence query fails.
    pub fn precheck_now(&mut self, store: &PatientStore) -> Result<(), StoreError> {
        self.pending.clear();
        let email = self.draft.get(Field::Email).trim().to_string();
        if !email.is_empty() && store.email_exists(&email)? {
            self.conflicts.insert(Field::Email, EMAIL_TAKEN.to_string());
        }
        let contact = self.draft.get(Field::ContactNumber).trim().to_string();
        if !contact.is_empty() && store.contact_exists(&contact)? {
            self.conflicts.insert(Field::ContactNumber, CONTACT_TAKEN.to_string());
        }
        Ok(())
    }

    /// Validates the draft and stores the report; returns the validity flag.
    pub fn validate(&mut self, today: Date) -> bool {
        self.report = validate_patient(&self.draft, today);
        self.report.is_valid()
    }

    /// Returns `true` when nothing blocks submission right now.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.report.is_valid() && self.conflicts.is_empty() && self.pending.is_empty()
    }

    /// Attempts to register the draft.
    ///
    /// Returns `Ok(None)` when validation, an unresolved conflict, or an
    /// in-flight pre-check blocks the attempt; a duplicate caught at insert
    /// lands in the conflict state the same way a probe result does.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] for failures other than a uniqueness violation.
    pub fn submit(
        &mut self,
        store: &PatientStore,
        today: Date,
        now: Timestamp,
    ) -> Result<Option<PatientId>, StoreError> {
        self.report = validate_patient(&self.draft, today);
        if !self.report.is_valid() || !self.conflicts.is_empty() || !self.pending.is_empty() {
            return Ok(None);
        }
        match store.insert_patient(&self.draft, now) {
            Ok(id) => {
                self.draft = PatientDraft::default();
                self.report = ValidationReport::default();
                self.conflicts.clear();
                self.last_submitted = Some(id);
                Ok(Some(id))
            }
            Err(StoreError::Duplicate { field, message }) => {
                self.conflicts.insert(field, message);
                Ok(None)
            }
            Err(err) => Err(err),
        }
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

    /// Returns the fields with a pre-check still in flight.
    #[must_use]
    pub const fn pending_checks(&self) -> &BTreeSet<Field> {
        &self.pending
    }

    /// Returns the identifier from the most recent successful submit.
    #[must_use]
    pub const fn last_submitted(&self) -> Option<PatientId> {
        self.last_submitted
    }
}

/// Returns the conflict message for a uniqueness-checked field.
const fn conflict_message(field: Field) -> &'static str {
    match field {
        Field::ContactNumber => CONTACT_TAKEN,
        _ => EMAIL_TAKEN,
    }
}
