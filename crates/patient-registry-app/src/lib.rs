// crates/patient-registry-app/src/lib.rs
// ============================================================================
// Module: Registry Application Controllers
// Description: Host-facing controllers over the patient store.
// Purpose: Provide the live binding, registration form, list, detail, and
//          console state machines that hosts render.
// Dependencies: patient-registry-config, patient-registry-core,
//               patient-registry-store, serde, serde_json, thiserror, time
// ============================================================================

//! ## Overview
//! Each controller owns one screen's worth of state and talks to the store
//! through explicit methods; hosts poll for fresh state instead of receiving
//! callbacks. [`LiveBinding`] keeps one query's rows current. The
//! [`RegistrationForm`] runs validation plus debounced uniqueness pre-checks.
//! [`PatientList`] and [`PatientDetail`] cover browsing and the edit/delete
//! flows. The console module parses parameter text, persists a bounded
//! statement history, and renders CSV exports.

/// Live query binding kept current by store pushes.
pub mod binding;
/// Ad-hoc SQL console helpers: parameter parsing, history, CSV export.
pub mod console;
/// Detail screen state machine (view, edit, two-step delete).
pub mod detail;
/// Registration form with debounced uniqueness pre-checks.
pub mod form;
/// Sortable, filterable patient list.
pub mod list;

pub use binding::LiveBinding;
pub use console::ConsoleError;
pub use console::ConsoleHistory;
pub use console::HistoryEntry;
pub use console::export_csv;
pub use console::parse_params;
pub use detail::DetailState;
pub use detail::PatientDetail;
pub use form::ProbeOutcome;
pub use form::RegistrationForm;
pub use list::PatientList;
pub use list::ViewMode;
