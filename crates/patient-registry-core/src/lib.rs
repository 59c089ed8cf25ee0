// crates/patient-registry-core/src/lib.rs
// ============================================================================
// Module: Patient Registry Core
// Description: Record model and validation rules for patient registration.
// Purpose: Provide the shared vocabulary used by the store, controllers, and CLI.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Core types for the patient registry: the patient record and draft models,
//! field identifiers, the gender enumeration, caller-supplied timestamps, and
//! the pure validation utility. The core never reads wall-clock time; hosts
//! supply `today` and insertion timestamps explicitly so validation and
//! ordering stay deterministic under test.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod record;
pub mod validate;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use record::Field;
pub use record::GENDER_LABELS;
pub use record::Gender;
pub use record::PatientDraft;
pub use record::PatientId;
pub use record::PatientRecord;
pub use record::SortDirection;
pub use record::SortKey;
pub use record::SortSpec;
pub use record::Timestamp;
pub use validate::DATE_FORMAT;
pub use validate::ValidationReport;
pub use validate::validate_patient;
