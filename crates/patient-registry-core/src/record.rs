// crates/patient-registry-core/src/record.rs
// ============================================================================
// Module: Patient Record Model
// Description: Identifiers, field names, timestamps, and record/draft shapes.
// Purpose: Give every layer one stable vocabulary for patient data.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The patient record is the single entity in the registry. A stored
//! [`PatientRecord`] is immutable in `id` and `created_at`; a [`PatientDraft`]
//! carries raw user input (empty strings mean "absent") and is what the
//! validator and the registration/edit flows operate on.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::num::NonZeroI64;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifiers
// ============================================================================

/// Patient row identifier assigned by the store.
///
/// # Invariants
/// - Always >= 1 (SQLite rowids are positive; zero is never issued).
/// - Immutable for the lifetime of the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(NonZeroI64);

impl PatientId {
    /// Creates a patient identifier from a non-zero value.
    #[must_use]
    pub const fn new(id: NonZeroI64) -> Self {
        Self(id)
    }

    /// Creates a patient identifier from a raw value (returns `None` if not positive).
    #[must_use]
    pub fn from_raw(raw: i64) -> Option<Self> {
        if raw < 1 {
            return None;
        }
        NonZeroI64::new(raw).map(Self)
    }

    /// Returns the raw identifier value (always >= 1).
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0.get()
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.get().fmt(f)
    }
}

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Caller-supplied timestamp in unix epoch milliseconds.
///
/// # Invariants
/// - Values are explicitly provided by hosts; the core never reads wall-clock time.
/// - No validation is performed; monotonicity is a caller responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Gender
// ============================================================================

/// Enumerated gender values accepted by the registry.
///
/// # Invariants
/// - Labels are stable; they are stored verbatim in the `gender` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    /// Male.
    Male,
    /// Female.
    Female,
    /// Other.
    Other,
    /// Prefer not to say.
    PreferNotToSay,
}

/// Ordered list of accepted gender labels, used for form rendering and help text.
pub const GENDER_LABELS: &[&str] = &["Male", "Female", "Other", "Prefer not to say"];

impl Gender {
    /// Returns the stored label for this gender value.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Other => "Other",
            Self::PreferNotToSay => "Prefer not to say",
        }
    }

    /// Attempts to parse a stored or user-supplied gender label (exact match).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Male" => Some(Self::Male),
            "Female" => Some(Self::Female),
            "Other" => Some(Self::Other),
            "Prefer not to say" => Some(Self::PreferNotToSay),
            _ => None,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// SECTION: Field Names
// ============================================================================

/// Editable patient fields, used to key per-field validation errors.
///
/// # Invariants
/// - `as_str` values match the column names in the `patients` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Patient first name.
    FirstName,
    /// Patient last name.
    LastName,
    /// Date of birth.
    DateOfBirth,
    /// Gender label.
    Gender,
    /// Contact number.
    ContactNumber,
    /// Email address.
    Email,
    /// Postal address.
    Address,
    /// Free-text medical history.
    MedicalHistory,
}

impl Field {
    /// Returns the column name for this field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::DateOfBirth => "date_of_birth",
            Self::Gender => "gender",
            Self::ContactNumber => "contact_number",
            Self::Email => "email",
            Self::Address => "address",
            Self::MedicalHistory => "medical_history",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// A stored patient record as read back from the store.
///
/// # Invariants
/// - `id` and `created_at` never change after insertion.
/// - `date_of_birth` is an ISO `YYYY-MM-DD` string validated before insert.
/// - Optional fields are `None` rather than empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    /// Row identifier.
    pub id: PatientId,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Date of birth (ISO `YYYY-MM-DD`).
    pub date_of_birth: String,
    /// Gender label.
    pub gender: Gender,
    /// Optional contact number.
    pub contact_number: Option<String>,
    /// Optional email address.
    pub email: Option<String>,
    /// Optional postal address.
    pub address: Option<String>,
    /// Optional medical history notes.
    pub medical_history: Option<String>,
    /// Insertion timestamp.
    pub created_at: Timestamp,
    /// Last mutation timestamp (equals `created_at` until the first update).
    pub updated_at: Timestamp,
}

impl PatientRecord {
    /// Returns a draft carrying this record's editable fields.
    #[must_use]
    pub fn to_draft(&self) -> PatientDraft {
        PatientDraft {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            date_of_birth: self.date_of_birth.clone(),
            gender: self.gender.label().to_string(),
            contact_number: self.contact_number.clone().unwrap_or_default(),
            email: self.email.clone().unwrap_or_default(),
            address: self.address.clone().unwrap_or_default(),
            medical_history: self.medical_history.clone().unwrap_or_default(),
        }
    }
}

/// Raw form input for a patient record.
///
/// # Invariants
/// - Fields hold the text exactly as entered; empty means "absent".
/// - A draft carries no identifier; the store assigns one at insert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientDraft {
    /// First name input.
    pub first_name: String,
    /// Last name input.
    pub last_name: String,
    /// Date of birth input (ISO `YYYY-MM-DD`).
    pub date_of_birth: String,
    /// Gender label input.
    pub gender: String,
    /// Contact number input.
    pub contact_number: String,
    /// Email address input.
    pub email: String,
    /// Postal address input.
    pub address: String,
    /// Medical history input.
    pub medical_history: String,
}

impl PatientDraft {
    /// Returns the value for a field.
    #[must_use]
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::FirstName => &self.first_name,
            Field::LastName => &self.last_name,
            Field::DateOfBirth => &self.date_of_birth,
            Field::Gender => &self.gender,
            Field::ContactNumber => &self.contact_number,
            Field::Email => &self.email,
            Field::Address => &self.address,
            Field::MedicalHistory => &self.medical_history,
        }
    }

    /// Sets the value for a field.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::FirstName => self.first_name = value,
            Field::LastName => self.last_name = value,
            Field::DateOfBirth => self.date_of_birth = value,
            Field::Gender => self.gender = value,
            Field::ContactNumber => self.contact_number = value,
            Field::Email => self.email = value,
            Field::Address => self.address = value,
            Field::MedicalHistory => self.medical_history = value,
        }
    }

    /// Returns an optional field as `Some(trimmed)` or `None` when blank.
    #[must_use]
    pub fn optional(&self, field: Field) -> Option<&str> {
        let value = self.get(field).trim();
        if value.is_empty() { None } else { Some(value) }
    }
}

// ============================================================================
// SECTION: Sorting
// ============================================================================

/// Sortable patient list columns.
///
/// # Invariants
/// - `column` values name real `patients` columns; they are interpolated into
///   ORDER BY clauses and must never carry user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Sort by last name.
    LastName,
    /// Sort by date of birth.
    DateOfBirth,
    /// Sort by gender label.
    Gender,
    /// Sort by insertion time.
    CreatedAt,
}

impl SortKey {
    /// Returns the column name for this sort key.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::LastName => "last_name",
            Self::DateOfBirth => "date_of_birth",
            Self::Gender => "gender",
            Self::CreatedAt => "created_at",
        }
    }
}

/// Sort direction for the patient list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Ascending order.
    Ascending,
    /// Descending order.
    Descending,
}

impl SortDirection {
    /// Returns the SQL keyword for this direction.
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }

    /// Returns the opposite direction.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// A sort key/direction pair.
///
/// # Invariants
/// - The default is most-recent-first (`created_at` descending).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// Column to sort by.
    pub key: SortKey,
    /// Sort direction.
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            key: SortKey::CreatedAt,
            direction: SortDirection::Descending,
        }
    }
}

impl SortSpec {
    /// Applies a column click: the same key flips direction, a new key starts ascending.
    #[must_use]
    pub fn clicked(self, key: SortKey) -> Self {
        if self.key == key {
            Self {
                key,
                direction: self.direction.toggled(),
            }
        } else {
            Self {
                key,
                direction: SortDirection::Ascending,
            }
        }
    }
}
