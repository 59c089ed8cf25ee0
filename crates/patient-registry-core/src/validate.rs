// crates/patient-registry-core/src/validate.rs
// ============================================================================
// Module: Patient Validation
// Description: Pure per-field validation of patient drafts.
// Purpose: Reject malformed input before any query is issued.
// Dependencies: crate::record, time
// ============================================================================

//! ## Overview
//! [`validate_patient`] maps a candidate draft to a structured set of
//! per-field error messages. It is pure: the reference date (`today`) is an
//! explicit argument, the function never reads the clock, never touches the
//! store, and never panics. Absent optional fields produce no error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use time::Date;
use time::format_description::BorrowedFormatItem;
use time::macros::date;
use time::macros::format_description;

use crate::record::Field;
use crate::record::GENDER_LABELS;
use crate::record::Gender;
use crate::record::PatientDraft;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum character length of a name field.
const MAX_NAME_CHARS: usize = 50;
/// Maximum character length of an email address.
const MAX_EMAIL_CHARS: usize = 100;
/// Maximum character length of a postal address.
const MAX_ADDRESS_CHARS: usize = 500;
/// Maximum character length of the medical history notes.
const MAX_HISTORY_CHARS: usize = 1000;
/// Minimum significant characters of a contact number (after an optional `+`).
const MIN_CONTACT_CHARS: usize = 8;
/// Maximum significant characters of a contact number (after an optional `+`).
const MAX_CONTACT_CHARS: usize = 15;
/// Maximum age implied by a date of birth.
const MAX_AGE_YEARS: i32 = 150;
/// Earliest accepted date of birth.
const MIN_DATE_OF_BIRTH: Date = date!(1900 - 01 - 01);

/// Parse format for ISO `YYYY-MM-DD` date-of-birth values.
pub const DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

// ============================================================================
// SECTION: Report
// ============================================================================

/// Structured validation outcome keyed by field.
///
/// # Invariants
/// - `errors` is empty exactly when the draft is valid.
/// - Messages are human readable and stable for display next to the field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Per-field error messages.
    errors: BTreeMap<Field, String>,
}

impl ValidationReport {
    /// Returns `true` when no field failed validation.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the error message for a field, if any.
    #[must_use]
    pub fn error(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    /// Returns all per-field error messages in field order.
    #[must_use]
    pub const fn errors(&self) -> &BTreeMap<Field, String> {
        &self.errors
    }

    /// Records an error for a field (the first message per field wins).
    fn push(&mut self, field: Field, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Validates a patient draft against the registry rules.
///
/// `today` is the reference date for the future/age checks; callers pass the
/// current civil date (or a fixed one under test).
#[must_use]
pub fn validate_patient(draft: &PatientDraft, today: Date) -> ValidationReport {
    let mut report = ValidationReport::default();

    validate_name(&mut report, Field::FirstName, &draft.first_name, "First name");
    validate_name(&mut report, Field::LastName, &draft.last_name, "Last name");
    validate_date_of_birth(&mut report, &draft.date_of_birth, today);
    validate_gender(&mut report, &draft.gender);

    if let Some(email) = blank_to_none(&draft.email) {
        if email.chars().count() > MAX_EMAIL_CHARS {
            report.push(Field::Email, format!("Email must be {MAX_EMAIL_CHARS} characters or fewer"));
        } else if !email_shape_ok(email) {
            report.push(Field::Email, "Invalid email format");
        }
    }

    if let Some(contact) = blank_to_none(&draft.contact_number)
        && !contact_shape_ok(contact)
    {
        report.push(Field::ContactNumber, "Invalid contact number format");
    }

    if let Some(address) = blank_to_none(&draft.address)
        && address.chars().count() > MAX_ADDRESS_CHARS
    {
        report.push(
            Field::Address,
            format!("Address must be {MAX_ADDRESS_CHARS} characters or fewer"),
        );
    }

    if let Some(history) = blank_to_none(&draft.medical_history)
        && history.chars().count() > MAX_HISTORY_CHARS
    {
        report.push(
            Field::MedicalHistory,
            format!("Medical history must be {MAX_HISTORY_CHARS} characters or fewer"),
        );
    }

    report
}

/// Validates a required name field (presence, length, character set).
fn validate_name(report: &mut ValidationReport, field: Field, value: &str, label: &str) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        report.push(field, format!("{label} is required"));
        return;
    }
    if trimmed.chars().count() > MAX_NAME_CHARS {
        report.push(field, format!("{label} must be {MAX_NAME_CHARS} characters or fewer"));
        return;
    }
    if !trimmed.chars().all(name_char_ok) {
        report.push(field, format!("{label} contains unsupported characters"));
    }
}

/// Validates the date of birth (presence, format, bounds, implied age).
fn validate_date_of_birth(report: &mut ValidationReport, value: &str, today: Date) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        report.push(Field::DateOfBirth, "Date of birth is required");
        return;
    }
    let Ok(dob) = Date::parse(trimmed, DATE_FORMAT) else {
        report.push(Field::DateOfBirth, "Invalid date format");
        return;
    };
    if dob > today {
        report.push(Field::DateOfBirth, "Date of birth cannot be in the future");
    } else if dob < MIN_DATE_OF_BIRTH {
        report.push(Field::DateOfBirth, "Date of birth is too far in the past");
    } else if age_in_years(dob, today) > MAX_AGE_YEARS {
        report.push(
            Field::DateOfBirth,
            format!("Date of birth implies an age over {MAX_AGE_YEARS} years"),
        );
    }
}

/// Validates the gender label (presence, enumeration membership).
fn validate_gender(report: &mut ValidationReport, value: &str) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        report.push(Field::Gender, "Gender is required");
        return;
    }
    if Gender::parse(trimmed).is_none() {
        report.push(Field::Gender, format!("Gender must be one of: {}", GENDER_LABELS.join(", ")));
    }
}

/// Returns `Some(trimmed)` for non-blank input, `None` otherwise.
fn blank_to_none(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

/// Returns `true` for characters allowed in name fields.
fn name_char_ok(c: char) -> bool {
    c.is_alphabetic() || matches!(c, ' ' | '-' | '\'' | '.')
}

/// Checks the `local@domain.tld` email shape (no whitespace, single `@`).
fn email_shape_ok(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || local.chars().any(char::is_whitespace) {
        return false;
    }
    if domain.contains('@') || domain.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && !tld.is_empty()
}

/// Checks the contact number shape: optional `+`, then 8-15 digits/spaces/hyphens.
fn contact_shape_ok(value: &str) -> bool {
    let significant = value.strip_prefix('+').unwrap_or(value);
    let count = significant.chars().count();
    (MIN_CONTACT_CHARS..=MAX_CONTACT_CHARS).contains(&count)
        && significant.chars().all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-'))
}

/// Computes whole years between a date of birth and the reference date.
fn age_in_years(dob: Date, today: Date) -> i32 {
    let mut age = today.year() - dob.year();
    if (u8::from(today.month()), today.day()) < (u8::from(dob.month()), dob.day()) {
        age -= 1;
    }
    age
}
