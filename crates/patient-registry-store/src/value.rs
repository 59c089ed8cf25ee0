// crates/patient-registry-store/src/value.rs
// ============================================================================
// Module: SQL Value Model
// Description: Bind-side parameters and result-side cell values.
// Purpose: Move typed values across the store boundary without rusqlite types.
// Dependencies: rusqlite, serde
// ============================================================================

//! ## Overview
//! [`ParamValue`] is what callers bind into positional placeholders;
//! [`SqlValue`] is what result cells come back as. Keeping both independent of
//! `rusqlite` types lets controllers and the CLI render and test result sets
//! without a database in scope.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use rusqlite::ToSql;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::Value;
use rusqlite::types::ValueRef;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Parameters
// ============================================================================

/// A positional query parameter supplied by a caller.
///
/// # Invariants
/// - Booleans bind as SQLite integers 0/1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ParamValue {
    /// SQL NULL.
    Null,
    /// 64-bit integer.
    Integer(i64),
    /// 64-bit float.
    Real(f64),
    /// UTF-8 text.
    Text(String),
    /// Boolean (stored as 0/1).
    Bool(bool),
}

impl ToSql for ParamValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self {
            Self::Null => Value::Null,
            Self::Integer(value) => Value::Integer(*value),
            Self::Real(value) => Value::Real(*value),
            Self::Text(value) => Value::Text(value.clone()),
            Self::Bool(value) => Value::Integer(i64::from(*value)),
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Integer(value) => value.fmt(f),
            Self::Real(value) => value.fmt(f),
            Self::Text(value) => f.write_str(value),
            Self::Bool(value) => value.fmt(f),
        }
    }
}

// ============================================================================
// SECTION: Result Cells
// ============================================================================

/// A single result cell read back from the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SqlValue {
    /// SQL NULL.
    Null,
    /// 64-bit integer.
    Integer(i64),
    /// 64-bit float.
    Real(f64),
    /// UTF-8 text.
    Text(String),
    /// Raw blob bytes.
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Converts a borrowed rusqlite cell into an owned [`SqlValue`].
    #[must_use]
    pub fn from_value_ref(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Self::Null,
            ValueRef::Integer(value) => Self::Integer(value),
            ValueRef::Real(value) => Self::Real(value),
            ValueRef::Text(bytes) => Self::Text(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(bytes) => Self::Blob(bytes.to_vec()),
        }
    }

    /// Renders the cell for table display (NULL renders as an em dash).
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Null => "\u{2014}".to_string(),
            Self::Integer(value) => value.to_string(),
            Self::Real(value) => value.to_string(),
            Self::Text(value) => value.clone(),
            Self::Blob(bytes) => format!("<blob {} bytes>", bytes.len()),
        }
    }

    /// Returns the cell as text when it holds text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the cell as an integer when it holds one.
    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Result of executing one statement.
///
/// # Invariants
/// - Projection statements populate `columns`/`rows`; `rows_affected` is zero.
/// - Statements without a projection report `rows_affected` only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOutcome {
    /// Result column names in projection order.
    pub columns: Vec<String>,
    /// Result rows, each cell aligned with `columns`.
    pub rows: Vec<Vec<SqlValue>>,
    /// Rows affected by a non-projection statement.
    pub rows_affected: usize,
}

impl QueryOutcome {
    /// Returns `true` when the statement produced a result set.
    #[must_use]
    pub fn is_projection(&self) -> bool {
        !self.columns.is_empty()
    }
}
