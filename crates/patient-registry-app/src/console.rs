// crates/patient-registry-app/src/console.rs
// ============================================================================
// Module: SQL Console Helpers
// Description: Parameter parsing, bounded history, and CSV export.
// Purpose: Back the ad-hoc console: turn parameter text into typed bindings,
//          persist a small statement history, and render result sets as CSV.
// Dependencies: patient-registry-store, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Console parameter text is parsed in two passes: a JSON array is taken as
//! typed values directly; anything else is split on commas and each piece is
//! coerced (integer, then float, then boolean, then null) with the verbatim
//! trimmed text as the fallback. History keeps the most recent distinct
//! statement/parameter pairs, newest first, bounded by the configured limit,
//! persisted as a JSON array so both inputs can be repopulated. CSV export
//! quotes text cells (doubling embedded quotes) and leaves numbers bare.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use patient_registry_store::ParamValue;
use patient_registry_store::QueryOutcome;
use patient_registry_store::SqlValue;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Console history persistence errors.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// History file I/O error.
    #[error("console history io error: {0}")]
    Io(String),
    /// History file serialization error.
    #[error("console history serialize error: {0}")]
    Serialize(String),
}

// ============================================================================
// SECTION: Parameter Parsing
// ============================================================================

/// Parses console parameter text into typed bindings.
///
/// A JSON array takes precedence; nested arrays or objects inside it bind as
/// their JSON text. Otherwise the input is comma-split and each piece is
/// coerced in order: integer, float, `true`/`false`, `null`, verbatim text.
#[must_use]
pub fn parse_params(input: &str) -> Vec<ParamValue> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if let Ok(serde_json::Value::Array(values)) =
        serde_json::from_str::<serde_json::Value>(trimmed)
    {
        return values.iter().map(param_from_json).collect();
    }
    trimmed.split(',').map(|piece| coerce_piece(piece.trim())).collect()
}

/// Maps one JSON array element onto a binding.
fn param_from_json(value: &serde_json::Value) -> ParamValue {
    match value {
        serde_json::Value::Null => ParamValue::Null,
        serde_json::Value::Bool(flag) => ParamValue::Bool(*flag),
        serde_json::Value::Number(number) => number
            .as_i64()
            .map_or_else(|| ParamValue::Real(number.as_f64().unwrap_or(0.0)), ParamValue::Integer),
        serde_json::Value::String(text) => ParamValue::Text(text.clone()),
        nested => ParamValue::Text(nested.to_string()),
    }
}

/// Coerces one comma-split piece.
fn coerce_piece(piece: &str) -> ParamValue {
    if let Ok(integer) = piece.parse::<i64>() {
        return ParamValue::Integer(integer);
    }
    if let Ok(real) = piece.parse::<f64>() {
        return ParamValue::Real(real);
    }
    match piece {
        "true" => ParamValue::Bool(true),
        "false" => ParamValue::Bool(false),
        "null" => ParamValue::Null,
        other => ParamValue::Text(other.to_string()),
    }
}

// ============================================================================
// SECTION: History
// ============================================================================

/// One persisted console submission: statement text plus its raw parameter
/// text, so both inputs can be repopulated on recall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Statement text as submitted.
    pub sql: String,
    /// Raw parameter text as submitted; empty when none were given.
    #[serde(default)]
    pub params: String,
}

/// Bounded, persisted console history (newest first).
///
/// # Invariants
/// - Entries are distinct statement/parameter pairs; re-running a pair moves
///   it to the front.
/// - The list never exceeds `limit` entries.
#[derive(Debug)]
pub struct ConsoleHistory {
    /// Submissions, newest first.
    entries: Vec<HistoryEntry>,
    /// Maximum number of entries kept.
    limit: usize,
    /// Backing file.
    path: PathBuf,
}

impl ConsoleHistory {
    /// Loads history from disk; a missing or unreadable file yields an empty
    /// history rather than blocking the console.
    #[must_use]
    pub fn load(path: &Path, limit: usize) -> Self {
        let mut entries: Vec<HistoryEntry> = fs::read_to_string(path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default();
        entries.truncate(limit);
        Self {
            entries,
            limit,
            path: path.to_path_buf(),
        }
    }

    /// Records a submission at the front, deduplicating on the
    /// statement/parameter pair and trimming to limit.
    pub fn record(&mut self, statement: &str, params: &str) {
        let sql = statement.trim();
        if sql.is_empty() {
            return;
        }
        let entry = HistoryEntry {
            sql: sql.to_string(),
            params: params.trim().to_string(),
        };
        self.entries.retain(|existing| existing != &entry);
        self.entries.insert(0, entry);
        self.entries.truncate(self.limit);
    }

    /// Persists the history to its backing file.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError`] when serialization or the write fails.
    pub fn save(&self) -> Result<(), ConsoleError> {
        let text = serde_json::to_string_pretty(&self.entries)
            .map_err(|err| ConsoleError::Serialize(err.to_string()))?;
        fs::write(&self.path, text).map_err(|err| ConsoleError::Io(err.to_string()))
    }

    /// Returns the submissions, newest first.
    #[must_use]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }
}

// ============================================================================
// SECTION: CSV Export
// ============================================================================

/// Renders a projection result as CSV (quoted headers, `\n` line endings).
#[must_use]
pub fn export_csv(outcome: &QueryOutcome) -> String {
    let mut lines = Vec::with_capacity(outcome.rows.len().saturating_add(1));
    let header: Vec<String> = outcome.columns.iter().map(|name| quote_csv(name)).collect();
    lines.push(header.join(","));
    for row in &outcome.rows {
        let cells: Vec<String> = row.iter().map(csv_cell).collect();
        lines.push(cells.join(","));
    }
    lines.join("\n")
}

/// Renders one cell: numbers bare, text quoted, NULL empty.
fn csv_cell(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => String::new(),
        SqlValue::Integer(integer) => integer.to_string(),
        SqlValue::Real(real) => real.to_string(),
        SqlValue::Text(text) => quote_csv(text),
        SqlValue::Blob(_) => quote_csv(&value.render()),
    }
}

/// Quotes a CSV field, doubling embedded quotes.
fn quote_csv(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}
