// crates/patient-registry-cli/src/i18n.rs
// ============================================================================
// Module: CLI Internationalization Helpers
// Description: Provides message catalog and translation utilities for the CLI.
// Purpose: Centralize user-facing strings for future localization support.
// Dependencies: Standard library collections and formatting utilities.
// ============================================================================

//! ## Overview
//! The patient registry CLI stores user-facing strings in a small translation
//! catalog to enforce consistent messaging and to prepare for future locales.
//! All runtime output should be routed through the [`t!`](crate::t) macro.
//!
//! ## Invariants
//! - The catalog is initialized once and read-only thereafter.
//! - Missing keys fall back to English and then to the key itself.
//! - Placeholder substitutions preserve deterministic order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Supported CLI locales.
///
/// # Invariants
/// - Variants are stable for CLI parsing and catalog lookup.
/// - [`Locale::En`] is the default fallback locale.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Locale {
    /// English (default).
    En,
    /// Catalan.
    Ca,
}

impl Locale {
    /// Returns the canonical locale label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ca => "ca",
        }
    }

    /// Attempts to parse a locale value (case-insensitive, tolerant of region tags).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        let normalized = value.to_ascii_lowercase();
        let lang = normalized.split(['-', '_']).next().unwrap_or("");
        match lang {
            "en" => Some(Self::En),
            "ca" => Some(Self::Ca),
            _ => None,
        }
    }
}

/// Ordered list of supported CLI locales.
///
/// # Invariants
/// - Ordering is stable for deterministic presentation.
pub const SUPPORTED_LOCALES: &[Locale] = &[Locale::En, Locale::Ca];

/// A formatted message argument captured by the [`macro@crate::t`] macro.
///
/// # Invariants
/// - `key` matches a placeholder name without braces (for example, `path`).
/// - `value` is preformatted and should be safe for display.
#[derive(Clone)]
pub struct MessageArg {
    /// The placeholder name used in message templates (e.g., `"path"`).
    pub key: &'static str,
    /// The formatted string value to substitute for this placeholder.
    pub value: String,
}

impl MessageArg {
    /// Constructs a new [`MessageArg`] from a key and displayable value.
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

// ============================================================================
// SECTION: Locale Selection
// ============================================================================

/// Global locale selection for CLI output.
static CURRENT_LOCALE: OnceLock<Locale> = OnceLock::new();

/// Sets the CLI locale. Only the first call wins.
pub fn set_locale(locale: Locale) {
    let _ = CURRENT_LOCALE.set(locale);
}

/// Returns the current CLI locale (defaults to English).
#[must_use]
pub fn current_locale() -> Locale {
    CURRENT_LOCALE.get().copied().unwrap_or(Locale::En)
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Static English catalog entries loaded into the localized message bundle.
const CATALOG_EN: &[(&str, &str)] = &[
    ("main.version", "patient-registry {version}"),
    ("i18n.lang.invalid_env", "Invalid value for {env}: {value}. Expected 'en' or 'ca'."),
    (
        "i18n.disclaimer.machine_translated",
        "Note: non-English output is machine translated and may be inaccurate.",
    ),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "output"),
    ("output.write_failed", "Failed to write to {stream}: {error}"),
    ("config.load_failed", "Failed to load configuration: {error}"),
    ("config.valid.file", "Configuration OK: {path}"),
    ("config.valid.defaults", "Configuration OK (built-in defaults)."),
    ("store.open_failed", "Failed to open the patient database: {error}"),
    ("store.query_failed", "Query failed: {error}"),
    ("op.failed", "Operation failed: {error}"),
    ("register.ok", "Registered patient {id}."),
    ("register.blocked.header", "Registration blocked:"),
    ("edit.ok", "Updated patient {id}."),
    ("edit.blocked.header", "Update blocked:"),
    ("edit.nothing", "No fields to update were provided."),
    ("form.field_error", "- {field}: {message}"),
    ("show.not_found", "Patient not found: {id}"),
    ("detail.line", "- {label}: {value}"),
    ("detail.absent", "\u{2014}"),
    ("list.header", "Patients ({count}):"),
    ("list.none", "No patients found."),
    ("list.entry", "- [{id}] {last_name}, {first_name} (dob {date_of_birth}, {gender})"),
    (
        "delete.armed",
        "Delete of patient {id} is armed. Re-run with --confirm to remove the record.",
    ),
    ("delete.ok", "Deleted patient {id}."),
    ("console.rows_affected", "{count} row(s) affected."),
    ("console.no_rows", "No rows."),
    ("console.csv_written", "CSV written to {path}"),
    ("console.csv_write_failed", "Failed to write CSV to {path}: {error}"),
    ("console.exec_failed", "Statement failed: {error}"),
    ("console.history.header", "Recent statements:"),
    ("console.history.none", "No statement history."),
    ("console.history.entry", "{index}. {statement}"),
    ("console.history.entry_params", "{index}. {statement} [params: {params}]"),
    ("console.history_save_failed", "Failed to persist statement history: {error}"),
    ("watch.header", "Watching: {sql}"),
    ("watch.update", "Update {index}: {rows} row(s)"),
    ("watch.done", "Observed {count} update(s)."),
    ("watch.timeout", "No update within {ms} ms."),
    ("stats.header", "Registry statistics:"),
    ("stats.total", "- Total patients: {count}"),
    ("stats.male", "- Male: {count}"),
    ("stats.female", "- Female: {count}"),
    ("stats.other", "- Other: {count}"),
    ("stats.leader", "- Leader: {status}"),
    ("stats.leader.yes", "yes"),
    ("stats.leader.no", "no"),
    (
        "stats.ops",
        "- Ops: reads={reads} writes={writes} adhoc={adhoc} live_pushes={pushes}",
    ),
    ("label.id", "ID"),
    ("label.first_name", "First name"),
    ("label.last_name", "Last name"),
    ("label.date_of_birth", "Date of birth"),
    ("label.gender", "Gender"),
    ("label.contact_number", "Contact number"),
    ("label.email", "Email"),
    ("label.address", "Address"),
    ("label.medical_history", "Medical history"),
    ("label.created_at", "Created at"),
    ("label.updated_at", "Updated at"),
];

/// Static Catalan catalog entries loaded into the localized message bundle.
const CATALOG_CA: &[(&str, &str)] = &[
    ("main.version", "patient-registry {version}"),
    ("i18n.lang.invalid_env", "Valor no vàlid per a {env}: {value}. S'esperava 'en' o 'ca'."),
    (
        "i18n.disclaimer.machine_translated",
        "Nota: la sortida que no és en anglès està traduïda automàticament i pot ser inexacta.",
    ),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "sortida"),
    ("output.write_failed", "No s'ha pogut escriure a {stream}: {error}"),
    ("config.load_failed", "No s'ha pogut carregar la configuració: {error}"),
    ("config.valid.file", "Configuració correcta: {path}"),
    ("config.valid.defaults", "Configuració correcta (valors per defecte)."),
    ("store.open_failed", "No s'ha pogut obrir la base de dades de pacients: {error}"),
    ("store.query_failed", "La consulta ha fallat: {error}"),
    ("op.failed", "L'operació ha fallat: {error}"),
    ("register.ok", "Pacient {id} registrat."),
    ("register.blocked.header", "Registre bloquejat:"),
    ("edit.ok", "Pacient {id} actualitzat."),
    ("edit.blocked.header", "Actualització bloquejada:"),
    ("edit.nothing", "No s'ha proporcionat cap camp per actualitzar."),
    ("form.field_error", "- {field}: {message}"),
    ("show.not_found", "Pacient no trobat: {id}"),
    ("detail.line", "- {label}: {value}"),
    ("detail.absent", "\u{2014}"),
    ("list.header", "Pacients ({count}):"),
    ("list.none", "No s'han trobat pacients."),
    ("list.entry", "- [{id}] {last_name}, {first_name} (naixement {date_of_birth}, {gender})"),
    (
        "delete.armed",
        "L'eliminació del pacient {id} està armada. Torneu a executar amb --confirm per \
         eliminar el registre.",
    ),
    ("delete.ok", "Pacient {id} eliminat."),
    ("console.rows_affected", "{count} fila/es afectades."),
    ("console.no_rows", "Cap fila."),
    ("console.csv_written", "CSV escrit a {path}"),
    ("console.csv_write_failed", "No s'ha pogut escriure el CSV a {path}: {error}"),
    ("console.exec_failed", "La sentència ha fallat: {error}"),
    ("console.history.header", "Sentències recents:"),
    ("console.history.none", "Sense historial de sentències."),
    ("console.history.entry", "{index}. {statement}"),
    ("console.history.entry_params", "{index}. {statement} [paràmetres: {params}]"),
    ("console.history_save_failed", "No s'ha pogut desar l'historial de sentències: {error}"),
    ("watch.header", "Observant: {sql}"),
    ("watch.update", "Actualització {index}: {rows} fila/es"),
    ("watch.done", "S'han observat {count} actualitzacions."),
    ("watch.timeout", "Cap actualització en {ms} ms."),
    ("stats.header", "Estadístiques del registre:"),
    ("stats.total", "- Pacients totals: {count}"),
    ("stats.male", "- Homes: {count}"),
    ("stats.female", "- Dones: {count}"),
    ("stats.other", "- Altres: {count}"),
    ("stats.leader", "- Líder: {status}"),
    ("stats.leader.yes", "sí"),
    ("stats.leader.no", "no"),
    (
        "stats.ops",
        "- Operacions: lectures={reads} escriptures={writes} adhoc={adhoc} \
         enviaments_en_viu={pushes}",
    ),
    ("label.id", "ID"),
    ("label.first_name", "Nom"),
    ("label.last_name", "Cognoms"),
    ("label.date_of_birth", "Data de naixement"),
    ("label.gender", "Gènere"),
    ("label.contact_number", "Telèfon de contacte"),
    ("label.email", "Correu electrònic"),
    ("label.address", "Adreça"),
    ("label.medical_history", "Historial mèdic"),
    ("label.created_at", "Creat el"),
    ("label.updated_at", "Actualitzat el"),
];

/// Returns the raw catalog entries for the requested locale.
#[cfg(test)]
pub(crate) const fn catalog_entries_for(locale: Locale) -> &'static [(&'static str, &'static str)] {
    match locale {
        Locale::En => CATALOG_EN,
        Locale::Ca => CATALOG_CA,
    }
}

/// Returns the message catalog for the requested locale.
pub(crate) fn catalog_for(locale: Locale) -> &'static HashMap<&'static str, &'static str> {
    static CATALOG_EN_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    static CATALOG_CA_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    match locale {
        Locale::En => CATALOG_EN_MAP.get_or_init(|| CATALOG_EN.iter().copied().collect()),
        Locale::Ca => CATALOG_CA_MAP.get_or_init(|| CATALOG_CA.iter().copied().collect()),
    }
}

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Translates `key` using the selected locale while substituting `args`.
#[must_use]
pub fn translate(key: &str, args: Vec<MessageArg>) -> String {
    let locale = current_locale();
    let template = catalog_for(locale)
        .get(key)
        .copied()
        .or_else(|| catalog_for(Locale::En).get(key).copied())
        .unwrap_or(key);
    if args.is_empty() {
        return template.to_string();
    }

    let mut result = template.to_string();
    for arg in args {
        let placeholder = format!("{{{}}}", arg.key);
        result = result.replace(&placeholder, &arg.value);
    }
    result
}

// ============================================================================
// SECTION: Macro
// ============================================================================

/// Formats a localized message from a key and named arguments.
///
/// # Arguments
///
/// - `$key` must match a catalog entry.
/// - Named arguments are substituted into `{placeholder}` positions.
///
/// # Returns
///
/// A localized [`String`] with placeholders substituted.
#[macro_export]
macro_rules! t {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate($key, args)
    }};
}
