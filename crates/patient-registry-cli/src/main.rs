// crates/patient-registry-cli/src/main.rs
// ============================================================================
// Module: Patient Registry CLI Entry Point
// Description: Command dispatcher for patient registration and console tasks.
// Purpose: Provide a safe, localized CLI over the embedded patient store.
// Dependencies: clap, patient-registry-app, patient-registry-config, patient-registry-store.
// ============================================================================

//! ## Overview
//! The patient registry CLI drives the registration form, patient list,
//! detail editing, and the ad-hoc SQL console against a local SQLite store.
//! All user-facing strings are routed through the i18n catalog to prepare
//! for future localization. Inputs are untrusted and must be validated.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use patient_registry_app::ConsoleHistory;
use patient_registry_app::PatientDetail;
use patient_registry_app::RegistrationForm;
use patient_registry_app::export_csv;
use patient_registry_app::parse_params;
use patient_registry_cli::i18n::Locale;
use patient_registry_cli::i18n::set_locale;
use patient_registry_cli::t;
use patient_registry_config::AppConfig;
use patient_registry_core::Field;
use patient_registry_core::PatientId;
use patient_registry_core::PatientRecord;
use patient_registry_core::SortDirection;
use patient_registry_core::SortKey;
use patient_registry_core::SortSpec;
use patient_registry_core::Timestamp;
use patient_registry_store::PatientStore;
use patient_registry_store::QueryOutcome;
use patient_registry_store::SqlValue;
use patient_registry_store::StoreError;
use thiserror::Error;
use time::Date;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Environment variable controlling the default output language.
const LANG_ENV: &str = "PATIENT_REGISTRY_LANG";

/// Default number of live updates observed by `watch`.
const DEFAULT_WATCH_COUNT: usize = 1;

/// Default wait per live update (milliseconds) for `watch`.
const DEFAULT_WATCH_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "patient-registry", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Preferred output language (overrides `PATIENT_REGISTRY_LANG`).
    #[arg(long, value_enum, value_name = "LANG", global = true)]
    lang: Option<LangArg>,
    /// Path to the TOML configuration file.
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Register a new patient.
    Register(RegisterCommand),
    /// List registered patients.
    List(ListCommand),
    /// Show a single patient record.
    Show {
        /// Patient row identifier.
        id: i64,
    },
    /// Edit an existing patient record.
    Edit(EditCommand),
    /// Delete a patient record (two-step with `--confirm`).
    Delete {
        /// Patient row identifier.
        id: i64,
        /// Confirm the armed delete.
        #[arg(long, action = ArgAction::SetTrue)]
        confirm: bool,
    },
    /// Ad-hoc SQL console utilities.
    Console {
        /// Selected console subcommand.
        #[command(subcommand)]
        command: ConsoleCommand,
    },
    /// Watch a query for live result updates.
    Watch(WatchCommand),
    /// Print registry statistics.
    Stats,
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Supported CLI language selections.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum LangArg {
    /// English.
    En,
    /// Catalan.
    Ca,
}

impl From<LangArg> for Locale {
    fn from(value: LangArg) -> Self {
        match value {
            LangArg::En => Self::En,
            LangArg::Ca => Self::Ca,
        }
    }
}

/// Sortable patient list columns.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum SortKeyArg {
    /// Sort by last name.
    LastName,
    /// Sort by date of birth.
    DateOfBirth,
    /// Sort by gender label.
    Gender,
    /// Sort by insertion time.
    CreatedAt,
}

impl From<SortKeyArg> for SortKey {
    fn from(value: SortKeyArg) -> Self {
        match value {
            SortKeyArg::LastName => Self::LastName,
            SortKeyArg::DateOfBirth => Self::DateOfBirth,
            SortKeyArg::Gender => Self::Gender,
            SortKeyArg::CreatedAt => Self::CreatedAt,
        }
    }
}

/// Patient list sort directions.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum DirectionArg {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

impl From<DirectionArg> for SortDirection {
    fn from(value: DirectionArg) -> Self {
        match value {
            DirectionArg::Asc => Self::Ascending,
            DirectionArg::Desc => Self::Descending,
        }
    }
}

/// Arguments for patient registration.
#[derive(Args, Debug)]
struct RegisterCommand {
    /// Patient first name.
    #[arg(long, value_name = "NAME")]
    first_name: String,
    /// Patient last name.
    #[arg(long, value_name = "NAME")]
    last_name: String,
    /// Date of birth (ISO `YYYY-MM-DD`).
    #[arg(long, value_name = "DATE")]
    date_of_birth: String,
    /// Gender label (for example, `Male` or `Prefer not to say`).
    #[arg(long, value_name = "LABEL")]
    gender: String,
    /// Optional contact number.
    #[arg(long, value_name = "NUMBER")]
    contact_number: Option<String>,
    /// Optional email address.
    #[arg(long, value_name = "EMAIL")]
    email: Option<String>,
    /// Optional postal address.
    #[arg(long, value_name = "ADDRESS")]
    address: Option<String>,
    /// Optional medical history notes.
    #[arg(long, value_name = "NOTES")]
    medical_history: Option<String>,
}

/// Arguments for listing patients.
#[derive(Args, Debug)]
struct ListCommand {
    /// Column to sort by (defaults to creation time).
    #[arg(long, value_enum, value_name = "KEY")]
    sort: Option<SortKeyArg>,
    /// Sort direction (defaults to newest first).
    #[arg(long, value_enum, value_name = "DIRECTION")]
    direction: Option<DirectionArg>,
    /// Case-insensitive filter over names, email, and contact number.
    #[arg(long, value_name = "TEXT")]
    filter: Option<String>,
    /// Render full per-patient cards instead of one-line entries.
    #[arg(long, action = ArgAction::SetTrue)]
    cards: bool,
}

/// Arguments for editing a patient record.
#[derive(Args, Debug)]
struct EditCommand {
    /// Patient row identifier.
    id: i64,
    /// Replacement first name.
    #[arg(long, value_name = "NAME")]
    first_name: Option<String>,
    /// Replacement last name.
    #[arg(long, value_name = "NAME")]
    last_name: Option<String>,
    /// Replacement date of birth (ISO `YYYY-MM-DD`).
    #[arg(long, value_name = "DATE")]
    date_of_birth: Option<String>,
    /// Replacement gender label.
    #[arg(long, value_name = "LABEL")]
    gender: Option<String>,
    /// Replacement contact number (empty clears the field).
    #[arg(long, value_name = "NUMBER")]
    contact_number: Option<String>,
    /// Replacement email address (empty clears the field).
    #[arg(long, value_name = "EMAIL")]
    email: Option<String>,
    /// Replacement postal address (empty clears the field).
    #[arg(long, value_name = "ADDRESS")]
    address: Option<String>,
    /// Replacement medical history notes (empty clears the field).
    #[arg(long, value_name = "NOTES")]
    medical_history: Option<String>,
}

/// Console subcommands.
#[derive(Subcommand, Debug)]
enum ConsoleCommand {
    /// Execute a single SQL statement.
    Exec(ConsoleExecCommand),
    /// Print the persisted statement history.
    History,
}

/// Arguments for executing an ad-hoc SQL statement.
#[derive(Args, Debug)]
struct ConsoleExecCommand {
    /// SQL statement to execute (`$1`/`?1` placeholders supported).
    sql: String,
    /// Bound parameters: a JSON array or a comma-separated list.
    #[arg(long, value_name = "PARAMS")]
    params: Option<String>,
    /// Write the result set as CSV to this path.
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,
}

/// Arguments for watching a live query.
#[derive(Args, Debug)]
struct WatchCommand {
    /// SQL query to keep live (`$1`/`?1` placeholders supported).
    sql: String,
    /// Bound parameters: a JSON array or a comma-separated list.
    #[arg(long, value_name = "PARAMS")]
    params: Option<String>,
    /// Number of result-set updates to observe before exiting.
    #[arg(long, value_name = "COUNT", default_value_t = DEFAULT_WATCH_COUNT)]
    count: usize,
    /// Wait per update in milliseconds before giving up.
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_WATCH_TIMEOUT_MS)]
    timeout_ms: u64,
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate the configuration, then exit.
    Validate,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for localized error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a localized message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let env_lang = std::env::var(LANG_ENV).ok();
    let locale = resolve_locale(cli.lang, env_lang.as_deref())?;
    set_locale(locale);
    if locale != Locale::En {
        write_stderr_line(&t!("i18n.disclaimer.machine_translated"))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    let config_path = cli.config.as_deref();
    match command {
        Commands::Register(command) => command_register(command, config_path),
        Commands::List(command) => command_list(&command, config_path),
        Commands::Show {
            id,
        } => command_show(id, config_path),
        Commands::Edit(command) => command_edit(command, config_path),
        Commands::Delete {
            id,
            confirm,
        } => command_delete(id, confirm, config_path),
        Commands::Console {
            command,
        } => command_console(command, config_path),
        Commands::Watch(command) => command_watch(&command, config_path),
        Commands::Stats => command_stats(config_path),
        Commands::Config {
            command,
        } => command_config(command, config_path),
    }
}

/// Emits the top-level help message for the CLI.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Register Command
// ============================================================================

/// Executes the `register` command.
fn command_register(command: RegisterCommand, config_path: Option<&Path>) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;
    let mut form = RegistrationForm::new(&store, &config.form);
    form.set_field(Field::FirstName, &command.first_name);
    form.set_field(Field::LastName, &command.last_name);
    form.set_field(Field::DateOfBirth, &command.date_of_birth);
    form.set_field(Field::Gender, &command.gender);
    if let Some(value) = &command.contact_number {
        form.set_field(Field::ContactNumber, value);
    }
    if let Some(value) = &command.email {
        form.set_field(Field::Email, value);
    }
    if let Some(value) = &command.address {
        form.set_field(Field::Address, value);
    }
    if let Some(value) = &command.medical_history {
        form.set_field(Field::MedicalHistory, value);
    }
    form.precheck_now(&store).map_err(|err| CliError::new(t!("op.failed", error = err)))?;
    match form.submit(&store, today(), now_timestamp()?) {
        Ok(Some(id)) => {
            write_stdout_line(&t!("register.ok", id = id.get()))
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
        Ok(None) => {
            write_stderr_line(&t!("register.blocked.header"))
                .map_err(|err| CliError::new(output_error("stderr", &err)))?;
            emit_field_errors(form.report().errors(), form.conflicts())?;
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(CliError::new(t!("op.failed", error = err))),
    }
}

/// Writes one localized line per validation error and uniqueness conflict.
fn emit_field_errors(
    errors: &BTreeMap<Field, String>,
    conflicts: &BTreeMap<Field, String>,
) -> CliResult<()> {
    for (field, message) in errors.iter().chain(conflicts.iter()) {
        write_stderr_line(&t!("form.field_error", field = field_label(*field), message = message))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }
    Ok(())
}

// ============================================================================
// SECTION: List Command
// ============================================================================

/// Executes the `list` command.
fn command_list(command: &ListCommand, config_path: Option<&Path>) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;
    let mut sort = SortSpec::default();
    if let Some(key) = command.sort {
        sort.key = key.into();
        sort.direction = SortDirection::Ascending;
    }
    if let Some(direction) = command.direction {
        sort.direction = direction.into();
    }
    let records = store
        .list_patients(sort)
        .map_err(|err| CliError::new(t!("store.query_failed", error = err)))?;
    let needle = command.filter.as_deref().map(|filter| filter.trim().to_lowercase());
    let visible: Vec<&PatientRecord> = records
        .iter()
        .filter(|record| needle.as_deref().is_none_or(|needle| record_matches(record, needle)))
        .collect();
    if visible.is_empty() {
        write_stdout_line(&t!("list.none"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }
    write_stdout_line(&t!("list.header", count = visible.len()))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    for record in visible {
        if command.cards {
            write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
            print_record(record)?;
        } else {
            write_stdout_line(&t!(
                "list.entry",
                id = record.id.get(),
                last_name = record.last_name,
                first_name = record.first_name,
                date_of_birth = record.date_of_birth,
                gender = record.gender.label()
            ))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Matches a record against a lowercased filter needle.
fn record_matches(record: &PatientRecord, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let mut haystacks = vec![record.first_name.to_lowercase(), record.last_name.to_lowercase()];
    if let Some(email) = &record.email {
        haystacks.push(email.to_lowercase());
    }
    if let Some(contact) = &record.contact_number {
        haystacks.push(contact.to_lowercase());
    }
    haystacks.iter().any(|haystack| haystack.contains(needle))
}

// ============================================================================
// SECTION: Show Command
// ============================================================================

/// Executes the `show` command.
fn command_show(id: i64, config_path: Option<&Path>) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;
    let patient_id =
        PatientId::from_raw(id).ok_or_else(|| CliError::new(t!("show.not_found", id = id)))?;
    let record = store
        .get_patient(patient_id)
        .map_err(|err| CliError::new(t!("store.query_failed", error = err)))?
        .ok_or_else(|| CliError::new(t!("show.not_found", id = id)))?;
    print_record(&record)?;
    Ok(ExitCode::SUCCESS)
}

/// Prints every field of a patient record as localized detail lines.
fn print_record(record: &PatientRecord) -> CliResult<()> {
    let lines = [
        (t!("label.id"), record.id.get().to_string()),
        (t!("label.first_name"), record.first_name.clone()),
        (t!("label.last_name"), record.last_name.clone()),
        (t!("label.date_of_birth"), record.date_of_birth.clone()),
        (t!("label.gender"), record.gender.label().to_string()),
        (t!("label.contact_number"), optional_text(record.contact_number.as_deref())),
        (t!("label.email"), optional_text(record.email.as_deref())),
        (t!("label.address"), optional_text(record.address.as_deref())),
        (t!("label.medical_history"), optional_text(record.medical_history.as_deref())),
        (t!("label.created_at"), format_timestamp(record.created_at)),
        (t!("label.updated_at"), format_timestamp(record.updated_at)),
    ];
    for (label, value) in lines {
        write_stdout_line(&t!("detail.line", label = label, value = value))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    Ok(())
}

/// Renders an optional field, substituting a placeholder for absent values.
fn optional_text(value: Option<&str>) -> String {
    value.map_or_else(|| t!("detail.absent"), ToString::to_string)
}

// ============================================================================
// SECTION: Edit Command
// ============================================================================

/// Executes the `edit` command.
fn command_edit(command: EditCommand, config_path: Option<&Path>) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;
    let edits = [
        (Field::FirstName, &command.first_name),
        (Field::LastName, &command.last_name),
        (Field::DateOfBirth, &command.date_of_birth),
        (Field::Gender, &command.gender),
        (Field::ContactNumber, &command.contact_number),
        (Field::Email, &command.email),
        (Field::Address, &command.address),
        (Field::MedicalHistory, &command.medical_history),
    ];
    if edits.iter().all(|(_, value)| value.is_none()) {
        write_stderr_line(&t!("edit.nothing"))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
        return Ok(ExitCode::FAILURE);
    }
    let mut detail = load_detail(&store, command.id)?;
    detail.begin_edit();
    for (field, value) in edits {
        if let Some(value) = value {
            detail.set_field(field, value);
        }
    }
    match detail.save(&store, today(), now_timestamp()?) {
        Ok(true) => {
            write_stdout_line(&t!("edit.ok", id = command.id))
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
        Ok(false) => {
            write_stderr_line(&t!("edit.blocked.header"))
                .map_err(|err| CliError::new(output_error("stderr", &err)))?;
            emit_field_errors(detail.report().errors(), detail.conflicts())?;
            Ok(ExitCode::FAILURE)
        }
        Err(StoreError::NotFound(_)) => Err(CliError::new(t!("show.not_found", id = command.id))),
        Err(err) => Err(CliError::new(t!("op.failed", error = err))),
    }
}

// ============================================================================
// SECTION: Delete Command
// ============================================================================

/// Executes the `delete` command.
fn command_delete(id: i64, confirm: bool, config_path: Option<&Path>) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;
    let mut detail = load_detail(&store, id)?;
    detail.request_delete();
    if !confirm {
        write_stdout_line(&t!("delete.armed", id = id))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }
    match detail.confirm_delete(&store) {
        Ok(()) => {
            write_stdout_line(&t!("delete.ok", id = id))
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
        Err(StoreError::NotFound(_)) => Err(CliError::new(t!("show.not_found", id = id))),
        Err(err) => Err(CliError::new(t!("op.failed", error = err))),
    }
}

/// Loads a detail context or maps lookup failures to localized errors.
fn load_detail(store: &PatientStore, raw_id: i64) -> CliResult<PatientDetail> {
    let id =
        PatientId::from_raw(raw_id).ok_or_else(|| CliError::new(t!("show.not_found", id = raw_id)))?;
    PatientDetail::load(store, id).map_err(|err| match err {
        StoreError::NotFound(_) => CliError::new(t!("show.not_found", id = raw_id)),
        other => CliError::new(t!("op.failed", error = other)),
    })
}

// ============================================================================
// SECTION: Console Commands
// ============================================================================

/// Dispatches console subcommands.
fn command_console(command: ConsoleCommand, config_path: Option<&Path>) -> CliResult<ExitCode> {
    match command {
        ConsoleCommand::Exec(command) => command_console_exec(&command, config_path),
        ConsoleCommand::History => command_console_history(config_path),
    }
}

/// Executes the `console exec` command.
fn command_console_exec(
    command: &ConsoleExecCommand,
    config_path: Option<&Path>,
) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;
    let mut history =
        ConsoleHistory::load(&config.console.history_path, config.console.history_limit);
    history.record(&command.sql, command.params.as_deref().unwrap_or(""));
    if let Err(err) = history.save() {
        write_stderr_line(&t!("console.history_save_failed", error = err))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }
    let params = parse_params(command.params.as_deref().unwrap_or(""));
    let outcome = store
        .execute(&command.sql, &params)
        .map_err(|err| CliError::new(t!("console.exec_failed", error = err)))?;
    if outcome.is_projection() {
        if outcome.rows.is_empty() {
            write_stdout_line(&t!("console.no_rows"))
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        } else {
            for line in render_table(&outcome) {
                write_stdout_line(&line)
                    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            }
        }
    } else {
        write_stdout_line(&t!("console.rows_affected", count = outcome.rows_affected))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    if let Some(path) = &command.csv {
        fs::write(path, export_csv(&outcome)).map_err(|err| {
            CliError::new(t!("console.csv_write_failed", path = path.display(), error = err))
        })?;
        write_stdout_line(&t!("console.csv_written", path = path.display()))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes the `console history` command.
fn command_console_history(config_path: Option<&Path>) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let history =
        ConsoleHistory::load(&config.console.history_path, config.console.history_limit);
    if history.entries().is_empty() {
        write_stdout_line(&t!("console.history.none"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }
    write_stdout_line(&t!("console.history.header"))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    for (position, entry) in history.entries().iter().enumerate() {
        let index = position.saturating_add(1);
        let line = if entry.params.is_empty() {
            t!("console.history.entry", index = index, statement = entry.sql)
        } else {
            t!(
                "console.history.entry_params",
                index = index,
                statement = entry.sql,
                params = entry.params
            )
        };
        write_stdout_line(&line).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Watch Command
// ============================================================================

/// Executes the `watch` command.
fn command_watch(command: &WatchCommand, config_path: Option<&Path>) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;
    let params = parse_params(command.params.as_deref().unwrap_or(""));
    let subscription = store
        .live_query(&command.sql, &params)
        .map_err(|err| CliError::new(t!("console.exec_failed", error = err)))?;
    write_stdout_line(&t!("watch.header", sql = command.sql))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    let mut observed = 0usize;
    while observed < command.count {
        let Some(outcome) = subscription.next_timeout(Duration::from_millis(command.timeout_ms))
        else {
            write_stdout_line(&t!("watch.timeout", ms = command.timeout_ms))
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            break;
        };
        observed = observed.saturating_add(1);
        write_stdout_line(&t!("watch.update", index = observed, rows = outcome.rows.len()))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        for line in render_table(&outcome) {
            write_stdout_line(&line).map_err(|err| CliError::new(output_error("stdout", &err)))?;
        }
    }
    write_stdout_line(&t!("watch.done", count = observed))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Stats Command
// ============================================================================

/// Executes the `stats` command.
fn command_stats(config_path: Option<&Path>) -> CliResult<ExitCode> {
    let config = load_config(config_path)?;
    let store = open_store(&config)?;
    let stats = store
        .dashboard_stats()
        .map_err(|err| CliError::new(t!("store.query_failed", error = err)))?;
    let leader = store
        .leader_status(now_timestamp()?)
        .map_err(|err| CliError::new(t!("store.query_failed", error = err)))?;
    let counts = store.op_counts_snapshot();
    let leader_label = if leader {
        t!("stats.leader.yes")
    } else {
        t!("stats.leader.no")
    };
    let lines = [
        t!("stats.header"),
        t!("stats.total", count = stats.total),
        t!("stats.male", count = stats.male),
        t!("stats.female", count = stats.female),
        t!("stats.other", count = stats.other),
        t!("stats.leader", status = leader_label),
        t!(
            "stats.ops",
            reads = counts.reads,
            writes = counts.writes,
            adhoc = counts.adhoc,
            pushes = counts.live_pushes
        ),
    ];
    for line in lines {
        write_stdout_line(&line).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand, config_path: Option<&Path>) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate => command_config_validate(config_path),
    }
}

/// Executes the `config validate` command.
fn command_config_validate(config_path: Option<&Path>) -> CliResult<ExitCode> {
    load_config(config_path)?;
    let message = config_path.map_or_else(
        || t!("config.valid.defaults"),
        |path| t!("config.valid.file", path = path.display()),
    );
    write_stdout_line(&message).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Store Helpers
// ============================================================================

/// Loads the application configuration.
fn load_config(path: Option<&Path>) -> CliResult<AppConfig> {
    AppConfig::load(path).map_err(|err| CliError::new(t!("config.load_failed", error = err)))
}

/// Opens the patient store from a validated configuration.
fn open_store(config: &AppConfig) -> CliResult<PatientStore> {
    PatientStore::open(config.store.clone(), now_timestamp()?)
        .map_err(|err| CliError::new(t!("store.open_failed", error = err)))
}

/// Returns the current wall-clock timestamp in unix milliseconds.
fn now_timestamp() -> CliResult<Timestamp> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|err| CliError::new(t!("op.failed", error = err)))?;
    let millis = i64::try_from(elapsed.as_millis())
        .map_err(|err| CliError::new(t!("op.failed", error = err)))?;
    Ok(Timestamp::from_unix_millis(millis))
}

/// Returns today's date in UTC.
fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

// ============================================================================
// SECTION: Rendering Helpers
// ============================================================================

/// Returns the localized display label for a record field.
fn field_label(field: Field) -> String {
    match field {
        Field::FirstName => t!("label.first_name"),
        Field::LastName => t!("label.last_name"),
        Field::DateOfBirth => t!("label.date_of_birth"),
        Field::Gender => t!("label.gender"),
        Field::ContactNumber => t!("label.contact_number"),
        Field::Email => t!("label.email"),
        Field::Address => t!("label.address"),
        Field::MedicalHistory => t!("label.medical_history"),
    }
}

/// Formats a millisecond timestamp as RFC 3339, falling back to raw millis.
fn format_timestamp(timestamp: Timestamp) -> String {
    let seconds = timestamp.as_unix_millis().div_euclid(1000);
    OffsetDateTime::from_unix_timestamp(seconds)
        .ok()
        .and_then(|moment| moment.format(&Rfc3339).ok())
        .unwrap_or_else(|| timestamp.as_unix_millis().to_string())
}

/// Renders a projection result as aligned text rows.
fn render_table(outcome: &QueryOutcome) -> Vec<String> {
    let rendered: Vec<Vec<String>> = outcome
        .rows
        .iter()
        .map(|row| row.iter().map(SqlValue::render).collect())
        .collect();
    let mut widths: Vec<usize> = outcome.columns.iter().map(String::len).collect();
    for row in &rendered {
        for (index, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(index) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }
    let mut lines = Vec::with_capacity(rendered.len().saturating_add(2));
    lines.push(format_row(&outcome.columns, &widths));
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    lines.push(rule.join("-+-"));
    for row in &rendered {
        lines.push(format_row(row, &widths));
    }
    lines
}

/// Pads each cell to its column width and joins them with separators.
fn format_row<S: AsRef<str>>(cells: &[S], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell.as_ref(), width = *width))
        .collect();
    padded.join(" | ").trim_end().to_string()
}

/// Resolves the output locale from the CLI flag and environment.
fn resolve_locale(lang: Option<LangArg>, env_lang: Option<&str>) -> CliResult<Locale> {
    if let Some(lang) = lang {
        return Ok(lang.into());
    }
    if let Some(value) = env_lang {
        return Locale::parse(value).ok_or_else(|| {
            CliError::new(t!("i18n.lang.invalid_env", env = LANG_ENV, value = value))
        });
    }
    Ok(Locale::En)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats a localized output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
