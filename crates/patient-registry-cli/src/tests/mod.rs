// crates/patient-registry-cli/src/tests/mod.rs
// ============================================================================
// Module: CLI Unit Test Root
// Description: Declares unit test modules for the CLI library surface.
// Purpose: Keep crate-private test helpers alongside the code they exercise.
// Dependencies: Crate-internal modules only.
// ============================================================================

//! ## Overview
//! Unit tests with access to crate-private items live here.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

mod i18n;
