// crates/patient-registry-cli/src/lib.rs
// ============================================================================
// Module: CLI Library Surface
// Description: Shared CLI building blocks (localization catalog).
// Purpose: Expose the i18n catalog and macro to the binary and its tests.
// Dependencies: Standard library only.
// ============================================================================

//! ## Overview
//! The binary keeps its command plumbing private; this library surface holds
//! only what tests and the binary share, which today is the localization
//! catalog behind the [`t!`](crate::t) macro.

/// Message catalog and translation utilities.
pub mod i18n;

#[cfg(test)]
mod tests;
