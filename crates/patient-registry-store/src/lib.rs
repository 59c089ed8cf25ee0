// crates/patient-registry-store/src/lib.rs
// ============================================================================
// Module: Patient Registry Store
// Description: SQLite-backed patient store with live-query subscriptions.
// Purpose: Own the database handle and expose CRUD, ad-hoc SQL, and pushes.
// Dependencies: patient-registry-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! This crate owns the embedded database for the registry. It bootstraps the
//! schema idempotently, executes parameterized statements, rewrites
//! uniqueness-constraint violations into field-specific errors, maintains a
//! single-row leader lease, and republishes every committed mutation to live
//! query subscribers. Durability and transactional guarantees are `SQLite`'s;
//! nothing here implements its own storage engine.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod live;
pub mod store;
pub mod value;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use live::LiveSubscription;
pub use store::DashboardStats;
pub use store::JournalMode;
pub use store::PatientStore;
pub use store::StoreConfig;
pub use store::StoreError;
pub use store::StoreOpCounts;
pub use store::SyncMode;
pub use value::ParamValue;
pub use value::QueryOutcome;
pub use value::SqlValue;
