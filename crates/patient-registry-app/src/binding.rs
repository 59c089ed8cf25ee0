// crates/patient-registry-app/src/binding.rs
// ============================================================================
// Module: Live Query Binding
// Description: One query's rows kept current by store pushes.
// Purpose: Give hosts a polling surface over a live subscription with
//          loading and error state folded in.
// Dependencies: patient-registry-store
// ============================================================================

//! ## Overview
//! A [`LiveBinding`] owns one live subscription plus the last result set it
//! produced. Hosts call [`LiveBinding::poll`] each frame to fold in pushed
//! updates, and [`LiveBinding::rebind`] when the query changes; rebinding to
//! an identical query against the same store instance is a no-op, so hosts
//! can call it unconditionally.

use patient_registry_store::LiveSubscription;
use patient_registry_store::ParamValue;
use patient_registry_store::PatientStore;
use patient_registry_store::SqlValue;
use patient_registry_store::StoreError;

/// A live query binding: one subscription plus its latest result set.
///
/// # Invariants
/// - At most one subscription is live at a time; rebinding tears the old one
///   down before the new one is registered.
/// - `loading` is `true` only between a (re)bind and the first result.
#[derive(Debug)]
pub struct LiveBinding {
    /// Bound statement text.
    sql: String,
    /// Bound parameters.
    params: Vec<ParamValue>,
    /// Token of the store instance the subscription belongs to.
    store_token: String,
    /// Active subscription, absent after a setup failure.
    subscription: Option<LiveSubscription>,
    /// Column names of the latest result set.
    columns: Vec<String>,
    /// Rows of the latest result set.
    rows: Vec<Vec<SqlValue>>,
    /// Whether a first result is still outstanding.
    loading: bool,
    /// Setup or refresh error, if any.
    error: Option<String>,
}

impl LiveBinding {
    /// Binds a query against the store and subscribes to its changes.
    #[must_use]
    pub fn bind(store: &PatientStore, sql: &str, params: &[ParamValue]) -> Self {
        let mut binding = Self {
            sql: sql.to_string(),
            params: params.to_vec(),
            store_token: store.instance_token().to_string(),
            subscription: None,
            columns: Vec::new(),
            rows: Vec::new(),
            loading: true,
            error: None,
        };
        binding.subscribe(store);
        binding
    }

    /// Rebinds when the query, parameters, or store instance changed.
    pub fn rebind(&mut self, store: &PatientStore, sql: &str, params: &[ParamValue]) {
        if self.sql == sql
            && self.params == params
            && self.store_token == store.instance_token()
            && self.subscription.is_some()
        {
            return;
        }
        self.subscription = None;
        self.sql = sql.to_string();
        self.params = params.to_vec();
        self.store_token = store.instance_token().to_string();
        self.loading = true;
        self.error = None;
        self.subscribe(store);
    }

    /// Registers the subscription, recording setup failures.
    fn subscribe(&mut self, store: &PatientStore) {
        match store.live_query(&self.sql, &self.params) {
            Ok(subscription) => self.subscription = Some(subscription),
            Err(err) => {
                self.loading = false;
                self.error = Some(err.to_string());
            }
        }
    }

    /// Folds in the most recent pushed result, if any.
    pub fn poll(&mut self) {
        let Some(subscription) = self.subscription.as_ref() else {
            return;
        };
        if let Some(outcome) = subscription.latest() {
            self.columns = outcome.columns;
            self.rows = outcome.rows;
            self.loading = false;
            self.error = None;
        }
    }

    /// Re-runs the bound query synchronously, bypassing the push channel,
    /// and returns the freshly fetched rows.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails; the error is also kept
    /// on the binding for hosts that render it.
    pub fn refetch(&mut self, store: &PatientStore) -> Result<&[Vec<SqlValue>], StoreError> {
        match store.execute(&self.sql, &self.params) {
            Ok(outcome) => {
                self.columns = outcome.columns;
                self.rows = outcome.rows;
                self.loading = false;
                self.error = None;
                Ok(&self.rows)
            }
            Err(err) => {
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Returns the latest column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the latest rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<SqlValue>] {
        &self.rows
    }

    /// Returns `true` while the first result is outstanding.
    #[must_use]
    pub const fn loading(&self) -> bool {
        self.loading
    }

    /// Returns the current error, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
