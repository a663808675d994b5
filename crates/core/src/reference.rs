//! Reference sheets used by menu-list insertions.
//!
//! The library is shared between requests and may be updated at any time.
//! A pipeline run never reads it directly: it works on a
//! [`ReferenceSnapshot`] taken when the run starts, so replacing a sheet
//! only affects runs that begin afterwards.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tradedoc_sheet::TableModel;

/// Shared, updatable collection of reference sheets keyed by sheet id.
#[derive(Debug, Default)]
pub struct ReferenceLibrary {
    sheets: RwLock<HashMap<String, Arc<TableModel>>>,
}

impl ReferenceLibrary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a sheet. Returns the previous version, if any.
    pub fn insert(&self, id: &str, sheet: TableModel) -> Option<Arc<TableModel>> {
        self.sheets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string(), Arc::new(sheet))
    }

    /// Remove a sheet. Runs holding a snapshot keep their copy.
    pub fn remove(&self, id: &str) -> Option<Arc<TableModel>> {
        self.sheets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.sheets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    /// Take a read-only snapshot of every sheet currently in the library.
    #[must_use]
    pub fn snapshot(&self) -> ReferenceSnapshot {
        let sheets = self
            .sheets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        ReferenceSnapshot { sheets }
    }
}

/// Immutable view of the reference sheets for one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSnapshot {
    sheets: HashMap<String, Arc<TableModel>>,
}

impl ReferenceSnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sheet to a snapshot being assembled by hand.
    #[must_use]
    pub fn with_sheet(mut self, id: &str, sheet: TableModel) -> Self {
        self.sheets.insert(id.to_string(), Arc::new(sheet));
        self
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&TableModel> {
        self.sheets.get(id).map(Arc::as_ref)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}
