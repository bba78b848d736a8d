//! View registration
//!
//! Only consulted after the store reported a view missing, so the design
//! document is always read again: a miss means whatever was remembered about
//! it is stale. The read-modify-write runs under one mutex per registry. The
//! set of views seen in the stored document sits behind a reader/writer lock.

use std::collections::HashSet;
use std::sync::{Mutex, RwLock};

use crate::compiler::ViewDefinition;
use crate::transport::DocumentStore;

use super::design::DesignDocument;
use super::errors::{RegistryError, RegistryResult};

/// What `ensure` had to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// The view was already stored; nothing was written
    AlreadyPresent,
    /// The design document was created holding just this view
    Created,
    /// The view was added to an existing design document
    Extended,
}

impl EnsureOutcome {
    pub fn wrote(&self) -> bool {
        !matches!(self, EnsureOutcome::AlreadyPresent)
    }
}

/// Tracks and materializes the views of one design document
#[derive(Debug)]
pub struct IndexRegistry {
    design_id: String,
    known: RwLock<HashSet<String>>,
    write_lock: Mutex<()>,
}

impl IndexRegistry {
    pub fn new(design_id: impl Into<String>) -> Self {
        Self {
            design_id: design_id.into(),
            known: RwLock::new(HashSet::new()),
            write_lock: Mutex::new(()),
        }
    }

    pub fn design_id(&self) -> &str {
        &self.design_id
    }

    /// Returns true if the view was in the design document when last read
    pub fn is_known(&self, name: &str) -> RegistryResult<bool> {
        let known = self.known.read().map_err(|_| RegistryError::Poisoned)?;
        Ok(known.contains(name))
    }

    /// Known view names, sorted
    pub fn known_views(&self) -> RegistryResult<Vec<String>> {
        let known = self.known.read().map_err(|_| RegistryError::Poisoned)?;
        let mut names: Vec<String> = known.iter().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Makes sure the view is stored in the design document.
    ///
    /// Idempotent: a view already stored costs one read and no write, so
    /// callers that lost the race to a concurrent writer write nothing. A
    /// design document that disappeared is created again. Save conflicts are
    /// returned as they are.
    pub fn ensure<S>(&self, store: &S, view: &ViewDefinition) -> RegistryResult<EnsureOutcome>
    where
        S: DocumentStore + ?Sized,
    {
        let _guard = self.write_lock.lock().map_err(|_| RegistryError::Poisoned)?;

        let (mut design, existed) = match store.get(&self.design_id) {
            Ok(value) => {
                let design = DesignDocument::from_value(value)
                    .map_err(|e| RegistryError::malformed(&self.design_id, e))?;
                (design, true)
            }
            Err(err) if err.is_not_found() => (DesignDocument::new(&self.design_id), false),
            Err(err) => return Err(err.into()),
        };

        let outcome = if !design.add_view(view) {
            EnsureOutcome::AlreadyPresent
        } else {
            let body = design
                .to_value()
                .map_err(|e| RegistryError::malformed(&self.design_id, e))?;
            store.save(&body)?;
            if existed {
                EnsureOutcome::Extended
            } else {
                EnsureOutcome::Created
            }
        };

        let mut known = self.known.write().map_err(|_| RegistryError::Poisoned)?;
        known.clear();
        known.extend(design.view_names().map(str::to_string));

        Ok(outcome)
    }
}
