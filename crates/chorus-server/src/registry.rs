//! Registry of sessions eligible for broadcast.
//!
//! One mutex guards the id → session map. Callers never see the map itself:
//! [`Registry::snapshot`] copies the session handles out under the lock, so a
//! broadcast iterating a snapshot is unaffected by concurrent adds and
//! removes.
//!
//! Membership means "should receive broadcasts", not "transport still open".
//! Removal does not close the session; its processing unit does that.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use thiserror::Error;

use crate::session::{Session, SessionId};

/// Registry invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A session with this id is already registered.
    ///
    /// Ids come from a monotonic counter, so this is a bug, not a user error.
    #[error("session {0} is already registered")]
    DuplicateId(SessionId),
}

/// Shared set of live sessions, keyed by id.
///
/// Cheap to clone; clones share the same map. Snapshot order is ascending id,
/// which is also connection order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    sessions: Arc<Mutex<BTreeMap<SessionId, Arc<Session>>>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<SessionId, Arc<Session>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a session.
    ///
    /// # Errors
    ///
    /// - `RegistryError::DuplicateId` if the id is already present. The
    ///   registry is left unchanged.
    pub fn add(&self, session: Arc<Session>) -> Result<(), RegistryError> {
        let mut sessions = self.lock();
        let id = session.id();

        if sessions.contains_key(&id) {
            return Err(RegistryError::DuplicateId(id));
        }

        sessions.insert(id, session);
        Ok(())
    }

    /// Unregister a session.
    ///
    /// Returns the session if it was present. Removing an absent id is a
    /// no-op: logout and a failed broadcast may race to remove the same
    /// session.
    pub fn remove(&self, id: SessionId) -> Option<Arc<Session>> {
        self.lock().remove(&id)
    }

    /// Copy of the current membership, in id order.
    pub fn snapshot(&self) -> Vec<Arc<Session>> {
        self.lock().values().cloned().collect()
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: SessionId) -> bool {
        self.lock().contains_key(&id)
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no session is registered.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Remove every session, returning them in id order.
    pub fn drain(&self) -> Vec<Arc<Session>> {
        std::mem::take(&mut *self.lock()).into_values().collect()
    }
}
