//! Registered process names.
//!
//! The [`NameRegistry`] maps atoms to local pids. A name belongs to at most
//! one pid at a time; a pid may hold several names. Entries are removed
//! explicitly or in bulk when the owner dies.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use starlang_core::{Atom, Pid};

/// A thread-safe map from registered names to pids.
#[derive(Default)]
pub(crate) struct NameRegistry {
    names: DashMap<Atom, Pid>,
}

impl NameRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Claims `name` for `pid`.
    ///
    /// Returns `false` if the name is already held, even by `pid` itself.
    pub(crate) fn register(&self, name: Atom, pid: Pid) -> bool {
        match self.names.entry(name) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(pid);
                true
            }
        }
    }

    /// Removes `name` if it is currently held by `pid`.
    pub(crate) fn unregister(&self, name: Atom, pid: Pid) -> bool {
        self.names.remove_if(&name, |_, owner| *owner == pid).is_some()
    }

    /// Removes every name held by `pid`, returning how many were removed.
    pub(crate) fn unregister_all(&self, pid: Pid) -> usize {
        let before = self.names.len();
        self.names.retain(|_, owner| *owner != pid);
        before.saturating_sub(self.names.len())
    }

    pub(crate) fn whereis(&self, name: Atom) -> Option<Pid> {
        self.names.get(&name).map(|entry| *entry.value())
    }

    pub(crate) fn registered(&self) -> Vec<Atom> {
        let mut names: Vec<Atom> = self.names.iter().map(|entry| *entry.key()).collect();
        names.sort();
        names
    }

    pub(crate) fn len(&self) -> usize {
        self.names.len()
    }
}

impl std::fmt::Debug for NameRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameRegistry")
            .field("name_count", &self.names.len())
            .finish()
    }
}
