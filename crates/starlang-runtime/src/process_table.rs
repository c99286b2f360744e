//! Generational slot table backing pid allocation.
//!
//! Each slot carries a serial. A pid is the pair `(slot, serial)`; freeing a
//! slot bumps its serial before the slot is handed out again, so a pid is
//! never issued twice and a stale pid stops resolving the moment its process
//! is released. A slot whose serial would wrap is retired instead of reused.
//!
//! The table stores [`Weak`] handles. Dropping the last strong handle to an
//! entry makes it unreachable even before it is removed.

use starlang_core::OtpError;
use std::sync::{Arc, Weak};

struct Slot<T> {
    serial: u32,
    entry: Option<Weak<T>>,
}

pub(crate) struct ProcessTable<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
    limit: Option<usize>,
}

impl<T> ProcessTable<T> {
    /// Creates a table. Slot 0 is reserved and never handed out.
    pub(crate) fn new(limit: Option<usize>) -> Self {
        Self {
            slots: vec![Slot {
                serial: u32::MAX,
                entry: None,
            }],
            free: Vec::new(),
            live: 0,
            limit,
        }
    }

    fn claim_slot(&mut self) -> Result<u32, OtpError> {
        if let Some(id) = self.free.pop() {
            return Ok(id);
        }
        let id = u32::try_from(self.slots.len()).map_err(|_| OtpError::system_limit())?;
        self.slots.push(Slot {
            serial: 0,
            entry: None,
        });
        Ok(id)
    }

    fn retire_or_free(&mut self, id: u32) {
        let slot = &mut self.slots[id as usize];
        if let Some(next) = slot.serial.checked_add(1) {
            slot.serial = next;
            self.free.push(id);
        } else {
            tracing::debug!(slot = id, "retiring exhausted process slot");
        }
    }

    /// Allocates a slot and stores the entry built from `(id, serial)`.
    pub(crate) fn insert_with<F>(&mut self, build: F) -> Result<Arc<T>, OtpError>
    where
        F: FnOnce(u32, u32) -> T,
    {
        if self.limit.is_some_and(|limit| self.live >= limit) {
            return Err(OtpError::system_limit());
        }
        let id = self.claim_slot()?;
        let slot = &mut self.slots[id as usize];
        let entry = Arc::new(build(id, slot.serial));
        slot.entry = Some(Arc::downgrade(&entry));
        self.live += 1;
        Ok(entry)
    }

    /// Allocates a fresh `(id, serial)` pair that no entry will ever own.
    pub(crate) fn mint(&mut self) -> Result<(u32, u32), OtpError> {
        let id = self.claim_slot()?;
        let serial = self.slots[id as usize].serial;
        self.retire_or_free(id);
        Ok((id, serial))
    }

    /// Resolves `(id, serial)` to a live entry.
    pub(crate) fn get(&self, id: u32, serial: u32) -> Option<Arc<T>> {
        let slot = self.slots.get(id as usize)?;
        if slot.serial != serial {
            return None;
        }
        slot.entry.as_ref()?.upgrade()
    }

    /// Frees the slot if it still belongs to `(id, serial)`.
    pub(crate) fn remove(&mut self, id: u32, serial: u32) -> bool {
        let Some(slot) = self.slots.get_mut(id as usize) else {
            return false;
        };
        if slot.serial != serial || slot.entry.take().is_none() {
            return false;
        }
        self.live -= 1;
        self.retire_or_free(id);
        true
    }

    /// `(id, serial)` of every entry that is still reachable.
    pub(crate) fn occupied(&self) -> Vec<(u32, u32)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| {
                let entry = slot.entry.as_ref()?;
                (entry.strong_count() > 0).then_some((id as u32, slot.serial))
            })
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.live
    }
}
