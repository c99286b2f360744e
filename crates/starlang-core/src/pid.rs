//! Process identifier type.
//!
//! A [`Pid`] names a process. It has four components, compared in this order:
//!
//! - **node**: index into the owning node's node table; `0` is the local node
//! - **id**: process-table slot the process occupies
//! - **serial**: generation of that slot, bumped every time the slot is reused
//! - **creation**: incarnation of the node that allocated the pid
//!
//! Because `(id, serial)` is unique for the lifetime of a node incarnation, a
//! stale `Pid` that still points at a reused slot resolves to "no such
//! process" instead of reaching the slot's new owner.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Node index reserved for the local node.
pub const LOCAL_NODE: u32 = 0;

/// A process identifier.
///
/// Pids are plain values: `Copy`, hashable, and totally ordered field by
/// field (node, id, serial, creation).
///
/// # Examples
///
/// ```
/// use starlang_core::Pid;
///
/// let a = Pid::local(5, 0, 1);
/// let b = Pid::local(5, 1, 1);
/// assert!(a.is_local());
/// assert!(a < b);
/// assert_eq!(a.to_string(), "<0.5.0>");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pid {
    node: u32,
    id: u32,
    serial: u32,
    creation: u32,
}

impl Pid {
    /// Creates a `Pid` from its raw parts.
    ///
    /// Mostly used by transports rebuilding identifiers received from
    /// another node. Local processes get their pid from the node.
    pub const fn new(node: u32, id: u32, serial: u32, creation: u32) -> Self {
        Self {
            node,
            id,
            serial,
            creation,
        }
    }

    /// Creates a `Pid` on the local node.
    pub const fn local(id: u32, serial: u32, creation: u32) -> Self {
        Self::new(LOCAL_NODE, id, serial, creation)
    }

    /// Returns the node index.
    #[inline]
    pub const fn node(&self) -> u32 {
        self.node
    }

    /// Returns the process-table slot.
    #[inline]
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Returns the slot generation.
    #[inline]
    pub const fn serial(&self) -> u32 {
        self.serial
    }

    /// Returns the creation number.
    #[inline]
    pub const fn creation(&self) -> u32 {
        self.creation
    }

    /// Returns `true` if this pid belongs to the local node.
    #[inline]
    pub const fn is_local(&self) -> bool {
        self.node == LOCAL_NODE
    }

    /// Returns the same pid re-homed to `node`.
    ///
    /// Transports use this when a local pid crosses to another node, where
    /// it must be addressed through that node's index for us.
    pub const fn with_node(self, node: u32) -> Self {
        Self { node, ..self }
    }
}

impl fmt::Debug for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pid<{}.{}.{}.{}>",
            self.node, self.id, self.serial, self.creation
        )
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}.{}.{}>", self.node, self.id, self.serial)
    }
}
