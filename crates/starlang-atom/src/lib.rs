//! # starlang-atom
//!
//! Interned symbols for the Starlang process runtime.
//!
//! Atoms name things: registered processes, nodes, exit reasons, message
//! tags. They are:
//! - `Copy` (a `u32` index into a global table)
//! - compared in O(1) for equality
//! - ordered alphabetically, the way Erlang orders atoms
//! - never freed, so [`Atom::as_str`] can hand out `&'static str`
//!
//! # Example
//!
//! ```
//! use starlang_atom::{Atom, atom};
//!
//! let a1 = atom!("normal");
//! let a2 = Atom::new("normal");
//!
//! assert_eq!(a1, a2);
//! assert_eq!(a1.as_str(), "normal");
//! assert!(atom!("apple") < atom!("banana"));
//! ```

#![deny(warnings)]
#![deny(missing_docs)]

use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

/// An interned string.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Atom(u32);

static ATOM_TABLE: OnceLock<AtomTable> = OnceLock::new();

struct AtomTable {
    by_name: DashMap<&'static str, u32>,
    by_index: RwLock<Vec<&'static str>>,
}

impl AtomTable {
    fn new() -> Self {
        Self {
            by_name: DashMap::new(),
            by_index: RwLock::new(Vec::new()),
        }
    }

    fn intern(&self, s: &str) -> Atom {
        if let Some(index) = self.by_name.get(s) {
            return Atom(*index);
        }

        let mut names = self.by_index.write();

        // Another thread may have won the race while we waited for the lock.
        if let Some(index) = self.by_name.get(s) {
            return Atom(*index);
        }

        let name: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let index = names.len() as u32;
        names.push(name);
        self.by_name.insert(name, index);

        Atom(index)
    }

    fn lookup(&self, s: &str) -> Option<Atom> {
        self.by_name.get(s).map(|index| Atom(*index))
    }

    fn name(&self, atom: Atom) -> &'static str {
        // Atoms are only minted by `intern`, so the index is always present.
        self.by_index.read().get(atom.0 as usize).copied().unwrap_or("")
    }

    fn len(&self) -> usize {
        self.by_index.read().len()
    }
}

fn table() -> &'static AtomTable {
    ATOM_TABLE.get_or_init(AtomTable::new)
}

impl Atom {
    /// Interns `s`, returning the existing atom if it was seen before.
    pub fn new(s: &str) -> Self {
        table().intern(s)
    }

    /// Returns the atom for `s` only if it has already been interned.
    ///
    /// Useful when decoding untrusted input that should not grow the table.
    pub fn existing(s: &str) -> Option<Self> {
        table().lookup(s)
    }

    /// Returns the text of this atom.
    pub fn as_str(&self) -> &'static str {
        table().name(*self)
    }

    /// Returns the table index of this atom.
    pub fn index(&self) -> u32 {
        self.0
    }

    /// Returns `true` if the atom is the empty string.
    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }

    /// Number of atoms interned so far.
    pub fn table_len() -> usize {
        table().len()
    }
}

impl PartialOrd for Atom {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Atom {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.0 == other.0 {
            return Ordering::Equal;
        }
        self.as_str().cmp(other.as_str())
    }
}

impl From<&str> for Atom {
    fn from(s: &str) -> Self {
        Atom::new(s)
    }
}

impl From<String> for Atom {
    fn from(s: String) -> Self {
        Atom::new(&s)
    }
}

impl From<&String> for Atom {
    fn from(s: &String) -> Self {
        Atom::new(s)
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Atom({:?})", self.as_str())
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Atom {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Atom {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        Ok(Atom::new(&s))
    }
}

/// Create an atom from a string expression.
///
/// ```
/// use starlang_atom::atom;
///
/// let reason = atom!("shutdown");
/// assert_eq!(reason.as_str(), "shutdown");
/// ```
#[macro_export]
macro_rules! atom {
    ($s:expr) => {
        $crate::Atom::new($s)
    };
}
