//! Dynamic values exchanged between processes.
//!
//! Every message, exit reason, and registry key in the runtime is a [`Term`].
//! The shape follows Erlang's data model closely enough that patterns like
//! `{'EXIT', Pid, Reason}` read naturally:
//!
//! ```
//! use starlang_core::{Pid, Term};
//!
//! let from = Pid::local(1, 0, 0);
//! let msg = Term::tuple([Term::atom("EXIT"), from.into(), Term::atom("normal")]);
//!
//! assert_eq!(msg.to_string(), "{'EXIT',<0.1.0>,normal}");
//! assert!(msg.is_tagged("EXIT"));
//! ```
//!
//! Terms are totally ordered (numbers < atoms < refs < pids < tuples <
//! lists < binaries) so they can key ordered maps. They also have a compact
//! binary form via `postcard` ([`Term::encode`] / [`Term::decode`]), which is
//! what a distribution transport puts on the wire.

use crate::{Pid, Ref};
use serde::{Deserialize, Serialize};
use starlang_atom::Atom;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Error type for term decoding failures.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The bytes are not a valid encoded term.
    #[error("failed to decode term: {0}")]
    Deserialize(#[from] postcard::Error),
}

/// A dynamically typed value.
#[derive(Clone, Serialize, Deserialize)]
pub enum Term {
    /// An interned symbol.
    Atom(Atom),
    /// A signed integer.
    Int(i64),
    /// A float.
    Float(f64),
    /// UTF-8 text.
    String(String),
    /// Raw bytes.
    Binary(Vec<u8>),
    /// A process identifier.
    Pid(Pid),
    /// A unique reference.
    Ref(Ref),
    /// A fixed-size tuple.
    Tuple(Vec<Term>),
    /// A list. The empty list is Erlang's `[]` (nil).
    List(Vec<Term>),
}

impl Term {
    /// Creates an atom term.
    pub fn atom(name: &str) -> Self {
        Term::Atom(Atom::new(name))
    }

    /// Creates a tuple term.
    pub fn tuple(elements: impl IntoIterator<Item = Term>) -> Self {
        Term::Tuple(elements.into_iter().collect())
    }

    /// Creates a list term.
    pub fn list(elements: impl IntoIterator<Item = Term>) -> Self {
        Term::List(elements.into_iter().collect())
    }

    /// The empty list.
    pub fn nil() -> Self {
        Term::List(Vec::new())
    }

    /// Returns the atom if this is an atom.
    pub fn as_atom(&self) -> Option<Atom> {
        match self {
            Term::Atom(atom) => Some(*atom),
            _ => None,
        }
    }

    /// Returns the integer if this is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Term::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the text if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Term::String(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the pid if this is a pid.
    pub fn as_pid(&self) -> Option<Pid> {
        match self {
            Term::Pid(pid) => Some(*pid),
            _ => None,
        }
    }

    /// Returns the reference if this is a reference.
    pub fn as_reference(&self) -> Option<Ref> {
        match self {
            Term::Ref(reference) => Some(*reference),
            _ => None,
        }
    }

    /// Returns the elements if this is a tuple.
    pub fn as_tuple(&self) -> Option<&[Term]> {
        match self {
            Term::Tuple(elements) => Some(elements),
            _ => None,
        }
    }

    /// Returns the elements if this is a list.
    pub fn as_list(&self) -> Option<&[Term]> {
        match self {
            Term::List(elements) => Some(elements),
            _ => None,
        }
    }

    /// Returns `true` if this is the atom `name`.
    pub fn is_atom(&self, name: &str) -> bool {
        matches!(self, Term::Atom(atom) if atom.as_str() == name)
    }

    /// Returns `true` if this is a non-empty tuple whose first element is
    /// the atom `tag`.
    pub fn is_tagged(&self, tag: &str) -> bool {
        self.as_tuple()
            .and_then(|elements| elements.first())
            .is_some_and(|head| head.is_atom(tag))
    }

    /// Encodes the term into its binary form.
    pub fn encode(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    /// Decodes a term from its binary form.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        postcard::from_bytes(bytes).map_err(DecodeError::from)
    }

    fn rank(&self) -> u8 {
        match self {
            Term::Int(_) | Term::Float(_) => 0,
            Term::Atom(_) => 1,
            Term::Ref(_) => 2,
            Term::Pid(_) => 3,
            Term::Tuple(_) => 4,
            Term::List(_) => 5,
            Term::String(_) | Term::Binary(_) => 6,
        }
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Term {}

impl PartialOrd for Term {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Term {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Term::Int(a), Term::Int(b)) => a.cmp(b),
            (Term::Float(a), Term::Float(b)) => a.total_cmp(b),
            // Mixed numbers compare by value; on a tie the integer sorts first
            // so that `1` and `1.0` stay distinct terms.
            (Term::Int(a), Term::Float(b)) => (*a as f64).total_cmp(b).then(Ordering::Less),
            (Term::Float(a), Term::Int(b)) => a.total_cmp(&(*b as f64)).then(Ordering::Greater),
            (Term::Atom(a), Term::Atom(b)) => a.cmp(b),
            (Term::Ref(a), Term::Ref(b)) => a.cmp(b),
            (Term::Pid(a), Term::Pid(b)) => a.cmp(b),
            // Erlang compares tuples by size first, then element-wise.
            (Term::Tuple(a), Term::Tuple(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            (Term::List(a), Term::List(b)) => a.cmp(b),
            (Term::String(a), Term::String(b)) => a.cmp(b),
            (Term::Binary(a), Term::Binary(b)) => a.cmp(b),
            (Term::String(a), Term::Binary(b)) => {
                a.as_bytes().cmp(b.as_slice()).then(Ordering::Less)
            }
            (Term::Binary(a), Term::String(b)) => {
                a.as_slice().cmp(b.as_bytes()).then(Ordering::Greater)
            }
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for Term {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Term::Atom(atom) => atom.hash(state),
            Term::Int(value) => value.hash(state),
            Term::Float(value) => value.to_bits().hash(state),
            Term::String(text) => text.hash(state),
            Term::Binary(bytes) => bytes.hash(state),
            Term::Pid(pid) => pid.hash(state),
            Term::Ref(reference) => reference.hash(state),
            Term::Tuple(elements) | Term::List(elements) => elements.hash(state),
        }
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, elements: &[Term]) -> fmt::Result {
    for (i, element) in elements.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{}", element)?;
    }
    Ok(())
}

fn atom_needs_quotes(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {
            !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '@')
        }
        _ => true,
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Atom(atom) if atom_needs_quotes(atom.as_str()) => write!(f, "'{}'", atom),
            Term::Atom(atom) => write!(f, "{}", atom),
            Term::Int(value) => write!(f, "{}", value),
            Term::Float(value) => write!(f, "{:?}", value),
            Term::String(text) => write!(f, "{:?}", text),
            Term::Binary(bytes) => {
                f.write_str("<<")?;
                for (i, byte) in bytes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", byte)?;
                }
                f.write_str(">>")
            }
            Term::Pid(pid) => write!(f, "{}", pid),
            Term::Ref(reference) => write!(f, "{}", reference),
            Term::Tuple(elements) => {
                f.write_str("{")?;
                write_seq(f, elements)?;
                f.write_str("}")
            }
            Term::List(elements) => {
                f.write_str("[")?;
                write_seq(f, elements)?;
                f.write_str("]")
            }
        }
    }
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Term({})", self)
    }
}

impl From<Atom> for Term {
    fn from(atom: Atom) -> Self {
        Term::Atom(atom)
    }
}

impl From<i64> for Term {
    fn from(value: i64) -> Self {
        Term::Int(value)
    }
}

impl From<i32> for Term {
    fn from(value: i32) -> Self {
        Term::Int(value.into())
    }
}

impl From<u32> for Term {
    fn from(value: u32) -> Self {
        Term::Int(value.into())
    }
}

impl From<f64> for Term {
    fn from(value: f64) -> Self {
        Term::Float(value)
    }
}

impl From<bool> for Term {
    fn from(value: bool) -> Self {
        Term::atom(if value { "true" } else { "false" })
    }
}

impl From<&str> for Term {
    fn from(text: &str) -> Self {
        Term::String(text.to_owned())
    }
}

impl From<String> for Term {
    fn from(text: String) -> Self {
        Term::String(text)
    }
}

impl From<Vec<u8>> for Term {
    fn from(bytes: Vec<u8>) -> Self {
        Term::Binary(bytes)
    }
}

impl From<Pid> for Term {
    fn from(pid: Pid) -> Self {
        Term::Pid(pid)
    }
}

impl From<Ref> for Term {
    fn from(reference: Ref) -> Self {
        Term::Ref(reference)
    }
}

impl From<Vec<Term>> for Term {
    fn from(elements: Vec<Term>) -> Self {
        Term::List(elements)
    }
}

macro_rules! impl_from_tuple {
    ($($name:ident),+) => {
        impl<$($name: Into<Term>),+> From<($($name,)+)> for Term {
            #[allow(non_snake_case)]
            fn from(($($name,)+): ($($name,)+)) -> Self {
                Term::Tuple(vec![$($name.into()),+])
            }
        }
    };
}

impl_from_tuple!(A, B);
impl_from_tuple!(A, B, C);
impl_from_tuple!(A, B, C, D);
impl_from_tuple!(A, B, C, D, E);
