//! # starlang-core
//!
//! Core value types for the Starlang process runtime.
//!
//! - [`Atom`] - Interned symbol
//! - [`Pid`] - Process identifier `(node, id, serial, creation)`
//! - [`Ref`] - Unique reference, same shape as a pid
//! - [`Term`] - Dynamic value carried by messages and exit reasons
//! - [`OtpError`] - Error carrying a reason term
//! - [`reason`] - Well-known exit reasons (`normal`, `kill`, `killed`, ...)
//! - [`pattern`] - Term patterns compiled into receive predicates

#![deny(warnings)]
#![deny(missing_docs)]

mod error;
pub mod pattern;
mod pid;
pub mod reason;
mod reference;
mod term;

pub use starlang_atom::{atom, Atom};

pub use error::OtpError;
pub use pattern::{Matcher, Pattern, Predicate};
pub use pid::{Pid, LOCAL_NODE};
pub use reference::Ref;
pub use term::{DecodeError, Term};
