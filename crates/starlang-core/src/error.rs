//! Term-carrying errors.
//!
//! Runtime failures are described by a [`Term`], not a message string, so
//! callers can match on the reason (`badarg`, `noproc`, `{badarg, Flag}`, …)
//! the same way they match on exit reasons.

use crate::{reason, Term};
use thiserror::Error;

/// An error carrying an application-level reason term.
///
/// # Examples
///
/// ```
/// use starlang_core::{OtpError, Term};
///
/// let err = OtpError::badarg_with(Term::atom("bogus_flag"));
/// assert!(err.is_badarg());
/// assert_eq!(err.to_string(), "{badarg,bogus_flag}");
///
/// let reason: Term = err.into();
/// assert!(reason.is_tagged("badarg"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{term}")]
pub struct OtpError {
    term: Term,
}

impl OtpError {
    /// Wraps an arbitrary reason term.
    pub fn new(term: impl Into<Term>) -> Self {
        Self { term: term.into() }
    }

    /// `badarg`: the caller misused a synchronous API.
    pub fn badarg() -> Self {
        Self::new(reason::badarg())
    }

    /// `{badarg, Detail}`.
    pub fn badarg_with(detail: impl Into<Term>) -> Self {
        Self::new(Term::tuple([reason::badarg(), detail.into()]))
    }

    /// `noproc`: the target process does not exist or is dead.
    pub fn noproc() -> Self {
        Self::new(reason::noproc())
    }

    /// `noconnection`: the target node is unknown or unreachable.
    pub fn noconnection() -> Self {
        Self::new(reason::noconnection())
    }

    /// `timeout`: a bounded receive expired.
    pub fn timeout() -> Self {
        Self::new(reason::timeout())
    }

    /// `system_limit`: a configured capacity was exhausted.
    pub fn system_limit() -> Self {
        Self::new(reason::system_limit())
    }

    /// Returns the reason term.
    pub fn term(&self) -> &Term {
        &self.term
    }

    /// Consumes the error, returning the reason term.
    pub fn into_term(self) -> Term {
        self.term
    }

    /// Returns `true` if the reason is `tag` or a tuple tagged with `tag`.
    pub fn is(&self, tag: &str) -> bool {
        self.term.is_atom(tag) || self.term.is_tagged(tag)
    }

    /// Returns `true` for `badarg` and `{badarg, _}`.
    pub fn is_badarg(&self) -> bool {
        self.is("badarg")
    }

    /// Returns `true` for `noproc`.
    pub fn is_noproc(&self) -> bool {
        self.is("noproc")
    }

    /// Returns `true` for `noconnection`.
    pub fn is_noconnection(&self) -> bool {
        self.is("noconnection")
    }

    /// Returns `true` for `timeout`.
    pub fn is_timeout(&self) -> bool {
        self.is("timeout")
    }
}

impl From<Term> for OtpError {
    fn from(term: Term) -> Self {
        Self { term }
    }
}

impl From<OtpError> for Term {
    fn from(err: OtpError) -> Self {
        err.term
    }
}
