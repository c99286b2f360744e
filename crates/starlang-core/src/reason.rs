//! Well-known exit reasons and message tags.
//!
//! Exit reasons are ordinary [`Term`]s. The runtime gives a handful of atoms
//! special meaning:
//!
//! - `normal`: the process body returned successfully
//! - `kill`: untrappable exit trigger, never stored as a reason
//! - `killed`: what a `kill` turns into once it terminates a process
//! - `noproc`: the target did not exist
//! - `noconnection`: the target node is not reachable
//!
//! # Examples
//!
//! ```
//! use starlang_core::reason;
//!
//! assert!(reason::is_kill(&reason::kill()));
//! assert_eq!(reason::untrappable(reason::kill()), reason::killed());
//! assert_eq!(reason::untrappable(reason::normal()), reason::normal());
//! ```

use crate::Term;

/// `normal`
pub fn normal() -> Term {
    Term::atom("normal")
}

/// `kill`
pub fn kill() -> Term {
    Term::atom("kill")
}

/// `killed`
pub fn killed() -> Term {
    Term::atom("killed")
}

/// `shutdown`
pub fn shutdown() -> Term {
    Term::atom("shutdown")
}

/// `noproc`
pub fn noproc() -> Term {
    Term::atom("noproc")
}

/// `noconnection`
pub fn noconnection() -> Term {
    Term::atom("noconnection")
}

/// `nodedown`
pub fn nodedown() -> Term {
    Term::atom("nodedown")
}

/// `timeout`
pub fn timeout() -> Term {
    Term::atom("timeout")
}

/// `badarg`
pub fn badarg() -> Term {
    Term::atom("badarg")
}

/// `system_limit`
pub fn system_limit() -> Term {
    Term::atom("system_limit")
}

/// Returns `true` for `normal`.
pub fn is_normal(reason: &Term) -> bool {
    reason.is_atom("normal")
}

/// Returns `true` for `kill`.
pub fn is_kill(reason: &Term) -> bool {
    reason.is_atom("kill")
}

/// Maps `kill` to `killed` and leaves everything else alone.
///
/// A process terminated by `kill` reports `killed` to its own links and
/// monitors, so a kill never cascades as another untrappable kill.
pub fn untrappable(reason: Term) -> Term {
    if is_kill(&reason) {
        killed()
    } else {
        reason
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates() {
        assert!(is_normal(&normal()));
        assert!(!is_normal(&shutdown()));
        assert!(is_kill(&kill()));
        assert!(!is_kill(&killed()));
    }

    #[test]
    fn test_untrappable_passes_custom_reasons() {
        let custom = Term::from("custom");
        assert_eq!(untrappable(custom.clone()), custom);
        assert_eq!(untrappable(kill()), killed());
    }
}
