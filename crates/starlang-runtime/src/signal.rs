//! Signals exchanged between processes.
//!
//! Every interaction between processes (messages, links, monitors, exits)
//! travels as a [`Signal`] addressed to a [`Dest`]. Local signals are queued
//! on the node's dispatcher; signals for other nodes are wrapped in a
//! routing envelope and handed to the router process for that node:
//!
//! ```text
//! {route, From, To, Signal}
//!
//! To     = Pid | Name | {Name, Node}
//! Signal = {relay, Msg} | link | unlink | {monitor, Ref} | {demonitor, Ref}
//!        | {exit, Reason} | {down, Ref, Reason}
//! ```

use starlang_core::{Atom, Pid, Ref, Term};
use std::fmt;

/// A signal sent from one process to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// Deliver a message to the target's mailbox.
    Relay(Term),
    /// The sender links to the target.
    Link,
    /// The sender removes its link to the target.
    Unlink,
    /// The sender starts monitoring the target under this reference.
    Monitor(Ref),
    /// The sender stops monitoring the target.
    Demonitor(Ref),
    /// Exit signal carrying a reason.
    Exit(Term),
    /// A monitored process terminated.
    Down(Ref, Term),
}

impl Signal {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Signal::Relay(_) => "relay",
            Signal::Link => "link",
            Signal::Unlink => "unlink",
            Signal::Monitor(_) => "monitor",
            Signal::Demonitor(_) => "demonitor",
            Signal::Exit(_) => "exit",
            Signal::Down(_, _) => "down",
        }
    }

    /// Encodes the signal for a routing envelope.
    pub fn to_term(&self) -> Term {
        match self {
            Signal::Relay(message) => Term::tuple([Term::atom("relay"), message.clone()]),
            Signal::Link => Term::atom("link"),
            Signal::Unlink => Term::atom("unlink"),
            Signal::Monitor(reference) => Term::tuple([Term::atom("monitor"), (*reference).into()]),
            Signal::Demonitor(reference) => {
                Term::tuple([Term::atom("demonitor"), (*reference).into()])
            }
            Signal::Exit(reason) => Term::tuple([Term::atom("exit"), reason.clone()]),
            Signal::Down(reference, reason) => Term::tuple([
                Term::atom("down"),
                (*reference).into(),
                reason.clone(),
            ]),
        }
    }

    /// Decodes a signal produced by [`to_term`](Self::to_term).
    pub fn from_term(term: &Term) -> Option<Self> {
        if let Some(name) = term.as_atom() {
            return match name.as_str() {
                "link" => Some(Signal::Link),
                "unlink" => Some(Signal::Unlink),
                _ => None,
            };
        }

        match term.as_tuple()? {
            [tag, message] if tag.is_atom("relay") => Some(Signal::Relay(message.clone())),
            [tag, reference] if tag.is_atom("monitor") => {
                Some(Signal::Monitor(reference.as_reference()?))
            }
            [tag, reference] if tag.is_atom("demonitor") => {
                Some(Signal::Demonitor(reference.as_reference()?))
            }
            [tag, reason] if tag.is_atom("exit") => Some(Signal::Exit(reason.clone())),
            [tag, reference, reason] if tag.is_atom("down") => {
                Some(Signal::Down(reference.as_reference()?, reason.clone()))
            }
            _ => None,
        }
    }
}

/// Where a signal is going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dest {
    /// A process, local or remote.
    Pid(Pid),
    /// A name registered on the local node.
    Name(Atom),
    /// A name registered on a named node.
    Remote(Atom, Atom),
}

impl Dest {
    /// Encodes the destination for a routing envelope.
    pub fn to_term(&self) -> Term {
        match self {
            Dest::Pid(pid) => (*pid).into(),
            Dest::Name(name) => (*name).into(),
            Dest::Remote(name, node) => Term::tuple([(*name).into(), (*node).into()]),
        }
    }

    /// Decodes a destination produced by [`to_term`](Self::to_term).
    pub fn from_term(term: &Term) -> Option<Self> {
        match term {
            Term::Pid(pid) => Some(Dest::Pid(*pid)),
            Term::Atom(name) => Some(Dest::Name(*name)),
            Term::Tuple(elements) => match elements.as_slice() {
                [Term::Atom(name), Term::Atom(node)] => Some(Dest::Remote(*name, *node)),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for Dest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_term(), f)
    }
}

impl From<Pid> for Dest {
    fn from(pid: Pid) -> Self {
        Dest::Pid(pid)
    }
}

impl From<Atom> for Dest {
    fn from(name: Atom) -> Self {
        Dest::Name(name)
    }
}

impl From<&str> for Dest {
    fn from(name: &str) -> Self {
        Dest::Name(Atom::new(name))
    }
}

impl From<(Atom, Atom)> for Dest {
    fn from((name, node): (Atom, Atom)) -> Self {
        Dest::Remote(name, node)
    }
}

impl From<(&str, &str)> for Dest {
    fn from((name, node): (&str, &str)) -> Self {
        Dest::Remote(Atom::new(name), Atom::new(node))
    }
}

/// A signal that arrived inside a routing envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routed {
    /// The sending process.
    pub from: Pid,
    /// The destination on the receiving node.
    pub to: Dest,
    /// The signal itself.
    pub signal: Signal,
}

impl Routed {
    /// Builds the `{route, From, To, Signal}` envelope.
    pub fn to_term(&self) -> Term {
        Term::tuple([
            Term::atom("route"),
            self.from.into(),
            self.to.to_term(),
            self.signal.to_term(),
        ])
    }

    /// Parses a `{route, From, To, Signal}` envelope.
    pub fn from_term(term: &Term) -> Option<Self> {
        match term.as_tuple()? {
            [tag, from, to, signal] if tag.is_atom("route") => Some(Self {
                from: from.as_pid()?,
                to: Dest::from_term(to)?,
                signal: Signal::from_term(signal)?,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_terms() {
        let reference = Ref::from_counter(3, 1);
        let signals = [
            Signal::Relay(Term::from("hello")),
            Signal::Link,
            Signal::Unlink,
            Signal::Monitor(reference),
            Signal::Demonitor(reference),
            Signal::Exit(Term::atom("shutdown")),
            Signal::Down(reference, Term::atom("normal")),
        ];
        for signal in signals {
            assert_eq!(Signal::from_term(&signal.to_term()), Some(signal));
        }
    }

    #[test]
    fn test_malformed_signal_terms() {
        assert_eq!(Signal::from_term(&Term::atom("bogus")), None);
        assert_eq!(
            Signal::from_term(&Term::tuple([Term::atom("monitor"), Term::Int(1)])),
            None
        );
        assert_eq!(Signal::from_term(&Term::Int(0)), None);
    }

    #[test]
    fn test_dest_conversions() {
        assert_eq!(Dest::from("logger"), Dest::Name(Atom::new("logger")));
        assert_eq!(
            Dest::from(("logger", "b@host")),
            Dest::Remote(Atom::new("logger"), Atom::new("b@host"))
        );
        assert_eq!(Dest::from("logger").to_string(), "logger");
    }

    #[test]
    fn test_routing_envelope() {
        let routed = Routed {
            from: Pid::local(7, 2, 1),
            to: Dest::Pid(Pid::new(1, 4, 0, 9)),
            signal: Signal::Exit(Term::atom("kill")),
        };
        let envelope = routed.to_term();
        assert!(envelope.is_tagged("route"));
        assert_eq!(Routed::from_term(&envelope), Some(routed));
        assert_eq!(Routed::from_term(&Term::atom("route")), None);
    }
}
