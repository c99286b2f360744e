//! Term patterns and compiled receive predicates.
//!
//! A [`Pattern`] describes the shape of a term. Compiling it yields a
//! [`Predicate`], a shared [`Matcher`] that mailboxes use to pick messages
//! out of order:
//!
//! ```
//! use starlang_core::pattern::{compile, Pattern};
//! use starlang_core::{Pid, Term};
//!
//! // {'EXIT', _, Reason}
//! let pattern = Pattern::tuple([
//!     Pattern::literal(Term::atom("EXIT")),
//!     Pattern::Wildcard,
//!     Pattern::capture("Reason"),
//! ]);
//! let predicate = compile(&pattern);
//!
//! let msg = Term::tuple([
//!     Term::atom("EXIT"),
//!     Pid::local(1, 0, 0).into(),
//!     Term::atom("killed"),
//! ]);
//! assert!(predicate.matches(&msg));
//!
//! let bindings = pattern.bind(&msg).unwrap();
//! assert_eq!(bindings["Reason"], Term::atom("killed"));
//! ```
//!
//! Closures implement [`Matcher`] too, so ad-hoc predicates need no pattern.

use crate::Term;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Something that accepts or rejects a term.
pub trait Matcher: Send + Sync {
    /// Returns `true` if `term` is accepted.
    fn matches(&self, term: &Term) -> bool;
}

impl<F> Matcher for F
where
    F: Fn(&Term) -> bool + Send + Sync,
{
    fn matches(&self, term: &Term) -> bool {
        self(term)
    }
}

/// A shared, type-erased matcher.
pub type Predicate = Arc<dyn Matcher>;

/// Returns a predicate that accepts every term.
pub fn any() -> Predicate {
    Arc::new(|_: &Term| true)
}

/// Capture bindings produced by [`Pattern::bind`].
pub type Bindings = BTreeMap<String, Term>;

/// The shape of a term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// Matches a term equal to the literal.
    Literal(Term),
    /// Matches anything.
    Wildcard,
    /// Matches anything and binds it to a name. A name used more than once
    /// in the same pattern must bind equal terms.
    Capture(String),
    /// Matches a tuple of exactly this arity, element by element.
    Tuple(Vec<Pattern>),
    /// Matches a list of exactly this length, element by element.
    List(Vec<Pattern>),
}

impl Pattern {
    /// Literal pattern.
    pub fn literal(term: impl Into<Term>) -> Self {
        Pattern::Literal(term.into())
    }

    /// Capture pattern.
    pub fn capture(name: impl Into<String>) -> Self {
        Pattern::Capture(name.into())
    }

    /// Tuple pattern.
    pub fn tuple(elements: impl IntoIterator<Item = Pattern>) -> Self {
        Pattern::Tuple(elements.into_iter().collect())
    }

    /// List pattern.
    pub fn list(elements: impl IntoIterator<Item = Pattern>) -> Self {
        Pattern::List(elements.into_iter().collect())
    }

    /// Matches `term`, returning the capture bindings on success.
    pub fn bind(&self, term: &Term) -> Option<Bindings> {
        let mut bindings = Bindings::new();
        self.bind_into(term, &mut bindings).then_some(bindings)
    }

    fn bind_into(&self, term: &Term, bindings: &mut Bindings) -> bool {
        match (self, term) {
            (Pattern::Wildcard, _) => true,
            (Pattern::Literal(expected), actual) => expected == actual,
            (Pattern::Capture(name), actual) => match bindings.get(name) {
                Some(bound) => bound == actual,
                None => {
                    bindings.insert(name.clone(), actual.clone());
                    true
                }
            },
            (Pattern::Tuple(patterns), Term::Tuple(elements))
            | (Pattern::List(patterns), Term::List(elements)) => {
                patterns.len() == elements.len()
                    && patterns
                        .iter()
                        .zip(elements)
                        .all(|(pattern, element)| pattern.bind_into(element, bindings))
            }
            _ => false,
        }
    }

    fn has_captures(&self) -> bool {
        match self {
            Pattern::Capture(_) => true,
            Pattern::Tuple(patterns) | Pattern::List(patterns) => {
                patterns.iter().any(Pattern::has_captures)
            }
            Pattern::Literal(_) | Pattern::Wildcard => false,
        }
    }

    fn matches_without_bindings(&self, term: &Term) -> bool {
        match (self, term) {
            (Pattern::Wildcard, _) | (Pattern::Capture(_), _) => true,
            (Pattern::Literal(expected), actual) => expected == actual,
            (Pattern::Tuple(patterns), Term::Tuple(elements))
            | (Pattern::List(patterns), Term::List(elements)) => {
                patterns.len() == elements.len()
                    && patterns
                        .iter()
                        .zip(elements)
                        .all(|(pattern, element)| pattern.matches_without_bindings(element))
            }
            _ => false,
        }
    }
}

impl Matcher for Pattern {
    fn matches(&self, term: &Term) -> bool {
        if self.has_captures() {
            self.bind(term).is_some()
        } else {
            self.matches_without_bindings(term)
        }
    }
}

/// Compiles a pattern into a shareable predicate.
pub fn compile(pattern: &Pattern) -> Predicate {
    Arc::new(pattern.clone())
}

/// Compiled predicates keyed by pattern identity.
///
/// Two structurally equal patterns held in different `Arc`s are compiled
/// separately. The cache keeps each pattern alive so its address cannot be
/// reused by a different pattern while the entry exists.
#[derive(Default)]
pub struct PatternCache {
    compiled: DashMap<usize, (Arc<Pattern>, Predicate)>,
}

impl PatternCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the predicate for `pattern`, compiling it on first use.
    pub fn get(&self, pattern: &Arc<Pattern>) -> Predicate {
        let key = Arc::as_ptr(pattern) as usize;
        self.compiled
            .entry(key)
            .or_insert_with(|| (pattern.clone(), compile(pattern)))
            .1
            .clone()
    }

    /// Drops the compiled predicate for `pattern`.
    pub fn evict(&self, pattern: &Arc<Pattern>) {
        self.compiled.remove(&(Arc::as_ptr(pattern) as usize));
    }

    /// Number of cached predicates.
    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }
}

impl std::fmt::Debug for PatternCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternCache")
            .field("len", &self.compiled.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Pid, Ref};

    fn down(reference: Ref, reason: &str) -> Term {
        Term::tuple([
            Term::atom("DOWN"),
            reference.into(),
            Term::atom("process"),
            Pid::local(4, 0, 0).into(),
            Term::atom(reason),
        ])
    }

    #[test]
    fn test_literal_and_wildcard() {
        assert!(Pattern::Wildcard.matches(&Term::Int(1)));
        assert!(Pattern::literal(Term::atom("ok")).matches(&Term::atom("ok")));
        assert!(!Pattern::literal(Term::atom("ok")).matches(&Term::atom("error")));
    }

    #[test]
    fn test_tuple_arity_must_match() {
        let pattern = Pattern::tuple([Pattern::Wildcard, Pattern::Wildcard]);
        assert!(pattern.matches(&Term::tuple([Term::Int(1), Term::Int(2)])));
        assert!(!pattern.matches(&Term::tuple([Term::Int(1)])));
        assert!(!pattern.matches(&Term::list([Term::Int(1), Term::Int(2)])));
    }

    #[test]
    fn test_match_specific_monitor_ref() {
        let wanted = Ref::from_counter(10, 0);
        let other = Ref::from_counter(11, 0);
        let pattern = Pattern::tuple([
            Pattern::literal(Term::atom("DOWN")),
            Pattern::literal(wanted),
            Pattern::Wildcard,
            Pattern::Wildcard,
            Pattern::capture("Reason"),
        ]);

        assert!(pattern.matches(&down(wanted, "normal")));
        assert!(!pattern.matches(&down(other, "normal")));

        let bindings = pattern.bind(&down(wanted, "killed")).unwrap();
        assert_eq!(bindings.get("Reason"), Some(&Term::atom("killed")));
    }

    #[test]
    fn test_repeated_capture_requires_equal_values() {
        let pattern = Pattern::tuple([Pattern::capture("X"), Pattern::capture("X")]);
        assert!(pattern.matches(&Term::tuple([Term::Int(3), Term::Int(3)])));
        assert!(!pattern.matches(&Term::tuple([Term::Int(3), Term::Int(4)])));
    }

    #[test]
    fn test_nested_list() {
        let pattern = Pattern::list([Pattern::literal(Term::Int(1)), Pattern::list([])]);
        assert!(pattern.matches(&Term::list([Term::Int(1), Term::nil()])));
        assert!(!pattern.matches(&Term::list([Term::Int(1)])));
    }

    #[test]
    fn test_closure_is_a_matcher() {
        let predicate: Predicate = Arc::new(|t: &Term| t.as_int().is_some_and(|n| n > 5));
        assert!(predicate.matches(&Term::Int(6)));
        assert!(!predicate.matches(&Term::Int(5)));
        assert!(any().matches(&Term::nil()));
    }

    #[test]
    fn test_cache_is_keyed_by_identity() {
        let cache = PatternCache::new();
        let a = Arc::new(Pattern::literal(Term::atom("a")));
        let a_again = a.clone();
        let a_twin = Arc::new(Pattern::literal(Term::atom("a")));

        let first = cache.get(&a);
        let second = cache.get(&a_again);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        cache.get(&a_twin);
        assert_eq!(cache.len(), 2);

        cache.evict(&a);
        assert_eq!(cache.len(), 1);
    }
}
