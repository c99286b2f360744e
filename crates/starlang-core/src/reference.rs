//! Unique reference type.
//!
//! A [`Ref`] correlates a monitor with its `DOWN` message, or a request with
//! its reply. It has the same shape and ordering rules as [`Pid`](crate::Pid)
//! but is a distinct type, so the two can never be confused.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A unique reference.
///
/// # Examples
///
/// ```
/// use starlang_core::Ref;
///
/// let r1 = Ref::from_counter(1, 0);
/// let r2 = Ref::from_counter(2, 0);
/// assert_ne!(r1, r2);
/// assert!(r1 < r2);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ref {
    node: u32,
    id: u32,
    serial: u32,
    creation: u32,
}

impl Ref {
    /// Creates a `Ref` from its raw parts.
    pub const fn new(node: u32, id: u32, serial: u32, creation: u32) -> Self {
        Self {
            node,
            id,
            serial,
            creation,
        }
    }

    /// Builds a local reference from a monotonic 64-bit counter value.
    ///
    /// The high half becomes `id` and the low half `serial`, so references
    /// from one counter order the same way the counter does.
    pub const fn from_counter(value: u64, creation: u32) -> Self {
        Self::new(0, (value >> 32) as u32, value as u32, creation)
    }

    /// Returns the node index.
    #[inline]
    pub const fn node(&self) -> u32 {
        self.node
    }

    /// Returns the high counter half.
    #[inline]
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Returns the low counter half.
    #[inline]
    pub const fn serial(&self) -> u32 {
        self.serial
    }

    /// Returns the creation number.
    #[inline]
    pub const fn creation(&self) -> u32 {
        self.creation
    }

    /// Returns `true` if the reference was made on the local node.
    #[inline]
    pub const fn is_local(&self) -> bool {
        self.node == 0
    }
}

impl fmt::Debug for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ref<{}.{}.{}.{}>",
            self.node, self.id, self.serial, self.creation
        )
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#Ref<{}.{}.{}>", self.node, self.id, self.serial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ref_display() {
        let r = Ref::new(0, 123, 0, 1);
        assert_eq!(format!("{}", r), "#Ref<0.123.0>");
        assert_eq!(format!("{:?}", r), "Ref<0.123.0.1>");
    }

    #[test]
    fn test_counter_split() {
        let r = Ref::from_counter((7u64 << 32) | 9, 2);
        assert_eq!(r.id(), 7);
        assert_eq!(r.serial(), 9);
        assert_eq!(r.creation(), 2);
        assert!(r.is_local());
    }

    #[test]
    fn test_ref_serialization() {
        let r = Ref::new(1, 999, 3, 0);
        let bytes = postcard::to_allocvec(&r).unwrap();
        let decoded: Ref = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(r, decoded);
    }

    #[test]
    fn test_ref_hash() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        let r1 = Ref::from_counter(1, 0);
        let r2 = Ref::from_counter(2, 0);

        map.insert(r1, "first");
        map.insert(r2, "second");

        assert_eq!(map.get(&r1), Some(&"first"));
        assert_eq!(map.get(&r2), Some(&"second"));
    }

    proptest! {
        #[test]
        fn counter_order_is_preserved(a in any::<u64>(), b in any::<u64>()) {
            let ra = Ref::from_counter(a, 0);
            let rb = Ref::from_counter(b, 0);
            prop_assert_eq!(a == b, ra == rb);
            prop_assert_eq!(a.cmp(&b), ra.cmp(&rb));
        }
    }
}
