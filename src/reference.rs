use std::fmt::{Display, Formatter};
use std::ops::Neg;

use crate::utils::{pairing2, MyHash};

/// A complemented-edge reference to a node in the manager's table.
///
/// The sign encodes negation: `-f` is the boolean complement of `f`, shared
/// with the same underlying node. Because nodes are hash-consed, two `Ref`s
/// are equal if and only if they denote the same boolean function.
///
/// A `Ref` by itself does not keep the node alive. It is the non-owning,
/// argument-only view; anything held across an operation that may trigger
/// garbage collection must go through [`Func`](crate::func::Func) or an
/// explicit [`Bdd::ref_node`](crate::bdd::Bdd::ref_node).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Ref(i32);

impl Ref {
    pub(crate) const fn positive(index: u32) -> Self {
        Self(index as i32)
    }

    pub const fn is_negated(self) -> bool {
        self.0 < 0
    }

    pub const fn negate(self) -> Self {
        Self(-self.0)
    }

    /// Index of the underlying node in the table.
    pub const fn index(self) -> usize {
        self.0.unsigned_abs() as usize
    }

    /// Sign-folded representation, suitable as a hash key.
    pub(crate) const fn as_key(self) -> u64 {
        ((self.0.unsigned_abs() << 1) | (self.0 < 0) as u32) as u64
    }
}

impl MyHash for Ref {
    fn hash(&self) -> u64 {
        self.as_key()
    }
}

impl MyHash for (Ref, Ref) {
    fn hash(&self) -> u64 {
        pairing2(self.0.as_key(), self.1.as_key())
    }
}

impl Neg for Ref {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negate()
    }
}

impl Display for Ref {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}@{}",
            if self.is_negated() { "~" } else { "" },
            self.index()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negation_involution() {
        let f = Ref::positive(42);
        assert_eq!(-(-f), f);
        assert!((-f).is_negated());
        assert_eq!((-f).index(), f.index());
    }

    #[test]
    fn test_key_distinguishes_sign() {
        let f = Ref::positive(7);
        assert_ne!(f.as_key(), (-f).as_key());
    }

    #[test]
    fn test_display() {
        let f = Ref::positive(5);
        assert_eq!(f.to_string(), "@5");
        assert_eq!((-f).to_string(), "~@5");
    }
}
