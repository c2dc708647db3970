//! Sets of variable labels and their canonical diagram encoding.
//!
//! Quantification, relational products and model counting all take a "set of
//! variables" argument. [`VarSet`] is the semantic type for such sets; the
//! diagram-shaped representation (a disjunction chain of the variables) only
//! appears at the two conversion points, [`Bdd::mk_set`] and
//! [`Bdd::parse_set`].

use std::fmt::{Display, Formatter};

use crate::bdd::Bdd;
use crate::func::Func;
use crate::reference::Ref;
use crate::utils::pairing2;

/// An ordered set of 1-indexed variable labels.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VarSet {
    labels: Vec<u32>,
}

impl VarSet {
    /// Build a set from arbitrary labels: sorted, deduplicated.
    pub fn new(labels: impl IntoIterator<Item = u32>) -> Self {
        let mut labels: Vec<u32> = labels.into_iter().collect();
        labels.sort_unstable();
        labels.dedup();
        assert!(
            labels.first() != Some(&0),
            "Variable index should not be zero"
        );
        Self { labels }
    }

    /// Labels in ascending order.
    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn contains(&self, label: u32) -> bool {
        self.labels.binary_search(&label).is_ok()
    }

    pub fn max(&self) -> Option<u32> {
        self.labels.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.labels.iter().copied()
    }

    /// Labels of `self` that are not in `other`.
    pub fn difference(&self, other: &VarSet) -> VarSet {
        VarSet {
            labels: self
                .labels
                .iter()
                .copied()
                .filter(|&v| !other.contains(v))
                .collect(),
        }
    }

    pub fn union(&self, other: &VarSet) -> VarSet {
        VarSet::new(self.iter().chain(other.iter()))
    }

    /// Order-sensitive fingerprint, used as part of operation cache keys.
    pub(crate) fn fingerprint(&self) -> u64 {
        self.labels
            .iter()
            .fold(0u64, |acc, &v| pairing2(acc, v as u64 + 1))
    }
}

impl FromIterator<u32> for VarSet {
    fn from_iter<T: IntoIterator<Item = u32>>(iter: T) -> Self {
        VarSet::new(iter)
    }
}

impl Display for VarSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, v) in self.labels.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "x{}", v)?;
        }
        write!(f, "}}")
    }
}

/// Error returned when a diagram does not have the canonical label-set
/// chain shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotAVarSet(pub Ref);

impl Display for NotAVarSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} is not a variable set", self.0)
    }
}

impl std::error::Error for NotAVarSet {}

impl Bdd {
    /// Encode a label set as its canonical diagram: the disjunction of the
    /// variables, a single else-chain ending in `false`.
    ///
    /// Intermediate values are protected while the chain is built. The final
    /// result is deliberately returned *unreferenced*; the caller must
    /// reference it if it is to be retained across further operations.
    pub fn mk_set(&self, vars: &VarSet) -> Ref {
        let mut result = self.zero();
        for v in vars.iter() {
            // Protect the chain so far before mk_var gets a chance to
            // collect.
            let old = Func::new(self, result);
            let var = Func::new(self, self.mk_var(v));
            result = self.apply_or(old.node(), var.node());
        }
        result
    }

    /// Decode a canonical label-set chain back into a [`VarSet`].
    ///
    /// Walks the else-chain; every link must have a `true` then-branch and
    /// the chain must end in `false`. Anything else is a shape error, not a
    /// different set.
    pub fn parse_set(&self, set: Ref) -> Result<VarSet, NotAVarSet> {
        let mut labels = Vec::new();
        let mut current = set;
        while !self.is_zero(current) {
            if self.is_one(current) || !self.is_one(self.high_node(current)) {
                return Err(NotAVarSet(set));
            }
            labels.push(self.variable(current.index()));
            current = self.low_node(current);
        }
        Ok(VarSet::new(labels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varset_normalization() {
        let s = VarSet::new([5, 1, 3, 3, 1]);
        assert_eq!(s.labels(), &[1, 3, 5]);
        assert_eq!(s.len(), 3);
        assert!(s.contains(3));
        assert!(!s.contains(2));
        assert_eq!(s.max(), Some(5));
    }

    #[test]
    fn test_varset_difference_union() {
        let a = VarSet::new([1, 2, 3, 4]);
        let b = VarSet::new([2, 4]);
        assert_eq!(a.difference(&b), VarSet::new([1, 3]));
        assert_eq!(b.union(&a), a);
    }

    #[test]
    fn test_roundtrip() {
        let bdd = Bdd::default();

        let s = VarSet::new([2, 5, 9]);
        let encoded = bdd.mk_set(&s);
        assert_eq!(bdd.parse_set(encoded), Ok(s.clone()));

        // Encoding is idempotent up to handle identity.
        assert_eq!(bdd.mk_set(&s), encoded);

        // Construction order does not matter.
        assert_eq!(bdd.mk_set(&VarSet::new([9, 2, 5])), encoded);
    }

    #[test]
    fn test_empty_set() {
        let bdd = Bdd::default();

        let s = VarSet::default();
        assert_eq!(bdd.mk_set(&s), bdd.zero());
        assert_eq!(bdd.parse_set(bdd.zero()), Ok(s));
    }

    #[test]
    fn test_encode_is_disjunction() {
        let bdd = Bdd::default();

        let s = VarSet::new([1, 2, 3]);
        let chain = bdd.mk_set(&s);
        let folded = bdd.apply_or(
            bdd.apply_or(bdd.mk_var(1), bdd.mk_var(2)),
            bdd.mk_var(3),
        );
        assert_eq!(chain, folded);
    }

    #[test]
    fn test_mk_set_leaves_refcount_balanced() {
        let bdd = Bdd::default();
        let _ = bdd.mk_set(&VarSet::new([1, 2, 3, 4]));
        // The result is returned unreferenced and every intermediate has
        // been released.
        assert_eq!(bdd.count_refs(), 0);
    }

    #[test]
    fn test_parse_rejects_non_chains() {
        let bdd = Bdd::default();

        assert!(bdd.parse_set(bdd.one()).is_err());

        // A conjunction is not a chain: its then-branch is not `true`.
        let cube = bdd.cube([1, 2]);
        assert!(bdd.parse_set(cube).is_err());

        // Neither is a negated chain.
        let set = bdd.mk_set(&VarSet::new([1, 2]));
        assert!(bdd.parse_set(-set).is_err());
    }
}
