//! Model counting.
//!
//! [`sat_count`](Bdd::sat_count) counts satisfying assignments over an
//! explicit variable domain and returns an `f64`, which is exact up to 2^53
//! states and a close approximation beyond. [`sat_count_exact`] is the
//! arbitrary-precision variant for when the count itself is the answer.

use std::collections::HashMap;

use num_bigint::{BigUint, ToBigUint};

use crate::bdd::Bdd;
use crate::reference::Ref;
use crate::varset::VarSet;

impl Bdd {
    /// The number of assignments to `vars` that satisfy `f`.
    ///
    /// Every variable of `f`'s support must be in `vars`; variables in
    /// `vars` that `f` skips contribute a factor of two per skipped level.
    pub fn sat_count(&self, f: Ref, vars: &VarSet) -> f64 {
        assert!(
            self.support(f).difference(vars).is_empty(),
            "Counting domain does not cover the support of {}",
            f
        );

        if self.is_zero(f) {
            return 0.0;
        }
        if self.is_one(f) {
            return 2f64.powi(vars.len() as i32);
        }

        let labels = vars.labels();
        let mut cache = HashMap::new();
        let skipped = position(labels, self.variable(f.index()));
        2f64.powi(skipped as i32) * self.sat_count_rec(f, labels, &mut cache)
    }

    /// Count over the suffix of `labels` starting at `f`'s own level.
    ///
    /// The suffix is determined by `f`'s top variable, so the cache can be
    /// keyed on the handle alone. Complement edges are pushed into the
    /// cofactors by [`Bdd::top_cofactors`], so signed handles count
    /// correctly without a separate adjustment.
    fn sat_count_rec(&self, f: Ref, labels: &[u32], cache: &mut HashMap<Ref, f64>) -> f64 {
        if let Some(&count) = cache.get(&f) {
            return count;
        }

        let v = self.variable(f.index());
        let p = position(labels, v);
        let (f0, f1) = self.top_cofactors(f, v);

        let mut branch = |c: Ref| -> f64 {
            if self.is_zero(c) {
                0.0
            } else if self.is_one(c) {
                2f64.powi((labels.len() - p - 1) as i32)
            } else {
                let q = position(labels, self.variable(c.index()));
                2f64.powi((q - p - 1) as i32) * self.sat_count_rec(c, labels, cache)
            }
        };

        let count = branch(f0) + branch(f1);
        cache.insert(f, count);
        count
    }

    /// Exact satisfying-assignment count over the first `num_vars` variables.
    pub fn sat_count_exact(&self, f: Ref, num_vars: usize) -> BigUint {
        let mut cache = HashMap::new();
        let two = 2.to_biguint().unwrap();
        let max = two.pow(num_vars as u32);
        self.sat_count_exact_rec(f, &max, &mut cache)
    }

    fn sat_count_exact_rec(
        &self,
        f: Ref,
        max: &BigUint,
        cache: &mut HashMap<Ref, BigUint>,
    ) -> BigUint {
        if self.is_zero(f) {
            return BigUint::ZERO;
        }
        if self.is_one(f) {
            return max.clone();
        }

        if let Some(count) = cache.get(&f) {
            return count.clone();
        }

        let count_low = self.sat_count_exact_rec(self.low(f.index()), max, cache);
        let count_high = self.sat_count_exact_rec(self.high(f.index()), max, cache);

        let count: BigUint = (count_low + count_high) >> 1;
        let count = if f.is_negated() { max - count } else { count };

        cache.insert(f, count.clone());
        count
    }
}

fn position(labels: &[u32], v: u32) -> usize {
    labels
        .binary_search(&v)
        .unwrap_or_else(|_| panic!("Variable x{} is not in the counting domain", v))
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_sat_count_terminal() {
        let bdd = Bdd::default();
        let vs = VarSet::new([1, 2, 3]);

        assert_eq!(bdd.sat_count(bdd.zero(), &vs), 0.0);
        assert_eq!(bdd.sat_count(bdd.one(), &vs), 8.0);
        assert_eq!(bdd.sat_count(bdd.one(), &VarSet::default()), 1.0);
    }

    #[test]
    fn test_sat_count_var() {
        let bdd = Bdd::default();

        let x1 = bdd.mk_var(1);
        assert_eq!(bdd.sat_count(x1, &VarSet::new([1])), 1.0);
        assert_eq!(bdd.sat_count(x1, &VarSet::new([1, 2])), 2.0);
        assert_eq!(bdd.sat_count(-x1, &VarSet::new([1, 2])), 2.0);

        // Skipped variables below and above the node both double the count.
        let x2 = bdd.mk_var(2);
        assert_eq!(bdd.sat_count(x2, &VarSet::new([1, 2, 3])), 4.0);
    }

    #[test]
    fn test_sat_count_conjunction() {
        let bdd = Bdd::default();

        let f = bdd.apply_and(bdd.mk_var(1), bdd.mk_var(2));
        assert_eq!(bdd.sat_count(f, &VarSet::new([1, 2])), 1.0);
        assert_eq!(bdd.sat_count(f, &VarSet::new([1, 2, 3, 4, 5])), 8.0);
        assert_eq!(bdd.sat_count(-f, &VarSet::new([1, 2, 3, 4, 5])), 24.0);
    }

    #[test]
    fn test_sat_count_clause() {
        let bdd = Bdd::default();

        let f = bdd.apply_or(bdd.mk_var(1), bdd.mk_var(2));
        assert_eq!(bdd.sat_count(f, &VarSet::new([1, 2])), 3.0);
        assert_eq!(bdd.sat_count(f, &VarSet::new([1, 2, 3])), 6.0);
    }

    #[test]
    #[should_panic(expected = "does not cover")]
    fn test_sat_count_rejects_narrow_domain() {
        let bdd = Bdd::default();
        let f = bdd.apply_and(bdd.mk_var(1), bdd.mk_var(2));
        bdd.sat_count(f, &VarSet::new([1]));
    }

    #[test]
    fn test_sat_count_exact() {
        let bdd = Bdd::default();

        let f = bdd.apply_and(bdd.mk_var(1), bdd.mk_var(2));
        assert_eq!(bdd.sat_count_exact(f, 2), 1.to_biguint().unwrap());
        assert_eq!(bdd.sat_count_exact(f, 5), 8.to_biguint().unwrap());
        assert_eq!(bdd.sat_count_exact(-f, 2), 3.to_biguint().unwrap());

        // Exact and floating counts agree while the count fits in f64.
        let g = bdd.apply_xor(bdd.mk_var(1), bdd.mk_var(3));
        let vs = VarSet::new([1, 2, 3]);
        assert_eq!(
            bdd.sat_count_exact(g, 3).to_string(),
            format!("{}", bdd.sat_count(g, &vs) as u64)
        );
    }
}
