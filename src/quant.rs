//! Quantification over variable sets.
//!
//! Existential quantification is the workhorse of the relational product;
//! universal quantification and projection are derived from it. The fused
//! [`and_exists`](Bdd::and_exists) avoids materializing the conjunction that
//! `exists(and(f, g), V)` would build.

use std::collections::HashSet;

use log::debug;

use crate::bdd::{Bdd, OpKey};
use crate::reference::Ref;
use crate::varset::VarSet;

impl Bdd {
    /// Existential quantification: `∃ vars. f`.
    pub fn exists(&self, f: Ref, vars: &VarSet) -> Ref {
        self.maybe_collect();
        self.exists_rec(f, vars.labels(), vars.fingerprint())
    }

    /// Universal quantification: `∀ vars. f`, as `¬∃ vars. ¬f`.
    pub fn forall(&self, f: Ref, vars: &VarSet) -> Ref {
        self.maybe_collect();
        -self.exists_rec(-f, vars.labels(), vars.fingerprint())
    }

    /// Quantify away every variable of `f` *not* in `keep`.
    pub fn project(&self, f: Ref, keep: &VarSet) -> Ref {
        let drop = self.support(f).difference(keep);
        self.maybe_collect();
        self.exists_rec(f, drop.labels(), drop.fingerprint())
    }

    /// Fused `∃ vars. (f ∧ g)` without building the conjunction.
    pub fn and_exists(&self, f: Ref, g: Ref, vars: &VarSet) -> Ref {
        self.maybe_collect();
        self.and_exists_rec(f, g, vars.labels(), vars.fingerprint())
    }

    pub(crate) fn exists_rec(&self, f: Ref, vars: &[u32], fp: u64) -> Ref {
        if self.is_terminal(f) || vars.is_empty() {
            return f;
        }

        let v = self.variable(f.index());
        // Quantified variables above f's top variable are don't-cares.
        let vars = skip_below(vars, v);
        if vars.is_empty() {
            return f;
        }

        // The remaining suffix is determined by (f, original set), so the
        // full fingerprint stays a sound cache key.
        let key = OpKey::Exists(f, fp);
        if let Some(&res) = self.cache.borrow().get(&key) {
            return res;
        }

        let (f0, f1) = self.top_cofactors(f, v);
        let res = if vars[0] == v {
            let rest = &vars[1..];
            let r0 = self.exists_rec(f0, rest, fp);
            if self.is_one(r0) {
                self.one()
            } else {
                let r1 = self.exists_rec(f1, rest, fp);
                self.ite_rec(r0, self.one(), r1)
            }
        } else {
            let e = self.exists_rec(f0, vars, fp);
            let t = self.exists_rec(f1, vars, fp);
            self.mk_node(v, e, t)
        };
        debug!("exists({}, {:?}) -> {}", f, vars, res);

        self.cache.borrow_mut().insert(&key, res);
        res
    }

    pub(crate) fn and_exists_rec(&self, f: Ref, g: Ref, vars: &[u32], fp: u64) -> Ref {
        if self.is_zero(f) || self.is_zero(g) {
            return self.zero();
        }
        if self.is_one(f) {
            return self.exists_rec(g, vars, fp);
        }
        if self.is_one(g) {
            return self.exists_rec(f, vars, fp);
        }
        if vars.is_empty() {
            return self.ite_rec(f, g, self.zero());
        }

        let vf = self.variable(f.index());
        let vg = self.variable(g.index());
        let v = vf.min(vg);
        let vars = skip_below(vars, v);
        if vars.is_empty() {
            return self.ite_rec(f, g, self.zero());
        }

        let key = OpKey::AndExists(f, g, fp);
        if let Some(&res) = self.cache.borrow().get(&key) {
            return res;
        }

        let (f0, f1) = self.top_cofactors(f, v);
        let (g0, g1) = self.top_cofactors(g, v);
        let res = if vars[0] == v {
            let rest = &vars[1..];
            let r0 = self.and_exists_rec(f0, g0, rest, fp);
            if self.is_one(r0) {
                self.one()
            } else {
                let r1 = self.and_exists_rec(f1, g1, rest, fp);
                self.ite_rec(r0, self.one(), r1)
            }
        } else {
            let e = self.and_exists_rec(f0, g0, vars, fp);
            let t = self.and_exists_rec(f1, g1, vars, fp);
            self.mk_node(v, e, t)
        };
        debug!("and_exists({}, {}, {:?}) -> {}", f, g, vars, res);

        self.cache.borrow_mut().insert(&key, res);
        res
    }

    /// The set of variables `f` depends on.
    pub fn support(&self, f: Ref) -> VarSet {
        let mut vars = HashSet::new();
        let mut visited = HashSet::new();
        visited.insert(self.one().index());
        let mut stack = vec![f.index()];

        while let Some(i) = stack.pop() {
            if visited.insert(i) {
                vars.insert(self.variable(i));
                stack.push(self.low(i).index());
                stack.push(self.high(i).index());
            }
        }

        VarSet::new(vars)
    }
}

/// Drop the leading labels strictly below `v`.
fn skip_below(vars: &[u32], v: u32) -> &[u32] {
    let start = vars.partition_point(|&x| x < v);
    &vars[start..]
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_exists_removes_quantified_conjunct() {
        let bdd = Bdd::default();

        let a = bdd.mk_var(1);
        let b = bdd.mk_var(2);
        let f = bdd.apply_and(a, b);

        // ∃a. (a ∧ b) == b, by handle identity.
        assert_eq!(bdd.exists(f, &VarSet::new([1])), b);
        assert_eq!(bdd.exists(f, &VarSet::new([2])), a);
        assert_eq!(bdd.exists(f, &VarSet::new([1, 2])), bdd.one());
    }

    #[test]
    fn test_exists_independent_set() {
        let bdd = Bdd::default();

        let f = bdd.apply_xor(bdd.mk_var(1), bdd.mk_var(3));
        assert_eq!(bdd.exists(f, &VarSet::new([2, 4])), f);
        assert_eq!(bdd.exists(f, &VarSet::default()), f);
    }

    #[test]
    fn test_exists_is_disjunction_of_cofactors() {
        let bdd = Bdd::default();

        let x1 = bdd.mk_var(1);
        let x2 = bdd.mk_var(2);
        let x3 = bdd.mk_var(3);
        let f = bdd.apply_ite(x1, x2, x3);

        // Shannon: ∃x1. f == f|x1=0 ∨ f|x1=1.
        assert_eq!(bdd.exists(f, &VarSet::new([1])), bdd.apply_or(x2, x3));
    }

    #[test]
    fn test_forall() {
        let bdd = Bdd::default();

        let a = bdd.mk_var(1);
        let b = bdd.mk_var(2);

        // ∀a. (a ∨ b) == b; ∀a. (a ∧ b) == 0.
        assert_eq!(bdd.forall(bdd.apply_or(a, b), &VarSet::new([1])), b);
        assert_eq!(
            bdd.forall(bdd.apply_and(a, b), &VarSet::new([1])),
            bdd.zero()
        );
        // Duality against exists.
        let f = bdd.apply_eq(a, b);
        let vs = VarSet::new([2]);
        assert_eq!(bdd.forall(f, &vs), -bdd.exists(-f, &vs));
    }

    #[test]
    fn test_project() {
        let bdd = Bdd::default();

        let a = bdd.mk_var(1);
        let b = bdd.mk_var(2);
        let c = bdd.mk_var(3);
        let f = bdd.apply_and(bdd.apply_and(a, b), c);

        // Keeping {1} quantifies out 2 and 3.
        assert_eq!(bdd.project(f, &VarSet::new([1])), a);
        // Keeping everything is the identity.
        assert_eq!(bdd.project(f, &VarSet::new([1, 2, 3])), f);
        // Labels in `keep` that f does not depend on are irrelevant.
        assert_eq!(bdd.project(f, &VarSet::new([1, 7])), a);
    }

    #[test]
    fn test_and_exists_matches_unfused() {
        let bdd = Bdd::default();

        let a = bdd.mk_var(1);
        let b = bdd.mk_var(2);
        let c = bdd.mk_var(3);

        let f = bdd.apply_or(a, b);
        let g = bdd.apply_eq(b, c);
        let vs = VarSet::new([2]);

        let fused = bdd.and_exists(f, g, &vs);
        let unfused = bdd.exists(bdd.apply_and(f, g), &vs);
        assert_eq!(fused, unfused);

        // Empty set degenerates to plain conjunction.
        assert_eq!(
            bdd.and_exists(f, g, &VarSet::default()),
            bdd.apply_and(f, g)
        );
    }

    #[test]
    fn test_support() {
        let bdd = Bdd::default();

        assert!(bdd.support(bdd.one()).is_empty());
        assert!(bdd.support(bdd.zero()).is_empty());

        let f = bdd.apply_ite(bdd.mk_var(2), bdd.mk_var(5), bdd.mk_var(9));
        assert_eq!(bdd.support(f), VarSet::new([2, 5, 9]));
        assert_eq!(bdd.support(-f), VarSet::new([2, 5, 9]));

        // Support round-trips through the set codec.
        let set = bdd.mk_set(&bdd.support(f));
        assert_eq!(bdd.parse_set(set), Ok(VarSet::new([2, 5, 9])));
    }
}
