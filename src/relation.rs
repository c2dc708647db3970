//! Relational products over paired current/next variables.
//!
//! A transition relation ranges over pairs of variables: for the k-th state
//! bit, label `2k-1` holds the current value and label `2k` the next value.
//! A relation's variable set contains both labels of every pair it covers;
//! it may cover any subset of the state bits (a transition group), in which
//! case the uncovered bits pass through the product untouched.

use std::collections::HashMap;

use log::debug;

use crate::bdd::Bdd;
use crate::cache::Cache;
use crate::reference::Ref;
use crate::varset::VarSet;

/// Split a paired variable set into (current, next) halves.
///
/// Panics if the set is not strictly alternating current/next pairs.
fn split_pairs(vars: &VarSet) -> (VarSet, VarSet) {
    for v in vars.iter() {
        let partner = if v % 2 == 1 { v + 1 } else { v - 1 };
        assert!(
            vars.contains(partner),
            "Variable set is not paired: x{} has no partner x{}",
            v,
            partner
        );
    }
    let current = vars.iter().filter(|v| v % 2 == 1).collect();
    let next = vars.iter().filter(|v| v % 2 == 0).collect();
    (current, next)
}

impl Bdd {
    /// Relational image: the successors of `states` under `relation`.
    ///
    /// Computes `∃ current. (states ∧ relation)` and renames the surviving
    /// next-state variables down onto their current-state partners. State
    /// sets range over current-state variables only.
    pub fn rel_next(&self, states: Ref, relation: Ref, vars: &VarSet) -> Ref {
        let (current, _) = split_pairs(vars);
        self.maybe_collect();

        let product = self.and_exists_rec(states, relation, current.labels(), current.fingerprint());
        let res = self.shift_rec(product, vars, false, &mut HashMap::new());
        debug!("rel_next({}, {}) -> {}", states, relation, res);
        res
    }

    /// Relational pre-image: the predecessors of `states` under `relation`.
    pub fn rel_prev(&self, states: Ref, relation: Ref, vars: &VarSet) -> Ref {
        let (_, next) = split_pairs(vars);
        self.maybe_collect();

        let shifted = self.shift_rec(states, vars, true, &mut HashMap::new());
        let res = self.and_exists_rec(shifted, relation, next.labels(), next.fingerprint());
        debug!("rel_prev({}, {}) -> {}", states, relation, res);
        res
    }

    /// Transitive closure: the smallest relation containing `relation` and
    /// closed under composition with itself.
    ///
    /// Iterative squaring: `T := T ∪ (T ∘ T)` until the fixpoint. The
    /// composition routes the intermediate state through a bank of fresh
    /// variables above `vars` and quantifies it away again.
    pub fn closure(&self, relation: Ref, vars: &VarSet) -> Ref {
        let (current, next) = split_pairs(vars);
        assert!(
            self.support(relation)
                .difference(vars)
                .is_empty(),
            "Relation depends on variables outside its paired set"
        );
        self.maybe_collect();

        let max = vars.max().unwrap_or(0);

        let mut t = relation;
        loop {
            let step = self.compose_pairs(t, t, &current, &next, max);
            let grown = self.ite_rec(t, self.one(), step);
            if grown == t {
                debug!("closure({}) -> {}", relation, t);
                return t;
            }
            t = grown;
        }
    }

    /// `∃ mid. a(current, mid) ∧ b(mid, next)`, with `mid` living in a fresh
    /// variable bank at `max + pair`.
    fn compose_pairs(&self, a: Ref, b: Ref, current: &VarSet, next: &VarSet, max: u32) -> Ref {
        // a's next-state vars and b's current-state vars both move to the
        // shared mid bank: label 2k (and 2k-1) -> max + 2k.
        let mut a2 = a;
        for v in next.iter() {
            let fresh = self.mk_node(max + v, self.zero(), self.one());
            a2 = self.compose_rec(a2, v, fresh, &mut Cache::new(16));
        }
        let mut b2 = b;
        for v in current.iter() {
            let fresh = self.mk_node(max + v + 1, self.zero(), self.one());
            b2 = self.compose_rec(b2, v, fresh, &mut Cache::new(16));
        }

        let mid: VarSet = next.iter().map(|v| max + v).collect();
        self.and_exists_rec(a2, b2, mid.labels(), mid.fingerprint())
    }

    /// Rename paired variables of `vars` in `f`: next down onto current
    /// (`up = false`) or current up onto next (`up = true`).
    ///
    /// Partner labels are adjacent, so the renaming preserves the variable
    /// order of every node in `f`'s support and can rebuild bottom-up.
    fn shift_rec(&self, f: Ref, vars: &VarSet, up: bool, cache: &mut HashMap<Ref, Ref>) -> Ref {
        if self.is_terminal(f) {
            return f;
        }
        if let Some(&res) = cache.get(&f) {
            return res;
        }

        let v = self.variable(f.index());
        let renamed = if !vars.contains(v) {
            v
        } else if up && v % 2 == 1 {
            v + 1
        } else if !up && v % 2 == 0 {
            v - 1
        } else {
            v
        };

        let low = self.shift_rec(self.low_node(f), vars, up, cache);
        let high = self.shift_rec(self.high_node(f), vars, up, cache);
        let res = self.mk_node(renamed, low, high);
        cache.insert(f, res);
        res
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    /// Toggle relation over one state bit (current x1, next x2): x' = ¬x.
    fn toggle(bdd: &Bdd) -> (Ref, VarSet) {
        let rel = bdd.apply_xor(bdd.mk_var(1), bdd.mk_var(2));
        (rel, VarSet::new([1, 2]))
    }

    #[test]
    fn test_rel_next_toggle() {
        let bdd = Bdd::default();
        let (rel, vars) = toggle(&bdd);

        let x = bdd.mk_var(1);
        assert_eq!(bdd.rel_next(-x, rel, &vars), x);
        assert_eq!(bdd.rel_next(x, rel, &vars), -x);
        assert_eq!(bdd.rel_next(bdd.one(), rel, &vars), bdd.one());
        assert_eq!(bdd.rel_next(bdd.zero(), rel, &vars), bdd.zero());
    }

    #[test]
    fn test_rel_prev_toggle() {
        let bdd = Bdd::default();
        let (rel, vars) = toggle(&bdd);

        let x = bdd.mk_var(1);
        assert_eq!(bdd.rel_prev(x, rel, &vars), -x);
        assert_eq!(bdd.rel_prev(-x, rel, &vars), x);
    }

    #[test]
    fn test_rel_next_counter() {
        // Two-bit counter: x (pair 1/2) toggles, y (pair 3/4) flips when x
        // carries: x' = ¬x, y' = y ⊕ x.
        let bdd = Bdd::default();

        let x = bdd.mk_var(1);
        let xn = bdd.mk_var(2);
        let y = bdd.mk_var(3);
        let yn = bdd.mk_var(4);

        let rel = bdd.apply_and(
            bdd.apply_eq(xn, -x),
            bdd.apply_eq(yn, bdd.apply_xor(y, x)),
        );
        let vars = VarSet::new([1, 2, 3, 4]);

        // (0,0) -> (1,0) -> (0,1) -> (1,1) -> (0,0)
        let s00 = bdd.cube([-1, -3]);
        let s10 = bdd.cube([1, -3]);
        let s01 = bdd.cube([-1, 3]);
        let s11 = bdd.cube([1, 3]);

        assert_eq!(bdd.rel_next(s00, rel, &vars), s10);
        assert_eq!(bdd.rel_next(s10, rel, &vars), s01);
        assert_eq!(bdd.rel_next(s01, rel, &vars), s11);
        assert_eq!(bdd.rel_next(s11, rel, &vars), s00);

        // Pre-image inverts each step.
        assert_eq!(bdd.rel_prev(s10, rel, &vars), s00);
        assert_eq!(bdd.rel_prev(s00, rel, &vars), s11);
    }

    #[test]
    fn test_rel_next_partial_group() {
        // A group covering only pair 1/2; the y bit (pair 3/4) is untouched
        // and passes through the product.
        let bdd = Bdd::default();

        let x = bdd.mk_var(1);
        let xn = bdd.mk_var(2);
        let y = bdd.mk_var(3);

        let rel = bdd.apply_eq(xn, -x);
        let vars = VarSet::new([1, 2]);

        let states = bdd.apply_and(-x, y);
        assert_eq!(bdd.rel_next(states, rel, &vars), bdd.apply_and(x, y));
    }

    #[test]
    fn test_closure_toggle_reaches_everything() {
        let bdd = Bdd::default();
        let (rel, vars) = toggle(&bdd);

        // toggle ∘ toggle is the identity, so the closure relates every
        // state to every state.
        assert_eq!(bdd.closure(rel, &vars), bdd.one());
    }

    #[test]
    fn test_closure_of_one_way_step() {
        let bdd = Bdd::default();

        // 0 -> 1 only; composing it with itself is empty.
        let rel = bdd.apply_and(-bdd.mk_var(1), bdd.mk_var(2));
        let vars = VarSet::new([1, 2]);

        assert_eq!(bdd.closure(rel, &vars), rel);
    }

    #[test]
    #[should_panic(expected = "not paired")]
    fn test_unpaired_set_rejected() {
        let bdd = Bdd::default();
        let rel = bdd.mk_var(1);
        bdd.rel_next(bdd.one(), rel, &VarSet::new([1, 3]));
    }
}
