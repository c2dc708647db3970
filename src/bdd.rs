//! The BDD manager: node storage, reference counting, garbage collection,
//! and the core boolean algebra.
//!
//! All operations go through a [`Bdd`] value, which owns the hash-consed
//! node table and the operation cache. Operations take and return [`Ref`]
//! handles; a handle that must survive a later operation has to be protected
//! with [`Bdd::ref_node`] or, preferably, wrapped in a
//! [`Func`](crate::func::Func).
//!
//! Garbage collection is reference-count rooted: every node with a nonzero
//! count (and everything reachable from it) survives, everything else may be
//! swept. Collection runs when explicitly requested and at the entry of
//! top-level operations once the table passes half occupancy; it never runs
//! in the middle of a recursion.

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::fmt::Debug;

use log::debug;

use crate::cache::Cache;
use crate::reference::Ref;
use crate::table::Table;
use crate::utils::{pairing2, pairing3, MyHash};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct Node {
    variable: u32,
    low: Ref,
    high: Ref,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            variable: 0,
            low: Ref::positive(0),
            high: Ref::positive(0),
        }
    }
}

impl MyHash for Node {
    fn hash(&self) -> u64 {
        pairing3(self.variable as u64, self.low.as_key(), self.high.as_key())
    }
}

/// Key of a cached operation result.
///
/// Quantification keys carry a fingerprint of the label set instead of a
/// node, so that a set never has to be materialized as a diagram just to hit
/// the cache.
#[derive(Debug, Eq, PartialEq, Clone)]
pub(crate) enum OpKey {
    Ite(Ref, Ref, Ref),
    Constrain(Ref, Ref),
    Restrict(Ref, Ref),
    Exists(Ref, u64),
    AndExists(Ref, Ref, u64),
}

impl MyHash for OpKey {
    fn hash(&self) -> u64 {
        match self {
            OpKey::Ite(f, g, h) => pairing2(1, pairing3(f.as_key(), g.as_key(), h.as_key())),
            OpKey::Constrain(f, c) => pairing2(2, pairing2(f.as_key(), c.as_key())),
            OpKey::Restrict(f, c) => pairing2(3, pairing2(f.as_key(), c.as_key())),
            OpKey::Exists(f, vs) => pairing2(4, pairing2(f.as_key(), *vs)),
            OpKey::AndExists(f, g, vs) => pairing2(5, pairing3(f.as_key(), g.as_key(), *vs)),
        }
    }
}

/// The diagram manager. See the [module docs](self).
pub struct Bdd {
    storage: RefCell<Table<Node>>,
    pub(crate) cache: RefCell<Cache<OpKey, Ref>>,
    size_cache: RefCell<Cache<Ref, u64>>,
    zero: Ref,
    one: Ref,
}

impl Bdd {
    /// Create a manager with a node table of `2^storage_bits` cells and an
    /// operation cache of `2^cache_bits` slots.
    pub fn new(storage_bits: usize, cache_bits: usize) -> Self {
        assert!(
            storage_bits <= 31,
            "Storage bits should be in the range 0..=31"
        );

        let mut storage = Table::new(storage_bits);

        // Allocate the terminal node:
        let one = storage.alloc();
        assert_eq!(one, 1); // Make sure the terminal node is (1).
        let one = Ref::positive(one as u32);
        let zero = -one;

        Self {
            storage: RefCell::new(storage),
            cache: RefCell::new(Cache::new(cache_bits)),
            size_cache: RefCell::new(Cache::new(cache_bits)),
            zero,
            one,
        }
    }
}

impl Default for Bdd {
    fn default() -> Self {
        Bdd::new(20, 16)
    }
}

impl Debug for Bdd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let storage = self.storage.borrow();
        f.debug_struct("Bdd")
            .field("capacity", &storage.capacity())
            .field("live_nodes", &storage.real_size())
            .field("refs", &storage.total_refs())
            .finish()
    }
}

impl Bdd {
    /// The immortal constant `true`.
    pub fn one(&self) -> Ref {
        self.one
    }
    /// The immortal constant `false`.
    pub fn zero(&self) -> Ref {
        self.zero
    }

    pub fn is_zero(&self, node: Ref) -> bool {
        node == self.zero
    }
    pub fn is_one(&self, node: Ref) -> bool {
        node == self.one
    }
    pub fn is_terminal(&self, node: Ref) -> bool {
        node.index() == self.one.index()
    }

    /// Variable of the node at `index` (0 for the terminal).
    pub fn variable(&self, index: usize) -> u32 {
        self.storage.borrow().value(index).variable
    }
    pub fn low(&self, index: usize) -> Ref {
        self.storage.borrow().value(index).low
    }
    pub fn high(&self, index: usize) -> Ref {
        self.storage.borrow().value(index).high
    }

    /// Low (else) child with the node's own complement applied.
    pub fn low_node(&self, node: Ref) -> Ref {
        let low = self.low(node.index());
        if node.is_negated() {
            -low
        } else {
            low
        }
    }
    /// High (then) child with the node's own complement applied.
    pub fn high_node(&self, node: Ref) -> Ref {
        let high = self.high(node.index());
        if node.is_negated() {
            -high
        } else {
            high
        }
    }

    /// Number of live (occupied) cells in the node table.
    pub fn live_nodes(&self) -> usize {
        self.storage.borrow().real_size()
    }

    /// Operation cache (hits, misses). Diagnostic only.
    pub fn cache_stats(&self) -> (usize, usize) {
        let cache = self.cache.borrow();
        (cache.hits(), cache.misses())
    }
}

// Node construction.
impl Bdd {
    /// Make (or find) the node `(v, low, high)`.
    ///
    /// Keeps the representation canonical: the high edge is never negated,
    /// and a node with equal children is collapsed into the child.
    pub fn mk_node(&self, v: u32, low: Ref, high: Ref) -> Ref {
        assert_ne!(v, 0, "Variable index should not be zero");

        if high.is_negated() {
            return -self.mk_node(v, -low, -high);
        }
        if low == high {
            return low;
        }

        let i = self.storage.borrow_mut().put(Node {
            variable: v,
            low,
            high,
        });
        Ref::positive(i as u32)
    }

    /// The atomic diagram for the single variable `v`.
    pub fn mk_var(&self, v: u32) -> Ref {
        assert_ne!(v, 0, "Variable index should not be zero");
        self.maybe_collect();
        self.mk_node(v, self.zero, self.one)
    }

    /// Conjunction of literals (DIMACS-style signed variables).
    pub fn cube(&self, literals: impl IntoIterator<Item = i32>) -> Ref {
        let mut literals = literals.into_iter().collect::<Vec<_>>();
        literals.sort_by_key(|&v| v.abs());
        self.maybe_collect();
        let mut current = self.one;
        for lit in literals.into_iter().rev() {
            assert_ne!(lit, 0, "Variable index should not be zero");
            current = if lit < 0 {
                self.mk_node(-lit as u32, current, self.zero)
            } else {
                self.mk_node(lit as u32, self.zero, current)
            };
        }
        current
    }

    /// Disjunction of literals (DIMACS-style signed variables).
    pub fn clause(&self, literals: impl IntoIterator<Item = i32>) -> Ref {
        -self.cube(literals.into_iter().map(|lit| -lit))
    }
}

// Reference counting.
impl Bdd {
    /// Assert interest in `node`: protect it (and everything below it) from
    /// garbage collection until a matching [`deref_node`](Bdd::deref_node).
    ///
    /// Returns the node unchanged so that it can be used in expression
    /// position. The terminals are immortal; referencing them is a no-op.
    pub fn ref_node(&self, node: Ref) -> Ref {
        if !self.is_terminal(node) {
            self.storage.borrow_mut().inc_ref(node.index());
        }
        node
    }

    /// Release one unit of interest in `node`.
    ///
    /// Panics if the node's count is already zero: an unbalanced dereference
    /// is a logic error, not a recoverable condition.
    pub fn deref_node(&self, node: Ref) {
        if !self.is_terminal(node) {
            self.storage.borrow_mut().dec_ref(node.index());
        }
    }

    /// Total outstanding references across all live nodes. Diagnostic only.
    pub fn count_refs(&self) -> u64 {
        self.storage.borrow().total_refs()
    }
}

// Garbage collection.
impl Bdd {
    /// Node indices reachable from `roots`, terminal included.
    pub(crate) fn reachable_indices(&self, roots: impl IntoIterator<Item = Ref>) -> HashSet<usize> {
        let mut visited = HashSet::new();
        visited.insert(self.one.index());
        let mut queue = VecDeque::from_iter(roots);

        while let Some(node) = queue.pop_front() {
            let i = node.index();
            if visited.insert(i) {
                queue.push_back(self.low(i));
                queue.push_back(self.high(i));
            }
        }

        visited
    }

    /// Sweep every node that is not reachable from a referenced node.
    ///
    /// Clears the operation caches, marks from all nodes with a nonzero
    /// reference count, and relinks the bucket chains around the dead cells.
    /// Any unreferenced handle the caller still holds is dangling afterwards.
    pub fn collect_garbage(&self) {
        debug!("collect_garbage: {} live nodes", self.live_nodes());

        self.cache.borrow_mut().clear();
        self.size_cache.borrow_mut().clear();

        let roots: Vec<Ref> = self
            .storage
            .borrow()
            .referenced_indices()
            .into_iter()
            .map(|i| Ref::positive(i as u32))
            .collect();
        let alive = self.reachable_indices(roots);

        let n = self.storage.borrow().num_buckets();
        for b in 0..n {
            let mut index = self.storage.borrow().bucket(b);
            if index == 0 {
                continue;
            }

            // Drop dead cells at the head of the chain.
            while index != 0 && !alive.contains(&index) {
                let next = self.storage.borrow().next(index);
                self.storage.borrow_mut().drop(index);
                index = next;
            }
            self.storage.borrow_mut().set_bucket(b, index);

            // Unlink dead cells in the rest of the chain.
            let mut prev = index;
            while prev != 0 {
                let mut cur = self.storage.borrow().next(prev);
                while cur != 0 && !alive.contains(&cur) {
                    let next = self.storage.borrow().next(cur);
                    self.storage.borrow_mut().drop(cur);
                    cur = next;
                }
                if self.storage.borrow().next(prev) != cur {
                    self.storage.borrow_mut().set_next(prev, cur);
                }
                prev = cur;
            }
        }

        debug!("collect_garbage: {} nodes survive", self.live_nodes());
    }

    /// Collect when the table passes half occupancy. Called at the entry of
    /// top-level operations only, never from inside a recursion.
    pub(crate) fn maybe_collect(&self) {
        let (size, capacity) = {
            let storage = self.storage.borrow();
            (storage.real_size(), storage.capacity())
        };
        if size * 2 >= capacity {
            self.collect_garbage();
        }
    }
}

// Boolean algebra.
impl Bdd {
    /// Cofactors of `node` with respect to variable `v`, where `v` is at or
    /// above the node's own variable in the order.
    pub fn top_cofactors(&self, node: Ref, v: u32) -> (Ref, Ref) {
        assert_ne!(v, 0, "Variable index should not be zero");

        let i = node.index();
        if self.is_terminal(node) || v < self.variable(i) {
            return (node, node);
        }
        assert_eq!(v, self.variable(i));
        if node.is_negated() {
            (-self.low(i), -self.high(i))
        } else {
            (self.low(i), self.high(i))
        }
    }

    /// If-then-else: `(f ∧ g) ∨ (¬f ∧ h)`. The primitive combinator.
    pub fn apply_ite(&self, f: Ref, g: Ref, h: Ref) -> Ref {
        self.maybe_collect();
        self.ite_rec(f, g, h)
    }

    pub(crate) fn ite_rec(&self, f: Ref, g: Ref, h: Ref) -> Ref {
        // Terminal f.
        if self.is_one(f) {
            return g;
        }
        if self.is_zero(f) {
            return h;
        }

        // Standard triples: fold occurrences of f in the branches into
        // constants.
        let mut g = g;
        let mut h = h;
        if g == f {
            g = self.one;
        } else if g == -f {
            g = self.zero;
        }
        if h == f {
            h = self.zero;
        } else if h == -f {
            h = self.one;
        }

        if g == h {
            return g;
        }
        if self.is_one(g) && self.is_zero(h) {
            return f;
        }
        if self.is_zero(g) && self.is_one(h) {
            return -f;
        }

        // Equivalent pairs: commute so that the pair with the lowest top
        // variable comes first, for a canonical cache key.
        //   ite(F,1,H) == ite(H,1,F)
        //   ite(F,G,0) == ite(G,F,0)
        //   ite(F,G,1) == ite(~G,~F,1)
        //   ite(F,0,H) == ite(~H,0,~F)
        //   ite(F,G,~G) == ite(G,F,~F)
        let mut f = f;
        let i = self.variable(f.index());
        let j = self.variable(g.index());
        let k = self.variable(h.index());

        if self.is_one(g) && k != 0 && k < i {
            std::mem::swap(&mut f, &mut h);
        } else if self.is_zero(h) && j != 0 && j < i {
            std::mem::swap(&mut f, &mut g);
        } else if self.is_one(h) && j != 0 && j < i {
            let t = -g;
            g = -f;
            f = t;
        } else if self.is_zero(g) && k != 0 && k < i {
            let t = -h;
            h = -f;
            f = t;
        } else if g == -h && j != 0 && j < i {
            let t = f;
            f = g;
            g = t;
            h = -t;
        }

        // Normalize signs: f and g regular.
        if f.is_negated() {
            f = -f;
            std::mem::swap(&mut g, &mut h);
        }
        let mut n = false;
        if g.is_negated() {
            n = true;
            g = -g;
            h = -h;
        }

        let key = OpKey::Ite(f, g, h);
        if let Some(&res) = self.cache.borrow().get(&key) {
            return if n { -res } else { res };
        }

        // Top variable of the triple.
        let i = self.variable(f.index());
        let j = self.variable(g.index());
        let k = self.variable(h.index());
        debug_assert_ne!(i, 0);
        let mut m = i;
        if j != 0 {
            m = m.min(j);
        }
        if k != 0 {
            m = m.min(k);
        }

        let (f0, f1) = self.top_cofactors(f, m);
        let (g0, g1) = self.top_cofactors(g, m);
        let (h0, h1) = self.top_cofactors(h, m);

        let e = self.ite_rec(f0, g0, h0);
        let t = self.ite_rec(f1, g1, h1);
        let res = self.mk_node(m, e, t);
        debug!("ite({}, {}, {}) -> {}", f, g, h, res);
        self.cache.borrow_mut().insert(&key, res);

        if n {
            -res
        } else {
            res
        }
    }

    /// Boolean complement. O(1) with complemented edges.
    pub fn apply_not(&self, f: Ref) -> Ref {
        -f
    }

    pub fn apply_and(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, self.zero)
    }

    pub fn apply_or(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, self.one, v)
    }

    pub fn apply_xor(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, -v, v)
    }

    pub fn apply_eq(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, -v)
    }

    pub fn apply_imply(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, self.one)
    }

    pub fn apply_and_many(&self, nodes: impl IntoIterator<Item = Ref>) -> Ref {
        let mut res = self.one;
        for node in nodes {
            res = self.apply_and(res, node);
        }
        res
    }

    pub fn apply_or_many(&self, nodes: impl IntoIterator<Item = Ref>) -> Ref {
        let mut res = self.zero;
        for node in nodes {
            res = self.apply_or(res, node);
        }
        res
    }

    /// Disjunction of a list of nodes, computed as a balanced reduction.
    ///
    /// Hash consing makes the result handle-identical to any left or right
    /// fold of `or` over the same operands, whatever the grouping; that
    /// identity is a contract, not just a logical equivalence.
    pub fn apply_or_balanced(&self, nodes: &[Ref]) -> Ref {
        self.maybe_collect();
        self.or_balanced_rec(nodes)
    }

    fn or_balanced_rec(&self, nodes: &[Ref]) -> Ref {
        match nodes {
            [] => self.zero,
            [f] => *f,
            _ => {
                let (left, right) = nodes.split_at(nodes.len() / 2);
                let l = self.or_balanced_rec(left);
                let r = self.or_balanced_rec(right);
                self.ite_rec(l, self.one, r)
            }
        }
    }

    /// Generalized cofactor of `f` with respect to the care set `c`
    /// (the "constrain" reduction).
    pub fn constrain(&self, f: Ref, c: Ref) -> Ref {
        self.maybe_collect();
        self.constrain_rec(f, c)
    }

    fn constrain_rec(&self, f: Ref, c: Ref) -> Ref {
        if self.is_zero(c) {
            return self.zero;
        }
        if self.is_one(c) || self.is_terminal(f) {
            return f;
        }
        if f == c {
            return self.one;
        }
        if f == -c {
            return self.zero;
        }

        let key = OpKey::Constrain(f, c);
        if let Some(&res) = self.cache.borrow().get(&key) {
            return res;
        }

        let i = self.variable(f.index());
        let j = self.variable(c.index());
        let v = i.min(j);

        let (f0, f1) = self.top_cofactors(f, v);
        let (c0, c1) = self.top_cofactors(c, v);

        if self.is_zero(c1) {
            return self.constrain_rec(f0, c0);
        }
        if self.is_zero(c0) {
            return self.constrain_rec(f1, c1);
        }

        let low = self.constrain_rec(f0, c0);
        let high = self.constrain_rec(f1, c1);
        let res = self.mk_node(v, low, high);
        debug!("constrain({}, {}) -> {}", f, c, res);

        self.cache.borrow_mut().insert(&key, res);
        res
    }

    /// Generalized cofactor of `f` with respect to the care set `c` using
    /// sibling substitution (the "restrict" reduction).
    ///
    /// Unlike [`constrain`](Bdd::constrain), variables of the care set that
    /// `f` does not depend on are quantified away first, so the result never
    /// picks up variables that `f` did not have. The two heuristics are not
    /// interchangeable.
    pub fn restrict(&self, f: Ref, c: Ref) -> Ref {
        self.maybe_collect();
        self.restrict_rec(f, c)
    }

    fn restrict_rec(&self, f: Ref, c: Ref) -> Ref {
        if self.is_zero(c) {
            return self.zero;
        }
        if self.is_one(c) || self.is_terminal(f) {
            return f;
        }
        if f == c {
            return self.one;
        }
        if f == -c {
            return self.zero;
        }

        let key = OpKey::Restrict(f, c);
        if let Some(&res) = self.cache.borrow().get(&key) {
            return res;
        }

        let i = self.variable(f.index());
        let j = self.variable(c.index());

        let res = if j < i {
            // The care set's top variable does not occur in f: drop it.
            let (c0, c1) = self.top_cofactors(c, j);
            let c = self.ite_rec(c0, self.one, c1);
            self.restrict_rec(f, c)
        } else {
            let (f0, f1) = self.top_cofactors(f, i);
            let (c0, c1) = self.top_cofactors(c, i);
            if self.is_zero(c1) {
                self.restrict_rec(f0, c0)
            } else if self.is_zero(c0) {
                self.restrict_rec(f1, c1)
            } else {
                let low = self.restrict_rec(f0, c0);
                let high = self.restrict_rec(f1, c1);
                self.mk_node(i, low, high)
            }
        };
        debug!("restrict({}, {}) -> {}", f, c, res);

        self.cache.borrow_mut().insert(&key, res);
        res
    }

    /// Functional substitution: `f` with variable `v` replaced by `g`.
    pub fn compose(&self, f: Ref, v: u32, g: Ref) -> Ref {
        self.maybe_collect();
        let mut cache = Cache::new(16);
        self.compose_rec(f, v, g, &mut cache)
    }

    pub(crate) fn compose_rec(
        &self,
        f: Ref,
        v: u32,
        g: Ref,
        cache: &mut Cache<(Ref, Ref), Ref>,
    ) -> Ref {
        assert_ne!(v, 0, "Variable index should not be zero");

        if self.is_terminal(f) {
            return f;
        }

        let i = self.variable(f.index());
        if v < i {
            // f does not depend on v.
            return f;
        }

        let key = (f, g);
        if let Some(&res) = cache.get(&key) {
            return res;
        }

        let res = if v == i {
            let index = f.index();
            let res = self.ite_rec(g, self.high(index), self.low(index));
            if f.is_negated() {
                -res
            } else {
                res
            }
        } else {
            let m = if self.is_terminal(g) {
                i
            } else {
                i.min(self.variable(g.index()))
            };

            let (f0, f1) = self.top_cofactors(f, m);
            let (g0, g1) = self.top_cofactors(g, m);
            let h0 = self.compose_rec(f0, v, g0, cache);
            let h1 = self.compose_rec(f1, v, g1, cache);
            self.mk_node(m, h0, h1)
        };
        cache.insert(&key, res);
        res
    }

    /// Number of distinct nodes in the diagram rooted at `f`, terminal
    /// included.
    ///
    /// Uses a transient traversal; by the single-caller contract it must not
    /// run concurrently with another traversal over shared structure.
    pub fn node_count(&self, f: Ref) -> u64 {
        if let Some(&size) = self.size_cache.borrow().get(&f) {
            return size;
        }
        let size = self.reachable_indices([f]).len() as u64;
        self.size_cache.borrow_mut().insert(&f, size);
        size
    }

    /// Textual dump of the diagram, high branch first.
    pub fn to_bracket_string(&self, node: Ref) -> String {
        if self.is_zero(node) {
            return "(0)".to_string();
        } else if self.is_one(node) {
            return "(1)".to_string();
        }

        format!(
            "{}:(x{}, {}, {})",
            node,
            self.variable(node.index()),
            self.to_bracket_string(self.high_node(node)),
            self.to_bracket_string(self.low_node(node))
        )
    }
}
