//! Breadth-first symbolic reachability.
//!
//! A [`TransitionSystem`] bundles an initial state set with one or more
//! transition groups, each a relation over its own paired variables. The
//! driver saturates the visited set level by level: take the image of the
//! frontier under every group, drop already-visited states, and stop when
//! the frontier is empty.

use log::info;

use crate::bdd::Bdd;
use crate::func::Func;
use crate::reference::Ref;
use crate::varset::VarSet;

/// One transition relation together with the paired variables it ranges
/// over.
pub struct TransitionGroup<'a> {
    relation: Func<'a>,
    vars: VarSet,
}

impl TransitionGroup<'_> {
    pub fn relation(&self) -> Ref {
        self.relation.node()
    }

    pub fn vars(&self) -> &VarSet {
        &self.vars
    }
}

/// A symbolic transition system over current-state variables `domain`.
pub struct TransitionSystem<'a> {
    bdd: &'a Bdd,
    initial: Func<'a>,
    groups: Vec<TransitionGroup<'a>>,
    domain: VarSet,
}

/// Knobs for [`TransitionSystem::bfs_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BfsOptions {
    /// Count the states discovered at each level. Costs one model count per
    /// level on top of the fixpoint itself.
    pub count_states: bool,
}

impl<'a> TransitionSystem<'a> {
    /// `domain` lists the current-state variables, which by convention are
    /// the odd labels of each pair.
    pub fn new(bdd: &'a Bdd, initial: Ref, domain: VarSet) -> Self {
        assert!(
            domain.iter().all(|v| v % 2 == 1),
            "State domain must consist of current-state (odd) variables"
        );
        Self {
            bdd,
            initial: bdd.protect(initial),
            groups: Vec::new(),
            domain,
        }
    }

    pub fn add_group(&mut self, relation: Ref, vars: VarSet) {
        self.groups.push(TransitionGroup {
            relation: self.bdd.protect(relation),
            vars,
        });
    }

    pub fn initial(&self) -> Ref {
        self.initial.node()
    }

    pub fn domain(&self) -> &VarSet {
        &self.domain
    }

    pub fn groups(&self) -> &[TransitionGroup<'a>] {
        &self.groups
    }

    /// The set of states reachable from the initial set.
    pub fn bfs(&self) -> Func<'a> {
        self.bfs_with(&BfsOptions::default())
    }

    /// BFS saturation with per-level diagnostics.
    ///
    /// The visited set and the frontier are held in owning handles and
    /// rebound at each level, so intermediate results survive any garbage
    /// collection the operations trigger.
    pub fn bfs_with(&self, options: &BfsOptions) -> Func<'a> {
        let bdd = self.bdd;
        let mut visited = self.initial.clone();
        let mut frontier = self.initial.clone();
        let mut level = 0usize;

        while !bdd.is_zero(frontier.node()) {
            level += 1;

            let mut next = bdd.protect(bdd.zero());
            for group in &self.groups {
                let succ = bdd.protect(bdd.rel_next(
                    frontier.node(),
                    group.relation.node(),
                    &group.vars,
                ));
                // Successors not seen before join the next frontier.
                let fresh = bdd.protect(bdd.apply_ite(visited.node(), bdd.zero(), succ.node()));
                next.rebind(bdd.apply_or(next.node(), fresh.node()));
            }

            frontier.rebind(next.node());
            drop(next);
            visited.rebind(bdd.apply_or(visited.node(), frontier.node()));

            if options.count_states {
                info!(
                    "level {}: {} new states, visited set has {} nodes",
                    level,
                    bdd.sat_count(frontier.node(), &self.domain),
                    bdd.node_count(visited.node())
                );
            } else {
                info!(
                    "level {}: visited set has {} nodes",
                    level,
                    bdd.node_count(visited.node())
                );
            }
        }

        info!("fixpoint after {} levels", level);
        visited
    }
}
