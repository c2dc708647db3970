//! # bdd-reach: symbolic reachability over Binary Decision Diagrams
//!
//! **`bdd-reach`** is a manager-centric BDD library with the relational
//! layer needed for symbolic model checking: images, pre-images, transitive
//! closure, and a breadth-first reachability driver.
//!
//! ## Architecture
//!
//! - **Manager-Centric**: all operations go through the
//!   [`Bdd`][crate::bdd::Bdd] manager, which owns the hash-consed node table
//!   and the operation cache. Structural sharing makes equality of handles
//!   equality of functions.
//! - **Complemented Edges**: negation is a sign bit on the
//!   [`Ref`][crate::reference::Ref] handle, so `apply_not` is free and `f`
//!   and `¬f` share every node.
//! - **Reference-Counted Collection**: long-lived values are protected with
//!   [`Func`][crate::func::Func] owning handles; everything unprotected may
//!   be swept when the table fills up.
//! - **1-Based Variables**: variables are 1-indexed (0 is reserved for the
//!   terminal). The relational layer pairs them: odd labels carry current
//!   state, even labels next state.
//!
//! ## Basic Usage
//!
//! ```rust
//! use bdd_reach::bdd::Bdd;
//! use bdd_reach::varset::VarSet;
//!
//! let bdd = Bdd::default();
//!
//! let x1 = bdd.mk_var(1);
//! let x2 = bdd.mk_var(2);
//! let f = bdd.apply_and(x1, -x2);
//!
//! assert!(!bdd.is_zero(f));
//! assert_eq!(bdd.sat_count(f, &VarSet::new([1, 2])), 1.0);
//! ```
//!
//! ## Reachability
//!
//! ```rust
//! use bdd_reach::bdd::Bdd;
//! use bdd_reach::reach::TransitionSystem;
//! use bdd_reach::varset::VarSet;
//!
//! let bdd = Bdd::default();
//!
//! // One toggling bit: current x1, next x2.
//! let rel = bdd.apply_xor(bdd.mk_var(1), bdd.mk_var(2));
//!
//! let mut ts = TransitionSystem::new(&bdd, -bdd.mk_var(1), VarSet::new([1]));
//! ts.add_group(rel, VarSet::new([1, 2]));
//!
//! let visited = ts.bfs();
//! assert_eq!(visited.node(), bdd.one());
//! ```
//!
//! ## Core Components
//!
//! - **[`bdd`]**: the manager, node construction, the boolean algebra, and
//!   garbage collection.
//! - **[`func`]**: RAII owning handles over diagram values.
//! - **[`quant`]**: quantification and support computation.
//! - **[`relation`]**: relational images and transitive closure.
//! - **[`reach`]**: the BFS fixpoint driver.
//! - **[`varset`]**: semantic variable sets and their diagram codec.
//! - **[`sat`]**: model counting.
//! - **[`dot`]**: Graphviz dumps.

pub mod bdd;
pub mod cache;
pub mod dot;
pub mod func;
pub mod quant;
pub mod reach;
pub mod reference;
pub mod relation;
pub mod sat;
pub mod table;
pub mod utils;
pub mod varset;
