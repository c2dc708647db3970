//! Owning handles for diagram values.
//!
//! The manual protocol of [`Bdd::ref_node`]/[`Bdd::deref_node`] is easy to
//! get wrong: every value held across an operation that may collect must be
//! referenced exactly once and dereferenced exactly once. [`Func`] makes the
//! protocol structural: construction references, drop dereferences, cloning
//! re-references. Code that holds diagram values should hold `Func`s and
//! pass bare [`Ref`]s only as arguments.

use std::fmt::{Display, Formatter};

use crate::bdd::Bdd;
use crate::reference::Ref;

/// An owning handle to a diagram value.
///
/// Holds one unit of the node's reference count for its whole lifetime, so
/// the value survives any garbage collection while the handle is alive.
#[derive(Debug)]
pub struct Func<'a> {
    bdd: &'a Bdd,
    node: Ref,
}

impl<'a> Func<'a> {
    pub fn new(bdd: &'a Bdd, node: Ref) -> Self {
        bdd.ref_node(node);
        Self { bdd, node }
    }

    /// The underlying non-owning handle, for use as an operation argument.
    pub fn node(&self) -> Ref {
        self.node
    }

    pub fn manager(&self) -> &'a Bdd {
        self.bdd
    }

    /// Replace the held value.
    ///
    /// References the new value before releasing the superseded one, so the
    /// swap is safe even when both sides share structure.
    pub fn rebind(&mut self, node: Ref) {
        self.bdd.ref_node(node);
        self.bdd.deref_node(self.node);
        self.node = node;
    }
}

impl Clone for Func<'_> {
    fn clone(&self) -> Self {
        Func::new(self.bdd, self.node)
    }
}

impl Drop for Func<'_> {
    fn drop(&mut self) {
        self.bdd.deref_node(self.node);
    }
}

impl PartialEq for Func<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl Eq for Func<'_> {}

impl Display for Func<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.node)
    }
}

impl Bdd {
    /// Wrap `node` in an owning handle tied to this manager.
    pub fn protect(&self, node: Ref) -> Func<'_> {
        Func::new(self, node)
    }
}
