//! Diagram dumps in DOT (Graphviz) format.
//!
//! Terminals are squares at the bottom, decision nodes are circles grouped
//! by variable level, roots are rectangles at the top. High edges are solid,
//! low edges dashed; a complemented edge gets a hollow-circle arrowhead.

use std::collections::BTreeMap;

use crate::bdd::Bdd;
use crate::reference::Ref;

impl Bdd {
    /// Render the diagrams rooted at `roots` as a DOT graph. Shared nodes
    /// appear once. The traversal takes no references; rendering is
    /// refcount-neutral.
    pub fn to_dot(&self, roots: &[Ref]) -> Result<String, std::fmt::Error> {
        use std::fmt::Write as _;

        let mut dot = String::new();
        writeln!(dot, "graph {{")?;
        writeln!(dot, "node [shape=circle, fixedsize=true];")?;

        writeln!(dot, "{{ rank=sink")?;
        writeln!(dot, "0 [shape=square, label=\"0\"];")?;
        writeln!(dot, "1 [shape=square, label=\"1\"];")?;
        writeln!(dot, "}}")?;

        let mut all_nodes: Vec<usize> = self
            .reachable_indices(roots.iter().copied())
            .into_iter()
            .filter(|&i| i != 1)
            .collect();
        all_nodes.sort_unstable();

        // Group decision nodes by level so Graphviz ranks them together.
        let mut levels = BTreeMap::<u32, Vec<usize>>::new();
        for &i in &all_nodes {
            levels.entry(self.variable(i)).or_default().push(i);
        }
        for level in levels.values() {
            writeln!(dot, "{{ rank=same")?;
            for &i in level {
                writeln!(dot, "{} [label=<x<SUB>{}</SUB>>];", i, self.variable(i))?;
            }
            writeln!(dot, "}}")?;
        }

        for &i in &all_nodes {
            let high = self.high(i);
            assert!(!high.is_negated());
            writeln!(dot, "{} -- {} [style=solid];", i, high.index())?;

            let low = self.low(i);
            if low.is_negated() && !self.is_terminal(low) {
                writeln!(
                    dot,
                    "{} -- {} [style=dashed, dir=forward, arrowhead=odot];",
                    i,
                    low.index()
                )?;
            } else {
                let target = if self.is_zero(low) { 0 } else { low.index() };
                writeln!(dot, "{} -- {} [style=dashed];", i, target)?;
            }
        }

        writeln!(dot, "{{ rank=source")?;
        for (k, root) in roots.iter().enumerate() {
            writeln!(dot, "r{} [shape=rect, label=\"{}\"];", k, root)?;
        }
        writeln!(dot, "}}")?;
        for (k, &root) in roots.iter().enumerate() {
            if root.is_negated() && !self.is_terminal(root) {
                writeln!(dot, "r{} -- {} [dir=forward, arrowhead=odot];", k, root.index())?;
            } else {
                let target = if self.is_zero(root) { 0 } else { root.index() };
                writeln!(dot, "r{} -- {};", k, target)?;
            }
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_dot_basic() {
        let bdd = Bdd::default();
        let f = bdd.cube([-1, 2, 3]);

        let dot = bdd.to_dot(&[f]).unwrap();
        assert!(dot.starts_with("graph {"));
        assert!(dot.ends_with("}\n"));
        assert!(dot.contains("x<SUB>2</SUB>"));
    }

    #[test]
    fn test_to_dot_terminals_and_shared_roots() {
        let bdd = Bdd::default();
        let f = bdd.apply_and(bdd.mk_var(1), bdd.mk_var(2));

        let dot = bdd.to_dot(&[f, -f, bdd.zero(), bdd.one()]).unwrap();
        assert!(dot.contains("r0"));
        assert!(dot.contains("r3"));
    }

    #[test]
    fn test_to_dot_is_refcount_neutral() {
        let bdd = Bdd::default();
        let f = bdd.cube([1, -2]);
        let before = bdd.count_refs();
        let _ = bdd.to_dot(&[f]).unwrap();
        assert_eq!(bdd.count_refs(), before);
    }
}
