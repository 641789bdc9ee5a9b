//! Depth-first cycle detection over the connection graph
//!
//! Start nodes are visited in block registration order and neighbours in
//! connection insertion order, so the reported paths are reproducible.
//!
//! Only the first cycle reachable from each unvisited root is reported. This
//! guarantees at least one cycle per strongly connected component touched by a
//! root; it is not an enumeration of every simple cycle. Scores depend on the
//! number of cycles reported, so this coverage must not be widened.

use crate::config::RuleId;
use crate::domain::structure::{BlockHandle, BlockId, LayerStructure};
use crate::domain::violations::{Severity, Violation, ViolationDetail, ViolationKind};

/// Finds dependency cycles in a `LayerStructure`
pub struct CycleDetector<'a> {
    structure: &'a LayerStructure,
}

impl<'a> CycleDetector<'a> {
    pub fn new(structure: &'a LayerStructure) -> Self {
        Self { structure }
    }

    /// Cycles as identifier paths that start and end on the same block
    ///
    /// `A -> B -> C -> A` is reported as `[A, B, C, A]`, a self-loop on `X` as `[X, X]`.
    pub fn find_cycles(&self) -> Vec<Vec<BlockId>> {
        self.find_cycle_handles()
            .into_iter()
            .map(|cycle| {
                cycle
                    .into_iter()
                    .map(|handle| self.structure.block_at(handle).id().clone())
                    .collect()
            })
            .collect()
    }

    fn find_cycle_handles(&self) -> Vec<Vec<BlockHandle>> {
        let adjacency = self.structure.adjacency();
        let mut traversal = Traversal::new(&adjacency);
        let mut cycles = Vec::new();

        for root in self.structure.handles() {
            if traversal.visited[root.index()] {
                continue;
            }
            if let Some(cycle) = traversal.visit(root) {
                cycles.push(cycle);
            }
            traversal.reset_stack();
        }

        cycles
    }
}

/// DFS state; `visited` persists across roots, the stack and path do not
struct Traversal<'g> {
    adjacency: &'g [Vec<BlockHandle>],
    visited: Vec<bool>,
    on_stack: Vec<bool>,
    path: Vec<BlockHandle>,
}

impl<'g> Traversal<'g> {
    fn new(adjacency: &'g [Vec<BlockHandle>]) -> Self {
        Self {
            adjacency,
            visited: vec![false; adjacency.len()],
            on_stack: vec![false; adjacency.len()],
            path: Vec::new(),
        }
    }

    /// Returns the first cycle closed below `root`, abandoning the rest of the walk
    ///
    /// Iterative so that long dependency chains cannot exhaust the call stack.
    /// Each frame holds a block and the position of its next unexplored neighbour.
    fn visit(&mut self, root: BlockHandle) -> Option<Vec<BlockHandle>> {
        let adjacency = self.adjacency;
        let mut frames: Vec<(BlockHandle, usize)> = Vec::new();
        self.enter(root);
        frames.push((root, 0));

        while let Some((node, position)) = frames.last_mut() {
            let neighbours = &adjacency[node.index()];

            let Some(&next) = neighbours.get(*position) else {
                self.on_stack[node.index()] = false;
                self.path.pop();
                frames.pop();
                continue;
            };
            *position += 1;

            if self.on_stack[next.index()] {
                let start = self.path.iter().position(|&handle| handle == next)?;
                let mut cycle = self.path[start..].to_vec();
                cycle.push(next);
                return Some(cycle);
            }
            if !self.visited[next.index()] {
                self.enter(next);
                frames.push((next, 0));
            }
        }

        None
    }

    fn enter(&mut self, node: BlockHandle) {
        self.visited[node.index()] = true;
        self.on_stack[node.index()] = true;
        self.path.push(node);
    }

    fn reset_stack(&mut self) {
        for handle in self.path.drain(..) {
            self.on_stack[handle.index()] = false;
        }
    }
}

/// One `CYCLIC_DEPENDENCY` violation per detected cycle
pub fn cycle_violations(structure: &LayerStructure, severity: Severity) -> Vec<Violation> {
    CycleDetector::new(structure)
        .find_cycles()
        .into_iter()
        .map(|path| {
            let names: Vec<&str> = path
                .iter()
                .filter_map(|id| structure.block(id).map(|block| block.name()))
                .collect();
            tracing::debug!("Cycle found: {}", names.join(" -> "));

            Violation::new(
                RuleId::NoCyclicDependency.as_str(),
                ViolationKind::CyclicDependency,
                severity,
                format!("Cyclic dependency detected: {}", names.join(" -> ")),
            )
            .with_detail(ViolationDetail::Cycle { path })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::structure::{BlockType, CodeBlock, Layer};

    fn ids(names: &[&str]) -> Vec<BlockId> {
        names.iter().map(|name| BlockId::new(*name)).collect()
    }

    /// Services in the application layer, connected in the given order
    fn structure(blocks: &[&str], connections: &[(&str, &str)]) -> LayerStructure {
        let mut structure = LayerStructure::new();
        for name in blocks {
            structure
                .add_block(
                    Layer::Application,
                    CodeBlock::with_id(BlockId::new(*name), *name, BlockType::Service),
                )
                .unwrap();
        }
        for (from, to) in connections {
            structure
                .create_connection(&BlockId::new(*from), &BlockId::new(*to))
                .unwrap();
        }
        structure
    }

    #[test]
    fn test_three_node_cycle() {
        let structure = structure(&["A", "B", "C"], &[("A", "B"), ("B", "C"), ("C", "A")]);
        let cycles = CycleDetector::new(&structure).find_cycles();
        assert_eq!(cycles, vec![ids(&["A", "B", "C", "A"])]);
    }

    #[test]
    fn test_self_loop() {
        let structure = structure(&["X"], &[("X", "X")]);
        let cycles = CycleDetector::new(&structure).find_cycles();
        assert_eq!(cycles, vec![ids(&["X", "X"])]);
    }

    #[test]
    fn test_acyclic_graph() {
        let structure = structure(
            &["A", "B", "C", "D"],
            &[("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")],
        );
        assert!(CycleDetector::new(&structure).find_cycles().is_empty());
    }

    #[test]
    fn test_cycle_path_starts_where_it_closes() {
        // Entry from A leads into the B -> C -> D -> B loop
        let structure = structure(
            &["A", "B", "C", "D"],
            &[("A", "B"), ("B", "C"), ("C", "D"), ("D", "B")],
        );
        let cycles = CycleDetector::new(&structure).find_cycles();
        assert_eq!(cycles, vec![ids(&["B", "C", "D", "B"])]);
    }

    #[test]
    fn test_only_first_cycle_per_root_is_reported() {
        // Two loops through A; only the one found first from A is reported.
        let structure = structure(
            &["A", "B", "C"],
            &[("A", "B"), ("B", "A"), ("A", "C"), ("C", "A")],
        );
        let cycles = CycleDetector::new(&structure).find_cycles();
        assert_eq!(cycles, vec![ids(&["A", "B", "A"])]);
    }

    #[test]
    fn test_later_roots_report_their_own_components() {
        let structure = structure(
            &["A", "B", "C", "D"],
            &[("A", "B"), ("B", "A"), ("C", "D"), ("D", "C")],
        );
        let cycles = CycleDetector::new(&structure).find_cycles();
        assert_eq!(cycles, vec![ids(&["A", "B", "A"]), ids(&["C", "D", "C"])]);
    }

    #[test]
    fn test_abandoned_walk_does_not_leak_stack_into_next_root() {
        // A closes a cycle via B before C is explored; from root C the walk
        // reaches already visited B, which must not count as a back edge.
        let structure = structure(
            &["A", "B", "C"],
            &[("A", "B"), ("B", "A"), ("C", "B")],
        );
        let cycles = CycleDetector::new(&structure).find_cycles();
        assert_eq!(cycles, vec![ids(&["A", "B", "A"])]);
    }

    #[test]
    fn test_long_chain_does_not_exhaust_the_stack() {
        const LENGTH: usize = 100_000;
        let ids: Vec<BlockId> = (0..LENGTH).map(|n| BlockId::new(format!("b{n}"))).collect();

        let mut structure = LayerStructure::new();
        for id in &ids {
            structure
                .add_block(
                    Layer::Application,
                    CodeBlock::with_id(id.clone(), id.as_str(), BlockType::UseCase),
                )
                .unwrap();
        }
        for pair in ids.windows(2) {
            structure.create_connection(&pair[0], &pair[1]).unwrap();
        }
        assert!(CycleDetector::new(&structure).find_cycles().is_empty());

        // Closing the chain yields exactly one cycle through every block
        structure.create_connection(&ids[LENGTH - 1], &ids[0]).unwrap();
        let cycles = CycleDetector::new(&structure).find_cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].len(), LENGTH + 1);
        assert_eq!(cycles[0].first(), Some(&ids[0]));
        assert_eq!(cycles[0].last(), Some(&ids[0]));
    }

    #[test]
    fn test_cycle_violation_message() {
        let structure = structure(&["A", "B"], &[("A", "B"), ("B", "A")]);
        let violations = cycle_violations(&structure, Severity::Error);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::CyclicDependency);
        assert_eq!(violations[0].rule_id, "no-cyclic-dependency");
        assert_eq!(violations[0].message, "Cyclic dependency detected: A -> B -> A");
        assert_eq!(
            violations[0].detail,
            Some(ViolationDetail::Cycle { path: ids(&["A", "B", "A"]) })
        );
    }
}
