//! Inheritance graph - single-inheritance base links between classes.
//!
//! Uses `petgraph::DiGraph` with:
//! - Nodes: class `TypeHash`
//! - Edges: `class -> base`, at most one outgoing edge per node

use ctorspec_core::TypeHash;
use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashMap;

#[derive(Debug, Default, Clone)]
pub struct InheritanceGraph {
    graph: DiGraph<TypeHash, ()>,
    nodes: FxHashMap<TypeHash, NodeIndex>,
}

impl InheritanceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&mut self, class: TypeHash) -> NodeIndex {
        if let Some(&node) = self.nodes.get(&class) {
            return node;
        }
        let node = self.graph.add_node(class);
        self.nodes.insert(class, node);
        node
    }

    /// Set (or replace) the base of `class`.
    pub fn set_base(&mut self, class: TypeHash, base: Option<TypeHash>) {
        let node = self.node(class);
        if let Some(edge) = self.graph.edges(node).next().map(|e| e.id()) {
            self.graph.remove_edge(edge);
        }
        if let Some(base) = base {
            let base_node = self.node(base);
            self.graph.add_edge(node, base_node, ());
        }
    }

    /// Whether `sub` is `sup` or inherits from it, directly or transitively.
    pub fn is_subclass(&self, sub: TypeHash, sup: TypeHash) -> bool {
        match (self.nodes.get(&sub), self.nodes.get(&sup)) {
            (Some(&a), Some(&b)) => has_path_connecting(&self.graph, a, b, None),
            _ => false,
        }
    }

    /// Whether making `base` the base of `class` would close a cycle.
    pub fn would_cycle(&self, class: TypeHash, base: TypeHash) -> bool {
        class == base || self.is_subclass(base, class)
    }

    /// Direct base of `class`, if any.
    pub fn base_of(&self, class: TypeHash) -> Option<TypeHash> {
        let node = *self.nodes.get(&class)?;
        self.graph
            .edges(node)
            .next()
            .map(|e| self.graph[e.target()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(name: &str) -> TypeHash {
        TypeHash::from_name(name)
    }

    #[test]
    fn transitive_subclass() {
        let mut graph = InheritanceGraph::new();
        graph.set_base(h("object"), None);
        graph.set_base(h("A"), Some(h("object")));
        graph.set_base(h("B"), Some(h("A")));

        assert!(graph.is_subclass(h("B"), h("object")));
        assert!(graph.is_subclass(h("B"), h("B")));
        assert!(!graph.is_subclass(h("A"), h("B")));
        assert!(!graph.is_subclass(h("Z"), h("A")));
    }

    #[test]
    fn rebasing_replaces_edge() {
        let mut graph = InheritanceGraph::new();
        graph.set_base(h("A"), Some(h("object")));
        graph.set_base(h("B"), Some(h("object")));
        graph.set_base(h("B"), Some(h("A")));

        assert_eq!(graph.base_of(h("B")), Some(h("A")));
        graph.set_base(h("B"), None);
        assert_eq!(graph.base_of(h("B")), None);
        assert!(!graph.is_subclass(h("B"), h("object")));
    }

    #[test]
    fn detects_cycles() {
        let mut graph = InheritanceGraph::new();
        graph.set_base(h("B"), Some(h("A")));
        assert!(graph.would_cycle(h("A"), h("B")));
        assert!(graph.would_cycle(h("A"), h("A")));
        assert!(!graph.would_cycle(h("C"), h("B")));
    }
}
