//! Model dependency graph.
//!
//! Nodes are model names; an edge `a -> b` means `a` refers to `b`.
//! Referenced names need not be declared models.

use indexmap::{IndexMap, IndexSet};

#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    edges: IndexMap<String, IndexSet<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, name: impl Into<String>) {
        self.edges.entry(name.into()).or_default();
    }

    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) {
        let to = to.into();
        self.add_node(to.clone());
        self.edges.entry(from.into()).or_default().insert(to);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.edges.contains_key(name)
    }

    pub fn successors(&self, name: &str) -> impl Iterator<Item = &str> {
        self.edges
            .get(name)
            .into_iter()
            .flat_map(|targets| targets.iter().map(String::as_str))
    }

    /// Returns every cycle: strongly connected components with more than one
    /// node, and single nodes with a self-loop.
    pub fn find_circuits(&self) -> Vec<Vec<String>> {
        SccFinder::find(self)
            .into_iter()
            .filter(|scc| match scc.as_slice() {
                [single] => self
                    .edges
                    .get(single.as_str())
                    .is_some_and(|targets| targets.contains(single.as_str())),
                _ => true,
            })
            .collect()
    }

    /// Returns every node, each one after all of its successors.
    ///
    /// On a cyclic graph the order within a cycle is unspecified.
    pub fn sort_post_order(&self) -> Vec<String> {
        let mut visited: IndexSet<&str> = IndexSet::new();
        let mut order = Vec::with_capacity(self.edges.len());
        for name in self.edges.keys() {
            self.visit_post_order(name, &mut visited, &mut order);
        }
        order
    }

    fn visit_post_order<'a>(
        &'a self,
        name: &'a str,
        visited: &mut IndexSet<&'a str>,
        order: &mut Vec<String>,
    ) {
        if !visited.insert(name) {
            return;
        }
        for next in self.successors(name) {
            self.visit_post_order(next, visited, order);
        }
        order.push(name.to_string());
    }
}

/// Tarjan's strongly connected components.
struct SccFinder<'a> {
    graph: &'a DependencyGraph,
    index: usize,
    stack: Vec<&'a str>,
    on_stack: IndexSet<&'a str>,
    indices: IndexMap<&'a str, usize>,
    lowlinks: IndexMap<&'a str, usize>,
    sccs: Vec<Vec<&'a str>>,
}

impl<'a> SccFinder<'a> {
    fn find(graph: &'a DependencyGraph) -> Vec<Vec<String>> {
        let mut finder = Self {
            graph,
            index: 0,
            stack: Vec::new(),
            on_stack: IndexSet::new(),
            indices: IndexMap::new(),
            lowlinks: IndexMap::new(),
            sccs: Vec::new(),
        };

        for name in graph.edges.keys() {
            if !finder.indices.contains_key(name.as_str()) {
                finder.strongconnect(name);
            }
        }

        finder
            .sccs
            .into_iter()
            .map(|mut scc| {
                scc.reverse();
                scc.into_iter().map(String::from).collect()
            })
            .collect()
    }

    fn strongconnect(&mut self, name: &'a str) {
        self.indices.insert(name, self.index);
        self.lowlinks.insert(name, self.index);
        self.index += 1;
        self.stack.push(name);
        self.on_stack.insert(name);

        let graph = self.graph;
        for next in graph.successors(name) {
            if !self.indices.contains_key(next) {
                self.strongconnect(next);
                let next_lowlink = self.lowlinks[next];
                if let Some(lowlink) = self.lowlinks.get_mut(name) {
                    *lowlink = (*lowlink).min(next_lowlink);
                }
            } else if self.on_stack.contains(next) {
                let next_index = self.indices[next];
                if let Some(lowlink) = self.lowlinks.get_mut(name) {
                    *lowlink = (*lowlink).min(next_index);
                }
            }
        }

        if self.lowlinks[name] == self.indices[name] {
            let mut scc = Vec::new();
            while let Some(w) = self.stack.pop() {
                self.on_stack.swap_remove(w);
                scc.push(w);
                if w == name {
                    break;
                }
            }
            self.sccs.push(scc);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_order_puts_dependencies_first() {
        let mut graph = DependencyGraph::new();
        graph.add_edge("joined", "left");
        graph.add_edge("joined", "right");
        graph.add_edge("left", "base");
        graph.add_node("unrelated");

        let order = graph.sort_post_order();
        let position = |name: &str| order.iter().position(|n| n == name).unwrap();
        assert!(position("base") < position("left"));
        assert!(position("left") < position("joined"));
        assert!(position("right") < position("joined"));
        assert_eq!(order.len(), 5);
    }

    #[test]
    fn test_acyclic_graph_has_no_circuits() {
        let mut graph = DependencyGraph::new();
        graph.add_edge("a", "b");
        graph.add_edge("b", "c");
        graph.add_edge("a", "c");
        assert!(graph.find_circuits().is_empty());
    }

    #[test]
    fn test_find_two_cycle() {
        let mut graph = DependencyGraph::new();
        graph.add_edge("a", "b");
        graph.add_edge("b", "a");
        graph.add_edge("c", "a");

        let circuits = graph.find_circuits();
        assert_eq!(circuits.len(), 1);
        let mut members = circuits[0].clone();
        members.sort();
        assert_eq!(members, vec!["a", "b"]);
    }

    #[test]
    fn test_self_loop_is_a_circuit() {
        let mut graph = DependencyGraph::new();
        graph.add_edge("a", "a");
        graph.add_node("b");
        assert_eq!(graph.find_circuits(), vec![vec!["a".to_string()]]);
    }
}
