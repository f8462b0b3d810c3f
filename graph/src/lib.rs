// Copyright 2018-2019 Joe Neeman.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// See the LICENSE-APACHE or LICENSE-MIT files at the top-level directory
// of this distribution.

#[cfg(test)]
#[macro_use]
extern crate proptest;

use std::collections::HashSet;
use std::hash::Hash;

pub mod dfs;
pub mod digraph;
pub mod kosaraju;
pub mod partition;

pub use crate::{
    dfs::{Dfs, Status, Visit},
    digraph::DiGraph,
    partition::Partition,
};

pub trait Edge<N> {
    fn target(&self) -> N;
}

impl<N: Copy> Edge<N> for N {
    fn target(&self) -> N {
        *self
    }
}

/// A directed graph.
///
/// The edges returned by `in_edges(u)` have their *source* as `target()`; that is,
/// `in_neighbors(u)` are exactly the nodes with an edge pointing to `u`.
pub trait Graph {
    type Node: Copy + Eq + Hash;
    type Edge: Copy + Eq + Edge<Self::Node>;

    fn nodes(&self) -> Box<dyn Iterator<Item = Self::Node> + '_>;
    fn out_edges(&self, u: &Self::Node) -> Box<dyn Iterator<Item = Self::Edge> + '_>;
    fn in_edges(&self, u: &Self::Node) -> Box<dyn Iterator<Item = Self::Edge> + '_>;

    fn out_neighbors(&self, u: &Self::Node) -> Box<dyn Iterator<Item = Self::Node> + '_> {
        Box::new(self.out_edges(u).map(|e| e.target()))
    }

    fn in_neighbors(&self, u: &Self::Node) -> Box<dyn Iterator<Item = Self::Node> + '_> {
        Box::new(self.in_edges(u).map(|e| e.target()))
    }

    /// A depth-first traversal of the whole graph, taking roots in the order of `nodes()`.
    fn dfs(&self) -> Dfs<'_, Self> {
        Dfs::new(self)
    }

    /// A depth-first traversal that only starts from the given roots (in order).
    fn dfs_from(&self, roots: Vec<Self::Node>) -> Dfs<'_, Self> {
        Dfs::new_from(self, roots)
    }

    /// Decomposes the graph into strongly connected components, using Kosaraju's two-pass
    /// algorithm. The components are returned in topological order.
    fn kosaraju(&self) -> Partition<'_, Self> {
        kosaraju::Kosaraju::from_graph(self).run()
    }

    /// Returns the graph with every edge turned around.
    fn reversed(&self) -> Reversed<'_, Self> {
        Reversed { graph: self }
    }

    /// Returns the subgraph of this graph that is induced by the set of nodes for which
    /// `predicate` returns `true`.
    fn node_filtered<F>(&self, predicate: F) -> NodeFiltered<'_, Self, F>
    where
        F: Fn(&Self::Node) -> bool,
    {
        NodeFiltered {
            predicate,
            graph: self,
        }
    }

    /// Is there a path of positive length from `u` to `v`?
    fn has_path(&self, u: &Self::Node, v: &Self::Node) -> bool {
        self.dfs_from(vec![*u])
            .any(|visit| matches!(visit, Visit::Edge { dst, .. } if dst == *v))
    }

    /// If this graph is acyclic, returns a topological sort of the vertices. Otherwise, returns
    /// `None`.
    fn top_sort(&self) -> Option<Vec<Self::Node>> {
        let mut visiting = HashSet::new();
        let mut top_sort = Vec::new();
        // We build up a topological sort in reverse, by running a DFS and adding a node to the
        // topological sort each time we retreat from it.
        for visit in self.dfs() {
            match visit {
                Visit::Edge { src: _, dst, status } => {
                    if visiting.contains(&dst) {
                        // We found a cycle in the graph, so there is no topological sort.
                        return None;
                    }
                    if status == Status::New {
                        visiting.insert(dst);
                    }
                }
                Visit::Retreat { u, parent: _ } => {
                    top_sort.push(u);
                    let removed = visiting.remove(&u);
                    assert!(removed);
                }
                Visit::Root(u) => {
                    assert!(visiting.is_empty());
                    visiting.insert(u);
                }
            }
        }
        top_sort.reverse();
        Some(top_sort)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct NodeFiltered<'a, G, F>
where
    G: Graph + ?Sized,
    F: Fn(&G::Node) -> bool,
{
    predicate: F,
    graph: &'a G,
}

impl<G, F> Graph for NodeFiltered<'_, G, F>
where
    G: Graph + ?Sized,
    F: Fn(&G::Node) -> bool,
{
    type Node = G::Node;
    type Edge = G::Edge;

    fn nodes(&self) -> Box<dyn Iterator<Item = Self::Node> + '_> {
        Box::new(self.graph.nodes().filter(move |n| (self.predicate)(n)))
    }

    fn out_edges(&self, u: &Self::Node) -> Box<dyn Iterator<Item = Self::Edge> + '_> {
        Box::new(
            self.graph
                .out_edges(u)
                .filter(move |e| (self.predicate)(&e.target())),
        )
    }

    fn in_edges(&self, u: &Self::Node) -> Box<dyn Iterator<Item = Self::Edge> + '_> {
        Box::new(
            self.graph
                .in_edges(u)
                .filter(move |e| (self.predicate)(&e.target())),
        )
    }
}

#[derive(Clone, Debug)]
pub struct Reversed<'a, G: Graph + ?Sized> {
    graph: &'a G,
}

impl<G> Graph for Reversed<'_, G>
where
    G: Graph + ?Sized,
{
    type Node = G::Node;
    type Edge = G::Edge;

    fn nodes(&self) -> Box<dyn Iterator<Item = Self::Node> + '_> {
        self.graph.nodes()
    }

    fn out_edges(&self, u: &Self::Node) -> Box<dyn Iterator<Item = Self::Edge> + '_> {
        self.graph.in_edges(u)
    }

    fn in_edges(&self, u: &Self::Node) -> Box<dyn Iterator<Item = Self::Edge> + '_> {
        self.graph.out_edges(u)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{DiGraph, Graph};
    use proptest::prelude::*;

    // Given a string like "0-3, 1-2, 3-4, 2-3", creates a graph.
    pub fn graph(s: &str) -> DiGraph<u32> {
        let mut ret = DiGraph::new();
        for e in s.split(',') {
            let dash_idx = e.find('-').unwrap();
            let u: u32 = e[..dash_idx].trim().parse().unwrap();
            let v: u32 = e[(dash_idx + 1)..].trim().parse().unwrap();
            for w in 0..=u.max(v) {
                ret.add_node(w);
            }
            ret.add_edge(u, v);
        }
        ret
    }

    macro_rules! top_sort_test {
        ($name:ident, $graph:expr, $expected:expr) => {
            #[test]
            fn $name() {
                let g = graph($graph);
                let top_sort = g.top_sort();
                assert_eq!(top_sort, $expected);
            }
        };
    }

    top_sort_test!(top_sort_chain, "0-1, 1-3, 3-2", Some(vec![0, 1, 3, 2]));
    top_sort_test!(top_sort_cycle, "0-1, 1-2, 2-3, 3-1", None);
    top_sort_test!(top_sort_tree, "0-2, 2-3, 1-3", Some(vec![1, 0, 2, 3]));
    top_sort_test!(top_sort_self_loop, "0-1, 1-1", None);

    #[test]
    fn has_path() {
        let g = graph("0-1, 1-2, 3-3");
        assert!(g.has_path(&0, &2));
        assert!(!g.has_path(&2, &0));
        assert!(!g.has_path(&0, &0));
        assert!(g.has_path(&3, &3));
    }

    #[test]
    fn reversed_swaps_directions() {
        let g = graph("0-1, 0-2, 2-1");
        let r = g.reversed();
        let mut preds = r.out_neighbors(&1).collect::<Vec<_>>();
        preds.sort();
        assert_eq!(preds, vec![0, 2]);
        assert_eq!(r.in_neighbors(&0).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn node_filtered_drops_edges() {
        let g = graph("0-1, 1-2, 2-0");
        let f = g.node_filtered(|n| *n != 1);
        assert_eq!(f.nodes().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(f.out_neighbors(&0).count(), 0);
        assert_eq!(f.out_neighbors(&2).collect::<Vec<_>>(), vec![0]);
    }

    // A strategy for generating arbitrary graphs (with up to 20 nodes and up to 40 edges).
    prop_compose! {
        pub fn arb_graph()
        (size in 1u32..20)
        (edges in proptest::collection::vec((0..size, 0..size), 0..40), size in Just(size))
        -> DiGraph<u32> {
            let mut ret = DiGraph::new();
            for u in 0..size {
                ret.add_node(u);
            }
            for (u, v) in edges {
                ret.add_edge(u, v);
            }
            ret
        }
    }

    // Like `arb_graph`, but every edge points from a smaller node to a larger one.
    prop_compose! {
        pub fn arb_dag()
        (size in 1u32..20)
        (edges in proptest::collection::vec((0..size, 0..size), 0..40), size in Just(size))
        -> DiGraph<u32> {
            let mut ret = DiGraph::new();
            for u in 0..size {
                ret.add_node(u);
            }
            for (u, v) in edges {
                if u < v {
                    ret.add_edge(u, v);
                }
            }
            ret
        }
    }

    proptest! {
        #[test]
        fn top_sort_proptest(ref g in arb_graph()) {
            if let Some(sort) = g.top_sort() {
                for i in 0..sort.len() {
                    for j in (i+1)..sort.len() {
                        let u = sort[i];
                        let v = sort[j];
                        // v appears after u in the topological sort, so there must not be any
                        // edge from v to u.
                        assert!(!g.has_edge(&v, &u));
                    }
                }
            }
        }

        #[test]
        fn reversed_proptest(ref g in arb_graph()) {
            let r = g.reversed();
            for u in g.nodes() {
                for v in g.out_neighbors(&u) {
                    assert!(r.out_neighbors(&v).any(|x| x == u));
                }
                for v in r.out_neighbors(&u) {
                    assert!(g.has_edge(&v, &u));
                }
            }
        }
    }
}
