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

use std::collections::HashMap;
use std::hash::Hash;

use crate::Graph;

/// A simple owned directed graph, stored as adjacency lists.
///
/// Nodes are reported in insertion order, and so are the neighbors of each node. Adding the same
/// edge twice stores it twice.
#[derive(Clone, Debug)]
pub struct DiGraph<N> {
    nodes: Vec<N>,
    index: HashMap<N, usize>,
    out: Vec<Vec<N>>,
    in_: Vec<Vec<N>>,
}

impl<N: Copy + Eq + Hash> Default for DiGraph<N> {
    fn default() -> DiGraph<N> {
        DiGraph::new()
    }
}

impl<N: Copy + Eq + Hash> DiGraph<N> {
    pub fn new() -> DiGraph<N> {
        DiGraph {
            nodes: Vec::new(),
            index: HashMap::new(),
            out: Vec::new(),
            in_: Vec::new(),
        }
    }

    /// Builds a graph from a list of edges; the nodes are the endpoints, in the order they first
    /// appear.
    pub fn from_edges<I: IntoIterator<Item = (N, N)>>(edges: I) -> DiGraph<N> {
        let mut ret = DiGraph::new();
        for (u, v) in edges {
            ret.add_edge(u, v);
        }
        ret
    }

    /// Adds a node, unless it is already present.
    pub fn add_node(&mut self, u: N) {
        self.idx_or_insert(u);
    }

    /// Adds an edge, inserting its endpoints if necessary.
    pub fn add_edge(&mut self, u: N, v: N) {
        let u_idx = self.idx_or_insert(u);
        let v_idx = self.idx_or_insert(v);
        self.out[u_idx].push(v);
        self.in_[v_idx].push(u);
    }

    pub fn contains_node(&self, u: &N) -> bool {
        self.index.contains_key(u)
    }

    pub fn has_edge(&self, u: &N, v: &N) -> bool {
        self.index
            .get(u)
            .is_some_and(|&i| self.out[i].iter().any(|w| w == v))
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.out.iter().map(Vec::len).sum()
    }

    pub fn edges(&self) -> impl Iterator<Item = (N, N)> + '_ {
        self.nodes
            .iter()
            .zip(&self.out)
            .flat_map(|(&u, vs)| vs.iter().map(move |&v| (u, v)))
    }

    fn idx_or_insert(&mut self, u: N) -> usize {
        if let Some(&i) = self.index.get(&u) {
            i
        } else {
            let i = self.nodes.len();
            self.nodes.push(u);
            self.index.insert(u, i);
            self.out.push(Vec::new());
            self.in_.push(Vec::new());
            i
        }
    }

    fn neighbors<'a>(&'a self, adj: &'a [Vec<N>], u: &N) -> Box<dyn Iterator<Item = N> + 'a> {
        match self.index.get(u) {
            Some(&i) => Box::new(adj[i].iter().cloned()),
            None => Box::new(std::iter::empty()),
        }
    }
}

impl<N: Copy + Eq + Hash> Graph for DiGraph<N> {
    type Node = N;
    type Edge = N;

    fn nodes(&self) -> Box<dyn Iterator<Item = N> + '_> {
        Box::new(self.nodes.iter().cloned())
    }

    fn out_edges(&self, u: &N) -> Box<dyn Iterator<Item = N> + '_> {
        self.neighbors(&self.out, u)
    }

    fn in_edges(&self, u: &N) -> Box<dyn Iterator<Item = N> + '_> {
        self.neighbors(&self.in_, u)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order() {
        let g = DiGraph::from_edges(vec![('c', 'a'), ('a', 'b'), ('c', 'b')]);
        assert_eq!(g.nodes().collect::<Vec<_>>(), vec!['c', 'a', 'b']);
        assert_eq!(g.out_neighbors(&'c').collect::<Vec<_>>(), vec!['a', 'b']);
        assert_eq!(g.in_neighbors(&'b').collect::<Vec<_>>(), vec!['a', 'c']);
        assert_eq!(g.num_edges(), 3);
        assert!(g.has_edge(&'a', &'b'));
        assert!(!g.has_edge(&'b', &'a'));
    }

    #[test]
    fn unknown_node() {
        let mut g = DiGraph::new();
        g.add_node(1);
        g.add_node(1);
        assert_eq!(g.num_nodes(), 1);
        assert_eq!(g.out_neighbors(&7).count(), 0);
        assert!(!g.contains_node(&7));
    }
}
