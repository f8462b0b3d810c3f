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

use itertools::Itertools;
use std::collections::HashMap;

use crate::Graph;

/// A partition of the nodes of a graph.
///
/// Kosaraju's algorithm decomposes a directed graph into strongly connected components. Moreover,
/// those components are ordered topologically: every edge between two different components goes
/// from a lower index to a higher one.
///
/// The partition is itself a graph (the condensation): its nodes are component indices, and there
/// is an edge between two distinct components if there is an edge between any of their members.
pub struct Partition<'a, G: Graph + ?Sized> {
    g: &'a G,
    sets: Vec<Vec<G::Node>>,
    node_map: HashMap<G::Node, usize>,
}

impl<'a, G: Graph + ?Sized> Partition<'a, G> {
    pub(crate) fn new(g: &'a G, sets: Vec<Vec<G::Node>>) -> Partition<'a, G> {
        let mut node_map = HashMap::new();
        for (i, component) in sets.iter().enumerate() {
            for u in component {
                node_map.insert(*u, i);
            }
        }
        Partition { g, sets, node_map }
    }

    pub fn num_components(&self) -> usize {
        self.sets.len()
    }

    pub fn parts(&self) -> impl Iterator<Item = &Vec<G::Node>> {
        self.sets.iter()
    }

    pub fn part(&self, idx: usize) -> &[G::Node] {
        &self.sets[idx]
    }

    /// The index of the component containing `u`.
    ///
    /// Panics if `u` is not a node of the underlying graph.
    pub fn component_of(&self, u: &G::Node) -> usize {
        self.node_map[u]
    }

    pub fn into_parts(self) -> Vec<Vec<G::Node>> {
        self.sets
    }

    fn neighbors<'b, I>(&'b self, u: usize, f: I) -> Box<dyn Iterator<Item = usize> + 'b>
    where
        I: Fn(&G::Node) -> Box<dyn Iterator<Item = G::Node> + 'b>,
    {
        let neighbors = self.sets[u]
            .iter()
            .flat_map(f)
            .map(|v| self.node_map[&v])
            .filter(move |&c| c != u)
            .sorted_unstable()
            .dedup();
        Box::new(neighbors)
    }
}

impl<G: Graph + ?Sized> Graph for Partition<'_, G> {
    type Node = usize;
    type Edge = usize;

    fn nodes(&self) -> Box<dyn Iterator<Item = usize> + '_> {
        Box::new(0..self.num_components())
    }

    fn out_edges(&self, u: &usize) -> Box<dyn Iterator<Item = usize> + '_> {
        self.neighbors(*u, |v| self.g.out_neighbors(v))
    }

    fn in_edges(&self, u: &usize) -> Box<dyn Iterator<Item = usize> + '_> {
        self.neighbors(*u, |v| self.g.in_neighbors(v))
    }
}
