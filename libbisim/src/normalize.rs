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

use bisim_graph::Graph;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::Error;

/// A bijection between the nodes of a graph and the integers `0..n`.
///
/// The algorithms in this crate only ever work on the integers; this is what translates inputs
/// and outputs.
#[derive(Clone, Debug)]
pub struct Normalizer<N> {
    nodes: Vec<N>,
    index: HashMap<N, usize>,
}

impl<N: Copy + Eq + Hash + Debug> Normalizer<N> {
    /// Numbers the nodes in the order they are given. It is an error to give the same node twice.
    pub fn new<I: IntoIterator<Item = N>>(nodes: I) -> Result<Normalizer<N>, Error> {
        let mut ret = Normalizer {
            nodes: Vec::new(),
            index: HashMap::new(),
        };
        for n in nodes {
            if ret.index.insert(n, ret.nodes.len()).is_some() {
                return Err(Error::InvalidGraph(format!("node {n:?} appears twice")));
            }
            ret.nodes.push(n);
        }
        Ok(ret)
    }

    /// Numbers the nodes of a graph, in the order of `g.nodes()`.
    pub fn from_graph<G: Graph<Node = N>>(g: &G) -> Result<Normalizer<N>, Error> {
        Normalizer::new(g.nodes())
    }

    /// The number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Are there no nodes at all?
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The number assigned to `n`, if `n` is known.
    pub fn index(&self, n: &N) -> Option<usize> {
        self.index.get(n).cloned()
    }

    /// The node numbered `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of range.
    pub fn node(&self, idx: usize) -> N {
        self.nodes[idx]
    }

    /// The edges of `g`, translated to integers.
    pub fn edges<G: Graph<Node = N>>(&self, g: &G) -> Result<Vec<(usize, usize)>, Error> {
        let mut ret = Vec::new();
        for u in &self.nodes {
            for v in g.out_neighbors(u) {
                let v_idx = self.index(&v).ok_or_else(|| {
                    Error::InvalidGraph(format!(
                        "{u:?} has an edge to {v:?}, which is not one of the nodes"
                    ))
                })?;
                ret.push((self.index[u], v_idx));
            }
        }
        Ok(ret)
    }

    /// Translates an initial partition to integers.
    ///
    /// Every node must belong to exactly one block. Without a partition, all the nodes are put
    /// in a single block.
    pub fn partition(&self, partition: Option<&[Vec<N>]>) -> Result<Vec<Vec<usize>>, Error> {
        let Some(partition) = partition else {
            return Ok(if self.is_empty() {
                Vec::new()
            } else {
                vec![(0..self.len()).collect()]
            });
        };

        let mut seen = vec![false; self.len()];
        let mut ret = Vec::with_capacity(partition.len());
        for block in partition {
            let mut idx_block = Vec::with_capacity(block.len());
            for n in block {
                let idx = self.index(n).ok_or_else(|| {
                    Error::InvalidPartition(format!("{n:?} is not a node of the graph"))
                })?;
                if std::mem::replace(&mut seen[idx], true) {
                    return Err(Error::InvalidPartition(format!(
                        "{n:?} is in more than one block"
                    )));
                }
                idx_block.push(idx);
            }
            if !idx_block.is_empty() {
                ret.push(idx_block);
            }
        }
        if let Some(missing) = seen.iter().position(|&s| !s) {
            return Err(Error::InvalidPartition(format!(
                "{:?} is not in any block",
                self.nodes[missing]
            )));
        }
        Ok(ret)
    }

    /// Translates a partition back from integers.
    pub fn denormalize(&self, partition: Vec<Vec<usize>>) -> Vec<Vec<N>> {
        partition
            .into_iter()
            .map(|block| block.into_iter().map(|i| self.nodes[i]).collect())
            .collect()
    }
}
