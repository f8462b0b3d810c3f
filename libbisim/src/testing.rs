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

// Helpers shared by the unit tests: small graph builders, proptest strategies, and slow but
// obviously correct versions of the algorithms to compare against.

use bisim_graph::{DiGraph, Graph};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Debug;

use crate::decorate::DecoratedGraph;
use crate::rank::Rank;

// Given a number of nodes and a string like "0-3, 1-2, 3-4", creates a graph on `0..n`.
pub fn graph(n: u32, s: &str) -> DiGraph<u32> {
    let mut ret = DiGraph::new();
    for u in 0..n {
        ret.add_node(u);
    }
    for e in s.split(',').filter(|e| !e.trim().is_empty()) {
        let dash_idx = e.find('-').unwrap();
        let u: u32 = e[..dash_idx].trim().parse().unwrap();
        let v: u32 = e[(dash_idx + 1)..].trim().parse().unwrap();
        assert!(u < n && v < n, "edge {u}-{v} out of range");
        ret.add_edge(u, v);
    }
    ret
}

// The nodes of `g` must be `0..n`, in order; then vertex `i` of the result is node `i`.
pub fn decorate(g: &DiGraph<u32>, partition: Option<&[Vec<u32>]>) -> DecoratedGraph {
    assert!(g.nodes().enumerate().all(|(i, u)| i as u32 == u));
    crate::decorate_graph(g, partition).unwrap().1
}

// Sorts each block, and then the blocks.
pub fn canonical<T>(partition: Vec<Vec<T>>) -> Vec<Vec<u32>>
where
    T: TryInto<u32>,
    T::Error: Debug,
{
    let mut ret = partition
        .into_iter()
        .map(|block| {
            let mut block = block
                .into_iter()
                .map(|u| u.try_into().unwrap())
                .collect::<Vec<u32>>();
            block.sort_unstable();
            block
        })
        .collect::<Vec<_>>();
    ret.sort_unstable();
    ret
}

fn graph_from_parts(size: u32, edges: &[(u32, u32)]) -> DiGraph<u32> {
    let mut ret = DiGraph::new();
    for u in 0..size {
        ret.add_node(u);
    }
    for &(u, v) in edges {
        ret.add_edge(u, v);
    }
    ret
}

fn blocks_from_labels(labels: &[u32]) -> Vec<Vec<u32>> {
    let num_labels = labels.iter().max().map_or(0, |&l| l as usize + 1);
    let mut blocks = vec![Vec::new(); num_labels];
    for (u, &l) in labels.iter().enumerate() {
        blocks[l as usize].push(u as u32);
    }
    blocks.retain(|b| !b.is_empty());
    blocks
}

// Small graphs (up to 8 nodes and 20 edges), which is plenty for finding bugs.
prop_compose! {
    pub fn arb_graph()
    (size in 1u32..9)
    (edges in proptest::collection::vec((0..size, 0..size), 0..20), size in Just(size))
    -> DiGraph<u32> {
        graph_from_parts(size, &edges)
    }
}

// A small graph together with an initial partition, given by labelling every node with one of
// three labels.
prop_compose! {
    pub fn arb_labeled_graph()
    (size in 1u32..9)
    (
        edges in proptest::collection::vec((0..size, 0..size), 0..20),
        labels in proptest::collection::vec(0u32..3, size as usize),
        size in Just(size)
    )
    -> (DiGraph<u32>, Vec<Vec<u32>>) {
        (graph_from_parts(size, &edges), blocks_from_labels(&labels))
    }
}

// Like `arb_labeled_graph`, plus a sequence of edges to add.
prop_compose! {
    pub fn arb_saha_case()
    (size in 1u32..9)
    (
        edges in proptest::collection::vec((0..size, 0..size), 0..12),
        labels in proptest::collection::vec(0u32..2, size as usize),
        added in proptest::collection::vec((0..size, 0..size), 1..12),
        size in Just(size)
    )
    -> (DiGraph<u32>, Vec<Vec<u32>>, Vec<(u32, u32)>) {
        (graph_from_parts(size, &edges), blocks_from_labels(&labels), added)
    }
}

// Like `arb_saha_case`, with up to 24 nodes, four labels and longer sequences of additions.
prop_compose! {
    pub fn arb_large_saha_case()
    (size in 1u32..25)
    (
        edges in proptest::collection::vec((0..size, 0..size), 0..40),
        labels in proptest::collection::vec(0u32..4, size as usize),
        added in proptest::collection::vec((0..size, 0..size), 1..30),
        size in Just(size)
    )
    -> (DiGraph<u32>, Vec<Vec<u32>>, Vec<(u32, u32)>) {
        (graph_from_parts(size, &edges), blocks_from_labels(&labels), added)
    }
}

// Naive partition refinement: keep splitting every block according to the set of blocks that
// its elements point to, until nothing changes.
pub fn naive_rscp(g: &DiGraph<u32>, partition: &[Vec<u32>]) -> Vec<Vec<u32>> {
    let mut block_of = HashMap::new();
    for (i, block) in partition.iter().enumerate() {
        for &u in block {
            block_of.insert(u, i);
        }
    }
    let mut num_blocks = partition.len();
    loop {
        let mut ids = HashMap::new();
        let mut next = HashMap::new();
        for u in g.nodes() {
            let succs = g
                .out_neighbors(&u)
                .map(|v| block_of[&v])
                .collect::<BTreeSet<_>>();
            let len = ids.len();
            let id = *ids.entry((block_of[&u], succs)).or_insert(len);
            next.insert(u, id);
        }
        block_of = next;
        if ids.len() == num_blocks {
            break;
        }
        num_blocks = ids.len();
    }

    let mut ret = vec![Vec::new(); num_blocks];
    for (u, b) in block_of {
        ret[b].push(u);
    }
    canonical(ret)
}

// Is every block either entirely inside or entirely outside the predecessors of every block?
pub fn is_stable(g: &DiGraph<u32>, partition: &[Vec<u32>]) -> bool {
    partition.iter().all(|target| {
        let target = target.iter().collect::<HashSet<_>>();
        partition.iter().all(|block| {
            let hits = block
                .iter()
                .filter(|&&u| g.out_neighbors(&u).any(|v| target.contains(&v)))
                .count();
            hits == 0 || hits == block.len()
        })
    })
}

// Is every block of `finer` contained in some block of `coarser`?
pub fn refines(finer: &[Vec<u32>], coarser: &[Vec<u32>]) -> bool {
    finer.iter().all(|block| {
        coarser
            .iter()
            .any(|c| block.iter().all(|u| c.contains(u)))
    })
}

fn reachable(g: &DiGraph<u32>, u: u32) -> Vec<u32> {
    g.dfs_from(vec![u]).reached()
}

fn height(g: &DiGraph<u32>, u: u32, memo: &mut HashMap<u32, usize>) -> usize {
    if let Some(&h) = memo.get(&u) {
        return h;
    }
    let h = g
        .out_neighbors(&u)
        .collect::<Vec<_>>()
        .into_iter()
        .map(|v| height(g, v, memo) + 1)
        .max()
        .unwrap_or(0);
    memo.insert(u, h);
    h
}

// The rank and well-foundedness of every node, straight from the definitions: a node is
// well-founded if it can't reach a cycle, in which case its rank is the length of the longest
// path out of it. Otherwise its rank is the largest `rank(w) + 1` over all edges `x -> w`
// with `x` reachable and not well-founded and `w` well-founded.
pub fn naive_ranks(g: &DiGraph<u32>) -> Vec<(Rank, bool)> {
    let wf = g
        .nodes()
        .map(|u| !reachable(g, u).into_iter().any(|v| g.has_path(&v, &v)))
        .collect::<Vec<_>>();
    let mut memo = HashMap::new();
    g.nodes()
        .map(|u| {
            if wf[u as usize] {
                return (Rank::Finite(height(g, u, &mut memo)), true);
            }
            let rank = reachable(g, u)
                .into_iter()
                .filter(|&x| !wf[x as usize])
                .flat_map(|x| g.out_neighbors(&x).collect::<Vec<_>>())
                .filter(|&w| wf[w as usize])
                .map(|w| Rank::Finite(height(g, w, &mut memo) + 1))
                .max()
                .unwrap_or(Rank::NegInfinity);
            (rank, false)
        })
        .collect()
}
