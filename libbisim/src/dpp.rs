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

//! The Dovier-Piazza-Policriti algorithm.
//!
//! Since bisimilar vertices have the same rank, we can start by partitioning the vertices by rank
//! and then handle one rank at a time, from the bottom up. Edges never go up in rank, so by the
//! time we get to rank `r`, all the blocks below `r` are final. Each final block is used once to
//! split the blocks above it; what is left to do within rank `r` only involves the edges between
//! vertices of rank `r`, and that is a (hopefully much smaller) Paige-Tarjan problem.

use std::collections::{BTreeMap, HashSet};

use crate::decorate::DecoratedGraph;
use crate::entities::{EdgeId, QBlockId, VertexId};
use crate::paige_tarjan::Refiner;
use crate::rank::Rank;

type Adjacency = (Vec<EdgeId>, Vec<EdgeId>);

/// The live Q-blocks, filed by rank.
///
/// Blocks are filed when they are first seen. A block that has been emptied or deteached in the
/// meantime is skipped on the way out, and so is a block whose rank changed since it was filed;
/// [`RankedPartition::file`] puts it in its new place. Every block must be rank-homogeneous.
#[derive(Clone, Debug, Default)]
pub(crate) struct RankedPartition {
    buckets: Vec<Vec<QBlockId>>,
    // The rank index that each block was last filed under.
    filed: Vec<Option<usize>>,
}

impl RankedPartition {
    pub fn new(graph: &DecoratedGraph) -> RankedPartition {
        let mut ret = RankedPartition::default();
        ret.refresh(graph);
        ret
    }

    /// Files every block that was created since the last call.
    pub fn refresh(&mut self, graph: &DecoratedGraph) {
        for q in self.filed.len()..graph.qblocks.len() {
            self.filed.push(None);
            self.file(graph, QBlockId(q));
        }
    }

    /// Files `q` under its current rank, unless it is already there.
    pub fn file(&mut self, graph: &DecoratedGraph, q: QBlockId) {
        if !graph.qblocks[q.0].is_live() {
            return;
        }
        if let Some(v) = graph.first_vertex(q) {
            let idx = graph.rank_of(v).index();
            if self.filed[q.0] != Some(idx) {
                if self.buckets.len() <= idx {
                    self.buckets.resize_with(idx + 1, Vec::new);
                }
                self.buckets[idx].push(q);
                self.filed[q.0] = Some(idx);
            }
        }
    }

    /// The number of rank indices, i.e. one more than the highest finite rank.
    pub fn num_ranks(&self) -> usize {
        self.buckets.len()
    }

    /// The live blocks of the given rank.
    pub fn blocks(&mut self, graph: &DecoratedGraph, rank: Rank) -> Vec<QBlockId> {
        let idx = rank.index();
        let filed = &self.filed;
        match self.buckets.get_mut(idx) {
            Some(bucket) => {
                let mut seen = HashSet::new();
                bucket.retain(|q| {
                    graph.qblocks[q.0].is_live() && filed[q.0] == Some(idx) && seen.insert(*q)
                });
                bucket.clone()
            }
            None => Vec::new(),
        }
    }
}

/// Moves every vertex into a fresh Q-block, according to its rank and its initial block. The
/// blocks of each rank share one X-block.
fn regroup_by_rank(graph: &mut DecoratedGraph) {
    for q in graph.live_qblocks() {
        graph.remove_from_xblock(q);
    }

    let mut groups = BTreeMap::new();
    let mut rank_xblocks = BTreeMap::new();
    for v in 0..graph.num_vertices() {
        let v = VertexId(v);
        let rank = graph.rank_of(v);
        let key = (rank, graph.vertices[v.0].initial_block);
        let q = match groups.get(&key) {
            Some(&q) => q,
            None => {
                let q = graph.new_qblock();
                let x = match rank_xblocks.get(&rank) {
                    Some(&x) => x,
                    None => {
                        let x = graph.new_xblock();
                        rank_xblocks.insert(rank, x);
                        x
                    }
                };
                graph.add_to_xblock(q, x);
                groups.insert(key, q);
                q
            }
        };
        let old = graph.vertices[v.0].qblock;
        graph.move_vertex(v, q);
        if graph.qblocks[old.0].vertices.is_empty() {
            graph.qblocks[old.0].deteached = true;
        }
    }
}

/// Runs Paige-Tarjan on the subgraph induced by the given blocks, which must all have the same
/// rank and share an X-block.
pub(crate) fn refine_rank(graph: &mut DecoratedGraph, blocks: &[QBlockId]) {
    let vertices = blocks
        .iter()
        .flat_map(|&q| graph.block_vertices(q))
        .collect::<Vec<_>>();

    // The vertices of this rank get labels 0..k for the duration, which we also use to index
    // the saved adjacency lists.
    for (i, &v) in vertices.iter().enumerate() {
        graph.vertices[v.0].label = i;
    }
    let saved = restrict_to_subgraph(graph, &vertices);

    // The initial partition must be stable with respect to the whole subgraph.
    let leaves = vertices
        .iter()
        .cloned()
        .filter(|v| graph.vertices[v.0].is_leaf())
        .collect::<Vec<_>>();
    graph.split(&leaves);

    for &v in &vertices {
        let out_degree = graph.vertices[v.0].image.len();
        if out_degree > 0 {
            let c = graph.new_count(v, out_degree);
            for i in 0..out_degree {
                let e = graph.vertices[v.0].image[i];
                graph.edges[e.0].count = Some(c);
            }
        }
    }

    let first = graph.vertices[vertices[0].0].qblock;
    if let Some(x) = graph.qblocks[first.0].xblock {
        let mut refiner = Refiner::new(graph, Vec::new());
        refiner.enqueue(x);
        refiner.run();
    }

    restore_subgraph(graph, &vertices, saved);
}

/// Drops every edge that leaves `vertices`, returning the original adjacency lists (indexed by
/// label).
fn restrict_to_subgraph(graph: &mut DecoratedGraph, vertices: &[VertexId]) -> Vec<Adjacency> {
    for &v in vertices {
        graph.vertices[v.0].allow_visit = true;
    }
    let mut saved = Vec::with_capacity(vertices.len());
    for &v in vertices {
        debug_assert_eq!(graph.vertices[v.0].label, saved.len());
        let image = std::mem::take(&mut graph.vertices[v.0].image);
        let counterimage = std::mem::take(&mut graph.vertices[v.0].counterimage);
        let allowed = |u: VertexId| graph.vertices[u.0].allow_visit;
        let restricted_image = image
            .iter()
            .cloned()
            .filter(|e| allowed(graph.edges[e.0].destination))
            .collect();
        let restricted_counterimage = counterimage
            .iter()
            .cloned()
            .filter(|e| allowed(graph.edges[e.0].source))
            .collect();
        graph.vertices[v.0].image = restricted_image;
        graph.vertices[v.0].counterimage = restricted_counterimage;
        saved.push((image, counterimage));
    }
    for &v in vertices {
        graph.vertices[v.0].allow_visit = false;
    }
    saved
}

fn restore_subgraph(graph: &mut DecoratedGraph, vertices: &[VertexId], mut saved: Vec<Adjacency>) {
    for &v in vertices {
        let vx = &mut graph.vertices[v.0];
        let (image, counterimage) = std::mem::take(&mut saved[vx.label]);
        vx.image = image;
        vx.counterimage = counterimage;
        vx.label = vx.original_label;
    }
}

/// Makes the first vertex of `block` stand for the whole block, by giving it all the incoming
/// edges of the others.
fn collapse(graph: &mut DecoratedGraph, block: QBlockId) -> VertexId {
    let vertices = graph.block_vertices(block);
    let survivor = vertices[0];
    for &v in &vertices[1..] {
        let mut counterimage = std::mem::take(&mut graph.vertices[v.0].counterimage);
        graph.vertices[survivor.0]
            .counterimage
            .append(&mut counterimage);
        graph.vertices[v.0].collapsed_to = Some(survivor);
    }
    survivor
}

/// Splits the blocks above the rank of `survivor` by the predecessors of its (collapsed) block.
fn split_upper_ranks(graph: &mut DecoratedGraph, survivor: VertexId) {
    let rank = graph.rank_of(survivor);
    let mut preds = Vec::new();
    for i in 0..graph.vertices[survivor.0].counterimage.len() {
        let e = graph.vertices[survivor.0].counterimage[i];
        let x = graph.edges[e.0].source;
        // Edges from within the rank come from vertices that may already be collapsed.
        if graph.rank_of(x) <= rank {
            continue;
        }
        debug_assert!(graph.vertices[x.0].collapsed_to.is_none());
        if !graph.vertices[x.0].visited {
            graph.vertices[x.0].visited = true;
            preds.push(x);
        }
    }
    for &x in &preds {
        graph.vertices[x.0].visited = false;
    }

    // Moving the only vertex of a block somewhere else doesn't split anything.
    preds.retain(|x| graph.qblocks[graph.vertices[x.0].qblock.0].len() > 1);
    graph.split(&preds);
}

/// Computes the coarsest stable refinement of the graph's Q-partition, one rank at a time.
///
/// This consumes the graph, in the sense that only its partition is meaningful afterwards.
pub(crate) fn dovier_piazza_policriti(graph: &mut DecoratedGraph) {
    graph.compute_ranks();
    graph.reset_counts();
    regroup_by_rank(graph);

    let mut ranked = RankedPartition::new(graph);
    for idx in 0..ranked.num_ranks() {
        let rank = Rank::from_index(idx);
        let blocks = ranked.blocks(graph, rank);
        if blocks.iter().any(|q| graph.qblocks[q.0].len() > 1) {
            trace!("refining the {} blocks of rank {rank}", blocks.len());
            refine_rank(graph, &blocks);
            ranked.refresh(graph);
        }
        for q in ranked.blocks(graph, rank) {
            let survivor = collapse(graph, q);
            split_upper_ranks(graph, survivor);
            ranked.refresh(graph);
        }
    }
    debug!("processed {} ranks", ranked.num_ranks());
    debug_assert!(graph.is_clean());
}
