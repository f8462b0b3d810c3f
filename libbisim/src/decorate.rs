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

use crate::entities::{
    Count, CountId, Edge, EdgeId, QBlock, QBlockId, Scc, Vertex, VertexId, XBlock, XBlockId,
};

/// A graph on the vertices `0..n`, together with all the bookkeeping that partition refinement
/// needs.
///
/// Everything (vertices, edges, count cells, blocks and components) lives in an arena owned by
/// this struct, and refers to everything else by index.
#[derive(Clone, Debug)]
pub(crate) struct DecoratedGraph {
    pub vertices: Vec<Vertex>,
    pub edges: Vec<Edge>,
    pub counts: Vec<Count>,
    free_counts: Vec<CountId>,
    pub qblocks: Vec<QBlock>,
    pub xblocks: Vec<XBlock>,
    pub sccs: Vec<Scc>,
}

impl DecoratedGraph {
    /// Builds the graph on `0..num_vertices` with the given edges.
    ///
    /// `blocks` must be a partition of `0..num_vertices`. Every block becomes at most two
    /// Q-blocks, one holding its leaves and the other its non-leaves, and all the Q-blocks go into
    /// a single X-block. Every non-leaf gets one count cell, shared by all of its edges.
    ///
    /// Repeated edges are stored only once.
    pub fn new(num_vertices: usize, edges: &[(usize, usize)], blocks: &[Vec<usize>]) -> Self {
        let mut initial_block = vec![None; num_vertices];
        for (b, block) in blocks.iter().enumerate() {
            for &v in block {
                assert!(initial_block[v].is_none(), "vertex {v} is in two blocks");
                initial_block[v] = Some(b);
            }
        }

        let mut ret = DecoratedGraph {
            vertices: Vec::with_capacity(num_vertices),
            edges: Vec::with_capacity(edges.len()),
            counts: Vec::new(),
            free_counts: Vec::new(),
            qblocks: Vec::new(),
            xblocks: Vec::new(),
            sccs: Vec::new(),
        };
        for (i, b) in initial_block.into_iter().enumerate() {
            let b = b.unwrap_or_else(|| panic!("vertex {i} is in no block"));
            ret.vertices.push(Vertex::new(i, b));
        }

        let mut edges = edges.to_vec();
        edges.sort_unstable();
        edges.dedup();
        for (u, v) in edges {
            ret.push_edge(VertexId(u), VertexId(v));
        }

        for u in 0..num_vertices {
            let out_degree = ret.vertices[u].image.len();
            if out_degree > 0 {
                let c = ret.new_count(VertexId(u), out_degree);
                for i in 0..out_degree {
                    let e = ret.vertices[u].image[i];
                    ret.edges[e.0].count = Some(c);
                }
            }
        }

        let x = (num_vertices > 0).then(|| ret.new_xblock());
        for block in blocks {
            let mut leaves = None;
            let mut inner = None;
            for &v in block {
                let v = VertexId(v);
                let slot = if ret.vertices[v.0].is_leaf() {
                    &mut leaves
                } else {
                    &mut inner
                };
                let q = match *slot {
                    Some(q) => q,
                    None => {
                        let q = ret.new_qblock();
                        *slot = Some(q);
                        q
                    }
                };
                ret.push_vertex(q, v);
            }
            for q in [leaves, inner].into_iter().flatten() {
                if let Some(x) = x {
                    ret.add_to_xblock(q, x);
                }
            }
        }

        debug!(
            "decorated a graph with {} vertices, {} edges and {} initial blocks",
            ret.vertices.len(),
            ret.edges.len(),
            ret.qblocks.len()
        );
        ret
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Adds an edge without touching any count cells.
    pub fn push_edge(&mut self, u: VertexId, v: VertexId) -> EdgeId {
        let e = EdgeId(self.edges.len());
        self.edges.push(Edge {
            source: u,
            destination: v,
            count: None,
        });
        self.vertices[u.0].image.push(e);
        self.vertices[v.0].counterimage.push(e);
        e
    }

    pub fn has_edge(&self, u: VertexId, v: VertexId) -> bool {
        self.vertices[u.0]
            .image
            .iter()
            .any(|e| self.edges[e.0].destination == v)
    }

    pub fn new_count(&mut self, source: VertexId, value: usize) -> CountId {
        if let Some(c) = self.free_counts.pop() {
            self.counts[c.0] = Count { source, value };
            c
        } else {
            self.counts.push(Count { source, value });
            CountId(self.counts.len() - 1)
        }
    }

    /// Decrements a count cell, recycling it once nothing refers to it any more.
    pub fn decrement_count(&mut self, c: CountId) {
        let count = &mut self.counts[c.0];
        assert!(count.value > 0, "count cell {c:?} would become negative");
        count.value -= 1;
        if count.value == 0 {
            self.free_counts.push(c);
        }
    }

    /// Forgets every count cell.
    pub fn reset_counts(&mut self) {
        self.counts.clear();
        self.free_counts.clear();
        for e in &mut self.edges {
            e.count = None;
        }
    }

    pub fn count_value(&self, e: EdgeId) -> usize {
        match self.edges[e.0].count {
            Some(c) => self.counts[c.0].value,
            None => 0,
        }
    }

    pub fn new_qblock(&mut self) -> QBlockId {
        self.qblocks.push(QBlock::new());
        QBlockId(self.qblocks.len() - 1)
    }

    pub fn new_xblock(&mut self) -> XBlockId {
        self.xblocks.push(XBlock::new());
        XBlockId(self.xblocks.len() - 1)
    }

    pub fn push_vertex(&mut self, q: QBlockId, v: VertexId) {
        self.qblocks[q.0].vertices.push_back(&mut self.vertices, v);
        self.vertices[v.0].qblock = q;
    }

    pub fn move_vertex(&mut self, v: VertexId, to: QBlockId) {
        let from = self.vertices[v.0].qblock;
        self.qblocks[from.0].vertices.remove(&mut self.vertices, v);
        self.push_vertex(to, v);
    }

    pub fn add_to_xblock(&mut self, q: QBlockId, x: XBlockId) {
        debug_assert!(self.qblocks[q.0].xblock.is_none());
        self.xblocks[x.0].qblocks.push_back(&mut self.qblocks, q);
        self.qblocks[q.0].xblock = Some(x);
    }

    pub fn remove_from_xblock(&mut self, q: QBlockId) {
        if let Some(x) = self.qblocks[q.0].xblock.take() {
            self.xblocks[x.0].qblocks.remove(&mut self.qblocks, q);
        }
    }

    pub fn block_vertices(&self, q: QBlockId) -> Vec<VertexId> {
        self.qblocks[q.0].vertices.to_vec(&self.vertices)
    }

    pub fn first_vertex(&self, q: QBlockId) -> Option<VertexId> {
        self.qblocks[q.0].vertices.first()
    }

    /// The vertices with an edge into `targets`, each listed once.
    pub fn predecessors(&mut self, targets: &[VertexId]) -> Vec<VertexId> {
        let mut ret = Vec::new();
        for &y in targets {
            for i in 0..self.vertices[y.0].counterimage.len() {
                let e = self.vertices[y.0].counterimage[i];
                let x = self.edges[e.0].source;
                let vx = &mut self.vertices[x.0];
                if !vx.visited {
                    vx.visited = true;
                    ret.push(x);
                }
            }
        }
        for &x in &ret {
            self.vertices[x.0].visited = false;
        }
        ret
    }

    /// Splits every Q-block into the part inside `xs` and the part outside it.
    ///
    /// The vertices in `xs` must be distinct. Each touched block stages the moved vertices in its
    /// helper; afterwards the helper joins the X-block of the original, or replaces the original
    /// if it was emptied. Returns the X-blocks that had one Q-block and now have two.
    pub fn split(&mut self, xs: &[VertexId]) -> Vec<XBlockId> {
        let mut touched = Vec::new();
        for &x in xs {
            let q = self.vertices[x.0].qblock;
            let helper = match self.qblocks[q.0].helper {
                Some(h) => h,
                None => {
                    let h = self.new_qblock();
                    self.qblocks[q.0].helper = Some(h);
                    touched.push(q);
                    h
                }
            };
            self.move_vertex(x, helper);
        }
        touched
            .into_iter()
            .filter_map(|q| self.commit_helper(q))
            .collect()
    }

    fn commit_helper(&mut self, q: QBlockId) -> Option<XBlockId> {
        let helper = self.qblocks[q.0]
            .helper
            .take()
            .unwrap_or_else(|| panic!("block {q:?} has no staged split"));
        let xblock = self.qblocks[q.0].xblock;
        let replaced = self.qblocks[q.0].vertices.is_empty();
        if replaced {
            self.remove_from_xblock(q);
            self.qblocks[q.0].deteached = true;
        }

        let mut now_compound = None;
        if let Some(x) = xblock {
            self.add_to_xblock(helper, x);
            if !replaced && self.xblocks[x.0].qblocks.len() == 2 {
                now_compound = Some(x);
            }
        }
        trace!(
            "split {q:?} into {helper:?} ({} vertices moved{})",
            self.qblocks[helper.0].len(),
            if replaced { ", original emptied" } else { "" }
        );
        now_compound
    }

    /// All non-empty, non-deteached Q-blocks, in order of creation.
    pub fn live_qblocks(&self) -> Vec<QBlockId> {
        (0..self.qblocks.len())
            .map(QBlockId)
            .filter(|q| self.qblocks[q.0].is_live())
            .collect()
    }

    /// The current Q-partition, in terms of the original labels.
    ///
    /// Blocks are sorted internally, and ordered by their smallest element.
    pub fn partition(&self) -> Vec<Vec<usize>> {
        let mut ret = self
            .live_qblocks()
            .into_iter()
            .map(|q| {
                let mut block = self.qblocks[q.0]
                    .vertices
                    .iter(&self.vertices)
                    .map(|v| self.vertices[v.0].original_label)
                    .collect::<Vec<_>>();
                block.sort_unstable();
                block
            })
            .collect::<Vec<_>>();
        ret.sort_unstable_by_key(|block| block[0]);
        ret
    }

    /// Are all the scratch flags of every vertex and every Q-block reset?
    pub fn is_clean(&self) -> bool {
        self.vertices.iter().all(Vertex::is_clean) && self.qblocks.iter().all(QBlock::is_clean)
    }

    /// Checks that every edge's count cell holds the number of edges from the edge's source into
    /// the X-block of the edge's destination.
    #[cfg(test)]
    pub fn counts_are_consistent(&self) -> bool {
        let xblock_of = |v: VertexId| self.qblocks[self.vertices[v.0].qblock.0].xblock;
        self.edges.iter().all(|e| {
            let Some(c) = e.count else {
                return false;
            };
            let x = xblock_of(e.destination);
            let expected = self.vertices[e.source.0]
                .image
                .iter()
                .filter(|f| xblock_of(self.edges[f.0].destination) == x)
                .count();
            self.counts[c.0].source == e.source && self.counts[c.0].value == expected
        })
    }
}

impl Graph for DecoratedGraph {
    type Node = VertexId;
    type Edge = VertexId;

    fn nodes(&self) -> Box<dyn Iterator<Item = VertexId> + '_> {
        Box::new((0..self.vertices.len()).map(VertexId))
    }

    fn out_edges(&self, u: &VertexId) -> Box<dyn Iterator<Item = VertexId> + '_> {
        Box::new(
            self.vertices[u.0]
                .image
                .iter()
                .map(move |e| self.edges[e.0].destination),
        )
    }

    fn in_edges(&self, u: &VertexId) -> Box<dyn Iterator<Item = VertexId> + '_> {
        Box::new(
            self.vertices[u.0]
                .counterimage
                .iter()
                .map(move |e| self.edges[e.0].source),
        )
    }
}
