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

//! The Paige-Tarjan partition refinement algorithm.
//!
//! We maintain two partitions: Q, which is the partition that we are refining, and X, which is
//! coarser than Q. Q is always stable with respect to every block of X, so when they coincide we
//! are done. Until then, we take a compound X-block `S` (one that contains at least two Q-blocks),
//! pull out its smaller Q-block `B` and make it into an X-block of its own. Restoring stability
//! then needs two splits of Q: one by `E⁻¹(B)` and one by `E⁻¹(B) \ E⁻¹(S \ B)`. The second one is
//! computed without looking at `S \ B`, using the count cells: for each vertex `x` and X-block
//! `S`, the count cell of the edges from `x` into `S` holds the number of such edges.

use crate::decorate::DecoratedGraph;
use crate::entities::{QBlockId, VertexId, XBlockId};

/// A container for the X-blocks that still need to be processed.
///
/// An X-block might be compound when it is pushed, but not when it is popped (for example, if
/// some of its Q-blocks were merged away in the meantime); the caller checks.
pub(crate) trait CompoundQueue {
    fn push(&mut self, graph: &DecoratedGraph, x: XBlockId);
    fn pop(&mut self) -> Option<XBlockId>;
}

impl CompoundQueue for Vec<XBlockId> {
    fn push(&mut self, _graph: &DecoratedGraph, x: XBlockId) {
        Vec::push(self, x);
    }

    fn pop(&mut self) -> Option<XBlockId> {
        Vec::pop(self)
    }
}

/// A queue of compound X-blocks that always returns one of the lowest rank.
///
/// Ranks are small dense integers, so this is a vector of buckets indexed by `rank.index()`,
/// together with the index of the first bucket that might be non-empty.
#[derive(Debug, Default)]
pub(crate) struct RankedCompoundBlocks {
    buckets: Vec<Vec<XBlockId>>,
    first_nonempty: usize,
}

impl RankedCompoundBlocks {
    pub fn new() -> RankedCompoundBlocks {
        RankedCompoundBlocks::default()
    }
}

impl CompoundQueue for RankedCompoundBlocks {
    fn push(&mut self, graph: &DecoratedGraph, x: XBlockId) {
        let idx = graph.xblocks[x.0]
            .qblocks
            .first()
            .and_then(|q| graph.first_vertex(q))
            .map(|v| graph.rank_of(v).index())
            .unwrap_or(0);
        if self.buckets.len() <= idx {
            self.buckets.resize_with(idx + 1, Vec::new);
        }
        self.buckets[idx].push(x);
        self.first_nonempty = self.first_nonempty.min(idx);
    }

    fn pop(&mut self) -> Option<XBlockId> {
        while self.first_nonempty < self.buckets.len() {
            if let Some(x) = self.buckets[self.first_nonempty].pop() {
                return Some(x);
            }
            self.first_nonempty += 1;
        }
        None
    }
}

/// Runs the refinement loop over a `DecoratedGraph`.
///
/// The caller is responsible for the precondition: Q must be stable with respect to every X-block,
/// and every edge's count cell must be correct. This holds for a freshly decorated graph.
pub(crate) struct Refiner<'g, Q> {
    graph: &'g mut DecoratedGraph,
    queue: Q,
}

impl<'g, Q: CompoundQueue> Refiner<'g, Q> {
    pub fn new(graph: &'g mut DecoratedGraph, queue: Q) -> Refiner<'g, Q> {
        Refiner { graph, queue }
    }

    pub fn enqueue(&mut self, x: XBlockId) {
        if self.graph.xblocks[x.0].is_compound() {
            self.queue.push(self.graph, x);
        }
    }

    /// Splits Q by `E⁻¹(block)`, enqueueing any X-block that becomes compound.
    ///
    /// This restores stability after new edges into `block` were added (with correct counts).
    pub fn split_by(&mut self, block: QBlockId) {
        let targets = self.graph.block_vertices(block);
        let preds = self.graph.predecessors(&targets);
        self.split(&preds);
    }

    fn split(&mut self, xs: &[VertexId]) {
        for x in self.graph.split(xs) {
            self.queue.push(self.graph, x);
        }
    }

    /// Refines until no compound X-blocks remain.
    pub fn run(&mut self) {
        let mut steps = 0usize;
        while let Some(s) = self.queue.pop() {
            if self.graph.xblocks[s.0].is_compound() {
                self.step(s);
                steps += 1;
            }
        }
        debug!("partition refinement finished after {steps} steps");
        debug_assert!(self.graph.is_clean());
    }

    /// Takes the smaller of the first two Q-blocks of `s` as the splitter.
    fn extract_splitter(&mut self, s: XBlockId) -> QBlockId {
        let qblocks = &self.graph.xblocks[s.0].qblocks;
        let first = qblocks.first();
        let second = first.and_then(|q| qblocks.next(&self.graph.qblocks, q));
        let (first, second) = match (first, second) {
            (Some(a), Some(b)) => (a, b),
            _ => panic!("{s:?} is not compound"),
        };
        let b = if self.graph.qblocks[first.0].len() <= self.graph.qblocks[second.0].len() {
            first
        } else {
            second
        };

        self.graph.remove_from_xblock(b);
        let bx = self.graph.new_xblock();
        self.graph.add_to_xblock(b, bx);
        if self.graph.xblocks[s.0].is_compound() {
            self.queue.push(self.graph, s);
        }
        b
    }

    fn step(&mut self, s: XBlockId) {
        let b = self.extract_splitter(s);
        let b_vertices = self.graph.block_vertices(b);
        trace!("refining {s:?} with splitter {b:?} ({} vertices)", b_vertices.len());

        // E⁻¹(B), and for each of its elements the number of edges into B.
        let mut preds = Vec::new();
        for &y in &b_vertices {
            for i in 0..self.graph.vertices[y.0].counterimage.len() {
                let e = self.graph.vertices[y.0].counterimage[i];
                let x = self.graph.edges[e.0].source;
                let aux = match self.graph.vertices[x.0].aux_count {
                    Some(c) => c,
                    None => {
                        let c = self.graph.new_count(x, 0);
                        self.graph.vertices[x.0].aux_count = Some(c);
                        c
                    }
                };
                self.graph.counts[aux.0].value += 1;
                if !self.graph.vertices[x.0].visited {
                    self.graph.vertices[x.0].visited = true;
                    preds.push(x);
                }
            }
        }
        for &x in &preds {
            self.graph.vertices[x.0].visited = false;
        }
        self.split(&preds);

        // E⁻¹(B) \ E⁻¹(S \ B): the vertices all of whose edges into S go into B.
        let mut second = Vec::new();
        for &y in &b_vertices {
            for i in 0..self.graph.vertices[y.0].counterimage.len() {
                let e = self.graph.vertices[y.0].counterimage[i];
                let x = self.graph.edges[e.0].source;
                let vx = &self.graph.vertices[x.0];
                if vx.in_second_splitter {
                    continue;
                }
                let into_b = vx.aux_count.map_or(0, |c| self.graph.counts[c.0].value);
                if into_b == self.graph.count_value(e) {
                    self.graph.vertices[x.0].in_second_splitter = true;
                    second.push(x);
                }
            }
        }
        for &x in &second {
            self.graph.vertices[x.0].in_second_splitter = false;
        }
        self.split(&second);

        // The edges into B get their own count cells, and the cells for S shrink.
        for &y in &b_vertices {
            for i in 0..self.graph.vertices[y.0].counterimage.len() {
                let e = self.graph.vertices[y.0].counterimage[i];
                let x = self.graph.edges[e.0].source;
                if let Some(old) = self.graph.edges[e.0].count {
                    self.graph.decrement_count(old);
                }
                self.graph.edges[e.0].count = self.graph.vertices[x.0].aux_count;
            }
        }
        for &x in &preds {
            self.graph.vertices[x.0].aux_count = None;
        }
    }
}

/// Computes the coarsest stable refinement of the graph's current Q-partition, starting from a
/// single X-block.
pub(crate) fn refine(graph: &mut DecoratedGraph) {
    let roots = (0..graph.xblocks.len()).map(XBlockId).collect::<Vec<_>>();
    let mut refiner = Refiner::new(graph, Vec::new());
    for x in roots {
        refiner.enqueue(x);
    }
    refiner.run();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        arb_labeled_graph, canonical, decorate, graph, is_stable, naive_rscp, refines,
    };
    use bisim_graph::DiGraph;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn pt(g: &DiGraph<u32>, partition: Option<&[Vec<u32>]>) -> Vec<Vec<u32>> {
        let mut dg = decorate(g, partition);
        refine(&mut dg);
        assert!(dg.is_clean());
        assert!(dg.counts_are_consistent());
        canonical(dg.partition())
    }

    macro_rules! pt_test {
        ($name:ident, $n:expr, $graph:expr, $partition:expr, $expected:expr) => {
            #[test]
            fn $name() {
                let g = graph($n, $graph);
                let partition: Option<Vec<Vec<u32>>> = $partition;
                let expected: Vec<Vec<u32>> = $expected;
                assert_eq!(pt(&g, partition.as_deref()), canonical(expected));
            }
        };
    }

    pt_test!(
        binary_tree,
        15,
        "0-1, 0-2, 1-3, 1-4, 2-5, 2-6, 3-7, 3-8, 4-9, 4-10, 5-11, 5-12, 6-13, 6-14",
        None,
        vec![
            vec![0],
            vec![1, 2],
            vec![3, 4, 5, 6],
            vec![7, 8, 9, 10, 11, 12, 13, 14]
        ]
    );
    pt_test!(
        cycle_with_feeders,
        8,
        "0-1, 1-2, 2-0, 3-0, 3-4, 4-5, 5-0, 3-6, 6-7",
        None,
        vec![vec![0, 1, 2, 4, 5], vec![3], vec![6], vec![7]]
    );
    pt_test!(
        labeled_cycle,
        3,
        "0-1, 1-2, 2-0",
        Some(vec![vec![0, 1], vec![2]]),
        vec![vec![0], vec![1], vec![2]]
    );
    pt_test!(self_loop, 1, "0-0", None, vec![vec![0]]);
    pt_test!(
        two_chains,
        8,
        "0-1, 1-2, 2-3, 4-5, 5-6, 6-7",
        None,
        vec![vec![0, 4], vec![1, 5], vec![2, 6], vec![3, 7]]
    );
    pt_test!(
        joined_chains,
        8,
        "0-1, 1-2, 2-3, 3-4, 4-5, 5-6, 6-7",
        None,
        vec![
            vec![0],
            vec![1],
            vec![2],
            vec![3],
            vec![4],
            vec![5],
            vec![6],
            vec![7]
        ]
    );
    pt_test!(
        isolated_vertices,
        3,
        "",
        None,
        vec![vec![0, 1, 2]]
    );

    #[test]
    fn ranked_queue_pops_lowest_rank_first() {
        let mut dg = decorate(
            &graph(3, "0-1, 1-2"),
            Some(&[vec![0], vec![1], vec![2]][..]),
        );
        dg.compute_ranks();
        let xs = (0..3)
            .map(|i| {
                let x = dg.new_xblock();
                let q = dg.vertices[i].qblock;
                dg.remove_from_xblock(q);
                dg.add_to_xblock(q, x);
                x
            })
            .collect::<Vec<_>>();
        let mut queue = RankedCompoundBlocks::new();
        queue.push(&dg, xs[0]);
        queue.push(&dg, xs[2]);
        queue.push(&dg, xs[1]);
        assert_eq!(queue.pop(), Some(xs[2]));
        assert_eq!(queue.pop(), Some(xs[1]));
        queue.push(&dg, xs[2]);
        assert_eq!(queue.pop(), Some(xs[2]));
        assert_eq!(queue.pop(), Some(xs[0]));
        assert_eq!(queue.pop(), None);
    }

    proptest! {
        #[test]
        fn matches_naive_refinement((ref g, ref p) in arb_labeled_graph()) {
            let result = pt(g, Some(&p[..]));
            prop_assert_eq!(&result, &naive_rscp(g, p));
            prop_assert!(is_stable(g, &result));
            prop_assert!(refines(&result, p));
        }
    }
}
