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

//! Saha's incremental algorithm: maintaining the maximum bisimulation while edges are added.
//!
//! Between two additions, the graph is kept in a resting state: the Q-partition is the maximum
//! bisimulation, every Q-block is alone in its X-block, the count cells are correct and the
//! components and ranks are up to date.
//!
//! Adding `u -> v` can both split and merge blocks. If `[u]` already had an edge into `[v]`,
//! nothing changes. Otherwise we first split `[u]` and refine as in Paige-Tarjan; the result is
//! stable, so it is finer than the new maximum bisimulation. Then blocks are merged one rank at a
//! time, from the bottom up, starting from `[u]`.
//!
//! At each rank `r` we collect the blocks that are "in play": the blocks waiting at that rank,
//! the blocks of rank `r` with edges into them, and the blocks that agree with one of them on
//! their label and their successors below `r`. Everything below `r` is final by then, and so is
//! every block of rank `r` that is not in play. Two blocks in play are merged unless some settled
//! block tells them apart (see `exists_causal_splitter`). Merging blocks with edges into other
//! blocks in play is optimistic, so in that case all the blocks in play are refined again using
//! the edges between them. Whenever blocks are merged, their predecessors above `r` wait for their
//! own rank.

use bisim_graph::Graph;
use itertools::Itertools;
use std::collections::{BTreeMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

use crate::decorate::DecoratedGraph;
use crate::dpp::{RankedPartition, refine_rank};
use crate::entities::{CountId, QBlockId, SccId, VertexId};
use crate::normalize::Normalizer;
use crate::paige_tarjan::{RankedCompoundBlocks, Refiner, refine};
use crate::rank::Rank;
use crate::{Error, decorate_graph};

/// The maximum bisimulation of a graph that grows one edge at a time.
///
/// ```
/// use bisim_graph::DiGraph;
/// use libbisim::Saha;
///
/// let g = DiGraph::from_edges(vec![("a", "b"), ("c", "d")]);
/// let mut saha = Saha::new(&g, None).unwrap();
/// assert_eq!(saha.partition(), vec![vec!["a", "c"], vec!["b", "d"]]);
///
/// let p = saha.add_edge("b", "c").unwrap();
/// assert_eq!(p, vec![vec!["a"], vec!["b"], vec!["c"], vec!["d"]]);
/// ```
#[derive(Clone, Debug)]
pub struct Saha<N> {
    graph: DecoratedGraph,
    ranked: RankedPartition,
    normalizer: Normalizer<N>,
}

impl<N: Copy + Eq + Hash + Debug> Saha<N> {
    /// Computes the maximum bisimulation of `g` (refining `initial_partition`, if there is one),
    /// and gets ready to update it.
    pub fn new<G: Graph<Node = N>>(
        g: &G,
        initial_partition: Option<&[Vec<N>]>,
    ) -> Result<Saha<N>, Error> {
        let (normalizer, mut graph) = decorate_graph(g, initial_partition)?;
        refine(&mut graph);
        graph.compute_ranks();
        let ranked = RankedPartition::new(&graph);
        Ok(Saha {
            graph,
            ranked,
            normalizer,
        })
    }

    /// The current maximum bisimulation.
    pub fn partition(&self) -> Vec<Vec<N>> {
        self.normalizer.denormalize(self.graph.partition())
    }

    /// The current rank of `node`, if it is a node of the graph.
    pub fn rank(&self, node: &N) -> Option<Rank> {
        let idx = self.normalizer.index(node)?;
        Some(self.graph.rank_of(VertexId(idx)))
    }

    /// Is `node` currently well-founded? Returns `None` if it is not a node of the graph.
    pub fn is_well_founded(&self, node: &N) -> Option<bool> {
        let idx = self.normalizer.index(node)?;
        Some(self.graph.is_well_founded(VertexId(idx)))
    }

    /// Adds the edge `u -> v` and returns the updated maximum bisimulation.
    ///
    /// Adding an edge that is already there changes nothing. Both endpoints must already be nodes
    /// of the graph.
    pub fn add_edge(&mut self, u: N, v: N) -> Result<Vec<Vec<N>>, Error> {
        let idx = |n: &N| {
            self.normalizer.index(n).ok_or_else(|| {
                Error::InvalidEdge(format!("{u:?} -> {v:?}: {n:?} is not a node of the graph"))
            })
        };
        let (u_idx, v_idx) = (idx(&u)?, idx(&v)?);
        add_edge(
            &mut self.graph,
            &mut self.ranked,
            VertexId(u_idx),
            VertexId(v_idx),
        );
        Ok(self.partition())
    }
}

fn add_edge(graph: &mut DecoratedGraph, ranked: &mut RankedPartition, u: VertexId, v: VertexId) {
    if graph.has_edge(u, v) {
        debug!("{u:?} -> {v:?} is already present");
        return;
    }

    if let Some(c) = existing_count(graph, u, v) {
        debug!("{u:?} -> {v:?}: the block of {u:?} already reaches the block of {v:?}");
        let e = graph.push_edge(u, v);
        graph.edges[e.0].count = Some(c);
        graph.counts[c.0].value += 1;
        let update = update_ranks(graph, u, v);
        refile(graph, ranked, &update.changed);
        return;
    }

    let e = graph.push_edge(u, v);
    let c = graph.new_count(u, 1);
    graph.edges[e.0].count = Some(c);

    let target = graph.vertices[v.0].qblock;
    ranked_split(graph, target);
    let update = update_ranks(graph, u, v);
    debug!(
        "{u:?} -> {v:?}: {} components changed rank{}",
        update.changed.len(),
        if update.new_scc.is_some() {
            ", new cycle"
        } else {
            ""
        }
    );
    ranked.refresh(graph);
    refile(graph, ranked, &update.changed);
    match update.new_scc {
        Some(ancestors) => merge_split_phase(graph, ranked, &ancestors),
        None => merge_phase(graph, ranked, u),
    }
    debug_assert!(graph.is_clean());
}

/// If the block of `u` already has an edge into the block of `v`, returns the count cell of the
/// edges from `u` into the block of `v`.
fn existing_count(graph: &DecoratedGraph, u: VertexId, v: VertexId) -> Option<CountId> {
    let target = graph.vertices[v.0].qblock;
    let into_target = |w: VertexId| {
        graph.vertices[w.0]
            .image
            .iter()
            .find(|e| graph.vertices[graph.edges[e.0].destination.0].qblock == target)
            .cloned()
    };
    let w = graph.first_vertex(graph.vertices[u.0].qblock)?;
    into_target(w)?;
    // The block of `u` is stable, so `u` has an edge into `target` as well.
    into_target(u).and_then(|e| graph.edges[e.0].count)
}

/// Restores stability after a new edge into `block`, refining lower ranks first.
fn ranked_split(graph: &mut DecoratedGraph, block: QBlockId) {
    let mut refiner = Refiner::new(graph, RankedCompoundBlocks::new());
    refiner.split_by(block);
    refiner.run();
}

/// Returns every ancestor of `u` (including `u` itself), in the order they finish in a depth-first
/// search of the reversed graph, and whether `v` is among them.
fn check_new_scc(graph: &DecoratedGraph, u: VertexId, v: VertexId) -> (Vec<VertexId>, bool) {
    let mut found = false;
    let mut finished = Vec::new();
    for visit in graph.reversed().dfs_from(vec![u]) {
        found |= visit.reached() == Some(v);
        finished.extend(visit.finished());
    }
    (finished, found)
}

/// What adding an edge did to the components.
struct RankUpdate {
    /// The components whose rank or well-foundedness changed.
    changed: Vec<SccId>,
    /// Set if the edge closed a new cycle: the ancestors of its source, in finishing order.
    new_scc: Option<Vec<VertexId>>,
}

/// Brings the components and ranks up to date after adding `u -> v`.
fn update_ranks(graph: &mut DecoratedGraph, u: VertexId, v: VertexId) -> RankUpdate {
    let (su, sv) = (graph.scc_of(u), graph.scc_of(v));
    if su == sv {
        // Only a self-loop on a trivial component changes anything.
        let changed = if graph.sccs[su.0].wf {
            graph.propagate_nwf(su)
        } else {
            Vec::new()
        };
        return RankUpdate {
            changed,
            new_scc: None,
        };
    }

    // Everything that reaches `u` has at least the rank of `u`, so `v` can only reach `u` if it
    // isn't below it.
    if graph.rank_of(u) <= graph.rank_of(v) {
        let (ancestors, closes_cycle) = check_new_scc(graph, u, v);
        if closes_cycle {
            // The new component consists of everything on a path from `v` to `u`.
            for &a in &ancestors {
                graph.vertices[a.0].allow_visit = true;
            }
            let members = graph
                .node_filtered(|w| graph.vertices[w.0].allow_visit)
                .dfs_from(vec![v])
                .reached()
                .into_iter()
                .map(|w| graph.scc_of(w))
                .sorted()
                .dedup()
                .collect::<Vec<_>>();
            for &a in &ancestors {
                graph.vertices[a.0].allow_visit = false;
            }
            let merged = graph.merge_sccs(&members);
            return RankUpdate {
                changed: graph.propagate_nwf(merged),
                new_scc: Some(ancestors),
            };
        }
    }

    graph.add_scc_edge(su, sv);
    let changed = if graph.sccs[su.0].wf && !graph.sccs[sv.0].wf {
        graph.propagate_nwf(su)
    } else {
        let contribution = graph.contribution(sv);
        if contribution > graph.sccs[su.0].rank {
            graph.sccs[su.0].rank = contribution;
            let mut changed = vec![su];
            changed.extend(graph.propagate_wf(su));
            changed
        } else {
            Vec::new()
        }
    };
    RankUpdate {
        changed,
        new_scc: None,
    }
}

/// Files the blocks of the given components under their new ranks.
fn refile(graph: &DecoratedGraph, ranked: &mut RankedPartition, changed: &[SccId]) {
    for &s in changed {
        for &w in &graph.sccs[s.0].vertices {
            ranked.file(graph, graph.vertices[w.0].qblock);
        }
    }
}

/// Blocks waiting to be merged, by rank.
type Pending = BTreeMap<Rank, Vec<QBlockId>>;

fn block_rank(graph: &DecoratedGraph, q: QBlockId) -> Rank {
    let v = graph
        .first_vertex(q)
        .unwrap_or_else(|| panic!("the block {q:?} is empty"));
    graph.rank_of(v)
}

fn initial_block(graph: &DecoratedGraph, q: QBlockId) -> usize {
    let v = graph
        .first_vertex(q)
        .unwrap_or_else(|| panic!("the block {q:?} is empty"));
    graph.vertices[v.0].initial_block
}

/// Marks `q` and puts it in `pending`, unless it is already marked.
fn enqueue(graph: &mut DecoratedGraph, pending: &mut Pending, q: QBlockId) {
    if !graph.qblocks[q.0].tried_merge {
        graph.qblocks[q.0].tried_merge = true;
        pending.entry(block_rank(graph, q)).or_default().push(q);
    }
}

/// Is `q` of rank `rank` and still waiting to be merged?
fn is_in_play(graph: &DecoratedGraph, q: QBlockId, rank: Rank) -> bool {
    graph.qblocks[q.0].tried_merge && block_rank(graph, q) == rank
}

/// The blocks that `v` has edges into, each listed once.
fn successor_blocks(graph: &mut DecoratedGraph, v: VertexId) -> Vec<QBlockId> {
    let mut ret = Vec::new();
    for i in 0..graph.vertices[v.0].image.len() {
        let e = graph.vertices[v.0].image[i];
        let q = graph.vertices[graph.edges[e.0].destination.0].qblock;
        if !graph.qblocks[q.0].visited {
            graph.qblocks[q.0].visited = true;
            ret.push(q);
        }
    }
    for &q in &ret {
        graph.qblocks[q.0].visited = false;
    }
    ret
}

/// The blocks with an edge into `targets`, each listed once.
fn predecessor_blocks(graph: &mut DecoratedGraph, targets: &[VertexId]) -> Vec<QBlockId> {
    let mut ret = Vec::new();
    for x in graph.predecessors(targets) {
        let q = graph.vertices[x.0].qblock;
        if !graph.qblocks[q.0].visited {
            graph.qblocks[q.0].visited = true;
            ret.push(q);
        }
    }
    for &q in &ret {
        graph.qblocks[q.0].visited = false;
    }
    ret
}

/// The smallest block below `rank` that `q` has an edge into.
///
/// Since everything below `rank` is final, a block that `q` can merge with has an edge into it
/// too.
fn lower_anchor(graph: &mut DecoratedGraph, q: QBlockId, rank: Rank) -> Option<QBlockId> {
    let rep = graph.first_vertex(q)?;
    successor_blocks(graph, rep)
        .into_iter()
        .filter(|&s| block_rank(graph, s) < rank)
        .min()
}

/// Two blocks of the same rank can only be merged if their keys agree. If neither of them has an
/// edge into a block in play, equal keys are also enough.
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
struct MergeKey {
    initial_block: usize,
    /// The blocks below, and the blocks of the same rank that are out of play.
    settled_successors: Vec<QBlockId>,
    reaches_in_play: bool,
}

fn merge_key(graph: &mut DecoratedGraph, q: QBlockId, rank: Rank) -> MergeKey {
    let rep = graph
        .first_vertex(q)
        .unwrap_or_else(|| panic!("tried to merge the empty block {q:?}"));
    let mut settled_successors = Vec::new();
    let mut reaches_in_play = false;
    for s in successor_blocks(graph, rep) {
        if is_in_play(graph, s, rank) {
            reaches_in_play = true;
        } else {
            settled_successors.push(s);
        }
    }
    settled_successors.sort_unstable();
    MergeKey {
        initial_block: graph.vertices[rep.0].initial_block,
        settled_successors,
        reaches_in_play,
    }
}

/// Is there a reason to keep the blocks `b1` and `b2` (both of rank `rank`) apart?
///
/// The only splitters worth looking at are the settled successors of `b1` and `b2`: the blocks
/// below `rank`, which are final, and the blocks of `rank` that are out of play. Blocks in play
/// might still merge with one another, so they count as one: either both blocks have an edge into
/// one of them, or neither does.
fn exists_causal_splitter(
    graph: &mut DecoratedGraph,
    b1: QBlockId,
    b2: QBlockId,
    rank: Rank,
) -> bool {
    let (r1, r2) = match (graph.first_vertex(b1), graph.first_vertex(b2)) {
        (Some(r1), Some(r2)) => (r1, r2),
        _ => return true,
    };
    if graph.vertices[r1.0].initial_block != graph.vertices[r2.0].initial_block {
        return true;
    }

    let (succ1, succ2) = (successor_blocks(graph, r1), successor_blocks(graph, r2));
    let mut settled1 = Vec::new();
    let mut in_play1 = false;
    for s in succ1 {
        if is_in_play(graph, s, rank) {
            in_play1 = true;
        } else {
            graph.qblocks[s.0].visited = true;
            settled1.push(s);
        }
    }

    let mut shared = 0;
    let mut in_play2 = false;
    let mut splitter = false;
    for s in succ2 {
        if is_in_play(graph, s, rank) {
            in_play2 = true;
        } else if graph.qblocks[s.0].visited {
            shared += 1;
        } else {
            splitter = true;
        }
    }
    for &s in &settled1 {
        graph.qblocks[s.0].visited = false;
    }

    splitter || shared != settled1.len() || in_play1 != in_play2
}

/// Grows `seeds` (which are marked, and of rank `rank`) into every block of `rank` that might
/// need merging, and returns them all. The new blocks are marked too.
fn collect_in_play(
    graph: &mut DecoratedGraph,
    ranked: &mut RankedPartition,
    rank: Rank,
    seeds: Vec<QBlockId>,
) -> Vec<QBlockId> {
    let mut in_play = seeds;
    let mut anchors = HashSet::new();
    let mut scanned_labels = HashSet::new();
    let mut i = 0;
    while i < in_play.len() {
        let q = in_play[i];
        i += 1;
        if !graph.qblocks[q.0].is_live() {
            continue;
        }
        let label = initial_block(graph, q);

        let vertices = graph.block_vertices(q);
        let mut found = predecessor_blocks(graph, &vertices)
            .into_iter()
            .filter(|&p| block_rank(graph, p) == rank)
            .collect::<Vec<_>>();

        // Look for the blocks that `q` might merge with.
        match lower_anchor(graph, q, rank) {
            Some(a) => {
                if anchors.insert((a, label)) {
                    let anchor_vertices = graph.block_vertices(a);
                    for p in predecessor_blocks(graph, &anchor_vertices) {
                        if block_rank(graph, p) == rank && initial_block(graph, p) == label {
                            found.push(p);
                        }
                    }
                }
            }
            None => {
                if scanned_labels.insert(label) {
                    for p in ranked.blocks(graph, rank) {
                        if initial_block(graph, p) == label && lower_anchor(graph, p, rank).is_none()
                        {
                            found.push(p);
                        }
                    }
                }
            }
        }

        for p in found {
            if !graph.qblocks[p.0].tried_merge {
                graph.qblocks[p.0].tried_merge = true;
                in_play.push(p);
            }
        }
    }
    in_play
}

/// Moves everything in `absorbed` into `survivor`.
fn merge_blocks(graph: &mut DecoratedGraph, survivor: QBlockId, absorbed: &[QBlockId]) {
    for &q in absorbed {
        for v in graph.block_vertices(q) {
            graph.move_vertex(v, survivor);
        }
        graph.remove_from_xblock(q);
        graph.qblocks[q.0].deteached = true;
    }
    trace!("merged {} blocks into {survivor:?}", absorbed.len() + 1);
}

/// Detaches the edges into `targets` from their count cells.
fn release_counts(graph: &mut DecoratedGraph, targets: &[VertexId]) {
    for &y in targets {
        for i in 0..graph.vertices[y.0].counterimage.len() {
            let e = graph.vertices[y.0].counterimage[i];
            if let Some(old) = graph.edges[e.0].count.take() {
                graph.decrement_count(old);
            }
        }
    }
}

/// Gives the edges into `targets` fresh count cells, one per source.
///
/// The X-block of `targets` must not contain anything else.
fn recount(graph: &mut DecoratedGraph, targets: &[VertexId]) {
    release_counts(graph, targets);

    let mut sources = Vec::new();
    for &y in targets {
        for i in 0..graph.vertices[y.0].counterimage.len() {
            let e = graph.vertices[y.0].counterimage[i];
            let x = graph.edges[e.0].source;
            let c = match graph.vertices[x.0].aux_count {
                Some(c) => c,
                None => {
                    let c = graph.new_count(x, 0);
                    graph.vertices[x.0].aux_count = Some(c);
                    sources.push(x);
                    c
                }
            };
            graph.counts[c.0].value += 1;
            graph.edges[e.0].count = Some(c);
        }
    }
    for x in sources {
        graph.vertices[x.0].aux_count = None;
    }
}

/// Refines the blocks of `region` from scratch, using only the edges between them.
///
/// The blocks must all have the same rank, everything below that rank must be final, and every
/// block must be a union of classes of the maximum bisimulation. So must `region` as a whole. The
/// blocks above stay stable, because the new blocks are unions of the old ones.
fn split_region(graph: &mut DecoratedGraph, ranked: &mut RankedPartition, region: &[QBlockId]) {
    let y = graph.new_xblock();
    for &q in region {
        graph.remove_from_xblock(q);
        graph.add_to_xblock(q, y);
    }
    let targets = region
        .iter()
        .flat_map(|&q| graph.block_vertices(q))
        .collect::<Vec<_>>();
    release_counts(graph, &targets);

    trace!("refining {} blocks in play", region.len());
    refine_rank(graph, region);
    ranked.refresh(graph);
    let blocks = targets
        .iter()
        .map(|v| graph.vertices[v.0].qblock)
        .sorted()
        .dedup()
        .collect::<Vec<_>>();
    for q in blocks {
        let vertices = graph.block_vertices(q);
        recount(graph, &vertices);
    }
}

/// Merges what can be merged among the blocks in play (all of rank `rank`), and unmarks them.
/// Returns the vertices of the blocks that grew.
fn merge_rank(
    graph: &mut DecoratedGraph,
    ranked: &mut RankedPartition,
    rank: Rank,
    in_play: &[QBlockId],
) -> Vec<VertexId> {
    let mut groups: BTreeMap<MergeKey, Vec<QBlockId>> = BTreeMap::new();
    for &q in in_play {
        if graph.qblocks[q.0].is_live() {
            let key = merge_key(graph, q, rank);
            groups.entry(key).or_default().push(q);
        }
    }

    // Decide everything before moving anything, since the decisions depend on the marks.
    let mut merges = Vec::new();
    let mut needs_split = false;
    for (key, group) in groups {
        let survivor = group[0];
        let mut absorbed = Vec::new();
        for &q in &group[1..] {
            if !exists_causal_splitter(graph, survivor, q, rank) {
                absorbed.push(q);
            }
        }
        if !absorbed.is_empty() {
            needs_split |= key.reaches_in_play;
            merges.push((survivor, absorbed));
        }
    }

    for (survivor, absorbed) in &merges {
        merge_blocks(graph, *survivor, absorbed);
    }
    for &q in in_play {
        graph.qblocks[q.0].tried_merge = false;
    }
    let grown = merges
        .iter()
        .flat_map(|(survivor, _)| graph.block_vertices(*survivor))
        .collect::<Vec<_>>();

    if needs_split {
        let region = in_play
            .iter()
            .cloned()
            .filter(|q| graph.qblocks[q.0].is_live())
            .collect::<Vec<_>>();
        split_region(graph, ranked, &region);
    } else {
        for (survivor, _) in &merges {
            let vertices = graph.block_vertices(*survivor);
            recount(graph, &vertices);
        }
    }
    grown
}

/// Merges blocks one rank at a time, from the bottom up, starting from the blocks in `pending`.
///
/// When blocks of rank `r` merge, the pairs of blocks above `r` with edges into them might become
/// mergeable too, so those blocks go into `pending`.
fn recursive_merge(graph: &mut DecoratedGraph, ranked: &mut RankedPartition, mut pending: Pending) {
    while let Some((rank, seeds)) = pending.pop_first() {
        let in_play = collect_in_play(graph, ranked, rank, seeds);
        trace!("{} blocks of rank {rank} in play", in_play.len());
        let grown = merge_rank(graph, ranked, rank, &in_play);
        for p in predecessor_blocks(graph, &grown) {
            if block_rank(graph, p) > rank {
                enqueue(graph, &mut pending, p);
            }
        }
    }
}

/// Merges blocks after an edge out of `u` that didn't close a cycle.
fn merge_phase(graph: &mut DecoratedGraph, ranked: &mut RankedPartition, u: VertexId) {
    let mut pending = Pending::new();
    let q = graph.vertices[u.0].qblock;
    enqueue(graph, &mut pending, q);
    recursive_merge(graph, ranked, pending);
}

/// Merges and splits blocks after an edge that closed a new cycle.
///
/// Every ancestor of the new edge might now be bisimilar to something new, so all of their blocks
/// start out in play (in decreasing order of finishing time). The blocks of the new component are
/// merged optimistically and then refined using the edges of their rank.
fn merge_split_phase(
    graph: &mut DecoratedGraph,
    ranked: &mut RankedPartition,
    ancestors: &[VertexId],
) {
    let mut pending = Pending::new();
    for &a in ancestors.iter().rev() {
        let q = graph.vertices[a.0].qblock;
        enqueue(graph, &mut pending, q);
    }
    recursive_merge(graph, ranked, pending);
}
