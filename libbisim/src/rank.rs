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

//! Strongly connected components, well-foundedness and rank.
//!
//! A vertex is well-founded if no infinite path starts at it. Ranks are defined on the component
//! DAG: a well-founded component without successors has rank 0, a non-well-founded one without
//! successors has rank `-∞`, and otherwise the rank is the maximum over the successors `c` of
//! `rank(c) + 1` (if `c` is well-founded) or `rank(c)` (if it isn't). Bisimilar vertices always
//! have the same rank, which is what the rank-stratified algorithms rely on.

use bisim_graph::Graph;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::decorate::DecoratedGraph;
use crate::entities::{Scc, SccId, VertexId};

/// The rank of a vertex: either `-∞` or a natural number.
///
/// Ranks are ordered in the obvious way, with `NegInfinity` below every finite rank.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Rank {
    /// The rank of vertices that only reach non-well-founded parts of the graph.
    NegInfinity,
    /// A finite rank.
    Finite(usize),
}

impl Rank {
    /// The position of this rank in a rank-indexed table: 0 for `-∞`, and `r + 1` for rank `r`.
    pub fn index(self) -> usize {
        match self {
            Rank::NegInfinity => 0,
            Rank::Finite(r) => r + 1,
        }
    }

    /// The inverse of [`Rank::index`].
    pub fn from_index(idx: usize) -> Rank {
        match idx {
            0 => Rank::NegInfinity,
            i => Rank::Finite(i - 1),
        }
    }

    fn successor(self) -> Rank {
        match self {
            Rank::NegInfinity => Rank::NegInfinity,
            Rank::Finite(r) => Rank::Finite(r + 1),
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Rank::NegInfinity => write!(f, "-inf"),
            Rank::Finite(r) => write!(f, "{r}"),
        }
    }
}

/// The DAG of live components, viewed as a graph.
pub(crate) struct SccDag<'a> {
    graph: &'a DecoratedGraph,
}

impl Graph for SccDag<'_> {
    type Node = SccId;
    type Edge = SccId;

    fn nodes(&self) -> Box<dyn Iterator<Item = SccId> + '_> {
        Box::new(
            (0..self.graph.sccs.len())
                .map(SccId)
                .filter(move |s| self.graph.sccs[s.0].live),
        )
    }

    fn out_edges(&self, u: &SccId) -> Box<dyn Iterator<Item = SccId> + '_> {
        Box::new(self.graph.sccs[u.0].image.keys().cloned())
    }

    fn in_edges(&self, u: &SccId) -> Box<dyn Iterator<Item = SccId> + '_> {
        Box::new(self.graph.sccs[u.0].counterimage.keys().cloned())
    }
}

impl DecoratedGraph {
    pub fn scc_dag(&self) -> SccDag<'_> {
        SccDag { graph: self }
    }

    pub fn scc_of(&self, v: VertexId) -> SccId {
        self.vertices[v.0]
            .scc
            .unwrap_or_else(|| panic!("no component for {v:?}; ranks were never computed"))
    }

    pub fn rank_of(&self, v: VertexId) -> Rank {
        self.sccs[self.scc_of(v).0].rank
    }

    pub fn is_well_founded(&self, v: VertexId) -> bool {
        self.sccs[self.scc_of(v).0].wf
    }

    /// Computes the components from scratch, and then the rank and well-foundedness of each.
    pub fn compute_ranks(&mut self) {
        // Sources of the component DAG come first.
        let parts = self.kosaraju().into_parts();
        self.sccs.clear();
        for (i, part) in parts.into_iter().enumerate() {
            for &v in &part {
                self.vertices[v.0].scc = Some(SccId(i));
            }
            self.sccs.push(Scc::new(part));
        }

        for e in 0..self.edges.len() {
            let (u, v) = (self.edges[e].source, self.edges[e].destination);
            self.add_scc_edge(self.scc_of(u), self.scc_of(v));
        }

        for s in (0..self.sccs.len()).rev() {
            self.evaluate_scc(SccId(s));
        }
        debug!("found {} strongly connected components", self.sccs.len());
    }

    /// Records a vertex-level edge between two components. Edges within a component are ignored.
    pub fn add_scc_edge(&mut self, from: SccId, to: SccId) {
        if from != to {
            *self.sccs[from.0].image.entry(to).or_insert(0) += 1;
            *self.sccs[to.0].counterimage.entry(from).or_insert(0) += 1;
        }
    }

    fn is_cyclic(&self, s: SccId) -> bool {
        let vertices = &self.sccs[s.0].vertices;
        vertices.len() > 1 || vertices.iter().any(|&v| self.has_edge(v, v))
    }

    /// What a component contributes to the rank of its parents.
    pub fn contribution(&self, s: SccId) -> Rank {
        let scc = &self.sccs[s.0];
        if scc.wf { scc.rank.successor() } else { scc.rank }
    }

    /// Recomputes the rank and well-foundedness of `s` from those of its successors.
    fn evaluate_scc(&mut self, s: SccId) {
        let cyclic = self.is_cyclic(s);
        let scc = &self.sccs[s.0];
        let (wf, rank) = if scc.image.is_empty() {
            if cyclic {
                (false, Rank::NegInfinity)
            } else {
                (true, Rank::Finite(0))
            }
        } else {
            let wf = !cyclic && scc.image.keys().all(|c| self.sccs[c.0].wf);
            let rank = scc
                .image
                .keys()
                .map(|&c| self.contribution(c))
                .max()
                .unwrap_or(Rank::NegInfinity);
            (wf, rank)
        };
        let scc = &mut self.sccs[s.0];
        scc.wf = wf;
        scc.rank = rank;
    }

    /// Recomputes `s` and everything that can reach it, returning the components whose rank or
    /// well-foundedness changed.
    ///
    /// This is the general update: it handles `s` losing its well-foundedness (which can lower
    /// the rank of its parents) as well as ranks going up.
    pub fn propagate_nwf(&mut self, s: SccId) -> Vec<SccId> {
        // In the reversed DAG the ancestors of `s` are its descendants, and the reverse of the
        // finishing order puts every component after all of its (original) children.
        let dag = self.scc_dag();
        let mut order = dag.reversed().dfs_from(vec![s]).finishing_order();
        order.reverse();
        trace!("recomputing ranks of {} components", order.len());
        let mut changed = Vec::new();
        for c in order {
            let before = (self.sccs[c.0].wf, self.sccs[c.0].rank);
            self.evaluate_scc(c);
            if c == s || before != (self.sccs[c.0].wf, self.sccs[c.0].rank) {
                changed.push(c);
            }
        }
        changed
    }

    /// Pushes a rank increase of `s` up to its ancestors, assuming that no well-foundedness
    /// changed. Returns the ancestors whose rank went up.
    pub fn propagate_wf(&mut self, s: SccId) -> Vec<SccId> {
        let mut changed = Vec::new();
        let mut stack = vec![s];
        while let Some(c) = stack.pop() {
            let contribution = self.contribution(c);
            let parents = self.sccs[c.0].counterimage.keys().cloned().collect::<Vec<_>>();
            for p in parents {
                if contribution > self.sccs[p.0].rank {
                    self.sccs[p.0].rank = contribution;
                    changed.push(p);
                    stack.push(p);
                }
            }
        }
        changed
    }

    /// Replaces the given components by their union, and returns the new component.
    ///
    /// The rank and well-foundedness of the new component are not computed.
    pub fn merge_sccs(&mut self, members: &[SccId]) -> SccId {
        let new = SccId(self.sccs.len());
        let member_set = members.iter().cloned().collect::<HashSet<_>>();
        let mut vertices = Vec::new();
        for &m in members {
            let old = &mut self.sccs[m.0];
            old.live = false;
            vertices.append(&mut old.vertices);
            let image = std::mem::take(&mut old.image);
            let counterimage = std::mem::take(&mut old.counterimage);
            for t in image.keys().filter(|t| !member_set.contains(t)) {
                self.sccs[t.0].counterimage.remove(&m);
            }
            for t in counterimage.keys().filter(|t| !member_set.contains(t)) {
                self.sccs[t.0].image.remove(&m);
            }
        }
        for &v in &vertices {
            self.vertices[v.0].scc = Some(new);
        }

        let mut image = BTreeMap::new();
        let mut counterimage = BTreeMap::new();
        for &v in &vertices {
            for &e in &self.vertices[v.0].image {
                let t = self.scc_of(self.edges[e.0].destination);
                if t != new {
                    *image.entry(t).or_insert(0) += 1;
                }
            }
            for &e in &self.vertices[v.0].counterimage {
                let t = self.scc_of(self.edges[e.0].source);
                if t != new {
                    *counterimage.entry(t).or_insert(0) += 1;
                }
            }
        }
        for (&t, &n) in &image {
            self.sccs[t.0].counterimage.insert(new, n);
        }
        for (&t, &n) in &counterimage {
            self.sccs[t.0].image.insert(new, n);
        }

        trace!(
            "merged {} components into {new:?} ({} vertices)",
            members.len(),
            vertices.len()
        );
        let mut scc = Scc::new(vertices);
        scc.image = image;
        scc.counterimage = counterimage;
        self.sccs.push(scc);
        new
    }
}
