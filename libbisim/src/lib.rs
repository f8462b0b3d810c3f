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

#![deny(missing_docs)]

//! A library for computing the maximum bisimulation of a directed graph.
//!
//! Two vertices are bisimilar if every edge out of one can be matched by an edge out of the other
//! that leads to a bisimilar vertex. The classes of the maximum bisimulation (also known as the
//! relational stable coarsest partition) can be computed from scratch with either
//! [`paige_tarjan`] or [`dovier_piazza_policriti`], or maintained while edges are added with
//! [`Saha`].
//!
//! Every entry point optionally takes an initial partition of the nodes, which acts as a
//! labelling: vertices in different initial blocks are never bisimilar.

#[macro_use]
extern crate log;

use bisim_graph::Graph;
use std::fmt::Debug;

mod decorate;
mod dll;
mod dpp;
mod entities;
mod error;
mod normalize;
mod paige_tarjan;
mod rank;
mod saha;
#[cfg(test)]
mod testing;

pub use crate::{error::Error, normalize::Normalizer, rank::Rank, saha::Saha};

use crate::decorate::DecoratedGraph;
use crate::entities::VertexId;

/// The algorithm used to compute a maximum bisimulation from scratch.
///
/// Both of them give the same answer.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Algorithm {
    /// The Paige-Tarjan partition refinement algorithm.
    #[default]
    PaigeTarjan,
    /// The Dovier-Piazza-Policriti algorithm, which handles one rank at a time. It is usually
    /// faster on graphs with many ranks.
    DovierPiazzaPolicriti,
}

/// The rank of a single node, as computed by [`ranks`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NodeRank<N> {
    /// The node.
    pub node: N,
    /// Its rank.
    pub rank: Rank,
    /// Is it well-founded, i.e. is every path out of it finite?
    pub well_founded: bool,
}

fn decorate_graph<G>(
    g: &G,
    initial_partition: Option<&[Vec<G::Node>]>,
) -> Result<(Normalizer<G::Node>, DecoratedGraph), Error>
where
    G: Graph,
    G::Node: Debug,
{
    let normalizer = Normalizer::from_graph(g)?;
    let edges = normalizer.edges(g)?;
    let blocks = normalizer.partition(initial_partition)?;
    let graph = DecoratedGraph::new(normalizer.len(), &edges, &blocks);
    Ok((normalizer, graph))
}

/// Computes the maximum bisimulation of `g` that refines `initial_partition`, using the
/// Paige-Tarjan algorithm.
///
/// Without an initial partition, all nodes start out in the same block. The returned blocks are
/// ordered by their first element, and the elements of each block appear in the same order as
/// they do in `g.nodes()`.
///
/// ```
/// use bisim_graph::DiGraph;
///
/// let g = DiGraph::from_edges(vec![(0, 1), (1, 0), (2, 2), (3, 4)]);
/// let p = libbisim::paige_tarjan(&g, None).unwrap();
/// assert_eq!(p, vec![vec![0, 1, 2], vec![3], vec![4]]);
/// ```
pub fn paige_tarjan<G>(
    g: &G,
    initial_partition: Option<&[Vec<G::Node>]>,
) -> Result<Vec<Vec<G::Node>>, Error>
where
    G: Graph,
    G::Node: Debug,
{
    rscp(g, initial_partition, Algorithm::PaigeTarjan)
}

/// Computes the maximum bisimulation of `g` that refines `initial_partition`, using the
/// Dovier-Piazza-Policriti algorithm.
///
/// The result is exactly the same as that of [`paige_tarjan`].
pub fn dovier_piazza_policriti<G>(
    g: &G,
    initial_partition: Option<&[Vec<G::Node>]>,
) -> Result<Vec<Vec<G::Node>>, Error>
where
    G: Graph,
    G::Node: Debug,
{
    rscp(g, initial_partition, Algorithm::DovierPiazzaPolicriti)
}

/// Computes the maximum bisimulation of `g` that refines `initial_partition`, using the given
/// algorithm.
pub fn rscp<G>(
    g: &G,
    initial_partition: Option<&[Vec<G::Node>]>,
    algorithm: Algorithm,
) -> Result<Vec<Vec<G::Node>>, Error>
where
    G: Graph,
    G::Node: Debug,
{
    let (normalizer, mut graph) = decorate_graph(g, initial_partition)?;
    match algorithm {
        Algorithm::PaigeTarjan => paige_tarjan::refine(&mut graph),
        Algorithm::DovierPiazzaPolicriti => dpp::dovier_piazza_policriti(&mut graph),
    }
    Ok(normalizer.denormalize(graph.partition()))
}

/// Computes the rank and well-foundedness of every node of `g`, in the order of `g.nodes()`.
///
/// ```
/// use bisim_graph::DiGraph;
/// use libbisim::Rank;
///
/// let g = DiGraph::from_edges(vec![(0, 1), (2, 2)]);
/// let ranks = libbisim::ranks(&g).unwrap();
/// assert_eq!(ranks[0].rank, Rank::Finite(1));
/// assert_eq!(ranks[2].rank, Rank::NegInfinity);
/// assert!(!ranks[2].well_founded);
/// ```
pub fn ranks<G>(g: &G) -> Result<Vec<NodeRank<G::Node>>, Error>
where
    G: Graph,
    G::Node: Debug,
{
    let (normalizer, mut graph) = decorate_graph(g, None)?;
    graph.compute_ranks();
    Ok((0..normalizer.len())
        .map(|i| NodeRank {
            node: normalizer.node(i),
            rank: graph.rank_of(VertexId(i)),
            well_founded: graph.is_well_founded(VertexId(i)),
        })
        .collect())
}
