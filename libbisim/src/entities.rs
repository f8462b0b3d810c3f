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

//! The things that live in a `DecoratedGraph`'s arenas.
//!
//! Every cross-reference is an index into one of the arenas, so nothing here owns anything else.

use std::collections::BTreeMap;

use crate::dll::{Link, Links, List};
use crate::rank::Rank;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
        pub(crate) struct $name(pub usize);
    };
}

id_type!(VertexId);
id_type!(EdgeId);
id_type!(CountId);
id_type!(QBlockId);
id_type!(XBlockId);
id_type!(SccId);

#[derive(Clone, Debug)]
pub(crate) struct Vertex {
    /// The current label. It usually equals `original_label`, but it can be temporarily
    /// renumbered while working on a subgraph.
    pub label: usize,
    pub original_label: usize,
    pub image: Vec<EdgeId>,
    pub counterimage: Vec<EdgeId>,
    pub qblock: QBlockId,
    pub dll: Link<VertexId>,
    pub scc: Option<SccId>,
    pub initial_block: usize,
    pub collapsed_to: Option<VertexId>,

    // Scratch space. All of these are cleared by the phase that sets them.
    pub visited: bool,
    pub in_second_splitter: bool,
    pub allow_visit: bool,
    pub aux_count: Option<CountId>,
}

impl Vertex {
    pub fn new(label: usize, initial_block: usize) -> Vertex {
        Vertex {
            label,
            original_label: label,
            image: Vec::new(),
            counterimage: Vec::new(),
            // Assigned when the vertex joins its first block.
            qblock: QBlockId(usize::MAX),
            dll: Link::detached(),
            scc: None,
            initial_block,
            collapsed_to: None,
            visited: false,
            in_second_splitter: false,
            allow_visit: false,
            aux_count: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.image.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        !self.visited && !self.in_second_splitter && !self.allow_visit && self.aux_count.is_none()
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Edge {
    pub source: VertexId,
    pub destination: VertexId,
    /// Shared with every other edge from `source` into the X-block of `destination`.
    pub count: Option<CountId>,
}

#[derive(Clone, Debug)]
pub(crate) struct Count {
    pub source: VertexId,
    pub value: usize,
}

#[derive(Clone, Debug)]
pub(crate) struct QBlock {
    pub vertices: List<VertexId>,
    pub xblock: Option<XBlockId>,
    pub dll: Link<QBlockId>,
    /// The sibling that vertices are moved into during a split.
    pub helper: Option<QBlockId>,
    /// Set once the block has been emptied and replaced; it is never reused afterwards.
    pub deteached: bool,
    pub tried_merge: bool,
    pub visited: bool,
}

impl QBlock {
    pub fn new() -> QBlock {
        QBlock {
            vertices: List::new(),
            xblock: None,
            dll: Link::detached(),
            helper: None,
            deteached: false,
            tried_merge: false,
            visited: false,
        }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_live(&self) -> bool {
        !self.deteached && !self.vertices.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        self.helper.is_none() && !self.tried_merge && !self.visited
    }
}

#[derive(Clone, Debug)]
pub(crate) struct XBlock {
    pub qblocks: List<QBlockId>,
}

impl XBlock {
    pub fn new() -> XBlock {
        XBlock {
            qblocks: List::new(),
        }
    }

    pub fn is_compound(&self) -> bool {
        self.qblocks.len() >= 2
    }
}

/// A strongly connected component, together with its neighbors in the component DAG.
///
/// The maps count the vertex-level edges between the two components; edges inside the component
/// are not recorded.
#[derive(Clone, Debug)]
pub(crate) struct Scc {
    pub vertices: Vec<VertexId>,
    pub image: BTreeMap<SccId, usize>,
    pub counterimage: BTreeMap<SccId, usize>,
    pub wf: bool,
    pub rank: Rank,
    /// False once this component has been absorbed into a bigger one.
    pub live: bool,
}

impl Scc {
    pub fn new(vertices: Vec<VertexId>) -> Scc {
        Scc {
            vertices,
            image: BTreeMap::new(),
            counterimage: BTreeMap::new(),
            wf: false,
            rank: Rank::NegInfinity,
            live: true,
        }
    }
}

impl Links<VertexId> for Vec<Vertex> {
    fn link(&self, t: VertexId) -> &Link<VertexId> {
        &self[t.0].dll
    }

    fn link_mut(&mut self, t: VertexId) -> &mut Link<VertexId> {
        &mut self[t.0].dll
    }
}

impl Links<QBlockId> for Vec<QBlock> {
    fn link(&self, t: QBlockId) -> &Link<QBlockId> {
        &self[t.0].dll
    }

    fn link_mut(&mut self, t: QBlockId) -> &mut Link<QBlockId> {
        &mut self[t.0].dll
    }
}
