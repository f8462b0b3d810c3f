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

/// The ways in which the input to one of the public entry points can be rejected.
///
/// These are all problems with the caller's data. Broken internal invariants are bugs, and they
/// panic instead of showing up here.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The graph itself is malformed: a node is reported twice, or an edge points to something
    /// that is not a node.
    #[error("Invalid graph: {0}")]
    InvalidGraph(String),
    /// The initial partition has overlapping blocks, misses a node, or names an unknown node.
    #[error("Invalid initial partition: {0}")]
    InvalidPartition(String),
    /// An edge given to the incremental algorithm has an endpoint that is not a node.
    #[error("Invalid edge: {0}")]
    InvalidEdge(String),
}
