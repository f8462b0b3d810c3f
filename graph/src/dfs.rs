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

use std::collections::HashSet;

use crate::{Edge, Graph};

/// Whether the far end of an edge was seen for the first time.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    New,
    Repeated,
}

/// One event of a depth-first search.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Visit<N> {
    Edge { src: N, dst: N, status: Status },
    /// All of `u`'s out-edges have been followed.
    Retreat { u: N, parent: Option<N> },
    Root(N),
}

impl<N: Copy> Visit<N> {
    /// The node that this step reaches for the first time, if any.
    pub fn reached(&self) -> Option<N> {
        match *self {
            Visit::Root(u)
            | Visit::Edge {
                dst: u,
                status: Status::New,
                ..
            } => Some(u),
            _ => None,
        }
    }

    /// The node that this step finishes, if any.
    pub fn finished(&self) -> Option<N> {
        match *self {
            Visit::Retreat { u, .. } => Some(u),
            _ => None,
        }
    }
}

// The search keeps its own stack, so long paths can't overflow the call stack. A frame holds a
// node together with its unexplored out-edges.
struct StackFrame<'a, G: Graph + ?Sized> {
    u: G::Node,
    neighbors: Box<dyn Iterator<Item = G::Edge> + 'a>,
}

impl<'a, G: Graph + ?Sized> StackFrame<'a, G> {
    fn new(g: &'a G, u: G::Node) -> StackFrame<'a, G> {
        StackFrame {
            neighbors: g.out_edges(&u),
            u,
        }
    }
}

/// A lazy depth-first search, yielding one [`Visit`] per step.
///
/// Roots are taken in the order given, skipping those that an earlier root already reached.
/// `Retreat` events come out in finishing order.
pub struct Dfs<'a, G: Graph + ?Sized> {
    g: &'a G,
    visited: HashSet<G::Node>,
    stack: Vec<StackFrame<'a, G>>,
    roots: Box<dyn Iterator<Item = G::Node> + 'a>,
}

impl<'a, G: Graph + ?Sized> Dfs<'a, G> {
    /// Searches from every node of `g`.
    pub(crate) fn new(g: &'a G) -> Dfs<'a, G> {
        Dfs {
            g,
            visited: HashSet::new(),
            stack: Vec::new(),
            roots: g.nodes(),
        }
    }

    /// Searches only from `roots`.
    pub(crate) fn new_from(g: &'a G, roots: Vec<G::Node>) -> Dfs<'a, G> {
        Dfs {
            g,
            visited: HashSet::new(),
            stack: Vec::new(),
            roots: Box::new(roots.into_iter()),
        }
    }

    /// Runs the search to the end, returning the nodes in the order that they finish.
    pub fn finishing_order(self) -> Vec<G::Node> {
        self.filter_map(|visit| visit.finished()).collect()
    }

    /// Runs the search to the end, returning the nodes in the order that they are reached.
    pub fn reached(self) -> Vec<G::Node> {
        self.filter_map(|visit| visit.reached()).collect()
    }

    fn next_root(&mut self) -> Option<G::Node> {
        for root in self.roots.by_ref() {
            if !self.visited.contains(&root) {
                return Some(root);
            }
        }
        None
    }

    fn cur_node(&self) -> Option<G::Node> {
        self.stack.last().map(|frame| frame.u)
    }
}

impl<G: Graph + ?Sized> Iterator for Dfs<'_, G> {
    type Item = Visit<G::Node>;

    fn next(&mut self) -> Option<Visit<G::Node>> {
        if let Some(frame) = self.stack.last_mut() {
            let cur = frame.u;
            if let Some(next) = frame.neighbors.next() {
                let next = next.target();
                let status = if self.visited.contains(&next) {
                    Status::Repeated
                } else {
                    self.stack.push(StackFrame::new(self.g, next));
                    self.visited.insert(next);
                    Status::New
                };
                Some(Visit::Edge {
                    src: cur,
                    dst: next,
                    status,
                })
            } else {
                self.stack.pop();
                Some(Visit::Retreat {
                    u: cur,
                    parent: self.cur_node(),
                })
            }
        } else if let Some(next_root) = self.next_root() {
            self.stack.push(StackFrame::new(self.g, next_root));
            self.visited.insert(next_root);
            Some(Visit::Root(next_root))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Status::*;
    use super::Visit::*;
    use crate::Graph;
    use crate::tests::graph;

    macro_rules! dfs_test {
        ($name:ident, $graph:expr, $expected:expr) => {
            #[test]
            fn $name() {
                let g = graph($graph);
                let dfs: Vec<_> = g.dfs().collect();
                assert_eq!(dfs, $expected);
            }
        };
    }

    dfs_test!(
        visit_order,
        "0-1, 0-3, 0-2",
        vec![
            Root(0),
            Edge {
                src: 0,
                dst: 1,
                status: New
            },
            Retreat {
                u: 1,
                parent: Some(0)
            },
            Edge {
                src: 0,
                dst: 3,
                status: New
            },
            Retreat {
                u: 3,
                parent: Some(0)
            },
            Edge {
                src: 0,
                dst: 2,
                status: New
            },
            Retreat {
                u: 2,
                parent: Some(0)
            },
            Retreat { u: 0, parent: None },
        ]
    );

    dfs_test!(
        repeat_visit,
        "0-1, 0-2, 1-2",
        vec![
            Root(0),
            Edge {
                src: 0,
                dst: 1,
                status: New
            },
            Edge {
                src: 1,
                dst: 2,
                status: New
            },
            Retreat {
                u: 2,
                parent: Some(1)
            },
            Retreat {
                u: 1,
                parent: Some(0)
            },
            Edge {
                src: 0,
                dst: 2,
                status: Repeated
            },
            Retreat { u: 0, parent: None },
        ]
    );

    #[test]
    fn dfs_from_skips_unreachable() {
        let g = graph("0-1, 2-3, 3-0");
        assert_eq!(g.dfs_from(vec![1, 0]).finishing_order(), vec![1, 0]);
        assert_eq!(g.dfs_from(vec![2]).reached(), vec![2, 3, 0, 1]);
        assert_eq!(g.dfs_from(vec![2]).finishing_order(), vec![1, 0, 3, 2]);
    }
}
