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

use crate::{Graph, Partition, Status, Visit};

/// Kosaraju's algorithm for strongly connected components.
///
/// The first pass is a depth-first search of the whole graph, recording the order in which nodes
/// finish. The second pass searches the reversed graph, taking roots in decreasing finishing
/// time; every tree of the second search is one component. The first root of the second pass
/// belongs to a source of the component DAG, so the components come out in topological order.
pub(crate) struct Kosaraju<'a, G: Graph + ?Sized> {
    g: &'a G,
}

impl<'a, G: Graph + ?Sized> Kosaraju<'a, G> {
    pub fn from_graph(g: &'a G) -> Kosaraju<'a, G> {
        Kosaraju { g }
    }

    pub fn run(self) -> Partition<'a, G> {
        let mut roots = self.g.dfs().finishing_order();
        roots.reverse();

        let reversed = self.g.reversed();
        let mut components: Vec<Vec<G::Node>> = Vec::new();
        for visit in reversed.dfs_from(roots) {
            match visit {
                Visit::Root(u) => components.push(vec![u]),
                Visit::Edge {
                    dst,
                    status: Status::New,
                    ..
                } => {
                    // Root always comes before the tree's edges, so there is a current component.
                    if let Some(cur) = components.last_mut() {
                        cur.push(dst);
                    }
                }
                _ => {}
            }
        }
        Partition::new(self.g, components)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::Graph;
    use crate::tests::{arb_dag, arb_graph, graph};

    macro_rules! scc_test {
        ($name:ident, $graph:expr, $expected:expr) => {
            #[test]
            fn $name() {
                let g = graph($graph);
                let sccs = g.kosaraju();
                let mut parts = sccs
                    .parts()
                    .map(|p| {
                        let mut p = p.clone();
                        p.sort();
                        p
                    })
                    .collect::<Vec<_>>();
                parts.sort();
                let mut expected: Vec<Vec<u32>> = $expected;
                expected.sort();
                assert_eq!(parts, expected);
            }
        };
    }

    scc_test!(scc_single, "0-0", vec![vec![0]]);
    scc_test!(scc_chain, "0-1, 1-2", vec![vec![0], vec![1], vec![2]]);
    scc_test!(scc_cycle, "0-1, 1-2, 2-0", vec![vec![0, 1, 2]]);
    scc_test!(
        scc_two_cycles,
        "0-1, 1-0, 1-2, 2-3, 3-2, 4-4",
        vec![vec![0, 1], vec![2, 3], vec![4]]
    );
    scc_test!(
        scc_feeding_cycle,
        "0-1, 1-2, 2-0, 3-0, 3-4, 4-5, 5-0, 3-6, 6-7",
        vec![vec![0, 1, 2], vec![3], vec![4], vec![5], vec![6], vec![7]]
    );

    #[test]
    fn condensation_has_no_self_edges() {
        let g = graph("0-1, 1-0, 1-2, 2-2");
        let sccs = g.kosaraju();
        assert_eq!(sccs.num_components(), 2);
        for c in sccs.nodes() {
            assert!(sccs.out_neighbors(&c).all(|d| d != c));
        }
        let top = sccs.component_of(&0);
        let bottom = sccs.component_of(&2);
        assert_eq!(sccs.out_neighbors(&top).collect::<Vec<_>>(), vec![bottom]);
        assert_eq!(sccs.in_neighbors(&bottom).collect::<Vec<_>>(), vec![top]);
    }

    proptest! {
        #[test]
        fn components_are_topologically_sorted(ref g in arb_graph()) {
            let sccs = g.kosaraju();
            // Component indices are a topological order of the condensation.
            for c in sccs.nodes() {
                for d in sccs.out_neighbors(&c) {
                    assert!(c < d);
                }
            }
            let sort = sccs.top_sort();
            assert!(sort.is_some());
        }

        #[test]
        fn components_are_mutually_reachable(ref g in arb_graph()) {
            let sccs = g.kosaraju();
            let mut seen = HashSet::new();
            for part in sccs.parts() {
                for u in part {
                    assert!(seen.insert(*u));
                    for v in part {
                        if u != v {
                            assert!(g.has_path(u, v));
                        }
                    }
                }
            }
            assert_eq!(seen.len(), g.num_nodes());

            for u in g.nodes() {
                for v in g.nodes() {
                    if sccs.component_of(&u) != sccs.component_of(&v) {
                        assert!(!(g.has_path(&u, &v) && g.has_path(&v, &u)));
                    }
                }
            }
        }

        #[test]
        fn dag_components_are_singletons(ref g in arb_dag()) {
            let sccs = g.kosaraju();
            assert_eq!(sccs.num_components(), g.num_nodes());
        }
    }
}
