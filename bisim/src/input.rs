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

use {
    anyhow::{Context, Result, bail},
    bisim_graph::DiGraph,
    serde::{Deserialize, Serialize},
    std::{
        collections::HashSet,
        fs::File,
        io::Write,
        path::{Path, PathBuf},
    },
};

/// Node names can be written as strings or as integers.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Str(String),
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(from = "Scalar")]
pub struct Name(String);

impl From<Scalar> for Name {
    fn from(s: Scalar) -> Name {
        match s {
            Scalar::Int(i) => Name(i.to_string()),
            Scalar::Str(s) => Name(s),
        }
    }
}

/// The contents of an input file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Input {
    /// If missing, the nodes are the endpoints of the edges, in the order they first appear.
    #[serde(default)]
    nodes: Option<Vec<Name>>,
    #[serde(default)]
    edges: Vec<(Name, Name)>,
    #[serde(default)]
    partition: Option<Vec<Vec<Name>>>,
    #[serde(default)]
    added_edges: Vec<(Name, Name)>,
}

impl Input {
    pub fn load(path: &Path) -> Result<Input> {
        let file =
            File::open(path).with_context(|| format!("Failed to open '{}'", path.display()))?;
        let input: Input = serde_yaml::from_reader(file)
            .with_context(|| format!("Failed to parse '{}'", path.display()))?;
        debug!(
            "read {} edges and {} added edges from '{}'",
            input.edges.len(),
            input.added_edges.len(),
            path.display()
        );
        Ok(input)
    }

    pub fn graph(&self) -> Result<DiGraph<&str>> {
        let mut ret = DiGraph::new();
        if let Some(nodes) = &self.nodes {
            let mut seen = HashSet::new();
            for n in nodes {
                if !seen.insert(n.0.as_str()) {
                    bail!("Node '{}' is listed twice", n.0);
                }
                ret.add_node(n.0.as_str());
            }
            for (u, v) in &self.edges {
                for w in [u, v] {
                    if !seen.contains(w.0.as_str()) {
                        bail!("Edge '{}' -> '{}' uses the unlisted node '{}'", u.0, v.0, w.0);
                    }
                }
            }
        }
        for (u, v) in &self.edges {
            ret.add_edge(u.0.as_str(), v.0.as_str());
        }
        Ok(ret)
    }

    pub fn partition(&self) -> Option<Vec<Vec<&str>>> {
        self.partition.as_ref().map(|p| {
            p.iter()
                .map(|block| block.iter().map(|n| n.0.as_str()).collect())
                .collect()
        })
    }

    pub fn added_edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.added_edges
            .iter()
            .map(|(u, v)| (u.0.as_str(), v.0.as_str()))
    }
}

/// Writes `value` as YAML, either to the given file or to standard output.
pub fn write_output<T: Serialize>(output: Option<&PathBuf>, value: &T) -> Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create '{}'", path.display()))?;
            serde_yaml::to_writer(file, value)?;
            eprintln!("Successfully wrote '{}'", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            serde_yaml::to_writer(&mut lock, value)?;
            lock.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use {super::*, bisim_graph::Graph};

    fn parse(s: &str) -> Input {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn nodes_default_to_endpoints() {
        let input = parse("edges: [[b, a], [a, c]]");
        let g = input.graph().unwrap();
        assert_eq!(g.nodes().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert!(input.partition().is_none());
        assert_eq!(input.added_edges().count(), 0);
    }

    #[test]
    fn integer_names() {
        let input = parse("nodes: [0, 1, x]\nedges: [[0, 1]]\npartition: [[0], [1, x]]");
        let g = input.graph().unwrap();
        assert_eq!(g.nodes().collect::<Vec<_>>(), vec!["0", "1", "x"]);
        assert_eq!(input.partition(), Some(vec![vec!["0"], vec!["1", "x"]]));
    }

    #[test]
    fn unlisted_endpoint() {
        let input = parse("nodes: [a]\nedges: [[a, b]]");
        assert!(input.graph().is_err());
    }

    #[test]
    fn duplicate_node() {
        let input = parse("nodes: [a, a]");
        assert!(input.graph().is_err());
    }

    #[test]
    fn unknown_field() {
        assert!(serde_yaml::from_str::<Input>("edges: []\nnodez: [a]").is_err());
    }
}
