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
    crate::input::{Input, write_output},
    anyhow::{Context, Result},
    clap::Parser,
    libbisim::Saha,
    serde::Serialize,
    std::path::PathBuf,
};

#[derive(Parser, Debug)]
pub struct Opts {
    /// YAML file describing the graph and the edges to add
    input: PathBuf,
    /// path for the output file (defaults to standard output)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct Step<'a> {
    added: (&'a str, &'a str),
    partition: Vec<Vec<&'a str>>,
}

#[derive(Serialize)]
struct History<'a> {
    initial: Vec<Vec<&'a str>>,
    steps: Vec<Step<'a>>,
}

pub fn run(opts: Opts) -> Result<()> {
    let input = Input::load(&opts.input)?;
    let graph = input.graph()?;
    let partition = input.partition();

    let mut saha = Saha::new(&graph, partition.as_deref())
        .context("Failed to compute the initial maximum bisimulation")?;
    let mut history = History {
        initial: saha.partition(),
        steps: Vec::new(),
    };
    for (u, v) in input.added_edges() {
        let partition = saha
            .add_edge(u, v)
            .with_context(|| format!("Failed to add the edge '{u}' -> '{v}'"))?;
        debug!("after adding '{u}' -> '{v}': {} blocks", partition.len());
        history.steps.push(Step {
            added: (u, v),
            partition,
        });
    }
    write_output(opts.output.as_ref(), &history)
}
