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
    clap::{Parser, ValueEnum},
    libbisim::Algorithm,
    std::path::PathBuf,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AlgorithmArg {
    /// Paige-Tarjan
    Pt,
    /// Dovier-Piazza-Policriti
    Dpp,
}

impl From<AlgorithmArg> for Algorithm {
    fn from(a: AlgorithmArg) -> Algorithm {
        match a {
            AlgorithmArg::Pt => Algorithm::PaigeTarjan,
            AlgorithmArg::Dpp => Algorithm::DovierPiazzaPolicriti,
        }
    }
}

#[derive(Parser, Debug)]
pub struct Opts {
    /// YAML file describing the graph
    input: PathBuf,
    /// the algorithm to use
    #[arg(short, long, value_enum, default_value_t = AlgorithmArg::Pt)]
    algorithm: AlgorithmArg,
    /// path for the output file (defaults to standard output)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn run(opts: Opts) -> Result<()> {
    let input = Input::load(&opts.input)?;
    let graph = input.graph()?;
    let partition = input.partition();

    let algorithm = Algorithm::from(opts.algorithm);
    info!("computing the maximum bisimulation with {algorithm:?}");
    let blocks = libbisim::rscp(&graph, partition.as_deref(), algorithm)
        .context("Failed to compute the maximum bisimulation")?;
    write_output(opts.output.as_ref(), &blocks)
}
