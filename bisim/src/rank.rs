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
    crate::input::Input,
    anyhow::{Context, Result},
    clap::Parser,
    std::path::PathBuf,
};

#[derive(Parser, Debug)]
pub struct Opts {
    /// YAML file describing the graph
    input: PathBuf,
}

pub fn run(opts: Opts) -> Result<()> {
    let input = Input::load(&opts.input)?;
    let graph = input.graph()?;
    let ranks = libbisim::ranks(&graph).context("Failed to compute ranks")?;

    for r in ranks {
        let wf = if r.well_founded {
            "well-founded"
        } else {
            "non-well-founded"
        };
        println!("{}\t{}\t{wf}", r.node, r.rank);
    }
    Ok(())
}
