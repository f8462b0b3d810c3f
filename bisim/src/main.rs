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

#[macro_use]
extern crate log;

use {
    clap::{ColorChoice, Parser},
    flexi_logger::Logger,
};

mod compute;
mod incremental;
mod input;
mod rank;

#[derive(Parser, Debug)]
#[clap(version, author, color(ColorChoice::Auto), infer_subcommands = true)]
#[command(
    name = "bisim",
    about = "Computes the maximum bisimulation of a directed graph."
)]
pub struct Opts {
    #[clap(subcommand)]
    pub subcmd: SubCommand,
}

#[derive(Parser, Debug)]
pub enum SubCommand {
    /// Compute the maximum bisimulation from scratch
    Compute(compute::Opts),
    /// Add edges one at a time, printing the maximum bisimulation after each one
    Incremental(incremental::Opts),
    /// Print the rank of every node
    Rank(rank::Opts),
}

fn main() {
    let opts = Opts::parse();

    Logger::try_with_env()
        .unwrap()
        .start()
        .unwrap_or_else(|e| panic!("Logger initialization failed with {e}"));

    let result = match opts.subcmd {
        SubCommand::Compute(c) => compute::run(c),
        SubCommand::Incremental(i) => incremental::run(i),
        SubCommand::Rank(r) => rank::run(r),
    };

    if let Err(e) = result {
        println!("Error: {e}");
        for cause in e.chain().skip(1) {
            println!("\tcaused by: {cause}");
        }
        std::process::exit(1);
    }
}
