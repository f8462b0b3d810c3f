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
    anyhow::Result,
    assert_fs::{assert::PathAssert, prelude::*},
    cmd_lib::run_fun as rf___,
    predicates::prelude::*,
    test_context::test_context,
};

mod libs;

fn blocks(yaml: &str) -> Vec<Vec<String>> {
    serde_yaml::from_str(yaml).unwrap()
}

#[test_context(libs::BisimContext)]
#[test]
fn tree(ctx: &libs::BisimContext) -> Result<()> {
    let bisim = &ctx.bisim;
    ctx.input("tree.yaml", "edges: [[a, b], [a, c], [b, d], [b, e], [c, f], [c, g]]\n");

    let out = rf___!($bisim compute tree.yaml)?;
    let expected = vec![
        vec!["a"],
        vec!["b", "c"],
        vec!["d", "e", "f", "g"],
    ];
    assert_eq!(blocks(&out), expected);

    let out = rf___!($bisim compute --algorithm dpp tree.yaml)?;
    assert_eq!(blocks(&out), expected);
    Ok(())
}

#[test_context(libs::BisimContext)]
#[test]
fn labeled_cycle(ctx: &libs::BisimContext) -> Result<()> {
    let bisim = &ctx.bisim;
    ctx.input(
        "cycle.yaml",
        "nodes: [0, 1, 2]\nedges: [[0, 1], [1, 2], [2, 0]]\npartition: [[0, 1], [2]]\n",
    );

    let out = rf___!($bisim compute cycle.yaml)?;
    assert_eq!(blocks(&out), vec![vec!["0"], vec!["1"], vec!["2"]]);
    Ok(())
}

#[test_context(libs::BisimContext)]
#[test]
fn output_file(ctx: &libs::BisimContext) -> Result<()> {
    let bisim = &ctx.bisim;
    ctx.input("loop.yaml", "edges: [[a, a], [b, b]]\n");

    rf___!($bisim compute -o out.yaml loop.yaml)?;
    let out = ctx.temp_dir.child("out.yaml");
    out.assert(predicate::path::exists());
    let contents = std::fs::read_to_string(out.path())?;
    assert_eq!(blocks(&contents), vec![vec!["a", "b"]]);
    Ok(())
}

#[test_context(libs::BisimContext)]
#[test]
fn overlapping_partition(ctx: &libs::BisimContext) -> Result<()> {
    ctx.input(
        "bad.yaml",
        "edges: [[a, b]]\npartition: [[a, b], [b]]\n",
    );

    assert_cmd::Command::cargo_bin("bisim")
        .unwrap()
        .args(["compute", "bad.yaml"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Invalid initial partition"));
    Ok(())
}

#[test_context(libs::BisimContext)]
#[test]
fn missing_input(_ctx: &libs::BisimContext) -> Result<()> {
    assert_cmd::Command::cargo_bin("bisim")
        .unwrap()
        .args(["compute", "nonexistent.yaml"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Failed to open"));
    Ok(())
}
