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
    assert_cmd::Command,
    assert_fs::{TempDir, prelude::*},
    std::sync::{Mutex, MutexGuard, OnceLock},
    test_context::TestContext,
};

static SERIALIZE: OnceLock<Mutex<()>> = OnceLock::new();

#[allow(dead_code, reason = "The tests might not use all fields")]
pub struct BisimContext {
    pub bisim: String,
    pub temp_dir: TempDir,
    mutex_lock: MutexGuard<'static, ()>,
}

impl BisimContext {
    /// Writes an input file into the temporary directory.
    #[allow(dead_code, reason = "Not every test needs an input file")]
    pub fn input(&self, name: &str, contents: &str) {
        self.temp_dir.child(name).write_str(contents).unwrap();
    }
}

impl TestContext for BisimContext {
    fn setup() -> Self {
        let bisim = Command::cargo_bin("bisim")
            .unwrap()
            .get_program()
            .to_string_lossy()
            .to_string();

        // A poisoned lock only means that some other test failed.
        let mutex_lock = SERIALIZE
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let temp_dir = TempDir::new().unwrap();
        // The working directory is global, so the tests run one at a time.
        std::env::set_current_dir(temp_dir.path()).unwrap();

        Self {
            bisim,
            temp_dir,
            mutex_lock,
        }
    }
}
