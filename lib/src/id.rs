// SPDX-FileCopyrightText: 2022 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use nohash_hasher::IntMap;
use std::env;
use std::path::Path;
use std::process;
use std::sync::{Arc, Mutex, OnceLock};

/// Hands out small integers that are unique among the ids currently in use.
///
/// Ids are only reused after they have been released, so a simulator that is
/// still live never shares its name with a new one.
#[derive(Debug, Default)]
pub struct IdAllocator {
    ids: Mutex<IntMap<u32, bool>>,
}

impl IdAllocator {
    /// Create an allocator with no ids in use.
    pub fn new() -> IdAllocator {
        IdAllocator::default()
    }

    /// The allocator shared by all simulators in this process.
    pub fn global() -> Arc<IdAllocator> {
        static GLOBAL: OnceLock<Arc<IdAllocator>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(IdAllocator::new())).clone()
    }

    /// Allocate the lowest id not currently in use.
    pub fn allocate(&self) -> u32 {
        let mut ids = self.ids.lock().unwrap_or_else(|e| e.into_inner());
        let mut id = 0;
        while ids.get(&id) == Some(&true) {
            id += 1;
        }
        ids.insert(id, true);
        id
    }

    /// Return an id so that it may be allocated again.
    pub fn release(&self, id: u32) {
        let mut ids = self.ids.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(used) = ids.get_mut(&id) {
            *used = false;
        }
    }

    /// Check if an id is currently allocated.
    pub fn in_use(&self, id: u32) -> bool {
        let ids = self.ids.lock().unwrap_or_else(|e| e.into_inner());
        ids.get(&id) == Some(&true)
    }
}

/// Create a unique, but predictable, name for a simulator.
///
/// The name format is `<app>-p<pid>-<id>`.
pub fn unique_name(app: &str, id: u32) -> String {
    format!("{}-p{}-{}", app, process::id(), id)
}

/// The name of the running executable, as drawn from `argv[0]`.
pub fn app_name() -> String {
    if let Some(app) = env::args_os().next() {
        if let Some(path) = Path::new(app.as_os_str()).file_name() {
            if let Some(app) = path.to_str() {
                return app.into();
            }
        }
    }
    "gpiosysfs".into()
}
