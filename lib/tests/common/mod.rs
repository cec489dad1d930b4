// SPDX-FileCopyrightText: 2023 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use gpiosysfs::Paths;
use std::sync::{Mutex, MutexGuard};

// Chips are numbered by the kernel, so a chip created while another test is
// releasing one may take over its sysfs entry. Live tests are serialised.
static LIVE: Mutex<()> = Mutex::new(());

pub struct Live {
    pub paths: Paths,
    _guard: MutexGuard<'static, ()>,
}

// The live environment.
//
// Live tests require root, the gpio-sim module and a kernel with
// CONFIG_GPIO_SYSFS, so they are ignored by default and run with
// `cargo test -- --ignored`.
pub fn live() -> Live {
    let paths = Paths::default();
    assert_eq!(unsafe { libc::geteuid() }, 0, "live tests must be run as root");
    assert!(
        paths.sysfs.join("export").exists(),
        "GPIO sysfs not found at '{}'",
        paths.sysfs.display()
    );
    assert!(
        paths.configfs.is_dir(),
        "gpio-sim not found at '{}'",
        paths.configfs.display()
    );
    Live {
        paths,
        _guard: LIVE.lock().unwrap_or_else(|e| e.into_inner()),
    }
}
