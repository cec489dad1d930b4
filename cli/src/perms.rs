// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::common::{expect_errno, Context, LINE, NUM_LINES};
use super::runner::Case;
use anyhow::Result;
use gpiosysfs::Error;
use libc::{EACCES, ENOTDIR, EPERM};
use std::fs::{self, File};
use std::path::Path;

pub const CASES: &[Case] = &[
    Case {
        name: "nodes_not_removable",
        check: not_removable,
    },
    Case {
        name: "nodes_not_creatable",
        check: not_creatable,
    },
];

// sysfs supports neither unlink nor mkdir, and class entries are symlinks.
const DENIED: &[i32] = &[ENOTDIR, EPERM, EACCES];

fn remove_file(path: &Path) -> gpiosysfs::Result<()> {
    fs::remove_file(path).map_err(Error::from)
}

fn remove_dir(path: &Path) -> gpiosysfs::Result<()> {
    fs::remove_dir(path).map_err(Error::from)
}

fn not_removable(ctx: &Context) -> Result<()> {
    let c = ctx.chip(NUM_LINES)?;
    let l = ctx.export(c.base() + LINE)?;
    let sysfs = &ctx.paths.sysfs;
    for file in ["export", "unexport"] {
        expect_errno(remove_file(&sysfs.join(file)), DENIED, &format!("remove {file}"))?;
    }
    expect_errno(remove_dir(&c.path()), DENIED, "remove chip")?;
    expect_errno(remove_dir(&l.path()), DENIED, "remove line")?;
    expect_errno(remove_file(&c.path().join("ngpio")), DENIED, "remove ngpio")?;
    expect_errno(remove_file(&l.path().join("value")), DENIED, "remove value")?;
    Ok(())
}

fn not_creatable(ctx: &Context) -> Result<()> {
    let c = ctx.chip(NUM_LINES)?;
    let l = ctx.export(c.base() + LINE)?;
    let bogus = ctx.paths.sysfs.join(format!("gpio{}", c.base() + NUM_LINES));
    expect_errno(
        fs::create_dir(&bogus).map_err(Error::from),
        DENIED,
        "create line directory",
    )?;
    for dir in [&ctx.paths.sysfs, &c.path(), &l.path()] {
        expect_errno(
            File::create(dir.join("bogus")).map_err(Error::from),
            DENIED,
            &format!("create file in '{}'", dir.display()),
        )?;
    }
    Ok(())
}
