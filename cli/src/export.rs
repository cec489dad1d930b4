// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::common::{expect_errno, expect_mode, Context, LINE, NUM_LINES};
use super::runner::Case;
use anyhow::{ensure, Result};
use gpiosysfs::line;
use libc::{EBUSY, EINVAL};

pub const CASES: &[Case] = &[
    Case {
        name: "export_unexport",
        check: export_unexport,
    },
    Case {
        name: "export_invalid",
        check: export_invalid,
    },
    Case {
        name: "export_collision",
        check: export_collision,
    },
    Case {
        name: "unexport_invalid",
        check: unexport_invalid,
    },
    Case {
        name: "export_modes",
        check: modes,
    },
];

const ENTRIES: [&str; 8] = [
    "direction",
    "value",
    "edge",
    "active_low",
    "device",
    "power",
    "subsystem",
    "uevent",
];

fn export_unexport(ctx: &Context) -> Result<()> {
    let c = ctx.chip(NUM_LINES)?;
    let mut l = ctx.export(c.base() + LINE)?;
    let dir = l.path();
    ensure!(dir.is_dir(), "'{}' not created", dir.display());
    for entry in ENTRIES {
        ensure!(dir.join(entry).exists(), "line {entry} missing");
    }
    l.unexport();
    ensure!(!dir.exists(), "'{}' remains after unexport", dir.display());
    l.unexport();
    ensure!(!dir.exists(), "'{}' reappeared", dir.display());
    Ok(())
}

fn export_invalid(ctx: &Context) -> Result<()> {
    for value in ["-1", "abc"] {
        expect_errno(
            line::export(&ctx.paths.sysfs, value),
            &[EINVAL],
            &format!("export {value:?}"),
        )?;
    }
    Ok(())
}

// Older kernels report EINVAL for lines already in use, newer ones EBUSY.
fn export_collision(ctx: &Context) -> Result<()> {
    let c = ctx.chip(NUM_LINES)?;
    let l = ctx.export(c.base() + LINE)?;
    expect_errno(
        line::export(&ctx.paths.sysfs, l.offset().to_string()),
        &[EINVAL, EBUSY],
        "export of exported line",
    )?;
    ensure!(l.path().is_dir(), "exported line removed by collision");
    Ok(())
}

fn unexport_invalid(ctx: &Context) -> Result<()> {
    let c = ctx.chip(NUM_LINES)?;
    for value in ["-1", "abc"] {
        expect_errno(
            line::unexport(&ctx.paths.sysfs, value),
            &[EINVAL],
            &format!("unexport {value:?}"),
        )?;
    }
    expect_errno(
        line::unexport(&ctx.paths.sysfs, (c.base() + LINE).to_string()),
        &[EINVAL],
        "unexport of unexported line",
    )
}

fn modes(ctx: &Context) -> Result<()> {
    for file in ["export", "unexport"] {
        expect_mode(&ctx.paths.sysfs.join(file), 0o200)?;
    }
    Ok(())
}
