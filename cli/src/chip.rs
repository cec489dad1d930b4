// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::common::{expect_mode, Context, LABEL, NUM_LINES};
use super::runner::Case;
use anyhow::{ensure, Result};
use gpiosysfs::attr::read_attr;
use gpiosysfs::{Chip, Error};

pub const CASES: &[Case] = &[
    Case {
        name: "chip_attributes",
        check: attributes,
    },
    Case {
        name: "chip_modes",
        check: modes,
    },
    Case {
        name: "chip_release",
        check: release,
    },
    Case {
        name: "chip_zero_lines",
        check: zero_lines,
    },
];

const ENTRIES: [&str; 7] = [
    "base",
    "label",
    "ngpio",
    "device",
    "power",
    "subsystem",
    "uevent",
];

fn attributes(ctx: &Context) -> Result<()> {
    let c = ctx.chip(NUM_LINES)?;
    let dir = c.path();
    ensure!(dir.is_dir(), "'{}' is not a directory", dir.display());
    for entry in ENTRIES {
        ensure!(dir.join(entry).exists(), "chip {entry} missing");
    }
    let base = read_attr(&dir, "base")?;
    ensure!(
        base == c.base().to_string(),
        "base is {base}, expected {}",
        c.base()
    );
    let label = read_attr(&dir, "label")?;
    ensure!(label == LABEL, "label is {label:?}, expected {LABEL:?}");
    let ngpio = read_attr(&dir, "ngpio")?;
    ensure!(
        ngpio == NUM_LINES.to_string(),
        "ngpio is {ngpio}, expected {NUM_LINES}"
    );
    Ok(())
}

fn modes(ctx: &Context) -> Result<()> {
    let c = ctx.chip(NUM_LINES)?;
    let dir = c.path();
    for attr in ["base", "label", "ngpio"] {
        expect_mode(&dir.join(attr), 0o444)?;
    }
    expect_mode(&dir.join("uevent"), 0o644)?;
    expect_mode(&dir, 0o755)?;
    Ok(())
}

fn release(ctx: &Context) -> Result<()> {
    for num_lines in [1, NUM_LINES, 64] {
        let mut c = ctx.chip(num_lines)?;
        let dir = c.path();
        let sim_dir = ctx.paths.configfs.join(c.name());
        c.release();
        ensure!(!dir.exists(), "'{}' remains after release", dir.display());
        ensure!(
            !sim_dir.exists(),
            "'{}' remains after release",
            sim_dir.display()
        );
        // subsequent releases have no effect
        c.release();
        ensure!(!dir.exists(), "'{}' reappeared", dir.display());
    }
    Ok(())
}

fn zero_lines(ctx: &Context) -> Result<()> {
    match Chip::create(&ctx.paths, 0, Some(LABEL)) {
        Err(Error::InvalidLineCount(0)) => Ok(()),
        Err(e) => Err(anyhow::Error::new(e).context("expected invalid line count")),
        Ok(c) => anyhow::bail!("created chip {} with no lines", c.name()),
    }
}
