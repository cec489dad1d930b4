// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::common::{expect_errno, expect_mode, Context, LINE, NUM_LINES};
use super::runner::Case;
use anyhow::{ensure, Result};
use gpiosysfs::{Direction, Edge, Level};
use libc::{EINVAL, EPERM};

pub const CASES: &[Case] = &[
    Case {
        name: "line_modes",
        check: modes,
    },
    Case {
        name: "line_direction",
        check: direction,
    },
    Case {
        name: "line_edge",
        check: edge,
    },
    Case {
        name: "line_input_write",
        check: input_write,
    },
    Case {
        name: "line_output_value",
        check: output_value,
    },
    Case {
        name: "line_input_pull",
        check: input_pull,
    },
    Case {
        name: "line_active_low",
        check: active_low,
    },
];

fn modes(ctx: &Context) -> Result<()> {
    let c = ctx.chip(NUM_LINES)?;
    let l = ctx.export(c.base() + LINE)?;
    let dir = l.path();
    for attr in ["direction", "value", "edge", "active_low", "uevent"] {
        expect_mode(&dir.join(attr), 0o644)?;
    }
    expect_mode(&dir, 0o755)?;
    Ok(())
}

fn direction(ctx: &Context) -> Result<()> {
    let c = ctx.chip(NUM_LINES)?;
    let l = ctx.export(c.base() + LINE)?;
    let d = l.direction()?;
    ensure!(d == Direction::Input, "initial direction is {d}, expected in");
    for d in [Direction::Output, Direction::Input] {
        l.set_direction(d)?;
        let actual = l.direction()?;
        ensure!(actual == d, "direction is {actual} after writing {d}");
        for value in ["sideways", "inout", "0"] {
            expect_errno(
                l.write_attr("direction", value),
                &[EINVAL],
                &format!("direction {value:?}"),
            )?;
            let actual = l.direction()?;
            ensure!(
                actual == d,
                "direction changed from {d} to {actual} by invalid write"
            );
        }
    }
    Ok(())
}

fn edge(ctx: &Context) -> Result<()> {
    let c = ctx.chip(NUM_LINES)?;
    let l = ctx.export(c.base() + LINE)?;
    let e = l.edge()?;
    ensure!(e == Edge::None, "initial edge is {e}, expected none");
    for e in Edge::ALL {
        l.set_edge(e)?;
        let actual = l.edge()?;
        ensure!(actual == e, "edge is {actual} after writing {e}");
        expect_errno(l.write_attr("edge", "diagonal"), &[EINVAL], "edge \"diagonal\"")?;
        let actual = l.edge()?;
        ensure!(
            actual == e,
            "edge changed from {e} to {actual} by invalid write"
        );
    }
    Ok(())
}

fn input_write(ctx: &Context) -> Result<()> {
    let c = ctx.chip(NUM_LINES)?;
    let l = ctx.export(c.base() + LINE)?;
    l.set_direction(Direction::Input)?;
    expect_errno(l.set_value(Level::High), &[EPERM], "value write to input")
}

fn output_value(ctx: &Context) -> Result<()> {
    let c = ctx.chip(NUM_LINES)?;
    let offset = c.base() + LINE;
    let l = ctx.export(offset)?;
    l.set_direction(Direction::Output)?;
    for level in [Level::High, Level::Low] {
        l.set_value(level)?;
        let actual = c.get_value(offset)?;
        ensure!(
            actual == level,
            "simulator level is {actual} after writing {level}"
        );
        let read = l.value()?;
        ensure!(read == level, "value reads {read} after writing {level}");
    }
    Ok(())
}

fn input_pull(ctx: &Context) -> Result<()> {
    let c = ctx.chip(NUM_LINES)?;
    let offset = c.base() + LINE;
    let l = ctx.export(offset)?;
    l.set_direction(Direction::Input)?;
    for level in [Level::High, Level::Low] {
        c.set_pull(offset, level)?;
        let actual = l.value()?;
        ensure!(actual == level, "value reads {actual} when pulled to {level}");
    }
    Ok(())
}

fn active_low(ctx: &Context) -> Result<()> {
    let c = ctx.chip(NUM_LINES)?;
    let offset = c.base() + LINE;
    let l = ctx.export(offset)?;
    l.set_direction(Direction::Input)?;
    for level in [Level::High, Level::Low] {
        c.set_pull(offset, level)?;
        for active_low in [false, true] {
            l.set_active_low(active_low)?;
            let al = l.active_low()?;
            ensure!(al == active_low, "active_low did not take");
            let expected = if active_low { !level } else { level };
            let actual = l.value()?;
            ensure!(
                actual == expected,
                "value reads {actual} when pulled to {level} with active_low {}",
                u8::from(active_low)
            );
        }
    }
    Ok(())
}
