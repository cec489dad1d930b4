// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::common::{Context, LINE, NUM_LINES};
use super::runner::Case;
use anyhow::{ensure, Context as _, Result};
use gpiosysfs::{Edge, EdgeObserver, Observation};

pub const CASES: &[Case] = &[
    Case {
        name: "edge_none",
        check: none,
    },
    Case {
        name: "edge_rising",
        check: rising,
    },
    Case {
        name: "edge_falling",
        check: falling,
    },
    Case {
        name: "edge_both",
        check: both,
    },
];

fn none(ctx: &Context) -> Result<()> {
    check(ctx, Edge::None)
}

fn rising(ctx: &Context) -> Result<()> {
    check(ctx, Edge::Rising)
}

fn falling(ctx: &Context) -> Result<()> {
    check(ctx, Edge::Falling)
}

fn both(ctx: &Context) -> Result<()> {
    check(ctx, Edge::Both)
}

fn check(ctx: &Context, edge: Edge) -> Result<()> {
    let c = ctx.chip(NUM_LINES)?;
    let l = ctx.export(c.base() + LINE)?;
    let observed = EdgeObserver::new(&l, &c)
        .with_timing(ctx.timing)
        .observe(edge)
        .with_context(|| format!("unable to observe {edge} edges"))?;
    let expected = Observation::expected(edge);
    ensure!(
        observed == expected,
        "with edge {edge} expected rising {}, falling {}, observed rising {}, falling {}",
        expected.rising,
        expected.falling,
        observed.rising,
        observed.falling
    );
    Ok(())
}
