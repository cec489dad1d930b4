// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A command line tool to check the GPIO sysfs interface using chips
//! simulated by gpio-sim.

use clap::{ArgAction, Parser};
use gpiosysfs::{Paths, Timing};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod chip;
mod common;
mod edges;
mod export;
mod line;
mod owner;
mod perms;
mod runner;

fn main() -> ExitCode {
    let opts = match Opts::try_parse() {
        Ok(opts) => opts,
        Err(e) => e.exit(),
    };
    init_logging(opts.verbose);

    let cases = all_cases();
    let selected = runner::select(&cases, &opts.checks);
    if opts.list {
        for case in selected {
            println!("{}", case.name);
        }
        return ExitCode::SUCCESS;
    }

    let ctx = common::Context {
        paths: Paths::new(opts.sysfs, opts.configfs),
        user: opts.user,
        timing: Timing::default(),
    };
    if let Err(e) = common::check_roots(&ctx.paths) {
        eprintln!("{e:#}");
        return ExitCode::from(2);
    }
    tracing::debug!(?ctx, "starting checks");

    if runner::run(&ctx, &selected, opts.verbose).success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn all_cases() -> Vec<runner::Case> {
    [
        chip::CASES,
        export::CASES,
        line::CASES,
        edges::CASES,
        perms::CASES,
        owner::CASES,
    ]
    .concat()
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Debug, Parser)]
#[command(
    name = "gpiosysfs-test",
    about = "Check the Linux GPIO sysfs interface using simulated chips.",
    version
)]
struct Opts {
    /// The checks to run
    ///
    /// Checks with names containing any of the given strings are run.
    /// If none are specified then all checks are run.
    #[arg(value_name = "check")]
    checks: Vec<String>,

    /// The GPIO class directory in sysfs
    #[arg(
        long,
        value_name = "dir",
        env = "GPIOSYSFS_SYSFS",
        default_value = "/sys/class/gpio"
    )]
    sysfs: PathBuf,

    /// The gpio-sim directory in configfs
    #[arg(
        long,
        value_name = "dir",
        env = "GPIOSYSFS_CONFIGFS",
        default_value = "/sys/kernel/config/gpio-sim"
    )]
    configfs: PathBuf,

    /// An unprivileged user to take ownership of lines
    ///
    /// The ownership check is skipped if not specified.
    #[arg(short, long, value_name = "name", env = "GPIOSYSFS_USER")]
    user: Option<String>,

    /// List the selected checks without running them
    #[arg(short, long)]
    list: bool,

    /// Report each check, and more detail on failures, with each repetition
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}
