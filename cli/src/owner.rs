// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::common::{errno_name, Context, Skip, LINE, NUM_LINES};
use super::runner::Case;
use anyhow::{bail, ensure, Context as _, Result};
use gpiosysfs::{Direction, Level, Line};
use libc::{EACCES, EPERM};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{chown, fork, setgid, setgroups, setuid, ForkResult, User};
use std::fs;
use std::os::unix::fs::PermissionsExt;

pub const CASES: &[Case] = &[Case {
    name: "line_ownership",
    check: ownership,
}];

// The exit status of a child that could not drop privileges.
const NO_PRIVDROP: i32 = 255;

// Run the function in a child process as the user, returning the exit status.
//
// The function returns 0 on success or the errno of the failed operation.
fn run_as<F: FnOnce() -> i32>(user: &User, f: F) -> Result<i32> {
    // SAFETY: the runner is single threaded while checks run and the child
    // only writes sysfs attributes before exiting.
    match unsafe { fork() }.context("unable to fork test process")? {
        ForkResult::Child => {
            let code = match drop_privileges(user) {
                Ok(()) => f(),
                Err(_) => NO_PRIVDROP,
            };
            unsafe { libc::_exit(code) }
        }
        ForkResult::Parent { child } => match waitpid(child, None)? {
            WaitStatus::Exited(_, NO_PRIVDROP) => {
                bail!("unable to switch to user '{}'", user.name)
            }
            WaitStatus::Exited(_, code) => Ok(code),
            status => bail!("test process did not exit cleanly: {status:?}"),
        },
    }
}

fn drop_privileges(user: &User) -> nix::Result<()> {
    setgroups(&[user.gid])?;
    setgid(user.gid)?;
    setuid(user.uid)
}

fn write_attr(l: &Line, attr: &str, value: &str) -> i32 {
    match l.write_attr(attr, value) {
        Ok(()) => 0,
        Err(e) => e.os_error().unwrap_or(NO_PRIVDROP - 1),
    }
}

fn expect_status(status: i32, expected: i32, what: &str) -> Result<()> {
    let name = |code| match code {
        0 => "success".to_string(),
        _ => errno_name(code),
    };
    ensure!(
        status == expected,
        "{what} as test user: expected {}, got {}",
        name(expected),
        name(status)
    );
    Ok(())
}

fn ownership(ctx: &Context) -> Result<()> {
    let name = ctx
        .user
        .as_deref()
        .ok_or_else(|| Skip("no test user specified".into()))?;
    let user = User::from_name(name)
        .with_context(|| format!("unable to look up user '{name}'"))?
        .ok_or_else(|| anyhow::anyhow!("unknown user '{name}'"))?;

    let c = ctx.chip(NUM_LINES)?;
    let offset = c.base() + LINE;
    let l = ctx.export(offset)?;
    l.set_direction(Direction::Output)?;
    l.set_value(Level::Low)?;

    let status = run_as(&user, || write_attr(&l, "value", "1"))?;
    expect_status(status, EACCES, "value write before chown")?;

    let dir = l.path();
    for attr in ["direction", "value", "edge", "active_low"] {
        let path = dir.join(attr);
        chown(&path, Some(user.uid), Some(user.gid))
            .with_context(|| format!("unable to chown '{}'", path.display()))?;
    }

    let status = run_as(&user, || match write_attr(&l, "direction", "out") {
        0 => write_attr(&l, "value", "1"),
        code => code,
    })?;
    expect_status(status, 0, "direction and value write after chown")?;
    let level = c.get_value(offset)?;
    ensure!(
        level == Level::High,
        "simulator level is {level} after write by test user"
    );

    let sysfs = ctx.paths.sysfs.clone();
    let status = run_as(&user, || {
        match gpiosysfs::line::export(&sysfs, (offset + 1).to_string()) {
            Ok(()) => 0,
            Err(e) => e.os_error().unwrap_or(NO_PRIVDROP - 1),
        }
    })?;
    expect_status(status, EACCES, "export")?;

    let export = ctx.paths.sysfs.join("export");
    let status = run_as(&user, || {
        match fs::set_permissions(&export, fs::Permissions::from_mode(0o222)) {
            Ok(()) => 0,
            Err(e) => e.raw_os_error().unwrap_or(NO_PRIVDROP - 1),
        }
    })?;
    expect_status(status, EPERM, "chmod export")?;
    Ok(())
}
