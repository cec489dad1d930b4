// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use anyhow::{bail, ensure, Context as _, Result};
use gpiosysfs::{Chip, Line, Offset, Paths, Timing};
use nix::errno::Errno;
use std::fmt::Debug;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// The label given to the simulated chips.
pub const LABEL: &str = "gpio-sysfs-test";

/// The number of lines on the simulated chips.
pub const NUM_LINES: u32 = 8;

/// The chip-local offset of the line used by single line checks.
pub const LINE: Offset = 2;

/// The environment shared by all checks.
#[derive(Debug)]
pub struct Context {
    pub paths: Paths,

    /// A user to take ownership of lines.
    pub user: Option<String>,

    pub timing: Timing,
}

impl Context {
    /// Create a simulated chip with the default label.
    pub fn chip(&self, num_lines: u32) -> Result<Chip> {
        Chip::create(&self.paths, num_lines, Some(LABEL))
            .with_context(|| format!("unable to create chip with {num_lines} lines"))
    }

    /// Export a line to sysfs.
    pub fn export(&self, offset: Offset) -> Result<Line> {
        Line::export(&self.paths.sysfs, offset)
            .with_context(|| format!("unable to export line {offset}"))
    }
}

/// Returned by a check that cannot run in the current environment.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct Skip(pub String);

/// Check the sysfs and configfs roots are present and accessible.
pub fn check_roots(paths: &Paths) -> Result<()> {
    for dir in [&paths.sysfs, &paths.configfs] {
        fs::read_dir(dir).with_context(|| format!("cannot access '{}'", dir.display()))?;
    }
    Ok(())
}

/// The symbolic name of an errno, e.g. `EINVAL`.
pub fn errno_name(code: i32) -> String {
    format!("{:?}", Errno::from_raw(code))
}

fn errno_names(codes: &[i32]) -> String {
    codes
        .iter()
        .map(|c| errno_name(*c))
        .collect::<Vec<_>>()
        .join(" or ")
}

/// Check an operation failed with one of the expected errors.
pub fn expect_errno<T: Debug>(
    res: gpiosysfs::Result<T>,
    expected: &[i32],
    what: &str,
) -> Result<()> {
    let e = match res {
        Ok(v) => bail!("{what}: expected {}, got {v:?}", errno_names(expected)),
        Err(e) => e,
    };
    match e.os_error() {
        Some(code) if expected.contains(&code) => Ok(()),
        _ => Err(anyhow::Error::new(e).context(format!(
            "{what}: expected {}",
            errno_names(expected)
        ))),
    }
}

/// Check the permission bits of a file.
pub fn expect_mode(path: &Path, mode: u32) -> Result<()> {
    let md = fs::metadata(path).with_context(|| format!("cannot stat '{}'", path.display()))?;
    let actual = md.permissions().mode() & 0o7777;
    ensure!(
        actual == mode,
        "'{}' has mode {actual:04o}, expected {mode:04o}",
        path.display()
    );
    Ok(())
}
