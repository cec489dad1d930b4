// SPDX-FileCopyrightText: 2022 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A library for exercising the Linux GPIO sysfs interface against chips
//! simulated by the gpio-sim module.
//!
//! Simulated chips are created using the [`chip::builder`], or [`Chip::create`]
//! for the common case, and are removed when dropped.
//!
//! Lines on those chips are exported to sysfs using [`Line::export`], and are
//! unexported when dropped.
//!
//! Edge detection on an exported line can be checked with the [`EdgeObserver`].
//!
//! The library controls the simulators via configfs and the lines via sysfs,
//! so using it generally requires root permissions.
//!
//! [`Chip::create`]: chip::Chip::create
//! [`Line::export`]: line::Line::export
//! [`EdgeObserver`]: edge::EdgeObserver

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

/// Helpers to read and write individual attribute files.
pub mod attr;

/// Simulated chips provisioned via gpio-sim.
pub mod chip;

/// Detection of edge events on exported lines.
pub mod edge;

/// Allocation of identifiers for simulator instances.
pub mod id;

/// Lines exported to the sysfs interface.
pub mod line;

/// Bounded polling for asynchronous kernel state changes.
pub mod poll;

pub use chip::Chip;
pub use edge::{EdgeObserver, Observation, Pull, Timing};
pub use id::IdAllocator;
pub use line::{Direction, Edge, Line};
pub use poll::{poll_until, Retry};

/// The global number of a line, i.e. the chip base plus the offset of the line
/// on the chip.
pub type Offset = u32;

/// The root directories of the filesystems used to simulate and control chips.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Paths {
    /// The GPIO class directory in sysfs.
    pub sysfs: PathBuf,

    /// The gpio-sim directory in configfs.
    pub configfs: PathBuf,

    /// The directory containing the GPIO character devices.
    pub dev: PathBuf,

    /// The GPIO bus devices directory in sysfs.
    pub bus: PathBuf,

    /// The platform devices directory in sysfs, where gpio-sim exposes its
    /// line attributes.
    pub platform: PathBuf,
}

impl Paths {
    /// Paths with the given sysfs and configfs roots and default locations
    /// for everything else.
    pub fn new<S: Into<PathBuf>, C: Into<PathBuf>>(sysfs: S, configfs: C) -> Paths {
        Paths {
            sysfs: sysfs.into(),
            configfs: configfs.into(),
            ..Default::default()
        }
    }
}

impl Default for Paths {
    fn default() -> Self {
        Paths {
            sysfs: "/sys/class/gpio".into(),
            configfs: "/sys/kernel/config/gpio-sim".into(),
            dev: "/dev".into(),
            bus: "/sys/bus/gpio/devices".into(),
            platform: "/sys/devices/platform".into(),
        }
    }
}

/// The physical level of a line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Level {
    /// The line is physically low.
    Low,

    /// The line is physically high.
    High,
}

impl std::ops::Not for Level {
    type Output = Level;

    fn not(self) -> Level {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Low => write!(f, "0"),
            Level::High => write!(f, "1"),
        }
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "0" => Ok(Level::Low),
            "1" => Ok(Level::High),
            _ => Err(Error::UnexpectedValue(s.into())),
        }
    }
}

/// The result for [`gpiosysfs`] functions.
///
/// [`gpiosysfs`]: crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by [`gpiosysfs`] functions.
///
/// [`gpiosysfs`]: crate
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A chip must have at least one line.
    #[error("Invalid number of lines: {0}")]
    InvalidLineCount(u32),

    /// The line is not provided by the chip.
    #[error("Line {0} is not on the chip")]
    OffsetOutOfRange(Offset),

    /// Attempt to take a simulator live with a name of an active simulator.
    #[error("Simulator with name {0:?} already exists")]
    SimulatorExists(String),

    /// The simulator went live but the expected device was not created.
    #[error("Device {0:?} was not created")]
    DeviceNotCreated(PathBuf),

    /// The sysfs entry for the simulated chip did not appear.
    #[error("Could not find sysfs entry for chip {0:?}")]
    ChipNotFound(String),

    /// The sysfs entry for the simulated chip has an unexpected name.
    #[error("Unexpected sysfs chip name {0:?}")]
    UnexpectedName(String),

    /// An unexpected value was read from a configfs or sysfs attribute file.
    #[error("Read unexpected attr value {0:?}")]
    UnexpectedValue(String),

    /// An IO error detected while accessing a configfs or sysfs attribute file.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// The OS error code underlying the error, if any.
    pub fn os_error(&self) -> Option<i32> {
        match self {
            Error::Io(e) => e.raw_os_error(),
            _ => None,
        }
    }
}
