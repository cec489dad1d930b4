// SPDX-FileCopyrightText: 2022 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::line::{Direction, Edge, Line};
use crate::{Error, Level, Offset, Result};
use libc::{c_long, pollfd, ppoll, sigset_t, time_t, timespec, POLLERR, POLLPRI};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::os::unix::io::AsRawFd;
use std::panic;
use std::ptr::null;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, sleep};
use std::time::Duration;
use tracing::trace;

/// A driver of the physical level of lines.
pub trait Pull: Sync {
    /// Drive the line with the given global offset to the level.
    fn set_pull(&self, offset: Offset, level: Level) -> Result<()>;
}

/// The timing of an edge observation.
///
/// The toggler must complete at least one full low-high-low cycle within
/// `iterations * wait_timeout`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Timing {
    /// The period between changes to the line level.
    pub toggle_period: Duration,

    /// The maximum time to wait for each edge.
    pub wait_timeout: Duration,

    /// The number of edges to wait for.
    pub iterations: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            toggle_period: Duration::from_millis(200),
            wait_timeout: Duration::from_millis(500),
            iterations: 2,
        }
    }
}

/// The transitions seen while observing a line.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Observation {
    /// A rising edge was seen.
    pub rising: bool,

    /// A falling edge was seen.
    pub falling: bool,
}

impl Observation {
    /// The transitions that should be seen on a toggling line with the
    /// given edge detection.
    pub fn expected(edge: Edge) -> Observation {
        Observation {
            rising: matches!(edge, Edge::Rising | Edge::Both),
            falling: matches!(edge, Edge::Falling | Edge::Both),
        }
    }

    // Classify the value read after an edge was reported.
    //
    // The value after a rising edge is high, and after a falling edge is low.
    fn record(&mut self, value: String) -> Result<()> {
        match value.as_str() {
            "1" => self.rising = true,
            "0" => self.falling = true,
            _ => return Err(Error::UnexpectedValue(value)),
        }
        Ok(())
    }
}

/// Watches a line for edges while its level is toggled.
pub struct EdgeObserver<'a, P: Pull> {
    line: &'a Line,
    driver: &'a P,
    timing: Timing,
}

impl<'a, P: Pull> EdgeObserver<'a, P> {
    /// Create an observer for the line, using the driver to toggle it.
    pub fn new(line: &'a Line, driver: &'a P) -> Self {
        EdgeObserver {
            line,
            driver,
            timing: Timing::default(),
        }
    }

    /// Replace the default timing.
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// Configure the line as an input with the edge detection, then toggle
    /// the line and report the edges seen.
    ///
    /// The line must initially be low.
    ///
    /// The toggler is stopped before returning.
    pub fn observe(&self, edge: Edge) -> Result<Observation> {
        self.line.set_direction(Direction::Input)?;
        self.line.set_edge(edge)?;
        let mut f = File::open(self.line.path().join("value"))?;
        // the initial read also arms the notification
        let initial = read_value(&mut f)?;
        if initial != "0" {
            return Err(Error::UnexpectedValue(initial));
        }

        let stop = AtomicBool::new(false);
        thread::scope(|s| -> Result<Observation> {
            let driver = self.driver;
            let offset = self.line.offset();
            let period = self.timing.toggle_period;
            let stop = &stop;
            let toggler = s.spawn(move || toggle(driver, offset, period, stop));
            let observed = self.watch(&mut f);
            stop.store(true, Ordering::Relaxed);
            let toggled = match toggler.join() {
                Ok(res) => res,
                Err(e) => panic::resume_unwind(e),
            };
            let observed = observed?;
            toggled?;
            trace!(offset, %edge, ?observed, "observed edges");
            Ok(observed)
        })
    }

    fn watch(&self, f: &mut File) -> Result<Observation> {
        let mut observed = Observation::default();
        for _ in 0..self.timing.iterations {
            if !wait_priority(f, self.timing.wait_timeout)? {
                continue;
            }
            observed.record(read_value(f)?)?;
        }
        Ok(observed)
    }
}

// Drive the line high then low, repeatedly, until stopped.
fn toggle<P: Pull>(driver: &P, offset: Offset, period: Duration, stop: &AtomicBool) -> Result<()> {
    let mut level = Level::High;
    loop {
        sleep(period);
        if stop.load(Ordering::Relaxed) {
            return Ok(());
        }
        driver.set_pull(offset, level)?;
        trace!(offset, %level, "toggled line");
        level = !level;
    }
}

// Read the whole of the value file.
fn read_value(f: &mut File) -> Result<String> {
    let mut s = String::new();
    f.seek(SeekFrom::Start(0))?;
    f.read_to_string(&mut s)?;
    Ok(s.trim().to_string())
}

// Wait for the file to report a priority event, as sysfs does for edges.
fn wait_priority(f: &File, d: Duration) -> Result<bool> {
    let mut pfd = pollfd {
        fd: f.as_raw_fd(),
        events: POLLPRI | POLLERR,
        revents: 0,
    };
    let timeout = timespec {
        tv_sec: d.as_secs() as time_t,
        tv_nsec: d.subsec_nanos() as c_long,
    };
    unsafe {
        match ppoll(
            std::ptr::addr_of_mut!(pfd),
            1,
            std::ptr::addr_of!(timeout),
            null() as *const sigset_t,
        ) {
            -1 => Err(Error::from(io::Error::last_os_error())),
            0 => Ok(false),
            _ => Ok(pfd.revents & (POLLPRI | POLLERR) != 0),
        }
    }
}
