// SPDX-FileCopyrightText: 2022 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::thread::sleep;
use std::time::Duration;

/// The policy for waiting on the kernel to create or remove sysfs entries.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Retry {
    /// The period between checks.
    pub interval: Duration,

    /// The maximum number of checks.
    pub attempts: u32,
}

impl Default for Retry {
    fn default() -> Self {
        Retry {
            interval: Duration::from_millis(100),
            attempts: 10,
        }
    }
}

impl Retry {
    /// Poll the predicate using this policy.
    pub fn poll<F: FnMut() -> bool>(&self, predicate: F) -> bool {
        poll_until(predicate, self.interval, self.attempts)
    }
}

/// Evaluate the predicate until it returns true, up to `attempts` times,
/// sleeping for `interval` after each failed evaluation.
///
/// Returns the final result of the predicate.
pub fn poll_until<F: FnMut() -> bool>(mut predicate: F, interval: Duration, attempts: u32) -> bool {
    for attempt in 0..attempts {
        if predicate() {
            return true;
        }
        tracing::trace!(attempt, "condition not met, retrying");
        sleep(interval);
    }
    false
}
