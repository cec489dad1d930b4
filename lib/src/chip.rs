// SPDX-FileCopyrightText: 2022 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::attr::{read_attr, write_attr};
use crate::edge::Pull;
use crate::id::{app_name, unique_name, IdAllocator};
use crate::poll::Retry;
use crate::{Error, Level, Offset, Paths, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

// The single bank simulated by each chip.
const BANK: &str = "bank0";

const CLASS_PREFIX: &str = "gpiochip";

/// Start building a simulated chip.
pub fn builder(paths: &Paths) -> Builder {
    Builder {
        paths: paths.clone(),
        label: None,
        retry: Retry::default(),
        ids: None,
    }
}

/// A builder of simulated chips.
///
/// Collects the configuration for the chip, and then creates the chip
/// when taken live.
#[derive(Clone, Debug)]
pub struct Builder {
    /// The locations of configfs and sysfs.
    pub paths: Paths,

    /// The label for the chip.
    ///
    /// If None then the gpio-sim default is used.
    pub label: Option<String>,

    /// The policy for waiting on the sysfs chip entry.
    pub retry: Retry,

    /// The allocator of simulator ids.
    ///
    /// If None then the process-wide allocator is used.
    pub ids: Option<Arc<IdAllocator>>,
}

impl Builder {
    /// Specify the label for the chip.
    pub fn with_label<N: Into<String>>(&mut self, label: N) -> &mut Self {
        self.label = Some(label.into());
        self
    }

    /// Specify the policy for waiting on the sysfs chip entry.
    pub fn with_retry(&mut self, retry: Retry) -> &mut Self {
        self.retry = retry;
        self
    }

    /// Specify the allocator used to name the simulator.
    pub fn with_allocator(&mut self, ids: Arc<IdAllocator>) -> &mut Self {
        self.ids = Some(ids);
        self
    }

    /// Take a chip with the given number of lines live.
    ///
    /// The chip is named `<app>-p<pid>-<id>` in configfs, where the id is
    /// drawn from the allocator.
    ///
    /// If any step fails then whatever was created is removed before the
    /// error is returned.
    pub fn live(&self, num_lines: u32) -> Result<Chip> {
        if num_lines == 0 {
            return Err(Error::InvalidLineCount(num_lines));
        }
        let ids = self.ids.clone().unwrap_or_else(IdAllocator::global);
        let app = app_name();
        let (id, name) = loop {
            let id = ids.allocate();
            let name = unique_name(&app, id);
            if !self.paths.configfs.join(&name).exists() {
                break (id, name);
            }
            // left behind by an earlier run, so the id stays reserved
            debug!(%name, "skipping existing simulator");
        };
        let mut chip = Chip {
            dir: self.paths.configfs.join(&name),
            name,
            id,
            ids,
            paths: self.paths.clone(),
            retry: self.retry,
            num_lines,
            label: self.label.clone(),
            dev_name: String::new(),
            chip_name: String::new(),
            class_name: String::new(),
            base: 0,
            created: false,
            released: false,
        };
        // on error the chip is dropped, which releases it
        chip.live()?;
        Ok(chip)
    }
}

/// A live simulated chip with a single bank of lines.
#[derive(Debug)]
pub struct Chip {
    /// The name of the simulator in configfs.
    name: String,

    /// The id used to generate the name.
    id: u32,

    /// The allocator that provided the id.
    ids: Arc<IdAllocator>,

    paths: Paths,

    retry: Retry,

    /// Path to the simulator in configfs.
    dir: PathBuf,

    num_lines: u32,

    label: Option<String>,

    /// The name of the gpio-sim platform device.
    dev_name: String,

    /// The name of the gpiochip in /dev and on the gpio bus.
    chip_name: String,

    /// The name of the chip entry in the sysfs GPIO class.
    class_name: String,

    /// The number of the first line on the chip.
    base: Offset,

    /// The configfs directory was created by this chip.
    created: bool,

    released: bool,
}

impl Chip {
    /// Create a live chip with the default settings.
    pub fn create(paths: &Paths, num_lines: u32, label: Option<&str>) -> Result<Chip> {
        let mut b = builder(paths);
        if let Some(label) = label {
            b.with_label(label);
        }
        b.live(num_lines)
    }

    fn live(&mut self) -> Result<()> {
        match fs::create_dir(&self.dir) {
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(Error::SimulatorExists(self.name.clone()))
            }
            res => res?,
        }
        self.created = true;
        let bank_dir = self.dir.join(BANK);
        fs::create_dir(&bank_dir)?;
        write_attr(&bank_dir, "num_lines", self.num_lines.to_string())?;
        if let Some(label) = &self.label {
            write_attr(&bank_dir, "label", label)?;
        }
        // attributes must be set before going live
        write_attr(&self.dir, "live", "1")?;
        debug!(name = %self.name, num_lines = self.num_lines, "simulator live");

        self.dev_name = read_attr(&self.dir, "dev_name")?;
        self.chip_name = read_attr(&bank_dir, "chip_name")?;
        let (class_name, base) =
            discover(&self.paths, &self.retry, &self.dev_name, &self.chip_name)?;
        self.class_name = class_name;
        self.base = base;
        debug!(
            name = %self.name,
            chip = %self.chip_name,
            class = %self.class_name,
            base = self.base,
            "found sysfs chip"
        );
        Ok(())
    }

    /// Take the chip offline and remove it from configfs.
    ///
    /// Waits for the sysfs chip entry to be removed, so a subsequent chip
    /// cannot be confused with this one.
    ///
    /// Errors are ignored, and calling this more than once has no effect.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if self.created {
            if let Err(e) = write_attr(&self.dir, "live", "0") {
                debug!(name = %self.name, error = %e, "failed to take simulator offline");
            }
            if let Err(e) = fs::remove_dir(self.dir.join(BANK)) {
                debug!(name = %self.name, error = %e, "failed to remove bank");
            }
            if let Err(e) = fs::remove_dir(&self.dir) {
                debug!(name = %self.name, error = %e, "failed to remove simulator");
            }
            if !self.class_name.is_empty() {
                let entry = self.path();
                if !self.retry.poll(|| !entry.exists()) {
                    debug!(name = %self.name, class = %self.class_name, "sysfs chip not removed");
                }
            }
            debug!(name = %self.name, "simulator released");
        }
        self.ids.release(self.id);
    }

    /// Returns true until the chip is released.
    pub fn is_live(&self) -> bool {
        !self.released
    }

    /// The name of the simulator in configfs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The number of lines on the chip.
    pub fn num_lines(&self) -> u32 {
        self.num_lines
    }

    /// The label requested for the chip.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// The name of the gpio-sim platform device.
    pub fn dev_name(&self) -> &str {
        &self.dev_name
    }

    /// The name of the gpiochip in /dev and on the gpio bus.
    pub fn chip_name(&self) -> &str {
        &self.chip_name
    }

    /// The name of the chip in the sysfs GPIO class, `gpiochip<base>`.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// The global number of the first line on the chip.
    pub fn base(&self) -> Offset {
        self.base
    }

    /// The path to the chip in the sysfs GPIO class.
    pub fn path(&self) -> PathBuf {
        self.paths.sysfs.join(&self.class_name)
    }

    /// The path to the chip character device.
    pub fn dev_path(&self) -> PathBuf {
        self.paths.dev.join(&self.chip_name)
    }

    // The line offset relative to the chip.
    //
    // Lines outside the chip are rejected. The bound is on the local offset;
    // comparing the local offset against `base + num_lines`, as earlier
    // harnesses did, accepts lines past the end of any chip with a non-zero
    // base.
    fn local_offset(&self, offset: Offset) -> Result<Offset> {
        offset
            .checked_sub(self.base)
            .filter(|local| *local < self.num_lines)
            .ok_or(Error::OffsetOutOfRange(offset))
    }

    fn line_dir(&self, offset: Offset) -> Result<PathBuf> {
        let local = self.local_offset(offset)?;
        let mut dir = self.paths.platform.join(&self.dev_name);
        dir.push(&self.chip_name);
        dir.push(format!("sim_gpio{}", local));
        Ok(dir)
    }

    /// Pull a line to simulate the line being externally driven.
    pub fn set_pull(&self, offset: Offset, pull: Level) -> Result<()> {
        let value = match pull {
            Level::Low => "pull-down",
            Level::High => "pull-up",
        };
        write_attr(&self.line_dir(offset)?, "pull", value)
    }

    /// Pull a line up to simulate the line being externally driven high.
    pub fn pullup(&self, offset: Offset) -> Result<()> {
        self.set_pull(offset, Level::High)
    }

    /// Pull a line down to simulate the line being externally driven low.
    pub fn pulldown(&self, offset: Offset) -> Result<()> {
        self.set_pull(offset, Level::Low)
    }

    /// Toggle the pull on a line.
    pub fn toggle(&self, offset: Offset) -> Result<Level> {
        let value = !self.get_pull(offset)?;
        self.set_pull(offset, value)?;
        Ok(value)
    }

    /// Get the current state of the simulated external pull on a line.
    pub fn get_pull(&self, offset: Offset) -> Result<Level> {
        let pull = read_attr(&self.line_dir(offset)?, "pull")?;
        match pull.as_str() {
            "pull-down" => Ok(Level::Low),
            "pull-up" => Ok(Level::High),
            _ => Err(Error::UnexpectedValue(pull)),
        }
    }

    /// Get the physical level of a line.
    ///
    /// For outputs this is the level driven by the line's user.
    pub fn get_value(&self, offset: Offset) -> Result<Level> {
        read_attr(&self.line_dir(offset)?, "value")?.parse()
    }
}

impl Drop for Chip {
    fn drop(&mut self) {
        self.release();
    }
}

impl Pull for Chip {
    fn set_pull(&self, offset: Offset, level: Level) -> Result<()> {
        Chip::set_pull(self, offset, level)
    }
}

// Locate the devices the kernel creates for a live simulator.
//
// The character device and bus entry are created before the simulator goes
// live, while the sysfs class entry may lag, so only the latter is retried.
fn discover(
    paths: &Paths,
    retry: &Retry,
    dev_name: &str,
    chip_name: &str,
) -> Result<(String, Offset)> {
    for p in [paths.dev.join(chip_name), paths.bus.join(chip_name)] {
        if !p.exists() {
            return Err(Error::DeviceNotCreated(p));
        }
    }
    let mut found = None;
    retry.poll(|| {
        found = find_class_entry(&paths.sysfs, dev_name, chip_name);
        found.is_some()
    });
    let class_name = found.ok_or_else(|| Error::ChipNotFound(chip_name.into()))?;
    let base = parse_base(&class_name)?;
    Ok((class_name, base))
}

// Find the sysfs class entry whose device is the simulated chip.
//
// Depending on the kernel the device is either the gpio device itself or its
// platform parent. As each simulator has a single bank either identifies the
// chip.
fn find_class_entry(sysfs: &Path, dev_name: &str, chip_name: &str) -> Option<String> {
    let chip = Path::new(dev_name).join(chip_name);
    for entry in fs::read_dir(sysfs).ok()?.flatten() {
        let dev = match fs::canonicalize(entry.path().join("device")) {
            Ok(dev) => dev,
            Err(_) => continue,
        };
        if dev.ends_with(&chip) || dev.ends_with(dev_name) {
            return entry.file_name().into_string().ok();
        }
    }
    None
}

// Extract the base from a `gpiochip<N>` class entry name.
fn parse_base(class_name: &str) -> Result<Offset> {
    match class_name.strip_prefix(CLASS_PREFIX) {
        Some(num) if !num.is_empty() && num.chars().all(|c| c.is_ascii_digit()) => num
            .parse()
            .map_err(|_| Error::UnexpectedName(class_name.into())),
        _ => Err(Error::UnexpectedName(class_name.into())),
    }
}
