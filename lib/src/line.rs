// SPDX-FileCopyrightText: 2022 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::attr::{read_attr, write_attr};
use crate::{Error, Level, Offset, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Request a line be exported by writing to the sysfs `export` file.
///
/// The value is written as is, so invalid values can be passed to the kernel.
pub fn export<D: AsRef<[u8]>>(sysfs: &Path, value: D) -> Result<()> {
    write_attr(sysfs, "export", value)
}

/// Request a line be unexported by writing to the sysfs `unexport` file.
///
/// The value is written as is, so invalid values can be passed to the kernel.
pub fn unexport<D: AsRef<[u8]>>(sysfs: &Path, value: D) -> Result<()> {
    write_attr(sysfs, "unexport", value)
}

/// A line exported to sysfs.
///
/// The line is unexported when dropped.
#[derive(Debug)]
pub struct Line {
    /// The sysfs GPIO class directory.
    sysfs: PathBuf,

    /// The global number of the line.
    offset: Offset,

    exported: bool,
}

impl Line {
    /// Export a line, creating its `gpio<offset>` directory in sysfs.
    pub fn export(sysfs: &Path, offset: Offset) -> Result<Line> {
        export(sysfs, offset.to_string())?;
        debug!(offset, "exported line");
        Ok(Line {
            sysfs: sysfs.to_path_buf(),
            offset,
            exported: true,
        })
    }

    /// Remove the line from sysfs.
    ///
    /// Errors are ignored, and calling this more than once has no effect.
    pub fn unexport(&mut self) {
        if !self.exported {
            return;
        }
        self.exported = false;
        match unexport(&self.sysfs, self.offset.to_string()) {
            Ok(()) => debug!(offset = self.offset, "unexported line"),
            Err(e) => debug!(offset = self.offset, error = %e, "failed to unexport line"),
        }
    }

    /// The global number of the line.
    pub fn offset(&self) -> Offset {
        self.offset
    }

    /// Returns true until the line is unexported.
    pub fn is_exported(&self) -> bool {
        self.exported
    }

    /// The path to the line directory in sysfs.
    pub fn path(&self) -> PathBuf {
        self.sysfs.join(format!("gpio{}", self.offset))
    }

    /// Read an attribute of the line.
    pub fn read_attr(&self, name: &str) -> Result<String> {
        read_attr(&self.path(), name)
    }

    /// Write an attribute of the line.
    ///
    /// Errors from the kernel are returned unaltered.
    pub fn write_attr<D: AsRef<[u8]>>(&self, name: &str, value: D) -> Result<()> {
        write_attr(&self.path(), name, value)
    }

    /// The direction of the line.
    pub fn direction(&self) -> Result<Direction> {
        self.read_attr("direction")?.parse()
    }

    /// Set the direction of the line.
    pub fn set_direction(&self, direction: Direction) -> Result<()> {
        self.write_attr("direction", direction.to_string())
    }

    /// The logical value of the line.
    pub fn value(&self) -> Result<Level> {
        self.read_attr("value")?.parse()
    }

    /// Set the logical value of an output line.
    pub fn set_value(&self, value: Level) -> Result<()> {
        self.write_attr("value", value.to_string())
    }

    /// The edges that generate events on the line.
    pub fn edge(&self) -> Result<Edge> {
        self.read_attr("edge")?.parse()
    }

    /// Set the edges that generate events on the line.
    pub fn set_edge(&self, edge: Edge) -> Result<()> {
        self.write_attr("edge", edge.to_string())
    }

    /// Returns true if the line polarity is inverted.
    pub fn active_low(&self) -> Result<bool> {
        let v = self.read_attr("active_low")?;
        match v.as_str() {
            "0" => Ok(false),
            "1" => Ok(true),
            _ => Err(Error::UnexpectedValue(v)),
        }
    }

    /// Set the polarity of the line.
    pub fn set_active_low(&self, active_low: bool) -> Result<()> {
        self.write_attr("active_low", if active_low { "1" } else { "0" })
    }
}

impl Drop for Line {
    fn drop(&mut self) {
        self.unexport();
    }
}

/// The direction of a line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    /// The line is an input.
    Input,

    /// The line is an output.
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => write!(f, "in"),
            Direction::Output => write!(f, "out"),
        }
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "in" => Ok(Direction::Input),
            "out" => Ok(Direction::Output),
            _ => Err(Error::UnexpectedValue(s.into())),
        }
    }
}

/// The edges of a line that generate events.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Edge {
    /// No edges.
    None,

    /// Transitions from inactive to active.
    Rising,

    /// Transitions from active to inactive.
    Falling,

    /// All transitions.
    Both,
}

impl Edge {
    /// All the edge settings.
    pub const ALL: [Edge; 4] = [Edge::None, Edge::Rising, Edge::Falling, Edge::Both];
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Edge::None => "none",
            Edge::Rising => "rising",
            Edge::Falling => "falling",
            Edge::Both => "both",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Edge {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(Edge::None),
            "rising" => Ok(Edge::Rising),
            "falling" => Ok(Edge::Falling),
            "both" => Ok(Edge::Both),
            _ => Err(Error::UnexpectedValue(s.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    // A sysfs class directory that accepts writes but does not react to them.
    fn fake_sysfs(offsets: &[Offset]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("export"), "").unwrap();
        fs::write(dir.path().join("unexport"), "").unwrap();
        for offset in offsets {
            let line = dir.path().join(format!("gpio{}", offset));
            fs::create_dir(&line).unwrap();
            fs::write(line.join("direction"), "in\n").unwrap();
            fs::write(line.join("value"), "0\n").unwrap();
            fs::write(line.join("edge"), "none\n").unwrap();
            fs::write(line.join("active_low"), "0\n").unwrap();
        }
        dir
    }

    #[test]
    fn export_writes_offset() {
        let sysfs = fake_sysfs(&[]);
        let line = Line::export(sysfs.path(), 514).unwrap();
        assert!(line.is_exported());
        assert_eq!(line.offset(), 514);
        assert_eq!(line.path(), sysfs.path().join("gpio514"));
        assert_eq!(read_attr(sysfs.path(), "export").unwrap(), "514");
    }

    #[test]
    fn export_missing_control() {
        let sysfs = tempfile::tempdir().unwrap();
        let res = Line::export(sysfs.path(), 3);
        assert_eq!(res.unwrap_err().os_error(), Some(libc::ENOENT));
    }

    #[test]
    fn unexport_idempotent() {
        let sysfs = fake_sysfs(&[]);
        let mut line = Line::export(sysfs.path(), 7).unwrap();
        line.unexport();
        assert!(!line.is_exported());
        assert_eq!(read_attr(sysfs.path(), "unexport").unwrap(), "7");

        fs::write(sysfs.path().join("unexport"), "").unwrap();
        line.unexport();
        drop(line);
        assert_eq!(read_attr(sysfs.path(), "unexport").unwrap(), "");
    }

    #[test]
    fn unexport_on_drop() {
        let sysfs = fake_sysfs(&[]);
        {
            let _line = Line::export(sysfs.path(), 12).unwrap();
        }
        assert_eq!(read_attr(sysfs.path(), "unexport").unwrap(), "12");
    }

    #[test]
    fn unexport_swallows_errors() {
        let sysfs = fake_sysfs(&[]);
        let mut line = Line::export(sysfs.path(), 4).unwrap();
        fs::remove_file(sysfs.path().join("unexport")).unwrap();
        line.unexport();
        assert!(!line.is_exported());
        line.unexport();
    }

    #[test]
    fn attrs() {
        let sysfs = fake_sysfs(&[5]);
        let line = Line::export(sysfs.path(), 5).unwrap();
        assert_eq!(line.direction().unwrap(), Direction::Input);
        assert_eq!(line.value().unwrap(), Level::Low);
        assert_eq!(line.edge().unwrap(), Edge::None);
        assert!(!line.active_low().unwrap());

        line.set_direction(Direction::Output).unwrap();
        line.set_value(Level::High).unwrap();
        line.set_edge(Edge::Both).unwrap();
        line.set_active_low(true).unwrap();
        assert_eq!(line.read_attr("direction").unwrap(), "out");
        assert_eq!(line.read_attr("value").unwrap(), "1");
        assert_eq!(line.read_attr("edge").unwrap(), "both");
        assert_eq!(line.read_attr("active_low").unwrap(), "1");
        assert_eq!(line.direction().unwrap(), Direction::Output);
        assert_eq!(line.edge().unwrap(), Edge::Both);
        assert!(line.active_low().unwrap());
    }

    #[test]
    fn attr_errors_pass_through() {
        let sysfs = fake_sysfs(&[]);
        let line = Line::export(sysfs.path(), 9).unwrap();
        let err = line.write_attr("direction", "in").unwrap_err();
        assert_eq!(err.os_error(), Some(libc::ENOENT));
        let err = line.read_attr("value").unwrap_err();
        assert_eq!(err.os_error(), Some(libc::ENOENT));
    }

    #[test]
    fn unexpected_attr_values() {
        let sysfs = fake_sysfs(&[6]);
        let line = Line::export(sysfs.path(), 6).unwrap();
        line.write_attr("direction", "sideways").unwrap();
        line.write_attr("edge", "diagonal").unwrap();
        line.write_attr("active_low", "2").unwrap();
        assert!(matches!(line.direction(), Err(Error::UnexpectedValue(v)) if v == "sideways"));
        assert!(matches!(line.edge(), Err(Error::UnexpectedValue(v)) if v == "diagonal"));
        assert!(matches!(line.active_low(), Err(Error::UnexpectedValue(v)) if v == "2"));
    }

    #[test]
    fn direction_text() {
        assert_eq!(Direction::Input.to_string(), "in");
        assert_eq!(Direction::Output.to_string(), "out");
        assert_eq!("in".parse::<Direction>().unwrap(), Direction::Input);
        assert_eq!("out".parse::<Direction>().unwrap(), Direction::Output);
        assert!("high".parse::<Direction>().is_err());
    }

    #[test]
    fn edge_text() {
        for edge in Edge::ALL {
            assert_eq!(edge.to_string().parse::<Edge>().unwrap(), edge);
        }
        assert_eq!(Edge::Rising.to_string(), "rising");
        assert!("up".parse::<Edge>().is_err());
    }
}
