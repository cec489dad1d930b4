// SPDX-FileCopyrightText: 2022 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::Result;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Write to a configfs or sysfs attribute file.
///
/// The attribute must already exist, and the data is written in a single
/// call, as the kernel treats each write as a complete value.
pub fn write_attr<D: AsRef<[u8]>>(dir: &Path, name: &str, data: D) -> Result<()> {
    let mut f = OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(dir.join(name))?;
    f.write_all(data.as_ref())?;
    Ok(())
}

/// Read a configfs or sysfs attribute file.
///
/// Leading and trailing whitespace, including the trailing newline the
/// kernel appends, is removed.
pub fn read_attr(dir: &Path, name: &str) -> Result<String> {
    Ok(fs::read_to_string(dir.join(name))?.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;

    #[test]
    fn read_trims() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("label"), "  pinata \n").unwrap();
        assert_eq!(read_attr(dir.path(), "label").unwrap(), "pinata");
    }

    #[test]
    fn write_replaces() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("direction"), "out\n").unwrap();
        write_attr(dir.path(), "direction", "in").unwrap();
        assert_eq!(read_attr(dir.path(), "direction").unwrap(), "in");
    }

    #[test]
    fn missing_attr() {
        let dir = tempfile::tempdir().unwrap();
        let res = write_attr(dir.path(), "banana", "1");
        match &res {
            Err(crate::Error::Io(e)) => {
                assert_eq!(e.kind(), ErrorKind::NotFound);
                assert_eq!(e.raw_os_error(), Some(libc::ENOENT));
            }
            _ => panic!("unexpected result {:?}", res),
        }
        assert!(!dir.path().join("banana").exists());

        let res = read_attr(dir.path(), "banana");
        assert_eq!(res.unwrap_err().os_error(), Some(libc::ENOENT));
    }
}
