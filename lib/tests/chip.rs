// SPDX-FileCopyrightText: 2022 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

// Live tests require the gpio-sim kernel module and the GPIO sysfs interface,
// so are ignored by default.

mod common;

mod chip {
    use super::common;
    use gpiosysfs::attr::read_attr;
    use gpiosysfs::{Chip, Level};
    use std::fs;

    #[test]
    #[ignore = "requires root, gpio-sim and GPIO sysfs"]
    fn live_attrs() {
        let live = common::live();
        let c = Chip::create(&live.paths, 8, Some("veintidós")).unwrap();

        assert!(c.is_live());
        assert_eq!(c.num_lines(), 8);
        assert_eq!(c.label(), Some("veintidós"));
        assert!(!c.dev_name().is_empty());
        assert!(c.dev_path().exists());
        assert_eq!(c.class_name(), format!("gpiochip{}", c.base()));

        let dir = c.path();
        assert!(dir.is_dir());
        assert_eq!(read_attr(&dir, "base").unwrap(), c.base().to_string());
        assert_eq!(read_attr(&dir, "ngpio").unwrap(), "8");
        assert_eq!(read_attr(&dir, "label").unwrap(), "veintidós");
    }

    #[test]
    #[ignore = "requires root, gpio-sim and GPIO sysfs"]
    fn release_removes_entry() {
        let live = common::live();
        for num_lines in [1, 8, 32] {
            let mut c = Chip::create(&live.paths, num_lines, None).unwrap();
            let dir = c.path();
            assert!(dir.exists());
            c.release();
            assert!(!c.is_live());
            assert!(!dir.exists(), "{:?} remains after release", dir);
        }
    }

    #[test]
    #[ignore = "requires root, gpio-sim and GPIO sysfs"]
    fn release_idempotent() {
        let live = common::live();
        let mut c = Chip::create(&live.paths, 4, None).unwrap();
        let sim_dir = live.paths.configfs.join(c.name());
        assert!(sim_dir.exists());
        c.release();
        assert!(!sim_dir.exists());
        c.release();
        assert!(!sim_dir.exists());
        drop(c);
    }

    #[test]
    #[ignore = "requires root, gpio-sim and GPIO sysfs"]
    fn release_on_drop() {
        let live = common::live();
        let (sim_dir, dir) = {
            let c = Chip::create(&live.paths, 4, None).unwrap();
            (live.paths.configfs.join(c.name()), c.path())
        };
        assert!(!sim_dir.exists());
        assert!(!dir.exists());
    }

    #[test]
    #[ignore = "requires root, gpio-sim and GPIO sysfs"]
    fn distinct_chips() {
        let live = common::live();
        let c1 = Chip::create(&live.paths, 8, None).unwrap();
        let c2 = Chip::create(&live.paths, 8, None).unwrap();
        assert_ne!(c1.name(), c2.name());
        assert_ne!(c1.chip_name(), c2.chip_name());
        assert_ne!(c1.base(), c2.base());
    }

    #[test]
    #[ignore = "requires root, gpio-sim and GPIO sysfs"]
    fn pull() {
        let live = common::live();
        let c = Chip::create(&live.paths, 8, None).unwrap();
        let offset = c.base() + 5;

        assert_eq!(c.get_pull(offset).unwrap(), Level::Low);
        assert_eq!(c.get_value(offset).unwrap(), Level::Low);
        c.pullup(offset).unwrap();
        assert_eq!(c.get_pull(offset).unwrap(), Level::High);
        assert_eq!(c.get_value(offset).unwrap(), Level::High);
        assert_eq!(c.toggle(offset).unwrap(), Level::Low);
        assert_eq!(c.get_pull(offset).unwrap(), Level::Low);
        assert_eq!(c.get_value(offset).unwrap(), Level::Low);
    }

    #[test]
    #[ignore = "requires root, gpio-sim and GPIO sysfs"]
    fn offset_out_of_range() {
        let live = common::live();
        let c = Chip::create(&live.paths, 8, None).unwrap();
        assert!(c.set_pull(c.base() + 8, Level::High).is_err());
        assert!(c.get_value(c.base() + 8).is_err());
        if c.base() > 0 {
            assert!(c.get_value(c.base() - 1).is_err());
        }
    }

    #[test]
    #[ignore = "requires root, gpio-sim and GPIO sysfs"]
    fn zero_lines() {
        let live = common::live();
        let before = fs::read_dir(&live.paths.configfs).unwrap().count();
        assert!(Chip::create(&live.paths, 0, None).is_err());
        assert_eq!(fs::read_dir(&live.paths.configfs).unwrap().count(), before);
    }
}
