// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::common::{Context, Skip};
use anyhow::{anyhow, Result};
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};
use tracing::info;

/// A named check.
#[derive(Clone, Copy)]
pub struct Case {
    pub name: &'static str,
    pub check: fn(&Context) -> Result<()>,
}

/// The result of running a check.
#[derive(Debug)]
pub enum Outcome {
    Pass,
    Fail(anyhow::Error),
    Skip(String),
}

#[derive(Debug, Default, Eq, PartialEq)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub elapsed: Duration,
}

impl Summary {
    pub fn success(&self) -> bool {
        self.failed == 0
    }

    fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }
}

/// The cases with names containing any of the filters, or all if there are
/// no filters.
pub fn select<'a>(cases: &'a [Case], filters: &[String]) -> Vec<&'a Case> {
    cases
        .iter()
        .filter(|c| filters.is_empty() || filters.iter().any(|f| c.name.contains(f.as_str())))
        .collect()
}

pub fn run_case(ctx: &Context, case: &Case) -> Outcome {
    match panic::catch_unwind(AssertUnwindSafe(|| (case.check)(ctx))) {
        Ok(Ok(())) => Outcome::Pass,
        Ok(Err(e)) => match e.downcast_ref::<Skip>() {
            Some(s) => Outcome::Skip(s.0.clone()),
            None => Outcome::Fail(e),
        },
        Err(_) => Outcome::Fail(anyhow!("check panicked")),
    }
}

/// Run the cases in order, reporting the outcome of each.
///
/// With verbosity 0 only failures and the summary are reported, 1 adds a
/// line per case, and 2 or more adds the cause chain of failures.
pub fn run(ctx: &Context, cases: &[&Case], verbosity: u8) -> Summary {
    let start = Instant::now();
    let mut summary = Summary::default();
    for case in cases {
        info!(case = case.name, "running");
        let outcome = run_case(ctx, case);
        match &outcome {
            Outcome::Pass => summary.passed += 1,
            Outcome::Fail(_) => summary.failed += 1,
            Outcome::Skip(_) => summary.skipped += 1,
        }
        if let Some(line) = format_outcome(case.name, &outcome, verbosity) {
            println!("{line}");
        }
    }
    summary.elapsed = start.elapsed();
    println!("{}", format_summary(&summary));
    summary
}

fn format_outcome(name: &str, outcome: &Outcome, verbosity: u8) -> Option<String> {
    match outcome {
        Outcome::Fail(e) if verbosity > 1 => Some(format!("{name} ... FAIL: {e:#}")),
        Outcome::Fail(e) => Some(format!("{name} ... FAIL: {e}")),
        _ if verbosity == 0 => None,
        Outcome::Pass => Some(format!("{name} ... ok")),
        Outcome::Skip(reason) => Some(format!("{name} ... skipped: {reason}")),
    }
}

fn format_summary(s: &Summary) -> String {
    let mut out = format!(
        "ran {} checks in {:.3}s: ",
        s.total(),
        s.elapsed.as_secs_f64()
    );
    if s.success() {
        out += "OK";
    } else {
        out += "FAILED";
    }
    out += &format!(
        " ({} passed, {} failed, {} skipped)",
        s.passed, s.failed, s.skipped
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{bail, Context as _};
    use gpiosysfs::{Paths, Timing};

    fn ctx() -> Context {
        Context {
            paths: Paths::default(),
            user: None,
            timing: Timing::default(),
        }
    }

    fn pass(_: &Context) -> Result<()> {
        Ok(())
    }

    fn fail(_: &Context) -> Result<()> {
        Err(anyhow!("inner")).context("outer")
    }

    fn skip(_: &Context) -> Result<()> {
        bail!(Skip("no user".into()))
    }

    fn skip_with_context(_: &Context) -> Result<()> {
        Err(Skip("no user".into())).context("ownership")
    }

    fn panics(_: &Context) -> Result<()> {
        panic!("boom")
    }

    const CASES: &[Case] = &[
        Case {
            name: "chip_pass",
            check: pass,
        },
        Case {
            name: "line_fail",
            check: fail,
        },
        Case {
            name: "owner_skip",
            check: skip,
        },
    ];

    #[test]
    fn outcomes() {
        let ctx = ctx();
        assert!(matches!(run_case(&ctx, &CASES[0]), Outcome::Pass));
        match run_case(&ctx, &CASES[1]) {
            Outcome::Fail(e) => assert_eq!(format!("{e:#}"), "outer: inner"),
            o => panic!("unexpected outcome {o:?}"),
        }
        assert!(matches!(run_case(&ctx, &CASES[2]), Outcome::Skip(r) if r == "no user"));
        let case = Case {
            name: "context_skip",
            check: skip_with_context,
        };
        assert!(matches!(run_case(&ctx, &case), Outcome::Skip(_)));
    }

    #[test]
    fn panic_is_failure() {
        let case = Case {
            name: "panics",
            check: panics,
        };
        assert!(matches!(run_case(&ctx(), &case), Outcome::Fail(_)));
    }

    #[test]
    fn select_filters() {
        assert_eq!(select(CASES, &[]).len(), 3);
        let names: Vec<_> = select(CASES, &["line".into(), "owner".into()])
            .iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, ["line_fail", "owner_skip"]);
        assert!(select(CASES, &["edge".into()]).is_empty());
    }

    #[test]
    fn run_counts() {
        let cases: Vec<&Case> = CASES.iter().collect();
        let s = run(&ctx(), &cases, 0);
        assert_eq!((s.passed, s.failed, s.skipped), (1, 1, 1));
        assert!(!s.success());
    }

    #[test]
    fn outcome_formatting() {
        assert_eq!(format_outcome("a", &Outcome::Pass, 0), None);
        assert_eq!(
            format_outcome("a", &Outcome::Pass, 1).as_deref(),
            Some("a ... ok")
        );
        assert_eq!(
            format_outcome("a", &Outcome::Skip("why".into()), 1).as_deref(),
            Some("a ... skipped: why")
        );
        let e = || Err::<(), _>(anyhow!("inner")).context("outer").unwrap_err();
        assert_eq!(
            format_outcome("a", &Outcome::Fail(e()), 0).as_deref(),
            Some("a ... FAIL: outer")
        );
        assert_eq!(
            format_outcome("a", &Outcome::Fail(e()), 2).as_deref(),
            Some("a ... FAIL: outer: inner")
        );
    }

    #[test]
    fn summary_formatting() {
        let s = Summary {
            passed: 3,
            failed: 0,
            skipped: 1,
            elapsed: Duration::from_millis(1500),
        };
        assert_eq!(
            format_summary(&s),
            "ran 4 checks in 1.500s: OK (3 passed, 0 failed, 1 skipped)"
        );
    }
}
