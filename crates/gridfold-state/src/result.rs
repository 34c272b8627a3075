// SPDX-License-Identifier: Apache-2.0

use crate::state::TestResult;

/// Iterator expanding run-length-encoded `Row.results` into raw codes.
///
/// Yields `NoResult` past the encoded stream so callers can zip against
/// the column list without length bookkeeping.
#[derive(Debug, Clone)]
pub struct ResultIter<'a> {
    pairs: &'a [i32],
    remaining: i32,
    code: i32,
}

pub fn result_iter(results: &[i32]) -> ResultIter<'_> {
    ResultIter {
        pairs: results,
        remaining: 0,
        code: TestResult::NoResult as i32,
    }
}

impl Iterator for ResultIter<'_> {
    type Item = i32;

    fn next(&mut self) -> Option<i32> {
        while self.remaining == 0 {
            let [code, count, rest @ ..] = self.pairs else {
                return Some(TestResult::NoResult as i32);
            };
            self.code = *code;
            self.remaining = *count;
            self.pairs = rest;
        }
        self.remaining -= 1;
        Some(self.code)
    }
}

/// Collapses a raw result code onto the alert decision codes.
///
/// `ignore_running` maps `Running` to `NoResult`; pass and fail families
/// collapse onto `Pass` / `Fail`, flakes stay `Flaky`, everything else
/// is `NoResult`.
#[must_use]
pub fn coalesce(raw: i32, ignore_running: bool) -> TestResult {
    match TestResult::try_from(raw) {
        Ok(TestResult::Pass | TestResult::PassWithErrors | TestResult::PassWithSkips) => {
            TestResult::Pass
        }
        Ok(
            TestResult::Fail
            | TestResult::BuildFail
            | TestResult::CategorizedFail
            | TestResult::TimedOut,
        ) => TestResult::Fail,
        Ok(TestResult::Flaky) => TestResult::Flaky,
        Ok(TestResult::Running) if !ignore_running => TestResult::Running,
        _ => TestResult::NoResult,
    }
}
