// Copyright (c) The test-splitter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Checks whether recorded timings cover every discovered test.
//!
//! Timings are only trusted if every test source has a matching report. A single missing report
//! means the timing data is stale (for example, a test was added since the reports were
//! produced), and the caller falls back to splitting by file count.

use crate::discovery::{ReportFile, TestFile, TestIdentifier};
use itertools::Itertools;
use std::collections::{HashMap, hash_map::Entry};
use tracing::{info, warn};

/// The result of comparing discovered test sources against discovered reports.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SyncReport {
    test_count: usize,
    report_count: usize,
    missing: Vec<TestIdentifier>,
}

impl SyncReport {
    /// Compares `test_files` against `report_files`.
    ///
    /// Each report can vouch for at most one test source with the same identifier. Reports with
    /// no matching test source are tolerated.
    pub fn new(test_files: &[TestFile], report_files: &[ReportFile]) -> Self {
        let mut remaining: HashMap<&str, usize> = HashMap::new();
        for report in report_files {
            *remaining.entry(report.key.as_str()).or_default() += 1;
        }

        let mut missing = Vec::new();
        for test in test_files {
            match remaining.entry(test.identifier.as_str()) {
                Entry::Occupied(mut entry) => {
                    *entry.get_mut() -= 1;
                    if *entry.get() == 0 {
                        entry.remove();
                    }
                }
                Entry::Vacant(_) => missing.push(test.identifier.clone()),
            }
        }

        Self {
            test_count: test_files.len(),
            report_count: report_files.len(),
            missing,
        }
    }

    /// Returns the number of test sources compared.
    pub fn test_count(&self) -> usize {
        self.test_count
    }

    /// Returns the number of reports compared.
    pub fn report_count(&self) -> usize {
        self.report_count
    }

    /// Returns the test sources without a matching report, in discovery order.
    pub fn missing(&self) -> &[TestIdentifier] {
        &self.missing
    }

    /// Returns true if every test source has a matching report.
    pub fn is_in_sync(&self) -> bool {
        self.missing.is_empty()
    }

    /// Logs the outcome of the comparison.
    pub fn log(&self) {
        if self.is_in_sync() {
            info!(
                "Test[{}] and TestResult[{}] are in sync, using timings for tests",
                self.test_count, self.report_count,
            );
        } else {
            warn!(
                "Test[{}] and TestResult[{}] are not in sync, unsync tests: {}",
                self.test_count,
                self.report_count,
                self.missing.iter().join(", "),
            );
        }
    }
}

/// Returns true if every test source in `test_files` has a matching report in `report_files`,
/// logging the outcome.
pub fn is_in_sync(test_files: &[TestFile], report_files: &[ReportFile]) -> bool {
    let report = SyncReport::new(test_files, report_files);
    report.log();
    report.is_in_sync()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::ReportKey;
    use camino::Utf8PathBuf;
    use pretty_assertions::assert_eq;

    fn tests(names: &[&str]) -> Vec<TestFile> {
        names
            .iter()
            .map(|name| TestFile {
                path: Utf8PathBuf::from(format!("src/{name}.kt")),
                identifier: TestIdentifier::new(*name),
            })
            .collect()
    }

    fn reports(names: &[&str]) -> Vec<ReportFile> {
        names
            .iter()
            .map(|name| {
                let path = Utf8PathBuf::from(format!("results/{name}.xml"));
                ReportFile {
                    key: ReportKey::from_path(&path),
                    path,
                }
            })
            .collect()
    }

    #[test]
    fn every_test_has_a_report() {
        let report = SyncReport::new(
            &tests(&["Hello1Test", "Hello2Test"]),
            &reports(&["TEST-com.sample.Hello2Test", "TEST-com.sample.Hello1Test"]),
        );
        assert!(report.is_in_sync());
        assert_eq!((report.test_count(), report.report_count()), (2, 2));
    }

    #[test]
    fn extra_reports_are_tolerated() {
        let report = SyncReport::new(
            &tests(&["Hello1Test"]),
            &reports(&[
                "TEST-com.sample.Hello1Test",
                "TEST-com.sample.RemovedTest",
                "TEST-com.other.Hello1Test",
            ]),
        );
        assert!(report.is_in_sync());
    }

    #[test]
    fn missing_report_is_out_of_sync() {
        let report = SyncReport::new(
            &tests(&["Hello1Test", "Hello2Test", "Hello3Test"]),
            &reports(&["TEST-com.sample.Hello1Test", "TEST-com.sample.Hello2Test"]),
        );
        assert!(!report.is_in_sync());
        assert_eq!(report.missing(), [TestIdentifier::new("Hello3Test")]);
    }

    #[test]
    fn each_report_counts_once() {
        // Two sources with the same class name in different packages need two reports.
        let test_files = tests(&["HelloTest", "HelloTest"]);
        let one = SyncReport::new(&test_files, &reports(&["TEST-a.HelloTest"]));
        assert_eq!(one.missing(), [TestIdentifier::new("HelloTest")]);

        let two = SyncReport::new(
            &test_files,
            &reports(&["TEST-a.HelloTest", "TEST-b.HelloTest"]),
        );
        assert!(two.is_in_sync());
    }

    #[test]
    fn empty_inputs() {
        assert!(is_in_sync(&[], &[]));
        assert!(is_in_sync(&[], &reports(&["TEST-a.HelloTest"])));
        assert!(!is_in_sync(&tests(&["HelloTest"]), &[]));
    }
}
