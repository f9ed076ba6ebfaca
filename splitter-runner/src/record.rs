// Copyright (c) The test-splitter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-test timings read out of JUnit reports.

use crate::{discovery::ReportFile, errors::ReportReadError};
use junit_report::{Report, Testcase, Testsuite};
use std::{io::BufReader, time::Duration};
use tracing::debug;

/// The recorded duration of a single test case.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestRecord {
    /// The fully qualified class the test belongs to.
    pub class_name: String,

    /// The name of the test within its class.
    pub name: String,

    /// How long the test took to run.
    pub duration: Duration,
}

impl TestRecord {
    /// Creates a new record.
    pub fn new(class_name: impl Into<String>, name: impl Into<String>, duration: Duration) -> Self {
        Self {
            class_name: class_name.into(),
            name: name.into(),
            duration,
        }
    }

    /// Returns `"{class_name}.{name}"`, the form accepted by `--tests`.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.class_name, self.name)
    }

    /// Returns the duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.duration.as_secs_f64()
    }

    fn from_testcase(testsuite: &Testsuite, testcase: &Testcase) -> Self {
        // Some producers only set the class on the enclosing testsuite.
        let class_name = testcase
            .classname
            .clone()
            .unwrap_or_else(|| testsuite.name.clone());
        Self::new(
            class_name,
            testcase.name.clone(),
            testcase.time.unwrap_or(Duration::ZERO),
        )
    }
}

/// Reads every test case out of `reports`, in report order and then document order.
pub fn read_records(reports: &[ReportFile]) -> Result<Vec<TestRecord>, ReportReadError> {
    let mut records = Vec::new();
    for report in reports {
        let file = fs_err::File::open(&report.path).map_err(|err| ReportReadError::Open {
            path: report.path.clone(),
            err,
        })?;
        let parsed =
            Report::deserialize(BufReader::new(file)).map_err(|err| ReportReadError::Parse {
                path: report.path.clone(),
                err,
            })?;

        let before = records.len();
        records.extend(parsed.testsuites.iter().flat_map(|testsuite| {
            testsuite
                .testcases
                .iter()
                .map(move |testcase| TestRecord::from_testcase(testsuite, testcase))
        }));
        debug!(
            "read {} test cases from {}",
            records.len() - before,
            report.path
        );
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::ReportKey;
    use camino::Utf8Path;
    use camino_tempfile::Utf8TempDir;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn report_file(dir: &Utf8TempDir, name: &str, contents: &str) -> ReportFile {
        let path = dir.path().join(name);
        fs_err::write(&path, contents).expect("wrote report");
        ReportFile {
            key: ReportKey::from_path(&path),
            path,
        }
    }

    #[test]
    fn qualified_name() {
        let record = TestRecord::new("com.sample.Hello1Test", "verify 1", Duration::from_secs(1));
        assert_eq!(record.qualified_name(), "com.sample.Hello1Test.verify 1");
        assert_eq!(record.duration_secs(), 1.0);
    }

    #[test]
    fn reads_records_in_order() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        let first = report_file(
            &dir,
            "TEST-com.sample.ATest.xml",
            indoc! {r#"
                <testsuite name="com.sample.ATest" tests="2">
                  <testcase name="one" classname="com.sample.ATest" time="0.5"/>
                  <testcase name="two" classname="com.sample.ATest"/>
                </testsuite>
            "#},
        );
        let second = report_file(
            &dir,
            "TEST-com.sample.BTest.xml",
            indoc! {r#"
                <testsuites>
                  <testsuite name="com.sample.BTest">
                    <testcase name="three" time="1.25"/>
                  </testsuite>
                </testsuites>
            "#},
        );

        let records = read_records(&[first, second]).expect("reports are valid");
        assert_eq!(
            records,
            [
                TestRecord::new("com.sample.ATest", "one", Duration::from_millis(500)),
                TestRecord::new("com.sample.ATest", "two", Duration::ZERO),
                TestRecord::new("com.sample.BTest", "three", Duration::from_millis(1250)),
            ]
        );
    }

    #[test]
    fn invalid_time_names_the_file() {
        let dir = Utf8TempDir::new().expect("created temp dir");
        let report = report_file(
            &dir,
            "TEST-com.sample.BadTest.xml",
            r#"<testsuite name="s"><testcase name="t" time="-1"/></testsuite>"#,
        );
        let path = report.path.clone();

        let err = read_records(&[report]).expect_err("negative time is rejected");
        assert!(
            matches!(&err, ReportReadError::Parse { path: p, .. } if *p == path),
            "unexpected error: {err:?}"
        );
        assert!(err.to_string().contains("TEST-com.sample.BadTest.xml"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let report = ReportFile {
            path: Utf8Path::new("/nonexistent/TEST-com.sample.GoneTest.xml").to_owned(),
            key: ReportKey::from_path(Utf8Path::new("TEST-com.sample.GoneTest.xml")),
        };
        let err = read_records(&[report]).expect_err("missing file is rejected");
        assert!(
            matches!(err, ReportReadError::Open { .. }),
            "unexpected error: {err:?}"
        );
    }
}
