// Copyright (c) The test-splitter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use junit_report::{Report, TestcaseStatus};
use pretty_assertions::assert_eq;
use std::{fs::File, io::BufReader, path::PathBuf, time::Duration};

fn fixture_path(name: &str) -> PathBuf {
    [
        env!("CARGO_MANIFEST_DIR"),
        "..",
        "fixtures",
        "test-result",
        "test-app-result",
        name,
    ]
    .iter()
    .collect()
}

#[test]
fn fixtures() {
    let f = File::open(fixture_path("TEST-com.sample.Hello3Test.xml"))
        .expect("opening fixture succeeds");
    let report = Report::deserialize(BufReader::new(f)).expect("fixture is valid JUnit XML");

    assert_eq!(report.testsuites.len(), 1);
    let testsuite = &report.testsuites[0];
    assert_eq!(testsuite.name, "com.sample.Hello3Test");
    assert_eq!(testsuite.tests, 12);
    assert_eq!(testsuite.time, Some(Duration::from_secs(4)));

    let total: Duration = report.testcases().filter_map(|testcase| testcase.time).sum();
    assert_eq!(total, Duration::from_secs(4));

    let last_two: Vec<_> = testsuite.testcases[10..]
        .iter()
        .map(|testcase| testcase.name.as_str())
        .collect();
    assert_eq!(last_two, ["'verify 11'", "\"verify 12\""]);
    assert!(
        report
            .testcases()
            .all(|testcase| testcase.status == TestcaseStatus::Success
                && testcase.classname.as_deref() == Some("com.sample.Hello3Test"))
    );
}
