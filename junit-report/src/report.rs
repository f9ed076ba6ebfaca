// Copyright (c) The test-splitter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{DeserializeError, deserialize::deserialize_report};
use std::{io, time::Duration};

/// The root element of a JUnit report.
///
/// Reports with a single `<testsuite>` root element are read as a report with one testsuite.
#[derive(Clone, Debug, Default)]
pub struct Report {
    /// The name of this report, if the root element was `<testsuites>` and had a name.
    pub name: Option<String>,

    /// The test suites contained in this report, in document order.
    ///
    /// Nested testsuites are flattened into this list in the order they are closed.
    pub testsuites: Vec<Testsuite>,
}

impl Report {
    /// Reads a report from the given buffered reader.
    pub fn deserialize(reader: impl io::BufRead) -> Result<Self, DeserializeError> {
        deserialize_report(reader)
    }

    /// Reads a report from a string.
    pub fn from_xml_str(xml: &str) -> Result<Self, DeserializeError> {
        Self::deserialize(xml.as_bytes())
    }

    /// Returns an iterator over all testcases in this report, in document order.
    pub fn testcases(&self) -> impl Iterator<Item = &Testcase> + '_ {
        self.testsuites
            .iter()
            .flat_map(|testsuite| testsuite.testcases.iter())
    }
}

/// Represents a single testsuite.
///
/// A `Testsuite` groups together several `Testcase` instances.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct Testsuite {
    /// The name of this testsuite.
    pub name: String,

    /// The overall time taken by the testsuite, if recorded.
    pub time: Option<Duration>,

    /// The number of testcases read for this testsuite.
    pub tests: usize,

    /// The number of testcases that failed.
    pub failures: usize,

    /// The number of testcases that errored.
    pub errors: usize,

    /// The number of testcases that were skipped.
    pub disabled: usize,

    /// The testcases that form this testsuite.
    pub testcases: Vec<Testcase>,
}

impl Testsuite {
    /// Creates a new, empty `Testsuite`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            time: None,
            tests: 0,
            failures: 0,
            errors: 0,
            disabled: 0,
            testcases: vec![],
        }
    }

    /// Adds a testcase to this testsuite and updates the counts.
    pub fn add_testcase(&mut self, testcase: Testcase) -> &mut Self {
        self.tests += 1;
        match testcase.status {
            TestcaseStatus::Success => {}
            TestcaseStatus::Failure => self.failures += 1,
            TestcaseStatus::Error => self.errors += 1,
            TestcaseStatus::Skipped => self.disabled += 1,
        }
        self.testcases.push(testcase);
        self
    }
}

/// Represents a single testcase.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub struct Testcase {
    /// The name of the testcase.
    pub name: String,

    /// The "classname" of the testcase.
    ///
    /// Typically, this represents the fully qualified path to the test. In other words,
    /// `classname` + `name` together should uniquely identify and locate a test.
    pub classname: Option<String>,

    /// The time it took to execute this testcase.
    pub time: Option<Duration>,

    /// The status of this test.
    pub status: TestcaseStatus,
}

impl Testcase {
    /// Creates a new, successful testcase.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            classname: None,
            time: None,
            status: TestcaseStatus::Success,
        }
    }

    /// Sets the classname of the test.
    pub fn set_classname(&mut self, classname: impl Into<String>) -> &mut Self {
        self.classname = Some(classname.into());
        self
    }

    /// Sets the time taken for the testcase.
    pub fn set_time(&mut self, time: Duration) -> &mut Self {
        self.time = Some(time);
        self
    }

    /// Sets the status of the testcase.
    pub fn set_status(&mut self, status: TestcaseStatus) -> &mut Self {
        self.status = status;
        self
    }
}

/// The outcome of a testcase, as recorded by the nested status element.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TestcaseStatus {
    /// No status element: the testcase passed.
    Success,

    /// A `<failure>` element: the testcase failed in an expected way.
    Failure,

    /// An `<error>` element: the testcase failed in an unexpected way.
    Error,

    /// A `<skipped>` element: the testcase was not run.
    Skipped,
}
