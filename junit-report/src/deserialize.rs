// Copyright (c) The test-splitter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deserialize a `Report`.

use crate::{DeserializeError, Report, Testcase, TestcaseStatus, Testsuite, TimeParseError};
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};
use std::{io, time::Duration};

static TESTSUITES_TAG: &str = "testsuites";
static TESTSUITE_TAG: &str = "testsuite";
static TESTCASE_TAG: &str = "testcase";

pub(crate) fn deserialize_report(reader: impl io::BufRead) -> Result<Report, DeserializeError> {
    let mut reader = Reader::from_reader(reader);
    reader.config_mut().trim_text(true);

    let mut report = Report::default();
    let mut open_testsuites: Vec<Testsuite> = Vec::new();
    let mut open_testcase: Option<Testcase> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(start) => match start.local_name().as_ref() {
                b"testsuites" => report.name = read_testsuites(&start)?,
                b"testsuite" => open_testsuites.push(read_testsuite(&start)?),
                b"testcase" => open_testcase = Some(read_testcase(&start)?),
                other => apply_status(open_testcase.as_mut(), other),
            },
            Event::Empty(start) => match start.local_name().as_ref() {
                b"testsuites" => report.name = read_testsuites(&start)?,
                b"testsuite" => report.testsuites.push(read_testsuite(&start)?),
                b"testcase" => {
                    let testcase = read_testcase(&start)?;
                    push_testcase(&mut report, &mut open_testsuites, testcase);
                }
                other => apply_status(open_testcase.as_mut(), other),
            },
            Event::End(end) => match end.local_name().as_ref() {
                b"testsuite" => {
                    if let Some(testsuite) = open_testsuites.pop() {
                        report.testsuites.push(testsuite);
                    }
                }
                b"testcase" => {
                    if let Some(testcase) = open_testcase.take() {
                        push_testcase(&mut report, &mut open_testsuites, testcase);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if open_testcase.is_some() {
        return Err(DeserializeError::UnexpectedEof {
            element: TESTCASE_TAG,
        });
    }
    if !open_testsuites.is_empty() {
        return Err(DeserializeError::UnexpectedEof {
            element: TESTSUITE_TAG,
        });
    }

    Ok(report)
}

fn push_testcase(report: &mut Report, open_testsuites: &mut [Testsuite], testcase: Testcase) {
    match open_testsuites.last_mut() {
        Some(testsuite) => {
            testsuite.add_testcase(testcase);
        }
        None => {
            // A bare <testcase> outside of any testsuite.
            let mut testsuite = Testsuite::new("");
            testsuite.add_testcase(testcase);
            report.testsuites.push(testsuite);
        }
    }
}

fn apply_status(testcase: Option<&mut Testcase>, tag: &[u8]) {
    let Some(testcase) = testcase else {
        return;
    };
    // flakyFailure, rerunFailure and friends describe earlier attempts and don't change the
    // final status.
    let status = match tag {
        b"failure" => TestcaseStatus::Failure,
        b"error" => TestcaseStatus::Error,
        b"skipped" => TestcaseStatus::Skipped,
        _ => return,
    };
    testcase.set_status(status);
}

fn read_testsuites(start: &BytesStart<'_>) -> Result<Option<String>, DeserializeError> {
    let mut name = None;
    for attr in start.attributes() {
        let attr = attr.map_err(|err| DeserializeError::Attribute {
            element: TESTSUITES_TAG,
            err,
        })?;
        if attr.key.local_name().as_ref() == b"name" {
            name = Some(attr.unescape_value()?.into_owned());
        }
    }
    Ok(name)
}

fn read_testsuite(start: &BytesStart<'_>) -> Result<Testsuite, DeserializeError> {
    let mut name = String::new();
    let mut time = None;
    for attr in start.attributes() {
        let attr = attr.map_err(|err| DeserializeError::Attribute {
            element: TESTSUITE_TAG,
            err,
        })?;
        match attr.key.local_name().as_ref() {
            b"name" => name = attr.unescape_value()?.into_owned(),
            b"time" => time = Some(parse_time(TESTSUITE_TAG, &attr.unescape_value()?)?),
            _ => {}
        }
    }

    let mut testsuite = Testsuite::new(name);
    testsuite.time = time;
    Ok(testsuite)
}

fn read_testcase(start: &BytesStart<'_>) -> Result<Testcase, DeserializeError> {
    let mut name = None;
    let mut classname = None;
    let mut time = None;
    for attr in start.attributes() {
        let attr = attr.map_err(|err| DeserializeError::Attribute {
            element: TESTCASE_TAG,
            err,
        })?;
        match attr.key.local_name().as_ref() {
            b"name" => name = Some(attr.unescape_value()?.into_owned()),
            b"classname" => classname = Some(attr.unescape_value()?.into_owned()),
            b"time" => time = Some(parse_time(TESTCASE_TAG, &attr.unescape_value()?)?),
            _ => {}
        }
    }

    let name = name.ok_or(DeserializeError::MissingAttribute {
        element: TESTCASE_TAG,
        attribute: "name",
    })?;
    let mut testcase = Testcase::new(name);
    if let Some(classname) = classname {
        testcase.set_classname(classname);
    }
    if let Some(time) = time {
        testcase.set_time(time);
    }
    Ok(testcase)
}

fn parse_time(element: &'static str, input: &str) -> Result<Duration, DeserializeError> {
    let invalid_time = |err: TimeParseError| DeserializeError::InvalidTime {
        element,
        input: input.to_owned(),
        err,
    };
    let secs: f64 = input
        .trim()
        .parse()
        .map_err(|err: std::num::ParseFloatError| invalid_time(err.into()))?;
    Duration::try_from_secs_f64(secs).map_err(|err| invalid_time(err.into()))
}
