// Copyright (c) The test-splitter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::{borrow::Cow, fmt};
use swrite::{SWrite, swrite};

/// Utilities for pluralizing various words based on count or plurality.
pub(crate) mod plural {
    /// Returns "test" if `count` is 1, otherwise "tests".
    pub(crate) fn tests_str(count: usize) -> &'static str {
        if count == 1 { "test" } else { "tests" }
    }

    /// Returns "test was" if `count` is 1, otherwise "tests were".
    pub(crate) fn tests_were_str(count: usize) -> &'static str {
        if count == 1 {
            "test was"
        } else {
            "tests were"
        }
    }

    /// Returns "file" if `count` is 1, otherwise "files".
    pub(crate) fn files_str(count: usize) -> &'static str {
        if count == 1 { "file" } else { "files" }
    }
}

/// Escapes a test name for use inside a double-quoted `--tests` argument.
///
/// The five XML special characters are replaced with their named entities (`'` becomes `&apos;`,
/// `"` becomes `&quot;`), and every non-ASCII character is replaced with a hexadecimal character
/// reference.
pub(crate) fn encode_xml(input: &str) -> Cow<'_, str> {
    let escaped = quick_xml::escape::escape(input);
    if escaped.is_ascii() {
        return escaped;
    }

    let mut out = String::with_capacity(escaped.len() + 8);
    for c in escaped.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            swrite!(out, "&#x{:x};", u32::from(c));
        }
    }
    Cow::Owned(out)
}

/// Displays a number of seconds with millisecond precision.
#[derive(Copy, Clone, Debug)]
pub(crate) struct DisplaySecs(pub(crate) f64);

impl fmt::Display for DisplaySecs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("com.sample.Hello1Test.verify 1", "com.sample.Hello1Test.verify 1" ; "plain")]
    #[test_case("Test.'verify 11'", "Test.&apos;verify 11&apos;" ; "single quotes")]
    #[test_case("Test.\"verify 12\"", "Test.&quot;verify 12&quot;" ; "double quotes")]
    #[test_case("a < b && c > d", "a &lt; b &amp;&amp; c &gt; d" ; "markup characters")]
    #[test_case("caf\u{e9}", "caf&#xe9;" ; "latin-1")]
    #[test_case("ok \u{1f600}", "ok &#x1f600;" ; "astral plane")]
    fn encode_xml_cases(input: &str, expected: &str) {
        assert_eq!(encode_xml(input), expected);
    }

    #[test]
    fn encode_xml_borrows_when_unchanged() {
        assert!(matches!(encode_xml("verify 1"), Cow::Borrowed(_)));
    }

    #[test]
    fn display_secs() {
        assert_eq!(DisplaySecs(2.0).to_string(), "2.000s");
        assert_eq!(DisplaySecs(0.25).to_string(), "0.250s");
    }
}
