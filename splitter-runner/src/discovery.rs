// Copyright (c) The test-splitter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discovery of test sources and JUnit reports on disk.
//!
//! Both kinds of discovery walk a root directory recursively and keep files whose *file name*
//! matches a glob. Hidden entries below the root are skipped. Results are sorted by path, ignoring
//! case, so that the same tree always produces the same shards.

use crate::{config::DiscoveryConfig, errors::DiscoveryError, helpers::plural};
use camino::{Utf8Path, Utf8PathBuf};
use globset::{Glob, GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use std::{fmt, io};
use tracing::debug;

/// The name of a test class, derived from the file stem of a test source.
///
/// This is the value passed to `--tests` by the round-robin splitter.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TestIdentifier(String);

impl TestIdentifier {
    /// Creates a new identifier.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self(identifier.into())
    }

    /// Returns the identifier as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TestIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The test class a JUnit report belongs to: the last dot-separated segment of the report's file
/// stem.
///
/// `TEST-com.sample.Hello1Test.xml` has the key `Hello1Test`.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ReportKey(String);

impl ReportKey {
    /// Derives the key for a report file from its path.
    pub fn from_path(path: &Utf8Path) -> Self {
        let stem = path.file_stem().unwrap_or_default();
        let key = stem.rsplit('.').next().unwrap_or(stem);
        Self(key.to_owned())
    }

    /// Returns the key as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A discovered test source.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestFile {
    /// The path to the source file.
    pub path: Utf8PathBuf,

    /// The test class defined by the file.
    pub identifier: TestIdentifier,
}

/// A discovered JUnit report.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReportFile {
    /// The path to the report.
    pub path: Utf8PathBuf,

    /// The test class the report belongs to.
    pub key: ReportKey,
}

/// A set of excluded test sources.
///
/// Each entry is a file name or a file-name glob such as `SlowTest.kt` or `Flaky*.kt`. An entry
/// excludes test sources with that file name in any directory, and reports whose [`ReportKey`]
/// matches the entry's file stem.
#[derive(Clone, Debug)]
pub struct ExcludeSet {
    entries: Vec<String>,
    paths: GlobSet,
    keys: GlobSet,
}

impl ExcludeSet {
    /// Compiles a new exclude set. Blank entries are ignored.
    pub fn new<I, S>(entries: I) -> Result<Self, DiscoveryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut paths = GlobSetBuilder::new();
        let mut keys = GlobSetBuilder::new();
        let mut kept = Vec::new();

        for entry in entries {
            let entry = entry.as_ref().trim();
            if entry.is_empty() {
                continue;
            }
            paths.add(build_glob("exclude", &format!("**/{entry}"))?);
            let stem = Utf8Path::new(entry).file_stem().unwrap_or(entry);
            keys.add(build_glob("exclude", stem)?);
            kept.push(entry.to_owned());
        }

        let joined = kept.join(", ");
        Ok(Self {
            paths: build_set(paths, &joined)?,
            keys: build_set(keys, &joined)?,
            entries: kept,
        })
    }

    /// Returns an exclude set that excludes nothing.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            paths: GlobSet::empty(),
            keys: GlobSet::empty(),
        }
    }

    /// Returns the entries in this set.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Returns true if the set contains no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if a test source at `rel_path` (relative to the test root) is excluded.
    pub fn excludes_path(&self, rel_path: &Utf8Path) -> bool {
        self.paths.is_match(rel_path.as_str())
    }

    /// Returns true if reports with this key are excluded.
    pub fn excludes_key(&self, key: &ReportKey) -> bool {
        self.keys.is_match(key.as_str())
    }
}

impl Default for ExcludeSet {
    fn default() -> Self {
        Self::empty()
    }
}

/// Compiled discovery patterns.
#[derive(Clone, Debug)]
pub struct DiscoveryPatterns {
    test: GlobMatcher,
    report: GlobMatcher,
    exclude: ExcludeSet,
}

impl DiscoveryPatterns {
    /// Compiles the patterns in `config`, adding `extra_exclude` to the configured exclusions.
    pub fn new<I, S>(config: &DiscoveryConfig, extra_exclude: I) -> Result<Self, DiscoveryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let test = build_glob("test", &config.test_pattern)?.compile_matcher();
        let report = build_glob("report", &config.report_pattern)?.compile_matcher();
        let exclude = ExcludeSet::new(
            config
                .exclude
                .iter()
                .cloned()
                .chain(extra_exclude.into_iter().map(|s| s.as_ref().to_owned())),
        )?;

        Ok(Self {
            test,
            report,
            exclude,
        })
    }

    /// Returns the exclude set.
    pub fn exclude(&self) -> &ExcludeSet {
        &self.exclude
    }

    /// Finds test sources under `root`, sorted by path.
    pub fn test_files(&self, root: &Utf8Path) -> Result<Vec<TestFile>, DiscoveryError> {
        let files: Vec<_> = walk_matching(root, &self.test)?
            .into_iter()
            .filter(|path| {
                let rel_path = path.strip_prefix(root).unwrap_or(path);
                !self.exclude.excludes_path(rel_path)
            })
            .filter_map(|path| {
                let identifier = TestIdentifier::new(path.file_stem()?);
                Some(TestFile { path, identifier })
            })
            .collect();

        debug!(
            "found {} test source {} under {root}",
            files.len(),
            plural::files_str(files.len()),
        );
        Ok(files)
    }

    /// Finds JUnit reports under `root`, sorted by path.
    pub fn report_files(&self, root: &Utf8Path) -> Result<Vec<ReportFile>, DiscoveryError> {
        let files: Vec<_> = walk_matching(root, &self.report)?
            .into_iter()
            .filter_map(|path| {
                let key = ReportKey::from_path(&path);
                (!self.exclude.excludes_key(&key)).then_some(ReportFile { path, key })
            })
            .collect();

        debug!(
            "found {} report {} under {root}",
            files.len(),
            plural::files_str(files.len()),
        );
        Ok(files)
    }
}

fn walk_matching(
    root: &Utf8Path,
    matcher: &GlobMatcher,
) -> Result<Vec<Utf8PathBuf>, DiscoveryError> {
    let mut paths = Vec::new();
    // Hidden files and directories below the root (.gradle, .idea) are never searched.
    let walker = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err)
                if err.depth() == 0
                    && err
                        .io_error()
                        .is_some_and(|error| error.kind() == io::ErrorKind::NotFound) =>
            {
                debug!("{root} does not exist, treating it as empty");
                return Ok(Vec::new());
            }
            Err(err) => {
                return Err(DiscoveryError::Walk {
                    root: root.to_owned(),
                    err,
                });
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        let path = Utf8PathBuf::try_from(entry.into_path()).map_err(|err| {
            DiscoveryError::NonUtf8Path {
                root: root.to_owned(),
                path: err.into_path_buf(),
            }
        })?;
        if path.file_name().is_some_and(|name| matcher.is_match(name)) {
            paths.push(path);
        }
    }

    // Case-insensitive, ties broken by the exact path.
    paths.sort_by_cached_key(|path| (path.as_str().to_lowercase(), path.clone()));
    Ok(paths)
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.file_name().as_encoded_bytes().starts_with(b".")
}

fn build_glob(kind: &'static str, pattern: &str) -> Result<Glob, DiscoveryError> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|err| DiscoveryError::InvalidPattern {
            kind,
            pattern: pattern.to_owned(),
            err,
        })
}

fn build_set(builder: GlobSetBuilder, pattern: &str) -> Result<GlobSet, DiscoveryError> {
    builder.build().map_err(|err| DiscoveryError::InvalidPattern {
        kind: "exclude",
        pattern: pattern.to_owned(),
        err,
    })
}
