// Copyright (c) The test-splitter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Computing the tests a node should run.
//!
//! [`split`] divides test classes between nodes by count. [`split_with_timing`] uses timings
//! recorded in JUnit reports from a previous run to divide individual test cases by duration,
//! and falls back to [`split`] if the reports don't cover every test class.

use crate::{
    config::DiscoveryConfig,
    discovery::{DiscoveryPatterns, TestFile, TestIdentifier},
    errors::SplitError,
    partition::{Balancer, NodeSpec, Shard, WorkQueue, fallback_selection, round_robin},
    record::read_records,
    sync::SyncReport,
};
use camino::{Utf8Path, Utf8PathBuf};
use std::num::NonZeroUsize;
use tracing::{debug, info};

/// Options shared by every split strategy.
#[derive(Clone, Debug)]
pub struct SplitOpts {
    test_path: Utf8PathBuf,
    discovery: DiscoveryConfig,
    exclude: Vec<String>,
}

impl SplitOpts {
    /// Creates a new set of options for tests under `test_path`, discovered according to
    /// `discovery`.
    pub fn new(test_path: impl Into<Utf8PathBuf>, discovery: DiscoveryConfig) -> Self {
        Self {
            test_path: test_path.into(),
            discovery,
            exclude: Vec::new(),
        }
    }

    /// Sets file names to exclude, in addition to the ones in the discovery config.
    pub fn set_exclude<I, S>(&mut self, exclude: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = exclude.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the directory test sources are discovered under.
    pub fn test_path(&self) -> &Utf8Path {
        &self.test_path
    }

    /// Returns the file names excluded in addition to the ones in the discovery config.
    pub fn exclude(&self) -> &[String] {
        &self.exclude
    }

    fn patterns(&self) -> Result<DiscoveryPatterns, SplitError> {
        if self.test_path.as_str().is_empty() {
            return Err(SplitError::EmptyTestPath);
        }
        Ok(DiscoveryPatterns::new(&self.discovery, &self.exclude)?)
    }
}

/// Divides test classes between nodes by count, and returns the `--tests` arguments for `node`.
pub fn split(opts: &SplitOpts, node: NodeSpec) -> Result<String, SplitError> {
    let patterns = opts.patterns()?;
    let test_files = patterns.test_files(opts.test_path())?;
    Ok(fallback(&test_files, node))
}

/// Divides test cases between nodes by recorded duration, and returns the `--tests` arguments
/// for `node`.
///
/// Timings are read from JUnit reports under `report_root`. If any test class has no report, the
/// timings are considered stale and test classes are divided by count instead.
pub fn split_with_timing(
    opts: &SplitOpts,
    report_root: &Utf8Path,
    node: NodeSpec,
) -> Result<String, SplitError> {
    match collect_timings(opts, report_root)? {
        Timings::Recorded(queue) => {
            let shard = Balancer::new(queue, node.total_shards()).select(node.index())?;
            let tests = shard.to_selection();
            info!("Successfully created tests using timings: {tests}");
            Ok(tests)
        }
        Timings::OutOfSync(test_files) => Ok(fallback(&test_files, node)),
    }
}

/// Computes the tests for every node at once, using the same strategy as [`split_with_timing`].
pub fn plan_with_timing(
    opts: &SplitOpts,
    report_root: &Utf8Path,
    node_total: NonZeroUsize,
) -> Result<SplitPlan, SplitError> {
    match collect_timings(opts, report_root)? {
        Timings::Recorded(queue) => {
            let balancer = Balancer::new(queue, node_total);
            let target_secs = balancer.target_secs();
            Ok(SplitPlan::Timing {
                target_secs,
                shards: balancer.plan()?,
            })
        }
        Timings::OutOfSync(test_files) => {
            let identifiers: Vec<_> = test_files.into_iter().map(|f| f.identifier).collect();
            let shards = NodeSpec::all(node_total)
                .map(|node| round_robin(identifiers.iter().cloned(), node))
                .collect();
            Ok(SplitPlan::RoundRobin { shards })
        }
    }
}

/// The tests assigned to every node.
#[derive(Clone, Debug, PartialEq)]
pub enum SplitPlan {
    /// Test cases were divided by recorded duration.
    Timing {
        /// The duration each shard aimed for, in seconds.
        target_secs: f64,

        /// The shards, in node order.
        shards: Vec<Shard>,
    },

    /// Timings were out of sync, so test classes were divided by count.
    RoundRobin {
        /// The test classes for each node, in node order.
        shards: Vec<Vec<TestIdentifier>>,
    },
}

impl SplitPlan {
    /// Returns the number of nodes in this plan.
    pub fn node_total(&self) -> usize {
        match self {
            SplitPlan::Timing { shards, .. } => shards.len(),
            SplitPlan::RoundRobin { shards } => shards.len(),
        }
    }

    /// Returns the `--tests` arguments for the node at `index`, or `None` if it's out of range.
    pub fn selection(&self, index: usize) -> Option<String> {
        match self {
            SplitPlan::Timing { shards, .. } => shards.get(index).map(Shard::to_selection),
            SplitPlan::RoundRobin { shards } => shards.get(index).map(fallback_selection),
        }
    }
}

enum Timings {
    Recorded(WorkQueue),
    OutOfSync(Vec<TestFile>),
}

fn collect_timings(opts: &SplitOpts, report_root: &Utf8Path) -> Result<Timings, SplitError> {
    let patterns = opts.patterns()?;
    let test_files = patterns.test_files(opts.test_path())?;
    let report_files = patterns.report_files(report_root)?;

    let sync = SyncReport::new(&test_files, &report_files);
    sync.log();
    if !sync.is_in_sync() {
        return Ok(Timings::OutOfSync(test_files));
    }

    let records = read_records(&report_files)?;
    debug!("read {} test timings from {report_root}", records.len());
    Ok(Timings::Recorded(WorkQueue::new(records)))
}

fn fallback(test_files: &[TestFile], node: NodeSpec) -> String {
    let selected = round_robin(test_files.iter().map(|file| &file.identifier), node);
    let tests = fallback_selection(selected);
    info!("Successfully created tests: {tests}");
    tests
}
