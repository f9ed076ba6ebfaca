// Copyright (c) The test-splitter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Support for partitioning tests across several CI nodes.
//!
//! Two strategies are supported:
//!
//! * [`round_robin`] assigns test classes to nodes by position, ignoring how long they take.
//! * [`Balancer`] uses recorded timings to greedily pack individual test cases into shards of
//!   roughly equal total duration.

use crate::{
    discovery::TestIdentifier,
    errors::{NodeSpecError, PackingError},
    helpers::{DisplaySecs, encode_xml, plural},
    record::TestRecord,
};
use itertools::Itertools;
use std::{collections::VecDeque, fmt, num::NonZeroUsize};

/// A validated node index and node total.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct NodeSpec {
    index: usize,
    total: NonZeroUsize,
}

impl NodeSpec {
    /// Validates a node index and node total as passed in on the command line.
    ///
    /// `node_index` is zero-based and must be less than `node_total`.
    pub fn new(node_index: i64, node_total: i64) -> Result<Self, NodeSpecError> {
        if node_index < 0 {
            return Err(NodeSpecError::InvalidIndex { node_index });
        }
        if node_total <= 0 {
            return Err(NodeSpecError::InvalidTotal { node_total });
        }
        if node_index >= node_total {
            return Err(NodeSpecError::IndexOutOfBounds {
                node_index,
                node_total,
            });
        }

        let index = usize::try_from(node_index).map_err(|_| NodeSpecError::IndexOutOfBounds {
            node_index,
            node_total,
        })?;
        let total = usize::try_from(node_total)
            .ok()
            .and_then(NonZeroUsize::new)
            .ok_or(NodeSpecError::InvalidTotal { node_total })?;
        Ok(Self { index, total })
    }

    /// Returns every node out of `total`, in index order.
    pub fn all(total: NonZeroUsize) -> impl Iterator<Item = NodeSpec> {
        (0..total.get()).map(move |index| Self { index, total })
    }

    /// The zero-based index of this node.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The total number of nodes.
    pub fn total(&self) -> usize {
        self.total.get()
    }

    /// The total number of nodes, as a [`NonZeroUsize`].
    pub fn total_shards(&self) -> NonZeroUsize {
        self.total
    }

    /// Returns true if this is the last node.
    pub fn is_last(&self) -> bool {
        self.index + 1 == self.total.get()
    }
}

impl fmt::Display for NodeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.index + 1, self.total)
    }
}

/// Test records that haven't been assigned to a shard yet, consumed from the front.
#[derive(Clone, Debug, Default)]
pub struct WorkQueue {
    records: VecDeque<TestRecord>,
}

impl WorkQueue {
    /// Creates a new queue with records in the given order.
    pub fn new(records: impl IntoIterator<Item = TestRecord>) -> Self {
        Self {
            records: records.into_iter().collect(),
        }
    }

    /// Returns the number of records left.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no records are left.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the next record without removing it.
    pub fn peek(&self) -> Option<&TestRecord> {
        self.records.front()
    }

    /// Removes and returns the next record.
    pub fn pop_front(&mut self) -> Option<TestRecord> {
        self.records.pop_front()
    }

    /// Returns the sum of all remaining durations, in seconds.
    pub fn total_secs(&self) -> f64 {
        self.records.iter().map(TestRecord::duration_secs).sum()
    }

    /// Returns an error if any records are left.
    pub fn ensure_drained(&self) -> Result<(), PackingError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(PackingError::Unconsumed {
                remaining: self.len(),
            })
        }
    }
}

impl FromIterator<TestRecord> for WorkQueue {
    fn from_iter<T: IntoIterator<Item = TestRecord>>(iter: T) -> Self {
        Self::new(iter)
    }
}

/// The test cases assigned to one node by the [`Balancer`].
#[derive(Clone, Debug, PartialEq)]
pub struct Shard {
    index: usize,
    test_names: Vec<String>,
    accumulated_secs: f64,
}

impl Shard {
    fn new(index: usize) -> Self {
        Self {
            index,
            test_names: Vec::new(),
            accumulated_secs: 0.0,
        }
    }

    fn push(&mut self, record: &TestRecord) {
        self.test_names.push(record.qualified_name());
        self.accumulated_secs += record.duration_secs();
    }

    /// The zero-based index of the node this shard is for.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The qualified names of the tests in this shard, in assignment order.
    pub fn test_names(&self) -> &[String] {
        &self.test_names
    }

    /// The sum of the recorded durations of the tests in this shard, in seconds.
    pub fn accumulated_secs(&self) -> f64 {
        self.accumulated_secs
    }

    /// Returns the number of tests in this shard.
    pub fn len(&self) -> usize {
        self.test_names.len()
    }

    /// Returns true if this shard has no tests.
    pub fn is_empty(&self) -> bool {
        self.test_names.is_empty()
    }

    /// Formats this shard as `--tests "..."` arguments.
    ///
    /// Names are XML-escaped, so quotes inside test names can't terminate the argument early.
    pub fn to_selection(&self) -> String {
        self.test_names
            .iter()
            .map(|name| format!("--tests \"{}\"", encode_xml(name)))
            .join(" ")
    }

    /// Returns a summary line for this shard, out of `total` shards.
    pub fn summary(&self, total: usize) -> String {
        format!(
            "shard {}/{total}: {} {}, {}",
            self.index + 1,
            self.len(),
            plural::tests_str(self.len()),
            DisplaySecs(self.accumulated_secs),
        )
    }
}

/// Greedily packs test records into shards of roughly equal total duration.
///
/// Each shard takes records from the front of the queue until it reaches the target duration
/// (the total duration divided by the number of shards). The balancer is an iterator over
/// shards in index order; the final shard always takes everything that's left.
///
/// Two policies shape the packing:
///
/// * A shard never takes so many records that a later shard would start with an empty queue.
/// * In the first three quarters of the shards, a shard stops before taking a record that
///   would push it past the target. In the last quarter it may overshoot, so that leftovers
///   don't pile up in the final shard.
#[derive(Clone, Debug)]
pub struct Balancer {
    queue: WorkQueue,
    total_shards: usize,
    target_secs: f64,
    next_index: usize,
}

impl Balancer {
    /// Creates a new balancer over `queue`, producing `total_shards` shards.
    pub fn new(queue: WorkQueue, total_shards: NonZeroUsize) -> Self {
        let total_shards = total_shards.get();
        let target_secs = queue.total_secs() / total_shards as f64;
        Self {
            queue,
            total_shards,
            target_secs,
            next_index: 0,
        }
    }

    /// The duration each shard aims for, in seconds.
    pub fn target_secs(&self) -> f64 {
        self.target_secs
    }

    /// The records not yet assigned to a shard.
    pub fn remaining(&self) -> &WorkQueue {
        &self.queue
    }

    /// Packs shards up to and including `node_index`, and returns that shard.
    pub fn select(mut self, node_index: usize) -> Result<Shard, PackingError> {
        while let Some(shard) = self.next() {
            if shard.index != node_index {
                continue;
            }
            // The final shard ignores both the target and the early stop, so it always takes
            // whatever is left. A non-empty queue here means fill_shard is broken.
            if node_index + 1 == self.total_shards {
                self.queue.ensure_drained()?;
            }
            return Ok(shard);
        }

        Err(PackingError::NoMatchingShard {
            node_index,
            node_total: self.total_shards,
        })
    }

    /// Packs every shard.
    pub fn plan(mut self) -> Result<Vec<Shard>, PackingError> {
        let shards: Vec<_> = self.by_ref().collect();
        self.queue.ensure_drained()?;
        Ok(shards)
    }

    fn fill_shard(&mut self, index: usize) -> Shard {
        let is_last = index + 1 == self.total_shards;
        // Shards at or past this index may overshoot the target.
        let loose_from = self.total_shards - self.total_shards / 4;
        // Leave at least one record for every shard after this one.
        let reserve = self.total_shards - index;

        let mut shard = Shard::new(index);
        while self.queue.len() >= reserve && (shard.accumulated_secs < self.target_secs || is_last)
        {
            let Some(record) = self.queue.pop_front() else {
                break;
            };
            shard.push(&record);

            if !is_last
                && index < loose_from
                && let Some(next) = self.queue.peek()
                && shard.accumulated_secs + next.duration_secs() > self.target_secs
            {
                break;
            }
        }
        shard
    }
}

impl Iterator for Balancer {
    type Item = Shard;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_index >= self.total_shards {
            return None;
        }
        let shard = self.fill_shard(self.next_index);
        self.next_index += 1;
        Some(shard)
    }
}

/// Selects every `node.total()`-th item, starting at `node.index()`.
pub fn round_robin<T>(items: impl IntoIterator<Item = T>, node: NodeSpec) -> Vec<T> {
    let mut partitioner = CountPartitioner::new(node);
    items
        .into_iter()
        .filter(|_| partitioner.test_matches())
        .collect()
}

/// Formats test classes as `--tests ...` arguments.
///
/// Class names come from file stems and are passed through unquoted.
pub fn fallback_selection<'a>(identifiers: impl IntoIterator<Item = &'a TestIdentifier>) -> String {
    identifiers
        .into_iter()
        .map(|identifier| format!("--tests {identifier}"))
        .join(" ")
}

#[derive(Clone, Debug)]
struct CountPartitioner {
    node_index: usize,
    node_total: usize,
    curr: usize,
}

impl CountPartitioner {
    fn new(node: NodeSpec) -> Self {
        Self {
            node_index: node.index,
            node_total: node.total.get(),
            curr: 0,
        }
    }

    fn test_matches(&mut self) -> bool {
        let matches = self.curr == self.node_index;
        self.curr = (self.curr + 1) % self.node_total;
        matches
    }
}
