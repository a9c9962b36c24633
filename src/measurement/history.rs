use super::results::MeasurementResult;
use serde::Serialize;
use std::collections::VecDeque;

/// Number of completed results retained.
pub const HISTORY_CAPACITY: usize = 10;

/// Bounded, oldest-first record of completed measurements.
///
/// Appending to a full history evicts from the front. Entries are never
/// reordered or deduplicated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResultHistory {
    #[serde(skip)]
    capacity: usize,
    entries: VecDeque<MeasurementResult>,
}

impl ResultHistory {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    /// A history retaining at most `capacity` entries (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { capacity, entries: VecDeque::with_capacity(capacity) }
    }

    pub fn append(&mut self, result: MeasurementResult) {
        self.entries.push_back(result);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The most recently appended result.
    pub fn last(&self) -> Option<&MeasurementResult> {
        self.entries.back()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &MeasurementResult> {
        self.entries.iter()
    }
}

impl Default for ResultHistory {
    fn default() -> Self {
        Self::new()
    }
}
