use std::collections::VecDeque;

use crate::Timestamp;

/// The default number of entries kept.
pub const CAPACITY: usize = 10_000;

/// A bounded FIFO of the timestamps of decoded pictures, used to step backwards.
///
/// Once full, the oldest entry is evicted.
#[derive(Debug, Clone)]
pub struct PlaybackHistory {
	entries: VecDeque<Timestamp>,
	capacity: usize,
}

impl Default for PlaybackHistory {
	fn default() -> Self {
		Self::new(CAPACITY)
	}
}

impl PlaybackHistory {
	pub fn new(capacity: usize) -> Self {
		let capacity = capacity.max(1);
		Self {
			// Don't allocate the whole thing up front.
			entries: VecDeque::with_capacity(capacity.min(1024)),
			capacity,
		}
	}

	pub fn push(&mut self, timestamp: Timestamp) {
		if self.entries.len() == self.capacity {
			self.entries.pop_front();
		}
		self.entries.push_back(timestamp);
	}

	pub fn pop(&mut self) -> Option<Timestamp> {
		self.entries.pop_back()
	}

	pub fn last(&self) -> Option<Timestamp> {
		self.entries.back().copied()
	}

	/// Drop the current entry and pop the one before it, the target of a backward step.
	///
	/// Leaves the history untouched if there is nothing before the current entry.
	pub fn step_back(&mut self) -> Option<Timestamp> {
		if self.entries.len() < 2 {
			return None;
		}

		self.entries.pop_back();
		self.entries.pop_back()
	}

	pub fn clear(&mut self) {
		self.entries.clear();
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}

	pub fn iter(&self) -> impl Iterator<Item = Timestamp> + '_ {
		self.entries.iter().copied()
	}
}
