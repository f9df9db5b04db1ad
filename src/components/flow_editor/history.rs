//! Bounded undo/redo list of full snapshots.

use std::collections::VecDeque;

/// Snapshot history with a cursor.
///
/// Invariant: whenever the list is non-empty, `0 <= index < len`. Pushing after an undo discards the
/// redo branch; exceeding the capacity drops the oldest entry.
#[derive(Clone, Debug)]
pub struct History<T> {
	entries: VecDeque<T>,
	index: usize,
	capacity: usize,
}

impl<T: Clone> History<T> {
	/// Empty history keeping at most `capacity` entries (at least one).
	pub fn new(capacity: usize) -> Self {
		Self {
			entries: VecDeque::with_capacity(capacity.max(1) + 1),
			index: 0,
			capacity: capacity.max(1),
		}
	}

	/// Records a new state and makes it current.
	pub fn push(&mut self, snapshot: T) {
		if !self.entries.is_empty() {
			self.entries.truncate(self.index + 1);
		}
		self.entries.push_back(snapshot);
		if self.entries.len() > self.capacity {
			self.entries.pop_front();
		}
		self.index = self.entries.len() - 1;
	}

	/// Drops everything and starts over from `snapshot`.
	pub fn reset(&mut self, snapshot: T) {
		self.entries.clear();
		self.entries.push_back(snapshot);
		self.index = 0;
	}

	/// Steps back. Returns a copy of the state to show, `None` when already at the oldest entry.
	pub fn undo(&mut self) -> Option<T> {
		if !self.can_undo() {
			return None;
		}
		self.index -= 1;
		self.entries.get(self.index).cloned()
	}

	/// Steps forward. Returns a copy of the state to show, `None` when already at the newest entry.
	pub fn redo(&mut self) -> Option<T> {
		if !self.can_redo() {
			return None;
		}
		self.index += 1;
		self.entries.get(self.index).cloned()
	}

	/// Whether `undo` would do anything.
	pub fn can_undo(&self) -> bool {
		self.index > 0
	}

	/// Whether `redo` would do anything.
	pub fn can_redo(&self) -> bool {
		self.index + 1 < self.entries.len()
	}

	/// The current state.
	pub fn current(&self) -> Option<&T> {
		self.entries.get(self.index)
	}

	/// Cursor position.
	pub fn index(&self) -> usize {
		self.index
	}

	/// Number of retained entries.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether nothing was recorded yet.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Maximum retained entries.
	pub fn capacity(&self) -> usize {
		self.capacity
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn undo_redo_walks_the_list() {
		let mut history = History::new(10);
		history.reset(0);
		history.push(1);
		history.push(2);
		assert_eq!(history.undo(), Some(1));
		assert_eq!(history.undo(), Some(0));
		assert_eq!(history.undo(), None);
		assert_eq!(history.redo(), Some(1));
		assert_eq!(history.redo(), Some(2));
		assert_eq!(history.redo(), None);
	}

	#[test]
	fn push_after_undo_discards_redo_branch() {
		let mut history = History::new(10);
		history.reset("a");
		history.push("b");
		history.push("c");
		history.undo();
		history.undo();
		history.push("d");
		assert_eq!(history.len(), 2);
		assert!(!history.can_redo());
		assert_eq!(history.current(), Some(&"d"));
		assert_eq!(history.undo(), Some("a"));
	}

	#[test]
	fn capacity_drops_oldest_and_keeps_cursor_valid() {
		let mut history = History::new(50);
		history.reset(0);
		for i in 1..=60 {
			history.push(i);
		}
		assert_eq!(history.len(), 50);
		assert_eq!(history.index(), 49);
		assert_eq!(history.current(), Some(&60));

		let mut undone = 0;
		while history.undo().is_some() {
			undone += 1;
		}
		assert_eq!(undone, 49);
		assert_eq!(history.current(), Some(&11));
		while history.redo().is_some() {}
		assert_eq!(history.current(), Some(&60));
	}

	#[test]
	fn long_runs_stay_bounded_and_ordered() {
		let mut history = History::new(3);
		history.reset(0);
		for i in 1..=500 {
			history.push(i);
			assert!(history.len() <= 3);
		}
		assert_eq!(history.undo(), Some(499));
		assert_eq!(history.undo(), Some(498));
		assert_eq!(history.undo(), None);
		history.push(-1);
		assert_eq!(history.len(), 2);
		assert_eq!(history.undo(), Some(498));
	}

	#[test]
	fn capacity_is_at_least_one() {
		let mut history = History::new(0);
		history.push(1);
		history.push(2);
		assert_eq!(history.len(), 1);
		assert_eq!(history.current(), Some(&2));
		assert!(!history.can_undo());
	}
}
