//! Read-only series view over a cursor.

use strand_primitives::Lookup;

use crate::cursor::Cursor;

/// Read-only series backed by a cursor factory.
///
/// Every traversal starts from a fresh [`initialize`](Cursor::initialize)d
/// cursor, so the view can be shared and iterated any number of times.
#[derive(Debug, Clone)]
pub struct CursorSeries<C> {
	factory: C,
}

impl<C: Cursor> CursorSeries<C> {
	/// Wraps a cursor used as a factory for traversals.
	pub fn new(factory: C) -> Self {
		Self { factory }
	}

	/// Fresh cursor ready for traversal.
	pub fn cursor(&self) -> C {
		self.factory.initialize()
	}

	/// Value at `key`, with the cursor's own key-resolution policy.
	pub fn try_get_value(&self, key: &C::Key) -> Option<C::Value> {
		self.factory.try_get_value(key)
	}

	/// Entry found from `key` in the direction of `lookup`.
	pub fn try_find(&self, key: &C::Key, lookup: Lookup) -> Option<(C::Key, C::Value)> {
		self.factory.try_find(key, lookup)
	}

	/// First entry of the view.
	pub fn first(&self) -> Option<(C::Key, C::Value)> {
		let mut cursor = self.cursor();
		cursor.move_first().then(|| cursor.current())
	}

	/// Last entry of the view.
	pub fn last(&self) -> Option<(C::Key, C::Value)> {
		let mut cursor = self.cursor();
		cursor.move_last().then(|| cursor.current())
	}

	/// True if a fresh traversal finds no entry.
	pub fn is_empty(&self) -> bool {
		self.first().is_none()
	}

	/// Number of entries; walks the whole view.
	pub fn count(&self) -> usize {
		self.iter().count()
	}

	/// True once every source of the view is completed.
	pub fn is_completed(&self) -> bool {
		self.factory.is_completed()
	}

	/// Forward iterator over a fresh traversal.
	pub fn iter(&self) -> Iter<C> {
		Iter { cursor: self.cursor() }
	}
}

impl<C: Cursor> IntoIterator for &CursorSeries<C> {
	type Item = (C::Key, C::Value);
	type IntoIter = Iter<C>;

	fn into_iter(self) -> Iter<C> {
		self.iter()
	}
}

/// Forward iterator over a [`CursorSeries`].
#[derive(Debug, Clone)]
pub struct Iter<C> {
	cursor: C,
}

impl<C: Cursor> Iterator for Iter<C> {
	type Item = (C::Key, C::Value);

	fn next(&mut self) -> Option<Self::Item> {
		self.cursor.move_next().then(|| self.cursor.current())
	}
}
