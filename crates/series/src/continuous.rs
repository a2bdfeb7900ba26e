//! Continuous adapters: cursors that answer point lookups between keys.
//!
//! Both adapters move exactly like their inner cursor. They only change
//! [`Cursor::try_get_value`], which [`Zip`](crate::Zip) consults for keys a
//! side does not hold.

use std::sync::Arc;

use strand_primitives::{CursorState, Lookup};
use strand_sync::{AsyncCompletable, SubscribeError, SubscriptionSet};

use crate::cursor::Cursor;

macro_rules! delegate_moves {
	() => {
		fn state(&self) -> CursorState {
			self.inner.state()
		}

		fn reset(&mut self) {
			self.inner.reset();
		}

		fn dispose(&mut self) {
			self.inner.dispose();
		}

		fn move_first(&mut self) -> bool {
			self.inner.move_first()
		}

		fn move_last(&mut self) -> bool {
			self.inner.move_last()
		}

		fn move_next(&mut self) -> bool {
			self.inner.move_next()
		}

		fn move_previous(&mut self) -> bool {
			self.inner.move_previous()
		}

		fn move_at(&mut self, key: &Self::Key, lookup: Lookup) -> bool {
			self.inner.move_at(key, lookup)
		}

		fn current_key(&self) -> &Self::Key {
			self.inner.current_key()
		}

		fn current_value(&self) -> Self::Value {
			self.inner.current_value()
		}

		fn try_find(&self, key: &Self::Key, lookup: Lookup) -> Option<(Self::Key, Self::Value)> {
			self.inner.try_find(key, lookup)
		}

		fn is_continuous(&self) -> bool {
			true
		}

		fn is_completed(&self) -> bool {
			self.inner.is_completed()
		}

		fn subscribe(&self, target: &Arc<dyn AsyncCompletable>, subscriptions: &mut SubscriptionSet) -> Result<(), SubscribeError> {
			self.inner.subscribe(target, subscriptions)
		}
	};
}

/// Carries the last value forward: a lookup between keys answers with the
/// value at the nearest key at or before it.
#[derive(Debug, Clone)]
pub struct Repeat<C> {
	inner: C,
}

impl<C> Repeat<C> {
	/// Wraps `inner`, carrying values forward between its keys.
	pub fn new(inner: C) -> Self {
		Self { inner }
	}
}

impl<C: Cursor> Cursor for Repeat<C> {
	type Key = C::Key;
	type Value = C::Value;

	delegate_moves!();

	fn initialize(&self) -> Self {
		Self::new(self.inner.initialize())
	}

	fn try_get_value(&self, key: &C::Key) -> Option<C::Value> {
		self.inner.try_find(key, Lookup::Le).map(|(_, value)| value)
	}
}

/// Substitutes a constant for keys the inner cursor does not hold.
#[derive(Debug, Clone)]
pub struct Fill<C: Cursor> {
	inner: C,
	value: C::Value,
}

impl<C: Cursor> Fill<C> {
	/// Wraps `inner`, answering `value` between its keys.
	pub fn new(inner: C, value: C::Value) -> Self {
		Self { inner, value }
	}

	/// Value used for keys the inner cursor does not hold.
	pub fn fill_value(&self) -> &C::Value {
		&self.value
	}
}

impl<C: Cursor> Cursor for Fill<C> {
	type Key = C::Key;
	type Value = C::Value;

	delegate_moves!();

	fn initialize(&self) -> Self {
		Self::new(self.inner.initialize(), self.value.clone())
	}

	fn try_get_value(&self, key: &C::Key) -> Option<C::Value> {
		Some(self.inner.try_get_value(key).unwrap_or_else(|| self.value.clone()))
	}
}

#[cfg(test)]
mod tests {
	use crate::{Cursor, CursorExt, Series};

	#[test]
	fn repeat_answers_as_of() {
		let series: Series<i32, i32> = [(2, 2), (4, 4)].into_iter().collect();
		let repeat = series.cursor().repeat();
		assert_eq!(repeat.try_get_value(&1), None);
		assert_eq!(repeat.try_get_value(&3), Some(2));
		assert_eq!(repeat.try_get_value(&9), Some(4));
		assert!(repeat.is_continuous());
	}

	#[test]
	fn fill_answers_everywhere() {
		let series: Series<i32, i32> = [(2, 2)].into_iter().collect();
		let fill = series.cursor().fill(-1);
		assert_eq!(fill.try_get_value(&2), Some(2));
		assert_eq!(fill.try_get_value(&3), Some(-1));
		assert_eq!(fill.into_series().count(), 1, "moves only visit stored keys");
	}
}
