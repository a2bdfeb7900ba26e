use std::fmt;
use std::sync::Arc;

use strand_primitives::{CursorState, Lookup};
use strand_sync::{AsyncCompletable, SubscribeError, SubscriptionSet};

use super::{Series, cloned};
use crate::cursor::{Cursor, assert_initialized};
use crate::store::{BTreeStore, OrderedStore};

/// Cursor over a [`Series`].
///
/// Holds the entry it is positioned at; moves are resolved against the
/// series storage relative to that key, so concurrent writes never
/// invalidate the cursor.
pub struct SeriesCursor<K, V, S = BTreeStore<K, V>> {
	series: Series<K, V, S>,
	state: CursorState,
	current: Option<(K, V)>,
}

impl<K: Clone, V: Clone, S> Clone for SeriesCursor<K, V, S> {
	fn clone(&self) -> Self {
		Self {
			series: self.series.clone(),
			state: self.state,
			current: self.current.clone(),
		}
	}
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for SeriesCursor<K, V, S> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SeriesCursor")
			.field("state", &self.state)
			.field("current", &self.current)
			.finish_non_exhaustive()
	}
}

impl<K, V, S> SeriesCursor<K, V, S> {
	pub(super) fn new(series: Series<K, V, S>) -> Self {
		Self {
			series,
			state: CursorState::Uninitialized,
			current: None,
		}
	}

	pub(super) fn initialized(series: Series<K, V, S>) -> Self {
		Self {
			series,
			state: CursorState::Initialized,
			current: None,
		}
	}

	/// The series this cursor reads.
	pub fn series(&self) -> &Series<K, V, S> {
		&self.series
	}
}

impl<K, V, S> SeriesCursor<K, V, S>
where
	K: Ord + Clone + Send + Sync,
	V: Clone + Send + Sync,
	S: OrderedStore<K, V>,
{
	fn land(&mut self, entry: Option<(K, V)>) -> bool {
		match entry {
			Some(entry) => {
				self.current = Some(entry);
				self.state = CursorState::Moving;
				true
			}
			None => false,
		}
	}

	fn positioned_key(&self) -> Option<&K> {
		self.current.as_ref().filter(|_| self.state.is_moving()).map(|(key, _)| key)
	}
}

impl<K, V, S> Cursor for SeriesCursor<K, V, S>
where
	K: Ord + Clone + Send + Sync,
	V: Clone + Send + Sync,
	S: OrderedStore<K, V>,
{
	type Key = K;
	type Value = V;

	fn state(&self) -> CursorState {
		self.state
	}

	fn initialize(&self) -> Self {
		Self::initialized(self.series.clone())
	}

	fn reset(&mut self) {
		if self.state.is_initialized() {
			self.state = CursorState::Initialized;
		}
		self.current = None;
	}

	fn dispose(&mut self) {
		self.state = CursorState::Uninitialized;
		self.current = None;
	}

	fn move_first(&mut self) -> bool {
		assert_initialized(self.state);
		let entry = self.series.read(|store| cloned(store.first()));
		self.land(entry)
	}

	fn move_last(&mut self) -> bool {
		assert_initialized(self.state);
		let entry = self.series.read(|store| cloned(store.last()));
		self.land(entry)
	}

	fn move_next(&mut self) -> bool {
		assert_initialized(self.state);
		let Some(key) = self.positioned_key() else {
			return self.move_first();
		};
		let entry = self.series.read(|store| cloned(store.next_after(key)));
		self.land(entry)
	}

	fn move_previous(&mut self) -> bool {
		assert_initialized(self.state);
		let Some(key) = self.positioned_key() else {
			return self.move_last();
		};
		let entry = self.series.read(|store| cloned(store.previous_before(key)));
		self.land(entry)
	}

	fn move_at(&mut self, key: &K, lookup: Lookup) -> bool {
		assert_initialized(self.state);
		let entry = self.series.try_find(key, lookup);
		self.land(entry)
	}

	fn current_key(&self) -> &K {
		match &self.current {
			Some((key, _)) => key,
			None => panic!("cursor is not positioned"),
		}
	}

	fn current_value(&self) -> V {
		match &self.current {
			Some((_, value)) => value.clone(),
			None => panic!("cursor is not positioned"),
		}
	}

	fn try_get_value(&self, key: &K) -> Option<V> {
		self.series.try_get_value(key)
	}

	fn try_find(&self, key: &K, lookup: Lookup) -> Option<(K, V)> {
		self.series.try_find(key, lookup)
	}

	fn is_completed(&self) -> bool {
		self.series.is_completed()
	}

	fn subscribe(&self, target: &Arc<dyn AsyncCompletable>, subscriptions: &mut SubscriptionSet) -> Result<(), SubscribeError> {
		subscriptions.subscribe(self.series.registry(), target).map(drop)
	}
}
