use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use strand_primitives::{CursorState, Lookup};
use strand_sync::{AsyncCompletable, SubscribeError, SubscriptionSet};

use crate::cursor::Cursor;

/// Cursor whose values are `f(key, value)` of its inner cursor.
///
/// The selector runs on every value access; nothing is cached.
pub struct Map<C, F, R> {
	inner: C,
	f: Arc<F>,
	_output: PhantomData<fn() -> R>,
}

impl<C, F, R> Map<C, F, R> {
	/// Maps `inner` through `f`.
	pub fn new(inner: C, f: F) -> Self {
		Self {
			inner,
			f: Arc::new(f),
			_output: PhantomData,
		}
	}

	/// The mapped cursor.
	pub fn inner(&self) -> &C {
		&self.inner
	}
}

impl<C: Clone, F, R> Clone for Map<C, F, R> {
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
			f: Arc::clone(&self.f),
			_output: PhantomData,
		}
	}
}

impl<C: fmt::Debug, F, R> fmt::Debug for Map<C, F, R> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Map").field("inner", &self.inner).finish_non_exhaustive()
	}
}

impl<C, F, R> Cursor for Map<C, F, R>
where
	C: Cursor,
	F: Fn(&C::Key, C::Value) -> R + Send + Sync,
	R: Clone + Send + Sync,
{
	type Key = C::Key;
	type Value = R;

	fn state(&self) -> CursorState {
		self.inner.state()
	}

	fn initialize(&self) -> Self {
		Self {
			inner: self.inner.initialize(),
			f: Arc::clone(&self.f),
			_output: PhantomData,
		}
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

	fn current_value(&self) -> R {
		(self.f)(self.inner.current_key(), self.inner.current_value())
	}

	fn try_get_value(&self, key: &Self::Key) -> Option<R> {
		self.inner.try_get_value(key).map(|value| (self.f)(key, value))
	}

	fn try_find(&self, key: &Self::Key, lookup: Lookup) -> Option<(Self::Key, R)> {
		self.inner.try_find(key, lookup).map(|(k, value)| {
			let mapped = (self.f)(&k, value);
			(k, mapped)
		})
	}

	fn is_continuous(&self) -> bool {
		self.inner.is_continuous()
	}

	fn is_completed(&self) -> bool {
		self.inner.is_completed()
	}

	fn subscribe(&self, target: &Arc<dyn AsyncCompletable>, subscriptions: &mut SubscriptionSet) -> Result<(), SubscribeError> {
		self.inner.subscribe(target, subscriptions)
	}
}
