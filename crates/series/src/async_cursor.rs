use std::sync::Arc;

use strand_primitives::CursorState;
use strand_sync::{NotifyWaiter, SubscriptionSet};
use tokio_util::sync::CancellationToken;

use crate::cursor::{Cursor, wait_move_next};
use crate::error::CursorError;

/// Cursor that can wait for data.
///
/// Keeps its waiter and subscriptions across calls, so a consumer looping
/// on [`move_next`](Self::move_next) subscribes to its sources once.
/// A wait that ends without data (cancelled, finished or failed) drops the
/// subscriptions; they are re-established by the next call.
#[derive(Debug)]
pub struct AsyncCursor<C> {
	cursor: C,
	waiter: Arc<NotifyWaiter>,
	subscriptions: SubscriptionSet,
}

impl<C: Cursor> AsyncCursor<C> {
	/// Wraps `cursor`, initializing it if needed.
	pub fn new(cursor: C) -> Self {
		let cursor = if cursor.state() == CursorState::Uninitialized {
			cursor.initialize()
		} else {
			cursor
		};
		Self {
			cursor,
			waiter: NotifyWaiter::new(),
			subscriptions: SubscriptionSet::new(),
		}
	}

	/// Advances, waiting for new data when the sources are exhausted.
	///
	/// Resolves `Ok(false)` once every source is complete and no further
	/// entry exists.
	pub async fn move_next(&mut self, cancel: &CancellationToken) -> Result<bool, CursorError> {
		let moved = wait_move_next(&mut self.cursor, &self.waiter, &mut self.subscriptions, cancel).await;
		if !matches!(moved, Ok(true)) {
			self.subscriptions.clear();
		}
		moved
	}

	/// Synchronous move that never waits.
	pub fn try_move_next(&mut self) -> bool {
		self.cursor.move_next()
	}

	/// Current entry of the wrapped cursor.
	pub fn current(&self) -> (C::Key, C::Value) {
		self.cursor.current()
	}

	/// The wrapped cursor.
	pub fn cursor(&self) -> &C {
		&self.cursor
	}

	/// Mutable access to the wrapped cursor, e.g. to reposition it.
	pub fn cursor_mut(&mut self) -> &mut C {
		&mut self.cursor
	}

	/// Number of registries currently watched.
	pub fn subscriptions(&self) -> usize {
		self.subscriptions.len()
	}

	/// Unwraps the cursor, dropping any subscriptions.
	pub fn into_inner(self) -> C {
		self.cursor
	}
}
