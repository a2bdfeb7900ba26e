//! The cursor protocol shared by containers and combinators.

use std::sync::Arc;

use strand_primitives::{CursorState, Lookup};
use strand_sync::{AsyncCompletable, NotifyWaiter, SubscribeError, SubscriptionSet};
use tokio_util::sync::CancellationToken;

use crate::error::CursorError;
use crate::map::Map;
use crate::ops::{ArithOp, CompareOp, Comparison, Negate, Op, Scalar, ScalarOp};
use crate::view::CursorSeries;
use crate::zip::Zip;
use crate::{Fill, Repeat};

/// Positional, cloneable pointer into an ordered key/value sequence.
///
/// A cursor starts [`Uninitialized`](CursorState::Uninitialized) when built
/// from a raw constructor; it then only carries configuration and serves as
/// a factory. [`initialize`](Self::initialize) yields an independent cursor
/// ready for moves. A successful move puts it in
/// [`Moving`](CursorState::Moving), where the `current_*` accessors are valid.
///
/// Cursors are cloned, never shared: moving a clone does not affect the
/// original.
///
/// # Panics
///
/// Every move panics when called on an uninitialized cursor. The `current_*`
/// accessors may panic when the cursor is not positioned.
pub trait Cursor: Clone + Send + Sync {
	type Key: Ord + Clone + Send + Sync;
	type Value: Clone + Send + Sync;

	fn state(&self) -> CursorState;

	/// Returns a fresh, independent cursor in the `Initialized` state.
	fn initialize(&self) -> Self;

	/// Returns to `Initialized`, discarding the position.
	fn reset(&mut self);

	/// Releases the position and returns to `Uninitialized`.
	///
	/// Idempotent. The cursor can still [`initialize`](Self::initialize)
	/// new traversals afterwards.
	fn dispose(&mut self);

	fn move_first(&mut self) -> bool;

	fn move_last(&mut self) -> bool;

	/// Advances one entry; before any positioning this is `move_first`.
	///
	/// Returns false at the end and stays where it was.
	fn move_next(&mut self) -> bool;

	/// Steps back one entry; before any positioning this is `move_last`.
	fn move_previous(&mut self) -> bool;

	/// Positions at the entry nearest to `key` under `lookup`.
	fn move_at(&mut self, key: &Self::Key, lookup: Lookup) -> bool;

	fn current_key(&self) -> &Self::Key;

	/// Computes the value at the current position.
	fn current_value(&self) -> Self::Value;

	fn current(&self) -> (Self::Key, Self::Value) {
		(self.current_key().clone(), self.current_value())
	}

	/// Point lookup that leaves the position untouched.
	fn try_get_value(&self, key: &Self::Key) -> Option<Self::Value>;

	/// Entry nearest to `key` under `lookup`, without moving this cursor.
	fn try_find(&self, key: &Self::Key, lookup: Lookup) -> Option<(Self::Key, Self::Value)> {
		let mut probe = self.initialize();
		probe.move_at(key, lookup).then(|| probe.current())
	}

	/// True if values exist between keys (see [`Repeat`] and [`Fill`]).
	fn is_continuous(&self) -> bool {
		false
	}

	/// True once every source is complete; no further data can arrive.
	fn is_completed(&self) -> bool;

	/// Subscribes `target` to every source container this cursor reads.
	fn subscribe(&self, target: &Arc<dyn AsyncCompletable>, subscriptions: &mut SubscriptionSet) -> Result<(), SubscribeError>;

	/// Waits until [`move_next`](Self::move_next) succeeds.
	///
	/// Resolves `Ok(false)` once every source is complete with no more data,
	/// and `Err(CursorError::Cancelled)` when `cancel` fires first. The
	/// subscriptions made for the wait are dropped before returning; use
	/// [`AsyncCursor`](crate::AsyncCursor) to keep them across calls.
	fn move_next_async<'a>(&'a mut self, cancel: &'a CancellationToken) -> impl Future<Output = Result<bool, CursorError>> + Send + 'a {
		async move {
			let waiter = NotifyWaiter::new();
			let mut subscriptions = SubscriptionSet::new();
			wait_move_next(self, &waiter, &mut subscriptions, cancel).await
		}
	}
}

#[track_caller]
pub(crate) fn assert_initialized(state: CursorState) {
	assert!(state.is_initialized(), "cursor must be initialized before moving");
}

/// Shared wait loop behind every async move.
///
/// A notification is requested before the last synchronous re-check, so a
/// publish landing between the re-check and the wait leaves a stored permit
/// on the waiter instead of being lost.
pub(crate) async fn wait_move_next<C: Cursor>(
	cursor: &mut C,
	waiter: &Arc<NotifyWaiter>,
	subscriptions: &mut SubscriptionSet,
	cancel: &CancellationToken,
) -> Result<bool, CursorError> {
	loop {
		if cancel.is_cancelled() {
			return Err(CursorError::Cancelled);
		}
		if cursor.move_next() {
			return Ok(true);
		}
		if cursor.is_completed() {
			// completion may have raced with a final write
			return Ok(cursor.move_next());
		}
		if subscriptions.is_empty() {
			cursor.subscribe(&waiter.as_target(), subscriptions)?;
		}
		subscriptions.request_notification(1);
		if cursor.move_next() {
			return Ok(true);
		}
		if cursor.is_completed() {
			return Ok(cursor.move_next());
		}
		tokio::select! {
			biased;
			() = cancel.cancelled() => return Err(CursorError::Cancelled),
			() = waiter.notified() => {}
		}
	}
}

/// Combinator constructors available on every [`Cursor`].
pub trait CursorExt: Cursor + Sized {
	/// Maps values with `f(key, value)`; keys pass through.
	fn map<R, F>(self, f: F) -> Map<Self, F, R>
	where
		F: Fn(&Self::Key, Self::Value) -> R + Send + Sync,
		R: Clone + Send + Sync,
	{
		Map::new(self, f)
	}

	/// Maps values only.
	fn map_values<R, F>(self, f: F) -> Map<Self, impl Fn(&Self::Key, Self::Value) -> R + Send + Sync, R>
	where
		F: Fn(Self::Value) -> R + Send + Sync,
		R: Clone + Send + Sync,
	{
		self.map(move |_, value| f(value))
	}

	/// Applies a scalar operation to every value.
	fn op<O: ScalarOp<Self::Value>>(self, op: O) -> Op<Self, O> {
		Op::new(self, op)
	}

	/// Arithmetic against a constant, e.g. `ArithOp::Add` computes `value + operand`.
	fn scalar(self, op: ArithOp, operand: Self::Value) -> Op<Self, Scalar<Self::Value>>
	where
		Scalar<Self::Value>: ScalarOp<Self::Value>,
	{
		Op::new(self, Scalar::new(op, operand))
	}

	fn negate(self) -> Op<Self, Negate>
	where
		Negate: ScalarOp<Self::Value>,
	{
		Op::new(self, Negate)
	}

	/// Compares every value against a constant.
	fn compare(self, op: CompareOp, operand: Self::Value) -> Comparison<Self>
	where
		Self::Value: PartialOrd,
	{
		Op::new(self, crate::ops::Compare::new(op, operand))
	}

	/// Pairs values of both cursors at synchronized keys.
	fn zip<R>(self, other: R) -> Zip<Self, R>
	where
		R: Cursor<Key = Self::Key>,
	{
		Zip::new(self, other)
	}

	/// Zips and combines both values with `f`.
	fn zip_with<R, F, T>(self, other: R, f: F) -> Map<Zip<Self, R>, impl Fn(&Self::Key, (Self::Value, R::Value)) -> T + Send + Sync, T>
	where
		R: Cursor<Key = Self::Key>,
		F: Fn(Self::Value, R::Value) -> T + Send + Sync,
		T: Clone + Send + Sync,
	{
		self.zip(other).map(move |_, (left, right)| f(left, right))
	}

	/// Carries the last value forward across gaps.
	fn repeat(self) -> Repeat<Self> {
		Repeat::new(self)
	}

	/// Substitutes `value` across gaps.
	fn fill(self, value: Self::Value) -> Fill<Self> {
		Fill::new(self, value)
	}

	/// Wraps the cursor as a read-only series view.
	fn into_series(self) -> CursorSeries<Self> {
		CursorSeries::new(self)
	}
}

impl<C: Cursor> CursorExt for C {}
