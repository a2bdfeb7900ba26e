//! Key-synchronized pairing of two cursors.
//!
//! Zip walks the union of both sides' keys in order and emits a key when
//! both sides resolve a value there. A side resolves a key when it holds
//! that key, or, for continuous sides ([`Repeat`](crate::Repeat),
//! [`Fill`](crate::Fill)), when its point lookup answers. Two discrete sides
//! therefore intersect, while continuous sides carry or fill the gaps.

use std::fmt;
use std::sync::Arc;

use strand_primitives::{CursorState, Lookup};
use strand_sync::{AsyncCompletable, SubscribeError, SubscriptionSet};

use crate::cursor::{Cursor, assert_initialized};

enum Start<'k, K> {
	First,
	Last,
	At(&'k K, Lookup),
}

/// Pairs the values of two cursors at synchronized keys.
///
/// The resolved pair is captured when the zip moves; both inner cursors are
/// only advanced on clones and committed once a common key is found, so a
/// failed move leaves the zip where it was.
pub struct Zip<L, R>
where
	L: Cursor,
	R: Cursor<Key = L::Key>,
{
	left: L,
	right: R,
	state: CursorState,
	current: Option<(L::Key, (L::Value, R::Value))>,
}

impl<L, R> Clone for Zip<L, R>
where
	L: Cursor,
	R: Cursor<Key = L::Key>,
{
	fn clone(&self) -> Self {
		Self {
			left: self.left.clone(),
			right: self.right.clone(),
			state: self.state,
			current: self.current.clone(),
		}
	}
}

impl<L, R> fmt::Debug for Zip<L, R>
where
	L: Cursor + fmt::Debug,
	R: Cursor<Key = L::Key> + fmt::Debug,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Zip")
			.field("left", &self.left)
			.field("right", &self.right)
			.field("state", &self.state)
			.finish_non_exhaustive()
	}
}

impl<L, R> Zip<L, R>
where
	L: Cursor,
	R: Cursor<Key = L::Key>,
{
	/// Zips two cursors. The zip is initialized only if both sides are.
	pub fn new(left: L, right: R) -> Self {
		let state = if left.state().is_initialized() && right.state().is_initialized() {
			CursorState::Initialized
		} else {
			CursorState::Uninitialized
		};
		Self {
			left,
			right,
			state,
			current: None,
		}
	}

	/// Left side of the zip.
	pub fn left(&self) -> &L {
		&self.left
	}

	/// Right side of the zip.
	pub fn right(&self) -> &R {
		&self.right
	}

	fn positioned_key(&self) -> Option<L::Key> {
		self.current.as_ref().filter(|_| self.state.is_moving()).map(|(key, _)| key.clone())
	}

	fn seek(&mut self, start: Start<'_, L::Key>) -> bool {
		assert_initialized(self.state);
		let forward = match start {
			Start::First => true,
			Start::Last => false,
			Start::At(_, lookup) => !lookup.is_backward(),
		};
		let exact = matches!(start, Start::At(_, Lookup::Eq));

		let mut left = self.left.clone();
		let mut right = self.right.clone();
		let (mut left_ok, mut right_ok) = match start {
			Start::First => (left.move_first(), right.move_first()),
			Start::Last => (left.move_last(), right.move_last()),
			Start::At(key, lookup) => (left.move_at(key, lookup), right.move_at(key, lookup)),
		};

		loop {
			let candidate = match (left_ok, right_ok) {
				(true, true) => {
					let (l, r) = (left.current_key(), right.current_key());
					let take_left = if forward { l <= r } else { l >= r };
					if take_left { l.clone() } else { r.clone() }
				}
				(true, false) if right.is_continuous() => left.current_key().clone(),
				(false, true) if left.is_continuous() => right.current_key().clone(),
				_ => return false,
			};

			let left_at = left_ok && *left.current_key() == candidate;
			let right_at = right_ok && *right.current_key() == candidate;
			if let (Some(lv), Some(rv)) = (resolve(&left, left_at, &candidate), resolve(&right, right_at, &candidate)) {
				self.left = left;
				self.right = right;
				self.current = Some((candidate, (lv, rv)));
				self.state = CursorState::Moving;
				return true;
			}
			if exact {
				return false;
			}
			if left_at {
				left_ok = step(&mut left, forward);
			}
			if right_at {
				right_ok = step(&mut right, forward);
			}
		}
	}
}

fn resolve<C: Cursor>(side: &C, at_key: bool, key: &C::Key) -> Option<C::Value> {
	if at_key {
		Some(side.current_value())
	} else if side.is_continuous() {
		side.try_get_value(key)
	} else {
		None
	}
}

fn step<C: Cursor>(side: &mut C, forward: bool) -> bool {
	if forward { side.move_next() } else { side.move_previous() }
}

impl<L, R> Cursor for Zip<L, R>
where
	L: Cursor,
	R: Cursor<Key = L::Key>,
{
	type Key = L::Key;
	type Value = (L::Value, R::Value);

	fn state(&self) -> CursorState {
		self.state
	}

	fn initialize(&self) -> Self {
		Self {
			left: self.left.initialize(),
			right: self.right.initialize(),
			state: CursorState::Initialized,
			current: None,
		}
	}

	fn reset(&mut self) {
		self.left.reset();
		self.right.reset();
		if self.state.is_initialized() {
			self.state = CursorState::Initialized;
		}
		self.current = None;
	}

	fn dispose(&mut self) {
		self.left.dispose();
		self.right.dispose();
		self.state = CursorState::Uninitialized;
		self.current = None;
	}

	fn move_first(&mut self) -> bool {
		self.seek(Start::First)
	}

	fn move_last(&mut self) -> bool {
		self.seek(Start::Last)
	}

	fn move_next(&mut self) -> bool {
		assert_initialized(self.state);
		match self.positioned_key() {
			Some(key) => self.seek(Start::At(&key, Lookup::Gt)),
			None => self.move_first(),
		}
	}

	fn move_previous(&mut self) -> bool {
		assert_initialized(self.state);
		match self.positioned_key() {
			Some(key) => self.seek(Start::At(&key, Lookup::Lt)),
			None => self.move_last(),
		}
	}

	fn move_at(&mut self, key: &Self::Key, lookup: Lookup) -> bool {
		self.seek(Start::At(key, lookup))
	}

	fn current_key(&self) -> &Self::Key {
		match &self.current {
			Some((key, _)) => key,
			None => panic!("cursor is not positioned"),
		}
	}

	fn current_value(&self) -> Self::Value {
		match &self.current {
			Some((_, pair)) => pair.clone(),
			None => panic!("cursor is not positioned"),
		}
	}

	/// Resolves both sides with their own point lookups, so a zip of two
	/// continuous sides answers for any key.
	fn try_get_value(&self, key: &Self::Key) -> Option<Self::Value> {
		let left = self.left.try_get_value(key)?;
		let right = self.right.try_get_value(key)?;
		Some((left, right))
	}

	fn is_continuous(&self) -> bool {
		self.left.is_continuous() && self.right.is_continuous()
	}

	/// Complete only when both sides are, since either may still produce a key.
	fn is_completed(&self) -> bool {
		self.left.is_completed() && self.right.is_completed()
	}

	fn subscribe(&self, target: &Arc<dyn AsyncCompletable>, subscriptions: &mut SubscriptionSet) -> Result<(), SubscribeError> {
		self.left.subscribe(target, subscriptions)?;
		self.right.subscribe(target, subscriptions)
	}
}
