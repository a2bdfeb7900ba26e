/// Lifecycle of a cursor.
///
/// Ordered so that `state < CursorState::Moving` reads as "not positioned yet".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum CursorState {
	/// Holds only configuration; must be initialized before moving.
	#[default]
	Uninitialized,
	/// Ready for traversal but not positioned.
	Initialized,
	/// Positioned after a successful move.
	Moving,
}

impl CursorState {
	/// Returns true once the cursor may be moved.
	#[inline]
	pub const fn is_initialized(self) -> bool {
		!matches!(self, Self::Uninitialized)
	}

	/// Returns true while `current_*` accessors are valid.
	#[inline]
	pub const fn is_moving(self) -> bool {
		matches!(self, Self::Moving)
	}
}
