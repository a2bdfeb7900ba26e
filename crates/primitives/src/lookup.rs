/// Seek direction used when positioning at a key.
///
/// `Eq` only matches the key itself. `Ge`/`Le` accept the key or the nearest
/// neighbour in their direction, `Gt`/`Lt` skip the key and take the nearest
/// neighbour strictly beyond it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lookup {
	/// Exact match only.
	Eq,
	/// Nearest key strictly before.
	Lt,
	/// Exact match or nearest key before.
	Le,
	/// Exact match or nearest key after.
	Ge,
	/// Nearest key strictly after.
	Gt,
}

impl Lookup {
	/// Returns true for directions that search towards smaller keys.
	#[inline]
	pub const fn is_backward(self) -> bool {
		matches!(self, Self::Le | Self::Lt)
	}
}
