/// How `append` treats entries that overlap keys already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AppendOption {
	/// The first appended key must be strictly after the last stored key.
	#[default]
	RejectOnOverlap,
	/// Stored entries at or after the first appended key are removed first.
	DropOldOverlap,
	/// Overlapping entries must match the stored ones and are skipped.
	///
	/// Used when replaying commands that may partly duplicate a snapshot.
	IgnoreEqualOverlap,
}
