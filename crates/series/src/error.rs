//! Error types for series mutation, replication and async cursors.

use strand_sync::{GateError, SubscribeError};
use thiserror::Error;

use crate::command::SeriesId;

/// Errors returned by [`Series`](crate::Series) mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SeriesError {
	/// The series was completed and no longer accepts mutations.
	#[error("series is completed")]
	Completed,
	/// `add` found the key already present.
	#[error("key already exists")]
	KeyExists,
	/// A key was not in the required position relative to stored or
	/// neighbouring keys.
	#[error("key is out of order")]
	OutOfOrder,
	/// Appended entries overlap stored ones in a way the append option forbids.
	#[error("appended entries overlap existing data")]
	Overlap,
	/// A replicated command was stamped with a version the series already
	/// passed while a write was in flight.
	#[error("command version {version} is behind series version {current}")]
	VersionRegression {
		/// Version carried by the command.
		version: u64,
		/// Version of the series when it was applied.
		current: u64,
	},
	/// A replicated command addressed a different series.
	#[error("command for series {actual} delivered to series {expected}")]
	SeriesMismatch { expected: SeriesId, actual: SeriesId },
}

impl From<GateError> for SeriesError {
	fn from(err: GateError) -> Self {
		match err {
			GateError::ReadOnly => Self::Completed,
		}
	}
}

/// Errors from asynchronous cursor moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CursorError {
	/// The cancellation token fired before data arrived.
	#[error("async move cancelled")]
	Cancelled,
	/// Registering for update notifications failed.
	#[error(transparent)]
	Subscribe(#[from] SubscribeError),
}

/// Result type for series mutations.
pub type Result<T, E = SeriesError> = std::result::Result<T, E>;
