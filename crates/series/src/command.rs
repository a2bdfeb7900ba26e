//! Replication interfaces: versioned mutation commands and their consumers.
//!
//! A producer stamps every mutation of a series with the version it
//! published. Consumers apply commands with that exact version and skip
//! anything at or below their own, which makes redelivery harmless.

use std::fmt;

use parking_lot::Mutex;
use strand_primitives::{AppendOption, Lookup};

use crate::error::{Result, SeriesError};
use crate::series::{Series, append_sorted};
use crate::store::OrderedStore;

/// Identifier a replication stream uses to address a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesId(pub u64);

impl fmt::Display for SeriesId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// A mutation as shipped between nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesCommand<K, V> {
	Set { key: K, value: V },
	Append { entries: Vec<(K, V)>, option: AppendOption },
	Remove { key: K, lookup: Lookup },
	Complete,
}

/// A [`SeriesCommand`] addressed to a series and stamped with its version.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedCommand<K, V> {
	pub series: SeriesId,
	pub version: u64,
	pub command: SeriesCommand<K, V>,
}

/// What a consumer did with a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
	/// Applied and published at this version.
	Applied(u64),
	/// Already seen; nothing changed.
	Skipped,
	/// Queued until the running snapshot load finishes.
	Buffered,
	/// The series was completed by this command.
	Completed,
}

/// Anything that accepts replicated commands.
pub trait CommandConsumer<K, V> {
	fn apply_command(&self, command: VersionedCommand<K, V>) -> Result<CommandOutcome>;
}

/// Applies commands directly. Routing by [`SeriesId`] is the caller's job.
impl<K, V, S> CommandConsumer<K, V> for Series<K, V, S>
where
	K: Ord + Clone + Send + Sync,
	V: Clone + PartialEq + Send + Sync,
	S: OrderedStore<K, V>,
{
	fn apply_command(&self, command: VersionedCommand<K, V>) -> Result<CommandOutcome> {
		let VersionedCommand { series, version, command } = command;
		let current = self.version();
		if version <= current && !matches!(command, SeriesCommand::Complete) {
			tracing::debug!(%series, version, current, "series.command.skip");
			return Ok(CommandOutcome::Skipped);
		}
		if version > current + 1 {
			tracing::warn!(%series, version, current, "series.command.gap");
		}
		match command {
			SeriesCommand::Set { key, value } => self.write_versioned(version, |store| {
				store.insert(key, value);
				Ok(())
			})?,
			SeriesCommand::Append { entries, option } => {
				if entries.windows(2).any(|pair| pair[0].0 >= pair[1].0) {
					return Err(SeriesError::OutOfOrder);
				}
				self.write_versioned(version, |store| append_sorted(store, entries, option).map(drop))?
			}
			SeriesCommand::Remove { key, lookup } => self.write_versioned(version, |store| {
				store.remove_many(&key, lookup);
				Ok(())
			})?,
			SeriesCommand::Complete => {
				return Ok(if self.complete() {
					CommandOutcome::Completed
				} else {
					CommandOutcome::Skipped
				});
			}
		}
		Ok(CommandOutcome::Applied(version))
	}
}

/// Buffers commands for one series while its initial load is running.
///
/// During the load, snapshot and live commands may arrive interleaved and
/// out of order; all of them are queued. [`finish_load`](Self::finish_load)
/// is the completion marker: the queue is replayed in version order, with
/// appends relaxed to [`AppendOption::IgnoreEqualOverlap`] since live
/// appends may repeat entries the snapshot already carried. Afterwards
/// commands pass straight through to the target.
pub struct LoadBuffer<K, V, C> {
	id: SeriesId,
	target: C,
	pending: Mutex<Option<Vec<VersionedCommand<K, V>>>>,
}

impl<K, V, C> fmt::Debug for LoadBuffer<K, V, C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LoadBuffer")
			.field("id", &self.id)
			.field("pending", &self.pending.lock().as_ref().map(Vec::len))
			.finish_non_exhaustive()
	}
}

impl<K, V, C: CommandConsumer<K, V>> LoadBuffer<K, V, C> {
	/// Starts in the loading state.
	pub fn new(id: SeriesId, target: C) -> Self {
		Self {
			id,
			target,
			pending: Mutex::new(Some(Vec::new())),
		}
	}

	/// Series this buffer accepts commands for.
	pub fn id(&self) -> SeriesId {
		self.id
	}

	/// The consumer commands are forwarded to.
	pub fn target(&self) -> &C {
		&self.target
	}

	/// True until [`finish_load`](Self::finish_load) runs.
	pub fn is_loading(&self) -> bool {
		self.pending.lock().is_some()
	}

	/// Ends the load and replays the queue. Returns how many commands were
	/// applied (skipped duplicates are not counted).
	///
	/// Stops at the first failing command; the rest of the queue is dropped
	/// and the buffer is live either way.
	pub fn finish_load(&self) -> Result<usize> {
		let mut pending = self.pending.lock();
		let Some(mut queued) = pending.take() else {
			return Ok(0);
		};
		queued.sort_by_key(|command| command.version);
		let mut applied = 0;
		for mut command in queued {
			if let SeriesCommand::Append { option, .. } = &mut command.command {
				*option = AppendOption::IgnoreEqualOverlap;
			}
			match self.target.apply_command(command)? {
				CommandOutcome::Applied(_) | CommandOutcome::Completed => applied += 1,
				CommandOutcome::Skipped | CommandOutcome::Buffered => {}
			}
		}
		Ok(applied)
	}
}

impl<K, V, C: CommandConsumer<K, V>> CommandConsumer<K, V> for LoadBuffer<K, V, C> {
	fn apply_command(&self, command: VersionedCommand<K, V>) -> Result<CommandOutcome> {
		if command.series != self.id {
			return Err(SeriesError::SeriesMismatch {
				expected: self.id,
				actual: command.series,
			});
		}
		let mut pending = self.pending.lock();
		match pending.as_mut() {
			Some(queue) => {
				queue.push(command);
				Ok(CommandOutcome::Buffered)
			}
			None => self.target.apply_command(command),
		}
	}
}
