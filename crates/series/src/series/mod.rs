//! The mutable series container.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::RwLock;
use strand_primitives::{AppendOption, Lookup};
use strand_sync::{UpdateRegistry, WriteGate, WriteGuard};

use crate::config::SeriesConfig;
use crate::error::{Result, SeriesError};
use crate::store::{BTreeStore, OrderedStore};

mod cursor;

pub use cursor::SeriesCursor;


struct Shared<K, V, S> {
	gate: WriteGate,
	store: RwLock<S>,
	registry: Arc<UpdateRegistry>,
	config: SeriesConfig,
	_entries: PhantomData<fn() -> (K, V)>,
}

/// Mutable, ordered key/value series.
///
/// `Series` is a cheap handle; clones share the same data. Writers are
/// serialized through a [`WriteGate`]: every mutation opens a new version,
/// publishes it if something changed, and wakes async readers through the
/// series' [`UpdateRegistry`]. Reads validate against the version pair and
/// retry when they overlap a write.
///
/// [`complete`](Self::complete) freezes the series. Later mutations return
/// [`SeriesError::Completed`] and change nothing.
pub struct Series<K, V, S = BTreeStore<K, V>> {
	shared: Arc<Shared<K, V, S>>,
}

impl<K, V, S> Clone for Series<K, V, S> {
	fn clone(&self) -> Self {
		Self {
			shared: Arc::clone(&self.shared),
		}
	}
}

impl<K, V, S> fmt::Debug for Series<K, V, S> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Series")
			.field("version", &self.shared.gate.version())
			.field("completed", &self.shared.gate.is_read_only())
			.field("subscribers", &self.shared.registry.len())
			.finish_non_exhaustive()
	}
}

impl<K, V, S: Default> Default for Series<K, V, S> {
	fn default() -> Self {
		Self::with_store(S::default(), SeriesConfig::default())
	}
}

impl<K: Ord, V> Series<K, V> {
	/// Empty series backed by a [`BTreeStore`] with default config.
	pub fn new() -> Self {
		Self::default()
	}

	/// Empty series with the given config.
	pub fn with_config(config: SeriesConfig) -> Self {
		Self::with_store(BTreeStore::new(), config)
	}
}

impl<K: Ord, V> FromIterator<(K, V)> for Series<K, V> {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self::with_store(iter.into_iter().collect(), SeriesConfig::default())
	}
}

impl<K, V, S> Series<K, V, S> {
	/// Wraps existing storage.
	pub fn with_store(store: S, config: SeriesConfig) -> Self {
		Self {
			shared: Arc::new(Shared {
				gate: WriteGate::new(config.lock_timeout, config.read_retry_limit),
				store: RwLock::new(store),
				registry: UpdateRegistry::new(),
				config,
				_entries: PhantomData,
			}),
		}
	}

	/// Last published version.
	pub fn version(&self) -> u64 {
		self.shared.gate.version()
	}

	/// Version of the write in flight; equals [`version`](Self::version) when idle.
	pub fn next_version(&self) -> u64 {
		self.shared.gate.next_version()
	}

	/// True once [`complete`](Self::complete) ran.
	pub fn is_completed(&self) -> bool {
		self.shared.gate.is_read_only()
	}

	/// False once completed; reads no longer validate versions.
	pub fn is_synchronized(&self) -> bool {
		self.shared.gate.is_synchronized()
	}

	/// Configuration the series was built with.
	pub fn config(&self) -> &SeriesConfig {
		&self.shared.config
	}

	/// Registry woken after every publish.
	pub(crate) fn registry(&self) -> &Arc<UpdateRegistry> {
		&self.shared.registry
	}

	/// Number of live async subscriptions on this series.
	pub fn subscribers(&self) -> usize {
		self.shared.registry.len()
	}

	/// Returns true if both handles point at the same series.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.shared, &other.shared)
	}

	/// Marks the series complete and wakes every waiter.
	///
	/// Returns true only for the call that completed it; later calls have no
	/// effect.
	pub fn complete(&self) -> bool {
		if !self.shared.gate.complete() {
			return false;
		}
		tracing::debug!(version = self.version(), "series.complete");
		self.shared.registry.notify_update(true);
		true
	}
}

impl<K, V, S> Series<K, V, S>
where
	K: Ord + Clone + Send + Sync,
	V: Clone + Send + Sync,
	S: OrderedStore<K, V>,
{
	/// Runs `f` against the storage as a validated optimistic read.
	pub(crate) fn read<T>(&self, mut f: impl FnMut(&S) -> T) -> T {
		self.shared.gate.read(|| f(&self.shared.store.read()))
	}

	/// Runs one mutation under the write gate.
	///
	/// `f` returns its output and whether it changed the data; unchanged
	/// writes roll the version back. Errors must be raised before `f`
	/// touches the storage.
	fn write<T>(&self, f: impl FnOnce(&mut S) -> Result<(T, bool)>) -> Result<T> {
		let mut guard = self.shared.gate.begin_write()?;
		let (output, changed) = f(&mut self.shared.store.write())?;
		if changed {
			self.publish(&mut guard, None);
		}
		Ok(output)
	}

	/// Like [`write`](Self::write) but publishes `version` unconditionally.
	pub(crate) fn write_versioned<T>(&self, version: u64, f: impl FnOnce(&mut S) -> Result<T>) -> Result<T> {
		let mut guard = self.shared.gate.begin_write()?;
		let current = guard.version();
		if version <= current {
			return Err(SeriesError::VersionRegression { version, current });
		}
		let output = f(&mut self.shared.store.write())?;
		self.publish(&mut guard, Some(version));
		Ok(output)
	}

	fn publish(&self, guard: &mut WriteGuard<'_>, version: Option<u64>) {
		let version = match version {
			Some(version) => guard.publish_as(version),
			None => guard.publish(),
		};
		tracing::trace!(version, "series.publish");
		self.shared.registry.notify_update(false);
	}

	/// Number of stored entries.
	pub fn len(&self) -> usize {
		self.read(|store| store.len())
	}

	/// True if the series holds no entries.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Entry with the smallest key.
	pub fn first(&self) -> Option<(K, V)> {
		self.read(|store| cloned(store.first()))
	}

	/// Entry with the largest key.
	pub fn last(&self) -> Option<(K, V)> {
		self.read(|store| cloned(store.last()))
	}

	/// Value stored at exactly `key`.
	pub fn try_get_value(&self, key: &K) -> Option<V> {
		self.read(|store| store.get(key).cloned())
	}

	/// Entry found from `key` in the direction of `lookup`.
	pub fn try_find(&self, key: &K, lookup: Lookup) -> Option<(K, V)> {
		self.read(|store| cloned(store.find(key, lookup)))
	}

	/// Consistent copy of every entry.
	///
	/// The storage lock is released between chunks of
	/// [`snapshot_chunk`](SeriesConfig::snapshot_chunk) entries; a write
	/// landing in between restarts the copy.
	pub fn snapshot(&self) -> Vec<(K, V)> {
		let chunk = self.shared.config.snapshot_chunk;
		self.shared.gate.read(|| {
			let mut entries = Vec::new();
			loop {
				let page = self.shared.store.read().range_after(entries.last().map(|(k, _)| k), chunk);
				let done = page.len() < chunk;
				entries.extend(page);
				if done {
					return entries;
				}
			}
		})
	}

	/// Cursor ready for traversal.
	pub fn cursor(&self) -> SeriesCursor<K, V, S> {
		SeriesCursor::initialized(self.clone())
	}

	/// Cursor that must be [`initialize`](crate::Cursor::initialize)d before use.
	pub fn raw_cursor(&self) -> SeriesCursor<K, V, S> {
		SeriesCursor::new(self.clone())
	}

	/// Inserts or replaces the value at `key`.
	pub fn set(&self, key: K, value: V) -> Result<Option<V>> {
		self.write(|store| Ok((store.insert(key, value), true)))
	}

	/// Inserts a new key; fails with [`SeriesError::KeyExists`] if present.
	pub fn add(&self, key: K, value: V) -> Result<()> {
		self.write(|store| {
			if store.get(&key).is_some() {
				return Err(SeriesError::KeyExists);
			}
			store.insert(key, value);
			Ok(((), true))
		})
	}

	/// Inserts a new key. Returns false, without publishing, if present.
	pub fn try_add(&self, key: K, value: V) -> Result<bool> {
		self.write(|store| {
			if store.get(&key).is_some() {
				return Ok((false, false));
			}
			store.insert(key, value);
			Ok((true, true))
		})
	}

	/// Inserts before every stored key.
	pub fn add_first(&self, key: K, value: V) -> Result<()> {
		self.write(|store| {
			if store.first().is_some_and(|(first, _)| key >= *first) {
				return Err(SeriesError::OutOfOrder);
			}
			store.insert(key, value);
			Ok(((), true))
		})
	}

	/// Inserts after every stored key.
	pub fn add_last(&self, key: K, value: V) -> Result<()> {
		self.write(|store| {
			if store.last().is_some_and(|(last, _)| key <= *last) {
				return Err(SeriesError::OutOfOrder);
			}
			store.insert(key, value);
			Ok(((), true))
		})
	}

	/// Removes `key`, returning its value.
	pub fn remove(&self, key: &K) -> Result<Option<V>> {
		self.write(|store| {
			let removed = store.remove(key);
			let changed = removed.is_some();
			Ok((removed, changed))
		})
	}

	/// Removes every key admitted by `lookup`, returning how many went.
	pub fn remove_many(&self, key: &K, lookup: Lookup) -> Result<usize> {
		self.write(|store| {
			let removed = store.remove_many(key, lookup);
			Ok((removed, removed > 0))
		})
	}

	/// Appends strictly increasing `entries` according to `option`.
	///
	/// Returns the number of inserted entries. Fails with
	/// [`SeriesError::OutOfOrder`] if `entries` are not strictly increasing
	/// and with [`SeriesError::Overlap`] if they conflict with stored data
	/// under `option`; nothing is written in either case.
	pub fn append(&self, entries: impl IntoIterator<Item = (K, V)>, option: AppendOption) -> Result<usize>
	where
		V: PartialEq,
	{
		let entries: Vec<(K, V)> = entries.into_iter().collect();
		if entries.windows(2).any(|pair| pair[0].0 >= pair[1].0) {
			return Err(SeriesError::OutOfOrder);
		}
		self.write(|store| append_sorted(store, entries, option))
	}
}

fn cloned<K: Clone, V: Clone>(entry: Option<(&K, &V)>) -> Option<(K, V)> {
	entry.map(|(k, v)| (k.clone(), v.clone()))
}

/// Validates then applies an append of sorted entries.
pub(crate) fn append_sorted<K, V, S>(store: &mut S, entries: Vec<(K, V)>, option: AppendOption) -> Result<(usize, bool)>
where
	K: Ord,
	V: PartialEq,
	S: OrderedStore<K, V>,
{
	let Some((first_key, _)) = entries.first() else {
		return Ok((0, false));
	};
	let overlaps = |store: &S, key: &K| store.last().is_some_and(|(last, _)| key <= last);
	let mut dropped = 0;
	let fresh: Vec<(K, V)> = match option {
		AppendOption::RejectOnOverlap => {
			if overlaps(&*store, first_key) {
				return Err(SeriesError::Overlap);
			}
			entries
		}
		AppendOption::IgnoreEqualOverlap => {
			for (key, value) in entries.iter().take_while(|(key, _)| overlaps(&*store, key)) {
				if store.get(key) != Some(value) {
					return Err(SeriesError::Overlap);
				}
			}
			entries.into_iter().skip_while(|(key, _)| overlaps(&*store, key)).collect()
		}
		AppendOption::DropOldOverlap => {
			dropped = store.remove_many(first_key, Lookup::Ge);
			entries
		}
	};
	let inserted = fresh.len();
	for (key, value) in fresh {
		store.insert(key, value);
	}
	Ok((inserted, inserted + dropped > 0))
}
