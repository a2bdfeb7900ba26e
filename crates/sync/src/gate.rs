//! Single-writer gate with versioned optimistic reads.
//!
//! Writers call [`WriteGate::begin_write`], mutate, then either
//! [`WriteGuard::publish`] or drop the guard to roll back. `next_version` is
//! bumped on entry and `version` catches up on publish, so
//! `next_version == version` exactly when no write is in flight.
//!
//! Readers go through [`WriteGate::read`]: sample `version`, compute, sample
//! `next_version`, and retry when they differ. After
//! [`WriteGate::complete`] no writer can enter again and reads skip the
//! validation entirely.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::fail_fast;
use crate::spin::SpinWait;

/// Default time a writer may spin before the gate declares a deadlock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(1);
/// Default optimistic attempts before a read falls back to the lock.
pub const DEFAULT_READ_RETRY_LIMIT: u32 = 1024;

/// Errors returned when entering the write path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GateError {
	/// The gate was completed and accepts no more writes.
	#[error("container is read-only")]
	ReadOnly,
}

/// Write lock plus the version counters guarding one container.
#[derive(Debug)]
pub struct WriteGate {
	locked: AtomicBool,
	version: AtomicU64,
	next_version: AtomicU64,
	read_only: AtomicBool,
	synchronized: AtomicBool,
	lock_timeout: Duration,
	read_retry_limit: u32,
}

impl Default for WriteGate {
	fn default() -> Self {
		Self::new(DEFAULT_LOCK_TIMEOUT, DEFAULT_READ_RETRY_LIMIT)
	}
}

impl WriteGate {
	/// Creates an open gate at version 0.
	///
	/// # Panics
	///
	/// Panics if `read_retry_limit` is zero.
	pub fn new(lock_timeout: Duration, read_retry_limit: u32) -> Self {
		assert!(read_retry_limit > 0, "read_retry_limit must be > 0");
		Self {
			locked: AtomicBool::new(false),
			version: AtomicU64::new(0),
			next_version: AtomicU64::new(0),
			read_only: AtomicBool::new(false),
			synchronized: AtomicBool::new(true),
			lock_timeout,
			read_retry_limit,
		}
	}

	/// Last published version.
	#[inline]
	pub fn version(&self) -> u64 {
		self.version.load(Ordering::Acquire)
	}

	/// Version of the write in flight, or `version()` when idle.
	#[inline]
	pub fn next_version(&self) -> u64 {
		self.next_version.load(Ordering::Acquire)
	}

	/// True once [`complete`](Self::complete) ran; writers are refused.
	#[inline]
	pub fn is_read_only(&self) -> bool {
		self.read_only.load(Ordering::Acquire)
	}

	/// False once completed; reads then skip version validation.
	#[inline]
	pub fn is_synchronized(&self) -> bool {
		self.synchronized.load(Ordering::Acquire)
	}

	/// Takes the write lock and opens version `version() + 1`.
	pub fn begin_write(&self) -> Result<WriteGuard<'_>, GateError> {
		if self.is_read_only() {
			return Err(GateError::ReadOnly);
		}
		let held = self.acquire();
		if self.is_read_only() {
			return Err(GateError::ReadOnly);
		}
		let current = self.version.load(Ordering::Acquire);
		self.next_version.store(current + 1, Ordering::Release);
		Ok(WriteGuard {
			held,
			published: false,
		})
	}

	/// Marks the gate read-only. Returns true only for the first call.
	///
	/// Waits for any in-flight writer to finish first.
	pub fn complete(&self) -> bool {
		let _held = self.acquire();
		if self.is_read_only() {
			return false;
		}
		self.next_version.store(self.version.load(Ordering::Acquire), Ordering::Release);
		self.read_only.store(true, Ordering::Release);
		self.synchronized.store(false, Ordering::Release);
		true
	}

	/// Runs `f` until it observes no concurrent write.
	///
	/// `f` may run several times and must not have side effects beyond its
	/// result. After `read_retry_limit` failed attempts the read is repeated
	/// under the write lock.
	pub fn read<T>(&self, mut f: impl FnMut() -> T) -> T {
		if !self.is_synchronized() {
			return f();
		}
		let mut spin = SpinWait::new();
		for _ in 0..self.read_retry_limit {
			let before = self.version.load(Ordering::Acquire);
			let value = f();
			let after = self.next_version.load(Ordering::Acquire);
			if before == after {
				return value;
			}
			spin.spin_once();
		}
		tracing::debug!(limit = self.read_retry_limit, "gate.read.retry_limit");
		self.read_locked(f)
	}

	/// Runs `f` while holding the write lock, without opening a version.
	pub fn read_locked<T>(&self, f: impl FnOnce() -> T) -> T {
		let _held = self.acquire();
		f()
	}

	fn acquire(&self) -> Held<'_> {
		let mut spin = SpinWait::new();
		let mut started: Option<Instant> = None;
		while self
			.locked
			.compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
			.is_err()
		{
			if spin.is_parking() {
				let started = *started.get_or_insert_with(Instant::now);
				if started.elapsed() > self.lock_timeout {
					fail_fast("write lock held past its timeout; a writer is stuck or suspended while holding it");
				}
			}
			spin.spin_once();
		}
		Held { gate: self }
	}
}

/// Releases the raw lock on drop.
#[derive(Debug)]
struct Held<'a> {
	gate: &'a WriteGate,
}

impl Drop for Held<'_> {
	fn drop(&mut self) {
		if !self.gate.locked.swap(false, Ordering::Release) {
			fail_fast("write lock released while not held");
		}
	}
}

/// Exclusive write access to a [`WriteGate`].
///
/// Dropping the guard without [`publish`](Self::publish) rolls
/// `next_version` back, so no-op mutations leave the versions unchanged.
#[derive(Debug)]
#[must_use = "dropping a write guard without publishing rolls the write back"]
pub struct WriteGuard<'a> {
	held: Held<'a>,
	published: bool,
}

impl WriteGuard<'_> {
	/// Version this write will publish.
	pub fn next_version(&self) -> u64 {
		self.held.gate.next_version.load(Ordering::Acquire)
	}

	/// Last published version.
	pub fn version(&self) -> u64 {
		self.held.gate.version.load(Ordering::Acquire)
	}

	/// Publishes the pending version. The lock stays held until drop.
	pub fn publish(&mut self) -> u64 {
		let next = self.next_version();
		self.held.gate.version.store(next, Ordering::Release);
		self.published = true;
		next
	}

	/// Publishes an externally assigned version (replication).
	///
	/// # Panics
	///
	/// Panics if `version` is not after the current version.
	pub fn publish_as(&mut self, version: u64) -> u64 {
		let gate = self.held.gate;
		assert!(
			version > gate.version.load(Ordering::Acquire),
			"published versions must increase"
		);
		gate.next_version.store(version, Ordering::Release);
		gate.version.store(version, Ordering::Release);
		self.published = true;
		version
	}
}

impl Drop for WriteGuard<'_> {
	fn drop(&mut self) {
		if !self.published {
			let gate = self.held.gate;
			gate.next_version.store(gate.version.load(Ordering::Acquire), Ordering::Release);
		}
	}
}
