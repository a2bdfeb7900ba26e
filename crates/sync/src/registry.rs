//! Lock-free registry of asynchronous waiters.
//!
//! The registry slot is `None`, a single record, or a set of records. The
//! first two transitions are published with compare-and-swap; once a set is
//! installed it stays installed and membership changes take only the set's
//! own lock. An empty set behaves exactly like `None`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use smallvec::SmallVec;
use thiserror::Error;

use crate::fail_fast;

/// Something an update can try to complete.
///
/// The registry only ever calls [`try_complete`](Self::try_complete); it
/// never inspects the target.
pub trait AsyncCompletable: Send + Sync {
	/// Attempts to make progress now. `force` is set for completion-driven
	/// attempts that must be delivered even without a pending request.
	fn try_complete(&self, force: bool) -> bool;
}

/// Errors from [`UpdateRegistry::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubscribeError {
	/// The target already holds a live subscription on this registry.
	#[error("target is already subscribed to this registry")]
	AlreadySubscribed,
}

struct Record {
	target: Arc<dyn AsyncCompletable>,
	requests: AtomicU64,
	live: AtomicBool,
}

impl Record {
	fn is_live(&self) -> bool {
		self.live.load(Ordering::Acquire)
	}

	fn same_target(&self, target: &Arc<dyn AsyncCompletable>) -> bool {
		std::ptr::addr_eq(Arc::as_ptr(&self.target), Arc::as_ptr(target))
	}

	/// Consumes one pending request, or passes unconditionally when forced.
	fn take_request(&self, force: bool) -> bool {
		if !self.is_live() {
			return false;
		}
		let took = self
			.requests
			.fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
			.is_ok();
		took || force
	}
}

enum Slot {
	Single(Arc<Record>),
	Many(Mutex<Vec<Arc<Record>>>),
}

fn same_slot(a: &Option<Arc<Slot>>, b: &Option<Arc<Slot>>) -> bool {
	match (a, b) {
		(None, None) => true,
		(Some(a), Some(b)) => Arc::ptr_eq(a, b),
		_ => false,
	}
}

/// Per-container registry of waiters to wake after each publish.
#[derive(Default)]
pub struct UpdateRegistry {
	slot: ArcSwapOption<Slot>,
}

impl std::fmt::Debug for UpdateRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("UpdateRegistry").field("subscribers", &self.len()).finish()
	}
}

impl UpdateRegistry {
	/// Registry with no subscribers.
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	/// Registers `target` and returns the guard that keeps it registered.
	///
	/// Subscribing the same target twice while the first subscription is
	/// alive fails with [`SubscribeError::AlreadySubscribed`] and leaves the
	/// existing subscribers untouched.
	pub fn subscribe(self: &Arc<Self>, target: Arc<dyn AsyncCompletable>) -> Result<Subscription, SubscribeError> {
		let record = Arc::new(Record {
			target,
			requests: AtomicU64::new(0),
			live: AtomicBool::new(true),
		});
		loop {
			let current = self.slot.load_full();
			let next = match current.as_deref() {
				None => Slot::Single(Arc::clone(&record)),
				Some(Slot::Single(existing)) => {
					if existing.is_live() && existing.same_target(&record.target) {
						tracing::warn!("registry.subscribe.duplicate");
						return Err(SubscribeError::AlreadySubscribed);
					}
					let mut records = Vec::with_capacity(2);
					if existing.is_live() {
						records.push(Arc::clone(existing));
					}
					records.push(Arc::clone(&record));
					Slot::Many(Mutex::new(records))
				}
				Some(Slot::Many(set)) => {
					let mut set = set.lock();
					if set.iter().any(|r| r.is_live() && r.same_target(&record.target)) {
						tracing::warn!("registry.subscribe.duplicate");
						return Err(SubscribeError::AlreadySubscribed);
					}
					set.push(Arc::clone(&record));
					break;
				}
			};
			let prev = self.slot.compare_and_swap(&current, Some(Arc::new(next)));
			if same_slot(&prev, &current) {
				break;
			}
		}
		Ok(Subscription {
			registry: Arc::downgrade(self),
			record,
		})
	}

	fn unsubscribe(&self, record: &Arc<Record>) {
		loop {
			let current = self.slot.load_full();
			match current.as_deref() {
				None => return,
				Some(Slot::Single(existing)) => {
					if !Arc::ptr_eq(existing, record) {
						return;
					}
					let prev = self.slot.compare_and_swap(&current, None::<Arc<Slot>>);
					if same_slot(&prev, &current) {
						return;
					}
				}
				Some(Slot::Many(set)) => {
					set.lock().retain(|r| !Arc::ptr_eq(r, record));
					return;
				}
			}
		}
	}

	/// Asks every interested subscriber to try completing.
	///
	/// Subscribers without a pending request are skipped unless `force` is
	/// set. Targets are invoked outside the set lock. Returns the number of
	/// targets invoked.
	pub fn notify_update(&self, force: bool) -> usize {
		let Some(slot) = self.slot.load_full() else {
			return 0;
		};
		let mut targets: SmallVec<[Arc<dyn AsyncCompletable>; 4]> = SmallVec::new();
		match &*slot {
			Slot::Single(record) => {
				if record.take_request(force) {
					targets.push(Arc::clone(&record.target));
				}
			}
			Slot::Many(set) => {
				for record in set.lock().iter() {
					if record.take_request(force) {
						targets.push(Arc::clone(&record.target));
					}
				}
			}
		}
		let woken = targets.len();
		for target in targets {
			target.try_complete(force);
		}
		tracing::trace!(woken, force, "registry.notify");
		woken
	}

	/// Number of live subscriptions.
	pub fn len(&self) -> usize {
		match self.slot.load().as_deref() {
			None => 0,
			Some(Slot::Single(record)) => usize::from(record.is_live()),
			Some(Slot::Many(set)) => set.lock().iter().filter(|r| r.is_live()).count(),
		}
	}

	/// True when no live subscription remains.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Keeps a target registered until dropped.
#[must_use = "dropping a subscription unregisters it"]
pub struct Subscription {
	registry: Weak<UpdateRegistry>,
	record: Arc<Record>,
}

impl std::fmt::Debug for Subscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Subscription")
			.field("requests", &self.requests())
			.finish_non_exhaustive()
	}
}

impl Subscription {
	/// Asks for `n` more notifications.
	pub fn request_notification(&self, n: u32) {
		let n = u64::from(n);
		let previous = self.record.requests.fetch_add(n, Ordering::AcqRel);
		if previous.checked_add(n).is_none() {
			fail_fast("subscription request counter overflowed");
		}
	}

	/// Pending notification requests.
	pub fn requests(&self) -> u64 {
		self.record.requests.load(Ordering::Acquire)
	}

	/// Returns true if this subscription lives on `registry`.
	pub fn is_on(&self, registry: &Arc<UpdateRegistry>) -> bool {
		std::ptr::eq(self.registry.as_ptr(), Arc::as_ptr(registry))
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		self.record.requests.store(0, Ordering::Release);
		self.record.live.store(false, Ordering::Release);
		if let Some(registry) = self.registry.upgrade() {
			registry.unsubscribe(&self.record);
		}
	}
}

/// Subscriptions of one waiter across every registry it depends on.
///
/// A composite cursor can reach the same container through several paths;
/// the set subscribes each registry once.
#[derive(Debug, Default)]
pub struct SubscriptionSet {
	subscriptions: Vec<Subscription>,
}

impl SubscriptionSet {
	/// Empty set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Subscribes `target` to `registry` unless this set already did.
	///
	/// Returns false when the registry was already covered.
	pub fn subscribe(&mut self, registry: &Arc<UpdateRegistry>, target: &Arc<dyn AsyncCompletable>) -> Result<bool, SubscribeError> {
		if self.subscriptions.iter().any(|s| s.is_on(registry)) {
			return Ok(false);
		}
		let subscription = registry.subscribe(Arc::clone(target))?;
		self.subscriptions.push(subscription);
		Ok(true)
	}

	/// Requests `n` notifications from every registry.
	pub fn request_notification(&self, n: u32) {
		for subscription in &self.subscriptions {
			subscription.request_notification(n);
		}
	}

	/// Number of registries covered.
	pub fn len(&self) -> usize {
		self.subscriptions.len()
	}

	/// True when no registry is covered.
	pub fn is_empty(&self) -> bool {
		self.subscriptions.is_empty()
	}

	/// Drops every subscription.
	pub fn clear(&mut self) {
		self.subscriptions.clear();
	}
}
