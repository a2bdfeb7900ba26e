use std::sync::Arc;

use tokio::sync::Notify;
use tokio::sync::futures::Notified;

use crate::registry::AsyncCompletable;

/// Waiter woken through a tokio [`Notify`].
///
/// A wakeup that arrives while nobody is waiting is stored as a permit and
/// consumed by the next [`notified`](Self::notified), so a notification
/// racing with the re-check before a wait is never lost.
#[derive(Debug, Default)]
pub struct NotifyWaiter {
	notify: Notify,
}

impl NotifyWaiter {
	/// Shared waiter with no stored wakeup.
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	/// Resolves after the next (or a stored) wakeup.
	pub fn notified(&self) -> Notified<'_> {
		self.notify.notified()
	}

	/// Wakes the waiter directly.
	pub fn wake(&self) {
		self.notify.notify_one();
	}

	/// Upcasts to the target type registries store.
	pub fn as_target(self: &Arc<Self>) -> Arc<dyn AsyncCompletable> {
		Arc::clone(self) as Arc<dyn AsyncCompletable>
	}
}

impl AsyncCompletable for NotifyWaiter {
	fn try_complete(&self, _force: bool) -> bool {
		self.notify.notify_one();
		true
	}
}
