//! Synchronization primitives shared by strand containers.
//!
//! * [`WriteGate`] serializes writers with a spin lock and publishes a
//!   `version`/`next_version` pair that readers use to validate optimistic
//!   reads.
//! * [`UpdateRegistry`] tracks zero, one or many asynchronous waiters and
//!   wakes them after a publish.
//! * [`NotifyWaiter`] is the tokio-backed waiter used by async cursors.

mod fatal;
pub mod gate;
pub mod registry;
mod spin;
mod waiter;

pub use fatal::fail_fast;
pub use gate::{GateError, WriteGate, WriteGuard};
pub use registry::{AsyncCompletable, SubscribeError, Subscription, SubscriptionSet, UpdateRegistry};
pub use spin::SpinWait;
pub use waiter::NotifyWaiter;
