use std::time::Duration;

const SPIN_LIMIT: u32 = 10;
const YIELD_LIMIT: u32 = 20;
const PARK: Duration = Duration::from_micros(50);

/// Escalating backoff: busy spin, then yield, then short sleeps.
#[derive(Debug, Default, Clone)]
pub struct SpinWait {
	count: u32,
}

impl SpinWait {
	/// Fresh backoff starting with the shortest spin.
	pub const fn new() -> Self {
		Self { count: 0 }
	}

	/// Number of completed backoff rounds.
	#[inline]
	pub const fn count(&self) -> u32 {
		self.count
	}

	/// Returns true once the backoff stopped busy spinning.
	#[inline]
	pub const fn is_parking(&self) -> bool {
		self.count >= YIELD_LIMIT
	}

	/// Waits for one round and escalates the next one.
	pub fn spin_once(&mut self) {
		if self.count < SPIN_LIMIT {
			for _ in 0..(1u32 << self.count) {
				std::hint::spin_loop();
			}
		} else if self.count < YIELD_LIMIT {
			std::thread::yield_now();
		} else {
			std::thread::sleep(PARK);
		}
		self.count = self.count.saturating_add(1);
	}

	/// Restarts the backoff from busy spinning.
	pub fn reset(&mut self) {
		self.count = 0;
	}
}
