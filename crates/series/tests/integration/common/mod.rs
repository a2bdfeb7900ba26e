//! Shared fixtures for series integration tests.

use strand_series::Series;

/// Installs a fmt subscriber once per test binary.
pub fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// `upper = {2: 2, 4: 4}`, `lower = {1: 10, 3: 30, 5: 50}`.
pub fn upper_lower() -> (Series<i32, i32>, Series<i32, i32>) {
	init_tracing();
	(
		[(2, 2), (4, 4)].into_iter().collect(),
		[(1, 10), (3, 30), (5, 50)].into_iter().collect(),
	)
}
