/// Logs `reason` and aborts the process.
///
/// Reserved for broken internal invariants where continuing could hand
/// readers wrong data. Never used for conditions a caller can cause.
#[cold]
#[track_caller]
pub fn fail_fast(reason: &str) -> ! {
	let location = std::panic::Location::caller();
	tracing::error!(reason, %location, "sync.fail_fast");
	eprintln!("fatal: {reason} at {location}");
	std::process::abort()
}
