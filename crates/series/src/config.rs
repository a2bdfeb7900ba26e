//! Per-series tuning knobs.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Errors from parsing a [`SeriesConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
	/// The TOML document did not parse.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// A field carried a value outside its accepted range.
	#[error("invalid value for `{field}`: {reason}")]
	Invalid {
		/// Name of the offending field.
		field: &'static str,
		/// What was wrong with it.
		reason: &'static str,
	},
}

/// Tuning for one [`Series`](crate::Series).
///
/// ```toml
/// lock_timeout_ms = 1000
/// read_retry_limit = 1024
/// snapshot_chunk = 4096
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawSeriesConfig")]
pub struct SeriesConfig {
	/// How long a writer may spin on the write lock before the process is
	/// aborted as deadlocked.
	pub lock_timeout: Duration,
	/// Optimistic read attempts before falling back to a locked read.
	pub read_retry_limit: u32,
	/// Entries copied per storage lock acquisition by `snapshot`.
	pub snapshot_chunk: usize,
}

impl Default for SeriesConfig {
	fn default() -> Self {
		Self {
			lock_timeout: strand_sync::gate::DEFAULT_LOCK_TIMEOUT,
			read_retry_limit: strand_sync::gate::DEFAULT_READ_RETRY_LIMIT,
			snapshot_chunk: 4096,
		}
	}
}

impl SeriesConfig {
	/// Sets the write lock timeout.
	///
	/// # Panics
	///
	/// Panics if `timeout` is zero.
	#[must_use]
	pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
		assert!(!timeout.is_zero(), "lock timeout must be > 0");
		self.lock_timeout = timeout;
		self
	}

	/// Sets the optimistic read retry limit.
	///
	/// # Panics
	///
	/// Panics if `limit` is zero.
	#[must_use]
	pub fn with_read_retry_limit(mut self, limit: u32) -> Self {
		assert!(limit > 0, "read retry limit must be > 0");
		self.read_retry_limit = limit;
		self
	}

	/// Sets the snapshot chunk size.
	///
	/// # Panics
	///
	/// Panics if `chunk` is zero.
	#[must_use]
	pub fn with_snapshot_chunk(mut self, chunk: usize) -> Self {
		assert!(chunk > 0, "snapshot chunk must be > 0");
		self.snapshot_chunk = chunk;
		self
	}

	/// Parses a TOML document. Missing fields keep their defaults.
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		let raw: RawSeriesConfig = toml::from_str(input)?;
		Self::try_from(raw)
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSeriesConfig {
	lock_timeout_ms: Option<u64>,
	read_retry_limit: Option<u32>,
	snapshot_chunk: Option<usize>,
}

impl TryFrom<RawSeriesConfig> for SeriesConfig {
	type Error = ConfigError;

	fn try_from(raw: RawSeriesConfig) -> Result<Self, Self::Error> {
		let mut config = Self::default();
		if let Some(ms) = raw.lock_timeout_ms {
			if ms == 0 {
				return Err(ConfigError::Invalid {
					field: "lock_timeout_ms",
					reason: "must be > 0",
				});
			}
			config.lock_timeout = Duration::from_millis(ms);
		}
		if let Some(limit) = raw.read_retry_limit {
			if limit == 0 {
				return Err(ConfigError::Invalid {
					field: "read_retry_limit",
					reason: "must be > 0",
				});
			}
			config.read_retry_limit = limit;
		}
		if let Some(chunk) = raw.snapshot_chunk {
			if chunk == 0 {
				return Err(ConfigError::Invalid {
					field: "snapshot_chunk",
					reason: "must be > 0",
				});
			}
			config.snapshot_chunk = chunk;
		}
		Ok(config)
	}
}
