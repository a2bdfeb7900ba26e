//! Ordered, time-indexed series with streaming mutation and lazy cursors.
//!
//! A [`Series`] owns its data and serializes writers through a versioned
//! write gate. Readers traverse it with [`Cursor`]s, compose cursors into
//! lazy expression trees ([`Op`], [`Map`], [`Zip`], [`Repeat`], [`Fill`])
//! without copying data, and wait for new entries with
//! [`Cursor::move_next_async`] or an [`AsyncCursor`].
//!
//! ```
//! use strand_series::{CursorExt, Series};
//!
//! let upper: Series<i32, i32> = [(2, 2), (4, 4)].into_iter().collect();
//! let lower: Series<i32, i32> = [(1, 10), (3, 30), (5, 50)].into_iter().collect();
//!
//! let sum = upper.cursor().repeat().zip_with(lower.cursor(), |a, b| a + b).into_series();
//! assert_eq!(sum.iter().collect::<Vec<_>>(), [(3, 32), (5, 54)]);
//! ```

/// Async cursor adapter with persistent subscriptions.
pub mod async_cursor;
/// Replication commands and consumers.
pub mod command;
/// Series configuration.
pub mod config;
/// Continuous adapters: repeat and fill.
pub mod continuous;
/// The cursor protocol and combinator constructors.
pub mod cursor;
/// Error types.
pub mod error;
/// Value-mapping cursor.
pub mod map;
/// Scalar arithmetic and comparison cursors.
pub mod ops;
/// The mutable series container and its cursor.
pub mod series;
/// Backing storage.
pub mod store;
/// Read-only cursor views.
pub mod view;
/// Key-synchronized zip.
pub mod zip;

#[cfg(test)]
use {proptest as _, tracing_subscriber as _};

pub use async_cursor::AsyncCursor;
pub use command::{CommandConsumer, CommandOutcome, LoadBuffer, SeriesCommand, SeriesId, VersionedCommand};
pub use config::{ConfigError, SeriesConfig};
pub use continuous::{Fill, Repeat};
pub use cursor::{Cursor, CursorExt};
pub use error::{CursorError, SeriesError};
pub use map::Map;
pub use ops::{ArithOp, Compare, CompareOp, Comparison, Negate, Op, Scalar, ScalarOp};
pub use series::{Series, SeriesCursor};
pub use store::{BTreeStore, OrderedStore};
pub use strand_primitives::{AppendOption, CursorState, Lookup};
pub use view::CursorSeries;
pub use zip::Zip;
