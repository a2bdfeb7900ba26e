//! Shared vocabulary for strand series: lookup directions, cursor lifecycle
//! states, append policies and the persisted payload header.

/// Append overlap policies.
pub mod append;
/// One-byte header preceding persisted series payloads.
pub mod header;
/// Seek directions for keyed lookups.
pub mod lookup;
/// Cursor lifecycle states.
pub mod state;

pub use append::AppendOption;
pub use header::{CompressionMethod, HeaderError, PayloadHeader};
pub use lookup::Lookup;
pub use state::CursorState;
