//! Tabular artifacts and their snapshots
//!
//! - `snapshot`: keyed CSV snapshot store and the `memoize` cache-aside helper
//! - `materializer`: listing, product and procedure tables

pub mod materializer;
pub mod snapshot;

pub use materializer::TableMaterializer;
pub use snapshot::{memoize, SnapshotInfo, SnapshotStore};
