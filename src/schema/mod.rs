//! Database schema snapshot and the session's schema index.

mod index;
mod types;

pub use index::{SchemaIndex, SchemaState};
pub use types::{ColumnInfo, SchemaSnapshot, TableInfo};
