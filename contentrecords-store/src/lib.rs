//! SQLite record store for content records.
//!
//! Persists records as rows of named string values:
//! - [`RecordStore`]: CRUD, single-field upsert, id enumeration, seeding
//! - [`StoreRegistry`]: one shared, schema-initialized store per path
//! - [`Record`]: a record id plus its field values
//!
//! Field values are stored as text regardless of what they represent. The
//! schema carries no column per field; adding a bind to a template never
//! requires a migration.

mod error;
mod record;
mod registry;
mod store;

pub use error::{StoreError, StoreResult};
pub use record::{FieldValues, Record};
pub use registry::StoreRegistry;
pub use store::{default_values, RecordStore, MEMORY_PATH};
