// Local storage module.
// Mirrors backend data into object stores for offline access.

pub mod database;
pub mod object_store;
pub mod paths;

pub use database::Database;
pub use object_store::{ObjectStore, Record};
