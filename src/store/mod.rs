//! Record store
//!
//! Supplies the full in-memory collection of entities on demand. Stores are
//! read-only after construction, so one instance is shared across every
//! request behind an `Arc` without locking.

mod student;

pub use student::{Student, StudentStore};

use crate::schema::{EntitySchema, Record};

/// A flat, immutable record type with a fixed schema.
pub trait Entity: Send + Sync {
    /// The field set of this entity type. Stable for the life of the process.
    fn schema() -> &'static EntitySchema
    where
        Self: Sized;

    /// Full record view, with keys in schema order.
    fn to_record(&self) -> Record;
}

/// Source of entities for the query endpoint.
pub trait RecordStore: Send + Sync {
    type Entity: Entity;

    /// Every entity known to the store, in insertion order.
    ///
    /// Never fails. An empty slice is a valid snapshot.
    fn get_all(&self) -> &[Self::Entity];
}
