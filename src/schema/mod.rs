//! Entity schemas
//!
//! A schema is the fixed, ordered field set of one entity type. Query
//! options are validated against it before anything is evaluated.

mod types;

pub use types::{EntitySchema, FieldDef, FieldType, Record};
