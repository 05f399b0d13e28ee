pub mod fields;
pub mod resolve;

pub use fields::{Fallback, FieldRule, SemanticField, RESOLUTION_TABLE};
pub use resolve::{resolve_fields, FieldMapping, ResolvedColumn};
