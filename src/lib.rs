pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod ingest;
pub mod process;
pub mod progression;
pub mod schema;
pub mod search;
pub mod table;

pub use config::LoadOptions;
pub use error::IngestError;
pub use table::{CanonicalRecord, CanonicalTable};
