pub mod model;
pub mod slug;
pub mod validate;

pub use model::{FormatName, FormatVariant, MediaAsset, Post, PostType};
pub use validate::{ingest, ingest_report, parse_page, validate, IngestReport, ValidationError, ValidationErrorKind};
