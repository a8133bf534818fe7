//! The filter expression model: catalog, codec and expansion.

pub mod catalog;
pub mod codec;
pub mod expand;
pub mod lucene;
pub mod schema;
pub mod submit;

pub use catalog::{FieldCatalog, FieldDefinition};
pub use codec::FilterCodec;
pub use expand::{expand_filter, expand_filters};
pub use lucene::generate_lucene_string;
pub use schema::{ExpandedFilter, FieldDataType, Filter, Operator, ValidatedFilter};
