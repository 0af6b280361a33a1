pub mod scorer;
pub mod types;

pub use scorer::{score_document, search};
pub use types::{Document, FieldId, ResoRankIndex, SearchResult};
