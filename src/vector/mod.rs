pub mod hnsw;
pub mod store;

pub use hnsw::{Hnsw, HnswError, Metric};
pub use store::VectorStore;
