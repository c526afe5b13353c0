pub mod aggregate;
pub mod chunk;
pub mod summary;

pub use aggregate::ChunkAggregate;
pub use chunk::{predict_chunk, ChunkPrediction};
pub use summary::Summary;
