//! Comment ranking by similarity to the listing description.
//!
//! # Architecture
//!
//! - `embeddings`: Wraps fastembed for the local DistilBERT encoder
//! - `scorer`: Dot product of unit-normalized first-token embeddings
//! - `rank`: Stable descending sort and top-k selection

pub mod embeddings;
mod rank;
mod scorer;

pub use embeddings::{Embedder, EmbeddingError, Encoder};
pub use rank::{rank, RankedComment};
pub use scorer::SimilarityScorer;
