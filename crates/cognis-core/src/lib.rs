//! Shared infrastructure with no network or SQL dependencies: bounded
//! retry, vector similarity, the constrained template-rendering engine,
//! flat-schema validation, and grammar derivation.

mod embedder;
mod error;
mod render;
mod retry;
mod schema;
mod similarity;

pub use embedder::Embedder;
pub use error::{Error, Result};
pub use render::{compile, CompiledTemplate, Variables};
pub use retry::with_retry;
pub use schema::{derive_grammar, validate_flat};
pub use similarity::{
    combined_score, cosine_similarity, quality_score, step_count_efficiency, QUALITY_WEIGHT,
    SIMILARITY_WEIGHT,
};
