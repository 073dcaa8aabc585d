//! Optional capability for turning text into an embedding vector, used by
//! distillation (to embed a template's intent) and trace retrieval (to
//! embed an incoming query before comparing it to stored traces). Neither
//! path fails when no embedder is configured — they degrade to storing
//! `None` and skipping similarity-based retrieval, respectively.

use async_trait::async_trait;

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, String>;
}
