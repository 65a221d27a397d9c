use async_trait::async_trait;

use crate::error::BoxError;

mod openai;

pub use openai::OpenAiEmbedder;

/// Turns canonical recipe text into a fixed-length retrieval vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, BoxError>;

    /// Length of every vector this embedder returns
    fn dimensions(&self) -> usize;
}
