pub mod gemini;

pub use gemini::{GeminiClient, GeminiModel};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("generation backend unavailable: {0}")]
    Unavailable(String),
    #[error("generation timed out after {0}s")]
    Timeout(u64),
}

pub type Result<T> = std::result::Result<T, GenerationError>;

/// Opaque structured-generation capability. Implementations return raw text
/// purportedly conforming to `schema`; they never parse or interpret their
/// own output.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, prompt: &str, schema: &Value, temperature: f64) -> Result<String>;
}

#[async_trait]
impl<T: GenerationClient + ?Sized> GenerationClient for std::sync::Arc<T> {
    async fn generate(&self, prompt: &str, schema: &Value, temperature: f64) -> Result<String> {
        (**self).generate(prompt, schema, temperature).await
    }
}
