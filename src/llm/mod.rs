pub mod ollama;

use async_trait::async_trait;
use futures::{ Future, Stream };
use serde::{ Deserialize, Serialize };
use std::pin::Pin;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("no model is loaded")]
    NotLoaded,
    #[error("unknown model: {0}")]
    UnknownModel(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("model server returned {status}: {body}")]
    Status {
        status: u16,
        body: String,
    },
    #[error("malformed model server response: {0}")]
    Protocol(String),
    #[error("{0}")]
    Other(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,
    pub name: String,
    pub size_bytes: Option<u64>,
    pub is_downloaded: bool,
}

pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, ModelError>> + Send>>;

/// Download progress as fractions in `[0, 1]`; the stream ends when the
/// download completes.
pub type ProgressStream = Pin<Box<dyn Stream<Item = Result<f32, ModelError>> + Send>>;

/// On-device model serving capability.
#[async_trait]
pub trait ModelService: Send + Sync {
    async fn list_available_models(&self) -> Result<Vec<ModelDescriptor>, ModelError>;

    async fn download_model(&self, model_id: &str) -> Result<ProgressStream, ModelError>;

    async fn load_model(&self, model_id: &str) -> Result<bool, ModelError>;

    async fn generate_stream(&self, prompt: &str) -> Result<TokenStream, ModelError>;
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub base_url: String,
    /// Models offered for download even before they exist locally.
    pub catalog: Vec<String>,
    pub keep_alive: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            catalog: vec!["qwen2.5:0.5b".to_string()],
            keep_alive: "30m".to_string(),
        }
    }
}

/// Runs `producer` on its own task and exposes whatever it sends as a stream.
pub fn create_streaming_response<T, F, Fut>(
    producer: F
) -> Pin<Box<dyn Stream<Item = Result<T, ModelError>> + Send>>
    where
        T: Send + 'static,
        F: FnOnce(mpsc::Sender<Result<T, ModelError>>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static
{
    let (tx, rx) = mpsc::channel(32);

    tokio::spawn(async move {
        producer(tx).await;
    });

    Box::pin(ReceiverStream::new(rx))
}
