use async_trait::async_trait;
use futures::StreamExt;
use log::{ debug, info, warn };
use reqwest::{ Client as HttpClient, RequestBuilder };
use serde::de::DeserializeOwned;
use serde::{ Deserialize, Serialize };
use std::pin::Pin;
use std::sync::RwLock;
use tokio::sync::mpsc;

use super::{
    create_streaming_response,
    ModelConfig,
    ModelDescriptor,
    ModelError,
    ModelService,
    ProgressStream,
    TokenStream,
};

/// `ModelService` backed by a local Ollama daemon.
#[derive(Debug)]
pub struct OllamaModelService {
    http: HttpClient,
    base_url: String,
    catalog: Vec<String>,
    keep_alive: String,
    loaded_model: RwLock<Option<String>>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<&'a str>,
    stream: bool,
    keep_alive: &'a str,
}

#[derive(Serialize)]
struct PullRequest<'a> {
    model: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Deserialize)]
struct TagEntry {
    name: String,
    #[serde(default)]
    size: Option<u64>,
}

#[derive(Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct PullStatus {
    #[serde(default)]
    status: String,
    #[serde(default)]
    total: Option<u64>,
    #[serde(default)]
    completed: Option<u64>,
    #[serde(default)]
    error: Option<String>,
}

/// What one NDJSON line contributes: an optional item, and whether the
/// stream is finished.
type LineStep<T> = Result<(Option<T>, bool), String>;

fn generate_step(chunk: GenerateChunk) -> LineStep<String> {
    if let Some(error) = chunk.error {
        return Err(error);
    }
    let token = if chunk.response.is_empty() { None } else { Some(chunk.response) };
    Ok((token, chunk.done))
}

fn pull_step(status: PullStatus) -> LineStep<f32> {
    if let Some(error) = status.error {
        return Err(error);
    }
    if status.status == "success" {
        return Ok((Some(1.0), true));
    }
    match (status.total, status.completed) {
        (Some(total), Some(completed)) if total > 0 => {
            let fraction = ((completed as f64) / (total as f64)).clamp(0.0, 1.0) as f32;
            Ok((Some(fraction), false))
        }
        _ => Ok((None, false)),
    }
}

/// Reassembles newline-delimited records from arbitrary byte chunks.
#[derive(Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        self.pending.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            line.pop();
            lines.push(line);
        }
        lines
    }

    pub fn finish(&mut self) -> Option<Vec<u8>> {
        if self.pending.is_empty() { None } else { Some(std::mem::take(&mut self.pending)) }
    }
}

/// How a stream continues after one line.
#[derive(Debug, PartialEq, Eq)]
enum LineOutcome {
    Continue,
    /// The terminal record arrived.
    Complete,
    /// An error was forwarded or the consumer went away.
    Stop,
}

async fn forward_line<L, T>(
    line: &[u8],
    step: fn(L) -> LineStep<T>,
    tx: &mpsc::Sender<Result<T, ModelError>>
) -> LineOutcome
    where L: DeserializeOwned
{
    let trimmed = String::from_utf8_lossy(line);
    let trimmed = trimmed.trim();
    if trimmed.is_empty() {
        return LineOutcome::Continue;
    }
    let parsed = match serde_json::from_str::<L>(trimmed) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!("Skipping unparseable model server line: {} ({})", trimmed, e);
            return LineOutcome::Continue;
        }
    };
    match step(parsed) {
        Ok((item, finished)) => {
            if let Some(item) = item {
                if tx.send(Ok(item)).await.is_err() {
                    return LineOutcome::Stop;
                }
            }
            if finished { LineOutcome::Complete } else { LineOutcome::Continue }
        }
        Err(message) => {
            let _ = tx.send(Err(ModelError::Other(message))).await;
            LineOutcome::Stop
        }
    }
}

/// Feeds a chunked NDJSON body through `step`. A body that ends before its
/// terminal record is reported as a protocol error.
async fn pump_lines<S, B, L, T>(
    chunks: S,
    step: fn(L) -> LineStep<T>,
    tx: mpsc::Sender<Result<T, ModelError>>
)
    where S: futures::Stream<Item = Result<B, reqwest::Error>>, B: AsRef<[u8]>, L: DeserializeOwned
{
    let mut chunks = std::pin::pin!(chunks);
    let mut buffer = LineBuffer::default();
    while let Some(chunk) = chunks.next().await {
        match chunk {
            Ok(chunk) => {
                for line in buffer.push(chunk.as_ref()) {
                    match forward_line(&line, step, &tx).await {
                        LineOutcome::Continue => {}
                        LineOutcome::Complete | LineOutcome::Stop => {
                            return;
                        }
                    }
                }
            }
            Err(e) => {
                let _ = tx.send(Err(ModelError::Http(e))).await;
                return;
            }
        }
    }
    if let Some(rest) = buffer.finish() {
        if forward_line(&rest, step, &tx).await != LineOutcome::Continue {
            return;
        }
    }
    warn!("Model server closed the stream before completion");
    let _ = tx.send(Err(ModelError::Protocol("stream ended before completion".to_string()))).await;
}

async fn open_ndjson<L, T>(
    request: RequestBuilder,
    step: fn(L) -> LineStep<T>
) -> Result<Pin<Box<dyn futures::Stream<Item = Result<T, ModelError>> + Send>>, ModelError>
    where L: DeserializeOwned + Send + 'static, T: Send + 'static
{
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ModelError::Status { status: status.as_u16(), body });
    }

    Ok(
        create_streaming_response(move |tx| async move {
            pump_lines(response.bytes_stream(), step, tx).await;
        })
    )
}

fn same_model(a: &str, b: &str) -> bool {
    let strip = |s: &str| s.strip_suffix(":latest").unwrap_or(s).to_string();
    strip(a) == strip(b)
}

impl OllamaModelService {
    pub fn new(config: &ModelConfig) -> Self {
        Self::with_client(HttpClient::new(), config)
    }

    /// Service with its own loaded-model slot on top of a shared connection pool.
    pub fn with_client(http: HttpClient, config: &ModelConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            catalog: config.catalog.clone(),
            keep_alive: config.keep_alive.clone(),
            loaded_model: RwLock::new(None),
        }
    }

    fn url(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }

    pub fn loaded_model(&self) -> Option<String> {
        match self.loaded_model.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set_loaded_model(&self, model_id: &str) {
        let mut guard = match self.loaded_model.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(model_id.to_string());
    }
}

#[async_trait]
impl ModelService for OllamaModelService {
    async fn list_available_models(&self) -> Result<Vec<ModelDescriptor>, ModelError> {
        let resp = self.http.get(self.url("/api/tags")).send().await?.error_for_status()?;
        let tags = resp.json::<TagsResponse>().await?;

        let mut models: Vec<ModelDescriptor> = tags.models
            .into_iter()
            .map(|entry| ModelDescriptor {
                id: entry.name.clone(),
                name: entry.name,
                size_bytes: entry.size,
                is_downloaded: true,
            })
            .collect();
        for id in &self.catalog {
            if !models.iter().any(|m| same_model(&m.id, id)) {
                models.push(ModelDescriptor {
                    id: id.clone(),
                    name: id.clone(),
                    size_bytes: None,
                    is_downloaded: false,
                });
            }
        }
        info!("Model server reports {} available models", models.len());
        Ok(models)
    }

    async fn download_model(&self, model_id: &str) -> Result<ProgressStream, ModelError> {
        if model_id.trim().is_empty() {
            return Err(ModelError::UnknownModel(model_id.to_string()));
        }
        info!("Pulling model '{}'", model_id);
        let request = self.http
            .post(self.url("/api/pull"))
            .json(&(PullRequest { model: model_id, stream: true }));
        open_ndjson(request, pull_step).await
    }

    async fn load_model(&self, model_id: &str) -> Result<bool, ModelError> {
        let request = GenerateRequest {
            model: model_id,
            prompt: None,
            stream: false,
            keep_alive: &self.keep_alive,
        };
        let resp = self.http.post(self.url("/api/generate")).json(&request).send().await?;
        let status = resp.status();
        if status.as_u16() == 404 {
            warn!("Model '{}' is not available locally", model_id);
            return Ok(false);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ModelError::Status { status: status.as_u16(), body });
        }
        self.set_loaded_model(model_id);
        info!("Model '{}' loaded (keep_alive={})", model_id, self.keep_alive);
        Ok(true)
    }

    async fn generate_stream(&self, prompt: &str) -> Result<TokenStream, ModelError> {
        let model = self.loaded_model().ok_or(ModelError::NotLoaded)?;
        let request = self.http.post(self.url("/api/generate")).json(
            &(GenerateRequest {
                model: &model,
                prompt: Some(prompt),
                stream: true,
                keep_alive: &self.keep_alive,
            })
        );
        open_ndjson(request, generate_step).await
    }
}
