pub mod api;
pub mod websocket;

use crate::cli::Args;
use crate::config::prompt::PromptConfig;
use crate::knowledge::KnowledgeStore;
use crate::llm::ModelService;
use std::error::Error;
use std::sync::Arc;

/// Builds the model service one session talks to. Each session tracks its
/// own loaded model.
pub type ModelFactory = Arc<dyn Fn() -> Arc<dyn ModelService> + Send + Sync>;

/// Everything a session needs that outlives it.
#[derive(Clone)]
pub struct SessionContext {
    pub knowledge: Arc<KnowledgeStore>,
    pub model: ModelFactory,
    pub prompts: Arc<PromptConfig>,
    pub default_language: String,
    pub default_model: Option<String>,
}

pub struct Server {
    addr: String,
    context: SessionContext,
    args: Args,
}

impl SessionContext {
    pub fn model_session(&self) -> Arc<dyn ModelService> {
        (self.model)()
    }
}

impl Server {
    pub fn new(addr: String, context: SessionContext, args: Args) -> Self {
        Self { addr, context, args }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        if let Some(http_port) = self.args.http_port {
            self.start_http_server(http_port).await?;
        }

        self.start_ws_server().await?;

        Ok(())
    }

    async fn start_http_server(&self, http_port: u16) -> Result<(), Box<dyn Error + Send + Sync>> {
        api::start_http_server(http_port, Arc::clone(&self.context.knowledge)).await
    }

    async fn start_ws_server(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        websocket::start_ws_server(
            &self.addr,
            self.context.clone(),
            self.args.server_api_key.clone()
        ).await
    }
}
