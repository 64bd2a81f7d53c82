pub mod cli;
pub mod config;
pub mod conversation;
pub mod knowledge;
pub mod llm;
pub mod models;
pub mod server;
pub mod speech;

use cli::Args;
use config::prompt::{ load_prompts, PromptConfig };
use knowledge::KnowledgeStore;
use llm::ModelService;
use llm::ollama::OllamaModelService;
use log::info;
use server::{ ModelFactory, Server, SessionContext };
use std::error::Error;
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    let model_config = args.model_config();

    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Signed Handshakes: {}", args.server_api_key.as_deref().is_some_and(|k| !k.is_empty()));
    info!("HTTP API Port: {}", args.http_port.map_or("disabled".to_string(), |p| p.to_string()));
    info!("Model Base URL: {}", model_config.base_url);
    info!("Model Catalog: {}", model_config.catalog.join(", "));
    info!("Default Model: {}", args.default_model.as_deref().unwrap_or("none"));
    info!("Model Keep Alive: {}", model_config.keep_alive);
    info!("Default Language: {}", args.default_language);
    info!("Knowledge Path: {}", args.knowledge_path.as_deref().unwrap_or("built-in"));
    info!("Prompts Path: {}", args.prompts_path.as_deref().unwrap_or("built-in"));
    info!("-------------------------");

    let knowledge = match &args.knowledge_path {
        Some(path) => KnowledgeStore::from_json_file(path)?,
        None => KnowledgeStore::builtin(),
    };
    let prompts = match &args.prompts_path {
        Some(path) => load_prompts(path)?,
        None => Arc::new(PromptConfig::default()),
    };

    let http = reqwest::Client::new();
    let model: ModelFactory = Arc::new(move || {
        Arc::new(OllamaModelService::with_client(http.clone(), &model_config)) as Arc<dyn ModelService>
    });

    let context = SessionContext {
        knowledge: Arc::new(knowledge),
        model,
        prompts,
        default_language: args.default_language.clone(),
        default_model: args.default_model.clone(),
    };

    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, context, args);
    server.run().await?;

    Ok(())
}
