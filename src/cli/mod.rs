use clap::Parser;

use crate::llm::ModelConfig;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Server Args ---
    /// Host address and port for the WebSocket server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:4000")]
    pub server_addr: String,

    /// Optional secret for signed WebSocket handshakes. If set, clients must send `ts` and `sig`.
    #[arg(long, env = "SERVER_API_KEY")]
    pub server_api_key: Option<String>,

    /// Port for the read-only knowledge HTTP API. Disabled when unset.
    #[arg(long, env = "HTTP_PORT")]
    pub http_port: Option<u16>,

    // --- Model Provider Args ---
    /// Base URL of the local Ollama runtime.
    #[arg(long, env = "MODEL_BASE_URL", default_value = "http://localhost:11434")]
    pub model_base_url: String,

    /// Comma-separated models offered for download (e.g., qwen2.5:0.5b,gemma2:2b).
    #[arg(long, env = "MODEL_CATALOG", value_delimiter = ',', default_value = "qwen2.5:0.5b")]
    pub model_catalog: Vec<String>,

    /// Model loaded automatically for every new session.
    #[arg(long, env = "DEFAULT_MODEL")]
    pub default_model: Option<String>,

    /// How long the runtime keeps a loaded model in memory.
    #[arg(long, env = "MODEL_KEEP_ALIVE", default_value = "30m")]
    pub model_keep_alive: String,

    // --- Conversation Args ---
    /// Initial speech language tag (en-IN, hi-IN, ta-IN, te-IN, mr-IN).
    #[arg(long, env = "DEFAULT_LANGUAGE", default_value = "en-IN")]
    pub default_language: String,

    /// JSON file replacing the built-in health dataset.
    #[arg(long, env = "KNOWLEDGE_PATH")]
    pub knowledge_path: Option<String>,

    /// JSON file overriding the persona preamble, welcome message and apology.
    #[arg(long, env = "PROMPTS_PATH")]
    pub prompts_path: Option<String>,

    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,
}

impl Args {
    pub fn model_config(&self) -> ModelConfig {
        ModelConfig {
            base_url: self.model_base_url.clone(),
            catalog: self.model_catalog
                .iter()
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect(),
            keep_alive: self.model_keep_alive.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_split_on_commas() {
        let args = Args::parse_from([
            "lumira-health",
            "--model-catalog",
            "qwen2.5:0.5b,gemma2:2b",
        ]);
        assert_eq!(args.model_config().catalog, vec!["qwen2.5:0.5b", "gemma2:2b"]);
    }
}
