use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use log::info;

const DEFAULT_SYSTEM_PREAMBLE: &str =
    "You are Lumira (लुमिरा), a compassionate rural health assistant. Provide helpful, accurate health guidance while being culturally sensitive to Indian rural contexts. Always include medical disclaimers. Respond in both Hindi and English when appropriate.

Guidelines:
1. Always start with a medical disclaimer
2. Provide practical, culturally appropriate advice
3. Suggest when to seek professional medical help
4. Use simple, understandable language
5. Include home remedies when safe and effective
6. Be empathetic and supportive";

const DEFAULT_WELCOME_MESSAGE: &str =
    "नमस्ते! मैं लुमिरा हूं, आपका स्वास्थ्य सहायक। मैं आपकी स्वास्थ्य संबंधी समस्याओं में मदद कर सकता हूं। बोलकर या टाइप करके अपनी बात कहें।\n\nHello! I'm Lumira, your health companion. I can help with basic health questions and first aid guidance. Please speak or type your health concerns.";

const DEFAULT_FALLBACK_APOLOGY: &str =
    "मुझे खुशी होगी आपकी मदद करने में, लेकिन अभी कुछ तकनीकी समस्या है। कृपया फिर से कोशिश करें। I'd be happy to help, but there's a technical issue right now. Please try again.";

#[derive(Debug)]
pub enum PromptError {
    EmptyField(&'static str),
    IoError(std::io::Error),
    JsonError(serde_json::Error),
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptError::EmptyField(key) => write!(f, "Prompt field '{}' must not be empty", key),
            PromptError::IoError(e) => write!(f, "Prompt file IO error: {}", e),
            PromptError::JsonError(e) => write!(f, "Prompt JSON parsing error: {}", e),
        }
    }
}

impl Error for PromptError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PromptError::IoError(e) => Some(e),
            PromptError::JsonError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PromptError {
    fn from(err: std::io::Error) -> Self {
        PromptError::IoError(err)
    }
}

impl From<serde_json::Error> for PromptError {
    fn from(err: serde_json::Error) -> Self {
        PromptError::JsonError(err)
    }
}

/// Fixed texts of the assistant persona. Any field missing from a prompts
/// file keeps its built-in value.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PromptConfig {
    pub system_preamble: String,
    pub welcome_message: String,
    pub fallback_apology: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_preamble: DEFAULT_SYSTEM_PREAMBLE.to_string(),
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            fallback_apology: DEFAULT_FALLBACK_APOLOGY.to_string(),
        }
    }
}

impl PromptConfig {
    fn validate(&self) -> Result<(), PromptError> {
        if self.system_preamble.trim().is_empty() {
            return Err(PromptError::EmptyField("system_preamble"));
        }
        if self.welcome_message.trim().is_empty() {
            return Err(PromptError::EmptyField("welcome_message"));
        }
        if self.fallback_apology.trim().is_empty() {
            return Err(PromptError::EmptyField("fallback_apology"));
        }
        Ok(())
    }

    /// Prompt sent to the model for a query the knowledge base could not answer.
    pub fn health_prompt(&self, query: &str) -> String {
        format!("{}\n\nUser query: {}", self.system_preamble, query)
    }
}

pub fn load_prompts<P: AsRef<Path>>(path: P) -> Result<Arc<PromptConfig>, PromptError> {
    let file_content = fs::read_to_string(&path)?;
    let config: PromptConfig = serde_json::from_str(&file_content)?;
    config.validate()?;
    info!("Loaded prompt overrides from {}", path.as_ref().display());
    Ok(Arc::new(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn health_prompt_appends_query() {
        let config = PromptConfig::default();
        let prompt = config.health_prompt("my child has a rash");
        assert!(prompt.starts_with("You are Lumira"));
        assert!(prompt.ends_with("\n\nUser query: my child has a rash"));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"welcome_message":"Hi there"}"#).unwrap();

        let config = load_prompts(file.path()).unwrap();
        assert_eq!(config.welcome_message, "Hi there");
        assert_eq!(config.fallback_apology, PromptConfig::default().fallback_apology);
    }

    #[test]
    fn empty_field_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"fallback_apology":"  "}"#).unwrap();

        let err = load_prompts(file.path()).unwrap_err();
        assert_eq!(err.to_string(), "Prompt field 'fallback_apology' must not be empty");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_prompts("/nonexistent/prompts.json").unwrap_err();
        assert!(matches!(err, PromptError::IoError(_)));
    }
}
