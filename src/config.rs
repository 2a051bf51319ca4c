//! Runtime configuration shared by both front-ends.
//!
//! Values are read once at startup (see [`crate::args`]) and then passed by
//! value into the services that need them.

use std::time::Duration;

pub const DEFAULT_MODEL: &str = "llama3.2-vision";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
pub const DEFAULT_MAX_TURNS: usize = 12;
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_TOP_P: f32 = 0.9;
pub const DEFAULT_NUM_PREDICT: i32 = 512;
pub const DEFAULT_LLM_URL: &str = "http://localhost:11434";

/// Sampling options sent with every chat request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub top_p: f32,
    /// Approximate cap on generated tokens.
    pub num_predict: i32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            num_predict: DEFAULT_NUM_PREDICT,
        }
    }
}

/// How much conversation history a session keeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryPolicy {
    /// Prompt used for the system turn that leads every transcript.
    pub system_prompt: String,
    /// Number of user/assistant pairs kept after the system turn.
    pub max_turns: usize,
}

impl HistoryPolicy {
    pub fn new(system_prompt: impl Into<String>, max_turns: usize) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            max_turns,
        }
    }
}

impl Default for HistoryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT, DEFAULT_MAX_TURNS)
    }
}

/// Everything the chat service needs to talk to a model.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Model identifier passed to Ollama.
    pub model: String,
    /// Base URL of the Ollama server.
    pub llm_url: String,
    pub history: HistoryPolicy,
    pub generation: GenerationOptions,
    /// Give up on a reply when no fragment arrives for this long.
    pub stream_timeout: Option<Duration>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            llm_url: DEFAULT_LLM_URL.into(),
            history: HistoryPolicy::default(),
            generation: GenerationOptions::default(),
            stream_timeout: None,
        }
    }
}
