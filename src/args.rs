use clap::{Args, Parser, Subcommand};
use std::time::Duration;

use crate::config::{
    ChatConfig, DEFAULT_LLM_URL, DEFAULT_MAX_TURNS, DEFAULT_MODEL, DEFAULT_NUM_PREDICT,
    DEFAULT_SYSTEM_PROMPT, DEFAULT_TEMPERATURE, DEFAULT_TOP_P, GenerationOptions, HistoryPolicy,
};
use crate::logger::LogLevel;

/// Command line arguments for the hearth binary.
///
/// Every option can also be supplied through the environment variable shown
/// in `--help`.
#[derive(Parser, Debug, Clone)]
#[command(name = "hearth", version, about = "Local chat front-end for Ollama")]
pub struct Cli {
    #[command(flatten)]
    pub chat: ChatArgs,

    /// Logging verbosity when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Chat in the terminal (default)
    Chat,
    /// Serve the chat over WebSocket, one session per connection
    Serve(ServeArgs),
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ServeArgs {
    #[arg(long, env = "HEARTH_HOST", default_value = "127.0.0.1")]
    pub host: String,
    #[arg(long, env = "HEARTH_PORT", default_value_t = 8000)]
    pub port: u16,
}

#[derive(Args, Debug, Clone)]
pub struct ChatArgs {
    /// Model name
    #[arg(long, env = "OLLAMA_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Base URL for Ollama
    #[arg(long, env = "OLLAMA_URL", default_value = DEFAULT_LLM_URL)]
    pub llm_url: String,

    /// System prompt leading every conversation
    #[arg(long, env = "SYSTEM_PROMPT", default_value = DEFAULT_SYSTEM_PROMPT)]
    pub system_prompt: String,

    /// User/assistant pairs kept in history
    #[arg(long, env = "MAX_TURNS", default_value_t = DEFAULT_MAX_TURNS)]
    pub max_turns: usize,

    #[arg(long, env = "TEMPERATURE", default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f32,

    #[arg(long, env = "TOP_P", default_value_t = DEFAULT_TOP_P)]
    pub top_p: f32,

    /// Approximate maximum number of generated tokens
    #[arg(long, env = "NUM_PREDICT", default_value_t = DEFAULT_NUM_PREDICT)]
    pub num_predict: i32,

    /// Seconds to wait for the next streamed fragment before giving up
    #[arg(long, env = "STREAM_TIMEOUT_SECS")]
    pub stream_timeout_secs: Option<u64>,
}

impl From<&ChatArgs> for ChatConfig {
    fn from(args: &ChatArgs) -> Self {
        Self {
            model: args.model.clone(),
            llm_url: args.llm_url.clone(),
            history: HistoryPolicy::new(args.system_prompt.clone(), args.max_turns),
            generation: GenerationOptions {
                temperature: args.temperature,
                top_p: args.top_p,
                num_predict: args.num_predict,
            },
            stream_timeout: args.stream_timeout_secs.map(Duration::from_secs),
        }
    }
}
