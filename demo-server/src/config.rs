//! Server configuration: command-line flags with environment fallbacks.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

/// Which generative backend drives the research and narrative stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Simulated research and template narrative; no network calls.
    Offline,
    /// Anthropic Claude.
    Claude,
    /// Google Gemini.
    Gemini,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Offline => write!(f, "offline"),
            Backend::Claude => write!(f, "claude"),
            Backend::Gemini => write!(f, "gemini"),
        }
    }
}

/// How a generated demo is laid out on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Layout {
    /// `<demos-dir>/<id>/` holding every packaged file.
    Bundle,
    /// A single `<demos-dir>/demo_<id>.html` page.
    Page,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "demo-engine", about = "Generate customer demo bundles from a short brief")]
pub struct ServerConfig {
    /// Address for the HTTP server
    #[arg(long, env = "DEMO_ENGINE_LISTEN", default_value = "127.0.0.1:5000")]
    pub listen_addr: String,

    /// Directory generated demos are written to and served from
    #[arg(long, env = "DEMO_ENGINE_DEMOS_DIR", default_value = "generated_demos")]
    pub demos_dir: PathBuf,

    /// On-disk layout of each generated demo
    #[arg(long, env = "DEMO_ENGINE_LAYOUT", value_enum, default_value_t = Layout::Bundle)]
    pub layout: Layout,

    /// Generative backend
    #[arg(long, env = "DEMO_ENGINE_BACKEND", value_enum, default_value_t = Backend::Offline)]
    pub backend: Backend,

    /// Anthropic API key (required for --backend claude)
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub anthropic_api_key: Option<String>,

    /// Google API key (required for --backend gemini)
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Model for the research stage (backend default if unset)
    #[arg(long)]
    pub research_model: Option<String>,

    /// Model for the narrative stage (backend default if unset)
    #[arg(long)]
    pub task_model: Option<String>,

    /// Timeout for each model call, in seconds
    #[arg(long, default_value_t = 120)]
    pub llm_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:5000".to_string(),
            demos_dir: PathBuf::from("generated_demos"),
            layout: Layout::Bundle,
            backend: Backend::Offline,
            anthropic_api_key: None,
            gemini_api_key: None,
            research_model: None,
            task_model: None,
            llm_timeout_secs: 120,
        }
    }
}

impl ServerConfig {
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    /// Research model, falling back to the backend's orchestration default.
    pub fn research_model(&self) -> &str {
        match (&self.research_model, self.backend) {
            (Some(model), _) => model,
            (None, Backend::Gemini) => "gemini-3-pro-preview",
            (None, _) => demo_agents::llm::DEFAULT_CLAUDE_MODEL,
        }
    }

    /// Narrative model, falling back to the backend's task default.
    pub fn task_model(&self) -> &str {
        match (&self.task_model, self.backend) {
            (Some(model), _) => model,
            (None, Backend::Gemini) => demo_agents::gemini::DEFAULT_GEMINI_MODEL,
            (None, _) => demo_agents::llm::DEFAULT_CLAUDE_MODEL,
        }
    }
}
