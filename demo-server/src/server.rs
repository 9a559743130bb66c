//! Server wiring: backend selection, demo root setup, and the listener.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use demo_agents::StagedPipeline;
use demo_agents::gemini::{GeminiClient, GeminiClientConfig};
use demo_agents::llm::{ClaudeClient, LlmClient};
use demo_agents::pipeline::Delegator;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::{Backend, ServerConfig};
use crate::store::DemoStore;
use crate::web::{self, AppState};

pub struct Server {
    config: ServerConfig,
    delegator: Option<Arc<dyn Delegator>>,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            delegator: None,
        }
    }

    /// Use a custom delegator instead of the one the backend would build.
    pub fn with_delegator(config: ServerConfig, delegator: Arc<dyn Delegator>) -> Self {
        Self {
            config,
            delegator: Some(delegator),
        }
    }

    async fn build_state(&self) -> Result<Arc<AppState>> {
        let delegator = match &self.delegator {
            Some(d) => Arc::clone(d),
            None => build_delegator(&self.config)?,
        };

        let store = DemoStore::new(&self.config.demos_dir);
        store
            .init()
            .await
            .with_context(|| format!("creating demo root {}", self.config.demos_dir.display()))?;

        Ok(Arc::new(AppState {
            delegator,
            store,
            layout: self.config.layout,
            backend: self.config.backend.to_string(),
        }))
    }

    /// Serve until the process exits.
    pub async fn run(self) -> Result<()> {
        let (addr, handle) = self.start().await?;
        tracing::info!("Demo engine ready at http://{addr}/");
        handle.await?
    }

    /// Start the server and return the bound address + task handle (for testing).
    pub async fn start(self) -> Result<(SocketAddr, JoinHandle<Result<()>>)> {
        let state = self.build_state().await?;
        let listener = TcpListener::bind(&self.config.listen_addr)
            .await
            .with_context(|| format!("binding {}", self.config.listen_addr))?;
        let addr = listener.local_addr()?;
        tracing::info!(
            backend = %self.config.backend,
            layout = ?self.config.layout,
            demos_dir = %self.config.demos_dir.display(),
            "Listening on {addr}"
        );

        let router = web::router(state);
        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .context("HTTP server error")
        });
        Ok((addr, handle))
    }
}

/// Build the pipeline for the configured backend.
pub fn build_delegator(config: &ServerConfig) -> Result<Arc<dyn Delegator>> {
    let pipeline = match config.backend {
        Backend::Offline => StagedPipeline::offline(),
        Backend::Claude => {
            let Some(key) = config.anthropic_api_key.clone() else {
                bail!("--backend claude requires ANTHROPIC_API_KEY or --anthropic-api-key");
            };
            let research = ClaudeClient::new(key.clone(), config.llm_timeout())?
                .with_model(config.research_model());
            let task =
                ClaudeClient::new(key, config.llm_timeout())?.with_model(config.task_model());
            StagedPipeline::with_llm(Arc::new(research), Arc::new(task))
        }
        Backend::Gemini => {
            let Some(key) = config.gemini_api_key.clone() else {
                bail!("--backend gemini requires GOOGLE_API_KEY or --gemini-api-key");
            };
            let client = |model: &str| -> Result<Arc<dyn LlmClient>> {
                let gemini = GeminiClientConfig {
                    api_key: key.clone(),
                    model: model.to_string(),
                    timeout: config.llm_timeout(),
                    ..Default::default()
                };
                Ok(Arc::new(GeminiClient::new(gemini)?))
            };
            StagedPipeline::with_llm(client(config.research_model())?, client(config.task_model())?)
        }
    };
    tracing::info!(backend = %config.backend, "Pipeline configured");
    Ok(Arc::new(pipeline))
}
