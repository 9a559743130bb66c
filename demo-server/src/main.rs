use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Use JSON logs in production (DEMO_ENGINE_LOG_JSON=1), human-readable otherwise
    let json_logs = std::env::var("DEMO_ENGINE_LOG_JSON").unwrap_or_default() == "1";
    let filter = EnvFilter::from_default_env()
        .add_directive("demo_server=info".parse()?)
        .add_directive("demo_agents=info".parse()?);
    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = demo_server::config::ServerConfig::parse();
    tracing::info!("Starting demo engine on {}", config.listen_addr);
    tracing::info!(
        "Backend: {}, demos written to {}",
        config.backend,
        config.demos_dir.display()
    );

    let server = demo_server::server::Server::new(config);
    server.run().await
}
