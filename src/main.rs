use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use mongosearch_mcp::backend::{DocumentStore, MongoHandle, OpenSearchHandle, SearchIndex};
use mongosearch_mcp::config::{redact_uri, Config};
use mongosearch_mcp::context::with_app_context;
use mongosearch_mcp::gateway::{Gateway, ResultLimits};
use mongosearch_mcp::logging::init_tracing;
use mongosearch_mcp::mcp::McpServer;
use mongosearch_mcp::runtime::run_detached;
use mongosearch_mcp::shutdown::{ShutdownCoordinator, ShutdownPhase};

/// Read-only MCP gateway over MongoDB and OpenSearch, served on stdio.
#[derive(Debug, Parser)]
#[command(name = "mongosearch-mcp", version, about, long_about = None)]
struct Args {
    /// Path to a TOML config file (defaults to the user config directory)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing();

    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    run_detached(run(config)).context("Failed to start the async runtime")?
}

async fn run(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        mongodb = %redact_uri(&config.mongodb.uri),
        database = %config.mongodb.database,
        opensearch = %config.opensearch.base_url(),
        default_limit = config.limits.default_limit,
        max_limit = config.limits.max_limit,
        "Starting mongosearch-mcp"
    );

    let documents: Arc<dyn DocumentStore> = Arc::new(MongoHandle::new(config.mongodb.clone()));
    let search: Arc<dyn SearchIndex> = Arc::new(OpenSearchHandle::new(config.opensearch.clone()));
    let limits = ResultLimits::from(&config.limits);

    let coordinator = ShutdownCoordinator::new();
    let signals = coordinator.listen_for_signals();
    let handle = coordinator.handle();
    let phases = &coordinator;

    let served = with_app_context(documents, search, |context| async move {
        let server = McpServer::new(Gateway::new(context, limits));
        let result = server
            .serve(tokio::io::stdin(), tokio::io::stdout(), handle)
            .await;
        phases.advance(ShutdownPhase::ClosingConnections);
        result
    })
    .await;

    signals.abort();
    coordinator.advance(ShutdownPhase::Complete);
    tracing::info!(signaled = coordinator.is_shutting_down(), "Stopped");

    match served {
        Ok(transport) => transport.context("MCP transport failed"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to backends");
            Err(e).context("Startup failed")
        }
    }
}
