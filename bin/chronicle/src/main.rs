//! Chronicle - BelizeChain account transaction history.
//!
//! # Usage
//!
//! ```bash
//! # Serve the GraphQL API with an in-memory cache
//! WS_URL=ws://localhost:9944 chronicle serve
//!
//! # Persist the cache in PostgreSQL
//! DATABASE_URL=postgres://localhost/chronicle chronicle serve
//!
//! # One-shot lookup, printed as JSON
//! chronicle history 5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY --direction sent
//!
//! # Drop cached history
//! chronicle clear-cache 5Grw...
//! chronicle clear-cache --yes
//! ```

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};
use tracing_subscriber::{EnvFilter, fmt};

use chronicle_core::error::HistoryError;
use chronicle_core::metrics::init_metrics;
use chronicle_core::models::Asset;
use chronicle_core::ports::{CacheStore, ChainGateway, StorageHealth, SystemClock};
use chronicle_core::services::{
    BlockScanner, Classifier, ClassifierConfig, Direction, HistoryCache, HistoryConfig,
    HistoryFilter, HistoryService, ScanConfig,
};
use chronicle_graphql::{ServerConfig, build_schema, serve_with_shutdown};
use chronicle_pallets::default_registry;
use chronicle_storage::{Database, DatabaseConfig, MemoryCacheStore, PgCacheStore};
use chronicle_substrate::{SubstrateGateway, SubstrateGatewayConfig};

/// Chronicle CLI - BelizeChain transaction history.
#[derive(Parser, Debug)]
#[command(name = "chronicle")]
#[command(about = "Chronicle - account transaction history for BelizeChain")]
#[command(version)]
struct Cli {
    /// Substrate node WebSocket URL.
    #[arg(long, global = true, env = "WS_URL", default_value = "ws://127.0.0.1:9944")]
    ws_url: String,

    /// PostgreSQL URL for the history cache. In-memory when unset.
    #[arg(long, global = true, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Prometheus metrics port.
    #[arg(long, global = true, env = "METRICS_PORT", default_value = "9090")]
    metrics_port: u16,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON log output.
    #[arg(long, global = true, env = "JSON_LOGS")]
    json_logs: bool,

    /// Decimals of the chain's native units.
    #[arg(long, global = true, env = "CHAIN_DECIMALS", default_value = "12")]
    chain_decimals: u32,

    /// Blocks below the chain tip covered by a scan.
    #[arg(long, global = true, env = "SCAN_LOOKBACK", default_value = "10000")]
    scan_lookback: u64,

    /// Transactions kept per account.
    #[arg(long, global = true, env = "SCAN_MAX_RESULTS", default_value = "100")]
    scan_max_results: usize,

    /// Blocks fetched ahead during a scan (1 = sequential).
    #[arg(long, global = true, env = "SCAN_CONCURRENCY", default_value = "1")]
    scan_concurrency: usize,

    /// Timeout for each node RPC call, in seconds.
    #[arg(long, global = true, env = "RPC_TIMEOUT_SECS", default_value = "10")]
    rpc_timeout_secs: u64,

    /// How long cached history is served without rescanning, in seconds.
    #[arg(long, global = true, env = "CACHE_FRESHNESS_SECS", default_value = "30")]
    cache_freshness_secs: u64,

    /// GraphQL server port.
    #[arg(long, global = true, env = "GRAPHQL_PORT", default_value = "4000")]
    graphql_port: u16,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Serve the GraphQL API (default).
    Serve,
    /// Look up one account's history and print it as JSON.
    History {
        address: String,
        /// all, sent, received or staking.
        #[arg(long, default_value = "all")]
        direction: Direction,
        /// DALLA or bBZD.
        #[arg(long)]
        asset: Option<Asset>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Drop cached history for one account, or for every account.
    ClearCache {
        address: Option<String>,
        /// Skip the confirmation prompt when clearing every account.
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);

    match cli.command.clone().unwrap_or(Command::Serve) {
        Command::Serve => serve(&cli).await,
        Command::History {
            address,
            direction,
            asset,
            limit,
        } => {
            let filter = HistoryFilter {
                direction,
                asset,
                limit,
            };
            history(&cli, &address, &filter).await
        }
        Command::ClearCache { address, yes } => clear_cache(&cli, address.as_deref(), yes).await,
    }
}

// =============================================================================
// Commands
// =============================================================================

async fn serve(cli: &Cli) -> Result<()> {
    // Prometheus metrics exporter (optional - failures don't crash the app)
    let metrics_addr = format!("0.0.0.0:{}", cli.metrics_port);
    let metrics_enabled = match metrics_addr.parse::<std::net::SocketAddr>() {
        Ok(metrics_addr) => {
            match PrometheusBuilder::new()
                .with_http_listener(metrics_addr)
                .install()
            {
                Ok(()) => {
                    init_metrics();
                    true
                }
                Err(e) => {
                    warn!(
                        "⚠️  Failed to start metrics exporter: {}. Continuing without metrics.",
                        e
                    );
                    false
                }
            }
        }
        Err(e) => {
            warn!("⚠️  Invalid metrics address: {}. Continuing without metrics.", e);
            false
        }
    };

    // ─────────────────────────────────────────────────────────────────────────
    // 🚀 STARTUP
    // ─────────────────────────────────────────────────────────────────────────
    info!("🚀 Starting Chronicle");
    let runtime = Runtime::build(cli).await?;

    // ─────────────────────────────────────────────────────────────────────────
    // ⚡ SERVICES START
    // ─────────────────────────────────────────────────────────────────────────
    let shutdown = CancellationToken::new();
    let schema = build_schema(runtime.service.clone(), shutdown.clone());

    let graphql_config = ServerConfig {
        host: "0.0.0.0".to_string(),
        port: cli.graphql_port,
        enable_playground: true,
    };

    let storage = runtime
        .database
        .clone()
        .map(|db| Arc::new(db) as Arc<dyn StorageHealth>);

    let server_shutdown = shutdown.clone();
    let graphql_handle = tokio::spawn(
        async move {
            let shutdown_signal = server_shutdown.cancelled_owned();
            let served = serve_with_shutdown(schema, storage, graphql_config, shutdown_signal);
            if let Err(e) = served.await {
                error!(error = %e, "❌ Server error");
            }
            debug!("Server stopped");
        }
        .instrument(info_span!("graphql")),
    );

    // ─────────────────────────────────────────────────────────────────────────
    // ✅ READY
    // ─────────────────────────────────────────────────────────────────────────
    info!("✅ Chronicle ready");
    info!("   ⚡ GraphQL:  http://localhost:{}/graphql", cli.graphql_port);
    if metrics_enabled {
        info!(
            "   📊 Metrics:  http://localhost:{}/metrics",
            cli.metrics_port
        );
    } else {
        info!("   📊 Metrics:  disabled");
    }
    info!("   Press Ctrl+C to stop");

    shutdown_signal().await;

    // ─────────────────────────────────────────────────────────────────────────
    // 🛑 SHUTDOWN
    // ─────────────────────────────────────────────────────────────────────────
    info!("🛑 Shutting down...");
    shutdown.cancel();

    match tokio::time::timeout(Duration::from_secs(10), graphql_handle).await {
        Ok(_) => debug!("GraphQL stopped"),
        Err(_) => warn!("⚠️  GraphQL shutdown timed out"),
    }

    runtime.close().await;
    info!("🛑 Shutdown complete");
    Ok(())
}

async fn history(cli: &Cli, address: &str, filter: &HistoryFilter) -> Result<()> {
    let runtime = Runtime::build(cli).await?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        on_interrupt.cancel();
    });

    let result = runtime
        .service
        .get_account_history(address, filter, &cancel)
        .await;
    runtime.close().await;

    match result {
        Ok(history) => {
            let json = serde_json::to_string_pretty(&history)
                .context("Failed to serialize history")?;
            println!("{}", json);
            info!(count = history.len(), "✅ History retrieved");
            Ok(())
        }
        Err(HistoryError::Cancelled) => {
            info!("❌ Lookup cancelled");
            Ok(())
        }
        Err(e) => Err(e).context("History lookup failed"),
    }
}

async fn clear_cache(cli: &Cli, address: Option<&str>, skip_confirmation: bool) -> Result<()> {
    if address.is_none() && !skip_confirmation {
        warn!("⚠️  This will drop cached history for EVERY account");
        print!("\n🔴 Are you sure? [y/N] ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            info!("❌ Clear cancelled");
            return Ok(());
        }
    }

    let (store, database) = open_cache_store(cli).await?;
    HistoryCache::new(store).clear(address).await;
    if let Some(db) = database {
        db.close().await;
    }

    match address {
        Some(account) => info!(account, "✅ Cache cleared"),
        None => info!("✅ Cache cleared for all accounts"),
    }
    Ok(())
}

// =============================================================================
// Wiring
// =============================================================================

/// Connected gateway, cache and the service built on them.
struct Runtime {
    service: Arc<HistoryService>,
    gateway: Arc<SubstrateGateway>,
    database: Option<Database>,
}

impl Runtime {
    async fn build(cli: &Cli) -> Result<Self> {
        let (store, database) = open_cache_store(cli).await?;

        // ─────────────────────────────────────────────────────────────────────
        // 📡 SUBSTRATE CONNECTION
        // ─────────────────────────────────────────────────────────────────────
        info!("📡 Connecting to Substrate node...");
        debug!(ws_url = %cli.ws_url, "Substrate endpoint");
        let gateway_config = SubstrateGatewayConfig {
            ws_url: cli.ws_url.clone(),
        };
        let gateway = Arc::new(
            SubstrateGateway::connect(&gateway_config)
                .await
                .context("Failed to connect to Substrate node")?,
        );

        let rpc_timeout = Duration::from_secs(cli.rpc_timeout_secs);
        let head = chain_head(gateway.as_ref(), rpc_timeout).await?;
        info!(head, "🔗 Chain connected");

        let classifier = Classifier::new(
            Arc::new(default_registry()),
            ClassifierConfig {
                decimals: cli.chain_decimals,
            },
        );
        let scanner = BlockScanner::new(
            gateway.clone(),
            Arc::new(classifier),
            ScanConfig {
                call_timeout: rpc_timeout,
                concurrency: cli.scan_concurrency,
            },
        );
        let service = HistoryService::new(
            scanner,
            HistoryCache::new(store),
            Arc::new(SystemClock),
            HistoryConfig {
                lookback: cli.scan_lookback,
                max_results: cli.scan_max_results,
                freshness: Duration::from_secs(cli.cache_freshness_secs),
            },
        );

        Ok(Self {
            service: Arc::new(service),
            gateway,
            database,
        })
    }

    async fn close(self) {
        self.gateway.close();
        if let Some(db) = self.database {
            db.close().await;
        }
    }
}

/// Current chain height, failing after `limit` when the node does not answer.
async fn chain_head(gateway: &dyn ChainGateway, limit: Duration) -> Result<u64> {
    tokio::time::timeout(limit, gateway.current_height())
        .await
        .with_context(|| format!("Chain head not received within {:?}", limit))?
        .context("Failed to read chain head")
}

/// PostgreSQL store when `DATABASE_URL` is set, in-memory otherwise.
async fn open_cache_store(cli: &Cli) -> Result<(Arc<dyn CacheStore>, Option<Database>)> {
    let Some(url) = &cli.database_url else {
        info!("🗄️  Using in-memory history cache");
        return Ok((Arc::new(MemoryCacheStore::new()), None));
    };

    debug!(database_url = %mask_password(url), "Database endpoint");
    info!("🗄️  Connecting to database...");
    let db = Database::connect(&DatabaseConfig::for_cache(url))
        .await
        .context("Failed to connect to database")?;
    db.migrate().await.context("Failed to run migrations")?;
    info!("🗄️  Database ready (migrations applied)");

    Ok((Arc::new(PgCacheStore::new(&db)), Some(db)))
}

/// Initialize tracing subscriber.
fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .init();
    }
}

/// Mask password in database URL for logging.
fn mask_password(url_str: &str) -> String {
    match url::Url::parse(url_str) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("****"));
            }
            url.to_string()
        }
        Err(_) => url_str.to_string(),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
///
/// A signal handler that cannot be installed never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
