//! Console for listing and invoking toolgate tools.
//!
//! ```text
//! tool-console list
//! tool-console --memory-store call company_quote --args '{"symbol":"AAPL"}'
//! ```

mod providers;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use toolgate::config::{self, GatewayConfig};
use toolgate::primitives::QuotaKey;
use toolgate::ratelimit::{
    MemoryQuotaStore, QuotaStore, RateLimitPolicy, RateLimiter, RedisQuotaStore,
};
use toolgate::telemetry::{ToolMetrics, tracing_support};
use toolgate::tools::{
    CapabilityProvider, CompositeObserver, InvocationObserver, ToolRegistry, TracingObserver,
};
use tracing::debug;

use crate::providers::{ClockProvider, QuotesProvider};

const QUOTES_NAMESPACE: &str = "quotes";

#[derive(Parser)]
#[command(name = "tool-console")]
#[command(about = "List and invoke rate-limited tools", version)]
struct Cli {
    /// Path to a toolgate TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Keep sliding windows in process memory instead of Redis
    #[arg(long, global = true)]
    memory_store: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print every tool with its description and argument schema
    List,
    /// Invoke a tool and print its output
    Call {
        /// Tool name as printed by `list`
        tool: String,
        /// Named arguments as a JSON object
        #[arg(long)]
        args: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = config::load_or_default(cli.config.as_deref())?;
    tracing_support::init(config.logging.filter.as_deref())?;

    let metrics = Arc::new(ToolMetrics::new());
    let registry = build_registry(&config, cli.memory_store, Arc::clone(&metrics)).await?;

    match cli.command {
        Command::List => {
            list(&registry)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Call { tool, args } => {
            let args = match args {
                Some(raw) => serde_json::from_str(&raw)
                    .with_context(|| format!("--args is not valid JSON: {raw}"))?,
                None => Value::Null,
            };
            let output = registry.invoke(&tool, args).await?;
            debug!(metrics = ?metrics.snapshot(), "invocation timings");

            println!("{output}");
            Ok(if output.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

async fn build_registry(
    config: &GatewayConfig,
    memory_store: bool,
    metrics: Arc<ToolMetrics>,
) -> Result<ToolRegistry> {
    let policy = quotes_policy(config)?;
    let limiter = if memory_store {
        let store: Arc<dyn QuotaStore> = Arc::new(MemoryQuotaStore::new());
        RateLimiter::connect(policy, store).await?
    } else {
        let url = config.quota_store.url();
        let store = RedisQuotaStore::connect(&url)
            .await
            .with_context(|| format!("cannot open quota store at {url}"))?;
        RateLimiter::connect_or_exit(policy, Arc::new(store)).await
    };

    let observer = CompositeObserver::new([
        Arc::new(TracingObserver) as Arc<dyn InvocationObserver>,
        metrics as Arc<dyn InvocationObserver>,
    ]);

    let registry = ToolRegistry::builder()
        .observer(Arc::new(observer))
        .reject_duplicates(config.registry.reject_duplicates)
        .provider(Arc::new(ClockProvider) as Arc<dyn CapabilityProvider>)
        .provider(Arc::new(QuotesProvider::new(limiter)))
        .build()?;
    Ok(registry)
}

fn quotes_policy(config: &GatewayConfig) -> Result<RateLimitPolicy> {
    if config.limit(QUOTES_NAMESPACE).is_some() {
        return config.policy(QUOTES_NAMESPACE);
    }
    // Same budget as the free Finnhub tier the quote tools stand in for.
    let key = QuotaKey::global(QUOTES_NAMESPACE)?;
    Ok(RateLimitPolicy::new(key, 50, 60)?)
}

fn list(registry: &ToolRegistry) -> Result<()> {
    for descriptor in registry.descriptors() {
        println!("{}: {}", descriptor.name(), descriptor.description());
        println!(
            "{}",
            serde_json::to_string_pretty(&descriptor.json_schema())
                .context("failed to render schema")?
        );
    }
    Ok(())
}
