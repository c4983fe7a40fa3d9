//! Demo capability providers.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use toolgate::primitives::InvocationResult;
use toolgate::ratelimit::RateLimiter;
use toolgate::tools::{
    CapabilityProvider, OperationEntry, ParamSpec, ParamType, ToolArgs, ToolResult, bind,
};

/// Zero-configuration provider reporting the current UTC time.
#[derive(Debug, Default)]
pub struct ClockProvider;

impl ClockProvider {
    async fn current_time(&self, _: ToolArgs) -> ToolResult<InvocationResult> {
        Ok(InvocationResult::success(rfc3339(Utc::now())))
    }

    async fn unix_to_utc(&self, args: ToolArgs) -> ToolResult<InvocationResult> {
        let seconds = args.i64("timestamp").unwrap_or_default();
        Ok(match DateTime::from_timestamp(seconds, 0) {
            Some(time) => InvocationResult::success(rfc3339(time)),
            None => InvocationResult::failure(format!("timestamp {seconds} is out of range")),
        })
    }
}

fn rfc3339(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl CapabilityProvider for ClockProvider {
    fn label(&self) -> &str {
        "clock"
    }

    fn operations(self: Arc<Self>) -> Vec<OperationEntry> {
        vec![
            OperationEntry::tool(
                "current_time",
                bind(&self, |this: Arc<Self>, args| async move { this.current_time(args).await }),
            )
            .describe("Get the current UTC time in RFC 3339 format."),
            OperationEntry::tool(
                "unix_to_utc",
                bind(&self, |this: Arc<Self>, args| async move { this.unix_to_utc(args).await }),
            )
            .describe("Convert a Unix timestamp in seconds to UTC.")
            .param(ParamSpec::required("timestamp", ParamType::Integer)),
        ]
    }
}

#[derive(Clone, Copy, Debug, Serialize)]
struct Quote {
    price: f64,
    change_percent: f64,
}

#[derive(Debug, Deserialize)]
struct QuoteArgs {
    symbol: String,
}

#[derive(Debug, Deserialize)]
struct PeersArgs {
    symbol: String,
    max_items: usize,
}

/// Quote provider backed by a fixed table and metered by a shared limiter.
pub struct QuotesProvider {
    limiter: RateLimiter,
    table: BTreeMap<&'static str, Quote>,
}

impl QuotesProvider {
    /// Creates the provider; every tool call consumes one slot of `limiter`.
    #[must_use]
    pub fn new(limiter: RateLimiter) -> Self {
        let table = [
            ("AAPL", 189.50, 0.42),
            ("AMZN", 178.12, -1.07),
            ("GOOG", 165.33, 0.15),
            ("MSFT", 411.25, 0.88),
            ("NVDA", 121.40, 2.31),
        ]
        .into_iter()
        .map(|(symbol, price, change_percent)| {
            (
                symbol,
                Quote {
                    price,
                    change_percent,
                },
            )
        })
        .collect();
        Self { limiter, table }
    }

    async fn company_quote(&self, args: ToolArgs) -> ToolResult<InvocationResult> {
        let QuoteArgs { symbol } = args.parse()?;
        let symbol = symbol.trim().to_ascii_uppercase();
        let quote = self
            .limiter
            .metered(async { self.table.get(symbol.as_str()).copied() })
            .await?;

        Ok(match quote {
            Some(quote) => InvocationResult::success(serde_json::json!({
                "symbol": symbol,
                "price": quote.price,
                "change_percent": quote.change_percent,
            })),
            None => InvocationResult::failure("symbol not found"),
        })
    }

    async fn company_peers(&self, args: ToolArgs) -> ToolResult<InvocationResult> {
        let PeersArgs { symbol, max_items } = args.parse()?;
        let symbol = symbol.trim().to_ascii_uppercase();
        let known = self.limiter.metered(async { self.table.contains_key(symbol.as_str()) }).await?;
        if !known {
            return Ok(InvocationResult::failure("symbol not found"));
        }

        let peers: Vec<&str> = self
            .table
            .keys()
            .copied()
            .filter(|peer| *peer != symbol)
            .take(max_items)
            .collect();
        Ok(InvocationResult::success(format!(
            "Peers of {symbol}: {}",
            peers.join(", ")
        )))
    }

    async fn listed_symbols(&self, _: ToolArgs) -> ToolResult<InvocationResult> {
        let listing = self
            .limiter
            .metered(async {
                self.table
                    .keys()
                    .map(|symbol| format!("- {symbol}"))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .await?;
        Ok(InvocationResult::success(listing))
    }
}

impl CapabilityProvider for QuotesProvider {
    fn label(&self) -> &str {
        "quotes"
    }

    fn operations(self: Arc<Self>) -> Vec<OperationEntry> {
        vec![
            OperationEntry::tool(
                "company_quote",
                bind(&self, |this: Arc<Self>, args| async move { this.company_quote(args).await }),
            )
            .describe("Get the latest price and daily change for a ticker symbol.")
            .param(ParamSpec::text("symbol")),
            OperationEntry::tool(
                "company_peers",
                bind(&self, |this: Arc<Self>, args| async move { this.company_peers(args).await }),
            )
            .describe("List companies trading alongside a ticker symbol.")
            .param(ParamSpec::text("symbol"))
            .param(ParamSpec::optional("max_items", ParamType::Integer, 3)),
            OperationEntry::tool(
                "listed_symbols",
                bind(&self, |this: Arc<Self>, args| async move { this.listed_symbols(args).await }),
            ),
            OperationEntry::internal("limiter_policy", {
                let key = self.limiter.policy().key().to_string();
                move |_: ToolArgs| {
                    let key = key.clone();
                    async move { Ok(InvocationResult::success(key)) }
                }
            }),
        ]
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::{Value, json};
    use tokio::time::Instant;
    use toolgate::primitives::QuotaKey;
    use toolgate::ratelimit::{MemoryQuotaStore, RateLimitPolicy, TokioClock};
    use toolgate::tools::{ToolOutput, ToolRegistry};

    use super::*;

    fn registry(max_requests: u32) -> ToolRegistry {
        let policy =
            RateLimitPolicy::new(QuotaKey::global("quotes").unwrap(), max_requests, 60).unwrap();
        let limiter = RateLimiter::new(policy, Arc::new(MemoryQuotaStore::new()))
            .with_clock(Arc::new(TokioClock::starting_at(1_700_000_000)));
        ToolRegistry::build([
            Arc::new(ClockProvider) as Arc<dyn CapabilityProvider>,
            Arc::new(QuotesProvider::new(limiter)),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn exposes_only_tool_operations() {
        let registry = registry(10);
        assert_eq!(
            registry.names(),
            vec![
                "company_peers",
                "company_quote",
                "current_time",
                "listed_symbols",
                "unix_to_utc"
            ]
        );
        assert!(registry.get("limiter_policy").is_none());
    }

    #[tokio::test]
    async fn clock_tools_report_utc() {
        let registry = registry(10);

        let output = registry.invoke("current_time", Value::Null).await.unwrap();
        assert!(DateTime::parse_from_rfc3339(output.text()).is_ok());

        let output = registry
            .invoke("unix_to_utc", json!({ "timestamp": "0" }))
            .await
            .unwrap();
        assert_eq!(output, ToolOutput::Success("1970-01-01T00:00:00Z".into()));
    }

    #[tokio::test]
    async fn quotes_come_from_the_table() {
        let registry = registry(10);

        let output = registry
            .invoke("company_quote", json!({ "symbol": "msft" }))
            .await
            .unwrap();
        let payload: Value = serde_json::from_str(output.text()).unwrap();
        assert_eq!(payload["symbol"], "MSFT");
        assert_eq!(payload["price"], 411.25);

        let output = registry
            .invoke("company_peers", json!({ "symbol": "AAPL", "max_items": 2 }))
            .await
            .unwrap();
        assert_eq!(output.text(), "Peers of AAPL: AMZN, GOOG");

        let output = registry
            .invoke("company_quote", json!({ "symbol": "ZZZZ" }))
            .await
            .unwrap();
        assert_eq!(output.text(), "Tool company_quote failed: symbol not found");
    }

    #[tokio::test(start_paused = true)]
    async fn quote_tools_share_one_window() {
        let registry = registry(1);
        let started = Instant::now();

        registry.invoke("listed_symbols", Value::Null).await.unwrap();
        registry
            .invoke("company_quote", json!({ "symbol": "AAPL" }))
            .await
            .unwrap();

        assert_eq!(started.elapsed(), Duration::from_secs(60));
    }
}
