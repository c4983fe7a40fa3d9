//! Per-tool invocation metrics.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use gate_primitives::ToolName;
use gate_tools::InvocationObserver;
use serde::Serialize;
use serde_json::Value;
use sysinfo::System;
use tracing::debug;

/// Aggregated timings for one tool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ToolStats {
    /// Completed invocations.
    pub calls: u64,
    /// Invocations that produced a failure signal.
    pub failures: u64,
    /// Sum of invocation durations.
    pub total: Duration,
    /// Longest single invocation.
    pub max: Duration,
}

impl ToolStats {
    /// Returns the mean invocation duration, or zero before the first call.
    #[must_use]
    pub fn mean(&self) -> Duration {
        u32::try_from(self.calls)
            .ok()
            .filter(|calls| *calls > 0)
            .map_or(Duration::ZERO, |calls| self.total / calls)
    }

    fn record(&mut self, elapsed: Duration, success: bool) {
        self.calls += 1;
        if !success {
            self.failures += 1;
        }
        self.total += elapsed;
        self.max = self.max.max(elapsed);
    }
}

/// Host and user a process reports its timings under.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Origin {
    /// Machine host name.
    pub hostname: String,
    /// Account running the process.
    pub username: String,
}

impl Origin {
    /// Detects the current host name and user, falling back to `unknown`.
    #[must_use]
    pub fn detect() -> Self {
        let username = ["USER", "USERNAME"]
            .into_iter()
            .find_map(|name| std::env::var(name).ok().filter(|value| !value.is_empty()));
        Self {
            hostname: System::host_name().unwrap_or_else(|| UNKNOWN.to_owned()),
            username: username.unwrap_or_else(|| UNKNOWN.to_owned()),
        }
    }
}

const UNKNOWN: &str = "unknown";

/// Observer that keeps call counts and durations per tool.
///
/// Every timing is also emitted as a `debug!` event tagged with the tool,
/// host name, and user. Combine it with [`gate_tools::TracingObserver`]
/// through a [`gate_tools::CompositeObserver`] to keep the audit log.
#[derive(Debug)]
pub struct ToolMetrics {
    origin: Origin,
    stats: Mutex<HashMap<ToolName, ToolStats>>,
}

impl Default for ToolMetrics {
    fn default() -> Self {
        Self::with_origin(Origin::detect())
    }
}

impl ToolMetrics {
    /// Creates an empty metrics observer tagged with the detected [`Origin`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty metrics observer tagged with `origin`.
    #[must_use]
    pub fn with_origin(origin: Origin) -> Self {
        Self {
            origin,
            stats: Mutex::default(),
        }
    }

    /// Returns the host and user timings are tagged with.
    #[must_use]
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Returns the stats recorded for `tool`, if it was ever invoked.
    #[must_use]
    pub fn get(&self, tool: &str) -> Option<ToolStats> {
        self.lock()
            .iter()
            .find(|(name, _)| name.as_str() == tool)
            .map(|(_, stats)| *stats)
    }

    /// Returns a copy of every tool's stats, ordered by tool name.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, ToolStats> {
        self.lock()
            .iter()
            .map(|(name, stats)| (name.as_str().to_owned(), *stats))
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ToolName, ToolStats>> {
        // Counters stay meaningful even if a recording thread panicked.
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl InvocationObserver for ToolMetrics {
    fn on_call(&self, _tool: &ToolName, _args: &Value) {}

    fn on_success(&self, _tool: &ToolName, _payload: &Value) {}

    fn on_failure(&self, _tool: &ToolName, _diagnostic: &str) {}

    fn on_complete(&self, tool: &ToolName, elapsed: Duration, success: bool) {
        let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        debug!(
            tool = %tool,
            hostname = %self.origin.hostname,
            username = %self.origin.username,
            duration_ms,
            success,
            "tool timing"
        );
        self.lock()
            .entry(tool.clone())
            .or_default()
            .record(elapsed, success);
    }
}
