//! Observability hooks injected into the registry and its adapters.

use std::sync::Arc;
use std::time::Duration;

use gate_primitives::ToolName;
use serde_json::Value;
use tracing::{debug, error, info};

/// Observer invoked around every tool invocation.
pub trait InvocationObserver: Send + Sync {
    /// Called before the operation runs, with the raw caller arguments.
    fn on_call(&self, tool: &ToolName, args: &Value);

    /// Called with the raw payload of a successful invocation.
    fn on_success(&self, tool: &ToolName, payload: &Value);

    /// Called with the diagnostic of a failed invocation.
    fn on_failure(&self, tool: &ToolName, diagnostic: &str);

    /// Called once the outcome is known.
    fn on_complete(&self, _tool: &ToolName, _elapsed: Duration, _success: bool) {}
}

/// Observer that writes the invocation audit trail to `tracing`.
///
/// Calls are logged at info, failures at error, and successful payloads at
/// debug.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl InvocationObserver for TracingObserver {
    fn on_call(&self, tool: &ToolName, args: &Value) {
        info!(tool = %tool, args = %args, "tool call");
    }

    fn on_success(&self, tool: &ToolName, payload: &Value) {
        debug!(tool = %tool, payload = %payload, "tool result");
    }

    fn on_failure(&self, tool: &ToolName, diagnostic: &str) {
        error!(tool = %tool, error = diagnostic, "tool error");
    }
}

/// Composite observer that forwards to a collection of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn InvocationObserver>>,
}

impl CompositeObserver {
    /// Creates a new composite observer from the supplied list.
    #[must_use]
    pub fn new<I>(observers: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn InvocationObserver>>,
    {
        Self {
            observers: observers.into_iter().collect(),
        }
    }

    /// Adds an observer to the composite set.
    pub fn push(&mut self, observer: Arc<dyn InvocationObserver>) {
        self.observers.push(observer);
    }
}

impl InvocationObserver for CompositeObserver {
    fn on_call(&self, tool: &ToolName, args: &Value) {
        for observer in &self.observers {
            observer.on_call(tool, args);
        }
    }

    fn on_success(&self, tool: &ToolName, payload: &Value) {
        for observer in &self.observers {
            observer.on_success(tool, payload);
        }
    }

    fn on_failure(&self, tool: &ToolName, diagnostic: &str) {
        for observer in &self.observers {
            observer.on_failure(tool, diagnostic);
        }
    }

    fn on_complete(&self, tool: &ToolName, elapsed: Duration, success: bool) {
        for observer in &self.observers {
            observer.on_complete(tool, elapsed, success);
        }
    }
}
