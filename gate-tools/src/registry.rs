//! Registry of tools built once from capability providers.

use std::collections::HashMap;
use std::sync::Arc;

use gate_ratelimit::QuotaError;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::adapter::{DispatchAdapter, ToolOutput};
use crate::descriptor::ToolDescriptor;
use crate::observer::{InvocationObserver, TracingObserver};
use crate::provider::CapabilityProvider;

/// Result alias for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Descriptor paired with the adapter that dispatches to it.
#[derive(Clone, Debug)]
pub struct Tool {
    descriptor: Arc<ToolDescriptor>,
    adapter: DispatchAdapter,
}

impl Tool {
    /// Returns the associated descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    /// Invokes the tool with named arguments.
    pub async fn call(&self, args: Value) -> ToolOutput {
        self.adapter.call(args).await
    }
}

/// Builder collecting providers before the registry is frozen.
pub struct ToolRegistryBuilder {
    providers: Vec<Arc<dyn CapabilityProvider>>,
    observer: Arc<dyn InvocationObserver>,
    reject_duplicates: bool,
}

impl Default for ToolRegistryBuilder {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            observer: Arc::new(TracingObserver),
            reject_duplicates: false,
        }
    }
}

impl ToolRegistryBuilder {
    /// Appends a provider. Order matters only when tool names collide.
    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn CapabilityProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Appends several providers in order.
    #[must_use]
    pub fn providers<I>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn CapabilityProvider>>,
    {
        self.providers.extend(providers);
        self
    }

    /// Sets the observer handed to every dispatch adapter.
    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn InvocationObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Rejects colliding tool names instead of letting the later one shadow.
    #[must_use]
    pub fn reject_duplicates(mut self, reject: bool) -> Self {
        self.reject_duplicates = reject;
        self
    }

    /// Walks every provider once and freezes the resulting tool set.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidDescriptor`] for a malformed registration
    /// entry and, when duplicates are rejected, [`ToolError::DuplicateTool`].
    pub fn build(self) -> ToolResult<ToolRegistry> {
        let mut tools: HashMap<String, Tool> = HashMap::new();

        for provider in self.providers {
            let label = provider.label().to_owned();
            for entry in provider.operations() {
                if !entry.is_eligible() {
                    debug!(provider = %label, operation = entry.name(), "skipping non-tool operation");
                    continue;
                }

                let (declared, description, params, operation) = entry.into_parts();
                let descriptor = Arc::new(ToolDescriptor::new(
                    &declared,
                    description.as_deref(),
                    params,
                )?);
                let name = descriptor.name().as_str().to_owned();

                if tools.contains_key(&name) {
                    if self.reject_duplicates {
                        return Err(ToolError::DuplicateTool { name });
                    }
                    warn!(provider = %label, tool = %name, "tool name collision, later registration wins");
                }

                let adapter = DispatchAdapter::new(
                    Arc::clone(&descriptor),
                    operation,
                    Arc::clone(&self.observer),
                );
                tools.insert(name, Tool { descriptor, adapter });
            }
        }

        info!(tools = tools.len(), "tool registry built");
        Ok(ToolRegistry { tools })
    }
}

/// Read-only mapping from tool name to tool.
pub struct ToolRegistry {
    tools: HashMap<String, Tool>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("registered", &self.names())
            .finish()
    }
}

impl ToolRegistry {
    /// Starts a registry builder with the tracing observer.
    #[must_use]
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// Builds a registry from providers using the default settings.
    ///
    /// # Errors
    ///
    /// See [`ToolRegistryBuilder::build`].
    pub fn build<I>(providers: I) -> ToolResult<Self>
    where
        I: IntoIterator<Item = Arc<dyn CapabilityProvider>>,
    {
        Self::builder().providers(providers).build()
    }

    /// Returns the tool registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    /// Invokes a registered tool.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownTool`] when no tool has that name. Every
    /// other outcome is reported through the returned [`ToolOutput`].
    pub async fn invoke(&self, name: &str, args: Value) -> ToolResult<ToolOutput> {
        let tool = self.get(name).ok_or_else(|| ToolError::UnknownTool {
            name: name.to_owned(),
        })?;
        Ok(tool.call(args).await)
    }

    /// Returns every tool name, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Lists the descriptors of all tools, sorted by name.
    #[must_use]
    pub fn descriptors(&self) -> Vec<&ToolDescriptor> {
        let mut descriptors: Vec<&ToolDescriptor> =
            self.tools.values().map(Tool::descriptor).collect();
        descriptors.sort_unstable_by(|a, b| a.name().cmp(b.name()));
        descriptors
    }

    /// Returns the number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` if no tools were registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Errors produced by tool registration and invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    /// A registration entry could not be turned into a descriptor.
    #[error("invalid tool descriptor: {reason}")]
    InvalidDescriptor {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Caller-supplied arguments did not match the schema.
    #[error("invalid arguments: {reason}")]
    InvalidArguments {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Tool name collided with an earlier registration.
    #[error("tool `{name}` is already registered")]
    DuplicateTool {
        /// Name of the offending tool.
        name: String,
    },

    /// Requested tool does not exist.
    #[error("tool `{name}` is not registered")]
    UnknownTool {
        /// Name of the missing tool.
        name: String,
    },

    /// The operation raised an error.
    #[error("{reason}")]
    Execution {
        /// Message of the raised error.
        reason: String,
    },

    /// The rate limiter guarding the operation failed.
    #[error(transparent)]
    Quota(#[from] QuotaError),
}

impl ToolError {
    /// Creates an execution error from the supplied reason.
    #[must_use]
    pub fn execution(reason: impl Into<String>) -> Self {
        Self::Execution {
            reason: reason.into(),
        }
    }

    /// Creates an argument error from the supplied reason.
    #[must_use]
    pub fn invalid_arguments(reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            reason: reason.into(),
        }
    }
}

impl From<gate_primitives::Error> for ToolError {
    fn from(err: gate_primitives::Error) -> Self {
        Self::InvalidDescriptor {
            reason: err.to_string(),
        }
    }
}
