//! Explicit registration tables for capability providers.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use gate_primitives::InvocationResult;

use crate::args::ToolArgs;
use crate::registry::ToolResult;
use crate::schema::ParamSpec;

/// Trait implemented by every operation a provider exposes.
///
/// Returning `Err` is the "raised" path: the dispatch adapter reports it the
/// same way as an [`InvocationResult::Failure`].
#[async_trait]
pub trait Operation: Send + Sync {
    /// Invokes the operation with validated arguments.
    async fn invoke(&self, args: ToolArgs) -> ToolResult<InvocationResult>;
}

#[async_trait]
impl<F, Fut> Operation for F
where
    F: Send + Sync + Fn(ToolArgs) -> Fut,
    Fut: Future<Output = ToolResult<InvocationResult>> + Send,
{
    async fn invoke(&self, args: ToolArgs) -> ToolResult<InvocationResult> {
        (self)(args).await
    }
}

/// Binds a provider method to an [`Operation`] that owns a handle to the provider.
pub fn bind<P, F, Fut>(provider: &Arc<P>, method: F) -> impl Operation + 'static
where
    P: Send + Sync + 'static,
    F: Fn(Arc<P>, ToolArgs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ToolResult<InvocationResult>> + Send + 'static,
{
    let provider = Arc::clone(provider);
    move |args: ToolArgs| method(Arc::clone(&provider), args)
}

/// One row of a provider's registration table.
pub struct OperationEntry {
    name: String,
    description: Option<String>,
    params: Vec<ParamSpec>,
    exposed: bool,
    operation: Arc<dyn Operation>,
}

impl fmt::Debug for OperationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationEntry")
            .field("name", &self.name)
            .field("exposed", &self.exposed)
            .field("params", &self.params.len())
            .finish_non_exhaustive()
    }
}

impl OperationEntry {
    /// Declares an operation marked as tool-eligible.
    #[must_use]
    pub fn tool(name: impl Into<String>, operation: impl Operation + 'static) -> Self {
        Self {
            name: name.into(),
            description: None,
            params: Vec::new(),
            exposed: true,
            operation: Arc::new(operation),
        }
    }

    /// Declares an operation that is listed but never exposed as a tool.
    #[must_use]
    pub fn internal(name: impl Into<String>, operation: impl Operation + 'static) -> Self {
        Self {
            exposed: false,
            ..Self::tool(name, operation)
        }
    }

    /// Attaches the human-readable description.
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Appends a parameter declaration.
    #[must_use]
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Returns the declared operation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` when the entry carries the tool marker.
    #[must_use]
    pub const fn is_exposed(&self) -> bool {
        self.exposed
    }

    /// Returns `true` when the entry is marked and its name is not private.
    ///
    /// A leading underscore keeps an operation private even when marked.
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        self.exposed && !self.name.starts_with('_')
    }

    pub(crate) fn into_parts(
        self,
    ) -> (String, Option<String>, Vec<ParamSpec>, Arc<dyn Operation>) {
        (self.name, self.description, self.params, self.operation)
    }
}

/// Object bundling related external-API operations.
pub trait CapabilityProvider: Send + Sync {
    /// Short provider label used in logs.
    fn label(&self) -> &str;

    /// Lists the provider's operations.
    fn operations(self: Arc<Self>) -> Vec<OperationEntry>;
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn noop(_: ToolArgs) -> ToolResult<InvocationResult> {
        Ok(InvocationResult::success("ok"))
    }

    #[test]
    fn eligibility_requires_marker_and_public_name() {
        assert!(OperationEntry::tool("market_status", noop).is_eligible());
        assert!(!OperationEntry::internal("market_status", noop).is_eligible());
        assert!(!OperationEntry::tool("_format_results", noop).is_eligible());
        assert!(OperationEntry::tool("_format_results", noop).is_exposed());
    }

    struct Counter {
        base: i64,
    }

    impl Counter {
        async fn add(&self, args: ToolArgs) -> ToolResult<InvocationResult> {
            let delta = args.i64("delta").unwrap_or_default();
            Ok(InvocationResult::success(self.base + delta))
        }
    }

    #[tokio::test]
    async fn bind_keeps_provider_alive() {
        let counter = Arc::new(Counter { base: 40 });
        let operation = bind(&counter, |this: Arc<Counter>, args| async move { this.add(args).await });
        drop(counter);

        let args = ToolArgs::validate(
            &crate::schema::ParamSchema::build(
                "add",
                vec![ParamSpec::required("delta", crate::schema::ParamType::Integer)],
            )
            .unwrap(),
            serde_json::json!({ "delta": 2 }),
        )
        .unwrap();
        let result = operation.invoke(args).await.unwrap();
        assert_eq!(result, InvocationResult::success(42));
    }
}
