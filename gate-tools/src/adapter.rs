//! Dispatch adapters: the single normalisation point of every tool.

use std::any::Any;
use std::fmt::{self, Display, Formatter};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use gate_primitives::InvocationResult;
use serde_json::Value;

use crate::args::ToolArgs;
use crate::descriptor::ToolDescriptor;
use crate::observer::InvocationObserver;
use crate::provider::Operation;
use crate::registry::{ToolError, ToolResult};

/// Text returned to the caller together with the outcome signal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToolOutput {
    /// Textual form of the operation's payload.
    Success(String),
    /// `Tool {name} failed: {diagnostic}`.
    Failure(String),
}

impl ToolOutput {
    /// Returns the text regardless of outcome.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Success(text) | Self::Failure(text) => text,
        }
    }

    /// Returns `true` for [`ToolOutput::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Consumes the output, returning the text.
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Success(text) | Self::Failure(text) => text,
        }
    }
}

impl Display for ToolOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Validates arguments, invokes the operation, and normalises the outcome.
///
/// Neither errors nor panics raised by the operation escape [`DispatchAdapter::call`].
#[derive(Clone)]
pub struct DispatchAdapter {
    descriptor: Arc<ToolDescriptor>,
    operation: Arc<dyn Operation>,
    observer: Arc<dyn InvocationObserver>,
}

impl fmt::Debug for DispatchAdapter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchAdapter")
            .field("tool", &self.descriptor.name())
            .finish_non_exhaustive()
    }
}

impl DispatchAdapter {
    /// Creates an adapter for the supplied descriptor and operation.
    #[must_use]
    pub fn new(
        descriptor: Arc<ToolDescriptor>,
        operation: Arc<dyn Operation>,
        observer: Arc<dyn InvocationObserver>,
    ) -> Self {
        Self {
            descriptor,
            operation,
            observer,
        }
    }

    /// Returns the descriptor this adapter validates against.
    #[must_use]
    pub fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    /// Invokes the tool with named arguments (`null` for none).
    pub async fn call(&self, args: Value) -> ToolOutput {
        let name = self.descriptor.name();
        self.observer.on_call(name, &args);
        let started = Instant::now();

        let output = match self.run(args).await {
            Ok(InvocationResult::Success(payload)) => {
                self.observer.on_success(name, &payload);
                ToolOutput::Success(render(payload))
            }
            Ok(InvocationResult::Failure(diagnostic)) => self.fail(&diagnostic),
            Err(err) => self.fail(&err.to_string()),
        };

        self.observer
            .on_complete(name, started.elapsed(), output.is_success());
        output
    }

    async fn run(&self, args: Value) -> ToolResult<InvocationResult> {
        let args = ToolArgs::validate(self.descriptor.schema(), args)?;
        AssertUnwindSafe(self.operation.invoke(args))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(ToolError::execution(panic_message(panic.as_ref()))))
    }

    fn fail(&self, diagnostic: &str) -> ToolOutput {
        let name = self.descriptor.name();
        self.observer.on_failure(name, diagnostic);
        ToolOutput::Failure(format!("Tool {name} failed: {diagnostic}"))
    }
}

fn render(payload: Value) -> String {
    match payload {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "operation panicked".to_owned()
    }
}
