//! Tool registration and dispatch.
//!
//! Capability providers list their operations in an explicit registration
//! table ([`provider::CapabilityProvider`]). The registry turns every
//! tool-eligible entry into a [`registry::Tool`]: a descriptor carrying the
//! parameter schema plus a dispatch adapter that validates arguments, invokes
//! the operation, and collapses every outcome into one string and one
//! success/failure signal.

#![warn(missing_docs, clippy::pedantic)]

pub mod adapter;
pub mod args;
pub mod descriptor;
pub mod observer;
pub mod provider;
pub mod registry;
pub mod schema;

pub use adapter::{DispatchAdapter, ToolOutput};
pub use args::ToolArgs;
pub use descriptor::{NO_DESCRIPTION, ToolDescriptor};
pub use gate_primitives::{InvocationResult, ToolName};
pub use observer::{CompositeObserver, InvocationObserver, TracingObserver};
pub use provider::{CapabilityProvider, Operation, OperationEntry, bind};
pub use registry::{Tool, ToolError, ToolRegistry, ToolRegistryBuilder, ToolResult};
pub use schema::{ParamSchema, ParamSpec, ParamType};
