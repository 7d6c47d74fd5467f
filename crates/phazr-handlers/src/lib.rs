//! phazr-handlers: Operation handlers
//!
//! Provides the handler interface, the type-tag registry, and the built-in
//! handlers for shell, kubectl and HTTP operations.

pub mod handler;
pub mod http;
pub mod kubectl;
pub mod process;
pub mod registry;
pub mod script;

// Re-export main types
pub use handler::{BoxedHandler, OperationHandler};
pub use http::HttpRequestHandler;
pub use kubectl::{
    KubectlApplyHandler, KubectlDeleteHandler, KubectlExecHandler, KubectlRestartHandler,
};
pub use registry::HandlerRegistry;
pub use script::ScriptHandler;
