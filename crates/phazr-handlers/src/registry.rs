//! Handler Registry
//!
//! Maps operation type tags to handlers. Registration happens while the
//! orchestrator is built; the registry is read-only during a run.

use phazr_core::OperationType;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::handler::{BoxedHandler, OperationHandler};
use crate::http::HttpRequestHandler;
use crate::kubectl::{
    KubectlApplyHandler, KubectlDeleteHandler, KubectlExecHandler, KubectlRestartHandler,
};
use crate::script::ScriptHandler;

/// Registry of handlers keyed by operation type
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<OperationType, BoxedHandler>,
}

impl HandlerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every built-in handler registered.
    ///
    /// `custom` and `skip` are left unregistered.
    pub fn with_builtin_handlers() -> Self {
        let mut registry = Self::new();
        registry.register(OperationType::ScriptExec, ScriptHandler::new());
        registry.register(OperationType::KubectlExec, KubectlExecHandler::new());
        registry.register(OperationType::KubectlRestart, KubectlRestartHandler::new());
        registry.register(OperationType::KubectlApply, KubectlApplyHandler::new());
        registry.register(OperationType::KubectlDelete, KubectlDeleteHandler::new());
        registry.register(OperationType::HttpRequest, HttpRequestHandler::new());
        registry
    }

    /// Register a handler; replaces any existing one for the type
    pub fn register<H: OperationHandler + 'static>(&mut self, op_type: OperationType, handler: H) {
        self.register_arc(op_type, Arc::new(handler));
    }

    /// Register a handler (Arc version for shared ownership)
    pub fn register_arc(&mut self, op_type: OperationType, handler: BoxedHandler) {
        if self.handlers.insert(op_type, handler).is_some() {
            debug!(op_type = %op_type, "Replaced handler");
        } else {
            debug!(op_type = %op_type, "Registered handler");
        }
    }

    /// Get the handler for a type
    pub fn get_handler(&self, op_type: OperationType) -> Option<BoxedHandler> {
        self.handlers.get(&op_type).cloned()
    }

    /// Remove a handler; absent entries are ignored
    pub fn unregister(&mut self, op_type: OperationType) {
        self.handlers.remove(&op_type);
    }

    pub fn has_handler(&self, op_type: OperationType) -> bool {
        self.handlers.contains_key(&op_type)
    }

    /// Registered types, sorted
    pub fn registered_types(&self) -> Vec<OperationType> {
        let mut types: Vec<_> = self.handlers.keys().copied().collect();
        types.sort();
        types
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("types", &self.registered_types())
            .finish()
    }
}
