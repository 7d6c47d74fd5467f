//! HTTP request handler
//!
//! The operation command is a JSON document describing the request:
//!
//! ```json
//! {"url": "https://api/health", "method": "POST", "headers": {"X-Token": "t"}, "data": {"k": 1}}
//! ```

use async_trait::async_trait;
use phazr_core::{EnvironmentConfig, ExecutionResult, Operation};
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::handler::OperationHandler;

fn default_method() -> String {
    "GET".to_string()
}

/// Request description parsed from the operation command
#[derive(Debug, Clone, Deserialize)]
pub struct HttpRequestSpec {
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// JSON body
    #[serde(default)]
    pub data: Option<Value>,
}

impl HttpRequestSpec {
    /// Parse the command payload
    pub fn parse(command: &str) -> Result<Self, String> {
        serde_json::from_str(command).map_err(|e| format!("Invalid JSON in command: {}", e))
    }
}

/// Handler for `http_request` operations
#[derive(Debug, Clone, Default)]
pub struct HttpRequestHandler {
    client: reqwest::Client,
}

impl HttpRequestHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn send(
        &self,
        operation: &Arc<Operation>,
        spec: HttpRequestSpec,
    ) -> Result<ExecutionResult, reqwest::Error> {
        let method = match Method::from_bytes(spec.method.to_uppercase().as_bytes()) {
            Ok(method) => method,
            Err(_) => {
                return Ok(ExecutionResult::failure(
                    operation.clone(),
                    format!("Invalid HTTP method: {}", spec.method),
                ))
            }
        };

        let mut request = self
            .client
            .request(method, &spec.url)
            .timeout(Duration::from_secs(operation.timeout_secs));
        for (name, value) in &spec.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(data) = spec.data.filter(|d| !d.is_null()) {
            request = request.json(&data);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        let result = if status.is_success() {
            ExecutionResult::success(operation.clone(), body)
        } else {
            ExecutionResult::failure(operation.clone(), format!("HTTP {}", status.as_u16()))
                .with_output(body)
        };

        Ok(result.with_metadata("status_code", Value::from(status.as_u16())))
    }
}

#[async_trait]
impl OperationHandler for HttpRequestHandler {
    async fn execute(
        &self,
        operation: &Arc<Operation>,
        _environment: &EnvironmentConfig,
    ) -> anyhow::Result<ExecutionResult> {
        let spec = match HttpRequestSpec::parse(&operation.command) {
            Ok(spec) => spec,
            Err(e) => return Ok(ExecutionResult::failure(operation.clone(), e)),
        };

        info!(method = %spec.method, url = %spec.url, "Sending HTTP request");

        match self.send(operation, spec).await {
            Ok(result) => Ok(result),
            Err(e) => {
                warn!(error = %e, "HTTP request failed");
                let message = if e.is_timeout() {
                    format!("Request timed out after {} seconds", operation.timeout_secs)
                } else {
                    e.to_string()
                };
                Ok(ExecutionResult::failure(operation.clone(), message))
            }
        }
    }
}
