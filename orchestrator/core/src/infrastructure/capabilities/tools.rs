// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Built-in Tools
//
// Small, dependency-light tools available to every agent blueprint. Anything
// that needs credentials or a model provider is registered by the host, not
// here.

use std::time::Duration;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::domain::capability::{Tool, ToolError, ToolSpecification};

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PingConfig {}

/// Liveness probe; always answers `{"status": "pong"}`.
pub struct PingTool;

#[async_trait]
impl Tool for PingTool {
    async fn execute(&self, _args: Value) -> Result<Value, ToolError> {
        Ok(json!({ "status": "pong" }))
    }
}

pub fn ping() -> ToolSpecification {
    ToolSpecification::tool("ping", "Responds with pong", |_: PingConfig| PingTool)
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct EchoConfig {
    /// Prepended to string inputs
    #[serde(default)]
    pub prefix: Option<String>,
}

pub struct EchoTool {
    prefix: Option<String>,
}

#[async_trait]
impl Tool for EchoTool {
    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let Some(prefix) = &self.prefix else {
            return Ok(args);
        };
        let text = match args {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        };
        Ok(Value::String(format!("{}{}", prefix, text)))
    }
}

pub fn echo() -> ToolSpecification {
    ToolSpecification::tool("echo", "Returns its input, optionally prefixed", |c: EchoConfig| EchoTool {
        prefix: c.prefix,
    })
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct HttpGetConfig {
    /// Base URL that request paths are appended to
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Fetches `base_url + args.path` and returns the status and body.
pub struct HttpGetTool {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpGetTool {
    fn url_for(&self, args: &Value) -> Result<String, ToolError> {
        let path = match args {
            Value::Null => "",
            Value::String(s) => s.as_str(),
            Value::Object(map) => match map.get("path") {
                None | Some(Value::Null) => "",
                Some(Value::String(s)) => s.as_str(),
                Some(_) => return Err(ToolError::InvalidArguments("'path' must be a string".into())),
            },
            _ => return Err(ToolError::InvalidArguments("expected a path string or {\"path\": ...}".into())),
        };

        if path.is_empty() {
            return Ok(self.base_url.clone());
        }
        Ok(format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        ))
    }
}

#[async_trait]
impl Tool for HttpGetTool {
    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let url = self.url_for(&args)?;
        debug!(url = %url, "http_get");

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ToolError::Failed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ToolError::Failed(format!("Failed to read response body: {}", e)))?;

        let body = serde_json::from_str::<Value>(&body).unwrap_or(Value::String(body));
        Ok(json!({ "status": status.as_u16(), "body": body }))
    }
}

pub fn http_get() -> ToolSpecification {
    ToolSpecification::tool(
        "http_get",
        "Fetches a URL relative to a configured base",
        |c: HttpGetConfig| HttpGetTool {
            client: reqwest::Client::new(),
            base_url: c.base_url,
            timeout: Duration::from_secs(c.timeout_secs),
        },
    )
}
