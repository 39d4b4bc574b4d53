//! Tool trait and registry.
//!
//! The registry is a stateless dispatch table built once at process start.
//! Dispatch runs the declared schema, hands the validated parameters to the
//! tool, and folds every outcome into the flat `{success, ...}` envelope.
//! No failure escapes dispatch as a panic or an unwrapped error.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use focal_core::errors::ToolError;

use crate::schema::ParameterSchema;

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn schema(&self) -> &ParameterSchema;
    /// Receives the validated, defaulted parameter object. Implementations
    /// return domain fields for the success envelope, or a `ToolError`.
    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError>;
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("tool `{0}` is already registered")]
    DuplicateTool(String),
}

/// Entry surfaced to the orchestrator when it assembles its tool-selection
/// prompt.
#[derive(Clone, Debug, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registering the same name twice is a wiring bug; it fails here, at
    /// startup, rather than at call time.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(RegistryError::DuplicateTool(name));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.schema().describe_json(),
            })
            .collect()
    }

    /// Runs one tool invocation end to end and always returns an envelope.
    pub async fn dispatch(&self, tool_name: &str, parameters: &Value) -> Value {
        let Some(tool) = self.tools.get(tool_name) else {
            warn!(
                event_name = "agent.tool.unknown",
                tool_name = %tool_name,
                "requested tool is not registered"
            );
            return failure_envelope(&format!("unknown tool `{tool_name}`"));
        };

        let validated = match tool.schema().validate(parameters) {
            Ok(params) => params,
            Err(error) => {
                warn!(
                    event_name = "agent.tool.rejected",
                    tool_name = %tool_name,
                    error_kind = error.kind(),
                    error = %error,
                    "tool call failed validation"
                );
                return failure_envelope(&error.user_message());
            }
        };

        match tool.execute(validated).await {
            Ok(data) => {
                debug!(
                    event_name = "agent.tool.completed",
                    tool_name = %tool_name,
                    "tool call completed"
                );
                success_envelope(data)
            }
            Err(error) => {
                warn!(
                    event_name = "agent.tool.failed",
                    tool_name = %tool_name,
                    error_kind = error.kind(),
                    error = %error,
                    "tool call failed"
                );
                failure_envelope(&error.user_message())
            }
        }
    }
}

fn success_envelope(data: Value) -> Value {
    let mut envelope = Map::new();
    envelope.insert("success".to_string(), Value::Bool(true));
    match data {
        Value::Object(fields) => {
            for (key, value) in fields {
                envelope.insert(key, value);
            }
        }
        Value::Null => {}
        other => {
            envelope.insert("data".to_string(), other);
        }
    }
    Value::Object(envelope)
}

fn failure_envelope(message: &str) -> Value {
    let mut envelope = Map::new();
    envelope.insert("success".to_string(), Value::Bool(false));
    envelope.insert("error".to_string(), Value::String(message.to_string()));
    Value::Object(envelope)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::{json, Map, Value};

    use focal_core::errors::ToolError;

    use super::{Tool, ToolRegistry};
    use crate::schema::{FieldSpec, ParameterSchema};

    struct EchoTool {
        schema: ParameterSchema,
        executions: Arc<AtomicUsize>,
    }

    impl EchoTool {
        fn new(executions: Arc<AtomicUsize>) -> Self {
            Self {
                schema: ParameterSchema::new()
                    .field(FieldSpec::string("message").required().min_len(1)),
                executions,
            }
        }
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn description(&self) -> &'static str {
            "Echo a message back"
        }

        fn schema(&self) -> &ParameterSchema {
            &self.schema
        }

        async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
            self.executions.fetch_add(1, Ordering::SeqCst);
            Ok(json!({"message": params.get("message").cloned().unwrap_or(Value::Null)}))
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &'static str {
            "always_fails"
        }

        fn description(&self) -> &'static str {
            "Fails with a storage error"
        }

        fn schema(&self) -> &ParameterSchema {
            static EMPTY: std::sync::OnceLock<ParameterSchema> = std::sync::OnceLock::new();
            EMPTY.get_or_init(ParameterSchema::new)
        }

        async fn execute(&self, _params: Map<String, Value>) -> Result<Value, ToolError> {
            Err(ToolError::Storage("connection to sqlite://secrets.db refused".to_string()))
        }
    }

    fn registry_with_echo(executions: Arc<AtomicUsize>) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool::new(executions))).expect("register echo");
        registry
    }

    #[tokio::test]
    async fn duplicate_registration_fails_fast() {
        let executions = Arc::new(AtomicUsize::new(0));
        let mut registry = registry_with_echo(executions.clone());

        let result = registry.register(Arc::new(EchoTool::new(executions)));
        assert!(result.is_err());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn unknown_tool_yields_failure_envelope() {
        let registry = ToolRegistry::new();
        let envelope = registry.dispatch("missing", &json!({})).await;

        assert_eq!(envelope["success"], json!(false));
        assert!(envelope["error"].as_str().unwrap_or_default().contains("missing"));
    }

    #[tokio::test]
    async fn validation_failure_never_reaches_the_executor() {
        let executions = Arc::new(AtomicUsize::new(0));
        let registry = registry_with_echo(executions.clone());

        let envelope = registry.dispatch("echo", &json!({})).await;

        assert_eq!(envelope["success"], json!(false));
        assert!(envelope["error"].as_str().unwrap_or_default().contains("message"));
        assert_eq!(executions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn success_envelope_merges_tool_fields() {
        let executions = Arc::new(AtomicUsize::new(0));
        let registry = registry_with_echo(executions.clone());

        let envelope = registry.dispatch("echo", &json!({"message": "hi"})).await;

        assert_eq!(envelope["success"], json!(true));
        assert_eq!(envelope["message"], json!("hi"));
        assert_eq!(executions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn storage_failures_are_sanitized_in_the_envelope() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(FailingTool)).expect("register");

        let envelope = registry.dispatch("always_fails", &json!({})).await;

        assert_eq!(envelope["success"], json!(false));
        let message = envelope["error"].as_str().unwrap_or_default();
        assert!(!message.contains("sqlite://"), "driver detail leaked: {message}");
    }

    #[tokio::test]
    async fn definitions_expose_name_description_and_schema() {
        let executions = Arc::new(AtomicUsize::new(0));
        let registry = registry_with_echo(executions);

        let definitions = registry.definitions();
        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions[0].name, "echo");
        assert_eq!(definitions[0].parameters["message"]["required"], json!(true));
    }
}
