use serde::Deserialize;
use serde_json::Value;

use crate::registry::{ToolDefinition, ToolRegistry};

/// The orchestrator-facing invocation shape: a tool name plus a JSON object
/// of arguments.
#[derive(Clone, Debug, Deserialize)]
pub struct ToolInvocation {
    pub tool_name: String,
    #[serde(default)]
    pub parameters: Value,
}

/// Thin handle the orchestrator (or HTTP surface) drives. Holds the registry
/// built at startup; each invocation is independent.
pub struct AgentRuntime {
    registry: ToolRegistry,
}

impl AgentRuntime {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    pub fn tool_count(&self) -> usize {
        self.registry.len()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.registry.definitions()
    }

    pub async fn handle(&self, invocation: &ToolInvocation) -> Value {
        self.registry.dispatch(&invocation.tool_name, &invocation.parameters).await
    }
}
