//! HTTP surface for the agent tool layer.
//!
//! Deliberately thin: the envelope is transport-agnostic, so every dispatch
//! answers HTTP 200 and callers branch on the envelope's `success` flag.

use std::sync::Arc;

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::Value;

use focal_agent::{AgentRuntime, ToolDefinition, ToolInvocation};

#[derive(Clone)]
pub struct AgentState {
    runtime: Arc<AgentRuntime>,
}

pub fn router(runtime: Arc<AgentRuntime>) -> Router {
    Router::new()
        .route("/agent/tools", get(list_tools))
        .route("/agent/tools/call", post(call_tool))
        .with_state(AgentState { runtime })
}

async fn list_tools(State(state): State<AgentState>) -> Json<Vec<ToolDefinition>> {
    Json(state.runtime.definitions())
}

async fn call_tool(
    State(state): State<AgentState>,
    Json(invocation): Json<ToolInvocation>,
) -> Json<Value> {
    Json(state.runtime.handle(&invocation).await)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::extract::State;
    use axum::Json;
    use serde_json::json;

    use focal_agent::{build_registry, AgentRuntime, AssistantClient, ToolInvocation};
    use focal_core::errors::ToolError;
    use focal_db::{connect_with_settings, migrations};

    use super::{call_tool, list_tools, AgentState};

    struct NoopAssistant;

    #[async_trait]
    impl AssistantClient for NoopAssistant {
        async fn complete(&self, _prompt: &str) -> Result<String, ToolError> {
            Ok(String::new())
        }
    }

    async fn agent_state() -> AgentState {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 30)
            .await
            .expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        let registry = build_registry(pool, Arc::new(NoopAssistant)).expect("registry");
        AgentState { runtime: Arc::new(AgentRuntime::new(registry)) }
    }

    #[tokio::test]
    async fn tool_catalog_lists_every_registered_tool() {
        let state = agent_state().await;
        let Json(definitions) = list_tools(State(state)).await;

        assert_eq!(definitions.len(), 42);
        assert!(definitions.iter().any(|tool| tool.name == "create_client"));
    }

    #[tokio::test]
    async fn call_route_returns_the_envelope_for_success_and_failure() {
        let state = agent_state().await;

        let Json(created) = call_tool(
            State(state.clone()),
            Json(ToolInvocation {
                tool_name: "create_client".to_string(),
                parameters: json!({
                    "first_name": "Maya",
                    "last_name": "Rivera",
                    "email": "maya@example.com"
                }),
            }),
        )
        .await;
        assert_eq!(created["success"], json!(true));

        let Json(unknown) = call_tool(
            State(state),
            Json(ToolInvocation {
                tool_name: "no_such_tool".to_string(),
                parameters: json!({}),
            }),
        )
        .await;
        assert_eq!(unknown["success"], json!(false));
    }
}
