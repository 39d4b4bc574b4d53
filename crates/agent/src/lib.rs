//! Agent tool layer - the CRM operations an assistant can call
//!
//! This crate packages every studio CRM operation as a named tool with a
//! declared parameter schema, a repository-backed executor, and a uniform
//! `{success, ...}` result envelope:
//!
//! 1. **Schema validation** (`schema`) - untrusted arguments are checked and
//!    defaulted before anything touches storage
//! 2. **Dispatch** (`registry`) - a static name-keyed table built once at
//!    startup; duplicate names fail the build, unknown names fail the call
//! 3. **Execution** (`tools`) - one module per feature area (clients, leads,
//!    sessions, invoices, galleries, blog, campaigns, questionnaires)
//! 4. **Normalization** - every outcome folds into the flat envelope; no
//!    panic or raw driver error crosses the dispatch boundary
//!
//! # Safety Principle
//!
//! The assistant is strictly a caller. It never receives a SQL fragment or
//! a connection handle; repositories bind every user-supplied value and the
//! envelope never carries driver detail.

use std::sync::Arc;

use focal_db::repositories::{
    BlogPostRepository, ClientRepository, EmailCampaignRepository, GalleryRepository,
    InvoiceRepository, LeadRepository, QuestionnaireRepository, SessionRepository,
    SqlBlogPostRepository, SqlClientRepository, SqlEmailCampaignRepository, SqlGalleryRepository,
    SqlInvoiceRepository, SqlLeadRepository, SqlQuestionnaireRepository, SqlSessionRepository,
};
use focal_db::DbPool;

pub mod assistant;
pub mod registry;
pub mod runtime;
pub mod schema;
pub mod tools;

pub use assistant::{AssistantClient, HttpAssistantClient};
pub use registry::{RegistryError, Tool, ToolDefinition, ToolRegistry};
pub use runtime::{AgentRuntime, ToolInvocation};
pub use schema::{FieldKind, FieldSpec, ParameterSchema};

/// Builds the full tool registry against a connected pool. Fails fast if
/// any two tools share a name.
pub fn build_registry(
    pool: DbPool,
    assistant: Arc<dyn AssistantClient>,
) -> Result<ToolRegistry, RegistryError> {
    let clients: Arc<dyn ClientRepository> = Arc::new(SqlClientRepository::new(pool.clone()));
    let leads: Arc<dyn LeadRepository> = Arc::new(SqlLeadRepository::new(pool.clone()));
    let sessions: Arc<dyn SessionRepository> = Arc::new(SqlSessionRepository::new(pool.clone()));
    let invoices: Arc<dyn InvoiceRepository> = Arc::new(SqlInvoiceRepository::new(pool.clone()));
    let galleries: Arc<dyn GalleryRepository> = Arc::new(SqlGalleryRepository::new(pool.clone()));
    let posts: Arc<dyn BlogPostRepository> = Arc::new(SqlBlogPostRepository::new(pool.clone()));
    let campaigns: Arc<dyn EmailCampaignRepository> =
        Arc::new(SqlEmailCampaignRepository::new(pool.clone()));
    let questionnaires: Arc<dyn QuestionnaireRepository> =
        Arc::new(SqlQuestionnaireRepository::new(pool));

    let mut registry = ToolRegistry::new();

    registry.register(Arc::new(tools::clients::CreateClientTool::new(clients.clone())))?;
    registry.register(Arc::new(tools::clients::UpdateClientTool::new(clients.clone())))?;
    registry.register(Arc::new(tools::clients::ReadClientsTool::new(clients.clone())))?;
    registry.register(Arc::new(tools::clients::GetClientTool::new(clients.clone())))?;
    registry.register(Arc::new(tools::clients::DeleteClientTool::new(clients.clone())))?;

    registry.register(Arc::new(tools::leads::CreateLeadTool::new(leads.clone())))?;
    registry.register(Arc::new(tools::leads::UpdateLeadTool::new(leads.clone())))?;
    registry.register(Arc::new(tools::leads::ReadLeadsTool::new(leads.clone())))?;
    registry.register(Arc::new(tools::leads::ConvertLeadTool::new(leads.clone())))?;
    registry.register(Arc::new(tools::leads::DeleteLeadTool::new(leads)))?;

    registry.register(Arc::new(tools::sessions::CreateSessionTool::new(
        sessions.clone(),
        clients.clone(),
    )))?;
    registry.register(Arc::new(tools::sessions::UpdateSessionTool::new(sessions.clone())))?;
    registry.register(Arc::new(tools::sessions::ReadSessionsTool::new(sessions.clone())))?;
    registry.register(Arc::new(tools::sessions::CheckAvailabilityTool::new(sessions.clone())))?;
    registry.register(Arc::new(tools::sessions::DeleteSessionTool::new(sessions.clone())))?;

    registry.register(Arc::new(tools::invoices::CreateInvoiceTool::new(
        invoices.clone(),
        clients.clone(),
        sessions,
    )))?;
    registry.register(Arc::new(tools::invoices::UpdateInvoiceStatusTool::new(invoices.clone())))?;
    registry.register(Arc::new(tools::invoices::ReadInvoicesTool::new(invoices.clone())))?;
    registry.register(Arc::new(tools::invoices::DeleteInvoiceTool::new(invoices)))?;

    registry.register(Arc::new(tools::galleries::CreateGalleryTool::new(
        galleries.clone(),
        clients.clone(),
    )))?;
    registry.register(Arc::new(tools::galleries::UpdateGalleryTool::new(galleries.clone())))?;
    registry.register(Arc::new(tools::galleries::ReadGalleriesTool::new(galleries.clone())))?;
    registry.register(Arc::new(tools::galleries::DeleteGalleryTool::new(galleries.clone())))?;
    registry.register(Arc::new(tools::galleries::AddDigitalFileTool::new(galleries.clone())))?;
    registry.register(Arc::new(tools::galleries::ReadDigitalFilesTool::new(galleries.clone())))?;
    registry.register(Arc::new(tools::galleries::DeleteDigitalFileTool::new(galleries)))?;

    registry.register(Arc::new(tools::blog::CreateBlogPostTool::new(posts.clone())))?;
    registry.register(Arc::new(tools::blog::UpdateBlogPostTool::new(posts.clone())))?;
    registry.register(Arc::new(tools::blog::ReadBlogPostsTool::new(posts.clone())))?;
    registry.register(Arc::new(tools::blog::PublishBlogPostTool::new(posts.clone())))?;
    registry.register(Arc::new(tools::blog::DeleteBlogPostTool::new(posts.clone())))?;
    registry.register(Arc::new(tools::blog::DraftBlogPostTool::new(posts, assistant)))?;

    registry.register(Arc::new(tools::campaigns::CreateCampaignTool::new(campaigns.clone())))?;
    registry.register(Arc::new(tools::campaigns::UpdateCampaignTool::new(campaigns.clone())))?;
    registry.register(Arc::new(tools::campaigns::ReadCampaignsTool::new(campaigns.clone())))?;
    registry.register(Arc::new(tools::campaigns::SendCampaignTool::new(
        campaigns.clone(),
        clients.clone(),
    )))?;
    registry.register(Arc::new(tools::campaigns::DeleteCampaignTool::new(campaigns)))?;

    registry.register(Arc::new(tools::questionnaires::CreateQuestionnaireTool::new(
        questionnaires.clone(),
        clients,
    )))?;
    registry.register(Arc::new(tools::questionnaires::GetQuestionnaireTool::new(
        questionnaires.clone(),
    )))?;
    registry.register(Arc::new(tools::questionnaires::ReadQuestionnairesTool::new(
        questionnaires.clone(),
    )))?;
    registry.register(Arc::new(tools::questionnaires::UpdateQuestionnaireTool::new(
        questionnaires.clone(),
    )))?;
    registry.register(Arc::new(tools::questionnaires::DeleteQuestionnaireTool::new(
        questionnaires,
    )))?;

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use focal_core::errors::ToolError;
    use focal_db::{connect_with_settings, migrations};

    use super::{build_registry, AssistantClient};

    struct NoopAssistant;

    #[async_trait]
    impl AssistantClient for NoopAssistant {
        async fn complete(&self, _prompt: &str) -> Result<String, ToolError> {
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn full_registry_builds_with_unique_names() {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 30)
            .await
            .expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");

        let registry =
            build_registry(pool.clone(), Arc::new(NoopAssistant)).expect("registry builds");

        assert_eq!(registry.len(), 42);
        let names = registry.names();
        assert!(names.contains(&"create_client"));
        assert!(names.contains(&"check_calendar_availability"));
        assert!(names.contains(&"send_email_campaign"));
        assert!(names.contains(&"draft_blog_post"));

        pool.close().await;
    }
}
