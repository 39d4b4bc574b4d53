use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use focal_core::domain::content::{slugify, BlogPost, BlogPostId, BlogPostStatus};
use focal_core::errors::ToolError;
use focal_db::repositories::BlogPostRepository;

use super::{parse_params, to_json};
use crate::assistant::AssistantClient;
use crate::registry::Tool;
use crate::schema::{FieldSpec, ParameterSchema};

pub struct CreateBlogPostTool {
    posts: Arc<dyn BlogPostRepository>,
    schema: ParameterSchema,
}

impl CreateBlogPostTool {
    pub fn new(posts: Arc<dyn BlogPostRepository>) -> Self {
        Self {
            posts,
            schema: ParameterSchema::new()
                .field(FieldSpec::string("title").required().min_len(1).max_len(200))
                .field(
                    FieldSpec::string("slug")
                        .min_len(1)
                        .max_len(200)
                        .describe("URL slug; derived from the title when omitted"),
                )
                .field(FieldSpec::string("content").required().min_len(1))
                .field(FieldSpec::string("excerpt").max_len(500))
                .field(
                    FieldSpec::enumeration("status", BlogPostStatus::VALUES)
                        .default_value(json!("DRAFT")),
                )
                .field(
                    FieldSpec::datetime("scheduled_for")
                        .describe("Publish time; required when status is SCHEDULED"),
                ),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateBlogPostParams {
    title: String,
    slug: Option<String>,
    content: String,
    excerpt: Option<String>,
    status: BlogPostStatus,
    scheduled_for: Option<DateTime<Utc>>,
}

#[async_trait]
impl Tool for CreateBlogPostTool {
    fn name(&self) -> &'static str {
        "create_blog_post"
    }

    fn description(&self) -> &'static str {
        "Create a blog post as draft, scheduled, or published"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: CreateBlogPostParams = parse_params(params)?;

        let slug = params.slug.unwrap_or_else(|| slugify(&params.title));
        if slug.is_empty() {
            return Err(ToolError::validation("slug", "derived slug is empty"));
        }
        if self.posts.find_by_slug(&slug).await?.is_some() {
            return Err(ToolError::validation(
                "slug",
                format!("a post with slug `{slug}` already exists"),
            ));
        }
        if params.status == BlogPostStatus::Scheduled && params.scheduled_for.is_none() {
            return Err(ToolError::validation(
                "scheduled_for",
                "is required when status is SCHEDULED",
            ));
        }

        let now = Utc::now();
        let post = BlogPost {
            id: BlogPostId(Uuid::new_v4()),
            title: params.title,
            slug,
            content: params.content,
            excerpt: params.excerpt,
            status: params.status,
            scheduled_for: params.scheduled_for,
            published_at: (params.status == BlogPostStatus::Published).then_some(now),
            created_at: now,
            updated_at: now,
        };

        self.posts.insert(post.clone()).await?;
        Ok(json!({
            "post_id": post.id.0,
            "slug": post.slug,
            "status": post.status.as_str(),
        }))
    }
}

pub struct UpdateBlogPostTool {
    posts: Arc<dyn BlogPostRepository>,
    schema: ParameterSchema,
}

impl UpdateBlogPostTool {
    pub fn new(posts: Arc<dyn BlogPostRepository>) -> Self {
        Self {
            posts,
            schema: ParameterSchema::new()
                .field(FieldSpec::uuid("post_id").required())
                .field(FieldSpec::string("title").min_len(1).max_len(200))
                .field(FieldSpec::string("slug").min_len(1).max_len(200))
                .field(FieldSpec::string("content").min_len(1))
                .field(FieldSpec::string("excerpt").max_len(500))
                .field(FieldSpec::datetime("scheduled_for")),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UpdateBlogPostParams {
    post_id: Uuid,
    title: Option<String>,
    slug: Option<String>,
    content: Option<String>,
    excerpt: Option<String>,
    scheduled_for: Option<DateTime<Utc>>,
}

#[async_trait]
impl Tool for UpdateBlogPostTool {
    fn name(&self) -> &'static str {
        "update_blog_post"
    }

    fn description(&self) -> &'static str {
        "Edit the fields of an existing blog post"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: UpdateBlogPostParams = parse_params(params)?;
        let id = BlogPostId(params.post_id);

        let Some(mut post) = self.posts.find_by_id(&id).await? else {
            return Err(ToolError::not_found("blog post", params.post_id));
        };

        if let Some(slug) = params.slug {
            if slug != post.slug {
                if self.posts.find_by_slug(&slug).await?.is_some() {
                    return Err(ToolError::validation(
                        "slug",
                        format!("a post with slug `{slug}` already exists"),
                    ));
                }
                post.slug = slug;
            }
        }
        if let Some(title) = params.title {
            post.title = title;
        }
        if let Some(content) = params.content {
            post.content = content;
        }
        if let Some(excerpt) = params.excerpt {
            post.excerpt = Some(excerpt);
        }
        if let Some(scheduled_for) = params.scheduled_for {
            post.scheduled_for = Some(scheduled_for);
        }
        post.updated_at = Utc::now();

        if self.posts.update(post).await? == 0 {
            return Err(ToolError::not_found("blog post", params.post_id));
        }
        Ok(json!({"post_id": params.post_id, "updated": true}))
    }
}

pub struct ReadBlogPostsTool {
    posts: Arc<dyn BlogPostRepository>,
    schema: ParameterSchema,
}

impl ReadBlogPostsTool {
    pub fn new(posts: Arc<dyn BlogPostRepository>) -> Self {
        Self {
            posts,
            schema: ParameterSchema::new()
                .field(
                    FieldSpec::string("search_term")
                        .min_len(1)
                        .describe("Matches title or body text"),
                )
                .field(FieldSpec::enumeration("status", BlogPostStatus::VALUES))
                .field(FieldSpec::integer("limit").min(1).max(100).default_value(json!(50))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReadBlogPostsParams {
    search_term: Option<String>,
    status: Option<BlogPostStatus>,
    limit: u32,
}

#[async_trait]
impl Tool for ReadBlogPostsTool {
    fn name(&self) -> &'static str {
        "read_blog_posts"
    }

    fn description(&self) -> &'static str {
        "List blog posts, optionally filtered by search term or status"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: ReadBlogPostsParams = parse_params(params)?;
        let posts = self
            .posts
            .search(params.search_term.as_deref(), params.status, params.limit)
            .await?;

        Ok(json!({"count": posts.len(), "posts": to_json(&posts)?}))
    }
}

pub struct PublishBlogPostTool {
    posts: Arc<dyn BlogPostRepository>,
    schema: ParameterSchema,
}

impl PublishBlogPostTool {
    pub fn new(posts: Arc<dyn BlogPostRepository>) -> Self {
        Self {
            posts,
            schema: ParameterSchema::new().field(FieldSpec::uuid("post_id").required()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PublishBlogPostParams {
    post_id: Uuid,
}

#[async_trait]
impl Tool for PublishBlogPostTool {
    fn name(&self) -> &'static str {
        "publish_blog_post"
    }

    fn description(&self) -> &'static str {
        "Publish a draft or scheduled post immediately"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: PublishBlogPostParams = parse_params(params)?;
        let id = BlogPostId(params.post_id);

        let Some(mut post) = self.posts.find_by_id(&id).await? else {
            return Err(ToolError::not_found("blog post", params.post_id));
        };
        if post.status == BlogPostStatus::Published {
            return Err(ToolError::validation("post_id", "post is already published"));
        }

        let now = Utc::now();
        post.status = BlogPostStatus::Published;
        post.published_at = Some(now);
        post.scheduled_for = None;
        post.updated_at = now;

        if self.posts.update(post).await? == 0 {
            return Err(ToolError::not_found("blog post", params.post_id));
        }
        Ok(json!({
            "post_id": params.post_id,
            "status": BlogPostStatus::Published.as_str(),
            "published_at": now.to_rfc3339(),
        }))
    }
}

pub struct DeleteBlogPostTool {
    posts: Arc<dyn BlogPostRepository>,
    schema: ParameterSchema,
}

impl DeleteBlogPostTool {
    pub fn new(posts: Arc<dyn BlogPostRepository>) -> Self {
        Self {
            posts,
            schema: ParameterSchema::new().field(FieldSpec::uuid("post_id").required()),
        }
    }
}

#[async_trait]
impl Tool for DeleteBlogPostTool {
    fn name(&self) -> &'static str {
        "delete_blog_post"
    }

    fn description(&self) -> &'static str {
        "Delete a blog post"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: PublishBlogPostParams = parse_params(params)?;
        let id = BlogPostId(params.post_id);

        if self.posts.delete(&id).await? == 0 {
            return Err(ToolError::not_found("blog post", params.post_id));
        }
        Ok(json!({"post_id": params.post_id, "deleted": true}))
    }
}

pub struct DraftBlogPostTool {
    posts: Arc<dyn BlogPostRepository>,
    assistant: Arc<dyn AssistantClient>,
    schema: ParameterSchema,
}

impl DraftBlogPostTool {
    pub fn new(posts: Arc<dyn BlogPostRepository>, assistant: Arc<dyn AssistantClient>) -> Self {
        Self {
            posts,
            assistant,
            schema: ParameterSchema::new()
                .field(
                    FieldSpec::string("topic")
                        .required()
                        .min_len(3)
                        .max_len(200)
                        .describe("What the post should be about"),
                )
                .field(
                    FieldSpec::string("tone")
                        .max_len(50)
                        .default_value(json!("warm"))
                        .describe("Voice for the draft, e.g. warm or editorial"),
                ),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DraftBlogPostParams {
    topic: String,
    tone: String,
}

#[async_trait]
impl Tool for DraftBlogPostTool {
    fn name(&self) -> &'static str {
        "draft_blog_post"
    }

    fn description(&self) -> &'static str {
        "Ask the assistant to draft a post on a topic and save it as a draft"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: DraftBlogPostParams = parse_params(params)?;

        let slug = slugify(&params.topic);
        if slug.is_empty() {
            return Err(ToolError::validation("topic", "derived slug is empty"));
        }
        if self.posts.find_by_slug(&slug).await?.is_some() {
            return Err(ToolError::validation(
                "topic",
                format!("a post with slug `{slug}` already exists"),
            ));
        }

        let prompt = format!(
            "Write a blog post for a photography studio. Topic: {}. Tone: {}. \
             Return only the article body.",
            params.topic, params.tone
        );
        let content = self.assistant.complete(&prompt).await?;

        let now = Utc::now();
        let post = BlogPost {
            id: BlogPostId(Uuid::new_v4()),
            title: params.topic,
            slug,
            content,
            excerpt: None,
            status: BlogPostStatus::Draft,
            scheduled_for: None,
            published_at: None,
            created_at: now,
            updated_at: now,
        };

        self.posts.insert(post.clone()).await?;
        Ok(json!({
            "post_id": post.id.0,
            "slug": post.slug,
            "status": post.status.as_str(),
            "content": post.content,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::json;

    use focal_core::errors::ToolError;
    use focal_db::repositories::{BlogPostRepository, SqlBlogPostRepository};
    use focal_db::{connect_with_settings, migrations, DbPool};

    use super::{
        CreateBlogPostTool, DeleteBlogPostTool, DraftBlogPostTool, PublishBlogPostTool,
        ReadBlogPostsTool, UpdateBlogPostTool,
    };
    use crate::assistant::AssistantClient;
    use crate::registry::ToolRegistry;

    struct CannedAssistant {
        reply: Result<String, ToolError>,
    }

    #[async_trait]
    impl AssistantClient for CannedAssistant {
        async fn complete(&self, _prompt: &str) -> Result<String, ToolError> {
            self.reply.clone()
        }
    }

    async fn setup(assistant_reply: Result<String, ToolError>) -> (DbPool, ToolRegistry) {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 30)
            .await
            .expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");

        let posts: Arc<dyn BlogPostRepository> =
            Arc::new(SqlBlogPostRepository::new(pool.clone()));
        let assistant: Arc<dyn AssistantClient> =
            Arc::new(CannedAssistant { reply: assistant_reply });

        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(CreateBlogPostTool::new(posts.clone()))).expect("register");
        registry.register(Arc::new(UpdateBlogPostTool::new(posts.clone()))).expect("register");
        registry.register(Arc::new(ReadBlogPostsTool::new(posts.clone()))).expect("register");
        registry.register(Arc::new(PublishBlogPostTool::new(posts.clone()))).expect("register");
        registry.register(Arc::new(DeleteBlogPostTool::new(posts.clone()))).expect("register");
        registry
            .register(Arc::new(DraftBlogPostTool::new(posts, assistant)))
            .expect("register");

        (pool, registry)
    }

    #[tokio::test]
    async fn create_then_search_finds_exactly_one_post() {
        let (pool, registry) = setup(Ok(String::new())).await;

        let created = registry
            .dispatch(
                "create_blog_post",
                &json!({
                    "title": "Test",
                    "slug": "test",
                    "content": "A short note about studio light and why it matters to portraits."
                }),
            )
            .await;
        assert_eq!(created["success"], json!(true));
        assert!(created["post_id"].as_str().is_some());

        let listed = registry
            .dispatch("read_blog_posts", &json!({"search_term": "Test"}))
            .await;
        assert_eq!(listed["count"], json!(1));
        assert_eq!(listed["posts"][0]["title"], json!("Test"));

        pool.close().await;
    }

    #[tokio::test]
    async fn empty_title_fails_validation_mentioning_title() {
        let (pool, registry) = setup(Ok(String::new())).await;

        let envelope = registry
            .dispatch(
                "create_blog_post",
                &json!({"title": "", "slug": "x", "content": "..."}),
            )
            .await;

        assert_eq!(envelope["success"], json!(false));
        assert!(envelope["error"].as_str().unwrap_or_default().contains("title"));

        pool.close().await;
    }

    #[tokio::test]
    async fn slug_is_derived_and_collisions_are_rejected() {
        let (pool, registry) = setup(Ok(String::new())).await;

        let created = registry
            .dispatch(
                "create_blog_post",
                &json!({"title": "Golden Hour: 5 Tips!", "content": "body"}),
            )
            .await;
        assert_eq!(created["slug"], json!("golden-hour-5-tips"));

        let collision = registry
            .dispatch(
                "create_blog_post",
                &json!({"title": "Another", "slug": "golden-hour-5-tips", "content": "body"}),
            )
            .await;
        assert_eq!(collision["success"], json!(false));
        assert!(collision["error"].as_str().unwrap_or_default().contains("slug"));

        pool.close().await;
    }

    #[tokio::test]
    async fn publish_sets_published_at_and_rejects_double_publish() {
        let (pool, registry) = setup(Ok(String::new())).await;

        let created = registry
            .dispatch(
                "create_blog_post",
                &json!({"title": "Launch", "content": "body"}),
            )
            .await;
        let post_id = created["post_id"].as_str().expect("post id").to_string();

        let published = registry
            .dispatch("publish_blog_post", &json!({"post_id": post_id}))
            .await;
        assert_eq!(published["success"], json!(true));
        assert!(published["published_at"].as_str().is_some());

        let again = registry
            .dispatch("publish_blog_post", &json!({"post_id": post_id}))
            .await;
        assert_eq!(again["success"], json!(false));
        assert!(again["error"].as_str().unwrap_or_default().contains("already published"));

        pool.close().await;
    }

    #[tokio::test]
    async fn draft_tool_saves_assistant_content_as_draft() {
        let (pool, registry) =
            setup(Ok("Golden hour is the hour after sunrise.".to_string())).await;

        let drafted = registry
            .dispatch("draft_blog_post", &json!({"topic": "Shooting at golden hour"}))
            .await;

        assert_eq!(drafted["success"], json!(true));
        assert_eq!(drafted["status"], json!("DRAFT"));
        assert_eq!(drafted["content"], json!("Golden hour is the hour after sunrise."));

        let listed = registry
            .dispatch("read_blog_posts", &json!({"status": "DRAFT"}))
            .await;
        assert_eq!(listed["count"], json!(1));

        pool.close().await;
    }

    #[tokio::test]
    async fn assistant_failure_surfaces_as_failure_and_persists_nothing() {
        let (pool, registry) =
            setup(Err(ToolError::Upstream("assistant timed out".to_string()))).await;

        let drafted = registry
            .dispatch("draft_blog_post", &json!({"topic": "Shooting at golden hour"}))
            .await;
        assert_eq!(drafted["success"], json!(false));

        let listed = registry.dispatch("read_blog_posts", &json!({})).await;
        assert_eq!(listed["count"], json!(0));

        pool.close().await;
    }
}
