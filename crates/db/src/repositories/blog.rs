use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use focal_core::domain::content::{BlogPost, BlogPostId, BlogPostStatus};

use super::{
    parse_optional_timestamp, parse_status, parse_timestamp, parse_uuid, BlogPostRepository,
    RepositoryError,
};
use crate::DbPool;

const POST_COLUMNS: &str = "id,
                title,
                slug,
                content,
                excerpt,
                status,
                scheduled_for,
                published_at,
                created_at,
                updated_at";

pub struct SqlBlogPostRepository {
    pool: DbPool,
}

impl SqlBlogPostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BlogPostRepository for SqlBlogPostRepository {
    async fn insert(&self, post: BlogPost) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO blog_post (
                id,
                title,
                slug,
                content,
                excerpt,
                status,
                scheduled_for,
                published_at,
                created_at,
                updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(post.id.0.to_string())
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.content)
        .bind(post.excerpt.as_deref())
        .bind(post.status.as_str())
        .bind(post.scheduled_for.map(|value| value.to_rfc3339()))
        .bind(post.published_at.map(|value| value.to_rfc3339()))
        .bind(post.created_at.to_rfc3339())
        .bind(post.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, post: BlogPost) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE blog_post SET
                title = ?,
                slug = ?,
                content = ?,
                excerpt = ?,
                status = ?,
                scheduled_for = ?,
                published_at = ?,
                updated_at = ?
             WHERE id = ?",
        )
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.content)
        .bind(post.excerpt.as_deref())
        .bind(post.status.as_str())
        .bind(post.scheduled_for.map(|value| value.to_rfc3339()))
        .bind(post.published_at.map(|value| value.to_rfc3339()))
        .bind(post.updated_at.to_rfc3339())
        .bind(post.id.0.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn find_by_id(&self, id: &BlogPostId) -> Result<Option<BlogPost>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {POST_COLUMNS} FROM blog_post WHERE id = ?"))
            .bind(id.0.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(post_from_row).transpose()
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {POST_COLUMNS} FROM blog_post WHERE slug = ?"))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        row.map(post_from_row).transpose()
    }

    async fn search(
        &self,
        term: Option<&str>,
        status: Option<BlogPostStatus>,
        limit: u32,
    ) -> Result<Vec<BlogPost>, RepositoryError> {
        let pattern = term.map(|value| format!("%{value}%"));
        let rows = sqlx::query(&format!(
            "SELECT {POST_COLUMNS}
             FROM blog_post
             WHERE (?1 IS NULL OR status = ?1)
               AND (?2 IS NULL OR title LIKE ?2 OR content LIKE ?2)
             ORDER BY created_at DESC
             LIMIT ?3"
        ))
        .bind(status.map(|value| value.as_str()))
        .bind(pattern.as_deref())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(post_from_row).collect()
    }

    async fn delete(&self, id: &BlogPostId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM blog_post WHERE id = ?")
            .bind(id.0.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

fn post_from_row(row: SqliteRow) -> Result<BlogPost, RepositoryError> {
    Ok(BlogPost {
        id: BlogPostId(parse_uuid("id", row.get("id"))?),
        title: row.get("title"),
        slug: row.get("slug"),
        content: row.get("content"),
        excerpt: row.get("excerpt"),
        status: parse_status("status", row.get("status"), BlogPostStatus::parse)?,
        scheduled_for: parse_optional_timestamp("scheduled_for", row.get("scheduled_for"))?,
        published_at: parse_optional_timestamp("published_at", row.get("published_at"))?,
        created_at: parse_timestamp("created_at", row.get("created_at"))?,
        updated_at: parse_timestamp("updated_at", row.get("updated_at"))?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    use focal_core::domain::content::{BlogPost, BlogPostId, BlogPostStatus};

    use super::SqlBlogPostRepository;
    use crate::migrations;
    use crate::repositories::BlogPostRepository;
    use crate::{connect_with_settings, DbPool};

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 30)
            .await
            .expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    fn parse_ts(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value).expect("valid rfc3339").with_timezone(&Utc)
    }

    fn sample_post(title: &str, slug: &str) -> BlogPost {
        BlogPost {
            id: BlogPostId(Uuid::new_v4()),
            title: title.to_string(),
            slug: slug.to_string(),
            content: "Light changes everything about a portrait.".to_string(),
            excerpt: None,
            status: BlogPostStatus::Draft,
            scheduled_for: None,
            published_at: None,
            created_at: parse_ts("2025-06-01T09:00:00Z"),
            updated_at: parse_ts("2025-06-01T09:00:00Z"),
        }
    }

    #[tokio::test]
    async fn post_round_trip_and_slug_lookup() {
        let pool = setup_pool().await;
        let repo = SqlBlogPostRepository::new(pool.clone());

        let post = sample_post("Chasing golden hour", "chasing-golden-hour");
        repo.insert(post.clone()).await.expect("insert post");

        assert_eq!(repo.find_by_id(&post.id).await.expect("find"), Some(post.clone()));
        assert_eq!(
            repo.find_by_slug("chasing-golden-hour").await.expect("find by slug"),
            Some(post.clone())
        );
        assert_eq!(repo.find_by_slug("missing").await.expect("find by slug"), None);

        pool.close().await;
    }

    #[tokio::test]
    async fn duplicate_slug_is_rejected_by_the_unique_index() {
        let pool = setup_pool().await;
        let repo = SqlBlogPostRepository::new(pool.clone());

        repo.insert(sample_post("First", "same-slug")).await.expect("insert first");
        let duplicate = repo.insert(sample_post("Second", "same-slug")).await;
        assert!(duplicate.is_err());

        pool.close().await;
    }

    #[tokio::test]
    async fn search_matches_title_and_content() {
        let pool = setup_pool().await;
        let repo = SqlBlogPostRepository::new(pool.clone());

        repo.insert(sample_post("Studio lighting basics", "studio-lighting-basics"))
            .await
            .expect("insert");
        repo.insert(sample_post("Posing families", "posing-families")).await.expect("insert");

        let hits = repo.search(Some("lighting"), None, 50).await.expect("search");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].slug, "studio-lighting-basics");

        let drafts = repo.search(None, Some(BlogPostStatus::Draft), 50).await.expect("search");
        assert_eq!(drafts.len(), 2);

        pool.close().await;
    }
}
