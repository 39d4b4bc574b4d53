use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use focal_core::domain::client::ClientId;
use focal_core::domain::gallery::{DigitalFile, DigitalFileId, Gallery, GalleryId, GalleryStatus};

use super::{
    parse_optional_timestamp, parse_status, parse_timestamp, parse_uuid, GalleryRepository,
    RepositoryError,
};
use crate::DbPool;

const GALLERY_COLUMNS: &str = "id,
                client_id,
                title,
                share_token,
                status,
                expires_at,
                created_at,
                updated_at";

const FILE_COLUMNS: &str = "id,
                gallery_id,
                file_name,
                content_type,
                size_bytes,
                storage_key,
                created_at";

pub struct SqlGalleryRepository {
    pool: DbPool,
}

impl SqlGalleryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GalleryRepository for SqlGalleryRepository {
    async fn insert(&self, gallery: Gallery) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO gallery (
                id,
                client_id,
                title,
                share_token,
                status,
                expires_at,
                created_at,
                updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(gallery.id.0.to_string())
        .bind(gallery.client_id.as_ref().map(|value| value.0.to_string()))
        .bind(&gallery.title)
        .bind(&gallery.share_token)
        .bind(gallery.status.as_str())
        .bind(gallery.expires_at.map(|value| value.to_rfc3339()))
        .bind(gallery.created_at.to_rfc3339())
        .bind(gallery.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, gallery: Gallery) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE gallery SET
                client_id = ?,
                title = ?,
                status = ?,
                expires_at = ?,
                updated_at = ?
             WHERE id = ?",
        )
        .bind(gallery.client_id.as_ref().map(|value| value.0.to_string()))
        .bind(&gallery.title)
        .bind(gallery.status.as_str())
        .bind(gallery.expires_at.map(|value| value.to_rfc3339()))
        .bind(gallery.updated_at.to_rfc3339())
        .bind(gallery.id.0.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn find_by_id(&self, id: &GalleryId) -> Result<Option<Gallery>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {GALLERY_COLUMNS} FROM gallery WHERE id = ?"))
            .bind(id.0.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(gallery_from_row).transpose()
    }

    async fn list(
        &self,
        client_id: Option<&ClientId>,
        status: Option<GalleryStatus>,
        limit: u32,
    ) -> Result<Vec<Gallery>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {GALLERY_COLUMNS}
             FROM gallery
             WHERE (?1 IS NULL OR client_id = ?1)
               AND (?2 IS NULL OR status = ?2)
             ORDER BY created_at DESC
             LIMIT ?3"
        ))
        .bind(client_id.map(|value| value.0.to_string()))
        .bind(status.map(|value| value.as_str()))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(gallery_from_row).collect()
    }

    async fn delete(&self, id: &GalleryId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM gallery WHERE id = ?")
            .bind(id.0.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn insert_file(&self, file: DigitalFile) -> Result<(), RepositoryError> {
        let size_bytes = i64::try_from(file.size_bytes).map_err(|_| {
            RepositoryError::Decode(format!(
                "file size {} exceeds the storable range",
                file.size_bytes
            ))
        })?;

        sqlx::query(
            "INSERT INTO digital_file (
                id,
                gallery_id,
                file_name,
                content_type,
                size_bytes,
                storage_key,
                created_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(file.id.0.to_string())
        .bind(file.gallery_id.0.to_string())
        .bind(&file.file_name)
        .bind(&file.content_type)
        .bind(size_bytes)
        .bind(&file.storage_key)
        .bind(file.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_files(
        &self,
        gallery_id: &GalleryId,
    ) -> Result<Vec<DigitalFile>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {FILE_COLUMNS}
             FROM digital_file
             WHERE gallery_id = ?
             ORDER BY created_at ASC"
        ))
        .bind(gallery_id.0.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(file_from_row).collect()
    }

    async fn delete_file(&self, id: &DigitalFileId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM digital_file WHERE id = ?")
            .bind(id.0.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

fn gallery_from_row(row: SqliteRow) -> Result<Gallery, RepositoryError> {
    let client_id = row
        .get::<Option<String>, _>("client_id")
        .map(|value| parse_uuid("client_id", value).map(ClientId))
        .transpose()?;

    Ok(Gallery {
        id: GalleryId(parse_uuid("id", row.get("id"))?),
        client_id,
        title: row.get("title"),
        share_token: row.get("share_token"),
        status: parse_status("status", row.get("status"), GalleryStatus::parse)?,
        expires_at: parse_optional_timestamp("expires_at", row.get("expires_at"))?,
        created_at: parse_timestamp("created_at", row.get("created_at"))?,
        updated_at: parse_timestamp("updated_at", row.get("updated_at"))?,
    })
}

fn file_from_row(row: SqliteRow) -> Result<DigitalFile, RepositoryError> {
    let size_bytes = row.get::<i64, _>("size_bytes");
    let size_bytes = u64::try_from(size_bytes).map_err(|_| {
        RepositoryError::Decode(format!(
            "invalid value for `size_bytes` (expected non-negative): {size_bytes}"
        ))
    })?;

    Ok(DigitalFile {
        id: DigitalFileId(parse_uuid("id", row.get("id"))?),
        gallery_id: GalleryId(parse_uuid("gallery_id", row.get("gallery_id"))?),
        file_name: row.get("file_name"),
        content_type: row.get("content_type"),
        size_bytes,
        storage_key: row.get("storage_key"),
        created_at: parse_timestamp("created_at", row.get("created_at"))?,
    })
}
