use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use focal_core::domain::client::ClientId;
use focal_core::domain::gallery::{
    generate_share_token, DigitalFile, DigitalFileId, Gallery, GalleryId, GalleryStatus,
};
use focal_core::errors::ToolError;
use focal_db::repositories::{ClientRepository, GalleryRepository};

use super::{parse_params, to_json};
use crate::registry::Tool;
use crate::schema::{FieldSpec, ParameterSchema};

pub struct CreateGalleryTool {
    galleries: Arc<dyn GalleryRepository>,
    clients: Arc<dyn ClientRepository>,
    schema: ParameterSchema,
}

impl CreateGalleryTool {
    pub fn new(galleries: Arc<dyn GalleryRepository>, clients: Arc<dyn ClientRepository>) -> Self {
        Self {
            galleries,
            clients,
            schema: ParameterSchema::new()
                .field(FieldSpec::string("title").required().min_len(1).max_len(200))
                .field(FieldSpec::uuid("client_id").describe("Client the gallery belongs to"))
                .field(
                    FieldSpec::datetime("expires_at")
                        .describe("When the share link stops working"),
                ),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateGalleryParams {
    title: String,
    client_id: Option<Uuid>,
    expires_at: Option<DateTime<Utc>>,
}

#[async_trait]
impl Tool for CreateGalleryTool {
    fn name(&self) -> &'static str {
        "create_gallery"
    }

    fn description(&self) -> &'static str {
        "Create a client gallery with a fresh share token"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: CreateGalleryParams = parse_params(params)?;

        let client_id = match params.client_id {
            Some(raw) => {
                let id = ClientId(raw);
                if self.clients.find_by_id(&id).await?.is_none() {
                    return Err(ToolError::not_found("client", raw));
                }
                Some(id)
            }
            None => None,
        };

        let now = Utc::now();
        let gallery = Gallery {
            id: GalleryId(Uuid::new_v4()),
            client_id,
            title: params.title,
            share_token: generate_share_token(),
            status: GalleryStatus::Draft,
            expires_at: params.expires_at,
            created_at: now,
            updated_at: now,
        };

        self.galleries.insert(gallery.clone()).await?;
        Ok(json!({
            "gallery_id": gallery.id.0,
            "share_token": gallery.share_token,
            "status": gallery.status.as_str(),
        }))
    }
}

pub struct UpdateGalleryTool {
    galleries: Arc<dyn GalleryRepository>,
    schema: ParameterSchema,
}

impl UpdateGalleryTool {
    pub fn new(galleries: Arc<dyn GalleryRepository>) -> Self {
        Self {
            galleries,
            schema: ParameterSchema::new()
                .field(FieldSpec::uuid("gallery_id").required())
                .field(FieldSpec::string("title").min_len(1).max_len(200))
                .field(FieldSpec::enumeration("status", GalleryStatus::VALUES))
                .field(FieldSpec::datetime("expires_at")),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UpdateGalleryParams {
    gallery_id: Uuid,
    title: Option<String>,
    status: Option<GalleryStatus>,
    expires_at: Option<DateTime<Utc>>,
}

#[async_trait]
impl Tool for UpdateGalleryTool {
    fn name(&self) -> &'static str {
        "update_gallery"
    }

    fn description(&self) -> &'static str {
        "Rename, publish, archive, or re-expire a gallery"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: UpdateGalleryParams = parse_params(params)?;
        let id = GalleryId(params.gallery_id);

        let Some(mut gallery) = self.galleries.find_by_id(&id).await? else {
            return Err(ToolError::not_found("gallery", params.gallery_id));
        };

        if let Some(title) = params.title {
            gallery.title = title;
        }
        if let Some(status) = params.status {
            gallery.status = status;
        }
        if let Some(expires_at) = params.expires_at {
            gallery.expires_at = Some(expires_at);
        }
        gallery.updated_at = Utc::now();

        let status = gallery.status.as_str();
        if self.galleries.update(gallery).await? == 0 {
            return Err(ToolError::not_found("gallery", params.gallery_id));
        }
        Ok(json!({"gallery_id": params.gallery_id, "status": status}))
    }
}

pub struct ReadGalleriesTool {
    galleries: Arc<dyn GalleryRepository>,
    schema: ParameterSchema,
}

impl ReadGalleriesTool {
    pub fn new(galleries: Arc<dyn GalleryRepository>) -> Self {
        Self {
            galleries,
            schema: ParameterSchema::new()
                .field(FieldSpec::uuid("client_id"))
                .field(FieldSpec::enumeration("status", GalleryStatus::VALUES))
                .field(FieldSpec::integer("limit").min(1).max(100).default_value(json!(50))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReadGalleriesParams {
    client_id: Option<Uuid>,
    status: Option<GalleryStatus>,
    limit: u32,
}

#[async_trait]
impl Tool for ReadGalleriesTool {
    fn name(&self) -> &'static str {
        "read_galleries"
    }

    fn description(&self) -> &'static str {
        "List galleries, optionally by client or status"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: ReadGalleriesParams = parse_params(params)?;
        let client_id = params.client_id.map(ClientId);
        let galleries =
            self.galleries.list(client_id.as_ref(), params.status, params.limit).await?;

        Ok(json!({"count": galleries.len(), "galleries": to_json(&galleries)?}))
    }
}

pub struct DeleteGalleryTool {
    galleries: Arc<dyn GalleryRepository>,
    schema: ParameterSchema,
}

impl DeleteGalleryTool {
    pub fn new(galleries: Arc<dyn GalleryRepository>) -> Self {
        Self {
            galleries,
            schema: ParameterSchema::new().field(FieldSpec::uuid("gallery_id").required()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DeleteGalleryParams {
    gallery_id: Uuid,
}

#[async_trait]
impl Tool for DeleteGalleryTool {
    fn name(&self) -> &'static str {
        "delete_gallery"
    }

    fn description(&self) -> &'static str {
        "Delete a gallery and its file records"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: DeleteGalleryParams = parse_params(params)?;
        let id = GalleryId(params.gallery_id);

        if self.galleries.delete(&id).await? == 0 {
            return Err(ToolError::not_found("gallery", params.gallery_id));
        }
        Ok(json!({"gallery_id": params.gallery_id, "deleted": true}))
    }
}

pub struct AddDigitalFileTool {
    galleries: Arc<dyn GalleryRepository>,
    schema: ParameterSchema,
}

impl AddDigitalFileTool {
    pub fn new(galleries: Arc<dyn GalleryRepository>) -> Self {
        Self {
            galleries,
            schema: ParameterSchema::new()
                .field(FieldSpec::uuid("gallery_id").required())
                .field(FieldSpec::string("file_name").required().min_len(1).max_len(255))
                .field(
                    FieldSpec::string("content_type")
                        .required()
                        .min_len(1)
                        .max_len(100)
                        .describe("MIME type, e.g. image/jpeg"),
                )
                .field(FieldSpec::integer("size_bytes").required().min(1))
                .field(
                    FieldSpec::string("storage_key")
                        .required()
                        .min_len(1)
                        .max_len(500)
                        .describe("Object-store key where the bytes live"),
                ),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AddDigitalFileParams {
    gallery_id: Uuid,
    file_name: String,
    content_type: String,
    size_bytes: u64,
    storage_key: String,
}

#[async_trait]
impl Tool for AddDigitalFileTool {
    fn name(&self) -> &'static str {
        "add_digital_file"
    }

    fn description(&self) -> &'static str {
        "Attach a stored file to a gallery"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: AddDigitalFileParams = parse_params(params)?;
        let gallery_id = GalleryId(params.gallery_id);

        if self.galleries.find_by_id(&gallery_id).await?.is_none() {
            return Err(ToolError::not_found("gallery", params.gallery_id));
        }

        let file = DigitalFile {
            id: DigitalFileId(Uuid::new_v4()),
            gallery_id,
            file_name: params.file_name,
            content_type: params.content_type,
            size_bytes: params.size_bytes,
            storage_key: params.storage_key,
            created_at: Utc::now(),
        };

        self.galleries.insert_file(file.clone()).await?;
        Ok(json!({"file_id": file.id.0, "gallery_id": params.gallery_id}))
    }
}

pub struct ReadDigitalFilesTool {
    galleries: Arc<dyn GalleryRepository>,
    schema: ParameterSchema,
}

impl ReadDigitalFilesTool {
    pub fn new(galleries: Arc<dyn GalleryRepository>) -> Self {
        Self {
            galleries,
            schema: ParameterSchema::new().field(FieldSpec::uuid("gallery_id").required()),
        }
    }
}

#[async_trait]
impl Tool for ReadDigitalFilesTool {
    fn name(&self) -> &'static str {
        "read_digital_files"
    }

    fn description(&self) -> &'static str {
        "List the files attached to a gallery"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: DeleteGalleryParams = parse_params(params)?;
        let gallery_id = GalleryId(params.gallery_id);

        if self.galleries.find_by_id(&gallery_id).await?.is_none() {
            return Err(ToolError::not_found("gallery", params.gallery_id));
        }

        let files = self.galleries.list_files(&gallery_id).await?;
        Ok(json!({"count": files.len(), "files": to_json(&files)?}))
    }
}

pub struct DeleteDigitalFileTool {
    galleries: Arc<dyn GalleryRepository>,
    schema: ParameterSchema,
}

impl DeleteDigitalFileTool {
    pub fn new(galleries: Arc<dyn GalleryRepository>) -> Self {
        Self {
            galleries,
            schema: ParameterSchema::new().field(FieldSpec::uuid("file_id").required()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DeleteDigitalFileParams {
    file_id: Uuid,
}

#[async_trait]
impl Tool for DeleteDigitalFileTool {
    fn name(&self) -> &'static str {
        "delete_digital_file"
    }

    fn description(&self) -> &'static str {
        "Remove a file record from its gallery"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: DeleteDigitalFileParams = parse_params(params)?;
        let id = DigitalFileId(params.file_id);

        if self.galleries.delete_file(&id).await? == 0 {
            return Err(ToolError::not_found("file", params.file_id));
        }
        Ok(json!({"file_id": params.file_id, "deleted": true}))
    }
}
