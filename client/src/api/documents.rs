use reqwest::{
    multipart::{Form, Part},
    Method,
};
use std::path::PathBuf;

use super::{
    client::ApiClient,
    error::ApiError,
    resources::{AdminDocuments, MyDocuments, Resource},
    types::{Document, DocumentType, Filters, Id},
};

pub const MAX_DOCUMENT_BYTES: u64 = 5 * 1024 * 1024;
pub const PDF_MIME: &str = "application/pdf";
pub const DOCUMENT_FIELD: &str = "document";
pub const DOCUMENT_TYPE_FIELD: &str = "document_type";

/// Binary payload representation. Native and mobile runtimes hand over a file
/// reference; browser-hosted runtimes hand over an in-memory blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    pub doc_type: DocumentType,
    pub file_name: String,
    pub mime_type: String,
    pub source: UploadSource,
    pub description: Option<String>,
}

impl DocumentUpload {
    pub fn from_bytes(
        doc_type: DocumentType,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            doc_type,
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            source: UploadSource::Bytes(bytes),
            description: None,
        }
    }

    pub fn from_path(
        doc_type: DocumentType,
        path: impl Into<PathBuf>,
        mime_type: impl Into<String>,
    ) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());
        Self {
            doc_type,
            file_name,
            mime_type: mime_type.into(),
            source: UploadSource::Path(path),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into().trim().to_string();
        self.description = (!description.is_empty()).then_some(description);
        self
    }

    fn is_pdf(&self) -> bool {
        self.mime_type
            .split(';')
            .next()
            .map(|essence| essence.trim().eq_ignore_ascii_case(PDF_MIME))
            .unwrap_or(false)
    }

    /// Checks the type and size limits without touching the network. Returns
    /// the payload size in bytes.
    pub async fn validate(&self) -> Result<u64, ApiError> {
        if !self.is_pdf() {
            return Err(ApiError::field(DOCUMENT_FIELD, "El archivo debe ser un PDF."));
        }
        let size = match &self.source {
            UploadSource::Bytes(bytes) => bytes.len() as u64,
            UploadSource::Path(path) => tokio::fs::metadata(path)
                .await
                .map_err(|e| {
                    ApiError::field(DOCUMENT_FIELD, format!("No se pudo leer el archivo: {e}"))
                })?
                .len(),
        };
        check_size(size)?;
        Ok(size)
    }

    async fn into_part(self) -> Result<Part, ApiError> {
        let bytes = match self.source {
            UploadSource::Bytes(bytes) => bytes,
            UploadSource::Path(path) => tokio::fs::read(&path).await.map_err(|e| {
                ApiError::field(DOCUMENT_FIELD, format!("No se pudo leer el archivo: {e}"))
            })?,
        };
        // The file may have grown since validation.
        check_size(bytes.len() as u64)?;
        Part::bytes(bytes)
            .file_name(self.file_name)
            .mime_str(PDF_MIME)
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

fn check_size(size: u64) -> Result<(), ApiError> {
    if size > MAX_DOCUMENT_BYTES {
        return Err(ApiError::field(
            DOCUMENT_FIELD,
            "El archivo no debe superar los 5 MB.",
        ));
    }
    Ok(())
}

impl ApiClient {
    pub async fn my_documents(&self) -> Result<Vec<Document>, ApiError> {
        self.list::<MyDocuments>(&Filters::new()).await
    }

    /// Uploads a PDF as multipart form data. Invalid uploads are rejected
    /// before any request is issued.
    pub async fn upload_document(&self, upload: DocumentUpload) -> Result<Document, ApiError> {
        upload.validate().await?;

        let doc_type = upload.doc_type;
        let description = upload.description.clone();
        let mut form = Form::new()
            .text(DOCUMENT_TYPE_FIELD, doc_type.as_str())
            .part(DOCUMENT_FIELD, upload.into_part().await?);
        if let Some(description) = description {
            form = form.text("description", description);
        }

        self.send_json(self.request(Method::POST, MyDocuments::PATH).multipart(form))
            .await
    }

    pub async fn delete_document(&self, id: Id) -> Result<(), ApiError> {
        self.delete::<MyDocuments>(id).await
    }

    pub async fn admin_documents(&self, filters: &Filters) -> Result<Vec<Document>, ApiError> {
        self.list::<AdminDocuments>(filters).await
    }

    pub async fn admin_delete_document(&self, id: Id) -> Result<(), ApiError> {
        self.delete::<AdminDocuments>(id).await
    }
}
