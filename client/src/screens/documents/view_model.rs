use crate::api::{ApiClient, ApiError, Document, DocumentUpload, Id};
use crate::screens::MessageState;
use crate::state::cache::{CacheKey, QueryCache};

#[derive(Clone)]
pub struct DocumentsViewModel {
    api: ApiClient,
    cache: QueryCache,
    pub message: MessageState,
}

impl DocumentsViewModel {
    pub fn new(api: ApiClient, cache: QueryCache) -> Self {
        Self {
            api,
            cache,
            message: MessageState::default(),
        }
    }

    pub async fn documents(&self) -> Result<Vec<Document>, ApiError> {
        let api = self.api.clone();
        self.cache
            .fetch(CacheKey::Documents, || async move { api.my_documents().await })
            .await
    }

    pub async fn upload(&mut self, upload: DocumentUpload) -> Result<Document, ApiError> {
        let result = match upload.validate().await {
            Ok(size) => {
                tracing::debug!(size, file_name = %upload.file_name, "uploading document");
                let api = self.api.clone();
                self.cache
                    .mutate(vec![CacheKey::Documents], async move {
                        api.upload_document(upload).await
                    })
                    .await
            }
            Err(err) => Err(err),
        };
        self.message.record(result, "Documento cargado.")
    }

    pub async fn delete(&mut self, id: Id) -> Result<(), ApiError> {
        let api = self.api.clone();
        let result = self
            .cache
            .mutate(vec![CacheKey::Documents], async move {
                api.delete_document(id).await
            })
            .await;
        self.message.record(result, "Documento eliminado.")
    }
}
