use std::sync::Arc;

use basket_blob::{BlobBackend, BlobError};
use basket_core::{bail_basket, BasketError, BasketResult};
use basket_store::{File, FileStore, StoreError};
use chrono::Utc;
use futures_util::StreamExt;
use uuid::Uuid;

use crate::dto::{UpdateFileRequest, UploadFileRequest};
use crate::reader::read_chunks;
use crate::sink::{DownloadHead, DownloadSink};
use crate::FileServiceConfig;

/// File domain service.
///
/// Metadata goes to a [`FileStore`], bytes go to a [`BlobBackend`]. The two
/// are not updated atomically: a failure between them can leave an orphan
/// blob, never a record without its blob being uploaded first.
#[derive(Clone)]
pub struct FileService {
    store: Arc<dyn FileStore>,
    blobs: Arc<dyn BlobBackend>,
    config: FileServiceConfig,
}

impl FileService {
    pub fn new(store: Arc<dyn FileStore>, blobs: Arc<dyn BlobBackend>, config: FileServiceConfig) -> Self {
        Self { store, blobs, config }
    }

    pub fn config(&self) -> &FileServiceConfig {
        &self.config
    }

    pub async fn get(&self, id: Uuid) -> BasketResult<File> {
        self.store.get(id).await.map_err(store_error)
    }

    /// Apply the non-empty fields of `request` and refresh `updated_at`.
    pub async fn update(&self, id: Uuid, request: UpdateFileRequest) -> BasketResult<File> {
        let mut file = self.get(id).await?;

        if !request.title.is_empty() {
            file.title = request.title;
        }
        if !request.name.is_empty() {
            file.name = request.name;
        }
        if !request.description.is_empty() {
            file.description = request.description;
        }
        file.updated_at = Utc::now();

        self.store.update(&file).await.map_err(store_error)?;
        tracing::debug!(file_id = %id, "file updated");
        Ok(file)
    }

    /// Stream the payload to the blob backend and record it.
    ///
    /// Validation happens before any backend call. If the transfer fails
    /// nothing is recorded and any partial blob is left to the backend.
    pub async fn upload(&self, request: UploadFileRequest) -> BasketResult<File> {
        let Some(payload) = request.file else {
            bail_basket!(validation, "file is required");
        };
        if payload.filename.is_empty() {
            bail_basket!(validation, "file name is required");
        }
        if payload.size > self.config.max_file_size {
            tracing::debug!(size = payload.size, max = self.config.max_file_size, "upload rejected");
            bail_basket!(validation, "file size is too large");
        }

        let body = read_chunks(payload.source, self.config.chunk_size);
        let source_ref = self.blobs.upload(body).await.map_err(|e| blob_error("upload", e))?;

        let now = Utc::now();
        let file = File {
            id: Uuid::new_v4(),
            source_ref,
            title: title_from_filename(&payload.filename).to_string(),
            name: payload.filename,
            description: String::new(),
            size: payload.size,
            download_count: 0,
            created_at: now,
            updated_at: now,
        };

        self.store.create(&file).await.map_err(store_error)?;
        tracing::info!(file_id = %file.id, name = %file.name, size = file.size, "file uploaded");
        Ok(file)
    }

    /// Write the file's bytes into `sink`, then count the download.
    ///
    /// The counter only moves after the last chunk was accepted by the sink,
    /// and only through [`FileStore::record_download`], so concurrent
    /// downloads and updates never overwrite each other.
    pub async fn download(&self, id: Uuid, sink: &mut dyn DownloadSink) -> BasketResult<()> {
        let file = self.get(id).await?;

        let mut body = self
            .blobs
            .download(&file.source_ref)
            .await
            .map_err(|e| blob_error("download", e))?;

        sink.start(DownloadHead::new(file.name.clone(), file.size))
            .await
            .map_err(BasketError::internal)?;

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| {
                tracing::warn!(file_id = %id, error = %e, "blob stream failed");
                BasketError::internal(e)
            })?;
            sink.write_chunk(chunk).await.map_err(|e| {
                tracing::debug!(file_id = %id, error = %e, "download sink closed");
                BasketError::internal(e)
            })?;
        }

        let recorded = self
            .store
            .record_download(id, Utc::now())
            .await
            .map_err(store_error)?;

        tracing::debug!(file_id = %id, download_count = recorded.download_count, "file downloaded");
        Ok(())
    }

    /// Remove the record, and the blob too once nothing references it.
    pub async fn delete(&self, id: Uuid) -> BasketResult<()> {
        let file = self.get(id).await?;

        let still_referenced = self
            .store
            .remove_and_check_ref(&file)
            .await
            .map_err(store_error)?;

        if !still_referenced {
            self.blobs
                .delete(&file.source_ref)
                .await
                .map_err(|e| blob_error("delete", e))?;
            tracing::debug!(file_id = %id, "blob deleted");
        }

        tracing::info!(file_id = %id, "file deleted");
        Ok(())
    }
}

/// Filename up to the first `.`, or the whole name when there is none.
pub fn title_from_filename(filename: &str) -> &str {
    filename.split_once('.').map_or(filename, |(stem, _)| stem)
}

fn store_error(err: StoreError) -> BasketError {
    match err {
        StoreError::NotFound(_) => BasketError::not_found("file not found"),
        other => {
            tracing::error!(error = %other, "metadata store failed");
            BasketError::internal(other)
        }
    }
}

fn blob_error(op: &'static str, err: BlobError) -> BasketError {
    tracing::error!(op, error = %err, "blob backend failed");
    BasketError::internal(err)
}
