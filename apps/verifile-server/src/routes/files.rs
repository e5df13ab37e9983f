//! File routes
//!
//! - POST /files - Upload a batch, rebuild the Merkle tree
//! - GET /files/:filename - Download one file with its inclusion proof

use std::collections::HashSet;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use verifile_core::storage::validate_file_name;
use verifile_core::transfer::encode_download;
use verifile_core::FileProvider;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Multipart field name carrying uploaded files
pub const UPLOAD_FIELD: &str = "files";

/// Upload size limit: 100MB per request
const MAX_UPLOAD_SIZE: usize = 100 * 1024 * 1024;

/// Upload response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub files: Vec<String>,
    pub root_hash: String,
    pub message: String,
}

/// Create the files router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(upload_files))
        .route("/:filename", get(download_file))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE))
}

/// POST /files
///
/// Every part named `files` is stored under its file name. The whole batch
/// is validated before anything is written.
async fn upload_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    tracing::info!("Uploading files...");

    let mut batch: Vec<(String, Vec<u8>)> = Vec::new();
    let mut seen = HashSet::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        if name != UPLOAD_FIELD {
            tracing::debug!(field = %name, "Skipping unexpected multipart field");
            continue;
        }

        let file_name = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::BadRequest("Uploaded part has no file name".to_string()))?;
        validate_file_name(&file_name)?;

        if !seen.insert(file_name.clone()) {
            return Err(AppError::BadRequest(format!(
                "File {} appears twice in the upload",
                file_name
            )));
        }

        let data = field.bytes().await?;
        tracing::debug!(file = %file_name, size = data.len(), "Received file");
        batch.push((file_name, data.to_vec()));
    }

    if batch.is_empty() {
        return Err(AppError::BadRequest(format!(
            "No files provided. Use field name '{}'",
            UPLOAD_FIELD
        )));
    }

    let _guard = state.lock_uploads().await;

    for (file_name, _) in &batch {
        if state.files().exists(file_name).await? {
            return Err(AppError::Conflict(format!("File {} already exists", file_name)));
        }
    }

    let root_hash = store_batch(&state, &batch).await?;
    let files: Vec<String> = batch.into_iter().map(|(name, _)| name).collect();

    tracing::info!(
        files = files.len(),
        root_hash = %root_hash,
        "Batch uploaded, Merkle tree generated"
    );

    Ok(Json(UploadResponse {
        files,
        root_hash,
        message: "Files were uploaded successfully".to_string(),
    }))
}

/// Write the batch and rebuild the tree.
///
/// Storage holds the whole batch or none of it: if a write or the rebuild
/// fails, every file of the batch written so far is removed again. Must be
/// called with the upload lock held, after the conflict check.
async fn store_batch(
    state: &AppState,
    batch: &[(String, Vec<u8>)],
) -> verifile_core::Result<String> {
    let mut attempted: Vec<&str> = Vec::with_capacity(batch.len());
    let mut failure = None;

    for (file_name, data) in batch {
        // A failed write may still leave a partial file behind
        attempted.push(file_name);
        if let Err(e) = state.files().write(file_name, data).await {
            failure = Some(e);
            break;
        }
    }

    let result = match failure {
        Some(e) => Err(e),
        None => state.coordinator().build_tree().await,
    };

    if let Err(e) = &result {
        tracing::error!(
            error = %e,
            files = attempted.len(),
            "Batch failed, removing its files"
        );
        for file_name in attempted {
            match state.files().remove(file_name).await {
                Ok(()) | Err(verifile_core::Error::NotFound(_)) => {}
                Err(remove_err) => {
                    tracing::error!(
                        file = %file_name,
                        error = %remove_err,
                        "Failed to remove file of a failed batch"
                    );
                }
            }
        }
    }

    result
}

/// GET /files/:filename
///
/// Responds with `multipart/form-data` carrying the file, the current root
/// hash and the proof for the file.
async fn download_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response> {
    validate_file_name(&filename)?;

    let exists = state.files().exists(&filename).await?;
    tracing::info!(file = %filename, exists = exists, "Download requested");
    if !exists {
        return Err(AppError::NotFound(format!("File {} not found", filename)));
    }

    let content = state.files().read(&filename).await?;
    let proof = state.coordinator().make_proof(&filename).await?;

    tracing::debug!(
        file = %filename,
        steps = proof.hashes.len(),
        root_hash = %proof.root_hash,
        "Serving file with proof"
    );

    let payload = encode_download(&filename, &content, &proof)?;

    Ok(([(header::CONTENT_TYPE, payload.content_type)], payload.body).into_response())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tempfile::TempDir;
    use tower::ServiceExt;
    use verifile_core::transfer::decode_download;
    use verifile_core::{
        verify_download, Error as CoreError, HashProvider, LocalFileProvider, MemoryFileProvider,
        MerkleTree, Sha256Hasher,
    };

    use super::*;

    const BOUNDARY: &str = "test-boundary";

    async fn test_state(temp_dir: &TempDir) -> AppState {
        let files = LocalFileProvider::new(temp_dir.path()).await.unwrap();
        AppState::new(Arc::new(files), Arc::new(Sha256Hasher))
    }

    fn upload_request(files: &[(&str, &[u8])]) -> Request<Body> {
        let mut body = Vec::new();
        for (name, data) in files {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                    BOUNDARY, name
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method("POST")
            .uri("/files")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn download_request(name: &str) -> Request<Body> {
        Request::builder()
            .uri(format!("/files/{}", name))
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    const BATCH: [(&str, &[u8]); 3] = [
        ("a.txt", b"first file"),
        ("b.txt", b"second file"),
        ("c.txt", b"third file"),
    ];

    fn expected_root() -> String {
        let leaves = BATCH.iter().map(|(_, data)| Sha256Hasher.leaf_hash(data));
        MerkleTree::build(leaves, Arc::new(Sha256Hasher))
            .unwrap()
            .root_hash()
            .to_string()
    }

    #[tokio::test]
    async fn test_upload_builds_tree() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir).await;
        let app = crate::app(state.clone());

        let response = app.oneshot(upload_request(&BATCH)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["rootHash"], expected_root());
        assert_eq!(body["files"], serde_json::json!(["a.txt", "b.txt", "c.txt"]));
        assert_eq!(state.coordinator().root_hash().unwrap(), expected_root());
        assert_eq!(std::fs::read(temp_dir.path().join("b.txt")).unwrap(), b"second file");
    }

    #[tokio::test]
    async fn test_download_carries_valid_proof() {
        let temp_dir = TempDir::new().unwrap();
        let app = crate::app(test_state(&temp_dir).await);

        let response = app.clone().oneshot(upload_request(&BATCH)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(download_request("b.txt")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload = decode_download(&content_type, body).await.unwrap();

        assert_eq!(payload.content, b"second file");
        assert_eq!(payload.file_name.as_deref(), Some("b.txt"));
        assert_eq!(payload.root_hash.as_deref(), Some(expected_root().as_str()));
        verify_download(&Sha256Hasher, &payload.content, &payload.proof, &expected_root()).unwrap();
    }

    #[tokio::test]
    async fn test_download_unknown_file() {
        let temp_dir = TempDir::new().unwrap();
        let app = crate::app(test_state(&temp_dir).await);

        let response = app.oneshot(download_request("missing.txt")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"], "not_found");
    }

    #[tokio::test]
    async fn test_download_before_any_build() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("stray.txt"), b"not uploaded").unwrap();
        let app = crate::app(test_state(&temp_dir).await);

        let response = app.oneshot(download_request("stray.txt")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_upload_rejects_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let app = crate::app(test_state(&temp_dir).await);

        let response = app.clone().oneshot(upload_request(&BATCH)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(upload_request(&[("d.txt", &b"new"[..]), ("a.txt", &b"again"[..])]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        // Nothing from the rejected batch is written
        assert!(!temp_dir.path().join("d.txt").exists());
    }

    #[tokio::test]
    async fn test_upload_rejects_empty_batch() {
        let temp_dir = TempDir::new().unwrap();
        let app = crate::app(test_state(&temp_dir).await);

        let response = app.oneshot(upload_request(&[])).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_rejects_path_traversal() {
        let temp_dir = TempDir::new().unwrap();
        let app = crate::app(test_state(&temp_dir).await);

        let response = app
            .oneshot(upload_request(&[("..", &b"escape"[..])]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_second_batch_extends_tree() {
        let temp_dir = TempDir::new().unwrap();
        let state = test_state(&temp_dir).await;
        let app = crate::app(state.clone());

        app.clone().oneshot(upload_request(&BATCH)).await.unwrap();
        let first_root = state.coordinator().root_hash().unwrap();

        let response = app
            .oneshot(upload_request(&[("d.txt", &b"fourth file"[..])]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_ne!(state.coordinator().root_hash().unwrap(), first_root);
        assert_eq!(state.coordinator().current().unwrap().leaf_count(), 4);
    }

    /// Memory storage whose writes to one name fail
    struct FailingWrites {
        inner: MemoryFileProvider,
        fail_on: &'static str,
    }

    #[async_trait::async_trait]
    impl FileProvider for FailingWrites {
        async fn list(&self) -> verifile_core::Result<Vec<String>> {
            self.inner.list().await
        }

        async fn read(&self, name: &str) -> verifile_core::Result<Vec<u8>> {
            self.inner.read(name).await
        }

        async fn write(&self, name: &str, data: &[u8]) -> verifile_core::Result<()> {
            if name == self.fail_on {
                return Err(CoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "disk full",
                )));
            }
            self.inner.write(name, data).await
        }

        async fn exists(&self, name: &str) -> verifile_core::Result<bool> {
            self.inner.exists(name).await
        }

        async fn remove(&self, name: &str) -> verifile_core::Result<()> {
            self.inner.remove(name).await
        }
    }

    #[tokio::test]
    async fn test_failed_batch_leaves_no_files() {
        let files = Arc::new(FailingWrites {
            inner: MemoryFileProvider::new(),
            fail_on: "b.txt",
        });
        let state = AppState::new(files.clone(), Arc::new(Sha256Hasher));
        let app = crate::app(state.clone());

        let response = app
            .clone()
            .oneshot(upload_request(&[("a.txt", &b"alpha"[..]), ("b.txt", &b"bravo"[..])]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(files.list().await.unwrap().is_empty());
        assert!(!state.coordinator().is_built());

        // The surviving file can be uploaded again
        let response = app
            .oneshot(upload_request(&[("a.txt", &b"alpha"[..])]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(files.list().await.unwrap(), vec!["a.txt"]);
        assert_eq!(state.coordinator().current().unwrap().leaf_count(), 1);
    }
}
