//! HTTP file service
//!
//! Talks to the Verifile server. Upload commits the locally computed root
//! hash; download only accepts content whose proof replays to that root.

use std::sync::Arc;

use reqwest::{header::CONTENT_TYPE, multipart, Url};
use serde::Deserialize;
use verifile_core::storage::validate_file_name;
use verifile_core::transfer::{decode_download, DownloadPayload};
use verifile_core::{
    verify_download, FileProvider, HashProvider, LeafHash, MerkleTree, RootHashStore,
};

use crate::error::{ClientError, Result};

/// Multipart field name the server expects for uploaded files
const UPLOAD_FIELD: &str = "files";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    #[serde(default)]
    root_hash: Option<String>,
}

/// Outcome of a successful upload
#[derive(Debug, Clone)]
pub struct UploadReport {
    pub files: Vec<String>,
    /// Root computed locally and committed to the root-hash store
    pub root_hash: String,
    /// Root the server reported, if any
    pub server_root_hash: Option<String>,
    /// Uploaded files whose local copy could not be removed
    pub left_behind: Vec<String>,
}

/// Outcome of a verified download
#[derive(Debug, Clone)]
pub struct DownloadReport {
    pub file_name: String,
    pub leaf_hash: LeafHash,
    pub root_hash: String,
    pub size: usize,
}

pub struct FileService {
    http: reqwest::Client,
    base_url: Url,
    files: Arc<dyn FileProvider>,
    hasher: Arc<dyn HashProvider>,
    roots: Arc<dyn RootHashStore>,
}

impl FileService {
    pub fn new(
        base_url: &str,
        files: Arc<dyn FileProvider>,
        hasher: Arc<dyn HashProvider>,
        roots: Arc<dyn RootHashStore>,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            files,
            hasher,
            roots,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Upload every local file as one batch.
    ///
    /// The root is computed from the exact bytes sent. It is committed only
    /// after the server accepts the batch, and the local copies are removed
    /// after that. A copy that cannot be removed does not fail the upload;
    /// it is listed in `left_behind`.
    pub async fn upload(&self) -> Result<UploadReport> {
        let names = self.files.list().await?;
        if names.is_empty() {
            return Err(ClientError::NothingToUpload);
        }

        let mut form = multipart::Form::new();
        let mut leaves = Vec::with_capacity(names.len());
        for name in &names {
            let data = self.files.read(name).await?;
            leaves.push(self.hasher.leaf_hash(&data));
            form = form.part(
                UPLOAD_FIELD,
                multipart::Part::bytes(data).file_name(name.clone()),
            );
        }

        let tree = MerkleTree::build(leaves, self.hasher.clone())?;
        let root_hash = tree.root_hash().to_string();
        tracing::info!(files = names.len(), root_hash = %root_hash, "Computed Merkle root");

        let url = self.endpoint(&["files"])?;
        tracing::debug!(url = %url, "Uploading files");
        let response = self.http.post(url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), body = %body, "Upload rejected");
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let server_root_hash = match response.json::<UploadResponse>().await {
            Ok(body) => body.root_hash,
            Err(e) => {
                tracing::warn!("Could not read upload response: {}", e);
                None
            }
        };
        if let Some(server_root) = &server_root_hash {
            // The server root covers every file it holds, not just this batch
            if server_root != &root_hash {
                tracing::warn!(
                    local = %root_hash,
                    server = %server_root,
                    "Server root differs from the local root"
                );
            }
        }

        self.roots.store(&root_hash).await?;

        let mut left_behind = Vec::new();
        for name in &names {
            if let Err(e) = self.files.remove(name).await {
                tracing::warn!(file = %name, error = %e, "Failed to remove uploaded file");
                left_behind.push(name.clone());
            }
        }

        tracing::info!(
            root_hash = %root_hash,
            left_behind = left_behind.len(),
            "Upload committed"
        );
        Ok(UploadReport {
            files: names,
            root_hash,
            server_root_hash,
            left_behind,
        })
    }

    /// Download `file_name`, verify it against the committed root and write
    /// it to local storage.
    ///
    /// Nothing is written unless verification succeeds.
    pub async fn download(&self, file_name: &str) -> Result<DownloadReport> {
        let payload = self.fetch(file_name).await?;
        self.accept(file_name, payload).await
    }

    /// Fetch and decode the download payload for `file_name`, unverified
    pub async fn fetch(&self, file_name: &str) -> Result<DownloadPayload> {
        validate_file_name(file_name)?;

        let url = self.endpoint(&["files", file_name])?;
        tracing::debug!(url = %url, "Downloading file");
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.bytes().await?;
        let payload = decode_download(&content_type, body).await?;

        if let Some(asserted) = &payload.root_hash {
            tracing::debug!(root_hash = %asserted, "Server asserted root");
        }
        Ok(payload)
    }

    /// Verify `payload` against the committed root and save it as
    /// `file_name`. Nothing is written unless verification succeeds.
    pub async fn accept(&self, file_name: &str, payload: DownloadPayload) -> Result<DownloadReport> {
        validate_file_name(file_name)?;

        let trusted_root = self.roots.load().await?;
        let leaf_hash = match verify_download(
            self.hasher.as_ref(),
            &payload.content,
            &payload.proof,
            &trusted_root,
        ) {
            Ok(leaf_hash) => leaf_hash,
            Err(e) => {
                tracing::error!(file = %file_name, "Rejected download: {}", e);
                return Err(e.into());
            }
        };

        self.files.write(file_name, &payload.content).await?;

        tracing::info!(file = %file_name, leaf = %leaf_hash, "File verified and saved");
        Ok(DownloadReport {
            file_name: file_name.to_string(),
            leaf_hash,
            root_hash: trusted_root,
            size: payload.content.len(),
        })
    }

    /// Root hash committed by the last successful upload
    pub async fn committed_root(&self) -> Result<String> {
        Ok(self.roots.load().await?)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}
