//! Download payload codec
//!
//! A download response is `multipart/form-data` with three parts:
//!
//! - `file`: raw bytes, with the file name in the content disposition
//! - `rootHash`: the server's current root hash as text
//! - `proof`: the JSON-encoded [`Proof`]
//!
//! The client only trusts `proof` after checking it against its own root.

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::proof::Proof;

pub const FILE_PART: &str = "file";
pub const ROOT_HASH_PART: &str = "rootHash";
pub const PROOF_PART: &str = "proof";

/// Decoded download response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadPayload {
    pub file_name: Option<String>,
    pub content: Vec<u8>,
    pub root_hash: Option<String>,
    pub proof: Proof,
}

/// Encoded multipart body with its content type
#[derive(Debug, Clone)]
pub struct EncodedPayload {
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Encode a file and its proof as `multipart/form-data`
pub fn encode_download(file_name: &str, content: &[u8], proof: &Proof) -> Result<EncodedPayload> {
    let boundary = format!("verifile-{}", uuid::Uuid::new_v4().simple());
    let proof_json = proof.to_json()?;
    let escaped_name = file_name.replace('\\', "\\\\").replace('"', "\\\"");

    let mut body = Vec::with_capacity(content.len() + proof_json.len() + 512);

    push_part_header(
        &mut body,
        &boundary,
        &format!("name=\"{}\"; filename=\"{}\"", FILE_PART, escaped_name),
        "application/octet-stream",
    );
    body.extend_from_slice(content);
    body.extend_from_slice(b"\r\n");

    push_part_header(
        &mut body,
        &boundary,
        &format!("name=\"{}\"", ROOT_HASH_PART),
        "text/plain; charset=utf-8",
    );
    body.extend_from_slice(proof.root_hash.as_bytes());
    body.extend_from_slice(b"\r\n");

    push_part_header(
        &mut body,
        &boundary,
        &format!("name=\"{}\"", PROOF_PART),
        "application/json",
    );
    body.extend_from_slice(proof_json.as_bytes());
    body.extend_from_slice(b"\r\n");

    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    Ok(EncodedPayload {
        content_type: format!("multipart/form-data; boundary={}", boundary),
        body,
    })
}

fn push_part_header(body: &mut Vec<u8>, boundary: &str, disposition: &str, content_type: &str) {
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; {}\r\nContent-Type: {}\r\n\r\n",
            boundary, disposition, content_type
        )
        .as_bytes(),
    );
}

/// Decode a download response body
///
/// # Errors
///
/// Returns `Error::Transfer` if the body is not valid multipart, or the
/// `file` or `proof` part is missing.
pub async fn decode_download(content_type: &str, body: Bytes) -> Result<DownloadPayload> {
    let boundary = multer::parse_boundary(content_type)
        .map_err(|e| Error::Transfer(format!("invalid content type {:?}: {}", content_type, e)))?;

    let stream = futures::stream::once(async move { Ok::<Bytes, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut file: Option<(Option<String>, Vec<u8>)> = None;
    let mut root_hash = None;
    let mut proof = None;

    while let Some(field) = multipart.next_field().await.map_err(transfer_error)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            FILE_PART => {
                let file_name = field.file_name().map(|s| s.to_string());
                let data = field.bytes().await.map_err(transfer_error)?;
                file = Some((file_name, data.to_vec()));
            }
            ROOT_HASH_PART => {
                root_hash = Some(field.text().await.map_err(transfer_error)?);
            }
            PROOF_PART => {
                let json = field.text().await.map_err(transfer_error)?;
                proof = Some(Proof::from_json(&json)?);
            }
            other => {
                tracing::debug!(part = %other, "Ignoring unknown download part");
            }
        }
    }

    let (file_name, content) =
        file.ok_or_else(|| Error::Transfer("download is missing the file part".to_string()))?;
    let proof =
        proof.ok_or_else(|| Error::Transfer("download is missing the proof part".to_string()))?;

    Ok(DownloadPayload {
        file_name,
        content,
        root_hash,
        proof,
    })
}

fn transfer_error(e: multer::Error) -> Error {
    Error::Transfer(e.to_string())
}
