// src/ingest.rs
// Client for the Onyx document ingestion API

use crate::error::{LocalDirError, Result};
use crate::files::FileAccessor;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Path of the ingestion endpoint, relative to the Onyx base URL.
pub const INGEST_ENDPOINT: &str = "/api/mcp/local-files";

/// Wire request for the ingestion API. Field names are the API's
/// camelCase contract, not ours.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IngestRequest<'a> {
    file_path: &'a str,
    file_name: &'a str,
    file_type: &'static str,
    content: String,
    mime_type: &'a str,
    file_size: u64,
    checksum: &'a str,
    document_set: Option<&'a str>,
}

/// Wire response from the ingestion API. Every field is optional on the
/// wire; downstream defaults are applied when the receipt is built.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct IngestResponse {
    document_id: Option<serde_json::Value>,
    file_id: Option<serde_json::Value>,
    chunks: u64,
    message: Option<String>,
}

/// Successful ingestion outcome for one file.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReceipt {
    pub success: bool,
    pub file_path: String,
    pub file_name: String,
    pub document_id: Option<serde_json::Value>,
    pub file_id: Option<serde_json::Value>,
    pub chunks: u64,
    pub message: String,
}

/// Uploads a local file's content and metadata to the Onyx ingestion
/// endpoint. Performs no retries: a failed attempt is final for that file
/// within one operation (the orchestrator does not retry either).
#[derive(Clone)]
pub struct IngestionClient {
    files: FileAccessor,
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl IngestionClient {
    pub fn new(
        files: FileAccessor,
        http: reqwest::Client,
        base_url: String,
        api_key: Option<String>,
    ) -> Self {
        Self {
            files,
            http,
            base_url,
            api_key,
        }
    }

    /// Read `path` (inheriting every sandbox/size failure mode of the
    /// binary read) and upload it, optionally labeled with a document set.
    pub async fn ingest(&self, path: &Path, document_set: Option<&str>) -> Result<IngestReceipt> {
        let file = self.files.read_binary(path).await?;

        let payload = IngestRequest {
            file_path: &file.file_path,
            file_name: &file.file_name,
            file_type: "file",
            content: BASE64.encode(&file.bytes),
            mime_type: &file.mime_type,
            file_size: file.file_size,
            checksum: &file.checksum,
            document_set,
        };

        let url = format!("{}{}", self.base_url.trim_end_matches('/'), INGEST_ENDPOINT);
        debug!("ingesting {} ({} bytes) to {}", file.file_name, file.file_size, url);

        let mut request = self.http.post(&url).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(LocalDirError::IngestionUnreachable)?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(LocalDirError::IngestionUnreachable)?;

        if !status.is_success() {
            return Err(LocalDirError::IngestionFailed {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: IngestResponse =
            serde_json::from_str(&body).map_err(|_| LocalDirError::IngestionFailed {
                status: status.as_u16(),
                body,
            })?;

        Ok(IngestReceipt {
            success: true,
            file_path: file.file_path,
            file_name: file.file_name,
            document_id: parsed.document_id,
            file_id: parsed.file_id,
            chunks: parsed.chunks,
            message: parsed
                .message
                .unwrap_or_else(|| "File ingested successfully".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_camel_case() {
        let payload = IngestRequest {
            file_path: "/data/a.txt",
            file_name: "a.txt",
            file_type: "file",
            content: "YQ==".to_string(),
            mime_type: "text/plain",
            file_size: 1,
            checksum: "0cc175b9c0f1b6a831c399e269772661",
            document_set: Some("docs"),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["filePath"], "/data/a.txt");
        assert_eq!(value["fileName"], "a.txt");
        assert_eq!(value["fileType"], "file");
        assert_eq!(value["mimeType"], "text/plain");
        assert_eq!(value["fileSize"], 1);
        assert_eq!(value["documentSet"], "docs");
    }

    #[test]
    fn test_request_null_document_set() {
        let payload = IngestRequest {
            file_path: "/data/a.txt",
            file_name: "a.txt",
            file_type: "file",
            content: String::new(),
            mime_type: "text/plain",
            file_size: 0,
            checksum: "",
            document_set: None,
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert!(value["documentSet"].is_null());
    }

    #[test]
    fn test_response_parses_full_payload() {
        let parsed: IngestResponse = serde_json::from_str(
            r#"{"documentId": "doc-1", "fileId": 42, "chunks": 7, "message": "stored"}"#,
        )
        .unwrap();
        assert_eq!(parsed.document_id, Some(serde_json::json!("doc-1")));
        assert_eq!(parsed.file_id, Some(serde_json::json!(42)));
        assert_eq!(parsed.chunks, 7);
        assert_eq!(parsed.message.as_deref(), Some("stored"));
    }

    #[test]
    fn test_response_tolerates_missing_fields() {
        let parsed: IngestResponse = serde_json::from_str(r#"{"documentId": "doc-1"}"#).unwrap();
        assert_eq!(parsed.chunks, 0);
        assert!(parsed.file_id.is_none());
        assert!(parsed.message.is_none());
    }
}
