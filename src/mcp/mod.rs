// src/mcp/mod.rs
// MCP server implementation: tool registry and dispatch

pub mod http;

use crate::config::ServerConfig;
use crate::files::FileAccessor;
use crate::ingest::IngestionClient;
use crate::search::ContentSearcher;
use crate::sync::SyncOrchestrator;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// MCP server state: the sandboxed components plus the generated tool
/// router. Cheap to clone; the sandbox policy is shared behind an Arc.
#[derive(Clone)]
pub struct LocalDirServer {
    files: FileAccessor,
    searcher: ContentSearcher,
    ingestion: IngestionClient,
    sync: SyncOrchestrator,
    tool_router: ToolRouter<Self>,
}

impl LocalDirServer {
    pub fn new(config: &ServerConfig) -> Self {
        let policy = Arc::new(config.sandbox_policy());
        let files = FileAccessor::new(policy.clone());
        let ingestion = IngestionClient::new(
            files.clone(),
            crate::http::create_shared_client(),
            config.onyx_server_url.clone(),
            config.onyx_api_key.clone(),
        );

        Self {
            searcher: ContentSearcher::new(policy.clone()),
            sync: SyncOrchestrator::new(policy, ingestion.clone()),
            files,
            ingestion,
            tool_router: Self::tool_router(),
        }
    }
}

/// Render an operation outcome as a tool result: pretty JSON on success,
/// the error display string on failure.
fn to_tool_result<T: Serialize>(result: crate::Result<T>) -> CallToolResult {
    match result {
        Ok(value) => CallToolResult::success(vec![Content::text(
            serde_json::to_string_pretty(&value).unwrap_or_default(),
        )]),
        Err(e) => CallToolResult::error(vec![Content::text(e.to_string())]),
    }
}

// Request types for tools with parameters

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ReadFileRequest {
    #[schemars(description = "Path of the file to read")]
    pub path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListDirectoryRequest {
    #[schemars(description = "Path of the directory to list")]
    pub dir_path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchFilesRequest {
    #[schemars(description = "Case-insensitive regex matched against file contents")]
    pub query: String,
    #[schemars(description = "Directory to search (recursive)")]
    pub directory: String,
    #[schemars(description = "File name pattern; '*' matches any run of characters")]
    pub file_pattern: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DownloadFileRequest {
    #[schemars(description = "Path of the file to download")]
    pub file_path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct FileMetadataRequest {
    #[schemars(description = "Path of the file to inspect")]
    pub file_path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct IngestFileRequest {
    #[schemars(description = "Path of the file to ingest")]
    pub file_path: String,
    #[schemars(description = "Optional document set label")]
    pub document_set: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SyncDirectoryRequest {
    #[schemars(description = "Path of the directory to sync")]
    pub dir_path: String,
    #[schemars(description = "Optional document set label")]
    pub document_set: Option<String>,
    #[schemars(description = "Recurse into subdirectories (default: true)")]
    pub recursive: Option<bool>,
}

#[tool_router]
impl LocalDirServer {
    #[tool(description = "Read the contents of a local file. The file must be within allowed \
        directories and have an allowed file extension. Returns file content along with metadata.")]
    async fn read_file(
        &self,
        Parameters(req): Parameters<ReadFileRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(to_tool_result(
            self.files.read_text(Path::new(&req.path)).await,
        ))
    }

    #[tool(description = "List the contents of a local directory. Shows files and \
        subdirectories with their metadata (size, modification time).")]
    async fn list_directory(
        &self,
        Parameters(req): Parameters<ListDirectoryRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(to_tool_result(
            self.files.list_directory(Path::new(&req.dir_path)).await,
        ))
    }

    #[tool(description = "Search for text content within files in a directory. Supports regex \
        queries and '*' file name patterns. Returns matching files with line numbers and content.")]
    async fn search_files(
        &self,
        Parameters(req): Parameters<SearchFilesRequest>,
    ) -> Result<CallToolResult, McpError> {
        let pattern = req.file_pattern.as_deref().unwrap_or("*");
        Ok(to_tool_result(
            self.searcher
                .search(&req.query, Path::new(&req.directory), pattern)
                .await,
        ))
    }

    #[tool(description = "Download a local file and return its content as base64 encoded data. \
        Useful for transferring files to the Onyx server for ingestion.")]
    async fn download_file(
        &self,
        Parameters(req): Parameters<DownloadFileRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(to_tool_result(
            self.files.download(Path::new(&req.file_path)).await,
        ))
    }

    #[tool(description = "Get detailed metadata for a file including size, type, checksum, \
        permissions, and timestamps.")]
    async fn get_file_metadata(
        &self,
        Parameters(req): Parameters<FileMetadataRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(to_tool_result(
            self.files.metadata(Path::new(&req.file_path)).await,
        ))
    }

    #[tool(description = "Ingest a local file into the Onyx server for RAG. Reads the file and \
        stores it in Onyx's document database for search and retrieval.")]
    async fn ingest_file_to_onyx(
        &self,
        Parameters(req): Parameters<IngestFileRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(to_tool_result(
            self.ingestion
                .ingest(Path::new(&req.file_path), req.document_set.as_deref())
                .await,
        ))
    }

    #[tool(description = "Sync all files in a directory to the Onyx server. Processes the \
        directory (optionally recursively) and ingests every allowed file into Onyx for RAG.")]
    async fn sync_directory_to_onyx(
        &self,
        Parameters(req): Parameters<SyncDirectoryRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(to_tool_result(
            self.sync
                .sync_directory(
                    Path::new(&req.dir_path),
                    req.document_set.as_deref(),
                    req.recursive.unwrap_or(true),
                )
                .await,
        ))
    }
}

#[tool_handler]
impl ServerHandler for LocalDirServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: rmcp::model::Implementation {
                name: "onyx-localdir".into(),
                title: Some("Onyx Local Directory Server".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Sandboxed access to local files: read, list, search and download files from \
                 allowed directories, and ingest them into Onyx for retrieval."
                    .into(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_ONYX_SERVER_URL;
    use std::fs;
    use tempfile::TempDir;

    fn server_for(root: &Path) -> LocalDirServer {
        let config = ServerConfig::resolve(
            &root.display().to_string(),
            1024,
            ".txt",
            DEFAULT_ONYX_SERVER_URL.into(),
            None,
        );
        LocalDirServer::new(&config)
    }

    #[tokio::test]
    async fn test_read_file_tool_returns_json_record() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.txt"), "hello").unwrap();

        let server = server_for(tmp.path());
        let result = server
            .read_file(Parameters(ReadFileRequest {
                path: tmp.path().join("a.txt").display().to_string(),
            }))
            .await
            .unwrap();

        assert_ne!(result.is_error, Some(true));
        let text = result.content.first().and_then(|c| c.as_text()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text.text).unwrap();
        assert_eq!(value["content"], "hello");
        assert_eq!(value["file_size"], 5);
    }

    #[tokio::test]
    async fn test_download_tool_rejects_disallowed_extension() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("tool.exe"), "MZ").unwrap();

        let server = server_for(tmp.path());
        let result = server
            .download_file(Parameters(DownloadFileRequest {
                file_path: tmp.path().join("tool.exe").display().to_string(),
            }))
            .await
            .unwrap();

        assert_eq!(result.is_error, Some(true));
        let text = result.content.first().and_then(|c| c.as_text()).unwrap();
        assert!(text.text.contains("file type not allowed"));
    }

    #[tokio::test]
    async fn test_search_tool_defaults_pattern_to_star() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.txt"), "needle").unwrap();

        let server = server_for(tmp.path());
        let result = server
            .search_files(Parameters(SearchFilesRequest {
                query: "needle".into(),
                directory: tmp.path().display().to_string(),
                file_pattern: None,
            }))
            .await
            .unwrap();

        let text = result.content.first().and_then(|c| c.as_text()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text.text).unwrap();
        assert_eq!(value["file_pattern"], "*");
        assert_eq!(value["total_matches"], 1);
    }
}
