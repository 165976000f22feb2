// src/mcp/http.rs
// MCP over HTTP (Streamable HTTP transport)

use std::sync::Arc;
use std::time::Duration;

use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
};

use super::LocalDirServer;

/// Create the MCP HTTP service.
///
/// Each HTTP session gets a clone of the server; the sandbox policy and
/// HTTP client inside it are shared.
pub fn create_mcp_service(
    server: LocalDirServer,
) -> StreamableHttpService<LocalDirServer, LocalSessionManager> {
    let service_factory = move || Ok(server.clone());

    let session_manager = Arc::new(LocalSessionManager::default());

    let config = StreamableHttpServerConfig {
        sse_keep_alive: Some(Duration::from_secs(15)),
        stateful_mode: true,
        ..Default::default()
    };

    StreamableHttpService::new(service_factory, session_manager, config)
}
