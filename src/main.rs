// src/main.rs
// Onyx local directory server - sandboxed file access over MCP

use anyhow::Result;
use clap::{Parser, ValueEnum};
use localdir::config::{self, ServerConfig};
use localdir::mcp::{self, LocalDirServer};
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "onyx-localdir")]
#[command(about = "Sandboxed local directory access for Onyx over MCP")]
#[command(version)]
struct Cli {
    /// Transport for the MCP server
    #[arg(long, value_enum, default_value_t = Transport::Stdio)]
    transport: Transport,

    /// Comma-separated list of allowed directories (default: current directory)
    #[arg(long, env = "ALLOWED_DIRECTORIES", default_value = "")]
    allowed_dirs: String,

    /// Maximum file size to read, in bytes
    #[arg(long, env = "MAX_FILE_SIZE", default_value_t = config::DEFAULT_MAX_FILE_SIZE)]
    max_file_size: u64,

    /// Comma-separated list of allowed file extensions (default: common text formats)
    #[arg(long, env = "ALLOWED_EXTENSIONS", default_value = "")]
    allowed_extensions: String,

    /// Host interface for the HTTP transport
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port for the HTTP transport
    #[arg(long, default_value_t = 8001)]
    port: u16,

    /// HTTP path the MCP service is mounted on
    #[arg(long, default_value = "/mcp")]
    path: String,

    /// Onyx server URL for document ingestion
    #[arg(long, env = "ONYX_SERVER_URL", default_value = config::DEFAULT_ONYX_SERVER_URL)]
    onyx_server_url: String,

    /// API key for Onyx server authentication (optional)
    #[arg(long, env = "ONYX_API_KEY")]
    onyx_api_key: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    /// Stdio transport (for MCP clients spawning the server)
    Stdio,
    /// Streamable HTTP transport
    Http,
}

async fn run_stdio(server: LocalDirServer) -> Result<()> {
    let transport = rmcp::transport::io::stdio();
    let service = rmcp::serve_server(server, transport).await?;
    service.waiting().await?;
    Ok(())
}

async fn run_http(server: LocalDirServer, host: &str, port: u16, path: &str) -> Result<()> {
    let service = mcp::http::create_mcp_service(server);
    let app = axum::Router::new().nest_service(path, service);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("MCP server listening on http://{}{}", addr, path);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Quiet on stdio so stdout stays protocol-only and stderr stays calm
    let log_level = match cli.transport {
        Transport::Stdio => Level::WARN,
        Transport::Http => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = ServerConfig::resolve(
        &cli.allowed_dirs,
        cli.max_file_size,
        &cli.allowed_extensions,
        cli.onyx_server_url,
        cli.onyx_api_key,
    );
    for warning in config.validate() {
        warn!("{}", warning);
    }
    config.log_summary();

    let server = LocalDirServer::new(&config);
    match cli.transport {
        Transport::Stdio => run_stdio(server).await,
        Transport::Http => run_http(server, &cli.host, cli.port, &cli.path).await,
    }
}
