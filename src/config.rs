// src/config.rs
// Server configuration - resolved once at startup, immutable afterwards

use crate::sandbox::SandboxPolicy;
use std::path::PathBuf;
use tracing::info;

/// Maximum file size to read, in bytes (10 MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Common text document extensions served by default.
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &[
    ".txt", ".md", ".py", ".js", ".ts", ".json", ".yaml", ".yml", ".xml", ".csv", ".pdf",
    ".docx", ".doc", ".html", ".htm",
];

/// Default Onyx server URL for document ingestion.
pub const DEFAULT_ONYX_SERVER_URL: &str = "http://localhost:3000";

/// Resolved server configuration.
///
/// Built from CLI flags (with env fallbacks) in `main`, then handed to the
/// components as an immutable value. Nothing mutates it after startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub allowed_directories: Vec<PathBuf>,
    pub max_file_size: u64,
    pub allowed_extensions: Vec<String>,
    pub onyx_server_url: String,
    pub onyx_api_key: Option<String>,
}

impl ServerConfig {
    /// Resolve raw flag values into a usable configuration.
    ///
    /// Empty list values fall back to defaults: no allowed directories
    /// means the current working directory, no extensions means the common
    /// text formats. Blank API keys are treated as absent.
    pub fn resolve(
        allowed_dirs: &str,
        max_file_size: u64,
        allowed_extensions: &str,
        onyx_server_url: String,
        onyx_api_key: Option<String>,
    ) -> Self {
        let mut allowed_directories = parse_directory_list(allowed_dirs);
        if allowed_directories.is_empty() {
            allowed_directories =
                vec![std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))];
        }

        let mut allowed_extensions = parse_extension_list(allowed_extensions);
        if allowed_extensions.is_empty() {
            allowed_extensions = DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect();
        }

        Self {
            allowed_directories,
            max_file_size,
            allowed_extensions,
            onyx_server_url,
            onyx_api_key: onyx_api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    /// Build the sandbox policy the components share.
    pub fn sandbox_policy(&self) -> SandboxPolicy {
        SandboxPolicy::new(
            self.allowed_directories.clone(),
            self.allowed_extensions.clone(),
            self.max_file_size,
        )
    }

    /// Non-fatal configuration problems worth telling the operator about.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        for dir in &self.allowed_directories {
            if !dir.is_dir() {
                warnings.push(format!(
                    "allowed directory '{}' does not exist or is not a directory",
                    dir.display()
                ));
            }
        }
        if self.max_file_size == 0 {
            warnings.push("max file size is 0; every read will be rejected".to_string());
        }
        if self.onyx_api_key.is_none() {
            warnings.push(
                "no ONYX_API_KEY configured; ingestion requests will be unauthenticated"
                    .to_string(),
            );
        }

        warnings
    }

    /// Log the effective configuration (API key masked).
    pub fn log_summary(&self) {
        let dirs: Vec<String> = self
            .allowed_directories
            .iter()
            .map(|d| d.display().to_string())
            .collect();
        info!("Allowed directories: {}", dirs.join(", "));
        info!("Max file size: {} bytes", self.max_file_size);
        info!("Allowed extensions: {}", self.allowed_extensions.join(","));
        info!("Onyx server URL: {}", self.onyx_server_url);
        info!(
            "Onyx API key: {}",
            if self.onyx_api_key.is_some() { "***" } else { "None" }
        );
    }
}

/// Split a comma-separated directory list, dropping blanks.
pub fn parse_directory_list(raw: &str) -> Vec<PathBuf> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Split a comma-separated extension list, normalizing each entry.
pub fn parse_extension_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(normalize_extension)
        .collect()
}

/// Normalize an extension to lower-case with a leading dot.
fn normalize_extension(raw: &str) -> String {
    let lower = raw.to_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{lower}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_directory_list() {
        let dirs = parse_directory_list(" /data , /home/user ,, ");
        assert_eq!(dirs, vec![PathBuf::from("/data"), PathBuf::from("/home/user")]);
    }

    #[test]
    fn test_parse_directory_list_empty() {
        assert!(parse_directory_list("").is_empty());
        assert!(parse_directory_list(" , ,").is_empty());
    }

    #[test]
    fn test_parse_extension_list_normalizes() {
        let exts = parse_extension_list(".TXT, md , .Json");
        assert_eq!(exts, vec![".txt", ".md", ".json"]);
    }

    #[test]
    fn test_resolve_falls_back_to_defaults() {
        let config = ServerConfig::resolve("", 1024, "", DEFAULT_ONYX_SERVER_URL.into(), None);
        assert!(!config.allowed_directories.is_empty());
        assert_eq!(
            config.allowed_extensions.len(),
            DEFAULT_ALLOWED_EXTENSIONS.len()
        );
        assert!(config.onyx_api_key.is_none());
    }

    #[test]
    fn test_resolve_blank_api_key_dropped() {
        let config = ServerConfig::resolve(
            "/data",
            1024,
            ".txt",
            DEFAULT_ONYX_SERVER_URL.into(),
            Some("   ".to_string()),
        );
        assert!(config.onyx_api_key.is_none());
    }

    #[test]
    fn test_validate_flags_missing_directories() {
        let config = ServerConfig::resolve(
            "/definitely/not/a/real/dir",
            1024,
            ".txt",
            DEFAULT_ONYX_SERVER_URL.into(),
            Some("key".to_string()),
        );
        let warnings = config.validate();
        assert!(warnings.iter().any(|w| w.contains("does not exist")));
    }

    #[test]
    fn test_validate_zero_max_size() {
        let config =
            ServerConfig::resolve("", 0, "", DEFAULT_ONYX_SERVER_URL.into(), Some("key".into()));
        let warnings = config.validate();
        assert!(warnings.iter().any(|w| w.contains("max file size is 0")));
    }

    #[test]
    fn test_sandbox_policy_carries_settings() {
        let config = ServerConfig::resolve(
            "/data",
            4096,
            ".txt,.md",
            DEFAULT_ONYX_SERVER_URL.into(),
            None,
        );
        let policy = config.sandbox_policy();
        assert_eq!(policy.max_file_size(), 4096);
        assert_eq!(policy.allowed_directories(), &[PathBuf::from("/data")]);
    }
}
