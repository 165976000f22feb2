// src/files.rs
// Sandboxed file primitives: read, download, metadata, directory listing

use crate::error::{LocalDirError, Result};
use crate::sandbox::SandboxPolicy;
use crate::utils::{epoch_seconds, file_name, path_to_string};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::Serialize;
use std::fs::Metadata;
use std::path::Path;
use std::sync::Arc;

/// Result of a plain-text read. No checksum: text reads are the cheap path.
#[derive(Debug, Clone, Serialize)]
pub struct FileContent {
    pub content: String,
    pub file_path: String,
    pub file_size: u64,
    pub mime_type: String,
    pub modified_time: f64,
    pub is_readable: bool,
}

/// Result of a binary download, content base64-encoded for transport.
#[derive(Debug, Clone, Serialize)]
pub struct FileDownload {
    pub content: String,
    pub file_path: String,
    pub file_name: String,
    pub file_size: u64,
    pub mime_type: String,
    pub modified_time: f64,
    pub checksum: String,
}

/// Detailed file metadata.
///
/// The checksum here is computed by reading the whole file, so metadata
/// retrieval costs as much as a download. Kept that way on purpose; the
/// obvious future change is computing the checksum only on demand.
#[derive(Debug, Clone, Serialize)]
pub struct FileMetadata {
    pub file_path: String,
    pub file_name: String,
    pub file_size: u64,
    pub mime_type: String,
    pub encoding: Option<String>,
    pub modified_time: f64,
    pub created_time: Option<f64>,
    pub checksum: String,
    pub is_readable: bool,
    pub is_writable: bool,
    pub extension: String,
}

/// One entry of a directory listing. `size` is null for directories.
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryEntry {
    pub name: String,
    pub path: String,
    pub is_file: bool,
    pub is_directory: bool,
    pub size: Option<u64>,
    pub modified_time: f64,
}

/// A single-level directory listing, directories first then files,
/// each group sorted by name.
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryListing {
    pub directory_path: String,
    pub items: Vec<DirectoryEntry>,
    pub total_items: usize,
}

/// Raw bytes of a policy-checked binary read; internal currency between
/// the accessor and the ingestion client, never serialized as-is.
#[derive(Debug, Clone)]
pub struct BinaryFile {
    pub file_path: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub file_size: u64,
    pub mime_type: String,
    pub modified_time: f64,
    pub checksum: String,
}

/// Sandboxed filesystem accessor. Every operation consults the policy
/// before touching a path; nothing here caches between calls.
#[derive(Clone)]
pub struct FileAccessor {
    policy: Arc<SandboxPolicy>,
}

impl FileAccessor {
    pub fn new(policy: Arc<SandboxPolicy>) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &Arc<SandboxPolicy> {
        &self.policy
    }

    /// Read a file as text. Bytes that are not valid UTF-8 are replaced
    /// rather than failing the read.
    pub async fn read_text(&self, path: &Path) -> Result<FileContent> {
        let meta = self.checked_file_meta(path, true).await?;
        self.check_size(&meta)?;

        let bytes = read_checked(path).await?;
        Ok(FileContent {
            content: String::from_utf8_lossy(&bytes).into_owned(),
            file_path: path_to_string(path),
            file_size: meta.len(),
            mime_type: guess_mime(path),
            modified_time: modified_seconds(&meta),
            is_readable: true,
        })
    }

    /// Read a file as raw bytes, with an MD5 checksum over exactly the
    /// bytes read. Used by download and ingestion.
    pub async fn read_binary(&self, path: &Path) -> Result<BinaryFile> {
        let meta = self.checked_file_meta(path, true).await?;
        self.check_size(&meta)?;

        let bytes = read_checked(path).await?;
        let checksum = md5_hex(&bytes);
        Ok(BinaryFile {
            file_path: path_to_string(path),
            file_name: file_name(path),
            file_size: meta.len(),
            mime_type: guess_mime(path),
            modified_time: modified_seconds(&meta),
            checksum,
            bytes,
        })
    }

    /// Read a file and package it as a base64 download record.
    pub async fn download(&self, path: &Path) -> Result<FileDownload> {
        let file = self.read_binary(path).await?;
        Ok(FileDownload {
            content: BASE64.encode(&file.bytes),
            file_path: file.file_path,
            file_name: file.file_name,
            file_size: file.file_size,
            mime_type: file.mime_type,
            modified_time: file.modified_time,
            checksum: file.checksum,
        })
    }

    /// Detailed metadata for a file. No extension filter here: metadata
    /// about a disallowed type is still metadata. Size is reported, not
    /// enforced.
    pub async fn metadata(&self, path: &Path) -> Result<FileMetadata> {
        let meta = self.checked_file_meta(path, false).await?;

        // Full read for the checksum; see the FileMetadata doc comment.
        let bytes = read_checked(path).await?;
        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default();

        Ok(FileMetadata {
            file_path: path_to_string(path),
            file_name: file_name(path),
            file_size: meta.len(),
            mime_type: guess_mime(path),
            encoding: content_encoding(path),
            modified_time: modified_seconds(&meta),
            created_time: meta.created().ok().map(epoch_seconds),
            checksum: md5_hex(&bytes),
            is_readable: true,
            is_writable: !meta.permissions().readonly(),
            extension,
        })
    }

    /// List the immediate children of a directory. Entries whose metadata
    /// cannot be read are skipped rather than failing the whole listing.
    pub async fn list_directory(&self, path: &Path) -> Result<DirectoryListing> {
        if !self.policy.is_path_allowed(path) {
            return Err(LocalDirError::AccessDenied(path.to_path_buf()));
        }
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|e| LocalDirError::from_io(path, e))?;
        if !meta.is_dir() {
            return Err(LocalDirError::NotFound(path.to_path_buf()));
        }

        let mut entries = tokio::fs::read_dir(path)
            .await
            .map_err(|e| LocalDirError::from_io(path, e))?;

        let mut items = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| LocalDirError::from_io(path, e))?
        {
            let Ok(entry_meta) = entry.metadata().await else {
                continue;
            };
            let is_file = entry_meta.is_file();
            items.push(DirectoryEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                path: path_to_string(&entry.path()),
                is_file,
                is_directory: entry_meta.is_dir(),
                size: is_file.then(|| entry_meta.len()),
                modified_time: modified_seconds(&entry_meta),
            });
        }

        // Ordering is part of the contract: directories first, then files,
        // each group name-ascending.
        items.sort_by(|a, b| {
            b.is_directory
                .cmp(&a.is_directory)
                .then_with(|| a.name.cmp(&b.name))
        });

        Ok(DirectoryListing {
            directory_path: path_to_string(path),
            total_items: items.len(),
            items,
        })
    }

    /// Policy + existence checks shared by the read paths. Returns the
    /// file metadata so callers stat only once.
    async fn checked_file_meta(&self, path: &Path, check_extension: bool) -> Result<Metadata> {
        if !self.policy.is_path_allowed(path) {
            return Err(LocalDirError::AccessDenied(path.to_path_buf()));
        }
        if check_extension && !self.policy.is_extension_allowed(path) {
            let ext = path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_default();
            return Err(LocalDirError::TypeNotAllowed(ext));
        }
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|e| LocalDirError::from_io(path, e))?;
        if !meta.is_file() {
            return Err(LocalDirError::NotFound(path.to_path_buf()));
        }
        Ok(meta)
    }

    /// Size precondition, checked before any content is loaded.
    fn check_size(&self, meta: &Metadata) -> Result<()> {
        let max = self.policy.max_file_size();
        if meta.len() > max {
            return Err(LocalDirError::TooLarge {
                size: meta.len(),
                max,
            });
        }
        Ok(())
    }
}

/// Read file contents, downgrading a check/use race on a vanished file to
/// NotFound instead of a generic I/O fault.
async fn read_checked(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| LocalDirError::from_io(path, e))
}

/// Best-effort mime type from the file name; "unknown" when unresolvable.
pub fn guess_mime(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .map(|m| m.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Content encoding inferred from a compression suffix, if any.
fn content_encoding(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    let encoding = match ext.as_str() {
        "gz" | "tgz" => "gzip",
        "bz2" => "bzip2",
        "xz" => "xz",
        "z" => "compress",
        _ => return None,
    };
    Some(encoding.to_string())
}

fn md5_hex(bytes: &[u8]) -> String {
    format!("{:x}", md5::compute(bytes))
}

fn modified_seconds(meta: &Metadata) -> f64 {
    meta.modified().map(epoch_seconds).unwrap_or(0.0)
}
