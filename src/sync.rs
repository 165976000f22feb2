// src/sync.rs
// Bounded-concurrency directory sync into the Onyx ingestion API

use crate::error::{LocalDirError, Result};
use crate::ingest::{IngestReceipt, IngestionClient};
use crate::sandbox::SandboxPolicy;
use crate::utils::path_to_string;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use walkdir::WalkDir;

/// Fan-out width: at most this many ingestion calls in flight at once.
/// Bounds both the load on the Onyx endpoint and local memory (each
/// in-flight call holds one file's bytes).
pub const MAX_CONCURRENT_INGESTS: usize = 5;

/// Per-file failure record.
#[derive(Debug, Clone, Serialize)]
pub struct SyncFailure {
    pub file_path: String,
    pub error: String,
}

/// Aggregate outcome of one sync run. Finalized only after every
/// dispatched file has resolved; never partial.
#[derive(Debug, Clone, Serialize)]
pub struct SyncSummary {
    pub successful: Vec<IngestReceipt>,
    pub failed: Vec<SyncFailure>,
    pub total_files: usize,
    pub successful_count: usize,
    pub failed_count: usize,
}

/// Enumerates candidate files under a directory and drives a bounded
/// fan-out of ingestion calls, aggregating per-file outcomes. One failed
/// file never aborts the batch.
#[derive(Clone)]
pub struct SyncOrchestrator {
    policy: Arc<SandboxPolicy>,
    ingestion: IngestionClient,
}

impl SyncOrchestrator {
    pub fn new(policy: Arc<SandboxPolicy>, ingestion: IngestionClient) -> Self {
        Self { policy, ingestion }
    }

    /// Sync every allowed file under `dir` to Onyx.
    ///
    /// Candidates must independently pass both the path and the extension
    /// check; nesting under the (already checked) root is not an
    /// exemption. All dispatched ingestions are awaited before the
    /// summary is returned, regardless of completion order.
    pub async fn sync_directory(
        &self,
        dir: &Path,
        document_set: Option<&str>,
        recursive: bool,
    ) -> Result<SyncSummary> {
        if !self.policy.is_path_allowed(dir) {
            return Err(LocalDirError::AccessDenied(dir.to_path_buf()));
        }
        let meta = tokio::fs::metadata(dir)
            .await
            .map_err(|e| LocalDirError::from_io(dir, e))?;
        if !meta.is_dir() {
            return Err(LocalDirError::NotFound(dir.to_path_buf()));
        }

        let candidates = self.collect_candidates(dir, recursive).await?;
        let total_files = candidates.len();
        info!(
            "syncing {} files from {} (recursive: {})",
            total_files,
            dir.display(),
            recursive
        );

        let outcomes: Vec<(PathBuf, Result<IngestReceipt>)> = stream::iter(candidates)
            .map(|path| {
                let client = self.ingestion.clone();
                let document_set = document_set.map(str::to_string);
                async move {
                    let outcome = client.ingest(&path, document_set.as_deref()).await;
                    (path, outcome)
                }
            })
            .buffer_unordered(MAX_CONCURRENT_INGESTS)
            .collect()
            .await;

        let mut successful = Vec::new();
        let mut failed = Vec::new();
        for (path, outcome) in outcomes {
            match outcome {
                Ok(receipt) => {
                    info!("synced {}", receipt.file_path);
                    successful.push(receipt);
                }
                Err(e) => {
                    warn!("failed to sync {}: {}", path.display(), e);
                    failed.push(SyncFailure {
                        file_path: path_to_string(&path),
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(SyncSummary {
            total_files,
            successful_count: successful.len(),
            failed_count: failed.len(),
            successful,
            failed,
        })
    }

    /// Enumerate files eligible for sync: a recursive walk or a
    /// single-level listing, each candidate passing both policy checks.
    async fn collect_candidates(&self, dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
        let mut candidates = Vec::new();

        if recursive {
            for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = entry.path();
                if self.policy.is_path_allowed(path) && self.policy.is_extension_allowed(path) {
                    candidates.push(path.to_path_buf());
                }
            }
        } else {
            let mut entries = tokio::fs::read_dir(dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
                if is_file
                    && self.policy.is_path_allowed(&path)
                    && self.policy.is_extension_allowed(&path)
                {
                    candidates.push(path);
                }
            }
        }

        Ok(candidates)
    }
}
