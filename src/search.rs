// src/search.rs
// Recursive content search over a sandboxed directory tree

use crate::error::{LocalDirError, Result};
use crate::sandbox::SandboxPolicy;
use crate::utils::{path_to_string, relative_to};
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use walkdir::WalkDir;

/// One matching line inside a file; content is trimmed of surrounding
/// whitespace, line numbers are 1-based.
#[derive(Debug, Clone, Serialize)]
pub struct MatchingLine {
    pub line_number: usize,
    pub content: String,
}

/// Per-file match report. `total_matches` counts matching lines.
#[derive(Debug, Clone, Serialize)]
pub struct SearchMatch {
    pub file_path: String,
    pub relative_path: String,
    pub file_size: u64,
    pub matching_lines: Vec<MatchingLine>,
    pub total_matches: usize,
}

/// Aggregate search report. `total_matches` counts matching files;
/// `total_files_searched` counts files actually scanned after filtering.
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub query: String,
    pub directory: String,
    pub file_pattern: String,
    pub matches: Vec<SearchMatch>,
    pub total_matches: usize,
    pub total_files_searched: usize,
}

/// Walks a directory subtree and matches a case-insensitive regex against
/// file contents, producing line-level match reports. Every file is
/// re-checked against the sandbox policy: being nested under an allowed
/// root is not an exemption from extension filtering.
#[derive(Clone)]
pub struct ContentSearcher {
    policy: Arc<SandboxPolicy>,
}

impl ContentSearcher {
    pub fn new(policy: Arc<SandboxPolicy>) -> Self {
        Self { policy }
    }

    /// Search `directory` recursively for content matching `query`.
    ///
    /// `file_pattern` filters by base file name with `*` as the only
    /// wildcard; all other characters match literally and the pattern is
    /// unanchored. Files that cannot be opened are skipped; one bad file
    /// never aborts the walk.
    pub async fn search(
        &self,
        query: &str,
        directory: &Path,
        file_pattern: &str,
    ) -> Result<SearchReport> {
        if !self.policy.is_path_allowed(directory) {
            return Err(LocalDirError::AccessDenied(directory.to_path_buf()));
        }
        let meta = tokio::fs::metadata(directory)
            .await
            .map_err(|e| LocalDirError::from_io(directory, e))?;
        if !meta.is_dir() {
            return Err(LocalDirError::NotFound(directory.to_path_buf()));
        }

        let query_re = RegexBuilder::new(query).case_insensitive(true).build()?;
        let name_re = file_pattern_regex(file_pattern)?;

        let mut matches = Vec::new();
        let mut total_files_searched = 0usize;

        for entry in WalkDir::new(directory).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();

            if !self.policy.is_path_allowed(path) || !self.policy.is_extension_allowed(path) {
                continue;
            }
            let base_name = entry.file_name().to_string_lossy();
            if !name_re.is_match(&base_name) {
                continue;
            }
            let Ok(entry_meta) = entry.metadata() else {
                continue;
            };
            let file_size = entry_meta.len();
            if file_size > self.policy.max_file_size() {
                continue;
            }

            total_files_searched += 1;

            let Ok(bytes) = tokio::fs::read(path).await else {
                debug!("skipping unreadable file {}", path.display());
                continue;
            };
            let content = String::from_utf8_lossy(&bytes);
            if !query_re.is_match(&content) {
                continue;
            }

            let matching_lines: Vec<MatchingLine> = content
                .lines()
                .enumerate()
                .filter(|(_, line)| query_re.is_match(line))
                .map(|(i, line)| MatchingLine {
                    line_number: i + 1,
                    content: line.trim().to_string(),
                })
                .collect();

            // Per-line evidence is authoritative: a whole-content match
            // that no single line can substantiate is not reported.
            if matching_lines.is_empty() {
                continue;
            }

            matches.push(SearchMatch {
                file_path: path_to_string(path),
                relative_path: path_to_string(relative_to(path, directory)),
                file_size,
                total_matches: matching_lines.len(),
                matching_lines,
            });
        }

        Ok(SearchReport {
            query: query.to_string(),
            directory: path_to_string(directory),
            file_pattern: file_pattern.to_string(),
            total_matches: matches.len(),
            matches,
            total_files_searched,
        })
    }
}

/// Translate a `*`-wildcard file-name pattern into an unanchored regex.
/// Everything except `*` is matched literally; this is deliberately not
/// full glob syntax.
fn file_pattern_regex(pattern: &str) -> Result<Regex> {
    let translated: String = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Ok(Regex::new(&translated)?)
}
