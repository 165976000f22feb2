// src/sandbox.rs
// Sandbox policy: the security boundary every operation consults

use std::path::{Path, PathBuf};

/// Immutable sandbox policy shared read-only by every component.
///
/// Built once at startup from configuration and passed around as
/// `Arc<SandboxPolicy>`. Path decisions are never cached: the filesystem
/// can change between check and use, so every operation re-evaluates.
#[derive(Debug, Clone)]
pub struct SandboxPolicy {
    allowed_directories: Vec<PathBuf>,
    allowed_extensions: Vec<String>,
    max_file_size: u64,
}

impl SandboxPolicy {
    /// Create a policy. Extensions are expected lower-cased with a leading
    /// dot (see `config::parse_extension_list`); an empty extension list
    /// disables extension filtering entirely.
    pub fn new(
        allowed_directories: Vec<PathBuf>,
        allowed_extensions: Vec<String>,
        max_file_size: u64,
    ) -> Self {
        Self {
            allowed_directories,
            allowed_extensions,
            max_file_size,
        }
    }

    pub fn allowed_directories(&self) -> &[PathBuf] {
        &self.allowed_directories
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Check whether `path` lies inside one of the allowed directories.
    ///
    /// Both the candidate and each allowed root are canonicalized, so
    /// `..` segments and symlinks cannot escape the sandbox. A candidate
    /// that cannot be canonicalized (missing file, dangling link) is
    /// denied outright; an allowed root that cannot be canonicalized is
    /// skipped. The comparison is component-wise, never a string prefix.
    pub fn is_path_allowed(&self, path: &Path) -> bool {
        let Ok(candidate) = std::fs::canonicalize(path) else {
            return false;
        };
        self.allowed_directories.iter().any(|root| {
            std::fs::canonicalize(root)
                .map(|root| candidate.starts_with(&root))
                .unwrap_or(false)
        })
    }

    /// Check whether the file extension of `path` is permitted.
    ///
    /// An empty allow-list means the filter is disabled. With a non-empty
    /// list, files without any extension are always rejected.
    pub fn is_extension_allowed(&self, path: &Path) -> bool {
        if self.allowed_extensions.is_empty() {
            return true;
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => {
                let ext = format!(".{}", ext.to_lowercase());
                self.allowed_extensions.iter().any(|allowed| *allowed == ext)
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn policy_for(root: &Path) -> SandboxPolicy {
        SandboxPolicy::new(
            vec![root.to_path_buf()],
            vec![".txt".to_string(), ".md".to_string()],
            1024,
        )
    }

    #[test]
    fn test_path_inside_sandbox_allowed() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("notes.txt");
        fs::write(&file, "hello").unwrap();

        let policy = policy_for(tmp.path());
        assert!(policy.is_path_allowed(&file));
    }

    #[test]
    fn test_sandbox_root_itself_allowed() {
        let tmp = TempDir::new().unwrap();
        let policy = policy_for(tmp.path());
        assert!(policy.is_path_allowed(tmp.path()));
    }

    #[test]
    fn test_path_outside_sandbox_denied() {
        let tmp = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        let file = other.path().join("secret.txt");
        fs::write(&file, "secret").unwrap();

        let policy = policy_for(tmp.path());
        assert!(!policy.is_path_allowed(&file));
    }

    #[test]
    fn test_dot_dot_traversal_denied() {
        let tmp = TempDir::new().unwrap();
        let sub = tmp.path().join("inner");
        fs::create_dir(&sub).unwrap();
        let outside = tmp.path().join("escape.txt");
        fs::write(&outside, "x").unwrap();

        // Only the subdirectory is allowed; reaching up with `..` must fail.
        let policy = policy_for(&sub);
        let sneaky = sub.join("..").join("escape.txt");
        assert!(!policy.is_path_allowed(&sneaky));
    }

    #[test]
    fn test_nonexistent_path_fails_closed() {
        let tmp = TempDir::new().unwrap();
        let policy = policy_for(tmp.path());
        assert!(!policy.is_path_allowed(&tmp.path().join("no/such/file.txt")));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_denied() {
        let tmp = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        let target = other.path().join("outside.txt");
        fs::write(&target, "outside").unwrap();

        let link = tmp.path().join("inside.txt");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        // The link lives inside the sandbox but resolves outside of it.
        let policy = policy_for(tmp.path());
        assert!(!policy.is_path_allowed(&link));
    }

    #[test]
    fn test_extension_allowed_case_insensitive() {
        let policy = policy_for(Path::new("/data"));
        assert!(policy.is_extension_allowed(Path::new("/data/a.txt")));
        assert!(policy.is_extension_allowed(Path::new("/data/a.TXT")));
        assert!(policy.is_extension_allowed(Path::new("/data/a.Md")));
        assert!(!policy.is_extension_allowed(Path::new("/data/a.exe")));
    }

    #[test]
    fn test_no_extension_denied_when_list_nonempty() {
        let policy = policy_for(Path::new("/data"));
        assert!(!policy.is_extension_allowed(Path::new("/data/Makefile")));
    }

    #[test]
    fn test_empty_extension_list_allows_everything() {
        let policy = SandboxPolicy::new(vec![PathBuf::from("/data")], vec![], 1024);
        assert!(policy.is_extension_allowed(Path::new("/data/a.exe")));
        assert!(policy.is_extension_allowed(Path::new("/data/Makefile")));
    }
}
