// src/utils.rs
// Shared utility functions used across the codebase

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Convert a Path to an owned String, replacing invalid UTF-8 with U+FFFD.
pub fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Base file name of a path as a String (empty for paths without one).
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Get a path relative to a base, falling back to the original path if not a prefix.
pub fn relative_to<'a>(path: &'a Path, base: &Path) -> &'a Path {
    path.strip_prefix(base).unwrap_or(path)
}

/// Fractional seconds since the Unix epoch (0.0 for pre-epoch timestamps).
pub fn epoch_seconds(time: SystemTime) -> f64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_path_to_string() {
        let path = PathBuf::from("/home/user/project");
        assert_eq!(path_to_string(&path), "/home/user/project");
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name(Path::new("/data/notes.txt")), "notes.txt");
        assert_eq!(file_name(Path::new("/")), "");
    }

    #[test]
    fn test_relative_to_with_prefix() {
        let path = PathBuf::from("/data/docs/readme.md");
        let base = PathBuf::from("/data");
        assert_eq!(relative_to(&path, &base), Path::new("docs/readme.md"));
    }

    #[test]
    fn test_relative_to_without_prefix() {
        let path = PathBuf::from("/other/file.md");
        let base = PathBuf::from("/data");
        assert_eq!(relative_to(&path, &base), Path::new("/other/file.md"));
    }

    #[test]
    fn test_epoch_seconds() {
        let t = UNIX_EPOCH + Duration::from_millis(1_500);
        assert!((epoch_seconds(t) - 1.5).abs() < 1e-9);
        assert_eq!(epoch_seconds(UNIX_EPOCH), 0.0);
    }
}
