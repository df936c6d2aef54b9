//! Cache path utilities - uses ~/.cache/interactome/responses/<fingerprint>.bin

use std::path::{Path, PathBuf};

/// Default location for cached upstream responses.
/// Uses ~/.cache/interactome/responses on Unix, %LOCALAPPDATA%/interactome/responses on Windows.
pub fn default_cache_dir() -> PathBuf {
    let base = if cfg!(windows) {
        std::env::var("LOCALAPPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|_| dirs::cache_dir().unwrap_or_else(|| PathBuf::from(".")))
    } else {
        dirs::cache_dir().unwrap_or_else(|| {
            // Fallback to ~/.cache
            dirs::home_dir()
                .map(|h| h.join(".cache"))
                .unwrap_or_else(|| PathBuf::from("."))
        })
    };

    base.join("interactome").join("responses")
}

/// Path of the blob holding the payload for `fingerprint`.
pub fn entry_path(cache_dir: &Path, fingerprint: &str) -> PathBuf {
    cache_dir.join(format!("{}.bin", fingerprint))
}

/// Ensure the cache directory exists.
pub fn ensure_cache_dir(cache_dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(cache_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dir_format() {
        let dir = default_cache_dir();
        assert!(dir.ends_with("interactome/responses"));
    }

    #[test]
    fn test_entry_path() {
        let p = entry_path(Path::new("/tmp/c"), "abc123");
        assert_eq!(p, PathBuf::from("/tmp/c/abc123.bin"));
    }
}
