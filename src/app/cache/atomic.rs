//! Atomic file replacement
//!
//! Writers never leave a half-written file at the final path: content goes to
//! a sibling temp file first and is renamed into place.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::constants::files;

/// Temp path used while `path` is being written
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(files::TEMP_FILE_SUFFIX);
    path.with_file_name(name)
}

/// Write `content` to `path` via temp file + rename
pub async fn write_atomic(path: &Path, content: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let temp_path = temp_path_for(path);
    fs::write(&temp_path, content).await?;

    if let Err(e) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_temp_path_keeps_directory() {
        let temp = temp_path_for(Path::new("/a/b/request_log.csv"));
        assert_eq!(temp, PathBuf::from("/a/b/request_log.csv.tmp"));
    }

    #[tokio::test]
    async fn test_write_atomic_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("file.html");

        write_atomic(&path, b"first").await.unwrap();
        write_atomic(&path, b"second").await.unwrap();

        assert_eq!(fs::read(&path).await.unwrap(), b"second");
        assert!(!temp_path_for(&path).exists());
    }
}
