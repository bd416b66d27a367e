//! Output tree writes.

use anyhow::{Context, Result};
use std::{fs, io::ErrorKind, path::Path};

/// Side effects on the output tree.
pub trait OutputWriter: Send + Sync {
    /// Write `bytes` to `path`, creating parent directories.
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()>;

    /// Copy `src` to `dst`, creating parent directories.
    fn copy(&self, src: &Path, dst: &Path) -> Result<()>;

    /// Remove `path`. Removing something that is already gone succeeds.
    fn remove(&self, path: &Path) -> Result<()>;

    /// Empty `dir`, creating it if missing.
    fn clear(&self, dir: &Path) -> Result<()>;
}

/// [`OutputWriter`] over the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsWriter;

impl FsWriter {
    fn ensure_parent(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        Ok(())
    }
}

impl OutputWriter for FsWriter {
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        Self::ensure_parent(path)?;
        fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
    }

    fn copy(&self, src: &Path, dst: &Path) -> Result<()> {
        Self::ensure_parent(dst)?;
        fs::copy(src, dst)
            .with_context(|| format!("Failed to copy {} to {}", src.display(), dst.display()))?;
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<()> {
        let result = match fs::symlink_metadata(path) {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
            Ok(_) => fs::remove_file(path),
            Err(e) => Err(e),
        };

        match result {
            Err(e) if e.kind() != ErrorKind::NotFound => {
                Err(e).with_context(|| format!("Failed to remove {}", path.display()))
            }
            _ => Ok(()),
        }
    }

    fn clear(&self, dir: &Path) -> Result<()> {
        if !dir.exists() {
            return fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()));
        }

        for entry in fs::read_dir(dir)
            .with_context(|| format!("Failed to clear output directory: {}", dir.display()))?
        {
            self.remove(&entry?.path())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_parents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a/b/c.html");

        FsWriter.write(&path, b"<p>x</p>").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"<p>x</p>");
    }

    #[test]
    fn test_copy_creates_parents() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("logo.png");
        fs::write(&src, [0u8, 159, 146, 150]).unwrap();

        let dst = tmp.path().join("out/img/logo.png");
        FsWriter.copy(&src, &dst).unwrap();
        assert_eq!(fs::read(&dst).unwrap(), [0u8, 159, 146, 150]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.html");
        fs::write(&path, "x").unwrap();

        FsWriter.remove(&path).unwrap();
        assert!(!path.exists());
        FsWriter.remove(&path).unwrap();
    }

    #[test]
    fn test_clear_empties_existing_dir() {
        let tmp = TempDir::new().unwrap();
        let dist = tmp.path().join("public");
        FsWriter.write(&dist.join("posts/a.html"), b"x").unwrap();
        FsWriter.write(&dist.join("index.html"), b"x").unwrap();

        FsWriter.clear(&dist).unwrap();
        assert!(dist.is_dir());
        assert_eq!(fs::read_dir(&dist).unwrap().count(), 0);
    }

    #[test]
    fn test_clear_creates_missing_dir() {
        let tmp = TempDir::new().unwrap();
        let dist = tmp.path().join("public");

        FsWriter.clear(&dist).unwrap();
        assert!(dist.is_dir());
    }
}
