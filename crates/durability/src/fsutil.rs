//! Small filesystem helpers shared by the store and the reload engine

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Write `data` to `path` through a sibling temp file and a rename.
///
/// Lock-free readers see either the old or the new content, never a torn write.
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let temp_path = {
        let mut name = OsString::from(path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    };

    let result = (|| {
        let mut file = File::create(&temp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
        fs::rename(&temp_path, path)
    })();
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

/// Recursively copy `src` into `dst`, overwriting files that already exist.
///
/// Returns the number of files copied.
pub fn copy_tree(src: &Path, dst: &Path) -> io::Result<u64> {
    let mut copied = 0;
    fs::create_dir_all(dst)?;
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Total size in bytes of every regular file under `root`.
///
/// Best effort: entries that vanish or cannot be read while walking are skipped.
pub fn tree_size(root: &Path) -> u64 {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|metadata| metadata.len())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_atomic_creates_parents_and_replaces() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a/b/c.json");
        write_atomic(&path, b"one").unwrap();
        write_atomic(&path, b"two").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"two");
        assert!(!dir.path().join("a/b/c.json.tmp").exists());
    }

    #[test]
    fn test_copy_tree_merges_into_existing() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        fs::create_dir_all(src.join("model/empty")).unwrap();
        fs::write(src.join("model/param"), b"new").unwrap();
        fs::create_dir_all(dst.join("model")).unwrap();
        fs::write(dst.join("model/param"), b"old").unwrap();
        fs::write(dst.join("model/other"), b"keep").unwrap();

        assert_eq!(copy_tree(&src, &dst).unwrap(), 1);
        assert_eq!(fs::read(dst.join("model/param")).unwrap(), b"new");
        assert_eq!(fs::read(dst.join("model/other")).unwrap(), b"keep");
        assert!(dst.join("model/empty").is_dir());
    }

    #[test]
    fn test_tree_size() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("x")).unwrap();
        fs::write(dir.path().join("x/a"), vec![0u8; 1000]).unwrap();
        fs::write(dir.path().join("b"), vec![0u8; 24]).unwrap();
        assert_eq!(tree_size(dir.path()), 1024);
        assert_eq!(tree_size(&dir.path().join("missing")), 0);
    }
}
