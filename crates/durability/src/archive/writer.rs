//! Model archive writer
//!
//! Packages a model version directory into a `.zip` or `.tar.zst` file with
//! atomic write semantics.

use crate::archive::format::ArchiveFormat;
use crate::paths::LOCK_FILE_NAME;
use modelstore_core::{StoreError, StoreResult};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tar::{Builder, EntryType, Header};
use tracing::debug;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Default zstd compression level for `.tar.zst` archives
pub const DEFAULT_ZSTD_LEVEL: i32 = 3;

/// Summary of a written archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveInfo {
    /// Final archive location
    pub path: PathBuf,
    /// Container format
    pub format: ArchiveFormat,
    /// Archive size on disk
    pub size_bytes: u64,
    /// Files and directories stored
    pub entry_count: usize,
}

/// One entry collected from the source tree
struct SourceEntry {
    /// Path relative to the source root, `/`-separated
    name: String,
    /// Absolute path on disk
    path: PathBuf,
    is_dir: bool,
}

/// Writer for model archives
#[derive(Debug, Clone)]
pub struct ArchiveWriter {
    format: ArchiveFormat,
    compression_level: i32,
}

impl ArchiveWriter {
    /// Writer for the given format with default compression
    pub fn new(format: ArchiveFormat) -> Self {
        Self {
            format,
            compression_level: DEFAULT_ZSTD_LEVEL,
        }
    }

    /// Override the zstd level (ignored for zip)
    pub fn with_compression_level(mut self, level: i32) -> Self {
        self.compression_level = level;
        self
    }

    /// Format produced by this writer
    pub fn format(&self) -> ArchiveFormat {
        self.format
    }

    /// Archive every entry under `src` (except the lock marker) into `dest`.
    ///
    /// This is an atomic operation - either the complete archive is written
    /// or no file is left behind.
    pub fn write_dir(&self, src: &Path, dest: &Path) -> StoreResult<ArchiveInfo> {
        if !src.is_dir() {
            return Err(StoreError::not_found(format!(
                "archive source {}",
                src.display()
            )));
        }
        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let entries = collect_entries(src)?;
        let temp_path = temp_path_for(dest);

        let written = match self.format {
            ArchiveFormat::Zip => write_zip(&entries, &temp_path),
            ArchiveFormat::TarZst => self.write_tar_zst(&entries, &temp_path),
        };
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }
        fs::rename(&temp_path, dest)?;

        let size_bytes = fs::metadata(dest)?.len();
        debug!(
            target: "modelstore::archive",
            path = %dest.display(),
            format = %self.format,
            entries = entries.len(),
            size_bytes,
            "Archive written"
        );

        Ok(ArchiveInfo {
            path: dest.to_path_buf(),
            format: self.format,
            size_bytes,
            entry_count: entries.len(),
        })
    }

    fn write_tar_zst(&self, entries: &[SourceEntry], path: &Path) -> StoreResult<()> {
        let file = File::create(path)?;
        let encoder = zstd::Encoder::new(BufWriter::new(file), self.compression_level)
            .map_err(|e| StoreError::archive(format!("zstd encoder: {}", e)))?;
        let mut builder = Builder::new(encoder);

        for entry in entries {
            let mut header = Header::new_gnu();
            header.set_mtime(0); // Reproducible archives: zero mtime
            if entry.is_dir {
                header.set_entry_type(EntryType::Directory);
                header.set_size(0);
                header.set_mode(0o755);
                builder
                    .append_data(&mut header, format!("{}/", entry.name), io::empty())
                    .map_err(|e| StoreError::archive(format!("append '{}': {}", entry.name, e)))?;
            } else {
                let file = File::open(&entry.path)?;
                header.set_entry_type(EntryType::Regular);
                header.set_size(file.metadata()?.len());
                header.set_mode(0o644);
                builder
                    .append_data(&mut header, &entry.name, file)
                    .map_err(|e| StoreError::archive(format!("append '{}': {}", entry.name, e)))?;
            }
        }

        let encoder = builder
            .into_inner()
            .map_err(|e| StoreError::archive(format!("tar finish: {}", e)))?;
        let mut buf_writer = encoder
            .finish()
            .map_err(|e| StoreError::archive(format!("zstd finish: {}", e)))?;
        buf_writer.flush()?;
        buf_writer.get_ref().sync_all()?;
        Ok(())
    }
}

fn write_zip(entries: &[SourceEntry], path: &Path) -> StoreResult<()> {
    let file = File::create(path)?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    for entry in entries {
        if entry.is_dir {
            zip.add_directory(entry.name.as_str(), options.unix_permissions(0o755))
                .map_err(|e| StoreError::archive(format!("zip dir '{}': {}", entry.name, e)))?;
        } else {
            let mut source = File::open(&entry.path)?;
            let large = source.metadata()?.len() >= u32::MAX as u64;
            zip.start_file(
                entry.name.as_str(),
                options.unix_permissions(0o644).large_file(large),
            )
            .map_err(|e| StoreError::archive(format!("zip file '{}': {}", entry.name, e)))?;
            io::copy(&mut source, &mut zip)?;
        }
    }

    let mut buf_writer = zip
        .finish()
        .map_err(|e| StoreError::archive(format!("zip finish: {}", e)))?;
    buf_writer.flush()?;
    buf_writer.get_ref().sync_all()?;
    Ok(())
}

/// Walk `src` in sorted order, skipping the top-level lock marker
fn collect_entries(src: &Path) -> StoreResult<Vec<SourceEntry>> {
    let mut entries = Vec::new();
    let walker = WalkDir::new(src)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !(e.depth() == 1 && e.file_name() == LOCK_FILE_NAME));

    for entry in walker {
        let entry = entry.map_err(|e| StoreError::archive(format!("walk {}: {}", src.display(), e)))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| StoreError::archive(e.to_string()))?;
        let name = relative
            .components()
            .map(|c| {
                c.as_os_str().to_str().ok_or_else(|| {
                    StoreError::archive(format!("non UTF-8 path: {}", relative.display()))
                })
            })
            .collect::<StoreResult<Vec<_>>>()?
            .join("/");
        entries.push(SourceEntry {
            name,
            path: entry.path().to_path_buf(),
            is_dir: entry.file_type().is_dir(),
        });
    }
    Ok(entries)
}

fn temp_path_for(dest: &Path) -> PathBuf {
    let mut name = OsString::from(dest.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::sha256_file;
    use tempfile::tempdir;

    fn sample_tree(root: &Path) {
        fs::create_dir_all(root.join("variables/index")).unwrap();
        fs::create_dir_all(root.join("variables/data/lr/model")).unwrap();
        fs::write(root.join("variables/data/lr/model/param"), b"\x01\x02").unwrap();
        fs::write(root.join("variables/data/lr/model/param.json"), b"{}").unwrap();
        fs::write(root.join(LOCK_FILE_NAME), b"").unwrap();
    }

    #[test]
    fn test_collect_entries_sorted_without_lock() {
        let dir = tempdir().unwrap();
        sample_tree(dir.path());
        let names: Vec<_> = collect_entries(dir.path())
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "variables",
                "variables/data",
                "variables/data/lr",
                "variables/data/lr/model",
                "variables/data/lr/model/param",
                "variables/data/lr/model/param.json",
                "variables/index",
            ]
        );
    }

    #[test]
    fn test_write_is_deterministic() {
        for format in [ArchiveFormat::Zip, ArchiveFormat::TarZst] {
            let dir = tempdir().unwrap();
            let src = dir.path().join("src");
            sample_tree(&src);
            let writer = ArchiveWriter::new(format);

            let a = dir.path().join(format!("a.{}", format.extension()));
            let b = dir.path().join(format!("b.{}", format.extension()));
            let info = writer.write_dir(&src, &a).unwrap();
            writer.write_dir(&src, &b).unwrap();

            assert_eq!(info.entry_count, 7);
            assert!(info.size_bytes > 0);
            assert_eq!(sha256_file(&a).unwrap(), sha256_file(&b).unwrap());
        }
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        sample_tree(&src);
        let dest = dir.path().join("out").join("m_v1.zip");
        ArchiveWriter::new(ArchiveFormat::Zip)
            .write_dir(&src, &dest)
            .unwrap();
        assert!(dest.exists());
        assert!(!temp_path_for(&dest).exists());
    }

    #[test]
    fn test_missing_source_fails() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("m_v1.zip");
        let result = ArchiveWriter::new(ArchiveFormat::Zip).write_dir(&dir.path().join("nope"), &dest);
        assert!(result.is_err());
        assert!(!dest.exists());
    }
}
