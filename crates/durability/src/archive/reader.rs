//! Model archive reader
//!
//! Extracts `.zip` / `.tar.zst` archives into a model version directory.
//! Both container libraries refuse entries that would escape the target.

use crate::archive::format::ArchiveFormat;
use modelstore_core::{StoreError, StoreResult};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tar::Archive;
use tracing::debug;
use zip::ZipArchive;

/// Reader for model archives
pub struct ArchiveReader;

impl ArchiveReader {
    /// Extract `archive` into `dest`, overwriting files with the same name.
    pub fn extract(archive: &Path, format: ArchiveFormat, dest: &Path) -> StoreResult<()> {
        std::fs::create_dir_all(dest)?;
        match format {
            ArchiveFormat::Zip => {
                let mut zip = Self::open_zip(archive)?;
                zip.extract(dest)
                    .map_err(|e| StoreError::archive(format!("zip extract: {}", e)))?;
            }
            ArchiveFormat::TarZst => {
                let mut tar = Self::open_tar_zst(archive)?;
                tar.set_overwrite(true);
                tar.unpack(dest)
                    .map_err(|e| StoreError::archive(format!("tar unpack: {}", e)))?;
            }
        }
        debug!(
            target: "modelstore::archive",
            archive = %archive.display(),
            dest = %dest.display(),
            %format,
            "Archive extracted"
        );
        Ok(())
    }

    /// Names of every entry in the archive, in stored order
    pub fn entry_names(archive: &Path, format: ArchiveFormat) -> StoreResult<Vec<String>> {
        match format {
            ArchiveFormat::Zip => {
                let zip = Self::open_zip(archive)?;
                Ok(zip.file_names().map(str::to_string).collect())
            }
            ArchiveFormat::TarZst => {
                let mut tar = Self::open_tar_zst(archive)?;
                let mut names = Vec::new();
                for entry in tar
                    .entries()
                    .map_err(|e| StoreError::archive(e.to_string()))?
                {
                    let entry = entry.map_err(|e| StoreError::archive(e.to_string()))?;
                    let path = entry
                        .path()
                        .map_err(|e| StoreError::archive(e.to_string()))?;
                    names.push(path.to_string_lossy().to_string());
                }
                Ok(names)
            }
        }
    }

    fn open_zip(archive: &Path) -> StoreResult<ZipArchive<BufReader<File>>> {
        let file = File::open(archive)?;
        ZipArchive::new(BufReader::new(file))
            .map_err(|e| StoreError::archive(format!("zip open {}: {}", archive.display(), e)))
    }

    fn open_tar_zst(archive: &Path) -> StoreResult<Archive<zstd::Decoder<'static, BufReader<File>>>> {
        let file = File::open(archive)?;
        let decoder = zstd::Decoder::new(file)
            .map_err(|e| StoreError::archive(format!("zstd decode: {}", e)))?;
        Ok(Archive::new(decoder))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::writer::ArchiveWriter;
    use std::fs;
    use tempfile::tempdir;

    fn sample_tree(root: &Path) {
        fs::create_dir_all(root.join("define")).unwrap();
        fs::create_dir_all(root.join("variables/index")).unwrap();
        fs::create_dir_all(root.join("variables/data/lr/model")).unwrap();
        fs::write(root.join("define/define_meta.yaml"), b"model_proto: {}\n").unwrap();
        fs::write(root.join("variables/data/lr/model/param"), b"\x01\x02\xff").unwrap();
        fs::write(root.join(".lock"), b"").unwrap();
    }

    #[test]
    fn test_extract_restores_tree() {
        for format in [ArchiveFormat::Zip, ArchiveFormat::TarZst] {
            let dir = tempdir().unwrap();
            let src = dir.path().join("src");
            sample_tree(&src);
            let archive = dir.path().join(format!("m_v1.{}", format.extension()));
            ArchiveWriter::new(format).write_dir(&src, &archive).unwrap();

            let dest = dir.path().join("dest");
            ArchiveReader::extract(&archive, format, &dest).unwrap();

            assert_eq!(
                fs::read(dest.join("variables/data/lr/model/param")).unwrap(),
                b"\x01\x02\xff"
            );
            assert_eq!(
                fs::read(dest.join("define/define_meta.yaml")).unwrap(),
                fs::read(src.join("define/define_meta.yaml")).unwrap()
            );
            assert!(dest.join("variables/index").is_dir());
            assert!(!dest.join(".lock").exists());
        }
    }

    #[test]
    fn test_entry_names_exclude_lock() {
        for format in [ArchiveFormat::Zip, ArchiveFormat::TarZst] {
            let dir = tempdir().unwrap();
            let src = dir.path().join("src");
            sample_tree(&src);
            let archive = dir.path().join(format!("m_v1.{}", format.extension()));
            ArchiveWriter::new(format).write_dir(&src, &archive).unwrap();

            let names = ArchiveReader::entry_names(&archive, format).unwrap();
            assert!(names.iter().any(|n| n == "variables/data/lr/model/param"));
            assert!(!names.iter().any(|n| n.contains(".lock")));
        }
    }

    #[test]
    fn test_extract_garbage_fails() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("bad.zip");
        fs::write(&archive, b"definitely not a zip").unwrap();
        let err = ArchiveReader::extract(&archive, ArchiveFormat::Zip, &dir.path().join("d"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Archive(_)));
    }
}
