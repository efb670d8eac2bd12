//! Archive container formats

use modelstore_core::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Container used to package a model version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArchiveFormat {
    /// Zip container with Deflate compression
    #[default]
    #[serde(rename = "zip")]
    Zip,
    /// Tar stream compressed with zstd
    #[serde(rename = "tar.zst")]
    TarZst,
}

impl ArchiveFormat {
    /// File extension without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::TarZst => "tar.zst",
        }
    }

    /// Detect the format from an archive file name
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if name.ends_with(".tar.zst") {
            Some(ArchiveFormat::TarZst)
        } else if name.ends_with(".zip") {
            Some(ArchiveFormat::Zip)
        } else {
            None
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ArchiveFormat {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zip" => Ok(ArchiveFormat::Zip),
            "tar.zst" | "tzst" => Ok(ArchiveFormat::TarZst),
            other => Err(StoreError::config(format!(
                "unknown archive format '{}', expected \"zip\" or \"tar.zst\"",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(
            ArchiveFormat::from_path(Path::new("/tmp/job#1#m1_v1.zip")),
            Some(ArchiveFormat::Zip)
        );
        assert_eq!(
            ArchiveFormat::from_path(Path::new("/tmp/job#1#m1_v1.TAR.ZST")),
            Some(ArchiveFormat::TarZst)
        );
        assert_eq!(ArchiveFormat::from_path(Path::new("/tmp/model.bin")), None);
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("zip".parse::<ArchiveFormat>().unwrap(), ArchiveFormat::Zip);
        assert_eq!(
            "tar.zst".parse::<ArchiveFormat>().unwrap(),
            ArchiveFormat::TarZst
        );
        assert!("rar".parse::<ArchiveFormat>().is_err());
        assert_eq!(ArchiveFormat::TarZst.to_string(), "tar.zst");
        assert_eq!(ArchiveFormat::default(), ArchiveFormat::Zip);
    }
}
