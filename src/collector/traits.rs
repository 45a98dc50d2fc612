//! Filesystem abstraction so the collector can read the real `/proc` or an
//! in-memory mock in tests and on non-Linux development hosts.

use std::io;
use std::path::{Path, PathBuf};

/// Ownership and timing metadata of a proc entry.
///
/// For `/proc/[pid]` directories the owner uid/gid identify the process
/// owner and `ctime` its creation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileMeta {
    pub uid: u32,
    pub gid: u32,
    /// Seconds since the epoch.
    pub ctime: i64,
}

/// Abstraction over the filesystem operations the collector needs.
pub trait FileSystem {
    /// Reads an entire file as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Reads an entire file as raw bytes. Command lines contain embedded
    /// NULs and arbitrary argument bytes, so they never go through the
    /// string path.
    fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Lists entries of a directory.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Returns ownership metadata for a path.
    fn metadata(&self, path: &Path) -> io::Result<FileMeta>;
}

/// Real filesystem implementation delegating to `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(path)? {
            paths.push(entry?.path());
        }
        Ok(paths)
    }

    fn metadata(&self, path: &Path) -> io::Result<FileMeta> {
        use std::os::unix::fs::MetadataExt;

        let meta = std::fs::metadata(path)?;
        Ok(FileMeta {
            uid: meta.uid(),
            gid: meta.gid(),
            ctime: meta.ctime(),
        })
    }
}
