//! In-memory mock filesystem for testing the collector without a real
//! `/proc`, and for running the viewer on non-Linux development hosts.

use crate::collector::traits::{FileMeta, FileSystem};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

/// In-memory filesystem.
///
/// Stores file contents, directories and per-path metadata, allowing tests
/// to simulate arbitrary proc filesystem states.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    files: HashMap<PathBuf, Vec<u8>>,
    directories: HashSet<PathBuf>,
    metas: HashMap<PathBuf, FileMeta>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content. Parent directories are created
    /// automatically.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();

        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }

        self.files.insert(path, content.into());
    }

    /// Adds an empty directory.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.directories.insert(path.clone());

        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }

    /// Sets ownership metadata for a path.
    pub fn set_meta(&mut self, path: impl AsRef<Path>, meta: FileMeta) {
        self.metas.insert(path.as_ref().to_path_buf(), meta);
    }

    /// Adds a `/proc/[pid]` entry with its stat file, command line and
    /// directory metadata.
    pub fn add_process(&mut self, pid: u32, stat: &str, cmdline: &[u8], meta: FileMeta) {
        let base = PathBuf::from(format!("/proc/{}", pid));
        self.add_dir(&base);
        self.add_file(base.join("stat"), stat.as_bytes().to_vec());
        if !cmdline.is_empty() {
            self.add_file(base.join("cmdline"), cmdline.to_vec());
        }
        self.set_meta(&base, meta);
    }

    /// A small but complete system: init, an sshd with two identical bash
    /// children, and a getty. Pids 3 and 4 are indistinguishable leaves, so
    /// default rendering folds them into one counted entry.
    pub fn typical_system() -> Self {
        let root = FileMeta {
            uid: 0,
            gid: 0,
            ctime: 1_700_000_000,
        };
        let user = FileMeta {
            uid: 1000,
            gid: 1000,
            ctime: 1_700_000_500,
        };

        let mut fs = Self::new();
        fs.add_dir("/proc");
        fs.add_process(1, "1 (init) S 0 1 1 0 -1 4194560 0 0 0 0", b"/sbin/init\0", root);
        fs.add_process(
            2,
            "2 (sshd) S 1 2 2 0 -1 4194560 0 0 0 0",
            b"/usr/sbin/sshd\0-D\0",
            root,
        );
        fs.add_process(3, "3 (bash) S 2 3 3 0 -1 4194560 0 0 0 0", b"-bash\0", user);
        fs.add_process(4, "4 (bash) S 2 4 4 0 -1 4194560 0 0 0 0", b"-bash\0", user);
        fs.add_process(5, "5 (getty) S 1 5 5 0 -1 4194560 0 0 0 0", b"/sbin/getty\0tty1\0", root);

        // non-process entries the scanner must skip
        fs.add_dir("/proc/sys");
        fs.add_file("/proc/uptime", "12345.67 98765.43\n".as_bytes().to_vec());

        fs
    }

    /// `typical_system` plus a process whose reported parent was never
    /// captured.
    pub fn with_orphan() -> Self {
        let mut fs = Self::typical_system();
        fs.add_process(
            900,
            "900 (stray) S 888 900 900 0 -1 4194560 0 0 0 0",
            b"/usr/bin/stray\0",
            FileMeta {
                uid: 1000,
                gid: 1000,
                ctime: 1_700_000_900,
            },
        );
        fs
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let bytes = self.read_bytes(path)?;
        String::from_utf8(bytes)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "not valid UTF-8"))
    }

    fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{:?} not found", path)))
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        if !self.directories.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{:?} not a directory", path),
            ));
        }

        let mut entries: Vec<PathBuf> = self
            .directories
            .iter()
            .chain(self.files.keys())
            .filter(|p| p.parent() == Some(path))
            .cloned()
            .collect();
        entries.sort();
        entries.dedup();
        Ok(entries)
    }

    fn metadata(&self, path: &Path) -> io::Result<FileMeta> {
        self.metas
            .get(path)
            .copied()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{:?} not found", path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_dir_lists_children_once() {
        let fs = MockFs::typical_system();
        let entries = fs.read_dir(Path::new("/proc")).unwrap();
        assert!(entries.contains(&PathBuf::from("/proc/1")));
        assert!(entries.contains(&PathBuf::from("/proc/sys")));
        assert!(entries.contains(&PathBuf::from("/proc/uptime")));

        let count = entries
            .iter()
            .filter(|p| *p == &PathBuf::from("/proc/1"))
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn missing_paths_are_not_found() {
        let fs = MockFs::new();
        assert_eq!(
            fs.read_bytes(Path::new("/proc/1/stat")).unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
        assert!(fs.read_dir(Path::new("/proc")).is_err());
    }

    #[test]
    fn cmdline_bytes_keep_embedded_nuls() {
        let fs = MockFs::typical_system();
        let bytes = fs.read_bytes(Path::new("/proc/2/cmdline")).unwrap();
        assert_eq!(bytes, b"/usr/sbin/sshd\0-D\0");
    }
}
