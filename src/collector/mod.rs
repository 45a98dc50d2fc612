//! Snapshot acquisition: turns `/proc/[pid]/` entries into flat
//! [`ProcessRecord`]s.
//!
//! The whole snapshot is captured once, before any tree assembly starts.
//! Processes that disappear while the scan is running are skipped.

pub mod mock;
pub mod parser;
pub mod traits;

pub use mock::MockFs;
pub use traits::{FileMeta, FileSystem, RealFs};

use crate::collector::parser::parse_proc_stat;
use crate::model::{ProcessRecord, detect_renamed};
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// Error type for collection failures.
#[derive(Debug)]
pub enum CollectError {
    /// Process disappeared during collection.
    ProcessGone(u32),
    /// I/O error reading the proc filesystem.
    Io(io::Error),
    /// Parse error in process files.
    Parse(String),
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectError::ProcessGone(pid) => write!(f, "process {} disappeared", pid),
            CollectError::Io(e) => write!(f, "I/O error: {}", e),
            CollectError::Parse(msg) => write!(f, "parse error: {}", msg),
        }
    }
}

impl std::error::Error for CollectError {}

impl From<io::Error> for CollectError {
    fn from(e: io::Error) -> Self {
        CollectError::Io(e)
    }
}

/// Collects process records from `/proc/[pid]/` entries.
pub struct ProcessCollector<F: FileSystem> {
    fs: F,
    proc_path: String,
    capture_args: bool,
}

impl<F: FileSystem> ProcessCollector<F> {
    /// Creates a new collector over `proc_path` (usually `/proc`).
    pub fn new(fs: F, proc_path: impl Into<String>) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
            capture_args: false,
        }
    }

    /// Enables capture of raw command-line bytes for every record.
    pub fn with_args(mut self, capture: bool) -> Self {
        self.capture_args = capture;
        self
    }

    /// Reads one process. `ProcessGone` means the pid vanished between the
    /// directory scan and the file reads.
    pub fn collect_process(&self, pid: u32) -> Result<ProcessRecord, CollectError> {
        let proc_dir = format!("{}/{}", self.proc_path, pid);

        let stat_path = format!("{}/stat", proc_dir);
        let stat_content = self
            .fs
            .read_to_string(Path::new(&stat_path))
            .map_err(|_| CollectError::ProcessGone(pid))?;
        let stat = parse_proc_stat(&stat_content).map_err(|e| CollectError::Parse(e.message))?;

        let meta = self
            .fs
            .metadata(Path::new(&proc_dir))
            .map_err(|_| CollectError::ProcessGone(pid))?;

        let cmdline = if self.capture_args {
            let cmdline_path = format!("{}/cmdline", proc_dir);
            self.fs
                .read_bytes(Path::new(&cmdline_path))
                .ok()
                .map(|mut bytes| {
                    while bytes.last() == Some(&0) {
                        bytes.pop();
                    }
                    bytes
                })
                .filter(|bytes| !bytes.is_empty())
        } else {
            None
        };

        let renamed = cmdline
            .as_deref()
            .is_some_and(|c| detect_renamed(&stat.comm, c));

        Ok(ProcessRecord {
            pid: stat.pid,
            parent_pid: stat.ppid,
            uid: meta.uid,
            gid: meta.gid,
            created: meta.ctime,
            state: stat.state,
            name: stat.comm,
            cmdline,
            renamed,
        })
    }

    /// Captures one atomic snapshot of every visible process.
    ///
    /// Vanished processes are skipped silently; unreadable ones are skipped
    /// with a warning. Failure to list the proc root is fatal.
    pub fn snapshot(&self) -> Result<Vec<ProcessRecord>, CollectError> {
        let entries = self.fs.read_dir(Path::new(&self.proc_path))?;

        let mut records = Vec::new();
        for entry in entries {
            if let Some(name) = entry.file_name().and_then(|n| n.to_str())
                && let Ok(pid) = name.parse::<u32>()
            {
                match self.collect_process(pid) {
                    Ok(record) => records.push(record),
                    Err(CollectError::ProcessGone(_)) => continue,
                    Err(e) => warn!("failed to read process {}: {}", pid, e),
                }
            }
        }

        debug!("captured {} process records", records.len());
        Ok(records)
    }
}
