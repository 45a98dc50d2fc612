//! Flat process records as captured from one snapshot of the system.

/// One observed process, as reported by the proc filesystem.
///
/// Records are flat: parent/child structure is recovered later by the
/// tree assembler from `pid`/`parent_pid` alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessRecord {
    pub pid: u32,
    /// Reported parent pid. May name a pid that was not captured, or the
    /// process itself; both cases mean "no parent".
    pub parent_pid: u32,
    pub uid: u32,
    pub gid: u32,
    /// Creation time of the proc entry, seconds since the epoch.
    pub created: i64,
    /// Single-character scheduler state code (`R`, `S`, `Z`, ...).
    pub state: char,
    /// Short process name (the kernel's comm value, up to 15 bytes).
    pub name: String,
    /// Raw command line: NUL-separated argument bytes, captured only when
    /// argument display was requested. `None` for kernel threads and when
    /// capture was off.
    pub cmdline: Option<Vec<u8>>,
    /// True when `name` was overridden by the process and no longer matches
    /// the executable basename encoded in `cmdline`.
    pub renamed: bool,
}

/// Splits a raw command line at the first NUL: `(argv[0], remaining bytes)`.
///
/// The separating NUL is consumed. A buffer without any NUL is a single
/// token with an empty tail.
pub fn split_first_token(cmdline: &[u8]) -> (&[u8], &[u8]) {
    match cmdline.iter().position(|&b| b == 0) {
        Some(i) => (&cmdline[..i], &cmdline[i + 1..]),
        None => (cmdline, &[]),
    }
}

/// Returns the final path segment of an executable token.
pub fn basename(token: &[u8]) -> &[u8] {
    match token.iter().rposition(|&b| b == b'/') {
        Some(i) => &token[i + 1..],
        None => token,
    }
}

/// The kernel stores comm in a 16-byte buffer, so names truncate at 15.
const COMM_MAX: usize = 15;

/// Decides whether a process renamed itself: its comm no longer matches the
/// basename of `argv[0]`. A basename that merely extends a truncated comm
/// is not a rename.
pub fn detect_renamed(name: &str, cmdline: &[u8]) -> bool {
    let (token, _) = split_first_token(cmdline);
    if token.is_empty() {
        return false;
    }
    let base = basename(token);
    if base == name.as_bytes() {
        return false;
    }
    !(name.len() == COMM_MAX && base.starts_with(name.as_bytes()))
}
