//! Parser for `/proc/[pid]/stat` content.
//!
//! A pure function over the file text, easily testable with string inputs.

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// The fields of `/proc/[pid]/stat` the tree needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcStat {
    pub pid: u32,
    pub comm: String,
    pub state: char,
    pub ppid: u32,
}

/// Parses `/proc/[pid]/stat` content.
///
/// The comm field is enclosed in parentheses and can itself contain spaces
/// and parentheses, so the split points are the first `(` and the last `)`.
/// Format: `pid (comm) state ppid ...`; trailing fields are ignored.
pub fn parse_proc_stat(content: &str) -> Result<ProcStat, ParseError> {
    let content = content.trim();

    let open = content
        .find('(')
        .ok_or_else(|| ParseError::new("missing '(' in stat"))?;
    let close = content
        .rfind(')')
        .ok_or_else(|| ParseError::new("missing ')' in stat"))?;
    if close <= open {
        return Err(ParseError::new("invalid parentheses in stat"));
    }

    let pid: u32 = content[..open]
        .trim()
        .parse()
        .map_err(|_| ParseError::new("invalid pid"))?;
    let comm = content[open + 1..close].to_string();

    let mut fields = content[close + 1..].split_whitespace();
    let state = fields
        .next()
        .and_then(|s| {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(c),
                _ => None,
            }
        })
        .ok_or_else(|| ParseError::new("invalid state"))?;
    let ppid: u32 = fields
        .next()
        .ok_or_else(|| ParseError::new("missing ppid"))?
        .parse()
        .map_err(|_| ParseError::new("invalid ppid"))?;

    Ok(ProcStat {
        pid,
        comm,
        state,
        ppid,
    })
}
