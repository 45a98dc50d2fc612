//! Command-line display formatting.

use crate::model::{basename, split_first_token};

/// Formats a raw command line for display: `argv[0]` basename-clipped
/// (shown whole when the process renamed itself, since a rewritten argv is
/// not a path) followed by the remaining arguments.
///
/// NUL separators become spaces. Control and other non-printable bytes
/// escape to three-digit octal `\NNN`; bytes at 0x80 and above pass
/// through so UTF-8 arguments stay readable. With `escape_spaces`, literal
/// spaces inside arguments escape to `\040` while separators stay plain.
pub fn format_cmdline(cmdline: &[u8], renamed: bool, escape_spaces: bool) -> Vec<u8> {
    let (token, rest) = split_first_token(cmdline);
    let mut out = Vec::with_capacity(cmdline.len() + 8);
    out.extend_from_slice(if renamed { token } else { basename(token) });
    if !rest.is_empty() {
        out.push(b' ');
        append_escaped(&mut out, rest, escape_spaces);
    }
    out
}

fn append_escaped(out: &mut Vec<u8>, bytes: &[u8], escape_spaces: bool) {
    for &b in bytes {
        match b {
            0 => out.push(b' '),
            b' ' if escape_spaces => out.extend_from_slice(b"\\040"),
            b' ' => out.push(b' '),
            _ if b.is_ascii_graphic() || b >= 0x80 => out.push(b),
            _ => {
                out.push(b'\\');
                out.push(b'0' + (b >> 6));
                out.push(b'0' + ((b >> 3) & 7));
                out.push(b'0' + (b & 7));
            }
        }
    }
}
