//! Line-clipping byte sink.

use std::io::{self, Write};

/// Output sink that truncates every line at a fixed byte width.
///
/// The column count is logical: it keeps advancing past the clip point, so
/// the renderer's indent bookkeeping stays correct even after a line has
/// been cut. A width of 0 disables clipping.
pub struct ClipWriter<W: Write> {
    inner: W,
    width: usize,
    col: usize,
}

impl<W: Write> ClipWriter<W> {
    pub fn new(inner: W, width: usize) -> Self {
        Self {
            inner,
            width,
            col: 0,
        }
    }

    /// Current logical column on the open line.
    pub fn col(&self) -> usize {
        self.col
    }

    pub fn put_str(&mut self, s: &str) -> io::Result<()> {
        self.put_bytes(s.as_bytes())
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        let visible = if self.width == 0 {
            bytes.len()
        } else {
            self.width.saturating_sub(self.col).min(bytes.len())
        };
        if visible > 0 {
            self.inner.write_all(&bytes[..visible])?;
        }
        self.col += bytes.len();
        Ok(())
    }

    /// Emits spaces up to `column`. Does nothing if the line is already
    /// past it.
    pub fn pad_to(&mut self, column: usize) -> io::Result<()> {
        const BLANK: &[u8] = b"                                ";
        while self.col < column {
            let n = (column - self.col).min(BLANK.len());
            self.put_bytes(&BLANK[..n])?;
        }
        Ok(())
    }

    pub fn newline(&mut self) -> io::Result<()> {
        self.inner.write_all(b"\n")?;
        self.col = 0;
        Ok(())
    }
}
