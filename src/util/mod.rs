//! Small helpers shared by the binary.

/// Width of the attached terminal in columns, or 0 when there is nothing
/// to measure (output redirected, or the size query failed). Zero means
/// "do not clip".
pub fn terminal_width() -> usize {
    match crossterm::terminal::size() {
        Ok((cols, _rows)) => cols as usize,
        Err(_) => 0,
    }
}
