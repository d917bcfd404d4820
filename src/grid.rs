//! Flattening of the extractor's textual grid into a single delimited line.
//!
//! Every visible character is followed by one space, a newline that is
//! followed by anything becomes a row separator (`,`), and carriage returns
//! disappear. A trailing newline produces nothing.

/// Row separator emitted in place of an embedded newline.
pub const ROW_SEPARATOR: char = ',';

/// Flatten raw extractor output into the board string returned to clients.
pub fn flatten(raw: &str) -> String {
    let mut board = String::with_capacity(raw.len() * 2);
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\n' => {
                if chars.peek().is_some() {
                    board.push(ROW_SEPARATOR);
                }
            }
            '\r' => {}
            other => {
                board.push(other);
                board.push(' ');
            }
        }
    }

    board
}
