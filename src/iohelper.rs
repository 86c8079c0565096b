/*!
 * Helper functions for input and output.
 */
use std::io;

use colored::*;
use rustyline::error::ReadlineError;

use super::common::{QuizError, Result};


#[macro_export]
macro_rules! my_writeln {
    ($dst:expr, $($arg:tt)*) => (
        writeln!($dst, $($arg)*).map_err($crate::common::QuizError::Io)
    );
}

#[macro_export]
macro_rules! my_write {
    ($dst:expr, $($arg:tt)*) => (
        write!($dst, $($arg)*).map_err($crate::common::QuizError::Io)
    );
}


/// Anything that can read a line of input after showing a prompt. Implemented for
/// rustyline's editor, and by scripted readers in tests.
pub trait MyReadline {
    fn read_line(&mut self, prompt: &str) -> Result<String>;
}

impl<H: rustyline::Helper> MyReadline for rustyline::Editor<H> {
    fn read_line(&mut self, prompt: &str) -> Result<String> {
        match self.readline(&format!("{}", prompt.white())) {
            Ok(s) => Ok(s),
            Err(ReadlineError::Interrupted) => Err(QuizError::ReadlineInterrupted),
            Err(ReadlineError::Eof) => Err(QuizError::ReadlineEof),
            _ => Err(QuizError::ReadlineOther),
        }
    }
}


/// Display a prompt and read a line continually until the user enters a line with at
/// least one non-whitespace character. If the user presses Ctrl+D then `Ok(None)` is
/// returned. If the user pressed Ctrl+C then `Err(QuizError::ReadlineInterrupted)` is
/// returned. Otherwise, `Ok(Some(line))` is returned where `line` is the last line of
/// input the user entered without leading and trailing whitespace.
pub fn prompt<R: MyReadline>(reader: &mut R, message: &str) -> Result<Option<String>> {
    loop {
        match reader.read_line(message) {
            Ok(response) => {
                let response = response.trim();
                if !response.is_empty() {
                    return Ok(Some(response.to_string()));
                }
            }
            Err(QuizError::ReadlineEof) => {
                return Ok(None);
            }
            Err(e) => {
                return Err(e);
            }
        }
    }
}


/// Prompt the user with a yes-no question and return `true` if they enter yes.
pub fn yesno<R: MyReadline>(reader: &mut R, message: &str) -> bool {
    match prompt(reader, message) {
        Ok(Some(response)) => response.trim_start().to_lowercase().starts_with('y'),
        _ => false,
    }
}


/// Print `message`, breaking lines according to the current width of the terminal.
/// Prepend `prefix` to the first line and indent all subsequent lines by its length.
pub fn prettyprint<W: io::Write>(writer: &mut W, message: &str, prefix: &str) -> Result<()> {
    prettyprint_colored(writer, message, prefix, None, None)
}

pub fn prettyprint_colored<W: io::Write>(
    writer: &mut W,
    message: &str,
    prefix: &str,
    message_color: Option<Color>,
    prefix_color: Option<Color>,
) -> Result<()> {
    let width = wrap_width(textwrap::termwidth(), prefix.len());
    let mut lines = textwrap::wrap_iter(message, width);

    if let Some(first_line) = lines.next() {
        let colored_prefix = color_optional(prefix, prefix_color);
        let colored_line = color_optional(&first_line, message_color);
        my_writeln!(writer, "{}{}", colored_prefix, colored_line)?;
    }

    let indent = " ".repeat(prefix.len());
    for line in lines {
        let colored_line = color_optional(&line, message_color);
        my_writeln!(writer, "{}{}", indent, colored_line)?;
    }
    Ok(())
}


// Never wrap narrower than this, however long the prefix.
const MIN_WRAP_WIDTH: usize = 20;

fn wrap_width(termwidth: usize, prefix_len: usize) -> usize {
    termwidth.saturating_sub(prefix_len).max(MIN_WRAP_WIDTH)
}


fn color_optional(text: &str, color: Option<Color>) -> ColoredString {
    if let Some(color) = color {
        text.color(color)
    } else {
        text.normal()
    }
}
