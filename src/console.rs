//! Operator console: reading the repeat count and reporting readings.
//!
//! The console is any `embedded-io` byte stream, typically a UART. Input is a
//! single decimal count terminated by a line feed. Carriage returns are
//! dropped so a CRLF terminal never leaves a stray byte in front of the next
//! count.

use embedded_io::{Error as _, ErrorKind, Read, Write, WriteFmtError};
use heapless::Vec;

use crate::error::{Error, Result};

/// Longest count line accepted; longer lines are discarded as unparseable.
pub const LINE_CAPACITY: usize = 16;
/// Text written before each session.
pub const PROMPT: &str = "Enter repeat count:";

const NEWLINE: &str = "\r\n";

/// Parses a repeat count. Anything that is not a positive decimal integer
/// yields zero iterations.
pub fn parse_count(line: &[u8]) -> u32 {
    core::str::from_utf8(line)
        .ok()
        .and_then(|text| text.trim().parse::<i32>().ok())
        .filter(|count| *count > 0)
        .map_or(0, |count| count as u32)
}

/// Blocks until one line has been read and returns the parsed count.
///
/// Returns [`Error::EndOfInput`] only if the stream ends before any byte of
/// the line arrived.
pub fn read_count<C, E>(console: &mut C) -> Result<u32, E>
where
    C: Read,
{
    let mut line: Vec<u8, LINE_CAPACITY> = Vec::new();
    let mut received = false;
    let mut overflow = false;
    let mut byte = [0u8; 1];

    loop {
        let read = console
            .read(&mut byte)
            .map_err(|err| Error::Console(err.kind()))?;
        if read == 0 {
            if !received {
                return Err(Error::EndOfInput);
            }
            break;
        }

        received = true;
        match byte[0] {
            b'\n' => break,
            b'\r' => {}
            other => {
                if line.push(other).is_err() {
                    overflow = true;
                }
            }
        }
    }

    if overflow {
        warn!("count line longer than {} bytes ignored", LINE_CAPACITY);
        return Ok(0);
    }

    Ok(parse_count(&line))
}

/// Writes the session prompt.
pub fn write_prompt<C, E>(console: &mut C) -> Result<(), E>
where
    C: Write,
{
    write!(console, "{}{}", PROMPT, NEWLINE).map_err(fmt_error)?;
    flush(console)
}

/// Reports one received word with its 1-based iteration index.
pub fn write_reading<C, E>(console: &mut C, word: u16, index: u32) -> Result<(), E>
where
    C: Write,
{
    write!(
        console,
        "Received: 0x{:04X}{}Index: {}{}",
        word, NEWLINE, index, NEWLINE
    )
    .map_err(fmt_error)
}

/// Reports an iteration whose exchange failed.
pub fn write_failure<C, E>(console: &mut C, index: u32) -> Result<(), E>
where
    C: Write,
{
    write!(console, "Received: error{}Index: {}{}", NEWLINE, index, NEWLINE).map_err(fmt_error)
}

/// Writes the blank line that separates sessions.
pub fn end_session<C, E>(console: &mut C) -> Result<(), E>
where
    C: Write,
{
    console
        .write_all(NEWLINE.as_bytes())
        .map_err(|err| Error::Console(err.kind()))?;
    flush(console)
}

fn flush<C, E>(console: &mut C) -> Result<(), E>
where
    C: Write,
{
    console.flush().map_err(|err| Error::Console(err.kind()))
}

fn fmt_error<IoE, E>(err: WriteFmtError<IoE>) -> Error<E>
where
    IoE: embedded_io::Error,
{
    match err {
        WriteFmtError::Other(err) => Error::Console(err.kind()),
        _ => Error::Console(ErrorKind::Other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestConsole;
    use core::convert::Infallible;

    #[test]
    fn parses_positive_counts() {
        assert_eq!(parse_count(b"3"), 3);
        assert_eq!(parse_count(b" 42 "), 42);
        assert_eq!(parse_count(b"+7"), 7);
    }

    #[test]
    fn non_positive_or_garbage_counts_are_zero() {
        assert_eq!(parse_count(b"0"), 0);
        assert_eq!(parse_count(b"-5"), 0);
        assert_eq!(parse_count(b""), 0);
        assert_eq!(parse_count(b"abc"), 0);
        assert_eq!(parse_count(b"12abc"), 0);
        assert_eq!(parse_count(b"99999999999"), 0);
        assert_eq!(parse_count(&[0xFF, 0x31]), 0);
    }

    #[test]
    fn read_count_discards_carriage_return() {
        let mut console = TestConsole::new("12\r\n5\n");
        assert_eq!(read_count::<_, Infallible>(&mut console), Ok(12));
        assert_eq!(read_count::<_, Infallible>(&mut console), Ok(5));
        assert_eq!(
            read_count::<_, Infallible>(&mut console),
            Err(Error::EndOfInput)
        );
    }

    #[test]
    fn read_count_accepts_unterminated_last_line() {
        let mut console = TestConsole::new("4");
        assert_eq!(read_count::<_, Infallible>(&mut console), Ok(4));
    }

    #[test]
    fn overlong_line_is_consumed_and_ignored() {
        let mut console = TestConsole::new("1234567890123456789\n2\n");
        assert_eq!(read_count::<_, Infallible>(&mut console), Ok(0));
        assert_eq!(read_count::<_, Infallible>(&mut console), Ok(2));
    }

    #[test]
    fn reading_lines_are_labelled() {
        let mut console = TestConsole::new("");
        write_reading::<_, Infallible>(&mut console, 0x0ABC, 7).unwrap();
        write_failure::<_, Infallible>(&mut console, 8).unwrap();
        assert_eq!(
            console.output_str(),
            "Received: 0x0ABC\r\nIndex: 7\r\nReceived: error\r\nIndex: 8\r\n"
        );
    }
}
