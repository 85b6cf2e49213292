//! Pull-based reading of input units, one line or one blank-line-delimited
//! block at a time.

use std::io::{BufRead, Read};

use crate::error::ReadError;

/// Upper bound on a single input line.
pub const MAX_LINE_LENGTH: usize = 256 * 1024;

const BOM: &str = "\u{FEFF}";

/// How input lines are grouped into units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Every line is a unit, blank ones included.
    Line,
    /// Consecutive non-blank lines form a unit; blank lines separate units.
    Block,
}

/// Yields one raw input unit per call to `next`, reading no further into the
/// underlying reader than the current unit requires.
pub struct LineSource<R> {
    reader: R,
    framing: Framing,
    buf: Vec<u8>,
    at_start: bool,
    done: bool,
}

impl<R: BufRead> LineSource<R> {
    pub fn new(reader: R, framing: Framing) -> Self {
        Self {
            reader,
            framing,
            buf: Vec::new(),
            at_start: true,
            done: false,
        }
    }

    /// Releases the underlying reader, positioned just after the last unit
    /// that was pulled.
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Reads a single line without its terminator. `Ok(None)` at end of stream.
    fn read_line(&mut self) -> Result<Option<String>, ReadError> {
        self.buf.clear();
        // Two bytes over the limit leave room for `\r\n`.
        let limit = (MAX_LINE_LENGTH + 2) as u64;
        let read = (&mut self.reader)
            .take(limit)
            .read_until(b'\n', &mut self.buf)?;
        if read == 0 {
            return Ok(None);
        }

        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }
        if self.buf.len() > MAX_LINE_LENGTH {
            return Err(ReadError::LineTooLong {
                limit: MAX_LINE_LENGTH,
            });
        }

        let mut line =
            String::from_utf8(std::mem::take(&mut self.buf)).map_err(ReadError::InvalidUtf8)?;
        if self.at_start {
            self.at_start = false;
            if line.starts_with(BOM) {
                line.drain(..BOM.len());
            }
        }
        Ok(Some(line))
    }

    fn next_block(&mut self) -> Result<Option<String>, ReadError> {
        let mut block = String::new();
        while let Some(line) = self.read_line()? {
            if line.trim().is_empty() {
                if block.is_empty() {
                    continue;
                }
                break;
            }
            block.push_str(&line);
            block.push('\n');
        }
        Ok(if block.is_empty() { None } else { Some(block) })
    }
}

impl<R: BufRead> Iterator for LineSource<R> {
    type Item = Result<String, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let unit = match self.framing {
            Framing::Line => self.read_line(),
            Framing::Block => self.next_block(),
        };
        match unit {
            Ok(Some(unit)) => Some(Ok(unit)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
