use std::fmt;
use std::io;
use std::num::ParseIntError;

use thiserror::Error;

use crate::subtitle::FileFormat;

/// Which of the two timing fields of a subtitle an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Start,
    End,
}

impl fmt::Display for Field {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Field::Start => write!(fmt, "start"),
            Field::End => write!(fmt, "end"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("missing {0} timing field")]
    MissingTimingField(Field),
    #[error("failed to parse {field} frame '{value}'")]
    MalformedFrame {
        field: Field,
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("failed to parse {field} frame: {value} is out of range")]
    FrameOutOfRange { field: Field, value: i64 },
    #[error("malformed SRT block:\n{0}")]
    MalformedBlock(String),
    #[error("input format '{0}' is not supported")]
    UnsupportedFormat(FileFormat),
}

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("I/O error while reading input")]
    Io(#[from] io::Error),
    #[error("input line exceeds {limit} bytes")]
    LineTooLong { limit: usize },
    #[error("input is not valid UTF-8")]
    InvalidUtf8(#[source] std::string::FromUtf8Error),
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("I/O error while writing output")]
    Io(#[from] io::Error),
    #[error("output format '{0}' is not supported")]
    UnsupportedFormat(FileFormat),
}

/// A failure tagged with the stage that produced it and the 1-based ordinal
/// of the input record being processed.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("failed to read subtitle #{record}")]
    Read {
        record: usize,
        #[source]
        source: ReadError,
    },
    #[error("failed to parse subtitle #{record}")]
    Parse {
        record: usize,
        #[source]
        source: ParseError,
    },
    #[error("failed to write subtitle #{record}")]
    Write {
        record: usize,
        #[source]
        source: WriteError,
    },
    #[error("cancelled before writing subtitle #{record}")]
    Cancelled { record: usize },
}

/// Terminal failure of a conversion run.
#[derive(Debug, Error)]
#[error("conversion stopped after {emitted} subtitle(s)")]
pub struct ConvertError {
    pub emitted: usize,
    #[source]
    pub cause: StageError,
}

impl ConvertError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self.cause, StageError::Cancelled { .. })
    }
}
