//! Single-pass conversion: read a unit, parse it, check for cancellation,
//! write it, repeat. The first failure of any stage ends the run.

use crate::error::{ConvertError, StageError};
use crate::parser::Parser;
use crate::serialiser::Serialiser;
use crate::source::{Framing, LineSource};
use crate::subtitle::FileFormat;

use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, trace};

/// Shared, monotonic cancellation flag. Once cancelled it stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Streaming,
    Finished,
    Failed,
    Cancelled,
}

impl State {
    pub fn is_terminal(self) -> bool {
        !matches!(self, State::Idle | State::Streaming)
    }
}

pub struct Pipeline<R, W> {
    source: LineSource<R>,
    parser: Parser,
    serialiser: Serialiser<W>,
    cancel: CancelToken,
    state: State,
    record: usize,
}

impl<R: BufRead, W: Write> Pipeline<R, W> {
    pub fn new(
        reader: R,
        writer: W,
        input: FileFormat,
        output: FileFormat,
        cancel: CancelToken,
    ) -> Self {
        let framing = match input {
            FileFormat::Srt => Framing::Block,
            FileFormat::Txt | FileFormat::Unknown => Framing::Line,
        };
        Self {
            source: LineSource::new(reader, framing),
            parser: Parser::new(input),
            serialiser: Serialiser::new(writer, output),
            cancel,
            state: State::Idle,
            record: 0,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn emitted(&self) -> usize {
        self.serialiser.emitted()
    }

    /// Processes a single record. Returns the state after the step; calling
    /// this on a pipeline in a terminal state does nothing.
    pub fn step(&mut self) -> Result<State, StageError> {
        if self.state.is_terminal() {
            return Ok(self.state);
        }
        self.state = State::Streaming;

        let result = self.advance();
        self.state = match &result {
            Ok(state) => *state,
            Err(StageError::Cancelled { .. }) => State::Cancelled,
            Err(_) => State::Failed,
        };
        result
    }

    fn advance(&mut self) -> Result<State, StageError> {
        let record = self.record + 1;
        let unit = match self.source.next() {
            None => {
                debug!(emitted = self.emitted(), "end of input");
                return Ok(State::Finished);
            }
            Some(unit) => unit.map_err(|source| StageError::Read { record, source })?,
        };
        self.record = record;

        let sub = self
            .parser
            .parse(&unit)
            .map_err(|source| StageError::Parse { record, source })?;

        if self.cancel.is_cancelled() {
            debug!(record, "cancellation requested");
            return Err(StageError::Cancelled { record });
        }

        self.serialiser
            .write(&sub)
            .map_err(|source| StageError::Write { record, source })?;
        trace!(record, start = ?sub.start, end = ?sub.end, lines = sub.text.len(), "converted");

        Ok(State::Streaming)
    }

    /// Runs to a terminal state and returns the number of subtitles written.
    pub fn run(&mut self) -> Result<usize, ConvertError> {
        loop {
            match self.step() {
                Ok(State::Streaming) => continue,
                Ok(_) => return Ok(self.emitted()),
                Err(cause) => {
                    return Err(ConvertError {
                        emitted: self.emitted(),
                        cause,
                    })
                }
            }
        }
    }

    /// Stops the pipeline and hands back the reader and writer.
    pub fn into_inner(self) -> (R, W) {
        (self.source.into_inner(), self.serialiser.into_inner())
    }
}
