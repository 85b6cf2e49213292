use crate::error::{Field, ParseError};
use crate::subtitle::{FileFormat, Subtitle};
use crate::timing::{frame_to_duration, timestamp};

use std::time::Duration;

use nom::bytes::complete::{tag, take_until, take_while1};
use nom::character::complete::{char, digit1, line_ending, space0, space1};
use nom::combinator::{all_consuming, map_res};
use nom::error::{convert_error, ErrorKind, VerboseError};
use nom::multi::many_till;
use nom::sequence::{delimited, terminated};
use nom::{branch::alt, error_position, Err, IResult};

/// Turns raw input units into subtitles for one input format.
pub struct Parser {
    format: FileFormat,
}

impl Parser {
    pub fn new(format: FileFormat) -> Self {
        Self { format }
    }

    pub fn parse(&self, unit: &str) -> Result<Subtitle, ParseError> {
        match self.format {
            FileFormat::Txt => parse_txt(unit),
            FileFormat::Srt => parse_srt(unit),
            FileFormat::Unknown => Err(ParseError::UnsupportedFormat(self.format)),
        }
    }
}

/// Parses `{start}{end}line|line|...`.
fn parse_txt(line: &str) -> Result<Subtitle, ParseError> {
    let (rest, start) =
        timing_field(line).map_err(|_| ParseError::MissingTimingField(Field::Start))?;
    let (payload, end) =
        timing_field(rest).map_err(|_| ParseError::MissingTimingField(Field::End))?;

    let start = frame_field(start, Field::Start)?;
    let end = frame_field(end, Field::End)?;

    let text = if payload.is_empty() {
        Vec::new()
    } else {
        payload.split('|').map(String::from).collect()
    };

    Ok(Subtitle { start, end, text })
}

/// Finds the next `{...}` pair and returns its contents.
fn timing_field(input: &str) -> IResult<&str, &str, VerboseError<&str>> {
    let (input, _) = take_until("{")(input)?;
    delimited(char('{'), take_until("}"), char('}'))(input)
}

fn frame_field(value: &str, field: Field) -> Result<Duration, ParseError> {
    let frame: i64 = value.parse().map_err(|source| ParseError::MalformedFrame {
        field,
        value: value.to_string(),
        source,
    })?;
    u64::try_from(frame)
        .ok()
        .and_then(frame_to_duration)
        .ok_or(ParseError::FrameOutOfRange {
            field,
            value: frame,
        })
}

fn parse_srt(block: &str) -> Result<Subtitle, ParseError> {
    match all_consuming(subtitle)(block) {
        Ok((_, sub)) => Ok(sub),
        Err(Err::Error(err)) | Err(Err::Failure(err)) => {
            Err(ParseError::MalformedBlock(convert_error(block, err)))
        }
        Err(Err::Incomplete(_)) => {
            unreachable!("Incomplete data received by non-streaming parser.")
        }
    }
}

fn subtitle(input: &str) -> IResult<&str, Subtitle, VerboseError<&str>> {
    let (input, _) = terminated(seq_num, terminated(space0, line_ending))(input)?;
    let (input, (start, end)) = terminated(show_hide, line_ending)(input)?;
    let (input, text) = sub_text(input)?;

    Ok((input, Subtitle { start, end, text }))
}

fn end_of_file(input: &str) -> IResult<&str, &str, VerboseError<&str>> {
    if input.is_empty() {
        Ok((input, input))
    } else {
        std::result::Result::Err(Err::Error(error_position!(input, ErrorKind::Eof)))
    }
}

fn sub_text(input: &str) -> IResult<&str, Vec<String>, VerboseError<&str>> {
    let line = terminated(
        take_while1(|c: char| c != '\n' && c != '\r'),
        alt((line_ending, end_of_file)),
    );

    let (input, (vec, _)) = many_till(line, end_of_file)(input)?;

    Ok((input, vec.into_iter().map(String::from).collect()))
}

fn show_hide(input: &str) -> IResult<&str, (Duration, Duration), VerboseError<&str>> {
    let (input, _) = space0(input)?;
    let (input, show_at) = timestamp(input)?;
    let (input, _) = space1(input)?;
    let (input, _) = tag("-->")(input)?;
    let (input, _) = space1(input)?;
    let (input, hide_at) = timestamp(input)?;
    let (input, _) = space0(input)?;

    Ok((input, (show_at, hide_at)))
}

fn seq_num(input: &str) -> IResult<&str, usize, VerboseError<&str>> {
    map_res(digit1, |s: &str| s.parse())(input)
}
