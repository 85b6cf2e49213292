//! Conversions between `Duration` and the on-disk timing representations:
//! frame counts at the NTSC film rate and `HH:MM:SS,mmm` clock stamps.
//!
//! Everything here is integer arithmetic so that conversions are exact and
//! reproducible.

use std::io::Write;
use std::time::Duration;

use nom::bytes::complete::{tag, take_while_m_n};
use nom::character::complete::digit1;
use nom::combinator::map_res;
use nom::error::VerboseError;
use nom::IResult;

/// Frame rate numerator (24000/1001 ≈ 23.976 fps).
const RATE_NUM: u128 = 24000;
const RATE_DEN: u128 = 1001;
/// Scales the rate so that decoding yields milliseconds.
const RATE_SCALE: u128 = 1000;

const MILLIS_PER_HOUR: u64 = 3_600_000;
const MILLIS_PER_MINUTE: u64 = 60_000;

/// Decodes a frame count into the duration at which that frame is shown,
/// truncated to whole milliseconds. Returns `None` if the result does not fit
/// in a millisecond count.
pub fn frame_to_duration(frame: u64) -> Option<Duration> {
    let millis = u128::from(frame) * RATE_DEN * RATE_SCALE / RATE_NUM;
    u64::try_from(millis).ok().map(Duration::from_millis)
}

/// Encodes a duration as the nearest frame, rounding halves up.
///
/// `duration_to_frame(frame_to_duration(f)) == f` holds for every frame.
pub fn duration_to_frame(duration: Duration) -> u64 {
    let div = RATE_DEN * RATE_SCALE;
    let frame = (duration.as_millis() * RATE_NUM + div / 2) / div;
    u64::try_from(frame).unwrap_or(u64::MAX)
}

/// Writes a frame-text timing field, e.g. `{2398}`.
pub fn write_frame<W: Write>(buf: &mut W, timestamp: Duration) -> std::io::Result<()> {
    write!(buf, "{{{}}}", duration_to_frame(timestamp))
}

/// Writes a clock-text timestamp, `HH:MM:SS,mmm`. Hours grow past two digits
/// when needed.
pub fn write_ts<W: Write>(buf: &mut W, timestamp: Duration) -> std::io::Result<()> {
    let total_secs = timestamp.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    let millis = timestamp.subsec_millis();
    write!(
        buf,
        "{:02}:{:02}:{:02},{:03}",
        hours, minutes, seconds, millis
    )
}

/// Parses a clock-text timestamp.
pub fn timestamp(input: &str) -> IResult<&str, Duration, VerboseError<&str>> {
    const MILLIS_MIN: usize = 0;
    const MILLIS_MAX: usize = 3;
    let take_millis = || {
        map_res(
            take_while_m_n(MILLIS_MIN, MILLIS_MAX, |c: char| c.is_ascii_digit()),
            move |s: &str| {
                if s.len() < MILLIS_MAX {
                    // `,2` is not valid SRT but shows up in the wild. Read it
                    // as `,200` by right-padding to three digits.
                    format!("{:0<3}", s).parse()
                } else {
                    s.parse()
                }
            },
        )
    };

    const MS_MIN: usize = 1;
    const MS_MAX: usize = 2;
    let take_ms = || {
        map_res(
            take_while_m_n(MS_MIN, MS_MAX, |c: char| c.is_ascii_digit()),
            |s: &str| s.parse::<u64>(),
        )
    };

    let (input, hours) = map_res(digit1, |s: &str| s.parse::<u64>())(input)?;
    let (input, _) = tag(":")(input)?;
    let (input, minutes) = take_ms()(input)?;
    let (input, _) = tag(":")(input)?;
    let (input, seconds) = take_ms()(input)?;
    let (input, _) = tag(",")(input)?;
    let (input, millis): (_, u64) = take_millis()(input)?;

    let total = hours
        .saturating_mul(MILLIS_PER_HOUR)
        .saturating_add(minutes * MILLIS_PER_MINUTE + seconds * 1000 + millis);

    Ok((input, Duration::from_millis(total)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    macro_rules! test_write_ts {
        ($($name:ident: $value:expr,)*) => {
        $(
            #[test]
            fn $name() {
                let (input, expected) = $value;

                let ts = Duration::from_millis(input);
                let mut buf = Cursor::new(vec![]);

                write_ts(&mut buf, ts).expect("Failed to write to buffer");

                assert_eq!(String::from_utf8(buf.into_inner()).unwrap(), expected);
            }
        )*
        }
    }

    test_write_ts! {
        test_write_ts_0: (0, "00:00:00,000"),
        test_write_ts_1: (1, "00:00:00,001"),
        test_write_ts_2: (999, "00:00:00,999"),
        test_write_ts_3: (1000, "00:00:01,000"),
        test_write_ts_4: (59_999, "00:00:59,999"),
        test_write_ts_5: (60_000, "00:01:00,000"),
        test_write_ts_6: (3_600_000, "01:00:00,000"),
        test_write_ts_7: (7_326_159, "02:02:06,159"),
        test_write_ts_8: (360_000_001, "100:00:00,001"),
    }

    macro_rules! test_read_ts {
        ($($name:ident: $value:expr,)*) => {
        $(
            #[test]
            fn $name() {
                let (input, expected) = $value;

                let (_, duration) = timestamp(input).unwrap();

                assert_eq!(duration.as_millis(), expected);
            }
        )*
        }
    }

    test_read_ts! {
        test_read_ts_0: ("00:00:01,200", 1200),
        test_read_ts_1: ("00:00:01,2", 1200),
        test_read_ts_2: ("00:00:01,002", 1002),
        test_read_ts_3: ("00:00:01,", 1000),
        test_read_ts_4: ("1:1:1,200", 3661200),
        test_read_ts_5: ("01:01:01,200", 3661200),
        test_read_ts_6: ("100:00:00,001", 360_000_001),
    }

    macro_rules! test_frame_to_duration {
        ($($name:ident: $value:expr,)*) => {
        $(
            #[test]
            fn $name() {
                let (frame, expected) = $value;

                assert_eq!(frame_to_duration(frame), Some(Duration::from_millis(expected)));
            }
        )*
        }
    }

    test_frame_to_duration! {
        test_frame_to_duration_0: (0, 0),
        test_frame_to_duration_1: (1, 41),
        test_frame_to_duration_24: (24, 1001),
        test_frame_to_duration_100: (100, 4170),
        test_frame_to_duration_150: (150, 6256),
        test_frame_to_duration_100k: (100_000, 4_170_833),
    }

    #[test]
    fn frame_round_trip_is_stable() {
        for frame in 0..=10_000_000u64 {
            let duration = frame_to_duration(frame).unwrap();
            assert_eq!(duration_to_frame(duration), frame, "frame {}", frame);
        }
    }

    #[test]
    fn encode_rounds_half_up() {
        // 1001 ms is exactly 24 frames; 20 ms is 0.4795 of a frame.
        assert_eq!(duration_to_frame(Duration::from_millis(1001)), 24);
        assert_eq!(duration_to_frame(Duration::from_millis(20)), 0);
        assert_eq!(duration_to_frame(Duration::from_millis(21)), 1);
    }

    #[test]
    fn oversized_frame_is_rejected() {
        assert_eq!(frame_to_duration(u64::MAX), None);
    }

    #[test]
    fn write_frame_wraps_in_braces() {
        let mut buf = Vec::new();
        write_frame(&mut buf, Duration::from_millis(4170)).unwrap();
        assert_eq!(buf, b"{100}");
    }
}
