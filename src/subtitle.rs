use std::fmt;
use std::path::Path;
use std::time::Duration;

use clap::ValueEnum;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtitle {
    pub(crate) start: Duration,
    pub(crate) end: Duration,
    pub(crate) text: Vec<String>,
}

/// On-disk subtitle encodings. Selected once per direction and fixed for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FileFormat {
    #[value(skip)]
    Unknown,
    /// MicroDVD style `{start}{end}line|line`, timed in frames.
    Txt,
    /// SubRip blocks timed as `HH:MM:SS,mmm`.
    Srt,
}

impl FileFormat {
    /// Infers the format from a path's extension. Paths without an extension
    /// (including `-`) yield `None` so the caller can apply its default.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<FileFormat> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        let format = match ext.as_str() {
            "txt" | "sub" => FileFormat::Txt,
            "srt" => FileFormat::Srt,
            _ => FileFormat::Unknown,
        };
        Some(format)
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FileFormat::Unknown => write!(fmt, "unknown"),
            FileFormat::Txt => write!(fmt, "txt"),
            FileFormat::Srt => write!(fmt, "srt"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_from_path {
        ($($name:ident: $value:expr,)*) => {
        $(
            #[test]
            fn $name() {
                let (input, expected) = $value;

                assert_eq!(FileFormat::from_path(input), expected);
            }
        )*
        }
    }

    test_from_path! {
        test_from_path_txt: ("movie.txt", Some(FileFormat::Txt)),
        test_from_path_sub: ("movie.sub", Some(FileFormat::Txt)),
        test_from_path_srt: ("dir/movie.srt", Some(FileFormat::Srt)),
        test_from_path_upper: ("MOVIE.SRT", Some(FileFormat::Srt)),
        test_from_path_vtt: ("movie.vtt", Some(FileFormat::Unknown)),
        test_from_path_stdio: ("-", None),
        test_from_path_bare: ("movie", None),
    }
}
