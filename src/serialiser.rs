use crate::error::WriteError;
use crate::subtitle::{FileFormat, Subtitle};
use crate::timing::{write_frame, write_ts};

use std::io::Write;

/// Writes subtitles to a destination in one output format, numbering them as
/// it goes.
pub struct Serialiser<W> {
    writer: W,
    format: FileFormat,
    seqnum: usize,
}

impl<W: Write> Serialiser<W> {
    pub fn new(writer: W, format: FileFormat) -> Self {
        Self {
            writer,
            format,
            seqnum: 1,
        }
    }

    /// Number of subtitles written so far.
    pub fn emitted(&self) -> usize {
        self.seqnum - 1
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Writes one subtitle. The sequence number only advances when the whole
    /// subtitle was written.
    pub fn write(&mut self, sub: &Subtitle) -> Result<(), WriteError> {
        match self.format {
            FileFormat::Srt => write_srt(&mut self.writer, sub, self.seqnum)?,
            FileFormat::Txt => write_txt(&mut self.writer, sub)?,
            FileFormat::Unknown => return Err(WriteError::UnsupportedFormat(self.format)),
        }
        self.seqnum += 1;
        Ok(())
    }
}

fn write_srt<W: Write>(buf: &mut W, sub: &Subtitle, seqnum: usize) -> std::io::Result<()> {
    writeln!(buf, "{}", seqnum)?;
    write_ts(buf, sub.start)?;
    write!(buf, " --> ")?;
    write_ts(buf, sub.end)?;
    writeln!(buf)?;
    for line in &sub.text {
        writeln!(buf, "{}", line)?;
    }
    writeln!(buf)?;
    Ok(())
}

fn write_txt<W: Write>(buf: &mut W, sub: &Subtitle) -> std::io::Result<()> {
    write_frame(buf, sub.start)?;
    write_frame(buf, sub.end)?;
    writeln!(buf, "{}", sub.text.join("|"))?;
    Ok(())
}
