//! Reading and writing whole files of fixed-width records.
//!
//! One record per line, lines terminated by `\n`. On input a trailing `\r`
//! is dropped as well, so files written on either convention read back the
//! same. Bytes are mapped to text with a caller-selected [`TextEncoding`];
//! under UTF-8 a byte-order mark at the start of the input is skipped.
//!
//! ```
//! use fixed_width_rs::models::EmployeeRecord;
//! use fixed_width_rs::stream::{StreamOptions, from_bytes, to_bytes};
//!
//! let employees = vec![EmployeeRecord::default()];
//! let bytes = to_bytes(&employees, &StreamOptions::default()).unwrap();
//! let back: Vec<EmployeeRecord> = from_bytes(&bytes, &StreamOptions::default()).unwrap();
//! assert_eq!(back.len(), 1);
//! ```

use crate::codec::{CodecOptions, LineCodec};
use crate::error::{FixedWidthError, Result};
use crate::schema::FixedRecord;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// Mapping between file bytes and line text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    /// ISO-8859-1: every byte is one character, so any byte sequence reads.
    Latin1,
}

impl TextEncoding {
    /// Append the encoded form of `text` to `out`.
    pub fn encode(self, text: &str, out: &mut Vec<u8>) -> io::Result<()> {
        match self {
            TextEncoding::Utf8 => out.extend_from_slice(text.as_bytes()),
            TextEncoding::Latin1 => {
                for c in text.chars() {
                    let byte = u8::try_from(u32::from(c)).map_err(|_| {
                        io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!("character {c:?} cannot be written as Latin-1"),
                        )
                    })?;
                    out.push(byte);
                }
            }
        }
        Ok(())
    }

    pub fn decode(self, bytes: &[u8]) -> io::Result<String> {
        match self {
            TextEncoding::Utf8 => String::from_utf8(bytes.to_vec())
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
            TextEncoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }
}

impl FromStr for TextEncoding {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(TextEncoding::Utf8),
            "latin1" | "latin-1" | "iso-8859-1" => Ok(TextEncoding::Latin1),
            other => Err(format!("unknown encoding '{other}' (try utf-8 or latin-1)")),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Latin1 => "latin-1",
        })
    }
}

/// Settings for bulk reads and writes.
#[derive(Debug, Clone, Default)]
pub struct StreamOptions {
    pub encoding: TextEncoding,
    pub codec: CodecOptions,
    /// Checked before each line; once set, the operation stops with
    /// [`FixedWidthError::Cancelled`].
    pub cancel: Option<Arc<AtomicBool>>,
}

impl StreamOptions {
    pub fn encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn codec(mut self, codec: CodecOptions) -> Self {
        self.codec = codec;
        self
    }

    pub fn cancel_on(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Writes records to a byte sink, one line each.
pub struct RecordWriter<R, W: Write> {
    codec: LineCodec<R>,
    sink: W,
    options: StreamOptions,
    buf: Vec<u8>,
    lines: usize,
}

impl<R: FixedRecord, W: Write> RecordWriter<R, W> {
    pub fn new(sink: W, options: &StreamOptions) -> Result<Self> {
        Ok(Self {
            codec: LineCodec::with_options(options.codec)?,
            sink,
            options: options.clone(),
            buf: Vec::new(),
            lines: 0,
        })
    }

    /// Encode and write one record, then flush the sink.
    pub fn write(&mut self, record: &R) -> Result<()> {
        if self.options.cancelled() {
            return Err(FixedWidthError::Cancelled { lines: self.lines });
        }
        let line = self.codec.encode_record(record)?;
        self.buf.clear();
        self.options.encoding.encode(&line, &mut self.buf)?;
        self.buf.push(b'\n');
        self.sink.write_all(&self.buf)?;
        self.sink.flush()?;
        self.lines += 1;
        Ok(())
    }

    pub fn lines_written(&self) -> usize {
        self.lines
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

/// Lazily decodes one record per line of a buffered source.
pub struct RecordReader<R, B: BufRead> {
    codec: LineCodec<R>,
    source: B,
    options: StreamOptions,
    buf: Vec<u8>,
    lines: usize,
    done: bool,
}

impl<R: FixedRecord, B: BufRead> RecordReader<R, B> {
    pub fn new(source: B, options: &StreamOptions) -> Result<Self> {
        Ok(Self {
            codec: LineCodec::with_options(options.codec)?,
            source,
            options: options.clone(),
            buf: Vec::new(),
            lines: 0,
            done: false,
        })
    }

    pub fn lines_read(&self) -> usize {
        self.lines
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        self.buf.clear();
        if self.source.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }
        let mut bytes = self.buf.as_slice();
        if self.lines == 0 && self.options.encoding == TextEncoding::Utf8 {
            bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        }
        Ok(Some(self.options.encoding.decode(bytes)?))
    }
}

impl<R: FixedRecord, B: BufRead> Iterator for RecordReader<R, B> {
    type Item = Result<R>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.options.cancelled() {
            self.done = true;
            return Some(Err(FixedWidthError::Cancelled { lines: self.lines }));
        }
        let line = match self.next_line() {
            Ok(Some(line)) => line,
            Ok(None) => {
                self.done = true;
                return None;
            }
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };
        self.lines += 1;
        Some(self.codec.decode_line(&line))
    }
}

/// Write every record to `sink`. Returns the number of lines written.
pub fn write_all<'a, R, W, I>(sink: W, records: I, options: &StreamOptions) -> Result<usize>
where
    R: FixedRecord,
    W: Write,
    I: IntoIterator<Item = &'a R>,
{
    let mut writer = RecordWriter::new(sink, options)?;
    for record in records {
        writer.write(record)?;
    }
    debug!(lines = writer.lines_written(), encoding = %options.encoding, "wrote fixed-width records");
    Ok(writer.lines_written())
}

/// Read one record per line until the end of `source`.
pub fn read_all<R, B>(source: B, options: &StreamOptions) -> Result<Vec<R>>
where
    R: FixedRecord,
    B: BufRead,
{
    let records = RecordReader::new(source, options)?.collect::<Result<Vec<R>>>()?;
    debug!(lines = records.len(), encoding = %options.encoding, "read fixed-width records");
    Ok(records)
}

pub fn write_file<'a, R, P, I>(path: P, records: I, options: &StreamOptions) -> Result<usize>
where
    R: FixedRecord,
    P: AsRef<Path>,
    I: IntoIterator<Item = &'a R>,
{
    let file = File::create(path)?;
    write_all(BufWriter::new(file), records, options)
}

pub fn read_file<R, P>(path: P, options: &StreamOptions) -> Result<Vec<R>>
where
    R: FixedRecord,
    P: AsRef<Path>,
{
    let file = File::open(path)?;
    read_all(BufReader::new(file), options)
}

/// Decode every line of `source` and write it back to `sink`, so each
/// record comes out with its columns' canonical padding.
pub fn reformat<R, B, W>(source: B, sink: W, options: &StreamOptions) -> Result<usize>
where
    R: FixedRecord,
    B: BufRead,
    W: Write,
{
    let reader = RecordReader::<R, B>::new(source, options)?;
    let mut writer = RecordWriter::<R, W>::new(sink, options)?;
    for record in reader {
        writer.write(&record?)?;
    }
    debug!(lines = writer.lines_written(), "reformatted fixed-width records");
    Ok(writer.lines_written())
}

/// Encode records into an in-memory file body, e.g. for a download response.
pub fn to_bytes<'a, R, I>(records: I, options: &StreamOptions) -> Result<Vec<u8>>
where
    R: FixedRecord,
    I: IntoIterator<Item = &'a R>,
{
    let mut out = Vec::new();
    write_all(&mut out, records, options)?;
    Ok(out)
}

pub fn from_bytes<R: FixedRecord>(bytes: &[u8], options: &StreamOptions) -> Result<Vec<R>> {
    read_all(bytes, options)
}
