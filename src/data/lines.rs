// lines.rs - Line reader accepting CR, LF, CRLF and LFCR line endings

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

/// Bytes inspected when detecting the line ending of a file
pub const LINE_ENDING_SAMPLE_BYTES: usize = 100_000;

/// Line terminator convention of a text file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
    Cr,
    LfCr,
}

impl LineEnding {
    /// Detect the convention from the first terminator found in `sample`
    pub fn detect(sample: &[u8]) -> Option<Self> {
        let position = sample.iter().position(|&b| b == b'\n' || b == b'\r')?;
        let next = sample.get(position + 1).copied();
        Some(match (sample[position], next) {
            (b'\r', Some(b'\n')) => LineEnding::CrLf,
            (b'\n', Some(b'\r')) => LineEnding::LfCr,
            (b'\r', _) => LineEnding::Cr,
            _ => LineEnding::Lf,
        })
    }

    /// Detect the convention of a file from its first bytes (LF when no terminator is found)
    pub fn detect_in_file(path: &Path) -> std::io::Result<Self> {
        let mut sample = Vec::with_capacity(LINE_ENDING_SAMPLE_BYTES);
        File::open(path)?
            .take(LINE_ENDING_SAMPLE_BYTES as u64)
            .read_to_end(&mut sample)?;
        Ok(Self::detect(&sample).unwrap_or_default())
    }

    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            LineEnding::Lf => b"\n",
            LineEnding::CrLf => b"\r\n",
            LineEnding::Cr => b"\r",
            LineEnding::LfCr => b"\n\r",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
            LineEnding::Cr => "\r",
            LineEnding::LfCr => "\n\r",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LineEnding::Lf => "LF",
            LineEnding::CrLf => "CRLF",
            LineEnding::Cr => "CR",
            LineEnding::LfCr => "LFCR",
        }
    }
}

/// What the reader found for one line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineInfo {
    /// Full length of the line in bytes, including bytes dropped past the cap
    pub length: usize,
    /// The line was longer than the cap; the buffer holds only its beginning
    pub truncated: bool,
    /// The line ended with a terminator (false only for the last line of a file)
    pub terminated: bool,
}

/// Streaming line reader with a per-line memory cap
///
/// A terminator is any of `\n`, `\r`, `\r\n` or `\n\r`; a two-byte pair is
/// consumed as a single terminator. Bytes past `max_line_length` are consumed
/// but not stored.
pub struct LineReader<R> {
    inner: R,
    max_line_length: usize,
    bytes_consumed: u64,
    pending_pair: Option<u8>,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R, max_line_length: usize) -> Self {
        Self {
            inner,
            max_line_length,
            bytes_consumed: 0,
            pending_pair: None,
        }
    }

    /// Bytes consumed from the underlying reader so far
    pub fn bytes_consumed(&self) -> u64 {
        self.bytes_consumed
    }

    /// Read the next line into `buf` (cleared first); `None` at end of input
    pub fn read_line(&mut self, buf: &mut Vec<u8>) -> std::io::Result<Option<LineInfo>> {
        buf.clear();
        let mut length = 0usize;
        let mut any = false;

        loop {
            let available = self.inner.fill_buf()?;
            if available.is_empty() {
                self.pending_pair = None;
                return Ok(if any {
                    Some(LineInfo {
                        length,
                        truncated: length > self.max_line_length,
                        terminated: false,
                    })
                } else {
                    None
                });
            }

            // Second byte of a CRLF / LFCR pair left over from the previous line
            if let Some(pair) = self.pending_pair.take() {
                if available[0] == pair {
                    self.inner.consume(1);
                    self.bytes_consumed += 1;
                    continue;
                }
            }

            any = true;
            match available.iter().position(|&b| b == b'\n' || b == b'\r') {
                Some(end) => {
                    let terminator = available[end];
                    store_capped(buf, &available[..end], length, self.max_line_length);
                    length += end;
                    self.inner.consume(end + 1);
                    self.bytes_consumed += end as u64 + 1;
                    self.pending_pair = Some(if terminator == b'\r' { b'\n' } else { b'\r' });
                    return Ok(Some(LineInfo {
                        length,
                        truncated: length > self.max_line_length,
                        terminated: true,
                    }));
                }
                None => {
                    let chunk = available.len();
                    store_capped(buf, available, length, self.max_line_length);
                    length += chunk;
                    self.inner.consume(chunk);
                    self.bytes_consumed += chunk as u64;
                }
            }
        }
    }
}

fn store_capped(buf: &mut Vec<u8>, bytes: &[u8], already: usize, cap: usize) {
    if already < cap {
        let room = cap - already;
        buf.extend_from_slice(&bytes[..bytes.len().min(room)]);
    }
}

/// Copy `input` to `output` rewriting every line ending as CRLF
pub fn normalize_to_crlf(input: &Path, output: &Path) -> std::io::Result<usize> {
    let reader = BufReader::new(File::open(input)?);
    let mut writer = std::io::BufWriter::new(File::create(output)?);
    let mut lines = LineReader::new(reader, usize::MAX);
    let mut buf = Vec::new();
    let mut count = 0;

    while let Some(info) = lines.read_line(&mut buf)? {
        writer.write_all(&buf)?;
        if info.terminated {
            writer.write_all(b"\r\n")?;
        }
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}
