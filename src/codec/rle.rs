//! Run-length codec for delta frames.
//!
//! Each run is one key byte followed by a payload. The key's high bit selects
//! the mode and its low 7 bits hold the count (1..=127):
//!
//! ```text
//! 0ccccccc vvvvvvvv            repeat: `c` copies of `v`
//! 1ccccccc b1 b2 .. bc         literal: `c` bytes copied verbatim
//! ```
//!
//! The encoder is a greedy single-pass heuristic. Its exact choices define the
//! byte format, so it must not be "optimised".

use std::io::{self, Read, Write};

/// Key bit marking a literal run.
pub const LITERAL_FLAG: u8 = 0x80;

/// Longest run a single key can describe.
pub const MAX_RUN: usize = 0x7f;

/// Errors raised while decoding a run-length stream.
#[derive(Debug, thiserror::Error)]
pub enum RleError {
    #[error("Stream ended with {remaining} of {expected} bytes still undecoded")]
    Truncated { expected: usize, remaining: usize },
    #[error("Run of {count} bytes overruns the {remaining} bytes left in the frame")]
    Overrun { count: usize, remaining: usize },
    #[error("Zero-length run at decoded offset {offset}")]
    EmptyRun { offset: usize },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// One unit of the run-length encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Run<'a> {
    /// `count` copies of `value`.
    Repeat { count: u8, value: u8 },
    /// Bytes copied verbatim.
    Literal(&'a [u8]),
}

impl Run<'_> {
    /// Number of decoded bytes this run produces.
    pub fn len(&self) -> usize {
        match self {
            Run::Repeat { count, .. } => *count as usize,
            Run::Literal(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The key byte that introduces this run.
    pub fn key(&self) -> u8 {
        match self {
            Run::Repeat { count, .. } => *count,
            Run::Literal(bytes) => LITERAL_FLAG | bytes.len() as u8,
        }
    }

    /// Size of the encoded run including its key.
    pub fn encoded_len(&self) -> usize {
        match self {
            Run::Repeat { .. } => 2,
            Run::Literal(bytes) => 1 + bytes.len(),
        }
    }

    /// Write the key and payload.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&[self.key()])?;
        match self {
            Run::Repeat { value, .. } => w.write_all(&[*value]),
            Run::Literal(bytes) => w.write_all(bytes),
        }
    }
}

/// Length of the repeat run starting at `offset`, capped at [`MAX_RUN`].
fn repeat_len(data: &[u8], offset: usize) -> usize {
    let value = data[offset];
    let count = 3 + data[offset + 3..]
        .iter()
        .take_while(|&&b| b == value)
        .count();
    count.min(MAX_RUN)
}

/// Length of the literal run starting at `offset`, capped at [`MAX_RUN`].
///
/// Scanning stops one byte early when the last literal byte and the next two
/// are equal, so that the following repeat run starts on that byte.
fn literal_len(data: &[u8], offset: usize) -> usize {
    let mut count = 3;
    let mut last = data[offset + 2];
    let mut i = offset + 3;
    while i < data.len() {
        if data[i] == last && data.get(i + 1) == Some(&last) {
            count -= 1;
            break;
        }
        count += 1;
        last = data[i];
        i += 1;
    }
    count.min(MAX_RUN)
}

/// Split `data` into runs.
pub fn encode(data: &[u8]) -> Vec<Run<'_>> {
    let mut runs = Vec::new();
    let mut offset = 0;

    while offset < data.len() {
        let remaining = data.len() - offset;
        if remaining <= 2 {
            runs.push(Run::Literal(&data[offset..]));
            break;
        }

        let value = data[offset];
        if data[offset + 1] == value && data[offset + 2] == value {
            let count = repeat_len(data, offset);
            runs.push(Run::Repeat {
                count: count as u8,
                value,
            });
            offset += count;
        } else {
            let count = literal_len(data, offset);
            runs.push(Run::Literal(&data[offset..offset + count]));
            offset += count;
        }
    }

    runs
}

/// Encode `data` and write the runs, returning the number of bytes written.
pub fn encode_to<W: Write>(data: &[u8], w: &mut W) -> io::Result<usize> {
    let mut written = 0;
    for run in encode(data) {
        run.write_to(w)?;
        written += run.encoded_len();
    }
    Ok(written)
}

/// Encode `data` into a new buffer.
pub fn encode_to_vec(data: &[u8]) -> Vec<u8> {
    let runs = encode(data);
    let mut out = Vec::with_capacity(runs.iter().map(Run::encoded_len).sum());
    for run in &runs {
        out.push(run.key());
        match run {
            Run::Repeat { value, .. } => out.push(*value),
            Run::Literal(bytes) => out.extend_from_slice(bytes),
        }
    }
    out
}

fn read_or_truncated<R: Read>(
    r: &mut R,
    buf: &mut [u8],
    expected: usize,
    remaining: usize,
) -> Result<(), RleError> {
    r.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => RleError::Truncated {
            expected,
            remaining,
        },
        _ => RleError::Io(e),
    })
}

/// Decode runs from `r` until exactly `dst.len()` bytes have been produced.
///
/// Reads no further than the last run of this frame, so consecutive frames can
/// be decoded from the same stream.
pub fn decode<R: Read>(r: &mut R, dst: &mut [u8]) -> Result<(), RleError> {
    let expected = dst.len();
    let mut offset = 0;

    while offset < expected {
        let remaining = expected - offset;
        let mut key = [0u8; 1];
        read_or_truncated(r, &mut key, expected, remaining)?;

        let count = (key[0] & 0x7f) as usize;
        if count == 0 {
            return Err(RleError::EmptyRun { offset });
        }
        if count > remaining {
            return Err(RleError::Overrun { count, remaining });
        }

        let out = &mut dst[offset..offset + count];
        if key[0] & LITERAL_FLAG != 0 {
            read_or_truncated(r, out, expected, remaining)?;
        } else {
            let mut value = [0u8; 1];
            read_or_truncated(r, &mut value, expected, remaining)?;
            out.fill(value[0]);
        }
        offset += count;
    }

    Ok(())
}

/// Decode `expected` bytes into a new buffer.
pub fn decode_to_vec<R: Read>(r: &mut R, expected: usize) -> Result<Vec<u8>, RleError> {
    let mut out = vec![0u8; expected];
    decode(r, &mut out)?;
    Ok(out)
}
