//! Capture files: a sequence of received buffers with their envelope fields.
//!
//! Layout (little-endian):
//!
//! ```text
//! magic    "LGLC"
//! version  u32 (1)
//! records  { u16 channel_len, channel, i32 scene, i32 sequence, u32 data_len, data }*
//! ```
//!
//! There is no record count; the file ends after the last complete record.

use std::io::{self, Read, Write};

use lcmgl_render::Envelope;

pub const CAPTURE_MAGIC: [u8; 4] = *b"LGLC";
pub const CAPTURE_VERSION: u32 = 1;
pub const CAPTURE_HEADER_SIZE: usize = 8;

/// Upper bound on a single record's data, checked before allocating.
pub const DEFAULT_MAX_RECORD_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("not a capture file (bad magic)")]
    InvalidMagic,
    #[error("unsupported capture version {0}")]
    UnsupportedVersion(u32),
    #[error("record at offset {offset} is truncated")]
    Truncated { offset: u64 },
    #[error("record at offset {offset} holds {len} bytes, over the {limit} byte limit")]
    RecordTooLarge { offset: u64, len: u64, limit: usize },
    #[error("record at offset {offset} has a channel name that is not UTF-8")]
    InvalidChannel { offset: u64 },
    #[error("channel name is {0} bytes; at most 65535 fit in a record")]
    ChannelTooLong(usize),
}

pub struct CaptureWriter<W: Write> {
    inner: W,
    records: u64,
}

impl<W: Write> CaptureWriter<W> {
    pub fn new(mut inner: W) -> Result<Self, CaptureError> {
        inner.write_all(&CAPTURE_MAGIC)?;
        inner.write_all(&CAPTURE_VERSION.to_le_bytes())?;
        Ok(Self { inner, records: 0 })
    }

    pub fn write(&mut self, envelope: &Envelope) -> Result<(), CaptureError> {
        let channel = envelope.channel.as_bytes();
        let channel_len =
            u16::try_from(channel.len()).map_err(|_| CaptureError::ChannelTooLong(channel.len()))?;
        let data_len = u32::try_from(envelope.data.len()).map_err(|_| {
            CaptureError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "record data exceeds u32::MAX bytes",
            ))
        })?;

        self.inner.write_all(&channel_len.to_le_bytes())?;
        self.inner.write_all(channel)?;
        self.inner.write_all(&envelope.scene.to_le_bytes())?;
        self.inner.write_all(&envelope.sequence.to_le_bytes())?;
        self.inner.write_all(&data_len.to_le_bytes())?;
        self.inner.write_all(&envelope.data)?;
        self.records += 1;
        Ok(())
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    pub fn finish(mut self) -> Result<W, CaptureError> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

pub struct CaptureReader<R: Read> {
    inner: R,
    offset: u64,
    max_record_bytes: usize,
    done: bool,
}

impl<R: Read> CaptureReader<R> {
    /// Validate the header and position the reader at the first record.
    pub fn open(mut inner: R) -> Result<Self, CaptureError> {
        let mut header = [0u8; CAPTURE_HEADER_SIZE];
        if read_full(&mut inner, &mut header)? != header.len() {
            return Err(CaptureError::InvalidMagic);
        }
        if header[..4] != CAPTURE_MAGIC {
            return Err(CaptureError::InvalidMagic);
        }
        let version = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        if version != CAPTURE_VERSION {
            return Err(CaptureError::UnsupportedVersion(version));
        }
        Ok(Self {
            inner,
            offset: CAPTURE_HEADER_SIZE as u64,
            max_record_bytes: DEFAULT_MAX_RECORD_BYTES,
            done: false,
        })
    }

    pub fn with_max_record_bytes(mut self, limit: usize) -> Self {
        self.max_record_bytes = limit;
        self
    }

    /// Read the next record; `Ok(None)` at a clean end of file.
    pub fn next_record(&mut self) -> Result<Option<Envelope>, CaptureError> {
        let start = self.offset;
        let truncated = CaptureError::Truncated { offset: start };

        let mut len_bytes = [0u8; 2];
        match read_full(&mut self.inner, &mut len_bytes)? {
            0 => return Ok(None),
            2 => {}
            _ => return Err(truncated),
        }
        let channel_len = u16::from_le_bytes(len_bytes) as usize;

        let channel = self.read_vec(channel_len, start)?;
        let channel =
            String::from_utf8(channel).map_err(|_| CaptureError::InvalidChannel { offset: start })?;

        let mut fixed = [0u8; 12];
        if read_full(&mut self.inner, &mut fixed)? != fixed.len() {
            return Err(CaptureError::Truncated { offset: start });
        }
        let scene = i32::from_le_bytes([fixed[0], fixed[1], fixed[2], fixed[3]]);
        let sequence = i32::from_le_bytes([fixed[4], fixed[5], fixed[6], fixed[7]]);
        let data_len = u32::from_le_bytes([fixed[8], fixed[9], fixed[10], fixed[11]]);

        let data_len_usize = usize::try_from(data_len).unwrap_or(usize::MAX);
        if data_len_usize > self.max_record_bytes {
            return Err(CaptureError::RecordTooLarge {
                offset: start,
                len: u64::from(data_len),
                limit: self.max_record_bytes,
            });
        }
        let data = self.read_vec(data_len_usize, start)?;

        self.offset = start + 2 + channel_len as u64 + fixed.len() as u64 + u64::from(data_len);
        Ok(Some(Envelope {
            channel,
            scene,
            sequence,
            data,
        }))
    }

    fn read_vec(&mut self, len: usize, record_offset: u64) -> Result<Vec<u8>, CaptureError> {
        // `take` bounds the allocation by what the file actually holds.
        let mut out = Vec::new();
        (&mut self.inner).take(len as u64).read_to_end(&mut out)?;
        if out.len() != len {
            return Err(CaptureError::Truncated {
                offset: record_offset,
            });
        }
        Ok(out)
    }
}

impl<R: Read> Iterator for CaptureReader<R> {
    type Item = Result<Envelope, CaptureError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.next_record().transpose();
        // Stop after the first error; the stream position is unknown.
        if matches!(item, None | Some(Err(_))) {
            self.done = true;
        }
        item
    }
}

/// Like `read_exact`, but reports how many bytes were read before EOF.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(channel: &str, sequence: i32, data: &[u8]) -> Envelope {
        Envelope {
            channel: channel.into(),
            scene: 3,
            sequence,
            data: data.to_vec(),
        }
    }

    fn capture(envelopes: &[Envelope]) -> Vec<u8> {
        let mut w = CaptureWriter::new(Vec::new()).unwrap();
        for e in envelopes {
            w.write(e).unwrap();
        }
        w.finish().unwrap()
    }

    #[test]
    fn header_layout() {
        let bytes = capture(&[]);
        assert_eq!(bytes, b"LGLC\x01\x00\x00\x00");
        let mut r = CaptureReader::open(bytes.as_slice()).unwrap();
        assert!(r.next_record().unwrap().is_none());
    }

    #[test]
    fn records_read_back_in_order() {
        let input = vec![envelope("one", 0, b"\x00\x10"), envelope("two", 1, b"")];
        let bytes = capture(&input);
        let records: Vec<Envelope> = CaptureReader::open(bytes.as_slice())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(records, input);
    }

    #[test]
    fn partial_record_is_truncated() {
        let bytes = capture(&[envelope("ch", 0, b"abcdef")]);
        for cut in CAPTURE_HEADER_SIZE + 1..bytes.len() {
            let mut r = CaptureReader::open(&bytes[..cut]).unwrap();
            assert!(
                matches!(
                    r.next_record(),
                    Err(CaptureError::Truncated { offset: 8 })
                ),
                "cut at {cut}"
            );
        }
    }

    #[test]
    fn oversized_record_is_rejected_before_reading() {
        let bytes = capture(&[envelope("ch", 0, &[0u8; 32])]);
        let mut r = CaptureReader::open(bytes.as_slice())
            .unwrap()
            .with_max_record_bytes(16);
        assert!(matches!(
            r.next_record(),
            Err(CaptureError::RecordTooLarge {
                len: 32,
                limit: 16,
                ..
            })
        ));
    }

    #[test]
    fn bad_header_is_rejected() {
        assert!(matches!(
            CaptureReader::open(&b"LGL"[..]),
            Err(CaptureError::InvalidMagic)
        ));
        assert!(matches!(
            CaptureReader::open(&b"NOPE\x01\x00\x00\x00"[..]),
            Err(CaptureError::InvalidMagic)
        ));
        assert!(matches!(
            CaptureReader::open(&b"LGLC\x02\x00\x00\x00"[..]),
            Err(CaptureError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn iterator_stops_after_error() {
        let mut bytes = capture(&[envelope("ch", 0, b"x")]);
        bytes.push(0xFF);
        let mut r = CaptureReader::open(bytes.as_slice()).unwrap();
        assert!(r.next().unwrap().is_ok());
        assert!(r.next().unwrap().is_err());
        assert!(r.next().is_none());
    }
}
