//! Bounds-checked big-endian reads over a borrowed buffer.

use crate::opcode::{OpcodeDescriptor, PayloadShape};

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ReadError {
    #[error("need {needed} bytes at offset {offset}, only {remaining} remaining")]
    Truncated {
        offset: usize,
        needed: usize,
        remaining: usize,
    },
    #[error("no NUL terminator after offset {offset}")]
    Unterminated { offset: usize },
}

/// A cursor over a fixed-length byte buffer.
///
/// Every read either consumes exactly the bytes it returns or fails and leaves
/// the position where it was.
#[derive(Clone, Debug)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// True once every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos == self.buf.len()
    }

    /// Borrow the next `n` bytes and advance past them.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], ReadError> {
        let truncated = ReadError::Truncated {
            offset: self.pos,
            needed: n,
            remaining: self.remaining(),
        };
        let end = self.pos.checked_add(n).ok_or(truncated)?;
        let bytes = self.buf.get(self.pos..end).ok_or(truncated)?;
        self.pos = end;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], ReadError> {
        let bytes = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, ReadError> {
        Ok(self.take_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, ReadError> {
        self.take_array().map(u16::from_be_bytes)
    }

    pub fn read_u32(&mut self) -> Result<u32, ReadError> {
        self.take_array().map(u32::from_be_bytes)
    }

    pub fn read_u64(&mut self) -> Result<u64, ReadError> {
        self.take_array().map(u64::from_be_bytes)
    }

    pub fn read_i32(&mut self) -> Result<i32, ReadError> {
        self.take_array().map(i32::from_be_bytes)
    }

    pub fn read_i64(&mut self) -> Result<i64, ReadError> {
        self.take_array().map(i64::from_be_bytes)
    }

    pub fn read_f32(&mut self) -> Result<f32, ReadError> {
        self.read_u32().map(f32::from_bits)
    }

    pub fn read_f64(&mut self) -> Result<f64, ReadError> {
        self.read_u64().map(f64::from_bits)
    }

    pub fn read_vec3f(&mut self) -> Result<[f32; 3], ReadError> {
        Ok([self.read_f32()?, self.read_f32()?, self.read_f32()?])
    }

    pub fn read_vec3d(&mut self) -> Result<[f64; 3], ReadError> {
        Ok([self.read_f64()?, self.read_f64()?, self.read_f64()?])
    }

    /// Read a `u32` length followed by that many bytes.
    ///
    /// The length is checked against the remaining buffer before anything is
    /// sliced; on failure the length prefix is not consumed either.
    pub fn read_blob(&mut self) -> Result<&'a [u8], ReadError> {
        let start = self.pos;
        let len = self.read_u32()?;
        let blob = usize::try_from(len)
            .map_err(|_| ReadError::Truncated {
                offset: self.pos,
                needed: usize::MAX,
                remaining: self.remaining(),
            })
            .and_then(|len| self.take(len));
        if blob.is_err() {
            self.pos = start;
        }
        blob
    }

    /// Read bytes up to a NUL. The NUL is consumed but not returned.
    pub fn read_terminated(&mut self) -> Result<&'a [u8], ReadError> {
        let rest = &self.buf[self.pos..];
        let Some(nul) = rest.iter().position(|&b| b == 0) else {
            return Err(ReadError::Unterminated { offset: self.pos });
        };
        let bytes = &rest[..nul];
        self.pos += nul + 1;
        Ok(bytes)
    }
}

/// The raw bytes of one record, split according to its payload shape.
#[derive(Clone, Copy, Debug)]
pub struct Record<'a> {
    pub descriptor: &'static OpcodeDescriptor,
    /// Offset of the opcode tag in the buffer.
    pub offset: usize,
    /// The fixed-size operands (the whole payload for `FixedSize` opcodes).
    pub fixed: &'a [u8],
    /// The blob or terminated string, without its length prefix or NUL.
    pub tail: &'a [u8],
}

/// Read the payload of a record whose tag has already been consumed.
///
/// `offset` is the position of the tag. On error the reader is left where it
/// was when this was called.
pub fn read_record<'a>(
    reader: &mut ByteReader<'a>,
    descriptor: &'static OpcodeDescriptor,
    offset: usize,
) -> Result<Record<'a>, ReadError> {
    let mut r = reader.clone();
    let (fixed, tail) = match descriptor.shape {
        PayloadShape::FixedSize(n) => (r.take(n)?, &[][..]),
        PayloadShape::LengthPrefixed { header } => {
            let fixed = r.take(header)?;
            (fixed, r.read_blob()?)
        }
        PayloadShape::Terminated { header } => {
            let fixed = r.take(header)?;
            (fixed, r.read_terminated()?)
        }
    };
    *reader = r;
    Ok(Record {
        descriptor,
        offset,
        fixed,
        tail,
    })
}
