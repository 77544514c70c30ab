//! Little-endian read/write primitives used by the asset encoders.

use crate::error::{AssetError, AssetResult};

#[derive(Debug, Default)]
pub(crate) struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn put_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_f32(&mut self, value: f32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes `len` as a u32 length/count field.
    pub fn put_len_u32(&mut self, len: usize, what: &'static str) -> AssetResult<()> {
        let value = u32::try_from(len).map_err(|_| AssetError::TooLarge { what, len })?;
        self.put_u32(value);
        Ok(())
    }

    /// Writes `len` as an int32 length/count field.
    pub fn put_len_i32(&mut self, len: usize, what: &'static str) -> AssetResult<()> {
        let value = i32::try_from(len).map_err(|_| AssetError::TooLarge { what, len })?;
        self.put_i32(value);
        Ok(())
    }

    /// int32 UTF-8 byte length followed by the bytes. No terminator.
    pub fn put_str(&mut self, value: &str) -> AssetResult<()> {
        self.put_len_i32(value.len(), "string length")?;
        self.put_bytes(value.as_bytes());
        Ok(())
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn take(&mut self, len: usize, what: &'static str) -> AssetResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(AssetError::Truncated {
                what,
                needed: len,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self, what: &'static str) -> AssetResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, what)?);
        Ok(out)
    }

    pub fn read_u32(&mut self, what: &'static str) -> AssetResult<u32> {
        self.take_array(what).map(u32::from_le_bytes)
    }

    pub fn read_i32(&mut self, what: &'static str) -> AssetResult<i32> {
        self.take_array(what).map(i32::from_le_bytes)
    }

    pub fn read_f32(&mut self, what: &'static str) -> AssetResult<f32> {
        self.take_array(what).map(f32::from_le_bytes)
    }

    /// Reads an int32 length field, rejecting negative values.
    pub fn read_len_i32(&mut self, what: &'static str) -> AssetResult<usize> {
        let value = self.read_i32(what)?;
        usize::try_from(value).map_err(|_| AssetError::NegativeLength { what, value })
    }

    pub fn read_str(&mut self) -> AssetResult<String> {
        let len = self.read_len_i32("string length")?;
        let bytes = self.take(len, "string bytes")?;
        String::from_utf8(bytes.to_vec()).map_err(AssetError::InvalidName)
    }

    /// Succeeds only if every byte has been consumed.
    pub fn finish(self) -> AssetResult<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(AssetError::TrailingBytes(n)),
        }
    }
}
