//! Var-int and var-bytes primitives shared by the serializer and deserializer.

use crate::serialization::errors::{DeserializeError, FormatError};

/// Appends `value` in compact var-int form.
pub(super) fn write_var_int(out: &mut Vec<u8>, value: u64) {
    if value < 0xFD {
        out.push(value as u8);
    } else if value <= 0xFFFF {
        out.push(0xFD);
        out.extend_from_slice(&(value as u16).to_le_bytes());
    } else if value <= 0xFFFF_FFFF {
        out.push(0xFE);
        out.extend_from_slice(&(value as u32).to_le_bytes());
    } else {
        out.push(0xFF);
        out.extend_from_slice(&value.to_le_bytes());
    }
}

/// Appends a var-int length followed by the raw bytes.
pub(super) fn write_var_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    write_var_int(out, bytes.len() as u64);
    out.extend_from_slice(bytes);
}

/// Cursor over untrusted input. Every read is bounds-checked.
pub(super) struct WireReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> WireReader<'a> {
    pub(super) fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    pub(super) fn offset(&self) -> usize {
        self.offset
    }

    /// Number of unread bytes.
    pub(super) fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Reads exactly `n` bytes, advancing past them.
    pub(super) fn read_exact(&mut self, n: usize) -> Result<&'a [u8], FormatError> {
        if self.remaining() < n {
            return Err(FormatError::UnexpectedEof {
                offset: self.data.len(),
            });
        }
        let bytes = &self.data[self.offset..self.offset + n];
        self.offset += n;
        Ok(bytes)
    }

    pub(super) fn read_u8(&mut self) -> Result<u8, FormatError> {
        Ok(self.read_exact(1)?[0])
    }

    /// Reads a canonical var-int and checks it against `max`.
    pub(super) fn read_var_int(
        &mut self,
        max: u64,
        what: &'static str,
    ) -> Result<u64, DeserializeError> {
        let start = self.offset;
        let prefix = self.read_u8()?;
        let (value, min) = match prefix {
            0xFD => (u64::from(u16::from_le_bytes(self.read_array()?)), 0xFD),
            0xFE => (u64::from(u32::from_le_bytes(self.read_array()?)), 0x1_0000),
            0xFF => (u64::from_le_bytes(self.read_array()?), 0x1_0000_0000),
            small => (u64::from(small), 0),
        };
        if value < min {
            return Err(FormatError::NonCanonicalVarInt { offset: start }.into());
        }
        if value > max {
            return Err(DeserializeError::LimitExceeded {
                what,
                limit: max,
                actual: value,
            });
        }
        Ok(value)
    }

    /// Reads a var-int length (at most `max`) followed by that many bytes.
    ///
    /// The length is validated against both `max` and the remaining input before
    /// anything is copied.
    pub(super) fn read_var_bytes(&mut self, max: usize) -> Result<&'a [u8], DeserializeError> {
        let len = self.read_var_int(max as u64, "byte array length")?;
        // `len <= max`, which fits in usize.
        Ok(self.read_exact(len as usize)?)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], FormatError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_exact(N)?);
        Ok(out)
    }
}
