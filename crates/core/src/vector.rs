//! Fixed-dimension float vectors and their codecs
//!
//! ## Text form
//!
//! ```text
//! [0.100000, 0.200000, 0.300000]
//! ```
//!
//! Components are separated by commas; whitespace around tokens is ignored.
//! The dimension is inferred from the number of separators, so `[]` and
//! `[1.0,]` are rejected with [`ParseError::InvalidToken`].
//!
//! ## Binary form
//!
//! ```text
//! [dim: u32 LE][dim × f32 LE]
//! ```
//!
//! No padding. The same layout is embedded at the start of every record frame
//! in the record log.
//!
//! The codec is dimension-agnostic: callers compare [`Vector::dim`] against the
//! dimension of the index they target.

use crate::error::{DecodeError, HippoError, HippoResult, ParseError};
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Size of the binary dimension header in bytes
pub const VECTOR_HEADER_SIZE: usize = 4;

/// Decimal digits used by the text form
pub const FORMAT_PRECISION: usize = 6;

/// An owned, ordered sequence of `f32` components
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vector(Vec<f32>);

impl Vector {
    /// Wrap raw components
    pub fn new(components: Vec<f32>) -> Self {
        Vector(components)
    }

    /// Number of components
    pub fn dim(&self) -> usize {
        self.0.len()
    }

    /// Borrow the components
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Take the components
    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }

    /// Reject NaN or infinite components
    pub fn validate_finite(&self) -> HippoResult<()> {
        if let Some(pos) = self.0.iter().position(|v| !v.is_finite()) {
            return Err(HippoError::InvalidVector {
                reason: format!("component {} is {}", pos, self.0[pos]),
            });
        }
        Ok(())
    }

    /// Parse the bracketed textual form
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let inner = text
            .trim()
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or(ParseError::Unbracketed)?;

        let mut components = Vec::new();
        for (position, raw) in inner.split(',').enumerate() {
            let token = raw.trim();
            let value = token
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| ParseError::InvalidToken {
                    position,
                    token: token.to_string(),
                })?;
            components.push(value);
        }
        Ok(Vector(components))
    }

    /// Render the bracketed textual form with fixed precision
    pub fn format(&self) -> String {
        self.to_string()
    }

    /// Number of bytes produced by [`Vector::encode`]
    pub fn encoded_len(&self) -> usize {
        VECTOR_HEADER_SIZE + self.0.len() * 4
    }

    /// Append the binary form to `buf`
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.reserve(self.encoded_len());
        // Writes into a Vec cannot fail
        let _ = buf.write_u32::<LittleEndian>(self.0.len() as u32);
        for &value in &self.0 {
            let _ = buf.write_f32::<LittleEndian>(value);
        }
    }

    /// Encode to the binary form
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut buf);
        buf
    }

    /// Decode a buffer that holds exactly one binary vector
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let (vector, consumed) = Self::decode_prefix(bytes)?;
        if consumed != bytes.len() {
            return Err(DecodeError::TrailingBytes {
                extra: bytes.len() - consumed,
            });
        }
        Ok(vector)
    }

    /// Decode a binary vector at the start of `bytes`
    ///
    /// Returns the vector and the number of bytes consumed.
    pub fn decode_prefix(bytes: &[u8]) -> Result<(Self, usize), DecodeError> {
        if bytes.len() < VECTOR_HEADER_SIZE {
            return Err(DecodeError::Truncated {
                declared: VECTOR_HEADER_SIZE,
                available: bytes.len(),
            });
        }
        let dim = LittleEndian::read_u32(&bytes[..VECTOR_HEADER_SIZE]);
        if dim == 0 {
            return Err(DecodeError::InvalidDimension { dim });
        }

        let declared = VECTOR_HEADER_SIZE + dim as usize * 4;
        if bytes.len() < declared {
            return Err(DecodeError::Truncated {
                declared,
                available: bytes.len(),
            });
        }

        let mut components = vec![0.0f32; dim as usize];
        LittleEndian::read_f32_into(&bytes[VECTOR_HEADER_SIZE..declared], &mut components);
        Ok((Vector(components), declared))
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{:.*}", FORMAT_PRECISION, value)?;
        }
        f.write_str("]")
    }
}

impl std::str::FromStr for Vector {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Vector::parse(s)
    }
}

impl From<Vec<f32>> for Vector {
    fn from(components: Vec<f32>) -> Self {
        Vector(components)
    }
}

impl From<&[f32]> for Vector {
    fn from(components: &[f32]) -> Self {
        Vector(components.to_vec())
    }
}

impl AsRef<[f32]> for Vector {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}
