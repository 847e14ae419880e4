//! Record frame format
//!
//! One frame per record, appended back to back with no file header:
//!
//! ```text
//! ┌───────────────┬──────────────┬───────────────┬─────────────┬──────────────┬──────────────┐
//! │ dim: u32 LE   │ dim × f32 LE │ value_len u32 │ value bytes │ meta_len u32 │ meta (JSON)  │
//! └───────────────┴──────────────┴───────────────┴─────────────┴──────────────┴──────────────┘
//! ```
//!
//! The leading `dim` + components are exactly the binary vector form.
//! `meta_len == 0` means the record has no metadata; otherwise the bytes are
//! a UTF-8 JSON object.
//!
//! Record ids are not stored: a record's id is its ordinal position in the log.

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use hippocampus_core::{
    validate_metadata, DecodeError, HippoResult, Limits, NewRecord, Vector, VECTOR_HEADER_SIZE,
};
use serde_json::Value as JsonValue;

/// Size of each length prefix in bytes
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Errors produced while decoding one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The buffer ends before the frame does
    Incomplete,
    /// The frame is complete but its contents are invalid
    Invalid(String),
}

impl std::fmt::Display for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameError::Incomplete => f.write_str("incomplete frame"),
            FrameError::Invalid(reason) => f.write_str(reason),
        }
    }
}

/// Encode one record frame onto the end of `buf`
///
/// Validates the record against `limits` first; on error `buf` is left
/// untouched. Returns the number of bytes appended.
pub fn encode_frame(buf: &mut Vec<u8>, record: &NewRecord, limits: &Limits) -> HippoResult<usize> {
    limits.validate_value_len(record.value.len())?;
    validate_metadata(record.metadata.as_ref())?;
    let metadata = match &record.metadata {
        Some(doc) => serde_json::to_vec(doc)?,
        None => Vec::new(),
    };
    limits.validate_metadata_len(metadata.len())?;

    let start = buf.len();
    record.vector.encode_into(buf);
    // Writes into a Vec cannot fail
    let _ = buf.write_u32::<LittleEndian>(record.value.len() as u32);
    buf.extend_from_slice(&record.value);
    let _ = buf.write_u32::<LittleEndian>(metadata.len() as u32);
    buf.extend_from_slice(&metadata);
    Ok(buf.len() - start)
}

/// Decode one frame at the start of `bytes`
///
/// When `expected_dim` is given, a frame whose dimension field disagrees is
/// rejected as soon as the dimension field is readable. A dimension or length
/// field above `limits` could never have been written, so it is `Invalid`
/// even when the buffer ends before the bytes it declares. Either way a
/// damaged field is never mistaken for a torn tail.
pub fn decode_frame(
    bytes: &[u8],
    expected_dim: Option<usize>,
    limits: &Limits,
) -> Result<(NewRecord, usize), FrameError> {
    if bytes.len() < VECTOR_HEADER_SIZE {
        return Err(FrameError::Incomplete);
    }
    let dim = LittleEndian::read_u32(&bytes[..VECTOR_HEADER_SIZE]) as usize;
    if let Some(expected) = expected_dim {
        if dim != expected {
            return Err(FrameError::Invalid(format!(
                "record dimension {} does not match index dimension {}",
                dim, expected
            )));
        }
    }
    if dim > limits.max_dim {
        return Err(FrameError::Invalid(format!(
            "record dimension {} exceeds maximum of {}",
            dim, limits.max_dim
        )));
    }

    let (vector, mut offset) = Vector::decode_prefix(bytes).map_err(|e| match e {
        DecodeError::Truncated { .. } => FrameError::Incomplete,
        other => FrameError::Invalid(other.to_string()),
    })?;
    if vector.validate_finite().is_err() {
        return Err(FrameError::Invalid("non-finite vector component".to_string()));
    }

    let value = read_prefixed(bytes, &mut offset, "value", limits.max_value_bytes)?.to_vec();
    let metadata_bytes =
        read_prefixed(bytes, &mut offset, "metadata", limits.max_metadata_bytes)?;
    let metadata = if metadata_bytes.is_empty() {
        None
    } else {
        let doc: JsonValue = serde_json::from_slice(metadata_bytes)
            .map_err(|e| FrameError::Invalid(format!("metadata is not valid JSON: {}", e)))?;
        if !doc.is_object() {
            return Err(FrameError::Invalid(
                "metadata is not a JSON object".to_string(),
            ));
        }
        Some(doc)
    };

    Ok((
        NewRecord {
            vector,
            value,
            metadata,
        },
        offset,
    ))
}

fn read_prefixed<'a>(
    bytes: &'a [u8],
    offset: &mut usize,
    field: &str,
    max_len: usize,
) -> Result<&'a [u8], FrameError> {
    let header_end = *offset + LENGTH_PREFIX_SIZE;
    if bytes.len() < header_end {
        return Err(FrameError::Incomplete);
    }
    let len = LittleEndian::read_u32(&bytes[*offset..header_end]) as usize;
    if len > max_len {
        return Err(FrameError::Invalid(format!(
            "{} length {} exceeds maximum of {}",
            field, len, max_len
        )));
    }
    let end = header_end + len;
    if bytes.len() < end {
        return Err(FrameError::Incomplete);
    }
    *offset = end;
    Ok(&bytes[header_end..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn encode(record: &NewRecord) -> Vec<u8> {
        let mut buf = Vec::new();
        encode_frame(&mut buf, record, &Limits::default()).unwrap();
        buf
    }

    #[test]
    fn test_frame_layout() {
        let record = NewRecord::new(vec![1.0, 2.0], b"hi".to_vec());
        let bytes = encode(&record);
        // 4 + 8 + 4 + 2 + 4 + 0
        assert_eq!(bytes.len(), 22);
        assert_eq!(&bytes[0..4], &2u32.to_le_bytes());
        assert_eq!(&bytes[12..16], &2u32.to_le_bytes());
        assert_eq!(&bytes[16..18], b"hi");
        assert_eq!(&bytes[18..22], &0u32.to_le_bytes());
    }

    #[test]
    fn test_decode_with_metadata() {
        let record =
            NewRecord::new(vec![0.5; 3], b"payload".to_vec()).with_metadata(json!({"tag": "fact"}));
        let mut bytes = encode(&record);
        let frame_len = bytes.len();
        bytes.extend_from_slice(&[9, 9, 9]);

        let (decoded, consumed) = decode_frame(&bytes, Some(3), &Limits::default()).unwrap();
        assert_eq!(decoded, record);
        assert_eq!(consumed, frame_len);
    }

    #[test]
    fn test_every_strict_prefix_is_incomplete() {
        let record = NewRecord::new(vec![1.0, -1.0], b"abc".to_vec()).with_metadata(json!({"k": 1}));
        let bytes = encode(&record);
        for cut in 0..bytes.len() {
            assert_eq!(
                decode_frame(&bytes[..cut], Some(2), &Limits::default()),
                Err(FrameError::Incomplete),
                "cut at {}",
                cut
            );
        }
    }

    #[test]
    fn test_dimension_disagreement_is_invalid() {
        let bytes = encode(&NewRecord::new(vec![1.0, 2.0, 3.0], Vec::new()));
        assert!(matches!(
            decode_frame(&bytes, Some(2), &Limits::default()),
            Err(FrameError::Invalid(_))
        ));
        // Only the dimension field is needed to detect it
        assert!(matches!(
            decode_frame(&bytes[..4], Some(2), &Limits::default()),
            Err(FrameError::Invalid(_))
        ));
    }

    #[test]
    fn test_zero_dimension_is_invalid() {
        let mut bytes = 0u32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0; 8]);
        assert!(matches!(
            decode_frame(&bytes, None, &Limits::default()),
            Err(FrameError::Invalid(_))
        ));
    }

    #[test]
    fn test_non_object_metadata_is_invalid() {
        let mut bytes = Vector::new(vec![1.0]).encode();
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(b"42");
        assert!(matches!(
            decode_frame(&bytes, Some(1), &Limits::default()),
            Err(FrameError::Invalid(_))
        ));
    }

    #[test]
    fn test_oversized_length_field_is_invalid_not_incomplete() {
        let record = NewRecord::new(vec![1.0, 2.0], b"hi".to_vec());
        let mut bytes = encode(&record);
        // value_len sits right after the 12-byte vector
        bytes[12..16].copy_from_slice(&0x7fff_ffffu32.to_le_bytes());
        assert!(matches!(
            decode_frame(&bytes, Some(2), &Limits::default()),
            Err(FrameError::Invalid(_))
        ));

        let mut bytes = encode(&record);
        let metadata_len_at = bytes.len() - 4;
        bytes[metadata_len_at..].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            decode_frame(&bytes, Some(2), &Limits::default()),
            Err(FrameError::Invalid(_))
        ));
    }

    #[test]
    fn test_oversized_dimension_is_invalid_without_expected_dim() {
        let limits = Limits {
            max_dim: 8,
            ..Limits::default()
        };
        // Header declares more components than the buffer holds
        let bytes = 9u32.to_le_bytes();
        assert!(matches!(
            decode_frame(&bytes, None, &limits),
            Err(FrameError::Invalid(_))
        ));
    }

    #[test]
    fn test_encode_rejects_oversized_value() {
        let limits = Limits {
            max_value_bytes: 4,
            ..Limits::default()
        };
        let mut buf = vec![7u8];
        let record = NewRecord::new(vec![1.0], vec![0u8; 5]);
        assert!(encode_frame(&mut buf, &record, &limits).is_err());
        assert_eq!(buf, vec![7u8]);
    }

    #[test]
    fn test_encode_rejects_non_object_metadata() {
        let mut buf = Vec::new();
        let record = NewRecord::new(vec![1.0], Vec::new()).with_metadata(json!([1, 2]));
        let err = encode_frame(&mut buf, &record, &Limits::default()).unwrap_err();
        assert!(err.is_validation_error());
        assert!(buf.is_empty());
    }
}
