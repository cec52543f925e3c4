/*
    kryoflux_stream
    Copyright 2026 The kryoflux_stream contributors
    --------------------------------------------------------------------------

    Bounds-checked little-endian reads over a byte slice. The stream parser
    never holds a `Read`/`Seek` stream open; it walks a fully-materialized
    buffer by index, so these helpers take `(buf, pos)` rather than wrapping
    a cursor.
*/
use crate::error::StreamError;

/// Reads a little-endian `u16` at `pos`, failing with [`StreamError::MissingData`]
/// if `pos + 2` exceeds `buf.len()`.
pub(crate) fn read_u16le(buf: &[u8], pos: usize) -> Result<u16, StreamError> {
    let bytes = buf
        .get(pos..pos + 2)
        .ok_or(StreamError::MissingData { offset: pos })?;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

/// Reads a little-endian `u32` at `pos`, failing with [`StreamError::MissingData`]
/// if `pos + 4` exceeds `buf.len()`.
pub(crate) fn read_u32le(buf: &[u8], pos: usize) -> Result<u32, StreamError> {
    let bytes = buf
        .get(pos..pos + 4)
        .ok_or(StreamError::MissingData { offset: pos })?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_u16_little_endian() {
        assert_eq!(read_u16le(&[0x34, 0x12], 0).unwrap(), 0x1234);
    }

    #[test]
    fn reads_u32_little_endian() {
        assert_eq!(read_u32le(&[0x78, 0x56, 0x34, 0x12], 0).unwrap(), 0x1234_5678);
    }

    #[test]
    fn rejects_short_reads() {
        assert!(matches!(
            read_u16le(&[0x01], 0),
            Err(StreamError::MissingData { offset: 0 })
        ));
        assert!(matches!(
            read_u32le(&[0x01, 0x02, 0x03], 0),
            Err(StreamError::MissingData { offset: 0 })
        ));
    }

    #[test]
    fn reads_at_nonzero_offset() {
        let buf = [0xAA, 0x01, 0x00, 0x00, 0x00];
        assert_eq!(read_u32le(&buf, 1).unwrap(), 1);
    }
}
