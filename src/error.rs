/*
    kryoflux_stream
    Copyright 2026 The kryoflux_stream contributors
    --------------------------------------------------------------------------
*/
use thiserror::Error;

/// The terminal conditions a decode can surface. Exactly one is returned per
/// failed [`crate::decode`] call; the decoder never recovers from an error
/// internally and never exposes partial results on failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// The byte buffer could not be obtained from the filesystem. Produced
    /// by callers that read a file before invoking the core decoder, not by
    /// the core decoder itself (which only ever sees an in-memory buffer).
    #[error("could not read the stream file")]
    ReadError,
    /// A block's declared length exceeds the remaining buffer.
    #[error("block at offset {offset} declares a length that exceeds the remaining buffer")]
    MissingData { offset: usize },
    /// Opcode classification failed. Unreachable given the full opcode
    /// table in the format; surfaced defensively if that invariant is ever
    /// violated.
    #[error("byte 0x{byte:02X} at offset {offset} could not be classified as any known opcode")]
    InvalidCode { offset: usize, byte: u8 },
    /// A `StreamInfo` or (hardware-ok) `StreamEnd` record reported an
    /// encoder stream position inconsistent with the decoder's own running
    /// count.
    #[error("encoder reported stream position {encoder_pos}, decoder is at {stream_pos}")]
    WrongPosition { stream_pos: u32, encoder_pos: u32 },
    /// The hardware reported a buffer under/overflow in its `StreamEnd`
    /// status code.
    #[error("hardware reported a buffering error (overflow or underflow)")]
    DevBuffer,
    /// The hardware timed out waiting for an index pulse.
    #[error("hardware timed out waiting for an index pulse")]
    DevIndex,
    /// The hardware reported some other non-zero status code.
    #[error("hardware reported transfer error code {0}")]
    Transfer(u32),
    /// An OOB subtype outside the recognized set (`0x01`, `0x02`, `0x03`,
    /// `0x04`, `0x0D`).
    #[error("unrecognized OOB subtype 0x{0:02X}")]
    InvalidOOB(u8),
    /// The parser exhausted the input buffer without encountering an OOB
    /// EOF block.
    #[error("stream ended before an OOB EOF block was seen")]
    MissingEnd,
    /// The final stream position is shorter than the last recorded index's
    /// stream position.
    #[error("final stream position {stream_pos} precedes the last index's stream position {last_index_pos}")]
    IndexReference { stream_pos: u32, last_index_pos: u32 },
    /// The aligner could not place every index record onto a flux
    /// transition, or the alignment arithmetic implied a negative overflow
    /// count.
    #[error("could not align all index records onto flux transitions")]
    MissingIndex,
}

// Manually implemented rather than derived: an `io::Error` only ever maps to
// the one taxonomy entry that has nothing to do with the in-memory decode
// itself.
impl From<std::io::Error> for StreamError {
    fn from(_err: std::io::Error) -> Self {
        StreamError::ReadError
    }
}
