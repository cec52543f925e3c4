/*
    kryoflux_stream
    Copyright 2026 The kryoflux_stream contributors
    --------------------------------------------------------------------------

    The stream parser: a single linear walk over the Stream file's bytes
    that folds flux opcodes into `flux_values`/`flux_stream_positions`,
    dispatches OOB records, and validates the stream-position handshake
    between the host and the implied encoder.
*/
use binrw::{binrw, BinRead};
use std::io::Cursor;

use crate::error::StreamError;
use crate::opcode::{classify, OpKind};
use crate::primitives::{read_u16le, read_u32le};

const OOB_STREAM_INFO: u8 = 0x01;
const OOB_INDEX: u8 = 0x02;
const OOB_STREAM_END: u8 = 0x03;
const OOB_INFO: u8 = 0x04;
const OOB_EOF: u8 = 0x0D;

/// The hardware-timestamped index event as emitted directly by the parser,
/// before the aligner maps it onto a flux slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct IndexRecordRaw {
    pub stream_pos: u32,
    pub sample_counter: u32,
    pub index_counter: u32,
}

/// Everything the parser produces from one linear walk over the buffer.
/// Consumed by the aligner and statistics finalizer.
pub(crate) struct ParsedStream {
    pub flux_values: Vec<u32>,
    pub flux_stream_positions: Vec<u32>,
    /// Number of *emitted* fluxes; `flux_values`/`flux_stream_positions`
    /// additionally carry one trailing sentinel entry past this count.
    pub flux_count: usize,
    pub index_records: Vec<IndexRecordRaw>,
    pub info_text: String,
    pub stat_data_count: u64,
    pub stat_data_time: u64,
    pub stat_data_trans: u64,
    pub min_flux: u32,
    pub max_flux: u32,
}

#[derive(Debug)]
#[binrw]
#[brw(little)]
struct StreamInfoBlock {
    size: u16,
    stream_pos: u32,
    transfer_time_ms: u32,
}

#[derive(Debug)]
#[binrw]
#[brw(little)]
struct IndexBlock {
    size: u16,
    stream_pos: u32,
    sample_counter: u32,
    index_counter: u32,
}

#[derive(Debug)]
#[binrw]
#[brw(little)]
struct StreamEndBlock {
    size: u16,
    stream_pos: u32,
    hw_status_code: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HwStatus {
    Ok,
    Buffer,
    Index,
    Other(u32),
}

/// Walks `buf` once, producing a [`ParsedStream`]. See module docs.
pub(crate) fn parse(buf: &[u8]) -> Result<ParsedStream, StreamError> {
    let mut pos: usize = 0;
    let mut stream_pos: u32 = 0;
    let mut pending_flux: u32 = 0;
    let mut last_stream_pos: u32 = 0;
    let mut last_index_pos: u32 = 0;
    let mut hw_status = HwStatus::Ok;
    let mut eof_seen = false;

    let mut flux_values: Vec<u32> = Vec::with_capacity(buf.len() / 2);
    let mut flux_stream_positions: Vec<u32> = Vec::with_capacity(buf.len() / 2);
    let mut index_records: Vec<IndexRecordRaw> = Vec::new();
    let mut info_text = String::new();

    let mut stat_data_count: u64 = 0;
    let mut stat_data_time: u64 = 0;
    let mut stat_data_trans: u64 = 0;
    let mut min_flux: u32 = u32::MAX;
    let mut max_flux: u32 = 0;

    while !eof_seen && pos < buf.len() {
        let h = buf[pos];
        let (kind, header_len) = classify(h);
        log::trace!("block at offset {pos}: {h:02X} ({kind:?})");

        let block_length = match kind {
            OpKind::Oob => {
                if pos + 2 > buf.len() {
                    return Err(StreamError::MissingData { offset: pos });
                }
                let subtype = buf[pos + 1];
                if subtype == OOB_EOF {
                    4
                }
                else {
                    let size = read_u16le(buf, pos + 2)? as usize;
                    4 + size
                }
            }
            _ => header_len,
        };

        if pos + block_length > buf.len() {
            return Err(StreamError::MissingData { offset: pos });
        }

        match kind {
            OpKind::Flux1 => {
                let value = h as u32;
                pending_flux = pending_flux.wrapping_add(value);
                emit_flux(
                    &mut flux_values,
                    &mut flux_stream_positions,
                    &mut pending_flux,
                    stream_pos,
                    &mut min_flux,
                    &mut max_flux,
                );
            }
            OpKind::Flux2 => {
                let value = ((h as u32) << 8) | buf[pos + 1] as u32;
                pending_flux = pending_flux.wrapping_add(value);
                emit_flux(
                    &mut flux_values,
                    &mut flux_stream_positions,
                    &mut pending_flux,
                    stream_pos,
                    &mut min_flux,
                    &mut max_flux,
                );
            }
            OpKind::Flux3 => {
                let value = ((buf[pos + 1] as u32) << 8) | buf[pos + 2] as u32;
                pending_flux = pending_flux.wrapping_add(value);
                emit_flux(
                    &mut flux_values,
                    &mut flux_stream_positions,
                    &mut pending_flux,
                    stream_pos,
                    &mut min_flux,
                    &mut max_flux,
                );
            }
            OpKind::Ovl16 => {
                pending_flux = pending_flux.wrapping_add(0x1_0000);
            }
            OpKind::Nop1 | OpKind::Nop2 | OpKind::Nop3 => {
                // No flux effect; block_length already accounts for the skip.
            }
            OpKind::Oob => {
                let subtype = buf[pos + 1];
                match subtype {
                    OOB_STREAM_INFO => {
                        let mut cursor = Cursor::new(&buf[pos + 2..pos + block_length]);
                        let sib = StreamInfoBlock::read(&mut cursor)
                            .map_err(|_| StreamError::MissingData { offset: pos })?;
                        if stream_pos != sib.stream_pos {
                            return Err(StreamError::WrongPosition {
                                stream_pos,
                                encoder_pos: sib.stream_pos,
                            });
                        }
                        if stream_pos != last_stream_pos {
                            stat_data_count += (stream_pos - last_stream_pos) as u64;
                            stat_data_time += sib.transfer_time_ms as u64;
                            stat_data_trans += 1;
                            last_stream_pos = stream_pos;
                        }
                    }
                    OOB_INDEX => {
                        let mut cursor = Cursor::new(&buf[pos + 2..pos + block_length]);
                        let ib = IndexBlock::read(&mut cursor).map_err(|_| StreamError::MissingData { offset: pos })?;
                        log::debug!(
                            "index block: stream_pos={} sample_counter={} index_counter={}",
                            ib.stream_pos,
                            ib.sample_counter,
                            ib.index_counter
                        );
                        index_records.push(IndexRecordRaw {
                            stream_pos: ib.stream_pos,
                            sample_counter: ib.sample_counter,
                            index_counter: ib.index_counter,
                        });
                        last_index_pos = ib.stream_pos;
                    }
                    OOB_STREAM_END => {
                        let mut cursor = Cursor::new(&buf[pos + 2..pos + block_length]);
                        let seb =
                            StreamEndBlock::read(&mut cursor).map_err(|_| StreamError::MissingData { offset: pos })?;
                        hw_status = match seb.hw_status_code {
                            0 => HwStatus::Ok,
                            1 => HwStatus::Buffer,
                            2 => HwStatus::Index,
                            other => HwStatus::Other(other),
                        };
                        log::debug!(
                            "stream end: stream_pos={} hw_status_code={:#04X}",
                            seb.stream_pos,
                            seb.hw_status_code
                        );
                        if hw_status == HwStatus::Ok && stream_pos != seb.stream_pos {
                            return Err(StreamError::WrongPosition {
                                stream_pos,
                                encoder_pos: seb.stream_pos,
                            });
                        }
                    }
                    OOB_INFO => {
                        let size = read_u16le(buf, pos + 2)? as usize;
                        let text_len = size.saturating_sub(1);
                        let payload = &buf[pos + 4..pos + 4 + text_len];
                        let segment = String::from_utf8_lossy(payload);
                        if !info_text.is_empty() {
                            info_text.push_str(", ");
                        }
                        info_text.push_str(&segment);
                    }
                    OOB_EOF => {
                        eof_seen = true;
                    }
                    other => {
                        return Err(StreamError::InvalidOOB(other));
                    }
                }
            }
        }

        if !matches!(kind, OpKind::Oob) {
            stream_pos = stream_pos.wrapping_add(block_length as u32);
        }
        pos += block_length;
    }

    // Trailing sentinel flux entry; does not count toward flux_count.
    let flux_count = flux_values.len();
    flux_values.push(pending_flux);
    flux_stream_positions.push(stream_pos);

    match hw_status {
        HwStatus::Ok => {}
        HwStatus::Buffer => {
            log::warn!("hardware reported a buffering error");
            return Err(StreamError::DevBuffer);
        }
        HwStatus::Index => {
            log::warn!("hardware timed out waiting for an index pulse");
            return Err(StreamError::DevIndex);
        }
        HwStatus::Other(code) => {
            log::warn!("hardware reported transfer error code {code}");
            return Err(StreamError::Transfer(code));
        }
    }

    if !eof_seen {
        log::warn!("stream exhausted without an OOB EOF block");
        return Err(StreamError::MissingEnd);
    }

    if !index_records.is_empty() && stream_pos < last_index_pos {
        log::warn!("final stream position {stream_pos} precedes last index position {last_index_pos}");
        return Err(StreamError::IndexReference {
            stream_pos,
            last_index_pos,
        });
    }

    if min_flux == u32::MAX {
        min_flux = 0;
    }

    Ok(ParsedStream {
        flux_values,
        flux_stream_positions,
        flux_count,
        index_records,
        info_text,
        stat_data_count,
        stat_data_time,
        stat_data_trans,
        min_flux,
        max_flux,
    })
}

fn emit_flux(
    flux_values: &mut Vec<u32>,
    flux_stream_positions: &mut Vec<u32>,
    pending_flux: &mut u32,
    stream_pos: u32,
    min_flux: &mut u32,
    max_flux: &mut u32,
) {
    flux_values.push(*pending_flux);
    flux_stream_positions.push(stream_pos);
    *min_flux = (*min_flux).min(*pending_flux);
    *max_flux = (*max_flux).max(*pending_flux);
    *pending_flux = 0;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_u16le(buf: &mut Vec<u8>, v: u16) {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    fn push_u32le(buf: &mut Vec<u8>, v: u32) {
        buf.extend_from_slice(&v.to_le_bytes());
    }

    fn oob_stream_info(buf: &mut Vec<u8>, stream_pos: u32, transfer_time_ms: u32) {
        buf.push(0x0D);
        buf.push(OOB_STREAM_INFO);
        push_u16le(buf, 8);
        push_u32le(buf, stream_pos);
        push_u32le(buf, transfer_time_ms);
    }

    fn oob_index(buf: &mut Vec<u8>, stream_pos: u32, sample_counter: u32, index_counter: u32) {
        buf.push(0x0D);
        buf.push(OOB_INDEX);
        push_u16le(buf, 12);
        push_u32le(buf, stream_pos);
        push_u32le(buf, sample_counter);
        push_u32le(buf, index_counter);
    }

    fn oob_stream_end(buf: &mut Vec<u8>, stream_pos: u32, hw_code: u32) {
        buf.push(0x0D);
        buf.push(OOB_STREAM_END);
        push_u16le(buf, 8);
        push_u32le(buf, stream_pos);
        push_u32le(buf, hw_code);
    }

    fn oob_eof(buf: &mut Vec<u8>) {
        buf.push(0x0D);
        buf.push(OOB_EOF);
        push_u16le(buf, 0);
    }

    #[test]
    fn minimal_stream_with_one_index_decodes() {
        let mut buf = Vec::new();
        // Flux1 value 14
        buf.push(14);
        oob_stream_info(&mut buf, 1, 0);
        oob_index(&mut buf, 1, 0xFFFF_FFFF, 0);
        oob_stream_end(&mut buf, 1, 0);
        oob_eof(&mut buf);

        let parsed = parse(&buf).unwrap();
        assert_eq!(parsed.flux_count, 1);
        assert_eq!(parsed.flux_values[0], 14);
        assert_eq!(parsed.index_records.len(), 1);
        assert_eq!(parsed.index_records[0].stream_pos, 1);
    }

    #[test]
    fn truncated_flux3_block_is_missing_data() {
        let buf = vec![0x0C, 0x00];
        assert!(matches!(parse(&buf), Err(StreamError::MissingData { .. })));
    }

    #[test]
    fn wrong_position_in_stream_info_is_rejected() {
        let mut buf = Vec::new();
        buf.push(14);
        oob_stream_info(&mut buf, 0, 0); // should be 1
        oob_stream_end(&mut buf, 1, 0);
        oob_eof(&mut buf);
        assert!(matches!(parse(&buf), Err(StreamError::WrongPosition { .. })));
    }

    #[test]
    fn missing_eof_block_is_rejected() {
        let mut buf = Vec::new();
        buf.push(14);
        oob_stream_end(&mut buf, 1, 0);
        assert!(matches!(parse(&buf), Err(StreamError::MissingEnd)));
    }

    #[test]
    fn buffer_hw_status_is_rejected() {
        let mut buf = Vec::new();
        buf.push(14);
        oob_stream_end(&mut buf, 1, 1);
        oob_eof(&mut buf);
        assert!(matches!(parse(&buf), Err(StreamError::DevBuffer)));
    }

    #[test]
    fn index_beyond_stream_end_is_rejected() {
        let mut buf = Vec::new();
        buf.push(14);
        oob_index(&mut buf, 5, 0, 0); // stream only reaches position 1
        oob_stream_end(&mut buf, 1, 0);
        oob_eof(&mut buf);
        assert!(matches!(parse(&buf), Err(StreamError::IndexReference { .. })));
    }

    #[test]
    fn info_segments_are_joined_with_comma_space() {
        let mut buf = Vec::new();
        buf.push(0x0D);
        buf.push(OOB_INFO);
        let text = b"sck=24027428.57, ick=3003428.57";
        push_u16le(&mut buf, (text.len() + 1) as u16);
        buf.extend_from_slice(text);
        buf.push(0); // terminator, skipped
        buf.push(14);
        oob_stream_end(&mut buf, 1, 0);
        oob_eof(&mut buf);
        let parsed = parse(&buf).unwrap();
        assert_eq!(parsed.info_text, "sck=24027428.57, ick=3003428.57");
    }

    #[test]
    fn invalid_oob_subtype_is_rejected() {
        let mut buf = Vec::new();
        buf.push(0x0D);
        buf.push(0xEE);
        push_u16le(&mut buf, 0);
        assert!(matches!(parse(&buf), Err(StreamError::InvalidOOB(0xEE))));
    }
}
