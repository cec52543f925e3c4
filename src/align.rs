/*
    kryoflux_stream
    Copyright 2026 The kryoflux_stream contributors
    --------------------------------------------------------------------------

    The index aligner: maps each hardware-timestamped index event onto the
    flux transition that spans it, and reconstructs the pre-index and
    rotation durations by correcting for the 16-bit overflow codes that
    straddle the OOB Index marker.
*/
use crate::error::StreamError;
use crate::parser::IndexRecordRaw;
use crate::IndexRecord;

/// Walks the flux array once, completing each raw index record into a full
/// [`IndexRecord`]. `flux_values`/`flux_stream_positions` include the
/// trailing sentinel entry the parser appended past `flux_count`; the
/// aligner may consult and rewrite that sentinel (step 6 of the algorithm)
/// and may "activate" it by growing the effective flux count by one if the
/// final index lands on it.
pub(crate) fn align(
    flux_values: &mut [u32],
    flux_stream_positions: &[u32],
    flux_count: usize,
    raw_records: &[IndexRecordRaw],
) -> Result<(Vec<IndexRecord>, usize), StreamError> {
    let mut completed: Vec<IndexRecord> = Vec::with_capacity(raw_records.len());

    if raw_records.is_empty() {
        return Ok((completed, flux_count));
    }

    let mut itime: u64 = 0;
    let mut iidx: usize = 0;
    let mut next_stream_pos = raw_records[0].stream_pos;
    let mut prev_pre_index_time: u32 = 0;

    let mut fidx = 0usize;
    while fidx < flux_values.len() && iidx < raw_records.len() {
        itime += flux_values[fidx] as u64;

        let mut nfidx = fidx + 1;
        if nfidx >= flux_stream_positions.len() {
            // No next flux to test against; nothing more to align here.
            fidx += 1;
            continue;
        }
        if flux_stream_positions[nfidx] < next_stream_pos {
            fidx += 1;
            continue;
        }

        if fidx == 0 && flux_stream_positions[0] >= next_stream_pos {
            nfidx = 0;
        }

        let raw = &raw_records[iidx];

        let mut iftime = flux_values[nfidx];
        let mut sample_counter = raw.sample_counter;
        if sample_counter == 0 {
            sample_counter = iftime & 0xFFFF;
        }

        if nfidx >= flux_count && flux_stream_positions[nfidx] == next_stream_pos {
            iftime += sample_counter;
            flux_values[nfidx] = iftime;
        }

        let ico = iftime >> 16;
        let pre = flux_stream_positions[nfidx].saturating_sub(next_stream_pos);
        if ico < pre {
            return Err(StreamError::MissingIndex);
        }
        let pre_index_time = ((ico - pre) << 16).wrapping_add(sample_counter);

        let rotation_time = if iidx > 0 {
            let corrected = itime.saturating_sub(prev_pre_index_time as u64);
            (if nfidx == 0 { 0 } else { corrected }) as u32 + pre_index_time
        }
        else {
            (if nfidx == 0 { 0 } else { itime }) as u32 + pre_index_time
        };

        completed.push(IndexRecord {
            flux_position: nfidx,
            pre_index_time,
            rotation_time,
        });

        prev_pre_index_time = pre_index_time;
        iidx += 1;
        next_stream_pos = raw_records.get(iidx).map(|r| r.stream_pos).unwrap_or(0);
        if nfidx != 0 {
            itime = 0;
        }

        fidx += 1;
    }

    if iidx < raw_records.len() {
        return Err(StreamError::MissingIndex);
    }

    let mut effective_flux_count = flux_count;
    if let Some(last) = raw_records.last() {
        if (last.stream_pos as usize) >= flux_count {
            effective_flux_count = flux_count + 1;
        }
    }

    Ok((completed, effective_flux_count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligns_single_index_onto_second_flux_and_activates_sentinel() {
        // Two real fluxes (100, 50) plus a trailing sentinel entry (999, never read
        // because sample_counter == 0 triggers the "sampled exactly at the edge"
        // replacement before the sentinel back-fill check is even reached).
        let mut flux_values = vec![100u32, 50u32, 999u32];
        let flux_stream_positions = vec![5u32, 10u32, 12u32];
        let raw = vec![IndexRecordRaw {
            stream_pos: 10,
            sample_counter: 0,
            index_counter: 0,
        }];

        let (records, effective_count) = align(&mut flux_values, &flux_stream_positions, 2, &raw).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].flux_position, 1);
        assert_eq!(records[0].pre_index_time, 50);
        assert_eq!(records[0].rotation_time, 150);
        assert_eq!(effective_count, 3);
    }

    #[test]
    fn missing_index_when_overflow_reconstruction_goes_negative() {
        // Craft a case where pre > ico: next_stream_pos far ahead of the flux's own
        // stream position gap while the flux's iftime carries no overflow bits.
        let mut flux_values = vec![10u32, 5u32];
        let flux_stream_positions = vec![1u32, 100u32];
        let raw = vec![IndexRecordRaw {
            stream_pos: 50,
            sample_counter: 1,
            index_counter: 0,
        }];
        let result = align(&mut flux_values, &flux_stream_positions, 2, &raw);
        assert!(matches!(result, Err(StreamError::MissingIndex)));
    }

    #[test]
    fn unplaced_index_is_missing_index() {
        let mut flux_values = vec![10u32];
        let flux_stream_positions = vec![1u32];
        let raw = vec![IndexRecordRaw {
            stream_pos: 50,
            sample_counter: 0,
            index_counter: 0,
        }];
        let result = align(&mut flux_values, &flux_stream_positions, 1, &raw);
        assert!(matches!(result, Err(StreamError::MissingIndex)));
    }
}
