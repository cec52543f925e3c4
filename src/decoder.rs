/*
    kryoflux_stream
    Copyright 2026 The kryoflux_stream contributors
    --------------------------------------------------------------------------

    The façade: orchestrates the parser, aligner, and statistics finalizer
    into the single public entry point, and resolves clock overrides from
    the stream's info text.
*/
use crate::align;
use crate::error::StreamError;
use crate::info::find_info;
use crate::parser;
use crate::stats::{self, Statistic};
use crate::{IndexRecord, DEFAULT_INDEX_CLOCK_DIVISOR, DEFAULT_SAMPLE_CLOCK_HZ};

/// The fully decoded contents of a Stream file: flux durations, the index
/// events aligned onto them, hardware info text, and aggregate statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedStream {
    flux_values: Vec<u32>,
    flux_count: usize,
    indexes: Vec<IndexRecord>,
    info_text: String,
    statistic: Statistic,
    sample_clock_hz: f64,
    index_clock_hz: f64,
}

impl DecodedStream {
    /// Flux transition durations, in sample clocks. Only the first
    /// [`Self::flux_count`] entries are meaningful; any further entries are
    /// internal bookkeeping from index alignment.
    pub fn flux_values(&self) -> &[u32] {
        &self.flux_values
    }

    /// Number of real (non-sentinel) flux transitions.
    pub fn flux_count(&self) -> usize {
        self.flux_count
    }

    /// Index-pulse events, aligned onto the flux transitions that span them.
    pub fn indexes(&self) -> &[IndexRecord] {
        &self.indexes
    }

    /// Number of recorded index pulses.
    pub fn index_count(&self) -> usize {
        self.indexes.len()
    }

    /// Number of complete revolutions observed (`index_count - 1`), or zero
    /// if fewer than two indexes were recorded.
    pub fn revolution_count(&self) -> usize {
        self.indexes.len().saturating_sub(1)
    }

    /// The free-form hardware info text, with segments joined by `", "`.
    pub fn info_text(&self) -> &str {
        &self.info_text
    }

    /// RPM/throughput/flux-extreme aggregates.
    pub fn statistic(&self) -> Statistic {
        self.statistic
    }

    /// The sample clock frequency in Hz actually used for this decode,
    /// either the default or an `sck=` override recovered from the info
    /// text.
    pub fn sample_clock_hz(&self) -> f64 {
        self.sample_clock_hz
    }

    /// The index clock frequency in Hz actually used for this decode,
    /// either the default or an `ick=` override recovered from the info
    /// text.
    pub fn index_clock_hz(&self) -> f64 {
        self.index_clock_hz
    }

    /// Looks up a `name=value` pair from the info text. Returns an empty
    /// string if `name` is not present, matching absent and empty text
    /// uniformly.
    pub fn find_info(&self, name: &str) -> String {
        find_info(&self.info_text, name).unwrap_or_default().to_string()
    }
}

/// Decodes a fully-materialized KryoFlux Stream file buffer.
pub fn decode(bytes: &[u8]) -> Result<DecodedStream, StreamError> {
    let mut parsed = parser::parse(bytes)?;

    let (indexes, effective_flux_count) = align::align(
        &mut parsed.flux_values,
        &parsed.flux_stream_positions,
        parsed.flux_count,
        &parsed.index_records,
    )?;

    let sample_clock_hz = find_info(&parsed.info_text, "sck")
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(DEFAULT_SAMPLE_CLOCK_HZ);
    let index_clock_hz = find_info(&parsed.info_text, "ick")
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(sample_clock_hz / DEFAULT_INDEX_CLOCK_DIVISOR);

    let statistic = stats::finalize(
        &indexes,
        sample_clock_hz,
        parsed.stat_data_count,
        parsed.stat_data_time,
        parsed.min_flux,
        parsed.max_flux,
    );

    parsed.flux_values.truncate(effective_flux_count);

    log::debug!(
        "decoded {} fluxes, {} indexes, sample_clock_hz={sample_clock_hz}",
        parsed.flux_count,
        indexes.len()
    );

    Ok(DecodedStream {
        flux_values: parsed.flux_values,
        flux_count: effective_flux_count,
        indexes,
        info_text: parsed.info_text,
        statistic,
        sample_clock_hz,
        index_clock_hz,
    })
}
