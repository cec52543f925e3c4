/*
    kryoflux_stream
    Copyright 2026 The kryoflux_stream contributors
    --------------------------------------------------------------------------

    Aggregates RPM, throughput, and flux-extreme statistics from the
    completed per-revolution data the aligner produced.
*/
use crate::IndexRecord;

/// Aggregate statistics computed from a fully decoded stream.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Statistic {
    pub avg_rpm: f64,
    pub min_rpm: f64,
    pub max_rpm: f64,
    pub avg_bps: f64,
    pub avg_flux_per_rev: f64,
    pub min_flux: u32,
    pub max_flux: u32,
}

pub(crate) fn finalize(
    indexes: &[IndexRecord],
    sample_clock_hz: f64,
    stat_data_count: u64,
    stat_data_time: u64,
    min_flux: u32,
    max_flux: u32,
) -> Statistic {
    let avg_bps = if stat_data_time > 0 {
        (stat_data_count as f64 * 1000.0) / stat_data_time as f64
    }
    else {
        0.0
    };

    let m = indexes.len();
    let (avg_rpm, min_rpm, max_rpm) = if m > 1 {
        let rotations = &indexes[1..];
        let sum: u64 = rotations.iter().map(|r| r.rotation_time as u64).sum();
        let min_rotation = rotations.iter().map(|r| r.rotation_time).min().unwrap();
        let max_rotation = rotations.iter().map(|r| r.rotation_time).max().unwrap();

        let avg_rpm = sample_clock_hz * (m - 1) as f64 * 60.0 / sum as f64;
        let max_rpm = sample_clock_hz * 60.0 / min_rotation as f64;
        let min_rpm = sample_clock_hz * 60.0 / max_rotation as f64;
        (avg_rpm, min_rpm, max_rpm)
    }
    else {
        (0.0, 0.0, 0.0)
    };

    let avg_flux_per_rev = if m > 2 {
        let diffs: Vec<f64> = indexes[1..]
            .windows(2)
            .map(|pair| (pair[1].flux_position as f64 - pair[0].flux_position as f64))
            .collect();
        diffs.iter().sum::<f64>() / diffs.len() as f64
    }
    else {
        0.0
    };

    Statistic {
        avg_rpm,
        min_rpm,
        max_rpm,
        avg_bps,
        avg_flux_per_rev,
        min_flux,
        max_flux,
    }
}
