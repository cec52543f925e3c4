/*
    kfxdump
    Copyright 2026 The kryoflux_stream contributors
    --------------------------------------------------------------------------
*/
mod args;

use anyhow::{Context, Error};
use bpaf::Parser;
use std::collections::BTreeMap;

use args::{params_parser, Params};

fn main() -> Result<(), Error> {
    env_logger::init();

    let params = params_parser().run();

    match run(&params) {
        Ok(_) => Ok(()),
        Err(e) => {
            eprintln!("kfxdump: {}", e);
            for cause in e.chain().skip(1) {
                eprintln!("Caused by: {}", cause);
            }
            std::process::exit(1);
        }
    }
}

fn run(params: &Params) -> Result<(), Error> {
    let bytes = std::fs::read(&params.path)
        .map_err(kryoflux_stream::StreamError::from)
        .with_context(|| format!("reading {}", params.path.display()))?;
    let stream = kryoflux_stream::decode(&bytes)
        .with_context(|| format!("decoding {}", params.path.display()))?;

    println!(
        "{}: {} fluxes, {} revolutions, sample_clock_hz={:.2}, index_clock_hz={:.2}",
        params.path.display(),
        stream.flux_count(),
        stream.revolution_count(),
        stream.sample_clock_hz(),
        stream.index_clock_hz(),
    );

    let stat = stream.statistic();
    println!(
        "avg_rpm={:.2} min_rpm={:.2} max_rpm={:.2} avg_bps={:.2} avg_flux_per_rev={:.2} min_flux={} max_flux={}",
        stat.avg_rpm, stat.min_rpm, stat.max_rpm, stat.avg_bps, stat.avg_flux_per_rev, stat.min_flux, stat.max_flux
    );

    if params.dump_fluxes {
        for (i, value) in stream.flux_values().iter().enumerate() {
            println!("flux[{i}] = {value}");
        }
    }

    if params.dump_indexes {
        for (i, idx) in stream.indexes().iter().enumerate() {
            println!(
                "index[{i}]: flux_position={} pre_index_time={} rotation_time={}",
                idx.flux_position, idx.pre_index_time, idx.rotation_time
            );
        }
    }

    if params.dump_info {
        for segment in stream.info_text().split(", ") {
            if !segment.is_empty() {
                println!("{segment}");
            }
        }
    }

    if params.histogram {
        let mut buckets: BTreeMap<u32, u64> = BTreeMap::new();
        for value in &stream.flux_values()[..stream.flux_count()] {
            *buckets.entry(*value).or_insert(0) += 1;
        }
        for (value, count) in buckets {
            println!("{value}: {}", "#".repeat(count.min(80) as usize));
        }
    }

    Ok(())
}
