/*
    kryoflux_stream
    A decoder for KryoFlux flux-imaging Stream files.

    Copyright 2026 The kryoflux_stream contributors

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------
*/

//! # kryoflux_stream
//!
//! `kryoflux_stream` decodes KryoFlux Stream files: the raw flux-transition
//! capture format produced by the KryoFlux floppy-disk imaging board.
//!
//! A Stream file interleaves flux-reversal timings with out-of-band control
//! records carrying index-pulse signals, transfer bookkeeping, hardware
//! diagnostics, and free-form configuration text. [`decode`] consumes a
//! fully-materialized byte buffer and produces an ordered sequence of flux
//! durations, a sequence of per-revolution index events aligned onto those
//! durations, the hardware info text, and a handful of aggregate statistics
//! (RPM, throughput, flux extremes).
//!
//! The decoder is not streaming: it assumes the whole file is in memory. It
//! does not re-encode, and it does not interpret flux timings as MFM/GCR
//! bitcells; that belongs to a higher layer.
//!
//! ```no_run
//! let bytes = std::fs::read("track00.0.raw").unwrap();
//! let stream = kryoflux_stream::decode(&bytes).unwrap();
//! println!("{} fluxes, {} revolutions", stream.flux_count(), stream.revolution_count());
//! ```

mod align;
mod decoder;
mod error;
mod info;
mod opcode;
mod parser;
mod primitives;
mod stats;

pub use decoder::{decode, DecodedStream};
pub use error::StreamError;
pub use stats::Statistic;

/// A flux transition duration, in sample clocks, between two consecutive
/// magnetic flux reversals. The upper 16 bits count 16-bit overflow codes
/// (`Ovl16`) folded into the value; the lower 16 bits are the residual
/// sub-cell count from the terminating `Flux1`/`Flux2`/`Flux3` opcode.
pub type FluxValue = u32;

/// Default sample clock frequency in Hz, used unless overridden by an `sck=`
/// entry recovered from the stream's info text.
pub const DEFAULT_SAMPLE_CLOCK_HZ: f64 = ((18_432_000.0 * 73.0) / 14.0) / 4.0;

/// Default index clock frequency in Hz (`sample_clock_hz / 8`), used unless
/// overridden by an `ick=` entry recovered from the stream's info text.
pub const DEFAULT_INDEX_CLOCK_DIVISOR: f64 = 8.0;

/// A completed index event: the hardware index pulse mapped onto the flux
/// transition that spans it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexRecord {
    /// Index into the decoded `flux_values` array of the flux transition
    /// whose duration spans the index pulse.
    pub flux_position: usize,
    /// Sample clocks from the start of that flux transition to the index
    /// pulse.
    pub pre_index_time: u32,
    /// Sample clocks between this index pulse and the preceding one.
    /// Meaningless (set to `pre_index_time`, i.e. zero elapsed fluxes
    /// before it) for the very first recorded index.
    pub rotation_time: u32,
}
