/*
    kfxdump
    Copyright 2026 The kryoflux_stream contributors
    --------------------------------------------------------------------------
*/
use bpaf::*;
use std::path::PathBuf;

/// Command line parameters for `kfxdump`.
#[derive(Debug, Clone)]
pub struct Params {
    pub dump_fluxes: bool,
    pub dump_indexes: bool,
    pub dump_info: bool,
    pub histogram: bool,
    pub path: PathBuf,
}

pub fn params_parser() -> impl Parser<Params> {
    let dump_fluxes = short('f')
        .long("fluxes")
        .help("Dump every decoded flux duration")
        .switch();
    let dump_indexes = short('i')
        .long("indexes")
        .help("Dump every aligned index event")
        .switch();
    let dump_info = short('n')
        .long("info")
        .help("Dump the hardware info text, one segment per line")
        .switch();
    // -h is claimed here for the histogram flag; --help remains available
    // as the long form.
    let histogram = short('h')
        .long("histogram")
        .help("Print a histogram of flux values")
        .switch();
    let path = positional::<PathBuf>("FILE").help("Path to a KryoFlux Stream file");

    construct!(Params {
        dump_fluxes,
        dump_indexes,
        dump_info,
        histogram,
        path,
    })
    .to_options()
    .descr("Dumps the contents of a KryoFlux Stream file")
}
