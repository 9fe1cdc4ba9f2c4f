//! yeri - dump time series from RRD files and graphite/prometheus JSON
//!
//! Usage: `yeri <file> [key] [start] [end]`
//!
//! With just a file, prints the detected format and, for RRD files, the
//! header summary and readable keys. With a key (an RRD key, or a series
//! name in JSON sources), prints that series as CSV over `[start, end)`.
//! A key of `-` selects every series.

use std::fs::File;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use memmap2::Mmap;

use yeri::parsers::{self, Format, RrdFile};
use yeri::series::{TimeSeries, TimeSeriesList};

const USAGE: &str = "usage: yeri <file> [key] [start] [end]";

fn parse_time(arg: Option<&String>, what: &str) -> Result<Option<i64>> {
    arg.map(|s| s.parse::<i64>().with_context(|| format!("Invalid {} time: {:?}", what, s)))
        .transpose()
}

fn describe_rrd(rrd: &RrdFile) {
    println!("{}", rrd);
    for ds in rrd.data_sources() {
        println!("  source {}: {} ({})", ds.index, ds.name, ds.type_name);
    }
    for archive in rrd.archives() {
        println!(
            "  archive {}: {} x{} rows={} start={}",
            archive.index,
            archive.name,
            archive.step_count,
            archive.rows,
            archive.start_time
        );
    }
    for key in rrd.keys() {
        println!("{}", key);
    }
}

fn select(data: &[u8], key: &str, window: Option<(i64, i64)>) -> Result<Vec<TimeSeries>> {
    if Format::detect(data) == Format::Rrd && key != "-" {
        let rrd = RrdFile::parse(data)?;
        let (start, end) = window.unwrap_or_else(|| rrd.default_window());
        return Ok(vec![rrd.get_time_series(key, start, end, None)]);
    }
    let series = parsers::load(data, window)?;
    if key == "-" {
        return Ok(series);
    }
    let matching: Vec<TimeSeries> = series.into_iter().filter(|ts| ts.name == key).collect();
    if matching.is_empty() {
        bail!("No series named {:?}", key);
    }
    Ok(matching)
}

fn run(args: &[String]) -> Result<()> {
    let Some(path) = args.get(1) else {
        bail!(USAGE);
    };
    let file = File::open(path).with_context(|| format!("Failed to open {}", path))?;
    // SAFETY: the map is read-only and lives only for this call
    let mmap = unsafe { Mmap::map(&file) }.with_context(|| format!("Failed to map {}", path))?;
    let data: &[u8] = &mmap;

    let format = Format::detect(data);
    tracing::info!("{}: {} format, {} bytes", path, format, data.len());

    let Some(key) = args.get(2) else {
        println!("format: {}", format);
        match format {
            Format::Rrd => describe_rrd(&RrdFile::parse(data)?),
            Format::Unknown => bail!("Unrecognized data format in {}", path),
            _ => {
                for ts in parsers::load(data, None)? {
                    println!("{} ({} points)", ts.name, ts.len());
                }
            }
        }
        return Ok(());
    };

    let start = parse_time(args.get(3), "start")?;
    let end = parse_time(args.get(4), "end")?;
    let window = match (start, end) {
        (Some(start), Some(end)) => Some((start, end)),
        (Some(start), None) => Some((start, i64::MAX)),
        (None, _) => None,
    };

    let list = TimeSeriesList::new(select(data, key, window)?)?;
    print!("{}", list.to_csv());
    Ok(())
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("yeri: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
