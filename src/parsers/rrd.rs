//! Round-robin database (.rrd) binary format parser
//!
//! RRD files are the C structs of rrdtool written straight to disk, so field
//! widths, padding and byte order depend on the platform that wrote them.
//! Layout:
//! - Header: "RRD\0" magic, 5-byte version, then an f64 cookie aligned to
//!   4 or 8 bytes, data source / archive counts, the PDP step and 10 unused f64
//! - Data source headers: name[20], type[20], 10 f64 parameters
//! - Archive (RRA) headers: consolidation name[20], row count, PDPs per row,
//!   10 f64 parameters
//! - Last update: seconds, plus microseconds from version 0003 on
//! - Per data source and per archive/data source scratch blocks (ignored)
//! - Current row per archive
//! - Data tables, one per archive: `rows x data sources` f64, a ring buffer
//!   whose most recently written row is the archive's current row
//!
//! Integer fields are 32 or 64 bits wide; the cookie position tells the float
//! alignment and its byte pattern tells the byte order.

use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use strum::{AsRefStr, EnumString};
use thiserror::Error;

use crate::series::TimeSeries;

/// rrdtool writes this value right after the version to detect layout.
pub const COOKIE: f64 = 8.642135e130;

const SUPPORTED_VERSIONS: [&str; 3] = ["0001", "0003", "0004"];
const NAME_LEN: usize = 20;
const PARAMS_LEN: usize = 10 * 8;
/// last_ds[30] padded to 32, then 10 scratch values
const PDP_PREP_LEN: usize = 32 + PARAMS_LEN;
const CDP_PREP_LEN: usize = PARAMS_LEN;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RrdError {
    #[error("Truncated RRD: need {needed} bytes, file has {len}")]
    Truncated { needed: usize, len: usize },

    #[error("Not an RRD file")]
    NotRrd,

    #[error("Unknown RRD version {0:?}")]
    UnsupportedVersion(String),

    #[error("RRD is missing magic float")]
    MissingCookie,

    #[error("RRD file is corrupted: {0}")]
    Corrupted(String),
}

#[derive(AsRefStr, Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Endianness {
    #[strum(serialize = "LE")]
    Little,
    #[strum(serialize = "BE")]
    Big,
}

/// How a data source turns updates into primary data points.
#[derive(AsRefStr, Clone, Copy, Debug, Default, EnumString, PartialEq, Eq, Serialize)]
#[strum(serialize_all = "UPPERCASE")]
pub enum DataSourceType {
    Gauge,
    Counter,
    Derive,
    Absolute,
    Compute,
    DCounter,
    DDerive,
    #[default]
    Unknown,
}

/// How an archive folds primary data points into a row.
#[derive(AsRefStr, Clone, Copy, Debug, Default, EnumString, PartialEq, Eq, Serialize)]
#[strum(serialize_all = "UPPERCASE")]
pub enum ConsolidationFunction {
    Average,
    Min,
    Max,
    Last,
    HwPredict,
    MhwPredict,
    Seasonal,
    DevSeasonal,
    DevPredict,
    Failures,
    #[default]
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DataSource {
    pub index: usize,
    pub name: String,
    /// Type as written in the file, e.g. "GAUGE"
    pub type_name: String,
    pub kind: DataSourceType,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Archive {
    pub index: usize,
    /// Consolidation function name, e.g. "AVERAGE"
    pub name: String,
    pub function: ConsolidationFunction,
    pub rows: usize,
    /// PDPs per row
    pub step_count: i64,
    pub current_row: usize,
    /// Byte offset of this archive's data table
    pub offset: usize,
    /// Timestamp of the oldest row
    pub start_time: i64,
}

/// A parsed RRD file, borrowing the raw bytes for data reads.
#[derive(Clone, Debug)]
pub struct RrdFile<'a> {
    data: &'a [u8],
    version: u32,
    endianness: Endianness,
    float_align: usize,
    int_align: usize,
    int_is_64: bool,
    pdp_step: i64,
    last_update: i64,
    data_sources: Vec<DataSource>,
    archives: Vec<Archive>,
}

/// Cursor over the file that knows the detected layout.
struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
    endianness: Endianness,
    float_align: usize,
    int_align: usize,
    int_is_64: bool,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], RrdError> {
        let end = self.offset.checked_add(len).ok_or(RrdError::Truncated {
            needed: usize::MAX,
            len: self.data.len(),
        })?;
        let bytes = self.data.get(self.offset..end).ok_or(RrdError::Truncated {
            needed: end,
            len: self.data.len(),
        })?;
        self.offset = end;
        Ok(bytes)
    }

    fn skip(&mut self, len: usize) -> Result<(), RrdError> {
        self.take(len).map(|_| ())
    }

    /// Fixed-width, NUL-terminated string.
    fn ascii(&mut self, len: usize) -> Result<String, RrdError> {
        let bytes = self.take(len)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    fn align(&mut self, alignment: usize) {
        let rem = self.offset % alignment;
        if rem != 0 {
            self.offset += alignment - rem;
        }
    }

    fn align_float(&mut self) {
        self.align(self.float_align);
    }

    fn int(&mut self) -> Result<u64, RrdError> {
        self.align(self.int_align);
        if self.int_is_64 {
            let bytes: [u8; 8] = self.take(8)?.try_into().map_err(|_| self.truncated(8))?;
            Ok(match self.endianness {
                Endianness::Little => u64::from_le_bytes(bytes),
                Endianness::Big => u64::from_be_bytes(bytes),
            })
        } else {
            let bytes: [u8; 4] = self.take(4)?.try_into().map_err(|_| self.truncated(4))?;
            Ok(u64::from(match self.endianness {
                Endianness::Little => u32::from_le_bytes(bytes),
                Endianness::Big => u32::from_be_bytes(bytes),
            }))
        }
    }

    fn truncated(&self, len: usize) -> RrdError {
        RrdError::Truncated {
            needed: self.offset + len,
            len: self.data.len(),
        }
    }
}

fn read_f64(data: &[u8], offset: usize, endianness: Endianness) -> Option<f64> {
    let bytes: [u8; 8] = data.get(offset..offset.checked_add(8)?)?.try_into().ok()?;
    Some(match endianness {
        Endianness::Little => f64::from_le_bytes(bytes),
        Endianness::Big => f64::from_be_bytes(bytes),
    })
}

fn read_u32_le(data: &[u8], offset: usize) -> Option<u32> {
    let bytes: [u8; 4] = data.get(offset..offset.checked_add(4)?)?.try_into().ok()?;
    Some(u32::from_le_bytes(bytes))
}

fn to_i64(n: u64, what: &str) -> Result<i64, RrdError> {
    i64::try_from(n).map_err(|_| RrdError::Corrupted(format!("{} out of range: {}", what, n)))
}

fn to_usize(n: u64, what: &str) -> Result<usize, RrdError> {
    usize::try_from(n).map_err(|_| RrdError::Corrupted(format!("{} out of range: {}", what, n)))
}

impl<'a> RrdFile<'a> {
    /// Detect if data looks like an RRD file
    pub fn detect(data: &[u8]) -> bool {
        data.len() >= 4 && &data[0..4] == b"RRD\0"
    }

    pub fn parse(data: &'a [u8]) -> Result<Self, RrdError> {
        let version = Self::validate(data)?;
        let mut reader = Self::detect_layout(data)?;

        let ds_count = to_usize(reader.int()?, "data source count")?;
        let archive_count = to_usize(reader.int()?, "archive count")?;
        let pdp_step = to_i64(reader.int()?, "step")?;
        reader.align_float();
        reader.skip(PARAMS_LEN)?;
        if ds_count == 0 || archive_count == 0 || pdp_step == 0 {
            return Err(RrdError::Corrupted(format!(
                "zero count in header (sources={}, archives={}, step={})",
                ds_count, archive_count, pdp_step
            )));
        }

        let mut data_sources = Vec::with_capacity(ds_count);
        for index in 0..ds_count {
            let name = reader.ascii(NAME_LEN)?;
            let type_name = reader.ascii(NAME_LEN)?;
            reader.align_float();
            reader.skip(PARAMS_LEN)?;
            let kind = DataSourceType::from_str(&type_name).unwrap_or_default();
            data_sources.push(DataSource {
                index,
                name,
                type_name,
                kind,
            });
        }

        let mut archives = Vec::with_capacity(archive_count);
        for index in 0..archive_count {
            let name = reader.ascii(NAME_LEN)?;
            let rows = to_usize(reader.int()?, "row count")?;
            let step_count = to_i64(reader.int()?, "PDP count")?;
            reader.align_float();
            reader.skip(PARAMS_LEN)?;
            if rows == 0 || step_count == 0 {
                return Err(RrdError::Corrupted(format!(
                    "archive {} has {} rows of {} PDPs",
                    index, rows, step_count
                )));
            }
            let function = ConsolidationFunction::from_str(&name).unwrap_or_default();
            archives.push(Archive {
                index,
                name,
                function,
                rows,
                step_count,
                current_row: 0,
                offset: 0,
                start_time: 0,
            });
        }

        let seconds = to_i64(reader.int()?, "last update")?;
        if version >= 3 {
            // microseconds never move the update past the next step
            reader.int()?;
        }
        let last_update = seconds.div_euclid(pdp_step) * pdp_step;

        reader.skip(ds_count.saturating_mul(PDP_PREP_LEN))?;
        reader.skip(ds_count.saturating_mul(archive_count).saturating_mul(CDP_PREP_LEN))?;

        for archive in archives.iter_mut() {
            let current_row = to_usize(reader.int()?, "current row")?;
            if current_row >= archive.rows {
                return Err(RrdError::Corrupted(format!(
                    "archive {} current row {} is past {} rows",
                    archive.index, current_row, archive.rows
                )));
            }
            archive.current_row = current_row;
        }

        let stride = ds_count * 8;
        let mut offset = reader.offset;
        for archive in archives.iter_mut() {
            archive.offset = offset;
            offset = archive
                .rows
                .checked_mul(stride)
                .and_then(|len| offset.checked_add(len))
                .ok_or_else(|| RrdError::Corrupted(format!("archive {} is too large", archive.index)))?;
            let step = archive.step_count.checked_mul(pdp_step);
            archive.start_time = step
                .filter(|&step| last_update.checked_add(step).is_some())
                .and_then(|step| step.checked_mul(archive.rows as i64 - 1))
                .and_then(|span| last_update.checked_sub(span))
                .ok_or_else(|| {
                    RrdError::Corrupted(format!(
                        "archive {} spans {} rows of {} PDPs, out of time range",
                        archive.index, archive.rows, archive.step_count
                    ))
                })?;
        }
        if offset > data.len() {
            return Err(RrdError::Truncated {
                needed: offset,
                len: data.len(),
            });
        }

        let rrd = Self {
            data,
            version,
            endianness: reader.endianness,
            float_align: reader.float_align,
            int_align: reader.int_align,
            int_is_64: reader.int_is_64,
            pdp_step,
            last_update,
            data_sources,
            archives,
        };
        tracing::info!("Parsed {}", rrd);
        Ok(rrd)
    }

    /// Check magic and version, returning the numeric version.
    fn validate(data: &[u8]) -> Result<u32, RrdError> {
        if data.len() < 16 {
            return Err(RrdError::Truncated {
                needed: 16,
                len: data.len(),
            });
        }
        if !Self::detect(data) {
            return Err(RrdError::NotRrd);
        }
        let raw = &data[4..9];
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        let version = String::from_utf8_lossy(&raw[..end]).into_owned();
        if !SUPPORTED_VERSIONS.contains(&version.as_str()) {
            return Err(RrdError::UnsupportedVersion(version));
        }
        version
            .parse::<u32>()
            .map_err(|_| RrdError::UnsupportedVersion(version))
    }

    /// Find the cookie to learn float alignment and byte order, then decide
    /// the int width from the high half of the first count.
    fn detect_layout(data: &'a [u8]) -> Result<Reader<'a>, RrdError> {
        // zero padding before the cookie only exists with 8-byte alignment
        let padded = read_u32_le(data, 12) == Some(0);
        let (float_align, cookie_offset) = if padded { (8, 16) } else { (4, 12) };

        let endianness = if read_f64(data, cookie_offset, Endianness::Little) == Some(COOKIE) {
            Endianness::Little
        } else if read_f64(data, cookie_offset, Endianness::Big) == Some(COOKIE) {
            Endianness::Big
        } else if data.len() < cookie_offset + 8 {
            return Err(RrdError::Truncated {
                needed: cookie_offset + 8,
                len: data.len(),
            });
        } else {
            return Err(RrdError::MissingCookie);
        };

        let counts = cookie_offset + 8;
        let int_is_64 = if float_align == 8 {
            let high_word = match endianness {
                Endianness::Little => counts + 4,
                Endianness::Big => counts,
            };
            read_u32_le(data, high_word)
                .map(|word| word == 0)
                .ok_or(RrdError::Truncated {
                    needed: high_word + 4,
                    len: data.len(),
                })?
        } else {
            false
        };
        let int_align = if int_is_64 { 8 } else { 4 };

        tracing::debug!(
            "RRD layout: {} floats aligned to {}, {}-bit ints",
            endianness.as_ref(),
            float_align,
            if int_is_64 { 64 } else { 32 }
        );
        Ok(Reader {
            data,
            offset: counts,
            endianness,
            float_align,
            int_align,
            int_is_64,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    pub fn ds_count(&self) -> usize {
        self.data_sources.len()
    }

    pub fn archive_count(&self) -> usize {
        self.archives.len()
    }

    /// Seconds per primary data point.
    pub fn step(&self) -> i64 {
        self.pdp_step
    }

    /// Time of the last update, floored to the step.
    pub fn last_update(&self) -> i64 {
        self.last_update
    }

    pub fn data_sources(&self) -> &[DataSource] {
        &self.data_sources
    }

    pub fn archives(&self) -> &[Archive] {
        &self.archives
    }

    /// `"<data source>:<archive>"` for every data source crossed with every
    /// unconsolidated (one PDP per row) archive.
    pub fn keys(&self) -> Vec<String> {
        self.data_sources
            .iter()
            .flat_map(|ds| {
                self.archives
                    .iter()
                    .filter(|a| a.step_count == 1)
                    .map(move |a| format!("{}:{}", ds.name, a.name))
            })
            .collect()
    }

    /// Time range held by the unconsolidated archives: oldest row up to one
    /// step past the last update.
    pub fn default_window(&self) -> (i64, i64) {
        let start = self
            .archives
            .iter()
            .filter(|a| a.step_count == 1)
            .map(|a| a.start_time)
            .min()
            .unwrap_or(self.last_update);
        (start, self.last_update + self.pdp_step)
    }

    /// Read `key` (`"<data source>:<archive>"`) over `[start_time, end_time)`.
    ///
    /// Uses the finest archive that reaches back to `start_time`, or the
    /// coarsest one when none does. Unknown keys give an empty series.
    pub fn get_time_series(&self, key: &str, start_time: i64, end_time: i64, name: Option<&str>) -> TimeSeries {
        let mut series = TimeSeries::new(name.unwrap_or(key));
        let (ds_name, archive_name) = key.split_once(':').unwrap_or((key, ""));

        let Some(ds) = self.data_sources.iter().find(|d| d.name == ds_name) else {
            tracing::warn!("RRD has no data source {:?}", ds_name);
            return series;
        };
        let mut archives: Vec<&Archive> = self.archives.iter().filter(|a| a.name == archive_name).collect();
        archives.sort_by_key(|a| Reverse(a.start_time));
        let Some(archive) = archives
            .iter()
            .find(|a| a.start_time <= start_time)
            .or(archives.last())
            .copied()
        else {
            tracing::warn!("RRD has no archive {:?}", archive_name);
            return series;
        };

        let step = self.pdp_step * archive.step_count;
        tracing::debug!(
            "Reading {} from archive {} ({}s per row, from {})",
            key,
            archive.index,
            step,
            archive.start_time
        );

        // clamp to what the archive holds, then onto its step grid
        let limit = self.last_update + step;
        let start_time = start_time.clamp(archive.start_time, limit);
        let end_time = if end_time > self.last_update {
            limit
        } else {
            end_time.max(archive.start_time)
        };
        let start_time = self.last_update - (self.last_update - start_time).div_euclid(step) * step;
        let end_time = self.last_update + (end_time - self.last_update).div_euclid(step) * step;

        let rows = archive.rows;
        let stride = self.ds_count() * 8;
        let first_row = ((start_time - archive.start_time) / step) as usize + archive.current_row + 1;

        let mut timestamp = start_time;
        let mut i = 0;
        while timestamp < end_time {
            let row = (first_row + i) % rows;
            let offset = archive.offset + row * stride + ds.index * 8;
            let value = read_f64(self.data, offset, self.endianness).filter(|v| !v.is_nan());
            series.add_points(&[(timestamp, value)]);
            timestamp += step;
            i += 1;
        }
        series
    }
}

impl fmt::Display for RrdFile<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RrdFile({}, version={}, sources={}, archives={}, lastUpdate={}, step={}, int={}:{}, float=64:{})",
            self.endianness.as_ref(),
            self.version,
            self.ds_count(),
            self.archive_count(),
            self.last_update,
            self.pdp_step,
            if self.int_is_64 { 64 } else { 32 },
            self.int_align,
            self.float_align
        )
    }
}
