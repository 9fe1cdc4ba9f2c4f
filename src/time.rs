//! Time arithmetic and calendar-aware axis tick selection.
//!
//! [`TimeBuddy`] figures out a "normal" spacing for x-axis markers (seconds,
//! minutes, hours, days, weeks, months, quarters, years) and generates the
//! tick timestamps aligned to that spacing in a configured time zone.
//! Alignment is computed on the local calendar, so ticks stay on local clock
//! boundaries across daylight saving transitions and uneven month lengths.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike};
use chrono_tz::Tz;
use strum::{AsRefStr, EnumString};
use thiserror::Error;

pub const MINUTE: i64 = 60;
pub const HOUR: i64 = 60 * MINUTE;
pub const DAY: i64 = 24 * HOUR;
pub const WEEK: i64 = 7 * DAY;
pub const MONTH: i64 = 30 * DAY;
pub const QUARTER: i64 = 3 * MONTH;
pub const YEAR: i64 = 365 * DAY;

/// Placeholder for "no upper bound" in a degenerate tick list.
pub const UNBOUNDED: i64 = i64::MAX;

/// Granularities tried before escalating to multi-year spacing, finest first.
const FIXED_GRANULARITIES: [Granularity; 14] = [
    Granularity::Seconds(1),
    Granularity::Seconds(5),
    Granularity::Seconds(15),
    Granularity::Seconds(MINUTE),
    Granularity::Seconds(5 * MINUTE),
    Granularity::Seconds(15 * MINUTE),
    Granularity::Hours(1),
    Granularity::Hours(4),
    Granularity::Hours(12),
    Granularity::Day,
    Granularity::Week,
    Granularity::Months(1),
    Granularity::Months(3),
    Granularity::Years(1),
];

#[derive(Debug, Error)]
pub enum TimeError {
    #[error("Unknown time zone: {0}")]
    UnknownTimezone(String),
}

/// Build a list starting at `start`. Each subsequent item is supplied by
/// `next`, for as long as `condition(item, items_so_far)` holds. `start` is
/// always included.
pub fn generate<T: Copy>(
    start: T,
    mut next: impl FnMut(T) -> T,
    mut condition: impl FnMut(T, usize) -> bool,
) -> Vec<T> {
    let mut rv = Vec::new();
    let mut current = start;
    loop {
        rv.push(current);
        current = next(current);
        if !condition(current, rv.len()) {
            return rv;
        }
    }
}

/// Coarse zoom level of an axis, used to pick a label format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum TimeScale {
    #[default]
    Minutes,
    Days,
    Years,
}

impl TimeScale {
    /// Scale for ticks spaced `interval` seconds apart.
    pub fn for_interval(interval: i64) -> Self {
        if interval >= YEAR {
            TimeScale::Years
        } else if interval >= DAY {
            TimeScale::Days
        } else {
            TimeScale::Minutes
        }
    }
}

/// Format a tick label: `12:34` for in-day ticks, `05/17` for days through
/// quarters, `2019` for years. Labels stay within 5 characters.
pub fn default_time_label<Z: TimeZone>(time: &DateTime<Z>, scale: TimeScale) -> String
where
    Z::Offset: fmt::Display,
{
    let pattern = match scale {
        TimeScale::Minutes => "%H:%M",
        TimeScale::Days => "%m/%d",
        TimeScale::Years => "%Y",
    };
    time.format(pattern).to_string()
}

/// One candidate spacing for axis ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Granularity {
    /// Fixed number of seconds, aligned by rounding (up to 15 minutes).
    Seconds(i64),
    /// Hours aligned to local midnight (1, 4 or 12).
    Hours(u32),
    /// Local midnight.
    Day,
    /// Monday, local midnight.
    Week,
    /// First of every Nth month (1 = monthly, 3 = quarterly).
    Months(u32),
    /// January 1st of every year divisible by N.
    Years(i32),
}

impl Granularity {
    /// Nominal length in seconds. Calendar granularities vary around this.
    pub fn nominal(&self) -> i64 {
        match *self {
            Granularity::Seconds(n) => n,
            Granularity::Hours(h) => i64::from(h) * HOUR,
            Granularity::Day => DAY,
            Granularity::Week => WEEK,
            Granularity::Months(n) => i64::from(n) * MONTH,
            Granularity::Years(n) => i64::from(n) * YEAR,
        }
    }

    pub fn scale(&self) -> TimeScale {
        TimeScale::for_interval(self.nominal())
    }

    /// First aligned boundary at or after `t`, in `tz`.
    pub fn start(&self, tz: &Tz, t: i64) -> Option<i64> {
        match *self {
            Granularity::Seconds(n) => ceil_to(t, n),
            Granularity::Hours(h) => {
                let day_start = midnight(local_datetime(tz, t)?.date())?;
                let candidates = (0..=24 / h).filter_map(|k| {
                    day_start.checked_add_signed(Duration::hours(i64::from(k * h)))
                });
                first_at_or_after(tz, t, candidates)
            }
            Granularity::Day => {
                let day = local_datetime(tz, t)?.date();
                first_at_or_after(tz, t, [midnight(day), midnight(day.succ_opt()?)].into_iter().flatten())
            }
            Granularity::Week => {
                let monday = monday_of(local_datetime(tz, t)?.date())?;
                let following = monday.checked_add_signed(Duration::days(7))?;
                first_at_or_after(tz, t, [midnight(monday), midnight(following)].into_iter().flatten())
            }
            Granularity::Months(n) => {
                let n = i64::from(n);
                let index = month_index(local_datetime(tz, t)?.date());
                let floor = index - index.rem_euclid(n);
                first_at_or_after(
                    tz,
                    t,
                    [first_of_month(floor), first_of_month(floor + n)].into_iter().flatten(),
                )
            }
            Granularity::Years(n) => {
                let year = local_datetime(tz, t)?.year();
                let floor = year - year.rem_euclid(n);
                first_at_or_after(
                    tz,
                    t,
                    [first_of_year(floor), first_of_year(floor.checked_add(n)?)].into_iter().flatten(),
                )
            }
        }
    }

    /// The aligned boundary following the aligned boundary `t`, in `tz`.
    pub fn next(&self, tz: &Tz, t: i64) -> Option<i64> {
        match *self {
            Granularity::Seconds(n) => t.checked_add(n),
            Granularity::Hours(h) => {
                let local = local_datetime(tz, t)?;
                let target = (local.hour() / h + 1) * h;
                let naive = if target >= 24 {
                    local.date().succ_opt()?.and_hms_opt(0, 0, 0)?
                } else {
                    local.date().and_hms_opt(target, 0, 0)?
                };
                resolve(tz, naive)
            }
            Granularity::Day => resolve(tz, midnight(local_datetime(tz, t)?.date().succ_opt()?)?),
            Granularity::Week => {
                let monday = monday_of(local_datetime(tz, t)?.date())?;
                resolve(tz, midnight(monday.checked_add_signed(Duration::days(7))?)?)
            }
            Granularity::Months(n) => {
                let n = i64::from(n);
                let index = month_index(local_datetime(tz, t)?.date());
                resolve(tz, first_of_month(index - index.rem_euclid(n) + n)?)
            }
            Granularity::Years(n) => {
                let year = local_datetime(tz, t)?.year();
                resolve(tz, first_of_year((year - year.rem_euclid(n)).checked_add(n)?)?)
            }
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Granularity::Seconds(n) if n % MINUTE == 0 => write!(f, "{}m", n / MINUTE),
            Granularity::Seconds(n) => write!(f, "{}s", n),
            Granularity::Hours(h) => write!(f, "{}h", h),
            Granularity::Day => write!(f, "day"),
            Granularity::Week => write!(f, "week"),
            Granularity::Months(3) => write!(f, "quarter"),
            Granularity::Months(n) => write!(f, "{} month", n),
            Granularity::Years(n) => write!(f, "{} year", n),
        }
    }
}

/// Ticks chosen for an axis, with the granularity that produced them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickSet {
    pub granularity: Granularity,
    pub ticks: Vec<i64>,
}

/// Chooses calendar-aligned axis ticks in one time zone.
#[derive(Clone, Copy, Debug)]
pub struct TimeBuddy {
    timezone: Tz,
}

impl Default for TimeBuddy {
    fn default() -> Self {
        Self::utc()
    }
}

impl TimeBuddy {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn utc() -> Self {
        Self::new(Tz::UTC)
    }

    /// Build from an IANA zone name like `America/Los_Angeles`.
    pub fn from_name(name: &str) -> Result<Self, TimeError> {
        name.parse::<Tz>()
            .map(Self::new)
            .map_err(|_| TimeError::UnknownTimezone(name.to_string()))
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Figure out at most `count` equally-spaced x-axis markers that line up
    /// with some "normal" time interval in local time:
    ///   - 1/5/15 seconds
    ///   - 1/5/15 minutes
    ///   - 1/4/12 hours
    ///   - midnight
    ///   - monday
    ///   - first of the month
    ///   - first of the quarter
    ///   - jan 1
    ///   - some currency-multiple of years
    ///
    /// Returns `None` when nothing fits (zero count or an inverted range).
    pub fn choose(&self, min_time: i64, max_time: i64, count: usize) -> Option<TickSet> {
        if count == 0 || max_time < min_time {
            return None;
        }
        let ideal = (max_time as f64 - min_time as f64) / (count as f64 + 1.0);

        for granularity in candidates(min_time, max_time) {
            if (granularity.nominal() as f64) < ideal {
                continue;
            }
            let ticks = self.ticks_for(granularity, min_time, max_time, count);
            match ticks.last() {
                Some(&last) if ticks.len() <= count && last <= max_time => {
                    tracing::debug!(
                        "Chose {} granularity: {} ticks in [{}, {}]",
                        granularity,
                        ticks.len(),
                        min_time,
                        max_time
                    );
                    return Some(TickSet { granularity, ticks });
                }
                _ => continue,
            }
        }
        None
    }

    /// Like [`choose`](Self::choose), but returns just the ticks. When nothing
    /// fits, returns the sentinel `[min_time, UNBOUNDED]`.
    pub fn time_granularity_for(&self, min_time: i64, max_time: i64, count: usize) -> Vec<i64> {
        match self.choose(min_time, max_time, count) {
            Some(set) => set.ticks,
            None => {
                tracing::warn!(
                    "No tick granularity fits [{}, {}] with {} ticks",
                    min_time,
                    max_time,
                    count
                );
                vec![min_time, UNBOUNDED]
            }
        }
    }

    /// Aligned ticks of `granularity` in `[min_time, max_time]`, stopping
    /// once there are more than `limit`.
    pub fn ticks_for(&self, granularity: Granularity, min_time: i64, max_time: i64, limit: usize) -> Vec<i64> {
        let tz = self.timezone;
        let start = match granularity.start(&tz, min_time) {
            Some(start) if start <= max_time => start,
            _ => return Vec::new(),
        };
        generate(
            start,
            |t| granularity.next(&tz, t).filter(|&n| n > t).unwrap_or(UNBOUNDED),
            |t, len| t <= max_time && len <= limit,
        )
    }

    /// Local date and time of `t` in this zone.
    pub fn local(&self, t: i64) -> Option<DateTime<Tz>> {
        self.timezone.timestamp_opt(t, 0).single()
    }

    /// Default label for the tick at `t`.
    pub fn label(&self, t: i64, scale: TimeScale) -> String {
        self.local(t)
            .map(|time| default_time_label(&time, scale))
            .unwrap_or_default()
    }
}

/// Fixed granularities, then currency-rounded year multiples (2, 5, 10, 20,
/// 50, ...) until the multiple is well past the range.
fn candidates(min_time: i64, max_time: i64) -> impl Iterator<Item = Granularity> {
    let span_years = (max_time as f64 - min_time as f64) / YEAR as f64;
    let limit = (span_years * 10.0).max(10.0);
    let multiples = generate(
        2_i64,
        next_currency_multiple,
        |m, _| (m as f64) <= limit && m <= i64::from(i32::MAX),
    );
    FIXED_GRANULARITIES
        .into_iter()
        .chain(multiples.into_iter().filter_map(|m| i32::try_from(m).ok()).map(Granularity::Years))
}

/// 1-2-5 progression: 2 -> 5 -> 10 -> 20 -> 50 -> 100 ...
fn next_currency_multiple(m: i64) -> i64 {
    let mut lead = m;
    while lead >= 10 {
        lead /= 10;
    }
    if lead == 2 {
        m / 2 * 5
    } else {
        m * 2
    }
}

/// Round `t` up to a multiple of `n`.
fn ceil_to(t: i64, n: i64) -> Option<i64> {
    match t.rem_euclid(n) {
        0 => Some(t),
        r => t.checked_add(n - r),
    }
}

fn local_datetime(tz: &Tz, t: i64) -> Option<NaiveDateTime> {
    tz.timestamp_opt(t, 0).single().map(|d| d.naive_local())
}

/// Timestamp of a local wall-clock time. Ambiguous times (fall back) take the
/// earlier instant; times inside a gap (spring forward) move to the first
/// valid wall-clock time after the gap.
fn resolve(tz: &Tz, naive: NaiveDateTime) -> Option<i64> {
    let mut candidate = naive;
    for _ in 0..=26 * 4 {
        if let Some(time) = tz.from_local_datetime(&candidate).earliest() {
            return Some(time.timestamp());
        }
        candidate = candidate.checked_add_signed(Duration::minutes(15))?;
    }
    None
}

fn first_at_or_after(tz: &Tz, t: i64, candidates: impl IntoIterator<Item = NaiveDateTime>) -> Option<i64> {
    candidates
        .into_iter()
        .filter_map(|naive| resolve(tz, naive))
        .find(|&c| c >= t)
}

fn midnight(day: NaiveDate) -> Option<NaiveDateTime> {
    day.and_hms_opt(0, 0, 0)
}

fn monday_of(day: NaiveDate) -> Option<NaiveDate> {
    day.checked_sub_signed(Duration::days(i64::from(day.weekday().num_days_from_monday())))
}

fn month_index(day: NaiveDate) -> i64 {
    i64::from(day.year()) * 12 + i64::from(day.month0())
}

fn first_of_month(index: i64) -> Option<NaiveDateTime> {
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    let month = u32::try_from(index.rem_euclid(12) + 1).ok()?;
    midnight(NaiveDate::from_ymd_opt(year, month, 1)?)
}

fn first_of_year(year: i32) -> Option<NaiveDateTime> {
    midnight(NaiveDate::from_ymd_opt(year, 1, 1)?)
}
