//! Single-pass aggregation of all four reports.
//!
//! Each line is decoded once and then offered to every grouping table; a
//! record may contribute to all four reports at the same time. All state is
//! owned by [`Aggregator`] and handed back as [`Aggregates`] when the stream
//! ends.

use std::collections::{BTreeMap, HashMap};
use std::io::{self, Read};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::reader::{self, Line};
use crate::record::{DecodeMode, RecordDecoder, TripRecord};

/// Trips longer than this many miles are grouped by payment type.
pub const LONG_TRIP_MILES: f64 = 5.0;

/// Half-open `[from, until)` range of pickup dates, compared as
/// `YYYY-MM-DD` strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateWindow {
    from: String,
    until: String,
}

impl DateWindow {
    /// Build a window from two civil dates; `from` must precede `until`.
    pub fn new(from: &str, until: &str) -> Result<Self> {
        let start: jiff::civil::Date = from
            .parse()
            .with_context(|| format!("invalid start date: {from}"))?;
        let end: jiff::civil::Date = until
            .parse()
            .with_context(|| format!("invalid end date: {until}"))?;
        if start >= end {
            bail!("empty date window: {start} is not before {end}");
        }
        Ok(Self {
            from: start.to_string(),
            until: end.to_string(),
        })
    }

    /// January 2024.
    pub fn january_2024() -> Self {
        Self {
            from: "2024-01-01".to_string(),
            until: "2024-02-01".to_string(),
        }
    }

    /// First date inside the window.
    pub fn start(&self) -> &str {
        &self.from
    }

    /// First date past the window.
    pub fn end(&self) -> &str {
        &self.until
    }

    pub fn contains(&self, date: &str) -> bool {
        date >= self.from.as_str() && date < self.until.as_str()
    }
}

impl Default for DateWindow {
    fn default() -> Self {
        Self::january_2024()
    }
}

/// Query 2 group: long trips by payment type.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PaymentStats {
    pub count: u64,
    pub fare_sum: f64,
    pub tip_sum: f64,
}

impl PaymentStats {
    pub fn average_fare(&self) -> f64 {
        average(self.fare_sum, self.count)
    }
}

/// Query 3 group: store-and-forward trips in the window, by vendor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VendorStats {
    pub trips: u64,
    pub passenger_sum: i64,
}

impl VendorStats {
    pub fn average_passengers(&self) -> f64 {
        average(self.passenger_sum as f64, self.trips)
    }
}

/// Query 4 group: trips in the window, by pickup date.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DailyStats {
    pub trips: u64,
    pub passenger_sum: i64,
    pub distance_sum: f64,
    pub fare_sum: f64,
    pub tip_sum: f64,
}

impl DailyStats {
    pub fn average_passengers(&self) -> f64 {
        average(self.passenger_sum as f64, self.trips)
    }

    pub fn average_distance(&self) -> f64 {
        average(self.distance_sum, self.trips)
    }

    pub fn average_fare(&self) -> f64 {
        average(self.fare_sum, self.trips)
    }
}

fn average(sum: f64, n: u64) -> f64 {
    if n == 0 { 0.0 } else { sum / n as f64 }
}

/// Per-run line accounting.
///
/// `total_lines == success_count + parse_errors + empty_lines` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineCounters {
    pub total_lines: u64,
    pub success_count: u64,
    pub parse_errors: u64,
    pub empty_lines: u64,
}

/// Finished grouping tables and counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregates {
    pub counters: LineCounters,
    /// Query 1: records with a non-empty pickup timestamp.
    pub total_trips: u64,
    pub payment: HashMap<i64, PaymentStats>,
    pub vendor: HashMap<i64, VendorStats>,
    pub daily: BTreeMap<String, DailyStats>,
}

impl Aggregates {
    /// Query 2 rows, ascending by payment type.
    pub fn payment_rows(&self) -> Vec<(i64, PaymentStats)> {
        sorted_rows(&self.payment)
    }

    /// Query 3 rows, ascending by vendor id.
    pub fn vendor_rows(&self) -> Vec<(i64, VendorStats)> {
        sorted_rows(&self.vendor)
    }
}

fn sorted_rows<V: Copy>(table: &HashMap<i64, V>) -> Vec<(i64, V)> {
    let mut rows: Vec<(i64, V)> = table.iter().map(|(k, v)| (*k, *v)).collect();
    rows.sort_unstable_by_key(|(k, _)| *k);
    rows
}

#[derive(Debug, Clone, Default)]
pub struct AggregatorConfig {
    pub mode: DecodeMode,
    pub window: DateWindow,
}

/// Incremental state for one run.
pub struct Aggregator {
    decoder: RecordDecoder,
    window: DateWindow,
    state: Aggregates,
}

impl Aggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        Self {
            decoder: RecordDecoder::new(config.mode),
            window: config.window,
            state: Aggregates::default(),
        }
    }

    /// Account for one raw line (without its `\n`).
    pub fn push_line(&mut self, raw: &[u8]) {
        let counters = &mut self.state.counters;
        counters.total_lines += 1;
        let line = raw.strip_suffix(b"\r").unwrap_or(raw);
        if line.is_empty() {
            counters.empty_lines += 1;
            return;
        }
        match self.decoder.decode_bytes(line) {
            Ok(trip) => {
                counters.success_count += 1;
                self.observe(&trip);
            }
            Err(err) => {
                counters.parse_errors += 1;
                debug!(line = counters.total_lines, %err, "rejected record");
            }
        }
    }

    /// Apply a decoded record to every table whose predicate it satisfies.
    pub fn observe(&mut self, trip: &TripRecord) {
        let state = &mut self.state;

        if !trip.pickup_time.is_empty() {
            state.total_trips += 1;
        }

        if trip.trip_distance > LONG_TRIP_MILES {
            let stats = state.payment.entry(trip.payment_type).or_default();
            stats.count += 1;
            stats.fare_sum += trip.fare_amount;
            stats.tip_sum += trip.tip_amount;
        }

        let Some(date) = trip.pickup_date().filter(|d| self.window.contains(d)) else {
            return;
        };

        if trip.store_and_forward_flag == 'Y' {
            let stats = state.vendor.entry(trip.vendor_id).or_default();
            stats.trips += 1;
            stats.passenger_sum = stats.passenger_sum.saturating_add(trip.passenger_count);
        }

        // The key is only allocated the first time a date is seen.
        if !state.daily.contains_key(date) {
            state.daily.insert(date.to_string(), DailyStats::default());
        }
        if let Some(stats) = state.daily.get_mut(date) {
            stats.trips += 1;
            stats.passenger_sum = stats.passenger_sum.saturating_add(trip.passenger_count);
            stats.distance_sum += trip.trip_distance;
            stats.fare_sum += trip.fare_amount;
            stats.tip_sum += trip.tip_amount;
        }
    }

    pub fn finish(self) -> Aggregates {
        self.state
    }
}

/// Drive a line sequence through a fresh [`Aggregator`].
///
/// A read error aborts the run; a line that fails to decode is only counted.
pub fn run<I>(lines: I, config: AggregatorConfig) -> Result<Aggregates>
where
    I: IntoIterator<Item = io::Result<Line>>,
{
    let mode = config.mode;
    let mut aggregator = Aggregator::new(config);
    for line in lines {
        let line = line.context("failed to read input")?;
        aggregator.push_line(&line.text);
    }
    let aggregates = aggregator.finish();
    let c = aggregates.counters;
    info!(
        ?mode,
        total_lines = c.total_lines,
        parsed = c.success_count,
        parse_errors = c.parse_errors,
        empty_lines = c.empty_lines,
        "aggregation finished"
    );
    Ok(aggregates)
}

/// Read `reader` in `chunk_size` blocks and aggregate every line.
pub fn run_reader<R: Read>(
    reader: R,
    chunk_size: usize,
    config: AggregatorConfig,
) -> Result<Aggregates> {
    run(reader::read_lines(reader, chunk_size), config)
}
