//! Report rendering.
//!
//! Writes the line counters and the selected query's rows directly to a
//! `Write` sink, either as a tab-separated table or as one JSON object per
//! line. Integers go through `itoa`; floats use a fixed number of fractional
//! digits in text mode.

use std::fmt;
use std::io::{self, Write};
use std::time::Duration;

use clap::ValueEnum;
use serde_json::json;

use crate::aggregate::{Aggregates, LineCounters};

/// The four supported reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Query {
    /// Total trip count
    #[value(name = "query1")]
    Query1,
    /// Long trips (> 5 mi) by payment type
    #[value(name = "query2")]
    Query2,
    /// Store-and-forward trips in the date window by vendor
    #[value(name = "query3")]
    Query3,
    /// Daily statistics for the date window
    #[value(name = "query4")]
    Query4,
}

impl Query {
    pub fn name(self) -> &'static str {
        match self {
            Query::Query1 => "query1",
            Query::Query2 => "query2",
            Query::Query3 => "query3",
            Query::Query4 => "query4",
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportFormat {
    /// Tab-separated table with a header row
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub format: ReportFormat,
    /// Fractional digits for float columns (text format only).
    pub precision: usize,
    /// Emit the line counters before the report.
    pub show_stats: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: ReportFormat::Text,
            precision: 15,
            show_stats: true,
        }
    }
}

/// Write the report for `query`. `elapsed` is printed with the counters when given.
pub fn write_report<W: Write>(
    w: &mut W,
    query: Query,
    aggregates: &Aggregates,
    elapsed: Option<Duration>,
    config: &ReportConfig,
) -> io::Result<()> {
    match config.format {
        ReportFormat::Text => {
            if config.show_stats {
                write_counters_text(w, &aggregates.counters, elapsed)?;
            }
            write_rows_text(w, query, aggregates, config.precision)
        }
        ReportFormat::Json => {
            if config.show_stats {
                write_counters_json(w, &aggregates.counters, elapsed)?;
            }
            write_rows_json(w, query, aggregates)
        }
    }
}

fn write_counters_text<W: Write>(
    w: &mut W,
    counters: &LineCounters,
    elapsed: Option<Duration>,
) -> io::Result<()> {
    w.write_all(b"Total lines processed: ")?;
    write_int(w, counters.total_lines)?;
    w.write_all(b"\nSuccessfully parsed: ")?;
    write_int(w, counters.success_count)?;
    w.write_all(b"\nTotal parse errors: ")?;
    write_int(w, counters.parse_errors)?;
    w.write_all(b"\n")?;
    if let Some(elapsed) = elapsed {
        writeln!(w, "Elapsed time: {} seconds", elapsed.as_secs_f64())?;
    }
    w.write_all(b"\n")
}

fn write_rows_text<W: Write>(
    w: &mut W,
    query: Query,
    agg: &Aggregates,
    precision: usize,
) -> io::Result<()> {
    match query {
        Query::Query1 => {
            w.write_all(b"Total_trips: ")?;
            write_int(w, agg.total_trips)?;
            w.write_all(b"\n")?;
        }
        Query::Query2 => {
            w.write_all(b"Payment_type\tNum_trips\tAvg_fare\tTotal_tip\n")?;
            for (payment_type, stats) in agg.payment_rows() {
                write_int(w, payment_type)?;
                w.write_all(b"\t")?;
                write_int(w, stats.count)?;
                writeln!(
                    w,
                    "\t{:.p$}\t{:.p$}",
                    stats.average_fare(),
                    stats.tip_sum,
                    p = precision
                )?;
            }
        }
        Query::Query3 => {
            w.write_all(b"VendorID\tTrips\tAvg_Passengers\n")?;
            for (vendor_id, stats) in agg.vendor_rows() {
                write_int(w, vendor_id)?;
                w.write_all(b"\t")?;
                write_int(w, stats.trips)?;
                writeln!(w, "\t{:.p$}", stats.average_passengers(), p = precision)?;
            }
        }
        Query::Query4 => {
            w.write_all(
                b"Trip_date\tTotal_trips\tAvg_passengers\tAvg_distance\tAvg_fare\tTotal_tip\n",
            )?;
            for (date, stats) in &agg.daily {
                w.write_all(date.as_bytes())?;
                w.write_all(b"\t")?;
                write_int(w, stats.trips)?;
                writeln!(
                    w,
                    "\t{:.p$}\t{:.p$}\t{:.p$}\t{:.p$}",
                    stats.average_passengers(),
                    stats.average_distance(),
                    stats.average_fare(),
                    stats.tip_sum,
                    p = precision
                )?;
            }
        }
    }
    Ok(())
}

fn write_counters_json<W: Write>(
    w: &mut W,
    counters: &LineCounters,
    elapsed: Option<Duration>,
) -> io::Result<()> {
    let mut value = json!({
        "total_lines": counters.total_lines,
        "successfully_parsed": counters.success_count,
        "parse_errors": counters.parse_errors,
        "empty_lines": counters.empty_lines,
    });
    if let Some(elapsed) = elapsed {
        value["elapsed_seconds"] = json!(elapsed.as_secs_f64());
    }
    write_json_line(w, &value)
}

fn write_rows_json<W: Write>(w: &mut W, query: Query, agg: &Aggregates) -> io::Result<()> {
    match query {
        Query::Query1 => write_json_line(w, &json!({ "total_trips": agg.total_trips })),
        Query::Query2 => {
            for (payment_type, stats) in agg.payment_rows() {
                let row = json!({
                    "payment_type": payment_type,
                    "num_trips": stats.count,
                    "avg_fare": stats.average_fare(),
                    "total_tip": stats.tip_sum,
                });
                write_json_line(w, &row)?;
            }
            Ok(())
        }
        Query::Query3 => {
            for (vendor_id, stats) in agg.vendor_rows() {
                let row = json!({
                    "vendor_id": vendor_id,
                    "trips": stats.trips,
                    "avg_passengers": stats.average_passengers(),
                });
                write_json_line(w, &row)?;
            }
            Ok(())
        }
        Query::Query4 => {
            for (date, stats) in &agg.daily {
                let row = json!({
                    "trip_date": date,
                    "total_trips": stats.trips,
                    "avg_passengers": stats.average_passengers(),
                    "avg_distance": stats.average_distance(),
                    "avg_fare": stats.average_fare(),
                    "total_tip": stats.tip_sum,
                });
                write_json_line(w, &row)?;
            }
            Ok(())
        }
    }
}

fn write_json_line<W: Write>(w: &mut W, value: &serde_json::Value) -> io::Result<()> {
    serde_json::to_writer(&mut *w, value)?;
    w.write_all(b"\n")
}

fn write_int<W: Write, I: itoa::Integer>(w: &mut W, n: I) -> io::Result<()> {
    let mut buf = itoa::Buffer::new();
    w.write_all(buf.format(n).as_bytes())
}
