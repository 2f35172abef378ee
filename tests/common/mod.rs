//! Shared test utilities: trip-line builders, a deterministic data generator,
//! and helpers for running the `taxiq` binary.
#![allow(dead_code)]

use std::io::Write;
use std::process::{Command, Output, Stdio};

/// Builder for one input line. Fields left as `None` are omitted entirely.
#[derive(Clone)]
pub struct Trip {
    pub pickup: Option<String>,
    pub vendor: Option<i64>,
    pub passengers: Option<i64>,
    pub distance: Option<f64>,
    pub payment: Option<i64>,
    pub fare: Option<f64>,
    pub tip: Option<f64>,
    pub flag: Option<char>,
}

impl Default for Trip {
    fn default() -> Self {
        Self {
            pickup: Some("2024-01-05 10:00:00".to_string()),
            vendor: Some(1),
            passengers: Some(2),
            distance: Some(6.0),
            payment: Some(1),
            fare: Some(20.0),
            tip: Some(3.0),
            flag: Some('Y'),
        }
    }
}

impl Trip {
    pub fn line(&self) -> String {
        let mut fields = Vec::new();
        if let Some(p) = &self.pickup {
            fields.push(format!("\"tpep_pickup_datetime\":\"{p}\""));
            fields.push(format!("\"tpep_dropoff_datetime\":\"{p}\""));
        }
        if let Some(v) = self.vendor {
            fields.push(format!("\"VendorID\":{v}"));
        }
        if let Some(n) = self.passengers {
            fields.push(format!("\"passenger_count\":{n}"));
        }
        if let Some(d) = self.distance {
            fields.push(format!("\"trip_distance\":{d:?}"));
        }
        if let Some(p) = self.payment {
            fields.push(format!("\"payment_type\":{p}"));
        }
        if let Some(f) = self.fare {
            fields.push(format!("\"fare_amount\":{f:?}"));
        }
        if let Some(t) = self.tip {
            fields.push(format!("\"tip_amount\":{t:?}"));
        }
        if let Some(c) = self.flag {
            fields.push(format!("\"store_and_fwd_flag\":\"{c}\""));
        }
        format!("{{{}}}", fields.join(","))
    }
}

/// Simple deterministic PRNG (xorshift32). Seed is fixed by the caller.
pub struct Rng(u32);

impl Rng {
    pub fn new(seed: u32) -> Self {
        Self(seed)
    }
    pub fn next(&mut self) -> u32 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 17;
        self.0 ^= self.0 << 5;
        self.0
    }
    pub fn range(&mut self, lo: i64, hi: i64) -> i64 {
        let span = (hi - lo) as u64;
        if span == 0 {
            return lo;
        }
        lo + (self.next() as u64 % span) as i64
    }
}

/// Generate `count` lines mixing complete, partial, null, blank and garbage rows.
pub fn generate_trips(rng: &mut Rng, count: usize) -> String {
    let mut buf = String::new();
    for _ in 0..count {
        let day = rng.range(28, 36);
        let (month, dom) = if day > 31 { (2, day - 31) } else { (1, day) };
        let pickup = format!("2024-{month:02}-{dom:02} {:02}:15:00", rng.range(0, 24));
        let mut trip = Trip {
            pickup: Some(pickup),
            vendor: Some(rng.range(1, 3)),
            passengers: Some(rng.range(0, 6)),
            distance: Some(rng.range(0, 120) as f64 / 10.0),
            payment: Some(rng.range(0, 5)),
            fare: Some(rng.range(300, 9000) as f64 / 100.0),
            tip: Some(rng.range(0, 1500) as f64 / 100.0),
            flag: Some(if rng.next() % 4 == 0 { 'Y' } else { 'N' }),
        };
        match rng.next() % 12 {
            0 => trip.passengers = None,
            1 => trip.pickup = None,
            2 => {
                buf.push('\n');
                continue;
            }
            3 => {
                buf.push_str("garbage, not a record\n");
                continue;
            }
            4 => {
                buf.push_str(&trip.line().replace("\"VendorID\":", "\"VendorID\":null,\"x\":"));
                buf.push_str("\r\n");
                continue;
            }
            _ => {}
        }
        buf.push_str(&trip.line());
        buf.push('\n');
    }
    buf
}

/// Run `taxiq` with `args` followed by a temp file holding `content`.
pub fn taxiq_file(args: &[&str], content: &[u8], file_name: &str) -> Output {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(file_name);
    std::fs::write(&path, content).unwrap();

    Command::new(env!("CARGO_BIN_EXE_taxiq"))
        .args(args)
        .arg(&path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("failed to run taxiq")
}

/// Run `taxiq` with `args`, feeding `input` on stdin.
pub fn taxiq_stdin(args: &[&str], input: &str) -> Output {
    Command::new(env!("CARGO_BIN_EXE_taxiq"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .and_then(|mut child| {
            child
                .stdin
                .take()
                .unwrap()
                .write_all(input.as_bytes())
                .unwrap();
            child.wait_with_output()
        })
        .expect("failed to run taxiq")
}

/// Assert success and return stdout.
pub fn stdout_ok(output: Output) -> String {
    assert!(
        output.status.success(),
        "taxiq exited with {}: stderr={}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("taxiq output was not valid UTF-8")
}
