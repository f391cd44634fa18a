use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Duration, FixedOffset, TimeZone};
use parquet::arrow::ArrowWriter;

use rusty_bonsai::time::TIMEZONE;

/// Nominal acquisition rate of the synthetic ball log.
const SAMPLE_RATE_HZ: i64 = 100;
const DURATION_S: i64 = 60;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Sample timestamps at the nominal rate with up to a quarter period of jitter.
fn jittered_timestamps(
    start: DateTime<FixedOffset>,
    n: i64,
    rng: &mut SimpleRng,
) -> Vec<DateTime<FixedOffset>> {
    let period_us = 1_000_000 / SAMPLE_RATE_HZ;
    (0..n)
        .map(|i| {
            let jitter_us = (rng.next_f64() * period_us as f64 / 4.0) as i64;
            start + Duration::microseconds(i * period_us + jitter_us)
        })
        .collect()
}

/// Ball log: uint8-centred pitch/yaw/roll readings plus the acquisition timestamp.
fn write_ball_log(path: &Path, stamps: &[DateTime<FixedOffset>], rng: &mut SimpleRng) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating ball log")?;
    writer.write_record(["pitch", "yaw", "roll", "Timestamp"])?;

    let mut phase = 0.0f64;
    for stamp in stamps {
        phase += 0.05;
        let pitch = (127.0 + 20.0 * phase.sin() + rng.gauss(0.0, 2.0)).clamp(0.0, 255.0) as u8;
        let yaw = (127.0 + 10.0 * (phase / 3.0).cos() + rng.gauss(0.0, 2.0)).clamp(0.0, 255.0) as u8;
        let roll = (127.0 + rng.gauss(0.0, 1.0)).clamp(0.0, 255.0) as u8;
        writer.write_record([
            pitch.to_string(),
            yaw.to_string(),
            roll.to_string(),
            stamp.format("%Y-%m-%dT%H:%M:%S%.6f%:z").to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Stimulus onsets every few seconds, in elapsed seconds from session start.
fn write_events(path: &Path, rng: &mut SimpleRng) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path).context("creating event list")?;
    writer.write_record(["time"])?;

    let mut t = 2.0;
    let mut count = 0;
    while t < (DURATION_S - 2) as f64 {
        writer.write_record([format!("{t:.3}")])?;
        t += 4.0 + rng.next_f64() * 2.0;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}

/// Pose-tracking table: one tracked point with likelihood, on a 50 Hz time column.
fn write_pose_table(path: &Path, rng: &mut SimpleRng) -> Result<usize> {
    let n = (DURATION_S * 50) as usize;
    let time: Vec<f64> = (0..n).map(|i| i as f64 / 50.0).collect();
    let x: Vec<f64> = time
        .iter()
        .map(|t| 320.0 + 15.0 * (t * 0.7).sin() + rng.gauss(0.0, 0.5))
        .collect();
    let y: Vec<f64> = time
        .iter()
        .map(|t| 240.0 + 8.0 * (t * 1.3).cos() + rng.gauss(0.0, 0.5))
        .collect();
    let likelihood: Vec<f64> = (0..n).map(|_| 0.9 + rng.next_f64() * 0.1).collect();
    let frame: Vec<i64> = (0..n as i64).collect();

    let schema = Arc::new(Schema::new(vec![
        Field::new("frame", DataType::Int64, false),
        Field::new("time", DataType::Float64, false),
        Field::new("nose_x", DataType::Float64, false),
        Field::new("nose_y", DataType::Float64, false),
        Field::new("nose_likelihood", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(frame)),
            Arc::new(Float64Array::from(time)),
            Arc::new(Float64Array::from(x)),
            Arc::new(Float64Array::from(y)),
            Arc::new(Float64Array::from(likelihood)),
        ],
    )
    .context("building pose record batch")?;

    let file = fs::File::create(path).context("creating pose table")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing pose table")?;
    writer.close().context("closing parquet writer")?;
    Ok(n)
}

fn main() -> Result<()> {
    env_logger::init();

    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_session"));
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);

    let start = TIMEZONE
        .with_ymd_and_hms(2023, 12, 1, 9, 50, 1)
        .single()
        .context("session start is not a valid local time")?
        .fixed_offset();
    let stamps = jittered_timestamps(start, DURATION_S * SAMPLE_RATE_HZ, &mut rng);

    let ball_path = out_dir.join("ball-log.csv");
    write_ball_log(&ball_path, &stamps, &mut rng)?;
    let n_events = write_events(&out_dir.join("events.csv"), &mut rng)?;
    let n_frames = write_pose_table(&out_dir.join("pose.parquet"), &mut rng)?;

    println!(
        "Wrote {} ball samples, {n_events} events and {n_frames} pose frames to {}",
        stamps.len(),
        out_dir.display()
    );
    Ok(())
}
