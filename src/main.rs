use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};

use rusty_bonsai::crop::{smart_crop, FillValue, SeriesInput, SmartCropOptions, Window};
use rusty_bonsai::data::{loader, writer};
use rusty_bonsai::time::interpolate;

#[derive(Parser)]
#[command(name = "rusty-bonsai")]
#[command(about = "Align acquisition streams to a common time base and crop them around events")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replace the absolute timestamp column by elapsed seconds and write CSV
    Normalize {
        /// Stream file (.csv, .json or .parquet)
        input: PathBuf,

        /// Session start, local time (YYYY-MM-DDTHH:MM:SS or YYYYMMDDHHMMSS)
        #[arg(long)]
        start: Option<String>,

        /// Resample onto a uniform grid with this bin (seconds)
        #[arg(long)]
        resample: Option<f64>,

        /// Start the resampling grid at t = 0 instead of the first sample
        #[arg(long)]
        from_zero: bool,

        /// Output CSV (default: <input>_aligned.csv)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Crop windows of a stream around event times
    Crop {
        /// Stream file (.csv, .json or .parquet)
        input: PathBuf,

        /// Event file; uses its `time` column or first numeric column
        #[arg(long)]
        events: PathBuf,

        /// Window start and end relative to each event (seconds)
        #[arg(long, num_args = 2, allow_negative_numbers = true, value_names = ["START", "END"])]
        window: Vec<f64>,

        /// Session start, local time (YYYY-MM-DDTHH:MM:SS or YYYYMMDDHHMMSS)
        #[arg(long)]
        start: Option<String>,

        /// Sampling interval (seconds); inferred from the time index if omitted
        #[arg(long)]
        dt: Option<f64>,

        /// Value written for samples outside the stream (default: NaN)
        #[arg(long, allow_negative_numbers = true)]
        fill: Option<f64>,

        /// Leave out events whose window does not fit in the stream
        #[arg(long)]
        drop: bool,

        /// Largest tolerated coefficient of variation of window durations
        #[arg(long, default_value_t = 0.1)]
        max_jitter: f64,

        /// Output JSON report (default: stdout)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn parse_start(start: Option<&str>) -> Result<Option<NaiveDateTime>> {
    let Some(s) = start else {
        return Ok(None);
    };
    ["%Y-%m-%dT%H:%M:%S", "%Y%m%d%H%M%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(Some)
        .with_context(|| format!("cannot parse session start '{s}'"))
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("stream");
    input.with_file_name(format!("{stem}_aligned.csv"))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Command::Normalize {
            input,
            start,
            resample,
            from_zero,
            out,
        } => {
            let mut table = loader::load_file(&input, parse_start(start.as_deref())?)?;
            if let Some(bin) = resample {
                table = interpolate(&table, bin, from_zero)
                    .with_context(|| format!("resampling {}", input.display()))?;
            }
            let out = out.unwrap_or_else(|| default_output(&input));
            writer::write_csv(&table, &out)?;
            log::info!("Wrote {} rows to {}", table.len(), out.display());
        }

        Command::Crop {
            input,
            events,
            window,
            start,
            dt,
            fill,
            drop,
            max_jitter,
            out,
        } => {
            let [window_start, window_end] = window[..] else {
                bail!("--window takes exactly two values");
            };
            let table = loader::load_file(&input, parse_start(start.as_deref())?)?;
            let event_times = loader::load_events(&events)?;

            let mut options = SmartCropOptions::default()
                .drop_out_of_range(drop)
                .with_max_jitter(max_jitter)
                .with_fill(fill.map_or(FillValue::NAN, FillValue::Float));
            if let Some(dt) = dt {
                options = options.with_dt(dt);
            }

            let crop = smart_crop(
                SeriesInput::Columns(&table),
                &event_times,
                Window::new(window_start, window_end)?,
                &options,
            )
            .with_context(|| format!("cropping {}", input.display()))?;
            log::info!(
                "Cropped {} events x {} samples (jitter {:.4})",
                crop.n_events(),
                crop.time_base.len(),
                crop.jitter
            );

            let report = writer::CropReport::from_crop(&crop);
            match out {
                Some(path) => writer::write_json(&report, &path)?,
                None => println!("{}", serde_json::to_string_pretty(&report)?),
            }
        }
    }

    Ok(())
}
