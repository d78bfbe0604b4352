use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use csv::Writer;
use rayon::prelude::*;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use tour_series::hr_zones::{HrMaxFormula, HrZone, HrZoneProfile};
use tour_series::import;
use tour_series::segmenter;
use tour_series::summary::format_duration;
use tour_series::{EngineConfig, Tour, TourMeta, TourSegment, TourSummary};

#[derive(Parser, Debug)]
#[command(author, version, about = "Derives speed, elevation, breaks and segments from recorded tours", long_about = None)]
struct Cli {
    /// TOML configuration file, `TOUR_*` environment variables override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging when RUST_LOG is not set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Computes the summary of GPX/CSV files, folders are searched recursively
    Process(ProcessArgs),
    /// Splits one tour into segments
    Segments(SegmentsArgs),
}

#[derive(Args, Debug)]
struct ProcessArgs {
    /// GPX/CSV files or folders
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Summary CSV
    #[arg(short, long, default_value = "tour_summary.csv")]
    output: PathBuf,

    /// Device time interval of CSV files in seconds, -1 for a variable interval
    #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
    interval: i32,

    /// Max heart rate, hr zones are only computed when it is set
    #[arg(long)]
    max_pulse: Option<f64>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SegmenterType {
    AltitudeDp,
    AltiUpDown,
    Distance,
    BreakTime,
    PulseDp,
    PowerDp,
}

#[derive(Args, Debug)]
struct SegmentsArgs {
    /// GPX/CSV file
    input: PathBuf,

    /// Segment CSV
    #[arg(short, long, default_value = "tour_segments.csv")]
    output: PathBuf,

    #[arg(long, value_enum, default_value_t = SegmenterType::AltitudeDp)]
    by: SegmenterType,

    /// Douglas-Peucker tolerance, minimum altitude difference (m) or segment distance (m)
    #[arg(long)]
    value: Option<f64>,

    /// Device time interval of CSV files in seconds, -1 for a variable interval
    #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
    interval: i32,
}

#[derive(Debug, Serialize)]
struct SummaryRow {
    file: String,
    samples: usize,
    start_time: String,
    recording_time: String,
    moving_time: String,
    break_time: String,
    distance: String,
    avg_speed: String,
    max_speed: String,
    avg_pace: String,
    altitude_up: String,
    altitude_down: String,
    max_altitude: String,
    avg_pulse: String,
    max_pulse: String,
    avg_cadence: String,
    avg_temperature: String,
    /// Seconds per zone separated with `/`.
    hr_zones: String,
}

fn format_option(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(String::new, |value| format!("{:.*}", decimals, value))
}

impl SummaryRow {
    fn new(file: &str, summary: &TourSummary) -> Self {
        SummaryRow {
            file: file.to_string(),
            samples: summary.samples,
            start_time: summary.start_time.map_or_else(String::new, |time| time.to_rfc3339()),
            recording_time: format_duration(summary.recording_time),
            moving_time: format_duration(summary.moving_time),
            break_time: format_duration(summary.break_time),
            distance: format!("{:.2}", summary.distance),
            avg_speed: format!("{:.1}", summary.avg_speed),
            max_speed: format_option(summary.max_speed, 1),
            avg_pace: format_duration(summary.avg_pace.round() as i64),
            altitude_up: format_option(summary.altitude_up, 0),
            altitude_down: format_option(summary.altitude_down, 0),
            max_altitude: format_option(summary.max_altitude, 0),
            avg_pulse: format_option(summary.avg_pulse, 0),
            max_pulse: format_option(summary.max_pulse, 0),
            avg_cadence: format_option(summary.avg_cadence, 0),
            avg_temperature: format_option(summary.avg_temperature, 1),
            hr_zones: summary.hr_zones.as_ref().map_or_else(String::new, |zones| {
                zones
                    .seconds
                    .iter()
                    .map(|seconds| seconds.to_string())
                    .collect::<Vec<_>>()
                    .join("/")
            }),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config = EngineConfig::load(cli.config.as_deref()).context("failed to load the configuration")?;

    match cli.command {
        Command::Process(args) => handle_process(args, &config),
        Command::Segments(args) => handle_segments(args, &config),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("")
        .to_string()
}

fn is_tour_file(path: &Path) -> bool {
    match path.extension().and_then(|extension| extension.to_str()) {
        Some(extension) => matches!(extension.to_lowercase().as_str(), "gpx" | "csv"),
        None => false,
    }
}

/// Files of all inputs, folders are searched recursively. The output file is
/// skipped so that a second run does not read its own report.
fn collect_inputs(inputs: &[PathBuf], output: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input) {
                let entry = entry.with_context(|| format!("failed to read {}", input.display()))?;
                if entry.file_type().is_file() && is_tour_file(entry.path()) && entry.path() != output {
                    files.push(entry.path().to_path_buf());
                }
            }
        } else {
            files.push(input.clone());
        }
    }

    files.sort();
    Ok(files)
}

fn load_tour(path: &Path, interval: i32, config: &EngineConfig) -> Result<Tour> {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .unwrap_or("")
        .to_lowercase();

    let (samples, meta) = match extension.as_str() {
        "gpx" => import::read_gpx_file(path).with_context(|| format!("failed to read {}", path.display()))?,
        "csv" => {
            let samples = import::read_csv_file(path).with_context(|| format!("failed to read {}", path.display()))?;
            let meta = TourMeta {
                device_time_interval: interval,
                ..Default::default()
            };
            (samples, meta)
        }
        _ => bail!("unsupported file type: {}", path.display()),
    };

    Tour::from_samples(&samples, meta, config.clone()).with_context(|| format!("invalid samples in {}", path.display()))
}

fn process_file(path: &Path, args: &ProcessArgs, config: &EngineConfig) -> Result<TourSummary> {
    let mut tour = load_tour(path, args.interval, config)?;

    let mut profile = args
        .max_pulse
        .map(|max_pulse| HrZoneProfile::new(None, HrMaxFormula::Manual, Some(max_pulse), HrZone::default_zones()))
        .transpose()?;

    Ok(tour.compute_computed_values(profile.as_mut()))
}

fn handle_process(args: ProcessArgs, config: &EngineConfig) -> Result<()> {
    let files = collect_inputs(&args.inputs, &args.output)?;
    if files.is_empty() {
        bail!("no GPX or CSV files found");
    }

    let unit_system = config.unit_system;

    println!("\n🚴 TOUR SERIES PROCESSING");
    println!("========================");
    println!("📂 {} files", files.len());
    println!("⚡ Using parallel processing on {} cores", num_cpus::get());

    let results: Vec<(PathBuf, Result<TourSummary>)> = files
        .par_iter()
        .map(|path| (path.clone(), process_file(path, &args, config)))
        .collect();

    let mut rows = Vec::new();
    let mut error_count = 0;

    for (path, result) in results {
        let name = file_name(&path);
        match result {
            Ok(summary) => {
                println!(
                    "✅ {}: {:.2} {} in {} moving, ⬆️ {} {} ⬇️ {} {}",
                    name,
                    summary.distance,
                    unit_system.label_distance(),
                    format_duration(summary.moving_time),
                    format_option(summary.altitude_up, 0),
                    unit_system.label_altitude(),
                    format_option(summary.altitude_down, 0),
                    unit_system.label_altitude(),
                );
                rows.push(SummaryRow::new(&name, &summary));
            }
            Err(err) => {
                error_count += 1;
                println!("❌ {}: {:#}", name, err);
            }
        }
    }

    write_csv(&args.output, &rows)?;

    println!("\n🎯 PROCESSING SUMMARY");
    println!("====================");
    println!("✅ Successful: {}", rows.len());
    println!("❌ Errors: {}", error_count);
    println!("📊 Summary saved to: {}", args.output.display());

    Ok(())
}

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = Writer::from_path(path).with_context(|| format!("failed to create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn handle_segments(args: SegmentsArgs, config: &EngineConfig) -> Result<()> {
    let mut tour = load_tour(&args.input, args.interval, config)?;
    let forced_indices = tour.meta().multiple_tour_start_indices.clone();

    let segments: Vec<TourSegment> = match args.by {
        SegmenterType::AltitudeDp => {
            let tolerance = args.value.unwrap_or(config.elevation.dp_tolerance);
            let altitude = tour
                .altitude_smoothed()
                .map(|altitude| altitude.metric.clone())
                .context("the tour has no altitude")?;
            let distance = tour.metric_distance().context("the tour has no distance")?;
            let breakpoints = segmenter::by_altitude_dp(distance, &altitude, tolerance, &forced_indices);
            tour.segments(&breakpoints, None)?
        }
        SegmenterType::AltiUpDown => {
            let min_alti_diff = args.value.unwrap_or(config.elevation.min_altitude_diff);
            let breakpoints = tour.altitude_segments(min_alti_diff).context("the tour has no altitude")?;
            tour.computed_segments(&breakpoints, None)?
        }
        SegmenterType::Distance => {
            let segment_distance = args.value.unwrap_or(1000.0);
            let distance = tour.metric_distance().context("the tour has no distance")?;
            let breakpoints = segmenter::by_distance(distance, segment_distance);
            tour.segments(&breakpoints, None)?
        }
        SegmenterType::BreakTime => {
            let result = tour.break_time_result().context("breaks need a distance")?;
            let breakpoints = segmenter::by_break_time(&result.mask);
            tour.segments(&breakpoints, None)?
        }
        SegmenterType::PulseDp => {
            let tolerance = args.value.unwrap_or(5.0);
            let series = tour.series();
            let pulse = series.pulse.as_deref().context("the tour has no pulse")?;
            let breakpoints = segmenter::by_value_dp(&series.time, pulse, tolerance, &forced_indices);
            tour.segments(&breakpoints, None)?
        }
        SegmenterType::PowerDp => {
            let tolerance = args.value.unwrap_or(10.0);
            let series = tour.series();
            let power = series.power.as_deref().context("the tour has no power")?;
            let breakpoints = segmenter::by_value_dp(&series.time, power, tolerance, &forced_indices);
            tour.segments(&breakpoints, None)?
        }
    };

    let unit_system = config.unit_system;

    println!("\n📐 SEGMENTS OF {}", file_name(&args.input));
    println!("========================");
    for (index, segment) in segments.iter().enumerate() {
        let label = if segment.is_total {
            "Total".to_string()
        } else {
            format!("{:>5}", index + 1)
        };
        println!(
            "{}: {:>7.2} {} {:>8} {:>6.1} {} {:>+6.0} {}",
            label,
            segment.distance_diff / 1000.0 / unit_system.distance_divisor(),
            unit_system.label_distance(),
            format_duration(segment.time_moving),
            segment.speed,
            unit_system.label_speed(),
            unit_system.altitude_from_meters(segment.altitude_border_diff),
            unit_system.label_altitude(),
        );
    }

    write_csv(&args.output, &segments)?;
    println!("📊 {} segments saved to: {}", segments.len().saturating_sub(1), args.output.display());

    Ok(())
}
