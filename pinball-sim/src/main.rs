//! Simulation harness for the Pinball and Clique predecoders.
//!
//! Three experiments, all writing JSON results under the output directory:
//!
//! - `logical-error-rate` (default): sample memory-experiment shots,
//!   predecode each one, count committed shots and their logical errors,
//!   and count complex shots deferred to the downstream decoder.
//! - `l1-statistics`: predecoder-only coverage and accuracy percentages
//!   from the same shot tally.
//! - `error-frequency`: classify sampled error mechanisms by space-like and
//!   time-like extent.
//! - `chain-length`: histogram the longest error chain per shot.
//!
//! Shots come either from a flattened Stim detector error model plus its id
//! maps (`--dem-dir` and `--metadata-dir`) or, by default, from a built-in
//! correlated noise model over the same lattice.
//!
//! ```bash
//! pinball-sim -d 3,5 -e 0.001,0.005 --predecoder pinball -n 100000
//! pinball-sim error-frequency --dem-dir dems/ --metadata-dir metadata/
//! ```

mod analysis;
mod dem;
mod maps;
mod noise;
mod sampler;
mod stats;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rayon::prelude::*;
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;

use pinball_core::{AnyPredecoder, GeometryCatalog, Lattice, Predecoder, PredecoderKind};

use crate::analysis::{classify_mechanism, max_chain_length, ChainLengthHistogram, ErrorFrequency};
use crate::dem::{parse_dem, DetectorModel};
use crate::maps::{DetectorMap, ErrorMap};
use crate::noise::CorrelatedNoise;
use crate::sampler::DemSampler;
use crate::stats::{L1Statistics, RunSummary, ShotTally};

#[derive(Parser)]
#[command(name = "pinball-sim")]
#[command(about = "Predecoder simulation harness for the rotated surface code")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    opts: SimOptions,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Logical error rate and deferral statistics (the default).
    LogicalErrorRate,
    /// Predecoder-only coverage and accuracy percentages.
    L1Statistics,
    /// Distribution of sampled mechanisms over space-like and time-like
    /// extent.
    ErrorFrequency,
    /// Histogram of per-shot maximum error chain lengths.
    ChainLength,
}

#[derive(clap::Args, Clone)]
struct SimOptions {
    /// JSON file with simulation arguments, overriding the flags below
    #[arg(short = 'f', long, global = true)]
    arg_file: Option<PathBuf>,

    /// Code distances to simulate
    #[arg(short, long, global = true, value_delimiter = ',', default_values_t = vec![3, 5, 7, 9])]
    distances: Vec<usize>,

    /// Physical error rates to simulate
    #[arg(
        short,
        long,
        global = true,
        value_delimiter = ',',
        default_values_t = vec![0.01, 0.005, 0.001, 0.0005, 0.0001]
    )]
    error_rates: Vec<f64>,

    /// Predecoder to simulate
    #[arg(long, value_enum, global = true, default_value_t = PredecoderArg::Pinball)]
    predecoder: PredecoderArg,

    /// Shots per (distance, error rate) point
    #[arg(short = 'n', long, global = true, default_value_t = 100_000)]
    num_shots: usize,

    /// Output statistics directory
    #[arg(short, long, global = true, default_value = "stats")]
    output_dir: PathBuf,

    /// Integer id separating output files of parallel simulation instances
    #[arg(short = 'i', long, global = true, default_value_t = 0)]
    sim_id: u32,

    /// Random seed
    #[arg(long, global = true, default_value_t = 42)]
    seed: u64,

    /// Directory of flattened DEM files named like surface_d3_r4_p0.0010.dem
    #[arg(long, global = true)]
    dem_dir: Option<PathBuf>,

    /// Directory of per-distance id maps: d=3/detectors_to_syndromes.json
    /// and d=3/errors_to_qubits.json
    #[arg(long, global = true)]
    metadata_dir: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum PredecoderArg {
    Pinball,
    Clique,
    /// Defer every shot to the downstream decoder.
    None,
}

impl PredecoderArg {
    fn kind(self) -> Option<PredecoderKind> {
        match self {
            PredecoderArg::Pinball => Some(PredecoderKind::Pinball),
            PredecoderArg::Clique => Some(PredecoderKind::Clique),
            PredecoderArg::None => None,
        }
    }
}

/// Arguments as accepted in an `--arg-file` JSON document.
#[derive(Deserialize)]
struct ArgFile {
    distances: Vec<usize>,
    error_rates: Vec<f64>,
    predecoder: String,
    num_shots: usize,
    output_dir: PathBuf,
    sim_id: u32,
}

/// Validated simulation parameters.
struct ResolvedOptions {
    distances: Vec<usize>,
    error_rates: Vec<f64>,
    kind: Option<PredecoderKind>,
    num_shots: usize,
    output_dir: PathBuf,
    sim_id: u32,
    seed: u64,
    dem_dir: Option<PathBuf>,
    metadata_dir: Option<PathBuf>,
}

impl ResolvedOptions {
    fn predecoder_name(&self) -> &'static str {
        match self.kind {
            Some(kind) => match kind {
                PredecoderKind::Pinball => "Pinball",
                PredecoderKind::Clique => "Clique",
            },
            None => "None",
        }
    }
}

fn resolve_options(opts: SimOptions) -> Result<ResolvedOptions> {
    let mut resolved = ResolvedOptions {
        distances: opts.distances,
        error_rates: opts.error_rates,
        kind: opts.predecoder.kind(),
        num_shots: opts.num_shots,
        output_dir: opts.output_dir,
        sim_id: opts.sim_id,
        seed: opts.seed,
        dem_dir: opts.dem_dir,
        metadata_dir: opts.metadata_dir,
    };

    if let Some(path) = &opts.arg_file {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading argument file {}", path.display()))?;
        let args: ArgFile = serde_json::from_str(&content)
            .with_context(|| format!("parsing argument file {}", path.display()))?;
        resolved.distances = args.distances;
        resolved.error_rates = args.error_rates;
        resolved.kind = match args.predecoder.as_str() {
            "None" => None,
            other => Some(other.parse::<PredecoderKind>().map_err(anyhow::Error::msg)?),
        };
        resolved.num_shots = args.num_shots;
        resolved.output_dir = args.output_dir;
        resolved.sim_id = args.sim_id;
    }

    for &d in &resolved.distances {
        if d % 2 == 0 || d < 3 {
            bail!("only odd code distances >= 3 can be simulated, got {}", d);
        }
    }
    for &e in &resolved.error_rates {
        if !(0.0..1.0).contains(&e) {
            bail!("physical error rates must lie in [0, 1), got {}", e);
        }
    }
    Ok(resolved)
}

/// Where shots for one (distance, error rate) point come from.
enum ShotSource {
    /// Sample a parsed detector error model and reshape through the id
    /// maps.
    Dem {
        model: DetectorModel,
        detector_map: DetectorMap,
        error_map: ErrorMap,
        num_rounds: usize,
    },
    /// Generate correlated noise straight on the lattice.
    Noise {
        catalog: Arc<GeometryCatalog>,
        rate: f64,
        num_rounds: usize,
    },
}

fn build_source(opts: &ResolvedOptions, distance: usize, error_rate: f64) -> Result<ShotSource> {
    if opts.dem_dir.is_some() {
        let model = load_dem_model(opts, distance, error_rate)?;
        let (detector_map, error_map) = load_maps(opts, distance)?;
        Ok(ShotSource::Dem {
            model,
            detector_map,
            error_map,
            // The memory experiment measures one terminal round beyond the
            // d repetitions.
            num_rounds: distance + 1,
        })
    } else {
        Ok(ShotSource::Noise {
            catalog: GeometryCatalog::shared(distance)?,
            rate: error_rate,
            num_rounds: distance,
        })
    }
}

fn run_point(
    predecoder: Option<&AnyPredecoder>,
    source: &ShotSource,
    num_shots: usize,
    seed: u64,
) -> ShotTally {
    let chunks = rayon::current_num_threads().max(1);
    let per_chunk = num_shots / chunks;
    let remainder = num_shots % chunks;

    (0..chunks)
        .into_par_iter()
        .map(|chunk| {
            let shots = per_chunk + if chunk == chunks - 1 { remainder } else { 0 };
            let chunk_seed = seed ^ (chunk as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
            run_chunk(predecoder, source, shots, chunk_seed)
        })
        .reduce(ShotTally::default, ShotTally::merge)
}

fn run_chunk(
    predecoder: Option<&AnyPredecoder>,
    source: &ShotSource,
    num_shots: usize,
    seed: u64,
) -> ShotTally {
    let mut tally = ShotTally::default();

    let Some(predecoder) = predecoder else {
        // Without a predecoder every shot belongs to the downstream
        // decoder.
        tally.shots = num_shots;
        tally.deferred = num_shots;
        return tally;
    };
    let lattice = *predecoder.geometry().lattice();

    match source {
        ShotSource::Dem { model, detector_map, error_map, num_rounds } => {
            let mut sampler = DemSampler::new(model, seed);
            for _ in 0..num_shots {
                let shot = sampler.sample();
                tally.shots += 1;
                // An empty shot succeeds either way; skip the pipeline.
                if shot.is_trivial() {
                    tally.l1_shots += 1;
                    continue;
                }
                let rounds = detector_map.syndrome_rounds(&shot.detectors, &lattice, *num_rounds);
                let block = predecoder
                    .decode_batch(&rounds)
                    .expect("reshaped rounds match the lattice");
                if block.complex {
                    tally.deferred += 1;
                } else {
                    tally.l1_shots += 1;
                    let errors =
                        error_map.error_rounds(&shot.triggered, lattice.distance(), *num_rounds);
                    if predecoder.is_logical_error(
                        &errors,
                        &block.corrections,
                        shot.observable_flip(),
                    ) {
                        tally.l1_errors += 1;
                    }
                }
            }
        }
        ShotSource::Noise { catalog, rate, num_rounds } => {
            let mut noise = CorrelatedNoise::new(Arc::clone(catalog), *rate, seed);
            for _ in 0..num_shots {
                let shot = noise.sample_shot(*num_rounds);
                tally.shots += 1;
                if shot.is_trivial() {
                    tally.l1_shots += 1;
                    continue;
                }
                let block = predecoder
                    .decode_batch(&shot.rounds)
                    .expect("generated rounds match the lattice");
                if block.complex {
                    tally.deferred += 1;
                } else {
                    tally.l1_shots += 1;
                    if predecoder.is_logical_error(
                        &shot.data_errors,
                        &block.corrections,
                        shot.observable_flip,
                    ) {
                        tally.l1_errors += 1;
                    }
                }
            }
        }
    }
    tally
}

fn run_logical_error_rate(opts: &ResolvedOptions) -> Result<()> {
    for &distance in &opts.distances {
        let predecoder = opts
            .kind
            .map(|kind| AnyPredecoder::new(kind, distance))
            .transpose()?;

        for &error_rate in &opts.error_rates {
            info!(
                distance,
                error_rate,
                predecoder = opts.predecoder_name(),
                shots = opts.num_shots,
                "simulating point"
            );
            let source = build_source(opts, distance, error_rate)?;
            let tally = run_point(predecoder.as_ref(), &source, opts.num_shots, opts.seed);
            let summary = RunSummary::new(distance, error_rate, opts.predecoder_name(), tally);

            let dir = opts
                .output_dir
                .join("logical_error_rate")
                .join(opts.predecoder_name())
                .join(format!("d={}", distance))
                .join(format!("e={:.4}", error_rate));
            fs::create_dir_all(&dir)
                .with_context(|| format!("creating output directory {}", dir.display()))?;
            let path = dir.join(format!("{}.json", opts.sim_id));
            fs::write(&path, serde_json::to_string_pretty(&summary)?)
                .with_context(|| format!("writing {}", path.display()))?;

            println!(
                "d={} p={:.4}: L1 LER={:.3e} [{:.3e},{:.3e}], complex={:.2}%, shots={}",
                distance,
                error_rate,
                summary.l1_logical_error_rate,
                summary.l1_ci_low,
                summary.l1_ci_high,
                100.0 * summary.complex_fraction,
                summary.num_shots,
            );
        }
    }
    Ok(())
}

fn run_l1_statistics(opts: &ResolvedOptions) -> Result<()> {
    let kind = opts
        .kind
        .context("l1-statistics needs a concrete predecoder, not None")?;

    for &distance in &opts.distances {
        let predecoder = AnyPredecoder::new(kind, distance)?;

        for &error_rate in &opts.error_rates {
            info!(
                distance,
                error_rate,
                predecoder = opts.predecoder_name(),
                shots = opts.num_shots,
                "measuring coverage and accuracy"
            );
            let source = build_source(opts, distance, error_rate)?;
            let tally = run_point(Some(&predecoder), &source, opts.num_shots, opts.seed);
            let stats = L1Statistics::new(tally);

            let dir = opts
                .output_dir
                .join("l1_statistics")
                .join(opts.predecoder_name())
                .join(format!("d={}", distance));
            fs::create_dir_all(&dir)
                .with_context(|| format!("creating output directory {}", dir.display()))?;
            let path = dir.join(format!("e={:.4}.json", error_rate));
            fs::write(&path, serde_json::to_string_pretty(&stats)?)
                .with_context(|| format!("writing {}", path.display()))?;

            println!(
                "d={} p={:.4}: L1 coverage={:.2}%, L1 accuracy={:.2}%, shots={}",
                distance, error_rate, stats.l1_coverage, stats.l1_accuracy, stats.num_shots,
            );
        }
    }
    Ok(())
}

fn run_error_frequency(opts: &ResolvedOptions) -> Result<()> {
    for &distance in &opts.distances {
        let lattice = Lattice::new(distance)?;
        for &error_rate in &opts.error_rates {
            let model = load_dem_model(opts, distance, error_rate)?;
            let (detector_map, _) = load_maps(opts, distance)?;
            info!(distance, error_rate, shots = opts.num_shots, "classifying mechanisms");

            let mut frequency = ErrorFrequency::default();
            let mut sampler = DemSampler::new(&model, opts.seed);
            for _ in 0..opts.num_shots {
                let shot = sampler.sample();
                for &id in &shot.triggered {
                    let detectors = &model.mechanisms[id as usize].detectors;
                    if let Some(class) = classify_mechanism(detectors, &detector_map, &lattice) {
                        frequency.record(class);
                    }
                }
            }

            let dir = opts
                .output_dir
                .join("error_frequency")
                .join(format!("d={}", distance));
            fs::create_dir_all(&dir)?;
            let path = dir.join(format!("e={:.4}.json", error_rate));
            fs::write(&path, serde_json::to_string_pretty(&frequency)?)?;
            println!(
                "d={} p={:.4}: {} mechanisms classified",
                distance, error_rate, frequency.total
            );
        }
    }
    Ok(())
}

fn run_chain_length(opts: &ResolvedOptions) -> Result<()> {
    for &distance in &opts.distances {
        for &error_rate in &opts.error_rates {
            let model = load_dem_model(opts, distance, error_rate)?;
            info!(distance, error_rate, shots = opts.num_shots, "measuring chain lengths");

            let mut histogram = ChainLengthHistogram::default();
            let mut sampler = DemSampler::new(&model, opts.seed);
            for _ in 0..opts.num_shots {
                let shot = sampler.sample();
                histogram.record(max_chain_length(&shot.triggered, &model));
            }

            let dir = opts
                .output_dir
                .join("chain_length")
                .join(format!("d={}", distance));
            fs::create_dir_all(&dir)?;
            let path = dir.join(format!("e={:.4}.json", error_rate));
            fs::write(&path, serde_json::to_string_pretty(&histogram)?)?;
            println!(
                "d={} p={:.4}: {} shots histogrammed",
                distance, error_rate, histogram.num_shots
            );
        }
    }
    Ok(())
}

/// A DEM file discovered in the DEM directory.
struct DemFileInfo {
    path: PathBuf,
    distance: usize,
    noise: f64,
}

/// Extract distance and noise from names like `surface_d5_r6_p0.0010.dem`.
fn parse_dem_filename(path: &Path) -> Option<DemFileInfo> {
    let stem = path.file_stem()?.to_str()?;
    let distance = tagged_field(stem, "_d")?.parse().ok()?;
    let noise = tagged_field(stem, "_p")?.parse().ok()?;
    Some(DemFileInfo {
        path: path.to_path_buf(),
        distance,
        noise,
    })
}

fn tagged_field<'a>(stem: &'a str, tag: &str) -> Option<&'a str> {
    let start = stem.find(tag)? + tag.len();
    let rest = &stem[start..];
    Some(&rest[..rest.find('_').unwrap_or(rest.len())])
}

fn load_dem_model(opts: &ResolvedOptions, distance: usize, error_rate: f64) -> Result<DetectorModel> {
    let dir = opts
        .dem_dir
        .as_ref()
        .context("this experiment needs --dem-dir")?;
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "dem") {
            if let Some(info) = parse_dem_filename(&path) {
                files.push(info);
            }
        }
    }
    let info = files
        .iter()
        .find(|f| f.distance == distance && (f.noise - error_rate).abs() < 1e-9)
        .with_context(|| {
            format!(
                "no DEM file for d={} p={} in {}",
                distance,
                error_rate,
                dir.display()
            )
        })?;
    let content = fs::read_to_string(&info.path)
        .with_context(|| format!("reading {}", info.path.display()))?;
    parse_dem(&content).with_context(|| format!("parsing {}", info.path.display()))
}

fn load_maps(opts: &ResolvedOptions, distance: usize) -> Result<(DetectorMap, ErrorMap)> {
    let dir = opts
        .metadata_dir
        .as_ref()
        .context("this experiment needs --metadata-dir")?;
    let base = dir.join(format!("d={}", distance));
    Ok((
        DetectorMap::load(&base.join("detectors_to_syndromes.json"))?,
        ErrorMap::load(&base.join("errors_to_qubits.json"))?,
    ))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(
            std::env::var("RUST_LOG")
                .ok()
                .and_then(|level| level.parse::<LevelFilter>().ok())
                .unwrap_or(LevelFilter::INFO),
        )
        .init();

    let cli = Cli::parse();
    let opts = resolve_options(cli.opts)?;

    match cli.command.unwrap_or(Command::LogicalErrorRate) {
        Command::LogicalErrorRate => run_logical_error_rate(&opts),
        Command::L1Statistics => run_l1_statistics(&opts),
        Command::ErrorFrequency => run_error_frequency(&opts),
        Command::ChainLength => run_chain_length(&opts),
    }
}
