//! cbn-datagen: build, cache and featurise CBN DOA datasets.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ndarray_npy::write_npy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use cbn_datagen::cache::{check_data_exists, load_generated_data, read_manifest};
use cbn_datagen::covariance::{covariance_features, CovarianceKind};
use cbn_datagen::features::training_features;
use cbn_datagen::{apply_wgn, logging, Dataset, RunConfig, SnrRange, ThetaDistribution};

#[derive(Debug, Parser)]
#[command(name = "cbn-datagen")]
#[command(about = "Synthetic ULA direction-of-arrival datasets for CBN receivers")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// TOML run configuration; built-in defaults when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, clap::Args)]
struct Overrides {
    /// Number of antennas (N)
    #[arg(short = 'n', long, global = true)]
    antennas: Option<usize>,

    /// Number of sources (K)
    #[arg(short = 'k', long, global = true)]
    sources: Option<usize>,

    /// Snapshots per scene (L)
    #[arg(short = 'l', long, global = true)]
    replicas: Option<usize>,

    /// Number of scenes
    #[arg(long, global = true)]
    training_size: Option<usize>,

    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Angle distribution: uniform, normal, zeros, ones
    #[arg(long, global = true, value_parser = parse_distribution)]
    dist: Option<ThetaDistribution>,

    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Covariance outer product: transpose (Y^T Y) or hermitian (Y^H Y)
    #[arg(long, global = true, value_parser = parse_covariance)]
    covariance: Option<CovarianceKind>,

    /// Always regenerate and never touch the cache
    #[arg(long, global = true, default_value_t = false)]
    no_cache: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate a dataset or reuse the cached one
    Generate,

    /// Add noise and write a feature matrix for training
    Features {
        #[arg(long, value_enum, default_value = "stacked")]
        kind: FeatureKind,

        /// Lower SNR bound (dB)
        #[arg(long)]
        snr_min: Option<f64>,

        /// Upper SNR bound (dB)
        #[arg(long)]
        snr_max: Option<f64>,

        /// Output basename; writes <out>_features.npy and <out>_labels.npy
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Print shape and label statistics of a cached dataset
    Inspect,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FeatureKind {
    /// Normalised [Re | Im] of all L snapshots
    Stacked,
    /// [Re | Im] of the sample covariance matrix
    Covariance,
}

fn parse_distribution(raw: &str) -> Result<ThetaDistribution, String> {
    raw.parse().map_err(|err: cbn_datagen::CbnError| err.to_string())
}

fn parse_covariance(raw: &str) -> Result<CovarianceKind, String> {
    raw.parse().map_err(|err: cbn_datagen::CbnError| err.to_string())
}

fn resolve_config(cli: &Cli) -> Result<RunConfig> {
    let mut cfg = match &cli.config {
        Some(path) => RunConfig::from_toml_file(path)
            .with_context(|| format!("failed to load config: {}", path.display()))?,
        None => RunConfig::default(),
    };

    let o = &cli.overrides;
    if let Some(n) = o.antennas {
        cfg.generator.antennas = n;
    }
    if let Some(k) = o.sources {
        cfg.generator.sources = k;
    }
    if let Some(l) = o.replicas {
        cfg.replicas = l;
    }
    if let Some(size) = o.training_size {
        cfg.training_size = size;
    }
    if let Some(seed) = o.seed {
        cfg.seed = seed;
    }
    if let Some(dist) = o.dist {
        cfg.generator.distribution = dist;
    }
    if let Some(dir) = &o.cache_dir {
        cfg.cache_dir = dir.clone();
    }
    if let Some(kind) = o.covariance {
        cfg.covariance = kind;
    }
    if o.no_cache {
        cfg.use_cache = false;
    }

    cfg.validate().context("invalid run configuration")?;
    Ok(cfg)
}

fn build_dataset(cfg: &RunConfig, rng: &mut ChaCha8Rng) -> Result<Dataset> {
    let (dataset, outcome) = cfg
        .cache()
        .initialize(cfg.training_size, cfg.replicas, &cfg.generator, cfg.use_cache, rng)
        .context("failed to initialise dataset")?;
    tracing::info!(?outcome, scenes = dataset.scenes(), "dataset ready");
    Ok(dataset)
}

fn print_summary(dataset: &Dataset) {
    let counts = dataset.sources_per_scene();
    let mean = if counts.is_empty() {
        0.0
    } else {
        counts.iter().sum::<usize>() as f64 / counts.len() as f64
    };
    println!("scenes:      {}", dataset.scenes());
    println!("replicas:    {}", dataset.replicas());
    println!("antennas:    {}", dataset.antennas());
    println!("resolution:  {}", dataset.resolution());
    println!("data shape:  {:?}", dataset.data().dim());
    println!("label bins per scene (mean): {mean:.3}");
}

fn run_generate(cfg: &RunConfig) -> Result<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(cfg.seed);
    let dataset = build_dataset(cfg, &mut rng)?;
    print_summary(&dataset);
    if cfg.use_cache {
        let base = cfg
            .cache()
            .basename(&cfg.generator, cfg.replicas, cfg.training_size);
        println!("cache:       {}", base.display());
    }
    Ok(())
}

fn run_features(
    cfg: &RunConfig,
    kind: FeatureKind,
    snr_min: Option<f64>,
    snr_max: Option<f64>,
    out: &Path,
) -> Result<()> {
    let snr = SnrRange::new(
        snr_min.unwrap_or(cfg.snr.min_db),
        snr_max.unwrap_or(cfg.snr.max_db),
    )?;

    let mut rng = ChaCha8Rng::seed_from_u64(cfg.seed);
    let dataset = build_dataset(cfg, &mut rng)?;

    let features = match kind {
        FeatureKind::Stacked => training_features(&dataset, snr, &mut rng)?.0,
        FeatureKind::Covariance => {
            let noisy = apply_wgn(dataset.data(), dataset.replicas(), snr, &mut rng)?;
            covariance_features(&dataset.with_data(noisy.data)?, cfg.covariance)?
        }
    };

    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    let features_path = PathBuf::from(format!("{}_features.npy", out.display()));
    let labels_path = PathBuf::from(format!("{}_labels.npy", out.display()));
    write_npy(&features_path, &features)
        .with_context(|| format!("failed to write {}", features_path.display()))?;
    write_npy(&labels_path, dataset.labels())
        .with_context(|| format!("failed to write {}", labels_path.display()))?;

    println!("features {:?} -> {}", features.dim(), features_path.display());
    println!("labels   {:?} -> {}", dataset.labels().dim(), labels_path.display());
    Ok(())
}

fn run_inspect(cfg: &RunConfig) -> Result<()> {
    let base = cfg
        .cache()
        .basename(&cfg.generator, cfg.replicas, cfg.training_size);
    if !check_data_exists(&base) {
        bail!("no cached dataset at {}", base.display());
    }
    let dataset = load_generated_data(&base, cfg.replicas)
        .with_context(|| format!("failed to load {}", base.display()))?;

    println!("cache:       {}", base.display());
    print_summary(&dataset);
    match read_manifest(&base) {
        Ok(manifest) => println!("manifest:    {}", serde_json::to_string(&manifest)?),
        Err(err) => tracing::warn!(%err, "no readable manifest"),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let cfg = resolve_config(&cli)?;

    match &cli.command {
        Commands::Generate => run_generate(&cfg),
        Commands::Features {
            kind,
            snr_min,
            snr_max,
            out,
        } => run_features(&cfg, *kind, *snr_min, *snr_max, out),
        Commands::Inspect => run_inspect(&cfg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cbn_datagen::CacheKeying;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("cbn-datagen").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults_without_config() {
        let cfg = resolve_config(&parse(&["generate"])).unwrap();
        assert_eq!(cfg, RunConfig::default());
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        std::fs::write(
            &path,
            r#"
            training_size = 100
            replicas = 3
            seed = 7
            keying = "shape"
            covariance = "hermitian"

            [generator]
            antennas = 16
            sources = 2
            "#,
        )
        .unwrap();
        let path = path.to_string_lossy().into_owned();

        let cfg = resolve_config(&parse(&["--config", &path, "generate"])).unwrap();
        assert_eq!(cfg.training_size, 100);
        assert_eq!(cfg.replicas, 3);
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.generator.antennas, 16);
        assert!(cfg.use_cache);

        let cfg = resolve_config(&parse(&[
            "--config",
            &path,
            "-l",
            "2",
            "--seed",
            "9",
            "-k",
            "3",
            "--dist",
            "normal",
            "--covariance",
            "transpose",
            "--no-cache",
            "generate",
        ]))
        .unwrap();
        assert_eq!(cfg.training_size, 100);
        assert_eq!(cfg.replicas, 2);
        assert_eq!(cfg.seed, 9);
        assert_eq!(cfg.generator.antennas, 16);
        assert_eq!(cfg.generator.sources, 3);
        assert_eq!(cfg.generator.distribution, ThetaDistribution::Normal);
        assert_eq!(cfg.covariance, CovarianceKind::Transpose);
        assert_eq!(cfg.keying, CacheKeying::Shape);
        assert!(!cfg.use_cache);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&[
            "features",
            "--kind",
            "covariance",
            "-o",
            "out/run",
            "-n",
            "12",
            "--cache-dir",
            "/tmp/cbn",
        ]);
        assert!(matches!(
            cli.command,
            Commands::Features {
                kind: FeatureKind::Covariance,
                ..
            }
        ));
        let cfg = resolve_config(&cli).unwrap();
        assert_eq!(cfg.generator.antennas, 12);
        assert_eq!(cfg.cache_dir, PathBuf::from("/tmp/cbn"));
    }

    #[test]
    fn test_rejects_invalid_values() {
        let bin = std::iter::once("cbn-datagen");
        assert!(Cli::try_parse_from(bin.clone().chain(["--dist", "cauchy", "generate"])).is_err());
        assert!(Cli::try_parse_from(bin.chain(["--covariance", "outer", "generate"])).is_err());

        assert!(resolve_config(&parse(&["-k", "0", "generate"])).is_err());
        assert!(resolve_config(&parse(&["-k", "200", "generate"])).is_err());
        assert!(resolve_config(&parse(&["--training-size", "0", "generate"])).is_err());
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let path = path.to_string_lossy().into_owned();
        assert!(resolve_config(&parse(&["--config", &path, "inspect"])).is_err());
    }
}
