use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use match_cli::{
    BinKind, FeatureStore, IndexKind, LogProgress, MatcherConfig, PUTATIVE_MATCHES_FILE, SparseMatchPipeline,
    read_image_list, save_matches,
};

/// Compute putative feature matches between the images of a collection
#[derive(Debug, Parser)]
#[command(name = "sparse-match", version)]
struct Args {
    /// Directory holding <image>.feat and <image>.desc files
    #[arg(short = 'm', long)]
    match_dir: PathBuf,

    /// File listing image names, one per line
    #[arg(short = 'l', long)]
    list: Option<PathBuf>,

    /// Image names, used when no list file is given
    images: Vec<String>,

    /// Matcher settings (TOML, or JSON with a .json extension)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Nearest/second-nearest distance ratio
    #[arg(short = 'r', long)]
    ratio: Option<f32>,

    /// Only match images at most this many ids apart (0 = all pairs)
    #[arg(short = 'p', long)]
    pair_radius: Option<usize>,

    #[arg(short = 't', long)]
    threads: Option<usize>,

    /// Descriptor width
    #[arg(short = 'd', long, default_value_t = 128)]
    dimension: usize,

    #[arg(long, value_enum, default_value_t = BinKind::U8)]
    bins: BinKind,

    #[arg(long, value_enum, default_value_t = IndexKind::BruteForce)]
    index: IndexKind,

    /// Output file, defaults to <match-dir>/matches.putative.txt
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,
}

fn load_config(path: &Path) -> Result<MatcherConfig> {
    let loaded = if path.extension().is_some_and(|ext| ext == "json") {
        MatcherConfig::load_json(path)
    } else {
        MatcherConfig::load_toml(path)
    };
    loaded.map_err(|e| anyhow!("cannot read config {}: {}", path.display(), e))
}

fn build_config(args: &Args) -> Result<MatcherConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => MatcherConfig::default(),
    };
    if let Some(ratio) = args.ratio {
        config.ratio_threshold = ratio;
    }
    if let Some(radius) = args.pair_radius {
        config.pair_radius = radius;
    }
    if let Some(threads) = args.threads {
        config.n_threads = threads;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let images = match &args.list {
        Some(list) => read_image_list(list).with_context(|| format!("reading image list {}", list.display()))?,
        None => args.images.clone(),
    };
    if images.len() < 2 {
        bail!("need at least two images to match, got {}", images.len());
    }

    let config = build_config(&args)?;
    log::info!("{}", config.summary());

    let store = FeatureStore::new(&args.match_dir, args.dimension);
    let pipeline = SparseMatchPipeline::new(store, config, args.index);

    let t0 = Instant::now();
    let table = match args.bins {
        BinKind::U8 => pipeline.run::<u8>(&images, &LogProgress)?,
        BinKind::F32 => pipeline.run::<f32>(&images, &LogProgress)?,
    };
    log::info!("matching took {:.2?}", t0.elapsed());

    let output = args
        .output
        .unwrap_or_else(|| args.match_dir.join(PUTATIVE_MATCHES_FILE));
    save_matches(&table, &output).with_context(|| format!("writing {}", output.display()))?;
    log::info!(
        "wrote {} matches for {} pairs ({} non-empty) to {}",
        table.total_matches(),
        table.len(),
        table.non_empty().count(),
        output.display()
    );
    Ok(())
}
