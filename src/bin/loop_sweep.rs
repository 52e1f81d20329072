//! 环路检测编码参数扫描
//!
//! 按配置对 min-sketch / bloom filter / 素数乘积编码做参数扫描，
//! 输出每个组合的误报率与检测时延统计。

use clap::Parser;
use loopsim_rs::report::ReportMode;
use loopsim_rs::sweep::{self, SweepConfig};
use loopsim_rs::topo::{StaticTopology, TopologySource};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "loop-sweep",
    about = "Sweep loop-detection header encodings over synthetic traversals"
)]
struct Args {
    /// Sweep config JSON (defaults used when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override number of traversals per combination
    #[arg(short, long)]
    runs: Option<usize>,

    /// Topology trace JSON with pre-generated loops/paths
    #[arg(long)]
    traces: Option<PathBuf>,

    /// Emit comma-separated rows instead of labeled blocks
    #[arg(long)]
    csv: bool,

    /// Override the sampling/hashing seed
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> ExitCode {
    // 初始化 tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("loop-sweep: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut cfg = match &args.config {
        Some(path) => SweepConfig::from_json_file(path)?,
        None => SweepConfig::default(),
    };
    if let Some(runs) = args.runs {
        cfg.runs = runs;
    }
    if let Some(seed) = args.seed {
        cfg.seed = seed;
    }

    let mut topo = match &args.traces {
        Some(path) => Some(StaticTopology::from_json_file(path)?),
        None => None,
    };
    let topo_ref = topo.as_mut().map(|t| t as &mut dyn TopologySource);

    let mode = if args.csv {
        ReportMode::Csv
    } else {
        ReportMode::Table
    };

    let mut stdout = std::io::stdout().lock();
    sweep::run_sweep(&cfg, topo_ref, mode, &mut stdout)?;
    Ok(())
}
