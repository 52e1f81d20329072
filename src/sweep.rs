//! 参数扫描驱动
//!
//! 对每个参数组合实例化一个编码，依次驱动 TraceRunner / StatsAggregator /
//! RunReport。配置是一次构造的不可变 `SweepConfig`，可从 JSON 文件加载。

use crate::encoding::{
    BloomEncoding, ChunkRounding, Encoding, MinSketchConfig, MinSketchEncoding,
    PrimeProductEncoding,
};
use crate::report::{ReportMode, RunReport};
use crate::stats::StatsAggregator;
use crate::topo::TopologySource;
use crate::trace::{TraceError, TraceRunner, TraceSpec};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SweepError {
    #[error(transparent)]
    Config(#[from] crate::encoding::ConfigError),
    #[error(transparent)]
    Trace(#[from] TraceError),
    #[error("write report: {0}")]
    Io(#[from] std::io::Error),
    #[error("read sweep config: {0}")]
    ReadConfig(std::io::Error),
    #[error("parse sweep config: {0}")]
    ParseConfig(#[from] serde_json::Error),
}

/// min-sketch 变体的扫描维度
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinSketchSweep {
    /// b 的取值（reset 间隔增长因子）
    #[serde(default = "default_reset_factors")]
    pub reset_factors: Vec<u64>,
    /// (c, H) 对
    #[serde(default = "default_chunk_hash")]
    pub chunk_hash: Vec<(usize, usize)>,
    /// z 的取值（存储位数）
    #[serde(default = "default_id_bits")]
    pub id_bits: Vec<u32>,
    /// chunk 边界用整数上取整而非浮点除法
    #[serde(default)]
    pub ceiling: bool,
}

fn default_reset_factors() -> Vec<u64> {
    vec![4]
}

fn default_chunk_hash() -> Vec<(usize, usize)> {
    vec![(1, 1)]
}

fn default_id_bits() -> Vec<u32> {
    vec![32]
}

impl Default for MinSketchSweep {
    fn default() -> Self {
        Self {
            reset_factors: default_reset_factors(),
            chunk_hash: default_chunk_hash(),
            id_bits: default_id_bits(),
            ceiling: false,
        }
    }
}

/// bloom filter 变体的扫描维度
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BloomSweep {
    #[serde(default = "default_bf_capacity")]
    pub capacity: usize,
    #[serde(default = "default_bf_error_rates")]
    pub error_rates: Vec<f64>,
}

fn default_bf_capacity() -> usize {
    7
}

fn default_bf_error_rates() -> Vec<f64> {
    vec![0.01, 0.001, 0.0001, 0.00001]
}

impl Default for BloomSweep {
    fn default() -> Self {
        Self {
            capacity: default_bf_capacity(),
            error_rates: default_bf_error_rates(),
        }
    }
}

/// 一次扫描的完整（不可变）配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// 每个 (形状 × 参数组合) 生成的遍历条数
    #[serde(default = "default_runs")]
    pub runs: usize,
    /// B 的取值
    #[serde(default = "default_entry_hops")]
    pub entry_hops: Vec<u32>,
    /// L 的取值
    #[serde(default = "default_cycle_lengths")]
    pub cycle_lengths: Vec<u32>,
    /// Th 的取值
    #[serde(default = "default_detections")]
    pub detections: Vec<u32>,
    /// 生成合成环
    #[serde(default = "default_true")]
    pub gen_loops: bool,
    /// 生成与环长度匹配（B + L）的无环路径
    #[serde(default = "default_true")]
    pub gen_paths: bool,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// 单条遍历的喂入跳数上限
    #[serde(default = "default_max_hops")]
    pub max_hops: u64,
    #[serde(default)]
    pub min_sketch: Option<MinSketchSweep>,
    #[serde(default)]
    pub bloom: Option<BloomSweep>,
    /// 素数乘积基线（无自有参数）
    #[serde(default)]
    pub prime_product: bool,
}

fn default_runs() -> usize {
    100_000
}

fn default_entry_hops() -> Vec<u32> {
    vec![5]
}

fn default_cycle_lengths() -> Vec<u32> {
    vec![20]
}

fn default_detections() -> Vec<u32> {
    vec![1]
}

fn default_true() -> bool {
    true
}

fn default_seed() -> u64 {
    crate::encoding::DEFAULT_SEED
}

fn default_max_hops() -> u64 {
    100_000
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            runs: default_runs(),
            entry_hops: default_entry_hops(),
            cycle_lengths: default_cycle_lengths(),
            detections: default_detections(),
            gen_loops: true,
            gen_paths: true,
            seed: default_seed(),
            max_hops: default_max_hops(),
            min_sketch: Some(MinSketchSweep::default()),
            bloom: None,
            prime_product: false,
        }
    }
}

impl SweepConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SweepError> {
        let raw = std::fs::read_to_string(path).map_err(SweepError::ReadConfig)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// 执行整个扫描，把报表写入 `out`
#[tracing::instrument(skip(cfg, topo, out))]
pub fn run_sweep(
    cfg: &SweepConfig,
    topo: Option<&mut dyn TopologySource>,
    mode: ReportMode,
    out: &mut dyn Write,
) -> Result<(), SweepError> {
    // 拓扑 trace 提前物化一次，供所有参数组合复用
    let external = topo.map(|t| (t.generate_loops(cfg.runs), t.generate_paths(cfg.runs)));

    if let Some(ms) = &cfg.min_sketch {
        let mut first = true;
        for &dets in &cfg.detections {
            for &b in &ms.reset_factors {
                for &(c, h) in &ms.chunk_hash {
                    for &z in &ms.id_bits {
                        let mut enc = MinSketchEncoding::new(MinSketchConfig {
                            reset_factor: b,
                            chunks: c,
                            hashes: h,
                            id_bits: z,
                            detections: dets,
                            rounding: if ms.ceiling {
                                ChunkRounding::Ceiling
                            } else {
                                ChunkRounding::Exact
                            },
                            seed: cfg.seed,
                        })?;
                        run_combination(cfg, &mut enc, &external, mode, &mut first, out)?;
                    }
                }
            }
        }
        writeln!(out)?;
    }

    if let Some(bf) = &cfg.bloom {
        let mut first = true;
        for &dets in &cfg.detections {
            for &rate in &bf.error_rates {
                let mut enc = BloomEncoding::new(bf.capacity, rate, dets)?;
                run_combination(cfg, &mut enc, &external, mode, &mut first, out)?;
            }
        }
        writeln!(out)?;
    }

    if cfg.prime_product {
        let mut first = true;
        let needed = max_trace_len(cfg, &external);
        for &dets in &cfg.detections {
            let mut enc = PrimeProductEncoding::new(dets, needed)?;
            run_combination(cfg, &mut enc, &external, mode, &mut first, out)?;
        }
        writeln!(out)?;
    }

    Ok(())
}

/// 本次扫描会出现的最长遍历（素数乘积编码的构造期校验依据）
fn max_trace_len(cfg: &SweepConfig, external: &Option<(Vec<(u32, u32)>, Vec<u32>)>) -> usize {
    let mut needed = 0usize;
    if cfg.gen_loops || cfg.gen_paths {
        for &b in &cfg.entry_hops {
            for &l in &cfg.cycle_lengths {
                needed = needed.max(b as usize + l as usize);
            }
        }
    }
    if let Some((loops, paths)) = external {
        for &(b, l) in loops {
            needed = needed.max(b as usize + l as usize);
        }
        for &p in paths {
            needed = needed.max(p as usize);
        }
    }
    needed
}

/// 跑一个参数组合：每个 (B, L) 形状出一行报表，外部 trace 批次单独成行
fn run_combination(
    cfg: &SweepConfig,
    enc: &mut dyn Encoding,
    external: &Option<(Vec<(u32, u32)>, Vec<u32>)>,
    mode: ReportMode,
    first: &mut bool,
    out: &mut dyn Write,
) -> Result<(), SweepError> {
    if cfg.gen_loops || cfg.gen_paths {
        for &b in &cfg.entry_hops {
            for &l in &cfg.cycle_lengths {
                let mut agg = StatsAggregator::new();
                if cfg.gen_loops {
                    let mut runner = TraceRunner::new(cfg.seed, cfg.max_hops);
                    runner.run(enc, TraceSpec::Loop { entry: b, cycle: l }, cfg.runs, &mut agg)?;
                }
                if cfg.gen_paths {
                    let mut runner = TraceRunner::new(cfg.seed, cfg.max_hops);
                    runner.run(enc, TraceSpec::Path { length: b + l }, cfg.runs, &mut agg)?;
                }
                emit_report(enc, &agg, mode, first, out)?;
            }
        }
    }

    if let Some((loops, paths)) = external {
        let mut agg = StatsAggregator::new();
        let mut runner = TraceRunner::new(cfg.seed, cfg.max_hops);
        runner.run_loops(enc, loops, &mut agg)?;
        let mut runner = TraceRunner::new(cfg.seed, cfg.max_hops);
        runner.run_paths(enc, paths, &mut agg)?;
        emit_report(enc, &agg, mode, first, out)?;
    }
    Ok(())
}

/// 汇总一个批次并写出一行/一块报表
fn emit_report(
    enc: &dyn Encoding,
    agg: &StatsAggregator,
    mode: ReportMode,
    first: &mut bool,
    out: &mut dyn Write,
) -> Result<(), SweepError> {
    let stats = agg.summarize();
    info!(
        runs = stats.runs,
        loops = stats.loops,
        paths = stats.paths,
        fp_pct = stats.fp_pct,
        "batch finished"
    );

    let report = RunReport::new(enc.describe(), enc.detections(), &stats);
    match mode {
        ReportMode::Csv => {
            if *first {
                writeln!(out, "{}", report.header())?;
                *first = false;
            }
            writeln!(out, "{}", report.csv_row())?;
        }
        ReportMode::Table => {
            writeln!(out, "{}", report.block())?;
            *first = false;
        }
    }
    Ok(())
}
