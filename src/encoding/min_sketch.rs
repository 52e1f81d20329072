//! Min-sketch 编码
//!
//! 遍历被划分为指数增长的 phase（`psize_0 = 1`，`psize_{i+1} = psize_i * b`），
//! 每个 phase 再切成 `c` 个 chunk 窗口。每个 chunk 槽位保存 `H` 个哈希：
//! 窗口首跳整槽覆盖，窗口内逐元素取 min（保留窗口内最小哈希，
//! 偶然再次命中的概率低于任意哈希）。任一槽位的任一存储哈希与对应
//! 计算哈希一致即为一次重访信号。窗口随 phase 指数变宽：短环被细粒度
//! 窗口尽快抓住，长环最终也会落入足够宽的窗口，而内存始终有界。

use super::{ConfigError, DetectionGate, Encoding, GroundTruth, HashSeedProvider, NodeId, mix64};
use crate::report::Column;
use crate::stats::TraversalRecord;
use tracing::debug;

/// 空槽哨兵：哈希至多 32 位，u64::MAX 不会与任何计算结果相等
const UNSET: u64 = u64::MAX;

/// chunk 边界取整策略（两种语义都保留，由配置决定）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkRounding {
    /// `csize = psize / c`，边界按 `ceil(csize * j)` 对齐（浮点除法）
    Exact,
    /// `csize = ceil(psize / c)`（整数上取整）
    Ceiling,
}

#[derive(Debug, Clone)]
pub struct MinSketchConfig {
    /// b：reset 间隔的增长因子（> 1）
    pub reset_factor: u64,
    /// c：phase 被切分成的 chunk 数
    pub chunks: usize,
    /// H：哈希函数个数
    pub hashes: usize,
    /// z：每个存储 id/哈希保留的位数（1..=32）
    pub id_bits: u32,
    /// Th：确认门限
    pub detections: u32,
    pub rounding: ChunkRounding,
    /// 哈希种子派生用 master seed
    pub seed: u64,
}

impl Default for MinSketchConfig {
    fn default() -> Self {
        Self {
            reset_factor: 4,
            chunks: 1,
            hashes: 1,
            id_bits: 32,
            detections: 1,
            rounding: ChunkRounding::Exact,
            seed: super::DEFAULT_SEED,
        }
    }
}

/// 一次遍历内的 sketch 状态（有界：c × H 个槽位 + phase 游标）
#[derive(Debug, Clone)]
struct SketchState {
    /// c 个 chunk 槽位，各存 H 个哈希
    slots: Vec<Vec<u64>>,
    /// 当前 phase 长度
    psize: u64,
    /// 当前 chunk 跨度（Exact 模式下保留小数部分）
    csize: f64,
    /// phase 内已处理的跳数
    phop: u64,
}

impl SketchState {
    fn new(chunks: usize, hashes: usize) -> Self {
        Self {
            slots: vec![vec![UNSET; hashes]; chunks],
            psize: 1,
            csize: 1.0,
            phop: 0,
        }
    }
}

pub struct MinSketchEncoding {
    cfg: MinSketchConfig,
    /// per-hash xor 掩码（由种子派生）
    masks: Vec<u64>,
    /// false 时直接使用原始节点 id（z=32 且 H<=1）
    hashed: bool,
    state: SketchState,
    truth: GroundTruth,
    gate: DetectionGate,
}

impl MinSketchEncoding {
    pub fn new(cfg: MinSketchConfig) -> Result<Self, ConfigError> {
        if cfg.reset_factor <= 1 {
            return Err(ConfigError::InvalidResetFactor(cfg.reset_factor));
        }
        if cfg.chunks < 1 {
            return Err(ConfigError::InvalidChunkCount(cfg.chunks));
        }
        if cfg.hashes < 1 {
            return Err(ConfigError::InvalidHashCount(cfg.hashes));
        }
        if cfg.id_bits < 1 || cfg.id_bits > 32 {
            return Err(ConfigError::InvalidIdWidth(cfg.id_bits));
        }
        let gate = DetectionGate::new(cfg.detections)?;
        let hashed = cfg.id_bits < 32 || cfg.hashes > 1;
        let masks = HashSeedProvider::seeds(cfg.seed, cfg.hashes);
        let state = SketchState::new(cfg.chunks, cfg.hashes);
        Ok(Self {
            cfg,
            masks,
            hashed,
            state,
            truth: GroundTruth::default(),
            gate,
        })
    }

    /// 计算第 `i` 个哈希；未启用哈希时节点 id 自身即"哈希"
    fn hash_node(&self, node: NodeId, i: usize) -> u64 {
        if !self.hashed {
            return node.0 as u64;
        }
        let mask_bits = (1u64 << self.cfg.id_bits) - 1;
        (mix64(node.0 as u64) ^ self.masks[i]) & mask_bits
    }

    /// chunk `j` 在当前 phase 内的窗口下界（含）
    fn chunk_lower(&self, j: usize) -> u64 {
        (self.state.csize * j as f64).ceil() as u64
    }

    /// chunk `j` 在当前 phase 内的窗口上界（不含）
    fn chunk_upper(&self, j: usize) -> u64 {
        (self.state.csize * (j + 1) as f64).ceil() as u64
    }

    fn next_chunk_span(&self, psize: u64) -> f64 {
        match self.cfg.rounding {
            ChunkRounding::Exact => psize as f64 / self.cfg.chunks as f64,
            ChunkRounding::Ceiling => psize.div_ceil(self.cfg.chunks as u64) as f64,
        }
    }

    #[cfg(test)]
    pub(crate) fn slot_shape(&self) -> (usize, usize) {
        (self.state.slots.len(), self.state.slots[0].len())
    }

    #[cfg(test)]
    pub(crate) fn hash_for_test(&self, node: NodeId, i: usize) -> u64 {
        self.hash_node(node, i)
    }
}

impl Encoding for MinSketchEncoding {
    fn reset(&mut self) {
        self.state = SketchState::new(self.cfg.chunks, self.cfg.hashes);
        self.truth.reset();
        self.gate.reset();
    }

    fn process(&mut self, node: NodeId, _index: usize) -> bool {
        if self.gate.confirmed() {
            return false;
        }
        self.truth.observe(node);

        let hashes: Vec<u64> = (0..self.cfg.hashes).map(|i| self.hash_node(node, i)).collect();

        // 任一 chunk 槽位的任一存储哈希与对应计算哈希一致 => 重访信号
        // （逐元素 min 后各位置的最小值可能来自不同节点）
        let hit = self
            .state
            .slots
            .iter()
            .any(|slot| slot.iter().zip(&hashes).any(|(&s, &h)| s == h));

        if hit {
            debug!(node = node.0, "min-sketch revisit signal");
            if self.gate.signal() {
                return false;
            }
        }

        self.truth.accept(node);

        // 更新 sketch：窗口首跳整槽覆盖，窗口内逐元素取 min
        for j in 0..self.state.slots.len() {
            let lower = self.chunk_lower(j);
            let upper = self.chunk_upper(j);
            if self.state.phop == lower {
                self.state.slots[j].copy_from_slice(&hashes);
            } else if self.state.phop > lower && self.state.phop < upper {
                for (stored, &h) in self.state.slots[j].iter_mut().zip(&hashes) {
                    *stored = (*stored).min(h);
                }
            }
        }

        self.state.phop += 1;
        if self.state.phop == self.state.psize {
            // 进入下一个 phase：长度乘 b，chunk 跨度按新 phase 重算
            self.state.psize *= self.cfg.reset_factor;
            self.state.phop = 0;
            self.state.csize = self.next_chunk_span(self.state.psize);
        }

        true
    }

    fn finalize(&self) -> TraversalRecord {
        self.truth.record(self.gate.confirmed())
    }

    fn describe(&self) -> Vec<Column> {
        vec![
            Column::new("Class", "MinSketch"),
            Column::new("z", self.cfg.id_bits.to_string()),
            Column::new("b", self.cfg.reset_factor.to_string()),
            Column::new("c", self.cfg.chunks.to_string()),
            Column::new("H", self.cfg.hashes.to_string()),
            Column::with_unit("Mem", Column::fmt_num(self.memory_bits()), "bits"),
        ]
    }

    fn memory_bits(&self) -> f64 {
        (self.cfg.id_bits as usize * self.cfg.chunks * self.cfg.hashes) as f64
            + self.gate.memory_bits()
    }

    fn detections(&self) -> u32 {
        self.cfg.detections
    }
}

impl std::fmt::Debug for MinSketchEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MinSketchEncoding")
            .field("cfg", &self.cfg)
            .field("state", &self.state)
            .finish()
    }
}
