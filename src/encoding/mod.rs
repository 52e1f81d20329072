//! 报文头内环路检测编码
//!
//! 每种编码结构逐跳消费节点 id，在有界状态内判断当前节点是否已被访问过。
//! 三个变体（min-sketch、bloom filter、素数乘积）实现不同的内存/精度折中。

mod bloom;
mod min_sketch;
mod prime_product;
mod seed;

pub use bloom::BloomEncoding;
pub use min_sketch::{ChunkRounding, MinSketchConfig, MinSketchEncoding};
pub use prime_product::{PRIME_TABLE_LEN, PrimeProductEncoding};
pub use seed::{DEFAULT_SEED, HashSeedProvider, mix64};

use crate::report::Column;
use crate::stats::TraversalRecord;
use thiserror::Error;

/// 节点标识符（32 位交换机 id），编码只依赖其哈希/相等性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// 编码构造期的致命配置错误（不做静默兜底，见 §错误处理）
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reset factor b must be > 1, got {0}")]
    InvalidResetFactor(u64),
    #[error("chunk count c must be >= 1, got {0}")]
    InvalidChunkCount(usize),
    #[error("hash count H must be >= 1, got {0}")]
    InvalidHashCount(usize),
    #[error("stored id width must be 1..=32 bits, got {0}")]
    InvalidIdWidth(u32),
    #[error("detections threshold must be >= 1, got {0}")]
    InvalidDetections(u32),
    #[error("bloom filter capacity must be > 0, got {0}")]
    InvalidCapacity(usize),
    #[error("bloom filter error rate must be in (0, 1), got {0}")]
    InvalidErrorRate(f64),
    #[error("prime table supports at most {available} hops, requested {needed}")]
    PrimeTableExhausted { needed: usize, available: usize },
}

/// 编码结构的统一能力面
///
/// 一次遍历的用法：`reset()` 之后对每一跳调用 `process`，返回 `false`
/// 表示确认门限已跨越，调用方必须停止继续喂入；最后 `finalize()` 取回
/// 本次遍历的记录。
pub trait Encoding {
    /// 为新遍历重置有界状态与诊断记录
    fn reset(&mut self);

    /// 处理一跳。`index` 是该跳在遍历节点数组中的位置（环段回放时会回绕）。
    /// 返回 `false` 当且仅当确认门限被跨越。
    fn process(&mut self, node: NodeId, index: usize) -> bool;

    /// 结束当前遍历并产出记录
    fn finalize(&self) -> TraversalRecord;

    /// 变体自有的配置/内存列（在共享统计列之前）
    fn describe(&self) -> Vec<Column>;

    /// 名义上的报文头内存开销（bits）
    fn memory_bits(&self) -> f64;

    /// 确认门限 Th
    fn detections(&self) -> u32;

    /// 编码支持的最大遍历长度（素数表等固定资源的上限）
    fn hop_limit(&self) -> Option<usize> {
        None
    }
}

/// 诊断用 ground-truth 簿记：完整访问历史与真实 B/L
///
/// 仅用于评分，不计入编码的报文头内存预算（在测试中单独核对）。
#[derive(Debug, Default, Clone)]
pub(crate) struct GroundTruth {
    history: Vec<NodeId>,
    loop_start: Option<usize>,
    loop_size: Option<usize>,
}

impl GroundTruth {
    /// 在信号判定之前调用：首次观察到重访时固定真实 B/L
    pub(crate) fn observe(&mut self, node: NodeId) {
        if self.loop_start.is_none() {
            if let Some(pos) = self.history.iter().position(|&n| n == node) {
                self.loop_start = Some(pos);
                self.loop_size = Some(self.history.len() - pos);
            }
        }
    }

    /// 该跳被接受（未触发确认）后记入历史
    pub(crate) fn accept(&mut self, node: NodeId) {
        self.history.push(node);
    }

    pub(crate) fn reset(&mut self) {
        self.history.clear();
        self.loop_start = None;
        self.loop_size = None;
    }

    pub(crate) fn record(&self, detected: bool) -> TraversalRecord {
        TraversalRecord {
            is_loop: self.loop_start.is_some(),
            detected,
            loop_start: self.loop_start.map(|v| v as u32),
            loop_size: self.loop_size.map(|v| v as u32),
            hop_count: self.history.len() as u64,
        }
    }
}

/// 确认门限计数器（Th）：吸收概率性误报，单次命中不作结论
#[derive(Debug, Clone)]
pub(crate) struct DetectionGate {
    threshold: u32,
    hits: u32,
    confirmed: bool,
}

impl DetectionGate {
    pub(crate) fn new(threshold: u32) -> Result<Self, ConfigError> {
        if threshold < 1 {
            return Err(ConfigError::InvalidDetections(threshold));
        }
        Ok(Self {
            threshold,
            hits: 0,
            confirmed: false,
        })
    }

    /// 记一次重访信号；返回是否达到确认门限
    pub(crate) fn signal(&mut self) -> bool {
        self.hits += 1;
        if self.hits >= self.threshold {
            self.confirmed = true;
        }
        self.confirmed
    }

    pub(crate) fn confirmed(&self) -> bool {
        self.confirmed
    }

    pub(crate) fn threshold(&self) -> u32 {
        self.threshold
    }

    pub(crate) fn reset(&mut self) {
        self.hits = 0;
        self.confirmed = false;
    }

    /// 计数器占用的名义内存（bits）
    pub(crate) fn memory_bits(&self) -> f64 {
        (self.threshold as f64).log2()
    }
}
