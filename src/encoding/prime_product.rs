//! 素数乘积编码
//!
//! 精确的零误报基线：运行乘积从 1 开始，遍历第 `index` 跳对应固定素数表
//! 的 `primes[index]`。乘积能被该素数整除当且仅当这个位置之前已被接受
//! 过（环段回放时 `index` 回绕，同一位置重用同一素数）。接受一跳后把
//! 该素数乘进运行乘积。编码的是"位置 index 是否访问过"而非节点身份，
//! 真实部署中乘积无界增长，这里只是理想化的参照结构。
//!
//! 乘积始终是表内素数的幂积，因此用素因子集合（每个素数下标一位）精确
//! 表示：整除性测试退化为位测试，对编码执行的所有整除查询与无界整数
//! 语义一致，且不会溢出。

use super::{ConfigError, DetectionGate, Encoding, GroundTruth, NodeId};
use crate::report::Column;
use crate::stats::TraversalRecord;
use tracing::debug;

/// 前 128 个素数；表长即编码可支持的最大遍历长度
const PRIMES: [u64; 128] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29,
    31, 37, 41, 43, 47, 53, 59, 61, 67, 71,
    73, 79, 83, 89, 97, 101, 103, 107, 109, 113,
    127, 131, 137, 139, 149, 151, 157, 163, 167, 173,
    179, 181, 191, 193, 197, 199, 211, 223, 227, 229,
    233, 239, 241, 251, 257, 263, 269, 271, 277, 281,
    283, 293, 307, 311, 313, 317, 331, 337, 347, 349,
    353, 359, 367, 373, 379, 383, 389, 397, 401, 409,
    419, 421, 431, 433, 439, 443, 449, 457, 461, 463,
    467, 479, 487, 491, 499, 503, 509, 521, 523, 541,
    547, 557, 563, 569, 571, 577, 587, 593, 599, 601,
    607, 613, 617, 619, 631, 641, 643, 647, 653, 659,
    661, 673, 677, 683, 691, 701, 709, 719,
];

pub const PRIME_TABLE_LEN: usize = PRIMES.len();

#[derive(Debug)]
pub struct PrimeProductEncoding {
    max_hops: usize,
    /// 运行乘积的素因子集合：第 i 位表示 primes[i] 已乘入
    factors: u128,
    truth: GroundTruth,
    gate: DetectionGate,
}

impl PrimeProductEncoding {
    /// `max_hops` 是本编码需要支持的最长遍历；超出素数表即致命配置错误
    pub fn new(detections: u32, max_hops: usize) -> Result<Self, ConfigError> {
        if max_hops > PRIMES.len() {
            return Err(ConfigError::PrimeTableExhausted {
                needed: max_hops,
                available: PRIMES.len(),
            });
        }
        Ok(Self {
            max_hops,
            factors: 0,
            truth: GroundTruth::default(),
            gate: DetectionGate::new(detections)?,
        })
    }

    #[cfg(test)]
    pub(crate) fn prime_at(index: usize) -> u64 {
        PRIMES[index]
    }
}

impl Encoding for PrimeProductEncoding {
    fn reset(&mut self) {
        self.factors = 0;
        self.truth.reset();
        self.gate.reset();
    }

    fn process(&mut self, node: NodeId, index: usize) -> bool {
        if self.gate.confirmed() {
            return false;
        }
        self.truth.observe(node);

        // 整除性 <=> primes[index] 已在因子集合中
        let divisible = self.factors & (1u128 << index) != 0;
        if divisible {
            debug!(node = node.0, index, "prime product divisibility signal");
            if self.gate.signal() {
                return false;
            }
        }

        self.truth.accept(node);
        self.factors |= 1u128 << index;
        true
    }

    fn finalize(&self) -> TraversalRecord {
        self.truth.record(self.gate.confirmed())
    }

    fn describe(&self) -> Vec<Column> {
        vec![
            Column::new("Class", "PrimeProduct"),
            Column::with_unit("Mem", Column::fmt_num(self.memory_bits()), "bits"),
        ]
    }

    fn memory_bits(&self) -> f64 {
        // 名义开销：仅确认计数器；乘积本身在真实实现中是无界的
        self.gate.memory_bits()
    }

    fn detections(&self) -> u32 {
        self.gate.threshold()
    }

    fn hop_limit(&self) -> Option<usize> {
        Some(self.max_hops)
    }
}
