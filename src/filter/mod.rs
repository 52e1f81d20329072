//! 通用 bloom filter 原语
//!
//! 供 BloomEncoding 作为库消费的黑盒：按 (capacity, error_rate) 推导
//! slice 数与位数组大小，提供成员测试与插入。无漏报，误报率可调。
//! 推导公式与经典实现一致：
//!   num_slices = ceil(log2(1 / error_rate))
//!   bits_per_slice = ceil(capacity * |ln error_rate| / (num_slices * ln2^2))

use crate::encoding::{ConfigError, HashSeedProvider, mix64};

#[derive(Debug, Clone)]
pub struct BloomFilter {
    num_slices: usize,
    bits_per_slice: usize,
    bits: Vec<u64>,
    seeds: Vec<u64>,
    capacity: usize,
    error_rate: f64,
    count: usize,
}

impl BloomFilter {
    pub fn new(capacity: usize, error_rate: f64) -> Result<Self, ConfigError> {
        Self::with_seed(capacity, error_rate, crate::encoding::DEFAULT_SEED)
    }

    pub fn with_seed(capacity: usize, error_rate: f64, seed: u64) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::InvalidCapacity(capacity));
        }
        if !(error_rate > 0.0 && error_rate < 1.0) {
            return Err(ConfigError::InvalidErrorRate(error_rate));
        }
        let num_slices = (1.0 / error_rate).log2().ceil() as usize;
        let ln2_sq = std::f64::consts::LN_2 * std::f64::consts::LN_2;
        let bits_per_slice =
            (capacity as f64 * error_rate.ln().abs() / (num_slices as f64 * ln2_sq)).ceil()
                as usize;
        let num_bits = num_slices * bits_per_slice;
        let words = num_bits.div_ceil(64);
        Ok(Self {
            num_slices,
            bits_per_slice,
            bits: vec![0u64; words],
            seeds: HashSeedProvider::seeds(seed, num_slices),
            capacity,
            error_rate,
            count: 0,
        })
    }

    /// 位数组总大小（bits）
    pub fn num_bits(&self) -> usize {
        self.num_slices * self.bits_per_slice
    }

    /// 哈希函数（slice）个数
    pub fn num_slices(&self) -> usize {
        self.num_slices
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn error_rate(&self) -> f64 {
        self.error_rate
    }

    /// 已插入的 key 数
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// slice `k` 内 key 的全局位下标
    fn bit_index(&self, k: usize, key: u64) -> usize {
        let h = mix64(key ^ self.seeds[k]) as usize % self.bits_per_slice;
        k * self.bits_per_slice + h
    }

    pub fn contains(&self, key: u64) -> bool {
        (0..self.num_slices).all(|k| {
            let idx = self.bit_index(k, key);
            self.bits[idx / 64] & (1u64 << (idx % 64)) != 0
        })
    }

    /// 插入 key，返回插入前是否已（疑似）存在
    pub fn insert(&mut self, key: u64) -> bool {
        let mut present = true;
        for k in 0..self.num_slices {
            let idx = self.bit_index(k, key);
            let word = idx / 64;
            let mask = 1u64 << (idx % 64);
            if self.bits[word] & mask == 0 {
                present = false;
                self.bits[word] |= mask;
            }
        }
        if !present {
            self.count += 1;
        }
        present
    }

    /// 清空位数组（保留推导出的几何参数）
    pub fn clear(&mut self) {
        self.bits.fill(0);
        self.count = 0;
    }
}
