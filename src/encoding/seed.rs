//! 哈希种子与确定性 mixing
//!
//! 同一 master seed 下派生出稳定的 per-hash 种子序列，保证跨运行可复现。

/// 默认 master seed（与历史实验配置保持一致）
pub const DEFAULT_SEED: u64 = 65137;

/// 一个简单、确定性的 64-bit mixing（替代 RandomState，避免每次运行 hash 不稳定）。
pub fn mix64(mut x: u64) -> u64 {
    // splitmix64
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// 按编码需要逐个派生伪随机哈希种子
#[derive(Debug, Clone)]
pub struct HashSeedProvider {
    state: u64,
}

impl HashSeedProvider {
    pub fn new(master: u64) -> Self {
        Self { state: master }
    }

    /// 取下一个种子（splitmix64 流）
    pub fn next_seed(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E3779B97F4A7C15);
        mix64(self.state)
    }

    /// 一次性派生 `n` 个种子
    pub fn seeds(master: u64, n: usize) -> Vec<u64> {
        let mut provider = Self::new(master);
        (0..n).map(|_| provider.next_seed()).collect()
    }
}

impl Default for HashSeedProvider {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}
