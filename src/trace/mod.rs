//! Trace 运行器
//!
//! 生成合成遍历（直线前缀 + 循环回放的环段），逐跳喂入编码结构，
//! 并把每次遍历的记录收进聚合器。节点 id 按 seed 确定性采样（无放回）。

use crate::encoding::{Encoding, NodeId};
use crate::stats::StatsAggregator;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::trace;

/// 单条遍历的形状
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceSpec {
    /// B 跳直线前缀 + 长度 L 的环段（环段循环回放直到确认或到达跳数上限）
    Loop { entry: u32, cycle: u32 },
    /// 无环路径，喂一遍即止
    Path { length: u32 },
}

impl TraceSpec {
    /// 遍历需要的不同节点数（loop 为 B + L，path 为其长度）
    pub fn node_count(&self) -> usize {
        match *self {
            TraceSpec::Loop { entry, cycle } => entry as usize + cycle as usize,
            TraceSpec::Path { length } => length as usize,
        }
    }
}

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("traversal needs {needed} distinct hops but the encoding supports at most {limit}")]
    HopLimitExceeded { needed: usize, limit: usize },
}

/// 逐跳驱动编码的运行器；每个批次持有一条独立的确定性 RNG 流
#[derive(Debug)]
pub struct TraceRunner {
    rng: ChaCha8Rng,
    /// 单条遍历喂入跳数的外部上限（防止从不确认的配置死循环）
    max_hops: u64,
}

impl TraceRunner {
    pub fn new(seed: u64, max_hops: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            max_hops,
        }
    }

    /// 同一形状跑 `count` 条遍历，每条用新采样的节点数组
    #[tracing::instrument(skip(self, encoding, agg))]
    pub fn run(
        &mut self,
        encoding: &mut dyn Encoding,
        spec: TraceSpec,
        count: usize,
        agg: &mut StatsAggregator,
    ) -> Result<(), TraceError> {
        self.check_limit(encoding, spec)?;
        for _ in 0..count {
            let record = self.run_one(encoding, spec);
            agg.push(record);
        }
        Ok(())
    }

    /// 回放外部来源（TopologySource）给出的 (B, L) 对，每对一条遍历
    pub fn run_loops(
        &mut self,
        encoding: &mut dyn Encoding,
        pairs: &[(u32, u32)],
        agg: &mut StatsAggregator,
    ) -> Result<(), TraceError> {
        for &(entry, cycle) in pairs {
            let spec = TraceSpec::Loop { entry, cycle };
            self.check_limit(encoding, spec)?;
            let record = self.run_one(encoding, spec);
            agg.push(record);
        }
        Ok(())
    }

    /// 回放外部来源给出的路径长度列表
    pub fn run_paths(
        &mut self,
        encoding: &mut dyn Encoding,
        lengths: &[u32],
        agg: &mut StatsAggregator,
    ) -> Result<(), TraceError> {
        for &length in lengths {
            let spec = TraceSpec::Path { length };
            self.check_limit(encoding, spec)?;
            let record = self.run_one(encoding, spec);
            agg.push(record);
        }
        Ok(())
    }

    fn check_limit(&self, encoding: &dyn Encoding, spec: TraceSpec) -> Result<(), TraceError> {
        if let Some(limit) = encoding.hop_limit() {
            let needed = spec.node_count();
            if needed > limit {
                return Err(TraceError::HopLimitExceeded { needed, limit });
            }
        }
        Ok(())
    }

    fn run_one(
        &mut self,
        encoding: &mut dyn Encoding,
        spec: TraceSpec,
    ) -> crate::stats::TraversalRecord {
        let nodes = self.sample_nodes(spec.node_count());
        let (entry, cycle) = match spec {
            TraceSpec::Loop { entry, cycle } => (entry as usize, cycle as usize),
            TraceSpec::Path { length } => (length as usize, 0),
        };

        encoding.reset();

        // 直线前缀（同样受跳数上限约束）
        let mut live = true;
        let mut fed = 0u64;
        for (i, &node) in nodes[..entry].iter().enumerate() {
            if fed == self.max_hops {
                break;
            }
            live = encoding.process(node, i);
            fed += 1;
            if !live {
                break;
            }
        }

        // 环段循环回放；index 在环段内回绕
        let mut offset = 0usize;
        while live && cycle > 0 && fed < self.max_hops {
            let i = entry + offset % cycle;
            live = encoding.process(nodes[i], i);
            offset += 1;
            fed += 1;
        }

        let record = encoding.finalize();
        trace!(?record, "traversal finished");
        record
    }

    /// 无放回地采样 `len` 个互不相同的 32 位节点 id
    fn sample_nodes(&mut self, len: usize) -> Vec<NodeId> {
        let mut seen = HashSet::with_capacity(len);
        let mut out = Vec::with_capacity(len);
        while out.len() < len {
            let id: u32 = self.rng.r#gen();
            if seen.insert(id) {
                out.push(NodeId(id));
            }
        }
        out
    }
}
