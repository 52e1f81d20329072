//! 外部拓扑源
//!
//! 核心只需要 (B, L) 对与路径长度两种整数序列；拓扑文件的解析在核心
//! 范围之外，由外部工具导出 JSON 后经 `StaticTopology` 回放。

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// 为遍历生成提供 (B, L) 对与路径长度的外部接口
pub trait TopologySource {
    /// `count` 条环：每条为 (B, L)
    fn generate_loops(&mut self, count: usize) -> Vec<(u32, u32)>;
    /// `count` 条无环路径的长度
    fn generate_paths(&mut self, count: usize) -> Vec<u32>;
}

#[derive(Debug, Error)]
pub enum TopoError {
    #[error("read trace file: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse trace file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// 拓扑 trace 文件的序列化形状
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopologyTraces {
    #[serde(default)]
    pub loops: Vec<(u32, u32)>,
    #[serde(default)]
    pub paths: Vec<u32>,
}

/// 从预生成列表循环回放的拓扑源
#[derive(Debug, Clone)]
pub struct StaticTopology {
    traces: TopologyTraces,
}

impl StaticTopology {
    pub fn new(loops: Vec<(u32, u32)>, paths: Vec<u32>) -> Self {
        Self {
            traces: TopologyTraces { loops, paths },
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, TopoError> {
        let raw = std::fs::read_to_string(path)?;
        let traces: TopologyTraces = serde_json::from_str(&raw)?;
        Ok(Self { traces })
    }
}

impl TopologySource for StaticTopology {
    fn generate_loops(&mut self, count: usize) -> Vec<(u32, u32)> {
        cycle_fill(&self.traces.loops, count)
    }

    fn generate_paths(&mut self, count: usize) -> Vec<u32> {
        cycle_fill(&self.traces.paths, count)
    }
}

/// 列表不足 `count` 时循环补齐；空列表返回空
fn cycle_fill<T: Copy>(items: &[T], count: usize) -> Vec<T> {
    if items.is_empty() {
        return Vec::new();
    }
    items.iter().copied().cycle().take(count).collect()
}
