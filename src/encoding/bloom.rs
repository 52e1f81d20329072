//! Bloom filter 编码
//!
//! 每跳先对节点 id 做成员测试（阳性即一次重访信号），再无条件插入。
//! 位数组与哈希个数由 (capacity, error_rate) 推导，细节委托给
//! `crate::filter::BloomFilter` 原语。

use super::{ConfigError, DetectionGate, Encoding, GroundTruth, NodeId};
use crate::filter::BloomFilter;
use crate::report::Column;
use crate::stats::TraversalRecord;
use tracing::debug;

pub struct BloomEncoding {
    filter: BloomFilter,
    truth: GroundTruth,
    gate: DetectionGate,
}

impl BloomEncoding {
    pub fn new(capacity: usize, error_rate: f64, detections: u32) -> Result<Self, ConfigError> {
        Ok(Self {
            filter: BloomFilter::new(capacity, error_rate)?,
            truth: GroundTruth::default(),
            gate: DetectionGate::new(detections)?,
        })
    }

    pub fn filter(&self) -> &BloomFilter {
        &self.filter
    }
}

impl Encoding for BloomEncoding {
    fn reset(&mut self) {
        self.filter.clear();
        self.truth.reset();
        self.gate.reset();
    }

    fn process(&mut self, node: NodeId, _index: usize) -> bool {
        if self.gate.confirmed() {
            return false;
        }
        self.truth.observe(node);

        if self.filter.contains(node.0 as u64) {
            debug!(node = node.0, "bloom membership signal");
            if self.gate.signal() {
                return false;
            }
        }

        self.truth.accept(node);
        self.filter.insert(node.0 as u64);
        true
    }

    fn finalize(&self) -> TraversalRecord {
        self.truth.record(self.gate.confirmed())
    }

    fn describe(&self) -> Vec<Column> {
        vec![
            Column::new("Class", "BloomFilter"),
            Column::new("Null", "--"),
            Column::new("Capacity", self.filter.capacity().to_string()),
            Column::new("Errrate", Column::fmt_num(self.filter.error_rate())),
            Column::new("H", self.filter.num_slices().to_string()),
            Column::with_unit("Mem", Column::fmt_num(self.memory_bits()), "bits"),
        ]
    }

    fn memory_bits(&self) -> f64 {
        self.filter.num_bits() as f64 + self.gate.memory_bits()
    }

    fn detections(&self) -> u32 {
        self.gate.threshold()
    }
}

impl std::fmt::Debug for BloomEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BloomEncoding")
            .field("capacity", &self.filter.capacity())
            .field("error_rate", &self.filter.error_rate())
            .field("num_slices", &self.filter.num_slices())
            .finish()
    }
}
