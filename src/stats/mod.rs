//! 遍历记录与统计聚合
//!
//! 每条遍历产出一条不可变记录；聚合统计按需从记录序列重新计算。

/// 单条遍历的结果记录
///
/// `loop_start`/`loop_size` 仅在 ground truth 观察到重访时存在
/// （is_loop 为 true）。`hop_count` 统计被接受的跳数，确认跳不计入。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraversalRecord {
    pub is_loop: bool,
    pub detected: bool,
    pub loop_start: Option<u32>,
    pub loop_size: Option<u32>,
    pub hop_count: u64,
}

/// 整数统计量（B / L / hops）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntSummary {
    pub min: u64,
    pub max: u64,
    pub avg: f64,
}

/// 浮点统计量（time = hops / (B + L)）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatSummary {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

/// 一次参数组合的汇总统计；loop 统计量在无 loop 记录时为 None
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateStats {
    pub runs: usize,
    pub loops: usize,
    pub paths: usize,
    pub false_positives: usize,
    /// 误报率（百分比）；无 path 记录时为 0.0
    pub fp_pct: f64,
    pub entry: Option<IntSummary>,
    pub cycle: Option<IntSummary>,
    pub hops: Option<IntSummary>,
    pub time: Option<FloatSummary>,
}

/// 按序收集遍历记录
#[derive(Debug, Default, Clone)]
pub struct StatsAggregator {
    records: Vec<TraversalRecord>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: TraversalRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[TraversalRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 重新计算汇总统计
    pub fn summarize(&self) -> AggregateStats {
        let mut loops = 0usize;
        let mut paths = 0usize;
        let mut fpos = 0usize;

        let mut entry = Acc::default();
        let mut cycle = Acc::default();
        let mut hops = Acc::default();
        let mut time = AccF::default();

        for rec in &self.records {
            if !rec.is_loop {
                paths += 1;
                if rec.detected {
                    fpos += 1;
                }
                continue;
            }

            loops += 1;
            // is_loop 为 true 时 loop 字段必然存在
            let b = rec.loop_start.unwrap_or(0) as u64;
            let l = rec.loop_size.unwrap_or(0) as u64;
            entry.push(b);
            cycle.push(l);
            hops.push(rec.hop_count);
            time.push(rec.hop_count as f64 / (b + l) as f64);
        }

        AggregateStats {
            runs: self.records.len(),
            loops,
            paths,
            false_positives: fpos,
            fp_pct: if paths != 0 {
                fpos as f64 / paths as f64 * 100.0
            } else {
                0.0
            },
            entry: entry.summary(),
            cycle: cycle.summary(),
            hops: hops.summary(),
            time: time.summary(),
        }
    }
}

#[derive(Debug, Default)]
struct Acc {
    min: Option<u64>,
    max: u64,
    sum: u64,
    count: usize,
}

impl Acc {
    fn push(&mut self, v: u64) {
        self.min = Some(self.min.map_or(v, |m| m.min(v)));
        self.max = self.max.max(v);
        self.sum += v;
        self.count += 1;
    }

    fn summary(&self) -> Option<IntSummary> {
        self.min.map(|min| IntSummary {
            min,
            max: self.max,
            avg: self.sum as f64 / self.count as f64,
        })
    }
}

#[derive(Debug, Default)]
struct AccF {
    min: Option<f64>,
    max: f64,
    sum: f64,
    count: usize,
}

impl AccF {
    fn push(&mut self, v: f64) {
        self.min = Some(self.min.map_or(v, |m| m.min(v)));
        self.max = self.max.max(v);
        self.sum += v;
        self.count += 1;
    }

    fn summary(&self) -> Option<FloatSummary> {
        self.min.map(|min| FloatSummary {
            min,
            max: self.max,
            avg: self.sum / self.count as f64,
        })
    }
}
