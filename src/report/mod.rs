//! 报表渲染
//!
//! 变体自有的配置列拼在共享统计列之前，同一列集既可渲染成带标签的
//! 多行块，也可渲染成共享表头下的 CSV 行。未定义的统计量用 `--` 哨兵。

use crate::stats::AggregateStats;

/// 未定义统计量的哨兵
pub const UNDEFINED: &str = "--";

/// 报表输出模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportMode {
    /// 带标签的多行块
    Table,
    /// 共享表头下的逗号分隔行
    Csv,
}

/// 一个报表列：标签 + 值 + 可选单位（仅多行块模式显示单位）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub label: &'static str,
    pub value: String,
    pub unit: &'static str,
}

impl Column {
    pub fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
            unit: "",
        }
    }

    pub fn with_unit(label: &'static str, value: impl Into<String>, unit: &'static str) -> Self {
        Self {
            label,
            value: value.into(),
            unit,
        }
    }

    /// 浮点格式化：整数值也保留一位小数（0.0 而不是 0）
    pub fn fmt_num(v: f64) -> String {
        if v.fract() == 0.0 && v.is_finite() {
            format!("{v:.1}")
        } else {
            format!("{v}")
        }
    }
}

/// 共享统计列（所有编码变体一致，跟在 describe() 列之后）
pub fn stats_columns(detections: u32, stats: &AggregateStats) -> Vec<Column> {
    let int_col = |label, v: Option<u64>| match v {
        Some(v) => Column::with_unit(label, v.to_string(), "hops"),
        None => Column::with_unit(label, UNDEFINED, "hops"),
    };
    let num_col = |label, v: Option<f64>, unit| match v {
        Some(v) => Column::with_unit(label, Column::fmt_num(v), unit),
        None => Column::with_unit(label, UNDEFINED, unit),
    };

    vec![
        Column::new("Runs", stats.runs.to_string()),
        Column::new("Th", detections.to_string()),
        Column::new("FP%", Column::fmt_num(stats.fp_pct)),
        int_col("MinB", stats.entry.map(|s| s.min)),
        int_col("MaxB", stats.entry.map(|s| s.max)),
        num_col("AvgB", stats.entry.map(|s| s.avg), "hops"),
        int_col("MinL", stats.cycle.map(|s| s.min)),
        int_col("MaxL", stats.cycle.map(|s| s.max)),
        num_col("AvgL", stats.cycle.map(|s| s.avg), "hops"),
        num_col("MinTime", stats.time.map(|s| s.min), "X"),
        num_col("MaxTime", stats.time.map(|s| s.max), "X"),
        num_col("AvgTime", stats.time.map(|s| s.avg), "X"),
        int_col("MinHops", stats.hops.map(|s| s.min)),
        int_col("MaxHops", stats.hops.map(|s| s.max)),
        num_col("AvgHops", stats.hops.map(|s| s.avg), "hops"),
    ]
}

/// 一次（编码配置 × 批次）运行的完整报表：配置列 + 统计列
#[derive(Debug, Clone)]
pub struct RunReport {
    columns: Vec<Column>,
}

impl RunReport {
    pub fn new(variant_columns: Vec<Column>, detections: u32, stats: &AggregateStats) -> Self {
        let mut columns = variant_columns;
        columns.extend(stats_columns(detections, stats));
        Self { columns }
    }

    /// CSV 表头（逗号拼接的标签行）
    pub fn header(&self) -> String {
        self.columns
            .iter()
            .map(|c| c.label)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// CSV 数据行
    pub fn csv_row(&self) -> String {
        self.columns
            .iter()
            .map(|c| c.value.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// 带标签的多行块
    pub fn block(&self) -> String {
        let mut out = String::new();
        for c in &self.columns {
            out.push_str(c.label);
            out.push_str(": ");
            out.push_str(&c.value);
            if !c.unit.is_empty() {
                out.push(' ');
                out.push_str(c.unit);
            }
            out.push('\n');
        }
        out
    }
}
