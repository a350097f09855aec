//! # 批量报告模型
//!
//! 单文件处理结果 `FileOutcome` 与汇总 `BatchReport`。
//!
//! ## 依赖关系
//! - 由 `batch/runner.rs` 生成
//! - 被 `commands/convert.rs` 打印与导出（`csv` + `serde`）

use serde::Serialize;
use std::path::PathBuf;

/// 单个文件的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub source_path: PathBuf,
    pub dest_path: PathBuf,
    pub success: bool,
    pub error_message: Option<String>,
}

impl FileOutcome {
    pub fn succeeded(source_path: PathBuf, dest_path: PathBuf) -> Self {
        Self {
            source_path,
            dest_path,
            success: true,
            error_message: None,
        }
    }

    pub fn failed(source_path: PathBuf, dest_path: PathBuf, message: impl Into<String>) -> Self {
        Self {
            source_path,
            dest_path,
            success: false,
            error_message: Some(message.into()),
        }
    }

    /// 源文件名（用于终端输出）
    pub fn file_name(&self) -> String {
        self.source_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.source_path.display().to_string())
    }
}

/// CSV 报告行
#[derive(Debug, Serialize)]
pub struct OutcomeRow {
    pub source: String,
    pub destination: String,
    pub success: bool,
    pub error: String,
}

impl From<&FileOutcome> for OutcomeRow {
    fn from(outcome: &FileOutcome) -> Self {
        Self {
            source: outcome.source_path.display().to_string(),
            destination: outcome.dest_path.display().to_string(),
            success: outcome.success,
            error: outcome.error_message.clone().unwrap_or_default(),
        }
    }
}

/// 一次批量运行的汇总结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub matched_count: usize,
    pub success_count: usize,
    pub failure_count: usize,
    /// 与输入文件顺序一致
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    /// 由有序的单文件结果汇总
    pub fn from_outcomes(outcomes: Vec<FileOutcome>) -> Self {
        let success_count = outcomes.iter().filter(|o| o.success).count();
        Self {
            matched_count: outcomes.len(),
            success_count,
            failure_count: outcomes.len() - success_count,
            outcomes,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| !o.success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_from_outcomes() {
        let report = BatchReport::from_outcomes(vec![
            FileOutcome::succeeded("a.png".into(), "out/a.png".into()),
            FileOutcome::failed("b.png".into(), "out/b.png".into(), "unreadable"),
            FileOutcome::succeeded("c.png".into(), "out/c.png".into()),
        ]);
        assert_eq!(report.matched_count, 3);
        assert_eq!(report.success_count, 2);
        assert_eq!(report.failure_count, 1);
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn test_empty_report() {
        let report = BatchReport::from_outcomes(Vec::new());
        assert_eq!(report.matched_count, 0);
        assert!(report.outcomes.is_empty());
        assert_eq!(report.failure_count, 0);
    }

    #[test]
    fn test_row_conversion() {
        let outcome = FileOutcome::failed("dir/b.png".into(), "out/b.png".into(), "boom");
        let row = OutcomeRow::from(&outcome);
        assert!(!row.success);
        assert_eq!(row.error, "boom");
        assert_eq!(outcome.file_name(), "b.png");
    }
}
