//! # 批量处理模块
//!
//! 模式展开与批量转换。
//!
//! ## 功能
//! - 展开 glob 模式为去重后的文件集合
//! - 分配目标路径并检测冲突
//! - 并行处理
//! - 进度反馈与汇总报告
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `rayon` 进行并行处理
//! - 使用 `indicatif` 显示进度

pub mod resolver;
pub mod runner;

pub use resolver::PatternResolver;
pub use runner::{plan_jobs, BatchRunner};
