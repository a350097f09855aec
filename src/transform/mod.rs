//! # 单文件变换模块
//!
//! 解码之后、编码之前的纯内存变换。
//!
//! ## 依赖关系
//! - 被 `batch/runner.rs` 调用
//! - 子模块: resize (缩放规划), adapter (保存策略), palette (量化与合成)

pub mod adapter;
pub mod palette;
pub mod resize;

pub use adapter::{adapt, SaveSpec};
