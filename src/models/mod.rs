//! # 数据模型模块
//!
//! 定义解码图像、转换选项与批量报告的数据模型。
//!
//! ## 依赖关系
//! - 被 `batch/`, `transform/`, `codec/` 和 `commands/` 使用
//! - 子模块: handle, options, report

pub mod handle;
pub mod options;
pub mod report;

pub use handle::{
    ColorMode, ImageHandle, IndexedImage, Metadata, PixelDensity, Pixels, Transparency,
};
pub use options::{Container, OutputFormat, ResizeDirective, TranscodeOptions};
pub use report::{BatchReport, FileOutcome, OutcomeRow};
