//! # 统一错误处理模块
//!
//! 定义 pixbatch 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 错误分类
//! - 配置错误（目录无效、参数冲突）：整个运行失败，由 `main` 打印并返回非零退出码
//! - 单文件错误（不可读、解码/编码失败、尺寸无效）：由 `BatchRunner` 转为 `FileOutcome`
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// pixbatch 统一错误类型
#[derive(Error, Debug)]
pub enum PixbatchError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("Directory is not writable: {path}")]
    DirectoryNotWritable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // ─────────────────────────────────────────────────────────────
    // 输入文件错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("unreadable: {path} ({reason})")]
    Unreadable { path: String, reason: String },

    #[error("not a regular file: {path}")]
    NotAFile { path: String },

    // ─────────────────────────────────────────────────────────────
    // 编解码错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to decode {path}: {reason}")]
    DecodeError { path: String, reason: String },

    #[error("Failed to encode {format}: {reason}")]
    EncodeError { format: String, reason: String },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    // ─────────────────────────────────────────────────────────────
    // 变换错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid target geometry {width}x{height}")]
    InvalidGeometry { width: u32, height: u32 },

    #[error("Resize failed: {0}")]
    ResizeError(String),

    #[error("Destination {path} is already claimed by {claimed_by}")]
    DestinationConflict { path: String, claimed_by: String },

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // CSV 错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, PixbatchError>;

impl PixbatchError {
    /// 构造编码错误
    pub fn encode(format: impl std::fmt::Display, reason: impl std::fmt::Display) -> Self {
        PixbatchError::EncodeError {
            format: format.to_string(),
            reason: reason.to_string(),
        }
    }
}
