//! # info 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/info.rs`

use clap::Args;

/// info 子命令参数
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Glob patterns of input images
    #[arg(required = true)]
    pub patterns: Vec<String>,
}
