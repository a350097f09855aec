//! # pixbatch - 批量图像转换与缩放工具
//!
//! 按 glob 模式匹配图像文件，批量缩放并转换为 png/gif/jpg/jpeg/bmp/pdf。
//!
//! ## 子命令
//! - `convert` - 批量转换格式与缩放
//! - `info`    - 查看图像格式、尺寸与颜色模式
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── batch/     (模式展开与并行执行)
//!   │     ├── transform/ (缩放规划与格式适配)
//!   │     ├── codec/     (解码与编码)
//!   │     └── models/    (数据模型)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod batch;
mod cli;
mod codec;
mod commands;
mod error;
mod models;
mod transform;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
