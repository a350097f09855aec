//! # info 命令实现
//!
//! 以表格列出匹配图像的格式、尺寸和颜色模式。无法解码的文件显示为 `Error` 行。
//!
//! ## 依赖关系
//! - 使用 `cli/info.rs` 定义的参数
//! - 使用 `batch/resolver.rs` 展开模式
//! - 使用 `codec/decode.rs` 读取图像

use crate::batch::PatternResolver;
use crate::cli::info::InfoArgs;
use crate::codec::decode;
use crate::error::Result;
use crate::utils::output;

use rayon::prelude::*;
use std::path::Path;
use tabled::{Table, Tabled};

/// 图像信息表格行
#[derive(Debug, Clone, PartialEq, Eq, Tabled)]
pub struct InfoRow {
    #[tabled(rename = "File")]
    pub file: String,
    #[tabled(rename = "Format")]
    pub format: String,
    #[tabled(rename = "Size")]
    pub size: String,
    #[tabled(rename = "Mode")]
    pub mode: String,
}

/// 执行 info 命令
pub fn execute(args: InfoArgs) -> Result<()> {
    let files = PatternResolver::new(args.patterns).resolve()?;

    if files.is_empty() {
        output::print_warning("No files found matching the specified patterns.");
        return Ok(());
    }

    let rows: Vec<InfoRow> = files.par_iter().map(|path| describe(path)).collect();

    output::print_header("Image Files Information");
    println!("{}", Table::new(&rows));

    Ok(())
}

/// 读取单个文件的信息
pub fn describe(path: &Path) -> InfoRow {
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    match decode::open(path) {
        Ok(image) => InfoRow {
            file,
            format: format!("{:?}", image.source_format).to_uppercase(),
            size: format!("{}x{}", image.width(), image.height()),
            mode: image.color_mode().to_string(),
        },
        Err(e) => {
            log::debug!("{}: {}", path.display(), e);
            InfoRow {
                file,
                format: "Error".to_string(),
                size: e.to_string(),
                mode: String::new(),
            }
        }
    }
}
