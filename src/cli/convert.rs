//! # convert 子命令 CLI 定义
//!
//! 批量转换图像格式并缩放 (png/gif/jpg/jpeg/bmp/pdf)
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/convert.rs`

use crate::error::Result;
use crate::models::{OutputFormat, ResizeDirective, TranscodeOptions};

use clap::Args;
use std::path::PathBuf;

/// convert 子命令参数
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Glob patterns of input images (e.g. "*.png" "~/shots/*.jpg")
    #[arg(required = true)]
    pub patterns: Vec<String>,

    /// Destination directory (must exist)
    #[arg(short, long, default_value = ".")]
    pub dest_dir: PathBuf,

    /// Output format (keep the original format if omitted)
    #[arg(
        short,
        long,
        value_enum,
        ignore_case = true,
        visible_short_alias = 'o',
        visible_alias = "output-format"
    )]
    pub format: Option<OutputFormat>,

    /// Shrink by percentage (1-1000)
    #[arg(
        short,
        long,
        visible_alias = "size-ratio",
        value_parser = clap::value_parser!(u32).range(1..=1000),
        conflicts_with_all = ["width", "height"]
    )]
    pub ratio: Option<u32>,

    /// Shrink to width in pixels, keeping aspect ratio
    #[arg(
        short = 'W',
        long,
        value_parser = clap::value_parser!(u32).range(1..),
        conflicts_with = "height"
    )]
    pub width: Option<u32>,

    /// Shrink to height in pixels, keeping aspect ratio
    #[arg(short = 'H', long, value_parser = clap::value_parser!(u32).range(1..))]
    pub height: Option<u32>,

    /// Keep transparency when writing GIF
    #[arg(short = 't', long, default_value_t = false)]
    pub gif_transparency: bool,

    /// No confirmation prompt and no progress bar
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,

    /// Show what would be done without writing anything
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    /// Write a per-file CSV report
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl ConvertArgs {
    /// 构造缩放指令（三者互斥）
    pub fn resize_directive(&self) -> Result<Option<ResizeDirective>> {
        ResizeDirective::from_flags(self.ratio, self.width, self.height)
    }

    /// 构造转换选项
    pub fn transcode_options(&self) -> Result<TranscodeOptions> {
        Ok(TranscodeOptions::new(
            self.format,
            self.resize_directive()?,
            self.gif_transparency,
        ))
    }
}
