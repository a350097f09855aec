//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `convert`: 批量转换格式与缩放
//! - `info`: 查看图像格式、尺寸与颜色模式
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: convert, info

pub mod convert;
pub mod info;

use clap::{Parser, Subcommand};

/// pixbatch - 批量图像格式转换与缩放工具
#[derive(Parser)]
#[command(name = "pixbatch")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Batch image format conversion and resizing", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Convert and/or resize images matched by glob patterns
    Convert(convert::ConvertArgs),

    /// Show format, size and color mode of matched images
    Info(info::InfoArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OutputFormat;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_convert() {
        let cli = Cli::try_parse_from([
            "pixbatch", "convert", "*.png", "~/a/*.jpg", "-d", "out", "-f", "JPG", "-W", "640",
            "-t", "-q",
        ])
        .unwrap();

        let Commands::Convert(args) = cli.command else {
            panic!("expected convert");
        };
        assert_eq!(args.patterns, vec!["*.png", "~/a/*.jpg"]);
        assert_eq!(args.format, Some(OutputFormat::Jpg));
        assert_eq!(args.width, Some(640));
        assert!(args.gif_transparency);
        assert!(args.quiet);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_aliases() {
        let cli = Cli::try_parse_from([
            "pixbatch", "convert", "a.png", "--output-format", "gif", "--size-ratio", "50",
        ])
        .unwrap();
        let Commands::Convert(args) = cli.command else {
            panic!("expected convert");
        };
        assert_eq!(args.format, Some(OutputFormat::Gif));
        assert_eq!(args.ratio, Some(50));
    }

    #[test]
    fn test_resize_flags_conflict() {
        let result = Cli::try_parse_from(["pixbatch", "convert", "a.png", "-r", "50", "-W", "100"]);
        assert!(result.is_err());
        let result = Cli::try_parse_from(["pixbatch", "convert", "a.png", "-H", "10", "-W", "100"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_zero_and_unknown_format() {
        assert!(Cli::try_parse_from(["pixbatch", "convert", "a.png", "-r", "0"]).is_err());
        assert!(Cli::try_parse_from(["pixbatch", "convert", "a.png", "-f", "tiff"]).is_err());
    }
}
