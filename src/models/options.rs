//! # 转换选项模型
//!
//! 输出格式、缩放指令与一次批量运行的转换选项。
//!
//! ## 依赖关系
//! - 被 `cli/convert.rs` 用作参数类型
//! - 被 `batch/runner.rs` 和 `transform/` 读取

use crate::error::{PixbatchError, Result};

use clap::ValueEnum;
use image::ImageFormat;
use std::num::NonZeroU32;
use std::path::Path;

/// 允许的输出格式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Portable Network Graphics (keeps gamma, DPI and transparency chunks)
    Png,
    /// Graphics Interchange Format
    Gif,
    /// JPEG (.jpg)
    Jpg,
    /// JPEG (.jpeg)
    Jpeg,
    /// Windows bitmap
    Bmp,
    /// Single-page PDF document
    Pdf,
}

impl OutputFormat {
    /// 输出文件扩展名（保留用户选择的 jpg/jpeg 拼写）
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Gif => "gif",
            OutputFormat::Jpg => "jpg",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Bmp => "bmp",
            OutputFormat::Pdf => "pdf",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// 实际写出的容器格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Png,
    Gif,
    Jpeg,
    Bmp,
    Pdf,
    /// 保持原格式时的其他格式（TIFF、WebP 等）
    Other(ImageFormat),
}

impl Container {
    pub fn from_image_format(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Png => Container::Png,
            ImageFormat::Gif => Container::Gif,
            ImageFormat::Jpeg => Container::Jpeg,
            ImageFormat::Bmp => Container::Bmp,
            other => Container::Other(other),
        }
    }

    /// 决定写出的容器格式
    ///
    /// 指定了输出格式时直接使用；否则按目标文件扩展名推断，无法推断时沿用源格式。
    pub fn resolve(
        output_format: Option<OutputFormat>,
        dest_path: &Path,
        source_format: ImageFormat,
    ) -> Self {
        match output_format {
            Some(format) => Container::from(format),
            None => ImageFormat::from_path(dest_path)
                .map(Container::from_image_format)
                .unwrap_or_else(|_| Container::from_image_format(source_format)),
        }
    }
}

impl From<OutputFormat> for Container {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Png => Container::Png,
            OutputFormat::Gif => Container::Gif,
            OutputFormat::Jpg | OutputFormat::Jpeg => Container::Jpeg,
            OutputFormat::Bmp => Container::Bmp,
            OutputFormat::Pdf => Container::Pdf,
        }
    }
}

impl std::fmt::Display for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Container::Png => write!(f, "PNG"),
            Container::Gif => write!(f, "GIF"),
            Container::Jpeg => write!(f, "JPEG"),
            Container::Bmp => write!(f, "BMP"),
            Container::Pdf => write!(f, "PDF"),
            Container::Other(format) => write!(f, "{:?}", format),
        }
    }
}

/// 缩放指令，三种方式互斥，数值恒为正
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeDirective {
    /// 按百分比缩放
    Ratio(NonZeroU32),
    /// 缩放到指定宽度
    Width(NonZeroU32),
    /// 缩放到指定高度
    Height(NonZeroU32),
}

impl ResizeDirective {
    pub fn ratio(percent: u32) -> Result<Self> {
        Ok(ResizeDirective::Ratio(positive("ratio", percent)?))
    }

    pub fn width(pixels: u32) -> Result<Self> {
        Ok(ResizeDirective::Width(positive("width", pixels)?))
    }

    pub fn height(pixels: u32) -> Result<Self> {
        Ok(ResizeDirective::Height(positive("height", pixels)?))
    }

    /// 从三个独立的命令行参数构造，最多允许一个存在
    pub fn from_flags(
        ratio: Option<u32>,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<Option<Self>> {
        match (ratio, width, height) {
            (None, None, None) => Ok(None),
            (Some(p), None, None) => Self::ratio(p).map(Some),
            (None, Some(w), None) => Self::width(w).map(Some),
            (None, None, Some(h)) => Self::height(h).map(Some),
            _ => Err(PixbatchError::InvalidArgument(
                "only one of --ratio, --width, --height can be given".to_string(),
            )),
        }
    }

    /// 100% 缩放不改变图像
    pub fn is_noop(&self) -> bool {
        matches!(self, ResizeDirective::Ratio(p) if p.get() == 100)
    }
}

impl std::fmt::Display for ResizeDirective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResizeDirective::Ratio(p) => write!(f, "ratio: {}%", p),
            ResizeDirective::Width(w) => write!(f, "width: {}px", w),
            ResizeDirective::Height(h) => write!(f, "height: {}px", h),
        }
    }
}

fn positive(name: &str, value: u32) -> Result<NonZeroU32> {
    NonZeroU32::new(value).ok_or_else(|| {
        PixbatchError::InvalidArgument(format!("{} must be a positive integer", name))
    })
}

/// 一次批量运行的转换选项，构造后只读
#[derive(Debug, Clone, Default)]
pub struct TranscodeOptions {
    output_format: Option<OutputFormat>,
    resize: Option<ResizeDirective>,
    preserve_gif_transparency: bool,
}

impl TranscodeOptions {
    /// 构造选项；100% 缩放在此归一化为不缩放
    pub fn new(
        output_format: Option<OutputFormat>,
        resize: Option<ResizeDirective>,
        preserve_gif_transparency: bool,
    ) -> Self {
        Self {
            output_format,
            resize: resize.filter(|r| !r.is_noop()),
            preserve_gif_transparency,
        }
    }

    /// 输出格式，`None` 表示保持原格式
    pub fn output_format(&self) -> Option<OutputFormat> {
        self.output_format
    }

    pub fn resize(&self) -> Option<ResizeDirective> {
        self.resize
    }

    pub fn preserve_gif_transparency(&self) -> bool {
        self.preserve_gif_transparency
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flags_rejects_conflicts() {
        assert!(ResizeDirective::from_flags(Some(50), Some(100), None).is_err());
        assert!(ResizeDirective::from_flags(None, Some(100), Some(100)).is_err());
        assert_eq!(ResizeDirective::from_flags(None, None, None).unwrap(), None);
        assert_eq!(
            ResizeDirective::from_flags(None, Some(640), None).unwrap(),
            Some(ResizeDirective::width(640).unwrap())
        );
    }

    #[test]
    fn test_rejects_zero() {
        assert!(ResizeDirective::ratio(0).is_err());
        assert!(ResizeDirective::width(0).is_err());
        assert!(ResizeDirective::from_flags(None, None, Some(0)).is_err());
    }

    #[test]
    fn test_ratio_100_is_normalised_away() {
        let opts = TranscodeOptions::new(None, Some(ResizeDirective::ratio(100).unwrap()), false);
        assert_eq!(opts.resize(), None);

        let opts = TranscodeOptions::new(None, Some(ResizeDirective::ratio(50).unwrap()), false);
        assert!(opts.resize().is_some());
    }

    #[test]
    fn test_container_resolution() {
        let dest = Path::new("out/photo.jpeg");
        assert_eq!(
            Container::resolve(Some(OutputFormat::Png), dest, ImageFormat::Jpeg),
            Container::Png
        );
        assert_eq!(
            Container::resolve(None, dest, ImageFormat::Png),
            Container::Jpeg
        );
        assert_eq!(
            Container::resolve(None, Path::new("out/noext"), ImageFormat::Gif),
            Container::Gif
        );
        assert_eq!(Container::from(OutputFormat::Jpg), Container::Jpeg);
    }

    #[test]
    fn test_extension_keeps_spelling() {
        assert_eq!(OutputFormat::Jpg.extension(), "jpg");
        assert_eq!(OutputFormat::Jpeg.extension(), "jpeg");
        assert_eq!(OutputFormat::Pdf.to_string(), "pdf");
    }
}
