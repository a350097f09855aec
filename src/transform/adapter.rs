//! # 格式适配器
//!
//! 根据目标容器、像素颜色模式和 GIF 透明选项决定保存策略，并完成所需的像素变换。
//! 不做任何 I/O，结果 `SaveSpec` 交给 `codec::encode` 写出。
//!
//! ## 决策表（按顺序，先匹配先生效）
//! | 容器 | 条件 | 策略 |
//! |---|---|---|
//! | PNG | 总是 | 原样携带元数据（gamma、DPI、tRNS、文本） |
//! | GIF | 保留透明 + 调色板 + 有透明索引 | 调色板，沿用透明索引 |
//! | GIF | 保留透明 + 调色板 + 无透明索引 | 调色板，无透明色 |
//! | GIF | 保留透明 + 带 alpha | 量化为 ≤255 色，透明索引 255 |
//! | GIF/JPEG/BMP/PDF | 带 alpha，或调色板带透明色 | 叠加到白色背景 |
//! | 其他 | - | 直接编码 |
//!
//! ## 依赖关系
//! - 被 `batch/runner.rs` 调用
//! - 使用 `transform/palette.rs` 进行量化与合成

use super::palette::{self, DEFAULT_BACKGROUND};
use crate::models::{ColorMode, Container, ImageHandle, Metadata, Pixels};

/// 量化后保留的透明索引
pub const GIF_TRANSPARENT_INDEX: u8 = 255;

/// 保存策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStrategy {
    /// 携带原始元数据
    PreserveMetadata,
    /// 调色板 + 沿用透明索引
    IndexedWithTransparency,
    /// 调色板，无透明色
    IndexedOpaque,
    /// 量化为调色板，透明索引 255
    QuantizeTransparent,
    /// alpha 合成到不透明背景
    Composite,
    /// 直接编码
    Direct,
}

impl std::fmt::Display for SaveStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveStrategy::PreserveMetadata => write!(f, "preserve-metadata"),
            SaveStrategy::IndexedWithTransparency => write!(f, "indexed+transparency"),
            SaveStrategy::IndexedOpaque => write!(f, "indexed"),
            SaveStrategy::QuantizeTransparent => write!(f, "quantize+transparency"),
            SaveStrategy::Composite => write!(f, "composite"),
            SaveStrategy::Direct => write!(f, "direct"),
        }
    }
}

/// 编码描述：写出所需的一切，但不执行 I/O
#[derive(Debug, Clone, PartialEq)]
pub struct SaveSpec {
    pub container: Container,
    pub strategy: SaveStrategy,
    pub pixels: Pixels,
    /// 仅 PNG 携带，其余为空
    pub metadata: Metadata,
    /// GIF 透明索引
    pub transparency_index: Option<u8>,
}

/// 纯决策表
///
/// `has_palette_alpha` 表示调色板图像带透明色（透明索引或 tRNS 中 alpha < 255 的项），
/// 对不透明容器而言与逐像素 alpha 等价。
pub fn select_strategy(
    container: Container,
    mode: ColorMode,
    has_transparency_index: bool,
    has_palette_alpha: bool,
    preserve_gif_transparency: bool,
) -> SaveStrategy {
    let carries_alpha = mode.has_alpha() || (mode == ColorMode::Indexed && has_palette_alpha);

    match (container, mode, preserve_gif_transparency) {
        (Container::Png, _, _) => SaveStrategy::PreserveMetadata,
        (Container::Gif, ColorMode::Indexed, true) if has_transparency_index => {
            SaveStrategy::IndexedWithTransparency
        }
        (Container::Gif, ColorMode::Indexed, true) => SaveStrategy::IndexedOpaque,
        (Container::Gif, m, true) if m.has_alpha() => SaveStrategy::QuantizeTransparent,
        (Container::Gif | Container::Jpeg | Container::Bmp | Container::Pdf, _, _)
            if carries_alpha =>
        {
            SaveStrategy::Composite
        }
        _ => SaveStrategy::Direct,
    }
}

/// 决定保存策略并变换像素
pub fn adapt(image: ImageHandle, container: Container, preserve_gif_transparency: bool) -> SaveSpec {
    let transparency_index = image.metadata.transparency_index();
    let strategy = select_strategy(
        container,
        image.color_mode(),
        transparency_index.is_some(),
        image.metadata.has_palette_alpha(),
        preserve_gif_transparency,
    );

    let (pixels, metadata, transparency_index) = match strategy {
        SaveStrategy::PreserveMetadata => (image.pixels, image.metadata, None),
        SaveStrategy::IndexedWithTransparency => {
            (image.pixels, Metadata::default(), transparency_index)
        }
        SaveStrategy::IndexedOpaque => (image.pixels, Metadata::default(), None),
        SaveStrategy::QuantizeTransparent => {
            let rgba = image.to_raster().to_rgba8();
            let indexed = palette::quantize(
                &rgba,
                GIF_TRANSPARENT_INDEX as usize,
                Some(GIF_TRANSPARENT_INDEX),
            );
            (
                Pixels::Indexed(indexed),
                Metadata::default(),
                Some(GIF_TRANSPARENT_INDEX),
            )
        }
        SaveStrategy::Composite => {
            let opaque = palette::composite(&image.to_raster(), DEFAULT_BACKGROUND);
            (
                fit_container(Pixels::Raster(opaque), container),
                Metadata::default(),
                None,
            )
        }
        SaveStrategy::Direct => {
            let pixels = match (container, image.pixels) {
                (Container::Other(_), Pixels::Indexed(indexed)) => Pixels::Raster(
                    indexed.to_dynamic(image.metadata.transparency.as_ref()),
                ),
                (_, pixels) => fit_container(pixels, container),
            };
            (pixels, Metadata::default(), None)
        }
    };

    SaveSpec {
        container,
        strategy,
        pixels,
        metadata,
        transparency_index,
    }
}

/// 将像素转换为容器可表示的形式
///
/// GIF 只能存调色板，JPEG/BMP/PDF 不存调色板。
fn fit_container(pixels: Pixels, container: Container) -> Pixels {
    match (container, pixels) {
        (Container::Gif, Pixels::Raster(img)) => {
            Pixels::Indexed(palette::quantize(&img.to_rgba8(), 256, None))
        }
        (Container::Jpeg | Container::Bmp | Container::Pdf, Pixels::Indexed(indexed)) => {
            Pixels::Raster(image::DynamicImage::ImageRgb8(indexed.to_rgb()))
        }
        (_, pixels) => pixels,
    }
}
