//! # 图像数据模型
//!
//! 内存中的解码图像 `ImageHandle`：像素（调色板或真彩色）、颜色模式与附属元数据。
//!
//! ## 依赖关系
//! - 被 `codec/` 构造与消费
//! - 被 `transform/` 变换
//! - 使用 `image` crate 的 `DynamicImage` 承载非调色板像素

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

/// 像素颜色模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// 调色板（索引）
    Indexed,
    /// 真彩色
    TrueColor,
    /// 带 alpha 的真彩色
    TrueColorAlpha,
    /// 灰度
    Grayscale,
    /// 带 alpha 的灰度
    GrayscaleAlpha,
    /// 其他（如浮点像素）
    Other,
}

impl ColorMode {
    /// 是否携带逐像素 alpha 通道
    pub fn has_alpha(&self) -> bool {
        matches!(self, ColorMode::TrueColorAlpha | ColorMode::GrayscaleAlpha)
    }
}

impl std::fmt::Display for ColorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorMode::Indexed => write!(f, "P"),
            ColorMode::TrueColor => write!(f, "RGB"),
            ColorMode::TrueColorAlpha => write!(f, "RGBA"),
            ColorMode::Grayscale => write!(f, "L"),
            ColorMode::GrayscaleAlpha => write!(f, "LA"),
            ColorMode::Other => write!(f, "other"),
        }
    }
}

/// 调色板透明信息
///
/// 非调色板 PNG 的 tRNS 色键在解码时已展开为 alpha 通道，不在此记录。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transparency {
    /// 单个透明调色板索引（GIF）
    Index(u8),
    /// 逐调色板项 alpha 表（PNG tRNS）
    PaletteAlpha(Vec<u8>),
}

/// 像素密度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelDensity {
    pub x: u32,
    pub y: u32,
    /// true 表示单位为每米像素数，false 表示仅有宽高比
    pub per_meter: bool,
}

/// 附属元数据（gamma、DPI、透明信息、文本块）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    /// gamma，按 PNG 约定放大 100000 倍
    pub gamma: Option<u32>,
    pub density: Option<PixelDensity>,
    pub transparency: Option<Transparency>,
    pub text: Vec<(String, String)>,
}

impl Metadata {
    /// 可用单个调色板索引表达的透明色
    pub fn transparency_index(&self) -> Option<u8> {
        match &self.transparency {
            Some(Transparency::Index(i)) => Some(*i),
            Some(Transparency::PaletteAlpha(alpha)) => {
                alpha.iter().position(|&a| a == 0).map(|i| i as u8)
            }
            None => None,
        }
    }

    /// 调色板中是否存在非完全不透明的颜色
    pub fn has_palette_alpha(&self) -> bool {
        match &self.transparency {
            Some(Transparency::Index(_)) => true,
            Some(Transparency::PaletteAlpha(alpha)) => alpha.iter().any(|&a| a < 255),
            None => false,
        }
    }
}

/// 调色板图像
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedImage {
    pub width: u32,
    pub height: u32,
    /// 行优先的调色板索引，长度为 width * height
    pub indices: Vec<u8>,
    pub palette: Vec<[u8; 3]>,
}

impl IndexedImage {
    /// 展平的调色板（r, g, b, r, g, b, ...）
    pub fn flat_palette(&self) -> Vec<u8> {
        self.palette.iter().flat_map(|c| c.iter().copied()).collect()
    }

    fn color_of(&self, index: u8) -> [u8; 3] {
        self.palette
            .get(index as usize)
            .copied()
            .unwrap_or([0, 0, 0])
    }

    /// 展开为真彩色（忽略透明信息）
    pub fn to_rgb(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let index = self.indices[(y * self.width + x) as usize];
            Rgb(self.color_of(index))
        })
    }

    /// 展开为带 alpha 的真彩色
    pub fn to_rgba(&self, transparency: Option<&Transparency>) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let index = self.indices[(y * self.width + x) as usize];
            let [r, g, b] = self.color_of(index);
            let a = match transparency {
                Some(Transparency::Index(t)) if *t == index => 0,
                Some(Transparency::PaletteAlpha(alpha)) => {
                    alpha.get(index as usize).copied().unwrap_or(255)
                }
                _ => 255,
            };
            Rgba([r, g, b, a])
        })
    }

    /// 展开为 `DynamicImage`：有透明信息时为 RGBA，否则为 RGB
    pub fn to_dynamic(&self, transparency: Option<&Transparency>) -> DynamicImage {
        match transparency {
            Some(t) => DynamicImage::ImageRgba8(self.to_rgba(Some(t))),
            None => DynamicImage::ImageRgb8(self.to_rgb()),
        }
    }
}

/// 像素存储
#[derive(Debug, Clone, PartialEq)]
pub enum Pixels {
    Indexed(IndexedImage),
    Raster(DynamicImage),
}

impl Pixels {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Pixels::Indexed(img) => (img.width, img.height),
            Pixels::Raster(img) => (img.width(), img.height()),
        }
    }

    pub fn color_mode(&self) -> ColorMode {
        match self {
            Pixels::Indexed(_) => ColorMode::Indexed,
            Pixels::Raster(img) => match img {
                DynamicImage::ImageLuma8(_) | DynamicImage::ImageLuma16(_) => {
                    ColorMode::Grayscale
                }
                DynamicImage::ImageLumaA8(_) | DynamicImage::ImageLumaA16(_) => {
                    ColorMode::GrayscaleAlpha
                }
                DynamicImage::ImageRgb8(_)
                | DynamicImage::ImageRgb16(_)
                | DynamicImage::ImageRgb32F(_) => ColorMode::TrueColor,
                DynamicImage::ImageRgba8(_)
                | DynamicImage::ImageRgba16(_)
                | DynamicImage::ImageRgba32F(_) => ColorMode::TrueColorAlpha,
                _ => ColorMode::Other,
            },
        }
    }
}

/// 解码后的图像，归单个文件处理步骤独占
#[derive(Debug, Clone)]
pub struct ImageHandle {
    pub pixels: Pixels,
    pub metadata: Metadata,
    /// 源文件容器格式
    pub source_format: ImageFormat,
}

impl ImageHandle {
    pub fn new(pixels: Pixels, metadata: Metadata, source_format: ImageFormat) -> Self {
        Self {
            pixels,
            metadata,
            source_format,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.dimensions().0
    }

    pub fn height(&self) -> u32 {
        self.pixels.dimensions().1
    }

    pub fn color_mode(&self) -> ColorMode {
        self.pixels.color_mode()
    }

    /// 转为非调色板像素，调色板透明信息体现为 alpha 通道
    pub fn to_raster(&self) -> DynamicImage {
        match &self.pixels {
            Pixels::Indexed(img) => img.to_dynamic(self.metadata.transparency.as_ref()),
            Pixels::Raster(img) => img.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_color() -> IndexedImage {
        IndexedImage {
            width: 2,
            height: 1,
            indices: vec![0, 1],
            palette: vec![[255, 0, 0], [0, 0, 255]],
        }
    }

    #[test]
    fn test_transparency_index_from_palette_alpha() {
        let meta = Metadata {
            transparency: Some(Transparency::PaletteAlpha(vec![255, 255, 0])),
            ..Default::default()
        };
        assert_eq!(meta.transparency_index(), Some(2));

        let meta = Metadata {
            transparency: Some(Transparency::PaletteAlpha(vec![255, 128])),
            ..Default::default()
        };
        assert_eq!(meta.transparency_index(), None);
        assert!(meta.has_palette_alpha());

        let meta = Metadata {
            transparency: Some(Transparency::PaletteAlpha(vec![255, 255])),
            ..Default::default()
        };
        assert!(!meta.has_palette_alpha());
        assert!(!Metadata::default().has_palette_alpha());
    }

    #[test]
    fn test_indexed_expansion() {
        let img = two_color();
        let rgba = img.to_rgba(Some(&Transparency::Index(1)));
        assert_eq!(rgba.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(rgba.get_pixel(1, 0).0, [0, 0, 255, 0]);

        let dynamic = img.to_dynamic(None);
        assert!(matches!(dynamic, DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn test_color_modes() {
        let indexed = Pixels::Indexed(two_color());
        assert_eq!(indexed.color_mode(), ColorMode::Indexed);

        let rgba = Pixels::Raster(DynamicImage::new_rgba8(1, 1));
        assert_eq!(rgba.color_mode(), ColorMode::TrueColorAlpha);
        assert!(rgba.color_mode().has_alpha());

        let gray = Pixels::Raster(DynamicImage::new_luma8(1, 1));
        assert_eq!(gray.color_mode(), ColorMode::Grayscale);
        assert_eq!(gray.dimensions(), (1, 1));
    }
}
