//! # 调色板与 alpha 合成
//!
//! - `quantize`: 真彩色降为调色板，可保留一个透明索引
//! - `composite`: 以 alpha 为权重将图像叠加到不透明背景色上
//!
//! 颜色数不超过上限时使用精确调色板，否则使用 NeuQuant 自适应调色板。
//!
//! ## 依赖关系
//! - 被 `transform/adapter.rs` 调用
//! - 使用 `color_quant` 进行自适应量化

use crate::models::IndexedImage;

use color_quant::NeuQuant;
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage, RgbaImage};
use std::collections::HashMap;

/// 默认合成背景色（白色）
pub const DEFAULT_BACKGROUND: [u8; 3] = [255, 255, 255];

/// alpha 不超过该值的像素视为透明
pub const ALPHA_THRESHOLD: u8 = 128;

/// NeuQuant 采样因子（1 最慢最准，30 最快）
const SAMPLE_FACTOR: i32 = 10;

/// 将 RGBA 图像量化为调色板图像
///
/// `transparent_index` 为 `Some(t)` 时，透明像素映射到索引 t，
/// 不透明颜色最多占用 `max_colors` 个索引（需 `max_colors <= t`）。
pub fn quantize(rgba: &RgbaImage, max_colors: usize, transparent_index: Option<u8>) -> IndexedImage {
    let (width, height) = rgba.dimensions();
    let is_transparent = |a: u8| transparent_index.is_some() && a <= ALPHA_THRESHOLD;

    let (mut colors, indices) = match exact_palette(rgba, max_colors, &is_transparent) {
        Some((colors, lookup)) => {
            let indices = map_pixels(rgba, transparent_index, &is_transparent, |rgb| lookup[&rgb]);
            (colors, indices)
        }
        None => {
            let samples: Vec<u8> = rgba
                .pixels()
                .filter(|p| !is_transparent(p.0[3]))
                .flat_map(|p| [p.0[0], p.0[1], p.0[2], 255])
                .collect();
            let quant = NeuQuant::new(SAMPLE_FACTOR, max_colors, &samples);
            let colors: Vec<[u8; 3]> = quant
                .color_map_rgb()
                .chunks_exact(3)
                .map(|c| [c[0], c[1], c[2]])
                .collect();
            let indices = map_pixels(rgba, transparent_index, &is_transparent, |[r, g, b]| {
                quant.index_of(&[r, g, b, 255]) as u8
            });
            (colors, indices)
        }
    };

    if let Some(t) = transparent_index {
        if colors.len() <= t as usize {
            colors.resize(t as usize + 1, [0, 0, 0]);
        }
    }

    IndexedImage {
        width,
        height,
        indices,
        palette: colors,
    }
}

fn map_pixels(
    rgba: &RgbaImage,
    transparent_index: Option<u8>,
    is_transparent: &impl Fn(u8) -> bool,
    lookup: impl Fn([u8; 3]) -> u8,
) -> Vec<u8> {
    rgba.pixels()
        .map(|p| {
            let [r, g, b, a] = p.0;
            match transparent_index {
                Some(t) if is_transparent(a) => t,
                _ => lookup([r, g, b]),
            }
        })
        .collect()
}

type ExactPalette = (Vec<[u8; 3]>, HashMap<[u8; 3], u8>);

/// 颜色数不超过上限时返回精确调色板
fn exact_palette(
    rgba: &RgbaImage,
    max_colors: usize,
    is_transparent: &impl Fn(u8) -> bool,
) -> Option<ExactPalette> {
    let mut colors = Vec::new();
    let mut lookup = HashMap::new();

    for p in rgba.pixels() {
        let [r, g, b, a] = p.0;
        if is_transparent(a) || lookup.contains_key(&[r, g, b]) {
            continue;
        }
        if colors.len() == max_colors {
            return None;
        }
        lookup.insert([r, g, b], colors.len() as u8);
        colors.push([r, g, b]);
    }

    Some((colors, lookup))
}

/// 以 alpha 为权重叠加到背景色上，得到不透明图像
///
/// 灰度 + alpha 合成为灰度，其余合成为 RGB。
pub fn composite(image: &DynamicImage, background: [u8; 3]) -> DynamicImage {
    match image {
        DynamicImage::ImageLumaA8(_) | DynamicImage::ImageLumaA16(_) => {
            let la = image.to_luma_alpha8();
            let bg = luma_of(background);
            let out = GrayImage::from_fn(la.width(), la.height(), |x, y| {
                let [l, a] = la.get_pixel(x, y).0;
                Luma([blend(l, bg, a)])
            });
            DynamicImage::ImageLuma8(out)
        }
        _ => DynamicImage::ImageRgb8(composite_rgba(&image.to_rgba8(), background)),
    }
}

/// RGBA 叠加到背景色
pub fn composite_rgba(rgba: &RgbaImage, background: [u8; 3]) -> RgbImage {
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        Rgb([
            blend(r, background[0], a),
            blend(g, background[1], a),
            blend(b, background[2], a),
        ])
    })
}

fn blend(fg: u8, bg: u8, alpha: u8) -> u8 {
    let (fg, bg, a) = (fg as u32, bg as u32, alpha as u32);
    ((fg * a + bg * (255 - a) + 127) / 255) as u8
}

fn luma_of([r, g, b]: [u8; 3]) -> u8 {
    ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114 + 500) / 1000) as u8
}
