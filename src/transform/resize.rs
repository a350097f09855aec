//! # 缩放规划与执行
//!
//! 根据缩放指令计算目标尺寸，并以“只缩小、保持宽高比”的方式执行缩放。
//!
//! ## 算法
//! - `Ratio(p)`: p == 100 不缩放；否则 (floor(w·p/100), floor(h·p/100))
//! - `Width(w')`: 与当前宽度相同不缩放；否则 (w', round(h·w'/w))
//! - `Height(h')`: 与当前高度相同不缩放；否则 (round(w·h'/h), h')
//!
//! 计算出的尺寸作为外框，图像按宽高比缩小到框内；外框不小于当前尺寸时不放大。
//! 重采样使用 Lanczos3 卷积。
//!
//! ## 依赖关系
//! - 被 `batch/runner.rs` 调用
//! - 使用 `fast_image_resize` 进行重采样

use crate::error::{PixbatchError, Result};
use crate::models::{ImageHandle, Pixels, ResizeDirective};

use fast_image_resize as fr;
use image::DynamicImage;

/// 计算目标尺寸，`None` 表示无需缩放
pub fn plan(width: u32, height: u32, directive: Option<ResizeDirective>) -> Option<(u32, u32)> {
    let (w, h) = (width as u64, height as u64);

    match directive? {
        ResizeDirective::Ratio(p) => {
            let p = p.get() as u64;
            if p == 100 {
                return None;
            }
            Some((clamp_u32(w * p / 100), clamp_u32(h * p / 100)))
        }
        ResizeDirective::Width(target) => {
            let target = target.get() as u64;
            if target == w {
                return None;
            }
            Some((clamp_u32(target), clamp_u32(div_round(h * target, w))))
        }
        ResizeDirective::Height(target) => {
            let target = target.get() as u64;
            if target == h {
                return None;
            }
            Some((clamp_u32(div_round(w * target, h)), clamp_u32(target)))
        }
    }
}

/// 将当前尺寸按宽高比缩小到外框内
///
/// 外框在两个方向上都不小于当前尺寸时返回 `None`（不放大）。
pub fn fit_within(current: (u32, u32), bound: (u32, u32)) -> Result<Option<(u32, u32)>> {
    let (w, h) = current;
    let (bw, bh) = bound;

    if bw == 0 || bh == 0 || w == 0 || h == 0 {
        return Err(PixbatchError::InvalidGeometry {
            width: bw,
            height: bh,
        });
    }

    if bw >= w && bh >= h {
        return Ok(None);
    }

    let aspect = w as f64 / h as f64;
    let (bw_f, bh_f) = (bw as f64, bh as f64);

    let fitted = if bw_f / bh_f >= aspect {
        let x = round_aspect(bh_f * aspect, |n| (aspect - n / bh_f).abs());
        (x.min(w), bh)
    } else {
        let y = round_aspect(bw_f / aspect, |n| (aspect - bw_f / n).abs());
        (bw, y.min(h))
    };

    if fitted == current {
        Ok(None)
    } else {
        Ok(Some(fitted))
    }
}

/// 在 floor/ceil 中选出最贴近宽高比的整数边长（至少为 1）
fn round_aspect(value: f64, error: impl Fn(f64) -> f64) -> u32 {
    let floor = value.floor().max(1.0);
    let ceil = value.ceil().max(1.0);
    let best = if error(ceil) < error(floor) { ceil } else { floor };
    best as u32
}

/// 规划并执行缩放；调色板图像先展开为真彩色再重采样
pub fn apply(image: ImageHandle, directive: Option<ResizeDirective>) -> Result<ImageHandle> {
    let current = (image.width(), image.height());

    let Some(bound) = plan(current.0, current.1, directive) else {
        return Ok(image);
    };

    let Some((width, height)) = fit_within(current, bound)? else {
        log::debug!(
            "planned {}x{} does not shrink {}x{}, keeping size",
            bound.0,
            bound.1,
            current.0,
            current.1
        );
        return Ok(image);
    };

    log::debug!(
        "resizing {}x{} -> {}x{}",
        current.0,
        current.1,
        width,
        height
    );

    let resized = resample(&image.to_raster(), width, height)?;

    Ok(ImageHandle::new(
        Pixels::Raster(resized),
        image.metadata,
        image.source_format,
    ))
}

/// Lanczos3 重采样（alpha 通道自动预乘）
pub fn resample(src: &DynamicImage, width: u32, height: u32) -> Result<DynamicImage> {
    if width == 0 || height == 0 {
        return Err(PixbatchError::InvalidGeometry { width, height });
    }

    let mut dst = DynamicImage::new(width, height, src.color());

    let mut resizer = fr::Resizer::new();
    let options = fr::ResizeOptions::new()
        .resize_alg(fr::ResizeAlg::Convolution(fr::FilterType::Lanczos3));

    resizer
        .resize(src, &mut dst, Some(&options))
        .map_err(|e| PixbatchError::ResizeError(e.to_string()))?;

    Ok(dst)
}

/// 四舍五入的整数除法，分母为图像边长（不超过 `u32::MAX`）
fn div_round(numerator: u64, denominator: u64) -> u64 {
    numerator / denominator + u64::from(numerator % denominator * 2 >= denominator)
}

fn clamp_u32(value: u64) -> u32 {
    value.min(u32::MAX as u64) as u32
}
