//! # 解码
//!
//! 读取源文件并解码为 `ImageHandle`。
//!
//! ## 功能
//! - PNG: 使用 `png` 直接解码，保留 gamma、像素密度、调色板 tRNS、文本块；调色板图像保持索引
//! - GIF: 使用 `gif` 解码第一帧为调色板图像，保留透明索引；画布大小受 `image` 默认内存上限约束
//! - 其他格式: 使用 `image` 解码为 `DynamicImage`
//!
//! ## 依赖关系
//! - 被 `batch/runner.rs` 和 `commands/info.rs` 调用
//! - 使用 `models/handle.rs` 的数据模型

use crate::error::{PixbatchError, Result};
use crate::models::{ImageHandle, IndexedImage, Metadata, PixelDensity, Pixels, Transparency};

use image::ImageFormat;
use std::fs;
use std::io::Cursor;
use std::path::Path;

/// 读取源文件字节，校验为可读的普通文件
pub fn read_source(path: &Path) -> Result<Vec<u8>> {
    let meta = fs::metadata(path).map_err(|e| PixbatchError::Unreadable {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    if !meta.is_file() {
        return Err(PixbatchError::NotAFile {
            path: path.display().to_string(),
        });
    }

    fs::read(path).map_err(|e| PixbatchError::Unreadable {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// 读取并解码文件
pub fn open(path: &Path) -> Result<ImageHandle> {
    let bytes = read_source(path)?;
    decode(&bytes, path)
}

/// 按内容（其次按扩展名）判断格式并解码
pub fn decode(bytes: &[u8], path: &Path) -> Result<ImageHandle> {
    let format = image::guess_format(bytes)
        .or_else(|_| ImageFormat::from_path(path))
        .map_err(|_| {
            PixbatchError::UnsupportedFormat(format!(
                "cannot determine image format of {}",
                path.display()
            ))
        })?;

    match format {
        ImageFormat::Png => decode_png(bytes, path),
        ImageFormat::Gif => decode_gif(bytes, path),
        other => decode_raster(bytes, other, path),
    }
}

fn decode_error(path: &Path, reason: impl std::fmt::Display) -> PixbatchError {
    PixbatchError::DecodeError {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

fn decode_raster(bytes: &[u8], format: ImageFormat, path: &Path) -> Result<ImageHandle> {
    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| decode_error(path, e))?;
    Ok(ImageHandle::new(
        Pixels::Raster(img),
        Metadata::default(),
        format,
    ))
}

// ─────────────────────────────────────────────────────────────
// PNG
// ─────────────────────────────────────────────────────────────

fn decode_png(bytes: &[u8], path: &Path) -> Result<ImageHandle> {
    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::IDENTITY);
    let mut reader = decoder.read_info().map_err(|e| decode_error(path, e))?;

    let info = reader.info();
    let metadata = png_metadata(info);

    if info.color_type != png::ColorType::Indexed {
        return decode_raster(bytes, ImageFormat::Png, path).map(|mut handle| {
            handle.metadata = metadata;
            handle
        });
    }

    let palette: Vec<[u8; 3]> = info
        .palette
        .as_ref()
        .map(|p| p.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect())
        .ok_or_else(|| decode_error(path, "indexed PNG without PLTE chunk"))?;

    let mut buf = vec![0; reader.output_buffer_size()];
    let frame = reader
        .next_frame(&mut buf)
        .map_err(|e| decode_error(path, e))?;

    let indices = unpack_indices(
        &buf,
        frame.width,
        frame.height,
        frame.bit_depth as u8,
        frame.line_size,
    );

    Ok(ImageHandle::new(
        Pixels::Indexed(IndexedImage {
            width: frame.width,
            height: frame.height,
            indices,
            palette,
        }),
        metadata,
        ImageFormat::Png,
    ))
}

fn png_metadata(info: &png::Info) -> Metadata {
    // 灰度/RGB 的 tRNS 色键由 image 解码为 alpha 通道，只有调色板需要单独记录
    let transparency = info
        .trns
        .as_ref()
        .filter(|_| info.color_type == png::ColorType::Indexed)
        .map(|t| Transparency::PaletteAlpha(t.to_vec()));

    Metadata {
        gamma: info.source_gamma.map(|g| g.into_scaled()),
        density: info.pixel_dims.map(|d| PixelDensity {
            x: d.xppu,
            y: d.yppu,
            per_meter: matches!(d.unit, png::Unit::Meter),
        }),
        transparency,
        text: info
            .uncompressed_latin1_text
            .iter()
            .map(|chunk| (chunk.keyword.clone(), chunk.text.clone()))
            .collect(),
    }
}

/// 将 1/2/4/8 位打包的索引行展开为每像素一个字节
fn unpack_indices(raw: &[u8], width: u32, height: u32, bit_depth: u8, line_size: usize) -> Vec<u8> {
    let per_byte = (8 / bit_depth.max(1)) as usize;
    let mask = ((1u16 << bit_depth) - 1) as u8;
    let mut out = Vec::with_capacity(width as usize * height as usize);

    for row in raw.chunks(line_size).take(height as usize) {
        for x in 0..width as usize {
            let byte = row[x / per_byte];
            let shift = 8 - bit_depth as usize * (x % per_byte + 1);
            out.push((byte >> shift) & mask);
        }
    }

    out
}

// ─────────────────────────────────────────────────────────────
// GIF
// ─────────────────────────────────────────────────────────────

fn decode_gif(bytes: &[u8], path: &Path) -> Result<ImageHandle> {
    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::Indexed);
    let mut decoder = options
        .read_info(Cursor::new(bytes))
        .map_err(|e| decode_error(path, e))?;

    let (screen_width, screen_height) = (decoder.width() as u32, decoder.height() as u32);
    let global_palette = decoder.global_palette().map(|p| p.to_vec());
    let background = decoder.bg_color();

    let frame = decoder
        .read_next_frame()
        .map_err(|e| decode_error(path, e))?
        .ok_or_else(|| decode_error(path, "GIF contains no frames"))?;

    let flat_palette = frame
        .palette
        .clone()
        .or(global_palette)
        .ok_or_else(|| decode_error(path, "GIF frame has no color table"))?;
    let palette: Vec<[u8; 3]> = flat_palette
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect();

    // 第一帧可能小于逻辑屏幕，按偏移贴到画布上
    let (left, top) = (frame.left as u32, frame.top as u32);
    let (frame_width, frame_height) = (frame.width as u32, frame.height as u32);
    let width = screen_width.max(left + frame_width);
    let height = screen_height.max(top + frame_height);
    check_canvas_limit(width, height, path)?;

    let fill = frame
        .transparent
        .or(background.map(|i| i as u8))
        .unwrap_or(0);
    let mut indices = vec![fill; width as usize * height as usize];
    for row in 0..frame_height {
        let src = (row * frame_width) as usize;
        let dst = ((top + row) * width + left) as usize;
        indices[dst..dst + frame_width as usize]
            .copy_from_slice(&frame.buffer[src..src + frame_width as usize]);
    }

    let metadata = Metadata {
        transparency: frame.transparent.map(Transparency::Index),
        ..Default::default()
    };

    Ok(ImageHandle::new(
        Pixels::Indexed(IndexedImage {
            width,
            height,
            indices,
            palette,
        }),
        metadata,
        ImageFormat::Gif,
    ))
}

/// 逻辑屏幕来自文件头，分配前按展开为 RGBA 后的大小检查内存上限
fn check_canvas_limit(width: u32, height: u32, path: &Path) -> Result<()> {
    let max_alloc = image::Limits::default().max_alloc.unwrap_or(u64::MAX);
    let needed = u64::from(width) * u64::from(height) * 4;
    if needed > max_alloc {
        return Err(decode_error(
            path,
            format!(
                "GIF canvas {}x{} exceeds the decoding memory limit of {} bytes",
                width, height, max_alloc
            ),
        ));
    }
    Ok(())
}
