//! # 编码
//!
//! 按 `SaveSpec` 将像素编码为目标容器字节并写出。
//!
//! ## 功能
//! - PNG: 使用 `png` 编码，写回 gamma、pHYs、tRNS、tEXt，调色板图像保持调色板
//! - GIF: 使用 `gif` 编码单帧调色板图像，可带透明索引
//! - JPEG / BMP / 其他: 使用 `image` 编码
//! - PDF: JPEG 嵌入单页 PDF（见 `codec/pdf.rs`）
//!
//! ## 依赖关系
//! - 被 `batch/runner.rs` 调用
//! - 使用 `transform/palette.rs` 处理误入 GIF 的非调色板像素

use super::pdf;
use crate::error::{PixbatchError, Result};
use crate::models::{Container, IndexedImage, Metadata, Pixels, Transparency};
use crate::transform::palette;
use crate::transform::SaveSpec;

use image::{DynamicImage, ImageFormat};
use std::borrow::Cow;
use std::fs;
use std::io::Cursor;
use std::path::Path;

/// 编码并写入目标路径
pub fn write(spec: &SaveSpec, path: &Path) -> Result<()> {
    let bytes = encode(spec)?;
    fs::write(path, bytes).map_err(|e| PixbatchError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

/// 编码为目标容器字节
pub fn encode(spec: &SaveSpec) -> Result<Vec<u8>> {
    match spec.container {
        Container::Png => encode_png(&spec.pixels, &spec.metadata),
        Container::Gif => match &spec.pixels {
            Pixels::Indexed(indexed) => encode_gif(indexed, spec.transparency_index),
            Pixels::Raster(img) => {
                let indexed = palette::quantize(&img.to_rgba8(), 256, None);
                encode_gif(&indexed, None)
            }
        },
        Container::Jpeg => encode_with_image(&opaque_raster(&spec.pixels), ImageFormat::Jpeg),
        Container::Bmp => encode_with_image(&raster(&spec.pixels), ImageFormat::Bmp),
        Container::Pdf => encode_pdf(&opaque_raster(&spec.pixels)),
        Container::Other(format) => encode_with_image(&raster(&spec.pixels), format),
    }
}

fn raster(pixels: &Pixels) -> DynamicImage {
    match pixels {
        Pixels::Indexed(indexed) => DynamicImage::ImageRgb8(indexed.to_rgb()),
        Pixels::Raster(img) => img.clone(),
    }
}

/// JPEG 只接受 8 位灰度或 RGB
fn opaque_raster(pixels: &Pixels) -> DynamicImage {
    match raster(pixels) {
        img @ (DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_)) => img,
        img @ DynamicImage::ImageLuma16(_) => DynamicImage::ImageLuma8(img.to_luma8()),
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

fn encode_with_image(img: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format)
        .map_err(|e| PixbatchError::encode(format!("{:?}", format), e))?;
    Ok(buf)
}

fn encode_pdf(img: &DynamicImage) -> Result<Vec<u8>> {
    let jpeg = encode_with_image(img, ImageFormat::Jpeg)?;
    let grayscale = matches!(img, DynamicImage::ImageLuma8(_));
    Ok(pdf::wrap_jpeg(&jpeg, img.width(), img.height(), grayscale))
}

// ─────────────────────────────────────────────────────────────
// PNG
// ─────────────────────────────────────────────────────────────

fn encode_png(pixels: &Pixels, metadata: &Metadata) -> Result<Vec<u8>> {
    let png_err = |e: png::EncodingError| PixbatchError::encode("PNG", e);
    let (width, height) = pixels.dimensions();

    let (color, depth, data, palette) = match pixels {
        Pixels::Indexed(indexed) => (
            png::ColorType::Indexed,
            png::BitDepth::Eight,
            Cow::Borrowed(indexed.indices.as_slice()),
            Some(indexed.flat_palette()),
        ),
        Pixels::Raster(img) => {
            let (color, depth, data) = png_layout(img);
            (color, depth, Cow::Owned(data), None)
        }
    };

    let mut buf = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut buf, width, height);
        encoder.set_color(color);
        encoder.set_depth(depth);

        let palette_len = palette.as_ref().map(|p| p.len() / 3).unwrap_or(0);
        if let Some(palette) = palette {
            encoder.set_palette(palette);
        }
        if let Some(trns) = metadata
            .transparency
            .as_ref()
            .and_then(|t| trns_chunk(t, color, palette_len))
        {
            encoder.set_trns(trns);
        }
        if let Some(gamma) = metadata.gamma {
            encoder.set_source_gamma(png::ScaledFloat::from_scaled(gamma));
        }
        if let Some(density) = metadata.density {
            encoder.set_pixel_dims(Some(png::PixelDimensions {
                xppu: density.x,
                yppu: density.y,
                unit: if density.per_meter {
                    png::Unit::Meter
                } else {
                    png::Unit::Unspecified
                },
            }));
        }
        for (keyword, text) in &metadata.text {
            encoder
                .add_text_chunk(keyword.clone(), text.clone())
                .map_err(png_err)?;
        }

        let mut writer = encoder.write_header().map_err(png_err)?;
        writer.write_image_data(&data).map_err(png_err)?;
        writer.finish().map_err(png_err)?;
    }

    Ok(buf)
}

/// PNG 颜色类型、位深和大端像素数据
fn png_layout(img: &DynamicImage) -> (png::ColorType, png::BitDepth, Vec<u8>) {
    use png::BitDepth::{Eight, Sixteen};
    use png::ColorType::{Grayscale, GrayscaleAlpha, Rgb, Rgba};

    fn be(samples: &[u16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_be_bytes()).collect()
    }

    match img {
        DynamicImage::ImageLuma8(b) => (Grayscale, Eight, b.as_raw().clone()),
        DynamicImage::ImageLumaA8(b) => (GrayscaleAlpha, Eight, b.as_raw().clone()),
        DynamicImage::ImageRgb8(b) => (Rgb, Eight, b.as_raw().clone()),
        DynamicImage::ImageRgba8(b) => (Rgba, Eight, b.as_raw().clone()),
        DynamicImage::ImageLuma16(b) => (Grayscale, Sixteen, be(b.as_raw())),
        DynamicImage::ImageLumaA16(b) => (GrayscaleAlpha, Sixteen, be(b.as_raw())),
        DynamicImage::ImageRgb16(b) => (Rgb, Sixteen, be(b.as_raw())),
        DynamicImage::ImageRgba16(b) => (Rgba, Sixteen, be(b.as_raw())),
        other => (Rgba, Eight, other.to_rgba8().into_raw()),
    }
}

/// 调色板输出时生成 tRNS 数据，其它像素类型丢弃
fn trns_chunk(
    transparency: &Transparency,
    color: png::ColorType,
    palette_len: usize,
) -> Option<Vec<u8>> {
    match (transparency, color) {
        (Transparency::PaletteAlpha(alpha), png::ColorType::Indexed) => {
            Some(alpha[..alpha.len().min(palette_len)].to_vec())
        }
        (Transparency::Index(i), png::ColorType::Indexed) if (*i as usize) < palette_len => {
            let mut alpha = vec![255; *i as usize + 1];
            alpha[*i as usize] = 0;
            Some(alpha)
        }
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────
// GIF
// ─────────────────────────────────────────────────────────────

fn encode_gif(indexed: &IndexedImage, transparent: Option<u8>) -> Result<Vec<u8>> {
    let gif_err = |e: gif::EncodingError| PixbatchError::encode("GIF", e);
    let too_large = || {
        PixbatchError::encode(
            "GIF",
            format!(
                "{}x{} exceeds the 65535 pixel limit",
                indexed.width, indexed.height
            ),
        )
    };
    let width = u16::try_from(indexed.width).map_err(|_| too_large())?;
    let height = u16::try_from(indexed.height).map_err(|_| too_large())?;

    let mut buf = Vec::new();
    {
        let mut encoder =
            gif::Encoder::new(&mut buf, width, height, &indexed.flat_palette()).map_err(gif_err)?;
        let frame = gif::Frame {
            width,
            height,
            buffer: Cow::Borrowed(indexed.indices.as_slice()),
            transparent,
            ..gif::Frame::default()
        };
        encoder.write_frame(&frame).map_err(gif_err)?;
    }

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode;
    use crate::models::{ColorMode, ImageHandle, PixelDensity};
    use crate::transform::adapt;
    use image::{Rgba, RgbaImage};

    fn indexed() -> IndexedImage {
        IndexedImage {
            width: 2,
            height: 2,
            indices: vec![0, 1, 2, 3],
            palette: vec![[0, 0, 0], [255, 0, 0], [0, 255, 0], [0, 0, 255]],
        }
    }

    #[test]
    fn test_png_metadata_round_trip() {
        let metadata = Metadata {
            gamma: Some(45455),
            density: Some(PixelDensity {
                x: 2835,
                y: 2835,
                per_meter: true,
            }),
            transparency: Some(Transparency::PaletteAlpha(vec![255, 0])),
            text: vec![("Software".to_string(), "pixbatch".to_string())],
        };
        let handle = ImageHandle::new(Pixels::Indexed(indexed()), metadata.clone(), ImageFormat::Png);
        let spec = adapt(handle, Container::Png, false);

        let bytes = encode(&spec).unwrap();
        let decoded = decode::decode(&bytes, Path::new("out.png")).unwrap();

        assert_eq!(decoded.color_mode(), ColorMode::Indexed);
        assert_eq!(decoded.metadata, metadata);
        assert_eq!(decoded.pixels, Pixels::Indexed(indexed()));
    }

    #[test]
    fn test_gif_transparency_round_trip() {
        let mut img = RgbaImage::from_pixel(3, 3, Rgba([10, 200, 30, 255]));
        img.put_pixel(1, 1, Rgba([0, 0, 0, 0]));
        let handle = ImageHandle::new(
            Pixels::Raster(DynamicImage::ImageRgba8(img)),
            Metadata::default(),
            ImageFormat::Png,
        );
        let spec = adapt(handle, Container::Gif, true);

        let bytes = encode(&spec).unwrap();
        let decoded = decode::decode(&bytes, Path::new("out.gif")).unwrap();

        assert_eq!(decoded.metadata.transparency, Some(Transparency::Index(255)));
        let Pixels::Indexed(out) = decoded.pixels else {
            panic!("expected indexed pixels");
        };
        assert_eq!(out.indices[4], 255);
        assert_ne!(out.indices[0], 255);
    }

    #[test]
    fn test_jpeg_from_rgba_is_opaque() {
        let handle = ImageHandle::new(
            Pixels::Raster(DynamicImage::new_rgba8(8, 8)),
            Metadata::default(),
            ImageFormat::Png,
        );
        let spec = adapt(handle, Container::Jpeg, false);
        let bytes = encode(&spec).unwrap();

        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 8));
    }

    #[test]
    fn test_bmp_and_pdf() {
        let handle = ImageHandle::new(Pixels::Indexed(indexed()), Metadata::default(), ImageFormat::Gif);
        let bytes = encode(&adapt(handle.clone(), Container::Bmp, false)).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Bmp);

        let bytes = encode(&adapt(handle, Container::Pdf, false)).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_trns_dropped_when_incompatible() {
        let alpha = Transparency::PaletteAlpha(vec![255, 0, 128, 64, 32]);
        assert_eq!(
            trns_chunk(&alpha, png::ColorType::Indexed, 3),
            Some(vec![255, 0, 128])
        );
        assert_eq!(trns_chunk(&alpha, png::ColorType::Rgba, 3), None);
        assert_eq!(trns_chunk(&alpha, png::ColorType::Rgb, 3), None);
        assert_eq!(
            trns_chunk(&Transparency::Index(2), png::ColorType::Indexed, 4),
            Some(vec![255, 255, 0])
        );
        assert_eq!(trns_chunk(&Transparency::Index(4), png::ColorType::Indexed, 4), None);
        assert_eq!(trns_chunk(&Transparency::Index(0), png::ColorType::Grayscale, 0), None);
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let handle = ImageHandle::new(Pixels::Indexed(indexed()), Metadata::default(), ImageFormat::Gif);
        let spec = adapt(handle, Container::Gif, false);
        let result = write(&spec, Path::new("/nonexistent/pixbatch/out.gif"));
        assert!(matches!(result, Err(PixbatchError::FileWriteError { .. })));
    }
}
