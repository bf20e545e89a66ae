use std::fmt::Display;
use std::future::Future;

use tracing::warn;

use crate::error::ImageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    DeviceRGB,
    DeviceGray,
}

impl ColorSpace {
    pub fn pdf_name(&self) -> &'static str {
        match self {
            ColorSpace::DeviceRGB => "DeviceRGB",
            ColorSpace::DeviceGray => "DeviceGray",
        }
    }
}

/// A decoded issuer logo, ready to embed as an image XObject.
///
/// Decoded once before rendering and drawn in every page header.
#[derive(Debug, Clone)]
pub struct LogoImage {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub color_space: ColorSpace,
    /// Raw JPEG bytes, or 8-bit pixel samples for PNG.
    pub data: Vec<u8>,
    /// Separate 8-bit alpha channel, when the PNG had one.
    pub smask: Option<Vec<u8>>,
}

impl LogoImage {
    /// Decode JPEG or PNG bytes, sniffing the format from magic bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<LogoImage, ImageError> {
        match detect_format(&data)? {
            ImageFormat::Jpeg => parse_jpeg(data),
            ImageFormat::Png => parse_png(data),
        }
    }

    /// Size of the logo scaled to fit inside `max_w` × `max_h`, keeping the
    /// aspect ratio.
    pub fn fit_within(&self, max_w: f64, max_h: f64) -> (f64, f64) {
        if self.width == 0 || self.height == 0 {
            return (0.0, 0.0);
        }
        let iw = self.width as f64;
        let ih = self.height as f64;
        let scale = (max_w / iw).min(max_h / ih);
        (iw * scale, ih * scale)
    }
}

/// Await a logo fetch once and decode the result.
///
/// Fetch or decode failures are logged and yield `None`; the document then
/// renders without a logo.
pub async fn resolve_logo<F, E>(fetch: F) -> Option<LogoImage>
where
    F: Future<Output = Result<Vec<u8>, E>>,
    E: Display,
{
    let bytes = match fetch.await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "Logo fetch failed, rendering without logo");
            return None;
        }
    };
    match LogoImage::from_bytes(bytes) {
        Ok(logo) => Some(logo),
        Err(e) => {
            warn!(error = %e, "Logo decode failed, rendering without logo");
            None
        }
    }
}

pub fn detect_format(data: &[u8]) -> Result<ImageFormat, ImageError> {
    if data.len() < 4 {
        return Err(ImageError::TooShort);
    }
    if data[0] == 0xFF && data[1] == 0xD8 {
        Ok(ImageFormat::Jpeg)
    } else if data[..4] == [0x89, b'P', b'N', b'G'] {
        Ok(ImageFormat::Png)
    } else {
        Err(ImageError::UnsupportedFormat)
    }
}

/// JPEG is embedded as-is (DCTDecode); only the frame header is read.
fn parse_jpeg(data: Vec<u8>) -> Result<LogoImage, ImageError> {
    let (width, height, components) = jpeg_dimensions(&data)?;
    let color_space = match components {
        1 => ColorSpace::DeviceGray,
        3 => ColorSpace::DeviceRGB,
        n => {
            return Err(ImageError::Jpeg(format!(
                "unsupported component count {} (expected 1 or 3)",
                n
            )))
        }
    };
    Ok(LogoImage {
        width,
        height,
        format: ImageFormat::Jpeg,
        color_space,
        data,
        smask: None,
    })
}

/// Walk JPEG segments to the first SOF0..SOF3 frame header.
fn jpeg_dimensions(data: &[u8]) -> Result<(u32, u32, u8), ImageError> {
    let len = data.len();
    let mut i = 0;
    while i + 1 < len {
        if data[i] != 0xFF {
            i += 1;
            continue;
        }
        let marker = data[i + 1];
        if (0xC0..=0xC3).contains(&marker) {
            if i + 9 >= len {
                return Err(ImageError::Jpeg("frame header truncated".into()));
            }
            let height = u16::from_be_bytes([data[i + 5], data[i + 6]]) as u32;
            let width = u16::from_be_bytes([data[i + 7], data[i + 8]]) as u32;
            return Ok((width, height, data[i + 9]));
        }
        match marker {
            0xFF | 0x00 => i += 1,
            0xD8 | 0xD9 | 0xD0..=0xD7 => i += 2,
            _ => {
                if i + 3 >= len {
                    break;
                }
                let seg_len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
                i += 2 + seg_len;
            }
        }
    }
    Err(ImageError::Jpeg("no frame header found".into()))
}

/// Decode PNG to 8-bit samples, splitting any alpha channel into a soft mask.
fn parse_png(data: Vec<u8>) -> Result<LogoImage, ImageError> {
    let mut decoder = png::Decoder::new(data.as_slice());
    decoder.set_transformations(png::Transformations::normalize_to_color8());
    let mut reader = decoder
        .read_info()
        .map_err(|e| ImageError::Png(e.to_string()))?;
    let mut buf = vec![0u8; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| ImageError::Png(e.to_string()))?;
    buf.truncate(info.buffer_size());

    let (color_space, pixels, smask) = match info.color_type {
        png::ColorType::Rgb => (ColorSpace::DeviceRGB, buf, None),
        png::ColorType::Grayscale => (ColorSpace::DeviceGray, buf, None),
        png::ColorType::Rgba => {
            let (rgb, alpha) = split_alpha(&buf, 4);
            (ColorSpace::DeviceRGB, rgb, Some(alpha))
        }
        png::ColorType::GrayscaleAlpha => {
            let (gray, alpha) = split_alpha(&buf, 2);
            (ColorSpace::DeviceGray, gray, Some(alpha))
        }
        other => {
            return Err(ImageError::Png(format!("unsupported color type {:?}", other)))
        }
    };

    Ok(LogoImage {
        width: info.width,
        height: info.height,
        format: ImageFormat::Png,
        color_space,
        data: pixels,
        smask,
    })
}

/// Split interleaved samples into color channels and the trailing alpha.
fn split_alpha(buf: &[u8], stride: usize) -> (Vec<u8>, Vec<u8>) {
    let pixels = buf.len() / stride;
    let mut color = Vec::with_capacity(pixels * (stride - 1));
    let mut alpha = Vec::with_capacity(pixels);
    for chunk in buf.chunks_exact(stride) {
        color.extend_from_slice(&chunk[..stride - 1]);
        alpha.push(chunk[stride - 1]);
    }
    (color, alpha)
}
