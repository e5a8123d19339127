//! Pixel-format conversion of raw capture buffers to packed RGB.

use image::{ImageFormat, RgbImage};

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("buffer too short: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("MJPEG decode failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error("decoded frame is {actual:?}, negotiated {expected:?}")]
    SizeMismatch { expected: (u32, u32), actual: (u32, u32) },
}

fn check_len(buf: &[u8], expected: usize) -> Result<(), FrameError> {
    if buf.len() < expected {
        return Err(FrameError::InvalidLength {
            expected,
            actual: buf.len(),
        });
    }
    Ok(())
}

fn into_image(data: Vec<u8>, width: u32, height: u32) -> Result<RgbImage, FrameError> {
    let actual = data.len();
    RgbImage::from_raw(width, height, data).ok_or(FrameError::InvalidLength {
        expected: (width * height * 3) as usize,
        actual,
    })
}

fn clamp_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// BT.601 limited-range YCbCr → RGB.
fn ycbcr_to_rgb(y: u8, cb: u8, cr: u8) -> [u8; 3] {
    let c = 1.164 * (y as f32 - 16.0);
    let d = cb as f32 - 128.0;
    let e = cr as f32 - 128.0;
    [
        clamp_u8(c + 1.596 * e),
        clamp_u8(c - 0.392 * d - 0.813 * e),
        clamp_u8(c + 2.017 * d),
    ]
}

/// Convert packed YUYV 4:2:2 to RGB.
///
/// Each 4-byte group `[Y0, U, Y1, V]` yields two pixels sharing U and V.
pub fn yuyv_to_rgb(yuyv: &[u8], width: u32, height: u32) -> Result<RgbImage, FrameError> {
    let pixels = (width * height) as usize;
    check_len(yuyv, pixels * 2)?;

    let mut rgb = Vec::with_capacity(pixels * 3);
    for group in yuyv[..pixels * 2].chunks_exact(4) {
        let (y0, u, y1, v) = (group[0], group[1], group[2], group[3]);
        rgb.extend_from_slice(&ycbcr_to_rgb(y0, u, v));
        rgb.extend_from_slice(&ycbcr_to_rgb(y1, u, v));
    }
    into_image(rgb, width, height)
}

/// Swap BGR24 to RGB24.
pub fn bgr_to_rgb(bgr: &[u8], width: u32, height: u32) -> Result<RgbImage, FrameError> {
    let bytes = (width * height * 3) as usize;
    check_len(bgr, bytes)?;
    let rgb = bgr[..bytes]
        .chunks_exact(3)
        .flat_map(|p| [p[2], p[1], p[0]])
        .collect();
    into_image(rgb, width, height)
}

/// Copy an RGB24 buffer.
pub fn rgb24(buf: &[u8], width: u32, height: u32) -> Result<RgbImage, FrameError> {
    let bytes = (width * height * 3) as usize;
    check_len(buf, bytes)?;
    into_image(buf[..bytes].to_vec(), width, height)
}

/// Replicate 8-bit grayscale into three channels.
pub fn grey_to_rgb(grey: &[u8], width: u32, height: u32) -> Result<RgbImage, FrameError> {
    let pixels = (width * height) as usize;
    check_len(grey, pixels)?;
    let rgb = grey[..pixels].iter().flat_map(|&g| [g, g, g]).collect();
    into_image(rgb, width, height)
}

/// Decode one MJPEG frame.
pub fn mjpeg_to_rgb(jpeg: &[u8], width: u32, height: u32) -> Result<RgbImage, FrameError> {
    let img = image::load_from_memory_with_format(jpeg, ImageFormat::Jpeg)?.to_rgb8();
    if img.dimensions() != (width, height) {
        return Err(FrameError::SizeMismatch {
            expected: (width, height),
            actual: img.dimensions(),
        });
    }
    Ok(img)
}
