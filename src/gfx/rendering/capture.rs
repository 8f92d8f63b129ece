//! Framebuffer readback, PNG output and golden image comparison

use std::path::Path;

use image::{imageops::FilterType, Rgba, RgbaImage};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to map readback buffer: {0}")]
    Map(#[from] wgpu::BufferAsyncError),

    #[error("readback callback was dropped before completion")]
    Cancelled,

    #[error("failed waiting for the GPU: {0}")]
    Poll(#[from] wgpu::PollError),

    #[error("pixel buffer of {len} bytes does not hold a {width}x{height} RGBA image")]
    InvalidPixels { width: u32, height: u32, len: usize },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

const BYTES_PER_PIXEL: u32 = 4;

/// Row pitch of a texture copy, padded to wgpu's 256 byte requirement
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * BYTES_PER_PIXEL;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Drops the per-row padding of a texture copy
pub fn unpad_rows(padded: &[u8], width: u32, height: u32) -> Vec<u8> {
    let padded_row = padded_bytes_per_row(width) as usize;
    let row = (width * BYTES_PER_PIXEL) as usize;

    let mut pixels = Vec::with_capacity(row * height as usize);
    for chunk in padded.chunks(padded_row).take(height as usize) {
        pixels.extend_from_slice(&chunk[..row]);
    }
    pixels
}

/// Copies an RGBA8 texture back to the CPU
///
/// Returns tightly packed pixels, rows top to bottom.
pub fn read_texture_rgba(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
) -> Result<Vec<u8>, CaptureError> {
    let (width, height) = (texture.width(), texture.height());
    let bytes_per_row = padded_bytes_per_row(width);

    let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Framebuffer Readback Buffer"),
        size: (bytes_per_row * height) as u64,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Framebuffer Readback Encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &staging_buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    // Map and read the buffer
    let slice = staging_buffer.slice(..);
    let (tx, rx) = futures::channel::oneshot::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        // The receiver only disappears if the caller already gave up
        let _ = tx.send(result);
    });

    device.poll(wgpu::PollType::Wait)?;

    match futures::executor::block_on(rx) {
        Ok(Ok(())) => {
            let mapped = slice.get_mapped_range();
            let pixels = unpad_rows(&mapped, width, height);
            drop(mapped);
            staging_buffer.unmap();
            Ok(pixels)
        }
        Ok(Err(e)) => Err(CaptureError::Map(e)),
        Err(_) => Err(CaptureError::Cancelled),
    }
}

/// Wraps tightly packed RGBA8 pixels into an image
pub fn to_image(pixels: Vec<u8>, width: u32, height: u32) -> Result<RgbaImage, CaptureError> {
    let len = pixels.len();
    RgbaImage::from_raw(width, height, pixels).ok_or(CaptureError::InvalidPixels {
        width,
        height,
        len,
    })
}

/// Writes RGBA8 pixels as a PNG file
pub fn save_png(
    path: impl AsRef<Path>,
    pixels: Vec<u8>,
    width: u32,
    height: u32,
) -> Result<(), CaptureError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    to_image(pixels, width, height)?.save_with_format(path, image::ImageFormat::Png)?;
    log::info!("Saved framebuffer to {}", path.display());
    Ok(())
}

/// Difference threshold under which two renders are considered equal
pub const DEFAULT_DIFF_THRESHOLD: f64 = 0.01;

/// Outcome of comparing a render against a golden image
#[derive(Debug, Clone)]
pub struct ImageComparison {
    /// Mean absolute RGB difference normalized to [0, 1]
    pub difference: f64,
    pub threshold: f64,
    pub matches: bool,
    /// Per-pixel difference, brightest where the images disagree most
    pub diff_image: RgbaImage,
}

/// Compares RGB channels of `output` against `golden`
///
/// A golden image of a different size is resized to the output first.
pub fn compare_images(output: &RgbaImage, golden: &RgbaImage, threshold: f64) -> ImageComparison {
    let resized;
    let golden = if golden.dimensions() != output.dimensions() {
        log::warn!(
            "Golden image is {:?}, output is {:?}; resizing golden",
            golden.dimensions(),
            output.dimensions()
        );
        resized = image::imageops::resize(golden, output.width(), output.height(), FilterType::Triangle);
        &resized
    } else {
        golden
    };

    let mut diff_image = RgbaImage::new(output.width(), output.height());
    let mut total: u64 = 0;

    for ((out, gold), diff) in output
        .pixels()
        .zip(golden.pixels())
        .zip(diff_image.pixels_mut())
    {
        let channel_diff = [0, 1, 2].map(|c| out[c].abs_diff(gold[c]));
        total += channel_diff.iter().map(|&d| d as u64).sum::<u64>();

        let mean = (channel_diff.iter().map(|&d| d as u32).sum::<u32>() / 3) as u8;
        *diff = heat_color(mean);
    }

    let samples = output.width() as u64 * output.height() as u64 * 3;
    let difference = if samples == 0 {
        0.0
    } else {
        total as f64 / samples as f64 / 255.0
    };

    ImageComparison {
        difference,
        threshold,
        matches: difference <= threshold,
        diff_image,
    }
}

/// Loads two image files and compares them
pub fn compare_files(
    output_path: impl AsRef<Path>,
    golden_path: impl AsRef<Path>,
    threshold: f64,
) -> Result<ImageComparison, CaptureError> {
    let output = image::open(output_path.as_ref())?.to_rgba8();
    let golden = image::open(golden_path.as_ref())?.to_rgba8();
    Ok(compare_images(&output, &golden, threshold))
}

// Black for identical pixels, through red to yellow for large differences
fn heat_color(value: u8) -> Rgba<u8> {
    let v = value as u16;
    let red = (v * 2).min(255) as u8;
    let green = v.saturating_sub(128).saturating_mul(2).min(255) as u8;
    Rgba([red, green, 0, 255])
}
