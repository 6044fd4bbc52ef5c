/// Raster image decoding (PNG, JPEG, HDR, ...) through the `image` crate

use std::path::Path;

use image::DynamicImage;

use crate::error::Result;
use crate::format::{Extent3d, PixelFormat};
use crate::gpu::{Swizzle, TextureTarget};
use super::decoded::{DecodedImage, DecodedTexture};

/// Decode an image file into a single-level 2D texture.
///
/// The image is not flipped here; the loader flips every decoded texture.
pub fn load(path: &Path) -> Result<DecodedTexture> {
    let image = image::open(path).map_err(|e| {
        crate::ltc_err!(
            "ltc::TextureLoader",
            AssetLoadFailed,
            "Cannot decode image '{}': {}",
            path.display(),
            e
        )
    })?;
    Ok(from_image(image))
}

/// Convert a decoded image to the closest upload format.
///
/// 32-bit float images keep float precision, everything else becomes 8-bit
/// unorm with the image's channel count.
pub fn from_image(image: DynamicImage) -> DecodedTexture {
    let (width, height) = (image.width(), image.height());
    let (format, data) = match image {
        DynamicImage::ImageRgb32F(buffer) => (PixelFormat::Rgb32Float, floats_to_bytes(buffer.into_raw())),
        DynamicImage::ImageRgba32F(buffer) => (PixelFormat::Rgba32Float, floats_to_bytes(buffer.into_raw())),
        other => match other.color().channel_count() {
            1 => (PixelFormat::R8Unorm, other.into_luma8().into_raw()),
            2 => (PixelFormat::Rg8Unorm, other.into_luma_alpha8().into_raw()),
            3 => (PixelFormat::Rgb8Unorm, other.into_rgb8().into_raw()),
            _ => (PixelFormat::Rgba8Unorm, other.into_rgba8().into_raw()),
        },
    };

    // grey images replicate the single channel like the legacy luminance formats
    let swizzle = match format {
        PixelFormat::R8Unorm => [Swizzle::Red, Swizzle::Red, Swizzle::Red, Swizzle::One],
        PixelFormat::Rg8Unorm => [Swizzle::Red, Swizzle::Red, Swizzle::Red, Swizzle::Green],
        _ => Swizzle::IDENTITY,
    };

    DecodedTexture {
        target: TextureTarget::D2,
        format,
        extent: Extent3d::d2(width, height),
        levels: 1,
        images: vec![DecodedImage { face: 0, level: 0, data }],
        swizzle,
    }
}

fn floats_to_bytes(floats: Vec<f32>) -> Vec<u8> {
    bytemuck::cast_slice(&floats).to_vec()
}
