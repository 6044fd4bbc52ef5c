/// Texture container parsing (DDS and KTX 1.1)
///
/// Both containers carry every mip level, array layer and cube face in one
/// file. The parsers only understand the formats listed in `PixelFormat`;
/// anything else is reported as an asset load failure.

use std::path::Path;

use crate::error::{Error, Result};
use crate::format::{Extent3d, PixelFormat};
use crate::gpu::{Swizzle, TextureTarget};
use super::decoded::{DecodedImage, DecodedTexture};

const SOURCE: &str = "ltc::TextureContainer";

/// Largest width, height, depth or layer count accepted from a file
const MAX_DIMENSION: u32 = 1 << 16;

/// Read and parse a DDS or KTX file
pub fn load(path: &Path) -> Result<DecodedTexture> {
    let bytes = std::fs::read(path).map_err(|e| {
        crate::ltc_err!(SOURCE, AssetLoadFailed, "Cannot read '{}': {}", path.display(), e)
    })?;
    parse(&bytes).map_err(|e| {
        crate::ltc_error!(SOURCE, "'{}': {}", path.display(), e);
        e
    })
}

/// Parse container bytes, detecting the container from its magic
pub fn parse(bytes: &[u8]) -> Result<DecodedTexture> {
    if bytes.starts_with(DDS_MAGIC) {
        parse_dds(bytes)
    } else if bytes.starts_with(&KTX_IDENTIFIER) {
        parse_ktx(bytes)
    } else {
        Err(Error::AssetLoadFailed("unrecognized texture container".to_string()))
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::AssetLoadFailed(message.into())
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32> {
    let end = offset.checked_add(4).ok_or_else(|| invalid("header offset out of range"))?;
    bytes
        .get(offset..end)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| invalid(format!("truncated header at byte {}", offset)))
}

fn take<'a>(bytes: &'a [u8], offset: &mut usize, len: usize) -> Result<&'a [u8]> {
    let truncated = || invalid(format!("truncated image data: need {} bytes at {}", len, offset));
    let end = offset.checked_add(len).ok_or_else(truncated)?;
    let chunk = bytes.get(*offset..end).ok_or_else(truncated)?;
    *offset = end;
    Ok(chunk)
}

/// Level-0 storage extent for a target.
///
/// Every dimension and the layer count must be at most `MAX_DIMENSION`.
fn storage_extent(target: TextureTarget, width: u32, height: u32, depth: u32, layers: u32) -> Result<Extent3d> {
    if [width, height, depth, layers].iter().any(|d| *d > MAX_DIMENSION) {
        return Err(invalid(format!(
            "{}x{}x{} with {} layers exceeds the {} texel limit",
            width, height, depth, layers, MAX_DIMENSION
        )));
    }
    Ok(match target {
        TextureTarget::D1 => Extent3d::new(width, 1, 1),
        TextureTarget::D1Array => Extent3d::new(width, 1, layers),
        TextureTarget::D2Array => Extent3d::new(width, height, layers),
        TextureTarget::D3 => Extent3d::new(width, height, depth),
        TextureTarget::CubeArray => Extent3d::new(width, height, layers * 6),
        _ => Extent3d::new(width, height, 1),
    })
}

/// Byte count of `slices` slices of one level
fn image_bytes(format: PixelFormat, extent: Extent3d, slices: u32) -> Result<usize> {
    format
        .checked_level_size(Extent3d::new(extent.width, extent.height, slices))
        .ok_or_else(|| invalid(format!("{}x{} level does not fit in memory", extent.width, extent.height)))
}

/// Empty image list: one entry per (face, level)
fn empty_images(target: TextureTarget, levels: u32) -> Vec<DecodedImage> {
    (0..target.face_count())
        .flat_map(|face| (0..levels).map(move |level| DecodedImage { face, level, data: Vec::new() }))
        .collect()
}

fn image_mut(images: &mut [DecodedImage], face: u32, level: u32) -> Option<&mut DecodedImage> {
    images.iter_mut().find(|i| i.face == face && i.level == level)
}

// ============================================================================
// DDS
// ============================================================================

const DDS_MAGIC: &[u8] = b"DDS ";
const DDS_HEADER_END: usize = 128;
const DDS_DX10_HEADER_END: usize = 148;

const DDSD_MIPMAPCOUNT: u32 = 0x2_0000;
const DDPF_ALPHAPIXELS: u32 = 0x1;
const DDPF_ALPHA: u32 = 0x2;
const DDPF_FOURCC: u32 = 0x4;
const DDPF_RGB: u32 = 0x40;
const DDPF_LUMINANCE: u32 = 0x2_0000;
const DDSCAPS2_CUBEMAP: u32 = 0x200;
const DDSCAPS2_VOLUME: u32 = 0x20_0000;
const DDS_RESOURCE_MISC_TEXTURECUBE: u32 = 0x4;

const fn four_cc(code: &[u8; 4]) -> u32 {
    u32::from_le_bytes(*code)
}

/// How legacy pixel data must be rearranged before upload
#[derive(Clone, Copy, PartialEq)]
enum Repack {
    None,
    /// 24-bit BGR to RGB
    SwapRedBlue24,
}

fn dds_legacy_format(bytes: &[u8]) -> Result<(PixelFormat, [Swizzle; 4], Repack)> {
    let flags = read_u32(bytes, 80)?;
    let code = read_u32(bytes, 84)?;
    let bit_count = read_u32(bytes, 88)?;
    let masks = [read_u32(bytes, 92)?, read_u32(bytes, 96)?, read_u32(bytes, 100)?, read_u32(bytes, 104)?];
    let identity = Swizzle::IDENTITY;

    if flags & DDPF_FOURCC != 0 {
        let format = match code {
            c if c == four_cc(b"DXT1") => PixelFormat::Bc1RgbaUnorm,
            c if c == four_cc(b"DXT2") || c == four_cc(b"DXT3") => PixelFormat::Bc2RgbaUnorm,
            c if c == four_cc(b"DXT4") || c == four_cc(b"DXT5") => PixelFormat::Bc3RgbaUnorm,
            c if c == four_cc(b"ATI1") || c == four_cc(b"BC4U") => PixelFormat::Bc4RUnorm,
            c if c == four_cc(b"ATI2") || c == four_cc(b"BC5U") => PixelFormat::Bc5RgUnorm,
            111 => PixelFormat::R16Float,
            112 => PixelFormat::Rg16Float,
            113 => PixelFormat::Rgba16Float,
            114 => PixelFormat::R32Float,
            115 => PixelFormat::Rg32Float,
            116 => PixelFormat::Rgba32Float,
            other => return Err(invalid(format!("unsupported DDS FourCC 0x{:08X}", other))),
        };
        return Ok((format, identity, Repack::None));
    }

    let one = Swizzle::One;
    match (flags, bit_count, masks) {
        (f, 32, [0xFF, 0xFF00, 0xFF_0000, a]) if f & DDPF_RGB != 0 => {
            let swizzle = if a == 0 { [Swizzle::Red, Swizzle::Green, Swizzle::Blue, one] } else { identity };
            Ok((PixelFormat::Rgba8Unorm, swizzle, Repack::None))
        }
        (f, 32, [0xFF_0000, 0xFF00, 0xFF, a]) if f & DDPF_RGB != 0 => {
            let swizzle = if a == 0 { [Swizzle::Red, Swizzle::Green, Swizzle::Blue, one] } else { identity };
            Ok((PixelFormat::Bgra8Unorm, swizzle, Repack::None))
        }
        (f, 24, [0xFF, 0xFF00, 0xFF_0000, _]) if f & DDPF_RGB != 0 => {
            Ok((PixelFormat::Rgb8Unorm, identity, Repack::None))
        }
        (f, 24, [0xFF_0000, 0xFF00, 0xFF, _]) if f & DDPF_RGB != 0 => {
            Ok((PixelFormat::Rgb8Unorm, identity, Repack::SwapRedBlue24))
        }
        (f, 8, _) if f & DDPF_LUMINANCE != 0 => Ok((
            PixelFormat::R8Unorm,
            [Swizzle::Red, Swizzle::Red, Swizzle::Red, one],
            Repack::None,
        )),
        (f, 16, _) if f & DDPF_LUMINANCE != 0 && f & DDPF_ALPHAPIXELS != 0 => Ok((
            PixelFormat::Rg8Unorm,
            [Swizzle::Red, Swizzle::Red, Swizzle::Red, Swizzle::Green],
            Repack::None,
        )),
        (f, 8, _) if f & DDPF_ALPHA != 0 => Ok((
            PixelFormat::R8Unorm,
            [Swizzle::Zero, Swizzle::Zero, Swizzle::Zero, Swizzle::Red],
            Repack::None,
        )),
        _ => Err(invalid(format!(
            "unsupported DDS pixel format (flags 0x{:X}, {} bits, masks {:X?})",
            flags, bit_count, masks
        ))),
    }
}

fn dxgi_format(code: u32) -> Result<PixelFormat> {
    Ok(match code {
        2 => PixelFormat::Rgba32Float,
        6 => PixelFormat::Rgb32Float,
        10 => PixelFormat::Rgba16Float,
        16 => PixelFormat::Rg32Float,
        28 => PixelFormat::Rgba8Unorm,
        29 => PixelFormat::Rgba8Srgb,
        34 => PixelFormat::Rg16Float,
        41 => PixelFormat::R32Float,
        49 => PixelFormat::Rg8Unorm,
        54 => PixelFormat::R16Float,
        61 => PixelFormat::R8Unorm,
        71 => PixelFormat::Bc1RgbaUnorm,
        74 => PixelFormat::Bc2RgbaUnorm,
        77 => PixelFormat::Bc3RgbaUnorm,
        80 => PixelFormat::Bc4RUnorm,
        83 => PixelFormat::Bc5RgUnorm,
        87 => PixelFormat::Bgra8Unorm,
        95 => PixelFormat::Bc6hRgbUfloat,
        98 => PixelFormat::Bc7RgbaUnorm,
        other => return Err(invalid(format!("unsupported DXGI format {}", other))),
    })
}

fn parse_dds(bytes: &[u8]) -> Result<DecodedTexture> {
    if read_u32(bytes, 4)? != 124 {
        return Err(invalid("DDS header size is not 124"));
    }
    let flags = read_u32(bytes, 8)?;
    let height = read_u32(bytes, 12)?.max(1);
    let width = read_u32(bytes, 16)?.max(1);
    let depth = read_u32(bytes, 24)?.max(1);
    let levels = if flags & DDSD_MIPMAPCOUNT != 0 { read_u32(bytes, 28)?.max(1) } else { 1 };
    let caps2 = read_u32(bytes, 112)?;
    let is_dx10 = read_u32(bytes, 80)? & DDPF_FOURCC != 0 && read_u32(bytes, 84)? == four_cc(b"DX10");

    let (format, swizzle, repack, target, layers, data_start) = if is_dx10 {
        let format = dxgi_format(read_u32(bytes, 128)?)?;
        let dimension = read_u32(bytes, 132)?;
        let misc = read_u32(bytes, 136)?;
        let array_size = read_u32(bytes, 140)?.max(1);
        let cube = misc & DDS_RESOURCE_MISC_TEXTURECUBE != 0;
        let target = match (dimension, cube, array_size > 1) {
            (2, _, false) => TextureTarget::D1,
            (2, _, true) => TextureTarget::D1Array,
            (3, true, false) => TextureTarget::Cube,
            (3, true, true) => TextureTarget::CubeArray,
            (3, false, false) => TextureTarget::D2,
            (3, false, true) => TextureTarget::D2Array,
            (4, _, _) => TextureTarget::D3,
            (other, _, _) => return Err(invalid(format!("unsupported DDS resource dimension {}", other))),
        };
        (format, Swizzle::IDENTITY, Repack::None, target, array_size, DDS_DX10_HEADER_END)
    } else {
        let (format, swizzle, repack) = dds_legacy_format(bytes)?;
        let target = if caps2 & DDSCAPS2_CUBEMAP != 0 {
            TextureTarget::Cube
        } else if caps2 & DDSCAPS2_VOLUME != 0 && depth > 1 {
            TextureTarget::D3
        } else {
            TextureTarget::D2
        };
        (format, swizzle, repack, target, 1, DDS_HEADER_END)
    };

    let extent = storage_extent(target, width, height, depth, layers)?;
    if levels > target.max_levels(extent) {
        return Err(invalid(format!("{} mip levels for a {}x{} image", levels, width, height)));
    }

    // layer-major: every element holds its faces, every face its mip chain
    let faces_in_file = if target.is_cube() { 6 } else { 1 };
    let mut images = empty_images(target, levels);
    let mut offset = data_start;
    for _element in 0..layers {
        for face in 0..faces_in_file {
            for level in 0..levels {
                let level_extent = target.level_extent(extent, level);
                let slices = if target == TextureTarget::D3 { level_extent.depth } else { 1 };
                let size = image_bytes(format, level_extent, slices)?;
                let chunk = take(bytes, &mut offset, size)?;
                let image_face = if target == TextureTarget::Cube { face } else { 0 };
                if let Some(image) = image_mut(&mut images, image_face, level) {
                    image.data.extend_from_slice(chunk);
                }
            }
        }
    }

    if repack == Repack::SwapRedBlue24 {
        for image in &mut images {
            for texel in image.data.chunks_exact_mut(3) {
                texel.swap(0, 2);
            }
        }
    }

    Ok(DecodedTexture { target, format, extent, levels, images, swizzle })
}

// ============================================================================
// KTX 1.1
// ============================================================================

const KTX_IDENTIFIER: [u8; 12] = [0xAB, 0x4B, 0x54, 0x58, 0x20, 0x31, 0x31, 0xBB, 0x0D, 0x0A, 0x1A, 0x0A];
const KTX_ENDIAN_LITTLE: u32 = 0x0403_0201;
const KTX_HEADER_END: usize = 64;

fn ktx_internal_format(code: u32) -> Result<PixelFormat> {
    Ok(match code {
        0x8229 => PixelFormat::R8Unorm,
        0x822B => PixelFormat::Rg8Unorm,
        0x8051 => PixelFormat::Rgb8Unorm,
        0x8058 => PixelFormat::Rgba8Unorm,
        0x8C43 => PixelFormat::Rgba8Srgb,
        0x822D => PixelFormat::R16Float,
        0x822F => PixelFormat::Rg16Float,
        0x881B => PixelFormat::Rgb16Float,
        0x881A => PixelFormat::Rgba16Float,
        0x822E => PixelFormat::R32Float,
        0x8230 => PixelFormat::Rg32Float,
        0x8815 => PixelFormat::Rgb32Float,
        0x8814 => PixelFormat::Rgba32Float,
        0x83F0 | 0x83F1 => PixelFormat::Bc1RgbaUnorm,
        0x83F2 => PixelFormat::Bc2RgbaUnorm,
        0x83F3 => PixelFormat::Bc3RgbaUnorm,
        0x8DBB => PixelFormat::Bc4RUnorm,
        0x8DBD => PixelFormat::Bc5RgUnorm,
        0x8E8F => PixelFormat::Bc6hRgbUfloat,
        0x8E8C => PixelFormat::Bc7RgbaUnorm,
        other => return Err(invalid(format!("unsupported KTX internal format 0x{:04X}", other))),
    })
}

/// Drop the 4-byte row alignment padding of uncompressed KTX data
fn unpad_rows(data: &[u8], row_bytes: usize) -> Vec<u8> {
    let padded = row_bytes.div_ceil(4) * 4;
    if padded == row_bytes {
        return data.to_vec();
    }
    data.chunks(padded).flat_map(|row| &row[..row_bytes.min(row.len())]).copied().collect()
}

fn parse_ktx(bytes: &[u8]) -> Result<DecodedTexture> {
    if read_u32(bytes, 12)? != KTX_ENDIAN_LITTLE {
        return Err(invalid("big-endian KTX files are not supported"));
    }
    let format = ktx_internal_format(read_u32(bytes, 28)?)?;
    let width = read_u32(bytes, 36)?.max(1);
    let raw_height = read_u32(bytes, 40)?;
    let raw_depth = read_u32(bytes, 44)?;
    let elements = read_u32(bytes, 48)?;
    let faces = read_u32(bytes, 52)?;
    let levels = read_u32(bytes, 56)?.max(1);
    let key_value_bytes = read_u32(bytes, 60)? as usize;

    let target = match (faces, elements > 0, raw_height == 0, raw_depth > 0) {
        (6, false, _, _) => TextureTarget::Cube,
        (6, true, _, _) => TextureTarget::CubeArray,
        (1, false, true, _) => TextureTarget::D1,
        (1, true, true, _) => TextureTarget::D1Array,
        (1, _, false, true) => TextureTarget::D3,
        (1, false, false, false) => TextureTarget::D2,
        (1, true, false, false) => TextureTarget::D2Array,
        _ => return Err(invalid(format!("unsupported KTX layout ({} faces)", faces))),
    };
    let extent = storage_extent(target, width, raw_height.max(1), raw_depth.max(1), elements.max(1))?;
    if levels > target.max_levels(extent) {
        return Err(invalid(format!("{} mip levels for a {}-wide image", levels, width)));
    }

    let mut images = empty_images(target, levels);
    let mut offset = KTX_HEADER_END
        .checked_add(key_value_bytes)
        .ok_or_else(|| invalid("KTX key/value block out of range"))?;
    for level in 0..levels {
        let level_extent = target.level_extent(extent, level);
        let image_size = read_u32(bytes, offset)? as usize;
        offset += 4;
        let row_bytes = format.row_pitch(level_extent.width);
        let unpadded_face = image_bytes(format, level_extent, 1)?;

        if target == TextureTarget::Cube {
            for face in 0..6 {
                let chunk = take(bytes, &mut offset, image_size)?;
                let data = if format.is_compressed() { chunk.to_vec() } else { unpad_rows(chunk, row_bytes) };
                if data.len() != unpadded_face {
                    return Err(invalid(format!("KTX face {} level {} has {} bytes", face, level, data.len())));
                }
                if let Some(image) = image_mut(&mut images, face, level) {
                    image.data = data;
                }
                offset += (4 - image_size % 4) % 4;
            }
        } else {
            let chunk = take(bytes, &mut offset, image_size)?;
            let data = if format.is_compressed() { chunk.to_vec() } else { unpad_rows(chunk, row_bytes) };
            let expected = image_bytes(format, level_extent, level_extent.depth)?;
            if data.len() != expected {
                return Err(invalid(format!("KTX level {} has {} bytes, expected {}", level, data.len(), expected)));
            }
            if let Some(image) = image_mut(&mut images, 0, level) {
                image.data = data;
            }
        }
        offset += (4 - offset % 4) % 4;
    }

    Ok(DecodedTexture {
        target,
        format,
        extent,
        levels,
        images,
        swizzle: Swizzle::IDENTITY,
    })
}

#[cfg(test)]
#[path = "container_tests.rs"]
mod tests;
