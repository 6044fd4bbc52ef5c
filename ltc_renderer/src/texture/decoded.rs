/// CPU-side decoded texture and the vertical flip applied before upload
///
/// Image files store the top row first while texture coordinates start at
/// the bottom, so decoded images are flipped once on the CPU.

use crate::format::{Extent3d, PixelFormat};
use crate::gpu::{Swizzle, TextureTarget};

/// Data for one (face, level) pair, covering every layer or slice
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub face: u32,
    pub level: u32,
    pub data: Vec<u8>,
}

/// Texture decoded from a file, ready for upload
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedTexture {
    pub target: TextureTarget,
    pub format: PixelFormat,
    /// Level-0 extent in storage terms
    pub extent: Extent3d,
    pub levels: u32,
    pub images: Vec<DecodedImage>,
    pub swizzle: [Swizzle; 4],
}

impl DecodedTexture {
    /// Extent of a mip level
    pub fn level_extent(&self, level: u32) -> Extent3d {
        self.target.level_extent(self.extent, level)
    }

    /// Flip every image upside down.
    ///
    /// Returns false when some image could not be flipped (BC6H/BC7 data, or
    /// compressed levels whose height is not a multiple of the block height);
    /// those images are left untouched.
    pub fn flip_vertical(&mut self) -> bool {
        let mut complete = true;
        let format = self.format;
        for index in 0..self.images.len() {
            let extent = self.level_extent(self.images[index].level);
            let image = &mut self.images[index];
            if !flip_image(format, extent, &mut image.data) {
                complete = false;
            }
        }
        complete
    }
}

/// Flip one level in place; every layer or slice is flipped on its own
fn flip_image(format: PixelFormat, extent: Extent3d, data: &mut [u8]) -> bool {
    if extent.height <= 1 {
        return true;
    }
    let block_height = format.block_info().height;
    if format.is_compressed() {
        let flippable = matches!(
            format,
            PixelFormat::Bc1RgbaUnorm
                | PixelFormat::Bc2RgbaUnorm
                | PixelFormat::Bc3RgbaUnorm
                | PixelFormat::Bc4RUnorm
                | PixelFormat::Bc5RgUnorm
        );
        if !flippable || (extent.height > block_height && extent.height % block_height != 0) {
            return false;
        }
    }

    let row_pitch = format.row_pitch(extent.width);
    let rows = format.block_rows(extent.height);
    let slice = row_pitch * rows;
    for chunk in data.chunks_exact_mut(slice) {
        for row in 0..rows / 2 {
            let (top, bottom) = chunk.split_at_mut((rows - 1 - row) * row_pitch);
            top[row * row_pitch..(row + 1) * row_pitch].swap_with_slice(&mut bottom[..row_pitch]);
        }
        if format.is_compressed() {
            let valid_rows = extent.height.min(block_height) as usize;
            let block_bytes = format.block_info().bytes as usize;
            for block in chunk.chunks_exact_mut(block_bytes) {
                flip_block(format, block, valid_rows);
            }
        }
    }
    true
}

// ============================================================================
// BCn in-block row flips
// ============================================================================

/// Reverse the first `rows` pixel rows of one compressed block
fn flip_block(format: PixelFormat, block: &mut [u8], rows: usize) {
    match format {
        PixelFormat::Bc1RgbaUnorm => flip_color_block(block, rows),
        PixelFormat::Bc2RgbaUnorm => {
            // four 16-bit rows of explicit alpha, then a color block
            let (alpha, color) = block.split_at_mut(8);
            let mut pairs: Vec<[u8; 2]> = alpha.chunks_exact(2).map(|p| [p[0], p[1]]).collect();
            pairs[..rows].reverse();
            for (dst, src) in alpha.chunks_exact_mut(2).zip(pairs) {
                dst.copy_from_slice(&src);
            }
            flip_color_block(color, rows);
        }
        PixelFormat::Bc3RgbaUnorm => {
            let (alpha, color) = block.split_at_mut(8);
            flip_alpha_block(alpha, rows);
            flip_color_block(color, rows);
        }
        PixelFormat::Bc4RUnorm => flip_alpha_block(block, rows),
        PixelFormat::Bc5RgUnorm => {
            let (red, green) = block.split_at_mut(8);
            flip_alpha_block(red, rows);
            flip_alpha_block(green, rows);
        }
        _ => {}
    }
}

/// BC1-style block: two endpoints, then one byte of 2-bit indices per row
fn flip_color_block(block: &mut [u8], rows: usize) {
    block[4..4 + rows].reverse();
}

/// BC4-style block: two endpoints, then 48 bits of 3-bit indices (12 bits per row)
fn flip_alpha_block(block: &mut [u8], rows: usize) {
    let mut bits: u64 = 0;
    for (i, byte) in block[2..8].iter().enumerate() {
        bits |= (*byte as u64) << (8 * i);
    }
    let row = |r: usize| (bits >> (12 * r)) & 0xFFF;
    let mut flipped = bits;
    for r in 0..rows {
        let source = rows - 1 - r;
        flipped &= !(0xFFF << (12 * r));
        flipped |= row(source) << (12 * r);
    }
    for (i, byte) in block[2..8].iter_mut().enumerate() {
        *byte = (flipped >> (8 * i)) as u8;
    }
}

#[cfg(test)]
#[path = "decoded_tests.rs"]
mod tests;
