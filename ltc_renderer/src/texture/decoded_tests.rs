use super::*;

fn decoded(format: PixelFormat, target: TextureTarget, extent: Extent3d, data: Vec<u8>) -> DecodedTexture {
    DecodedTexture {
        target,
        format,
        extent,
        levels: 1,
        images: vec![DecodedImage { face: 0, level: 0, data }],
        swizzle: Swizzle::IDENTITY,
    }
}

fn alpha_rows(block: &[u8]) -> [u64; 4] {
    let mut bits = 0u64;
    for (i, b) in block[2..8].iter().enumerate() {
        bits |= (*b as u64) << (8 * i);
    }
    [0, 1, 2, 3].map(|r| (bits >> (12 * r)) & 0xFFF)
}

// ============================================================================
// Uncompressed
// ============================================================================

#[test]
fn test_flip_rows_rgba8() {
    // 1x3, one texel per row
    let data = vec![1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3];
    let mut tex = decoded(PixelFormat::Rgba8Unorm, TextureTarget::D2, Extent3d::d2(1, 3), data);
    assert!(tex.flip_vertical());
    assert_eq!(tex.images[0].data, vec![3, 3, 3, 3, 2, 2, 2, 2, 1, 1, 1, 1]);
}

#[test]
fn test_flip_each_layer_independently() {
    // 1x2 R8, two layers
    let data = vec![1, 2, 3, 4];
    let mut tex = decoded(PixelFormat::R8Unorm, TextureTarget::D2Array, Extent3d::new(1, 2, 2), data);
    assert!(tex.flip_vertical());
    assert_eq!(tex.images[0].data, vec![2, 1, 4, 3]);
}

#[test]
fn test_flip_single_row_is_noop() {
    let mut tex = decoded(PixelFormat::R8Unorm, TextureTarget::D1, Extent3d::new(3, 1, 1), vec![1, 2, 3]);
    assert!(tex.flip_vertical());
    assert_eq!(tex.images[0].data, vec![1, 2, 3]);
}

#[test]
fn test_flip_uses_level_extent() {
    // level 1 of a 2x4 R8 texture is 1x2
    let mut tex = decoded(PixelFormat::R8Unorm, TextureTarget::D2, Extent3d::d2(2, 4), vec![0; 8]);
    tex.levels = 2;
    tex.images.push(DecodedImage { face: 0, level: 1, data: vec![5, 6] });
    assert!(tex.flip_vertical());
    assert_eq!(tex.images[1].data, vec![6, 5]);
}

// ============================================================================
// Block compressed
// ============================================================================

#[test]
fn test_flip_bc1_block_rows() {
    let block = vec![0xAA, 0xBB, 0xCC, 0xDD, 1, 2, 3, 4];
    let mut tex = decoded(PixelFormat::Bc1RgbaUnorm, TextureTarget::D2, Extent3d::d2(4, 4), block);
    assert!(tex.flip_vertical());
    assert_eq!(tex.images[0].data, vec![0xAA, 0xBB, 0xCC, 0xDD, 4, 3, 2, 1]);
}

#[test]
fn test_flip_bc1_partial_block() {
    // a 4x2 mip only uses the first two rows of the block
    let block = vec![0, 0, 0, 0, 1, 2, 3, 4];
    let mut tex = decoded(PixelFormat::Bc1RgbaUnorm, TextureTarget::D2, Extent3d::d2(4, 2), block);
    assert!(tex.flip_vertical());
    assert_eq!(tex.images[0].data, vec![0, 0, 0, 0, 2, 1, 3, 4]);
}

#[test]
fn test_flip_bc1_swaps_block_rows() {
    // 4x8: two blocks stacked vertically
    let mut data = vec![0, 0, 0, 0, 1, 2, 3, 4];
    data.extend_from_slice(&[9, 9, 9, 9, 5, 6, 7, 8]);
    let mut tex = decoded(PixelFormat::Bc1RgbaUnorm, TextureTarget::D2, Extent3d::d2(4, 8), data);
    assert!(tex.flip_vertical());
    assert_eq!(
        tex.images[0].data,
        vec![9, 9, 9, 9, 8, 7, 6, 5, 0, 0, 0, 0, 4, 3, 2, 1]
    );
}

#[test]
fn test_flip_bc4_alpha_rows() {
    // rows 1, 2, 3, 4 packed as 12-bit groups
    let bits: u64 = 1 | (2 << 12) | (3 << 24) | (4 << 36);
    let mut block = vec![10, 20];
    block.extend((0..6).map(|i| (bits >> (8 * i)) as u8));
    let mut tex = decoded(PixelFormat::Bc4RUnorm, TextureTarget::D2, Extent3d::d2(4, 4), block);
    assert!(tex.flip_vertical());

    let flipped = &tex.images[0].data;
    assert_eq!(&flipped[..2], &[10, 20]);
    assert_eq!(alpha_rows(flipped), [4, 3, 2, 1]);
}

#[test]
fn test_bc7_is_left_unflipped() {
    let block: Vec<u8> = (0..16).collect();
    let mut tex = decoded(PixelFormat::Bc7RgbaUnorm, TextureTarget::D2, Extent3d::d2(4, 4), block.clone());
    assert!(!tex.flip_vertical());
    assert_eq!(tex.images[0].data, block);
}
