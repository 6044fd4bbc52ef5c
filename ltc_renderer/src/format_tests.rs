use super::*;

// ============================================================================
// Block info
// ============================================================================

#[test]
fn test_uncompressed_block_info() {
    let info = PixelFormat::Rgba8Unorm.block_info();
    assert_eq!((info.width, info.height, info.bytes), (1, 1, 4));
    assert_eq!(PixelFormat::Rgb32Float.block_info().bytes, 12);
    assert_eq!(PixelFormat::Rgba16Float.block_info().bytes, 8);
}

#[test]
fn test_compressed_block_info() {
    assert_eq!(PixelFormat::Bc1RgbaUnorm.block_info().bytes, 8);
    assert_eq!(PixelFormat::Bc4RUnorm.block_info().bytes, 8);
    assert_eq!(PixelFormat::Bc3RgbaUnorm.block_info().bytes, 16);
    assert_eq!(PixelFormat::Bc7RgbaUnorm.block_info().width, 4);
    assert!(PixelFormat::Bc5RgUnorm.is_compressed());
    assert!(!PixelFormat::Rgba32Float.is_compressed());
}

// ============================================================================
// Classification
// ============================================================================

#[test]
fn test_depth_classification() {
    assert!(PixelFormat::Depth24.is_depth());
    assert!(PixelFormat::Depth24Stencil8.is_depth());
    assert!(PixelFormat::Depth24Stencil8.has_stencil());
    assert!(!PixelFormat::Depth32Float.has_stencil());
    assert!(!PixelFormat::Rgba8Unorm.is_depth());
}

#[test]
fn test_float_and_channels() {
    assert!(PixelFormat::Rgb32Float.is_float());
    assert!(PixelFormat::Bc6hRgbUfloat.is_float());
    assert!(!PixelFormat::Rgba8Srgb.is_float());
    assert_eq!(PixelFormat::Rg8Unorm.channel_count(), 2);
    assert_eq!(PixelFormat::Rgb16Float.channel_count(), 3);
    assert_eq!(PixelFormat::Bgra8Unorm.channel_count(), 4);
}

// ============================================================================
// Sizes
// ============================================================================

#[test]
fn test_rgba8_4x4_level_is_64_bytes() {
    assert_eq!(PixelFormat::Rgba8Unorm.level_size(Extent3d::d2(4, 4)), 64);
}

#[test]
fn test_compressed_sizes_round_up_to_blocks() {
    // 5x5 needs 2x2 blocks
    assert_eq!(PixelFormat::Bc1RgbaUnorm.level_size(Extent3d::d2(5, 5)), 32);
    // 1x1 mip still occupies one block
    assert_eq!(PixelFormat::Bc3RgbaUnorm.level_size(Extent3d::d2(1, 1)), 16);
    assert_eq!(PixelFormat::Bc1RgbaUnorm.row_pitch(8), 16);
    assert_eq!(PixelFormat::Bc1RgbaUnorm.block_rows(6), 2);
}

#[test]
fn test_level_size_counts_layers() {
    let extent = Extent3d::new(64, 64, 6);
    assert_eq!(PixelFormat::Rgba32Float.level_size(extent), 64 * 64 * 16 * 6);
    assert_eq!(PixelFormat::Rgb8Unorm.slice_size(3, 2), 18);
}

#[test]
fn test_checked_sizes_match_and_detect_overflow() {
    let extent = Extent3d::new(64, 64, 6);
    assert_eq!(PixelFormat::Rgba32Float.checked_level_size(extent), Some(64 * 64 * 16 * 6));
    assert_eq!(PixelFormat::Bc1RgbaUnorm.checked_slice_size(5, 5), Some(32));

    let huge = Extent3d::new(u32::MAX, u32::MAX, u32::MAX);
    assert_eq!(PixelFormat::Rgba32Float.checked_level_size(huge), None);
}
