/// Halton low-discrepancy sequence and the sub-pixel jitter built on it

use glam::{Mat4, Vec2, Vec4};

/// Bases of the four coordinates of a sample batch
pub const HALTON_BASES: [u32; 4] = [2, 3, 5, 7];

/// `index`-th element of the Halton sequence in `base` (radical inverse).
///
/// Pure and deterministic: `halton(0, b) == 0` and base 2 yields
/// 0.5, 0.25, 0.75, 0.125, ... Bases below 2 have no radical inverse and
/// yield 0.
pub fn halton(index: u32, base: u32) -> f32 {
    if base < 2 {
        return 0.0;
    }
    let mut result = 0.0f64;
    let mut fraction = 1.0f64;
    let mut i = index;
    while i > 0 {
        fraction /= base as f64;
        result += fraction * (i % base) as f64;
        i /= base;
    }
    result as f32
}

/// One 4D sample: bases 2, 3, 5 and 7
pub fn halton_4d(index: u32) -> Vec4 {
    Vec4::new(
        halton(index, HALTON_BASES[0]),
        halton(index, HALTON_BASES[1]),
        halton(index, HALTON_BASES[2]),
        halton(index, HALTON_BASES[3]),
    )
}

/// Gaussian-distributed 2D offset in pixels (Box-Muller over bases 2 and 3)
pub fn gaussian_jitter(index: u32, sigma: f32) -> Vec2 {
    // shift into (0, 1] so ln() stays finite at index 0
    let u1 = 1.0 - halton(index, 2);
    let u2 = halton(index, 3);
    let radius = sigma * (-2.0 * u1.ln()).sqrt();
    let angle = std::f32::consts::TAU * u2;
    Vec2::new(radius * angle.cos(), radius * angle.sin())
}

/// Shift a projection by `offset` pixels for a viewport of `viewport` pixels
pub fn jitter_projection(projection: Mat4, offset: Vec2, viewport: Vec2) -> Mat4 {
    let mut jittered = projection;
    let ndc = offset * 2.0 / viewport;
    jittered.z_axis.x += ndc.x;
    jittered.z_axis.y += ndc.y;
    jittered
}

#[cfg(test)]
#[path = "halton_tests.rs"]
mod tests;
