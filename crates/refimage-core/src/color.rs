//! Packed 32-bit RGBA colors.
//!
//! A packed color stores one byte per channel:
//! - bits 24-31: red
//! - bits 16-23: green
//! - bits 8-15: blue
//! - bits 0-7: alpha
//!
//! The byte order of [`to_bytes`] is therefore `[r, g, b, a]`, matching an
//! `Rgba8Unorm` texel.

use glam::Vec3;

/// Opaque white, the clear color of color reference images.
pub const OPAQUE_WHITE: u32 = 0xFFFF_FFFF;

/// Fully transparent black.
pub const TRANSPARENT_BLACK: u32 = 0;

#[must_use]
pub fn build_rgba(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (u32::from(r) << 24) | (u32::from(g) << 16) | (u32::from(b) << 8) | u32::from(a)
}

#[must_use]
pub fn rgba_to_r(rgba: u32) -> u8 {
    (rgba >> 24) as u8
}

#[must_use]
pub fn rgba_to_g(rgba: u32) -> u8 {
    (rgba >> 16) as u8
}

#[must_use]
pub fn rgba_to_b(rgba: u32) -> u8 {
    (rgba >> 8) as u8
}

#[must_use]
pub fn rgba_to_a(rgba: u32) -> u8 {
    rgba as u8
}

/// Luminance in `[0, 255]`, ignoring alpha.
#[must_use]
pub fn rgba_to_grey(rgba: u32) -> u8 {
    let weighted = 30 * u32::from(rgba_to_r(rgba))
        + 59 * u32::from(rgba_to_g(rgba))
        + 11 * u32::from(rgba_to_b(rgba));
    ((weighted + 50) / 100) as u8
}

/// Luminance in `[0, 1]`, ignoring alpha.
#[must_use]
pub fn rgba_to_grey_d(rgba: u32) -> f64 {
    f64::from(rgba_to_grey(rgba)) / 255.0
}

/// Packs a linear color (components in `[0, 1]`) with the given opacity.
#[must_use]
pub fn color_to_rgba(color: Vec3, alpha: f64) -> u32 {
    let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
    build_rgba(channel(color.x), channel(color.y), channel(color.z), a)
}

/// Unpacks the color channels of a packed value, ignoring alpha.
#[must_use]
pub fn rgba_to_color(rgba: u32) -> Vec3 {
    Vec3::new(
        f32::from(rgba_to_r(rgba)),
        f32::from(rgba_to_g(rgba)),
        f32::from(rgba_to_b(rgba)),
    ) / 255.0
}

/// Returns the channels as `[r, g, b, a]`.
#[must_use]
pub fn to_bytes(rgba: u32) -> [u8; 4] {
    rgba.to_be_bytes()
}

/// Packs `[r, g, b, a]` bytes.
#[must_use]
pub fn from_bytes(bytes: [u8; 4]) -> u32 {
    u32::from_be_bytes(bytes)
}
