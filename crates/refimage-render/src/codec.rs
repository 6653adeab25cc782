//! Key codecs: how simplex keys are written into framebuffer colors.
//!
//! An item buffer is only as precise as the framebuffer it is rendered into.
//! With a full 8/8/8/8 framebuffer a key is stored verbatim; otherwise the
//! key is split across the high bits of the red, green, and blue channels
//! that actually survive rasterization.

use std::fmt;
use std::sync::Arc;

use refimage_core::color::{build_rgba, rgba_to_b, rgba_to_g, rgba_to_r};
use refimage_core::SimplexKey;

use crate::surface::ChannelBits;

/// Reversible mapping between simplex keys and packed RGBA colors.
pub trait KeyCodec: fmt::Debug + Send + Sync {
    /// Color to draw a primitive with.
    fn key_to_color(&self, key: SimplexKey) -> u32;

    /// Key recovered from a framebuffer color.
    fn color_to_key(&self, rgba: u32) -> SimplexKey;

    /// Bits of a packed color that carry key information.
    fn key_mask(&self) -> u32;

    /// Largest key this codec can represent.
    fn max_key(&self) -> u32;
}

/// Identity codec for framebuffers with a full byte per channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullColorCodec;

impl KeyCodec for FullColorCodec {
    fn key_to_color(&self, key: SimplexKey) -> u32 {
        key.0
    }

    fn color_to_key(&self, rgba: u32) -> SimplexKey {
        SimplexKey(rgba)
    }

    fn key_mask(&self) -> u32 {
        u32::MAX
    }

    fn max_key(&self) -> u32 {
        u32::MAX
    }
}

/// Codec for reduced-precision framebuffers.
///
/// Key bits `[0, r)` go to the top of red, `[r, r+g)` to the top of green and
/// `[r+g, r+g+b)` to the top of blue. Alpha is written opaque and ignored on
/// decode. Keys above [`max_key`](KeyCodec::max_key) are truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedChannelCodec {
    red: u32,
    green: u32,
    blue: u32,
}

impl PackedChannelCodec {
    /// Creates a codec for the given channel depths. Depths above 8 are
    /// treated as 8.
    #[must_use]
    pub fn new(bits: ChannelBits) -> Self {
        Self {
            red: u32::from(bits.red.min(8)),
            green: u32::from(bits.green.min(8)),
            blue: u32::from(bits.blue.min(8)),
        }
    }

    fn key_bits(&self) -> u32 {
        self.red + self.green + self.blue
    }
}

/// Mask of the low `bits` bits.
fn low_mask(bits: u32) -> u32 {
    if bits >= 32 {
        u32::MAX
    } else {
        (1 << bits) - 1
    }
}

/// Places the low `bits` of `field` at the top of a channel byte.
fn to_channel(field: u32, bits: u32) -> u8 {
    if bits == 0 {
        return 0;
    }
    ((field & low_mask(bits)) << (8 - bits)) as u8
}

/// Recovers a field stored by [`to_channel`].
fn from_channel(channel: u8, bits: u32) -> u32 {
    if bits == 0 {
        return 0;
    }
    u32::from(channel) >> (8 - bits)
}

impl KeyCodec for PackedChannelCodec {
    fn key_to_color(&self, key: SimplexKey) -> u32 {
        let k = key.0;
        build_rgba(
            to_channel(k, self.red),
            to_channel(k >> self.red, self.green),
            to_channel(k >> (self.red + self.green), self.blue),
            0xFF,
        )
    }

    fn color_to_key(&self, rgba: u32) -> SimplexKey {
        let r = from_channel(rgba_to_r(rgba), self.red);
        let g = from_channel(rgba_to_g(rgba), self.green);
        let b = from_channel(rgba_to_b(rgba), self.blue);
        SimplexKey(r | (g << self.red) | (b << (self.red + self.green)))
    }

    fn key_mask(&self) -> u32 {
        build_rgba(
            to_channel(u32::MAX, self.red),
            to_channel(u32::MAX, self.green),
            to_channel(u32::MAX, self.blue),
            0,
        )
    }

    fn max_key(&self) -> u32 {
        low_mask(self.key_bits())
    }
}

/// Picks the codec for a framebuffer: the identity codec for 8/8/8/8, the
/// packed codec for anything else.
#[must_use]
pub fn select_codec(bits: ChannelBits) -> Arc<dyn KeyCodec> {
    if bits.is_full_rgba() {
        log::debug!("key codec: full 32-bit color");
        Arc::new(FullColorCodec)
    } else {
        let codec = PackedChannelCodec::new(bits);
        log::debug!(
            "key codec: packed {}/{}/{} bits, max key {:#x}",
            bits.red,
            bits.green,
            bits.blue,
            codec.max_key()
        );
        Arc::new(codec)
    }
}
