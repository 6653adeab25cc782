//! Memoized framebuffer capability probe.

use std::sync::{Arc, OnceLock};

use crate::codec::{select_codec, KeyCodec};
use crate::surface::{ChannelBits, RenderSurface};

/// Process-wide probe instance.
static GLOBAL_PROBE: CapabilityProbe = CapabilityProbe::new();

/// Records the framebuffer channel depths the first time it is asked and
/// answers every later query from that record.
///
/// A later surface reporting different depths is logged and ignored, so the
/// codec chosen at startup stays valid for every key already drawn.
#[derive(Debug, Default)]
pub struct CapabilityProbe {
    bits: OnceLock<ChannelBits>,
}

impl CapabilityProbe {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bits: OnceLock::new(),
        }
    }

    /// The probe shared by the whole process.
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL_PROBE
    }

    /// Channel depths, probing `surface` on first use.
    pub fn channel_bits(&self, surface: &dyn RenderSurface) -> ChannelBits {
        let observed = surface.channel_bits();
        let bits = *self.bits.get_or_init(|| {
            if observed.is_full_rgba() {
                log::debug!("framebuffer: 8/8/8/8 bits");
            } else {
                log::info!(
                    "framebuffer: nonstandard bits r={} g={} b={} a={}",
                    observed.red,
                    observed.green,
                    observed.blue,
                    observed.alpha
                );
            }
            observed
        });
        if bits != observed {
            log::warn!(
                "framebuffer bits changed: probed {bits:?}, surface now reports {observed:?}; keeping probed value"
            );
        }
        bits
    }

    /// The recorded depths, if the probe has run.
    #[must_use]
    pub fn get(&self) -> Option<ChannelBits> {
        self.bits.get().copied()
    }

    /// Probes `surface` and selects the matching key codec.
    pub fn codec(&self, surface: &dyn RenderSurface) -> Arc<dyn KeyCodec> {
        select_codec(self.channel_bits(surface))
    }
}
