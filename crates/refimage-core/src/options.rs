//! Configuration options for reference images.

use serde::{Deserialize, Serialize};

use crate::error::{RefImageError, Result};

/// Configuration shared by every cache a context creates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Number of color slots available per view.
    pub max_color_slots: usize,

    /// Visibility rasters are scaled so their shorter side is at most this
    /// many pixels.
    pub visibility_max_short_side: u32,

    /// Quiet `vis_update` calls needed before a visibility cache is clean.
    pub settle_threshold: u32,

    /// NDC offset applied to index <-> NDC conversions of new rasters.
    pub default_ndc_offset: [f64; 2],

    /// Log every resize and refresh at debug level.
    pub debug_ref_images: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_color_slots: 8,
            visibility_max_short_side: 256,
            settle_threshold: 5,
            default_ndc_offset: [0.0, 0.0],
            debug_ref_images: false,
        }
    }
}

impl Options {
    /// Parses options from JSON. Missing fields take their default value.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Serializes the options to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks that every limit is usable.
    pub fn validate(&self) -> Result<()> {
        if self.max_color_slots == 0 {
            return Err(RefImageError::InvalidOptions(
                "max_color_slots must be at least 1".into(),
            ));
        }
        if self.visibility_max_short_side == 0 {
            return Err(RefImageError::InvalidOptions(
                "visibility_max_short_side must be at least 1".into(),
            ));
        }
        if self.settle_threshold == 0 {
            return Err(RefImageError::InvalidOptions(
                "settle_threshold must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
