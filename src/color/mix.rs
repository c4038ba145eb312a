//! Four channel color mixing
//!
//! The lamp has a 6500K string, a 4000K string and a 1800K emitter split into a top
//! and a bottom string. A target temperature is reached by blending the two emitters
//! around it. The densities solve `a·x + b·y = t, x + y = 1` (Cramer's rule) inside
//! each band, so the blend is continuous across band boundaries.

use crate::bounds::{CCT_1800, CCT_4000, CCT_6500, MIN_CCT};

pub const CHANNELS: usize = 4;

pub const CH_6500: usize = 0;
pub const CH_4000: usize = 1;
pub const CH_1800_TOP: usize = 2;
pub const CH_1800_BOTTOM: usize = 3;

/// Per channel drive bytes sent to the LED driver
pub type Densities = [u8; CHANNELS];

/// Mixing fractions of the four channels for one color temperature
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColorMix([f32; CHANNELS]);

impl ColorMix {
    /// Solve the channel mix for a target temperature
    pub fn for_cct(cct: f32) -> Self {
        let mut mix = [0.0; CHANNELS];
        if cct > CCT_4000 && cct <= CCT_6500 {
            mix[CH_6500] = (cct - CCT_4000) / (CCT_6500 - CCT_4000);
            mix[CH_4000] = (CCT_6500 - cct) / (CCT_6500 - CCT_4000);
        } else if (CCT_1800..=CCT_4000).contains(&cct) {
            let warm = (CCT_4000 - cct) / (CCT_4000 - CCT_1800);
            mix[CH_4000] = (cct - CCT_1800) / (CCT_4000 - CCT_1800);
            // top and bottom strings share the warm density
            mix[CH_1800_TOP] = warm;
            mix[CH_1800_BOTTOM] = warm;
        } else if (MIN_CCT..CCT_1800).contains(&cct) {
            mix[CH_1800_TOP] = (cct - MIN_CCT) / (CCT_1800 - MIN_CCT);
            mix[CH_1800_BOTTOM] = 1.0;
        } else if cct < MIN_CCT {
            mix[CH_1800_BOTTOM] = 1.0;
        } else {
            // above 6500K, or NaN
            mix[CH_6500] = 1.0;
        }
        Self(mix)
    }

    pub const fn fractions(&self) -> [f32; CHANNELS] {
        self.0
    }

    pub const fn fraction(&self, channel: usize) -> f32 {
        self.0[channel]
    }

    /// Share of the three emitters, counting the split warm strings as one emitter.
    ///
    /// This is exactly 1 between 1800K and 6500K. Below 1800K the top warm string fades
    /// out and the total drops towards one half.
    pub fn emitter_total(&self) -> f32 {
        self.0[CH_6500] + self.0[CH_4000] + (self.0[CH_1800_TOP] + self.0[CH_1800_BOTTOM]) / 2.0
    }

    /// Scale the mix by a brightness level, rounding towards zero
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn densities(&self, level: f32) -> Densities {
        self.0.map(|fraction| libm::floorf(fraction * level) as u8)
    }
}
