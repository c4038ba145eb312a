mod mix;

pub use mix::{
    CH_1800_BOTTOM, CH_1800_TOP, CH_4000, CH_6500, CHANNELS, ColorMix, Densities,
};
