//! Channel order permutation and per-output colour correction (§4.8 steps
//! 2-3).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorCorrection {
    pub brightness: f32,
    pub contrast: f32,
    /// Signed per-channel offsets in `[-255, 255]`, indexed R, G, B, W.
    pub channel_offset: [f32; 4],
}

impl Default for ColorCorrection {
    fn default() -> Self {
        Self {
            brightness: 0.0,
            contrast: 1.0,
            channel_offset: [0.0; 4],
        }
    }
}

impl ColorCorrection {
    /// `out = clip(((in - 128) * contrast + 128) + brightness + offset, 0, 255)`.
    pub fn apply(&self, channel: usize, value: u8) -> u8 {
        let offset = self.channel_offset.get(channel).copied().unwrap_or(0.0);
        let v = (value as f32 - 128.0) * self.contrast + 128.0 + self.brightness + offset;
        v.clamp(0.0, 255.0).round() as u8
    }
}

/// Channel order for a single fixture's DMX footprint. Covers every
/// permutation named in §4.8 plus arbitrary custom orders via `Custom`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChannelOrder {
    Rgb,
    Grb,
    Bgr,
    Rgbw,
    Grbw,
    Wrgb,
    Rgbaw,
    Rgbww,
    Rgbcww,
    /// Indices into `[r, g, b, w]` (w synthesised from luminance), in
    /// transmission order; arbitrary length and repetition allowed.
    Custom(Vec<u8>),
}

impl ChannelOrder {
    pub fn footprint(&self) -> usize {
        match self {
            ChannelOrder::Rgb | ChannelOrder::Grb | ChannelOrder::Bgr => 3,
            ChannelOrder::Rgbw | ChannelOrder::Grbw | ChannelOrder::Wrgb => 4,
            ChannelOrder::Rgbaw => 5,
            ChannelOrder::Rgbww | ChannelOrder::Rgbcww => 5,
            ChannelOrder::Custom(order) => order.len(),
        }
    }

    fn index_order(&self) -> Vec<u8> {
        match self {
            ChannelOrder::Rgb => vec![0, 1, 2],
            ChannelOrder::Grb => vec![1, 0, 2],
            ChannelOrder::Bgr => vec![2, 1, 0],
            ChannelOrder::Rgbw => vec![0, 1, 2, 3],
            ChannelOrder::Grbw => vec![1, 0, 2, 3],
            ChannelOrder::Wrgb => vec![3, 0, 1, 2],
            // Amber approximated from luminance-derived white for the 5th
            // channel; fixture-specific amber curves are out of scope.
            ChannelOrder::Rgbaw => vec![0, 1, 2, 3, 3],
            ChannelOrder::Rgbww => vec![0, 1, 2, 3, 3],
            ChannelOrder::Rgbcww => vec![0, 1, 2, 3, 3],
            ChannelOrder::Custom(order) => order.clone(),
        }
    }

    /// Permutes `[r, g, b]`, synthesising `w` from luminance when the
    /// footprint calls for a white channel.
    pub fn permute(&self, rgb: [u8; 3]) -> Vec<u8> {
        let luminance = (0.2126 * rgb[0] as f32 + 0.7152 * rgb[1] as f32 + 0.0722 * rgb[2] as f32).round() as u8;
        let channels = [rgb[0], rgb[1], rgb[2], luminance];
        self.index_order().into_iter().map(|i| channels[i as usize % 4]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grb_swaps_first_two_channels() {
        let order = ChannelOrder::Grb;
        assert_eq!(order.permute([10, 20, 30]), vec![20, 10, 30]);
    }

    #[test]
    fn rgbw_appends_synthesised_white() {
        let order = ChannelOrder::Rgbw;
        let out = order.permute([255, 255, 255]);
        assert_eq!(out.len(), 4);
        assert_eq!(out[3], 255);
    }

    #[test]
    fn color_correction_identity_is_a_no_op() {
        let cc = ColorCorrection::default();
        assert_eq!(cc.apply(0, 128), 128);
        assert_eq!(cc.apply(0, 0), 0);
        assert_eq!(cc.apply(0, 255), 255);
    }

    #[test]
    fn color_correction_clips_to_valid_range() {
        let cc = ColorCorrection {
            brightness: 300.0,
            contrast: 1.0,
            channel_offset: [0.0; 4],
        };
        assert_eq!(cc.apply(0, 200), 255);
    }
}
