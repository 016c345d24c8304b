use std::collections::BTreeMap;

use customer_lens::data::model::{ClvTier, GroupKey};
use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Category palette
// ---------------------------------------------------------------------------

const GOLDEN_ANGLE: f32 = 137.507_77;
const FIRST_HUE: f32 = 210.0;

/// `n` category colours. Hues step by the golden angle and lightness
/// alternates between two levels, so colour `i` is the same for every
/// `n > i`.
pub fn category_palette(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| {
            let hue = (FIRST_HUE + i as f32 * GOLDEN_ANGLE) % 360.0;
            let lightness = if i % 2 == 0 { 0.50 } else { 0.62 };
            let rgb: Srgb = Hsl::new(hue, 0.70, lightness).into_color();
            let rgb: Srgb<u8> = rgb.into_format();
            Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
        })
        .collect()
}

/// Fixed colour per CLV tier; unknown labels fall back to grey.
pub fn tier_color(label: &str) -> Color32 {
    match ClvTier::from_label(label) {
        Some(ClvTier::Diamond) => Color32::from_rgb(0xFF, 0xD7, 0x00),
        Some(ClvTier::Platinum) => Color32::from_rgb(0xE5, 0xE4, 0xE2),
        Some(ClvTier::Gold) => Color32::from_rgb(0xDA, 0xA5, 0x20),
        Some(ClvTier::Silver) => Color32::from_rgb(0xC0, 0xC0, 0xC0),
        Some(ClvTier::Bronze) => Color32::from_rgb(0xCD, 0x7F, 0x32),
        None => Color32::GRAY,
    }
}

// ---------------------------------------------------------------------------
// Color mapping: group key → Color32
// ---------------------------------------------------------------------------

/// Maps the categories of one dimension to distinct colours.
#[derive(Debug, Clone, Default)]
pub struct ColorMap {
    mapping: BTreeMap<GroupKey, Color32>,
}

impl ColorMap {
    /// Build a colour map from the distinct keys of a dimension.
    pub fn new(keys: impl IntoIterator<Item = GroupKey>) -> Self {
        let keys: Vec<GroupKey> = keys.into_iter().collect();
        let palette = category_palette(keys.len());
        ColorMap {
            mapping: keys.into_iter().zip(palette).collect(),
        }
    }

    /// Look up the colour for a given key.
    pub fn color_for(&self, key: &GroupKey) -> Color32 {
        self.mapping.get(key).copied().unwrap_or(Color32::GRAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_is_distinct() {
        let palette = category_palette(12);
        assert_eq!(palette.len(), 12);
        for (i, a) in palette.iter().enumerate() {
            for b in &palette[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(category_palette(0).is_empty());
    }

    #[test]
    fn test_palette_is_stable_as_categories_grow() {
        assert_eq!(category_palette(7)[..3], category_palette(3)[..]);
    }

    #[test]
    fn test_color_map_lookup() {
        let keys = vec![GroupKey::Number(0), GroupKey::Number(1)];
        let map = ColorMap::new(keys);
        assert_ne!(
            map.color_for(&GroupKey::Number(0)),
            map.color_for(&GroupKey::Number(1))
        );
        assert_eq!(map.color_for(&GroupKey::Text("x".into())), Color32::GRAY);
    }

    #[test]
    fn test_tier_colors() {
        assert_eq!(tier_color("Bronze"), Color32::from_rgb(0xCD, 0x7F, 0x32));
        assert_eq!(tier_color("Unranked"), Color32::GRAY);
    }
}
