use clap::ValueEnum;
use palette::{Hsl, IntoColor, Srgb};
use serde::{Deserialize, Serialize};

/// Bar coloring. Renderers pick the color from the bar's horizontal
/// position and how high the drawn cell sits in the bar.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    /// Hue sweeps across the bars, brighter toward the top
    #[default]
    Rainbow,
    /// Single dark green
    Green,
    /// Purple lows through to red highs
    Spectrum,
    /// Red -> orange -> yellow with height
    Fire,
}

impl ColorScheme {
    /// Color for `position` (0.0 = first bar, 1.0 = last) at `height`
    /// (0.0 = bar base, 1.0 = full scale).
    pub fn bar_color(&self, position: f32, height: f32) -> (u8, u8, u8) {
        let position = position.clamp(0.0, 1.0);
        let height = height.clamp(0.0, 1.0);

        let (h, s, l) = match self {
            ColorScheme::Rainbow => (position * 300.0, 0.85, 0.45 + height * 0.2),
            ColorScheme::Green => (120.0, 1.0, 0.2 + height * 0.1),
            ColorScheme::Spectrum => (270.0 - position * 270.0, 0.9, 0.4 + height * 0.3),
            ColorScheme::Fire => (height * 60.0, 0.95, 0.35 + height * 0.3),
        };

        let hsl = Hsl::new(h, s, l);
        let rgb: Srgb = hsl.into_color();

        (
            (rgb.red * 255.0) as u8,
            (rgb.green * 255.0) as u8,
            (rgb.blue * 255.0) as u8,
        )
    }

    pub fn all() -> &'static [ColorScheme] {
        &[
            ColorScheme::Rainbow,
            ColorScheme::Green,
            ColorScheme::Spectrum,
            ColorScheme::Fire,
        ]
    }

    pub fn next(&self) -> Self {
        let all = Self::all();
        let current = all.iter().position(|c| c == self).unwrap_or(0);
        all[(current + 1) % all.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn green_ignores_position() {
        assert_eq!(
            ColorScheme::Green.bar_color(0.0, 0.5),
            ColorScheme::Green.bar_color(1.0, 0.5)
        );
        let (r, g, b) = ColorScheme::Green.bar_color(0.3, 0.0);
        assert!(g > r && g > b);
    }

    #[test]
    fn rainbow_changes_hue_across_bars() {
        assert_ne!(
            ColorScheme::Rainbow.bar_color(0.0, 0.5),
            ColorScheme::Rainbow.bar_color(0.5, 0.5)
        );
    }

    #[test]
    fn next_cycles_through_all() {
        let mut scheme = ColorScheme::default();
        for _ in 0..ColorScheme::all().len() {
            scheme = scheme.next();
        }
        assert_eq!(scheme, ColorScheme::default());
    }
}
