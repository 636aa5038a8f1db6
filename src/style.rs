//! Plate theming values.
//!
//! Colors arrive as opaque strings from the user and are forwarded as-is to
//! the rendering boundary. Only the software rasterizer interprets them.

/// Style property carrying the plate text color
pub const TEXT_COLOR_PROPERTY: &str = "--plate-text-color";
/// Style property carrying the plate background gradient
pub const BACKGROUND_PROPERTY: &str = "--plate-background";

const DEFAULT_TEXT: Rgba = Rgba(0x1e, 0x1e, 0x1e, 0xff);
const DEFAULT_BACKGROUND: [Rgba; 2] = [Rgba(0xf4, 0xe9, 0xd8, 0xff), Rgba(0xff, 0xff, 0xff, 0xff)];

/// Text color and background gradient stops for every plate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlateStyle {
    pub text_color: Option<String>,
    pub background: Vec<String>,
}

impl PlateStyle {
    /// Replace the background with the comma-separated `stops`
    pub fn set_background(&mut self, stops: &str) {
        self.background = stops
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    /// Gradient value handed to the rendering surface
    pub fn background_css(&self) -> String {
        format!("linear-gradient(0deg, {})", self.background.join(", "))
    }

    pub fn text_rgba(&self) -> Rgba {
        self.text_color
            .as_deref()
            .and_then(Rgba::parse)
            .unwrap_or(DEFAULT_TEXT)
    }

    /// Gradient stops from bottom (first) to top (last).
    ///
    /// Unparseable stops are skipped; with fewer than one usable stop the
    /// default paper gradient is used.
    pub fn background_rgba(&self) -> Vec<Rgba> {
        let stops: Vec<Rgba> = self.background.iter().filter_map(|s| Rgba::parse(s)).collect();
        if stops.is_empty() {
            DEFAULT_BACKGROUND.to_vec()
        } else {
            stops
        }
    }
}

/// 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba(pub u8, pub u8, pub u8, pub u8);

impl Rgba {
    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`
    pub fn parse(value: &str) -> Option<Self> {
        let hex = value.trim().strip_prefix('#')?;
        let nibble = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
        let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            3 => Some(Rgba(nibble(0)? * 17, nibble(1)? * 17, nibble(2)? * 17, 0xff)),
            6 => Some(Rgba(byte(0)?, byte(2)?, byte(4)?, 0xff)),
            8 => Some(Rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }

    /// Linear interpolation towards `other`, `t` in `[0, 1]`
    pub fn lerp(self, other: Rgba, t: f32) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgba(
            mix(self.0, other.0),
            mix(self.1, other.1),
            mix(self.2, other.2),
            mix(self.3, other.3),
        )
    }
}
