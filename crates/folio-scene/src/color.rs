use std::str::FromStr;

use csscolorparser::Color as CssColor;
use palette::{FromColor, LinSrgba, Srgba};

use crate::scene::ColorLinPremul;

#[derive(Debug, thiserror::Error)]
#[error("invalid CSS color: {0}")]
pub struct ColorParseError(pub String);

// sRGB → Linear premultiplied conversions, kept out of scene.rs for separation of concerns.
impl ColorLinPremul {
    /// Convenience alias matching Color::rgba(...) widely used in UI code.
    #[inline]
    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::from_srgba_u8([r, g, b, a])
    }

    /// Create from sRGB u8 RGBA array (premultiplied in linear space).
    #[inline]
    pub fn from_srgba_u8(c: [u8; 4]) -> Self {
        Self::from_srgba(c[0], c[1], c[2], c[3] as f32 / 255.0)
    }

    /// Create from sRGB u8 RGB with float alpha (CSS-like rgba).
    #[inline]
    pub fn from_srgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        let s = Srgba::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a);
        let lin: LinSrgba = LinSrgba::from_color(s);
        Self {
            r: lin.red * lin.alpha,
            g: lin.green * lin.alpha,
            b: lin.blue * lin.alpha,
            a: lin.alpha,
        }
    }

    /// Parse any CSS color syntax (`red`, `#fbbf24`, `rgba(0, 0, 0, 0.2)`, ...).
    pub fn parse_css(value: &str) -> Result<Self, ColorParseError> {
        let c = CssColor::from_str(value.trim()).map_err(|_| ColorParseError(value.to_string()))?;
        let channel = |v: f64| (v * 255.0).round().clamp(0.0, 255.0) as u8;
        Ok(Self::from_srgba(channel(c.r), channel(c.g), channel(c.b), c.a as f32))
    }

    /// Convert back to sRGB u8 RGBA array (unpremultiplied).
    #[inline]
    pub fn to_srgba_u8(&self) -> [u8; 4] {
        // Unpremultiply
        let (r, g, b) = if self.a > 0.0001 {
            (self.r / self.a, self.g / self.a, self.b / self.a)
        } else {
            (0.0, 0.0, 0.0)
        };

        let lin = LinSrgba::new(r, g, b, self.a);
        let srgb: Srgba = Srgba::from_color(lin);

        [
            (srgb.red * 255.0).round().clamp(0.0, 255.0) as u8,
            (srgb.green * 255.0).round().clamp(0.0, 255.0) as u8,
            (srgb.blue * 255.0).round().clamp(0.0, 255.0) as u8,
            (srgb.alpha * 255.0).round().clamp(0.0, 255.0) as u8,
        ]
    }

    /// CSS serialization: `#rrggbb` when opaque, `rgba(...)` otherwise.
    pub fn to_css(&self) -> String {
        let [r, g, b, a] = self.to_srgba_u8();
        if a == 255 {
            format!("#{:02x}{:02x}{:02x}", r, g, b)
        } else {
            format!("rgba({}, {}, {}, {:.3})", r, g, b, a as f32 / 255.0)
        }
    }
}

impl FromStr for ColorLinPremul {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_css(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_and_hex_colors() {
        let red: ColorLinPremul = "red".parse().unwrap();
        assert_eq!(red.to_srgba_u8(), [255, 0, 0, 255]);
        let amber = ColorLinPremul::parse_css("#fbbf24").unwrap();
        assert_eq!(amber.to_css(), "#fbbf24");
    }

    #[test]
    fn translucent_colors_serialize_as_rgba() {
        let c = ColorLinPremul::parse_css("rgba(0, 0, 0, 0.2)").unwrap();
        assert!(c.to_css().starts_with("rgba(0, 0, 0, 0.2"));
    }

    #[test]
    fn rejects_garbage() {
        assert!(ColorLinPremul::parse_css("not-a-color").is_err());
    }
}
