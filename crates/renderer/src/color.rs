//! Density to color mapping.

use image::Rgba;

/// RGBA color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, self.a])
    }
}

impl From<Color> for Rgba<u8> {
    fn from(c: Color) -> Self {
        c.to_rgba()
    }
}

/// Opaque color from hue (degrees), saturation and value in [0, 1].
///
/// Channels round half up: `(c * 255 + 0.5) as u8`.
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> Color {
    let hp = h / 60.0;
    let c = v * s;
    let x = c * (1.0 - ((hp % 2.0) - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if (0.0..1.0).contains(&hp) {
        (c, x, 0.0)
    } else if (1.0..2.0).contains(&hp) {
        (x, c, 0.0)
    } else if (2.0..3.0).contains(&hp) {
        (0.0, c, x)
    } else if (3.0..4.0).contains(&hp) {
        (0.0, x, c)
    } else if (4.0..5.0).contains(&hp) {
        (x, 0.0, c)
    } else if (5.0..6.0).contains(&hp) {
        (c, 0.0, x)
    } else {
        (0.0, 0.0, 0.0)
    };

    Color::new(channel(m + r), channel(m + g), channel(m + b), 255)
}

#[inline]
fn channel(c: f64) -> u8 {
    (c * 255.0 + 0.5).clamp(0.0, 255.0) as u8
}

/// Compress a non-negative density into [0, 1).
///
/// With the tone curve disabled the density is clamped to 1 instead.
#[inline]
pub fn tone_map(t: f64, tone_curve: bool) -> f64 {
    if tone_curve {
        t / (t + 1.0)
    } else {
        t.min(1.0)
    }
}

/// Shade one pixel from its per-source averaged density and blended hue.
///
/// Zero density is fully transparent. Otherwise opacity grows with the
/// square root of the mapped density and saturation falls off towards white
/// as density approaches saturation.
pub fn density_color(total: f64, hue: f64, tone_curve: bool) -> Color {
    if total <= 0.0 {
        return Color::transparent();
    }

    let t = tone_map(total, tone_curve);
    let alpha = (255.0 * t.sqrt()).floor().clamp(0.0, 255.0) as u8;
    hsv_to_rgb(hue, 1.0 - t * t, 1.0).with_alpha(alpha)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_hues() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), Color::new(255, 0, 0, 255));
        assert_eq!(hsv_to_rgb(120.0, 1.0, 1.0), Color::new(0, 255, 0, 255));
        assert_eq!(hsv_to_rgb(240.0, 1.0, 1.0), Color::new(0, 0, 255, 255));
        assert_eq!(hsv_to_rgb(60.0, 1.0, 1.0), Color::new(255, 255, 0, 255));
    }

    #[test]
    fn test_zero_saturation_is_white() {
        for hue in [0.0, 90.0, 215.0, 359.9] {
            assert_eq!(hsv_to_rgb(hue, 0.0, 1.0), Color::new(255, 255, 255, 255));
        }
    }

    #[test]
    fn test_default_hue() {
        // 215 degrees: azure
        let c = hsv_to_rgb(215.0, 1.0, 1.0);
        assert_eq!((c.r, c.g, c.b), (0, 106, 255));
    }

    #[test]
    fn test_zero_density_is_transparent() {
        assert_eq!(density_color(0.0, 215.0, true).a, 0);
        assert_eq!(density_color(0.0, 215.0, false).a, 0);
    }

    #[test]
    fn test_unit_density() {
        // t = 1 maps to 0.5: alpha floor(255 * sqrt(0.5)), saturation 0.75
        let c = density_color(1.0, 0.0, true);
        assert_eq!(c.a, 180);
        assert_eq!((c.r, c.g, c.b), (255, 64, 64));
    }

    #[test]
    fn test_clamped_density_is_opaque_white() {
        let c = density_color(5.0, 120.0, false);
        assert_eq!(c, Color::new(255, 255, 255, 255));
    }

    #[test]
    fn test_alpha_monotone_in_density() {
        let mut last = 0;
        for i in 1..200 {
            let a = density_color(i as f64 * 0.05, 215.0, true).a;
            assert!(a >= last);
            last = a;
        }
        assert!(last < 255);
    }
}
