//! Packed ARGB colours and the pure colour helpers used by the brush.

use peniko::Color;
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A colour packed as `0xAARRGGBB`.
///
/// Serialized as a signed 32-bit integer so documents written by other
/// clients (which store colours as signed ints) load unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Argb(pub u32);

impl Argb {
    pub const WHITE: Argb = Argb(0xFFFF_FFFF);
    pub const TRANSPARENT: Argb = Argb(0);

    pub fn new(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// Opaque colour from RGB channels.
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(0xFF, r, g, b)
    }

    pub fn a(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn b(self) -> u8 {
        self.0 as u8
    }

    /// Same colour with a different alpha.
    pub fn with_alpha(self, a: u8) -> Self {
        Self::new(a, self.r(), self.g(), self.b())
    }

    /// Signed integer form used in documents.
    pub fn to_i32(self) -> i32 {
        self.0 as i32
    }

    /// Build from any integer, keeping the low 32 bits.
    pub fn from_i64(value: i64) -> Self {
        Self(value as u32)
    }
}

impl Serialize for Argb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.to_i32())
    }
}

impl<'de> Deserialize<'de> for Argb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i64::deserialize(deserializer).map(Argb::from_i64)
    }
}

impl From<Argb> for Color {
    fn from(color: Argb) -> Self {
        Color::from_rgba8(color.r(), color.g(), color.b(), color.a())
    }
}

impl From<Color> for Argb {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Argb::new(rgba.a, rgba.r, rgba.g, rgba.b)
    }
}

/// A colour in hue/saturation/value space.
///
/// `h` is in degrees `[0, 360)`, `s` and `v` are in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    pub h: f64,
    pub s: f64,
    pub v: f64,
}

/// Convert an RGB colour (alpha ignored) to HSV.
pub fn to_hsv(color: Argb) -> Hsv {
    let r = color.r() as f64 / 255.0;
    let g = color.g() as f64 / 255.0;
    let b = color.b() as f64 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let h = if delta <= f64::EPSILON {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let s = if max <= f64::EPSILON { 0.0 } else { delta / max };

    Hsv { h, s, v: max }
}

/// Convert HSV to an opaque colour.
pub fn from_hsv(hsv: Hsv) -> Argb {
    let h = hsv.h.rem_euclid(360.0);
    let s = hsv.s.clamp(0.0, 1.0);
    let v = hsv.v.clamp(0.0, 1.0);

    let c = v * s;
    let x = c * (1.0 - ((h / 60.0).rem_euclid(2.0) - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match (h / 60.0) as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let to_u8 = |channel: f64| ((channel + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Argb::from_rgb(to_u8(r), to_u8(g), to_u8(b))
}

/// Blend a colour toward white by `mix` (0 = unchanged, 1 = white).
///
/// The result is opaque.
pub fn soften_toward_white(color: Argb, mix: f64) -> Argb {
    let mix = mix.clamp(0.0, 1.0);
    let blend = |c: u8| {
        let c = c as f64;
        (c + (255.0 - c) * mix).clamp(0.0, 255.0) as u8
    };
    Argb::from_rgb(blend(color.r()), blend(color.g()), blend(color.b()))
}

/// Core and glow colours of one dust particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DustTint {
    pub core: Argb,
    pub glow: Argb,
}

/// Maximum hue deviation of a jittered dust colour, in degrees.
pub const HUE_JITTER_DEGREES: f64 = 5.0;

/// Perturb the ink colour for one dust particle.
///
/// Hue moves at most ±5°, saturation is scaled into `[0.35, 0.80]` of the
/// ink's, value lands in `[0.80, 0.98]`. The glow is a slightly desaturated,
/// darker variant of the core.
pub fn jitter_ink<R: Rng + ?Sized>(ink: Hsv, rng: &mut R) -> DustTint {
    let hue = (ink.h + rng.gen_range(-HUE_JITTER_DEGREES..HUE_JITTER_DEGREES) + 360.0) % 360.0;
    let sat = (ink.s * (0.35 + rng.r#gen::<f64>() * 0.45)).clamp(0.0, 1.0);
    let val = (0.80 + rng.r#gen::<f64>() * 0.18).clamp(0.0, 1.0);

    let core = from_hsv(Hsv { h: hue, s: sat, v: val });
    let glow = from_hsv(Hsv {
        h: hue,
        s: (sat * 0.85).clamp(0.0, 1.0),
        v: (val * 0.90).clamp(0.0, 1.0),
    });
    DustTint { core, glow }
}

/// Signed distance between two hues, in degrees within `[-180, 180]`.
pub fn hue_distance(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    if d > 180.0 { d - 360.0 } else { d }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_channels() {
        let c = Argb::new(0x80, 0x11, 0x22, 0x33);
        assert_eq!((c.a(), c.r(), c.g(), c.b()), (0x80, 0x11, 0x22, 0x33));
        assert_eq!(c.with_alpha(0xFF).a(), 0xFF);
    }

    #[test]
    fn test_signed_int_serialization() {
        let ink = Argb::from_rgb(0xBF, 0xD6, 0xFF);
        let json = serde_json::to_string(&ink).unwrap();
        assert_eq!(json, "-4204801");
        let back: Argb = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ink);
        let unsigned: Argb = serde_json::from_str("4290762495").unwrap();
        assert_eq!(unsigned, ink);
    }

    #[test]
    fn test_hsv_primaries() {
        let red = to_hsv(Argb::from_rgb(255, 0, 0));
        assert!(red.h.abs() < 1e-9 && (red.s - 1.0).abs() < 1e-9 && (red.v - 1.0).abs() < 1e-9);
        let green = to_hsv(Argb::from_rgb(0, 255, 0));
        assert!((green.h - 120.0).abs() < 1e-9);
        let blue = to_hsv(Argb::from_rgb(0, 0, 255));
        assert!((blue.h - 240.0).abs() < 1e-9);
        let grey = to_hsv(Argb::from_rgb(128, 128, 128));
        assert!(grey.s.abs() < 1e-9);
    }

    #[test]
    fn test_hsv_roundtrip() {
        for &c in &[
            Argb::from_rgb(0xBF, 0xD6, 0xFF),
            Argb::from_rgb(12, 200, 77),
            Argb::from_rgb(250, 10, 120),
            Argb::from_rgb(0, 0, 0),
        ] {
            assert_eq!(from_hsv(to_hsv(c)), c);
        }
    }

    #[test]
    fn test_soften_toward_white() {
        let c = Argb::from_rgb(0, 100, 255);
        assert_eq!(soften_toward_white(c, 0.0), c);
        assert_eq!(soften_toward_white(c, 1.0), Argb::WHITE);
        let half = soften_toward_white(c, 0.5);
        assert_eq!(half.r(), 127);
        assert_eq!(half.g(), 177);
        assert_eq!(half.b(), 255);
    }

    #[test]
    fn test_jitter_bounds() {
        let ink = to_hsv(Argb::from_rgb(255, 100, 0));
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..500 {
            let tint = jitter_ink(ink, &mut rng);
            let core = to_hsv(tint.core);
            // Quantisation to 8-bit channels can move the hue slightly.
            assert!(hue_distance(core.h, ink.h).abs() <= HUE_JITTER_DEGREES + 1.0);
            assert!(core.v >= 0.80 - 0.01 && core.v <= 0.98 + 0.01);
            assert!(core.s <= ink.s * 0.80 + 0.02);
            assert_eq!(tint.core.a(), 0xFF);
            let glow = to_hsv(tint.glow);
            assert!(glow.v <= core.v + 0.01);
        }
    }

    #[test]
    fn test_peniko_roundtrip() {
        let c = Argb::new(200, 1, 2, 3);
        let color: Color = c.into();
        assert_eq!(Argb::from(color), c);
    }
}
