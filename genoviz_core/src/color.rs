// Copyright 2026 the Genoviz Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! RGBA colors with CSS hex parsing, interpolation and darkening.

use core::fmt;
use core::str::FromStr;

/// An 8-bit-per-channel RGBA color.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel (255 is opaque).
    pub a: u8,
}

/// Error returned when a string is not a `#rgb`, `#rrggbb` or `#rrggbbaa`
/// color.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid color {0:?}")]
pub struct ParseColorError(pub String);

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    /// Creates an opaque color.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parses a CSS hex color (`#rgb`, `#rrggbb` or `#rrggbbaa`).
    pub fn from_hex(s: &str) -> Result<Self, ParseColorError> {
        let err = || ParseColorError(s.to_owned());
        let hex = s.strip_prefix('#').ok_or_else(err)?;
        if !hex.is_ascii() {
            return Err(err());
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
        match hex.len() {
            3 => {
                let nib = |i: usize| {
                    u8::from_str_radix(&hex[i..=i], 16)
                        .map(|v| v * 17)
                        .map_err(|_| err())
                };
                Ok(Self::rgb(nib(0)?, nib(1)?, nib(2)?))
            }
            6 => Ok(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Self {
                r: byte(0)?,
                g: byte(2)?,
                b: byte(4)?,
                a: byte(6)?,
            }),
            _ => Err(err()),
        }
    }

    /// Formats as `#rrggbb`, or `#rrggbbaa` when not opaque.
    #[must_use]
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Returns a darker color; each step multiplies the channels by `0.7`.
    #[must_use]
    pub fn darker(self, k: f64) -> Self {
        let f = 0.7_f64.powf(k);
        Self {
            r: scale_channel(self.r, f),
            g: scale_channel(self.g, f),
            b: scale_channel(self.b, f),
            a: self.a,
        }
    }

    /// Linearly interpolates between `self` and `other`; `t` is clamped to
    /// `[0, 1]`.
    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| round_channel(f64::from(a) + (f64::from(b) - f64::from(a)) * t);
        Self {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }

    /// Returns the alpha channel as a fraction.
    #[must_use]
    pub fn alpha_f32(self) -> f32 {
        f32::from(self.a) / 255.0
    }
}

fn scale_channel(c: u8, f: f64) -> u8 {
    round_channel(f64::from(c) * f)
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "value is clamped to the u8 range before the cast"
)]
fn round_channel(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Color({})", self.to_hex())
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Color {
    type Error = ParseColorError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_hex()
    }
}

/// Samples a piecewise-linear gradient through `stops` at `t ∈ [0, 1]`.
///
/// Returns [`Color::BLACK`] for an empty stop list.
#[must_use]
pub fn sample_gradient(stops: &[Color], t: f64) -> Color {
    match stops {
        [] => Color::BLACK,
        [only] => *only,
        _ => {
            let t = t.clamp(0.0, 1.0) * (stops.len() - 1) as f64;
            let lo = t.floor();
            #[expect(
                clippy::cast_possible_truncation,
                reason = "t is bounded by the stop count"
            )]
            let i = (lo as usize).min(stops.len() - 2);
            stops[i].lerp(stops[i + 1], t - i as f64)
        }
    }
}

/// The nine-class YlOrRd sequential scheme.
pub const YL_OR_RD: [Color; 9] = [
    Color::rgb(0xff, 0xff, 0xcc),
    Color::rgb(0xff, 0xed, 0xa0),
    Color::rgb(0xfe, 0xd9, 0x76),
    Color::rgb(0xfe, 0xb2, 0x4c),
    Color::rgb(0xfd, 0x8d, 0x3c),
    Color::rgb(0xfc, 0x4e, 0x2a),
    Color::rgb(0xe3, 0x1a, 0x1c),
    Color::rgb(0xbd, 0x00, 0x26),
    Color::rgb(0x80, 0x00, 0x26),
];

/// A categorical palette for series colors.
pub const CATEGORICAL: [Color; 8] = [
    Color::rgb(0x38, 0x67, 0xfa),
    Color::rgb(0xf5, 0x7c, 0x00),
    Color::rgb(0x3c, 0xb3, 0x71),
    Color::rgb(0xd7, 0x3a, 0x49),
    Color::rgb(0x8e, 0x44, 0xad),
    Color::rgb(0x1a, 0xbc, 0x9c),
    Color::rgb(0xe8, 0x43, 0x93),
    Color::rgb(0x7f, 0x8c, 0x8d),
];

/// Quantizes a gradient into `levels` evenly spaced colors.
#[must_use]
pub fn quantize(stops: &[Color], levels: usize) -> Vec<Color> {
    match levels {
        0 => Vec::new(),
        1 => vec![sample_gradient(stops, 0.0)],
        n => (0..n)
            .map(|i| sample_gradient(stops, i as f64 / (n - 1) as f64))
            .collect(),
    }
}
