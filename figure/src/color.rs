use plotters::style::RGBColor;
use std::fmt;
use std::str::FromStr;

/// sRGB color with components in `0.0..=1.0`, alpha not premultiplied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn gray(v: f32) -> Self {
        Self::new(v, v, v, 1.0)
    }

    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::from_rgba8(r, g, b, 255)
    }

    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            f32::from(a) / 255.0,
        )
    }

    pub fn from_array(c: [f32; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3]).clamped()
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        [
            channel_to_u8(self.r),
            channel_to_u8(self.g),
            channel_to_u8(self.b),
            channel_to_u8(self.a),
        ]
    }

    pub fn to_rgb8(self) -> [u8; 3] {
        let [r, g, b, _] = self.to_rgba8();
        [r, g, b]
    }

    pub fn to_plotters(self) -> RGBColor {
        let [r, g, b] = self.to_rgb8();
        RGBColor(r, g, b)
    }

    pub fn clamped(self) -> Self {
        Self::new(
            self.r.clamp(0.0, 1.0),
            self.g.clamp(0.0, 1.0),
            self.b.clamp(0.0, 1.0),
            self.a.clamp(0.0, 1.0),
        )
    }

    /// Componentwise product, alpha kept from `self`.
    pub fn modulate(self, factor: [f32; 3]) -> Self {
        Self::new(
            self.r * factor[0],
            self.g * factor[1],
            self.b * factor[2],
            self.a,
        )
        .clamped()
    }

    /// Rec. 601 luma.
    pub fn luma(self) -> f32 {
        0.299 * self.r + 0.587 * self.g + 0.114 * self.b
    }

    pub fn to_hex(self) -> String {
        let [r, g, b, a] = self.to_rgba8();
        if a == 255 {
            format!("#{r:02x}{g:02x}{b:02x}")
        } else {
            format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Rgba::WHITE
    }
}

fn channel_to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid color '{0}': expected #rrggbb or #rrggbbaa")]
pub struct ParseColorError(pub String);

impl FromStr for Rgba {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseColorError(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(err)?;
        if !hex.is_ascii() || (hex.len() != 6 && hex.len() != 8) {
            return Err(err());
        }
        let byte = |idx: usize| u8::from_str_radix(&hex[idx..idx + 2], 16).map_err(|_| err());
        let alpha = if hex.len() == 8 { byte(6)? } else { 255 };
        Ok(Self::from_rgba8(byte(0)?, byte(2)?, byte(4)?, alpha))
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

pub fn palette_color(idx: usize) -> Rgba {
    const COLORS: [(u8, u8, u8); 10] = [
        (0, 114, 189),
        (217, 83, 25),
        (237, 177, 32),
        (126, 47, 142),
        (119, 172, 48),
        (77, 190, 238),
        (162, 20, 47),
        (86, 156, 214),
        (78, 201, 176),
        (214, 157, 133),
    ];
    let (r, g, b) = COLORS[idx % COLORS.len()];
    Rgba::from_rgb8(r, g, b)
}

/// Grayscale colormap used by image items.
pub fn gray_colormap(v: f64) -> Rgba {
    let v = if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
    Rgba::gray(v as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_with_and_without_alpha() {
        let c: Rgba = "#ff8000".parse().unwrap();
        assert_eq!(c.to_rgba8(), [255, 128, 0, 255]);
        let c: Rgba = "#00000080".parse().unwrap();
        assert_eq!(c.to_rgba8(), [0, 0, 0, 128]);
        assert!("ff8000".parse::<Rgba>().is_err());
        assert!("#ff80".parse::<Rgba>().is_err());
        assert!("#gg0000".parse::<Rgba>().is_err());
    }

    #[test]
    fn hex_output_drops_opaque_alpha() {
        assert_eq!(Rgba::from_rgb8(1, 2, 3).to_hex(), "#010203");
        assert_eq!(Rgba::from_rgba8(1, 2, 3, 4).to_hex(), "#01020304");
    }

    #[test]
    fn modulate_clamps_channels() {
        let c = Rgba::new(0.5, 0.5, 0.5, 0.7).modulate([4.0, 1.0, 0.0]);
        assert_eq!(c, Rgba::new(1.0, 0.5, 0.0, 0.7));
    }
}
