//! Background color parsing and the dark-mode pixel filter.

use tiny_skia::{Color, ColorU8, Pixmap};

/// Strength of the `invert()` step of the dark theme filter.
pub const DARK_INVERT: f32 = 0.93;

// `hue-rotate(180deg)` as a linear RGB matrix (CSS Filter Effects, cos = -1, sin = 0).
const HUE_ROTATE_180: [[f32; 3]; 3] = [
    [-0.574, 1.430, 0.144],
    [0.426, 0.430, 0.144],
    [0.426, 1.430, -0.856],
];

/// Parses the subset of CSS colors used for canvas backgrounds.
pub fn parse_color(text: &str) -> Option<Color> {
    let s = text.trim().to_ascii_lowercase();
    match s.as_str() {
        "transparent" => return Some(Color::from_rgba8(0, 0, 0, 0)),
        "white" => return Some(Color::from_rgba8(255, 255, 255, 255)),
        "black" => return Some(Color::from_rgba8(0, 0, 0, 255)),
        _ => {}
    }

    let hex = s.strip_prefix('#')?;
    fn hex2(b: &[u8]) -> Option<u8> {
        let hi = (*b.first()? as char).to_digit(16)? as u8;
        let lo = (*b.get(1)? as char).to_digit(16)? as u8;
        Some((hi << 4) | lo)
    }
    fn hex1(c: u8) -> Option<u8> {
        let v = (c as char).to_digit(16)? as u8;
        Some((v << 4) | v)
    }

    let bytes = hex.as_bytes();
    match bytes.len() {
        3 => Some(Color::from_rgba8(
            hex1(bytes[0])?,
            hex1(bytes[1])?,
            hex1(bytes[2])?,
            255,
        )),
        4 => Some(Color::from_rgba8(
            hex1(bytes[0])?,
            hex1(bytes[1])?,
            hex1(bytes[2])?,
            hex1(bytes[3])?,
        )),
        6 => Some(Color::from_rgba8(
            hex2(&bytes[0..2])?,
            hex2(&bytes[2..4])?,
            hex2(&bytes[4..6])?,
            255,
        )),
        8 => Some(Color::from_rgba8(
            hex2(&bytes[0..2])?,
            hex2(&bytes[2..4])?,
            hex2(&bytes[4..6])?,
            hex2(&bytes[6..8])?,
        )),
        _ => None,
    }
}

/// `invert(93%) hue-rotate(180deg)` for one straight-alpha RGB triple.
pub fn dark_rgb([r, g, b]: [u8; 3]) -> [u8; 3] {
    let inv = |c: u8| {
        let v = f32::from(c) / 255.0;
        DARK_INVERT * (1.0 - v) + (1.0 - DARK_INVERT) * v
    };
    let src = [inv(r), inv(g), inv(b)];
    let mut out = [0u8; 3];
    for (dst, row) in out.iter_mut().zip(HUE_ROTATE_180.iter()) {
        let v = row[0] * src[0] + row[1] * src[1] + row[2] * src[2];
        *dst = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    }
    out
}

/// Applies the dark theme filter to every non-transparent pixel in place.
pub fn apply_dark_filter(pixmap: &mut Pixmap) {
    for px in pixmap.pixels_mut() {
        let alpha = px.alpha();
        if alpha == 0 {
            continue;
        }
        let straight = px.demultiply();
        let [r, g, b] = dark_rgb([straight.red(), straight.green(), straight.blue()]);
        *px = ColorU8::from_rgba(r, g, b, alpha).premultiply();
    }
}
