/// Color space helpers for the rasterizer
///
/// Lighting is computed in linear space. The output encoding decides whether
/// pixels are written sRGB-encoded (the default) or left linear.

/// How rendered colors are written into the output image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorEncoding {
    #[default]
    Srgb,
    Linear,
}

impl ColorEncoding {
    /// Encode one linear channel value into an 8-bit output value
    pub fn encode(self, linear: f32) -> u8 {
        let value = match self {
            ColorEncoding::Srgb => linear_to_srgb(linear),
            ColorEncoding::Linear => linear.clamp(0.0, 1.0),
        };
        (value * 255.0 + 0.5) as u8
    }
}

/// sRGB transfer function, inverse direction
pub fn srgb_to_linear(c: f32) -> f32 {
    let c = c.clamp(0.0, 1.0);
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// sRGB transfer function
pub fn linear_to_srgb(c: f32) -> f32 {
    let c = c.clamp(0.0, 1.0);
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// Split a 0xRRGGBB color into 8-bit channels
pub fn rgb_from_hex(hex: u32) -> [u8; 3] {
    [(hex >> 16) as u8, (hex >> 8) as u8, hex as u8]
}

/// Linear [0, 1] channels of a 0xRRGGBB sRGB color
pub fn linear_from_hex(hex: u32) -> [f32; 3] {
    let [r, g, b] = rgb_from_hex(hex);
    [
        srgb_to_linear(r as f32 / 255.0),
        srgb_to_linear(g as f32 / 255.0),
        srgb_to_linear(b as f32 / 255.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_functions_invert() {
        for i in 0..=20 {
            let c = i as f32 / 20.0;
            let back = srgb_to_linear(linear_to_srgb(c));
            assert!((back - c).abs() < 1e-4, "{} -> {}", c, back);
        }
    }

    #[test]
    fn test_encoding_endpoints() {
        assert_eq!(ColorEncoding::Srgb.encode(0.0), 0);
        assert_eq!(ColorEncoding::Srgb.encode(1.0), 255);
        assert_eq!(ColorEncoding::Linear.encode(0.5), 128);
        // Mid grey is brighter once sRGB-encoded
        assert!(ColorEncoding::Srgb.encode(0.5) > 180);
    }

    #[test]
    fn test_hex_split() {
        assert_eq!(rgb_from_hex(0x444444), [0x44, 0x44, 0x44]);
        assert_eq!(rgb_from_hex(0x123456), [0x12, 0x34, 0x56]);
    }
}
