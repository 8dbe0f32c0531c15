//! PRINT command parameters
//!
//! A PRINT payload is a fixed four byte record:
//!
//! ```text
//! offset 0  number of sheets
//! offset 1  margins: high nibble = line feeds before, low nibble = line feeds after
//! offset 2  palette (four 2-bit shades, color 0 in the low bits)
//! offset 3  print density / exposure (low 7 bits)
//! ```
//!
//! All accessors return zero when the payload is too short.

/// Length of a PRINT payload
pub const PRINT_PAYLOAD_LEN: usize = 4;

const OFFSET_SHEETS: usize = 0;
const OFFSET_MARGINS: usize = 1;
const OFFSET_PALETTE: usize = 2;
const OFFSET_DENSITY: usize = 3;

/// Density reported by most games (normal exposure)
pub const DEFAULT_DENSITY: u8 = 0x40;

/// Decoded PRINT parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PrintParams {
    /// Number of sheets (0 means feed paper only)
    pub sheets: u8,
    /// Line feeds before printing
    pub margin_before: u8,
    /// Line feeds after printing
    pub margin_after: u8,
    /// Palette byte
    pub palette: u8,
    /// Print density (0x00 lightest, 0x7F darkest)
    pub density: u8,
}

impl PrintParams {
    /// Decode a PRINT payload
    ///
    /// Payloads shorter than [`PRINT_PAYLOAD_LEN`] decode to all zeros.
    pub fn from_payload(payload: &[u8]) -> Self {
        if payload.len() < PRINT_PAYLOAD_LEN {
            return Self::default();
        }

        Self {
            sheets: sheets(payload),
            margin_before: margin_before(payload),
            margin_after: margin_after(payload),
            palette: palette(payload),
            density: density(payload),
        }
    }

    /// Encode as a PRINT payload
    pub fn to_payload(&self) -> [u8; PRINT_PAYLOAD_LEN] {
        [
            self.sheets,
            ((self.margin_before & 0x0F) << 4) | (self.margin_after & 0x0F),
            self.palette,
            self.density & 0x7F,
        ]
    }

    /// Shade (0-3) the palette assigns to a 2-bit color index
    pub fn shade(&self, color_index: u8) -> u8 {
        palette_shade(self.palette, color_index)
    }
}

fn field(payload: &[u8], offset: usize) -> u8 {
    if payload.len() < PRINT_PAYLOAD_LEN {
        return 0;
    }
    payload[offset]
}

/// Number of sheets to print
pub fn sheets(payload: &[u8]) -> u8 {
    field(payload, OFFSET_SHEETS)
}

/// Line feeds before printing (high nibble of the margin byte)
pub fn margin_before(payload: &[u8]) -> u8 {
    field(payload, OFFSET_MARGINS) >> 4
}

/// Line feeds after printing (low nibble of the margin byte)
pub fn margin_after(payload: &[u8]) -> u8 {
    field(payload, OFFSET_MARGINS) & 0x0F
}

/// Palette byte
pub fn palette(payload: &[u8]) -> u8 {
    field(payload, OFFSET_PALETTE)
}

/// Print density (low 7 bits of the density byte)
pub fn density(payload: &[u8]) -> u8 {
    field(payload, OFFSET_DENSITY) & 0x7F
}

/// Shade (0-3) assigned by `palette` to `color_index` (0-3)
pub fn palette_shade(palette: u8, color_index: u8) -> u8 {
    (palette >> ((color_index & 0x03) * 2)) & 0x03
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_typical_print() {
        // One sheet, no margin before, three line feeds after, standard palette
        let params = PrintParams::from_payload(&[0x01, 0x03, 0xE4, 0x40]);
        assert_eq!(params.sheets, 1);
        assert_eq!(params.margin_before, 0);
        assert_eq!(params.margin_after, 3);
        assert_eq!(params.palette, 0xE4);
        assert_eq!(params.density, DEFAULT_DENSITY);
    }

    #[test]
    fn test_short_payload_decodes_to_zero() {
        assert_eq!(PrintParams::from_payload(&[0x01, 0x13]), PrintParams::default());
        assert_eq!(sheets(&[]), 0);
        assert_eq!(margin_before(&[0x01, 0x13, 0xE4]), 0);
    }

    #[test]
    fn test_density_masks_high_bit() {
        assert_eq!(density(&[0, 0, 0, 0xFF]), 0x7F);
    }

    #[test]
    fn test_payload_roundtrip() {
        let params = PrintParams {
            sheets: 2,
            margin_before: 1,
            margin_after: 9,
            palette: 0x1B,
            density: 0x7F,
        };
        assert_eq!(PrintParams::from_payload(&params.to_payload()), params);
    }

    #[test]
    fn test_palette_shade() {
        // 0xE4 = 11 10 01 00: identity mapping
        for index in 0..4 {
            assert_eq!(palette_shade(0xE4, index), index);
        }
        // 0x1B = 00 01 10 11: inverted
        assert_eq!(palette_shade(0x1B, 0), 3);
        assert_eq!(palette_shade(0x1B, 3), 0);
    }
}
