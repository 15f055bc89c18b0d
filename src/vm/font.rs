/// Start of the glyph table. Programs rely on the glyphs living in the
/// reserved low-memory area, addressed as `digit * GLYPH_BYTES`.
pub(crate) const FONT_START_ADDRESS: u16 = 0x000;

pub(crate) const GLYPH_BYTES: usize = 5;

/// Sprite data for the hexadecimal digits 0-F, 5 bytes per glyph.
pub(crate) const FONT: [u8; 16 * GLYPH_BYTES] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Address of the glyph sprite for a hexadecimal digit.
pub(crate) fn glyph_address(digit: u8) -> u16 {
    FONT_START_ADDRESS + u16::from(digit) * GLYPH_BYTES as u16
}
