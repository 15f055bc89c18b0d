use super::font::FONT;
use super::types::VmError;

pub const MEMORY_SIZE: usize = 4096;

/// Programs are loaded above the reserved area (glyph table plus the space
/// historically occupied by the interpreter itself).
pub const ROM_START_ADDRESS: usize = 0x200;

/// Flat 4KB address space with the glyph table preloaded at the bottom.
///
/// Every access is bounds checked; an address at or past `MEMORY_SIZE` is a
/// fault, never a wrap.
pub struct Memory {
    bytes: [u8; MEMORY_SIZE],
}

impl Memory {
    pub fn new() -> Self {
        let mut bytes = [0; MEMORY_SIZE];
        bytes[..FONT.len()].copy_from_slice(&FONT);
        Memory { bytes }
    }

    pub fn read(&self, address: u16) -> Result<u8, VmError> {
        self.bytes
            .get(address as usize)
            .copied()
            .ok_or(VmError::OutOfBounds { address })
    }

    pub fn write(&mut self, address: u16, value: u8) -> Result<(), VmError> {
        *self
            .bytes
            .get_mut(address as usize)
            .ok_or(VmError::OutOfBounds { address })? = value;
        Ok(())
    }

    /// Copies a block of bytes into memory starting at `offset`.
    pub fn load_block(&mut self, offset: usize, block: &[u8]) -> Result<(), VmError> {
        let end = offset + block.len();
        self.bytes
            .get_mut(offset..end)
            .ok_or(VmError::OutOfBounds {
                address: offset.min(u16::MAX as usize) as u16,
            })?
            .copy_from_slice(block);
        Ok(())
    }

    /// Borrows `len` consecutive bytes starting at `address`.
    pub fn span(&self, address: u16, len: usize) -> Result<&[u8], VmError> {
        let start = address as usize;
        self.bytes
            .get(start..start + len)
            .ok_or(VmError::OutOfBounds { address })
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_is_preloaded_at_the_bottom() {
        let mem = Memory::new();

        // First byte of glyph 0 and last byte of glyph F
        assert_eq!(mem.read(0x000).unwrap(), 0xF0);
        assert_eq!(mem.read(0x04F).unwrap(), 0x80);
    }

    #[test]
    fn read_write_round_trip() {
        let mut mem = Memory::new();

        mem.write(0x200, 0xAB).unwrap();
        assert_eq!(mem.read(0x200).unwrap(), 0xAB);
    }

    #[test]
    fn access_past_the_end_fails() {
        let mut mem = Memory::new();

        assert!(matches!(
            mem.read(4096),
            Err(VmError::OutOfBounds { address: 4096 })
        ));
        assert!(matches!(mem.write(4096, 0), Err(VmError::OutOfBounds { .. })));
    }

    #[test]
    fn load_block_rejects_overflow() {
        let mut mem = Memory::new();

        let block = [0u8; 16];
        assert!(mem.load_block(MEMORY_SIZE - 16, &block).is_ok());
        assert!(matches!(
            mem.load_block(MEMORY_SIZE - 15, &block),
            Err(VmError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn span_is_bounds_checked() {
        let mem = Memory::new();

        assert_eq!(mem.span(0x000, 5).unwrap(), &FONT[..5]);
        assert!(matches!(
            mem.span(4090, 8),
            Err(VmError::OutOfBounds { address: 4090 })
        ));
    }
}
