use crate::u4;

pub const NUM_KEYS: usize = 16;

/// Press state of the hexadecimal keypad.
///
/// The host input collaborator writes it, the interpreter only reads.
pub struct Keypad {
    keys: [bool; NUM_KEYS],
}

impl Keypad {
    pub fn new() -> Self {
        Keypad {
            keys: [false; NUM_KEYS],
        }
    }

    pub fn set(&mut self, key: u4, pressed: bool) {
        self.keys[key] = pressed;
    }

    /// Key queries take the full register byte; only the low nibble selects
    /// a key, matching how programs pass register values to Ex9E/ExA1.
    pub fn is_pressed(&self, key: u8) -> bool {
        self.keys[(key & 0x0F) as usize]
    }

    /// Lowest-numbered key currently held down, if any.
    pub fn first_pressed(&self) -> Option<u8> {
        self.keys.iter().position(|&k| k).map(|k| k as u8)
    }

    pub fn keys(&self) -> &[bool; NUM_KEYS] {
        &self.keys
    }
}

impl Default for Keypad {
    fn default() -> Self {
        Self::new()
    }
}
