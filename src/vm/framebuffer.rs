pub const DISPLAY_X: usize = 64;
pub const DISPLAY_Y: usize = 32;

/// Monochrome 64x32 display buffer, stored row-major as `x + y * DISPLAY_X`.
///
/// Sprites are composited with XOR. Coordinates wrap modulo the display
/// dimensions, for the origin and for every drawn pixel, so a sprite hanging
/// off the right edge continues on the left. Some machine revisions clip
/// instead; wrap-around is the behavior programs for this architecture
/// conventionally expect.
pub struct FrameBuffer {
    pixels: [bool; DISPLAY_X * DISPLAY_Y],
}

impl FrameBuffer {
    pub fn new() -> Self {
        FrameBuffer {
            pixels: [false; DISPLAY_X * DISPLAY_Y],
        }
    }

    pub fn clear(&mut self) {
        self.pixels.fill(false);
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.pixels[x + y * DISPLAY_X]
    }

    /// Draws an 8-pixel-wide sprite with its top-left corner at `(x, y)`.
    ///
    /// Returns true if any set sprite bit landed on a pixel that was already
    /// lit (a collision), regardless of how many pixels collided.
    pub fn draw_sprite(&mut self, x: u8, y: u8, rows: &[u8]) -> bool {
        let x_pos = x as usize % DISPLAY_X;
        let y_pos = y as usize % DISPLAY_Y;

        let mut collided = false;
        for (row, &sprite_byte) in rows.iter().enumerate() {
            let py = (y_pos + row) % DISPLAY_Y;

            for col in 0..8 {
                if (sprite_byte & (0x80 >> col)) == 0 {
                    continue;
                }

                let px = (x_pos + col) % DISPLAY_X;
                let pixel = &mut self.pixels[px + py * DISPLAY_X];

                if *pixel {
                    collided = true;
                }
                *pixel ^= true;
            }
        }

        collided
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
