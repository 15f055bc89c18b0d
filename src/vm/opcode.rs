use crate::u4;

/// Decoded instruction.
///
/// Operand naming follows the architecture convention: `x` and `y` are
/// register indices (bits 8-11 and 4-7), `n`/`nn`/`nnn` are the low
/// 4/8/12 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// 00E0 - Clear the frame buffer.
    ClearDisplay,
    /// 00EE - Return from a subroutine.
    Return,

    /// 1nnn - Jump to nnn.
    Jump { nnn: u16 },
    /// Bnnn - Jump to nnn + V0.
    JumpOffset { nnn: u16 },
    /// 2nnn - Call the subroutine at nnn.
    Call { nnn: u16 },

    /// 3xnn - Skip the next instruction if Vx == nn.
    SkipEqImm { x: u4, nn: u8 },
    /// 4xnn - Skip the next instruction if Vx != nn.
    SkipNeImm { x: u4, nn: u8 },
    /// 5xy0 - Skip the next instruction if Vx == Vy.
    SkipEqReg { x: u4, y: u4 },
    /// 9xy0 - Skip the next instruction if Vx != Vy.
    SkipNeReg { x: u4, y: u4 },

    /// 6xnn - Vx = nn.
    LoadImm { x: u4, nn: u8 },
    /// 7xnn - Vx = Vx + nn, wrapping, no flag.
    AddImm { x: u4, nn: u8 },
    /// Annn - I = nnn.
    LoadIndex { nnn: u16 },
    /// Fx1E - I = I + Vx.
    AddIndex { x: u4 },

    /// 8xyN - Register-to-register arithmetic and logic.
    Alu { x: u4, y: u4, op: AluOp },
    /// Cxnn - Vx = random byte AND nn.
    Random { x: u4, nn: u8 },

    /// Dxyn - Draw an n-row sprite from memory[I..] at (Vx, Vy).
    Draw { x: u4, y: u4, n: u4 },

    /// Ex9E - Skip the next instruction if key Vx is pressed.
    SkipKeyPressed { x: u4 },
    /// ExA1 - Skip the next instruction if key Vx is not pressed.
    SkipKeyNotPressed { x: u4 },
    /// Fx0A - Block until a key is pressed, store the key code in Vx.
    WaitKey { x: u4 },

    /// Fx07 - Vx = delay timer.
    ReadDelay { x: u4 },
    /// Fx15 - Delay timer = Vx.
    SetDelay { x: u4 },
    /// Fx18 - Sound timer = Vx.
    SetSound { x: u4 },

    /// Fx29 - I = glyph table address of digit Vx.
    GlyphAddr { x: u4 },
    /// Fx33 - Store the three BCD digits of Vx at memory[I..I+3).
    StoreBcd { x: u4 },

    /// Fx55 - Store V0..=Vx at memory[I..]; I is left unchanged.
    StoreRegs { x: u4 },
    /// Fx65 - Load V0..=Vx from memory[I..]; I is left unchanged.
    LoadRegs { x: u4 },

    /// Any pattern not covered above. Executing it is a fault, never a no-op.
    Unknown(u16),
}

/// The 8xyN operation family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    /// 8xy0 - Vx = Vy
    Copy,
    /// 8xy1 - Vx = Vx OR Vy
    Or,
    /// 8xy2 - Vx = Vx AND Vy
    And,
    /// 8xy3 - Vx = Vx XOR Vy
    Xor,
    /// 8xy4 - Vx = Vx + Vy, VF = carry
    Add,
    /// 8xy5 - Vx = Vx - Vy, VF = no borrow
    Sub,
    /// 8xy6 - VF = Vx bit 0, Vx = Vx >> 1
    ShiftRight,
    /// 8xy7 - Vx = Vy - Vx, VF = no borrow
    SubFrom,
    /// 8xyE - VF = Vx bit 7, Vx = Vx << 1
    ShiftLeft,
}

impl Opcode {
    /// Decodes a raw 16-bit instruction word.
    pub fn decode(opcode: u16) -> Self {
        let nibble = (
            ((opcode & 0xF000) >> 12) as u8,
            ((opcode & 0x0F00) >> 8) as u8,
            ((opcode & 0x00F0) >> 4) as u8,
            (opcode & 0x000F) as u8,
        );

        let x = u4::new(nibble.1);
        let y = u4::new(nibble.2);
        let n = u4::new(nibble.3);
        let nn = (opcode & 0x00FF) as u8;
        let nnn = opcode & 0x0FFF;

        match (nibble.0, nibble.1, nibble.2, nibble.3) {
            (0x0, 0x0, 0xE, 0x0) => Opcode::ClearDisplay,
            (0x0, 0x0, 0xE, 0xE) => Opcode::Return,
            (0x1, _, _, _) => Opcode::Jump { nnn },
            (0x2, _, _, _) => Opcode::Call { nnn },
            (0x3, _, _, _) => Opcode::SkipEqImm { x, nn },
            (0x4, _, _, _) => Opcode::SkipNeImm { x, nn },
            (0x5, _, _, 0x0) => Opcode::SkipEqReg { x, y },
            (0x6, _, _, _) => Opcode::LoadImm { x, nn },
            (0x7, _, _, _) => Opcode::AddImm { x, nn },
            (0x8, _, _, _) => Opcode::Alu {
                x,
                y,
                op: match nibble.3 {
                    0x0 => AluOp::Copy,
                    0x1 => AluOp::Or,
                    0x2 => AluOp::And,
                    0x3 => AluOp::Xor,
                    0x4 => AluOp::Add,
                    0x5 => AluOp::Sub,
                    0x6 => AluOp::ShiftRight,
                    0x7 => AluOp::SubFrom,
                    0xE => AluOp::ShiftLeft,
                    _ => return Opcode::Unknown(opcode),
                },
            },
            (0x9, _, _, 0x0) => Opcode::SkipNeReg { x, y },
            (0xA, _, _, _) => Opcode::LoadIndex { nnn },
            (0xB, _, _, _) => Opcode::JumpOffset { nnn },
            (0xC, _, _, _) => Opcode::Random { x, nn },
            (0xD, _, _, _) => Opcode::Draw { x, y, n },
            (0xE, _, 0x9, 0xE) => Opcode::SkipKeyPressed { x },
            (0xE, _, 0xA, 0x1) => Opcode::SkipKeyNotPressed { x },
            (0xF, _, 0x0, 0x7) => Opcode::ReadDelay { x },
            (0xF, _, 0x0, 0xA) => Opcode::WaitKey { x },
            (0xF, _, 0x1, 0x5) => Opcode::SetDelay { x },
            (0xF, _, 0x1, 0x8) => Opcode::SetSound { x },
            (0xF, _, 0x1, 0xE) => Opcode::AddIndex { x },
            (0xF, _, 0x2, 0x9) => Opcode::GlyphAddr { x },
            (0xF, _, 0x3, 0x3) => Opcode::StoreBcd { x },
            (0xF, _, 0x5, 0x5) => Opcode::StoreRegs { x },
            (0xF, _, 0x6, 0x5) => Opcode::LoadRegs { x },

            _ => Opcode::Unknown(opcode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_operand_fields() {
        assert_eq!(Opcode::decode(0x1ABC), Opcode::Jump { nnn: 0xABC });
        assert_eq!(
            Opcode::decode(0x6A42),
            Opcode::LoadImm {
                x: u4::new(0xA),
                nn: 0x42
            }
        );
        assert_eq!(
            Opcode::decode(0xD123),
            Opcode::Draw {
                x: u4::new(1),
                y: u4::new(2),
                n: u4::new(3)
            }
        );
    }

    #[test]
    fn register_compare_skips_require_a_zero_low_nibble() {
        assert_eq!(
            Opcode::decode(0x5120),
            Opcode::SkipEqReg {
                x: u4::new(1),
                y: u4::new(2)
            }
        );
        assert_eq!(Opcode::decode(0x5121), Opcode::Unknown(0x5121));
        assert_eq!(Opcode::decode(0x9AB3), Opcode::Unknown(0x9AB3));
    }

    #[test]
    fn unmatched_patterns_decode_to_unknown() {
        assert_eq!(Opcode::decode(0x0000), Opcode::Unknown(0x0000));
        assert_eq!(Opcode::decode(0x8128), Opcode::Unknown(0x8128));
        assert_eq!(Opcode::decode(0xE1FF), Opcode::Unknown(0xE1FF));
        assert_eq!(Opcode::decode(0xF1FF), Opcode::Unknown(0xF1FF));
    }
}
