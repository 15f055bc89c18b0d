use rand::Rng;

use super::font;
use super::machine::Vm;
use super::opcode::{AluOp, Opcode};
use super::types::{StepResult, VmError};
use crate::u4;

/// Program-counter policy chosen by an opcode handler.
///
/// Handlers never touch the counter themselves (other than setting a jump
/// target); the dispatch loop applies the policy exactly once, so the
/// counter cannot be double-advanced.
enum Flow {
    /// Fall through to the next instruction.
    Advance,
    /// Skip over the next instruction.
    Skip,
    /// The handler set the counter to an absolute address.
    Jump,
    /// Re-execute the same instruction on the next step.
    Retry,
}

impl Vm {
    pub(crate) fn execute(&mut self, opcode: Opcode) -> Result<StepResult, VmError> {
        let mut result = StepResult::Continue;

        let flow = match opcode {
            Opcode::ClearDisplay => {
                self.framebuffer.clear();
                Flow::Advance
            }
            Opcode::Return => {
                let address = self.registers.pop()?;
                self.registers.set_pc(address);
                Flow::Jump
            }
            Opcode::Jump { nnn } => {
                self.registers.set_pc(nnn);
                Flow::Jump
            }
            Opcode::JumpOffset { nnn } => {
                let v0 = self.registers.get(u4::new(0));
                self.registers.set_pc(nnn.wrapping_add(v0.into()));
                Flow::Jump
            }
            Opcode::Call { nnn } => {
                let return_address = self.registers.pc().wrapping_add(2);
                self.registers.push(return_address)?;
                self.registers.set_pc(nnn);
                Flow::Jump
            }
            Opcode::SkipEqImm { x, nn } => {
                if self.registers.get(x) == nn {
                    Flow::Skip
                } else {
                    Flow::Advance
                }
            }
            Opcode::SkipNeImm { x, nn } => {
                if self.registers.get(x) != nn {
                    Flow::Skip
                } else {
                    Flow::Advance
                }
            }
            Opcode::SkipEqReg { x, y } => {
                if self.registers.get(x) == self.registers.get(y) {
                    Flow::Skip
                } else {
                    Flow::Advance
                }
            }
            Opcode::SkipNeReg { x, y } => {
                if self.registers.get(x) != self.registers.get(y) {
                    Flow::Skip
                } else {
                    Flow::Advance
                }
            }
            Opcode::LoadImm { x, nn } => {
                self.registers.set(x, nn);
                Flow::Advance
            }
            Opcode::AddImm { x, nn } => {
                let value = self.registers.get(x).wrapping_add(nn);
                self.registers.set(x, value);
                Flow::Advance
            }
            Opcode::Alu { x, y, op } => {
                self.execute_alu(x, y, op);
                Flow::Advance
            }
            Opcode::Random { x, nn } => {
                let byte: u8 = self.rng.random();
                self.registers.set(x, byte & nn);
                Flow::Advance
            }
            Opcode::LoadIndex { nnn } => {
                self.registers.set_index(nnn);
                Flow::Advance
            }
            Opcode::AddIndex { x } => {
                let vx = self.registers.get(x);
                let index = self.registers.index().wrapping_add(vx.into());
                self.registers.set_index(index);
                Flow::Advance
            }
            Opcode::Draw { x, y, n } => {
                self.execute_draw(x, y, n)?;
                result = StepResult::WaitForNextFrame;
                Flow::Advance
            }
            Opcode::SkipKeyPressed { x } => {
                if self.keypad.is_pressed(self.registers.get(x)) {
                    Flow::Skip
                } else {
                    Flow::Advance
                }
            }
            Opcode::SkipKeyNotPressed { x } => {
                if !self.keypad.is_pressed(self.registers.get(x)) {
                    Flow::Skip
                } else {
                    Flow::Advance
                }
            }
            Opcode::WaitKey { x } => match self.keypad.first_pressed() {
                Some(key) => {
                    self.registers.set(x, key);
                    Flow::Advance
                }
                None => {
                    // Blocked: the host loop gets a frame boundary so it can
                    // poll input, and this instruction runs again.
                    result = StepResult::WaitForNextFrame;
                    Flow::Retry
                }
            },
            Opcode::ReadDelay { x } => {
                self.registers.set(x, self.timers.delay());
                Flow::Advance
            }
            Opcode::SetDelay { x } => {
                self.timers.set_delay(self.registers.get(x));
                Flow::Advance
            }
            Opcode::SetSound { x } => {
                self.timers.set_sound(self.registers.get(x));
                Flow::Advance
            }
            Opcode::GlyphAddr { x } => {
                let digit = self.registers.get(x) & 0x0F;
                self.registers.set_index(font::glyph_address(digit));
                Flow::Advance
            }
            Opcode::StoreBcd { x } => {
                let value = self.registers.get(x);
                let i = self.registers.index();
                self.memory.write(i, value / 100)?;
                self.memory.write(i.wrapping_add(1), (value / 10) % 10)?;
                self.memory.write(i.wrapping_add(2), value % 10)?;
                Flow::Advance
            }
            Opcode::StoreRegs { x } => {
                let i = self.registers.index();
                for reg in 0..=u16::from(x) {
                    let value = self.registers.get(u4::new(reg as u8));
                    self.memory.write(i.wrapping_add(reg), value)?;
                }
                Flow::Advance
            }
            Opcode::LoadRegs { x } => {
                let i = self.registers.index();
                for reg in 0..=u16::from(x) {
                    let value = self.memory.read(i.wrapping_add(reg))?;
                    self.registers.set(u4::new(reg as u8), value);
                }
                Flow::Advance
            }
            Opcode::Unknown(word) => {
                return Err(VmError::UnknownOpcode { opcode: word });
            }
        };

        match flow {
            Flow::Advance => self.registers.advance(),
            Flow::Skip => self.registers.skip(),
            Flow::Jump | Flow::Retry => {}
        }

        Ok(result)
    }

    fn execute_alu(&mut self, x: u4, y: u4, op: AluOp) {
        let vx = self.registers.get(x);
        let vy = self.registers.get(y);

        match op {
            AluOp::Copy => self.registers.set(x, vy),
            AluOp::Or => self.registers.set(x, vx | vy),
            AluOp::And => self.registers.set(x, vx & vy),
            AluOp::Xor => self.registers.set(x, vx ^ vy),
            AluOp::Add => {
                let (value, carry) = vx.overflowing_add(vy);
                self.registers.set(x, value);
                self.registers.set_flag(carry as u8);
            }
            AluOp::Sub => {
                let (value, borrow) = vx.overflowing_sub(vy);
                self.registers.set(x, value);
                // VF is 1 when there was no borrow
                self.registers.set_flag(!borrow as u8);
            }
            AluOp::SubFrom => {
                let (value, borrow) = vy.overflowing_sub(vx);
                self.registers.set(x, value);
                self.registers.set_flag(!borrow as u8);
            }
            AluOp::ShiftRight => {
                self.registers.set(x, vx >> 1);
                self.registers.set_flag(vx & 1);
            }
            AluOp::ShiftLeft => {
                self.registers.set(x, vx << 1);
                self.registers.set_flag(vx >> 7);
            }
        }
    }

    fn execute_draw(&mut self, x: u4, y: u4, n: u4) -> Result<(), VmError> {
        let rows = self.memory.span(self.registers.index(), usize::from(n))?;
        let collided =
            self.framebuffer
                .draw_sprite(self.registers.get(x), self.registers.get(y), rows);
        self.registers.set_flag(collided as u8);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::{DISPLAY_X, DISPLAY_Y};

    fn vm_with(rom: &[u8]) -> Vm {
        let mut vm = Vm::with_seed(1);
        vm.load(rom).unwrap();
        vm
    }

    fn reg(vm: &Vm, index: u8) -> u8 {
        vm.registers().get(u4::new(index))
    }

    #[test]
    fn add_imm_wraps_and_sets_no_flag() {
        for (a, b) in [(0u8, 0u8), (10, 245), (200, 100), (255, 255)] {
            let mut vm = vm_with(&[0x60, a, 0x70, b]);
            vm.step().unwrap();
            vm.step().unwrap();

            assert_eq!(reg(&vm, 0), a.wrapping_add(b));
            assert_eq!(reg(&vm, 0xF), 0);
        }
    }

    #[test]
    fn alu_add_sets_carry_flag() {
        for (a, b) in [(0u8, 0u8), (100, 155), (100, 156), (255, 255)] {
            let mut vm = vm_with(&[0x60, a, 0x61, b, 0x80, 0x14]);
            for _ in 0..3 {
                vm.step().unwrap();
            }

            assert_eq!(reg(&vm, 0), a.wrapping_add(b));
            let expected_carry = (a as u16 + b as u16 > 255) as u8;
            assert_eq!(reg(&vm, 0xF), expected_carry);
        }
    }

    #[test]
    fn alu_sub_sets_no_borrow_flag() {
        for (a, b) in [(0u8, 0u8), (10, 5), (5, 10), (255, 255)] {
            let mut vm = vm_with(&[0x60, a, 0x61, b, 0x80, 0x15]);
            for _ in 0..3 {
                vm.step().unwrap();
            }

            assert_eq!(reg(&vm, 0), a.wrapping_sub(b));
            assert_eq!(reg(&vm, 0xF), (a >= b) as u8);
        }
    }

    #[test]
    fn alu_sub_from_reverses_the_operands() {
        let mut vm = vm_with(&[0x60, 5, 0x61, 10, 0x80, 0x17]);
        for _ in 0..3 {
            vm.step().unwrap();
        }

        assert_eq!(reg(&vm, 0), 5);
        assert_eq!(reg(&vm, 0xF), 1);
    }

    #[test]
    fn shifts_operate_on_vx_and_capture_the_shifted_out_bit() {
        let mut vm = vm_with(&[0x60, 0b1000_0101, 0x80, 0x16]);
        vm.step().unwrap();
        vm.step().unwrap();
        assert_eq!(reg(&vm, 0), 0b0100_0010);
        assert_eq!(reg(&vm, 0xF), 1);

        let mut vm = vm_with(&[0x60, 0b1000_0101, 0x80, 0x1E]);
        vm.step().unwrap();
        vm.step().unwrap();
        assert_eq!(reg(&vm, 0), 0b0000_1010);
        assert_eq!(reg(&vm, 0xF), 1);
    }

    #[test]
    fn logic_ops_leave_vf_alone() {
        // VF=1 from a carry, then V0 |= V1 must not disturb it
        let mut vm = vm_with(&[0x60, 0xFF, 0x61, 0x02, 0x80, 0x14, 0x80, 0x11]);
        for _ in 0..4 {
            vm.step().unwrap();
        }

        assert_eq!(reg(&vm, 0xF), 1);
        assert_eq!(reg(&vm, 0), 0x01 | 0x02);
    }

    #[test]
    fn add_then_add_scenario() {
        // V0=10, V1=5, V0 += V1
        let mut vm = vm_with(&[0x60, 0x0A, 0x61, 0x05, 0x80, 0x14]);
        for _ in 0..3 {
            vm.step().unwrap();
        }

        assert_eq!(reg(&vm, 0), 15);
        assert_eq!(reg(&vm, 0xF), 0);
        assert_eq!(vm.registers().pc(), 0x206);
    }

    #[test]
    fn conditional_skips_advance_by_four() {
        let mut vm = vm_with(&[0x60, 0x05, 0x30, 0x05]);
        vm.step().unwrap();
        vm.step().unwrap();
        assert_eq!(vm.registers().pc(), 0x206);

        let mut vm = vm_with(&[0x60, 0x05, 0x30, 0x06]);
        vm.step().unwrap();
        vm.step().unwrap();
        assert_eq!(vm.registers().pc(), 0x204);
    }

    #[test]
    fn call_and_return_restore_the_counter() {
        // 0x200: call 0x206; 0x206: V0=1; 0x208: return
        let mut vm = vm_with(&[0x22, 0x06, 0x00, 0x00, 0x00, 0x00, 0x60, 0x01, 0x00, 0xEE]);
        vm.step().unwrap();
        assert_eq!(vm.registers().pc(), 0x206);
        assert_eq!(vm.registers().stack(), &[0x202]);

        vm.step().unwrap();
        vm.step().unwrap();
        assert_eq!(vm.registers().pc(), 0x202);
        assert!(vm.registers().stack().is_empty());
    }

    #[test]
    fn return_with_empty_stack_underflows() {
        let mut vm = vm_with(&[0x00, 0xE0, 0x00, 0xEE]);
        vm.step().unwrap();

        assert!(matches!(vm.step(), Err(VmError::StackUnderflow)));
        // The counter did not silently jump anywhere
        assert_eq!(vm.registers().pc(), 0x202);
    }

    #[test]
    fn seventeen_nested_calls_overflow_the_stack() {
        // Each instruction calls the next one
        let mut rom = Vec::new();
        for k in 1..=17u16 {
            let target = 0x200 + k * 2;
            rom.push(0x20 | (target >> 8) as u8);
            rom.push(target as u8);
        }

        let mut vm = vm_with(&rom);
        for _ in 0..16 {
            vm.step().unwrap();
        }
        assert!(matches!(vm.step(), Err(VmError::StackOverflow)));
    }

    #[test]
    fn jump_with_offset_adds_v0() {
        let mut vm = vm_with(&[0x60, 0x04, 0xB3, 0x00]);
        vm.step().unwrap();
        vm.step().unwrap();

        assert_eq!(vm.registers().pc(), 0x304);
    }

    #[test]
    fn random_is_masked_and_seed_deterministic() {
        // nn = 0x00 masks every random byte to zero
        let mut vm = vm_with(&[0x60, 0xFF, 0xC0, 0x00]);
        vm.step().unwrap();
        vm.step().unwrap();
        assert_eq!(reg(&vm, 0), 0);

        let run = |seed| {
            let mut vm = Vm::with_seed(seed);
            vm.load(&[0xC0, 0x0F]).unwrap();
            vm.step().unwrap();
            reg(&vm, 0)
        };
        assert_eq!(run(42), run(42));
        assert_eq!(run(42) & 0xF0, 0);
    }

    #[test]
    fn draw_twice_erases_and_collides_on_the_second_draw_only() {
        // I = glyph 0, draw 5 rows at (0, 0) twice
        let rom = [0x60, 0x00, 0xA0, 0x00, 0xD0, 0x05, 0xD0, 0x05];
        let mut vm = vm_with(&rom);
        for _ in 0..2 {
            vm.step().unwrap();
        }

        assert_eq!(vm.step().unwrap(), StepResult::WaitForNextFrame);
        assert_eq!(reg(&vm, 0xF), 0);
        assert!(vm.pixel(0, 0));

        vm.step().unwrap();
        assert_eq!(reg(&vm, 0xF), 1);
        for y in 0..DISPLAY_Y {
            for x in 0..DISPLAY_X {
                assert!(!vm.pixel(x, y));
            }
        }
    }

    #[test]
    fn clear_display_is_idempotent() {
        let rom = [0x60, 0x00, 0xA0, 0x00, 0xD0, 0x05, 0x00, 0xE0, 0x00, 0xE0];
        let mut vm = vm_with(&rom);
        for _ in 0..4 {
            vm.step().unwrap();
        }
        let after_once: Vec<bool> = (0..DISPLAY_X).map(|x| vm.pixel(x, 0)).collect();

        vm.step().unwrap();
        let after_twice: Vec<bool> = (0..DISPLAY_X).map(|x| vm.pixel(x, 0)).collect();

        assert_eq!(after_once, after_twice);
        assert!(after_once.iter().all(|&p| !p));
    }

    #[test]
    fn skip_if_pressed_consults_the_keypad() {
        let rom = [0x60, 0x05, 0xE0, 0x9E, 0x00, 0x00, 0xE0, 0xA1];
        let mut vm = vm_with(&rom);
        vm.set_key(u4::new(5), true);

        vm.step().unwrap();
        vm.step().unwrap();
        // Skipped over the padding word straight to ExA1
        assert_eq!(vm.registers().pc(), 0x206);

        // Key still held, so the not-pressed skip falls through
        vm.step().unwrap();
        assert_eq!(vm.registers().pc(), 0x208);
    }

    #[test]
    fn wait_key_retries_until_a_key_is_pressed() {
        let mut vm = vm_with(&[0xF0, 0x0A]);

        // No key: the same instruction stays scheduled
        assert_eq!(vm.step().unwrap(), StepResult::WaitForNextFrame);
        assert_eq!(vm.registers().pc(), 0x200);

        vm.set_key(u4::new(0x7), true);
        assert_eq!(vm.step().unwrap(), StepResult::Continue);
        assert_eq!(reg(&vm, 0), 0x7);
        assert_eq!(vm.registers().pc(), 0x202);
    }

    #[test]
    fn delay_timer_round_trip() {
        let mut vm = vm_with(&[0x60, 0x30, 0xF0, 0x15, 0xF1, 0x07]);
        for _ in 0..3 {
            vm.step().unwrap();
        }

        assert_eq!(vm.timers().delay(), 0x30);
        assert_eq!(reg(&vm, 1), 0x30);
    }

    #[test]
    fn sound_timer_gates_the_beep() {
        let mut vm = vm_with(&[0x60, 0x02, 0xF0, 0x18]);
        vm.step().unwrap();
        assert!(!vm.should_beep());

        vm.step().unwrap();
        assert!(vm.should_beep());

        vm.timers_tick();
        vm.timers_tick();
        assert!(!vm.should_beep());
    }

    #[test]
    fn glyph_addr_points_into_the_font_table() {
        let mut vm = vm_with(&[0x60, 0x0A, 0xF0, 0x29]);
        vm.step().unwrap();
        vm.step().unwrap();

        assert_eq!(vm.registers().index(), 10 * 5);
        // Glyph digits come from the low nibble of Vx
        let mut vm = vm_with(&[0x60, 0xFA, 0xF0, 0x29]);
        vm.step().unwrap();
        vm.step().unwrap();
        assert_eq!(vm.registers().index(), 10 * 5);
    }

    #[test]
    fn add_index_accumulates() {
        let mut vm = vm_with(&[0xA1, 0x00, 0x60, 0x05, 0xF0, 0x1E, 0xF0, 0x1E]);
        for _ in 0..4 {
            vm.step().unwrap();
        }

        assert_eq!(vm.registers().index(), 0x10A);
    }

    #[test]
    fn bcd_decomposes_into_three_digits() {
        let mut vm = vm_with(&[0x60, 234, 0xA3, 0x00, 0xF0, 0x33]);
        for _ in 0..3 {
            vm.step().unwrap();
        }

        assert_eq!(vm.memory().read(0x300).unwrap(), 2);
        assert_eq!(vm.memory().read(0x301).unwrap(), 3);
        assert_eq!(vm.memory().read(0x302).unwrap(), 4);
    }

    #[test]
    fn store_then_load_restores_registers_and_index() {
        let rom = [
            0x60, 10, 0x61, 20, 0x62, 30, // V0..V2
            0xA3, 0x00, // I = 0x300
            0xF2, 0x55, // store V0..=V2
            0x60, 0, 0x61, 0, 0x62, 0, // clobber
            0xF2, 0x65, // load V0..=V2
        ];
        let mut vm = vm_with(&rom);
        for _ in 0..9 {
            vm.step().unwrap();
        }

        assert_eq!(reg(&vm, 0), 10);
        assert_eq!(reg(&vm, 1), 20);
        assert_eq!(reg(&vm, 2), 30);
        // I is not consumed by the transfers
        assert_eq!(vm.registers().index(), 0x300);
    }

    #[test]
    fn store_regs_past_memory_end_is_out_of_bounds() {
        let mut vm = vm_with(&[0xAF, 0xFF, 0xF1, 0x55]);
        vm.step().unwrap();

        assert!(matches!(vm.step(), Err(VmError::OutOfBounds { .. })));
    }

    #[test]
    fn unknown_opcode_is_surfaced_not_ignored() {
        let mut vm = vm_with(&[0xFF, 0xFF]);

        assert!(matches!(
            vm.step(),
            Err(VmError::UnknownOpcode { opcode: 0xFFFF })
        ));
    }
}
