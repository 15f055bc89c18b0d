use super::memory::ROM_START_ADDRESS;
use super::types::VmError;
use crate::u4;

pub const NUM_REGISTERS: usize = 16;

/// Maximum subroutine nesting depth.
pub const STACK_DEPTH: usize = 16;

/// General-purpose registers V0-VF, the index register, the program counter
/// and the bounded call stack.
///
/// The counter is only ever moved through `advance`, `skip` and `set_pc`, so
/// the interpreter cannot accidentally double-advance it.
pub struct RegisterFile {
    v: [u8; NUM_REGISTERS],
    i: u16,
    pc: u16,
    stack: Vec<u16>,
}

impl RegisterFile {
    pub fn new() -> Self {
        RegisterFile {
            v: [0; NUM_REGISTERS],
            i: 0,
            pc: ROM_START_ADDRESS as u16,
            stack: Vec::with_capacity(STACK_DEPTH),
        }
    }

    pub fn get(&self, index: u4) -> u8 {
        self.v[index]
    }

    pub fn set(&mut self, index: u4, value: u8) {
        self.v[index] = value;
    }

    /// Reads a register through an untyped index, as used by the debugger.
    pub fn get_checked(&self, index: u8) -> Result<u8, VmError> {
        self.v
            .get(index as usize)
            .copied()
            .ok_or(VmError::InvalidRegister { index })
    }

    /// Writes a register through an untyped index, as used by the debugger.
    pub fn set_checked(&mut self, index: u8, value: u8) -> Result<(), VmError> {
        *self
            .v
            .get_mut(index as usize)
            .ok_or(VmError::InvalidRegister { index })? = value;
        Ok(())
    }

    /// Sets VF. Flag-producing opcodes write VF last, so the flag survives
    /// even when the destination register is VF itself.
    pub fn set_flag(&mut self, value: u8) {
        self.v[0xF] = value;
    }

    pub fn v(&self) -> &[u8; NUM_REGISTERS] {
        &self.v
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    /// Jumps to an absolute address.
    pub fn set_pc(&mut self, address: u16) {
        self.pc = address;
    }

    /// Moves past the current instruction.
    pub fn advance(&mut self) {
        self.pc = self.pc.wrapping_add(2);
    }

    /// Moves past the current instruction and the one after it.
    pub fn skip(&mut self) {
        self.pc = self.pc.wrapping_add(4);
    }

    pub fn index(&self) -> u16 {
        self.i
    }

    pub fn set_index(&mut self, value: u16) {
        self.i = value;
    }

    pub fn push(&mut self, address: u16) -> Result<(), VmError> {
        if self.stack.len() == STACK_DEPTH {
            return Err(VmError::StackOverflow);
        }
        self.stack.push(address);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<u16, VmError> {
        self.stack.pop().ok_or(VmError::StackUnderflow)
    }

    pub fn stack(&self) -> &[u16] {
        &self.stack
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}
