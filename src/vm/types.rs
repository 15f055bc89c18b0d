/// Result of a single interpreter step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// Continue executing instructions in the current frame.
    Continue,
    /// Wait for the next frame before continuing
    /// (after a draw, or while blocked on a keypad press).
    WaitForNextFrame,
}

/// Faults raised by the virtual machine.
///
/// All of these indicate a defect in the loaded program (or the VM itself)
/// and are fatal: execution must halt, never continue with corrupted state.
#[derive(Debug, thiserror::Error)]
pub enum VmError {
    #[error("program is too large ({size} bytes), max size is {max_size} bytes")]
    RomTooLarge { size: usize, max_size: usize },

    #[error("memory access out of bounds at address {address:#06X}")]
    OutOfBounds { address: u16 },

    #[error("invalid register index {index:#04X}")]
    InvalidRegister { index: u8 },

    #[error("call stack overflow: subroutine nesting exceeds 16 levels")]
    StackOverflow,

    #[error("stack underflow: attempted to return with an empty call stack")]
    StackUnderflow,

    #[error("unknown opcode {opcode:#06X}")]
    UnknownOpcode { opcode: u16 },
}
