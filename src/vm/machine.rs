use rand::SeedableRng;
use rand::rngs::SmallRng;

use super::framebuffer::FrameBuffer;
use super::keypad::Keypad;
use super::memory::{MEMORY_SIZE, Memory, ROM_START_ADDRESS};
use super::opcode::Opcode;
use super::registers::RegisterFile;
use super::timers::Timers;
use super::types::{StepResult, VmError};
use crate::u4;

/// The virtual machine.
///
/// All machine state lives in the component fields; the interpreter itself
/// is a stateless orchestrator over them, apart from the random generator
/// which is seeded once at construction.
pub struct Vm {
    pub(crate) memory: Memory,
    pub(crate) registers: RegisterFile,
    pub(crate) framebuffer: FrameBuffer,
    pub(crate) keypad: Keypad,
    pub(crate) timers: Timers,
    pub(crate) rng: SmallRng,
}

impl Vm {
    pub fn new() -> Self {
        Self::from_rng(SmallRng::from_os_rng())
    }

    /// A machine with a deterministic random sequence, for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(SmallRng::seed_from_u64(seed))
    }

    fn from_rng(rng: SmallRng) -> Self {
        Vm {
            memory: Memory::new(),
            registers: RegisterFile::new(),
            framebuffer: FrameBuffer::new(),
            keypad: Keypad::new(),
            timers: Timers::new(),
            rng,
        }
    }

    /// Loads a program at the ROM start address and points the program
    /// counter at it. Programs that cannot fit are rejected, not truncated.
    pub fn load(&mut self, rom: &[u8]) -> Result<(), VmError> {
        let max_size = MEMORY_SIZE - ROM_START_ADDRESS;
        if rom.len() > max_size {
            return Err(VmError::RomTooLarge {
                size: rom.len(),
                max_size,
            });
        }

        self.memory.load_block(ROM_START_ADDRESS, rom)?;
        self.registers.set_pc(ROM_START_ADDRESS as u16);

        log::debug!("loaded {} byte program at {ROM_START_ADDRESS:#05X}", rom.len());
        Ok(())
    }

    /// Executes one instruction: fetch, decode, dispatch.
    pub fn step(&mut self) -> Result<StepResult, VmError> {
        let word = self.fetch()?;
        self.execute(Opcode::decode(word))
    }

    /// Applies one 60Hz timer tick.
    pub fn timers_tick(&mut self) {
        self.timers.tick();
    }

    /// Returns true while the sound timer gates a tone.
    pub fn should_beep(&self) -> bool {
        self.timers.should_beep()
    }

    /// Sets the state of a keypad key. Called by the host input collaborator.
    pub fn set_key(&mut self, key: u4, pressed: bool) {
        self.keypad.set(key, pressed);
    }

    /// State of a display pixel. Called by the host renderer.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.framebuffer.pixel(x, y)
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut RegisterFile {
        &mut self.registers
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    pub fn keypad(&self) -> &Keypad {
        &self.keypad
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    /// Reads the two instruction bytes at the program counter, big-endian.
    fn fetch(&self) -> Result<u16, VmError> {
        let pc = self.registers.pc();
        let high = self.memory.read(pc)?;
        let low = self.memory.read(pc.wrapping_add(1))?;

        Ok(u16::from_be_bytes([high, low]))
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}
