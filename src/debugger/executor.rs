use std::collections::HashSet;

use super::commands::{BreakpointAction, Command, CommandError, CommandResult, SetTarget};
use crate::vm::{
    FrameBuffer, MEMORY_SIZE, NUM_KEYS, Opcode, Runner, RunnerResult, VmError,
};

/// Applies debugger commands to a paused or running machine.
pub struct Executor {
    is_running: bool,
    runner: Runner,
    breakpoints: HashSet<u16>,
}

impl Executor {
    pub fn new(runner: Runner) -> Self {
        Self {
            is_running: false,
            runner,
            breakpoints: HashSet::new(),
        }
    }

    /// Advances execution while the debugger is in running mode.
    pub fn poll(&mut self, dt: f32) -> Result<RunnerResult, VmError> {
        if !self.is_running {
            return Ok(RunnerResult::Ok);
        }

        let result = self
            .runner
            .update_with_breakpoints(dt, Some(&self.breakpoints));

        if matches!(result, Err(_) | Ok(RunnerResult::HitBreakpoint)) {
            self.is_running = false;
        }

        result
    }

    pub fn execute(&mut self, command: Command) -> Result<CommandResult, CommandError> {
        match command {
            Command::Run => {
                self.run();
                Ok(CommandResult::Ok)
            }
            Command::Pause => {
                self.pause();
                Ok(CommandResult::Ok)
            }
            Command::Step => self.step(),
            Command::Breakpoint { action } => self.handle_breakpoint(action),
            Command::Set { target, value } => self.handle_set(target, value),
            Command::Mem { start, len } => self.handle_mem(start, len),
            Command::Disasm { start, count } => self.handle_disasm(start, count),
            Command::Quit => Ok(CommandResult::Quit),
        }
    }

    pub fn run(&mut self) {
        self.is_running = true;
    }

    pub fn pause(&mut self) {
        self.is_running = false;
    }

    pub fn step(&mut self) -> Result<CommandResult, CommandError> {
        self.runner.vm_mut().step()?;
        Ok(CommandResult::Ok)
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        self.runner.vm_ref().framebuffer()
    }

    pub fn pc(&self) -> u16 {
        self.runner.vm_ref().registers().pc()
    }

    pub fn index(&self) -> u16 {
        self.runner.vm_ref().registers().index()
    }

    pub fn v(&self) -> &[u8; 16] {
        self.runner.vm_ref().registers().v()
    }

    pub fn stack(&self) -> &[u16] {
        self.runner.vm_ref().registers().stack()
    }

    pub fn delay_timer(&self) -> u8 {
        self.runner.vm_ref().timers().delay()
    }

    pub fn sound_timer(&self) -> u8 {
        self.runner.vm_ref().timers().sound()
    }

    pub fn keypad(&self) -> &[bool; NUM_KEYS] {
        self.runner.vm_ref().keypad().keys()
    }

    pub fn runner_mut(&mut self) -> &mut Runner {
        &mut self.runner
    }

    fn handle_breakpoint(
        &mut self,
        action: BreakpointAction,
    ) -> Result<CommandResult, CommandError> {
        match action {
            BreakpointAction::Set { addr } => {
                self.breakpoints.insert(addr);
            }
            BreakpointAction::Clear { addr } => {
                self.breakpoints.remove(&addr);
            }
            BreakpointAction::ClearAll => {
                self.breakpoints.clear();
            }
            BreakpointAction::List => {
                let mut breakpoints: Vec<u16> = self.breakpoints.iter().copied().collect();
                breakpoints.sort();
                return Ok(CommandResult::Breakpoints(breakpoints));
            }
        };

        Ok(CommandResult::Ok)
    }

    fn handle_set(&mut self, target: SetTarget, value: u16) -> Result<CommandResult, CommandError> {
        let registers = self.runner.vm_mut().registers_mut();

        match target {
            SetTarget::V(index) => {
                let value = u8::try_from(value).map_err(|_| CommandError::ValueOutOfRange)?;
                registers.set_checked(index, value)?;
            }
            SetTarget::I => {
                registers.set_index(value);
            }
            SetTarget::Pc => {
                registers.set_pc(value);
            }
        }

        Ok(CommandResult::Ok)
    }

    fn handle_mem(&self, start: u16, len: u16) -> Result<CommandResult, CommandError> {
        let start = (start as usize).min(MEMORY_SIZE - 1);
        let len = (len as usize).min(MEMORY_SIZE - start);

        let data = self
            .runner
            .vm_ref()
            .memory()
            .span(start as u16, len)
            .map(<[u8]>::to_vec)?;

        Ok(CommandResult::MemDump {
            data,
            offset: start as u16,
        })
    }

    fn handle_disasm(&self, start: u16, count: u16) -> Result<CommandResult, CommandError> {
        let memory = self.runner.vm_ref().memory();

        let mut instructions = Vec::new();
        for k in 0..count {
            let addr = start.wrapping_add(k * 2);
            let Ok(bytes) = memory.span(addr, 2) else {
                break;
            };
            let word = u16::from_be_bytes([bytes[0], bytes[1]]);
            instructions.push((word, Opcode::decode(word)));
        }

        Ok(CommandResult::Disasm {
            instructions,
            offset: start,
        })
    }
}
