use std::collections::HashSet;

use super::machine::Vm;
use super::types::{StepResult, VmError};
use crate::u4;

pub const CPU_HZ: f32 = 700.0;
pub const TIMER_HZ: f32 = 60.0;

const CPU_TIME_STEP: f32 = 1.0 / CPU_HZ;
const TIMER_TIME_STEP: f32 = 1.0 / TIMER_HZ;

/// Drives the machine from wall-clock time.
///
/// Accumulates elapsed time and converts it into timer ticks and CPU steps,
/// so a single host-loop iteration may run zero, one or many of either.
pub struct Runner {
    vm: Vm,
    cpu_accumulator: f32,
    timer_accumulator: f32,
}

pub enum RunnerResult {
    Ok,
    HitBreakpoint,
}

impl Runner {
    pub fn new(vm: Vm) -> Self {
        Self {
            vm,
            cpu_accumulator: 0.0,
            timer_accumulator: 0.0,
        }
    }

    /// Advances the machine by `dt` seconds of wall-clock time.
    ///
    /// Stops early at a frame boundary (a draw, or a blocked key wait) and
    /// drops the leftover CPU budget to avoid a catch-up burst on the next
    /// frame.
    pub fn update(&mut self, dt: f32) -> Result<RunnerResult, VmError> {
        self.update_with_breakpoints(dt, None)
    }

    /// Like `update`, but pauses when the program counter lands on a
    /// breakpoint. Used by the debugger.
    pub fn update_with_breakpoints(
        &mut self,
        dt: f32,
        breakpoints: Option<&HashSet<u16>>,
    ) -> Result<RunnerResult, VmError> {
        self.cpu_accumulator += dt;
        self.timer_accumulator += dt;

        while self.timer_accumulator >= TIMER_TIME_STEP {
            self.timer_accumulator -= TIMER_TIME_STEP;
            self.vm.timers_tick();
        }

        while self.cpu_accumulator >= CPU_TIME_STEP {
            self.cpu_accumulator -= CPU_TIME_STEP;

            let step_result = self.vm.step()?;

            if let Some(breakpoints) = breakpoints
                && breakpoints.contains(&self.vm.registers().pc())
            {
                self.cpu_accumulator = 0.0;
                return Ok(RunnerResult::HitBreakpoint);
            }

            if step_result == StepResult::WaitForNextFrame {
                self.cpu_accumulator = 0.0;
                break;
            }
        }

        Ok(RunnerResult::Ok)
    }

    pub fn should_beep(&self) -> bool {
        self.vm.should_beep()
    }

    pub fn set_key(&mut self, key: u4, pressed: bool) {
        self.vm.set_key(key, pressed)
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.vm.pixel(x, y)
    }

    pub fn vm_ref(&self) -> &Vm {
        &self.vm
    }

    pub fn vm_mut(&mut self) -> &mut Vm {
        &mut self.vm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner_with(rom: &[u8]) -> Runner {
        let mut vm = Vm::with_seed(0);
        vm.load(rom).unwrap();
        Runner::new(vm)
    }

    #[test]
    fn update_converts_time_into_cpu_steps() {
        // V0 += 1, jump back: V0 counts executed loop iterations
        let mut runner = runner_with(&[0x70, 0x01, 0x12, 0x00]);

        // Less than one CPU period: nothing runs
        runner.update(CPU_TIME_STEP / 2.0).unwrap();
        assert_eq!(runner.vm_ref().registers().get(crate::u4::new(0)), 0);

        // Ten periods (plus the leftover half) run ten steps, five increments
        runner.update(CPU_TIME_STEP * 10.0).unwrap();
        assert_eq!(runner.vm_ref().registers().get(crate::u4::new(0)), 5);
    }

    #[test]
    fn timers_run_at_sixty_hertz() {
        // V0=60, sound timer = V0, then loop in place
        let mut runner = runner_with(&[0x60, 0x3C, 0xF0, 0x18, 0x12, 0x04]);

        runner.update(1.0).unwrap();
        assert!(runner.should_beep());

        // One more second of ticks drains the timer
        runner.update(1.0).unwrap();
        assert!(!runner.should_beep());
    }

    #[test]
    fn stops_on_breakpoints() {
        let mut runner = runner_with(&[0x60, 0x01, 0x61, 0x02, 0x12, 0x04]);
        let breakpoints = HashSet::from([0x204u16]);

        let result = runner
            .update_with_breakpoints(1.0, Some(&breakpoints))
            .unwrap();

        assert!(matches!(result, RunnerResult::HitBreakpoint));
        assert_eq!(runner.vm_ref().registers().pc(), 0x204);
        assert_eq!(runner.vm_ref().registers().get(crate::u4::new(1)), 2);
    }
}
