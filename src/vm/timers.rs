/// Delay and sound countdown timers.
///
/// Both decrement toward zero once per tick; the host applies ticks at 60Hz
/// independently of the instruction rate.
pub struct Timers {
    delay: u8,
    sound: u8,
}

impl Timers {
    pub fn new() -> Self {
        Timers { delay: 0, sound: 0 }
    }

    pub fn tick(&mut self) {
        self.delay = self.delay.saturating_sub(1);
        self.sound = self.sound.saturating_sub(1);
    }

    pub fn delay(&self) -> u8 {
        self.delay
    }

    pub fn set_delay(&mut self, value: u8) {
        self.delay = value;
    }

    pub fn sound(&self) -> u8 {
        self.sound
    }

    pub fn set_sound(&mut self, value: u8) {
        self.sound = value;
    }

    /// A tone should play while the sound timer is non-zero.
    pub fn should_beep(&self) -> bool {
        self.sound > 0
    }
}

impl Default for Timers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_decrements_and_saturates_at_zero() {
        let mut timers = Timers::new();
        timers.set_delay(2);
        timers.set_sound(1);

        timers.tick();
        assert_eq!(timers.delay(), 1);
        assert_eq!(timers.sound(), 0);

        timers.tick();
        timers.tick();
        assert_eq!(timers.delay(), 0);
        assert_eq!(timers.sound(), 0);
    }

    #[test]
    fn beeps_only_while_sound_timer_runs() {
        let mut timers = Timers::new();
        assert!(!timers.should_beep());

        timers.set_sound(1);
        assert!(timers.should_beep());

        timers.tick();
        assert!(!timers.should_beep());
    }
}
