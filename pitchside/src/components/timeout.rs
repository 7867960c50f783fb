//! The break ("timeout") timer.
//!
//! A secondary counter, decoupled from the match clock, that shows how long
//! the current interruption has lasted. It resets and starts on its own
//! whenever the match enters a break phase, and the operator can drive it
//! manually at any time.

/// Longest configurable break, in minutes.
pub const TIMEOUT_MAX_MINUTES: u32 = 60;

/// Independent elapsed-seconds counter for breaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutTimer {
    /// Seconds elapsed since the break started.
    pub elapsed: u32,
    /// Operator-set target length of the break, in seconds.
    pub duration: u32,
    pub running: bool,
}

impl TimeoutTimer {
    /// Starts counting from zero.
    pub fn start(&mut self) {
        self.elapsed = 0;
        self.running = true;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Stops and clears the counter.
    pub fn reset(&mut self) {
        self.running = false;
        self.elapsed = 0;
    }

    /// Sets the target break length. Minutes and seconds are clamped to
    /// their valid input ranges rather than rejected.
    pub fn set_duration(&mut self, minutes: u32, seconds: u32) {
        let minutes = minutes.min(TIMEOUT_MAX_MINUTES);
        let seconds = seconds.min(59);
        self.duration = minutes * 60 + seconds;
    }

    /// Advances the counter by one second if running; returns the new value.
    pub fn advance(&mut self) -> u32 {
        if self.running {
            self.elapsed += 1;
        }
        self.elapsed
    }
}

impl Default for TimeoutTimer {
    fn default() -> Self {
        Self {
            elapsed: 0,
            duration: 60,
            running: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_only_while_running() {
        let mut timer = TimeoutTimer::default();
        assert_eq!(timer.advance(), 0);

        timer.start();
        assert_eq!(timer.advance(), 1);
        assert_eq!(timer.advance(), 2);

        timer.pause();
        assert_eq!(timer.advance(), 2);
    }

    #[test]
    fn start_always_counts_from_zero() {
        let mut timer = TimeoutTimer::default();
        timer.start();
        timer.advance();
        timer.advance();
        timer.start();
        assert_eq!(timer.elapsed, 0);
        assert!(timer.running);
    }

    #[test]
    fn duration_input_is_clamped() {
        let mut timer = TimeoutTimer::default();
        timer.set_duration(90, 75);
        assert_eq!(timer.duration, TIMEOUT_MAX_MINUTES * 60 + 59);
        timer.set_duration(15, 0);
        assert_eq!(timer.duration, 900);
    }

    #[test]
    fn reset_clears_and_stops() {
        let mut timer = TimeoutTimer::default();
        timer.start();
        timer.advance();
        timer.reset();
        assert_eq!(timer.elapsed, 0);
        assert!(!timer.running);
    }
}
