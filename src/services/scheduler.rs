/// Tick counter deciding which control-loop ticks poll the sensor.
///
/// The counter is bumped on every tick and wraps at `cycle_length`; the tick
/// that brings it to `cycle_length - 1` is the due one. There is no catch-up:
/// a due tick that finds nothing to read is simply lost.
#[derive(Debug, Clone)]
pub struct PollScheduler {
    counter: u32,
    cycle_length: u32,
}

impl PollScheduler {
    pub fn new(cycle_length: u32) -> Self {
        Self {
            counter: 0,
            cycle_length: cycle_length.max(1),
        }
    }

    /// Advances one tick and reports whether this tick is due.
    pub fn tick(&mut self) -> bool {
        self.counter += 1;
        // Modulo keeps a one-tick cycle due every tick (counter reaches 1 there).
        let due = self.counter % self.cycle_length == self.cycle_length - 1;
        if self.counter >= self.cycle_length {
            self.counter = 0;
        }
        due
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn cycle_length(&self) -> u32 {
        self.cycle_length
    }
}

impl Default for PollScheduler {
    fn default() -> Self {
        Self::new(10)
    }
}
