/// Counts simulation steps and decides when a periodic snapshot is due.
#[derive(Debug, Clone)]
pub struct StepScheduler {
    cadence: u64,
    steps: u64,
    snapshots: u64,
}

impl StepScheduler {
    /// `cadence` is clamped to at least one step.
    pub fn new(cadence: u64) -> Self {
        Self {
            cadence: cadence.max(1),
            steps: 0,
            snapshots: 0,
        }
    }

    /// Record one step; true when this step completes a cadence interval.
    pub fn advance(&mut self) -> bool {
        self.steps += 1;
        let due = self.steps % self.cadence == 0;
        if due {
            self.snapshots += 1;
        }
        due
    }

    pub fn cadence(&self) -> u64 {
        self.cadence
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn snapshots_due(&self) -> u64 {
        self.snapshots
    }

    /// Steps remaining until the next snapshot.
    pub fn until_next(&self) -> u64 {
        self.cadence - self.steps % self.cadence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_floor_n_over_cadence_times() {
        for steps in [0u64, 59, 60, 61, 119, 120, 1000] {
            let mut scheduler = StepScheduler::new(60);
            let fired = (0..steps).filter(|_| scheduler.advance()).count() as u64;
            assert_eq!(fired, steps / 60, "after {steps} steps");
            assert_eq!(scheduler.snapshots_due(), steps / 60);
        }
    }

    #[test]
    fn first_emission_is_on_the_cadence_step() {
        let mut scheduler = StepScheduler::new(3);
        assert_eq!(scheduler.until_next(), 3);
        assert!(!scheduler.advance());
        assert!(!scheduler.advance());
        assert!(scheduler.advance());
        assert_eq!(scheduler.until_next(), 3);
    }

    #[test]
    fn zero_cadence_fires_every_step() {
        let mut scheduler = StepScheduler::new(0);
        assert_eq!(scheduler.cadence(), 1);
        assert!(scheduler.advance());
        assert!(scheduler.advance());
    }
}
