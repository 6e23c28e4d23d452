//! Completion reporting for long-running operators
//!
//! Purely informational: operators call [`Progress::report`] after each
//! channel they finish and never read anything back.

pub trait Progress {
    /// Percentage of the invocation completed so far (0..=100)
    fn report(&mut self, percent: u8);
}

impl<F: FnMut(u8)> Progress for F {
    fn report(&mut self, percent: u8) {
        self(percent)
    }
}

/// Discards every report
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn report(&mut self, _percent: u8) {}
}

/// Evenly spaced percentages for `total` units of work
#[derive(Debug, Clone)]
pub struct ProgressSteps {
    total: usize,
    done: usize,
}

impl ProgressSteps {
    pub fn new(total: usize) -> Self {
        Self {
            total: total.max(1),
            done: 0,
        }
    }

    /// Mark one unit finished and report the truncated percentage
    pub fn advance(&mut self, progress: &mut dyn Progress) {
        self.done = (self.done + 1).min(self.total);
        progress.report((self.done * 100 / self.total) as u8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_reach_one_hundred() {
        let mut seen = Vec::new();
        let mut sink = |p: u8| seen.push(p);
        let mut steps = ProgressSteps::new(3);
        for _ in 0..3 {
            steps.advance(&mut sink);
        }
        assert_eq!(seen, vec![33, 66, 100]);
    }

    #[test]
    fn test_no_progress_is_silent() {
        let mut steps = ProgressSteps::new(0);
        steps.advance(&mut NoProgress);
    }
}
