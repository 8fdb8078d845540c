use std::ops::AddAssign;

use serde_derive::*;

/// Counters for a run. Summed per frame with `+=`.
#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub images: usize,
    pub unavailable: usize,
    pub boxes: usize,
    pub reliable: usize,
    pub calibrated_images: usize,
    pub estimates: usize,
    pub elevated: usize,
}

impl AddAssign<&RunStats> for RunStats {
    fn add_assign(&mut self, other: &RunStats) {
        self.images += other.images;
        self.unavailable += other.unavailable;
        self.boxes += other.boxes;
        self.reliable += other.reliable;
        self.calibrated_images += other.calibrated_images;
        self.estimates += other.estimates;
        self.elevated += other.elevated;
    }
}

impl AddAssign for RunStats {
    fn add_assign(&mut self, other: RunStats) {
        *self += &other;
    }
}
