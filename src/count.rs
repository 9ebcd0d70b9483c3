//! Zone classification and the running tally.
//!
//! Each surviving detection of the target class is classified by its
//! vertical position relative to the zone boundary line: top edge
//! strictly above the line is an entry, anything else an exit. The
//! rule is stateless per detection and counts detections, not unique
//! people; a person visible for N frames contributes N counts.

use crate::detect::decode::Detection;

/// Which side of the zone boundary a detection landed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Crossing {
    Enter,
    Exit,
}

/// Cumulative entry/exit counters. The only state that survives
/// across frames; owned by the pipeline driver and passed `&mut` into
/// the counter, never ambient.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunningTally {
    pub entered: u64,
    pub exited: u64,
}

impl RunningTally {
    pub fn record(&mut self, crossing: Crossing) {
        match crossing {
            Crossing::Enter => self.entered += 1,
            Crossing::Exit => self.exited += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.entered + self.exited
    }
}

/// Classifies target-class detections against a horizontal boundary.
#[derive(Clone, Copy, Debug)]
pub struct ZoneCounter {
    /// Class id that participates in counting (resolved from the
    /// label vocabulary at startup).
    target_class: usize,
    /// Boundary line as a fraction of frame height.
    boundary_fraction: f32,
}

impl ZoneCounter {
    pub fn new(target_class: usize, boundary_fraction: f32) -> Self {
        Self {
            target_class,
            boundary_fraction,
        }
    }

    pub fn target_class(&self) -> usize {
        self.target_class
    }

    /// Classify one detection. Top edge strictly above the boundary
    /// line is an entry; on or below is an exit.
    pub fn classify(&self, detection: &Detection, frame_height: u32) -> Crossing {
        if detection.y < frame_height as f32 * self.boundary_fraction {
            Crossing::Enter
        } else {
            Crossing::Exit
        }
    }

    /// Count every surviving target-class detection of one frame into
    /// the tally. Non-target classes are ignored.
    pub fn count_frame(
        &self,
        survivors: &[&Detection],
        frame_height: u32,
        tally: &mut RunningTally,
    ) {
        for detection in survivors {
            if detection.class_id != self.target_class {
                continue;
            }
            tally.record(self.classify(detection, frame_height));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(y: f32) -> Detection {
        Detection {
            x: 10.0,
            y,
            w: 20.0,
            h: 40.0,
            class_id: 0,
            confidence: 0.9,
        }
    }

    #[test]
    fn top_half_enters_bottom_half_exits() {
        let counter = ZoneCounter::new(0, 0.5);
        let mut tally = RunningTally::default();
        let top = person(0.0);
        let bottom = person(150.0);
        counter.count_frame(&[&top, &bottom], 200, &mut tally);
        assert_eq!(tally.entered, 1);
        assert_eq!(tally.exited, 1);
    }

    #[test]
    fn boundary_line_itself_is_an_exit() {
        let counter = ZoneCounter::new(0, 0.5);
        assert_eq!(counter.classify(&person(100.0), 200), Crossing::Exit);
        assert_eq!(counter.classify(&person(99.9), 200), Crossing::Enter);
    }

    #[test]
    fn non_target_classes_are_ignored() {
        let counter = ZoneCounter::new(0, 0.5);
        let mut tally = RunningTally::default();
        let mut dog = person(10.0);
        dog.class_id = 16;
        counter.count_frame(&[&dog], 200, &mut tally);
        assert_eq!(tally, RunningTally::default());
    }

    #[test]
    fn every_target_detection_lands_in_exactly_one_counter() {
        let counter = ZoneCounter::new(0, 0.5);
        let mut tally = RunningTally::default();
        let dets: Vec<Detection> = (0..10).map(|i| person(i as f32 * 20.0)).collect();
        let refs: Vec<&Detection> = dets.iter().collect();
        counter.count_frame(&refs, 200, &mut tally);
        assert_eq!(tally.total(), 10);
    }

    #[test]
    fn custom_boundary_fraction() {
        let counter = ZoneCounter::new(0, 0.25);
        assert_eq!(counter.classify(&person(40.0), 200), Crossing::Enter);
        assert_eq!(counter.classify(&person(60.0), 200), Crossing::Exit);
    }
}
