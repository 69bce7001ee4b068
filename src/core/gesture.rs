use crate::models::{GestureState, Offset, SwipeDirection};

/// Geometry of the swipe surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureConfig {
    pub viewport_width: f64,
    /// Fraction of the viewport width a release must exceed to commit
    pub commit_threshold_ratio: f64,
    /// Rotation magnitude reached at half the viewport width
    pub max_rotation_deg: f64,
}

impl GestureConfig {
    /// Horizontal distance a release must strictly exceed to commit
    pub fn commit_threshold(&self) -> f64 {
        self.viewport_width * self.commit_threshold_ratio
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            viewport_width: 390.0,
            commit_threshold_ratio: 0.25,
            max_rotation_deg: 10.0,
        }
    }
}

/// Classification of a pointer release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Commit(SwipeDirection),
    Cancel,
}

/// Classify a release by its horizontal offset.
///
/// `|x| == threshold` does not commit.
#[inline]
pub fn classify_release(offset_x: f64, threshold: f64) -> ReleaseOutcome {
    if offset_x > threshold {
        ReleaseOutcome::Commit(SwipeDirection::Like)
    } else if offset_x < -threshold {
        ReleaseOutcome::Commit(SwipeDirection::Skip)
    } else {
        ReleaseOutcome::Cancel
    }
}

/// Turns a drag stream into an accumulated offset and a release outcome
///
/// The tracker never emits decisions. It only moves between gesture states;
/// the controller hands the outcome to the animator and calls [`settle`]
/// once the animation has finished.
///
/// [`settle`]: GestureTracker::settle
#[derive(Debug, Clone)]
pub struct GestureTracker {
    threshold: f64,
    state: GestureState,
    candidate_id: Option<String>,
}

impl GestureTracker {
    pub fn new(config: &GestureConfig) -> Self {
        Self {
            threshold: config.commit_threshold(),
            state: GestureState::Idle,
            candidate_id: None,
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Candidate the current interaction is addressed to
    pub fn candidate_id(&self) -> Option<&str> {
        self.candidate_id.as_deref()
    }

    /// Accumulated drag offset, zero outside of `Dragging`
    pub fn offset(&self) -> Offset {
        match self.state {
            GestureState::Dragging(offset) => offset,
            _ => Offset::ZERO,
        }
    }

    /// Start a drag on `candidate_id`. Only accepted from `Idle`.
    pub fn begin(&mut self, candidate_id: &str) -> bool {
        if !self.state.is_idle() {
            tracing::trace!("Drag start ignored in state {:?}", self.state);
            return false;
        }
        self.candidate_id = Some(candidate_id.to_string());
        self.state = GestureState::Dragging(Offset::ZERO);
        true
    }

    /// Accumulate a move delta. Moves outside `Dragging`, or addressed to
    /// another candidate, are discarded.
    pub fn drag(&mut self, candidate_id: &str, delta: Offset) -> Option<Offset> {
        if self.candidate_id.as_deref() != Some(candidate_id) {
            return None;
        }
        match self.state {
            GestureState::Dragging(offset) => {
                let next = offset + delta;
                self.state = GestureState::Dragging(next);
                Some(next)
            }
            _ => None,
        }
    }

    /// Classify the release and move to `Committing` or `Resetting`
    pub fn release(&mut self, candidate_id: &str) -> Option<(ReleaseOutcome, Offset)> {
        if self.candidate_id.as_deref() != Some(candidate_id) {
            return None;
        }
        let GestureState::Dragging(offset) = self.state else {
            return None;
        };

        let outcome = classify_release(offset.x, self.threshold);
        self.state = match outcome {
            ReleaseOutcome::Commit(direction) => GestureState::Committing(direction),
            ReleaseOutcome::Cancel => GestureState::Resetting,
        };
        tracing::debug!("Released at x={:.1} (threshold {:.1}): {:?}", offset.x, self.threshold, outcome);
        Some((outcome, offset))
    }

    /// Enter `Committing` without pointer input. Accepted from `Idle` or
    /// `Dragging`; returns the offset the exit starts from.
    pub fn force_commit(&mut self, candidate_id: &str, direction: SwipeDirection) -> Option<Offset> {
        let from = match self.state {
            GestureState::Idle => Offset::ZERO,
            GestureState::Dragging(offset) if self.candidate_id.as_deref() == Some(candidate_id) => offset,
            _ => return None,
        };
        self.candidate_id = Some(candidate_id.to_string());
        self.state = GestureState::Committing(direction);
        Some(from)
    }

    /// Animation finished: back to `Idle`
    pub fn settle(&mut self) {
        if matches!(self.state, GestureState::Committing(_) | GestureState::Resetting) {
            self.state = GestureState::Idle;
            self.candidate_id = None;
        }
    }

    /// Unconditional return to `Idle`, used when the displayed candidate changes
    pub fn reset(&mut self) {
        self.state = GestureState::Idle;
        self.candidate_id = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> GestureTracker {
        GestureTracker::new(&GestureConfig {
            viewport_width: 400.0,
            ..GestureConfig::default()
        })
    }

    #[test]
    fn test_threshold_boundary_does_not_commit() {
        assert_eq!(classify_release(100.0, 100.0), ReleaseOutcome::Cancel);
        assert_eq!(classify_release(-100.0, 100.0), ReleaseOutcome::Cancel);
        assert_eq!(
            classify_release(100.0 + 1e-9, 100.0),
            ReleaseOutcome::Commit(SwipeDirection::Like)
        );
        assert_eq!(
            classify_release(-100.0 - 1e-9, 100.0),
            ReleaseOutcome::Commit(SwipeDirection::Skip)
        );
    }

    #[test]
    fn test_drag_accumulates_and_commits_right() {
        let mut t = tracker();
        assert_eq!(t.threshold(), 100.0);
        assert!(t.begin("a"));
        t.drag("a", Offset::new(60.0, 5.0));
        t.drag("a", Offset::new(50.0, -20.0));
        assert_eq!(t.offset(), Offset::new(110.0, -15.0));

        let (outcome, at) = t.release("a").unwrap();
        assert_eq!(outcome, ReleaseOutcome::Commit(SwipeDirection::Like));
        assert_eq!(at.x, 110.0);
        assert_eq!(t.state(), GestureState::Committing(SwipeDirection::Like));
    }

    #[test]
    fn test_vertical_offset_is_ignored() {
        let mut t = tracker();
        t.begin("a");
        t.drag("a", Offset::new(10.0, 900.0));
        let (outcome, _) = t.release("a").unwrap();
        assert_eq!(outcome, ReleaseOutcome::Cancel);
        assert_eq!(t.state(), GestureState::Resetting);
    }

    #[test]
    fn test_moves_outside_dragging_are_discarded() {
        let mut t = tracker();
        assert!(t.drag("a", Offset::new(10.0, 0.0)).is_none());
        t.begin("a");
        assert!(t.drag("b", Offset::new(10.0, 0.0)).is_none());
        t.drag("a", Offset::new(-150.0, 0.0));
        t.release("a");
        assert!(t.drag("a", Offset::new(10.0, 0.0)).is_none());
        assert_eq!(t.state(), GestureState::Committing(SwipeDirection::Skip));
    }

    #[test]
    fn test_no_reentry_until_settled() {
        let mut t = tracker();
        t.begin("a");
        t.release("a");
        assert!(!t.begin("a"));
        assert!(t.force_commit("a", SwipeDirection::Like).is_none());
        t.settle();
        assert!(t.state().is_idle());
        assert!(t.begin("a"));
    }

    #[test]
    fn test_force_commit_from_drag_keeps_offset() {
        let mut t = tracker();
        t.begin("a");
        t.drag("a", Offset::new(30.0, 4.0));
        let from = t.force_commit("a", SwipeDirection::Skip).unwrap();
        assert_eq!(from, Offset::new(30.0, 4.0));
        assert_eq!(t.state(), GestureState::Committing(SwipeDirection::Skip));
    }
}
