use tokio::time::Instant;

use crate::core::animator::{
    exit_target, rotation_for, AnimationConfig, AnimationKind, AnimationTicket, SwipeAnimator,
};
use crate::core::gesture::{GestureConfig, GestureTracker, ReleaseOutcome};
use crate::core::lifecycle::MountGuard;
use crate::core::lock::{Acquire, LockToken, TimedLock};
use crate::models::{Candidate, GestureState, Offset, SwipeDecision, SwipeDirection};

/// What a committed swipe means for the deck
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckMode {
    /// Like/Skip browsing; the index wraps around the deck
    Swipe,
    /// Favorites screen; a commit in either direction removes the card
    FavoriteRemoval,
}

/// Raw pointer input addressed to the current card
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down,
    Move(Offset),
    Up,
}

/// Result of an animation settling
#[derive(Debug, Clone, PartialEq)]
pub enum Settled {
    Decided {
        decision: SwipeDecision,
        next: Option<Candidate>,
    },
    Removed {
        candidate_id: String,
        next: Option<Candidate>,
    },
    Reset,
}

/// Owns the current-card pointer and turns gestures and button presses into
/// one stream of settled outcomes
///
/// All entry points take the current instant so lock expiry and animation
/// progress can be driven by any clock. Input arriving while a commit or
/// reset is in flight is dropped, as is anything arriving after teardown.
#[derive(Debug)]
pub struct SwipeController {
    mode: DeckMode,
    gesture: GestureConfig,
    animation: AnimationConfig,
    candidates: Vec<Candidate>,
    current_index: usize,
    tracker: GestureTracker,
    animator: SwipeAnimator,
    lock: TimedLock,
    held: Option<LockToken>,
    guard: MountGuard,
    sequence: u64,
}

impl SwipeController {
    pub fn new(mode: DeckMode, gesture: GestureConfig, animation: AnimationConfig) -> Self {
        let lock_timeout = animation.effective_lock_timeout();
        if lock_timeout != animation.lock_timeout {
            tracing::warn!(
                "Lock timeout {:?} is shorter than the animations, using {:?}",
                animation.lock_timeout,
                lock_timeout
            );
        }
        Self {
            mode,
            tracker: GestureTracker::new(&gesture),
            animator: SwipeAnimator::new(),
            lock: TimedLock::new(lock_timeout),
            gesture,
            animation,
            candidates: Vec::new(),
            current_index: 0,
            held: None,
            guard: MountGuard::detached(),
            sequence: 0,
        }
    }

    pub fn mode(&self) -> DeckMode {
        self.mode
    }

    /// Switch deck semantics; any in-flight animation is abandoned
    pub fn set_mode(&mut self, mode: DeckMode) {
        self.interrupt();
        self.mode = mode;
    }

    /// Bind to a mount. Callbacks from earlier mounts are dropped from here on.
    pub fn attach(&mut self, guard: MountGuard) {
        self.interrupt();
        self.guard = guard;
    }

    /// Stop applying input and completions
    pub fn teardown(&mut self) {
        self.interrupt();
        self.guard = MountGuard::detached();
    }

    pub fn is_attached(&self) -> bool {
        self.guard.is_current()
    }

    /// Replace the deck and start again from the first card
    pub fn set_candidates(&mut self, candidates: Vec<Candidate>) -> Option<&Candidate> {
        self.interrupt();
        self.candidates = candidates;
        self.current_index = 0;
        self.current()
    }

    pub fn current(&self) -> Option<&Candidate> {
        self.candidates.get(self.current_index)
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn gesture_state(&self) -> GestureState {
        self.tracker.state()
    }

    pub fn is_animating(&self) -> bool {
        self.animator.is_animating()
    }

    /// Offset the card should be drawn at
    pub fn visible_offset(&self, now: Instant) -> Offset {
        if self.animator.is_animating() {
            self.animator.sample(now)
        } else {
            self.tracker.offset()
        }
    }

    pub fn visible_rotation(&self, now: Instant) -> f64 {
        rotation_for(self.visible_offset(now).x, &self.gesture)
    }

    pub fn pointer_down(&mut self, now: Instant) -> bool {
        if !self.guard.is_current() {
            return false;
        }
        self.recover_if_expired(now);
        if self.lock.is_held(now) {
            return false;
        }
        let Some(id) = self.current().map(|c| c.id.clone()) else {
            return false;
        };
        self.tracker.begin(&id)
    }

    pub fn pointer_move(&mut self, delta: Offset) -> Option<Offset> {
        if !self.guard.is_current() {
            return None;
        }
        let id = self.current()?.id.clone();
        self.tracker.drag(&id, delta)
    }

    /// Classify the release and start the exit or reset animation
    pub fn pointer_up(&mut self, now: Instant) -> Option<AnimationTicket> {
        if !self.guard.is_current() {
            return None;
        }
        let id = self.current()?.id.clone();
        let (outcome, from) = self.tracker.release(&id)?;
        let (kind, to, duration) = match outcome {
            ReleaseOutcome::Commit(direction) => (
                AnimationKind::Exit(direction),
                exit_target(from, direction, &self.gesture),
                self.animation.commit_duration,
            ),
            ReleaseOutcome::Cancel => (AnimationKind::Reset, Offset::ZERO, self.animation.reset_duration),
        };
        self.begin_animation(&id, kind, from, to, duration, now)
    }

    /// Feed a whole pointer sequence; returns the ticket if it ended in an
    /// accepted animation
    pub fn trigger_gesture<I>(&mut self, events: I, now: Instant) -> Option<AnimationTicket>
    where
        I: IntoIterator<Item = PointerEvent>,
    {
        let mut ticket = None;
        for event in events {
            match event {
                PointerEvent::Down => {
                    self.pointer_down(now);
                }
                PointerEvent::Move(delta) => {
                    self.pointer_move(delta);
                }
                PointerEvent::Up => ticket = self.pointer_up(now),
            }
        }
        ticket
    }

    /// Button-driven commit. Dropped while another animation is in flight.
    pub fn trigger_programmatic(&mut self, direction: SwipeDirection, now: Instant) -> Option<AnimationTicket> {
        if !self.guard.is_current() {
            return None;
        }
        self.recover_if_expired(now);
        if self.lock.is_held(now) {
            tracing::trace!("Programmatic {:?} dropped, commit in flight", direction);
            return None;
        }
        let id = self.current()?.id.clone();
        let from = self.tracker.force_commit(&id, direction)?;
        let to = exit_target(from, direction, &self.gesture);
        self.begin_animation(&id, AnimationKind::Exit(direction), from, to, self.animation.commit_duration, now)
    }

    /// Advance the animation; settles it when it reaches its target
    pub fn tick(&mut self, now: Instant) -> Option<Settled> {
        if !self.guard.is_current() {
            return None;
        }
        let ticket = self.animator.tick(now)?;
        self.settle(ticket)
    }

    /// Completion delivered by an external animation driver
    pub fn complete_animation(&mut self, ticket: &AnimationTicket) -> Option<Settled> {
        if !self.guard.is_current() {
            tracing::debug!("Dropping completion for {} after teardown", ticket.candidate_id);
            return None;
        }
        if !self.animator.finish(ticket) {
            tracing::debug!("Dropping stale completion (generation {})", ticket.generation);
            return None;
        }
        self.settle(ticket.clone())
    }

    fn begin_animation(
        &mut self,
        id: &str,
        kind: AnimationKind,
        from: Offset,
        to: Offset,
        duration: std::time::Duration,
        now: Instant,
    ) -> Option<AnimationTicket> {
        let Some(token) = self.lock.try_acquire(now).token() else {
            self.tracker.reset();
            return None;
        };
        match self.animator.start(id, kind, from, to, duration, now) {
            Some(ticket) => {
                self.held = Some(token);
                tracing::debug!("Animating {} {:?} (generation {})", id, kind, ticket.generation);
                Some(ticket)
            }
            None => {
                self.lock.release(token);
                self.tracker.reset();
                None
            }
        }
    }

    fn settle(&mut self, ticket: AnimationTicket) -> Option<Settled> {
        if let Some(token) = self.held.take() {
            self.lock.release(token);
        }
        self.tracker.settle();

        let direction = match ticket.kind {
            AnimationKind::Reset => return Some(Settled::Reset),
            AnimationKind::Exit(direction) => direction,
        };
        if self.current().map(|c| c.id.as_str()) != Some(ticket.candidate_id.as_str()) {
            tracing::debug!("Exit for {} no longer matches the current card", ticket.candidate_id);
            return None;
        }

        match self.mode {
            DeckMode::Swipe => {
                self.sequence += 1;
                let decision = SwipeDecision {
                    candidate_id: ticket.candidate_id,
                    direction,
                    timestamp: chrono::Utc::now(),
                    sequence: self.sequence,
                };
                self.current_index = (self.current_index + 1) % self.candidates.len();
                tracing::debug!(
                    "Decision {:?} on {} (#{}), index -> {}",
                    decision.direction,
                    decision.candidate_id,
                    decision.sequence,
                    self.current_index
                );
                Some(Settled::Decided {
                    decision,
                    next: self.current().cloned(),
                })
            }
            DeckMode::FavoriteRemoval => {
                self.candidates.remove(self.current_index);
                self.current_index = self.current_index.min(self.candidates.len().saturating_sub(1));
                Some(Settled::Removed {
                    candidate_id: ticket.candidate_id,
                    next: self.current().cloned(),
                })
            }
        }
    }

    /// Abandon an animation whose lock timed out without a completion
    fn recover_if_expired(&mut self, now: Instant) {
        if self.held.is_none() || self.lock.is_held(now) {
            return;
        }
        if let Acquire::Recovered(token) = self.lock.try_acquire(now) {
            self.lock.release(token);
        }
        self.held = None;
        if let Some(stale) = self.animator.abandon() {
            tracing::warn!(
                "Animation for {} never completed, releasing after {:?}",
                stale.candidate_id,
                self.lock.timeout()
            );
        }
        self.tracker.reset();
    }

    fn interrupt(&mut self) {
        self.animator.abandon();
        self.tracker.reset();
        if let Some(token) = self.held.take() {
            self.lock.release(token);
        }
    }
}
