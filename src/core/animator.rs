use std::time::Duration;
use tokio::time::Instant;

use crate::core::gesture::GestureConfig;
use crate::models::{Offset, SwipeDirection};

/// Animation timing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationConfig {
    pub commit_duration: Duration,
    pub reset_duration: Duration,
    /// Fallback release for an animation lock whose completion never arrives
    pub lock_timeout: Duration,
    /// Frame cadence used by drivers that poll `tick`
    pub frame_interval: Duration,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            commit_duration: Duration::from_millis(250),
            reset_duration: Duration::from_millis(200),
            lock_timeout: Duration::from_millis(400),
            frame_interval: Duration::from_millis(16),
        }
    }
}

impl AnimationConfig {
    /// Lock timeout the controller enforces: at least the longest animation
    /// plus one frame, so a motion still running is never evicted as stuck
    pub fn effective_lock_timeout(&self) -> Duration {
        let longest = self.commit_duration.max(self.reset_duration) + self.frame_interval;
        self.lock_timeout.max(longest)
    }
}

/// What an animation is moving the card towards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationKind {
    Exit(SwipeDirection),
    Reset,
}

/// Identifies one accepted animation. Handed back on completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationTicket {
    pub generation: u64,
    pub candidate_id: String,
    pub kind: AnimationKind,
}

/// Cosmetic card tilt for a horizontal offset, clamped to
/// `[-max_rotation_deg, max_rotation_deg]`
#[inline]
pub fn rotation_for(offset_x: f64, config: &GestureConfig) -> f64 {
    let half_width = config.viewport_width / 2.0;
    if half_width <= 0.0 {
        return 0.0;
    }
    let max = config.max_rotation_deg.abs();
    (offset_x / half_width * max).clamp(-max, max)
}

/// Off-screen target for an exit in `direction`
pub fn exit_target(from: Offset, direction: SwipeDirection, config: &GestureConfig) -> Offset {
    Offset::new(direction.sign() * config.viewport_width * 1.5, from.y)
}

#[derive(Debug, Clone)]
struct Motion {
    from: Offset,
    to: Offset,
    started_at: Instant,
    duration: Duration,
    ticket: AnimationTicket,
}

impl Motion {
    fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }
}

/// Drives the visible offset to a terminal value
///
/// One motion at a time; a second `start` while one is in flight is
/// rejected. Completion is handed out exactly once, through either `tick`
/// or `finish`, whichever comes first.
#[derive(Debug, Default)]
pub struct SwipeAnimator {
    motion: Option<Motion>,
    next_generation: u64,
}

impl SwipeAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_animating(&self) -> bool {
        self.motion.is_some()
    }

    pub fn start(
        &mut self,
        candidate_id: &str,
        kind: AnimationKind,
        from: Offset,
        to: Offset,
        duration: Duration,
        now: Instant,
    ) -> Option<AnimationTicket> {
        if let Some(motion) = &self.motion {
            tracing::trace!("Animation rejected, generation {} still in flight", motion.ticket.generation);
            return None;
        }

        self.next_generation += 1;
        let ticket = AnimationTicket {
            generation: self.next_generation,
            candidate_id: candidate_id.to_string(),
            kind,
        };
        self.motion = Some(Motion {
            from,
            to,
            started_at: now,
            duration,
            ticket: ticket.clone(),
        });
        Some(ticket)
    }

    /// Visible offset at `now`. Cards at rest sit at the origin.
    pub fn sample(&self, now: Instant) -> Offset {
        match &self.motion {
            Some(motion) => motion.from.lerp(motion.to, ease_out(motion.progress(now))),
            None => Offset::ZERO,
        }
    }

    /// Advance to `now`. Returns the ticket once, when the motion ends.
    pub fn tick(&mut self, now: Instant) -> Option<AnimationTicket> {
        let done = self.motion.as_ref().is_some_and(|m| m.progress(now) >= 1.0);
        if !done {
            return None;
        }
        self.motion.take().map(|m| m.ticket)
    }

    /// Completion reported by an external animation system
    pub fn finish(&mut self, ticket: &AnimationTicket) -> bool {
        if self.motion.as_ref().map(|m| &m.ticket) != Some(ticket) {
            return false;
        }
        self.motion = None;
        true
    }

    /// Drop the in-flight motion without completing it
    pub fn abandon(&mut self) -> Option<AnimationTicket> {
        self.motion.take().map(|m| m.ticket)
    }
}

fn ease_out(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_rotation_is_clamped() {
        let config = GestureConfig {
            viewport_width: 400.0,
            ..GestureConfig::default()
        };
        assert_eq!(rotation_for(0.0, &config), 0.0);
        assert_eq!(rotation_for(100.0, &config), 5.0);
        assert_eq!(rotation_for(5000.0, &config), 10.0);
        assert_eq!(rotation_for(-5000.0, &config), -10.0);
    }

    #[test]
    fn test_completion_fires_exactly_once() {
        let now = Instant::now();
        let mut animator = SwipeAnimator::new();
        let ticket = animator
            .start("a", AnimationKind::Reset, Offset::new(50.0, 0.0), Offset::ZERO, ms(200), now)
            .unwrap();

        assert!(animator.tick(now + ms(100)).is_none());
        let mid = animator.sample(now + ms(100));
        assert!(mid.x > 0.0 && mid.x < 50.0);

        assert_eq!(animator.tick(now + ms(200)), Some(ticket.clone()));
        assert!(animator.tick(now + ms(300)).is_none());
        assert!(!animator.finish(&ticket));
        assert_eq!(animator.sample(now + ms(300)), Offset::ZERO);
    }

    #[test]
    fn test_concurrent_start_rejected() {
        let now = Instant::now();
        let mut animator = SwipeAnimator::new();
        let exit = exit_target(Offset::ZERO, SwipeDirection::Like, &GestureConfig::default());
        assert!(animator
            .start("a", AnimationKind::Exit(SwipeDirection::Like), Offset::ZERO, exit, ms(250), now)
            .is_some());
        assert!(animator
            .start("a", AnimationKind::Reset, Offset::ZERO, Offset::ZERO, ms(250), now)
            .is_none());
    }

    #[test]
    fn test_external_finish_wins_over_tick() {
        let now = Instant::now();
        let mut animator = SwipeAnimator::new();
        let ticket = animator
            .start("a", AnimationKind::Exit(SwipeDirection::Skip), Offset::ZERO, Offset::new(-600.0, 0.0), ms(250), now)
            .unwrap();
        assert!(animator.finish(&ticket));
        assert!(animator.tick(now + ms(500)).is_none());
        assert!(!animator.is_animating());
    }

    #[test]
    fn test_generations_increase() {
        let now = Instant::now();
        let mut animator = SwipeAnimator::new();
        let first = animator
            .start("a", AnimationKind::Reset, Offset::ZERO, Offset::ZERO, ms(0), now)
            .unwrap();
        assert_eq!(animator.tick(now), Some(first.clone()));
        let second = animator
            .start("a", AnimationKind::Reset, Offset::ZERO, Offset::ZERO, ms(0), now)
            .unwrap();
        assert!(second.generation > first.generation);
    }
}
