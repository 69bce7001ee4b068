//! Recommendation screen orchestration.
//!
//! [`SwipeSession`] wires the candidate queue, the swipe controller and the
//! collaborators together: it loads the deck on focus, turns settled swipes
//! into exclusions and adoption requests, and reports everything the
//! presentation layer needs through an [`EventSink`].

use thiserror::Error;
use tokio::time::Instant;

use crate::core::{
    AnimationConfig, AnimationTicket, CandidateQueueManager, DeckMode, GestureConfig, LoadOutcome, MountGuard,
    QueueError, RadiusExpansion, RadiusPolicy, ScreenLifecycle, Settled, SwipeController,
};
use crate::models::{Candidate, GestureState, Offset, SwipeDirection};
use crate::services::{CandidateSource, DecisionRecorder, EventSink, SessionEvent};

/// Errors surfaced by session operations
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// What happened to a load request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadReport {
    Applied(LoadOutcome),
    /// Radius could not grow any further; nothing was fetched
    RadiusCapped,
    /// The screen was blurred before the fetch completed
    Discarded,
}

/// One mounted recommendation screen
pub struct SwipeSession<S, R, K> {
    source: S,
    recorder: R,
    sink: K,
    queue: CandidateQueueManager,
    controller: SwipeController,
    lifecycle: ScreenLifecycle,
    mount: Option<MountGuard>,
}

impl<S, R, K> SwipeSession<S, R, K>
where
    S: CandidateSource,
    R: DecisionRecorder,
    K: EventSink,
{
    pub fn new(
        source: S,
        recorder: R,
        sink: K,
        gesture: GestureConfig,
        animation: AnimationConfig,
        radius: RadiusPolicy,
    ) -> Self {
        Self {
            source,
            recorder,
            sink,
            queue: CandidateQueueManager::new(radius),
            controller: SwipeController::new(DeckMode::Swipe, gesture, animation),
            lifecycle: ScreenLifecycle::new(),
            mount: None,
        }
    }

    /// Use favorite-removal semantics instead of Like/Skip browsing
    pub fn with_mode(mut self, mode: DeckMode) -> Self {
        self.controller.set_mode(mode);
        self
    }

    /// Handle for blurring the screen from outside the session
    pub fn lifecycle(&self) -> ScreenLifecycle {
        self.lifecycle.clone()
    }

    pub fn queue(&self) -> &CandidateQueueManager {
        &self.queue
    }

    pub fn controller(&self) -> &SwipeController {
        &self.controller
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    pub fn current(&self) -> Option<&Candidate> {
        self.controller.current()
    }

    pub fn gesture_state(&self) -> GestureState {
        self.controller.gesture_state()
    }

    /// Screen gained focus: mount and load at the session radius
    pub async fn focus(&mut self) -> Result<LoadReport, SessionError> {
        let guard = self.lifecycle.focus();
        self.controller.attach(guard.clone());
        self.mount = Some(guard);
        tracing::info!("Recommendation screen focused at {}km", self.queue.radius_km());
        self.reload().await
    }

    /// Screen lost focus: pending callbacks and fetches are dropped
    pub fn blur(&mut self) {
        self.lifecycle.blur();
        self.controller.teardown();
        self.mount = None;
        tracing::info!("Recommendation screen blurred");
    }

    /// Fetch at the current radius and replace the deck
    pub async fn reload(&mut self) -> Result<LoadReport, SessionError> {
        let Some(guard) = self.mount.clone() else {
            return Ok(LoadReport::Discarded);
        };
        let radius_km = self.queue.radius_km();

        let fetched = self.source.fetch_candidates(radius_km).await;
        if !guard.is_current() {
            tracing::debug!("Dropping candidate fetch that completed after blur");
            return Ok(LoadReport::Discarded);
        }

        let fetched = match fetched {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!("Candidate fetch at {}km failed: {}", radius_km, e);
                self.sink.emit(SessionEvent::FetchFailed { message: e.to_string() });
                return Err(QueueError::from(e).into());
            }
        };

        let outcome = self.queue.replace(fetched, radius_km);
        let current = self.controller.set_candidates(self.queue.candidates().to_vec()).cloned();
        self.sink.emit(SessionEvent::CandidateChanged(current));
        if let LoadOutcome::Exhausted { radius_km } = outcome {
            tracing::info!("No candidates left at {}km", radius_km);
            self.sink.emit(SessionEvent::QueueExhausted { radius_km });
        }
        Ok(LoadReport::Applied(outcome))
    }

    /// Widen the search radius and reload, or report the cap
    pub async fn expand_radius(&mut self) -> Result<LoadReport, SessionError> {
        match self.queue.expand_radius() {
            RadiusExpansion::Capped => {
                self.sink.emit(SessionEvent::RadiusCapped);
                Ok(LoadReport::RadiusCapped)
            }
            RadiusExpansion::Expanded(_) => self.reload().await,
        }
    }

    pub fn pointer_down(&mut self, now: Instant) -> bool {
        self.controller.pointer_down(now)
    }

    pub fn pointer_move(&mut self, delta: Offset) -> Option<Offset> {
        self.controller.pointer_move(delta)
    }

    pub fn pointer_up(&mut self, now: Instant) -> Option<AnimationTicket> {
        self.controller.pointer_up(now)
    }

    pub fn trigger_programmatic(&mut self, direction: SwipeDirection, now: Instant) -> Option<AnimationTicket> {
        self.controller.trigger_programmatic(direction, now)
    }

    /// Drive the animation; applies the outcome once it settles
    pub async fn tick(&mut self, now: Instant) -> Option<Settled> {
        let settled = self.controller.tick(now)?;
        self.apply(&settled).await;
        Some(settled)
    }

    /// Completion delivered by an external animation driver
    pub async fn complete_animation(&mut self, ticket: &AnimationTicket) -> Option<Settled> {
        let settled = self.controller.complete_animation(ticket)?;
        self.apply(&settled).await;
        Some(settled)
    }

    async fn apply(&mut self, settled: &Settled) {
        match settled {
            Settled::Decided { decision, next } => {
                self.queue.mark_decided(&decision.candidate_id);
                self.sink.emit(SessionEvent::Decision(decision.clone()));
                self.sink.emit(SessionEvent::CandidateChanged(next.clone()));

                if decision.direction == SwipeDirection::Like {
                    if let Err(e) = self.recorder.record_decision(decision.direction, &decision.candidate_id).await {
                        tracing::warn!("Failed to persist adoption request for {}: {}", decision.candidate_id, e);
                        self.sink.emit(SessionEvent::PersistFailed {
                            candidate_id: decision.candidate_id.clone(),
                            message: e.to_string(),
                        });
                    }
                }
            }
            Settled::Removed { candidate_id, next } => {
                self.sink.emit(SessionEvent::FavoriteRemoved {
                    candidate_id: candidate_id.clone(),
                });
                self.sink.emit(SessionEvent::CandidateChanged(next.clone()));

                if let Err(e) = self.recorder.record_removal(candidate_id).await {
                    tracing::warn!("Failed to delete favorite {}: {}", candidate_id, e);
                    self.sink.emit(SessionEvent::PersistFailed {
                        candidate_id: candidate_id.clone(),
                        message: e.to_string(),
                    });
                }
            }
            Settled::Reset => {}
        }
    }
}
