//! Collaborator boundary of the swipe engine.
//!
//! The engine only talks to the outside world through these traits. The
//! HTTP implementation lives in [`super::api`]; tests use in-memory fakes.

use std::future::Future;

use crate::models::{Candidate, FavoriteRef, SwipeDecision, SwipeDirection};
use crate::services::TransportError;

/// Supplies nearby, non-adopted candidates
pub trait CandidateSource {
    fn fetch_candidates(
        &self,
        radius_km: u32,
    ) -> impl Future<Output = Result<Vec<Candidate>, TransportError>> + Send;
}

/// Persists the outcome of settled cards
pub trait DecisionRecorder {
    /// Adoption request for a decision. Only called for `Like`.
    fn record_decision(
        &self,
        direction: SwipeDirection,
        candidate_id: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// A card removed in favorite-removal mode. Nothing to persist by default.
    fn record_removal(&self, _candidate_id: &str) -> impl Future<Output = Result<(), TransportError>> + Send {
        std::future::ready(Ok(()))
    }
}

/// Favorite CRUD driven by the favorite interlock
pub trait FavoriteStore {
    fn fetch_favorite_membership(&self) -> impl Future<Output = Result<Vec<FavoriteRef>, TransportError>> + Send;

    fn create_favorite(&self, candidate_id: &str) -> impl Future<Output = Result<FavoriteRef, TransportError>> + Send;

    fn remove_favorite(&self, favorite_record_id: &str) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Events pushed up to the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    CandidateChanged(Option<Candidate>),
    Decision(SwipeDecision),
    QueueExhausted { radius_km: u32 },
    RadiusCapped,
    FetchFailed { message: String },
    PersistFailed { candidate_id: String, message: String },
    FavoriteRemoved { candidate_id: String },
}

/// Receives [`SessionEvent`]s. Implementations decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: SessionEvent);
}

impl EventSink for Vec<SessionEvent> {
    fn emit(&mut self, event: SessionEvent) {
        self.push(event);
    }
}
