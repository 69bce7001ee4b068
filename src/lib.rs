//! Pawswipe - swipe-based recommendation engine for a pet adoption client
//!
//! This library turns pointer drags and button presses into Like/Skip
//! decisions over a deck of adoptable pets, and keeps that deck supplied:
//! deduplicated, free of pets already decided this session, and widened by
//! radius expansion when nothing nearby is left.

pub mod config;
pub mod core;
pub mod models;
pub mod services;
pub mod session;

// Re-export commonly used types
pub use core::{
    CandidateQueueManager, DeckMode, FavoriteInterlock, GestureTracker, SwipeAnimator, SwipeController,
    classify_release, rotation_for,
};
pub use models::{Candidate, SwipeDecision, SwipeDirection, FavoriteRef, GestureState, Offset};
pub use session::{SwipeSession, SessionError, LoadReport};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GestureConfig, ReleaseOutcome};

    #[test]
    fn test_library_exports() {
        // Verify that the library exports work correctly
        let threshold = GestureConfig::default().commit_threshold();
        assert_eq!(classify_release(threshold, threshold), ReleaseOutcome::Cancel);
        assert_eq!(rotation_for(0.0, &GestureConfig::default()), 0.0);
    }
}
