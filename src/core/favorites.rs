use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

use crate::core::lock::{LockToken, TimedLock};
use crate::models::{Candidate, FavoriteRef, SwipeDirection};
use crate::services::{CandidateSource, DecisionRecorder, FavoriteStore, TransportError};

/// Errors that can occur while toggling favorites
#[derive(Debug, Error)]
pub enum FavoriteError {
    #[error("Favorite request failed: {0}")]
    Transport(#[from] TransportError),
}

impl FavoriteError {
    pub fn into_transport(self) -> TransportError {
        match self {
            FavoriteError::Transport(e) => e,
        }
    }
}

/// Outcome of [`FavoriteInterlock::toggle`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added(FavoriteRef),
    Removed { candidate_id: String },
    /// Another toggle for this candidate is still running
    Rejected,
}

#[derive(Debug, Default)]
struct InterlockState {
    /// Only candidates with a toggle in flight (or a hung one not yet
    /// evicted) have an entry
    locks: HashMap<String, TimedLock>,
    membership: HashMap<String, FavoriteRef>,
}

/// Serializes favorite toggles per candidate
///
/// A toggle for a candidate whose lock is held is rejected, not queued.
/// The lock is released when the toggle finishes, fails, or is dropped; a
/// toggle that hangs is evicted after `lock_timeout`.
#[derive(Debug)]
pub struct FavoriteInterlock<F> {
    store: F,
    lock_timeout: Duration,
    state: Mutex<InterlockState>,
}

impl<F: FavoriteStore> FavoriteInterlock<F> {
    pub fn new(store: F, lock_timeout: Duration) -> Self {
        Self {
            store,
            lock_timeout,
            state: Mutex::new(InterlockState::default()),
        }
    }

    pub fn store(&self) -> &F {
        &self.store
    }

    pub fn is_favorite(&self, candidate_id: &str) -> bool {
        self.state().membership.contains_key(candidate_id)
    }

    pub fn favorite_ref(&self, candidate_id: &str) -> Option<FavoriteRef> {
        self.state().membership.get(candidate_id).cloned()
    }

    pub fn favorites(&self) -> Vec<FavoriteRef> {
        let mut refs: Vec<FavoriteRef> = self.state().membership.values().cloned().collect();
        refs.sort_by(|a, b| a.candidate_id.cmp(&b.candidate_id));
        refs
    }

    /// Replace the local membership view from the store
    pub async fn refresh(&self) -> Result<usize, FavoriteError> {
        let refs = self.store.fetch_favorite_membership().await?;
        let mut state = self.state();
        state.membership = refs.into_iter().map(|r| (r.candidate_id.clone(), r)).collect();
        tracing::debug!("Favorite membership refreshed: {} entries", state.membership.len());
        Ok(state.membership.len())
    }

    /// Create or delete the favorite for `candidate_id`, depending on
    /// current membership
    pub async fn toggle(&self, candidate_id: &str) -> Result<ToggleOutcome, FavoriteError> {
        let Some((held, existing)) = self.acquire(candidate_id) else {
            return Ok(ToggleOutcome::Rejected);
        };

        let outcome = match existing {
            Some(favorite) => self.delete(&favorite).await?,
            None => {
                let created = self.store.create_favorite(candidate_id).await?;
                self.state()
                    .membership
                    .insert(candidate_id.to_string(), created.clone());
                tracing::info!("Added {} to favorites ({})", candidate_id, created.favorite_record_id);
                ToggleOutcome::Added(created)
            }
        };
        drop(held);
        Ok(outcome)
    }

    /// Delete the favorite for `candidate_id` if there is one
    ///
    /// Rejected when the candidate is not a favorite, or when a toggle for
    /// it is already in flight (that toggle is the removal).
    pub async fn remove(&self, candidate_id: &str) -> Result<ToggleOutcome, FavoriteError> {
        let Some((held, existing)) = self.acquire(candidate_id) else {
            return Ok(ToggleOutcome::Rejected);
        };
        let Some(favorite) = existing else {
            tracing::debug!("{} is not a favorite, nothing to remove", candidate_id);
            return Ok(ToggleOutcome::Rejected);
        };

        let outcome = self.delete(&favorite).await?;
        drop(held);
        Ok(outcome)
    }

    fn acquire<'a>(&'a self, candidate_id: &'a str) -> Option<(HeldLock<'a, F>, Option<FavoriteRef>)> {
        let mut state = self.state();
        let lock = state
            .locks
            .entry(candidate_id.to_string())
            .or_insert_with(|| TimedLock::new(self.lock_timeout));
        let Some(token) = lock.try_acquire(Instant::now()).token() else {
            tracing::debug!("Favorite update for {} already in flight, dropping", candidate_id);
            return None;
        };
        let existing = state.membership.get(candidate_id).cloned();
        Some((HeldLock { interlock: self, candidate_id, token }, existing))
    }

    async fn delete(&self, favorite: &FavoriteRef) -> Result<ToggleOutcome, FavoriteError> {
        self.store.remove_favorite(&favorite.favorite_record_id).await?;
        self.state().membership.remove(&favorite.candidate_id);
        tracing::info!("Removed {} from favorites", favorite.candidate_id);
        Ok(ToggleOutcome::Removed {
            candidate_id: favorite.candidate_id.clone(),
        })
    }

    fn state(&self) -> MutexGuard<'_, InterlockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases a per-candidate lock on drop, whatever the toggle's outcome
struct HeldLock<'a, F> {
    interlock: &'a FavoriteInterlock<F>,
    candidate_id: &'a str,
    token: LockToken,
}

impl<F> Drop for HeldLock<'_, F> {
    fn drop(&mut self) {
        let mut state = self.interlock.state.lock().unwrap_or_else(PoisonError::into_inner);
        let released = state
            .locks
            .get_mut(self.candidate_id)
            .is_some_and(|lock| lock.release(self.token));
        // A stale holder leaves the entry to whoever evicted it.
        if released {
            state.locks.remove(self.candidate_id);
        }
    }
}

/// Deck for the favorites screen
///
/// Cards come from favorite membership, and a card removed in
/// favorite-removal mode is deleted from the store through the interlock.
pub struct FavoriteDeck<F> {
    interlock: Arc<FavoriteInterlock<F>>,
}

impl<F> FavoriteDeck<F> {
    pub fn new(interlock: Arc<FavoriteInterlock<F>>) -> Self {
        Self { interlock }
    }

    pub fn interlock(&self) -> &FavoriteInterlock<F> {
        &self.interlock
    }
}

impl<F> Clone for FavoriteDeck<F> {
    fn clone(&self) -> Self {
        Self {
            interlock: Arc::clone(&self.interlock),
        }
    }
}

impl<F> CandidateSource for FavoriteDeck<F>
where
    F: FavoriteStore + Send + Sync,
{
    /// Favorites are not distance bound; the radius is ignored
    async fn fetch_candidates(&self, _radius_km: u32) -> Result<Vec<Candidate>, TransportError> {
        self.interlock.refresh().await.map_err(FavoriteError::into_transport)?;
        Ok(self.interlock.favorites().iter().map(FavoriteRef::to_candidate).collect())
    }
}

impl<F> DecisionRecorder for FavoriteDeck<F>
where
    F: FavoriteStore + Send + Sync,
{
    async fn record_decision(&self, direction: SwipeDirection, candidate_id: &str) -> Result<(), TransportError> {
        tracing::debug!("Ignoring {:?} on favorite {}", direction, candidate_id);
        Ok(())
    }

    async fn record_removal(&self, candidate_id: &str) -> Result<(), TransportError> {
        match self.interlock.remove(candidate_id).await {
            Ok(_) => Ok(()),
            Err(e) => Err(e.into_transport()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct SlowStore {
        created: AtomicUsize,
        removed: AtomicUsize,
        fail: bool,
    }

    impl FavoriteStore for SlowStore {
        async fn fetch_favorite_membership(&self) -> Result<Vec<FavoriteRef>, TransportError> {
            Ok(vec![FavoriteRef::new("rex", "fav-rex")])
        }

        async fn create_favorite(&self, candidate_id: &str) -> Result<FavoriteRef, TransportError> {
            tokio::time::sleep(Duration::from_millis(20)).await;
            if self.fail {
                return Err(TransportError::ApiError("503".to_string()));
            }
            let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(FavoriteRef::new(candidate_id, format!("fav-{}", n)))
        }

        async fn remove_favorite(&self, _favorite_record_id: &str) -> Result<(), TransportError> {
            self.removed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn lock_entries<F: FavoriteStore>(interlock: &FavoriteInterlock<F>) -> usize {
        interlock.state().locks.len()
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_toggles_create_once() {
        let interlock = FavoriteInterlock::new(SlowStore::default(), Duration::from_millis(400));
        let (first, second) = tokio::join!(interlock.toggle("milo"), interlock.toggle("milo"));

        let outcomes = [first.unwrap(), second.unwrap()];
        assert_eq!(outcomes.iter().filter(|o| matches!(o, ToggleOutcome::Added(_))).count(), 1);
        assert!(outcomes.contains(&ToggleOutcome::Rejected));
        assert_eq!(interlock.store().created.load(Ordering::SeqCst), 1);
        assert!(interlock.is_favorite("milo"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_toggle_releases_lock() {
        let interlock = FavoriteInterlock::new(
            SlowStore {
                fail: true,
                ..SlowStore::default()
            },
            Duration::from_millis(400),
        );
        assert!(interlock.toggle("milo").await.is_err());
        assert!(!interlock.is_favorite("milo"));
        // Lock was released, so the retry reaches the store again instead of being rejected.
        assert!(interlock.toggle("milo").await.is_err());
        assert_eq!(lock_entries(&interlock), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_removes_existing() {
        let interlock = FavoriteInterlock::new(SlowStore::default(), Duration::from_millis(400));
        assert_eq!(interlock.refresh().await.unwrap(), 1);
        let outcome = interlock.toggle("rex").await.unwrap();
        assert_eq!(outcome, ToggleOutcome::Removed { candidate_id: "rex".to_string() });
        assert!(interlock.favorite_ref("rex").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_lock_entries_pruned_after_toggles() {
        let interlock = FavoriteInterlock::new(SlowStore::default(), Duration::from_millis(400));
        for id in ["a", "b", "c", "a"] {
            interlock.toggle(id).await.unwrap();
        }
        assert_eq!(lock_entries(&interlock), 0);
        assert_eq!(interlock.favorites().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_only_deletes_members() {
        let interlock = FavoriteInterlock::new(SlowStore::default(), Duration::from_millis(400));
        interlock.refresh().await.unwrap();

        assert_eq!(interlock.remove("milo").await.unwrap(), ToggleOutcome::Rejected);
        assert_eq!(interlock.store().created.load(Ordering::SeqCst), 0);

        let outcome = interlock.remove("rex").await.unwrap();
        assert_eq!(outcome, ToggleOutcome::Removed { candidate_id: "rex".to_string() });
        assert_eq!(interlock.store().removed.load(Ordering::SeqCst), 1);
        assert_eq!(lock_entries(&interlock), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deck_lists_membership_and_deletes_on_removal() {
        let deck = FavoriteDeck::new(Arc::new(FavoriteInterlock::new(
            SlowStore::default(),
            Duration::from_millis(400),
        )));
        let cards = deck.fetch_candidates(5).await.unwrap();
        assert_eq!(cards, vec![Candidate::new("rex", "rex")]);

        deck.record_decision(SwipeDirection::Like, "rex").await.unwrap();
        assert!(deck.interlock().is_favorite("rex"));

        deck.record_removal("rex").await.unwrap();
        assert!(!deck.interlock().is_favorite("rex"));
        assert_eq!(deck.interlock().store().removed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_toggle_is_evicted_after_timeout() {
        let interlock = Arc::new(FavoriteInterlock::new(SlowStore::default(), Duration::from_millis(5)));
        let slow = {
            let interlock = Arc::clone(&interlock);
            tokio::spawn(async move { interlock.toggle("milo").await })
        };
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(10)).await;

        // First toggle is still waiting on the store, but its lock has expired.
        let second = interlock.toggle("milo").await.unwrap();
        assert!(matches!(second, ToggleOutcome::Added(_)));
        assert!(matches!(slow.await.unwrap().unwrap(), ToggleOutcome::Added(_)));
        assert_eq!(interlock.store().created.load(Ordering::SeqCst), 2);
        assert_eq!(lock_entries(&interlock), 0);
    }
}
