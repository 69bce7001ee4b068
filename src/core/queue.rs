use std::collections::HashSet;

use thiserror::Error;

use crate::models::Candidate;
use crate::services::{CandidateSource, TransportError};

/// Errors that can occur while loading the queue
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Candidate fetch failed: {0}")]
    Transport(#[from] TransportError),
}

/// Radius expansion bounds, in kilometres
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadiusPolicy {
    pub initial_km: u32,
    pub increment_km: u32,
    pub max_km: u32,
}

impl Default for RadiusPolicy {
    fn default() -> Self {
        Self {
            initial_km: 5,
            increment_km: 5,
            max_km: 40,
        }
    }
}

/// Outcome of [`SearchRadius::expand`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadiusExpansion {
    Expanded(u32),
    Capped,
}

/// Session search radius; never decreases, never exceeds the cap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchRadius {
    current_km: u32,
    policy: RadiusPolicy,
}

impl SearchRadius {
    pub fn new(policy: RadiusPolicy) -> Self {
        Self {
            current_km: policy.initial_km.min(policy.max_km),
            policy,
        }
    }

    pub fn current_km(&self) -> u32 {
        self.current_km
    }

    pub fn is_capped(&self) -> bool {
        self.current_km >= self.policy.max_km
    }

    pub fn expand(&mut self) -> RadiusExpansion {
        if self.is_capped() || self.policy.increment_km == 0 {
            return RadiusExpansion::Capped;
        }
        self.current_km = self
            .current_km
            .saturating_add(self.policy.increment_km)
            .min(self.policy.max_km);
        RadiusExpansion::Expanded(self.current_km)
    }
}

/// Outcome of a successful fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { count: usize, radius_km: u32 },
    /// Nothing left at this radius once filtered; offer to widen it
    Exhausted { radius_km: u32 },
}

/// Diagnostic view of the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueSnapshot {
    pub radius_km: u32,
    pub len: usize,
    pub excluded: usize,
}

/// Ordered, deduplicated candidate sequence for the current session
///
/// Candidates decided in this session go into the exclusion set and are
/// filtered out of every later load, alongside adopted pets.
#[derive(Debug)]
pub struct CandidateQueueManager {
    queue: Vec<Candidate>,
    excluded: HashSet<String>,
    radius: SearchRadius,
}

impl CandidateQueueManager {
    pub fn new(policy: RadiusPolicy) -> Self {
        Self {
            queue: Vec::new(),
            excluded: HashSet::new(),
            radius: SearchRadius::new(policy),
        }
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.queue
    }

    pub fn radius_km(&self) -> u32 {
        self.radius.current_km()
    }

    pub fn is_excluded(&self, candidate_id: &str) -> bool {
        self.excluded.contains(candidate_id)
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            radius_km: self.radius.current_km(),
            len: self.queue.len(),
            excluded: self.excluded.len(),
        }
    }

    /// Fetch at `radius_km` and replace the queue with the filtered result
    ///
    /// On transport failure the existing queue is left untouched.
    pub async fn load<S>(&mut self, source: &S, radius_km: u32) -> Result<LoadOutcome, QueueError>
    where
        S: CandidateSource,
    {
        let fetched = source.fetch_candidates(radius_km).await.map_err(|e| {
            tracing::warn!("Failed to fetch candidates at {}km: {}", radius_km, e);
            e
        })?;
        Ok(self.replace(fetched, radius_km))
    }

    /// Load at the session's current radius
    pub async fn reload<S>(&mut self, source: &S) -> Result<LoadOutcome, QueueError>
    where
        S: CandidateSource,
    {
        let radius_km = self.radius.current_km();
        self.load(source, radius_km).await
    }

    /// Apply a fetch result: drop adopted, excluded and duplicate ids
    pub fn replace(&mut self, fetched: Vec<Candidate>, radius_km: u32) -> LoadOutcome {
        let total = fetched.len();
        let mut seen = HashSet::with_capacity(total);
        self.queue = fetched
            .into_iter()
            .filter(|c| !c.is_adopted())
            .filter(|c| !self.excluded.contains(&c.id))
            .filter(|c| seen.insert(c.id.clone()))
            .collect();

        tracing::debug!(
            "Loaded {} of {} candidates at {}km ({} excluded)",
            self.queue.len(),
            total,
            radius_km,
            self.excluded.len()
        );

        if self.queue.is_empty() {
            LoadOutcome::Exhausted { radius_km }
        } else {
            LoadOutcome::Loaded {
                count: self.queue.len(),
                radius_km,
            }
        }
    }

    /// Exclude `candidate_id` from future loads. The in-memory queue is
    /// left as is.
    pub fn mark_decided(&mut self, candidate_id: &str) {
        if self.excluded.insert(candidate_id.to_string()) {
            tracing::trace!("Excluded {} for the rest of the session", candidate_id);
        }
    }

    pub fn expand_radius(&mut self) -> RadiusExpansion {
        let expansion = self.radius.expand();
        match expansion {
            RadiusExpansion::Expanded(km) => tracing::info!("Search radius widened to {}km", km),
            RadiusExpansion::Capped => tracing::info!("Search radius already at {}km cap", self.radius.current_km()),
        }
        expansion
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AdoptionStatus;

    #[test]
    fn test_radius_expansion_sequence() {
        let mut radius = SearchRadius::new(RadiusPolicy::default());
        let results: Vec<RadiusExpansion> = (0..9).map(|_| radius.expand()).collect();
        assert_eq!(
            results,
            vec![
                RadiusExpansion::Expanded(10),
                RadiusExpansion::Expanded(15),
                RadiusExpansion::Expanded(20),
                RadiusExpansion::Expanded(25),
                RadiusExpansion::Expanded(30),
                RadiusExpansion::Expanded(35),
                RadiusExpansion::Expanded(40),
                RadiusExpansion::Capped,
                RadiusExpansion::Capped,
            ]
        );
        assert_eq!(radius.current_km(), 40);
    }

    #[test]
    fn test_radius_does_not_overshoot_cap() {
        let mut radius = SearchRadius::new(RadiusPolicy {
            initial_km: 5,
            increment_km: 7,
            max_km: 15,
        });
        assert_eq!(radius.expand(), RadiusExpansion::Expanded(12));
        assert_eq!(radius.expand(), RadiusExpansion::Expanded(15));
        assert_eq!(radius.expand(), RadiusExpansion::Capped);
    }

    #[test]
    fn test_replace_filters_and_dedups() {
        let mut queue = CandidateQueueManager::new(RadiusPolicy::default());
        queue.mark_decided("b");
        let outcome = queue.replace(
            vec![
                Candidate::new("a", "A"),
                Candidate::new("b", "B"),
                Candidate::new("c", "C").with_status(AdoptionStatus::Adopted),
                Candidate::new("d", "D").with_status(AdoptionStatus::Pending),
                Candidate::new("a", "A again"),
            ],
            5,
        );
        assert_eq!(outcome, LoadOutcome::Loaded { count: 2, radius_km: 5 });
        let ids: Vec<&str> = queue.candidates().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "d"]);
        assert_eq!(queue.candidates()[0].name, "A");
    }

    #[test]
    fn test_everything_filtered_is_exhausted() {
        let mut queue = CandidateQueueManager::new(RadiusPolicy::default());
        queue.mark_decided("a");
        let outcome = queue.replace(vec![Candidate::new("a", "A")], 5);
        assert_eq!(outcome, LoadOutcome::Exhausted { radius_km: 5 });
        assert_eq!(queue.snapshot(), QueueSnapshot { radius_km: 5, len: 0, excluded: 1 });
    }
}
