use serde::{Deserialize, Serialize};

/// A pet offered for a swipe decision
///
/// Only `id` and `status` matter to the engine; everything else is display
/// payload carried through untouched. Equality is by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub species: Option<String>,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(rename = "ageMonths", default)]
    pub age_months: Option<u16>,
    #[serde(default)]
    pub status: AdoptionStatus,
    #[serde(rename = "distanceKm", default)]
    pub distance_km: Option<f64>,
    #[serde(rename = "imageUrls", default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Candidate {
    /// Build a bare candidate with only an id and a name
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            species: None,
            breed: None,
            age_months: None,
            status: AdoptionStatus::Available,
            distance_km: None,
            image_urls: Vec::new(),
            description: None,
        }
    }

    pub fn with_status(mut self, status: AdoptionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_adopted(&self) -> bool {
        self.status == AdoptionStatus::Adopted
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Candidate {}

/// Adoption status as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdoptionStatus {
    #[default]
    Available,
    Pending,
    Adopted,
}

/// Outcome of a committed swipe. Right is Like, left is Skip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDirection {
    Like,
    Skip,
}

impl SwipeDirection {
    /// Horizontal sign of the exit motion
    pub fn sign(self) -> f64 {
        match self {
            SwipeDirection::Like => 1.0,
            SwipeDirection::Skip => -1.0,
        }
    }
}

/// A resolved swipe, emitted once per physical interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwipeDecision {
    #[serde(rename = "candidateId")]
    pub candidate_id: String,
    pub direction: SwipeDirection,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Monotonic per-controller counter, strictly increasing in emission order
    pub sequence: u64,
}

/// Favorite membership record for one candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteRef {
    #[serde(rename = "candidateId", alias = "petId")]
    pub candidate_id: String,
    #[serde(rename = "favoriteRecordId", alias = "_id")]
    pub favorite_record_id: String,
    /// Pet payload, when the backend embeds it in the favorite record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pet: Option<Candidate>,
}

impl FavoriteRef {
    pub fn new(candidate_id: impl Into<String>, favorite_record_id: impl Into<String>) -> Self {
        Self {
            candidate_id: candidate_id.into(),
            favorite_record_id: favorite_record_id.into(),
            pet: None,
        }
    }

    /// Card to show for this favorite. Records without an embedded pet fall
    /// back to a bare candidate named by its id.
    pub fn to_candidate(&self) -> Candidate {
        match &self.pet {
            Some(pet) => pet.clone(),
            None => Candidate::new(self.candidate_id.clone(), self.candidate_id.clone()),
        }
    }
}

/// 2-D card offset in logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
}

impl Offset {
    pub const ZERO: Offset = Offset { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Linear interpolation towards `to`, `t` in [0, 1]
    pub fn lerp(self, to: Offset, t: f64) -> Offset {
        Offset {
            x: self.x + (to.x - self.x) * t,
            y: self.y + (to.y - self.y) * t,
        }
    }
}

impl std::ops::Add for Offset {
    type Output = Offset;

    fn add(self, rhs: Offset) -> Offset {
        Offset::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// Gesture state of the mounted card
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureState {
    Idle,
    Dragging(Offset),
    Committing(SwipeDirection),
    Resetting,
}

impl GestureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, GestureState::Idle)
    }
}
