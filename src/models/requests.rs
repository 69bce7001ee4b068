use serde::{Deserialize, Serialize};
use crate::models::SwipeDirection;

/// Adoption request persisted for a Like decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordDecisionRequest {
    #[serde(rename = "petId")]
    pub pet_id: String,
    pub direction: SwipeDirection,
}

/// Request to add a pet to the user's favorites
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFavoriteRequest {
    #[serde(rename = "petId")]
    pub pet_id: String,
}
