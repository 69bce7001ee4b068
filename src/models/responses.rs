use serde::{Deserialize, Serialize};
use crate::models::{Candidate, FavoriteRef};

/// Response of the nearby-pets query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyPetsResponse {
    #[serde(default)]
    pub pets: Vec<Candidate>,
    #[serde(rename = "radiusKm", default)]
    pub radius_km: Option<u32>,
}

/// Response listing the user's favorites
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoritesResponse {
    #[serde(default)]
    pub favorites: Vec<FavoriteRef>,
}

/// Error body returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub message: String,
}
