use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;

use crate::models::{
    Candidate, CreateFavoriteRequest, ErrorResponse, FavoriteRef, FavoritesResponse, NearbyPetsResponse,
    RecordDecisionRequest, SwipeDirection,
};
use crate::services::{CandidateSource, DecisionRecorder, FavoriteStore, TransportError};

/// Pet adoption REST API client
///
/// Implements every collaborator port of the swipe engine:
/// - Querying nearby pets for the candidate queue
/// - Persisting adoption requests for liked pets
/// - Favorite membership CRUD
#[derive(Debug, Clone)]
pub struct PetApiClient {
    base_url: String,
    auth_token: Option<String>,
    client: Client,
}

impl PetApiClient {
    /// Create a new API client
    pub fn new(base_url: String, auth_token: Option<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Map non-success statuses to typed errors
    async fn check(response: Response, action: &str) -> Result<Response, TransportError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(TransportError::Unauthorized);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| if e.message.is_empty() { e.error } else { e.message })
            .unwrap_or(body);
        tracing::error!("Failed to {}: {} - {}", action, status, detail);
        Err(TransportError::ApiError(format!("Failed to {}: {}", action, status)))
    }

    /// Fetch pets within `radius_km` of the user
    pub async fn nearby_pets(&self, radius_km: u32) -> Result<Vec<Candidate>, TransportError> {
        let url = self.url(&format!("/pets/nearby?radius={}", radius_km));
        tracing::debug!("Fetching nearby pets from: {}", url);

        let response = self.authorized(self.client.get(&url)).send().await?;
        let response = Self::check(response, "fetch nearby pets").await?;

        let body: NearbyPetsResponse = response
            .json()
            .await
            .map_err(|e| TransportError::InvalidResponse(format!("Failed to parse pets: {}", e)))?;

        tracing::debug!("Fetched {} pets at {}km", body.pets.len(), radius_km);
        Ok(body.pets)
    }

    /// Idempotency key for the adoption request on `pet_id`. Stable across
    /// retries, so the backend creates at most one request per pet.
    pub fn adoption_key(&self, pet_id: &str) -> String {
        let name = format!("{}/adoptions/{}", self.base_url, pet_id);
        uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_URL, name.as_bytes()).to_string()
    }

    /// Create an adoption request
    pub async fn create_adoption_request(
        &self,
        direction: SwipeDirection,
        pet_id: &str,
    ) -> Result<(), TransportError> {
        let payload = RecordDecisionRequest {
            pet_id: pet_id.to_string(),
            direction,
        };

        let response = self
            .authorized(self.client.post(self.url("/adoptions")))
            .header("Idempotency-Key", self.adoption_key(pet_id))
            .json(&payload)
            .send()
            .await?;
        Self::check(response, "create adoption request").await?;

        tracing::debug!("Recorded adoption request for {}", pet_id);
        Ok(())
    }

    pub async fn list_favorites(&self) -> Result<Vec<FavoriteRef>, TransportError> {
        let response = self.authorized(self.client.get(self.url("/favorites"))).send().await?;
        let response = Self::check(response, "list favorites").await?;

        let body: FavoritesResponse = response
            .json()
            .await
            .map_err(|e| TransportError::InvalidResponse(format!("Failed to parse favorites: {}", e)))?;
        Ok(body.favorites)
    }

    pub async fn add_favorite(&self, pet_id: &str) -> Result<FavoriteRef, TransportError> {
        let payload = CreateFavoriteRequest {
            pet_id: pet_id.to_string(),
        };
        let response = self
            .authorized(self.client.post(self.url("/favorites")))
            .json(&payload)
            .send()
            .await?;
        let response = Self::check(response, "add favorite").await?;

        response
            .json()
            .await
            .map_err(|e| TransportError::InvalidResponse(format!("Failed to parse favorite: {}", e)))
    }

    pub async fn delete_favorite(&self, favorite_record_id: &str) -> Result<(), TransportError> {
        let url = self.url(&format!("/favorites/{}", urlencoding::encode(favorite_record_id)));
        let response = self.authorized(self.client.delete(&url)).send().await?;
        Self::check(response, "delete favorite").await?;
        Ok(())
    }
}

impl CandidateSource for PetApiClient {
    async fn fetch_candidates(&self, radius_km: u32) -> Result<Vec<Candidate>, TransportError> {
        self.nearby_pets(radius_km).await
    }
}

impl DecisionRecorder for PetApiClient {
    async fn record_decision(&self, direction: SwipeDirection, candidate_id: &str) -> Result<(), TransportError> {
        if direction != SwipeDirection::Like {
            return Ok(());
        }
        self.create_adoption_request(direction, candidate_id).await
    }
}

impl FavoriteStore for PetApiClient {
    async fn fetch_favorite_membership(&self) -> Result<Vec<FavoriteRef>, TransportError> {
        self.list_favorites().await
    }

    async fn create_favorite(&self, candidate_id: &str) -> Result<FavoriteRef, TransportError> {
        self.add_favorite(candidate_id).await
    }

    async fn remove_favorite(&self, favorite_record_id: &str) -> Result<(), TransportError> {
        self.delete_favorite(favorite_record_id).await
    }
}
