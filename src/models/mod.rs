// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{Candidate, AdoptionStatus, SwipeDirection, SwipeDecision, FavoriteRef, Offset, GestureState};
pub use requests::{RecordDecisionRequest, CreateFavoriteRequest};
pub use responses::{NearbyPetsResponse, FavoritesResponse, ErrorResponse};
