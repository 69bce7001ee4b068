// Swipe engine exports
pub mod animator;
pub mod controller;
pub mod favorites;
pub mod gesture;
pub mod lifecycle;
pub mod lock;
pub mod queue;

pub use animator::{rotation_for, exit_target, AnimationConfig, AnimationKind, AnimationTicket, SwipeAnimator};
pub use controller::{DeckMode, PointerEvent, Settled, SwipeController};
pub use favorites::{FavoriteDeck, FavoriteError, FavoriteInterlock, ToggleOutcome};
pub use gesture::{classify_release, GestureConfig, GestureTracker, ReleaseOutcome};
pub use lifecycle::{MountGuard, ScreenLifecycle};
pub use lock::{Acquire, LockState, LockToken, TimedLock};
pub use queue::{CandidateQueueManager, LoadOutcome, QueueError, QueueSnapshot, RadiusExpansion, RadiusPolicy, SearchRadius};
