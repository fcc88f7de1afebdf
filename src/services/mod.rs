/// Business logic layer
///
/// - `toggle`: idempotent like/unlike and subscribe/unsubscribe flips
/// - `aggregation`: read-only derived view models joined across tables
/// - `media`: blob-store relay for uploaded files
pub mod aggregation;
pub mod media;
pub mod toggle;

pub use aggregation::{AggregationService, VideoSearchFilter};
pub use media::MediaStore;
pub use toggle::{ToggleOutcome, ToggleService};
