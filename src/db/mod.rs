/// Database access layer
///
/// `pool` builds the process-wide connection pool; the `*_repo` modules
/// hold per-table queries. Cross-table reads (stats, joins, search) live in
/// `services::aggregation`, and the like/subscription toggle writes live in
/// `services::toggle`.
pub mod comment_repo;
pub mod playlist_repo;
pub mod pool;
pub mod tweet_repo;
pub mod user_repo;
pub mod video_repo;

pub use pool::{create_pool, PoolConfig};
