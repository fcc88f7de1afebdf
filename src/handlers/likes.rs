/// Like listings. The toggles themselves live on their target's routes
/// (/videos/{id}/like and friends).
use actix_web::{web, HttpResponse};

use crate::error::Result;
use crate::middleware::UserId;
use crate::response::ApiResponse;
use crate::services::AggregationService;

/// GET /likes/videos: distinct videos the caller has liked.
pub async fn liked_videos(
    aggregation: web::Data<AggregationService>,
    user_id: UserId,
) -> Result<HttpResponse> {
    let videos = aggregation.liked_videos(user_id.0).await?;
    Ok(ApiResponse::ok(videos, "liked videos fetched successfully"))
}
