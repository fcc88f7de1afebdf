/// Channel dashboard: aggregated stats and the owner's video listing,
/// always for the authenticated caller's own channel.
use actix_web::{web, HttpResponse};

use crate::error::Result;
use crate::middleware::UserId;
use crate::response::ApiResponse;
use crate::services::AggregationService;

/// GET /dashboard/stats
pub async fn stats(
    aggregation: web::Data<AggregationService>,
    user_id: UserId,
) -> Result<HttpResponse> {
    let stats = aggregation.channel_stats(user_id.0).await?;
    Ok(ApiResponse::ok(stats, "channel stats fetched successfully"))
}

/// GET /dashboard/videos
pub async fn videos(
    aggregation: web::Data<AggregationService>,
    user_id: UserId,
) -> Result<HttpResponse> {
    let videos = aggregation.list_channel_videos(user_id.0).await?;
    Ok(ApiResponse::ok(videos, "channel videos fetched successfully"))
}
