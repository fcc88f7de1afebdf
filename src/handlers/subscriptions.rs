/// Subscription endpoints: the subscribe toggle plus the two membership
/// listings.
use actix_web::{web, HttpResponse};

use crate::error::Result;
use crate::handlers::parse_uuid;
use crate::middleware::UserId;
use crate::response::ApiResponse;
use crate::services::{AggregationService, ToggleService};

/// POST /subscriptions/{channelId}
pub async fn toggle(
    toggles: web::Data<ToggleService>,
    user_id: UserId,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let channel_id = parse_uuid(&path.into_inner(), "channel")?;
    let outcome = toggles.toggle_subscription(user_id.0, channel_id).await?;

    let subscribed = outcome.is_engaged();
    let message = if subscribed {
        "subscribed to channel"
    } else {
        "unsubscribed from channel"
    };
    Ok(ApiResponse::ok(
        serde_json::json!({ "subscribed": subscribed }),
        message,
    ))
}

/// GET /subscriptions/{channelId}/subscribers
pub async fn subscribers(
    aggregation: web::Data<AggregationService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let channel_id = parse_uuid(&path.into_inner(), "channel")?;
    let subscribers = aggregation.channel_subscribers(channel_id).await?;
    Ok(ApiResponse::ok(subscribers, "subscribers fetched successfully"))
}

/// GET /subscriptions/{channelId}/subscribed: channels the given user
/// subscribes to.
pub async fn subscribed_channels(
    aggregation: web::Data<AggregationService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let subscriber_id = parse_uuid(&path.into_inner(), "channel")?;
    let channels = aggregation.subscribed_channels(subscriber_id).await?;
    Ok(ApiResponse::ok(
        channels,
        "subscribed channels fetched successfully",
    ))
}
