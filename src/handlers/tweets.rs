/// Tweet endpoints: create, list the caller's tweets, update, delete and
/// the like toggle.
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use validator::Validate;

use crate::db::tweet_repo;
use crate::error::{AppError, Result};
use crate::handlers::parse_uuid;
use crate::middleware::UserId;
use crate::models::LikeTargetKind;
use crate::response::ApiResponse;
use crate::services::ToggleService;

#[derive(Debug, Deserialize, Validate)]
pub struct TweetBody {
    #[validate(length(min = 1, max = 500))]
    pub content: String,
}

/// POST /tweets
pub async fn create(
    pool: web::Data<PgPool>,
    user_id: UserId,
    body: web::Json<TweetBody>,
) -> Result<HttpResponse> {
    body.validate()?;
    let tweet = tweet_repo::create_tweet(&pool, user_id.0, body.content.trim()).await?;
    Ok(ApiResponse::created(tweet, "tweet created successfully"))
}

/// GET /tweets: the caller's tweets, newest first.
pub async fn list_mine(pool: web::Data<PgPool>, user_id: UserId) -> Result<HttpResponse> {
    let tweets = tweet_repo::get_tweets_by_owner(&pool, user_id.0).await?;
    Ok(ApiResponse::ok(tweets, "tweets fetched successfully"))
}

/// PATCH /tweets/{tweetId}
pub async fn update(
    pool: web::Data<PgPool>,
    _user_id: UserId,
    path: web::Path<String>,
    body: web::Json<TweetBody>,
) -> Result<HttpResponse> {
    body.validate()?;
    let tweet_id = parse_uuid(&path.into_inner(), "tweet")?;

    let tweet = tweet_repo::update_tweet(&pool, tweet_id, body.content.trim())
        .await?
        .ok_or_else(|| AppError::NotFound("tweet does not exist".to_string()))?;

    Ok(ApiResponse::ok(tweet, "tweet updated successfully"))
}

/// DELETE /tweets/{tweetId}: by id, any authenticated caller.
pub async fn delete(
    pool: web::Data<PgPool>,
    _user_id: UserId,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let tweet_id = parse_uuid(&path.into_inner(), "tweet")?;

    tweet_repo::delete_tweet(&pool, tweet_id)
        .await?
        .ok_or_else(|| AppError::NotFound("tweet does not exist".to_string()))?;

    Ok(ApiResponse::ok(
        serde_json::Value::Null,
        "tweet deleted successfully",
    ))
}

/// POST /tweets/{tweetId}/like
pub async fn toggle_like(
    toggles: web::Data<ToggleService>,
    user_id: UserId,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let tweet_id = parse_uuid(&path.into_inner(), "tweet")?;
    let outcome = toggles
        .toggle_like(LikeTargetKind::Tweet, tweet_id, user_id.0)
        .await?;

    let liked = outcome.is_engaged();
    let message = if liked { "tweet liked" } else { "tweet unliked" };
    Ok(ApiResponse::ok(serde_json::json!({ "liked": liked }), message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tweet_body_enforces_length() {
        assert!(TweetBody {
            content: String::new()
        }
        .validate()
        .is_err());
        assert!(TweetBody {
            content: "x".repeat(501)
        }
        .validate()
        .is_err());
        assert!(TweetBody {
            content: "hello".into()
        }
        .validate()
        .is_ok());
    }
}
