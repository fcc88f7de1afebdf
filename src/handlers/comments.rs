/// Comment endpoints: paginated listing per video, add, owner-checked
/// update/delete and the like toggle.
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::db::{comment_repo, video_repo};
use crate::error::{AppError, Result};
use crate::handlers::parse_uuid;
use crate::middleware::UserId;
use crate::models::{Comment, LikeTargetKind, Page};
use crate::response::ApiResponse;
use crate::services::ToggleService;

const DEFAULT_PAGE_LIMIT: i64 = 10;
const MAX_PAGE_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl ListQuery {
    fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CommentBody {
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
}

async fn owned_comment(pool: &PgPool, comment_id: Uuid, user_id: Uuid) -> Result<Comment> {
    let comment = comment_repo::find_by_id(pool, comment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("comment does not exist".to_string()))?;

    if comment.owner_id != user_id {
        return Err(AppError::Forbidden(
            "only the owner can modify this comment".to_string(),
        ));
    }

    Ok(comment)
}

/// GET /videos/{videoId}/comments
pub async fn list(
    pool: web::Data<PgPool>,
    path: web::Path<String>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse> {
    let video_id = parse_uuid(&path.into_inner(), "video")?;

    video_repo::find_by_id(&pool, video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("video does not exist".to_string()))?;

    let page = query.page();
    let limit = query.limit();
    let total = comment_repo::count_comments_by_video(&pool, video_id).await?;
    let docs =
        comment_repo::get_comments_by_video(&pool, video_id, limit, (page - 1) * limit).await?;

    Ok(ApiResponse::ok(
        Page::new(docs, total, page, limit),
        "comments fetched successfully",
    ))
}

/// POST /videos/{videoId}/comments
pub async fn add(
    pool: web::Data<PgPool>,
    user_id: UserId,
    path: web::Path<String>,
    body: web::Json<CommentBody>,
) -> Result<HttpResponse> {
    body.validate()?;
    let video_id = parse_uuid(&path.into_inner(), "video")?;

    video_repo::find_by_id(&pool, video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("video does not exist".to_string()))?;

    let comment =
        comment_repo::create_comment(&pool, video_id, user_id.0, body.content.trim()).await?;

    Ok(ApiResponse::created(comment, "comment added successfully"))
}

/// PATCH /comments/{commentId}
pub async fn update(
    pool: web::Data<PgPool>,
    user_id: UserId,
    path: web::Path<String>,
    body: web::Json<CommentBody>,
) -> Result<HttpResponse> {
    body.validate()?;
    let comment_id = parse_uuid(&path.into_inner(), "comment")?;
    owned_comment(&pool, comment_id, user_id.0).await?;

    let comment = comment_repo::update_comment(&pool, comment_id, body.content.trim())
        .await?
        .ok_or_else(|| AppError::NotFound("comment does not exist".to_string()))?;

    Ok(ApiResponse::ok(comment, "comment updated successfully"))
}

/// DELETE /comments/{commentId}
pub async fn delete(
    pool: web::Data<PgPool>,
    user_id: UserId,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let comment_id = parse_uuid(&path.into_inner(), "comment")?;
    owned_comment(&pool, comment_id, user_id.0).await?;

    if !comment_repo::delete_comment(&pool, comment_id).await? {
        return Err(AppError::NotFound("comment does not exist".to_string()));
    }

    Ok(ApiResponse::ok(
        serde_json::Value::Null,
        "comment deleted successfully",
    ))
}

/// POST /comments/{commentId}/like
pub async fn toggle_like(
    toggles: web::Data<ToggleService>,
    user_id: UserId,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let comment_id = parse_uuid(&path.into_inner(), "comment")?;
    let outcome = toggles
        .toggle_like(LikeTargetKind::Comment, comment_id, user_id.0)
        .await?;

    let liked = outcome.is_engaged();
    let message = if liked { "comment liked" } else { "comment unliked" };
    Ok(ApiResponse::ok(serde_json::json!({ "liked": liked }), message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_clamps_page_and_limit() {
        let query = ListQuery {
            page: Some(-3),
            limit: Some(0),
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), 1);

        let query = ListQuery {
            page: None,
            limit: Some(10_000),
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), MAX_PAGE_LIMIT);
    }

    #[test]
    fn comment_body_rejects_empty_content() {
        let body = CommentBody {
            content: String::new(),
        };
        assert!(body.validate().is_err());
    }
}
