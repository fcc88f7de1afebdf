/// Video endpoints: paginated search, publish, fetch with view/history
/// side effects, owner-checked mutation and the like toggle.
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::db::{user_repo, video_repo};
use crate::error::{AppError, Result};
use crate::handlers::multipart::{self as form, UploadedFile};
use crate::handlers::parse_uuid;
use crate::middleware::UserId;
use crate::models::LikeTargetKind;
use crate::response::ApiResponse;
use crate::services::{AggregationService, MediaStore, ToggleService, VideoSearchFilter};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub query: Option<String>,
    pub sort_by: Option<String>,
    pub sort_type: Option<String>,
    /// Owner filter, uuid as string
    pub user_id: Option<String>,
}

fn ensure_content_type(file: &UploadedFile, field: &str, family: &str) -> Result<()> {
    if !file.content_type.starts_with(family) {
        return Err(AppError::Validation(format!(
            "field '{field}' must be {family}*, got {}",
            file.content_type
        )));
    }
    Ok(())
}

async fn owned_video(
    pool: &PgPool,
    video_id: Uuid,
    user_id: Uuid,
) -> Result<crate::models::Video> {
    let video = video_repo::find_by_id(pool, video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("video does not exist".to_string()))?;

    if video.owner_id != user_id {
        return Err(AppError::Forbidden(
            "only the owner can modify this video".to_string(),
        ));
    }

    Ok(video)
}

/// GET /videos
pub async fn search(
    aggregation: web::Data<AggregationService>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let owner_id = match query.user_id.as_deref() {
        Some(raw) => Some(parse_uuid(raw, "user")?),
        None => None,
    };

    let filter = VideoSearchFilter {
        page: query.page,
        limit: query.limit,
        query: query.query.filter(|q| !q.trim().is_empty()),
        owner_id,
        sort_by: query.sort_by,
        sort_type: query.sort_type,
    };

    let page = aggregation.search_videos(&filter).await?;
    Ok(ApiResponse::ok(page, "videos fetched successfully"))
}

/// POST /videos (multipart: title, description, optional duration,
/// videoFile, thumbnail)
pub async fn publish(
    pool: web::Data<PgPool>,
    media: web::Data<MediaStore>,
    config: web::Data<Config>,
    user_id: UserId,
    payload: Multipart,
) -> Result<HttpResponse> {
    let mut fields = form::collect(payload, config.media.max_upload_bytes).await?;

    let title = fields.require_text("title")?.to_string();
    let description = fields.require_text("description")?.to_string();
    let duration: f64 = match fields.text("duration") {
        Some(raw) => raw
            .trim()
            .parse()
            .ok()
            .filter(|d: &f64| d.is_finite() && *d >= 0.0)
            .ok_or_else(|| {
                AppError::Validation("duration must be a non-negative number".to_string())
            })?,
        None => 0.0,
    };

    let video_file = fields.require_file("videoFile")?;
    ensure_content_type(&video_file, "videoFile", "video/")?;
    let thumbnail = fields.require_file("thumbnail")?;
    ensure_content_type(&thumbnail, "thumbnail", "image/")?;

    let video_url = media
        .upload(
            &MediaStore::object_key("videos", &video_file.filename),
            video_file.bytes,
            &video_file.content_type,
        )
        .await?;

    let thumbnail_url = match media
        .upload(
            &MediaStore::object_key("thumbnails", &thumbnail.filename),
            thumbnail.bytes,
            &thumbnail.content_type,
        )
        .await
    {
        Ok(url) => url,
        Err(e) => {
            // No row exists yet; drop the video blob so nothing dangles.
            if let Err(cleanup) = media.delete_by_url(&video_url).await {
                tracing::warn!("failed to clean up orphaned video blob: {}", cleanup);
            }
            return Err(e);
        }
    };

    let video = video_repo::create_video(
        &pool,
        user_id.0,
        &title,
        &description,
        &video_url,
        &thumbnail_url,
        duration,
    )
    .await?;

    tracing::info!(video_id = %video.id, owner_id = %user_id.0, "video published");
    Ok(ApiResponse::created(video, "video published successfully"))
}

/// GET /videos/{videoId}: counts the view and appends to the caller's
/// watch history.
pub async fn get_by_id(
    pool: web::Data<PgPool>,
    user_id: UserId,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let video_id = parse_uuid(&path.into_inner(), "video")?;

    let mut video = video_repo::find_by_id(&pool, video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("video does not exist".to_string()))?;

    // Unpublished videos are visible to their owner only.
    if !video.is_published && video.owner_id != user_id.0 {
        return Err(AppError::NotFound("video does not exist".to_string()));
    }

    video_repo::increment_views(&pool, video_id).await?;
    video.views += 1;
    user_repo::push_watch_history(&pool, user_id.0, video_id).await?;

    Ok(ApiResponse::ok(video, "video fetched successfully"))
}

/// PATCH /videos/{videoId} (multipart: optional title, description,
/// thumbnail file)
pub async fn update(
    pool: web::Data<PgPool>,
    media: web::Data<MediaStore>,
    config: web::Data<Config>,
    user_id: UserId,
    path: web::Path<String>,
    payload: Multipart,
) -> Result<HttpResponse> {
    let video_id = parse_uuid(&path.into_inner(), "video")?;
    let current = owned_video(&pool, video_id, user_id.0).await?;

    let mut fields = form::collect(payload, config.media.max_upload_bytes).await?;
    let title = fields
        .text("title")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);
    let description = fields.text("description").map(str::to_string);
    let thumbnail = fields.take_file("thumbnail");

    if title.is_none() && description.is_none() && thumbnail.is_none() {
        return Err(AppError::Validation(
            "nothing to update: provide title, description or thumbnail".to_string(),
        ));
    }

    let new_thumbnail_url = match thumbnail {
        Some(file) => {
            ensure_content_type(&file, "thumbnail", "image/")?;
            Some(
                media
                    .upload(
                        &MediaStore::object_key("thumbnails", &file.filename),
                        file.bytes,
                        &file.content_type,
                    )
                    .await?,
            )
        }
        None => None,
    };

    let video = video_repo::update_video(
        &pool,
        video_id,
        title.as_deref(),
        description.as_deref(),
        new_thumbnail_url.as_deref(),
    )
    .await?
    .ok_or_else(|| AppError::NotFound("video does not exist".to_string()))?;

    if new_thumbnail_url.is_some() {
        if let Err(e) = media.delete_by_url(&current.thumbnail_url).await {
            tracing::warn!("failed to delete replaced thumbnail: {}", e);
        }
    }

    Ok(ApiResponse::ok(video, "video updated successfully"))
}

/// DELETE /videos/{videoId}: by id, any authenticated caller. The row
/// goes first, then the blobs.
pub async fn delete(
    pool: web::Data<PgPool>,
    media: web::Data<MediaStore>,
    _user_id: UserId,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let video_id = parse_uuid(&path.into_inner(), "video")?;

    let deleted = video_repo::delete_video(&pool, video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("video does not exist".to_string()))?;

    for url in [&deleted.video_url, &deleted.thumbnail_url] {
        if let Err(e) = media.delete_by_url(url).await {
            tracing::warn!("failed to delete media for removed video: {}", e);
        }
    }

    tracing::info!(video_id = %video_id, "video deleted");
    Ok(ApiResponse::ok(
        serde_json::Value::Null,
        "video deleted successfully",
    ))
}

/// PATCH /videos/{videoId}/publish
pub async fn toggle_publish(
    pool: web::Data<PgPool>,
    user_id: UserId,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let video_id = parse_uuid(&path.into_inner(), "video")?;
    owned_video(&pool, video_id, user_id.0).await?;

    let is_published = video_repo::toggle_publish_status(&pool, video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("video does not exist".to_string()))?;

    Ok(ApiResponse::ok(
        serde_json::json!({ "isPublished": is_published }),
        "publish status toggled",
    ))
}

/// POST /videos/{videoId}/like
pub async fn toggle_like(
    toggles: web::Data<ToggleService>,
    user_id: UserId,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let video_id = parse_uuid(&path.into_inner(), "video")?;
    let outcome = toggles
        .toggle_like(LikeTargetKind::Video, video_id, user_id.0)
        .await?;

    let liked = outcome.is_engaged();
    let message = if liked { "video liked" } else { "video unliked" };
    Ok(ApiResponse::ok(serde_json::json!({ "liked": liked }), message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_guard_checks_the_family() {
        let file = UploadedFile {
            filename: "clip.mp4".into(),
            content_type: "video/mp4".into(),
            bytes: vec![],
        };
        assert!(ensure_content_type(&file, "videoFile", "video/").is_ok());
        assert!(ensure_content_type(&file, "thumbnail", "image/").is_err());
    }
}
