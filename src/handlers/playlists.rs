/// Playlist endpoints: CRUD plus add/remove video. Mutations are
/// owner-checked; reads are public.
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::db::{playlist_repo, video_repo};
use crate::error::{AppError, Result};
use crate::handlers::parse_uuid;
use crate::middleware::UserId;
use crate::models::{Playlist, PlaylistView};
use crate::response::ApiResponse;

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePlaylistRequest {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(length(min = 1, max = 1000))]
    pub description: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePlaylistRequest {
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 1000))]
    pub description: Option<String>,
}

async fn owned_playlist(pool: &PgPool, playlist_id: Uuid, user_id: Uuid) -> Result<Playlist> {
    let playlist = playlist_repo::find_by_id(pool, playlist_id)
        .await?
        .ok_or_else(|| AppError::NotFound("playlist does not exist".to_string()))?;

    if playlist.owner_id != user_id {
        return Err(AppError::Forbidden(
            "only the owner can modify this playlist".to_string(),
        ));
    }

    Ok(playlist)
}

async fn view_of(pool: &PgPool, playlist: Playlist) -> Result<PlaylistView> {
    let videos = playlist_repo::video_ids(pool, playlist.id).await?;
    Ok(PlaylistView {
        id: playlist.id,
        owner_id: playlist.owner_id,
        name: playlist.name,
        description: playlist.description,
        videos,
        created_at: playlist.created_at,
    })
}

/// POST /playlists
pub async fn create(
    pool: web::Data<PgPool>,
    user_id: UserId,
    body: web::Json<CreatePlaylistRequest>,
) -> Result<HttpResponse> {
    body.validate()?;
    let playlist =
        playlist_repo::create_playlist(&pool, user_id.0, body.name.trim(), &body.description)
            .await?;
    let view = view_of(&pool, playlist).await?;
    Ok(ApiResponse::created(view, "playlist created successfully"))
}

/// GET /playlists/user/{userId}
pub async fn list_by_user(pool: web::Data<PgPool>, path: web::Path<String>) -> Result<HttpResponse> {
    let owner_id = parse_uuid(&path.into_inner(), "user")?;
    let playlists = playlist_repo::get_playlists_by_owner(&pool, owner_id).await?;
    Ok(ApiResponse::ok(playlists, "playlists fetched successfully"))
}

/// GET /playlists/{playlistId}
pub async fn get_by_id(pool: web::Data<PgPool>, path: web::Path<String>) -> Result<HttpResponse> {
    let playlist_id = parse_uuid(&path.into_inner(), "playlist")?;
    let playlist = playlist_repo::find_by_id(&pool, playlist_id)
        .await?
        .ok_or_else(|| AppError::NotFound("playlist does not exist".to_string()))?;
    let view = view_of(&pool, playlist).await?;
    Ok(ApiResponse::ok(view, "playlist fetched successfully"))
}

/// PATCH /playlists/{playlistId}
pub async fn update(
    pool: web::Data<PgPool>,
    user_id: UserId,
    path: web::Path<String>,
    body: web::Json<UpdatePlaylistRequest>,
) -> Result<HttpResponse> {
    body.validate()?;
    if body.name.is_none() && body.description.is_none() {
        return Err(AppError::Validation(
            "nothing to update: provide name or description".to_string(),
        ));
    }

    let playlist_id = parse_uuid(&path.into_inner(), "playlist")?;
    owned_playlist(&pool, playlist_id, user_id.0).await?;

    let playlist = playlist_repo::update_playlist(
        &pool,
        playlist_id,
        body.name.as_deref(),
        body.description.as_deref(),
    )
    .await?
    .ok_or_else(|| AppError::NotFound("playlist does not exist".to_string()))?;

    let view = view_of(&pool, playlist).await?;
    Ok(ApiResponse::ok(view, "playlist updated successfully"))
}

/// DELETE /playlists/{playlistId}
pub async fn delete(
    pool: web::Data<PgPool>,
    user_id: UserId,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let playlist_id = parse_uuid(&path.into_inner(), "playlist")?;
    owned_playlist(&pool, playlist_id, user_id.0).await?;

    playlist_repo::delete_playlist(&pool, playlist_id)
        .await?
        .ok_or_else(|| AppError::NotFound("playlist does not exist".to_string()))?;

    Ok(ApiResponse::ok(
        serde_json::Value::Null,
        "playlist deleted successfully",
    ))
}

/// POST /playlists/{playlistId}/videos/{videoId}: adding a video that is
/// already present is reported, never duplicated.
pub async fn add_video(
    pool: web::Data<PgPool>,
    user_id: UserId,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (playlist_raw, video_raw) = path.into_inner();
    let playlist_id = parse_uuid(&playlist_raw, "playlist")?;
    let video_id = parse_uuid(&video_raw, "video")?;

    let playlist = owned_playlist(&pool, playlist_id, user_id.0).await?;
    video_repo::find_by_id(&pool, video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("video does not exist".to_string()))?;

    let added = playlist_repo::add_video(&pool, playlist_id, video_id).await?;
    let view = view_of(&pool, playlist).await?;
    let message = if added {
        "video added to playlist"
    } else {
        "video is already in the playlist"
    };

    Ok(ApiResponse::ok(view, message))
}

/// DELETE /playlists/{playlistId}/videos/{videoId}
pub async fn remove_video(
    pool: web::Data<PgPool>,
    user_id: UserId,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (playlist_raw, video_raw) = path.into_inner();
    let playlist_id = parse_uuid(&playlist_raw, "playlist")?;
    let video_id = parse_uuid(&video_raw, "video")?;

    let playlist = owned_playlist(&pool, playlist_id, user_id.0).await?;

    if !playlist_repo::remove_video(&pool, playlist_id, video_id).await? {
        return Err(AppError::NotFound(
            "video is not in the playlist".to_string(),
        ));
    }

    let view = view_of(&pool, playlist).await?;
    Ok(ApiResponse::ok(view, "video removed from playlist"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_rejects_blank_fields() {
        let body = CreatePlaylistRequest {
            name: String::new(),
            description: "watch later".into(),
        };
        assert!(body.validate().is_err());
    }

    #[test]
    fn update_request_validates_present_fields_only() {
        let body = UpdatePlaylistRequest {
            name: None,
            description: Some("new description".into()),
        };
        assert!(body.validate().is_ok());

        let body = UpdatePlaylistRequest {
            name: Some(String::new()),
            description: None,
        };
        assert!(body.validate().is_err());
    }
}
