/// Identity and account endpoints: register, login, token rotation,
/// password change, profile reads and avatar/cover swaps.
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::config::Config;
use crate::db::user_repo;
use crate::error::{AppError, Result};
use crate::handlers::multipart::{self as form, UploadedFile};
use crate::middleware::UserId;
use crate::response::ApiResponse;
use crate::security::{jwt, password};
use crate::services::{AggregationService, MediaStore};

#[derive(Debug, Validate)]
struct RegisterInput {
    #[validate(length(min = 3, max = 32))]
    username: String,
    #[validate(email)]
    email: String,
    #[validate(length(min = 1, max = 128))]
    full_name: String,
    #[validate(length(min = 8, max = 128))]
    password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Either field works; the lookup matches username OR email.
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    #[validate(length(min = 1, max = 128))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
}

fn ensure_image(file: &UploadedFile, field: &str) -> Result<()> {
    if !file.content_type.starts_with("image/") {
        return Err(AppError::Validation(format!(
            "field '{field}' must be an image, got {}",
            file.content_type
        )));
    }
    Ok(())
}

/// Unique-violation from the user insert means a concurrent registration
/// won the race after our existence check.
fn map_unique_violation(err: sqlx::Error) -> AppError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.code().as_deref() == Some("23505") {
            return AppError::Conflict(
                "a user with that email or username already exists".to_string(),
            );
        }
    }
    AppError::Database(err)
}

/// POST /users/register (multipart: fullName, email, username, password,
/// avatar file required, coverImage file optional)
pub async fn register(
    pool: web::Data<PgPool>,
    media: web::Data<MediaStore>,
    config: web::Data<Config>,
    payload: Multipart,
) -> Result<HttpResponse> {
    let mut fields = form::collect(payload, config.media.max_upload_bytes).await?;

    let input = RegisterInput {
        username: fields.require_text("username")?.to_string(),
        email: fields.require_text("email")?.to_string(),
        full_name: fields.require_text("fullName")?.to_string(),
        password: fields.require_text("password")?.to_string(),
    };
    input.validate()?;

    if user_repo::username_or_email_exists(&pool, &input.username, &input.email).await? {
        return Err(AppError::Conflict(
            "a user with that email or username already exists".to_string(),
        ));
    }

    let avatar = fields.require_file("avatar")?;
    ensure_image(&avatar, "avatar")?;
    let cover = fields.take_file("coverImage");
    if let Some(cover) = &cover {
        ensure_image(cover, "coverImage")?;
    }

    let password_hash = password::hash_password(&input.password)?;

    // Media goes up before the row exists; a failed upload leaves no
    // partial user behind.
    let avatar_url = media
        .upload(
            &MediaStore::object_key("avatars", &avatar.filename),
            avatar.bytes,
            &avatar.content_type,
        )
        .await?;
    let cover_url = match cover {
        Some(cover) => Some(
            media
                .upload(
                    &MediaStore::object_key("covers", &cover.filename),
                    cover.bytes,
                    &cover.content_type,
                )
                .await?,
        ),
        None => None,
    };

    let user = user_repo::create_user(
        &pool,
        &input.username,
        &input.email,
        &input.full_name,
        &password_hash,
        &avatar_url,
        cover_url.as_deref(),
    )
    .await
    .map_err(map_unique_violation)?;

    tracing::info!(user_id = %user.id, "user registered");
    Ok(ApiResponse::created(
        user.into_view(),
        "user registered successfully",
    ))
}

/// POST /users/login
pub async fn login(
    pool: web::Data<PgPool>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let body = body.into_inner();
    let identifier = body
        .username
        .or(body.email)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Validation("username or email is required".to_string()))?;

    let user = user_repo::find_by_username_or_email(&pool, &identifier)
        .await?
        .ok_or_else(|| AppError::Unauthorized("invalid credentials".to_string()))?;

    if !password::verify_password(&body.password, &user.password_hash)? {
        return Err(AppError::Unauthorized("invalid credentials".to_string()));
    }

    let tokens = jwt::generate_token_pair(user.id, &user.username)?;
    user_repo::set_refresh_token(&pool, user.id, Some(&tokens.refresh_token)).await?;

    tracing::info!(user_id = %user.id, "user logged in");
    Ok(ApiResponse::ok(
        serde_json::json!({ "user": user.into_view(), "tokens": tokens }),
        "user logged in successfully",
    ))
}

/// POST /users/logout
pub async fn logout(pool: web::Data<PgPool>, user_id: UserId) -> Result<HttpResponse> {
    user_repo::set_refresh_token(&pool, user_id.0, None).await?;
    Ok(ApiResponse::ok(
        serde_json::Value::Null,
        "user logged out successfully",
    ))
}

/// POST /users/refresh-token: rotate the pair if the presented refresh
/// token matches the one on record.
pub async fn refresh_token(
    pool: web::Data<PgPool>,
    body: web::Json<RefreshRequest>,
) -> Result<HttpResponse> {
    let data = jwt::validate_refresh_token(&body.refresh_token)
        .map_err(|_| AppError::Unauthorized("invalid or expired refresh token".to_string()))?;
    let user_id = Uuid::parse_str(&data.claims.sub)
        .map_err(|_| AppError::Unauthorized("invalid refresh token".to_string()))?;

    let user = user_repo::find_by_id(&pool, user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("invalid refresh token".to_string()))?;

    if user.refresh_token.as_deref() != Some(body.refresh_token.as_str()) {
        return Err(AppError::Unauthorized(
            "refresh token is expired or already used".to_string(),
        ));
    }

    let tokens = jwt::generate_token_pair(user.id, &user.username)?;
    user_repo::set_refresh_token(&pool, user.id, Some(&tokens.refresh_token)).await?;

    Ok(ApiResponse::ok(tokens, "tokens refreshed successfully"))
}

/// POST /users/change-password
pub async fn change_password(
    pool: web::Data<PgPool>,
    user_id: UserId,
    body: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse> {
    body.validate()?;

    let user = user_repo::find_by_id(&pool, user_id.0)
        .await?
        .ok_or_else(|| AppError::Unauthorized("user no longer exists".to_string()))?;

    if !password::verify_password(&body.old_password, &user.password_hash)? {
        return Err(AppError::Unauthorized("old password is incorrect".to_string()));
    }

    let new_hash = password::hash_password(&body.new_password)?;
    user_repo::update_password(&pool, user.id, &new_hash).await?;

    Ok(ApiResponse::ok(
        serde_json::Value::Null,
        "password changed successfully",
    ))
}

/// GET /users/me
pub async fn current_user(pool: web::Data<PgPool>, user_id: UserId) -> Result<HttpResponse> {
    let user = user_repo::find_by_id(&pool, user_id.0)
        .await?
        .ok_or_else(|| AppError::Unauthorized("user no longer exists".to_string()))?;

    Ok(ApiResponse::ok(user.into_view(), "current user fetched"))
}

/// PATCH /users/me
pub async fn update_account(
    pool: web::Data<PgPool>,
    user_id: UserId,
    body: web::Json<UpdateAccountRequest>,
) -> Result<HttpResponse> {
    body.validate()?;

    let user = user_repo::update_account(&pool, user_id.0, &body.full_name, &body.email)
        .await
        .map_err(map_unique_violation)?
        .ok_or_else(|| AppError::Unauthorized("user no longer exists".to_string()))?;

    Ok(ApiResponse::ok(
        user.into_view(),
        "account details updated successfully",
    ))
}

/// PATCH /users/avatar (multipart: avatar file)
pub async fn update_avatar(
    pool: web::Data<PgPool>,
    media: web::Data<MediaStore>,
    config: web::Data<Config>,
    user_id: UserId,
    payload: Multipart,
) -> Result<HttpResponse> {
    let mut fields = form::collect(payload, config.media.max_upload_bytes).await?;
    let file = fields.require_file("avatar")?;
    ensure_image(&file, "avatar")?;

    let current = user_repo::find_by_id(&pool, user_id.0)
        .await?
        .ok_or_else(|| AppError::Unauthorized("user no longer exists".to_string()))?;

    let url = media
        .upload(
            &MediaStore::object_key("avatars", &file.filename),
            file.bytes,
            &file.content_type,
        )
        .await?;
    let user = user_repo::update_avatar(&pool, user_id.0, &url)
        .await?
        .ok_or_else(|| AppError::Unauthorized("user no longer exists".to_string()))?;

    // Old blob is removed only after the new URL is on record.
    if let Err(e) = media.delete_by_url(&current.avatar_url).await {
        tracing::warn!("failed to delete replaced avatar: {}", e);
    }

    Ok(ApiResponse::ok(user.into_view(), "avatar updated successfully"))
}

/// PATCH /users/cover-image (multipart: coverImage file)
pub async fn update_cover_image(
    pool: web::Data<PgPool>,
    media: web::Data<MediaStore>,
    config: web::Data<Config>,
    user_id: UserId,
    payload: Multipart,
) -> Result<HttpResponse> {
    let mut fields = form::collect(payload, config.media.max_upload_bytes).await?;
    let file = fields.require_file("coverImage")?;
    ensure_image(&file, "coverImage")?;

    let current = user_repo::find_by_id(&pool, user_id.0)
        .await?
        .ok_or_else(|| AppError::Unauthorized("user no longer exists".to_string()))?;

    let url = media
        .upload(
            &MediaStore::object_key("covers", &file.filename),
            file.bytes,
            &file.content_type,
        )
        .await?;
    let user = user_repo::update_cover_image(&pool, user_id.0, &url)
        .await?
        .ok_or_else(|| AppError::Unauthorized("user no longer exists".to_string()))?;

    if let Some(old) = current.cover_url {
        if let Err(e) = media.delete_by_url(&old).await {
            tracing::warn!("failed to delete replaced cover image: {}", e);
        }
    }

    Ok(ApiResponse::ok(
        user.into_view(),
        "cover image updated successfully",
    ))
}

/// GET /users/c/{username}
pub async fn channel_profile(
    aggregation: web::Data<AggregationService>,
    user_id: UserId,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let username = path.into_inner();
    if username.trim().is_empty() {
        return Err(AppError::Validation("username is required".to_string()));
    }

    let profile = aggregation.channel_profile(&username, user_id.0).await?;
    Ok(ApiResponse::ok(profile, "channel profile fetched"))
}

/// GET /users/history
pub async fn watch_history(
    aggregation: web::Data<AggregationService>,
    user_id: UserId,
) -> Result<HttpResponse> {
    let history = aggregation.watch_history(user_id.0).await?;
    Ok(ApiResponse::ok(history, "watch history fetched"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_input_rejects_short_passwords() {
        let input = RegisterInput {
            username: "chai".into(),
            email: "chai@example.com".into(),
            full_name: "Chai Aur Code".into(),
            password: "short".into(),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn register_input_rejects_bad_email() {
        let input = RegisterInput {
            username: "chai".into(),
            email: "not-an-email".into(),
            full_name: "Chai Aur Code".into(),
            password: "longenough".into(),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn image_guard_rejects_non_images() {
        let file = UploadedFile {
            filename: "video.mp4".into(),
            content_type: "video/mp4".into(),
            bytes: vec![],
        };
        assert!(ensure_image(&file, "avatar").is_err());

        let file = UploadedFile {
            filename: "pic.png".into(),
            content_type: "image/png".into(),
            bytes: vec![],
        };
        assert!(ensure_image(&file, "avatar").is_ok());
    }
}
