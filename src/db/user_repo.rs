use crate::models::User;
use sqlx::PgPool;
use uuid::Uuid;

/// Create a new user; username and email are stored lowercased.
pub async fn create_user(
    pool: &PgPool,
    username: &str,
    email: &str,
    full_name: &str,
    password_hash: &str,
    avatar_url: &str,
    cover_url: Option<&str>,
) -> Result<User, sqlx::Error> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, email, full_name, password_hash, avatar_url, cover_url)
        VALUES (LOWER($1), LOWER($2), $3, $4, $5, $6)
        RETURNING id, username, email, full_name, password_hash, avatar_url, cover_url,
                  refresh_token, created_at, updated_at
        "#,
    )
    .bind(username)
    .bind(email)
    .bind(full_name)
    .bind(password_hash)
    .bind(avatar_url)
    .bind(cover_url)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

pub async fn find_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, full_name, password_hash, avatar_url, cover_url,
               refresh_token, created_at, updated_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Login lookup: matches either username or email, case-insensitively.
pub async fn find_by_username_or_email(
    pool: &PgPool,
    identifier: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, full_name, password_hash, avatar_url, cover_url,
               refresh_token, created_at, updated_at
        FROM users
        WHERE username = LOWER($1) OR email = LOWER($1)
        "#,
    )
    .bind(identifier)
    .fetch_optional(pool)
    .await
}

pub async fn username_or_email_exists(
    pool: &PgPool,
    username: &str,
    email: &str,
) -> Result<bool, sqlx::Error> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM users WHERE username = LOWER($1) OR email = LOWER($2) LIMIT 1",
    )
    .bind(username)
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

pub async fn update_account(
    pool: &PgPool,
    user_id: Uuid,
    full_name: &str,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET full_name = $1, email = LOWER($2), updated_at = NOW()
        WHERE id = $3
        RETURNING id, username, email, full_name, password_hash, avatar_url, cover_url,
                  refresh_token, created_at, updated_at
        "#,
    )
    .bind(full_name)
    .bind(email)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn update_password(
    pool: &PgPool,
    user_id: Uuid,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
        .bind(password_hash)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn update_avatar(
    pool: &PgPool,
    user_id: Uuid,
    avatar_url: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET avatar_url = $1, updated_at = NOW()
        WHERE id = $2
        RETURNING id, username, email, full_name, password_hash, avatar_url, cover_url,
                  refresh_token, created_at, updated_at
        "#,
    )
    .bind(avatar_url)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn update_cover_image(
    pool: &PgPool,
    user_id: Uuid,
    cover_url: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET cover_url = $1, updated_at = NOW()
        WHERE id = $2
        RETURNING id, username, email, full_name, password_hash, avatar_url, cover_url,
                  refresh_token, created_at, updated_at
        "#,
    )
    .bind(cover_url)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Store (or clear, on logout) the user's current refresh token.
pub async fn set_refresh_token(
    pool: &PgPool,
    user_id: Uuid,
    refresh_token: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET refresh_token = $1, updated_at = NOW() WHERE id = $2")
        .bind(refresh_token)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Append a video to the watch history. Re-watching moves the entry to
/// the end of the list rather than duplicating it: the upsert takes a
/// fresh position on conflict, so concurrent views of the same video
/// never trip the primary key.
pub async fn push_watch_history(
    pool: &PgPool,
    user_id: Uuid,
    video_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO watch_history (user_id, video_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id, video_id)
        DO UPDATE SET position = nextval(pg_get_serial_sequence('watch_history', 'position'))
        "#,
    )
    .bind(user_id)
    .bind(video_id)
    .execute(pool)
    .await?;

    Ok(())
}
