use crate::models::{Playlist, PlaylistView};
use sqlx::{PgPool, Row};
use uuid::Uuid;

pub async fn create_playlist(
    pool: &PgPool,
    owner_id: Uuid,
    name: &str,
    description: &str,
) -> Result<Playlist, sqlx::Error> {
    let playlist = sqlx::query_as::<_, Playlist>(
        r#"
        INSERT INTO playlists (owner_id, name, description)
        VALUES ($1, $2, $3)
        RETURNING id, owner_id, name, description, created_at, updated_at
        "#,
    )
    .bind(owner_id)
    .bind(name)
    .bind(description)
    .fetch_one(pool)
    .await?;

    Ok(playlist)
}

pub async fn find_by_id(
    pool: &PgPool,
    playlist_id: Uuid,
) -> Result<Option<Playlist>, sqlx::Error> {
    sqlx::query_as::<_, Playlist>(
        r#"
        SELECT id, owner_id, name, description, created_at, updated_at
        FROM playlists
        WHERE id = $1
        "#,
    )
    .bind(playlist_id)
    .fetch_optional(pool)
    .await
}

/// The playlist's video ids in insertion order.
pub async fn video_ids(pool: &PgPool, playlist_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT video_id
        FROM playlist_videos
        WHERE playlist_id = $1
        ORDER BY position ASC
        "#,
    )
    .bind(playlist_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|row| row.get("video_id")).collect())
}

pub async fn get_playlists_by_owner(
    pool: &PgPool,
    owner_id: Uuid,
) -> Result<Vec<PlaylistView>, sqlx::Error> {
    let playlists = sqlx::query_as::<_, Playlist>(
        r#"
        SELECT id, owner_id, name, description, created_at, updated_at
        FROM playlists
        WHERE owner_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await?;

    let mut views = Vec::with_capacity(playlists.len());
    for playlist in playlists {
        let videos = video_ids(pool, playlist.id).await?;
        views.push(PlaylistView {
            id: playlist.id,
            owner_id: playlist.owner_id,
            name: playlist.name,
            description: playlist.description,
            videos,
            created_at: playlist.created_at,
        });
    }

    Ok(views)
}

/// Add a video to a playlist. Returns false if the video was already
/// present (the composite key rejects duplicates).
pub async fn add_video(
    pool: &PgPool,
    playlist_id: Uuid,
    video_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let inserted: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO playlist_videos (playlist_id, video_id)
        VALUES ($1, $2)
        ON CONFLICT (playlist_id, video_id) DO NOTHING
        RETURNING video_id
        "#,
    )
    .bind(playlist_id)
    .bind(video_id)
    .fetch_optional(pool)
    .await?;

    Ok(inserted.is_some())
}

/// Remove a video from a playlist; returns false if it was not in the list.
pub async fn remove_video(
    pool: &PgPool,
    playlist_id: Uuid,
    video_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM playlist_videos WHERE playlist_id = $1 AND video_id = $2",
    )
    .bind(playlist_id)
    .bind(video_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Partial update of name and description.
pub async fn update_playlist(
    pool: &PgPool,
    playlist_id: Uuid,
    name: Option<&str>,
    description: Option<&str>,
) -> Result<Option<Playlist>, sqlx::Error> {
    sqlx::query_as::<_, Playlist>(
        r#"
        UPDATE playlists
        SET name = COALESCE($1, name),
            description = COALESCE($2, description),
            updated_at = NOW()
        WHERE id = $3
        RETURNING id, owner_id, name, description, created_at, updated_at
        "#,
    )
    .bind(name)
    .bind(description)
    .bind(playlist_id)
    .fetch_optional(pool)
    .await
}

pub async fn delete_playlist(
    pool: &PgPool,
    playlist_id: Uuid,
) -> Result<Option<Playlist>, sqlx::Error> {
    sqlx::query_as::<_, Playlist>(
        r#"
        DELETE FROM playlists
        WHERE id = $1
        RETURNING id, owner_id, name, description, created_at, updated_at
        "#,
    )
    .bind(playlist_id)
    .fetch_optional(pool)
    .await
}
