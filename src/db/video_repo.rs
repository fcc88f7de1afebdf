use crate::models::Video;
use sqlx::PgPool;
use uuid::Uuid;

/// Insert a video row after its media has been uploaded.
pub async fn create_video(
    pool: &PgPool,
    owner_id: Uuid,
    title: &str,
    description: &str,
    video_url: &str,
    thumbnail_url: &str,
    duration: f64,
) -> Result<Video, sqlx::Error> {
    let video = sqlx::query_as::<_, Video>(
        r#"
        INSERT INTO videos (owner_id, title, description, video_url, thumbnail_url, duration)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, owner_id, title, description, video_url, thumbnail_url, duration,
                  views, is_published, created_at, updated_at
        "#,
    )
    .bind(owner_id)
    .bind(title)
    .bind(description)
    .bind(video_url)
    .bind(thumbnail_url)
    .bind(duration)
    .fetch_one(pool)
    .await?;

    Ok(video)
}

pub async fn find_by_id(pool: &PgPool, video_id: Uuid) -> Result<Option<Video>, sqlx::Error> {
    sqlx::query_as::<_, Video>(
        r#"
        SELECT id, owner_id, title, description, video_url, thumbnail_url, duration,
               views, is_published, created_at, updated_at
        FROM videos
        WHERE id = $1
        "#,
    )
    .bind(video_id)
    .fetch_optional(pool)
    .await
}

pub async fn increment_views(pool: &PgPool, video_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE videos SET views = views + 1 WHERE id = $1")
        .bind(video_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Partial update of title, description and thumbnail. `None` fields keep
/// their current value.
pub async fn update_video(
    pool: &PgPool,
    video_id: Uuid,
    title: Option<&str>,
    description: Option<&str>,
    thumbnail_url: Option<&str>,
) -> Result<Option<Video>, sqlx::Error> {
    sqlx::query_as::<_, Video>(
        r#"
        UPDATE videos
        SET title = COALESCE($1, title),
            description = COALESCE($2, description),
            thumbnail_url = COALESCE($3, thumbnail_url),
            updated_at = NOW()
        WHERE id = $4
        RETURNING id, owner_id, title, description, video_url, thumbnail_url, duration,
                  views, is_published, created_at, updated_at
        "#,
    )
    .bind(title)
    .bind(description)
    .bind(thumbnail_url)
    .bind(video_id)
    .fetch_optional(pool)
    .await
}

/// Delete a video, returning the deleted row so its media can be removed
/// from the blob store afterwards.
///
/// Likes have no FK on their polymorphic target, so the rows for the
/// video and for its comments go in the same transaction as the video;
/// comments, playlist entries and history rows cascade from the row
/// delete itself.
pub async fn delete_video(pool: &PgPool, video_id: Uuid) -> Result<Option<Video>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        DELETE FROM likes
        WHERE (target_kind = 'video' AND target_id = $1)
           OR (target_kind = 'comment'
               AND target_id IN (SELECT id FROM comments WHERE video_id = $1))
        "#,
    )
    .bind(video_id)
    .execute(&mut *tx)
    .await?;

    let video = sqlx::query_as::<_, Video>(
        r#"
        DELETE FROM videos
        WHERE id = $1
        RETURNING id, owner_id, title, description, video_url, thumbnail_url, duration,
                  views, is_published, created_at, updated_at
        "#,
    )
    .bind(video_id)
    .fetch_optional(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(video)
}

/// Flip the publish flag; returns the new state.
pub async fn toggle_publish_status(
    pool: &PgPool,
    video_id: Uuid,
) -> Result<Option<bool>, sqlx::Error> {
    let row: Option<(bool,)> = sqlx::query_as(
        r#"
        UPDATE videos
        SET is_published = NOT is_published, updated_at = NOW()
        WHERE id = $1
        RETURNING is_published
        "#,
    )
    .bind(video_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(published,)| published))
}
