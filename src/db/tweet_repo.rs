use crate::models::Tweet;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn create_tweet(
    pool: &PgPool,
    owner_id: Uuid,
    content: &str,
) -> Result<Tweet, sqlx::Error> {
    let tweet = sqlx::query_as::<_, Tweet>(
        r#"
        INSERT INTO tweets (owner_id, content)
        VALUES ($1, $2)
        RETURNING id, owner_id, content, created_at, updated_at
        "#,
    )
    .bind(owner_id)
    .bind(content)
    .fetch_one(pool)
    .await?;

    Ok(tweet)
}

/// All tweets by a user, newest first
pub async fn get_tweets_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Tweet>, sqlx::Error> {
    sqlx::query_as::<_, Tweet>(
        r#"
        SELECT id, owner_id, content, created_at, updated_at
        FROM tweets
        WHERE owner_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await
}

pub async fn update_tweet(
    pool: &PgPool,
    tweet_id: Uuid,
    content: &str,
) -> Result<Option<Tweet>, sqlx::Error> {
    sqlx::query_as::<_, Tweet>(
        r#"
        UPDATE tweets
        SET content = $1, updated_at = NOW()
        WHERE id = $2
        RETURNING id, owner_id, content, created_at, updated_at
        "#,
    )
    .bind(content)
    .bind(tweet_id)
    .fetch_optional(pool)
    .await
}

/// Delete a tweet together with its like rows; likes carry no FK on
/// their polymorphic target.
pub async fn delete_tweet(pool: &PgPool, tweet_id: Uuid) -> Result<Option<Tweet>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM likes WHERE target_kind = 'tweet' AND target_id = $1")
        .bind(tweet_id)
        .execute(&mut *tx)
        .await?;

    let tweet = sqlx::query_as::<_, Tweet>(
        r#"
        DELETE FROM tweets
        WHERE id = $1
        RETURNING id, owner_id, content, created_at, updated_at
        "#,
    )
    .bind(tweet_id)
    .fetch_optional(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(tweet)
}
