/// Idempotent relation toggles: like/unlike and subscribe/unsubscribe.
///
/// A toggle is a delete-then-maybe-create pair. The delete and the insert
/// are separate statements, so two concurrent toggles for the same
/// (caller, target) can both observe "no row"; the composite uniqueness
/// constraint on the table makes the second insert a no-op, which is
/// reported as `AlreadyPresent` rather than an error.
use crate::error::{AppError, Result};
use crate::models::{Like, LikeTargetKind, Subscription};
use sqlx::PgPool;
use uuid::Uuid;

/// Outcome of a toggle call.
#[derive(Debug, Clone)]
pub enum ToggleOutcome<T> {
    /// The relation did not exist and was created.
    Added(T),
    /// The relation existed and was removed.
    Removed(T),
    /// A concurrent toggle created the relation first; the caller's intent
    /// (relation present) already holds.
    AlreadyPresent,
}

impl<T> ToggleOutcome<T> {
    /// True when the relation exists after the call.
    pub fn is_engaged(&self) -> bool {
        !matches!(self, ToggleOutcome::Removed(_))
    }
}

#[derive(Clone)]
pub struct ToggleService {
    pool: PgPool,
}

impl ToggleService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Flip a like on a video, comment or tweet. Target existence is not
    /// verified here; deleting a target removes its like rows, and a like
    /// placed on an id that never existed never matches any aggregation
    /// join.
    pub async fn toggle_like(
        &self,
        kind: LikeTargetKind,
        target_id: Uuid,
        user_id: Uuid,
    ) -> Result<ToggleOutcome<Like>> {
        let removed = sqlx::query_as::<_, Like>(
            r#"
            DELETE FROM likes
            WHERE user_id = $1 AND target_kind = $2 AND target_id = $3
            RETURNING id, user_id, target_kind, target_id, created_at
            "#,
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(target_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(like) = removed {
            return Ok(ToggleOutcome::Removed(like));
        }

        let inserted = sqlx::query_as::<_, Like>(
            r#"
            INSERT INTO likes (user_id, target_kind, target_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, target_kind, target_id) DO NOTHING
            RETURNING id, user_id, target_kind, target_id, created_at
            "#,
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(target_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match inserted {
            Some(like) => ToggleOutcome::Added(like),
            None => ToggleOutcome::AlreadyPresent,
        })
    }

    /// Flip a subscription of `subscriber_id` to `channel_id`.
    pub async fn toggle_subscription(
        &self,
        subscriber_id: Uuid,
        channel_id: Uuid,
    ) -> Result<ToggleOutcome<Subscription>> {
        if subscriber_id == channel_id {
            return Err(AppError::Validation(
                "cannot subscribe to your own channel".to_string(),
            ));
        }

        let removed = sqlx::query_as::<_, Subscription>(
            r#"
            DELETE FROM subscriptions
            WHERE subscriber_id = $1 AND channel_id = $2
            RETURNING id, subscriber_id, channel_id, created_at
            "#,
        )
        .bind(subscriber_id)
        .bind(channel_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(subscription) = removed {
            return Ok(ToggleOutcome::Removed(subscription));
        }

        let inserted = sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions (subscriber_id, channel_id)
            VALUES ($1, $2)
            ON CONFLICT (subscriber_id, channel_id) DO NOTHING
            RETURNING id, subscriber_id, channel_id, created_at
            "#,
        )
        .bind(subscriber_id)
        .bind(channel_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_subscription_error)?;

        Ok(match inserted {
            Some(subscription) => ToggleOutcome::Added(subscription),
            None => ToggleOutcome::AlreadyPresent,
        })
    }
}

/// Subscriptions reference users on both sides, so a foreign key violation
/// has to be attributed by constraint name: the channel side means the
/// caller named a user that does not exist, the subscriber side means the
/// caller's own account was deleted mid-session.
fn map_subscription_error(err: sqlx::Error) -> AppError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.code().as_deref() == Some("23503") {
            match db_err.constraint() {
                Some("subscriptions_channel_fkey") => {
                    return AppError::NotFound("channel does not exist".to_string());
                }
                Some("subscriptions_subscriber_fkey") => {
                    return AppError::Unauthorized("account no longer exists".to_string());
                }
                _ => {}
            }
        }
    }
    AppError::Database(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn like(kind: LikeTargetKind) -> Like {
        Like {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            target_kind: kind,
            target_id: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn added_and_already_present_are_engaged() {
        assert!(ToggleOutcome::Added(like(LikeTargetKind::Video)).is_engaged());
        assert!(ToggleOutcome::<Like>::AlreadyPresent.is_engaged());
        assert!(!ToggleOutcome::Removed(like(LikeTargetKind::Tweet)).is_engaged());
    }

    #[tokio::test]
    async fn self_subscription_is_rejected_before_any_query() {
        // connect_lazy never opens a connection, proving the guard fires
        // before the store is touched.
        let pool = PgPool::connect_lazy("postgresql://localhost/unreachable").unwrap();
        let service = ToggleService::new(pool);
        let id = Uuid::new_v4();

        match service.toggle_subscription(id, id).await {
            Err(AppError::Validation(msg)) => assert!(msg.contains("own channel")),
            other => panic!("expected validation error, got {:?}", other.map(|_| ())),
        }
    }
}
