/// Derived, read-only view models joined across the relation tables.
///
/// Everything here is a pure read: channel dashboards, liked-video lists,
/// subscriber lists, channel profiles, watch history and the paginated
/// video search. Mutations live in the repositories and `toggle`.
use crate::error::{AppError, Result};
use crate::models::{
    ChannelProfile, ChannelStats, ChannelUser, ChannelVideo, LikedVideo, OwnerRef, OwnerSlim,
    Page, VideoStats, VideoWithOwner, WatchHistoryEntry,
};
use sqlx::{PgPool, Row};
use uuid::Uuid;

const DEFAULT_PAGE_LIMIT: i64 = 10;
const MAX_PAGE_LIMIT: i64 = 100;

/// Recognized options for the paginated video search.
#[derive(Debug, Clone, Default)]
pub struct VideoSearchFilter {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Case-insensitive substring match against title OR description
    pub query: Option<String>,
    pub owner_id: Option<Uuid>,
    pub sort_by: Option<String>,
    pub sort_type: Option<String>,
}

impl VideoSearchFilter {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT)
    }

    /// Sort column, restricted to a whitelist; anything else falls back to
    /// creation time. The public API spells fields in camelCase.
    pub fn sort_column(&self) -> &'static str {
        match self.sort_by.as_deref() {
            Some("views") => "views",
            Some("duration") => "duration",
            Some("title") => "title",
            Some("createdAt") | Some("created_at") | None => "created_at",
            Some(_) => "created_at",
        }
    }

    pub fn sort_direction(&self) -> &'static str {
        match self.sort_type.as_deref() {
            Some("asc") => "ASC",
            _ => "DESC",
        }
    }
}

#[derive(Clone)]
pub struct AggregationService {
    pool: PgPool,
}

impl AggregationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Channel dashboard: subscriber count, per-video like counts and the
    /// like total across all of the channel's videos.
    pub async fn channel_stats(&self, channel_id: Uuid) -> Result<ChannelStats> {
        let subscribers: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM subscriptions WHERE channel_id = $1")
                .bind(channel_id)
                .fetch_one(&self.pool)
                .await?;

        let videos = sqlx::query_as::<_, VideoStats>(
            r#"
            SELECT v.id, v.title, v.description,
                   v.thumbnail_url AS thumbnail, v.video_url AS video_file, v.views,
                   COUNT(l.id) AS like_count
            FROM videos v
            LEFT JOIN likes l ON l.target_kind = 'video' AND l.target_id = v.id
            WHERE v.owner_id = $1
            GROUP BY v.id
            ORDER BY v.created_at DESC
            "#,
        )
        .bind(channel_id)
        .fetch_all(&self.pool)
        .await?;

        let total_likes = videos.iter().map(|v| v.like_count).sum();

        Ok(ChannelStats {
            subscribers: subscribers.0,
            total_videos: videos.len() as i64,
            total_likes_on_videos: total_likes,
            videos,
        })
    }

    /// All videos owned by a channel, projected without like counts.
    pub async fn list_channel_videos(&self, channel_id: Uuid) -> Result<Vec<ChannelVideo>> {
        let videos = sqlx::query_as::<_, ChannelVideo>(
            r#"
            SELECT id, owner_id, title, description,
                   thumbnail_url AS thumbnail, video_url AS video_file, views
            FROM videos
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(channel_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(videos)
    }

    /// Distinct videos the user has liked. Zero likes is an empty list,
    /// not an error.
    pub async fn liked_videos(&self, user_id: Uuid) -> Result<Vec<LikedVideo>> {
        let videos = sqlx::query_as::<_, LikedVideo>(
            r#"
            SELECT DISTINCT v.id, v.title, v.description,
                   v.thumbnail_url AS thumbnail, v.video_url AS video_file
            FROM likes l
            JOIN videos v ON v.id = l.target_id
            WHERE l.user_id = $1 AND l.target_kind = 'video'
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(videos)
    }

    /// Users subscribed to the given channel.
    pub async fn channel_subscribers(&self, channel_id: Uuid) -> Result<Vec<ChannelUser>> {
        let subscribers = sqlx::query_as::<_, ChannelUser>(
            r#"
            SELECT u.id, u.username, u.email,
                   u.avatar_url AS avatar, u.cover_url AS cover_image
            FROM subscriptions s
            JOIN users u ON u.id = s.subscriber_id
            WHERE s.channel_id = $1
            ORDER BY s.created_at DESC
            "#,
        )
        .bind(channel_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(subscribers)
    }

    /// Channels the given user subscribes to.
    pub async fn subscribed_channels(&self, subscriber_id: Uuid) -> Result<Vec<ChannelUser>> {
        let channels = sqlx::query_as::<_, ChannelUser>(
            r#"
            SELECT u.id, u.username, u.email,
                   u.avatar_url AS avatar, u.cover_url AS cover_image
            FROM subscriptions s
            JOIN users u ON u.id = s.channel_id
            WHERE s.subscriber_id = $1
            ORDER BY s.created_at DESC
            "#,
        )
        .bind(subscriber_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(channels)
    }

    /// A channel profile matched by lowercased username, decorated with
    /// subscription counts and whether the viewer subscribes to it.
    /// Unknown usernames are NotFound, never an empty success.
    pub async fn channel_profile(&self, username: &str, viewer_id: Uuid) -> Result<ChannelProfile> {
        let row = sqlx::query(
            r#"
            SELECT u.id, u.username, u.full_name, u.email, u.avatar_url, u.cover_url,
                   (SELECT COUNT(*) FROM subscriptions WHERE channel_id = u.id)
                       AS subscribers_count,
                   (SELECT COUNT(*) FROM subscriptions WHERE subscriber_id = u.id)
                       AS channels_subscribed_to_count,
                   EXISTS(SELECT 1 FROM subscriptions
                          WHERE subscriber_id = $2 AND channel_id = u.id)
                       AS is_subscribed
            FROM users u
            WHERE u.username = LOWER($1)
            "#,
        )
        .bind(username)
        .bind(viewer_id)
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or_else(|| AppError::NotFound("channel does not exist".to_string()))?;

        Ok(ChannelProfile {
            id: row.get("id"),
            username: row.get("username"),
            full_name: row.get("full_name"),
            email: row.get("email"),
            avatar: row.get("avatar_url"),
            cover_image: row.get("cover_url"),
            subscribers_count: row.get("subscribers_count"),
            channels_subscribed_to_count: row.get("channels_subscribed_to_count"),
            is_subscribed: row.get("is_subscribed"),
        })
    }

    /// The caller's watch history in stored order, each entry's owner
    /// trimmed to `{fullName, username, avatar}`.
    pub async fn watch_history(&self, user_id: Uuid) -> Result<Vec<WatchHistoryEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT v.id, v.title, v.description, v.video_url, v.thumbnail_url,
                   v.duration, v.views, v.created_at,
                   u.full_name AS owner_full_name,
                   u.username AS owner_username,
                   u.avatar_url AS owner_avatar
            FROM watch_history wh
            JOIN videos v ON v.id = wh.video_id
            JOIN users u ON u.id = v.owner_id
            WHERE wh.user_id = $1
            ORDER BY wh.position ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let entries = rows
            .into_iter()
            .map(|row| WatchHistoryEntry {
                id: row.get("id"),
                title: row.get("title"),
                description: row.get("description"),
                video_file: row.get("video_url"),
                thumbnail: row.get("thumbnail_url"),
                duration: row.get("duration"),
                views: row.get("views"),
                created_at: row.get("created_at"),
                owner: OwnerSlim {
                    full_name: row.get("owner_full_name"),
                    username: row.get("owner_username"),
                    avatar: row.get("owner_avatar"),
                },
            })
            .collect();

        Ok(entries)
    }

    /// Paginated video search with optional text query and owner filter,
    /// joined with a trimmed owner projection.
    pub async fn search_videos(&self, filter: &VideoSearchFilter) -> Result<Page<VideoWithOwner>> {
        let page = filter.page();
        let limit = filter.limit();
        let offset = (page - 1) * limit;

        let total: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM videos v
            WHERE ($1::text IS NULL
                   OR v.title ILIKE '%' || $1 || '%'
                   OR v.description ILIKE '%' || $1 || '%')
              AND ($2::uuid IS NULL OR v.owner_id = $2)
            "#,
        )
        .bind(filter.query.as_deref())
        .bind(filter.owner_id)
        .fetch_one(&self.pool)
        .await?;

        // Sort column and direction come from a fixed whitelist, never from
        // raw input.
        let sql = format!(
            r#"
            SELECT v.id, v.title, v.description, v.video_url, v.thumbnail_url,
                   v.duration, v.views, v.is_published, v.created_at,
                   u.id AS owner_id, u.username AS owner_username,
                   u.avatar_url AS owner_avatar
            FROM videos v
            JOIN users u ON u.id = v.owner_id
            WHERE ($1::text IS NULL
                   OR v.title ILIKE '%' || $1 || '%'
                   OR v.description ILIKE '%' || $1 || '%')
              AND ($2::uuid IS NULL OR v.owner_id = $2)
            ORDER BY v.{} {}
            LIMIT $3 OFFSET $4
            "#,
            filter.sort_column(),
            filter.sort_direction(),
        );

        let rows = sqlx::query(&sql)
            .bind(filter.query.as_deref())
            .bind(filter.owner_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let docs = rows
            .into_iter()
            .map(|row| VideoWithOwner {
                id: row.get("id"),
                title: row.get("title"),
                description: row.get("description"),
                video_file: row.get("video_url"),
                thumbnail: row.get("thumbnail_url"),
                duration: row.get("duration"),
                views: row.get("views"),
                is_published: row.get("is_published"),
                created_at: row.get("created_at"),
                owner: OwnerRef {
                    id: row.get("owner_id"),
                    username: row.get("owner_username"),
                    avatar: row.get("owner_avatar"),
                },
            })
            .collect();

        Ok(Page::new(docs, total.0, page, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_defaults() {
        let filter = VideoSearchFilter::default();
        assert_eq!(filter.page(), 1);
        assert_eq!(filter.limit(), DEFAULT_PAGE_LIMIT);
        assert_eq!(filter.sort_column(), "created_at");
        assert_eq!(filter.sort_direction(), "DESC");
    }

    #[test]
    fn filter_clamps_out_of_range_values() {
        let filter = VideoSearchFilter {
            page: Some(0),
            limit: Some(10_000),
            ..Default::default()
        };
        assert_eq!(filter.page(), 1);
        assert_eq!(filter.limit(), MAX_PAGE_LIMIT);
    }

    #[test]
    fn sort_whitelist_rejects_unknown_columns() {
        let filter = VideoSearchFilter {
            sort_by: Some("password_hash; DROP TABLE users".to_string()),
            sort_type: Some("sideways".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.sort_column(), "created_at");
        assert_eq!(filter.sort_direction(), "DESC");
    }

    #[test]
    fn sort_accepts_camel_case_created_at() {
        let filter = VideoSearchFilter {
            sort_by: Some("createdAt".to_string()),
            sort_type: Some("asc".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.sort_column(), "created_at");
        assert_eq!(filter.sort_direction(), "ASC");
    }
}
