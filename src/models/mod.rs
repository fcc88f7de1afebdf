/// Data models for clip-service
///
/// Row types map 1:1 onto tables and derive `sqlx::FromRow`; view models
/// are the read-only projections handlers return, serialized in camelCase
/// to match the public API. Password hashes and refresh tokens never leave
/// the row types.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Target of a like: exactly one kind per row, enforced by the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeTargetKind {
    Video,
    Comment,
    Tweet,
}

impl LikeTargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LikeTargetKind::Video => "video",
            LikeTargetKind::Comment => "comment",
            LikeTargetKind::Tweet => "tweet",
        }
    }
}

impl TryFrom<String> for LikeTargetKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "video" => Ok(LikeTargetKind::Video),
            "comment" => Ok(LikeTargetKind::Comment),
            "tweet" => Ok(LikeTargetKind::Tweet),
            other => Err(format!("unknown like target kind: {other}")),
        }
    }
}

impl std::fmt::Display for LikeTargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub avatar_url: String,
    pub cover_url: Option<String>,
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn into_view(self) -> UserView {
        UserView {
            id: self.id,
            username: self.username,
            email: self.email,
            full_name: self.full_name,
            avatar: self.avatar_url,
            cover_image: self.cover_url,
            created_at: self.created_at,
        }
    }
}

/// Public projection of a user; no credentials.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub video_id: Uuid,
    pub owner_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tweet {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Playlist with its ordered video id list resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistView {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    pub videos: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: Uuid,
    pub user_id: Uuid,
    #[sqlx(try_from = "String")]
    pub target_kind: LikeTargetKind,
    pub target_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Uuid,
    pub subscriber_id: Uuid,
    pub channel_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Trimmed owner join used by search results: `{id, username, avatar}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerRef {
    pub id: Uuid,
    pub username: String,
    pub avatar: String,
}

/// Trimmed owner join used by watch history: `{fullName, username, avatar}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSlim {
    pub full_name: String,
    pub username: String,
    pub avatar: String,
}

/// Search result item: video plus trimmed owner.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoWithOwner {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub video_file: String,
    pub thumbnail: String,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub owner: OwnerRef,
}

/// Watch-history entry: full video with the owner trimmed to three fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchHistoryEntry {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub video_file: String,
    pub thumbnail: String,
    pub duration: f64,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub owner: OwnerSlim,
}

/// Liked-video projection: `{id, title, description, thumbnail, videoFile}`.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikedVideo {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub video_file: String,
}

/// Subscriber / subscribed-channel projection.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub avatar: String,
    pub cover_image: Option<String>,
}

/// Channel profile decorated with subscription counts for a viewer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub subscribers_count: i64,
    pub channels_subscribed_to_count: i64,
    pub is_subscribed: bool,
}

/// Per-video entry in the channel dashboard.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStats {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub video_file: String,
    pub views: i64,
    pub like_count: i64,
}

/// Channel dashboard aggregate.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub subscribers: i64,
    pub total_videos: i64,
    pub total_likes_on_videos: i64,
    pub videos: Vec<VideoStats>,
}

/// Dashboard video listing (no like counts).
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelVideo {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub video_file: String,
    pub views: i64,
}

/// One page of results plus pagination metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T: Serialize> {
    pub docs: Vec<T>,
    pub total_docs: i64,
    pub limit: i64,
    pub page: i64,
    pub total_pages: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl<T: Serialize> Page<T> {
    pub fn new(docs: Vec<T>, total_docs: i64, page: i64, limit: i64) -> Self {
        let total_pages = if total_docs == 0 {
            0
        } else {
            (total_docs + limit - 1) / limit
        };
        Self {
            docs,
            total_docs,
            limit,
            page,
            total_pages,
            has_next_page: page < total_pages,
            has_prev_page: page > 1 && total_pages > 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_target_kind_round_trips() {
        for kind in [
            LikeTargetKind::Video,
            LikeTargetKind::Comment,
            LikeTargetKind::Tweet,
        ] {
            let parsed = LikeTargetKind::try_from(kind.as_str().to_string()).unwrap();
            assert_eq!(parsed, kind);
        }
        assert!(LikeTargetKind::try_from("playlist".to_string()).is_err());
    }

    #[test]
    fn page_metadata_middle_page() {
        let page = Page::new(vec![0u8; 5], 12, 2, 5);
        assert_eq!(page.docs.len(), 5);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next_page);
        assert!(page.has_prev_page);
    }

    #[test]
    fn page_metadata_empty_result() {
        let page: Page<u8> = Page::new(vec![], 0, 1, 10);
        assert_eq!(page.total_pages, 0);
        assert!(!page.has_next_page);
        assert!(!page.has_prev_page);
    }

    #[test]
    fn page_metadata_last_page() {
        let page = Page::new(vec![0u8; 2], 12, 3, 5);
        assert!(!page.has_next_page);
        assert!(page.has_prev_page);
    }

    #[test]
    fn user_view_drops_credentials() {
        let user = User {
            id: Uuid::new_v4(),
            username: "chai".into(),
            email: "chai@example.com".into(),
            full_name: "Chai Aur Code".into(),
            password_hash: "argon2id$...".into(),
            avatar_url: "https://cdn/avatar.png".into(),
            cover_url: None,
            refresh_token: Some("token".into()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(user.into_view()).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("refreshToken").is_none());
        assert_eq!(json["username"], "chai");
    }
}
