// SPDX-License-Identifier: MPL-2.0

use chrono::Datelike;
use serde::{Deserialize, Serialize};

/// Author name shown when the profile join comes back empty.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Decoupled from the wire tokens so the rest of the app owns the API boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
}

/// Query scope for the memory feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedMode {
    /// Only the signed-in user's memories.
    Mine,
    /// Everything the store lets us see.
    Explore,
}

impl FeedMode {
    pub fn is_mine(self) -> bool {
        matches!(self, FeedMode::Mine)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FeedMode::Mine => "mine",
            FeedMode::Explore => "explore",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "mine" => Some(FeedMode::Mine),
            "explore" => Some(FeedMode::Explore),
            _ => None,
        }
    }
}

/// A geotagged journal entry, annotated for display.
#[derive(Debug, Clone)]
pub struct Memory {
    pub id: i64,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    /// ISO calendar date, `YYYY-MM-DD`.
    pub date: String,
    pub year: i32,
    pub lat: f64,
    pub lng: f64,
    pub media_url: Option<String>,
    /// Joined author name, `UNKNOWN_AUTHOR` when the profile row is missing.
    pub username: String,
    /// Count of like rows at fetch time.
    pub like_count: u32,
    /// Whether the signed-in user already liked this memory.
    pub viewer_liked: bool,
}

impl Memory {
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

/// Derive the calendar year from an ISO date string.
pub fn year_of(date: &str) -> Option<i32> {
    chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .map(|d| d.year())
}

/// Draft of a memory about to be inserted.
#[derive(Debug, Clone)]
pub struct NewMemory {
    pub title: String,
    pub description: Option<String>,
    pub date: String,
    pub lat: f64,
    pub lng: f64,
    pub media_url: Option<String>,
}

impl NewMemory {
    /// The stored `year` column is always the calendar year of `date`.
    pub fn year(&self) -> Option<i32> {
        year_of(&self.date)
    }
}

/// A user's public identity row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub username: String,
    pub is_private: bool,
}

/// Raw `memories` row as PostgREST returns it, with embedded joins.
#[derive(Debug, Deserialize)]
pub(crate) struct MemoryRow {
    pub id: i64,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub date: String,
    #[serde(default)]
    pub year: Option<i32>,
    pub location_lat: f64,
    pub location_lng: f64,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub profiles: Option<ProfileJoin>,
    #[serde(default)]
    pub likes: Vec<LikeAggregate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileJoin {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LikeAggregate {
    pub count: u32,
}

impl MemoryRow {
    /// Attach the display annotations: first join count or 0, joined author
    /// name or the sentinel, and the viewer's like state.
    pub(crate) fn annotate(self, viewer_liked: bool) -> Memory {
        let year = self.year.or_else(|| year_of(&self.date)).unwrap_or(0);
        let like_count = self.likes.first().map(|l| l.count).unwrap_or(0);
        let username = self
            .profiles
            .and_then(|p| p.username)
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
        // Empty descriptions render the same as absent ones.
        let description = self.description.filter(|d| !d.is_empty());

        Memory {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            description,
            date: self.date,
            year,
            lat: self.location_lat,
            lng: self.location_lng,
            media_url: self.media_url,
            username,
            like_count,
            viewer_liked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_json(extra: &str) -> String {
        format!(
            r#"{{
                "id": 1,
                "user_id": "u1",
                "title": "First trip",
                "date": "2021-05-01",
                "year": 2021,
                "location_lat": 10.0,
                "location_lng": 20.0
                {extra}
            }}"#
        )
    }

    #[test]
    fn test_year_derivation() {
        assert_eq!(year_of("2021-05-01"), Some(2021));
        assert_eq!(year_of("2024-01-01"), Some(2024));
        assert_eq!(year_of("not-a-date"), None);
    }

    #[test]
    fn test_annotate_defaults_without_joins() {
        let row: MemoryRow = serde_json::from_str(&row_json("")).unwrap();
        let memory = row.annotate(false);
        assert_eq!(memory.like_count, 0);
        assert_eq!(memory.username, UNKNOWN_AUTHOR);
        assert!(!memory.viewer_liked);
    }

    #[test]
    fn test_annotate_uses_join_results() {
        let row: MemoryRow = serde_json::from_str(&row_json(
            r#", "profiles": {"username": "ada"}, "likes": [{"count": 3}]"#,
        ))
        .unwrap();
        let memory = row.annotate(true);
        assert_eq!(memory.username, "ada");
        assert_eq!(memory.like_count, 3);
        assert!(memory.viewer_liked);
    }

    #[test]
    fn test_annotate_rederives_missing_year() {
        let json = r#"{
            "id": 2,
            "user_id": "u2",
            "title": "No year column",
            "date": "2021-05-01",
            "location_lat": 1.0,
            "location_lng": 2.0
        }"#;
        let row: MemoryRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.annotate(false).year, 2021);
    }

    #[test]
    fn test_new_memory_year_matches_date() {
        let draft = NewMemory {
            title: "Beach".into(),
            description: None,
            date: "2024-01-01".into(),
            lat: 5.0,
            lng: 5.0,
            media_url: None,
        };
        assert_eq!(draft.year(), Some(2024));
    }

    #[test]
    fn test_feed_mode_round_trip() {
        assert_eq!(FeedMode::from_str("mine"), Some(FeedMode::Mine));
        assert_eq!(FeedMode::from_str("explore"), Some(FeedMode::Explore));
        assert_eq!(FeedMode::from_str("other"), None);
        assert_eq!(FeedMode::Mine.as_str(), "mine");
    }
}
