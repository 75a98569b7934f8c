use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A stored blog post. `content` is HTML produced by the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What the list endpoint returns per post.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: String,
    pub title: String,
    pub preview: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Numeric value of the id, used as the ordering tiebreak.
    pub fn sequence(&self) -> u64 {
        self.id.parse().unwrap_or(0)
    }

    pub fn summary(&self, preview: String) -> PostSummary {
        PostSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            preview,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Newest first; equal timestamps fall back to the larger id.
pub fn newest_first(a: &Post, b: &Post) -> std::cmp::Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.sequence().cmp(&a.sequence()))
}

/// Hands out post ids: the creation time in unix millis, bumped past the
/// previous id so ids stay unique and increasing within a store.
#[derive(Debug, Default)]
pub struct PostIds {
    last: u64,
}

impl PostIds {
    /// Make sure future ids sort after `id`.
    pub fn observe(&mut self, id: u64) {
        self.last = self.last.max(id);
    }

    /// Next id and the creation instant it encodes.
    pub fn next(&mut self, now: DateTime<Utc>) -> (u64, DateTime<Utc>) {
        let now_ms = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        let id = now_ms.max(self.last + 1);
        self.last = id;

        let created_at = i64::try_from(id)
            .ok()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .unwrap_or(now);
        (id, created_at)
    }
}

/// `now`, unless that would not move past `previous`.
pub fn advance(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    let floor = previous + Duration::milliseconds(1);
    if now < floor {
        floor
    } else {
        now
    }
}
