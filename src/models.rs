use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of an external author (the `users` table).
pub type AuthorId = Uuid;

/// Maximum number of memes shown in the feed.
pub const FEED_LIMIT: usize = 50;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Meme {
    pub id: Uuid,
    pub meme_url: String,
    pub explicacion: String,
    pub user_id: Option<AuthorId>,
    /// Set once at creation; the feed ordering key.
    pub fecha_subida: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Meme {
    /// Builds a fresh meme stamped with the current server time.
    pub fn new(meme_url: String, explicacion: String, user_id: Option<AuthorId>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            meme_url,
            explicacion,
            user_id,
            fecha_subida: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites the two mutable fields. Author and submission time stay as they were.
    pub fn apply(&mut self, meme_url: String, explicacion: String) {
        self.meme_url = meme_url;
        self.explicacion = explicacion;
        self.updated_at = Utc::now();
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: AuthorId,
    pub name: String,
}

/// A feed entry: the meme plus its author, when one is known and still resolvable.
#[derive(Debug, Clone)]
pub struct FeedItem {
    pub meme: Meme,
    pub author: Option<Author>,
    /// Whether the viewer may edit or delete this meme.
    pub can_mutate: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_keeps_author_and_submission_time() {
        let author = Uuid::new_v4();
        let mut meme = Meme::new("https://example.com/a.jpg".into(), "antes".into(), Some(author));
        let fecha = meme.fecha_subida;

        meme.apply("https://example.com/b.jpg".into(), "después".into());

        assert_eq!(meme.meme_url, "https://example.com/b.jpg");
        assert_eq!(meme.explicacion, "después");
        assert_eq!(meme.user_id, Some(author));
        assert_eq!(meme.fecha_subida, fecha);
        assert!(meme.updated_at >= meme.created_at);
    }
}
