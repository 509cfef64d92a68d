use crate::errors::RepoError;
use crate::models::{Author, AuthorId, Meme};
use async_trait::async_trait;
use std::str::FromStr;
use uuid::Uuid;

/// Trait defining operations for storing and retrieving memes.
#[async_trait]
pub trait MemeRepository: Send + Sync + 'static { // Send+Sync+'static required for Arc<dyn>
    /// Inserts a new meme.
    async fn create(&self, meme: &Meme) -> Result<(), RepoError>;

    /// Retrieves a meme by its unique ID.
    /// Returns Ok(None) if the meme is not found.
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Meme>, RepoError>;

    /// The `limit` most recent memes, newest `fecha_subida` first.
    async fn list_recent(&self, limit: usize) -> Result<Vec<Meme>, RepoError>;

    /// Replaces a stored meme. Fails with `RepoError::NotFound` if it no longer exists.
    async fn update(&self, meme: &Meme) -> Result<(), RepoError>;

    /// Removes a meme. Fails with `RepoError::NotFound` if it was already gone.
    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;
}

/// Read-only access to the authors memes point at. Authors are owned elsewhere.
#[async_trait]
pub trait AuthorRepository: Send + Sync + 'static {
    async fn get_by_id(&self, id: AuthorId) -> Result<Option<Author>, RepoError>;
}

/// Decides whether `actor` may edit or delete `meme`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MutationPolicy {
    /// Only the meme's own author. Denies everything while nobody can log in.
    #[default]
    OwnerOnly,
    /// Anyone, including anonymous callers.
    Open,
}

impl MutationPolicy {
    pub fn can_mutate(&self, actor: Option<AuthorId>, meme: &Meme) -> bool {
        match self {
            MutationPolicy::Open => true,
            MutationPolicy::OwnerOnly => match (actor, meme.user_id) {
                (Some(actor), Some(owner)) => actor == owner,
                _ => false,
            },
        }
    }
}

impl FromStr for MutationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "owner" => Ok(MutationPolicy::OwnerOnly),
            "open" => Ok(MutationPolicy::Open),
            other => Err(format!("expected 'owner' or 'open', got '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meme_by(owner: Option<AuthorId>) -> Meme {
        Meme::new("https://example.com/a.jpg".into(), "test".into(), owner)
    }

    #[test]
    fn owner_only_allows_the_author() {
        let owner = Uuid::new_v4();
        let meme = meme_by(Some(owner));
        assert!(MutationPolicy::OwnerOnly.can_mutate(Some(owner), &meme));
        assert!(!MutationPolicy::OwnerOnly.can_mutate(Some(Uuid::new_v4()), &meme));
        assert!(!MutationPolicy::OwnerOnly.can_mutate(None, &meme));
    }

    #[test]
    fn owner_only_denies_authorless_memes() {
        let meme = meme_by(None);
        assert!(!MutationPolicy::OwnerOnly.can_mutate(None, &meme));
        assert!(!MutationPolicy::OwnerOnly.can_mutate(Some(Uuid::new_v4()), &meme));
    }

    #[test]
    fn open_allows_anonymous() {
        assert!(MutationPolicy::Open.can_mutate(None, &meme_by(None)));
    }

    #[test]
    fn parses_policy_names() {
        assert_eq!("owner".parse::<MutationPolicy>(), Ok(MutationPolicy::OwnerOnly));
        assert_eq!(" OPEN ".parse::<MutationPolicy>(), Ok(MutationPolicy::Open));
        assert!("admin".parse::<MutationPolicy>().is_err());
        assert_eq!(MutationPolicy::default(), MutationPolicy::OwnerOnly);
    }
}
