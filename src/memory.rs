//! In-memory repositories for local development and tests.
//!
//! Data is lost on process restart.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{AuthorRepository, MemeRepository};
use crate::errors::RepoError;
use crate::models::{Author, AuthorId, Meme};

#[derive(Default)]
pub struct InMemoryMemeRepository {
    store: RwLock<HashMap<Uuid, Meme>>,
}

impl InMemoryMemeRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemeRepository for InMemoryMemeRepository {
    async fn create(&self, meme: &Meme) -> Result<(), RepoError> {
        let mut store = self.store.write().await;
        store.insert(meme.id, meme.clone());
        tracing::debug!(meme_id = %meme.id, total = store.len(), "Memory: Stored meme");
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Meme>, RepoError> {
        Ok(self.store.read().await.get(&id).cloned())
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Meme>, RepoError> {
        let store = self.store.read().await;
        let mut memes: Vec<Meme> = store.values().cloned().collect();
        sort_newest_first(&mut memes);
        memes.truncate(limit);
        Ok(memes)
    }

    async fn update(&self, meme: &Meme) -> Result<(), RepoError> {
        let mut store = self.store.write().await;
        match store.get_mut(&meme.id) {
            Some(slot) => {
                *slot = meme.clone();
                Ok(())
            }
            None => Err(RepoError::NotFound(meme.id)),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.store
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound(id))
    }
}

/// Orders by `fecha_subida` descending. Ties fall back to the id so the order is stable.
pub(crate) fn sort_newest_first(memes: &mut [Meme]) {
    memes.sort_by(|a, b| {
        b.fecha_subida
            .cmp(&a.fecha_subida)
            .then_with(|| b.id.cmp(&a.id))
    });
}

#[derive(Default)]
pub struct InMemoryAuthorRepository {
    authors: RwLock<HashMap<AuthorId, Author>>,
}

impl InMemoryAuthorRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an author. Authors are owned by the user system, so only setup code calls this.
    pub async fn insert(&self, author: Author) {
        self.authors.write().await.insert(author.id, author);
    }
}

#[async_trait]
impl AuthorRepository for InMemoryAuthorRepository {
    async fn get_by_id(&self, id: AuthorId) -> Result<Option<Author>, RepoError> {
        Ok(self.authors.read().await.get(&id).cloned())
    }
}
