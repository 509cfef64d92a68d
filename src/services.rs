//! Listing and mutation of memes, independent of HTTP.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{AuthorRepository, MemeRepository, MutationPolicy};
use crate::errors::ServiceError;
use crate::models::{AuthorId, FEED_LIMIT, FeedItem, Meme};
use crate::validation::MemeForm;

#[derive(Clone)]
pub struct MemeService {
    memes: Arc<dyn MemeRepository>,
    authors: Arc<dyn AuthorRepository>,
    policy: MutationPolicy,
}

impl MemeService {
    pub fn new(
        memes: Arc<dyn MemeRepository>,
        authors: Arc<dyn AuthorRepository>,
        policy: MutationPolicy,
    ) -> Self {
        Self { memes, authors, policy }
    }

    /// The newest `FEED_LIMIT` memes with their authors resolved, as seen by `viewer`.
    pub async fn list_recent(&self, viewer: Option<AuthorId>) -> Result<Vec<FeedItem>, ServiceError> {
        let memes = self.memes.list_recent(FEED_LIMIT).await?;

        let mut authors = HashMap::new();
        for author_id in memes.iter().filter_map(|m| m.user_id) {
            if authors.contains_key(&author_id) {
                continue;
            }
            let author = self.authors.get_by_id(author_id).await?;
            if author.is_none() {
                tracing::warn!(%author_id, "Meme references an unknown author; showing it as anonymous");
            }
            authors.insert(author_id, author);
        }

        Ok(memes
            .into_iter()
            .map(|meme| {
                let author = meme.user_id.and_then(|id| authors.get(&id).cloned().flatten());
                let can_mutate = self.policy.can_mutate(viewer, &meme);
                FeedItem { meme, author, can_mutate }
            })
            .collect())
    }

    /// Validates and stores a new meme, bound to `author` when the caller knows one.
    pub async fn create(&self, form: &MemeForm, author: Option<AuthorId>) -> Result<Meme, ServiceError> {
        let valid = form.validate().map_err(ServiceError::Validation)?;
        let meme = Meme::new(valid.meme_url, valid.explicacion, author);
        self.memes.create(&meme).await?;
        tracing::info!(meme_id = %meme.id, author = ?author, "Meme created");
        Ok(meme)
    }

    pub async fn find(&self, id: Uuid) -> Result<Meme, ServiceError> {
        self.memes
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound(id))
    }

    /// Overwrites the URL and explanation of an existing meme.
    pub async fn update(
        &self,
        id: Uuid,
        form: &MemeForm,
        actor: Option<AuthorId>,
    ) -> Result<Meme, ServiceError> {
        let mut meme = self.find(id).await?;
        self.authorize(actor, &meme)?;
        let valid = form.validate().map_err(ServiceError::Validation)?;

        meme.apply(valid.meme_url, valid.explicacion);
        self.memes.update(&meme).await?;
        tracing::info!(meme_id = %id, "Meme updated");
        Ok(meme)
    }

    pub async fn delete(&self, id: Uuid, actor: Option<AuthorId>) -> Result<(), ServiceError> {
        let meme = self.find(id).await?;
        self.authorize(actor, &meme)?;

        self.memes.delete(id).await?;
        tracing::info!(meme_id = %id, "Meme deleted");
        Ok(())
    }

    fn authorize(&self, actor: Option<AuthorId>, meme: &Meme) -> Result<(), ServiceError> {
        if self.policy.can_mutate(actor, meme) {
            Ok(())
        } else {
            tracing::warn!(meme_id = %meme.id, actor = ?actor, policy = ?self.policy, "Mutation denied");
            Err(ServiceError::Forbidden(meme.id))
        }
    }
}
