use crate::{
    domain::{AuthorRepository, MemeRepository},
    errors::RepoError,
    memory::sort_newest_first,
    models::{Author, AuthorId, Meme},
};
use anyhow::Context;
use async_trait::async_trait;
use aws_sdk_dynamodb::{types::AttributeValue, Client as DynamoDbClient};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{self, info};
use uuid::Uuid;

// Guards update/delete so they never recreate or silently skip a missing item.
const ITEM_EXISTS: &str = "attribute_exists(id)";

#[derive(Debug, Clone)]
pub struct DynamoDbMemeRepository {
    client: DynamoDbClient,
    table_name: String,
}

impl DynamoDbMemeRepository {
    /// Creates a new repository instance configured for a specific table.
    pub fn new(client: DynamoDbClient, table_name: String) -> Self {
        info!(%table_name, "Initializing DynamoDbMemeRepository");
        Self { client, table_name }
    }
}

#[async_trait]
impl MemeRepository for DynamoDbMemeRepository {
    /// Stores a `Meme` using PutItem.
    async fn create(&self, meme: &Meme) -> Result<(), RepoError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(meme_to_item(meme)))
            .send()
            .await
            .context(format!("DynamoDB (table: {}): Failed to put meme (id: {})", self.table_name, meme.id))
            .map_err(RepoError::BackendError)?;
        tracing::debug!(meme_id = %meme.id, table_name = %self.table_name, "DynamoDB: Meme stored");
        Ok(())
    }

    /// Retrieves a `Meme` using GetItem.
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Meme>, RepoError> {
        let id_str = id.to_string();
        let resp = self.client
            .get_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id_str.clone()))
            .send()
            .await
            .context(format!("DynamoDB (table: {}): Failed to get meme (id: {})", self.table_name, id_str))
            .map_err(RepoError::BackendError)?;

        match resp.item {
            Some(item) => match item_to_meme(&item) {
                Some(meme) => Ok(Some(meme)),
                None => {
                    tracing::error!(meme_id = %id_str, table_name = %self.table_name, "DynamoDB: Retrieved item but failed to parse into Meme");
                    Err(RepoError::DataCorruption(format!(
                        "Failed to parse meme data retrieved from DynamoDB table '{}' for id {}",
                        self.table_name, id_str
                    )))
                }
            },
            None => Ok(None), // Item not found is not an error
        }
    }

    /// Scans the whole table (following pagination), then keeps the newest `limit`.
    async fn list_recent(&self, limit: usize) -> Result<Vec<Meme>, RepoError> {
        tracing::debug!("DynamoDB: Scanning table '{}' for recent memes", self.table_name);
        let mut memes: Vec<Meme> = Vec::new();
        let mut last_evaluated_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let mut request_builder = self.client.scan().table_name(&self.table_name);

            if let Some(lek) = last_evaluated_key {
                request_builder = request_builder.set_exclusive_start_key(Some(lek));
            }

            let resp = request_builder
                .send()
                .await
                .context(format!("DynamoDB: Failed to scan table '{}'", self.table_name))
                .map_err(RepoError::BackendError)?;

            for item in resp.items.unwrap_or_default() {
                match item_to_meme(&item) {
                    Some(meme) => memes.push(meme),
                    None => {
                        let item_id = item.get("id").and_then(|v| v.as_s().ok());
                        tracing::error!(item.id = ?item_id, table_name = %self.table_name, "DynamoDB: Failed to parse item from scan into Meme");
                        return Err(RepoError::DataCorruption(format!(
                            "DynamoDB: Failed to parse item {:?} during scan of table '{}'",
                            item_id, self.table_name
                        )));
                    }
                }
            }

            last_evaluated_key = resp.last_evaluated_key;
            if last_evaluated_key.is_none() {
                break;
            }
            tracing::debug!("DynamoDB Scan (table: {}): Continuing with LastEvaluatedKey...", self.table_name);
        }

        sort_newest_first(&mut memes);
        memes.truncate(limit);
        tracing::info!("DynamoDB (table: {}): Listed {} recent memes", self.table_name, memes.len());
        Ok(memes)
    }

    /// Overwrites an existing item; the condition keeps a deleted meme from coming back.
    async fn update(&self, meme: &Meme) -> Result<(), RepoError> {
        let result = self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(meme_to_item(meme)))
            .condition_expression(ITEM_EXISTS)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_conditional_check_failed_exception()) => {
                Err(RepoError::NotFound(meme.id))
            }
            Err(e) => Err(RepoError::BackendError(anyhow::Error::new(e).context(format!(
                "DynamoDB (table: {}): Failed to update meme (id: {})",
                self.table_name, meme.id
            )))),
        }
    }

    /// Deletes an item using DeleteItem; missing items surface as `NotFound`.
    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let id_str = id.to_string();
        tracing::debug!(meme_id = %id_str, table_name = %self.table_name, "DynamoDB: Deleting item");

        let result = self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id_str.clone()))
            .condition_expression(ITEM_EXISTS)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_conditional_check_failed_exception()) => {
                Err(RepoError::NotFound(id))
            }
            Err(e) => Err(RepoError::BackendError(anyhow::Error::new(e).context(format!(
                "DynamoDB (table: {}): Failed to delete meme (id: {})",
                self.table_name, id_str
            )))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DynamoDbAuthorRepository {
    client: DynamoDbClient,
    table_name: String,
}

impl DynamoDbAuthorRepository {
    pub fn new(client: DynamoDbClient, table_name: String) -> Self {
        info!(%table_name, "Initializing DynamoDbAuthorRepository");
        Self { client, table_name }
    }
}

#[async_trait]
impl AuthorRepository for DynamoDbAuthorRepository {
    async fn get_by_id(&self, id: AuthorId) -> Result<Option<Author>, RepoError> {
        let resp = self.client
            .get_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id.to_string()))
            .send()
            .await
            .context(format!("DynamoDB (table: {}): Failed to get author (id: {})", self.table_name, id))
            .map_err(RepoError::BackendError)?;

        Ok(resp.item.and_then(|item| {
            let name = item.get("name")?.as_s().ok()?.to_string();
            Some(Author { id, name })
        }))
    }
}

fn meme_to_item(meme: &Meme) -> HashMap<String, AttributeValue> {
    let mut item = HashMap::from([
        ("id".to_string(), AttributeValue::S(meme.id.to_string())),
        ("meme_url".to_string(), AttributeValue::S(meme.meme_url.clone())),
        ("explicacion".to_string(), AttributeValue::S(meme.explicacion.clone())),
        ("fecha_subida".to_string(), AttributeValue::S(meme.fecha_subida.to_rfc3339())),
        ("created_at".to_string(), AttributeValue::S(meme.created_at.to_rfc3339())),
        ("updated_at".to_string(), AttributeValue::S(meme.updated_at.to_rfc3339())),
    ]);
    // A null author is stored as an absent attribute.
    if let Some(user_id) = meme.user_id {
        item.insert("user_id".to_string(), AttributeValue::S(user_id.to_string()));
    }
    item
}

fn item_to_meme(item: &HashMap<String, AttributeValue>) -> Option<Meme> {
    let id = item
        .get("id")?
        .as_s()
        .ok()
        .and_then(|s| Uuid::parse_str(s).ok())?;
    let meme_url = item.get("meme_url")?.as_s().ok()?.to_string();
    let explicacion = item.get("explicacion")?.as_s().ok()?.to_string();
    let user_id = match item.get("user_id") {
        Some(value) => Some(Uuid::parse_str(value.as_s().ok()?).ok()?),
        None => None,
    };

    Some(Meme {
        id,
        meme_url,
        explicacion,
        user_id,
        fecha_subida: timestamp(item, "fecha_subida")?,
        created_at: timestamp(item, "created_at")?,
        updated_at: timestamp(item, "updated_at")?,
    })
}

fn timestamp(item: &HashMap<String, AttributeValue>, key: &str) -> Option<DateTime<Utc>> {
    let raw = item.get(key)?.as_s().ok()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_conversion_preserves_every_field() {
        let author = Uuid::new_v4();
        let meme = Meme::new("https://example.com/a.jpg".into(), "Explicación".into(), Some(author));

        let item = meme_to_item(&meme);
        assert_eq!(item.get("user_id").and_then(|v| v.as_s().ok()), Some(&author.to_string()));
        assert_eq!(item_to_meme(&item), Some(meme));
    }

    #[test]
    fn missing_author_is_an_absent_attribute() {
        let meme = Meme::new("https://example.com/a.jpg".into(), "test".into(), None);
        let item = meme_to_item(&meme);
        assert!(!item.contains_key("user_id"));
        assert_eq!(item_to_meme(&item).and_then(|m| m.user_id), None);
    }

    #[test]
    fn malformed_items_are_rejected() {
        let meme = Meme::new("https://example.com/a.jpg".into(), "test".into(), None);
        let mut item = meme_to_item(&meme);
        item.insert("fecha_subida".into(), AttributeValue::S("ayer".into()));
        assert!(item_to_meme(&item).is_none());

        let mut item = meme_to_item(&meme);
        item.insert("user_id".into(), AttributeValue::N("7".into()));
        assert!(item_to_meme(&item).is_none());
    }
}
