use crate::{
    aws_clients::{create_dynamodb_client, create_sdk_config},
    config::{Config, StorageBackend},
    domain::{AuthorRepository, MemeRepository},
    errors::AppError,
    memory::{InMemoryAuthorRepository, InMemoryMemeRepository},
    repositories::{DynamoDbAuthorRepository, DynamoDbMemeRepository},
    services::MemeService,
    AppState,
};
use aws_sdk_dynamodb::{
    error::SdkError as DynamoSdkError,
    types::{AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType},
    Client as DynamoDbClient,
};
use aws_smithy_types::error::operation::BuildError;
use backoff::{future::retry_notify, ExponentialBackoff, ExponentialBackoffBuilder};
use std::{sync::Arc, time::Duration};

/// How long startup keeps retrying while DynamoDB (or LocalStack) is unreachable.
const PROVISION_TIMEOUT: Duration = Duration::from_secs(60);

fn provision_backoff() -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_initial_interval(Duration::from_millis(250))
        .with_max_interval(Duration::from_secs(5))
        .with_max_elapsed_time(Some(PROVISION_TIMEOUT))
        .build()
}

fn build_failed(what: &str, e: BuildError) -> backoff::Error<AppError> {
    backoff::Error::permanent(AppError::InitError(format!("Failed to build {}: {}", what, e)))
}

/// One attempt at creating a table keyed by the string attribute `id`.
///
/// An existing table counts as success. Transport failures are transient; any
/// other service error is permanent.
async fn create_table_once(client: &DynamoDbClient, table_name: &str) -> Result<(), backoff::Error<AppError>> {
    let result = client
        .create_table()
        .table_name(table_name)
        .attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name("id")
                .attribute_type(ScalarAttributeType::S)
                .build()
                .map_err(|e| build_failed("attribute definition", e))?,
        )
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name("id")
                .key_type(KeyType::Hash)
                .build()
                .map_err(|e| build_failed("key schema", e))?,
        )
        .billing_mode(BillingMode::PayPerRequest)
        .send()
        .await;

    match result {
        Ok(_) => {
            tracing::info!("Startup: Table '{}' created successfully or setup initiated.", table_name);
            Ok(())
        }
        Err(e) => {
            if let DynamoSdkError::ServiceError(service_err) = &e {
                if service_err.err().is_resource_in_use_exception() {
                    tracing::info!("Startup: Table '{}' already exists, no action needed.", table_name);
                    Ok(())
                } else {
                    let context = format!("Startup: Service error creating DynamoDB table '{}'", table_name);
                    tracing::error!("{}: {:?}", context, service_err);
                    Err(backoff::Error::permanent(AppError::InitError(format!("{}: {}", context, e))))
                }
            } else {
                let context = format!("Startup: SDK error creating DynamoDB table '{}'", table_name);
                Err(backoff::Error::transient(AppError::InitError(format!("{}: {}", context, e))))
            }
        }
    }
}

/// Creates the table if it doesn't exist, retrying while the backend is unreachable.
async fn create_dynamodb_table_if_not_exists(client: &DynamoDbClient, table_name: &str) -> Result<(), AppError> {
    retry_notify(
        provision_backoff(),
        || create_table_once(client, table_name),
        |err: AppError, wait: Duration| {
            tracing::warn!(table_name, retry_in = ?wait, error = %err, "Startup: DynamoDB not reachable yet, retrying");
        },
    )
    .await
}

/// Initializes the DynamoDB tables for memes and authors.
pub async fn init_resources(
    db_client: &DynamoDbClient,
    memes_table: &str,
    authors_table: &str,
) -> Result<(), AppError> {
    tracing::info!("Startup: Initializing DynamoDB tables...");
    create_dynamodb_table_if_not_exists(db_client, memes_table).await?;
    create_dynamodb_table_if_not_exists(db_client, authors_table).await?;
    tracing::info!("Startup: DynamoDB table initialization complete.");
    Ok(())
}

/// Wires repositories for the configured backend into the shared application state.
pub async fn build_state(config: &Config) -> Result<Arc<AppState>, AppError> {
    let (memes, authors) = match config.storage {
        StorageBackend::DynamoDb => {
            tracing::info!("Initializing AWS DynamoDB client...");
            let sdk_config = create_sdk_config(config).await;
            let db_client = create_dynamodb_client(&sdk_config);
            init_resources(&db_client, &config.memes_table, &config.authors_table).await?;
            let memes: Arc<dyn MemeRepository> =
                Arc::new(DynamoDbMemeRepository::new(db_client.clone(), config.memes_table.clone()));
            let authors: Arc<dyn AuthorRepository> =
                Arc::new(DynamoDbAuthorRepository::new(db_client, config.authors_table.clone()));
            (memes, authors)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; memes are lost on restart");
            let memes: Arc<dyn MemeRepository> = Arc::new(InMemoryMemeRepository::new());
            let authors: Arc<dyn AuthorRepository> = Arc::new(InMemoryAuthorRepository::new());
            (memes, authors)
        }
    };

    tracing::info!(policy = ?config.mutation_policy, "Mutation policy configured");
    Ok(Arc::new(AppState {
        memes: MemeService::new(memes, authors, config.mutation_policy),
    }))
}
