use crate::{
    config::{Config, StoreUrl},
    domain::MomentRepository,
    errors::AppError,
    memory::InMemoryMomentRepository,
    repositories::DynamoDbMomentRepository,
};
use aws_sdk_dynamodb::{
    error::SdkError as DynamoSdkError,
    types::{AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType},
    Client as DynamoDbClient,
};
use axum::Router;
use std::{future::Future, sync::Arc};
use tokio::{net::TcpListener, signal};

/// Creates the DynamoDB table if it doesn't exist.
async fn create_dynamodb_table_if_not_exists(client: &DynamoDbClient, table_name: &str) -> Result<(), AppError> {
    let result = client
        .create_table()
        .table_name(table_name)
        .attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name("id")
                .attribute_type(ScalarAttributeType::S)
                .build()
                .map_err(|e| AppError::InitError(format!("Failed to build attribute definition: {}", e)))?,
        )
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name("id")
                .key_type(KeyType::Hash)
                .build()
                .map_err(|e| AppError::InitError(format!("Failed to build key schema: {}", e)))?,
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
                    return Ok(());
                }
                tracing::error!("Startup: Service error creating DynamoDB table '{}': {:?}", table_name, service_err);
            } else {
                tracing::error!("Startup: SDK error creating DynamoDB table '{}': {}", table_name, e);
            }
            Err(AppError::InitError(format!(
                "Could not create DynamoDB table '{}': {}",
                table_name, e
            )))
        }
    }
}

/// Connects the store named by `MOMENTS_STORE_URL` and returns the handle
/// injected into the API layer.
pub async fn connect_store(config: &Config) -> Result<Arc<dyn MomentRepository>, AppError> {
    match &config.store_url {
        StoreUrl::DynamoDb { table_name } => {
            tracing::info!("Startup: Connecting to DynamoDB table '{}'...", table_name);
            let repo = DynamoDbMomentRepository::connect(config, table_name).await;
            create_dynamodb_table_if_not_exists(repo.client(), table_name).await?;
            Ok(Arc::new(repo))
        }
        StoreUrl::Memory => {
            tracing::warn!("Startup: Using in-memory store, moments will not survive a restart");
            Ok(Arc::new(InMemoryMomentRepository::new()))
        }
    }
}

/// Serves `app` until `shutdown` resolves, then closes the store.
/// The store is closed even when the server fails.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    moment_repo: Arc<dyn MomentRepository>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), AppError> {
    let served = axum::serve(listener, app).with_graceful_shutdown(shutdown).await;

    moment_repo.close().await;

    served.map_err(|e| AppError::InitError(format!("Server error: {}", e)))
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
