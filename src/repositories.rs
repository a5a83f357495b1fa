use crate::{
    config::Config,
    domain::{MomentFilter, MomentRepository, MomentSlice},
    errors::RepoError,
    models::{Moment, SCHEMA_VERSION},
};
use anyhow::Context;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::{types::AttributeValue, Client as DynamoDbClient};
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashMap;
use tracing::{self, info};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct DynamoDbMomentRepository {
    client: DynamoDbClient,
    table_name: String, // Store the table name
}

impl DynamoDbMomentRepository {
    /// Creates a new repository instance configured for a specific table.
    pub fn new(client: DynamoDbClient, table_name: String) -> Self {
        info!(%table_name, "Initializing DynamoDbMomentRepository");
        Self { client, table_name }
    }

    /// Builds a client for `config.aws_region`, honouring `AWS_ENDPOINT_URL`
    /// for LocalStack. Credentials come from the default provider chain and
    /// are resolved lazily on the first request.
    pub async fn connect(config: &Config, table_name: &str) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.aws_region.clone()));
        if let Some(endpoint) = &config.localstack_endpoint {
            info!(%endpoint, "DynamoDB: Using endpoint override");
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;
        info!(region = %config.aws_region, "DynamoDB: Client configured");
        Self::new(DynamoDbClient::new(&sdk_config), table_name.to_string())
    }

    pub fn client(&self) -> &DynamoDbClient {
        &self.client
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Reads every item with a paginated Scan.
    async fn scan_all(&self) -> Result<Vec<Moment>, RepoError> {
        tracing::debug!("DynamoDB: Scanning table '{}' for moments", self.table_name);
        let mut moments: Vec<Moment> = Vec::new();
        let mut last_evaluated_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let resp = self
                .client
                .scan()
                .table_name(&self.table_name)
                .set_exclusive_start_key(last_evaluated_key.take())
                .send()
                .await
                .context(format!("DynamoDB: Failed to scan table '{}'", self.table_name))
                .map_err(RepoError::BackendError)?;

            for item in resp.items() {
                match item_to_moment(item) {
                    Some(moment) => moments.push(moment),
                    None => {
                        let item_id = item.get("id").and_then(|v| v.as_s().ok());
                        tracing::error!(item.id = ?item_id, table_name = %self.table_name, "DynamoDB: Failed to parse item from scan into Moment");
                        // Fail fast if data in the table is corrupt
                        return Err(RepoError::DataCorruption(format!(
                            "item {:?} in table '{}'",
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

        tracing::debug!("DynamoDB (table: {}): Scanned {} moments", self.table_name, moments.len());
        Ok(moments)
    }
}

#[async_trait]
impl MomentRepository for DynamoDbMomentRepository {
    /// Stores a `Moment` with PutItem. The condition keeps ids from being reused.
    async fn insert(&self, moment: &Moment) -> Result<(), RepoError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(moment_to_item(moment)))
            .condition_expression("attribute_not_exists(id)")
            .send()
            .await
            .context(format!(
                "DynamoDB (table: {}): Failed to put moment (id: {})",
                self.table_name, moment.id
            ))
            .map_err(RepoError::BackendError)?;
        tracing::debug!(moment_id = %moment.id, table_name = %self.table_name, "DynamoDB: Stored moment");
        Ok(())
    }

    /// DynamoDB has no case-insensitive `contains`, so filtering, ordering
    /// and windowing happen after a full Scan.
    async fn list(&self, filter: &MomentFilter, skip: u64, limit: u64) -> Result<MomentSlice, RepoError> {
        let moments = self.scan_all().await?;
        Ok(MomentSlice::from_unordered(moments, filter, skip, limit))
    }

    /// Deletes an item from DynamoDB using DeleteItem.
    async fn delete_by_id(&self, id: Uuid) -> Result<(), RepoError> {
        let id_str = id.to_string();
        tracing::debug!(moment_id = %id_str, table_name = %self.table_name, "DynamoDB: Deleting item");

        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id_str.clone()))
            // DeleteItem succeeds even if the item is absent
            .send()
            .await
            .context(format!(
                "DynamoDB (table: {}): Failed to delete moment (id: {})",
                self.table_name, id_str
            ))
            .map_err(RepoError::BackendError)?;

        Ok(())
    }

    async fn close(&self) {
        // The SDK client holds no session; dropping the last handle releases its connection pool.
        info!(table_name = %self.table_name, "DynamoDB: Releasing client");
    }
}

fn timestamp(at: &DateTime<Utc>) -> AttributeValue {
    AttributeValue::S(at.to_rfc3339_opts(SecondsFormat::Micros, true))
}

fn moment_to_item(moment: &Moment) -> HashMap<String, AttributeValue> {
    let mut item = HashMap::from([
        ("id".to_string(), AttributeValue::S(moment.id.to_string())),
        ("title".to_string(), AttributeValue::S(moment.title.clone())),
        ("message".to_string(), AttributeValue::S(moment.message.clone())),
        ("creator".to_string(), AttributeValue::S(moment.creator.clone())),
        (
            "tags".to_string(),
            AttributeValue::L(moment.tags.iter().cloned().map(AttributeValue::S).collect()),
        ),
        ("created_at".to_string(), timestamp(&moment.created_at)),
        ("updated_at".to_string(), timestamp(&moment.updated_at)),
        (
            "schema_version".to_string(),
            AttributeValue::N(moment.schema_version.to_string()),
        ),
    ]);
    if let Some(file) = &moment.selected_file {
        item.insert("selected_file".to_string(), AttributeValue::S(file.clone()));
    }
    item
}

// Optional attributes fall back to their defaults so items written by
// earlier schema versions still decode.
fn item_to_moment(item: &HashMap<String, AttributeValue>) -> Option<Moment> {
    let string = |key: &str| item.get(key).and_then(|v| v.as_s().ok()).cloned();
    let time = |key: &str| {
        let raw = item.get(key)?.as_s().ok()?;
        DateTime::parse_from_rfc3339(raw).ok().map(|t| t.with_timezone(&Utc))
    };

    let id = Uuid::parse_str(item.get("id")?.as_s().ok()?).ok()?;
    let title = string("title")?;
    let message = string("message").or_else(|| string("description"))?;
    let created_at = time("created_at")?;
    let updated_at = time("updated_at").unwrap_or(created_at);
    let tags = match item.get("tags") {
        Some(AttributeValue::L(values)) => values
            .iter()
            .map(|v| v.as_s().ok().cloned())
            .collect::<Option<Vec<_>>>()?,
        Some(_) => return None,
        None => Vec::new(),
    };
    let schema_version = match item.get("schema_version") {
        Some(v) => v.as_n().ok()?.parse().ok()?,
        None => SCHEMA_VERSION,
    };

    Some(Moment {
        id,
        title,
        message,
        creator: string("creator").unwrap_or_default(),
        tags,
        selected_file: string("selected_file"),
        created_at,
        updated_at,
        schema_version,
    })
}
