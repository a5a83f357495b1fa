use crate::{
    domain::{MomentFilter, MomentRepository, MomentSlice},
    errors::RepoError,
    models::Moment,
};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local store selected with `MOMENTS_STORE_URL=memory://`.
/// Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct InMemoryMomentRepository {
    moments: RwLock<HashMap<Uuid, Moment>>,
}

impl InMemoryMomentRepository {
    pub fn new() -> Self {
        tracing::info!("Initializing InMemoryMomentRepository");
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.moments.read().await.len()
    }
}

#[async_trait]
impl MomentRepository for InMemoryMomentRepository {
    async fn insert(&self, moment: &Moment) -> Result<(), RepoError> {
        let mut moments = self.moments.write().await;
        if moments.contains_key(&moment.id) {
            return Err(RepoError::BackendError(anyhow::anyhow!(
                "Memory: moment id {} already exists",
                moment.id
            )));
        }
        moments.insert(moment.id, moment.clone());
        tracing::debug!(moment_id = %moment.id, "Memory: Stored moment");
        Ok(())
    }

    async fn list(&self, filter: &MomentFilter, skip: u64, limit: u64) -> Result<MomentSlice, RepoError> {
        let moments = self.moments.read().await;
        Ok(MomentSlice::from_unordered(moments.values().cloned(), filter, skip, limit))
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), RepoError> {
        let removed = self.moments.write().await.remove(&id).is_some();
        tracing::debug!(moment_id = %id, removed, "Memory: Delete handled");
        Ok(())
    }

    async fn close(&self) {
        let count = self.len().await;
        tracing::info!(count, "Memory: Discarding in-memory moments");
    }
}
