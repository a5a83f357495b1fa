use crate::errors::RepoError;
use crate::models::{Moment, NewMoment};
use async_trait::async_trait;
use std::cmp::Reverse;
use uuid::Uuid;

/// Selects which moments a listing returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MomentFilter {
    /// Case-insensitive substring matched against the title. Matches everything when `None`.
    title_contains: Option<String>,
}

impl MomentFilter {
    pub fn all() -> Self {
        Self::default()
    }

    /// An empty search string matches every moment. Whitespace is part of the needle.
    pub fn title_search(search: &str) -> Self {
        if search.is_empty() {
            Self::all()
        } else {
            Self {
                title_contains: Some(search.to_lowercase()),
            }
        }
    }

    pub fn matches(&self, moment: &Moment) -> bool {
        match &self.title_contains {
            Some(needle) => moment.title.to_lowercase().contains(needle.as_str()),
            None => true,
        }
    }
}

/// One window of a listing together with the number of moments matching the filter.
#[derive(Debug, Clone)]
pub struct MomentSlice {
    pub moments: Vec<Moment>,
    pub total: u64,
}

impl MomentSlice {
    /// Filters, orders newest first and cuts the `skip`/`limit` window.
    ///
    /// Used by backends that cannot filter or sort server side.
    pub fn from_unordered(
        moments: impl IntoIterator<Item = Moment>,
        filter: &MomentFilter,
        skip: u64,
        limit: u64,
    ) -> Self {
        let mut matching: Vec<Moment> = moments.into_iter().filter(|m| filter.matches(m)).collect();
        matching.sort_by_key(|m| Reverse((m.created_at, m.id)));
        let total = matching.len() as u64;
        let moments = matching
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect();
        Self { moments, total }
    }
}

/// Trait defining operations for storing and retrieving moments.
///
/// Handlers hold it as `Arc<dyn MomentRepository>`.
#[async_trait]
pub trait MomentRepository: Send + Sync + 'static {
    /// Persists an already validated moment.
    async fn insert(&self, moment: &Moment) -> Result<(), RepoError>;

    /// Returns the `skip`/`limit` window of matching moments, newest first.
    async fn list(&self, filter: &MomentFilter, skip: u64, limit: u64) -> Result<MomentSlice, RepoError>;

    /// Removes a moment. Succeeds whether or not the moment existed.
    async fn delete_by_id(&self, id: Uuid) -> Result<(), RepoError>;

    /// Validates the payload, assigns id and timestamps, then persists it.
    /// Nothing is written when validation fails.
    async fn create(&self, new: NewMoment) -> Result<Moment, RepoError> {
        let moment = Moment::from_new(new)?;
        self.insert(&moment).await?;
        Ok(moment)
    }

    /// Releases the store connection. Called once at shutdown.
    async fn close(&self) {}
}
