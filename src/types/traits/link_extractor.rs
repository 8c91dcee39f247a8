use async_trait::async_trait;

use crate::types::{
    error::AppError,
    structs::page::{DiscoveredLink, FetchedPage},
};

#[async_trait]
pub trait LinkExtractor: Send + Sync {
    async fn extract_links(&self, page: &FetchedPage) -> Result<Vec<DiscoveredLink>, AppError>;
}
