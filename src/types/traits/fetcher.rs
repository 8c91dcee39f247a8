use async_trait::async_trait;

use crate::types::{
    error::AppError,
    structs::{link::Link, page::FetchedPage},
};

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, link: &Link) -> Result<FetchedPage, AppError>;
}
