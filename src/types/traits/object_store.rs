use crate::types::error::AppError;
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncSeek};

pub trait AsyncReadSeek: AsyncRead + AsyncSeek {}
impl<T: AsyncRead + AsyncSeek + ?Sized> AsyncReadSeek for T {}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Vec<u8>, AppError>;
    async fn put(&self, key: &str, data: &[u8]) -> Result<(), AppError>;
    async fn delete(&self, key: &str) -> Result<(), AppError>;
}
