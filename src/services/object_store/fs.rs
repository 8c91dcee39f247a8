use std::{io::ErrorKind, path::PathBuf};

use async_trait::async_trait;
use tokio::fs::{create_dir_all, read, remove_file, write};

use crate::types::{error::AppError, traits::object_store::ObjectStore};

/// Stores each object as one file named by its key under `path`.
pub struct FileSystemObjectStore {
    path: PathBuf,
}

impl FileSystemObjectStore {
    pub async fn new(path: PathBuf) -> Result<Self, AppError> {
        create_dir_all(&path).await?;

        Ok(Self { path })
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, AppError> {
        if key.is_empty() || key.contains(['/', '\\']) || key == "." || key == ".." {
            return Err(format!("invalid object key {:?}", key).into());
        }

        Ok(self.path.join(key))
    }
}

#[async_trait]
impl ObjectStore for FileSystemObjectStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>, AppError> {
        Ok(read(self.object_path(key)?).await?)
    }

    async fn put(&self, key: &str, data: &[u8]) -> Result<(), AppError> {
        Ok(write(self.object_path(key)?, data).await?)
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        match remove_file(self.object_path(key)?).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
