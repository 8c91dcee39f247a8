use std::path::PathBuf;

use tokio::{
    fs::{create_dir_all, File},
    io::{AsyncWriteExt, BufWriter},
};

use crate::types::{
    error::AppError,
    structs::decision::{DecisionLog, RunSummary},
};

/// Writes the decision log as JSON lines, one record per line, in step order.
pub struct DecisionLogWriter {
    path: PathBuf,
}

impl DecisionLogWriter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub async fn write(&self, log: &DecisionLog) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_dir_all(parent).await?;
        }

        let file = File::create(&self.path).await?;
        let mut writer = BufWriter::new(file);

        for record in log.records() {
            let mut line = serde_json::to_vec(record)?;
            line.push(b'\n');
            writer.write_all(&line).await?;
        }

        writer.flush().await?;
        log::info!("wrote {} records to {}", log.len(), self.path.display());

        Ok(())
    }

    /// Writes `summary` next to the log, as `<log>.summary.json`.
    pub async fn write_summary(&self, summary: &RunSummary) -> Result<PathBuf, AppError> {
        let mut path = self.path.clone().into_os_string();
        path.push(".summary.json");
        let path = PathBuf::from(path);

        tokio::fs::write(&path, serde_json::to_vec_pretty(summary)?).await?;

        Ok(path)
    }
}
