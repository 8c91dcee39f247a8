use std::{env, process::ExitCode, sync::Arc};

use subjectscope::{
    services::{decision_log::DecisionLogWriter, object_store::fs::FileSystemObjectStore},
    tasks::{
        crawler::{Collaborators, Crawler},
        http_fetcher::HttpFetcher,
        keyword_scorer::KeywordScorer,
        reward::build_reward_policy,
        url_extractor::UrlExtractor,
    },
    types::{configs::run_config::RunConfig, error::AppError, traits::object_store::ObjectStore},
};

async fn run(config_path: &str) -> Result<(), AppError> {
    let config = RunConfig::from_path(config_path)?;

    let store: Arc<dyn ObjectStore> =
        Arc::new(FileSystemObjectStore::new(config.output.repository.clone()).await?);

    let collaborators = Collaborators {
        fetcher: Arc::new(HttpFetcher::new(&config.http, Some(store.clone()))?),
        extractor: Arc::new(UrlExtractor::new(&config.extractor)),
        scorer: Arc::new(KeywordScorer::new(&config.scorer)?),
        reward_policy: build_reward_policy(&config.reward),
        repository: Some(store),
    };

    let mut crawler = Crawler::new(&config, collaborators)?;
    let cancel = crawler.cancellation();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("interrupted, stopping after the current decision");
            cancel.cancel();
        }
    });

    let report = crawler.run().await?;

    let writer = DecisionLogWriter::new(config.output.decision_log.clone());
    writer.write(crawler.log()).await?;
    let summary_path = writer.write_summary(&report.summary).await?;

    log::info!("summary written to {}", summary_path.display());
    println!("{}", serde_json::to_string_pretty(&report.summary)?);

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = match env::args().nth(1) {
        Some(path) => path,
        None => {
            eprintln!("usage: subjectscope <run-config.json>");
            return ExitCode::from(2);
        }
    };

    match run(&config_path).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
