pub mod bandit_config;
pub mod frontier_config;
pub mod http_fetcher_config;
pub mod keyword_scorer_config;
pub mod reward_config;
pub mod run_config;
pub mod url_extractor_config;
