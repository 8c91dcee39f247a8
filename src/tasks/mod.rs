pub mod arms;
pub mod bandit;
pub mod context_builder;
pub mod crawler;
pub mod frontier_manager;
pub mod http_fetcher;
pub mod keyword_scorer;
pub mod reward;
pub mod url_extractor;
