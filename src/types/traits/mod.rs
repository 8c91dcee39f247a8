pub mod arm;
pub mod fetcher;
pub mod link_extractor;
pub mod object_store;
pub mod relevance_scorer;
pub mod reward_policy;
