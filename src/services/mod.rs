pub mod decision_log;
pub mod object_store;
