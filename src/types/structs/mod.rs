pub mod candidate;
pub mod context;
pub mod decision;
pub mod link;
pub mod page;
