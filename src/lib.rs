pub mod services;
pub mod tasks;
pub mod types;
pub mod utils;
