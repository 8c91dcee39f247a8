pub mod configs;
pub mod error;
pub mod structs;
pub mod traits;
