pub mod aggregate;
pub mod config;
pub mod error;
pub mod growth;
pub mod grouping;
pub mod loader;
pub mod output;
pub mod periods;
pub mod reports;
pub mod types;
pub mod util;
pub mod views;
