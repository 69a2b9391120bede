pub mod config;
pub mod listing;

pub use config::Config;
pub use listing::*;
