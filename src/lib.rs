pub mod api;
pub mod args;
pub mod cache;
pub mod commands;
mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod model;
pub mod session;
mod utils;


pub use api::Mode;
pub use config::Config;
pub use error::Error;
pub use error::Result;
