pub mod arm;
pub mod config;
pub mod error;
pub mod http;
pub mod provision;
pub mod service;
pub mod storage;
#[cfg(test)]
pub mod test_support;
pub mod web;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use service::BotFileService;
