pub mod api;
pub mod backend;
pub mod config;
pub mod db;
pub mod demo;
pub mod error;
pub mod export;
pub mod models;
pub mod progress;
pub mod session;
pub mod sync;

pub use api::DashboardApi;
pub use config::Config;
pub use db::Repository;
pub use error::{AppError, Result};
pub use session::Session;
