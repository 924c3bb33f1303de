pub mod auth;
pub mod backend;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod entity;
pub mod error;
pub mod feed;
pub mod logging;
pub mod storage;

pub use dashboard::Dashboard;
pub use error::{DevfeedError, Result};
pub use feed::FeedController;
