//! Slack slash command that claims a one-time key from the demo or staging
//! submission server and posts it back to the channel.

pub mod config;
pub mod error;
pub mod handler;
pub mod slack;
pub mod token;
pub mod types;

pub use config::Config;
pub use error::{ConfigError, HandlerError};
pub use handler::function_handler;
pub use token::{TokenClient, TokenSource};
