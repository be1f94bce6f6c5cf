pub mod args;
pub mod config;
pub mod emulator;
pub mod error;
pub mod game_automation;
pub mod screen;
pub mod template_matching;

pub use config::BotConfig;
pub use error::{BotError, BotResult};
