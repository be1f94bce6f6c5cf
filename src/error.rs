use std::path::PathBuf;
use thiserror::Error;

/// A specialized `Result` type for bot operations.
pub type BotResult<T> = Result<T, BotError>;

/// The error type for everything that can stop the bot.
///
/// A template that does not match is never an error; see the matcher and the
/// classifier, which model absence as an empty result or the fallback state.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("Screen capture failed: {description}")]
    Capture { description: String },

    #[error("Capture region {width}x{height}+{left}+{top} is outside the {screen_width}x{screen_height} display")]
    RegionOutOfBounds {
        left: u32,
        top: u32,
        width: u32,
        height: u32,
        screen_width: u32,
        screen_height: u32,
    },

    #[error("Synthetic input failed: {description}")]
    Input { description: String },

    #[error("Failed to load template {path:?}: {source}")]
    TemplateLoad {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Template directory not found: {path:?}")]
    TemplateDirMissing { path: PathBuf },

    #[error("Stuck in state '{state}' after {attempts} attempts")]
    StuckState { state: String, attempts: u32 },

    #[error("Invalid configuration: {description}")]
    Config { description: String },

    #[error("Failed to parse configuration {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("External process '{program}' failed: {description}")]
    Process { program: String, description: String },

    #[error("Matching worker pool unavailable: {description}")]
    WorkerPool { description: String },

    #[error("Worker task failed to complete: {source}")]
    JoinError {
        #[from]
        source: tokio::task::JoinError,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl BotError {
    /// Capture failures end the process; nothing retries them.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BotError::Capture { .. } | BotError::RegionOutOfBounds { .. } | BotError::Input { .. }
        )
    }
}
