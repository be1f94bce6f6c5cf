// Game automation module
// Screen classification plus the click routines and loops built on it.

pub mod actions;
pub mod arrow;
pub mod classifier;
pub mod fsm;
pub mod library;
pub mod poll;
pub mod rewards;
pub mod timer;
pub mod types;


// Re-export the main types and functions for easy access
pub use actions::ActionDriver;
pub use classifier::StateClassifier;
pub use fsm::AdLoop;
pub use library::{Button, TemplateLibrary};
pub use rewards::{NextReward, RewardSession};
pub use timer::{DigitReader, TesseractCli};
pub use types::{GameState, Phase, Session};
