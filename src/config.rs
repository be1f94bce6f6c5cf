//! Bot configuration
//!
//! Every constant the bot depends on lives here: thresholds, delays, retry
//! caps, and the layout tables that map pixel positions to reward types.
//! Values are loaded from an optional JSON file; missing keys take defaults.

use crate::error::{BotError, BotResult};
use crate::screen::CaptureRegion;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Root of the reference image library
    pub assets_dir: PathBuf,
    pub capture_region: CaptureRegion,
    pub matching: MatchConfig,
    pub timings: Timings,
    pub ads: AdRules,
    pub rewards: RewardLayout,
    pub timers: TimerLayout,
    pub emulator: EmulatorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Threshold for folder-wide (state, chest, close) matching
    pub threshold: f32,
    /// Threshold for single button lookups
    pub button_threshold: f32,
    /// Max per-axis distance for merging duplicate hits
    pub group_distance: u32,
    /// Worker pool size for folder-wide matching
    pub workers: usize,
}

/// Fixed pauses that wait out UI animations, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub after_first_ad_ms: u64,
    pub arrow_click_ms: u64,
    pub after_close_ms: u64,
    pub after_skip_ms: u64,
    pub after_continue_ms: u64,
    pub skip_poll_ms: u64,
    pub chest_click_ms: u64,
    pub start_click_ms: u64,
    pub before_open_chest_ms: u64,
    pub home_recheck_ms: u64,
    pub open_chest_poll_ms: u64,
    pub reward_click_ms: u64,
    pub after_reward_ms: u64,
    pub gold_ad_settle_ms: u64,
    pub rewards_page_ms: u64,
    pub load_poll_ms: u64,
    pub emulator_poll_ms: u64,
    pub status_interval_ms: u64,
}

/// Rules for the ad control loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdRules {
    /// Ads required before the first chest is known
    pub initial_chest_target: u32,
    /// Ads required per chest label
    pub chest_targets: Vec<ChestRule>,
    /// Ads assumed for a chest label missing from the table
    pub unknown_chest_ads: u32,
    /// State re-checks before "home" is trusted
    pub home_rechecks: u32,
    /// Chest searches on the home screen before concluding nothing is left
    pub open_next_cap: u32,
    /// Polls for the skip/continue sequence before giving up
    pub skip_max_attempts: u32,
    /// Polls for the watch-ad button before giving up
    pub open_chest_max_polls: u32,
    /// Polls while an advert is still playing before giving up
    pub advert_max_polls: u32,
    /// Close buttons are only trusted right of this x...
    pub close_min_x: u32,
    /// ...and above this y
    pub close_max_y: u32,
    /// Click this far below the detected arrow
    pub arrow_click_offset_y: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChestRule {
    pub label: String,
    pub ads: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
    FreeChest,
    FreeGems,
    GoldChest,
}

/// Maps the x position of the "free" button to the reward behind it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardLayout {
    pub slots: Vec<RewardSlot>,
    /// Per-axis slack when comparing positions against the table
    pub tolerance: u32,
    /// Used when no slot matches
    pub default_kind: RewardKind,
    /// Max "free" clicks per session
    pub max_collect: u32,
    /// Max navigation attempts per page transition
    pub max_navigation: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardSlot {
    pub x: u32,
    pub kind: RewardKind,
}

/// Where the countdown timers sit relative to their anchor images.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerLayout {
    pub offset_x: i64,
    pub offset_y: i64,
    pub width: u32,
    pub height: u32,
    /// Timers are only read when exactly this many anchors are visible
    pub expected_count: usize,
    /// Sampling passes; the earliest ready time wins
    pub passes: u32,
    /// Binarization level before OCR
    pub binarize_level: u8,
    pub goals: Vec<TimerGoal>,
    /// Wait used when no timer could be read
    pub fallback_wait_secs: u64,
    pub ocr_program: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerGoal {
    pub left: u32,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    /// Emulator executable; when unset the emulator is assumed running
    pub executable: Option<PathBuf>,
    pub args: Vec<String>,
    pub max_launch_polls: u32,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("snip_images"),
            capture_region: CaptureRegion::default(),
            matching: MatchConfig::default(),
            timings: Timings::default(),
            ads: AdRules::default(),
            rewards: RewardLayout::default(),
            timers: TimerLayout::default(),
            emulator: EmulatorConfig::default(),
        }
    }
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            executable: None,
            args: Vec::new(),
            max_launch_polls: 120,
        }
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold: 0.93,
            button_threshold: 0.90,
            group_distance: 5,
            workers: 4,
        }
    }
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            after_first_ad_ms: 2000,
            arrow_click_ms: 500,
            after_close_ms: 1000,
            after_skip_ms: 3000,
            after_continue_ms: 2000,
            skip_poll_ms: 500,
            chest_click_ms: 2000,
            start_click_ms: 2000,
            before_open_chest_ms: 4000,
            home_recheck_ms: 300,
            open_chest_poll_ms: 500,
            reward_click_ms: 5000,
            after_reward_ms: 2000,
            gold_ad_settle_ms: 5000,
            rewards_page_ms: 2000,
            load_poll_ms: 1000,
            emulator_poll_ms: 1000,
            status_interval_ms: 60_000,
        }
    }
}

impl Timings {
    /// All pauses disabled (tests, dry runs)
    pub fn zero() -> Self {
        Self {
            after_first_ad_ms: 0,
            arrow_click_ms: 0,
            after_close_ms: 0,
            after_skip_ms: 0,
            after_continue_ms: 0,
            skip_poll_ms: 0,
            chest_click_ms: 0,
            start_click_ms: 0,
            before_open_chest_ms: 0,
            home_recheck_ms: 0,
            open_chest_poll_ms: 0,
            reward_click_ms: 0,
            after_reward_ms: 0,
            gold_ad_settle_ms: 0,
            rewards_page_ms: 0,
            load_poll_ms: 0,
            emulator_poll_ms: 0,
            status_interval_ms: 0,
        }
    }
}

impl Default for AdRules {
    fn default() -> Self {
        Self {
            initial_chest_target: 8,
            chest_targets: vec![
                ChestRule::new("silver_chest", 4),
                ChestRule::new("gold_chest", 8),
                ChestRule::new("platinum_chest", 12),
            ],
            unknown_chest_ads: 4,
            home_rechecks: 12,
            open_next_cap: 120,
            skip_max_attempts: 240,
            open_chest_max_polls: 600,
            advert_max_polls: 600,
            close_min_x: 10,
            close_max_y: 700,
            arrow_click_offset_y: 30,
        }
    }
}

impl ChestRule {
    pub fn new(label: &str, ads: u32) -> Self {
        Self {
            label: label.to_string(),
            ads,
        }
    }
}

impl AdRules {
    /// Ads needed for a chest label, `None` for chests not in the table
    pub fn ads_for_chest(&self, label: &str) -> Option<u32> {
        self.chest_targets
            .iter()
            .find(|rule| rule.label == label)
            .map(|rule| rule.ads)
    }
}

impl Default for RewardLayout {
    fn default() -> Self {
        Self {
            slots: vec![
                RewardSlot {
                    x: 105,
                    kind: RewardKind::FreeChest,
                },
                RewardSlot {
                    x: 231,
                    kind: RewardKind::FreeGems,
                },
            ],
            tolerance: 3,
            default_kind: RewardKind::GoldChest,
            max_collect: 10,
            max_navigation: 30,
        }
    }
}

impl RewardLayout {
    pub fn kind_at(&self, x: u32) -> RewardKind {
        self.slots
            .iter()
            .find(|slot| slot.x.abs_diff(x) <= self.tolerance)
            .map(|slot| slot.kind)
            .unwrap_or(self.default_kind)
    }
}

impl Default for TimerLayout {
    fn default() -> Self {
        Self {
            offset_x: -60,
            offset_y: 88,
            width: 124,
            height: 35,
            expected_count: 3,
            passes: 4,
            binarize_level: 235,
            goals: vec![
                TimerGoal::new(44, "Silver Chest"),
                TimerGoal::new(189, "Gems"),
                TimerGoal::new(334, "Gold Chest"),
            ],
            fallback_wait_secs: 3600,
            ocr_program: "tesseract".to_string(),
        }
    }
}

impl TimerGoal {
    pub fn new(left: u32, label: &str) -> Self {
        Self {
            left,
            label: label.to_string(),
        }
    }
}

impl TimerLayout {
    /// Goal label for a timer crop's left edge
    pub fn goal_at(&self, left: u32, tolerance: u32) -> Option<&str> {
        self.goals
            .iter()
            .find(|goal| goal.left.abs_diff(left) <= tolerance)
            .map(|goal| goal.label.as_str())
    }

    pub fn fallback_wait(&self) -> Duration {
        Duration::from_secs(self.fallback_wait_secs)
    }
}

impl BotConfig {
    /// Load from a JSON file; keys that are absent keep their defaults
    pub fn load(path: impl AsRef<Path>) -> BotResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: BotConfig =
            serde_json::from_str(&text).map_err(|source| BotError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> BotResult<()> {
        let in_range = |t: f32| (-1.0..=1.0).contains(&t);
        if !in_range(self.matching.threshold) || !in_range(self.matching.button_threshold) {
            return Err(BotError::Config {
                description: "thresholds must lie in [-1, 1]".to_string(),
            });
        }
        if self.matching.workers == 0 {
            return Err(BotError::Config {
                description: "matching.workers must be at least 1".to_string(),
            });
        }
        if !self.capture_region.is_valid() {
            return Err(BotError::Config {
                description: "capture_region must have a non-zero size".to_string(),
            });
        }
        if self.timers.passes == 0 {
            return Err(BotError::Config {
                description: "timers.passes must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn states_dir(&self) -> PathBuf {
        self.assets_dir.join("states")
    }

    pub fn chests_dir(&self) -> PathBuf {
        self.assets_dir.join("chests")
    }

    pub fn close_dir(&self) -> PathBuf {
        self.assets_dir.join("close")
    }

    pub fn timer_anchor_dir(&self) -> PathBuf {
        self.assets_dir.join("collect_rewards")
    }
}

/// Shorthand used by the routines for config delays
pub fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_tuned_layout() {
        let config = BotConfig::default();
        assert_eq!(config.matching.threshold, 0.93);
        assert_eq!(config.matching.button_threshold, 0.90);
        assert_eq!(config.matching.group_distance, 5);
        assert_eq!(config.capture_region, CaptureRegion::new(0, 0, 500, 915));
        assert_eq!(config.ads.open_next_cap, 120);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_chest_targets() {
        let rules = AdRules::default();
        assert_eq!(rules.ads_for_chest("silver_chest"), Some(4));
        assert_eq!(rules.ads_for_chest("gold_chest"), Some(8));
        assert_eq!(rules.ads_for_chest("platinum_chest"), Some(12));
        assert_eq!(rules.ads_for_chest("diamond_chest"), None);
    }

    #[test]
    fn test_reward_kind_by_x() {
        let layout = RewardLayout::default();
        assert_eq!(layout.kind_at(105), RewardKind::FreeChest);
        assert_eq!(layout.kind_at(107), RewardKind::FreeChest);
        assert_eq!(layout.kind_at(231), RewardKind::FreeGems);
        assert_eq!(layout.kind_at(360), RewardKind::GoldChest);
    }

    #[test]
    fn test_goal_by_left() {
        let layout = TimerLayout::default();
        assert_eq!(layout.goal_at(44, 0), Some("Silver Chest"));
        assert_eq!(layout.goal_at(190, 3), Some("Gems"));
        assert_eq!(layout.goal_at(250, 3), None);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot.json");
        std::fs::write(
            &path,
            r#"{
                "assets_dir": "assets",
                "capture_region": { "left": 10, "top": 0, "width": 500, "height": 915 },
                "matching": { "threshold": 0.95 },
                "rewards": { "slots": [ { "x": 100, "kind": "free_gems" } ] }
            }"#,
        )
        .unwrap();

        let config = BotConfig::load(&path).unwrap();
        assert_eq!(config.assets_dir, PathBuf::from("assets"));
        assert_eq!(config.capture_region.left, 10);
        assert_eq!(config.matching.threshold, 0.95);
        assert_eq!(config.matching.button_threshold, 0.90);
        assert_eq!(config.rewards.kind_at(100), RewardKind::FreeGems);
        assert_eq!(config.timings.after_skip_ms, 3000);
    }

    #[test]
    fn test_partial_emulator_section_keeps_launch_polls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot.json");
        std::fs::write(
            &path,
            r#"{ "emulator": { "executable": "C:/BlueStacks/HD-Player.exe" } }"#,
        )
        .unwrap();

        let config = BotConfig::load(&path).unwrap();
        assert_eq!(
            config.emulator.executable,
            Some(PathBuf::from("C:/BlueStacks/HD-Player.exe"))
        );
        assert_eq!(config.emulator.max_launch_polls, 120);
        assert!(config.emulator.args.is_empty());
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let mut config = BotConfig::default();
        config.matching.threshold = 1.5;
        assert!(matches!(config.validate(), Err(BotError::Config { .. })));
    }

    #[test]
    fn test_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            BotConfig::load(&path),
            Err(BotError::ConfigParse { .. })
        ));
    }
}
