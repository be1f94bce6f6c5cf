// Types and enums for game automation
use std::fmt;

/// Label returned when no state template matches the screen.
///
/// The advert screens have no stable artwork, so "nothing recognized" is
/// treated as "an ad is playing".
pub const FALLBACK_STATE: &str = "advert";

/// A UI screen, named after the reference image that identifies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameState {
    Home,
    OpenChest,
    Advert,
    Chest,
    FreeReward,
    Deal,
    EmulatorLoading,
    AndroidHome,
    Unknown(String),
}

impl GameState {
    pub fn from_label(label: &str) -> Self {
        match label.to_lowercase().as_str() {
            "home" => GameState::Home,
            "openchest" => GameState::OpenChest,
            "advert" => GameState::Advert,
            "chest" => GameState::Chest,
            "free_reward" => GameState::FreeReward,
            "deal" => GameState::Deal,
            // Asset trees made for BlueStacks name the splash screen after it
            "emulator_loading" | "bluestacks_loading" => GameState::EmulatorLoading,
            "android_home" => GameState::AndroidHome,
            other => GameState::Unknown(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            GameState::Home => "home",
            GameState::OpenChest => "openchest",
            GameState::Advert => "advert",
            GameState::Chest => "chest",
            GameState::FreeReward => "free_reward",
            GameState::Deal => "deal",
            GameState::EmulatorLoading => "emulator_loading",
            GameState::AndroidHome => "android_home",
            GameState::Unknown(label) => label,
        }
    }

    pub fn fallback() -> Self {
        Self::from_label(FALLBACK_STATE)
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Phases of the ad control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    WatchFirstAd,
    Advert,
    OpenChest,
    Home,
    Chest,
    OpenNext,
    FreeReward,
    Done,
}

impl Phase {
    /// Phase to continue with after seeing `state` on screen
    pub fn after_state(state: &GameState) -> Self {
        match state {
            GameState::Advert => Phase::Advert,
            GameState::OpenChest => Phase::OpenChest,
            GameState::Home => Phase::Home,
            GameState::Chest => Phase::Chest,
            GameState::FreeReward => Phase::FreeReward,
            _ => Phase::WatchFirstAd,
        }
    }

    /// Phase after the home screen rechecks ended on `state`. Anything but a
    /// chest screen or the free reward page goes back to watching an ad.
    pub fn after_home_recheck(state: &GameState) -> Self {
        match state {
            GameState::Home => Phase::OpenNext,
            GameState::Chest => Phase::Chest,
            GameState::FreeReward => Phase::FreeReward,
            _ => Phase::WatchFirstAd,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Done)
    }
}

/// Counters carried across iterations of the control loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Ad number within the current chest, starting at 1
    pub ad_no: u32,
    /// Ads the current chest needs before it can be opened
    pub chest_target: u32,
    /// Ads watched since the session started
    pub ads_done: u32,
    pub chests_started: u32,
}

impl Session {
    pub fn new(chest_target: u32) -> Self {
        Self {
            ad_no: 1,
            chest_target,
            ads_done: 1,
            chests_started: 0,
        }
    }

    /// Another ad became available for the current chest
    pub fn record_ad(&mut self) {
        self.ad_no += 1;
        self.ads_done += 1;
    }

    pub fn target_reached(&self) -> bool {
        self.ad_no + 1 > self.chest_target
    }

    pub fn reset_chest(&mut self) {
        self.ad_no = 1;
    }

    pub fn start_chest(&mut self, chest_target: u32) {
        self.chest_target = chest_target;
        self.chests_started += 1;
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ad Number: {}/{} Total: {}",
            self.ad_no, self.chest_target, self.ads_done
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_labels_round_trip_through_enum() {
        for label in ["home", "openchest", "advert", "chest", "free_reward", "deal"] {
            assert_eq!(GameState::from_label(label).label(), label);
        }
        assert_eq!(GameState::from_label("Home"), GameState::Home);
        assert_eq!(
            GameState::from_label("shop"),
            GameState::Unknown("shop".to_string())
        );
        assert_eq!(GameState::fallback(), GameState::Advert);
    }

    #[test]
    fn test_emulator_loading_aliases() {
        assert_eq!(GameState::from_label("emulator_loading"), GameState::EmulatorLoading);
        assert_eq!(GameState::from_label("bluestacks_loading"), GameState::EmulatorLoading);
        assert_eq!(GameState::from_label("BlueStacks_Loading"), GameState::EmulatorLoading);
    }

    #[test]
    fn test_phase_after_state() {
        assert_eq!(Phase::after_state(&GameState::Advert), Phase::Advert);
        assert_eq!(Phase::after_state(&GameState::FreeReward), Phase::FreeReward);
        assert_eq!(Phase::after_state(&GameState::Deal), Phase::WatchFirstAd);
        assert_eq!(
            Phase::after_state(&GameState::Unknown("x".into())),
            Phase::WatchFirstAd
        );
    }

    #[test]
    fn test_phase_after_home_recheck() {
        assert_eq!(Phase::after_home_recheck(&GameState::Home), Phase::OpenNext);
        assert_eq!(Phase::after_home_recheck(&GameState::Chest), Phase::Chest);
        assert_eq!(Phase::after_home_recheck(&GameState::FreeReward), Phase::FreeReward);
        assert_eq!(Phase::after_home_recheck(&GameState::OpenChest), Phase::WatchFirstAd);
        assert_eq!(Phase::after_home_recheck(&GameState::Advert), Phase::WatchFirstAd);
    }

    #[test]
    fn test_session_target() {
        let mut session = Session::new(4);
        assert!(!session.target_reached());
        session.record_ad();
        session.record_ad();
        assert_eq!(session.ad_no, 3);
        assert!(!session.target_reached());
        session.record_ad();
        assert!(session.target_reached());
        session.reset_chest();
        assert_eq!(session.ad_no, 1);
        assert_eq!(session.ads_done, 4);
    }
}
