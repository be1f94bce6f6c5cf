// Finite state machine driving the ad/chest loop
use super::actions::ActionDriver;
use super::library::Button;
use super::poll::BoundedPoll;
use super::types::{GameState, Phase, Session};
use crate::config::ms;
use crate::error::BotResult;

/// Watches ads for the current chest, opens it, starts the next one, and
/// stops once the home screen has no chest left to start.
pub struct AdLoop {
    driver: ActionDriver,
    session: Session,
    phase: Phase,
}

impl AdLoop {
    pub fn new(driver: ActionDriver) -> Self {
        let session = Session::new(driver.config().ads.initial_chest_target);
        Self {
            driver,
            session,
            phase: Phase::WatchFirstAd,
        }
    }

    #[cfg(test)]
    pub(super) fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = phase;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run until no more ads are available. Returns the final counters.
    pub async fn run(&mut self) -> BotResult<Session> {
        log::info!("🎮 Ad loop started");
        while !self.phase.is_terminal() {
            self.step().await?;
        }
        log::info!("🏁 No ads left ({} watched)", self.session.ads_done);
        Ok(self.session.clone())
    }

    /// Run the current phase to completion and move to the next one
    pub async fn step(&mut self) -> BotResult<Phase> {
        let next = match self.phase {
            Phase::WatchFirstAd => self.watch_first_ad().await?,
            Phase::Advert => self.advert().await?,
            Phase::OpenChest => self.open_chest().await?,
            Phase::Home => self.home().await?,
            Phase::Chest => {
                self.session.reset_chest();
                self.driver.open_chest_and_skip().await?
            }
            Phase::OpenNext => self.open_next().await?,
            Phase::FreeReward => Phase::WatchFirstAd,
            Phase::Done => Phase::Done,
        };
        if next != self.phase {
            log::debug!("🎮 Phase: {:?} -> {:?}", self.phase, next);
        }
        self.phase = next;
        Ok(next)
    }

    async fn watch_first_ad(&mut self) -> BotResult<Phase> {
        log::info!("📺 {}", self.session);
        self.driver.watch_first_ad().await?;
        log::info!("⏳ Waiting for advertising");
        self.driver
            .pause(self.driver.config().timings.after_first_ad_ms)
            .await;
        Ok(Phase::Advert)
    }

    async fn advert(&mut self) -> BotResult<Phase> {
        let state = self.driver.watch_ad_to_end().await?;
        Ok(Phase::after_state(&state))
    }

    /// Wait for the next ad of this chest, or open the chest once its
    /// target is reached.
    async fn open_chest(&mut self) -> BotResult<Phase> {
        let config = self.driver.config();
        let (before_open, max_polls, poll_delay) = (
            config.timings.before_open_chest_ms,
            config.ads.open_chest_max_polls,
            ms(config.timings.open_chest_poll_ms),
        );
        let mut poll = BoundedPoll::new(GameState::OpenChest.label(), max_polls, poll_delay);

        loop {
            if self.driver.find_button(Button::Open)?.is_some() {
                self.session.record_ad();
                log::info!("📺 New ad ready");
                return Ok(Phase::WatchFirstAd);
            }
            if self.session.target_reached() {
                self.session.reset_chest();
                self.driver.pause(before_open).await;
                return self.driver.open_chest_and_skip().await;
            }
            poll.miss().await?;
        }
    }

    /// Home can flash by between screens; only trust it if it sticks.
    async fn home(&mut self) -> BotResult<Phase> {
        let (rechecks, delay) = {
            let config = self.driver.config();
            (config.ads.home_rechecks.max(1), config.timings.home_recheck_ms)
        };

        let mut state = GameState::Home;
        for _ in 0..rechecks {
            state = self.driver.find_state().await?;
            self.driver.pause(delay).await;
        }

        Ok(Phase::after_home_recheck(&state))
    }

    /// Look for the next chest to start from the home screen.
    async fn open_next(&mut self) -> BotResult<Phase> {
        let cap = self.driver.config().ads.open_next_cap;
        let mut attempts = 0;

        loop {
            if self.driver.find_state().await? != GameState::Home {
                return Ok(Phase::WatchFirstAd);
            }
            attempts += 1;

            let found = self.driver.find_one_of(&self.driver.library().chests).await?;
            if let Some(chest) = found {
                log::info!("🧰 {} found", chest.label);
                let target = self.driver.chest_target(&chest).await?;
                self.session.start_chest(target);
                return Ok(Phase::WatchFirstAd);
            }

            if attempts >= cap {
                log::info!("🔁 Chest search limit of {cap} reached");
                return Ok(match self.driver.find_state().await? {
                    GameState::Home => Phase::Done,
                    _ => Phase::WatchFirstAd,
                });
            }
        }
    }
}
