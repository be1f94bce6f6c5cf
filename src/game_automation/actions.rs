// Per-screen click routines
use super::arrow::find_arrow;
use super::classifier::StateClassifier;
use super::library::{Button, TemplateLibrary};
use super::poll::BoundedPoll;
use super::types::{GameState, Phase};
use crate::config::{BotConfig, ms};
use crate::error::BotResult;
use crate::screen::{Pointer, ScreenSource};
use crate::template_matching::{Haystack, Match, TemplateSet};
use image::RgbaImage;
use std::sync::Arc;
use tokio::time::sleep;

/// Looks things up on screen and clicks them.
///
/// Every routine treats a missing button as "nothing to do yet" and returns
/// normally; only capture and input failures are errors.
pub struct ActionDriver {
    screen: Box<dyn ScreenSource>,
    pointer: Box<dyn Pointer>,
    library: TemplateLibrary,
    classifier: StateClassifier,
    config: BotConfig,
}

impl ActionDriver {
    pub fn new(
        screen: Box<dyn ScreenSource>,
        pointer: Box<dyn Pointer>,
        library: TemplateLibrary,
        config: BotConfig,
    ) -> Self {
        let classifier = StateClassifier::new(&config.matching);
        Self {
            screen,
            pointer,
            library,
            classifier,
            config,
        }
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn library(&self) -> &TemplateLibrary {
        &self.library
    }

    pub async fn pause(&self, millis: u64) {
        if millis > 0 {
            sleep(ms(millis)).await;
        }
    }

    pub fn capture_frame(&self) -> BotResult<RgbaImage> {
        let capture = self.screen.capture_timed(&self.config.capture_region)?;
        log::trace!("📸 Captured {}x{} in {}ms", capture.image.width(), capture.image.height(), capture.duration_ms);
        Ok(capture.image)
    }

    pub fn capture(&self) -> BotResult<Arc<Haystack>> {
        Ok(Arc::new(Haystack::from_rgba(&self.capture_frame()?)))
    }

    pub async fn find_state(&self) -> BotResult<GameState> {
        let haystack = self.capture()?;
        let state = self.classifier.classify(&haystack, &self.library.states).await?;
        log::debug!("🎮 {state} scene");
        Ok(state)
    }

    pub async fn find_one_of(&self, set: &TemplateSet) -> BotResult<Option<Match>> {
        let haystack = self.capture()?;
        self.classifier.find_one_of(&haystack, set).await
    }

    pub async fn find_all_of(&self, haystack: &Arc<Haystack>, set: &TemplateSet) -> BotResult<Vec<Match>> {
        self.classifier.find_all_of(haystack, set).await
    }

    pub fn find_button(&self, button: Button) -> BotResult<Option<Match>> {
        let Some(template) = self.library.button(button) else {
            return Ok(None);
        };
        let haystack = self.capture()?;
        Ok(self.classifier.find_button(&haystack, template))
    }

    /// Click a point given in capture-region coordinates
    pub fn click_at(&mut self, x: u32, y: u32) -> BotResult<()> {
        let (sx, sy) = self.config.capture_region.to_screen(x, y);
        log::debug!("🖱️ Click ({x},{y}) -> screen ({sx},{sy})");
        self.pointer.click_at(sx, sy)
    }

    pub fn click_button(&mut self, button: Button) -> BotResult<Option<Match>> {
        let hit = self.find_button(button)?;
        if let Some(hit) = &hit {
            log::debug!("👆 {hit}");
            self.click_at(hit.x, hit.y)?;
        }
        Ok(hit)
    }

    /// Dismiss whatever pop-up is showing: Escape, then a close button if
    /// one sits where close buttons are expected.
    pub async fn close_popup(&mut self) -> BotResult<bool> {
        self.pointer.press_escape()?;

        let rules = &self.config.ads;
        let hit = self
            .find_one_of(&self.library.close)
            .await?
            .filter(|m| m.x > rules.close_min_x && m.y < rules.close_max_y);

        match hit {
            Some(hit) => {
                log::info!("❎ {hit}");
                self.click_at(hit.x, hit.y)?;
                self.pause(self.config.timings.after_close_ms).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Observe the screen, then try to close the ad. Returns what was seen
    /// before closing.
    pub async fn wait_for_ad_to_end(&mut self) -> BotResult<GameState> {
        let state = self.find_state().await?;
        self.close_popup().await?;
        Ok(state)
    }

    /// Keep closing until the screen stops looking like an advert
    pub async fn watch_ad_to_end(&mut self) -> BotResult<GameState> {
        let mut poll = BoundedPoll::new(
            GameState::Advert.label(),
            self.config.ads.advert_max_polls,
            ms(self.config.timings.skip_poll_ms),
        );
        loop {
            let state = self.wait_for_ad_to_end().await?;
            if state != GameState::Advert {
                return Ok(state);
            }
            poll.miss().await?;
        }
    }

    pub async fn click_arrow(&mut self) -> BotResult<bool> {
        let frame = self.capture_frame()?;
        match find_arrow(&frame) {
            Some((x, y)) => {
                log::debug!("🟢 Arrow at ({x},{y})");
                self.click_at(x, y + self.config.ads.arrow_click_offset_y)?;
                self.pause(self.config.timings.arrow_click_ms).await;
                Ok(true)
            }
            None => {
                log::info!("🔎 No arrow found, checking for an ad");
                Ok(false)
            }
        }
    }

    pub async fn watch_first_ad(&mut self) -> BotResult<()> {
        match self.find_state().await? {
            GameState::Home => {
                self.click_arrow().await?;
                self.click_button(Button::Open)?;
            }
            GameState::OpenChest => {
                self.click_button(Button::Open)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Skip the chest opening animation and continue past the loot screen.
    pub async fn open_chest_and_skip(&mut self) -> BotResult<Phase> {
        let timings = self.config.timings.clone();
        let mut poll = BoundedPoll::new(
            Button::Skip.name(),
            self.config.ads.skip_max_attempts,
            ms(timings.skip_poll_ms),
        );

        loop {
            if self.click_button(Button::Skip)?.is_some() {
                log::info!("⏭️ Skipping opening");
                self.pause(timings.after_skip_ms).await;

                if self.click_button(Button::Continue)?.is_some() {
                    log::info!("➡️ Continue");
                    self.pause(timings.after_continue_ms).await;
                    return Ok(Phase::OpenNext);
                }
            }
            poll.miss().await?;
        }
    }

    pub async fn start_new_chest(&mut self, chest: &Match) -> BotResult<()> {
        self.click_at(chest.x, chest.y)?;
        self.pause(self.config.timings.chest_click_ms).await;

        if self.click_button(Button::Start)?.is_some() {
            self.pause(self.config.timings.start_click_ms).await;
        }
        Ok(())
    }

    /// Ads needed for `chest`, starting it when the chest kind is known
    pub async fn chest_target(&mut self, chest: &Match) -> BotResult<u32> {
        match self.config.ads.ads_for_chest(&chest.label) {
            Some(ads) => {
                self.start_new_chest(chest).await?;
                Ok(ads)
            }
            None => {
                log::warn!("❓ Unknown chest '{}', add it to the chest table", chest.label);
                Ok(self.config.ads.unknown_chest_ads)
            }
        }
    }
}
