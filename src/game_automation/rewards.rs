// Daily reward cycle: start the game, collect what is free, sleep until the
// next timer runs out.
use super::actions::ActionDriver;
use super::library::Button;
use super::poll::BoundedPoll;
use super::timer::{
    DigitReader, TimerReading, crop_region, format_remaining, parse_timer, read_timer_text,
    shortest_timer, timer_regions,
};
use super::types::GameState;
use crate::config::{RewardKind, ms};
use crate::emulator::EmulatorProcess;
use crate::error::BotResult;
use crate::template_matching::Haystack;
use chrono::{DateTime, Local, TimeDelta};
use std::sync::Arc;
use tokio::time::sleep;

/// When the next reward is ready and what it is.
#[derive(Debug, Clone, PartialEq)]
pub struct NextReward {
    pub ready_at: DateTime<Local>,
    pub goal: Option<String>,
}

pub struct RewardSession<R: DigitReader> {
    driver: ActionDriver,
    reader: R,
    emulator: EmulatorProcess,
    ads_done: u32,
}

impl<R: DigitReader> RewardSession<R> {
    pub fn new(driver: ActionDriver, reader: R, emulator: EmulatorProcess) -> Self {
        Self {
            driver,
            reader,
            emulator,
            ads_done: 0,
        }
    }

    pub fn ads_done(&self) -> u32 {
        self.ads_done
    }

    /// Run reward cycles until an error stops the bot
    pub async fn run_forever(&mut self) -> BotResult<()> {
        loop {
            let next = self.run_cycle().await?;
            self.wait_until(&next).await;
        }
    }

    /// One pass from emulator start to emulator shutdown
    pub async fn run_cycle(&mut self) -> BotResult<NextReward> {
        self.open_emulator().await?;
        self.driver.click_button(Button::GameLogo)?;
        self.load_game().await?;
        self.goto_rewards_page().await?;
        self.driver
            .pause(self.driver.config().timings.rewards_page_ms)
            .await;

        let collected = self.collect_rewards().await?;
        log::info!("🎁 Collected {collected} rewards this cycle");

        let next = self.estimate_next_reward().await?;
        self.emulator.close().await?;
        Ok(next)
    }

    /// Launch the emulator when one is configured and wait for its home screen
    pub async fn open_emulator(&mut self) -> BotResult<()> {
        if !self.emulator.launch()? {
            return Ok(());
        }
        let config = self.driver.config();
        let (max_polls, delay) = (
            config.emulator.max_launch_polls,
            ms(config.timings.emulator_poll_ms),
        );

        let mut poll = BoundedPoll::new(GameState::EmulatorLoading.label(), max_polls, delay);
        while self.driver.find_state().await? != GameState::EmulatorLoading {
            poll.miss().await?;
        }
        log::info!("🖥️ Emulator opened");

        let mut poll = BoundedPoll::new(GameState::AndroidHome.label(), max_polls, delay);
        loop {
            self.driver.close_popup().await?;
            if self.driver.find_state().await? == GameState::AndroidHome {
                return Ok(());
            }
            log::info!("🖥️ Emulator not loaded yet, waiting");
            poll.miss().await?;
        }
    }

    /// Wait for the game's home screen, closing the deal pop-up if it shows
    pub async fn load_game(&mut self) -> BotResult<()> {
        let config = self.driver.config();
        let mut poll = BoundedPoll::new(
            GameState::Home.label(),
            config.rewards.max_navigation,
            ms(config.timings.load_poll_ms),
        );

        loop {
            match self.driver.find_state().await? {
                GameState::Home => return Ok(()),
                GameState::Deal => {
                    if self.driver.click_button(Button::RedCross)?.is_some() {
                        self.driver
                            .pause(self.driver.config().timings.after_close_ms)
                            .await;
                    }
                }
                _ => {}
            }
            poll.miss().await?;
        }
    }

    pub async fn goto_rewards_page(&mut self) -> BotResult<()> {
        let config = self.driver.config();
        let (max, page_delay) = (config.rewards.max_navigation, config.timings.rewards_page_ms);
        let mut poll = BoundedPoll::new(GameState::FreeReward.label(), max, ms(0));

        while self.driver.find_state().await? != GameState::FreeReward {
            if self.driver.click_button(Button::Rewards)?.is_some() {
                self.driver.pause(page_delay).await;
            }
            poll.miss().await?;
        }
        Ok(())
    }

    /// Click every free reward until none is left. Returns how many were taken.
    pub async fn collect_rewards(&mut self) -> BotResult<u32> {
        let limit = self.driver.config().rewards.max_collect;
        let mut collected = 0;

        while collected < limit {
            let Some(free) = self.driver.click_button(Button::Free)? else {
                log::info!("🎁 Rewards not ready");
                break;
            };
            let timings = self.driver.config().timings.clone();
            self.driver.pause(timings.reward_click_ms).await;

            let kind = self.driver.config().rewards.kind_at(free.x);
            log::info!("🎁 {kind:?} ready at ({}, {})", free.x, free.y);
            match kind {
                RewardKind::FreeChest => {
                    self.driver.open_chest_and_skip().await?;
                }
                RewardKind::FreeGems => {
                    self.driver.watch_ad_to_end().await?;
                }
                RewardKind::GoldChest => {
                    self.driver.watch_ad_to_end().await?;
                    self.driver.pause(timings.gold_ad_settle_ms).await;
                    self.driver.open_chest_and_skip().await?;
                }
            }
            self.driver.pause(timings.after_reward_ms).await;

            collected += 1;
            self.ads_done += 1;
        }
        Ok(collected)
    }

    /// Read the countdowns several times and keep the earliest ready time.
    /// Falls back to a fixed wait when nothing could be read.
    pub async fn estimate_next_reward(&self) -> BotResult<NextReward> {
        let layout = self.driver.config().timers.clone();
        let tolerance = self.driver.config().rewards.tolerance;
        let mut best: Option<(DateTime<Local>, u32)> = None;

        for pass in 1..=layout.passes {
            let Some(reading) = self.read_shortest_timer().await? else {
                log::debug!("⏱️ Pass {pass}: no readable timer");
                continue;
            };
            let ready_at = Local::now() + to_delta(reading.remaining);
            log::debug!(
                "⏱️ Pass {pass}: {} left at x={}",
                format_remaining(reading.remaining),
                reading.left
            );
            if best.is_none_or(|(earliest, _)| ready_at < earliest) {
                best = Some((ready_at, reading.left));
            }
        }

        let next = match best {
            Some((ready_at, left)) => NextReward {
                ready_at,
                goal: layout.goal_at(left, tolerance).map(str::to_string),
            },
            None => {
                log::warn!(
                    "⚠️ No reward timer readable, waiting {}",
                    format_remaining(layout.fallback_wait())
                );
                NextReward {
                    ready_at: Local::now() + to_delta(layout.fallback_wait()),
                    goal: None,
                }
            }
        };
        Ok(next)
    }

    async fn read_shortest_timer(&self) -> BotResult<Option<TimerReading>> {
        let layout = &self.driver.config().timers;
        let frame = self.driver.capture_frame()?;
        let haystack = Arc::new(Haystack::from_rgba(&frame));
        let anchors = self
            .driver
            .find_all_of(&haystack, &self.driver.library().timer_anchors)
            .await?;

        if anchors.len() != layout.expected_count {
            log::debug!(
                "⏱️ Found {} timer anchors, expected {}",
                anchors.len(),
                layout.expected_count
            );
            return Ok(None);
        }

        let mut readings = Vec::with_capacity(anchors.len());
        for region in timer_regions(&anchors, layout) {
            let crop = crop_region(&frame, &region);
            if let Some(text) = read_timer_text(&self.reader, &crop, layout.binarize_level).await {
                readings.push(TimerReading {
                    remaining: parse_timer(&text),
                    left: region.left,
                });
            }
        }
        Ok(shortest_timer(&readings))
    }

    /// Sleep until `next` is ready, logging progress now and then
    pub async fn wait_until(&self, next: &NextReward) {
        let interval = ms(self.driver.config().timings.status_interval_ms);
        let goal = next.goal.as_deref().unwrap_or("unknown");

        loop {
            let now = Local::now();
            let Ok(remaining) = (next.ready_at - now).to_std() else {
                break;
            };
            if remaining.is_zero() {
                break;
            }
            log::info!(
                "🎯 Goal: {goal} | Finish time: {} | Waiting for: {} | Total ads done: {}",
                next.ready_at.format("%I:%M %p"),
                format_remaining(remaining),
                self.ads_done
            );
            let nap = if interval.is_zero() {
                remaining
            } else {
                interval.min(remaining)
            };
            sleep(nap).await;
        }
        log::info!("⏰ Time reached: {}", next.ready_at.format("%H:%M:%S"));
    }
}

fn to_delta(duration: std::time::Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::zero())
}
