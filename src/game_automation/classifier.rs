// Folder-wide matching and state classification
use super::types::GameState;
use crate::config::MatchConfig;
use crate::error::{BotError, BotResult};
use crate::template_matching::{Haystack, Match, Template, TemplateSet, find_matches, group_matches};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Matches template folders against one capture on a bounded worker pool.
///
/// Every template in a folder is matched concurrently against the same
/// read-only haystack. Results are merged back in the folder's enumeration
/// order, so the outcome never depends on which worker finishes first.
#[derive(Debug, Clone)]
pub struct StateClassifier {
    threshold: f32,
    button_threshold: f32,
    group_distance: u32,
    workers: Arc<Semaphore>,
}

impl StateClassifier {
    pub fn new(config: &MatchConfig) -> Self {
        Self {
            threshold: config.threshold,
            button_threshold: config.button_threshold,
            group_distance: config.group_distance,
            workers: Arc::new(Semaphore::new(config.workers.max(1))),
        }
    }

    /// First grouped hit of every template in `set` that matched, in
    /// enumeration order
    pub async fn find_all_of(
        &self,
        haystack: &Arc<Haystack>,
        set: &TemplateSet,
    ) -> BotResult<Vec<Match>> {
        let mut jobs = Vec::with_capacity(set.len());

        for template in set.templates() {
            let permit = self
                .workers
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| BotError::WorkerPool {
                    description: e.to_string(),
                })?;
            let haystack = Arc::clone(haystack);
            let template = Arc::clone(template);
            let (threshold, distance) = (self.threshold, self.group_distance);

            jobs.push(tokio::task::spawn_blocking(move || {
                let _permit = permit;
                let hits = find_matches(&haystack, &template, threshold);
                group_matches(&hits, distance).into_iter().next()
            }));
        }

        let mut found = Vec::new();
        for job in jobs {
            if let Some(hit) = job.await? {
                log::debug!("🔍 {hit}");
                found.push(hit);
            }
        }
        Ok(found)
    }

    /// First template of `set` (in enumeration order) present on screen
    pub async fn find_one_of(
        &self,
        haystack: &Arc<Haystack>,
        set: &TemplateSet,
    ) -> BotResult<Option<Match>> {
        let found = self.find_all_of(haystack, set).await?;
        if found.len() > 1 {
            log::warn!(
                "⚠️ {} templates matched at once: {}; using '{}'",
                found.len(),
                found
                    .iter()
                    .map(|m| m.label.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                found[0].label
            );
        }
        Ok(found.into_iter().next())
    }

    /// Decide which screen is showing. No match is the fallback state.
    pub async fn classify(
        &self,
        haystack: &Arc<Haystack>,
        states: &TemplateSet,
    ) -> BotResult<GameState> {
        let state = match self.find_one_of(haystack, states).await? {
            Some(hit) => GameState::from_label(&hit.label),
            None => GameState::fallback(),
        };
        Ok(state)
    }

    /// Single button lookup at the button threshold
    pub fn find_button(&self, haystack: &Haystack, template: &Template) -> Option<Match> {
        let hits = find_matches(haystack, template, self.button_threshold);
        group_matches(&hits, self.group_distance).into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn pattern(seed: u32) -> GrayImage {
        GrayImage::from_fn(8, 8, |x, y| Luma([((x * 31 + y * 17 + seed * 53 + x * y * seed) % 256) as u8]))
    }

    fn screen_with(patches: &[(GrayImage, u32, u32)]) -> Arc<Haystack> {
        let mut screen = GrayImage::from_pixel(64, 64, Luma([15]));
        for (patch, px, py) in patches {
            image::imageops::replace(&mut screen, patch, *px as i64, *py as i64);
        }
        Arc::new(Haystack::new(screen))
    }

    fn classifier() -> StateClassifier {
        StateClassifier::new(&MatchConfig::default())
    }

    #[tokio::test]
    async fn test_single_present_template_wins() {
        let set = TemplateSet::from_templates(vec![
            Template::from_gray("chest", pattern(1)),
            Template::from_gray("home", pattern(2)),
        ]);
        let haystack = screen_with(&[(pattern(2), 20, 30)]);
        let state = classifier().classify(&haystack, &set).await.unwrap();
        assert_eq!(state, GameState::Home);
    }

    #[tokio::test]
    async fn test_nothing_present_falls_back_to_advert() {
        let set = TemplateSet::from_templates(vec![Template::from_gray("home", pattern(2))]);
        let haystack = screen_with(&[]);
        let state = classifier().classify(&haystack, &set).await.unwrap();
        assert_eq!(state, GameState::Advert);
    }

    #[tokio::test]
    async fn test_all_of_keeps_enumeration_order() {
        let set = TemplateSet::from_templates(vec![
            Template::from_gray("a", pattern(3)),
            Template::from_gray("b", pattern(4)),
            Template::from_gray("c", pattern(5)),
        ]);
        // "c" is further left than "a", order must still follow the set
        let haystack = screen_with(&[(pattern(5), 2, 2), (pattern(3), 40, 40)]);
        let found = classifier().find_all_of(&haystack, &set).await.unwrap();
        let labels: Vec<_> = found.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["a", "c"]);
        assert_eq!((found[0].x, found[0].y), (44, 44));
    }

    #[tokio::test]
    async fn test_ambiguous_screen_first_in_order_wins() {
        let set = TemplateSet::from_templates(vec![
            Template::from_gray("chest", pattern(6)),
            Template::from_gray("home", pattern(7)),
        ]);
        let haystack = screen_with(&[(pattern(7), 0, 0), (pattern(6), 50, 50)]);
        let state = classifier().classify(&haystack, &set).await.unwrap();
        assert_eq!(state, GameState::Chest);
    }

    #[tokio::test]
    async fn test_single_worker_pool_completes() {
        let config = MatchConfig {
            workers: 1,
            ..MatchConfig::default()
        };
        let templates = (10..16).map(|s| Template::from_gray(format!("t{s}"), pattern(s))).collect();
        let set = TemplateSet::from_templates(templates);
        let haystack = screen_with(&[(pattern(12), 10, 10)]);
        let found = StateClassifier::new(&config)
            .find_all_of(&haystack, &set)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label, "t12");
    }

    #[test]
    fn test_find_button_uses_center() {
        let haystack = screen_with(&[(pattern(9), 30, 12)]);
        let button = Template::from_gray("skip", pattern(9));
        let hit = classifier().find_button(&haystack, &button).unwrap();
        assert_eq!((hit.x, hit.y), (34, 16));
    }
}
