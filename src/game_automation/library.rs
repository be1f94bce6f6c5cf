// Reference image library on disk
use crate::config::BotConfig;
use crate::error::{BotError, BotResult};
use crate::template_matching::{Template, TemplateSet};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Single-purpose buttons, each stored as `<assets>/<name>.png`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Button {
    /// Watch-ad button
    Open,
    Skip,
    Continue,
    Start,
    Free,
    Rewards,
    RedCross,
    GameLogo,
}

impl Button {
    pub const ALL: [Button; 8] = [
        Button::Open,
        Button::Skip,
        Button::Continue,
        Button::Start,
        Button::Free,
        Button::Rewards,
        Button::RedCross,
        Button::GameLogo,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Button::Open => "open",
            Button::Skip => "skip",
            Button::Continue => "continue",
            Button::Start => "start",
            Button::Free => "free",
            Button::Rewards => "rewards",
            Button::RedCross => "red_cross",
            Button::GameLogo => "game_logo",
        }
    }
}

/// Every template the bot matches against, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    pub states: TemplateSet,
    pub chests: TemplateSet,
    pub close: TemplateSet,
    pub timer_anchors: TemplateSet,
    buttons: BTreeMap<Button, Arc<Template>>,
}

impl TemplateLibrary {
    /// Load the asset tree. Only the states folder is mandatory; anything
    /// else that is missing just never matches.
    pub fn load(config: &BotConfig) -> BotResult<Self> {
        let states = TemplateSet::load_dir(config.states_dir())?;
        if states.is_empty() {
            return Err(BotError::Config {
                description: format!("no state templates in {}", config.states_dir().display()),
            });
        }

        let mut library = Self {
            states,
            chests: load_optional_dir(&config.chests_dir()),
            close: load_optional_dir(&config.close_dir()),
            timer_anchors: load_optional_dir(&config.timer_anchor_dir()),
            buttons: BTreeMap::new(),
        };

        for button in Button::ALL {
            let path = config.assets_dir.join(format!("{}.png", button.name()));
            match Template::load(&path) {
                Ok(template) => library.set_button(button, template),
                Err(e) => log::warn!("⚠️ Button '{}' unavailable: {e}", button.name()),
            }
        }

        log::info!(
            "📂 Templates: {} states, {} chests, {} close, {} timers, {} buttons",
            library.states.len(),
            library.chests.len(),
            library.close.len(),
            library.timer_anchors.len(),
            library.buttons.len()
        );
        Ok(library)
    }

    pub fn set_button(&mut self, button: Button, template: Template) {
        self.buttons.insert(button, Arc::new(template));
    }

    pub fn button(&self, button: Button) -> Option<&Arc<Template>> {
        self.buttons.get(&button)
    }
}

fn load_optional_dir(dir: &Path) -> TemplateSet {
    TemplateSet::load_dir(dir).unwrap_or_else(|e| {
        log::warn!("⚠️ {e}");
        TemplateSet::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn write_png(path: &Path, value: u8) {
        let image = GrayImage::from_fn(6, 6, |x, y| Luma([value.wrapping_add((x * 7 + y * 3) as u8)]));
        image.save(path).unwrap();
    }

    #[test]
    fn test_load_library_tree() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir(root.join("states")).unwrap();
        std::fs::create_dir(root.join("chests")).unwrap();
        write_png(&root.join("states/home.png"), 10);
        write_png(&root.join("states/advert.png"), 50);
        write_png(&root.join("chests/gold_chest.png"), 90);
        write_png(&root.join("skip.png"), 120);

        let config = BotConfig {
            assets_dir: root.to_path_buf(),
            ..BotConfig::default()
        };
        let library = TemplateLibrary::load(&config).unwrap();
        assert_eq!(library.states.names(), vec!["advert", "home"]);
        assert_eq!(library.chests.names(), vec!["gold_chest"]);
        assert!(library.close.is_empty());
        assert!(library.button(Button::Skip).is_some());
        assert!(library.button(Button::Open).is_none());
    }

    #[test]
    fn test_missing_states_folder_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = BotConfig {
            assets_dir: dir.path().to_path_buf(),
            ..BotConfig::default()
        };
        assert!(matches!(
            TemplateLibrary::load(&config),
            Err(BotError::TemplateDirMissing { .. })
        ));
    }
}
