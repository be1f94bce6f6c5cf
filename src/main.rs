use ad_reward_run::args::{Args, Mode};
use ad_reward_run::game_automation::{
    ActionDriver, AdLoop, RewardSession, StateClassifier, TemplateLibrary, TesseractCli,
};
use ad_reward_run::emulator::EmulatorProcess;
use ad_reward_run::screen::{DesktopPointer, DesktopScreen, ScreenSource};
use ad_reward_run::template_matching::Haystack;
use ad_reward_run::{BotConfig, BotError, BotResult};
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    let args = match Args::parse() {
        Ok(Some(args)) => args,
        Ok(None) => return ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {e}");
            eprintln!("Run with --help for usage");
            return ExitCode::FAILURE;
        }
    };

    let level = if args.debug_mode { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            log::error!("❌ {e}");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("❌ Failed to start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(args.mode, config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_fatal() => {
            log::error!("💥 {e}");
            ExitCode::from(2)
        }
        Err(e) => {
            log::error!("❌ {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Args) -> BotResult<BotConfig> {
    let mut config = match &args.config_path {
        Some(path) => BotConfig::load(path)?,
        None => BotConfig::default(),
    };
    if let Some(dir) = &args.assets_dir {
        config.assets_dir = dir.clone();
    }
    config.validate()?;
    Ok(config)
}

async fn run(mode: Mode, config: BotConfig) -> BotResult<()> {
    match mode {
        Mode::Screenshot => screenshot(&config).await,
        Mode::Classify => classify(&config).await,
        Mode::Ads => {
            let mut ad_loop = AdLoop::new(desktop_driver(config)?);
            let session = ad_loop.run().await?;
            println!(
                "✅ Done: {} ads watched, {} chests started",
                session.ads_done, session.chests_started
            );
            Ok(())
        }
        Mode::Rewards => {
            let reader = TesseractCli::new(config.timers.ocr_program.clone());
            let emulator = EmulatorProcess::new(&config.emulator);
            let mut session = RewardSession::new(desktop_driver(config)?, reader, emulator);
            session.run_forever().await
        }
    }
}

fn desktop_driver(config: BotConfig) -> BotResult<ActionDriver> {
    let library = TemplateLibrary::load(&config)?;
    let pointer = DesktopPointer::new()?;
    Ok(ActionDriver::new(
        Box::new(DesktopScreen::new()),
        Box::new(pointer),
        library,
        config,
    ))
}

async fn screenshot(config: &BotConfig) -> BotResult<()> {
    let region = config.capture_region;
    println!(
        "📸 Capturing {}x{} at ({}, {})...",
        region.width, region.height, region.left, region.top
    );
    let capture = DesktopScreen::new().capture_timed(&region)?;
    capture
        .image
        .save("cli-screenshot.png")
        .map_err(|e| BotError::Capture {
            description: format!("could not save screenshot: {e}"),
        })?;
    println!("✅ Screenshot ({}ms) saved to cli-screenshot.png", capture.duration_ms);
    Ok(())
}

async fn classify(config: &BotConfig) -> BotResult<()> {
    let library = TemplateLibrary::load(config)?;
    let frame = DesktopScreen::new().capture(&config.capture_region)?;
    let haystack = Arc::new(Haystack::from_rgba(&frame));
    let state = StateClassifier::new(&config.matching)
        .classify(&haystack, &library.states)
        .await?;
    println!("🎮 Current state: {state}");
    Ok(())
}
