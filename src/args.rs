use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Ads,
    Rewards,
    Classify,
    Screenshot,
}

#[derive(Debug, PartialEq)]
pub struct Args {
    pub mode: Mode,
    pub debug_mode: bool,
    pub config_path: Option<PathBuf>,
    pub assets_dir: Option<PathBuf>,
}

impl Args {
    pub fn parse() -> Result<Option<Self>, String> {
        Self::parse_from(std::env::args().skip(1))
    }

    /// Parse flags (without the program name). `Ok(None)` means help or
    /// version was printed and the program should exit successfully; `Err`
    /// carries the reason an argument was rejected.
    pub fn parse_from<I, S>(args: I) -> Result<Option<Self>, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut mode: Option<Mode> = None;
        let mut debug_mode = false;
        let mut config_path = None;
        let mut assets_dir = None;

        for arg in args {
            let arg = arg.as_ref();
            if arg == "--help" || arg == "-h" {
                print_help();
                return Ok(None);
            } else if arg == "--version" || arg == "-v" {
                println!("Ad Reward Run v{}", env!("CARGO_PKG_VERSION"));
                return Ok(None);
            } else if arg == "--debug" {
                debug_mode = true;
            } else if arg == "--ads" {
                mode = Some(Mode::Ads);
            } else if arg == "--rewards" {
                mode = Some(Mode::Rewards);
            } else if arg == "--classify" {
                mode = Some(Mode::Classify);
            } else if arg == "--screenshot" || arg == "-s" {
                mode = Some(Mode::Screenshot);
            } else if let Some(path) = arg.strip_prefix("--config=") {
                if path.is_empty() {
                    return Err("--config needs a file path".to_string());
                }
                config_path = Some(PathBuf::from(path));
            } else if let Some(dir) = arg.strip_prefix("--assets=") {
                if dir.is_empty() {
                    return Err("--assets needs a directory".to_string());
                }
                assets_dir = Some(PathBuf::from(dir));
            } else {
                return Err(format!("Unknown argument: {arg}"));
            }
        }

        Ok(Some(Args {
            mode: mode.unwrap_or(Mode::Ads),
            debug_mode,
            config_path,
            assets_dir,
        }))
    }
}

fn print_help() {
    println!("🤖 Ad Reward Run - emulator game ad/chest bot");
    println!();
    println!("USAGE:");
    println!("    ad-reward-run [FLAGS]");
    println!();
    println!("FLAGS:");
    println!("    (no flags)          Watch ads and open chests until none are left");
    println!("    --ads               Same as no flags");
    println!("    --rewards           Collect free rewards, then sleep until the next one (forever)");
    println!("    --classify          Print the current screen state once");
    println!("    --screenshot, -s    Save the capture region to cli-screenshot.png");
    println!("    --config=<file>     Load settings from a JSON file");
    println!("    --assets=<dir>      Reference image directory (default: snip_images)");
    println!("    --debug             Enable debug output (RUST_LOG overrides)");
    println!("    --help, -h          Show this help message");
    println!("    --version, -v       Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    ad-reward-run --classify --debug");
    println!("    ad-reward-run --rewards --config=bot.json");
    println!("    ad-reward-run --screenshot");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode_is_ads() {
        let args = Args::parse_from(Vec::<String>::new()).unwrap().unwrap();
        assert_eq!(args.mode, Mode::Ads);
        assert!(!args.debug_mode);
        assert_eq!(args.config_path, None);
    }

    #[test]
    fn test_flags() {
        let args = Args::parse_from(["--rewards", "--debug", "--config=bot.json", "--assets=imgs"]).unwrap().unwrap();
        assert_eq!(args.mode, Mode::Rewards);
        assert!(args.debug_mode);
        assert_eq!(args.config_path, Some(PathBuf::from("bot.json")));
        assert_eq!(args.assets_dir, Some(PathBuf::from("imgs")));
    }

    #[test]
    fn test_last_mode_wins() {
        let args = Args::parse_from(["--classify", "-s"]).unwrap().unwrap();
        assert_eq!(args.mode, Mode::Screenshot);
    }

    #[test]
    fn test_rejects_unknown_and_empty_values() {
        assert_eq!(
            Args::parse_from(["--gui"]),
            Err("Unknown argument: --gui".to_string())
        );
        assert!(Args::parse_from(["--ads", "--config="]).is_err());
        assert!(Args::parse_from(["--assets="]).is_err());
    }

    #[test]
    fn test_help_and_version_exit_cleanly() {
        assert_eq!(Args::parse_from(["--help"]), Ok(None));
        assert_eq!(Args::parse_from(["--rewards", "-v"]), Ok(None));
    }
}
