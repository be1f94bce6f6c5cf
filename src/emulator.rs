//! Emulator process control.
//!
//! Launching is optional: without a configured executable the emulator is
//! assumed to be running already and both operations do nothing.

use crate::config::EmulatorConfig;
use crate::error::{BotError, BotResult};
use std::path::PathBuf;
use tokio::process::{Child, Command};

pub struct EmulatorProcess {
    executable: Option<PathBuf>,
    args: Vec<String>,
    child: Option<Child>,
}

impl EmulatorProcess {
    pub fn new(config: &EmulatorConfig) -> Self {
        Self {
            executable: config.executable.clone(),
            args: config.args.clone(),
            child: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.child.is_some()
    }

    /// Start the emulator. Returns whether a process was spawned.
    pub fn launch(&mut self) -> BotResult<bool> {
        let Some(executable) = &self.executable else {
            log::debug!("🖥️ No emulator executable configured, assuming it is running");
            return Ok(false);
        };
        if self.child.is_some() {
            return Ok(false);
        }

        let child = Command::new(executable)
            .args(&self.args)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| BotError::Process {
                program: executable.display().to_string(),
                description: e.to_string(),
            })?;
        log::info!("🖥️ Emulator started (pid {:?})", child.id());
        self.child = Some(child);
        Ok(true)
    }

    /// Kill the emulator if this process started it
    pub async fn close(&mut self) -> BotResult<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        child.kill().await.map_err(|e| BotError::Process {
            program: self
                .executable
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            description: e.to_string(),
        })?;
        log::info!("🖥️ Emulator closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_emulator_is_a_no_op() {
        let mut emulator = EmulatorProcess::new(&EmulatorConfig::default());
        assert!(!emulator.launch().unwrap());
        assert!(!emulator.is_running());
        assert!(emulator.close().await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_executable_is_a_process_error() {
        let config = EmulatorConfig {
            executable: Some(PathBuf::from("/nonexistent/emulator-binary")),
            ..EmulatorConfig::default()
        };
        let mut emulator = EmulatorProcess::new(&config);
        assert!(matches!(emulator.launch(), Err(BotError::Process { .. })));
        assert!(!emulator.is_running());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_launch_and_close() {
        let config = EmulatorConfig {
            executable: Some(PathBuf::from("sleep")),
            args: vec!["30".to_string()],
            ..EmulatorConfig::default()
        };
        let mut emulator = EmulatorProcess::new(&config);
        assert!(emulator.launch().unwrap());
        assert!(emulator.is_running());
        emulator.close().await.unwrap();
        assert!(!emulator.is_running());
    }
}
